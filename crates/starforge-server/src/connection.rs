//! Per-socket driver: one reader task, one writer task, one unregister.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};

use crate::auth::TokenVerifier;
use crate::error::{AuthError, HubClosed, ProtocolError};
use crate::hub::{ConnectionId, HubHandle};
use crate::protocol::{parse_client_message, ClientMessage, ServerMessage};

/// Serve one upgraded socket until either side goes away.
pub async fn serve_socket(socket: WebSocket, hub: HubHandle, verifier: Arc<dyn TokenVerifier>) {
    let (id, mut outbound) = match hub.open_connection().await {
        Ok(opened) => opened,
        Err(e) => {
            log::warn!("Rejecting socket: {}", e);
            return;
        }
    };
    let (mut sink, mut stream) = socket.split();

    let mut writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sink.send(Message::Text(frame.as_ref().into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    let reader_hub = hub.clone();
    let mut reader = tokio::spawn(async move {
        let mut identity = None;
        while let Some(received) = stream.next().await {
            match received {
                Ok(Message::Text(text)) => {
                    handle_text(id, &mut identity, text.as_str(), &reader_hub, verifier.as_ref())
                        .await;
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    log::debug!("Connection {} read error: {}", id, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }
    if let Err(e) = hub.unregister(id).await {
        log::debug!("Connection {} unregister skipped: {}", id, e);
    }
}

/// Act on one inbound text frame. Bad frames never close the connection.
///
/// `identity` is the user this connection authenticated as. Once it is set,
/// later auth frames are dropped without a reply.
pub async fn handle_text(
    id: ConnectionId,
    identity: &mut Option<u64>,
    text: &str,
    hub: &HubHandle,
    verifier: &dyn TokenVerifier,
) {
    let result: Result<(), HubClosed> = match parse_client_message(text) {
        Ok(ClientMessage::Auth { .. }) | Err(ProtocolError::InvalidAuthPayload)
            if identity.is_some() =>
        {
            log::debug!("Connection {} is already authenticated, auth ignored", id);
            Ok(())
        }
        Ok(ClientMessage::Auth { token }) => match verifier.verify(&token) {
            Ok(user_id) => {
                *identity = Some(user_id);
                hub.authenticate(id, user_id).await
            }
            Err(e) => {
                log::info!("Connection {} failed auth: {}", id, e);
                hub.send_to(id, &ServerMessage::AuthFailed(e.to_string()))
                    .await
            }
        },
        Ok(ClientMessage::Unknown { kind }) => {
            log::debug!("Connection {} sent unhandled message type {:?}", id, kind);
            Ok(())
        }
        Err(ProtocolError::InvalidAuthPayload) => {
            let reason = AuthError::MalformedPayload.to_string();
            hub.send_to(id, &ServerMessage::AuthFailed(reason)).await
        }
        Err(e) => {
            log::warn!("Connection {} sent a bad frame: {}", id, e);
            Ok(())
        }
    };
    if let Err(e) = result {
        log::debug!("Connection {}: {}", id, e);
    }
}
