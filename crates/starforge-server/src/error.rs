use std::path::PathBuf;

use starforge_logic::network::ParamsError;

/// Record store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The referenced record does not exist.
    #[error("{collection} record {id} not found")]
    NotFound { collection: &'static str, id: u64 },

    /// A document could not be converted to or from its record type.
    #[error("serialization error in {collection}: {source}")]
    Serialization {
        collection: String,
        source: serde_json::Error,
    },

    /// The store could not serve the request; retrying later may succeed.
    #[error("store unavailable: {detail}")]
    Unavailable { detail: String },
}

/// Credit ledger failures.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("user {0} not found")]
    UserNotFound(u64),

    #[error("building {0} not found")]
    BuildingNotFound(u64),

    /// Deposits only go to active banks with a credits slot.
    #[error("building {0} does not hold credits")]
    NotAVault(u64),

    /// Nothing was deducted.
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Tick failures that prevented the tick from running at all.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("tick aborted: {0}")]
    Store(#[from] StoreError),

    #[error("tick worker failed: {detail}")]
    Worker { detail: String },
}

/// Token verification failures. The connection stays open on any of these.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,

    #[error("malformed auth payload")]
    MalformedPayload,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Inbound wire message failures.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("unparseable message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("malformed auth payload")]
    InvalidAuthPayload,
}

/// Galaxy seeding and hyperlane rebuild failures.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("invalid network parameters: {0}")]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The hub task is gone; nothing more can be delivered.
#[derive(Debug, thiserror::Error)]
#[error("broadcast hub has shut down")]
pub struct HubClosed;
