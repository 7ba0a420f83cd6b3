//! Token verification for the hub handshake.
//!
//! Tokens are issued elsewhere. The server only checks them against the
//! user records.

use std::sync::Arc;

use crate::error::AuthError;
use crate::store::{RecordStore, TableExt};
use crate::tables::User;

/// Resolves an auth token to a user id.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<u64, AuthError>;
}

/// Matches the token against `users.auth_token`.
pub struct StoreTokenVerifier {
    store: Arc<dyn RecordStore>,
}

impl StoreTokenVerifier {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }
}

impl TokenVerifier for StoreTokenVerifier {
    fn verify(&self, token: &str) -> Result<u64, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        self.store
            .filter::<User>(|u| !u.auth_token.is_empty() && u.auth_token == token)?
            .first()
            .map(|u| u.id)
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn verifier() -> StoreTokenVerifier {
        let store = Arc::new(MemoryStore::new());
        for (name, token) in [("ada", "ada-secret"), ("bo", "")] {
            store
                .create(User {
                    id: 0,
                    name: name.into(),
                    credits: 0,
                    auth_token: token.into(),
                })
                .unwrap();
        }
        StoreTokenVerifier::new(store)
    }

    #[test]
    fn test_known_token() {
        assert_eq!(verifier().verify("ada-secret").unwrap(), 1);
    }

    #[test]
    fn test_unknown_or_empty_token() {
        let v = verifier();
        assert!(matches!(v.verify("nope"), Err(AuthError::InvalidToken)));
        // A user without a token can never be matched.
        assert!(matches!(v.verify(""), Err(AuthError::InvalidToken)));
    }
}
