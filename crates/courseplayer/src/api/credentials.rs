//! Bearer credential supply.

use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::RwLock;

/// Supplies the bearer token issued by the identity provider.
pub trait CredentialProvider: Send + Sync {
    /// Current token, or `None` when the learner is signed out.
    fn bearer_token(&self) -> Option<String>;

    /// Called when the backend rejects the token.
    fn invalidate(&self) {}
}

/// In-memory token holder, refreshed by the sign-in flow.
#[derive(Debug, Default)]
pub struct TokenStore {
    token: RwLock<Option<String>>,
}

impl TokenStore {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    /// Creates a store with no token.
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token.into());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
    }
}

impl CredentialProvider for TokenStore {
    fn bearer_token(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }

    fn invalidate(&self) {
        self.clear();
    }
}

/// Log-safe identifier of a bearer token.
///
/// The token is hashed so it never appears in logs.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct CredentialFingerprint(String);

impl CredentialFingerprint {
    pub fn of(token: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let result = hasher.finalize();
        // First 16 bytes as hex
        Self(hex::encode(&result[..16]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CredentialFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}...", &self.0[..8.min(self.0.len())])
    }
}

mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_hashing() {
        let a = CredentialFingerprint::of("token-123");
        let b = CredentialFingerprint::of("token-123");
        let c = CredentialFingerprint::of("token-456");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 32);
        assert!(!a.to_string().contains("token"));
        assert!(a.to_string().ends_with("..."));
    }

    #[test]
    fn test_token_store_lifecycle() {
        let store = TokenStore::signed_out();
        assert!(store.bearer_token().is_none());

        store.set("abc");
        assert_eq!(store.bearer_token().as_deref(), Some("abc"));

        store.invalidate();
        assert!(store.bearer_token().is_none());
    }
}
