//! Password hash checking for provider authentication.

use sha2::{Digest, Sha256};

/// Compares a plaintext password against a stored hash.
pub trait CredentialChecker: Send + Sync {
    fn check_hash(&self, name: &str, plaintext: &str, stored_hash: &str) -> bool;
}

/// Hashes `"<name>:<password>"` with SHA-256, hex encoded.
///
/// The provider name acts as a salt so equal passwords of two providers
/// produce different hashes.
pub fn hash_password(name: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// [`CredentialChecker`] for hashes produced by [`hash_password`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256CredentialChecker;

impl CredentialChecker for Sha256CredentialChecker {
    fn check_hash(&self, name: &str, plaintext: &str, stored_hash: &str) -> bool {
        hash_password(name, plaintext).eq_ignore_ascii_case(stored_hash.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256() {
        let hash = hash_password("jbossorg", "secret");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn name_salts_the_hash() {
        assert_ne!(hash_password("a", "secret"), hash_password("b", "secret"));
    }

    #[test]
    fn checker_accepts_matching_password() {
        let stored = hash_password("jbossorg", "secret");
        let checker = Sha256CredentialChecker;
        assert!(checker.check_hash("jbossorg", "secret", &stored));
        assert!(checker.check_hash("jbossorg", "secret", &stored.to_uppercase()));
        assert!(!checker.check_hash("jbossorg", "wrong", &stored));
        assert!(!checker.check_hash("other", "secret", &stored));
    }
}
