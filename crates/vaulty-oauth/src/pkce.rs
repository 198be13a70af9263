//! PKCE (Proof Key for Code Exchange, RFC 7636) and CSRF state tokens.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// PKCE code verifier and its S256 challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    verifier: String,
    challenge: String,
}

impl PkceChallenge {
    /// Generates a random 43-character verifier and its challenge.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_verifier(random_token())
    }

    /// Rebuilds the pair from a stored verifier.
    #[must_use]
    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = verifier.into();
        let challenge = compute_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    /// Returns the verifier.
    #[must_use]
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// Returns the challenge.
    #[must_use]
    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    /// Returns the challenge method.
    #[must_use]
    pub const fn method(&self) -> &'static str {
        "S256"
    }
}

/// Generates an unguessable value for the `state` parameter.
#[must_use]
pub fn random_state() -> String {
    random_token()
}

fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn compute_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc7636_appendix_b() {
        let pkce = PkceChallenge::from_verifier("dBjftJeZ4CVP-mJ0kzyqr6WvcCvNLt2dYhfIZ3Grhz8");
        assert_eq!(pkce.challenge(), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
        assert_eq!(pkce.method(), "S256");
    }

    #[test]
    fn test_generated_verifier_shape() {
        let pkce = PkceChallenge::generate();
        assert_eq!(pkce.verifier().len(), 43);
        assert_eq!(PkceChallenge::from_verifier(pkce.verifier()), pkce);
    }

    #[test]
    fn test_random_values_differ() {
        assert_ne!(random_state(), random_state());
        assert_ne!(
            PkceChallenge::generate().verifier(),
            PkceChallenge::generate().verifier()
        );
    }
}
