//! Token policy configuration.
//!
//! One immutable value built at startup and shared (via `Arc`) by the
//! signer, verifier and identity resolver. No global state: tests build
//! their own config per case.

use std::collections::HashMap;
use std::path::PathBuf;

use jsonwebtoken::Algorithm;

use crate::claims::Audience;
use crate::error::TokenError;

/// Process-lifetime token policy.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// This service's own identity. Used as the default issuer when
    /// signing and as the expected audience when verifying.
    pub identity: Option<String>,

    /// Default audience for session tokens.
    pub session_audience: Option<Audience>,

    /// Default audience for authorization tokens.
    pub authorization_audience: Option<Audience>,

    /// Session token lifetime in seconds. None means session tokens are
    /// issued without an expiration claim.
    pub session_ttl: Option<i64>,

    /// Authorization token lifetime in seconds. None means no expiration.
    pub authorization_ttl: Option<i64>,

    /// Clock-skew tolerance (seconds) for expiration checks.
    pub leeway: u64,

    /// Issuers whose tokens are accepted. None means unrestricted.
    pub accepted_issuers: Option<Vec<String>>,

    /// Signature algorithm used when signing.
    pub encode_algorithm: Algorithm,

    /// Algorithms accepted when verifying. Empty falls back to
    /// `[encode_algorithm]`.
    pub decode_algorithms: Vec<Algorithm>,

    /// Verify signatures when decoding. Test escape hatch; leave on.
    pub verify_signature: bool,

    /// Verify expiration when decoding. Test escape hatch; leave on.
    pub verify_expiration: bool,

    /// Re-validate the live session record when resolving identities.
    pub verify_session: bool,

    /// Issuer → private key reference(s), for signing.
    pub private_keys: HashMap<String, Vec<String>>,

    /// Issuer → public key reference(s), for verification.
    pub public_keys: HashMap<String, Vec<String>>,

    /// Root directory for key references. None treats references as
    /// direct paths.
    pub key_store_root: Option<PathBuf>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            identity: None,
            session_audience: None,
            authorization_audience: None,
            session_ttl: None,
            authorization_ttl: None,
            leeway: 0,
            accepted_issuers: None,
            encode_algorithm: Algorithm::RS256,
            decode_algorithms: Vec::new(),
            verify_signature: true,
            verify_expiration: true,
            verify_session: true,
            private_keys: HashMap::new(),
            public_keys: HashMap::new(),
            key_store_root: None,
        }
    }
}

impl TokenConfig {
    /// The configured self identity, or a configuration error.
    pub(crate) fn identity(&self) -> Result<&str, TokenError> {
        self.identity
            .as_deref()
            .ok_or_else(|| TokenError::Configuration("identity must be configured".to_string()))
    }

    /// Algorithms accepted when decoding, with the single-algorithm
    /// fallback applied.
    pub(crate) fn allowed_decode_algorithms(&self) -> Vec<Algorithm> {
        if self.decode_algorithms.is_empty() {
            vec![self.encode_algorithm]
        } else {
            self.decode_algorithms.clone()
        }
    }
}
