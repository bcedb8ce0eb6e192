use thiserror::Error;

/// Unified error type for token issuance, verification and identity
/// resolution.
///
/// Every failure is local and synchronous — the engine never retries.
/// A token is either fully signed or not produced; a payload is either
/// fully verified and claim-consistent or rejected.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Required policy value absent (identity, audience policy, ...).
    /// Surfaces at issuance time, never retried.
    #[error("configuration: {0}")]
    Configuration(String),

    /// No key reference for an issuer, no reference matches a requested
    /// key id, or the key bytes cannot be read.
    #[error("key: {0}")]
    Key(String),

    /// A structurally required claim is absent or empty.
    #[error("missing claim: {0}")]
    MissingClaim(String),

    /// Signature invalid, expired, audience/issuer mismatch, or
    /// unrecognized token type. The token is rejected outright.
    #[error("verification: {0}")]
    Verification(String),

    /// The verified payload resolves to no usable user. Deliberately
    /// generic so callers cannot probe which part was wrong.
    #[error("authentication: {0}")]
    Authentication(String),

    /// Datastore collaborator failure.
    #[error("storage: {0}")]
    Storage(String),
}

impl TokenError {
    /// The one message every authentication failure reports.
    pub(crate) fn invalid_token() -> Self {
        TokenError::Authentication("invalid token".to_string())
    }

    /// Map a `jsonwebtoken` encode failure into the engine taxonomy:
    /// unusable key material is a key error, anything else (such as a
    /// serialization failure) is a verification error.
    pub(crate) fn from_encode(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::InvalidRsaKey(_)
            | ErrorKind::InvalidEcdsaKey
            | ErrorKind::InvalidKeyFormat
            | ErrorKind::RsaFailedSigning => {
                TokenError::Key(format!("signing key rejected: {e}"))
            }
            _ => TokenError::Verification(format!("token encoding failed: {e}")),
        }
    }

    /// Map a `jsonwebtoken` decode failure into the engine taxonomy.
    pub(crate) fn from_decode(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::MissingRequiredClaim(claim) => TokenError::MissingClaim(claim.clone()),
            ErrorKind::ExpiredSignature => TokenError::Verification("token expired".to_string()),
            ErrorKind::ImmatureSignature => {
                TokenError::Verification("token not yet valid".to_string())
            }
            ErrorKind::InvalidSignature => {
                TokenError::Verification("invalid signature".to_string())
            }
            ErrorKind::InvalidIssuer => TokenError::Verification("issuer mismatch".to_string()),
            ErrorKind::InvalidAudience => {
                TokenError::Verification("audience mismatch".to_string())
            }
            ErrorKind::InvalidAlgorithm => {
                TokenError::Verification("algorithm not accepted".to_string())
            }
            _ => TokenError::Verification(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::errors::ErrorKind;

    #[test]
    fn decode_error_mapping() {
        let e = TokenError::from_decode(ErrorKind::ExpiredSignature.into());
        assert!(matches!(e, TokenError::Verification(_)));
        assert_eq!(e.to_string(), "verification: token expired");

        let e = TokenError::from_decode(ErrorKind::MissingRequiredClaim("aud".to_string()).into());
        assert!(matches!(e, TokenError::MissingClaim(_)));

        let e = TokenError::from_decode(ErrorKind::InvalidSignature.into());
        assert!(matches!(e, TokenError::Verification(_)));
    }

    #[test]
    fn encode_error_mapping() {
        let e = TokenError::from_encode(ErrorKind::InvalidRsaKey("not pem".to_string()).into());
        assert!(matches!(e, TokenError::Key(_)));

        let e = TokenError::from_encode(ErrorKind::InvalidAlgorithmName.into());
        assert!(matches!(e, TokenError::Verification(_)));
    }

    #[test]
    fn authentication_message_is_generic() {
        assert_eq!(
            TokenError::invalid_token().to_string(),
            "authentication: invalid token"
        );
    }
}
