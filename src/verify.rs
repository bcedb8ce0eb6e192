//! Two-phase token verification.
//!
//! Phase 1 peeks at the header and claim body without trusting the
//! signature, solely to learn which issuer (and which of its keys) to
//! verify against — and to apply the accepted-issuer allow-list *before*
//! any key material is touched. Phase 2 performs the cryptographic and
//! claim verification proper. Phase 3 applies claim-consistency policy
//! on the now-trusted payload. The ordering is a security invariant,
//! which is why peek and decode are separate steps rather than one call.

use std::collections::HashSet;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::claims::{Claims, TokenKind};
use crate::config::TokenConfig;
use crate::error::TokenError;
use crate::keys::{KeyRing, KeyStore, decoding_key};

/// What phase 1 learns about a token. Nothing in here is trusted.
#[derive(Debug, Clone)]
pub struct UnverifiedToken {
    /// Issuer claim, read without signature verification.
    pub issuer: String,
    /// Key id from the unsigned header, if present.
    pub key_id: Option<String>,
    /// Algorithm the header declares.
    pub algorithm: Algorithm,
}

/// A fully verified, policy-consistent payload.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub kind: TokenKind,
    pub claims: Claims,
}

/// Verifies encoded tokens against the configured policy and the public
/// key pool.
pub struct TokenVerifier {
    config: Arc<TokenConfig>,
    keys: KeyRing,
}

impl TokenVerifier {
    /// Build a verifier over the config's public key pool.
    pub fn new(config: Arc<TokenConfig>, store: Arc<dyn KeyStore>) -> Self {
        let keys = KeyRing::new(config.public_keys.clone(), store);
        Self { config, keys }
    }

    /// Phase 1: structural peek, no trust placed in the result.
    ///
    /// Fails if the token is malformed, the issuer claim is absent, or
    /// the issuer is outside the accepted set.
    pub fn peek(&self, token: &str) -> Result<UnverifiedToken, TokenError> {
        let header = jsonwebtoken::decode_header(token).map_err(TokenError::from_decode)?;

        let mut insecure = Validation::new(header.alg);
        insecure.insecure_disable_signature_validation();
        insecure.validate_exp = false;
        insecure.validate_aud = false;
        insecure.required_spec_claims = HashSet::new();
        let unverified =
            jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &insecure)
                .map_err(TokenError::from_decode)?;

        let issuer = unverified
            .claims
            .issuer
            .ok_or_else(|| TokenError::MissingClaim("iss".to_string()))?;

        if let Some(accepted) = &self.config.accepted_issuers {
            if !accepted.iter().any(|i| i == &issuer) {
                return Err(TokenError::Verification(format!(
                    "issuer '{issuer}' is not accepted"
                )));
            }
        }

        Ok(UnverifiedToken {
            issuer,
            key_id: header.kid,
            algorithm: header.alg,
        })
    }

    /// Phase 2 + 3: verified decode and claim-consistency checks.
    pub fn decode(
        &self,
        token: &str,
        unverified: &UnverifiedToken,
    ) -> Result<VerifiedToken, TokenError> {
        let identity = self.config.identity()?.to_string();

        let allowed = self.config.allowed_decode_algorithms();
        if !allowed.contains(&unverified.algorithm) {
            return Err(TokenError::Verification(format!(
                "algorithm {:?} is not accepted",
                unverified.algorithm
            )));
        }

        let resolved = self.keys.resolve(&unverified.issuer, unverified.key_id.as_deref())?;
        let key = decoding_key(unverified.algorithm, &resolved.bytes)?;

        let mut validation = Validation::new(unverified.algorithm);
        validation.algorithms = allowed;
        validation.leeway = self.config.leeway;
        validation.validate_exp = self.config.verify_expiration;
        // Expiration stays optional: a token without `exp` never expires
        // by policy. Audience and issuer are always required.
        validation.required_spec_claims =
            HashSet::from(["aud".to_string(), "iss".to_string()]);
        validation.set_audience(&[identity.as_str()]);
        validation.set_issuer(&[unverified.issuer.as_str()]);
        if !self.config.verify_signature {
            validation.insecure_disable_signature_validation();
        }

        let verified = jsonwebtoken::decode::<Claims>(token, &key, &validation)
            .map_err(TokenError::from_decode)?;

        self.check_consistency(verified.claims, &identity)
    }

    /// Both phases in order. The allow-list check inside [`peek`] always
    /// runs before key resolution.
    ///
    /// [`peek`]: TokenVerifier::peek
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let unverified = self.peek(token)?;
        self.decode(token, &unverified)
    }

    /// Phase 3: policy checks on the trusted payload.
    fn check_consistency(
        &self,
        claims: Claims,
        identity: &str,
    ) -> Result<VerifiedToken, TokenError> {
        let kind = claims
            .kind()
            .ok_or_else(|| TokenError::Verification("unknown token type".to_string()))?;

        // Session tokens never cross issuer boundaries, allow-list or not.
        if claims.issuer.as_deref() != Some(identity) && kind != TokenKind::Authorization {
            return Err(TokenError::Verification(
                "only authorization tokens are accepted from other issuers".to_string(),
            ));
        }

        if !claims.session_id.as_deref().is_some_and(|s| !s.is_empty()) {
            return Err(TokenError::MissingClaim("sid".to_string()));
        }
        if !claims.user_id.as_deref().is_some_and(|s| !s.is_empty()) {
            return Err(TokenError::MissingClaim("uid".to_string()));
        }

        Ok(VerifiedToken { kind, claims })
    }
}
