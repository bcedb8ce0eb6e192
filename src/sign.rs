//! Claim normalization and signing.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::Header;

use crate::claims::{Audience, Claims, TokenKind};
use crate::config::TokenConfig;
use crate::error::TokenError;
use crate::keys::{KeyRing, KeyStore, encoding_key};

/// Issues signed tokens: fills required-but-absent claims with policy
/// defaults, resolves the signing key and encodes.
pub struct TokenSigner {
    config: Arc<TokenConfig>,
    keys: KeyRing,
}

impl TokenSigner {
    /// Build a signer over the config's private key pool.
    pub fn new(config: Arc<TokenConfig>, store: Arc<dyn KeyStore>) -> Self {
        let keys = KeyRing::new(config.private_keys.clone(), store);
        Self { config, keys }
    }

    /// Normalize a partially populated payload and sign it.
    ///
    /// Defaulting order: issuer (self identity), audience (per-kind
    /// policy, else `[identity]`), expiration (per-kind TTL — no TTL
    /// leaves the token non-expiring), issued-at (now). The resolved
    /// key id is embedded in the unsigned token header.
    pub fn sign(&self, claims: Claims) -> Result<String, TokenError> {
        let mut claims = claims;

        let kind = claims.kind().ok_or_else(|| {
            TokenError::Configuration(format!(
                "unknown token type {:?}",
                claims.token.as_deref().unwrap_or("<unset>")
            ))
        })?;

        let issuer = match &claims.issuer {
            Some(issuer) => issuer.clone(),
            None => self.config.identity()?.to_string(),
        };
        claims.issuer = Some(issuer.clone());

        if claims.audience.is_none() {
            claims.audience = Some(self.default_audience(kind)?);
        }

        let now = Utc::now().timestamp();

        if claims.expires_at.is_none() {
            let ttl = match kind {
                TokenKind::Session => self.config.session_ttl,
                TokenKind::Authorization => self.config.authorization_ttl,
            };
            if let Some(ttl) = ttl {
                claims.expires_at = Some(now + ttl);
            }
        }

        if claims.issued_at.is_none() {
            claims.issued_at = Some(now);
        }

        let resolved = self.keys.resolve(&issuer, None)?;
        let key = encoding_key(self.config.encode_algorithm, &resolved.bytes)?;

        let mut header = Header::new(self.config.encode_algorithm);
        header.kid = Some(resolved.key_id);

        jsonwebtoken::encode(&header, &claims, &key).map_err(TokenError::from_encode)
    }

    fn default_audience(&self, kind: TokenKind) -> Result<Audience, TokenError> {
        let policy = match kind {
            TokenKind::Session => &self.config.session_audience,
            TokenKind::Authorization => &self.config.authorization_audience,
        };
        if let Some(audience) = policy {
            return Ok(audience.clone());
        }
        match &self.config.identity {
            Some(identity) => Ok(Audience::Many(vec![identity.clone()])),
            None => Err(TokenError::Configuration(format!(
                "no audience policy for {kind} tokens and identity is unset"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use jsonwebtoken::Algorithm;

    use super::*;
    use crate::identity::{Session, User};
    use crate::keys::testing::MapKeyStore;

    fn test_config() -> TokenConfig {
        TokenConfig {
            identity: Some("svc-a".to_string()),
            encode_algorithm: Algorithm::HS256,
            private_keys: HashMap::from([(
                "svc-a".to_string(),
                vec!["svc-a.pem".to_string()],
            )]),
            ..TokenConfig::default()
        }
    }

    fn signer_with(config: TokenConfig) -> TokenSigner {
        TokenSigner::new(
            Arc::new(config),
            MapKeyStore::single("svc-a.pem", b"test-secret"),
        )
    }

    fn session_claims() -> Claims {
        let session = Session {
            id: "s1".to_string(),
            user_id: "u1".to_string(),
        };
        let user = User {
            id: "u1".to_string(),
            email: Some("a@b.com".to_string()),
            active: true,
        };
        Claims::session(&session, &user)
    }

    fn decode_unverified(token: &str) -> Claims {
        let mut validation = jsonwebtoken::Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = Default::default();
        jsonwebtoken::decode::<Claims>(
            token,
            &jsonwebtoken::DecodingKey::from_secret(&[]),
            &validation,
        )
        .unwrap()
        .claims
    }

    #[test]
    fn sign_fills_policy_defaults() {
        let mut config = test_config();
        config.session_ttl = Some(3600);
        let signer = signer_with(config);

        let before = Utc::now().timestamp();
        let token = signer.sign(session_claims()).unwrap();
        let after = Utc::now().timestamp();

        let claims = decode_unverified(&token);
        assert_eq!(claims.issuer.as_deref(), Some("svc-a"));
        assert_eq!(
            claims.audience,
            Some(Audience::Many(vec!["svc-a".to_string()]))
        );
        let iat = claims.issued_at.unwrap();
        assert!(iat >= before && iat <= after);
        let exp = claims.expires_at.unwrap();
        assert!(exp >= before + 3600 && exp <= after + 3600);
    }

    #[test]
    fn sign_keeps_caller_supplied_claims() {
        let signer = signer_with(test_config());

        let mut claims = session_claims();
        claims.issuer = Some("svc-a".to_string());
        claims.audience = Some(Audience::One("svc-b".to_string()));
        claims.expires_at = Some(42);
        claims.issued_at = Some(7);

        let signed = decode_unverified(&signer.sign(claims).unwrap());
        assert_eq!(signed.audience, Some(Audience::One("svc-b".to_string())));
        assert_eq!(signed.expires_at, Some(42));
        assert_eq!(signed.issued_at, Some(7));
    }

    #[test]
    fn no_ttl_means_non_expiring() {
        let signer = signer_with(test_config());
        let claims = decode_unverified(&signer.sign(session_claims()).unwrap());
        assert!(claims.expires_at.is_none());
        assert!(claims.issued_at.is_some());
    }

    #[test]
    fn audience_prefers_per_kind_policy() {
        let mut config = test_config();
        config.session_audience = Some(Audience::One("portal".to_string()));
        let signer = signer_with(config);

        let claims = decode_unverified(&signer.sign(session_claims()).unwrap());
        assert_eq!(claims.audience, Some(Audience::One("portal".to_string())));
    }

    #[test]
    fn header_carries_resolved_key_id() {
        let signer = signer_with(test_config());
        let token = signer.sign(session_claims()).unwrap();
        let header = jsonwebtoken::decode_header(&token).unwrap();
        assert_eq!(header.kid.as_deref(), Some("svc-a"));
        assert_eq!(header.alg, Algorithm::HS256);
    }

    #[test]
    fn unknown_token_kind_is_a_configuration_error() {
        let signer = signer_with(test_config());
        let mut claims = session_claims();
        claims.token = Some("refresh".to_string());
        assert!(matches!(
            signer.sign(claims),
            Err(TokenError::Configuration(_))
        ));
    }

    #[test]
    fn unset_identity_is_a_configuration_error() {
        let mut config = test_config();
        config.identity = None;
        let signer = signer_with(config);
        assert!(matches!(
            signer.sign(session_claims()),
            Err(TokenError::Configuration(_))
        ));
    }

    #[test]
    fn missing_private_key_is_a_key_error() {
        let mut config = test_config();
        config.private_keys.clear();
        let signer = signer_with(config);
        assert!(matches!(
            signer.sign(session_claims()),
            Err(TokenError::Key(_))
        ));
    }
}
