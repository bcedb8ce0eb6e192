//! Key resolution: issuer → key reference → raw key bytes.
//!
//! An issuer owns one or more key references (supporting rotation). A
//! reference is a file-name-style string; its derived key id is the
//! reference with a trailing `.pem` stripped. The same resolver serves
//! both the signing (private) and verification (public) pools, which are
//! separate mappings over the same issuer space.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

use crate::error::TokenError;

/// Storage collaborator that turns a key reference into raw key bytes.
///
/// Key references are immutable for the process lifetime, so callers may
/// cache reads; the engine itself does not.
pub trait KeyStore: Send + Sync {
    fn read(&self, reference: &str) -> Result<Vec<u8>, TokenError>;
}

/// Key store backed by the filesystem.
///
/// References are resolved under `root` when one is configured, else
/// treated as direct paths.
pub struct FsKeyStore {
    root: Option<PathBuf>,
}

impl FsKeyStore {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }
}

impl KeyStore for FsKeyStore {
    fn read(&self, reference: &str) -> Result<Vec<u8>, TokenError> {
        let path = match &self.root {
            Some(root) => root.join(reference),
            None => PathBuf::from(reference),
        };
        fs::read(&path)
            .map_err(|e| TokenError::Key(format!("cannot read key file {}: {}", path.display(), e)))
    }
}

/// Derive the key id carried in token headers from a key reference.
///
/// Purely textual: strip a known suffix, else the id is the reference
/// verbatim.
pub fn derive_key_id(reference: &str) -> &str {
    const SUFFIXES: &[&str] = &[".pem"];
    for suffix in SUFFIXES {
        if reference.len() >= suffix.len() {
            let (stem, tail) = reference.split_at(reference.len() - suffix.len());
            if tail.eq_ignore_ascii_case(suffix) {
                return stem;
            }
        }
    }
    reference
}

/// Key material resolved for one issuer, plus the id to advertise.
#[derive(Debug)]
pub struct ResolvedKey {
    pub bytes: Vec<u8>,
    pub key_id: String,
}

/// Resolver over a statically configured issuer → key-reference mapping.
pub struct KeyRing {
    keys: HashMap<String, Vec<String>>,
    store: Arc<dyn KeyStore>,
}

impl KeyRing {
    pub fn new(keys: HashMap<String, Vec<String>>, store: Arc<dyn KeyStore>) -> Self {
        Self { keys, store }
    }

    /// Resolve key material for an issuer.
    ///
    /// With a `key_id`, candidates are filtered to those whose reference
    /// or derived id matches. Without one, or after filtering, the first
    /// candidate wins.
    pub fn resolve(&self, issuer: &str, key_id: Option<&str>) -> Result<ResolvedKey, TokenError> {
        let references = self
            .keys
            .get(issuer)
            .filter(|refs| !refs.is_empty())
            .ok_or_else(|| TokenError::Key(format!("no keys defined for issuer '{issuer}'")))?;

        let reference = match key_id {
            Some(kid) => references
                .iter()
                .find(|r| kid == r.as_str() || kid == derive_key_id(r))
                .ok_or_else(|| {
                    TokenError::Key(format!("no key of issuer '{issuer}' matches key id '{kid}'"))
                })?,
            None => &references[0],
        };

        let bytes = self.store.read(reference)?;
        Ok(ResolvedKey {
            bytes,
            key_id: derive_key_id(reference).to_string(),
        })
    }
}

/// Build a signing key from raw key bytes for the configured algorithm.
///
/// HMAC algorithms consume the bytes as the shared secret; asymmetric
/// algorithms expect PEM.
pub(crate) fn encoding_key(alg: Algorithm, bytes: &[u8]) -> Result<EncodingKey, TokenError> {
    let key = match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            return Ok(EncodingKey::from_secret(bytes));
        }
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => EncodingKey::from_rsa_pem(bytes),
        Algorithm::ES256 | Algorithm::ES384 => EncodingKey::from_ec_pem(bytes),
        Algorithm::EdDSA => EncodingKey::from_ed_pem(bytes),
    };
    key.map_err(|e| TokenError::Key(format!("invalid private key: {e}")))
}

/// Build a verification key from raw key bytes. Same family rules as
/// [`encoding_key`].
pub(crate) fn decoding_key(alg: Algorithm, bytes: &[u8]) -> Result<DecodingKey, TokenError> {
    let key = match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
            return Ok(DecodingKey::from_secret(bytes));
        }
        Algorithm::RS256
        | Algorithm::RS384
        | Algorithm::RS512
        | Algorithm::PS256
        | Algorithm::PS384
        | Algorithm::PS512 => DecodingKey::from_rsa_pem(bytes),
        Algorithm::ES256 | Algorithm::ES384 => DecodingKey::from_ec_pem(bytes),
        Algorithm::EdDSA => DecodingKey::from_ed_pem(bytes),
    };
    key.map_err(|e| TokenError::Key(format!("invalid public key: {e}")))
}
