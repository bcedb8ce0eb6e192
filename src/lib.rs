//! Signed identity tokens for cooperating services.
//!
//! Issues and verifies session and authorization tokens that carry a
//! user identity, a session reference and optional delegated scopes.
//! Each issuer owns an asymmetric signing key (or a shared secret for
//! HMAC deployments); relying parties verify with the issuer's public
//! key, resolved by issuer identity plus an optional key id so keys can
//! rotate without a flag day.
//!
//! # Components
//!
//! - [`Claims`] + builders — construct the unsigned payload for a
//!   session or authorization token.
//! - [`TokenSigner`] — fill policy defaults, resolve the signing key,
//!   produce the encoded token.
//! - [`TokenVerifier`] — two-phase decode: an untrusted peek to learn
//!   issuer/key-id (and apply the issuer allow-list), then the
//!   cryptographic verification and claim-consistency checks.
//! - [`KeyRing`]/[`KeyStore`] — issuer → key-reference resolution over
//!   pluggable key storage.
//! - [`IdentityResolver`]/[`Directory`] — map a verified payload to an
//!   active user against the external datastore.
//!
//! All engine types are immutable after construction and safe to share
//! across threads; policy lives in one explicit [`TokenConfig`] value.
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use sso_tokens::{Claims, FsKeyStore, TokenConfig, TokenSigner, TokenVerifier};
//!
//! let config = Arc::new(TokenConfig { /* policy */ ..TokenConfig::default() });
//! let store = Arc::new(FsKeyStore::new(config.key_store_root.clone()));
//!
//! let signer = TokenSigner::new(config.clone(), store.clone());
//! let token = signer.sign(Claims::session(&session, &user))?;
//!
//! let verifier = TokenVerifier::new(config, store);
//! let verified = verifier.verify(&token)?;
//! ```

pub mod claims;
pub mod config;
pub mod error;
pub mod identity;
pub mod keys;
pub mod sign;
pub mod verify;

pub use claims::{Audience, Claims, TokenKind};
pub use config::TokenConfig;
pub use error::TokenError;
pub use identity::{Directory, IdentityResolver, Session, User};
pub use keys::{FsKeyStore, KeyRing, KeyStore, ResolvedKey};
pub use sign::TokenSigner;
pub use verify::{TokenVerifier, UnverifiedToken, VerifiedToken};
