//! Claim payload types and the payload builders.
//!
//! The wire format is the conventional three-part signed token
//! (header.payload.signature). The claim body uses short names matching
//! the SSO deployments this crate interoperates with: `tok`, `sid`,
//! `uid`, `email`, `scopes` plus the standard `iss`/`aud`/`exp`/`iat`.

use serde::{Deserialize, Serialize};

use crate::identity::{Session, User};

/// The two kinds of token this engine issues and accepts.
///
/// Session tokens are only honored by the issuer itself; authorization
/// tokens may cross service boundaries and carry delegated scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Session,
    Authorization,
}

impl TokenKind {
    /// Wire value of the `tok` claim.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Session => "sess",
            TokenKind::Authorization => "auth",
        }
    }

    /// Parse a `tok` claim value. Anything outside the closed set is None.
    pub fn from_claim(value: &str) -> Option<Self> {
        match value {
            "sess" => Some(TokenKind::Session),
            "auth" => Some(TokenKind::Authorization),
            _ => None,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audience claim: a single recipient identity or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, identity: &str) -> bool {
        match self {
            Audience::One(aud) => aud == identity,
            Audience::Many(auds) => auds.iter().any(|a| a == identity),
        }
    }
}

/// A claim payload, before or after signing.
///
/// Everything is optional at the type level: a freshly built payload has
/// only the builder-filled claims, signing fills policy defaults, and
/// verification enforces which claims must be present. The `tok` claim
/// stays a free string on the wire so an unrecognized value is reported
/// as an unknown token type after signature verification, not as an
/// opaque parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Token kind discriminator ("sess" or "auth").
    #[serde(rename = "tok", default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Issuer: the identity that signs this token.
    #[serde(rename = "iss", default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// Intended recipient identity/identities.
    #[serde(rename = "aud", default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,

    /// Session record reference. Required; never defaulted.
    #[serde(rename = "sid", default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    /// User record reference. Required; never defaulted.
    #[serde(rename = "uid", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// User email at issuance time. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Delegated capability strings. Authorization tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,

    /// Expiration (unix seconds). Absent means the token never expires.
    #[serde(rename = "exp", default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,

    /// Issued at (unix seconds).
    #[serde(rename = "iat", default, skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<i64>,
}

impl Claims {
    /// Build a session payload for a session/user pair.
    ///
    /// Pure constructor: inputs are assumed to be already valid entities.
    pub fn session(session: &Session, user: &User) -> Self {
        Claims {
            token: Some(TokenKind::Session.as_str().to_string()),
            session_id: Some(session.id.clone()),
            user_id: Some(user.id.clone()),
            email: user.email.clone(),
            ..Claims::default()
        }
    }

    /// Build an authorization payload for a session/user pair.
    ///
    /// Starts with an empty scope list; callers add delegated scopes
    /// before signing.
    pub fn authorization(session: &Session, user: &User) -> Self {
        Claims {
            token: Some(TokenKind::Authorization.as_str().to_string()),
            session_id: Some(session.id.clone()),
            user_id: Some(user.id.clone()),
            email: user.email.clone(),
            scopes: Some(Vec::new()),
            ..Claims::default()
        }
    }

    /// The token kind, if the `tok` claim holds a known value.
    pub fn kind(&self) -> Option<TokenKind> {
        self.token.as_deref().and_then(TokenKind::from_claim)
    }
}
