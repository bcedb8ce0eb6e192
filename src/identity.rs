//! Mapping a verified payload to a live user.
//!
//! The user/session datastore is an external collaborator behind the
//! [`Directory`] trait; this module only fixes the lookup contract and
//! the failure policy. Every rejection reports the same generic
//! authentication error so a caller probing identities cannot tell an
//! unknown session from an unknown or deactivated user. The real reason
//! goes to the debug log only.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::claims::Claims;
use crate::config::TokenConfig;
use crate::error::TokenError;

/// A user identity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: String,

    /// Email address, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Whether the account is active. Inactive users never authenticate.
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

/// A session record referenced by session tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique identifier (the `sid` claim).
    pub id: String,

    /// User that owns this session.
    pub user_id: String,
}

/// Datastore collaborator for users and sessions.
///
/// `find_active_session` only returns sessions that are currently
/// active and belong to the given user; everything else is None.
pub trait Directory: Send + Sync {
    fn find_active_session(
        &self,
        session_id: &str,
        user_id: &str,
    ) -> Result<Option<Session>, TokenError>;

    fn find_user(&self, user_id: &str) -> Result<Option<User>, TokenError>;
}

/// Resolves a verified payload to an active user.
pub struct IdentityResolver {
    config: Arc<TokenConfig>,
    store: Arc<dyn Directory>,
}

impl IdentityResolver {
    pub fn new(config: Arc<TokenConfig>, store: Arc<dyn Directory>) -> Self {
        Self { config, store }
    }

    /// Produce the active user behind a verified payload.
    ///
    /// With `verify_session` on, the live session record is re-checked;
    /// otherwise the user is looked up directly. Either way, a missing
    /// id claim, a not-found record or an inactive user is the same
    /// generic failure.
    pub fn authenticate(&self, claims: &Claims) -> Result<User, TokenError> {
        let Some(user_id) = claims.user_id.as_deref().filter(|id| !id.is_empty()) else {
            debug!("payload carries no user id");
            return Err(TokenError::invalid_token());
        };

        let user = if self.config.verify_session {
            let Some(session_id) = claims.session_id.as_deref().filter(|id| !id.is_empty())
            else {
                debug!("payload carries no session id");
                return Err(TokenError::invalid_token());
            };

            let Some(session) = self.store.find_active_session(session_id, user_id)? else {
                debug!("no active session '{session_id}' for user '{user_id}'");
                return Err(TokenError::invalid_token());
            };
            let Some(user) = self.store.find_user(&session.user_id)? else {
                debug!("session '{session_id}' references missing user '{}'", session.user_id);
                return Err(TokenError::invalid_token());
            };
            user
        } else {
            let Some(user) = self.store.find_user(user_id)? else {
                debug!("no user '{user_id}'");
                return Err(TokenError::invalid_token());
            };
            user
        };

        if !user.active {
            debug!("user '{}' is inactive", user.id);
            return Err(TokenError::invalid_token());
        }

        Ok(user)
    }
}
