//! Session hydration payloads.
//!
//! After a successful sign-in the server pushes a UI directive asking the
//! client to hydrate its session store:
//!
//! ```json
//! {
//!   "ui": { "action": "HYDRATE", "target": "session_store" },
//!   "data": { "userId": "u1", "accessToken": "tok" }
//! }
//! ```
//!
//! The reply carries no request id, so it is recognised by shape alone.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::correlation::predicate::ui_directive;

use super::InboundMessage;

// ============================================================================
// Constants
// ============================================================================

/// UI action asking the client to load session data.
pub const HYDRATE_ACTION: &str = "HYDRATE";

/// UI target naming the session store.
pub const SESSION_STORE_TARGET: &str = "session_store";

// ============================================================================
// SessionGrant
// ============================================================================

/// Credentials carried by a session hydration message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    /// Authenticated user.
    pub user_id: String,
    /// Bearer token for later requests.
    pub access_token: String,
}

impl SessionGrant {
    /// Extracts a grant from a hydration message's `data` field.
    ///
    /// Returns `None` if the message is not a hydration directive or the
    /// data is incomplete.
    #[must_use]
    pub fn from_message(message: &InboundMessage) -> Option<Self> {
        if !is_session_hydration(message) {
            return None;
        }

        message
            .data()
            .cloned()
            .and_then(|data| serde_json::from_value(data).ok())
    }
}

// ============================================================================
// Predicates
// ============================================================================

/// Returns `true` for `HYDRATE` directives aimed at the session store.
#[must_use]
pub fn is_session_hydration(message: &InboundMessage) -> bool {
    message.str_at("/ui/action") == Some(HYDRATE_ACTION)
        && message.str_at("/ui/target") == Some(SESSION_STORE_TARGET)
}

/// Predicate matching session hydration directives, for correlated requests.
#[must_use]
pub fn hydrate_session() -> impl Fn(&InboundMessage) -> bool + Send + Sync + 'static {
    ui_directive(HYDRATE_ACTION, SESSION_STORE_TARGET)
}

// ============================================================================
// Tests
// ============================================================================
