//! Reply predicates.
//!
//! The channel has no correlation id, so a reply is recognised by the
//! structural fields of its payload. These constructors cover the shapes
//! the server uses; any `Fn(&InboundMessage) -> bool` works as well.
//!
//! Two in-flight requests whose predicates accept the same shape will both
//! match the same reply.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

use crate::protocol::InboundMessage;

// ============================================================================
// Types
// ============================================================================

/// Boxed predicate, for building predicate lists at runtime.
pub type Predicate = Box<dyn Fn(&InboundMessage) -> bool + Send + Sync>;

// ============================================================================
// Constructors
// ============================================================================

/// Matches messages of the given kind.
#[must_use]
pub fn kind_is(kind: impl Into<String>) -> impl Fn(&InboundMessage) -> bool + Send + Sync + 'static {
    let kind = kind.into();
    move |message| message.kind == kind
}

/// Matches messages whose payload holds `expected` at a JSON pointer.
///
/// # Example
///
/// ```
/// use healing_socket::correlation::predicate::field_eq;
/// use healing_socket::InboundMessage;
///
/// let matches = field_eq("/ui/target", "session_store");
/// let msg = InboundMessage::decode(r#"{"ui":{"target":"session_store"}}"#);
/// assert!(matches(&msg));
/// ```
#[must_use]
pub fn field_eq(
    pointer: impl Into<String>,
    expected: impl Into<Value>,
) -> impl Fn(&InboundMessage) -> bool + Send + Sync + 'static {
    let pointer = pointer.into();
    let expected = expected.into();
    move |message| message.pointer(&pointer) == Some(&expected)
}

/// Matches messages whose top-level `"action"` equals `action`.
#[must_use]
pub fn action_is(
    action: impl Into<String>,
) -> impl Fn(&InboundMessage) -> bool + Send + Sync + 'static {
    field_eq("/action", action.into())
}

/// Matches UI directives `{ "ui": { "action": .., "target": .. } }`.
#[must_use]
pub fn ui_directive(
    action: impl Into<String>,
    target: impl Into<String>,
) -> impl Fn(&InboundMessage) -> bool + Send + Sync + 'static {
    let action = action.into();
    let target = target.into();
    move |message| {
        message.str_at("/ui/action") == Some(action.as_str())
            && message.str_at("/ui/target") == Some(target.as_str())
    }
}

/// Matches when every predicate matches. An empty list matches everything.
#[must_use]
pub fn all_of(predicates: Vec<Predicate>) -> impl Fn(&InboundMessage) -> bool + Send + Sync + 'static {
    move |message| predicates.iter().all(|predicate| predicate(message))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(raw: &str) -> InboundMessage {
        InboundMessage::decode(raw)
    }

    #[test]
    fn test_kind_is() {
        let is_text = kind_is("text");
        assert!(is_text(&msg("plain words")));
        assert!(!is_text(&msg(r#"{"a":1}"#)));
    }

    #[test]
    fn test_field_eq_nested_and_non_string() {
        let matches = field_eq("/data/code", 200);
        assert!(matches(&msg(r#"{"data":{"code":200}}"#)));
        assert!(!matches(&msg(r#"{"data":{"code":"200"}}"#)));
        assert!(!matches(&msg(r#"{"data":{}}"#)));
    }

    #[test]
    fn test_action_is() {
        let matches = action_is("Auth.LoginManager");
        assert!(matches(&msg(r#"{"action":"Auth.LoginManager"}"#)));
        assert!(!matches(&msg(r#"{"action":"Auth.Register"}"#)));
    }

    #[test]
    fn test_ui_directive_needs_both_fields() {
        let matches = ui_directive("HYDRATE", "session_store");
        assert!(matches(&msg(
            r#"{"ui":{"action":"HYDRATE","target":"session_store"}}"#
        )));
        assert!(!matches(&msg(r#"{"ui":{"action":"HYDRATE"}}"#)));
        assert!(!matches(&msg(
            r#"{"ui":{"action":"TOAST","target":"session_store"}}"#
        )));
    }

    #[test]
    fn test_all_of() {
        let matches = all_of(vec![
            Box::new(kind_is("notification")),
            Box::new(field_eq("/data/ok", true)),
        ]);
        assert!(matches(&msg(r#"{"type":"notification","data":{"ok":true}}"#)));
        assert!(!matches(&msg(r#"{"type":"notification","data":{"ok":false}}"#)));

        let anything = all_of(Vec::new());
        assert!(anything(&msg("x")));
    }
}
