//! Identity resolution: derive the evaluation identity for one request.
//!
//! Callers may send a user id and an email. Anything missing is filled in
//! from the session id so the same session always evaluates against the
//! same identity.

use cc_domain::identity::Identity;

/// Attribute name the email is attached under.
pub const EMAIL_ATTRIBUTE: &str = "email";
pub const FIRST_NAME_ATTRIBUTE: &str = "firstName";
pub const LAST_NAME_ATTRIBUTE: &str = "lastName";

/// Display name attached to every chat identity. Remote prompt templates
/// and targeting rules may reference these attributes.
pub const DEFAULT_FIRST_NAME: &str = "User";
pub const DEFAULT_LAST_NAME: &str = "Demo";

/// Build the identity for a request.
///
/// A non-blank `user_id` becomes the key; otherwise the key is
/// `user-<session_id>`. A non-blank `email` is attached as-is; otherwise a
/// placeholder `user-<session_id>@example.com` is used. The default first
/// and last name are always attached.
pub fn resolve_identity(user_id: Option<&str>, email: Option<&str>, session_id: &str) -> Identity {
    let key = match non_blank(user_id) {
        Some(id) => id.to_owned(),
        None => format!("user-{session_id}"),
    };
    let email = match non_blank(email) {
        Some(e) => e.to_owned(),
        None => format!("user-{session_id}@example.com"),
    };
    Identity::new(key)
        .with_attribute(FIRST_NAME_ATTRIBUTE, DEFAULT_FIRST_NAME)
        .with_attribute(LAST_NAME_ATTRIBUTE, DEFAULT_LAST_NAME)
        .with_attribute(EMAIL_ATTRIBUTE, email)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
