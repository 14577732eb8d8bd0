//! Container user resolution.
//!
//! Image configs and container specs carry the user as `user[:group]`, where
//! `user` is either a numeric uid or a user name. Only the first field is
//! used; group resolution is left to the runtime.

use serde::{Deserialize, Serialize};

/// Identity resolved from a user string.
///
/// At most one field is populated. Both absent means the image does not
/// specify a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedUser {
    /// Numeric user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<i64>,
    /// Symbolic user name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ResolvedUser {
    /// Returns true if no identity was specified.
    pub fn is_unspecified(&self) -> bool {
        self.uid.is_none() && self.name.is_none()
    }
}

/// Resolves a `user[:group[:...]]` string.
///
/// Never fails: a first field that is not a base-10 integer is taken as a
/// user name verbatim. An empty first field resolves to no identity.
pub fn resolve_user(user: &str) -> ResolvedUser {
    let first = user.split(':').next().unwrap_or(user);
    if first.is_empty() {
        return ResolvedUser::default();
    }

    match first.parse::<i64>() {
        Ok(uid) => ResolvedUser {
            uid: Some(uid),
            name: None,
        },
        Err(_) => ResolvedUser {
            uid: None,
            name: Some(first.to_string()),
        },
    }
}
