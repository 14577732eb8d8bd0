//! Repo digest and repo tag derivation.
//!
//! An image record carries two canonical names alongside its content digest:
//! the repo digest (`name@digest`) and the repo tag (`name:tag`). Which of
//! them is recorded depends on how the image was referenced and on the
//! manifest format it was pulled with:
//!
//! | ref has digest | schema1 | repo tag   | repo digest        |
//! |----------------|---------|------------|--------------------|
//! | yes            | any     | `""`       | the reference      |
//! | no             | false   | `name:tag` | `name@digest`      |
//! | no             | true    | `name:tag` | `""`               |
//!
//! A schema-1 manifest pulled by tag cannot be trusted to match the digest
//! computed locally, so no repo digest is recorded for it.

use crate::constants::{
    DOCKER_SCHEMA1_MANIFEST_MEDIA_TYPE, DOCKER_SCHEMA1_SIGNED_MANIFEST_MEDIA_TYPE,
};
use crate::error::{Error, Result};
use crate::reference::ImageReference;

/// Derives `(repo_digest, repo_tag)` for a normalized reference.
///
/// `digest` is the content digest resolved during the pull. It is ignored
/// when the reference is itself digest-qualified. Either returned string may
/// be empty.
pub fn repo_digest_and_tag(
    reference: &ImageReference,
    digest: &str,
    schema1: bool,
) -> (String, String) {
    if reference.digest().is_some() {
        return (reference.to_string(), String::new());
    }

    let repo_tag = match reference.tag() {
        Some(tag) => format!("{}:{}", reference.name(), tag),
        None => String::new(),
    };

    let repo_digest = if schema1 {
        String::new()
    } else {
        format!("{}@{}", reference.name(), digest)
    };

    (repo_digest, repo_tag)
}

/// Returns true for Docker schema-1 manifest media types.
pub fn is_schema1_media_type(media_type: &str) -> bool {
    media_type == DOCKER_SCHEMA1_MANIFEST_MEDIA_TYPE
        || media_type == DOCKER_SCHEMA1_SIGNED_MANIFEST_MEDIA_TYPE
}

/// Validates a content digest of the form `<algorithm>:<hex>`.
///
/// `sha256` and `sha512` digests must have the exact hex length for their
/// algorithm; other algorithms only need a non-empty lowercase hex part.
pub fn validate_digest(digest: &str) -> Result<()> {
    let (algo, hex) = digest
        .split_once(':')
        .ok_or_else(|| Error::InvalidDigest {
            digest: digest.to_string(),
            reason: "missing algorithm prefix".to_string(),
        })?;

    if algo.is_empty()
        || !algo
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "+._-".contains(c))
    {
        return Err(Error::InvalidDigest {
            digest: digest.to_string(),
            reason: format!("invalid algorithm '{}'", algo),
        });
    }

    let expected_len = match algo {
        "sha256" => Some(64),
        "sha512" => Some(128),
        _ => None,
    };

    if let Some(len) = expected_len.filter(|len| hex.len() != *len) {
        return Err(Error::InvalidDigest {
            digest: digest.to_string(),
            reason: format!("{} digest must be {} hex characters", algo, len),
        });
    }

    if hex.is_empty() || !hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')) {
        return Err(Error::InvalidDigest {
            digest: digest.to_string(),
            reason: "digest must be lowercase hex".to_string(),
        });
    }

    Ok(())
}
