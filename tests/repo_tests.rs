//! Tests for repo digest and repo tag derivation.

mod common;

use common::DIGEST;
use magikcri::{is_schema1_media_type, normalize_image_ref, repo_digest_and_tag};

// =============================================================================
// Decision Table
// =============================================================================

#[test]
fn test_repo_tag_empty_when_ref_has_no_tag() {
    let reference = format!("gcr.io/library/busybox@{}", DIGEST);
    let named = normalize_image_ref(&reference).unwrap();

    let (repo_digest, repo_tag) = repo_digest_and_tag(&named, DIGEST, false);

    assert_eq!(repo_digest, reference);
    assert_eq!(repo_tag, "");
}

#[test]
fn test_repo_tag_set_when_ref_has_tag() {
    let named = normalize_image_ref("gcr.io/library/busybox:latest").unwrap();

    let (repo_digest, repo_tag) = repo_digest_and_tag(&named, DIGEST, false);

    assert_eq!(repo_digest, format!("gcr.io/library/busybox@{}", DIGEST));
    assert_eq!(repo_tag, "gcr.io/library/busybox:latest");
}

#[test]
fn test_repo_digest_empty_for_schema1_without_digest() {
    let named = normalize_image_ref("gcr.io/library/busybox:latest").unwrap();

    let (repo_digest, repo_tag) = repo_digest_and_tag(&named, DIGEST, true);

    assert_eq!(repo_digest, "");
    assert_eq!(repo_tag, "gcr.io/library/busybox:latest");
}

#[test]
fn test_repo_digest_kept_for_schema1_with_digest() {
    // The reference's own digest is recorded, not the resolved one.
    let own = "sha256:e6693c20186f837fc393390135d8a598a96a833917917789d63766cab6c59594";
    let reference = format!("gcr.io/library/busybox@{}", own);
    let named = normalize_image_ref(&reference).unwrap();

    let (repo_digest, repo_tag) = repo_digest_and_tag(&named, DIGEST, true);

    assert_eq!(repo_digest, reference);
    assert_eq!(repo_tag, "");
}

#[test]
fn test_repo_names_use_defaults_for_short_refs() {
    let named = normalize_image_ref("busybox").unwrap();

    let (repo_digest, repo_tag) = repo_digest_and_tag(&named, DIGEST, false);

    assert_eq!(repo_digest, format!("docker.io/library/busybox@{}", DIGEST));
    assert_eq!(repo_tag, "docker.io/library/busybox:latest");
}

// =============================================================================
// Schema-1 Detection
// =============================================================================

#[test]
fn test_schema1_detection_feeds_resolver() {
    let named = normalize_image_ref("busybox:1.36").unwrap();
    let schema1 = is_schema1_media_type("application/vnd.docker.distribution.manifest.v1+prettyjws");

    let (repo_digest, _) = repo_digest_and_tag(&named, DIGEST, schema1);
    assert!(repo_digest.is_empty());
}
