//! # Image Reference Normalization
//!
//! Canonicalizes raw image references into the fully qualified form that is
//! persisted in image records and reported back to the kubelet.
//!
//! ## Rules
//!
//! | Input                        | Output                                   |
//! |------------------------------|------------------------------------------|
//! | `busybox`                    | `docker.io/library/busybox:latest`       |
//! | `library/busybox`            | `docker.io/library/busybox:latest`       |
//! | `docker.io/busybox:1.36`     | `docker.io/library/busybox:1.36`         |
//! | `busybox@sha256:...`         | `docker.io/library/busybox@sha256:...`   |
//! | `gcr.io/library/busybox`     | `gcr.io/library/busybox:latest`          |
//! | `gcr.io/a/b:latest@sha256:...` | `gcr.io/a/b@sha256:...`                |
//!
//! 1. A missing host becomes the default registry host.
//! 2. A single-segment repository on the default host gains the default
//!    namespace.
//! 3. A reference with neither tag nor digest gains the default tag.
//! 4. A reference with both tag and digest keeps only the digest.
//!
//! The canonical string must re-parse with the same grammar into the same
//! components, otherwise normalization fails. This keeps it idempotent.
//!
//! ## Grammar
//!
//! The reference grammar itself is a [`ReferenceGrammar`] collaborator. The
//! default [`OciReferenceGrammar`] is backed by `oci_distribution::Reference`.

use crate::constants::{
    DEFAULT_NAMESPACE, DEFAULT_REGISTRY_HOST, DEFAULT_TAG, IMAGE_REF_VALID_CHARS,
    MAX_IMAGE_REF_LEN,
};
use crate::error::{Error, Result};
use oci_distribution::Reference;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// Grammar Capability
// =============================================================================

/// Components of a reference as seen by the grammar, before defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReference {
    /// Registry host, if the reference named one explicitly.
    pub host: Option<String>,
    /// Repository path (one or more `/`-separated segments).
    pub path: String,
    /// Tag, if present.
    pub tag: Option<String>,
    /// Digest, if present.
    pub digest: Option<String>,
}

/// Parsing and formatting capability for image references.
///
/// Implementations must accept every string produced by [`format`] for a
/// reference that has a host, so that canonical forms round-trip.
///
/// [`format`]: ReferenceGrammar::format
pub trait ReferenceGrammar: Send + Sync {
    /// Splits a reference string into its components.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidImageReference`] if the string does not conform to the
    /// grammar.
    fn parse(&self, reference: &str) -> Result<ParsedReference>;

    /// Serializes components back into a reference string.
    fn format(&self, parsed: &ParsedReference) -> String {
        format_components(
            parsed.host.as_deref(),
            &parsed.path,
            parsed.tag.as_deref(),
            parsed.digest.as_deref(),
        )
    }
}

/// Docker distribution reference grammar, via `oci-distribution`.
///
/// `oci-distribution` fills in `docker.io` and `library/` on its own. This
/// wrapper reports the host as absent when the raw string did not name one,
/// so the normalizer can apply its own configured defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct OciReferenceGrammar;

impl ReferenceGrammar for OciReferenceGrammar {
    fn parse(&self, reference: &str) -> Result<ParsedReference> {
        let parsed: Reference = reference
            .parse()
            .map_err(|e| Error::InvalidImageReference {
                reference: reference.to_string(),
                reason: format!("{}", e),
            })?;

        let name = reference.split('@').next().unwrap_or(reference);
        let (host, path) = if has_explicit_host(name) {
            (
                Some(parsed.registry().to_string()),
                parsed.repository().to_string(),
            )
        } else if name.contains('/') {
            (None, parsed.repository().to_string())
        } else {
            // Single name: undo the implicit `library/` the grammar applied.
            let repository = parsed.repository();
            let path = repository
                .strip_prefix(&format!("{}/", DEFAULT_NAMESPACE))
                .unwrap_or(repository);
            (None, path.to_string())
        };

        // `oci-distribution` reports `latest` for untagged input.
        let last_segment = name.rsplit('/').next().unwrap_or(name);
        let tag = if last_segment.contains(':') {
            parsed.tag().map(str::to_string)
        } else {
            None
        };

        Ok(ParsedReference {
            host,
            path,
            tag,
            digest: parsed.digest().map(str::to_string),
        })
    }
}

/// Returns true if the first path component of `name` is a registry host.
///
/// Follows the distribution convention: a host contains `.` or `:`, or is
/// `localhost`.
fn has_explicit_host(name: &str) -> bool {
    match name.split_once('/') {
        Some((first, _)) => is_registry_host(first),
        None => false,
    }
}

/// Returns true if `segment` reads as a registry host rather than a
/// repository path component.
pub(crate) fn is_registry_host(segment: &str) -> bool {
    segment.contains(['.', ':']) || segment == "localhost"
}

fn format_components(
    host: Option<&str>,
    path: &str,
    tag: Option<&str>,
    digest: Option<&str>,
) -> String {
    let mut s = String::new();
    if let Some(host) = host {
        s.push_str(host);
        s.push('/');
    }
    s.push_str(path);
    if let Some(tag) = tag {
        s.push(':');
        s.push_str(tag);
    }
    if let Some(digest) = digest {
        s.push('@');
        s.push_str(digest);
    }
    s
}

// =============================================================================
// Normalized Reference
// =============================================================================

/// A fully qualified image reference.
///
/// Produced only by normalization: `registry` and `repository` are always
/// populated, and `tag` is present whenever `digest` is absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    registry: String,
    repository: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageReference {
    /// Registry host, e.g. `docker.io`.
    pub fn registry(&self) -> &str {
        &self.registry
    }

    /// Repository path, e.g. `library/busybox`.
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Tag, if the reference is tag-qualified.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Digest, if the reference is digest-qualified.
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// Repository name without tag or digest, e.g. `docker.io/library/busybox`.
    pub fn name(&self) -> String {
        format!("{}/{}", self.registry, self.repository)
    }

    fn to_parsed(&self) -> ParsedReference {
        ParsedReference {
            host: Some(self.registry.clone()),
            path: self.repository.clone(),
            tag: self.tag.clone(),
            digest: self.digest.clone(),
        }
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_components(
            Some(&self.registry),
            &self.repository,
            self.tag(),
            self.digest(),
        ))
    }
}

impl std::str::FromStr for ImageReference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        normalize_image_ref(s)
    }
}

// =============================================================================
// Normalizer
// =============================================================================

/// Defaults applied to references that omit a component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceDefaults {
    /// Host substituted when none is named.
    pub registry: String,
    /// Namespace prepended to single-segment repositories on `registry`.
    pub namespace: String,
    /// Tag applied when neither tag nor digest is present.
    pub tag: String,
}

impl Default for ReferenceDefaults {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY_HOST.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            tag: DEFAULT_TAG.to_string(),
        }
    }
}

/// Reference normalizer bound to a grammar and a set of defaults.
#[derive(Clone)]
pub struct ReferenceNormalizer {
    grammar: Arc<dyn ReferenceGrammar>,
    defaults: ReferenceDefaults,
}

impl ReferenceNormalizer {
    /// Creates a normalizer with the given grammar and defaults.
    pub fn new(grammar: Arc<dyn ReferenceGrammar>, defaults: ReferenceDefaults) -> Self {
        Self { grammar, defaults }
    }

    /// Returns the defaults this normalizer applies.
    pub fn defaults(&self) -> &ReferenceDefaults {
        &self.defaults
    }

    /// Normalizes a raw reference into its fully qualified form.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidImageReference`] if the reference is empty, too long,
    /// contains characters outside [`IMAGE_REF_VALID_CHARS`], or is rejected
    /// by the grammar.
    pub fn normalize(&self, raw: &str) -> Result<ImageReference> {
        validate_image_ref(raw)?;

        let parsed = self.grammar.parse(raw)?;

        let registry = parsed
            .host
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| self.defaults.registry.clone());

        let repository = if registry == self.defaults.registry && !parsed.path.contains('/') {
            format!("{}/{}", self.defaults.namespace, parsed.path)
        } else {
            parsed.path
        };

        let (tag, digest) = match (parsed.tag, parsed.digest) {
            (_, Some(digest)) => (None, Some(digest)),
            (Some(tag), None) => (Some(tag), None),
            (None, None) => (Some(self.defaults.tag.clone()), None),
        };

        let normalized = ImageReference {
            registry,
            repository,
            tag,
            digest,
        };

        let expected = normalized.to_parsed();
        let canonical = self.grammar.format(&expected);
        let reparsed = self
            .grammar
            .parse(&canonical)
            .map_err(|e| Error::InvalidImageReference {
                reference: raw.to_string(),
                reason: format!("canonical form '{}' does not re-parse: {}", canonical, e),
            })?;
        if reparsed != expected {
            return Err(Error::InvalidImageReference {
                reference: raw.to_string(),
                reason: format!(
                    "canonical form '{}' re-parses as {:?}",
                    canonical, reparsed
                ),
            });
        }

        debug!("Normalized image reference {} -> {}", raw, canonical);
        Ok(normalized)
    }
}

impl Default for ReferenceNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(OciReferenceGrammar), ReferenceDefaults::default())
    }
}

impl std::fmt::Debug for ReferenceNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceNormalizer")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

/// Normalizes a reference with the OCI grammar and the default registry,
/// namespace, and tag.
///
/// # Example
///
/// ```rust
/// let image = magikcri::normalize_image_ref("busybox").unwrap();
/// assert_eq!(image.to_string(), "docker.io/library/busybox:latest");
/// ```
pub fn normalize_image_ref(raw: &str) -> Result<ImageReference> {
    ReferenceNormalizer::default().normalize(raw)
}

/// Checks length and character set before a reference reaches the grammar.
fn validate_image_ref(raw: &str) -> Result<()> {
    if raw.is_empty() {
        return Err(Error::InvalidImageReference {
            reference: String::new(),
            reason: "reference is empty".to_string(),
        });
    }

    if raw.len() > MAX_IMAGE_REF_LEN {
        return Err(Error::InvalidImageReference {
            reference: raw.to_string(),
            reason: format!("exceeds {} bytes", MAX_IMAGE_REF_LEN),
        });
    }

    if !raw.chars().all(|c| IMAGE_REF_VALID_CHARS.contains(c)) {
        return Err(Error::InvalidImageReference {
            reference: raw.to_string(),
            reason: "contains invalid characters".to_string(),
        });
    }

    Ok(())
}
