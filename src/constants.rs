//! # CRI Helper Constants
//!
//! Defines the defaults, limits, and reported strings used by the translation
//! helpers. These constants are the **single source of truth** for values that
//! end up in persisted image records or in the status reported to the kubelet.
//!
//! ## Modification Guidelines
//!
//! Before modifying any constant:
//! 1. Check whether the value is persisted (image records) or reported
//!    (condition reasons). Changing those breaks compatibility with existing
//!    state and with kubelet-side expectations.
//! 2. Update dependent tests in `tests/constants_tests.rs`.
//!
//! ## Cross-References
//!
//! - [`crate::reference`]: Uses registry defaults and validation patterns
//! - [`crate::repo`]: Uses schema-1 media types
//! - [`crate::streaming`]: Uses FIFO permissions
//! - [`crate::status`]: Uses condition reasons and messages
//! - [`crate::service`]: Uses service defaults

// =============================================================================
// Image Reference Defaults
// =============================================================================
//
// Applied by the reference normalizer when a raw reference omits a component.
// `docker.io/library/<name>:latest` is the canonical form of a bare name.
// =============================================================================

/// Registry host substituted when a reference names no host.
pub const DEFAULT_REGISTRY_HOST: &str = "docker.io";

/// Namespace prepended to single-segment repositories on the default registry.
pub const DEFAULT_NAMESPACE: &str = "library";

/// Tag applied when a reference carries neither tag nor digest.
pub const DEFAULT_TAG: &str = "latest";

// =============================================================================
// Validation Patterns
// =============================================================================
//
// Checked before a reference reaches the grammar. All validation is
// allowlist-based (only listed characters permitted).
// =============================================================================

/// Maximum image reference length in bytes.
///
/// **Security**: Prevents overly long references from reaching the parser or
/// being persisted in image records.
pub const MAX_IMAGE_REF_LEN: usize = 512;

/// Valid characters for image references.
///
/// Includes: `a-z`, `A-Z`, `0-9`, `-`, `_`, `.`, `/`, `:`, `@`
///
/// The `@` is for digest references like `busybox@sha256:abc...`.
/// The `:` is for tags and registry ports like `localhost:5000/app:v1`.
pub const IMAGE_REF_VALID_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-_./:@";

// =============================================================================
// Manifest Media Types
// =============================================================================

/// Docker schema-1 manifest media type.
///
/// Schema-1 manifests are not content-addressed by their digest unless the
/// reference itself pins one, so repo digests are not recorded for them.
pub const DOCKER_SCHEMA1_MANIFEST_MEDIA_TYPE: &str =
    "application/vnd.docker.distribution.manifest.v1+json";

/// Signed Docker schema-1 manifest media type.
pub const DOCKER_SCHEMA1_SIGNED_MANIFEST_MEDIA_TYPE: &str =
    "application/vnd.docker.distribution.manifest.v1+prettyjws";

// =============================================================================
// Streaming FIFOs
// =============================================================================

/// Permission bits for streaming FIFOs (owner read/write/execute only).
pub const FIFO_PERMISSIONS: u32 = 0o700;

// =============================================================================
// Runtime Conditions
// =============================================================================
//
// Reason strings are matched by the kubelet, keep them stable.
// =============================================================================

/// Reason reported when the runtime is not ready.
pub const RUNTIME_NOT_READY_REASON: &str = "ContainerdNotReady";

/// Reason reported when the network plugin is not ready.
pub const NETWORK_NOT_READY_REASON: &str = "NetworkPluginNotReady";

/// Message reported when the health endpoint answers but is not serving.
pub const RUNTIME_NOT_SERVING_MESSAGE: &str = "Containerd grpc server is not serving";

// =============================================================================
// Service Defaults
// =============================================================================

/// Image used for sandbox (pause) containers.
pub const DEFAULT_SANDBOX_IMAGE: &str = "gcr.io/google_containers/pause:3.0";

/// Containerd namespace used for all Kubernetes resources.
pub const K8S_CONTAINERD_NAMESPACE: &str = "k8s.io";

/// Root directory for files managed by the service.
pub const DEFAULT_ROOT_DIR: &str = "/var/lib/cri-containerd";

/// Maximum size of a service configuration document (1 MiB).
pub const MAX_CONFIG_SIZE: usize = 1024 * 1024;
