//! # CRI Helper Service
//!
//! Wires the translation helpers to their collaborators the way the
//! enclosing CRI service uses them. Every collaborator is injected through
//! [`CriHelpers::new`]; nothing is global.
//!
//! ## Configuration
//!
//! [`ServiceConfig`] is loaded from YAML (or JSON, a YAML subset):
//!
//! ```yaml
//! root_dir: /var/lib/cri-containerd
//! sandbox_image: gcr.io/google_containers/pause:3.0
//! containerd_namespace: k8s.io
//! registry:
//!   registry: docker.io
//!   namespace: library
//!   tag: latest
//! ```
//!
//! Every field is optional and falls back to [`crate::constants`].

use crate::constants::{
    DEFAULT_ROOT_DIR, DEFAULT_SANDBOX_IMAGE, K8S_CONTAINERD_NAMESPACE, MAX_CONFIG_SIZE,
};
use crate::error::{Error, Result};
use crate::os::OsInterface;
use crate::reference::{
    ImageReference, ReferenceDefaults, ReferenceGrammar, ReferenceNormalizer, is_registry_host,
};
use crate::repo::{repo_digest_and_tag, validate_digest};
use crate::status::{HealthChecker, NetworkPlugin, RuntimeStatus, StatusAggregator};
use crate::streaming::{PipeSet, prepare_streaming_pipes};
use crate::user::{ResolvedUser, resolve_user};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

// =============================================================================
// Configuration
// =============================================================================

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Directory for files managed by the service.
    pub root_dir: PathBuf,
    /// Image used for sandbox (pause) containers.
    pub sandbox_image: String,
    /// Containerd namespace for Kubernetes resources.
    pub containerd_namespace: String,
    /// Defaults applied during reference normalization.
    pub registry: ReferenceDefaults,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            sandbox_image: DEFAULT_SANDBOX_IMAGE.to_string(),
            containerd_namespace: K8S_CONTAINERD_NAMESPACE.to_string(),
            registry: ReferenceDefaults::default(),
        }
    }
}

impl ServiceConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// - Size exceeds `MAX_CONFIG_SIZE`
    /// - YAML parsing fails
    /// - A registry default is empty
    /// - The default registry is not recognizable as a host
    pub fn from_yaml(yaml: &[u8]) -> Result<Self> {
        if yaml.len() > MAX_CONFIG_SIZE {
            return Err(Error::InvalidConfig(format!(
                "config size {} exceeds limit of {}",
                yaml.len(),
                MAX_CONFIG_SIZE
            )));
        }

        let config: Self =
            serde_yaml::from_slice(yaml).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_yaml(&data)
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("registry.registry", &self.registry.registry),
            ("registry.namespace", &self.registry.namespace),
            ("registry.tag", &self.registry.tag),
            ("containerd_namespace", &self.containerd_namespace),
        ] {
            if value.is_empty() {
                return Err(Error::InvalidConfig(format!("{} cannot be empty", field)));
            }
        }
        if !is_registry_host(&self.registry.registry) {
            return Err(Error::InvalidConfig(format!(
                "registry.registry '{}' is not a registry host (needs '.', ':' or localhost)",
                self.registry.registry
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Image Names
// =============================================================================

/// Canonical names recorded for a pulled image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageNames {
    /// Normalized reference the image was pulled by.
    pub reference: String,
    /// `name@digest`, or empty.
    pub repo_digest: String,
    /// `name:tag`, or empty.
    pub repo_tag: String,
}

// =============================================================================
// Service
// =============================================================================

/// Translation helpers bound to their collaborators.
///
/// Stateless between calls and `Send + Sync`; share it behind an `Arc`.
pub struct CriHelpers {
    config: ServiceConfig,
    os: Arc<dyn OsInterface>,
    normalizer: ReferenceNormalizer,
    status: StatusAggregator,
    sandbox_image: ImageReference,
}

impl CriHelpers {
    /// Creates the helpers.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidImageReference`] if the configured sandbox image does
    /// not normalize.
    pub fn new(
        config: ServiceConfig,
        os: Arc<dyn OsInterface>,
        grammar: Arc<dyn ReferenceGrammar>,
        health: Arc<dyn HealthChecker>,
        network: Arc<dyn NetworkPlugin>,
    ) -> Result<Self> {
        let normalizer = ReferenceNormalizer::new(grammar, config.registry.clone());
        let sandbox_image = normalizer.normalize(&config.sandbox_image)?;

        info!(
            "CRI helpers initialized (namespace {}, sandbox image {})",
            config.containerd_namespace, sandbox_image
        );

        Ok(Self {
            config,
            os,
            normalizer,
            status: StatusAggregator::new(health, network),
            sandbox_image,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Normalized sandbox (pause) image.
    pub fn sandbox_image(&self) -> &ImageReference {
        &self.sandbox_image
    }

    /// Normalizes a raw image reference with the configured defaults.
    pub fn normalize(&self, raw: &str) -> Result<ImageReference> {
        self.normalizer.normalize(raw)
    }

    /// Derives the names an image record stores after a pull.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidImageReference`] if `raw` does not normalize
    /// - [`Error::InvalidDigest`] if `digest` is malformed
    pub fn image_names(&self, raw: &str, digest: &str, schema1: bool) -> Result<ImageNames> {
        let reference = self.normalize(raw)?;
        validate_digest(digest)?;

        let (repo_digest, repo_tag) = repo_digest_and_tag(&reference, digest, schema1);
        Ok(ImageNames {
            reference: reference.to_string(),
            repo_digest,
            repo_tag,
        })
    }

    /// Resolves a container user string.
    pub fn resolve_user(&self, user: &str) -> ResolvedUser {
        resolve_user(user)
    }

    /// Opens the service ends of a container's stdio FIFOs.
    ///
    /// See [`prepare_streaming_pipes`] for the all-or-nothing guarantee.
    pub async fn prepare_streaming_pipes(
        &self,
        cancel: &CancellationToken,
        stdin: &str,
        stdout: &str,
        stderr: &str,
    ) -> Result<PipeSet> {
        prepare_streaming_pipes(self.os.as_ref(), cancel, stdin, stdout, stderr).await
    }

    /// Reports runtime and network readiness.
    pub async fn status(&self, cancel: &CancellationToken) -> Result<RuntimeStatus> {
        self.status.status(cancel).await
    }
}

impl std::fmt::Debug for CriHelpers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CriHelpers")
            .field("config", &self.config)
            .field("sandbox_image", &self.sandbox_image)
            .finish_non_exhaustive()
    }
}
