//! # magikcri
//!
//! **CRI Translation Helpers**
//!
//! Deterministic helpers that sit between the raw identifiers a CRI client
//! sends and the canonical forms a container service persists and reports.
//! Container lifecycle, persistent stores, and the network plugin itself are
//! external collaborators, consumed through traits.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           CriHelpers                                │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌────────────────────┐   ┌─────────────────────┐                   │
//! │  │ ReferenceNormalizer│──►│ repo_digest_and_tag │   resolve_user    │
//! │  │  (ReferenceGrammar)│   │  (schema-1 aware)   │   (uid | name)    │
//! │  └────────────────────┘   └─────────────────────┘                   │
//! │                                                                     │
//! │  ┌────────────────────────────┐   ┌─────────────────────────────┐   │
//! │  │  prepare_streaming_pipes   │   │      StatusAggregator       │   │
//! │  │  stdin/stdout/stderr FIFOs │   │  RuntimeReady, NetworkReady │   │
//! │  │  all-or-nothing            │   │  never fails on collaborator│   │
//! │  └─────────────┬──────────────┘   └───────┬──────────────┬──────┘   │
//! ├────────────────┼──────────────────────────┼──────────────┼──────────┤
//! │          OsInterface               HealthChecker   NetworkPlugin    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Canonical Forms
//!
//! | Raw                   | Normalized                              |
//! |-----------------------|-----------------------------------------|
//! | `busybox`             | `docker.io/library/busybox:latest`      |
//! | `busybox@sha256:...`  | `docker.io/library/busybox@sha256:...`  |
//! | `gcr.io/a/b`          | `gcr.io/a/b:latest`                     |
//!
//! # Cancellation
//!
//! Blocking points (FIFO opens, collaborator calls) race a
//! [`tokio_util::sync::CancellationToken`]. Cancellation yields
//! [`Error::Cancelled`] after the same cleanup as any other failure.
//!
//! # Example
//!
//! ```rust,ignore
//! use magikcri::{CriHelpers, OciReferenceGrammar, RealOs, ServiceConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let helpers = CriHelpers::new(
//!     ServiceConfig::default(),
//!     Arc::new(RealOs),
//!     Arc::new(OciReferenceGrammar),
//!     health_checker,
//!     network_plugin,
//! )?;
//!
//! let names = helpers.image_names("busybox", &digest, false)?;
//! let status = helpers.status(&CancellationToken::new()).await?;
//! ```

pub mod constants;
pub mod error;
pub mod os;
pub mod reference;
pub mod repo;
pub mod service;
pub mod status;
pub mod streaming;
pub mod user;

// Re-exports
pub use constants::*;
pub use error::{BoxError, Error, Result, StreamKind};
pub use os::{Fifo, FifoAccess, FifoOptions, FifoReader, FifoWriter, OsInterface, RealOs};
pub use reference::{
    ImageReference, OciReferenceGrammar, ParsedReference, ReferenceDefaults, ReferenceGrammar,
    ReferenceNormalizer, normalize_image_ref,
};
pub use repo::{is_schema1_media_type, repo_digest_and_tag, validate_digest};
pub use service::{CriHelpers, ImageNames, ServiceConfig};
pub use status::{
    ConditionKind, HealthChecker, HealthCondition, NetworkPlugin, RuntimeStatus, ServingStatus,
    StatusAggregator,
};
pub use streaming::{PipeSet, prepare_streaming_pipes};
pub use user::{ResolvedUser, resolve_user};
