//! Test doubles for the injected collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use magikcri::{
    BoxError, Fifo, FifoAccess, FifoOptions, HealthChecker, NetworkPlugin, OsInterface,
    ServingStatus,
};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

pub const DIGEST: &str = "sha256:e6693c20186f837fc393390135d8a598a96a833917917789d63766cab6c59582";

/// Routes `tracing` output to the test harness. Set `RUST_LOG=magikcri=debug`
/// to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Fake OS
// =============================================================================

type OpenState = Arc<Mutex<HashMap<PathBuf, bool>>>;

/// Marks its path closed when dropped.
struct CloseGuard {
    path: PathBuf,
    state: OpenState,
}

impl Drop for CloseGuard {
    fn drop(&mut self) {
        self.state.lock().unwrap().insert(self.path.clone(), false);
    }
}

/// Wraps an in-memory stream so its close is observable.
struct Tracked<T> {
    inner: T,
    _guard: CloseGuard,
}

impl<T: AsyncRead + Unpin> AsyncRead for Tracked<T> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<T: AsyncWrite + Unpin> AsyncWrite for Tracked<T> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

/// In-memory [`OsInterface`] that records opens and closes.
#[derive(Default)]
pub struct FakeOs {
    calls: Mutex<Vec<(PathBuf, FifoOptions)>>,
    failures: HashMap<PathBuf, String>,
    hangs: HashSet<PathBuf>,
    state: OpenState,
    wrong_direction: bool,
}

impl FakeOs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails opens of `path` with `message`.
    pub fn fail_on(mut self, path: &str, message: &str) -> Self {
        self.failures.insert(PathBuf::from(path), message.to_string());
        self
    }

    /// Never completes opens of `path`.
    pub fn hang_on(mut self, path: &str) -> Self {
        self.hangs.insert(PathBuf::from(path));
        self
    }

    /// Returns the opposite end from the one requested.
    pub fn wrong_direction(mut self) -> Self {
        self.wrong_direction = true;
        self
    }

    /// Every open attempt, in order.
    pub fn calls(&self) -> Vec<(PathBuf, FifoOptions)> {
        self.calls.lock().unwrap().clone()
    }

    /// Whether `path` is currently open. `None` if it was never opened.
    pub fn is_open(&self, path: &str) -> Option<bool> {
        self.state.lock().unwrap().get(Path::new(path)).copied()
    }

    /// Number of handles currently open.
    pub fn open_count(&self) -> usize {
        self.state.lock().unwrap().values().filter(|open| **open).count()
    }
}

#[async_trait]
impl OsInterface for FakeOs {
    async fn open_fifo(&self, path: &Path, options: &FifoOptions) -> io::Result<Fifo> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_path_buf(), *options));

        if let Some(message) = self.failures.get(path) {
            return Err(io::Error::other(message.clone()));
        }

        if self.hangs.contains(path) {
            std::future::pending::<()>().await;
        }

        self.state
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), true);
        let guard = CloseGuard {
            path: path.to_path_buf(),
            state: self.state.clone(),
        };

        let access = match (options.access, self.wrong_direction) {
            (access, false) => access,
            (FifoAccess::Read, true) => FifoAccess::Write,
            (FifoAccess::Write, true) => FifoAccess::Read,
        };

        Ok(match access {
            FifoAccess::Read => Fifo::Reader(Box::new(Tracked {
                inner: tokio::io::empty(),
                _guard: guard,
            })),
            FifoAccess::Write => Fifo::Writer(Box::new(Tracked {
                inner: tokio::io::sink(),
                _guard: guard,
            })),
        })
    }
}

// =============================================================================
// Fake Health Checker / Network Plugin
// =============================================================================

/// Canned collaborator answer.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Err(String),
    Hang,
}

pub struct FakeHealth(pub Reply<ServingStatus>);

#[async_trait]
impl HealthChecker for FakeHealth {
    async fn check(&self) -> Result<ServingStatus, BoxError> {
        match &self.0 {
            Reply::Ok(status) => Ok(*status),
            Reply::Err(message) => Err(message.clone().into()),
            Reply::Hang => std::future::pending().await,
        }
    }
}

pub struct FakeNetwork(pub Reply<()>);

#[async_trait]
impl NetworkPlugin for FakeNetwork {
    async fn status(&self) -> Result<(), BoxError> {
        match &self.0 {
            Reply::Ok(()) => Ok(()),
            Reply::Err(message) => Err(message.clone().into()),
            Reply::Hang => std::future::pending().await,
        }
    }
}
