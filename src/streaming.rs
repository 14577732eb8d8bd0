//! Streaming FIFO provisioning for container process I/O.
//!
//! The shim attaches container stdio to named pipes. Before a container is
//! created the service opens its own end of each requested pipe:
//!
//! ```text
//!   service                          shim / container
//!   stdin  (Write) ──── fifo ────►   process stdin
//!   stdout (Read)  ◄─── fifo ─────   process stdout
//!   stderr (Read)  ◄─── fifo ─────   process stderr
//! ```
//!
//! # Atomicity
//!
//! [`prepare_streaming_pipes`] is all-or-nothing. Opened handles are held in
//! a local [`PipeSet`]; any early return (open failure, cancellation, wrong
//! handle direction) drops that set, which closes every FIFO opened so far
//! in the call. Callers never observe a partially populated set.

use crate::error::{Error, Result, StreamKind};
use crate::os::{Fifo, FifoAccess, FifoOptions, FifoReader, FifoWriter, OsInterface};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Service-side ends of a container's stdio FIFOs.
///
/// A field is populated iff its path was non-empty and the open succeeded.
/// Dropping the set closes all handles.
#[derive(Default)]
pub struct PipeSet {
    /// Writer into the container's stdin.
    pub stdin: Option<FifoWriter>,
    /// Reader of the container's stdout.
    pub stdout: Option<FifoReader>,
    /// Reader of the container's stderr.
    pub stderr: Option<FifoReader>,
}

impl PipeSet {
    /// Number of attached streams.
    pub fn len(&self) -> usize {
        usize::from(self.stdin.is_some())
            + usize::from(self.stdout.is_some())
            + usize::from(self.stderr.is_some())
    }

    /// Returns true if no stream is attached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn attach(&mut self, stream: StreamKind, path: &Path, fifo: Fifo) -> Result<()> {
        match (stream, fifo) {
            (StreamKind::Stdin, Fifo::Writer(w)) => self.stdin = Some(w),
            (StreamKind::Stdout, Fifo::Reader(r)) => self.stdout = Some(r),
            (StreamKind::Stderr, Fifo::Reader(r)) => self.stderr = Some(r),
            (stream, _) => {
                return Err(Error::PipeDirectionMismatch {
                    path: path.to_path_buf(),
                    expected: stream_access(stream),
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for PipeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeSet")
            .field("stdin", &self.stdin.is_some())
            .field("stdout", &self.stdout.is_some())
            .field("stderr", &self.stderr.is_some())
            .finish()
    }
}

/// Opens the service ends of the requested stdio FIFOs.
///
/// Empty paths are skipped. Opens happen in order stdin, stdout, stderr,
/// each with create, non-blocking, `0700` semantics: stdin is opened for
/// writing, stdout and stderr for reading.
///
/// # Errors
///
/// - [`Error::PipeOpenFailed`] if any open fails
/// - [`Error::Cancelled`] if `cancel` fires before all opens complete
/// - [`Error::PipeDirectionMismatch`] if the OS returns the wrong end
///
/// In every case all FIFOs opened by this call are closed before the error
/// is returned.
pub async fn prepare_streaming_pipes(
    os: &dyn OsInterface,
    cancel: &CancellationToken,
    stdin: &str,
    stdout: &str,
    stderr: &str,
) -> Result<PipeSet> {
    let mut pipes = PipeSet::default();

    for (stream, path) in [
        (StreamKind::Stdin, stdin),
        (StreamKind::Stdout, stdout),
        (StreamKind::Stderr, stderr),
    ] {
        if path.is_empty() {
            continue;
        }
        let path = Path::new(path);

        let attached = match open_stream(os, cancel, stream, path).await {
            Ok(fifo) => pipes.attach(stream, path, fifo),
            Err(e) => Err(e),
        };

        if let Err(e) = attached {
            warn!(
                "Closing {} already opened fifo(s) after {} failure: {}",
                pipes.len(),
                stream,
                e
            );
            return Err(e);
        }
    }

    Ok(pipes)
}

async fn open_stream(
    os: &dyn OsInterface,
    cancel: &CancellationToken,
    stream: StreamKind,
    path: &Path,
) -> Result<Fifo> {
    let options = match stream_access(stream) {
        FifoAccess::Write => FifoOptions::writer(),
        FifoAccess::Read => FifoOptions::reader(),
    };

    debug!("Opening {} fifo {}", stream, path.display());

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled {
            operation: format!("open {} fifo {}", stream, path.display()),
        }),
        opened = os.open_fifo(path, &options) => opened.map_err(|source| Error::PipeOpenFailed {
            stream,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Direction the service opens a stream's FIFO in.
fn stream_access(stream: StreamKind) -> FifoAccess {
    match stream {
        StreamKind::Stdin => FifoAccess::Write,
        StreamKind::Stdout | StreamKind::Stderr => FifoAccess::Read,
    }
}
