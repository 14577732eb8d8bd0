//! OS capability for opening streaming FIFOs.
//!
//! The pipe manager never touches the filesystem directly; it goes through
//! [`OsInterface`] so tests can substitute a fake and observe every open and
//! close.
//!
//! [`RealOs`] creates the FIFO with `mkfifo(3)` when missing and opens it
//! through `tokio::net::unix::pipe`, which always opens non-blocking:
//!
//! | Access | tokio handle | Blocks for peer? |
//! |--------|--------------|------------------|
//! | Read   | `Receiver`   | No               |
//! | Write  | `Sender`     | No (opened read-write on Linux, so no `ENXIO` without a reader) |
//!
//! Because the Linux write end also holds a read descriptor, writes into
//! stdin never fail with `EPIPE` once the container's reader exits. Callers
//! must watch for process exit to stop feeding stdin.

use crate::constants::FIFO_PERMISSIONS;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncWrite};

/// Read end of a FIFO.
pub type FifoReader = Box<dyn AsyncRead + Send + Unpin>;

/// Write end of a FIFO.
pub type FifoWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Direction a FIFO is opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FifoAccess {
    /// `O_RDONLY`.
    Read,
    /// `O_WRONLY`.
    Write,
}

impl std::fmt::Display for FifoAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// How a FIFO is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FifoOptions {
    /// Direction.
    pub access: FifoAccess,
    /// Create the FIFO if it does not exist (`O_CREAT`).
    pub create: bool,
    /// Open without waiting for a peer (`O_NONBLOCK`).
    pub nonblocking: bool,
    /// Permission bits used on creation.
    pub mode: u32,
}

impl FifoOptions {
    /// Options for the read side of an output stream.
    pub fn reader() -> Self {
        Self {
            access: FifoAccess::Read,
            create: true,
            nonblocking: true,
            mode: FIFO_PERMISSIONS,
        }
    }

    /// Options for the write side of an input stream.
    pub fn writer() -> Self {
        Self {
            access: FifoAccess::Write,
            ..Self::reader()
        }
    }
}

/// An opened FIFO. Dropping it closes the descriptor.
pub enum Fifo {
    /// Read end.
    Reader(FifoReader),
    /// Write end.
    Writer(FifoWriter),
}

impl Fifo {
    /// Returns the direction this handle was opened in.
    pub fn access(&self) -> FifoAccess {
        match self {
            Self::Reader(_) => FifoAccess::Read,
            Self::Writer(_) => FifoAccess::Write,
        }
    }
}

impl std::fmt::Debug for Fifo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reader(_) => f.write_str("Fifo::Reader"),
            Self::Writer(_) => f.write_str("Fifo::Writer"),
        }
    }
}

/// Operating system operations needed by the helpers.
#[async_trait]
pub trait OsInterface: Send + Sync {
    /// Opens the FIFO at `path`.
    ///
    /// Must return a [`Fifo::Writer`] for [`FifoAccess::Write`] and a
    /// [`Fifo::Reader`] for [`FifoAccess::Read`].
    async fn open_fifo(&self, path: &Path, options: &FifoOptions) -> io::Result<Fifo>;
}

/// [`OsInterface`] backed by the host operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealOs;

#[cfg(unix)]
#[async_trait]
impl OsInterface for RealOs {
    async fn open_fifo(&self, path: &Path, options: &FifoOptions) -> io::Result<Fifo> {
        use tokio::net::unix::pipe;

        if !options.nonblocking {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "blocking fifo opens are not supported",
            ));
        }

        if options.create {
            create_fifo(path, options.mode)?;
        }

        match options.access {
            FifoAccess::Read => {
                let receiver = pipe::OpenOptions::new().open_receiver(path)?;
                Ok(Fifo::Reader(Box::new(receiver)))
            }
            FifoAccess::Write => {
                #[allow(unused_mut)]
                let mut opts = pipe::OpenOptions::new();
                #[cfg(target_os = "linux")]
                opts.read_write(true);
                let sender = opts.open_sender(path)?;
                Ok(Fifo::Writer(Box::new(sender)))
            }
        }
    }
}

#[cfg(not(unix))]
#[async_trait]
impl OsInterface for RealOs {
    async fn open_fifo(&self, _path: &Path, _options: &FifoOptions) -> io::Result<Fifo> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "named pipes require a unix host",
        ))
    }
}

/// Creates a FIFO at `path`, leaving an existing one in place.
#[cfg(unix)]
fn create_fifo(path: &Path, mode: u32) -> io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::stat::{Mode, mode_t};

    match nix::unistd::mkfifo(path, Mode::from_bits_truncate(mode as mode_t)) {
        Ok(()) | Err(Errno::EEXIST) => Ok(()),
        Err(e) => Err(io::Error::from(e)),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::FileTypeExt;
    use tempfile::TempDir;

    #[test]
    fn test_fifo_options() {
        let reader = FifoOptions::reader();
        assert_eq!(reader.access, FifoAccess::Read);
        assert!(reader.create);
        assert!(reader.nonblocking);
        assert_eq!(reader.mode, 0o700);

        let writer = FifoOptions::writer();
        assert_eq!(writer.access, FifoAccess::Write);
        assert_eq!(writer.mode, 0o700);
    }

    #[test]
    fn test_fifo_access_display() {
        assert_eq!(FifoAccess::Read.to_string(), "read");
        assert_eq!(FifoAccess::Write.to_string(), "write");
    }

    #[test]
    fn test_create_fifo_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stdout");

        create_fifo(&path, FIFO_PERMISSIONS).unwrap();
        create_fifo(&path, FIFO_PERMISSIONS).unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert!(meta.file_type().is_fifo());
    }

    #[tokio::test]
    async fn test_real_os_rejects_blocking_open() {
        let dir = TempDir::new().unwrap();
        let options = FifoOptions {
            nonblocking: false,
            ..FifoOptions::reader()
        };

        let err = RealOs
            .open_fifo(&dir.path().join("stdout"), &options)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }
}
