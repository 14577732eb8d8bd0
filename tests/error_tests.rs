//! Tests for error types.
//!
//! Validates display formatting, source chaining, and cancellation checks.

use magikcri::{Error, FifoAccess, StreamKind};
use std::error::Error as _;
use std::io;
use std::path::PathBuf;

#[test]
fn test_invalid_image_reference_display() {
    let err = Error::InvalidImageReference {
        reference: "Busybox".to_string(),
        reason: "repository name must be lowercase".to_string(),
    };
    let msg = format!("{}", err);

    assert!(msg.contains("Busybox"), "should include reference");
    assert!(msg.contains("lowercase"), "should include reason");
}

#[test]
fn test_pipe_open_failed_display_and_source() {
    let err = Error::PipeOpenFailed {
        stream: StreamKind::Stdout,
        path: PathBuf::from("/run/io/stdout"),
        source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
    };
    let msg = format!("{}", err);

    assert!(msg.contains("stdout"), "should name the stream");
    assert!(msg.contains("/run/io/stdout"), "should include path");
    assert!(msg.contains("denied"), "should include OS error");

    let source = err.source().expect("should chain the io error");
    assert_eq!(source.to_string(), "denied");
}

#[test]
fn test_pipe_direction_mismatch_display() {
    let err = Error::PipeDirectionMismatch {
        path: PathBuf::from("/run/io/stdin"),
        expected: FifoAccess::Write,
    };
    let msg = err.to_string();

    assert!(msg.contains("/run/io/stdin"));
    assert!(msg.ends_with("expected write"), "got {}", msg);
}

#[test]
fn test_cancelled_display() {
    let err = Error::Cancelled {
        operation: "open stdin fifo /run/io/stdin".to_string(),
    };

    assert!(err.is_cancelled());
    assert!(err.to_string().contains("cancelled"));
    assert!(err.to_string().contains("stdin"));
}

#[test]
fn test_only_cancelled_is_cancelled() {
    let errs = [
        Error::InvalidConfig("x".to_string()),
        Error::InvalidDigest {
            digest: "sha256:1".to_string(),
            reason: "too short".to_string(),
        },
        Error::Io(io::Error::other("boom")),
    ];

    for err in errs {
        assert!(!err.is_cancelled(), "{} is not a cancellation", err);
    }
}

#[test]
fn test_io_error_conversion() {
    let err: Error = io::Error::new(io::ErrorKind::NotFound, "missing").into();
    assert!(matches!(err, Error::Io(_)));
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_stream_kind_display() {
    assert_eq!(StreamKind::Stdin.to_string(), "stdin");
    assert_eq!(StreamKind::Stdout.to_string(), "stdout");
    assert_eq!(StreamKind::Stderr.to_string(), "stderr");
}
