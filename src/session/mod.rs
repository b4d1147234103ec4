//! Connection detection sessions
//!
//! Everything between an accepted connection and the protocol handler that
//! ends up owning it: the detection session, the handler seam and the stream
//! adapter that replays sniffed bytes.

mod detect;
mod handler;
mod replay;

use bytes::BytesMut;

pub use detect::{
    DetectError, DetectOutcome, DetectSession, Detection, SessionState, DETECT_TIMEOUT,
};
pub use handler::{Dispatcher, FailureHook, LogFailureHook, SessionHandler};
pub use replay::PrefixedStream;

/// Bytes consumed from a connection while classifying it
pub type PeekBuffer = BytesMut;
