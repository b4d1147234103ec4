//! Protocol detection session
//!
//! A `DetectSession` is created for every accepted connection. It reads the
//! first bytes under a deadline, asks the classifier for a verdict and hands
//! the connection together with everything it read to exactly one handler.
//!
//! The session runs as a single tokio task that owns it. Every step for one
//! connection happens inside that task, so the peek buffer and stream need no
//! synchronization, while other connections proceed on other workers.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::common::peer_label;
use crate::config::SharedConfig;
use crate::protocol::{DetectionResult, ProtocolDetector};

use super::handler::{Dispatcher, SessionHandler};
use super::PeekBuffer;

/// Deadline for reaching a classification decision
pub const DETECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Initial peek buffer capacity; it grows if a classifier needs more
const PEEK_CAPACITY: usize = 512;

/// Why a connection could not be classified
#[derive(Error, Debug)]
pub enum DetectError {
    /// The connection failed or closed before a decision was reached
    #[error("transport error while detecting protocol: {0}")]
    Transport(#[source] io::Error),

    /// No decision was reached before the deadline
    #[error("no protocol detected within {0:?}")]
    Timeout(Duration),
}

impl DetectError {
    /// Short reason tag for reporting
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// Successful classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Secure,
    Plain,
}

/// Lifecycle of a detection session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Detecting,
    DispatchedSecure,
    DispatchedPlain,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::DispatchedSecure | Self::DispatchedPlain | Self::Failed)
    }
}

/// Terminal result of a session, returned by the task `run` spawns
#[derive(Debug)]
pub enum DetectOutcome {
    /// The secure handler was started
    DispatchedSecure,
    /// The plain handler was started
    DispatchedPlain,
    /// No handler was started; the connection was closed
    Failed(DetectError),
}

impl DetectOutcome {
    pub fn state(&self) -> SessionState {
        match self {
            Self::DispatchedSecure => SessionState::DispatchedSecure,
            Self::DispatchedPlain => SessionState::DispatchedPlain,
            Self::Failed(_) => SessionState::Failed,
        }
    }
}

/// Classifies one accepted connection and dispatches it
pub struct DetectSession<S> {
    stream: S,
    peer: Option<SocketAddr>,
    buffer: PeekBuffer,
    config: Arc<SharedConfig>,
    dispatcher: Dispatcher<S>,
    deadline: Duration,
    state: SessionState,
}

impl<S> DetectSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(stream: S, config: Arc<SharedConfig>, dispatcher: Dispatcher<S>) -> Self {
        Self {
            stream,
            peer: None,
            buffer: PeekBuffer::with_capacity(PEEK_CAPACITY),
            config,
            dispatcher,
            deadline: DETECT_TIMEOUT,
            state: SessionState::Idle,
        }
    }

    /// Attach the remote address for log lines and failure reports
    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Override the detection deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Start detection
    ///
    /// Spawns the session onto the runtime and returns at once. The task owns
    /// the session until it reaches a terminal state; its output reports which
    /// one. Must be called from within a tokio runtime.
    pub fn run(self) -> JoinHandle<DetectOutcome> {
        tokio::spawn(self.detect())
    }

    /// The whole detection chain as a future
    ///
    /// `run` spawns this; callers that track their own tasks (a `JoinSet`)
    /// spawn it themselves. It must be driven by a single task.
    pub async fn detect(mut self) -> DetectOutcome {
        self.transition(SessionState::Detecting);

        let deadline = self.deadline;
        let detector = Arc::clone(&self.dispatcher.detector);
        let detection = match timeout(
            deadline,
            peek(&mut self.stream, &mut self.buffer, detector.as_ref()),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(DetectError::Timeout(deadline)),
        };

        self.on_detect(detection).await
    }

    async fn on_detect(mut self, detection: Result<Detection, DetectError>) -> DetectOutcome {
        let next = match &detection {
            Ok(Detection::Secure) => SessionState::DispatchedSecure,
            Ok(Detection::Plain) => SessionState::DispatchedPlain,
            Err(_) => SessionState::Failed,
        };
        self.transition(next);

        let DetectSession { stream, peer, buffer, config, dispatcher, .. } = self;

        let (handler, outcome) = match detection {
            Err(error) => {
                dispatcher.failure.report(peer, &error);
                // Dropping the stream closes the connection
                drop(stream);
                return DetectOutcome::Failed(error);
            }
            Ok(Detection::Secure) => {
                if let Some(info) = dispatcher.detector.protocol_info(&buffer) {
                    debug!(
                        "{}: {} {} after {} bytes",
                        peer_label(peer),
                        info.name,
                        info.version.as_deref().unwrap_or("unknown"),
                        buffer.len()
                    );
                }
                (Arc::clone(&dispatcher.secure), DetectOutcome::DispatchedSecure)
            }
            Ok(Detection::Plain) => {
                debug!("{}: plaintext after {} bytes", peer_label(peer), buffer.len());
                (Arc::clone(&dispatcher.plain), DetectOutcome::DispatchedPlain)
            }
        };

        start_handler(handler.as_ref(), peer, stream, buffer, config).await;
        outcome
    }

    fn transition(&mut self, next: SessionState) {
        debug_assert!(!self.state.is_terminal(), "no transition out of a terminal state");
        trace!("{}: {:?} -> {:?}", peer_label(self.peer), self.state, next);
        self.state = next;
    }
}

/// Accumulate bytes until the classifier can decide
///
/// Every byte read lands in `buffer` exactly once, in arrival order. A
/// partial signature only ever leads to another read.
async fn peek<S>(
    stream: &mut S,
    buffer: &mut PeekBuffer,
    detector: &dyn ProtocolDetector,
) -> Result<Detection, DetectError>
where
    S: AsyncRead + Unpin,
{
    loop {
        match detector.detect(buffer) {
            DetectionResult::Secure => return Ok(Detection::Secure),
            DetectionResult::Plain(reason) => {
                trace!("Classified as plaintext: {}", reason);
                return Ok(Detection::Plain);
            }
            DetectionResult::NeedMoreData => {}
        }

        let n = stream.read_buf(buffer).await.map_err(DetectError::Transport)?;
        if n == 0 {
            return Err(DetectError::Transport(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("connection closed after {} bytes", buffer.len()),
            )));
        }
        trace!("Peeked {} bytes, {} buffered", n, buffer.len());
    }
}

async fn start_handler<S: 'static>(
    handler: &dyn SessionHandler<S>,
    peer: Option<SocketAddr>,
    stream: S,
    buffer: PeekBuffer,
    config: Arc<SharedConfig>,
) {
    debug!("{}: starting {} session", peer_label(peer), handler.name());
    match handler.start(stream, buffer, config).await {
        Ok(()) => debug!("{}: {} session finished", peer_label(peer), handler.name()),
        Err(e) => debug!("{}: {} session ended with error: {}", peer_label(peer), handler.name(), e),
    }
}
