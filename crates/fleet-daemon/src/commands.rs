//! Internal commands the dispatcher serializes.

use fleet_engine::WorkerError;
use tokio::sync::oneshot;

/// Administrative lifecycle operations, executed strictly in submission
/// order with at most one in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandCode {
    /// Create a session and block until the controller is ready.
    Bootstrap,
    /// Tear the active session down and block until the worker terminated.
    Destroy,
    /// Terminate the dispatcher loop after the current command.
    Stop,
}

/// One queued command. Exactly one value is ever sent on `done`.
pub struct Command {
    pub code: CommandCode,
    pub done: oneshot::Sender<Result<(), DispatchError>>,
}

impl Command {
    pub fn new(code: CommandCode) -> (Self, oneshot::Receiver<Result<(), DispatchError>>) {
        let (done, rx) = oneshot::channel();
        (Self { code, done }, rx)
    }
}

/// Errors delivered through a command's completion channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Bootstrap while a session is already active. The command still
    /// queued behind the single-slot channel; it is refused when executed,
    /// never silently stacked.
    AlreadyBootstrapped,
    /// Destroy with no active session.
    NotBootstrapped,
    /// Bootstrap failed; `phase` names what was in progress. A best-effort
    /// destroy already ran before this was surfaced.
    BootstrapFailed { phase: &'static str, message: String },
    /// The session's worker terminated uncleanly.
    Worker(WorkerError),
    /// The dispatcher loop itself has terminated.
    Stopped,
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyBootstrapped => write!(f, "a session is already bootstrapped"),
            Self::NotBootstrapped => write!(f, "no session is bootstrapped"),
            Self::BootstrapFailed { phase, message } => {
                write!(f, "bootstrap failed while {phase}: {message}")
            }
            Self::Worker(err) => write!(f, "session worker failed: {err}"),
            Self::Stopped => write!(f, "dispatcher is stopped"),
        }
    }
}

impl std::error::Error for DispatchError {}
