use thiserror::Error;

use crate::{phase::SessionPhase, ClientId};

/// Errors of the host wizard and the participant flow.
///
/// None of these end a session: invalid input re-prompts, out of phase
/// actions are logged and dropped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("invalid input {input:?}: {reason}")]
    InvalidInput { input: String, reason: &'static str },
    #[error("cannot {action} in phase {phase:?}")]
    OutOfPhase { action: &'static str, phase: SessionPhase },
}

/// Why the host refused a guess.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("guesses are not accepted in phase {0:?}")]
    OutOfPhase(SessionPhase),
    #[error("guess has {actual} components, expected {expected}")]
    WrongLength { expected: usize, actual: usize },
    #[error("guess contains a non-finite component")]
    NonFinite,
    #[error("client {0} is not a connected participant")]
    UnknownClient(ClientId),
}
