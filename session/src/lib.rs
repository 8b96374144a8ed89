//! Host-authoritative matrix guessing session.
//!
//! The host walks an operator through defining a linear system `A·x = b`,
//! replicates `A` and `b` to every participant and then runs guessing rounds:
//! each participant submits a guess for `x`, the host averages the guesses of
//! a round and broadcasts the average together with a per-component
//! classification of how close it is to the hidden solution.
//!
//! This crate holds the domain core only. It performs no IO; transports plug
//! in through [`ReplicationChannel`] and [`HostLink`], user interfaces through
//! [`HostView`] and [`ParticipantView`].

pub mod aggregator;
pub mod error;
pub mod host;
pub mod matrix;
pub mod participant;
pub mod phase;
pub mod prompt;
pub mod replication;
pub mod state_machine;
pub mod view;

/// Connection-scoped identifier the host assigns to every participant.
pub type ClientId = u32;

pub use aggregator::{Classification, GuessAggregator, RoundOutcome, RoundState, CLOSE_THRESHOLD};
pub use error::{Rejection, SessionError};
pub use host::SessionController;
pub use matrix::{MatrixDelta, MatrixDimensions, MatrixSnapshot, Role, SharedMatrixState};
pub use participant::{ParticipantController, SLIDER_MAX, SLIDER_MIN};
pub use phase::SessionPhase;
pub use prompt::Prompt;
pub use replication::{EventLog, HostEvent, HostLink, ReplicationChannel};
pub use state_machine::{InputOutcome, SessionStateMachine, MAX_DIMENSION};
pub use view::{HostView, ParticipantView};
