use serde::Serialize;

/// Phase of a session.
///
/// The host walks through the setup phases once and then alternates between
/// `ViewingMatrix` and `AdjustingSliders` for as long as the session lives.
/// Participants only ever see `Connecting`, `ViewingMatrix` and
/// `AdjustingSliders`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    SetRows,
    SetColumns,
    SetCoefficients,
    SetSolution,
    ConfirmSetup,
    StartGame,
    Connecting,
    ViewingMatrix,
    AdjustingSliders,
    GuessConfirmed,
}

impl SessionPhase {
    /// Phases in which the host operator types a number.
    pub fn is_numeric_entry(self) -> bool {
        matches!(
            self,
            SessionPhase::SetRows
                | SessionPhase::SetColumns
                | SessionPhase::SetCoefficients
                | SessionPhase::SetSolution
        )
    }

    /// Phases of the host setup wizard, numeric or confirm.
    pub fn is_setup(self) -> bool {
        self.is_numeric_entry() || matches!(self, SessionPhase::ConfirmSetup | SessionPhase::StartGame)
    }

    /// Whether the host is inside the round loop and takes guesses.
    pub fn accepts_guesses(self) -> bool {
        matches!(self, SessionPhase::ViewingMatrix | SessionPhase::AdjustingSliders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setup_phases_do_not_accept_guesses() {
        for phase in [
            SessionPhase::SetRows,
            SessionPhase::SetColumns,
            SessionPhase::SetCoefficients,
            SessionPhase::SetSolution,
            SessionPhase::ConfirmSetup,
            SessionPhase::StartGame,
        ] {
            assert!(phase.is_setup());
            assert!(!phase.accepts_guesses(), "{phase:?}");
        }
    }

    #[test]
    fn round_loop_accepts_guesses() {
        assert!(SessionPhase::ViewingMatrix.accepts_guesses());
        assert!(SessionPhase::AdjustingSliders.accepts_guesses());
        assert!(!SessionPhase::GuessConfirmed.accepts_guesses());
        assert!(!SessionPhase::Connecting.accepts_guesses());
    }
}
