use std::fmt;

/// What the user is being asked for next.
///
/// Row, column and solution indices are zero based; the rendered text uses
/// one based indices the way the operator reads a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Rows,
    Columns,
    Coefficient { row: usize, column: usize },
    Solution { index: usize },
    ConfirmSetup,
    StartGame,
    RoundInProgress,
    Connecting,
    MatrixReady,
    AdjustGuess,
    GuessSubmitted,
    NextGuess,
}

impl Prompt {
    /// Text shown after the operator typed something unusable.
    ///
    /// Prompts that only wait for a confirm have no retry variant and render
    /// as themselves.
    pub fn retry_text(&self) -> String {
        let what = match self {
            Prompt::Rows => "number of rows",
            Prompt::Columns => "number of columns",
            Prompt::Coefficient { .. } => "coefficient value",
            Prompt::Solution { .. } => "solution value",
            _ => return self.to_string(),
        };
        format!("Invalid input. Please enter a valid {what}:")
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prompt::Rows => write!(f, "Enter the number of rows:"),
            Prompt::Columns => write!(f, "Enter the number of columns:"),
            Prompt::Coefficient { row, column } => {
                write!(f, "Enter coefficient A({},{}):", row + 1, column + 1)
            }
            Prompt::Solution { index } => write!(f, "Enter solution value x{}:", index + 1),
            Prompt::ConfirmSetup => write!(f, "Game board setup complete. Press confirm to continue."),
            Prompt::StartGame => write!(f, "Press confirm to start the game."),
            Prompt::RoundInProgress => write!(f, "Game in progress. Waiting for guesses..."),
            Prompt::Connecting => {
                write!(f, "Connecting to server. Waiting for the server to set up the matrix...")
            }
            Prompt::MatrixReady => {
                write!(f, "Matrix setup complete. Viewing the matrix. Press confirm to start guessing.")
            }
            Prompt::AdjustGuess => write!(f, "Adjust the sliders and press confirm to submit your guess."),
            Prompt::GuessSubmitted => write!(f, "Guess submitted. Waiting for the server's response..."),
            Prompt::NextGuess => {
                write!(f, "Round resolved. Press confirm to adjust the sliders for the next guess.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coefficient_prompt_is_one_based() {
        let prompt = Prompt::Coefficient { row: 0, column: 2 };
        assert_eq!(prompt.to_string(), "Enter coefficient A(1,3):");
        assert_eq!(Prompt::Solution { index: 1 }.to_string(), "Enter solution value x2:");
    }

    #[test]
    fn retry_text_names_the_expected_value() {
        assert_eq!(Prompt::Rows.retry_text(), "Invalid input. Please enter a valid number of rows:");
        assert_eq!(
            Prompt::Coefficient { row: 3, column: 1 }.retry_text(),
            "Invalid input. Please enter a valid coefficient value:"
        );
        assert_eq!(Prompt::StartGame.retry_text(), Prompt::StartGame.to_string());
    }
}
