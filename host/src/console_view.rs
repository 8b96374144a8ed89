use std::fmt::Write;

use msgs::Color;
use session::{HostView, MatrixDelta, RoundOutcome, SharedMatrixState};

const RESET: &str = "\x1b[0m";

/// Prints prompts, the matrix as it fills in, and round outcomes to stdout.
#[derive(Debug, Default)]
pub struct ConsoleHostView;

impl HostView for ConsoleHostView {
    fn on_prompt_changed(&mut self, text: &str) {
        println!("{text}");
    }

    fn on_matrix_delta(&mut self, matrix: &SharedMatrixState, _delta: &MatrixDelta) {
        print!("{}", render_matrix(matrix));
    }

    fn on_round_resolved(&mut self, outcome: &RoundOutcome) {
        println!("{}", render_outcome(outcome));
    }
}

/// One line per row: coefficients, then `| b` once the solution is known.
pub fn render_matrix(matrix: &SharedMatrixState) -> String {
    let dimensions = matrix.dimensions();
    let mut out = String::new();
    for row in 0..dimensions.rows as usize {
        for column in 0..dimensions.columns as usize {
            let _ = write!(out, "{:>9.2}", matrix.coefficient(row, column));
        }
        if let Some(b) = matrix.augmented().get(row) {
            let _ = write!(out, " | {b:>9.2}");
        }
        out.push('\n');
    }
    out
}

pub fn render_outcome(outcome: &RoundOutcome) -> String {
    let mut out = format!("round {} average:", outcome.round);
    for (value, classification) in outcome.average.iter().zip(&outcome.classification) {
        let color = Color::from(*classification);
        let _ = write!(out, " {}{value:.2}{RESET}", color.ansi_foreground());
    }
    out
}

#[cfg(test)]
mod tests {
    use session::{Classification, Role};

    use super::*;

    #[test]
    fn matrix_gains_its_augmented_column() {
        let mut matrix = SharedMatrixState::new(Role::Host);
        matrix.set_dimensions(1, 2);
        matrix.set_coefficient(0, 0, 1.0);
        assert_eq!(render_matrix(&matrix), "     1.00     0.00\n");

        matrix.set_coefficient(0, 1, 2.0);
        matrix.set_solution(vec![1.0, 1.0]);
        assert_eq!(render_matrix(&matrix), "     1.00     2.00 |      3.00\n");
    }

    #[test]
    fn outcome_is_colored_per_component() {
        let text = render_outcome(&RoundOutcome {
            round: 2,
            classification: vec![Classification::Far],
            average: vec![12.5],
        });
        assert_eq!(text, "round 2 average: \x1b[38;2;255;0;0m12.50\x1b[0m");
    }
}
