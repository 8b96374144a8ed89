use std::fmt::Write;

use msgs::Color;
use session::{Classification, MatrixDimensions, ParticipantView, RoundOutcome, SLIDER_MAX, SLIDER_MIN};

const RESET: &str = "\x1b[0m";

/// Terminal stand-in for the slider panel.
#[derive(Debug, Default)]
pub struct ConsoleParticipantView {
    dimensions: MatrixDimensions,
    coefficients: Vec<f32>,
    augmented: Vec<f32>,
    sliders: Vec<f32>,
    /// Classification of the last average, per slider.
    highlight: Vec<Classification>,
}

impl ConsoleParticipantView {
    pub fn sliders(&self) -> &[f32] {
        &self.sliders
    }

    /// Moves one slider, clamped to the slider range. Returns the value set.
    pub fn set_slider(&mut self, slider: usize, value: f32) -> Option<f32> {
        let cell = self.sliders.get_mut(slider)?;
        *cell = value.clamp(SLIDER_MIN, SLIDER_MAX);
        Some(*cell)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for row in 0..self.dimensions.rows as usize {
            for column in 0..self.dimensions.columns as usize {
                let index = row * self.dimensions.columns as usize + column;
                let _ = write!(out, "{:>9.2}", self.coefficients.get(index).copied().unwrap_or(0.0));
            }
            if let Some(b) = self.augmented.get(row) {
                let _ = write!(out, " | {b:>9.2}");
            }
            out.push('\n');
        }
        for (i, value) in self.sliders.iter().enumerate() {
            match self.highlight.get(i) {
                Some(classification) => {
                    let color = Color::from(*classification);
                    let _ = writeln!(out, "x{} = {}{value:.2}{RESET}", i + 1, color.ansi_foreground());
                }
                None => {
                    let _ = writeln!(out, "x{} = {value:.2}", i + 1);
                }
            }
        }
        out
    }
}

impl ParticipantView for ConsoleParticipantView {
    fn on_prompt_changed(&mut self, text: &str) {
        println!("{text}");
    }

    fn on_matrix_ready(&mut self, dimensions: MatrixDimensions, coefficients: &[f32], augmented: &[f32]) {
        self.dimensions = dimensions;
        self.coefficients = coefficients.to_vec();
        self.augmented = augmented.to_vec();
        self.highlight.clear();
        print!("{}", self.render());
    }

    fn on_round_resolved(&mut self, outcome: &RoundOutcome) {
        self.highlight = outcome.classification.clone();
        let mut line = format!("round {} average:", outcome.round);
        for (value, classification) in outcome.average.iter().zip(&outcome.classification) {
            let _ = write!(line, " {}{value:.2}{RESET}", Color::from(*classification).ansi_foreground());
        }
        println!("{line}");
    }

    fn on_auto_guess_preference_changed(&mut self, enabled: bool) {
        let state = if enabled { "on" } else { "off" };
        println!("auto-guess every turn: {state}");
    }

    fn open_guess_form(&mut self, columns: usize) {
        self.sliders = vec![0.0; columns];
    }

    fn read_guess(&self) -> Vec<f32> {
        self.sliders.clone()
    }

    fn show_guess(&mut self, guess: &[f32]) {
        for (slider, value) in self.sliders.iter_mut().zip(guess) {
            *slider = value.clamp(SLIDER_MIN, SLIDER_MAX);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliders_are_clamped() {
        let mut view = ConsoleParticipantView::default();
        view.open_guess_form(2);
        assert_eq!(view.read_guess(), vec![0.0, 0.0]);
        assert_eq!(view.set_slider(0, 250.0), Some(100.0));
        assert_eq!(view.set_slider(2, 1.0), None);
        view.show_guess(&[-300.0, 4.0]);
        assert_eq!(view.sliders(), &[-100.0, 4.0]);
    }

    #[test]
    fn render_shows_system_and_sliders() {
        let mut view = ConsoleParticipantView::default();
        view.on_matrix_ready(MatrixDimensions::new(1, 1), &[2.0], &[8.0]);
        view.open_guess_form(1);
        view.set_slider(0, 4.0);
        assert_eq!(view.render(), "     2.00 |      8.00\nx1 = 4.00\n");

        view.on_round_resolved(&RoundOutcome {
            round: 1,
            classification: vec![Classification::Exact],
            average: vec![4.0],
        });
        assert!(view.render().ends_with("x1 = \x1b[38;2;255;235;4m4.00\x1b[0m\n"));
    }
}
