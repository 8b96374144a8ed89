use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::{error::Rejection, ClientId};

/// Largest distance from the solution that still counts as close.
pub const CLOSE_THRESHOLD: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    Exact,
    Close,
    Far,
}

impl Classification {
    pub fn from_difference(difference: f32) -> Classification {
        if difference == 0.0 {
            Classification::Exact
        } else if difference <= CLOSE_THRESHOLD {
            Classification::Close
        } else {
            Classification::Far
        }
    }

    pub fn classify(average: f32, solution: f32) -> Classification {
        Self::from_difference((average - solution).abs())
    }
}

/// What the host broadcasts when a round resolves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundOutcome {
    /// One based, increases with every resolved round.
    pub round: u64,
    pub classification: Vec<Classification>,
    pub average: Vec<f32>,
}

/// Guesses of the round in progress.
///
/// Keyed by client so a resubmission replaces the earlier guess; ordered so
/// the average does not depend on arrival order.
#[derive(Debug, Clone, Default)]
pub struct RoundState {
    submissions: BTreeMap<ClientId, Vec<f32>>,
    expected_count: usize,
}

impl RoundState {
    pub fn submission_count(&self) -> usize {
        self.submissions.len()
    }

    /// Participant count seen by the last completion check.
    pub fn expected_count(&self) -> usize {
        self.expected_count
    }

    pub fn has_submitted(&self, client: ClientId) -> bool {
        self.submissions.contains_key(&client)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Recorded,
    Replaced,
}

#[derive(Debug, Clone)]
pub struct GuessAggregator {
    columns: usize,
    round: RoundState,
    rounds_resolved: u64,
}

impl GuessAggregator {
    pub fn new(columns: usize) -> GuessAggregator {
        GuessAggregator {
            columns,
            round: RoundState::default(),
            rounds_resolved: 0,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn rounds_resolved(&self) -> u64 {
        self.rounds_resolved
    }

    /// Stores a guess for the current round. The latest guess of a client wins.
    pub fn record(&mut self, client: ClientId, guess: Vec<f32>) -> Result<Submission, Rejection> {
        if guess.len() != self.columns {
            return Err(Rejection::WrongLength {
                expected: self.columns,
                actual: guess.len(),
            });
        }
        if guess.iter().any(|value| !value.is_finite()) {
            return Err(Rejection::NonFinite);
        }
        match self.round.submissions.insert(client, guess) {
            Some(_) => {
                debug!(client, "guess replaced an earlier one of the same round");
                Ok(Submission::Replaced)
            }
            None => Ok(Submission::Recorded),
        }
    }

    /// Drops the pending guess of a client that left.
    pub fn withdraw(&mut self, client: ClientId) -> bool {
        self.round.submissions.remove(&client).is_some()
    }

    /// Resolves the round once every live participant has a guess in.
    ///
    /// `live_participants` is read at every call, so a participant that
    /// disconnects mid-round no longer holds the round open. With no
    /// participants nothing ever resolves.
    pub fn try_resolve(&mut self, live_participants: usize, solution: &[f32]) -> Option<RoundOutcome> {
        self.round.expected_count = live_participants;
        if live_participants == 0 || self.round.submissions.len() != live_participants {
            return None;
        }

        let round = std::mem::take(&mut self.round);
        self.round.expected_count = live_participants;
        self.rounds_resolved += 1;

        let count = round.submissions.len() as f64;
        let average: Vec<f32> = (0..self.columns)
            .map(|i| {
                let sum: f64 = round.submissions.values().map(|guess| guess[i] as f64).sum();
                (sum / count) as f32
            })
            .collect();
        let classification = average
            .iter()
            .zip(solution)
            .map(|(average, solution)| Classification::classify(*average, *solution))
            .collect();

        Some(RoundOutcome {
            round: self.rounds_resolved,
            classification,
            average,
        })
    }

    pub fn submit(
        &mut self,
        client: ClientId,
        guess: Vec<f32>,
        live_participants: usize,
        solution: &[f32],
    ) -> Result<Option<RoundOutcome>, Rejection> {
        self.record(client, guess)?;
        Ok(self.try_resolve(live_participants, solution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_boundaries() {
        assert_eq!(Classification::from_difference(0.0), Classification::Exact);
        assert_eq!(Classification::from_difference(0.001), Classification::Close);
        assert_eq!(Classification::from_difference(10.0), Classification::Close);
        assert_eq!(Classification::from_difference(10.0001), Classification::Far);
        assert_eq!(Classification::classify(-5.0, 5.0), Classification::Close);
        assert_eq!(Classification::classify(20.0, 5.0), Classification::Far);
        assert_eq!(Classification::classify(3.5, 3.5), Classification::Exact);
    }

    #[test]
    fn averages_all_guesses() {
        let mut aggregator = GuessAggregator::new(2);
        let solution = [10.0, 0.0];
        assert_eq!(aggregator.submit(1, vec![0.0, 0.0], 3, &solution), Ok(None));
        assert_eq!(aggregator.submit(2, vec![10.0, 10.0], 3, &solution), Ok(None));
        let outcome = aggregator.submit(3, vec![20.0, 20.0], 3, &solution).unwrap().unwrap();
        assert_eq!(outcome.average, vec![10.0, 10.0]);
        assert_eq!(outcome.classification, vec![Classification::Exact, Classification::Close]);
        assert_eq!(outcome.round, 1);
    }

    #[test]
    fn resolves_exactly_once_when_all_guesses_are_in() {
        let mut aggregator = GuessAggregator::new(1);
        let solution = [1.0];
        let mut outcomes = Vec::new();
        for client in 1..=2 {
            outcomes.extend(aggregator.submit(client, vec![1.0], 3, &solution).unwrap());
        }
        assert!(outcomes.is_empty());
        outcomes.extend(aggregator.submit(3, vec![1.0], 3, &solution).unwrap());
        assert_eq!(outcomes.len(), 1);
        outcomes.extend(aggregator.try_resolve(3, &solution));
        assert_eq!(outcomes.len(), 1);
    }

    #[test]
    fn resolution_clears_the_round() {
        let mut aggregator = GuessAggregator::new(1);
        aggregator.submit(1, vec![4.0], 1, &[4.0]).unwrap();
        assert_eq!(aggregator.round().submission_count(), 0);
        assert_eq!(aggregator.rounds_resolved(), 1);

        assert_eq!(aggregator.try_resolve(2, &[4.0]), None);
        assert_eq!(aggregator.round().expected_count(), 2);
    }

    #[test]
    fn resubmission_replaces_earlier_guess() {
        let mut aggregator = GuessAggregator::new(1);
        assert_eq!(aggregator.record(7, vec![100.0]), Ok(Submission::Recorded));
        assert_eq!(aggregator.record(7, vec![2.0]), Ok(Submission::Replaced));
        assert_eq!(aggregator.try_resolve(2, &[0.0]), None);
        let outcome = aggregator.submit(8, vec![4.0], 2, &[0.0]).unwrap().unwrap();
        assert_eq!(outcome.average, vec![3.0]);
    }

    #[test]
    fn no_participants_never_resolves() {
        let mut aggregator = GuessAggregator::new(1);
        assert_eq!(aggregator.try_resolve(0, &[0.0]), None);
        assert_eq!(aggregator.rounds_resolved(), 0);
    }

    #[test]
    fn withdrawn_participant_no_longer_blocks_the_round() {
        let mut aggregator = GuessAggregator::new(1);
        aggregator.submit(1, vec![2.0], 3, &[0.0]).unwrap();
        aggregator.submit(2, vec![4.0], 3, &[0.0]).unwrap();
        assert!(!aggregator.withdraw(3));
        let outcome = aggregator.try_resolve(2, &[0.0]).unwrap();
        assert_eq!(outcome.average, vec![3.0]);
    }

    #[test]
    fn rejects_malformed_guesses() {
        let mut aggregator = GuessAggregator::new(2);
        assert_eq!(
            aggregator.record(1, vec![1.0]),
            Err(Rejection::WrongLength { expected: 2, actual: 1 })
        );
        assert_eq!(aggregator.record(1, vec![1.0, f32::NAN]), Err(Rejection::NonFinite));
        assert_eq!(aggregator.round().submission_count(), 0);
    }
}
