use crate::{
    aggregator::RoundOutcome,
    matrix::{MatrixDelta, MatrixSnapshot},
    ClientId,
};

/// Everything the host replicates to participants.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Snapshot(MatrixSnapshot),
    Delta(MatrixDelta),
    MatrixReady,
    RoundResolved(RoundOutcome),
    AutoGuessPreference(bool),
}

/// Host to participant fan-out.
///
/// Implementations must deliver events to each participant in the order
/// they were handed in. Both calls are fire-and-forget.
pub trait ReplicationChannel {
    fn broadcast(&mut self, event: HostEvent);
    fn send_to(&mut self, client: ClientId, event: HostEvent);
}

/// Participant to host request path.
pub trait HostLink {
    fn submit_guess(&mut self, guess: Vec<f32>);
}

/// A [`ReplicationChannel`] that only records, for replay and tests.
///
/// `None` as recipient marks a broadcast.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<(Option<ClientId>, HostEvent)>,
}

impl EventLog {
    /// Events a given participant would have received, in order.
    pub fn received_by(&self, client: ClientId) -> impl Iterator<Item = &HostEvent> + '_ {
        self.events
            .iter()
            .filter(move |(to, _)| to.map_or(true, |to| to == client))
            .map(|(_, event)| event)
    }

    pub fn drain(&mut self) -> Vec<(Option<ClientId>, HostEvent)> {
        std::mem::take(&mut self.events)
    }
}

impl ReplicationChannel for EventLog {
    fn broadcast(&mut self, event: HostEvent) {
        self.events.push((None, event));
    }

    fn send_to(&mut self, client: ClientId, event: HostEvent) {
        self.events.push((Some(client), event));
    }
}
