/// Command/event state holder.
///
/// `process` validates a command against the current state, applies the
/// resulting events and returns them; `fold` rebuilds the state from a log.
pub trait Handler {
    type Command;
    type Event;
    type Error: std::error::Error + Send + Sync + 'static;

    fn process(&mut self, command: Self::Command) -> Result<Vec<Self::Event>, Self::Error>;
    fn fold(events: &[Self::Event]) -> Self;
}
