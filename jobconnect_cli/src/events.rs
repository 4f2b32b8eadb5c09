use color_eyre::eyre::OptionExt;
use crossterm::event::Event as CrosstermEvent;
use jobconnect_chat::{ChatSession, SendOutcome};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio_stream::StreamExt;

const TICK_FPS: f64 = 30.0;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Submit(String),
    Suggestion(usize),
    Reset,
    Retry,
    Quit,
}

#[derive(Debug, Clone)]
pub enum Event {
    Tick,
    Crossterm(CrosstermEvent),
    /// The session projection moved to a new revision.
    Session,
    /// `seq` numbers accepted sends in the order they were queued.
    Outcome {
        seq: u64,
        prompt: String,
        outcome: SendOutcome,
    },
    App(AppEvent),
}

pub struct EventHandler {
    sender: mpsc::UnboundedSender<Event>,
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(session: watch::Receiver<ChatSession>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let actor = SessionTask::new(sender.clone(), session);
        tokio::spawn(async { actor.run().await });
        Self { sender, receiver }
    }

    /// Starts forwarding terminal input and ticks.
    pub fn listen_terminal(&self) {
        let actor = EventTask::new(self.sender.clone());
        tokio::spawn(async { actor.run().await });
    }

    pub async fn next(&mut self) -> color_eyre::Result<Event> {
        self.receiver
            .recv()
            .await
            .ok_or_eyre("Failed to receive event")
    }

    pub fn try_next(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }

    pub fn send(&self, event: Event) {
        let _ = self.sender.send(event);
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }
}

pub struct SessionTask {
    sender: mpsc::UnboundedSender<Event>,
    receiver: watch::Receiver<ChatSession>,
}

impl SessionTask {
    pub fn new(sender: mpsc::UnboundedSender<Event>, receiver: watch::Receiver<ChatSession>) -> Self {
        Self { sender, receiver }
    }

    pub async fn run(mut self) -> color_eyre::Result<()> {
        while self.receiver.changed().await.is_ok() {
            let revision = self.receiver.borrow_and_update().revision();
            tracing::trace!(revision, "session changed");
            if self.sender.send(Event::Session).is_err() {
                break;
            }
        }
        tracing::debug!("session projection closed");
        Ok(())
    }
}

pub struct EventTask {
    sender: mpsc::UnboundedSender<Event>,
}

impl EventTask {
    pub fn new(sender: mpsc::UnboundedSender<Event>) -> Self {
        Self { sender }
    }

    pub async fn run(self) -> color_eyre::Result<()> {
        let tick_rate = Duration::from_secs_f64(1.0 / TICK_FPS);
        let mut reader = crossterm::event::EventStream::new();
        let mut tick = tokio::time::interval(tick_rate);
        loop {
            let tick_delay = tick.tick();
            tokio::select! {
                _ = self.sender.closed() => {
                    break;
                }
                _ = tick_delay => {
                    self.send(Event::Tick);
                }
                Some(Ok(evt)) = reader.next() => {
                    self.send(Event::Crossterm(evt));
                }
            };
        }
        Ok(())
    }

    fn send(&self, event: Event) {
        let _ = self.sender.send(event);
    }
}
