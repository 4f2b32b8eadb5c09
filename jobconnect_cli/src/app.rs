use crate::config::ChatConfig;
use crate::events::{AppEvent, Event, EventHandler};
use crate::input::InputBox;
use crate::suggestions;
use crate::transcript::{ScrollState, TranscriptView};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use jobconnect_chat::{ChatController, ChatHandle, ChatSession, PendingReply, SendOutcome};
use tokio::sync::watch;

pub struct App {
    pub controller: ChatController,
    pub view: watch::Receiver<ChatSession>,
    pub endpoint: Option<String>,
    pub input: InputBox,
    pub scroll: ScrollState,
    pub error: Option<String>,
    pub failed_prompt: Option<String>,
    pub running: bool,
    pub tick: u64,
    pub events: EventHandler,
    sent: u64,
    settled: u64,
}

impl App {
    pub fn new(controller: ChatController, config: &ChatConfig) -> Self {
        let view = controller.subscribe();
        let events = EventHandler::new(controller.subscribe());
        Self {
            controller,
            view,
            endpoint: config.endpoint.clone(),
            input: InputBox::new(config.placeholder.clone(), config.max_length),
            scroll: ScrollState::default(),
            error: None,
            failed_prompt: None,
            running: true,
            tick: 0,
            events,
            sent: 0,
            settled: 0,
        }
    }

    pub async fn run(mut self, mut terminal: ratatui::DefaultTerminal) -> color_eyre::Result<()> {
        self.events.listen_terminal();
        while self.running {
            terminal.draw(|frame| frame.render_widget(&mut self, frame.area()))?;
            let event = self.events.next().await?;
            self.handle_event(event)?;
        }
        self.controller.shutdown();
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) -> color_eyre::Result<()> {
        match event {
            Event::Tick => self.tick(),
            Event::Crossterm(event) => match event {
                crossterm::event::Event::Key(key_event)
                    if key_event.kind == KeyEventKind::Press =>
                {
                    self.handle_key_events(key_event)?
                }
                crossterm::event::Event::Paste(text) => self.input.insert_str(&text),
                _ => {}
            },
            Event::Session => self.sync_session(),
            Event::Outcome {
                seq,
                prompt,
                outcome,
            } => self.record_outcome(seq, prompt, outcome),
            Event::App(app_event) => match app_event {
                AppEvent::Submit(text) => self.submit(text),
                AppEvent::Suggestion(index) => self.suggest(index),
                AppEvent::Reset => self.reset(),
                AppEvent::Retry => self.retry(),
                AppEvent::Quit => self.quit(),
            },
        }
        Ok(())
    }

    pub fn handle_key_events(&mut self, key: KeyEvent) -> color_eyre::Result<()> {
        let len = self.item_count();
        match key.code {
            KeyCode::Char('c' | 'C') if key.modifiers == KeyModifiers::CONTROL => {
                self.events.send(Event::App(AppEvent::Quit))
            }
            KeyCode::Char('l' | 'L') if key.modifiers == KeyModifiers::CONTROL => {
                self.events.send(Event::App(AppEvent::Reset))
            }
            KeyCode::Char('r' | 'R') if key.modifiers == KeyModifiers::CONTROL => {
                self.events.send(Event::App(AppEvent::Retry))
            }
            KeyCode::F(n @ 1..=6) => {
                self.events
                    .send(Event::App(AppEvent::Suggestion(usize::from(n - 1))))
            }
            KeyCode::Up => self.scroll.up(1, len),
            KeyCode::Down => self.scroll.down(1, len),
            KeyCode::PageUp => self.scroll.page_up(len),
            KeyCode::PageDown => self.scroll.page_down(len),
            KeyCode::Home => self.scroll.home(len),
            KeyCode::End => self.scroll.end(len),
            _ => {
                if let Some(text) = self.input.handle_key(key) {
                    self.events.send(Event::App(AppEvent::Submit(text)));
                }
            }
        }
        Ok(())
    }

    pub fn item_count(&self) -> usize {
        let session = self.view.borrow();
        TranscriptView::item_count(session.messages(), session.is_pending())
    }

    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn submit(&mut self, text: String) {
        let pending = self.controller.send_message(&text);
        self.input.finish_submit();
        self.watch(text, pending);
    }

    pub fn suggest(&mut self, index: usize) {
        let Some(suggestion) = suggestions::by_index(index) else {
            return;
        };
        let pending = suggestions::dispatch(&self.controller, suggestion.id);
        self.watch(suggestion.prompt.to_string(), pending);
    }

    pub fn reset(&mut self) {
        self.controller.reset_conversation();
        self.error = None;
        self.failed_prompt = None;
        self.scroll.auto_scroll = true;
    }

    pub fn retry(&mut self) {
        let Some(prompt) = self.failed_prompt.take() else {
            return;
        };
        self.error = None;
        let pending = self.controller.send_message(&prompt);
        self.watch(prompt, pending);
    }

    fn watch(
        &mut self,
        prompt: String,
        pending: Result<PendingReply, jobconnect_chat::SendRejected>,
    ) {
        match pending {
            Ok(pending) => {
                self.sent += 1;
                let seq = self.sent;
                let sender = self.events.sender();
                tokio::spawn(async move {
                    let outcome = pending.outcome().await;
                    let _ = sender.send(Event::Outcome {
                        seq,
                        prompt,
                        outcome,
                    });
                });
                self.sync_session();
            }
            Err(rejected) => {
                tracing::debug!(%rejected, "message not sent");
            }
        }
    }

    fn sync_session(&mut self) {
        let pending = self.view.borrow().is_pending();
        self.input.set_disabled(pending);
    }

    /// Outcomes settle in send order, but their forwarding tasks may race.
    /// Anything older than the newest recorded outcome is stale.
    pub fn record_outcome(&mut self, seq: u64, prompt: String, outcome: SendOutcome) {
        if seq < self.settled {
            tracing::debug!(seq, settled = self.settled, "ignoring stale outcome");
            return;
        }
        self.settled = seq;
        match outcome {
            SendOutcome::Replied(_) => {
                self.error = None;
                self.failed_prompt = None;
            }
            SendOutcome::Failed(failure) => {
                self.error = Some(failure.to_string());
                self.failed_prompt = Some(prompt);
            }
            SendOutcome::Discarded | SendOutcome::Cancelled => {}
        }
    }
}
