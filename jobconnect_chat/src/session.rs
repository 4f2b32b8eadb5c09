use crate::handler::Handler;
use crate::message::{Message, RawMessage, Role, normalize_all};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ChatEvent {
    UserMessage(Message),
    AgentMessage(Message),
    RequestSettled,
    Reset(Vec<Message>),
}

impl ChatEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ChatEvent::UserMessage(..) => "user_message",
            ChatEvent::AgentMessage(..) => "agent_message",
            ChatEvent::RequestSettled => "request_settled",
            ChatEvent::Reset(..) => "reset",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ChatCommand {
    SendMessage(String),
    AgentRespond {
        epoch: u64,
        content: String,
        sources: Vec<String>,
    },
    Settle {
        epoch: u64,
    },
    Reset(Vec<RawMessage>),
}

#[derive(Debug, Error, PartialEq)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Reply is empty")]
    EmptyReply,
    #[error("Reply belongs to epoch {reply} but the session is at epoch {current}")]
    StaleReply { reply: u64, current: u64 },
    #[error("No request is outstanding")]
    NothingPending,
}

/// The session log plus the bookkeeping needed to merge replies into it.
///
/// `epoch` moves forward on every reset so replies issued before the reset
/// can be told apart; `revision` moves forward on every applied event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSession {
    messages: Vec<Message>,
    outstanding: usize,
    epoch: u64,
    revision: u64,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(seed: &[RawMessage]) -> Self {
        let mut session = Self::new();
        session.messages = normalize_all(seed, Role::Bot);
        session
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_pending(&self) -> bool {
        self.outstanding > 0
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    fn check_epoch(&self, epoch: u64) -> Result<(), ChatError> {
        if epoch != self.epoch {
            return Err(ChatError::StaleReply {
                reply: epoch,
                current: self.epoch,
            });
        }
        if self.outstanding == 0 {
            return Err(ChatError::NothingPending);
        }
        Ok(())
    }

    fn apply(&mut self, event: &ChatEvent) {
        match event {
            ChatEvent::UserMessage(message) => {
                self.messages.push(message.clone());
                self.outstanding += 1;
            }
            ChatEvent::AgentMessage(message) => {
                self.messages.push(message.clone());
            }
            ChatEvent::RequestSettled => {
                self.outstanding = self.outstanding.saturating_sub(1);
            }
            ChatEvent::Reset(messages) => {
                self.messages = messages.clone();
                self.outstanding = 0;
                self.epoch += 1;
            }
        }
        self.revision += 1;
        tracing::trace!(
            event = event.event_type(),
            revision = self.revision,
            "session event applied"
        );
    }
}

impl Handler for ChatSession {
    type Command = ChatCommand;
    type Event = ChatEvent;
    type Error = ChatError;

    fn process(&mut self, command: Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = match command {
            ChatCommand::SendMessage(content) => {
                let trimmed = content.trim();
                if trimmed.is_empty() {
                    return Err(ChatError::EmptyMessage);
                }
                vec![ChatEvent::UserMessage(Message::user(trimmed))]
            }
            ChatCommand::AgentRespond {
                epoch,
                content,
                sources,
            } => {
                self.check_epoch(epoch)?;
                if content.trim().is_empty() {
                    return Err(ChatError::EmptyReply);
                }
                vec![
                    ChatEvent::AgentMessage(Message::bot(content).with_sources(sources)),
                    ChatEvent::RequestSettled,
                ]
            }
            ChatCommand::Settle { epoch } => {
                self.check_epoch(epoch)?;
                vec![ChatEvent::RequestSettled]
            }
            ChatCommand::Reset(seed) => vec![ChatEvent::Reset(normalize_all(&seed, Role::Bot))],
        };
        for event in &events {
            self.apply(event);
        }
        Ok(events)
    }

    fn fold(events: &[Self::Event]) -> Self {
        let mut session = Self::new();
        for event in events {
            session.apply(event);
        }
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(session: &ChatSession) -> Vec<(Role, &str)> {
        session
            .messages()
            .iter()
            .map(|m| (m.role, m.content.as_str()))
            .collect()
    }

    #[test]
    fn test_send_trims_and_marks_pending() {
        let mut session = ChatSession::new();
        let events = session
            .process(ChatCommand::SendMessage("  hello  ".to_string()))
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(contents(&session), vec![(Role::User, "hello")]);
        assert!(session.is_pending());
    }

    #[test]
    fn test_blank_send_rejected() {
        let mut session = ChatSession::new();
        let err = session
            .process(ChatCommand::SendMessage(" \n\t ".to_string()))
            .unwrap_err();
        assert_eq!(err, ChatError::EmptyMessage);
        assert!(session.messages().is_empty());
        assert_eq!(session.revision(), 0);
    }

    #[test]
    fn test_reply_settles_request() {
        let mut session = ChatSession::new();
        session
            .process(ChatCommand::SendMessage("hi".to_string()))
            .unwrap();
        session
            .process(ChatCommand::AgentRespond {
                epoch: 0,
                content: "hello there".to_string(),
                sources: vec!["faq.md".to_string()],
            })
            .unwrap();
        assert!(!session.is_pending());
        assert_eq!(
            contents(&session),
            vec![(Role::User, "hi"), (Role::Bot, "hello there")]
        );
        assert_eq!(session.messages()[1].sources, vec!["faq.md".to_string()]);
    }

    #[test]
    fn test_empty_reply_rejected_without_settling() {
        let mut session = ChatSession::new();
        session
            .process(ChatCommand::SendMessage("hi".to_string()))
            .unwrap();
        let err = session
            .process(ChatCommand::AgentRespond {
                epoch: 0,
                content: "   ".to_string(),
                sources: Vec::new(),
            })
            .unwrap_err();
        assert_eq!(err, ChatError::EmptyReply);
        assert!(session.is_pending());
        session.process(ChatCommand::Settle { epoch: 0 }).unwrap();
        assert!(!session.is_pending());
    }

    #[test]
    fn test_reset_discards_stale_replies() {
        let seed = vec![RawMessage::new(Role::Bot, "Hello!")];
        let mut session = ChatSession::seeded(&seed);
        session
            .process(ChatCommand::SendMessage("one".to_string()))
            .unwrap();
        session.process(ChatCommand::Reset(seed)).unwrap();
        assert_eq!(session.epoch(), 1);
        assert!(!session.is_pending());

        let err = session
            .process(ChatCommand::AgentRespond {
                epoch: 0,
                content: "late".to_string(),
                sources: Vec::new(),
            })
            .unwrap_err();
        assert_eq!(err, ChatError::StaleReply { reply: 0, current: 1 });
        assert_eq!(contents(&session), vec![(Role::Bot, "Hello!")]);
    }

    #[test]
    fn test_settle_without_request() {
        let mut session = ChatSession::new();
        let err = session.process(ChatCommand::Settle { epoch: 0 }).unwrap_err();
        assert_eq!(err, ChatError::NothingPending);
    }

    #[test]
    fn test_fold_replays_events() {
        let mut session = ChatSession::new();
        let mut log = Vec::new();
        log.extend(
            session
                .process(ChatCommand::SendMessage("a".to_string()))
                .unwrap(),
        );
        log.extend(
            session
                .process(ChatCommand::SendMessage("b".to_string()))
                .unwrap(),
        );
        log.extend(
            session
                .process(ChatCommand::AgentRespond {
                    epoch: 0,
                    content: "reply a".to_string(),
                    sources: Vec::new(),
                })
                .unwrap(),
        );

        let kinds: Vec<&str> = log.iter().map(ChatEvent::event_type).collect();
        assert_eq!(
            kinds,
            vec!["user_message", "user_message", "agent_message", "request_settled"]
        );

        let folded = ChatSession::fold(&log);
        assert_eq!(folded, session);
        assert_eq!(folded.outstanding(), 1);
        assert_eq!(folded.last_user_message().unwrap().content, "b");
    }
}
