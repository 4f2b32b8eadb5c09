use crate::handler::Handler;
use crate::message::{Message, RawMessage};
use crate::session::{ChatCommand, ChatEvent, ChatSession};
use crate::transport::{Reply, TransportDyn, TransportError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// Why `send` refused to accept a message. Rejections leave the session untouched.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SendRejected {
    #[error("Message is blank")]
    Blank,
    #[error("No chat endpoint is configured")]
    NoEndpoint,
    #[error("Chat controller has been shut down")]
    Closed,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SendFailure {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Endpoint returned an empty reply")]
    EmptyReply,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// The bot message that was appended to the log.
    Replied(Message),
    Failed(SendFailure),
    /// The conversation was reset before the reply could be merged.
    Discarded,
    /// The controller was torn down while the request was outstanding.
    Cancelled,
}

impl SendOutcome {
    pub fn reply(&self) -> Option<&Message> {
        match self {
            SendOutcome::Replied(message) => Some(message),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&SendFailure> {
        match self {
            SendOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Handle to an accepted send. The user message is already in the log.
#[derive(Debug)]
pub struct PendingReply {
    message_id: String,
    receiver: oneshot::Receiver<SendOutcome>,
}

impl PendingReply {
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub async fn outcome(self) -> SendOutcome {
        self.receiver.await.unwrap_or(SendOutcome::Cancelled)
    }
}

/// The imperative surface the rest of the application talks to.
pub trait ChatHandle {
    fn send_message(&self, text: &str) -> Result<PendingReply, SendRejected>;
    fn reset_conversation(&self);
    fn get_messages(&self) -> Vec<Message>;
}

struct Outbound {
    epoch: u64,
    text: String,
    reply: oneshot::Sender<SendOutcome>,
}

/// Owns the chat session and serializes outbound requests through one worker task.
///
/// Sends are answered in the order they were accepted. A reset bumps the
/// session epoch, so queued requests and late replies from before the reset
/// are dropped instead of landing in the fresh log.
pub struct ChatController {
    state: Arc<watch::Sender<ChatSession>>,
    queue: Option<mpsc::UnboundedSender<Outbound>>,
    worker: Option<JoinHandle<()>>,
    seed: Vec<RawMessage>,
    closed: Arc<AtomicBool>,
}

impl ChatController {
    /// Must be called inside a tokio runtime when a transport is supplied.
    /// Without a transport every `send` is rejected with [`SendRejected::NoEndpoint`].
    pub fn new(seed: Vec<RawMessage>, transport: Option<Box<dyn TransportDyn>>) -> Self {
        let (state, _) = watch::channel(ChatSession::seeded(&seed));
        let state = Arc::new(state);
        let closed = Arc::new(AtomicBool::new(false));
        let (queue, worker) = match transport {
            Some(transport) => {
                let (sender, receiver) = mpsc::unbounded_channel();
                let worker = tokio::spawn(run_worker(
                    state.clone(),
                    closed.clone(),
                    transport,
                    receiver,
                ));
                (Some(sender), Some(worker))
            }
            None => (None, None),
        };
        Self {
            state,
            queue,
            worker,
            seed,
            closed,
        }
    }

    pub fn has_endpoint(&self) -> bool {
        self.queue.is_some()
    }

    pub fn send(&self, text: &str) -> Result<PendingReply, SendRejected> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SendRejected::Blank);
        }
        let Some(queue) = &self.queue else {
            return Err(if self.closed.load(Ordering::Acquire) {
                SendRejected::Closed
            } else {
                SendRejected::NoEndpoint
            });
        };

        let mut accepted = None;
        self.state.send_if_modified(|session| {
            match session.process(ChatCommand::SendMessage(trimmed.to_owned())) {
                Ok(events) => {
                    accepted = events.into_iter().find_map(|event| match event {
                        ChatEvent::UserMessage(message) => Some((session.epoch(), message.id)),
                        _ => None,
                    });
                    true
                }
                Err(err) => {
                    tracing::debug!(%err, "message rejected by session");
                    false
                }
            }
        });
        let (epoch, message_id) = accepted.ok_or(SendRejected::Blank)?;
        tracing::info!(%message_id, epoch, "chat message accepted");

        let (reply, receiver) = oneshot::channel();
        let request = Outbound {
            epoch,
            text: trimmed.to_owned(),
            reply,
        };
        if queue.send(request).is_err() {
            tracing::error!(%message_id, "chat worker is gone, request dropped");
            self.settle(epoch);
        }
        Ok(PendingReply {
            message_id,
            receiver,
        })
    }

    pub fn reset(&self) {
        self.state.send_modify(|session| {
            if let Err(err) = session.process(ChatCommand::Reset(self.seed.clone())) {
                tracing::error!(%err, "failed to reset session");
            }
        });
        tracing::info!(epoch = self.state.borrow().epoch(), "conversation reset");
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.state.borrow().messages().to_vec()
    }

    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending()
    }

    pub fn revision(&self) -> u64 {
        self.state.borrow().revision()
    }

    /// One-way projection of the session; fires whenever it changes.
    pub fn subscribe(&self) -> watch::Receiver<ChatSession> {
        self.state.subscribe()
    }

    /// Aborts the worker. Any in-flight request is dropped and its outcome
    /// resolves as [`SendOutcome::Cancelled`]; later sends are rejected.
    pub fn shutdown(&mut self) {
        // Flip the flag under the session lock so no merge can slip in after it.
        let closed = &self.closed;
        self.state.send_if_modified(|_| {
            closed.store(true, Ordering::Release);
            false
        });
        self.queue = None;
        if let Some(worker) = self.worker.take() {
            worker.abort();
            tracing::info!("chat controller shut down");
        }
    }

    fn settle(&self, epoch: u64) {
        self.state.send_if_modified(|session| {
            session.process(ChatCommand::Settle { epoch }).is_ok()
        });
    }
}

impl Drop for ChatController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl ChatHandle for ChatController {
    fn send_message(&self, text: &str) -> Result<PendingReply, SendRejected> {
        self.send(text)
    }

    fn reset_conversation(&self) {
        self.reset()
    }

    fn get_messages(&self) -> Vec<Message> {
        self.snapshot()
    }
}

async fn run_worker(
    state: Arc<watch::Sender<ChatSession>>,
    closed: Arc<AtomicBool>,
    transport: Box<dyn TransportDyn>,
    mut queue: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(request) = queue.recv().await {
        let current = state.borrow().epoch();
        if request.epoch != current {
            tracing::debug!(
                request_epoch = request.epoch,
                current,
                "dropping request queued before reset"
            );
            let _ = request.reply.send(SendOutcome::Discarded);
            continue;
        }
        let result = transport.complete(&request.text).await;
        let outcome = merge_reply(&state, &closed, request.epoch, result);
        let _ = request.reply.send(outcome);
    }
}

fn merge_reply(
    state: &watch::Sender<ChatSession>,
    closed: &AtomicBool,
    epoch: u64,
    result: Result<Reply, TransportError>,
) -> SendOutcome {
    let mut outcome = SendOutcome::Discarded;
    state.send_if_modified(|session| {
        if closed.load(Ordering::Acquire) {
            outcome = SendOutcome::Cancelled;
            return false;
        }
        if session.epoch() != epoch {
            tracing::debug!(
                reply_epoch = epoch,
                current = session.epoch(),
                "discarding reply from before reset"
            );
            return false;
        }
        let failure = match result {
            Ok(reply) if !reply.is_empty() => {
                match session.process(ChatCommand::AgentRespond {
                    epoch,
                    content: reply.text,
                    sources: reply.sources,
                }) {
                    Ok(events) => {
                        if let Some(message) = events.into_iter().find_map(|event| match event {
                            ChatEvent::AgentMessage(message) => Some(message),
                            _ => None,
                        }) {
                            outcome = SendOutcome::Replied(message);
                        }
                        return true;
                    }
                    Err(err) => {
                        tracing::error!(%err, "failed to merge reply");
                        SendFailure::EmptyReply
                    }
                }
            }
            Ok(_) => SendFailure::EmptyReply,
            Err(err) => SendFailure::Transport(err),
        };
        tracing::warn!(error = %failure, "chat request failed");
        outcome = SendOutcome::Failed(failure);
        session.process(ChatCommand::Settle { epoch }).is_ok()
    });
    outcome
}
