use jobconnect_chat::{
    ChatController, ChatHandle, RawMessage, Reply, Role, SendFailure, SendOutcome, SendRejected,
    Transport, TransportError,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, oneshot};

type Responder = oneshot::Sender<Result<Reply, TransportError>>;

/// Hands every outbound call to the test, which answers it explicitly.
struct ChannelTransport {
    calls: mpsc::UnboundedSender<(String, Responder)>,
}

impl Transport for ChannelTransport {
    async fn complete(&self, message: &str) -> Result<Reply, TransportError> {
        let (tx, rx) = oneshot::channel();
        self.calls
            .send((message.to_owned(), tx))
            .map_err(|_| TransportError::Request("test harness gone".to_string()))?;
        rx.await
            .map_err(|_| TransportError::Request("responder dropped".to_string()))?
    }
}

/// Always answers with the same result and counts calls.
struct StaticTransport {
    result: Result<Reply, TransportError>,
    calls: Arc<AtomicUsize>,
}

impl Transport for StaticTransport {
    async fn complete(&self, _message: &str) -> Result<Reply, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

fn seed() -> Vec<RawMessage> {
    vec![RawMessage::new(Role::Bot, "Hello!")]
}

fn channel_controller() -> (ChatController, mpsc::UnboundedReceiver<(String, Responder)>) {
    let (calls, rx) = mpsc::unbounded_channel();
    let controller = ChatController::new(seed(), Some(ChannelTransport { calls }.boxed()));
    (controller, rx)
}

fn static_controller(result: Result<Reply, TransportError>) -> (ChatController, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = StaticTransport {
        result,
        calls: calls.clone(),
    };
    (ChatController::new(seed(), Some(transport.boxed())), calls)
}

fn log(controller: &ChatController) -> Vec<(Role, String)> {
    controller
        .get_messages()
        .into_iter()
        .map(|m| (m.role, m.content))
        .collect()
}

fn entry(role: Role, content: &str) -> (Role, String) {
    (role, content.to_string())
}

#[tokio::test]
async fn test_successful_exchange() {
    let (controller, mut calls) = channel_controller();

    let pending = controller.send_message("I need resume help").unwrap();
    assert_eq!(
        log(&controller),
        vec![entry(Role::Bot, "Hello!"), entry(Role::User, "I need resume help")]
    );
    assert!(controller.is_pending());

    let (text, responder) = calls.recv().await.unwrap();
    assert_eq!(text, "I need resume help");
    responder
        .send(Ok(Reply::new("Sure, share your resume.")))
        .unwrap();

    let outcome = pending.outcome().await;
    assert_eq!(outcome.reply().unwrap().content, "Sure, share your resume.");
    assert_eq!(
        log(&controller),
        vec![
            entry(Role::Bot, "Hello!"),
            entry(Role::User, "I need resume help"),
            entry(Role::Bot, "Sure, share your resume."),
        ]
    );
    assert!(!controller.is_pending());
}

#[tokio::test]
async fn test_server_error_appends_nothing() {
    let (controller, _) = static_controller(Err(TransportError::Status(500)));

    let outcome = controller
        .send_message("I need resume help")
        .unwrap()
        .outcome()
        .await;

    assert_eq!(
        outcome,
        SendOutcome::Failed(SendFailure::Transport(TransportError::Status(500)))
    );
    assert_eq!(
        log(&controller),
        vec![entry(Role::Bot, "Hello!"), entry(Role::User, "I need resume help")]
    );
    assert!(!controller.is_pending());
}

#[tokio::test]
async fn test_empty_and_undecodable_replies_fail() {
    let (controller, _) = static_controller(Ok(Reply::new("")));
    let outcome = controller.send("hi").unwrap().outcome().await;
    assert_eq!(outcome.failure(), Some(&SendFailure::EmptyReply));
    assert_eq!(controller.snapshot().len(), 2);
    assert!(!controller.is_pending());

    let (controller, _) =
        static_controller(Err(TransportError::Decode("expected value".to_string())));
    let outcome = controller.send("hi").unwrap().outcome().await;
    assert!(matches!(
        outcome.failure(),
        Some(SendFailure::Transport(TransportError::Decode(_)))
    ));
    assert_eq!(controller.snapshot().len(), 2);
    assert!(!controller.is_pending());
}

#[tokio::test]
async fn test_blank_send_is_noop() {
    let calls = Arc::new(AtomicUsize::new(0));
    let transport = StaticTransport {
        result: Ok(Reply::new("unused")),
        calls: calls.clone(),
    };
    let controller = ChatController::new(Vec::new(), Some(transport.boxed()));
    let revision = controller.revision();

    assert_eq!(controller.send("   ").unwrap_err(), SendRejected::Blank);
    tokio::task::yield_now().await;

    assert!(controller.snapshot().is_empty());
    assert_eq!(controller.revision(), revision);
    assert!(!controller.is_pending());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_send_without_endpoint_is_noop() {
    let controller = ChatController::new(seed(), None);
    assert!(!controller.has_endpoint());
    assert_eq!(
        controller.send("hello").unwrap_err(),
        SendRejected::NoEndpoint
    );
    assert_eq!(log(&controller), vec![entry(Role::Bot, "Hello!")]);
}

#[tokio::test]
async fn test_reset_restores_seed() {
    let (controller, _) = static_controller(Ok(Reply::new("ok")));
    let original = controller.snapshot();
    for text in ["one", "two", "three"] {
        controller.send(text).unwrap().outcome().await;
    }
    assert_eq!(controller.snapshot().len(), 7);

    controller.reset_conversation();
    let restored = controller.snapshot();
    assert_eq!(log(&controller), vec![entry(Role::Bot, "Hello!")]);
    assert_ne!(restored[0].id, original[0].id);
    assert!(!controller.is_pending());
}

#[tokio::test]
async fn test_snapshot_is_idempotent() {
    let (controller, _) = static_controller(Ok(Reply::new("ok")));
    controller.send("hi").unwrap().outcome().await;
    assert_eq!(controller.snapshot(), controller.snapshot());
}

#[tokio::test]
async fn test_sends_are_serialized() {
    let (controller, mut calls) = channel_controller();
    let first = controller.send("first").unwrap();
    let second = controller.send("second").unwrap();

    let (text, responder) = calls.recv().await.unwrap();
    assert_eq!(text, "first");
    tokio::task::yield_now().await;
    assert!(calls.try_recv().is_err());

    responder.send(Ok(Reply::new("reply one"))).unwrap();
    let (text, responder) = calls.recv().await.unwrap();
    assert_eq!(text, "second");
    assert!(controller.is_pending());
    responder.send(Ok(Reply::new("reply two"))).unwrap();

    assert!(first.outcome().await.reply().is_some());
    assert!(second.outcome().await.reply().is_some());
    assert_eq!(
        log(&controller),
        vec![
            entry(Role::Bot, "Hello!"),
            entry(Role::User, "first"),
            entry(Role::User, "second"),
            entry(Role::Bot, "reply one"),
            entry(Role::Bot, "reply two"),
        ]
    );
    assert!(!controller.is_pending());
}

#[tokio::test]
async fn test_reply_after_reset_is_discarded() {
    let (controller, mut calls) = channel_controller();
    let in_flight = controller.send("first").unwrap();
    let queued = controller.send("second").unwrap();
    let (_, responder) = calls.recv().await.unwrap();

    controller.reset();
    assert!(!controller.is_pending());
    responder.send(Ok(Reply::new("too late"))).unwrap();

    assert_eq!(in_flight.outcome().await, SendOutcome::Discarded);
    assert_eq!(queued.outcome().await, SendOutcome::Discarded);
    assert!(calls.try_recv().is_err());
    assert_eq!(log(&controller), vec![entry(Role::Bot, "Hello!")]);
}

#[tokio::test]
async fn test_shutdown_cancels_in_flight_request() {
    let (mut controller, mut calls) = channel_controller();
    let pending = controller.send("first").unwrap();
    let (_, responder) = calls.recv().await.unwrap();
    let before = controller.snapshot();

    controller.shutdown();
    assert_eq!(pending.outcome().await, SendOutcome::Cancelled);
    let _ = responder.send(Ok(Reply::new("after teardown")));
    tokio::task::yield_now().await;

    assert_eq!(controller.snapshot(), before);
    assert_eq!(controller.send("again").unwrap_err(), SendRejected::Closed);
}

#[tokio::test]
async fn test_subscribers_see_every_change() {
    let (controller, _) = static_controller(Ok(Reply::new("ok")));
    let mut view = controller.subscribe();
    assert!(!view.has_changed().unwrap());

    let pending = controller.send("hi").unwrap();
    assert!(view.has_changed().unwrap());
    {
        let session = view.borrow_and_update();
        assert_eq!(session.messages().len(), 2);
        assert!(session.is_pending());
    }

    pending.outcome().await;
    view.changed().await.unwrap();
    let session = view.borrow_and_update();
    assert_eq!(session.messages().len(), 3);
    assert!(!session.is_pending());
    assert_eq!(session.revision(), controller.revision());
}
