pub mod controller;
pub mod handler;
pub mod message;
pub mod session;
pub mod transport;
pub use controller::{ChatController, ChatHandle, PendingReply, SendFailure, SendOutcome, SendRejected};
pub use handler::Handler;
pub use message::{Message, RawMessage, Role};
pub use session::{ChatCommand, ChatError, ChatEvent, ChatSession};
pub use transport::{HttpTransport, Reply, Transport, TransportDyn, TransportError};
