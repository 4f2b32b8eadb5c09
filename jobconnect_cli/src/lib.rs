pub mod app;
pub mod ask;
pub mod config;
pub mod events;
pub mod header;
pub mod input;
pub mod suggestions;
pub mod terminal;
pub mod transcript;
pub mod ui;
pub mod widgets;
pub use app::App;
pub use events::{Event, EventHandler};
