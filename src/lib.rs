pub mod client;
pub mod commands;
pub mod config;
pub mod editor;
pub mod error;
pub mod hooks;
pub mod input;
pub mod lifecycle;
pub mod message;
pub mod parser;
pub mod poller;
pub mod registry;
pub mod source;
pub mod terminal;

#[cfg(test)]
mod test_support;

pub use client::Client;
pub use error::ShellError;
pub use lifecycle::{Controller, LifecycleState};
pub use message::{Cursor, EventTag, Message, MessageId};
pub use registry::{CommandMatch, Registry};
pub use source::{SourceHandle, TimelineSource};
