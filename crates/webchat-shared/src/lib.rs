//! # webchat-shared
//!
//! Wire types shared by the webchat server and its persistence layer:
//! registered clients, chat messages, and the display-text timestamp
//! encoding the browser script expects.

pub mod constants;
pub mod error;
pub mod timestamp;
pub mod types;

pub use error::TimestampError;
pub use types::{to_pretty_json, Client, Message};
