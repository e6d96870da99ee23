//! Shared data types.

mod message;

pub use message::{Message, MessageRole};
