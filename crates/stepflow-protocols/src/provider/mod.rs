//! Chat model provider protocol.

mod request;
mod response;
mod traits;

pub use request::ChatRequest;
pub use response::ChatResponse;
pub use traits::ChatProvider;
