//! # Stepflow Core
//!
//! Shared runtime pieces for the stepflow framework: registries for tools
//! and providers, and the run event emitter.

pub mod emitter;
pub mod events;
pub mod registry;

pub use emitter::{Emitter, SubscriptionHandle};
pub use events::{Event, EventFilter, EventKind, IterationMeta, RunEvent};
pub use registry::{BaseRegistry, ProviderRegistry, Registerable, ToolRegistry};
