//! # Port Adapters
//!
//! In-memory and file-backed implementations of the outbound ports.

mod loopback;
mod replay;

pub use loopback::LoopbackTransport;
pub use replay::{JsonlReplay, NoopReplay};
