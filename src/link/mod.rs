//! Viewer-side I/O: the bounded chunk channel and the async task that
//! feeds the session coordinator.

pub mod channel;
pub mod viewer;

pub use channel::{ChunkChannel, CommandChannel, LinkMsg};
pub use viewer::{CancelSignal, ViewerTask};
