//! Inbound intents from the UI adapter to the viewer task.
//!
//! The [`ViewerTask`](crate::link::viewer::ViewerTask) forwards these to the
//! [`SessionCoordinator`](super::session::SessionCoordinator).

/// What the user asked the viewer to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerCommand {
    /// Send a command token or free text to the node.
    Send(String),

    /// Drop the display history.
    ClearHistory,
}
