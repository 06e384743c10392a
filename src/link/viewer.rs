//! Async viewer task: the single owner of the viewer-side session.
//!
//! Waits on the chunk channel and the UI command channel.  Everything that
//! happens after a message arrives (decoding, dispatch, the signal
//! pipeline) is synchronous, so the channel receive is the only
//! suspension point apart from the reconnect delay.
//!
//! ```text
//!  ┌───────────────────────────────────────────────────────────┐
//!  │  futures_lite::future::block_on / edge_executor           │
//!  │  ┌─────────────────────────────────────────────────────┐  │
//!  │  │  ViewerTask::run                                    │  │
//!  │  │                                                     │  │
//!  │  │   chunks.receive() ─┐                               │  │
//!  │  │   commands.recv() ──┼─▶ SessionCoordinator ─▶ sink  │  │
//!  │  │   cancel.wait() ────┘                               │  │
//!  │  │                                                     │  │
//!  │  │   Disconnected ─▶ on_disconnect ─▶ Timer ─▶ 1 retry │  │
//!  │  └─────────────────────────────────────────────────────┘  │
//!  └───────────────────────────────────────────────────────────┘
//! ```

use core::time::Duration;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future;
use log::{debug, info, warn};

use crate::app::commands::ViewerCommand;
use crate::app::events::{ConnectionStatus, SessionEvent};
use crate::app::ports::{Clock, EventSink, LinkPort};
use crate::app::session::{SessionCoordinator, SessionStats};
use crate::config::LinkConfig;

use super::channel::{ChunkChannel, CommandChannel, LinkMsg};

/// Cancellation handle for [`ViewerTask::run`].
pub type CancelSignal = Signal<CriticalSectionRawMutex, ()>;

enum Wake {
    Chunk(LinkMsg),
    Command(ViewerCommand),
    Cancel,
}

/// Viewer task state: the session plus the ports it talks through.
pub struct ViewerTask<L: LinkPort, E: EventSink, C: Clock> {
    session: SessionCoordinator,
    link: L,
    sink: E,
    clock: C,
    reconnect_delay: Duration,
}

impl<L: LinkPort, E: EventSink, C: Clock> ViewerTask<L, E, C> {
    pub fn new(config: &LinkConfig, link: L, sink: E, clock: C) -> Self {
        Self {
            session: SessionCoordinator::new(config),
            link,
            sink,
            clock,
            reconnect_delay: Duration::from_millis(u64::from(config.reconnect_delay_ms)),
        }
    }

    /// Run until `cancel` fires.  Returns the final session counters.
    ///
    /// Chunks already queued are drained before the cancel is observed.
    pub async fn run<const N: usize>(
        &mut self,
        chunks: &ChunkChannel<N>,
        commands: &CommandChannel,
        cancel: &CancelSignal,
    ) -> SessionStats {
        info!("Viewer: task started");
        loop {
            let wake = future::or(
                future::or(
                    async { Wake::Chunk(chunks.receive().await) },
                    async { Wake::Command(commands.receive().await) },
                ),
                async {
                    cancel.wait().await;
                    Wake::Cancel
                },
            )
            .await;

            match wake {
                Wake::Chunk(LinkMsg::Data(bytes)) => {
                    let now = self.clock.now_ms();
                    self.session.on_bytes_received(&bytes, now, &mut self.sink);
                }
                Wake::Chunk(LinkMsg::Overrun) => self.session.on_chunks_dropped(chunks.dropped()),
                Wake::Chunk(LinkMsg::Connected) => self.session.on_connect(&mut self.sink),
                Wake::Chunk(LinkMsg::Disconnected) => {
                    self.session.on_disconnect(&mut self.sink);
                    if !self.reconnect_once(cancel).await {
                        break;
                    }
                }
                Wake::Command(ViewerCommand::Send(text)) => {
                    if let Err(e) = self
                        .session
                        .on_user_command(&text, &mut self.link, &mut self.sink)
                    {
                        debug!("Viewer: command {:?} failed: {}", text, e);
                    }
                }
                Wake::Command(ViewerCommand::ClearHistory) => self.session.clear_history(),
                Wake::Cancel => break,
            }
        }
        info!("Viewer: task stopped");
        self.session.stats()
    }

    /// Wait the reconnect delay, then try exactly once.
    ///
    /// Returns `false` if the task was cancelled while waiting.
    async fn reconnect_once(&mut self, cancel: &CancelSignal) -> bool {
        if !self.reconnect_delay.is_zero() {
            let delay = self.reconnect_delay;
            let cancelled = future::or(
                async {
                    async_io_mini::Timer::after(delay).await;
                    false
                },
                async {
                    cancel.wait().await;
                    true
                },
            )
            .await;
            if cancelled {
                info!("Viewer: reconnect abandoned");
                return false;
            }
        }

        self.sink
            .emit(&SessionEvent::Connection(ConnectionStatus::Reconnecting));
        match self.link.reconnect() {
            Ok(()) => self.session.on_connect(&mut self.sink),
            Err(e) => {
                warn!("Viewer: reconnect failed: {}", e);
                self.sink
                    .emit(&SessionEvent::Connection(ConnectionStatus::Disconnected));
            }
        }
        true
    }

    pub fn session(&self) -> &SessionCoordinator {
        &self.session
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}
