//! Inter-task channels between the transport adapter and the viewer task.
//!
//! Uses `embassy-sync` bounded MPMC channels so a synchronous producer
//! (serial reader thread, BLE notification callback) can hand data to the
//! async viewer task without blocking.
//!
//! ```text
//! ┌──────────────┐  LinkMsg       ┌──────────────┐
//! │  Transport   │──────────────▶│  ViewerTask  │
//! │  adapter     │  (drop-oldest) │  (async)     │
//! └──────────────┘                └──────────────┘
//!        UI ─────── ViewerCommand ──────▶
//! ```
//!
//! The chunk channel never blocks the producer: when it is full the oldest
//! queued message is evicted to make room.  Only data is ever lost.  An
//! evicted `Connected` / `Disconnected` is held aside and delivered ahead of
//! everything still queued, and evicted data leaves an [`LinkMsg::Overrun`]
//! marker so the reader can resynchronise at the next line boundary.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use heapless::{Deque, Vec};
use log::{debug, warn};

use crate::app::commands::ViewerCommand;

/// Largest chunk carried in one message.
pub const CHUNK_LEN: usize = 256;

/// Default chunk channel depth.
pub const CHUNK_DEPTH: usize = 32;

/// Command channel depth.
const COMMAND_DEPTH: usize = 8;

/// Evicted control messages kept for delivery.
const CONTROL_HOLD: usize = 4;

/// Message from the transport adapter to the viewer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkMsg {
    /// Raw bytes as they arrived; may split lines anywhere.
    Data(Vec<u8, CHUNK_LEN>),
    /// The transport (re-)connected.
    Connected,
    /// The transport dropped.
    Disconnected,
    /// Data was evicted here; the byte stream is discontinuous.  Produced
    /// by the channel itself.
    Overrun,
}

impl LinkMsg {
    fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }
}

// ── Chunk channel ────────────────────────────────────────────

/// Eviction bookkeeping, updated under the same lock as the queue.
struct Overflow {
    held: Deque<LinkMsg, CONTROL_HOLD>,
    overrun: bool,
    dropped: u32,
}

/// Bounded drop-oldest channel of [`LinkMsg`]s.  Single consumer.
pub struct ChunkChannel<const N: usize = CHUNK_DEPTH> {
    inner: Channel<CriticalSectionRawMutex, LinkMsg, N>,
    overflow: Mutex<CriticalSectionRawMutex, RefCell<Overflow>>,
}

impl<const N: usize> Default for ChunkChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ChunkChannel<N> {
    pub const fn new() -> Self {
        Self {
            inner: Channel::new(),
            overflow: Mutex::new(RefCell::new(Overflow {
                held: Deque::new(),
                overrun: false,
                dropped: 0,
            })),
        }
    }

    /// Queue a message, evicting the oldest one if the channel is full.
    ///
    /// Returns `false` if the channel was full.
    pub fn push(&self, msg: LinkMsg) -> bool {
        self.overflow.lock(|cell| {
            let mut of = cell.borrow_mut();
            let msg = match self.inner.try_send(msg) {
                Ok(()) => return true,
                Err(TrySendError::Full(msg)) => msg,
            };
            match self.inner.try_receive() {
                Ok(evicted) if evicted.is_data() => {
                    of.dropped += 1;
                    of.overrun = true;
                    debug!("Link: channel full, evicted oldest chunk");
                }
                Ok(control) => {
                    debug!("Link: channel full, holding {:?}", control);
                    if let Err(lost) = of.held.push_back(control) {
                        warn!("Link: control backlog full, dropping {:?}", lost);
                    }
                }
                Err(_) => {}
            }
            if self.inner.try_send(msg).is_err() {
                warn!("Link: channel full, dropping message");
            }
            false
        })
    }

    /// Split `data` into chunks and queue each one.
    pub fn push_bytes(&self, data: &[u8]) -> bool {
        let mut clean = true;
        for part in data.chunks(CHUNK_LEN) {
            let mut chunk = Vec::new();
            // `part` is at most CHUNK_LEN long.
            let _ = chunk.extend_from_slice(part);
            clean &= self.push(LinkMsg::Data(chunk));
        }
        clean
    }

    /// Wait for the next message.
    pub async fn receive(&self) -> LinkMsg {
        loop {
            if let Some(msg) = self.try_receive() {
                return msg;
            }
            self.inner.ready_to_receive().await;
        }
    }

    /// Next message in delivery order: held control messages, then a
    /// pending overrun marker, then the queue.
    pub fn try_receive(&self) -> Option<LinkMsg> {
        self.overflow.lock(|cell| {
            let mut of = cell.borrow_mut();
            if let Some(control) = of.held.pop_front() {
                return Some(control);
            }
            if of.overrun {
                of.overrun = false;
                return Some(LinkMsg::Overrun);
            }
            self.inner.try_receive().ok()
        })
    }

    /// Data chunks evicted since creation.
    pub fn dropped(&self) -> u32 {
        self.overflow.lock(|cell| cell.borrow().dropped)
    }

    /// Queued messages, including held control messages.
    pub fn len(&self) -> usize {
        self.overflow
            .lock(|cell| self.inner.len() + cell.borrow().held.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Command channel ──────────────────────────────────────────

/// UI intents for the viewer task.  Unlike data chunks these are never
/// evicted; a full queue rejects the new command instead.
pub struct CommandChannel {
    inner: Channel<CriticalSectionRawMutex, ViewerCommand, COMMAND_DEPTH>,
}

impl Default for CommandChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandChannel {
    pub const fn new() -> Self {
        Self {
            inner: Channel::new(),
        }
    }

    /// Queue a command.  Returns `false` if the queue is full.
    pub fn send(&self, cmd: ViewerCommand) -> bool {
        if self.inner.try_send(cmd).is_err() {
            warn!("Link: command channel full, dropping command");
            return false;
        }
        true
    }

    pub async fn receive(&self) -> ViewerCommand {
        self.inner.receive().await
    }
}
