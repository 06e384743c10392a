//! In-memory loopback link.
//!
//! [`loopback_pair`] returns two connected ends.  Each end is a
//! [`Transport`] (for the node loop and the viewer's reader) and a
//! [`LinkPort`] (for the viewer's outbound commands).  Ends are cheap to
//! clone and may be moved to different threads.
//!
//! ```text
//!   end A.write ──▶ [a_to_b] ──▶ end B.read
//!   end A.read  ◀── [b_to_a] ◀── end B.write
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::info;

use crate::app::ports::LinkPort;
use crate::error::{ConnectionError, TransmissionError};
use crate::protocol::transport::Transport;

type Pipe = Arc<Mutex<VecDeque<u8>>>;

/// Loopback transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopbackError {
    /// The link was severed with [`LoopbackEnd::disconnect`].
    Disconnected,
    /// A peer thread panicked while holding the pipe.
    Poisoned,
}

/// One end of an in-memory duplex pipe.
#[derive(Clone)]
pub struct LoopbackEnd {
    rx: Pipe,
    tx: Pipe,
    connected: Arc<AtomicBool>,
}

/// Create two connected ends.
pub fn loopback_pair() -> (LoopbackEnd, LoopbackEnd) {
    let a_to_b: Pipe = Arc::default();
    let b_to_a: Pipe = Arc::default();
    let connected = Arc::new(AtomicBool::new(true));
    (
        LoopbackEnd {
            rx: b_to_a.clone(),
            tx: a_to_b.clone(),
            connected: connected.clone(),
        },
        LoopbackEnd {
            rx: a_to_b,
            tx: b_to_a,
            connected,
        },
    )
}

impl LoopbackEnd {
    /// Sever the link for both ends.  In-flight bytes are discarded.
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::AcqRel) {
            info!("Loopback: disconnected");
            for pipe in [&self.rx, &self.tx] {
                if let Ok(mut q) = pipe.lock() {
                    q.clear();
                }
            }
        }
    }

    fn connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

impl Transport for LoopbackEnd {
    type Error = LoopbackError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LoopbackError> {
        if !self.connected() {
            return Err(LoopbackError::Disconnected);
        }
        let mut q = self.rx.lock().map_err(|_| LoopbackError::Poisoned)?;
        let n = buf.len().min(q.len());
        for (slot, byte) in buf.iter_mut().zip(q.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, LoopbackError> {
        if !self.connected() {
            return Err(LoopbackError::Disconnected);
        }
        let mut q = self.tx.lock().map_err(|_| LoopbackError::Poisoned)?;
        q.extend(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), LoopbackError> {
        Ok(())
    }

    fn available(&self) -> bool {
        self.connected() && self.rx.lock().is_ok_and(|q| !q.is_empty())
    }
}

impl LinkPort for LoopbackEnd {
    fn send_line(&mut self, line: &str) -> Result<(), TransmissionError> {
        match self.write(line.as_bytes()) {
            Ok(n) if n == line.len() => Ok(()),
            Ok(_) => Err(TransmissionError::ShortWrite),
            Err(_) => Err(TransmissionError::WriteFailed),
        }
    }

    fn reconnect(&mut self) -> Result<(), ConnectionError> {
        if !self.connected.swap(true, Ordering::AcqRel) {
            info!("Loopback: reconnected");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected()
    }
}
