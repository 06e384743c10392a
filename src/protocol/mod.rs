//! Line-oriented wire protocol shared by the node and the viewer.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Protocol Stack                         │
//! │                                                            │
//! │  ┌───────────┐   ┌───────────────┐   ┌──────────────────┐  │
//! │  │ Transport │──▶│ FrameDecoder  │──▶│ Frame dispatch   │  │
//! │  │ (trait)   │   │ (line buffer) │   │ node / session   │  │
//! │  └───────────┘   └───────────────┘   └──────────────────┘  │
//! │       ▲                                       │            │
//! │       │            ┌──────────────────────────┘            │
//! │       │            ▼                                       │
//! │  ┌───────────┐   ┌───────────────┐                         │
//! │  │ Transport │◀──│ encode_frame  │                         │
//! │  │ (write)   │   │ + to_wire     │                         │
//! │  └───────────┘   └───────────────┘                         │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod frame;
pub mod transport;

pub use codec::{FrameDecoder, decode, encode, encode_frame};
pub use frame::{AdcData, Command, Frame, RawFrame, TransmissionStatus};
