//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements          | Connects to                |
//! |-------------|---------------------|----------------------------|
//! | `log_sink`  | EventSink           | `log` facade               |
//! | `loopback`  | Transport, LinkPort | In-memory duplex pipe      |
//! | `pulse_adc` | AdcPort             | Synthetic pulse waveform   |
//! | `time`      | Clock               | `std::time::Instant`       |

pub mod log_sink;
pub mod loopback;
pub mod pulse_adc;
pub mod time;
