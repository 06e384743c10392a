//! PulseLink library.
//!
//! Line-protocol link between an ADC sensor node and a viewer, plus the
//! streaming pulse pipeline.  Exposes every module for integration testing
//! and for the host simulator binary.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod link;
pub mod protocol;
pub mod scheduler;
pub mod signal;

pub use error::{Error, Result};
