//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no radio or ADC
//! hardware required.

mod link_tests;
mod mock_link;
mod node_tests;
mod session_tests;
