//! Application core: link logic with zero direct I/O.
//!
//! Both ends of the link live here: the viewer-side
//! [`SessionCoordinator`](session::SessionCoordinator) and the sensor-side
//! [`NodeService`](node::NodeService).  All interaction with transports,
//! converters and the UI happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod node;
pub mod ports;
pub mod session;
