//! Modbus field-device bridge.
//!
//! Polls the configured points of one Modbus device (TCP or RTU/serial) on a
//! fixed cadence and publishes one record per point to Zenoh.
//!
//! # Key Expressions
//!
//! ```text
//! <topic>/<key>        one message per point and cycle
//! <topic>/@/status     bridge status and device connectivity
//! ```
//!
//! # Record
//!
//! ```text
//! { "Id": "D1", "Name": "Variable 1", "Address": "2.0", "Value": 7.0, "Type": "Byte" }
//! ```

pub mod config;
pub mod decode;
pub mod device;
