//! Core types for the trajectory kernel.

pub mod config;
pub mod edge;
pub mod event;
pub mod log;

pub use config::{ConfigParseError, RoleConfig};
pub use edge::{Edge, NormType};
pub use event::{Column, EventRecord};
pub use log::EventLog;
