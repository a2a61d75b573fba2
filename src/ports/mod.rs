//! Port traits: the boundaries between the simulation core and the outside world.

pub mod config_port;
pub mod price_port;
pub mod report_port;
pub mod scheduler_port;
