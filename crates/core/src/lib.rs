#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Shared models and the GPS position simulator for fleetsim.

pub mod advance;
pub mod api;
pub mod memory;
pub mod model;
pub mod sim;
pub mod store;
pub mod validation;

mod util;

pub use advance::{Advance, AdvanceError, Advancer};
pub use util::{new_mission_id, new_ulid, now_ms};
