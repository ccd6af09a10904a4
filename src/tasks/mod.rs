//! Background Tasks Module
//!
//! Contains background tasks owned by long-lived caches.
//!
//! # Tasks
//! - Expiry sweep: removes expired response cache entries at a fixed interval

mod sweep;

pub use sweep::{spawn_sweep_task, SweepHandle};
