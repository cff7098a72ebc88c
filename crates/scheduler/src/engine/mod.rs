//! Scheduler engine: trigger registration, the firing loop, atomic reload.

mod core;
pub mod trigger;

pub use self::core::Scheduler;
pub use trigger::{build_triggers, Trigger, TriggerHandle};
