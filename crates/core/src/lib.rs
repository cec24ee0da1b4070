//! Module content engine for SDG learning modules.
//!
//! Pure domain crate: the section model, the quiz evaluator, the module
//! player state machine, the builder's ordering engine and the progress
//! projection. Persistence lives in `storage`, orchestration in `services`.

#![forbid(unsafe_code)]

pub mod builder;
pub mod model;
pub mod player;
pub mod progress;
pub mod quiz;
pub mod time;

pub use time::Clock;
