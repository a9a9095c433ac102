//! Core types, row cleaning, civil time and record assembly for XEMA banners
//!
//! Everything in this crate is synchronous and free of I/O. Sources, pacing
//! and sinks are reached through the traits in [`pipeline`].

pub mod assemble;
pub mod pipeline;
pub mod report;
pub mod settings;
pub mod timezone;
pub mod types;
pub mod units;
pub mod validate;

pub use assemble::*;
pub use pipeline::*;
pub use report::*;
pub use settings::*;
pub use timezone::*;
pub use types::*;
pub use units::*;
pub use validate::*;
