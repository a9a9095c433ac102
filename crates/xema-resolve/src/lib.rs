//! Retroactive period resolution
//!
//! The today path walks back from a lagged anchor in fixed steps until the
//! source returns a valid row or the attempt budget runs out. The yesterday
//! path makes a single fetch at the previous local day and keeps a few of the
//! most recent valid rows.

pub mod anchor;
pub mod resolver;
pub mod today;

pub use anchor::*;
pub use resolver::*;
pub use today::*;
