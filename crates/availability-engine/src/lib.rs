//! # availability-engine
//!
//! Free/busy availability computation for calendar queries.
//!
//! Given a query window and the chronologically sorted busy intervals a calendar API
//! reports for it, the engine produces the complementary free intervals. It performs
//! no I/O and holds no state, so it can be called from any thread.
//!
//! ## Modules
//!
//! - [`freebusy`] — sorted busy list → free slots, merged busy blocks
//! - [`interval`] — `TimeInterval` and `QueryRange`
//! - [`report`] — combined busy/free view with totals
//! - [`time`] — ISO 8601 parsing and UTC normalization
//! - [`error`] — Error types

pub mod error;
pub mod freebusy;
pub mod interval;
pub mod report;
pub mod time;

pub use error::AvailabilityError;
pub use freebusy::{compute_free_slots, find_first_free_slot, merge_busy_intervals};
pub use interval::{QueryRange, TimeInterval};
pub use report::{availability_report, AvailabilityReport};
pub use time::{format_timestamp, parse_timestamp};
