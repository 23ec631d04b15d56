//! Address, time and day window matching for access and scheduling rules
//!
//! Each component is a small parser paired with a cheap matcher: parse the
//! rule text once when a rule is loaded, keep the parsed value, then test
//! candidates against it per event.

pub mod day;
pub mod error;
pub mod interval;
pub mod ip;
pub mod time;

// Re-export commonly used types
pub use day::{name_to_index, DayWindow};
pub use error::{Result, ValidateError};
pub use interval::{round_up, validate, Alignment, SECONDS_PER_DAY, SECONDS_PER_WEEK};
pub use ip::{netmask_to_string, parse_address, AddressKind, IpAddress, IpAddressList, HOST_NETMASK};
pub use time::{minute_of_day, parse_simple_24h, TimeWindow, MINUTES_PER_DAY};
