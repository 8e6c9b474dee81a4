//! # kapy-calendar
//!
//! Date arithmetic for the CF calendars used by climate-model output.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     A["&str"] -->|"Calendar::from_str"| B["Calendar"]
//!     A -->|"CfDate::parse"| C["CfDate"]
//!     B -->|".day_of_year() / .from_day_of_year()"| C
//!     C -->|"date_sequence()"| D["Vec of CfDate"]
//!     D -->|"convert_dates()"| E["CalendarConversion"]
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use kapy_calendar::{AlignOn, Calendar, CfDate, convert_dates, date_sequence};
//!
//! let model: Calendar = "360_day".parse().unwrap();
//! let start = CfDate::new(model, 2050, 1, 1).unwrap();
//! let days = date_sequence(model, start, 360);
//!
//! let obs = Calendar::Standard;
//! let conv = convert_dates(&days, model, obs, AlignOn::for_calendars(model, obs));
//! assert_eq!(conv.dates().len(), 360);
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `kind` | Calendar systems, month/year lengths, day of year |
//! | `date` | Calendar-aware date with canonical-day helpers |
//! | `sequence` | Daily and monthly date sequences |
//! | `convert` | Calendar conversion (align on date or year) |
//! | `error` | Error types |

mod convert;
mod date;
mod error;
mod kind;
mod sequence;

pub use convert::{AlignOn, CalendarConversion, convert_dates};
pub use date::CfDate;
pub use error::CalendarError;
pub use kind::Calendar;
pub use sequence::{date_sequence, month_starts};
