//! A 16-bit binary clock widget.
//!
//! The day is split into 65536 ticks (about 1.318 s each). The tick count
//! since local midnight is drawn as a 4x4 grid of dots, one per bit, and
//! touching the widget cycles through color themes.

pub mod logging;

pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod session;
pub mod sink;
pub mod ui;

pub use clock::{ClockCounter, TickPeriod, TimeEncoder, TimeOfDay, WallClock};
pub use config::Config;
pub use error::Error;
pub use session::{SharedWidgetSession, WidgetSession};
