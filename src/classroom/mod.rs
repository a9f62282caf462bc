pub mod config;
pub mod pir;
pub mod relays;

pub use config::ClassroomConfig;
pub use pir::{switches_to_activate, PirDetector, PirEvent};
pub use relays::{RelayBank, RelayChange, Trigger};
