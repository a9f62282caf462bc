pub mod config;
pub mod level;
pub mod motor;

#[cfg(feature = "espidf")]
pub mod ultrasonic;

pub use config::TankConfig;
pub use level::{level_percent, volume_liters};
pub use motor::{MotorController, MotorEvent, MotorTrigger, TankAlert, TankMode};

#[cfg(feature = "espidf")]
pub use ultrasonic::Ultrasonic;
