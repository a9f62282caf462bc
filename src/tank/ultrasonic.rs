//! HC-SR04 ultrasonic range driver.
//!
//! Bit-banged: a 10us pulse on TRIG, then the echo pulse width is timed on
//! ECHO. Sound travels ~58us per round-trip centimeter.

use std::time::{Duration, Instant};

use embedded_hal::blocking::delay::DelayUs;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin, Input, Output, PinDriver};
use esp_idf_sys::EspError;

const US_PER_CM: f32 = 58.0;

/// ~5m round trip. Readings past this are treated as no echo.
const ECHO_TIMEOUT: Duration = Duration::from_millis(30);

pub struct Ultrasonic<'d> {
    trig: PinDriver<'d, AnyOutputPin, Output>,
    echo: PinDriver<'d, AnyInputPin, Input>,
}

impl<'d> Ultrasonic<'d> {
    pub fn new(trig: AnyOutputPin, echo: AnyInputPin) -> Result<Self, EspError> {
        let mut trig = PinDriver::output(trig)?;
        let echo = PinDriver::input(echo)?;
        trig.set_low()?;
        Ok(Self { trig, echo })
    }

    /// One ranging attempt. `Ok(None)` when the echo never arrives (sensor
    /// disconnected or surface out of range).
    pub fn measure_cm(&mut self) -> Result<Option<f32>, EspError> {
        self.trig.set_low()?;
        Ets.delay_us(2u32);
        self.trig.set_high()?;
        Ets.delay_us(10u32);
        self.trig.set_low()?;

        // Wait for the echo pulse to start.
        let wait_start = Instant::now();
        while self.echo.is_low() {
            if wait_start.elapsed() > ECHO_TIMEOUT {
                return Ok(None);
            }
        }

        // Time the pulse itself.
        let pulse_start = Instant::now();
        while self.echo.is_high() {
            if pulse_start.elapsed() > ECHO_TIMEOUT {
                return Ok(None);
            }
        }

        let pulse_us = pulse_start.elapsed().as_micros() as f32;
        Ok(Some(pulse_us / US_PER_CM))
    }
}
