//! Sump pump control.
//!
//! Pure, millisecond-tick driven so the control rules are testable off the
//! device. The binary owns the relay pin and mirrors every [`MotorEvent`].
//!
//! Guards, in priority order while running: runtime ceiling, float switch
//! dry indication, dry-run level minimum, auto-stop level. A stop always
//! arms the rest period before the next start.

use serde::Serialize;

use crate::protocol::AlertSeverity;

use super::TankConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TankMode {
    Auto,
    Manual,
}

/// What started or stopped the motor. Reported in motor-status payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorTrigger {
    AutoLevel,
    ManualSwitch,
    DryRun,
    FloatSwitch,
    RuntimeLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorEvent {
    Started {
        trigger: MotorTrigger,
    },
    Stopped {
        trigger: MotorTrigger,
        runtime_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TankAlert {
    CriticalLow,
    Overflow,
    RuntimeLimit,
}

impl TankAlert {
    pub fn code(self) -> &'static str {
        match self {
            TankAlert::CriticalLow => "sump_critical_low",
            TankAlert::Overflow => "sump_overflow",
            TankAlert::RuntimeLimit => "motor_runtime_limit",
        }
    }

    pub fn severity(self) -> AlertSeverity {
        match self {
            TankAlert::CriticalLow => AlertSeverity::Critical,
            TankAlert::Overflow => AlertSeverity::Critical,
            TankAlert::RuntimeLimit => AlertSeverity::Warning,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            TankAlert::CriticalLow => "Water level below critical threshold",
            TankAlert::Overflow => "Water level above maximum threshold",
            TankAlert::RuntimeLimit => "Motor stopped after reaching maximum runtime",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelZone {
    CriticalLow,
    Normal,
    Overfull,
}

pub struct MotorController {
    cfg: TankConfig,
    mode: TankMode,
    running: bool,
    started_at_ms: u64,
    /// `None` until the motor has run once; rest is satisfied at boot.
    stopped_at_ms: Option<u64>,
    zone: LevelZone,
}

impl MotorController {
    pub fn new(cfg: TankConfig) -> Self {
        Self {
            cfg,
            mode: TankMode::Auto,
            running: false,
            started_at_ms: 0,
            stopped_at_ms: None,
            zone: LevelZone::Normal,
        }
    }

    pub fn mode(&self) -> TankMode {
        self.mode
    }

    /// Mode follows the physical mode switch. The motor keeps its current
    /// state across a mode change; the guards in [`tick`](Self::tick) still
    /// apply either way.
    pub fn set_mode(&mut self, mode: TankMode) {
        if mode != self.mode {
            log::info!("Motor: Mode changed to {:?}", mode);
            self.mode = mode;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn runtime_ms(&self, now_ms: u64) -> u64 {
        if self.running {
            now_ms.saturating_sub(self.started_at_ms)
        } else {
            0
        }
    }

    fn rest_elapsed(&self, now_ms: u64) -> bool {
        match self.stopped_at_ms {
            None => true,
            Some(stopped) => now_ms.saturating_sub(stopped) >= self.cfg.motor_min_rest_ms,
        }
    }

    fn can_start(&self, level_percent: f32, float_dry: bool, now_ms: u64) -> bool {
        !self.running
            && self.rest_elapsed(now_ms)
            && !float_dry
            && level_percent >= self.cfg.min_level_percent
    }

    fn start(&mut self, trigger: MotorTrigger, now_ms: u64) -> MotorEvent {
        self.running = true;
        self.started_at_ms = now_ms;
        log::info!("Motor: Started ({:?})", trigger);
        MotorEvent::Started { trigger }
    }

    fn stop(&mut self, trigger: MotorTrigger, now_ms: u64) -> MotorEvent {
        let runtime_ms = self.runtime_ms(now_ms);
        self.running = false;
        self.stopped_at_ms = Some(now_ms);
        log::info!("Motor: Stopped ({:?}) after {}s", trigger, runtime_ms / 1000);
        MotorEvent::Stopped {
            trigger,
            runtime_ms,
        }
    }

    /// Handles a manual motor switch press. Honored in manual mode only;
    /// starts go through the same dry-run and rest guards as auto starts.
    pub fn manual_request(
        &mut self,
        start: bool,
        level_percent: f32,
        float_dry: bool,
        now_ms: u64,
    ) -> Option<MotorEvent> {
        if self.mode != TankMode::Manual {
            log::warn!("Motor: Manual request ignored while in auto mode");
            return None;
        }

        if start {
            if self.can_start(level_percent, float_dry, now_ms) {
                Some(self.start(MotorTrigger::ManualSwitch, now_ms))
            } else {
                log::warn!("Motor: Manual start blocked (guards not satisfied)");
                None
            }
        } else if self.running {
            Some(self.stop(MotorTrigger::ManualSwitch, now_ms))
        } else {
            None
        }
    }

    /// One control step per sensor reading.
    pub fn tick(
        &mut self,
        level_percent: f32,
        float_dry: bool,
        now_ms: u64,
    ) -> (Option<MotorEvent>, Vec<TankAlert>) {
        let mut alerts = Vec::new();

        let zone = self.classify(level_percent);
        if zone != self.zone {
            match zone {
                LevelZone::CriticalLow => alerts.push(TankAlert::CriticalLow),
                LevelZone::Overfull => alerts.push(TankAlert::Overflow),
                LevelZone::Normal => {}
            }
            self.zone = zone;
        }

        let event = if self.running {
            if self.runtime_ms(now_ms) >= self.cfg.motor_max_runtime_ms {
                alerts.push(TankAlert::RuntimeLimit);
                Some(self.stop(MotorTrigger::RuntimeLimit, now_ms))
            } else if float_dry {
                Some(self.stop(MotorTrigger::FloatSwitch, now_ms))
            } else if level_percent < self.cfg.min_level_percent {
                Some(self.stop(MotorTrigger::DryRun, now_ms))
            } else if self.mode == TankMode::Auto && level_percent <= self.cfg.auto_stop_percent {
                Some(self.stop(MotorTrigger::AutoLevel, now_ms))
            } else {
                None
            }
        } else if self.mode == TankMode::Auto
            && level_percent >= self.cfg.auto_start_percent
            && self.can_start(level_percent, float_dry, now_ms)
        {
            Some(self.start(MotorTrigger::AutoLevel, now_ms))
        } else {
            None
        };

        (event, alerts)
    }

    fn classify(&self, level_percent: f32) -> LevelZone {
        if level_percent <= self.cfg.critical_level_percent {
            LevelZone::CriticalLow
        } else if level_percent >= self.cfg.max_level_percent {
            LevelZone::Overfull
        } else {
            LevelZone::Normal
        }
    }
}
