//! Supervisory controller: the cryocooler lifecycle state machine.
//!
//! ```text
//!  Off ──power_up──▶ Initialize ──1.5 s──▶ Idle
//!   │                                       │
//!   └──────────────── start ────────────────┤
//!                                           ▼
//!          CoarseCooldown ◀──▶ FineCooldown ──▶ Overshoot
//!                                   │               │
//!                                   ▼               ▼
//!                                 Settle ◀──────────┘
//!                                   │ 60 s in band
//!                                   ▼
//!                               Baseline ──300 s──▶ Operating
//! ```
//!
//! Every tick the global safety guard runs first (overvoltage, stall during
//! cooldown, overstroke backoff), then the per-state table. `Fault` is
//! latched until the operator issues `stop` or `off`.
//!
//! Time is always supplied by the caller.

use cryo_common::control_unit::config::{ControllerConfig, CryoConfig};
use cryo_common::control_unit::output::Output;
use cryo_common::control_unit::state::{ControllerState, FaultReason};
use tracing::{info, trace, warn};

use crate::control::backoff::BackoffState;
use crate::control::planner::ActuatorPlanner;

use super::indicators::panel_drive;

/// Measurements and derived flags for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInputs {
    /// Cold-stage temperature [K].
    pub temperature_k: f32,
    /// Cooling rate over the history window [K/min].
    pub cooling_rate_k_per_min: f32,
    /// Line voltage [V].
    pub line_voltage_v: f32,
    /// Temperature stalled within the stall window.
    pub stalled: bool,
    /// An unacknowledged overstroke event is pending.
    pub overstroke: bool,
    /// Monotonic time [ms].
    pub now_ms: u64,
}

/// The supervisory state machine.
#[derive(Debug, Clone)]
pub struct SupervisoryController {
    config: ControllerConfig,
    planner: ActuatorPlanner,

    state: ControllerState,
    fault_reason: FaultReason,
    running: bool,
    state_entered_ms: u64,
    settle_started_ms: Option<u64>,
    on_ms: Option<u64>,
    off_ms: Option<u64>,
    backoff: BackoffState,
}

impl SupervisoryController {
    /// Create a controller in `Off`.
    pub fn new(config: ControllerConfig, planner: ActuatorPlanner) -> Self {
        Self {
            config,
            planner,
            state: ControllerState::Off,
            fault_reason: FaultReason::None,
            running: false,
            state_entered_ms: 0,
            settle_started_ms: None,
            on_ms: None,
            off_ms: None,
            backoff: BackoffState::new(),
        }
    }

    pub fn from_config(config: &CryoConfig) -> Self {
        Self::new(
            config.controller.clone(),
            ActuatorPlanner::new(config.planner.clone()),
        )
    }

    // ─── Tick ───────────────────────────────────────────────────────

    /// Run one control tick and return the full output record.
    ///
    /// Never fails. In `Fault` the output is target 0, alarm on, bypass.
    pub fn update(&mut self, inputs: &TickInputs) -> Output {
        let now = inputs.now_ms;

        if self.state != ControllerState::Fault {
            self.apply_global_guard(inputs);
        }
        if self.state != ControllerState::Fault {
            self.apply_state_logic(inputs);
        }

        let output = self.build_output(inputs);
        trace!(
            state = %self.state,
            temperature_k = inputs.temperature_k,
            rate_k_per_min = inputs.cooling_rate_k_per_min,
            line_voltage_v = inputs.line_voltage_v,
            target = output.actuator_target,
            now,
            "tick"
        );
        output
    }

    fn apply_global_guard(&mut self, inputs: &TickInputs) {
        let now = inputs.now_ms;

        if inputs.line_voltage_v > self.config.max_line_voltage_v {
            self.enter_fault(FaultReason::OverVoltage, now);
        } else if self.state.is_cooldown() && inputs.stalled {
            self.enter_fault(FaultReason::TemperatureStall, now);
        } else if inputs.overstroke && self.running {
            let count = self
                .backoff
                .record_event(self.config.backoff_step, self.planner.config().full_scale);
            warn!(
                event_count = count,
                cumulative_offset = self.backoff.cumulative_offset,
                "overstroke backoff"
            );
            if self.backoff.is_exhausted(self.config.backoff_max_count) {
                self.enter_fault(FaultReason::ExcessiveBackoff, now);
            }
        }
    }

    fn apply_state_logic(&mut self, inputs: &TickInputs) {
        use ControllerState::*;

        let now = inputs.now_ms;
        let temp = inputs.temperature_k;
        let threshold = self.config.coarse_fine_threshold_k;

        match self.state {
            Off | Idle | Operating | Fault => {}

            Initialize => {
                if self.time_in_state(now) >= self.config.init_amber_ms {
                    self.enter_state(Idle, now);
                }
            }

            CoarseCooldown => {
                if temp < threshold {
                    self.enter_state(FineCooldown, now);
                }
            }

            FineCooldown => {
                if temp > threshold {
                    self.enter_state(CoarseCooldown, now);
                } else if self.below_band(temp) {
                    self.enter_state(Overshoot, now);
                } else if self.in_band(temp) {
                    self.enter_state(Settle, now);
                }
            }

            Overshoot => {
                if self.in_band(temp) {
                    self.enter_state(Settle, now);
                }
            }

            Settle => {
                if self.in_band(temp) {
                    let started = *self.settle_started_ms.get_or_insert(now);
                    if now.saturating_sub(started) >= self.config.settle_duration_ms {
                        self.enter_state(Baseline, now);
                    }
                } else {
                    self.settle_started_ms = None;
                }
            }

            Baseline => {
                if self.time_in_state(now) >= self.config.baseline_duration_ms {
                    self.enter_state(Operating, now);
                }
            }
        }
    }

    fn build_output(&self, inputs: &TickInputs) -> Output {
        let drive = panel_drive(self.state);

        let actuator_target = if self.state.is_cooldown() {
            let offset = if self.running {
                self.backoff.cumulative_offset
            } else {
                0
            };
            self.planner.cooldown_target(
                inputs.temperature_k,
                inputs.cooling_rate_k_per_min,
                offset,
            )
        } else {
            0
        };

        Output {
            state: self.state,
            actuator_target,
            bypass_relay: drive.bypass_relay,
            alarm_relay: drive.alarm_relay,
            fault_indicator: drive.fault_indicator,
            ready_indicator: drive.ready_indicator,
            status_text: self.status_text(),
            backoff_event_count: self.backoff.event_count,
        }
    }

    // ─── Operator Commands ──────────────────────────────────────────

    /// Begin (or resume) cooling. Returns `false` when ignored.
    ///
    /// Ignored while running and while latched in `Fault`.
    pub fn start(&mut self, now_ms: u64, temperature_k: f32) -> bool {
        if self.running || self.state == ControllerState::Fault {
            return false;
        }

        self.backoff.reset();
        self.fault_reason = FaultReason::None;
        self.running = true;
        self.on_ms = Some(now_ms);
        self.off_ms = None;

        let resume = self.resume_state(temperature_k);
        self.enter_state(resume, now_ms);
        true
    }

    /// Stop cooling and return to `Idle`. Returns `false` when ignored.
    ///
    /// Ignored when not running, except from `Fault`. Backoff is kept.
    pub fn stop(&mut self, now_ms: u64) -> bool {
        if !self.running && self.state != ControllerState::Fault {
            return false;
        }
        self.running = false;
        self.record_off(now_ms);
        self.enter_state(ControllerState::Idle, now_ms);
        true
    }

    /// De-energise everything and go to `Off`. Returns `false` when already off.
    pub fn off(&mut self, now_ms: u64) -> bool {
        if self.state == ControllerState::Off {
            return false;
        }
        self.running = false;
        self.record_off(now_ms);
        self.enter_state(ControllerState::Off, now_ms);
        true
    }

    /// Leave `Off` into the `Initialize` lamp test. Returns `false` when not
    /// in `Off`.
    pub fn power_up(&mut self, now_ms: u64) -> bool {
        if self.state != ControllerState::Off || self.running {
            return false;
        }
        self.enter_state(ControllerState::Initialize, now_ms);
        true
    }

    // ─── Queries ────────────────────────────────────────────────────

    #[inline]
    pub fn state(&self) -> ControllerState {
        self.state
    }

    #[inline]
    pub fn fault_reason(&self) -> FaultReason {
        self.fault_reason
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[inline]
    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    #[inline]
    pub fn status_text(&self) -> &'static str {
        self.state.status_text(self.fault_reason)
    }

    /// Time since the last transition [ms].
    #[inline]
    pub fn time_in_state(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.state_entered_ms)
    }

    /// Time since the most recent start, frozen once stopped [ms].
    pub fn on_duration(&self, now_ms: u64) -> u64 {
        match (self.on_ms, self.off_ms) {
            (Some(on), Some(off)) => off.saturating_sub(on),
            (Some(on), None) => now_ms.saturating_sub(on),
            (None, _) => 0,
        }
    }

    #[inline]
    pub fn backoff(&self) -> BackoffState {
        self.backoff
    }

    /// Continuous in-band dwell while in `Settle` [ms]; 0 when disarmed.
    pub fn settle_elapsed(&self, now_ms: u64) -> u64 {
        self.settle_started_ms
            .map_or(0, |started| now_ms.saturating_sub(started))
    }

    #[inline]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[inline]
    pub fn planner(&self) -> &ActuatorPlanner {
        &self.planner
    }

    // ─── Helpers ────────────────────────────────────────────────────

    #[inline]
    fn in_band(&self, temp_k: f32) -> bool {
        temp_k >= self.config.band_low_k() && temp_k <= self.config.band_high_k()
    }

    #[inline]
    fn below_band(&self, temp_k: f32) -> bool {
        temp_k < self.config.band_low_k()
    }

    fn resume_state(&self, temp_k: f32) -> ControllerState {
        if temp_k >= self.config.coarse_fine_threshold_k {
            ControllerState::CoarseCooldown
        } else if temp_k > self.config.band_high_k() {
            ControllerState::FineCooldown
        } else if self.below_band(temp_k) {
            ControllerState::Overshoot
        } else {
            ControllerState::Settle
        }
    }

    fn record_off(&mut self, now_ms: u64) {
        if self.off_ms.is_none() {
            self.off_ms = Some(now_ms);
        }
    }

    fn enter_state(&mut self, next: ControllerState, now_ms: u64) {
        let from = self.state;
        self.state = next;
        self.state_entered_ms = now_ms;
        self.settle_started_ms = if next == ControllerState::Settle {
            Some(now_ms)
        } else {
            None
        };
        if next != ControllerState::Fault {
            self.fault_reason = FaultReason::None;
        }
        info!(from = %from, to = %next, now_ms, "state transition");
    }

    fn enter_fault(&mut self, reason: FaultReason, now_ms: u64) {
        self.running = false;
        self.record_off(now_ms);
        self.enter_state(ControllerState::Fault, now_ms);
        self.fault_reason = reason;
        warn!(?reason, now_ms, "{}", reason.status_text());
    }
}

impl Default for SupervisoryController {
    fn default() -> Self {
        Self::from_config(&CryoConfig::default())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
