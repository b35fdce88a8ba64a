//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the blackboard the state handlers read from and write
//! to: the loop clock, the frame currently being played, and the actuator
//! commands the sequencer applies after each tick.

use crate::config::ActuatorConfig;
use crate::scheduler::FrameEvent;

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; consumed by the sequencer)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorCommands {
    /// Duty the pump ramp should head for (0..=PUMP_DUTY_MAX).
    pub pump_target: u16,
    /// Ramp duration toward `pump_target`.
    pub ramp_ms: u32,
    pub valve_open: bool,
}

impl ActuatorCommands {
    /// Pump idle, valve closed.
    pub fn all_off() -> Self {
        Self {
            pump_target: 0,
            ramp_ms: 0,
            valve_open: false,
        }
    }
}

impl Default for ActuatorCommands {
    fn default() -> Self {
        Self::all_off()
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Timing --
    /// Loop clock for this tick.  Set by the caller before `Fsm::tick`.
    pub now_ms: u32,
    /// Milliseconds since the current state was entered.
    pub ms_in_state: u32,

    // -- Schedule --
    /// Deadlines of the frame being played; `None` outside a sequence.
    pub frame: Option<FrameEvent>,

    // -- Outputs --
    pub commands: ActuatorCommands,

    // -- Configuration --
    pub config: ActuatorConfig,

    /// Set when Recover hands back to Rest after a complete cycle.
    cycle_complete: bool,
}

impl FsmContext {
    pub fn new(config: ActuatorConfig) -> Self {
        Self {
            now_ms: 0,
            ms_in_state: 0,
            frame: None,
            commands: ActuatorCommands::all_off(),
            config,
            cycle_complete: false,
        }
    }

    /// Free-running timers apply only when no frame is being played.
    pub fn free_running(&self) -> bool {
        self.frame.is_none() && self.config.free_run
    }

    pub(crate) fn mark_cycle_complete(&mut self) {
        self.cycle_complete = true;
    }

    /// Read and clear the cycle-complete flag.
    pub fn take_cycle_complete(&mut self) -> bool {
        core::mem::take(&mut self.cycle_complete)
    }
}
