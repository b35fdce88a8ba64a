//! Concrete state handler functions and table builder.
//!
//! ```text
//!        precharge_at / immediately (free-run)
//!  REST ─────────────────────────────────────▶ PRECHARGE  pump → run duty
//!    ▲                                             │
//!    │                          puff_at / precharge_ms
//!    │                                             ▼
//!    │                                           PUFF      valve open
//!    │                                             │
//!    │                          recover_at / puff_ms
//!    │  guard_done_at / guard_ms                   ▼
//!    └───────────────────────────────────────── RECOVER    pump → idle
//!
//!  Any state ──[no frame, not free-running]──▶ REST
//! ```
//!
//! Deadlines come from the frame being played; timers from the actuator
//! config apply in free-run mode.

use super::context::FsmContext;
use super::{StateDescriptor, StateId};
use crate::clock::deadline_reached;
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0 — Rest
        StateDescriptor {
            id: StateId::Rest,
            name: "Rest",
            on_enter: Some(rest_enter),
            on_exit: None,
            on_update: rest_update,
        },
        // Index 1 — Precharge
        StateDescriptor {
            id: StateId::Precharge,
            name: "Precharge",
            on_enter: Some(precharge_enter),
            on_exit: None,
            on_update: precharge_update,
        },
        // Index 2 — Puff
        StateDescriptor {
            id: StateId::Puff,
            name: "Puff",
            on_enter: Some(puff_enter),
            on_exit: Some(puff_exit),
            on_update: puff_update,
        },
        // Index 3 — Recover
        StateDescriptor {
            id: StateId::Recover,
            name: "Recover",
            on_enter: Some(recover_enter),
            on_exit: None,
            on_update: recover_update,
        },
    ]
}

/// Where a timed state goes next, given its frame deadline and its
/// free-run duration.  Without either, the actuator is forced to Rest.
fn advance_at(
    ctx: &FsmContext,
    deadline: Option<u32>,
    duration_ms: u32,
    next: StateId,
) -> Option<StateId> {
    match deadline {
        Some(at) => deadline_reached(ctx.now_ms, at).then_some(next),
        None if ctx.free_running() => (ctx.ms_in_state >= duration_ms).then_some(next),
        None => {
            debug!("FSM: no frame data, forcing Rest");
            Some(StateId::Rest)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  REST
// ═══════════════════════════════════════════════════════════════════════════

fn rest_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_target = ctx.config.idle_duty;
    ctx.commands.ramp_ms = ctx.config.ramp_down_ms;
    ctx.commands.valve_open = false;
}

fn rest_update(ctx: &mut FsmContext) -> Option<StateId> {
    match ctx.frame {
        Some(f) => deadline_reached(ctx.now_ms, f.precharge_at).then_some(StateId::Precharge),
        None if ctx.free_running() => Some(StateId::Precharge),
        None => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  PRECHARGE — pump spins up, valve still closed
// ═══════════════════════════════════════════════════════════════════════════

fn precharge_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_target = ctx.config.run_duty;
    ctx.commands.ramp_ms = ctx.config.ramp_up_ms;
    ctx.commands.valve_open = false;
    if let Some(f) = ctx.frame {
        debug!(
            "PRECHARGE: slot {} puff in {}ms",
            f.slot,
            f.puff_at.wrapping_sub(ctx.now_ms) as i32
        );
    }
}

fn precharge_update(ctx: &mut FsmContext) -> Option<StateId> {
    let deadline = ctx.frame.map(|f| f.puff_at);
    advance_at(ctx, deadline, ctx.config.precharge_ms, StateId::Puff)
}

// ═══════════════════════════════════════════════════════════════════════════
//  PUFF — valve open, pump at whatever the ramp reached
// ═══════════════════════════════════════════════════════════════════════════

fn puff_enter(ctx: &mut FsmContext) {
    ctx.commands.valve_open = true;
    info!("PUFF: valve open at {}ms", ctx.now_ms);
}

fn puff_exit(ctx: &mut FsmContext) {
    ctx.commands.valve_open = false;
}

fn puff_update(ctx: &mut FsmContext) -> Option<StateId> {
    let deadline = ctx.frame.map(|f| f.recover_at);
    advance_at(ctx, deadline, ctx.config.puff_ms, StateId::Recover)
}

// ═══════════════════════════════════════════════════════════════════════════
//  RECOVER — pump ramps down, guard dwell before the next cycle
// ═══════════════════════════════════════════════════════════════════════════

fn recover_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_target = ctx.config.idle_duty;
    ctx.commands.ramp_ms = ctx.config.ramp_down_ms;
    ctx.commands.valve_open = false;
}

fn recover_update(ctx: &mut FsmContext) -> Option<StateId> {
    let deadline = ctx.frame.map(|f| f.guard_done_at);
    let next = advance_at(ctx, deadline, ctx.config.guard_ms, StateId::Rest);
    if next.is_some() && (deadline.is_some() || ctx.free_running()) {
        ctx.mark_cycle_complete();
    }
    next
}
