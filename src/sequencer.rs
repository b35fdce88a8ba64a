//! Actuator sequencer: puff state machine, pump ramp and the multi-frame
//! schedule, serviced once per loop iteration.
//!
//! ```text
//!   tick(now):  ramp.service ─▶ fsm.tick ─▶ frame bookkeeping ─▶ ramp.start?
//! ```
//!
//! The ramp is serviced before state evaluation, and a state entry that
//! changes the pump target starts its ramp in the same iteration.

use log::{debug, info, warn};
use rand::Rng;

use crate::config::{ActuatorConfig, SequenceConfig};
use crate::control::Ramp;
use crate::error::SequenceError;
use crate::fsm::context::FsmContext;
use crate::fsm::{Fsm, StateId, states};
use crate::scheduler::{FRAME_COUNT, SequenceRun, SequenceSchedule};

/// Reported when the last frame's guard period has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceEnded {
    pub time_ms: u32,
}

pub struct Sequencer {
    fsm: Fsm,
    ctx: FsmContext,
    ramp: Ramp,
    run: SequenceRun,
    schedule: Option<SequenceSchedule>,
    sequence: SequenceConfig,
}

impl Sequencer {
    pub fn new(actuator: ActuatorConfig, sequence: SequenceConfig, now_ms: u32) -> Self {
        let mut fsm = Fsm::new(states::build_state_table(), StateId::Rest);
        let mut ctx = FsmContext::new(actuator);
        ctx.now_ms = now_ms;
        fsm.start(&mut ctx);
        let ramp = Ramp::hold(ctx.commands.pump_target);
        Self {
            fsm,
            ctx,
            ramp,
            run: SequenceRun::default(),
            schedule: None,
            sequence,
        }
    }

    /// Begin a new 16-frame sequence anchored at `now_ms`.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        now_ms: u32,
        rng: &mut R,
    ) -> Result<&SequenceSchedule, SequenceError> {
        if self.run.active {
            warn!("SEQ: start rejected, frame {} in progress", self.run.frame_index);
            return Err(SequenceError::AlreadyRunning);
        }

        let schedule = SequenceSchedule::build(now_ms, &self.sequence, &self.ctx.config, rng);
        self.run.begin(now_ms);
        self.ctx.frame = schedule.frame(0);
        // A free-running cycle in flight is abandoned; frame 0 starts from Rest.
        self.force_rest(now_ms);

        info!(
            "SEQ: started at {}ms, slots [{}]",
            now_ms,
            schedule.slots_csv().as_str()
        );
        Ok(self.schedule.insert(schedule))
    }

    /// Abort the running sequence and force Rest.
    pub fn cancel(&mut self, now_ms: u32) -> Result<(), SequenceError> {
        if !self.run.active {
            debug!("SEQ: stop ignored, no sequence running");
            return Err(SequenceError::NotRunning);
        }
        info!(
            "SEQ: cancelled at {}ms after {} of {} frames",
            now_ms,
            self.run.frames_done(),
            FRAME_COUNT
        );
        self.run.stop();
        self.schedule = None;
        self.ctx.frame = None;
        self.force_rest(now_ms);
        Ok(())
    }

    /// Service the ramp and evaluate the state machine once.
    pub fn tick(&mut self, now_ms: u32) -> Option<SequenceEnded> {
        self.ramp.service(now_ms);

        self.ctx.now_ms = now_ms;
        self.fsm.tick(&mut self.ctx);

        let mut ended = None;
        if self.ctx.take_cycle_complete() && self.run.active {
            if self.run.advance() {
                info!("SEQ: all {} frames complete at {}ms", FRAME_COUNT, now_ms);
                self.schedule = None;
                ended = Some(SequenceEnded { time_ms: now_ms });
            } else {
                debug!("SEQ: frame {} begins", self.run.frame_index);
            }
            self.ctx.frame = self.current_frame();
        }

        self.follow_pump_target(now_ms);
        ended
    }

    fn current_frame(&self) -> Option<crate::scheduler::FrameEvent> {
        if !self.run.active {
            return None;
        }
        self.schedule
            .as_ref()
            .and_then(|s| s.frame(self.run.frame_index))
    }

    fn force_rest(&mut self, now_ms: u32) {
        self.ctx.now_ms = now_ms;
        self.fsm.force_transition(StateId::Rest, &mut self.ctx);
        self.ctx.take_cycle_complete();
        self.follow_pump_target(now_ms);
    }

    /// Start a ramp when a state entry changed the pump target.
    fn follow_pump_target(&mut self, now_ms: u32) {
        let target = self.ctx.commands.pump_target;
        if target != self.ramp.target() {
            self.ramp
                .start(self.ramp.current(), target, now_ms, self.ctx.commands.ramp_ms);
        }
    }

    /// Duty to drive the pump with this iteration.
    pub fn pump_duty(&self) -> u16 {
        self.ramp.current()
    }

    pub fn valve_open(&self) -> bool {
        self.ctx.commands.valve_open
    }

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_running(&self) -> bool {
        self.run.active
    }

    pub fn frame_index(&self) -> usize {
        self.run.frame_index
    }

    pub fn schedule(&self) -> Option<&SequenceSchedule> {
        self.schedule.as_ref()
    }

    pub fn ramp(&self) -> &Ramp {
        &self.ramp
    }
}
