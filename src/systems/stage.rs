//! Eruption stage state machine.
//!
//! ## Stages
//!
//! - **Dormant**: nothing visible. With auto-demo on, a delay timer is armed.
//! - **PressureBuilding**: pressure ramps by a fixed step per interval until T1.
//! - **MagmaRising**: magma visible in the conduit; pressure keeps ramping to T2.
//! - **Erupting**: intensity at peak for a fixed duration.
//! - **PostEruption**: ash settles, pressure and intensity drop, then back to Dormant.
//!
//! ## Determinism
//!
//! The machine has no randomness. Timers are keyed by simulated time and every
//! scheduled event carries a guard (epoch + stage). Any transition or reset
//! bumps the epoch, so events scheduled before it are discarded when they
//! come due instead of acting on a stage they no longer belong to.

use super::activation::{activation_for, Activation};
use super::timers::{Guard, ScheduledEvent, TimedAction, TimerQueue};
use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::params::{Param, VolcanoParams};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Smallest gap between two ramp events, keeps a degenerate interval from spinning.
const MIN_RAMP_INTERVAL: f64 = 1e-3;

/// Stage of the eruption cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Stage {
    #[default]
    Dormant,
    PressureBuilding,
    MagmaRising,
    Erupting,
    PostEruption,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Dormant => "Dormant",
            Stage::PressureBuilding => "Pressure Building",
            Stage::MagmaRising => "Magma Rising",
            Stage::Erupting => "Erupting",
            Stage::PostEruption => "Post-Eruption",
        }
    }

    /// Successor in the auto-demo cycle.
    pub fn next(self) -> Stage {
        match self {
            Stage::Dormant => Stage::PressureBuilding,
            Stage::PressureBuilding => Stage::MagmaRising,
            Stage::MagmaRising => Stage::Erupting,
            Stage::Erupting => Stage::PostEruption,
            Stage::PostEruption => Stage::Dormant,
        }
    }
}

/// What caused a stage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionCause {
    /// A stage timer elapsed.
    Timer,
    /// Pressure crossed a stage threshold.
    Pressure,
    /// Auto-demo was switched off.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: Stage,
    pub to: Stage,
    /// Simulated time of the transition.
    pub at: f64,
    pub cause: TransitionCause,
}

/// Bounded history of recent transitions.
#[derive(Resource, Debug, Clone)]
pub struct StageLog {
    entries: VecDeque<StageTransition>,
    capacity: usize,
    total: u64,
}

impl Default for StageLog {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl StageLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
        }
    }

    pub fn record(&mut self, transition: StageTransition) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(transition);
        self.total += 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageTransition> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&StageTransition> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Transitions recorded since start, including ones evicted from the window.
    pub fn total(&self) -> u64 {
        self.total
    }
}

/// The stage machine resource.
#[derive(Resource, Debug, Clone, Default)]
pub struct StageMachine {
    stage: Stage,
    auto_demo: bool,
    paused: bool,
    stage_entered_at: f64,
    epoch: u64,
    /// Dormant delay timer is pending.
    armed: bool,
    timers: TimerQueue,
    discarded: u64,
}

impl StageMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn auto_demo(&self) -> bool {
        self.auto_demo
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn stage_entered_at(&self) -> f64 {
        self.stage_entered_at
    }

    pub fn time_in_stage(&self, now: f64) -> f64 {
        (now - self.stage_entered_at).max(0.0)
    }

    /// Stale events dropped so far.
    pub fn discarded_events(&self) -> u64 {
        self.discarded
    }

    pub fn pending_events(&self) -> usize {
        self.timers.len()
    }

    /// Which subsystems the current stage shows.
    pub fn activation(&self) -> Activation {
        activation_for(self.stage, self.auto_demo)
    }

    /// Whether an event scheduled under `guard` may still take effect.
    pub fn is_live(&self, guard: Guard) -> bool {
        self.auto_demo && !self.paused && guard.epoch == self.epoch && guard.stage == self.stage
    }

    /// Toggle auto-demo.
    ///
    /// Enabling arms the dormant timer. Disabling forces an immediate return to
    /// Dormant with pressure and intensity at baseline and all timers cancelled.
    /// Returns the reset transition when the stage actually changed.
    pub fn set_auto_demo(
        &mut self,
        enabled: bool,
        now: f64,
        params: &mut VolcanoParams,
        config: &SimConfig,
    ) -> Option<StageTransition> {
        if enabled == self.auto_demo {
            return None;
        }
        self.auto_demo = enabled;
        info!(enabled, "auto-demo toggled");

        if enabled {
            if self.stage == Stage::Dormant && !self.armed {
                self.arm_dormancy(now, config);
            }
            return None;
        }

        let from = self.stage;
        self.stage = Stage::Dormant;
        self.stage_entered_at = now;
        self.epoch += 1;
        self.armed = false;
        self.timers.clear();
        params.set(Param::Pressure, config.baseline.pressure);
        params.set(Param::EruptionIntensity, config.baseline.eruption_intensity);

        if from == Stage::Dormant {
            return None;
        }
        let transition = StageTransition {
            from,
            to: Stage::Dormant,
            at: now,
            cause: TransitionCause::Reset,
        };
        info!(from = from.label(), to = "Dormant", at = now, "stage reset");
        Some(transition)
    }

    /// Pause or resume. Stage, pressure and pending timers are left as they are.
    pub fn set_paused(&mut self, paused: bool) {
        if paused != self.paused {
            self.paused = paused;
            info!(paused, "pause toggled");
        }
    }

    /// Advance the machine to simulated time `now`.
    ///
    /// Applies due events in time order and checks the pressure gate of the
    /// current stage. At most one transition happens per call.
    pub fn update(
        &mut self,
        now: f64,
        params: &mut VolcanoParams,
        config: &SimConfig,
    ) -> Option<StageTransition> {
        if !self.auto_demo || self.paused {
            return None;
        }
        if self.stage == Stage::Dormant && !self.armed {
            self.arm_dormancy(now, config);
        }

        while let Some(event) = self.timers.pop_due(now) {
            if !self.is_live(event.guard) {
                self.discarded += 1;
                debug!(
                    action = ?event.action,
                    scheduled_in = event.guard.stage.label(),
                    current = self.stage.label(),
                    "discarding stale stage event"
                );
                continue;
            }
            if let Some(transition) = self.fire(event, now, params, config) {
                return Some(transition);
            }
        }

        self.check_pressure_gate(now, params, config)
    }

    fn fire(
        &mut self,
        event: ScheduledEvent,
        now: f64,
        params: &mut VolcanoParams,
        config: &SimConfig,
    ) -> Option<StageTransition> {
        match event.action {
            TimedAction::EndDormancy => {
                self.armed = false;
                Some(self.transition(Stage::PressureBuilding, now, TransitionCause::Timer, params, config))
            }
            TimedAction::EndEruption => {
                Some(self.transition(Stage::PostEruption, now, TransitionCause::Timer, params, config))
            }
            TimedAction::EndAftermath => {
                Some(self.transition(Stage::Dormant, now, TransitionCause::Timer, params, config))
            }
            TimedAction::RampPressure => {
                let step = match self.stage {
                    Stage::PressureBuilding => config.stages.building_step,
                    Stage::MagmaRising => config.stages.rising_step,
                    _ => return None,
                };
                params.adjust(Param::Pressure, step);
                if let Some(transition) = self.check_pressure_gate(now, params, config) {
                    return Some(transition);
                }
                let interval = (config.stages.ramp_interval as f64).max(MIN_RAMP_INTERVAL);
                self.schedule(event.due + interval, TimedAction::RampPressure);
                None
            }
        }
    }

    fn check_pressure_gate(
        &mut self,
        now: f64,
        params: &mut VolcanoParams,
        config: &SimConfig,
    ) -> Option<StageTransition> {
        let pressure = params.pressure();
        let next = match self.stage {
            Stage::PressureBuilding if pressure >= config.stages.rising_threshold => {
                Stage::MagmaRising
            }
            Stage::MagmaRising if pressure >= config.stages.eruption_threshold => Stage::Erupting,
            _ => return None,
        };
        Some(self.transition(next, now, TransitionCause::Pressure, params, config))
    }

    fn transition(
        &mut self,
        to: Stage,
        now: f64,
        cause: TransitionCause,
        params: &mut VolcanoParams,
        config: &SimConfig,
    ) -> StageTransition {
        let from = self.stage;
        self.stage = to;
        self.stage_entered_at = now;
        self.epoch += 1;
        info!(
            from = from.label(),
            to = to.label(),
            ?cause,
            at = now,
            pressure = params.pressure(),
            "stage transition"
        );

        let stages = &config.stages;
        match to {
            Stage::Dormant => {
                self.armed = false;
                params.set(Param::EruptionIntensity, config.baseline.eruption_intensity);
                if self.auto_demo {
                    self.arm_dormancy(now, config);
                }
            }
            Stage::PressureBuilding | Stage::MagmaRising => {
                let interval = (stages.ramp_interval as f64).max(MIN_RAMP_INTERVAL);
                self.schedule(now + interval, TimedAction::RampPressure);
            }
            Stage::Erupting => {
                params.set(Param::EruptionIntensity, stages.peak_intensity);
                self.schedule(now + stages.eruption_duration as f64, TimedAction::EndEruption);
            }
            Stage::PostEruption => {
                params.set(Param::EruptionIntensity, stages.post_eruption_intensity);
                params.set(Param::Pressure, stages.post_eruption_pressure);
                self.schedule(now + stages.aftermath_duration as f64, TimedAction::EndAftermath);
            }
        }

        StageTransition { from, to, at: now, cause }
    }

    fn arm_dormancy(&mut self, now: f64, config: &SimConfig) {
        self.armed = true;
        self.schedule(now + config.stages.dormant_delay as f64, TimedAction::EndDormancy);
        debug!(due = now + config.stages.dormant_delay as f64, "dormant timer armed");
    }

    fn schedule(&mut self, due: f64, action: TimedAction) {
        self.timers.schedule(ScheduledEvent {
            due,
            guard: Guard {
                epoch: self.epoch,
                stage: self.stage,
            },
            action,
        });
    }
}

/// System that advances the stage machine by the current clock time.
///
/// ## Data Access
/// - Reads: SimClock, SimConfig
/// - Writes: StageMachine, VolcanoParams, StageLog
pub fn stage_system(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    mut machine: ResMut<StageMachine>,
    mut params: ResMut<VolcanoParams>,
    mut log: ResMut<StageLog>,
) {
    if let Some(transition) = machine.update(clock.sim_time, &mut params, &config) {
        log.record(transition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 60.0;

    /// Step the machine from `start` for `seconds`, collecting transitions.
    fn run(
        machine: &mut StageMachine,
        params: &mut VolcanoParams,
        config: &SimConfig,
        start: f64,
        seconds: f64,
    ) -> (f64, Vec<StageTransition>) {
        let mut now = start;
        let mut out = Vec::new();
        let end = start + seconds;
        while now < end {
            now += DT;
            if let Some(t) = machine.update(now, params, config) {
                out.push(t);
            }
        }
        (now, out)
    }

    fn demo_machine() -> (StageMachine, VolcanoParams, SimConfig) {
        let config = SimConfig::default();
        let mut params = VolcanoParams::from_baseline(&config.baseline);
        let mut machine = StageMachine::new();
        machine.set_auto_demo(true, 0.0, &mut params, &config);
        (machine, params, config)
    }

    #[test]
    fn test_stays_dormant_without_auto_demo() {
        let config = SimConfig::default();
        let mut params = VolcanoParams::from_baseline(&config.baseline);
        let mut machine = StageMachine::new();
        let (_, transitions) = run(&mut machine, &mut params, &config, 0.0, 20.0);
        assert!(transitions.is_empty());
        assert_eq!(machine.stage(), Stage::Dormant);
        assert_eq!(params.pressure(), 10.0);
    }

    #[test]
    fn test_dormant_delay_then_building() {
        let (mut machine, mut params, config) = demo_machine();
        let (now, transitions) = run(&mut machine, &mut params, &config, 0.0, 2.9);
        assert!(transitions.is_empty());

        let (_, transitions) = run(&mut machine, &mut params, &config, now, 0.2);
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].to, Stage::PressureBuilding);
        assert_eq!(transitions[0].cause, TransitionCause::Timer);
    }

    #[test]
    fn test_ramp_reaches_magma_rising() {
        let (mut machine, mut params, config) = demo_machine();
        // 3 s dormant + 25 ramp steps of 0.2 s from 10 to 60.
        let (_, transitions) = run(&mut machine, &mut params, &config, 0.0, 8.5);

        assert_eq!(machine.stage(), Stage::MagmaRising);
        assert!(params.pressure() >= config.stages.rising_threshold);
        let last = transitions.last().unwrap();
        assert_eq!(last.from, Stage::PressureBuilding);
        assert_eq!(last.cause, TransitionCause::Pressure);
    }

    #[test]
    fn test_full_cycle_order() {
        let (mut machine, mut params, config) = demo_machine();
        let (_, transitions) = run(&mut machine, &mut params, &config, 0.0, 40.0);

        let order: Vec<Stage> = transitions.iter().map(|t| t.to).collect();
        assert!(order.len() >= 6, "expected a full cycle, got {:?}", order);
        for t in &transitions {
            assert_eq!(t.to, t.from.next());
        }
        assert_eq!(
            &order[..5],
            &[
                Stage::PressureBuilding,
                Stage::MagmaRising,
                Stage::Erupting,
                Stage::PostEruption,
                Stage::Dormant,
            ]
        );
    }

    #[test]
    fn test_eruption_and_aftermath_effects() {
        let (mut machine, mut params, config) = demo_machine();
        let (now, _) = run(&mut machine, &mut params, &config, 0.0, 12.0);
        assert_eq!(machine.stage(), Stage::Erupting);
        assert_eq!(params.eruption_intensity(), 100.0);

        let (now, transitions) = run(&mut machine, &mut params, &config, now, 10.0);
        assert_eq!(machine.stage(), Stage::PostEruption);
        assert_eq!(transitions.len(), 1);
        assert_eq!(params.eruption_intensity(), 30.0);
        assert_eq!(params.pressure(), 20.0);

        let (_, _) = run(&mut machine, &mut params, &config, now, 8.1);
        assert_eq!(machine.stage(), Stage::Dormant);
        assert_eq!(params.eruption_intensity(), 0.0);
        assert_eq!(params.pressure(), 20.0);
    }

    #[test]
    fn test_disable_resets_and_discards_timers() {
        let (mut machine, mut params, config) = demo_machine();
        let (now, _) = run(&mut machine, &mut params, &config, 0.0, 12.0);
        assert_eq!(machine.stage(), Stage::Erupting);

        let reset = machine.set_auto_demo(false, now, &mut params, &config).unwrap();
        assert_eq!(reset.from, Stage::Erupting);
        assert_eq!(reset.cause, TransitionCause::Reset);
        assert_eq!(machine.stage(), Stage::Dormant);
        assert_eq!(params.pressure(), config.baseline.pressure);
        assert_eq!(params.eruption_intensity(), config.baseline.eruption_intensity);
        assert_eq!(machine.pending_events(), 0);
        assert!(machine.activation().is_empty());
    }

    #[test]
    fn test_stale_event_is_discarded() {
        let (mut machine, mut params, config) = demo_machine();
        // Reach PressureBuilding; a ramp event is pending under this epoch.
        let (now, _) = run(&mut machine, &mut params, &config, 0.0, 3.05);
        assert_eq!(machine.stage(), Stage::PressureBuilding);
        assert!(machine.pending_events() > 0);

        // Operator forces pressure over T1; the gate moves the stage before the ramp fires.
        params.set(Param::Pressure, 65.0);
        let t = machine.update(now + 0.001, &mut params, &config).unwrap();
        assert_eq!(t.to, Stage::MagmaRising);

        let before = machine.discarded_events();
        run(&mut machine, &mut params, &config, now + 0.001, 0.3);
        assert!(machine.discarded_events() > before);
    }

    #[test]
    fn test_one_transition_per_tick() {
        let (mut machine, mut params, config) = demo_machine();
        let (now, _) = run(&mut machine, &mut params, &config, 0.0, 3.05);
        assert_eq!(machine.stage(), Stage::PressureBuilding);

        params.set(Param::Pressure, 100.0);
        let first = machine.update(now + DT, &mut params, &config).unwrap();
        assert_eq!(first.to, Stage::MagmaRising);
        let second = machine.update(now + 2.0 * DT, &mut params, &config).unwrap();
        assert_eq!(second.to, Stage::Erupting);
    }

    #[test]
    fn test_pause_freezes_stage_and_pressure() {
        let (mut machine, mut params, config) = demo_machine();
        let (now, _) = run(&mut machine, &mut params, &config, 0.0, 4.0);
        let stage = machine.stage();
        let pressure = params.pressure();

        machine.set_paused(true);
        // Simulated time does not move while paused, so `now` stays put.
        for _ in 0..120 {
            assert!(machine.update(now, &mut params, &config).is_none());
        }
        assert_eq!(machine.stage(), stage);
        assert_eq!(params.pressure(), pressure);
    }

    #[test]
    fn test_stage_log_is_bounded() {
        let mut log = StageLog::with_capacity(2);
        for i in 0..3 {
            log.record(StageTransition {
                from: Stage::Dormant,
                to: Stage::PressureBuilding,
                at: i as f64,
                cause: TransitionCause::Timer,
            });
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.total(), 3);
        assert_eq!(log.latest().unwrap().at, 2.0);
    }

    #[test]
    fn test_stage_system_records_transitions() {
        let mut world = World::new();
        let config = SimConfig::default();
        let mut params = VolcanoParams::from_baseline(&config.baseline);
        let mut machine = StageMachine::new();
        machine.set_auto_demo(true, 0.0, &mut params, &config);

        let mut clock = SimClock::new(config.max_frame_delta);
        world.insert_resource(config);
        world.insert_resource(params);
        world.insert_resource(machine);
        world.insert_resource(StageLog::default());

        let mut schedule = Schedule::default();
        schedule.add_systems(stage_system);

        for _ in 0..200 {
            clock.advance(1.0 / 60.0, false);
            world.insert_resource(clock);
            schedule.run(&mut world);
        }

        let log = world.resource::<StageLog>();
        assert_eq!(log.len(), 1);
        assert_eq!(log.latest().unwrap().to, Stage::PressureBuilding);
        assert_eq!(world.resource::<StageMachine>().stage(), Stage::PressureBuilding);
    }
}
