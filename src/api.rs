//! Public API for the simulation.
//!
//! `VolcanoSim` is the single entry point for an embedding application: the
//! renderer loop calls `step(frame_dt)` once per frame, the control panel
//! calls the setters between frames, and gauges, camera and particle
//! renderers read the accessors and flat buffers.
//!
//! ## Frame Tick
//!
//! One `step` runs exactly one logical tick. The frame delta is sanitised and
//! capped (see `SimClock`), so a stalled frame cannot tunnel particles. While
//! paused, wall time still advances but simulated time, stage timers and
//! particle motion are frozen.

use crate::clock::SimClock;
use crate::config::SimConfig;
use crate::error::Result;
use crate::params::{Param, VolcanoParams};
use crate::particles::{
    particle_tick_system, AshCloud, ConduitFlow, LavaFountain, ParticlePool, ParticleSubsystem,
    RockDebris, SmokeDrift,
};
use crate::render_bridge;
use crate::systems::*;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use std::path::Path;

/// The main simulation container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Building the simulation from configuration
/// - Stepping it forward one frame at a time
/// - Operator control input (parameters, auto-demo, pause)
/// - Render buffers, feedback values and snapshots
pub struct VolcanoSim {
    world: World,
    schedule: Schedule,
}

impl VolcanoSim {
    /// Create a simulation with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Create a simulation from a configuration that already passed
    /// `SimConfig::validate`. Use `try_with_config` for untrusted values.
    ///
    /// Subsystems whose pool size is zero are left out of the world and
    /// treated as permanently inactive.
    pub fn with_config(config: SimConfig) -> Self {
        debug_assert!(config.validate().is_ok(), "with_config given an invalid SimConfig");
        let mut world = World::new();
        let params = VolcanoParams::from_baseline(&config.baseline);

        // Core resources
        world.insert_resource(SimClock::new(config.max_frame_delta));
        world.insert_resource(params);
        world.insert_resource(StageMachine::new());
        world.insert_resource(StageLog::default());
        world.insert_resource(compute_feedback(
            Stage::Dormant,
            &params,
            0.0,
            &config.feedback,
        ));

        // Particle subsystems, one seeded RNG each
        let pools = &config.pools;
        let geometry = &config.geometry;
        let seed = |kind: SubsystemKind| config.seed ^ kind.seed_salt();
        if pools.lava > 0 {
            world.insert_resource(LavaFountain::new(pools.lava, seed(SubsystemKind::Lava), geometry, &params));
        }
        if pools.smoke > 0 {
            world.insert_resource(SmokeDrift::new(pools.smoke, seed(SubsystemKind::Smoke), geometry, &params));
        }
        if pools.ash > 0 {
            world.insert_resource(AshCloud::new(pools.ash, seed(SubsystemKind::Ash), geometry, &params));
        }
        if pools.debris > 0 {
            world.insert_resource(RockDebris::new(pools.debris, seed(SubsystemKind::Debris), geometry, &params));
        }
        if pools.conduit > 0 {
            world.insert_resource(ConduitFlow::new(pools.conduit, seed(SubsystemKind::Conduit), geometry));
        }

        world.insert_resource(config);

        let mut schedule = Schedule::default();
        schedule.set_executor_kind(ExecutorKind::SingleThreaded);
        schedule.add_systems(
            (
                stage_system,
                activation_system::<LavaFountain>,
                activation_system::<SmokeDrift>,
                activation_system::<AshCloud>,
                activation_system::<RockDebris>,
                activation_system::<ConduitFlow>,
                particle_tick_system::<LavaFountain>,
                particle_tick_system::<SmokeDrift>,
                particle_tick_system::<AshCloud>,
                particle_tick_system::<RockDebris>,
                particle_tick_system::<ConduitFlow>,
                feedback_system,
            )
                .chain(),
        );

        Self { world, schedule }
    }

    /// Validate, then build.
    pub fn try_with_config(config: SimConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Parse, validate and build from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(Self::with_config(SimConfig::from_toml_str(source)?))
    }

    /// Load, validate and build from a TOML file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::with_config(SimConfig::from_file(path)?))
    }

    /// Advance one frame of `frame_dt` seconds.
    pub fn step(&mut self, frame_dt: f32) {
        let paused = self.is_paused();
        if let Some(mut clock) = self.world.get_resource_mut::<SimClock>() {
            clock.advance(frame_dt, paused);
        }
        self.schedule.run(&mut self.world);
    }

    // ------------------------------------------------------------------
    // Clock and stage
    // ------------------------------------------------------------------

    fn clock(&self) -> SimClock {
        self.world.get_resource::<SimClock>().copied().unwrap_or_default()
    }

    /// Frames advanced so far.
    pub fn tick(&self) -> u64 {
        self.clock().frame
    }

    /// Simulated seconds (excludes paused time).
    pub fn sim_time(&self) -> f64 {
        self.clock().sim_time
    }

    /// Wall seconds, paused frames included. Drives camera orbit and similar.
    pub fn wall_time(&self) -> f64 {
        self.clock().wall_time
    }

    pub fn stage(&self) -> Stage {
        self.world
            .get_resource::<StageMachine>()
            .map(|m| m.stage())
            .unwrap_or_default()
    }

    pub fn time_in_stage(&self) -> f64 {
        let now = self.sim_time();
        self.world
            .get_resource::<StageMachine>()
            .map(|m| m.time_in_stage(now))
            .unwrap_or(0.0)
    }

    pub fn auto_demo(&self) -> bool {
        self.world
            .get_resource::<StageMachine>()
            .is_some_and(|m| m.auto_demo())
    }

    pub fn is_paused(&self) -> bool {
        self.world
            .get_resource::<StageMachine>()
            .is_some_and(|m| m.is_paused())
    }

    /// Current stage activation, thermal indicator included.
    pub fn activation(&self) -> Activation {
        self.world
            .get_resource::<StageMachine>()
            .map(|m| m.activation())
            .unwrap_or(Activation::NONE)
    }

    /// Recent stage transitions, oldest first.
    pub fn transitions(&self) -> Vec<StageTransition> {
        self.world
            .get_resource::<StageLog>()
            .map(|log| log.iter().copied().collect())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Control input
    // ------------------------------------------------------------------

    /// Toggle the auto-demo.
    ///
    /// Switching it off returns the volcano to Dormant immediately: every
    /// subsystem is hidden and pressure and intensity are back at baseline
    /// before this call returns.
    pub fn set_auto_demo(&mut self, enabled: bool) {
        let now = self.sim_time();
        let Some(config) = self.world.get_resource::<SimConfig>().cloned() else {
            return;
        };
        let Some(mut params) = self.world.get_resource::<VolcanoParams>().copied() else {
            return;
        };
        let transition = match self.world.get_resource_mut::<StageMachine>() {
            Some(mut machine) => machine.set_auto_demo(enabled, now, &mut params, &config),
            None => return,
        };
        self.world.insert_resource(params);

        if let Some(transition) = transition {
            if let Some(mut log) = self.world.get_resource_mut::<StageLog>() {
                log.record(transition);
            }
        }
        self.sync_activation();
    }

    /// Pause or resume the eruption cycle and particle motion.
    pub fn set_paused(&mut self, paused: bool) {
        if let Some(mut machine) = self.world.get_resource_mut::<StageMachine>() {
            machine.set_paused(paused);
        }
    }

    pub fn params(&self) -> VolcanoParams {
        self.world
            .get_resource::<VolcanoParams>()
            .copied()
            .unwrap_or_default()
    }

    pub fn get_param(&self, param: Param) -> f32 {
        self.params().get(param)
    }

    /// Write a parameter, clamped to its range. Visible to the next tick.
    pub fn set_param(&mut self, param: Param, value: f32) {
        if let Some(mut params) = self.world.get_resource_mut::<VolcanoParams>() {
            params.set(param, value);
        }
    }

    pub fn adjust_param(&mut self, param: Param, delta: f32) {
        if let Some(mut params) = self.world.get_resource_mut::<VolcanoParams>() {
            params.adjust(param, delta);
        }
    }

    pub fn set_pressure(&mut self, value: f32) {
        self.set_param(Param::Pressure, value);
    }

    pub fn set_temperature(&mut self, value: f32) {
        self.set_param(Param::Temperature, value);
    }

    pub fn set_gas_content(&mut self, value: f32) {
        self.set_param(Param::GasContent, value);
    }

    pub fn set_viscosity(&mut self, value: f32) {
        self.set_param(Param::MagmaViscosity, value);
    }

    pub fn set_intensity(&mut self, value: f32) {
        self.set_param(Param::EruptionIntensity, value);
    }

    /// Apply the machine's activation to every subsystem and refresh feedback now,
    /// without waiting for the next tick.
    fn sync_activation(&mut self) {
        let activation = self.activation();
        let params = self.params();
        apply_activation::<LavaFountain>(&mut self.world, activation, &params);
        apply_activation::<SmokeDrift>(&mut self.world, activation, &params);
        apply_activation::<AshCloud>(&mut self.world, activation, &params);
        apply_activation::<RockDebris>(&mut self.world, activation, &params);
        apply_activation::<ConduitFlow>(&mut self.world, activation, &params);

        let stage = self.stage();
        let t = self.clock().elapsed();
        let feedback = self
            .world
            .get_resource::<SimConfig>()
            .map(|config| compute_feedback(stage, &params, t, &config.feedback));
        if let Some(feedback) = feedback {
            self.world.insert_resource(feedback);
        }
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    pub fn feedback(&self) -> Feedback {
        self.world
            .get_resource::<Feedback>()
            .cloned()
            .unwrap_or_default()
    }

    /// Camera shake for this frame.
    pub fn shake_intensity(&self) -> f32 {
        self.world
            .get_resource::<Feedback>()
            .map(|f| f.shake_intensity)
            .unwrap_or(0.0)
    }

    /// Pool of a subsystem, `None` when it was configured out.
    pub fn subsystem_pool(&self, kind: SubsystemKind) -> Option<&ParticlePool> {
        match kind {
            SubsystemKind::Lava => self.world.get_resource::<LavaFountain>().map(|s| s.pool()),
            SubsystemKind::Smoke => self.world.get_resource::<SmokeDrift>().map(|s| s.pool()),
            SubsystemKind::Ash => self.world.get_resource::<AshCloud>().map(|s| s.pool()),
            SubsystemKind::Debris => self.world.get_resource::<RockDebris>().map(|s| s.pool()),
            SubsystemKind::Conduit => self.world.get_resource::<ConduitFlow>().map(|s| s.pool()),
        }
    }

    pub fn is_subsystem_available(&self, kind: SubsystemKind) -> bool {
        self.subsystem_pool(kind).is_some()
    }

    pub fn is_subsystem_active(&self, kind: SubsystemKind) -> bool {
        self.subsystem_pool(kind).is_some_and(|p| p.is_visible())
    }

    /// Particle buffer for a subsystem (see `render_bridge` for the layout).
    pub fn render_buffer(&self, kind: SubsystemKind) -> Vec<f32> {
        render_bridge::pool_to_flatbuffer(self.subsystem_pool(kind))
    }

    /// Refill `buffer` with a subsystem's particle buffer, reusing its allocation.
    pub fn write_render_buffer(&self, kind: SubsystemKind, buffer: &mut Vec<f32>) {
        render_bridge::write_particle_buffer(self.subsystem_pool(kind), buffer);
    }

    /// Rock debris instance transforms (see `render_bridge` for the layout).
    pub fn debris_instances(&self) -> Vec<f32> {
        render_bridge::debris_to_instance_buffer(self.world.get_resource::<RockDebris>())
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::from_world(&self.world)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&self) -> String {
        self.snapshot().to_json().unwrap_or_else(|_| "{}".to_string())
    }

    pub fn config(&self) -> Option<&SimConfig> {
        self.world.get_resource::<SimConfig>()
    }

    /// Get a reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get a mutable reference to the ECS world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for VolcanoSim {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_activation<S: ParticleSubsystem>(
    world: &mut World,
    activation: Activation,
    params: &VolcanoParams,
) {
    if let Some(mut subsystem) = world.get_resource_mut::<S>() {
        subsystem.set_active(activation.contains(S::KIND), params);
    }
}
