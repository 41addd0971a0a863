//! Snapshot types.
//!
//! The `Snapshot` struct is a serializable view of the simulation state for
//! display and debug consumers (status overlays, logs, tests). It is not a
//! persistence format; nothing reads it back into a running simulation.

use crate::clock::SimClock;
use crate::params::VolcanoParams;
use crate::particles::{
    AshCloud, ConduitFlow, LavaFountain, ParticleSubsystem, RockDebris, SmokeDrift,
};
use crate::systems::activation::SubsystemKind;
use crate::systems::feedback::{Feedback, GaugeBand};
use crate::systems::stage::{Stage, StageMachine};
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// State of one particle subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsystemSnapshot {
    pub kind: SubsystemKind,
    /// False when the subsystem was configured with an empty pool.
    pub available: bool,
    pub active: bool,
    pub capacity: usize,
    pub respawns: u64,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Frames advanced so far.
    pub tick: u64,
    /// Simulated seconds (excludes paused time).
    pub sim_time: f64,
    /// Wall seconds (includes paused time).
    pub wall_time: f64,
    pub stage: Stage,
    pub time_in_stage: f64,
    pub auto_demo: bool,
    pub paused: bool,
    pub params: VolcanoParams,
    pub shake_intensity: f32,
    pub pressure_band: GaugeBand,
    pub crater_glow: f32,
    pub subsystems: Vec<SubsystemSnapshot>,
}

fn subsystem_snapshot<S: ParticleSubsystem>(world: &World) -> SubsystemSnapshot {
    match world.get_resource::<S>() {
        Some(subsystem) => SubsystemSnapshot {
            kind: S::KIND,
            available: true,
            active: subsystem.is_active(),
            capacity: subsystem.pool().capacity(),
            respawns: subsystem.pool().respawn_count(),
        },
        None => SubsystemSnapshot {
            kind: S::KIND,
            available: false,
            active: false,
            capacity: 0,
            respawns: 0,
        },
    }
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    ///
    /// Missing core resources fall back to their defaults.
    pub fn from_world(world: &World) -> Self {
        let clock = world.get_resource::<SimClock>().copied().unwrap_or_default();
        let params = world.get_resource::<VolcanoParams>().copied().unwrap_or_default();
        let feedback = world.get_resource::<Feedback>().cloned().unwrap_or_default();
        let (stage, time_in_stage, auto_demo, paused) = match world.get_resource::<StageMachine>() {
            Some(machine) => (
                machine.stage(),
                machine.time_in_stage(clock.sim_time),
                machine.auto_demo(),
                machine.is_paused(),
            ),
            None => (Stage::Dormant, 0.0, false, false),
        };

        Self {
            tick: clock.frame,
            sim_time: clock.sim_time,
            wall_time: clock.wall_time,
            stage,
            time_in_stage,
            auto_demo,
            paused,
            params,
            shake_intensity: feedback.shake_intensity,
            pressure_band: feedback.pressure_band,
            crater_glow: feedback.crater_glow,
            subsystems: vec![
                subsystem_snapshot::<LavaFountain>(world),
                subsystem_snapshot::<SmokeDrift>(world),
                subsystem_snapshot::<AshCloud>(world),
                subsystem_snapshot::<RockDebris>(world),
                subsystem_snapshot::<ConduitFlow>(world),
            ],
        }
    }

    pub fn subsystem(&self, kind: SubsystemKind) -> Option<&SubsystemSnapshot> {
        self.subsystems.iter().find(|s| s.kind == kind)
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
