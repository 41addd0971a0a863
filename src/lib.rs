//! Volcano Sim - Eruption Simulation Core
//!
//! A deterministic, single-threaded ECS simulation of a stratovolcano's
//! eruption cycle: a staged lifecycle state machine driving five pooled
//! particle subsystems (lava fountain, smoke drift, ash cloud, rock debris,
//! conduit flow) over a shared parameter store.
//! Uses `bevy_ecs` for the world, resources and schedule; rendering lives
//! outside the crate and reads the flat buffers in `render_bridge`.

pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod params;
pub mod particles;
pub mod render_bridge;
pub mod systems;
pub mod world;

pub use api::VolcanoSim;
pub use clock::SimClock;
pub use config::{FeedbackConfig, ParamBaseline, PoolSizes, SimConfig, StageConfig, VolcanoGeometry};
pub use error::{Result, SimError};
pub use params::{Param, VolcanoParams};
pub use particles::{
    AshCloud, ConduitFlow, LavaFountain, ParticlePool, ParticleSubsystem, RockDebris, SmokeDrift,
};
pub use systems::{
    activation_for, Activation, Feedback, GaugeBand, Stage, StageTransition, SubsystemKind,
    TransitionCause,
};
pub use world::{Snapshot, SubsystemSnapshot};
