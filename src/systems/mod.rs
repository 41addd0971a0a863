//! ECS systems for the eruption simulation.
//!
//! ## Tick Order
//!
//! The schedule runs single-threaded, in this order:
//!
//! 1. `stage_system` - polls stage timers and pressure gates, may write parameters
//! 2. `activation_system::<S>` - copies the stage's activation onto each subsystem
//! 3. `particle_tick_system::<S>` - lava, smoke, ash, debris, conduit
//! 4. `feedback_system` - camera shake, gauge band and labels
//!
//! Operator writes happen between ticks, so every system in a tick sees the
//! same parameter values apart from what `stage_system` wrote first.

pub mod activation;
pub mod feedback;
pub mod stage;
pub mod timers;

pub use activation::{activation_for, activation_system, Activation, SubsystemKind};
pub use feedback::{compute_feedback, feedback_system, Feedback, GaugeBand};
pub use stage::{stage_system, Stage, StageLog, StageMachine, StageTransition, TransitionCause};
pub use timers::{Guard, ScheduledEvent, TimedAction, TimerQueue};
