//! Stage to subsystem activation table.
//!
//! Particle subsystems never decide when they are shown. Each tick the
//! activation systems copy the table entry for the current stage onto every
//! available subsystem.

use super::stage::{Stage, StageMachine};
use crate::params::VolcanoParams;
use crate::particles::ParticleSubsystem;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The five particle subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubsystemKind {
    Lava,
    Smoke,
    Ash,
    Debris,
    Conduit,
}

impl SubsystemKind {
    pub const ALL: [SubsystemKind; 5] = [
        SubsystemKind::Lava,
        SubsystemKind::Smoke,
        SubsystemKind::Ash,
        SubsystemKind::Debris,
        SubsystemKind::Conduit,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SubsystemKind::Lava => "lava",
            SubsystemKind::Smoke => "smoke",
            SubsystemKind::Ash => "ash",
            SubsystemKind::Debris => "debris",
            SubsystemKind::Conduit => "conduit",
        }
    }

    /// Per-kind salt mixed into the configured seed.
    pub fn seed_salt(self) -> u64 {
        match self {
            SubsystemKind::Lava => 0x4C41_5641,
            SubsystemKind::Smoke => 0x534D_4F4B,
            SubsystemKind::Ash => 0x4153_4821,
            SubsystemKind::Debris => 0x4445_4252,
            SubsystemKind::Conduit => 0x434F_4E44,
        }
    }
}

/// Visibility of each subsystem plus the crater's thermal indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Activation {
    pub thermal: bool,
    pub lava: bool,
    pub smoke: bool,
    pub ash: bool,
    pub debris: bool,
    pub conduit: bool,
}

impl Activation {
    pub const NONE: Activation = Activation {
        thermal: false,
        lava: false,
        smoke: false,
        ash: false,
        debris: false,
        conduit: false,
    };

    pub fn contains(&self, kind: SubsystemKind) -> bool {
        match kind {
            SubsystemKind::Lava => self.lava,
            SubsystemKind::Smoke => self.smoke,
            SubsystemKind::Ash => self.ash,
            SubsystemKind::Debris => self.debris,
            SubsystemKind::Conduit => self.conduit,
        }
    }

    /// Nothing shown at all, thermal indicator included.
    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// Activation table lookup.
pub fn activation_for(stage: Stage, auto_demo: bool) -> Activation {
    match stage {
        Stage::Dormant => Activation {
            thermal: auto_demo,
            ..Activation::NONE
        },
        Stage::PressureBuilding => Activation {
            thermal: true,
            ..Activation::NONE
        },
        Stage::MagmaRising => Activation {
            thermal: true,
            conduit: true,
            ..Activation::NONE
        },
        Stage::Erupting => Activation {
            thermal: true,
            conduit: true,
            lava: true,
            smoke: true,
            debris: true,
            ash: false,
        },
        Stage::PostEruption => Activation {
            thermal: true,
            conduit: true,
            smoke: true,
            ash: true,
            lava: false,
            debris: false,
        },
    }
}

/// Copies the current activation onto subsystem `S`.
///
/// Unavailable subsystems (no resource) are skipped. A subsystem switched on
/// re-launches from the parameters `stage_system` just wrote.
pub fn activation_system<S: ParticleSubsystem>(
    machine: Res<StageMachine>,
    params: Res<VolcanoParams>,
    subsystem: Option<ResMut<S>>,
) {
    let Some(mut subsystem) = subsystem else {
        return;
    };
    let wanted = machine.activation().contains(S::KIND);
    if subsystem.is_active() != wanted {
        debug!(subsystem = S::KIND.label(), active = wanted, "subsystem activation changed");
        subsystem.set_active(wanted, &params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dormant_depends_on_auto_demo() {
        assert!(activation_for(Stage::Dormant, false).is_empty());
        let armed = activation_for(Stage::Dormant, true);
        assert!(armed.thermal);
        for kind in SubsystemKind::ALL {
            assert!(!armed.contains(kind));
        }
    }

    #[test]
    fn test_eruption_table() {
        let a = activation_for(Stage::Erupting, true);
        assert!(a.lava && a.smoke && a.debris && a.conduit);
        assert!(!a.ash);

        let post = activation_for(Stage::PostEruption, true);
        assert!(post.ash && post.smoke && post.conduit);
        assert!(!post.lava && !post.debris);
    }

    #[test]
    fn test_magma_rising_only_conduit() {
        let a = activation_for(Stage::MagmaRising, true);
        for kind in SubsystemKind::ALL {
            assert_eq!(a.contains(kind), kind == SubsystemKind::Conduit);
        }
    }

    #[test]
    fn test_seed_salts_distinct() {
        let mut salts: Vec<u64> = SubsystemKind::ALL.iter().map(|k| k.seed_salt()).collect();
        salts.sort_unstable();
        salts.dedup();
        assert_eq!(salts.len(), 5);
    }
}
