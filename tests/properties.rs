//! Property tests over the public simulation API.

use proptest::prelude::*;
use volcano_sim::{
    Param, PoolSizes, SimConfig, Stage, SubsystemKind, TransitionCause, VolcanoParams, VolcanoSim,
};

fn small_sim() -> VolcanoSim {
    VolcanoSim::with_config(SimConfig {
        pools: PoolSizes {
            lava: 24,
            smoke: 16,
            ash: 24,
            debris: 8,
            conduit: 12,
        },
        ..SimConfig::default()
    })
}

fn param_strategy() -> impl Strategy<Value = Param> {
    prop::sample::select(Param::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn set_stores_clamped_value(param in param_strategy(), value in -1.0e6f32..1.0e6f32) {
        let mut params = VolcanoParams::default();
        params.set(param, value);
        let (min, max) = param.range();
        prop_assert_eq!(params.get(param), value.clamp(min, max));
    }

    #[test]
    fn particles_stay_finite(
        pressure in -500.0f32..500.0,
        gas in -500.0f32..500.0,
        viscosity in -500.0f32..500.0,
        intensity in -500.0f32..500.0,
        frames in 1usize..600,
        dt in 0.0f32..0.5,
    ) {
        let mut sim = small_sim();
        sim.set_auto_demo(true);
        sim.set_pressure(pressure);
        sim.set_gas_content(gas);
        sim.set_viscosity(viscosity);
        sim.set_intensity(intensity);
        for _ in 0..frames {
            sim.step(dt);
        }
        for kind in SubsystemKind::ALL {
            let pool = sim.subsystem_pool(kind).unwrap();
            prop_assert!(pool.is_finite(), "{:?} produced a non-finite value", kind);
        }
        for value in sim.debris_instances() {
            prop_assert!(value.is_finite());
        }
    }

    #[test]
    fn transitions_follow_cycle_order(dt in 0.005f32..0.1, seconds in 5.0f32..70.0) {
        let mut sim = small_sim();
        sim.set_auto_demo(true);
        let frames = (seconds / dt) as usize;
        for _ in 0..frames {
            sim.step(dt);
        }
        for t in sim.transitions() {
            prop_assert_ne!(t.cause, TransitionCause::Reset);
            prop_assert_eq!(t.to, t.from.next());
        }
    }

    #[test]
    fn disabling_auto_demo_resets(seconds in 0.0f32..40.0) {
        let mut sim = small_sim();
        sim.set_auto_demo(true);
        for _ in 0..(seconds * 60.0) as usize {
            sim.step(1.0 / 60.0);
        }
        sim.set_auto_demo(false);

        let baseline = SimConfig::default().baseline;
        prop_assert_eq!(sim.stage(), Stage::Dormant);
        prop_assert_eq!(sim.params().pressure(), baseline.pressure);
        prop_assert_eq!(sim.params().eruption_intensity(), baseline.eruption_intensity);
        for kind in SubsystemKind::ALL {
            prop_assert!(!sim.is_subsystem_active(kind));
        }
    }

    #[test]
    fn pause_freezes_stage_and_pressure(before in 0.0f32..30.0, paused_frames in 1usize..400) {
        let mut sim = small_sim();
        sim.set_auto_demo(true);
        for _ in 0..(before * 60.0) as usize {
            sim.step(1.0 / 60.0);
        }
        sim.set_paused(true);
        let stage = sim.stage();
        let pressure = sim.params().pressure();
        for _ in 0..paused_frames {
            sim.step(1.0 / 60.0);
        }
        prop_assert_eq!(sim.stage(), stage);
        prop_assert_eq!(sim.params().pressure(), pressure);
    }
}
