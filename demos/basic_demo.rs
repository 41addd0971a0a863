//! Basic demonstration of the eruption cycle.
//!
//! Run with: cargo run --example basic_demo
//! Set RUST_LOG=volcano_sim=debug to see activation changes and stale timers.

use volcano_sim::render_bridge::{self, instance_offset, parse_header, particle_offset};
use volcano_sim::{Stage, SubsystemKind, VolcanoSim};

const FRAME: f32 = 1.0 / 60.0;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    println!("=== Stratovolcano - Eruption Cycle Demo ===\n");

    let mut sim = match std::env::args().nth(1) {
        Some(path) => match VolcanoSim::from_config_file(&path) {
            Ok(sim) => sim,
            Err(e) => {
                eprintln!("Failed to load {path}: {e}");
                std::process::exit(1);
            }
        },
        None => VolcanoSim::new(),
    };

    println!("Initial state:");
    print_status(&sim);

    println!("\n--- Enabling auto-demo ---\n");
    sim.set_auto_demo(true);

    // 40 seconds at 60 fps covers one full cycle and the start of the next.
    let mut last_stage = sim.stage();
    for frame in 0..(40 * 60) {
        sim.step(FRAME);

        if sim.stage() != last_stage {
            last_stage = sim.stage();
            println!("--- t={:.2}s entered {} ---", sim.sim_time(), last_stage.label());
            print_status(&sim);
            print_buffers(&sim);
        } else if (frame + 1) % 300 == 0 {
            println!("--- t={:.2}s ---", sim.sim_time());
            print_status(&sim);
        }
    }

    println!("\n--- Pausing for 2 seconds ---\n");
    sim.set_paused(true);
    for _ in 0..120 {
        sim.step(FRAME);
    }
    println!(
        "sim_time={:.2}s wall_time={:.2}s (wall time keeps moving)",
        sim.sim_time(),
        sim.wall_time()
    );
    sim.set_paused(false);

    println!("\n--- Disabling auto-demo ---\n");
    sim.set_auto_demo(false);
    print_status(&sim);
    assert_eq!(sim.stage(), Stage::Dormant);

    println!("\n=== Final State (JSON) ===\n");
    match sim.snapshot().to_json_pretty() {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("snapshot serialization failed: {e}"),
    }
}

fn print_status(sim: &VolcanoSim) {
    let feedback = sim.feedback();
    println!(
        "  stage={} pressure={} ({:?}) temp={} intensity={} shake={:.3} glow={:.2}",
        feedback.stage_label,
        feedback.pressure_label,
        feedback.pressure_band,
        feedback.temperature_label,
        feedback.intensity_label,
        feedback.shake_intensity,
        feedback.crater_glow,
    );

    let active: Vec<&str> = SubsystemKind::ALL
        .iter()
        .filter(|kind| sim.is_subsystem_active(**kind))
        .map(|kind| kind.label())
        .collect();
    println!("  active subsystems: [{}]", active.join(", "));
}

/// Read the render buffers the way a renderer would: header first, then the
/// first record of each visible buffer.
fn print_buffers(sim: &VolcanoSim) {
    for kind in SubsystemKind::ALL {
        let buffer = sim.render_buffer(kind);
        let Some((visible, count)) = parse_header(&buffer) else {
            continue;
        };
        if !visible || count == 0 {
            continue;
        }
        let first = particle_offset(0);
        println!(
            "  {} buffer: {} particles, first at y={:.2} opacity={:.2}",
            kind.label(),
            count,
            buffer[first + render_bridge::FIELD_Y],
            buffer[first + render_bridge::FIELD_OPACITY],
        );
    }

    let instances = sim.debris_instances();
    if let Some((true, count)) = parse_header(&instances) {
        if count > 0 {
            let first = instance_offset(0);
            println!(
                "  debris instances: {} rocks, first at y={:.2} scale={:.2}",
                count,
                instances[first + render_bridge::FIELD_Y],
                instances[first + render_bridge::FIELD_SCALE],
            );
        }
    }
}
