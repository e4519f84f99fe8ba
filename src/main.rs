//! # SILTIME-RS
//!
//! Time-Dependent Safety Integrity Level Engine
//!
//! Demo: a high-pressure protection loop evaluated across its mission.

use siltime_rs::*;

/// Pressure transmitter with a maintenance-quality series sampled from a
/// (synthetic) CMMS export.
fn pressure_transmitter() -> Component {
    let mut signals = DegradationSignals::nominal();
    signals.maintenance_quality = Box::new(
        SampledSeries::new(vec![
            (0.0, 1.0),
            (20_000.0, 0.9),
            (50_000.0, 0.75),
            (87_600.0, 0.6),
        ])
        .expect("samples provided"),
    );
    signals.environment_factor = Box::new(ConstantSeries(1.2));
    signals.diagnostic_coverage = Box::new(ConstantSeries(0.6));
    Component::new("PT-101", 3e-7, 8760.0, DemandMode::Low, 87_600.0, signals)
        .expect("valid transmitter config")
}

/// Logic solver, well maintained, high diagnostic coverage.
fn logic_solver() -> Component {
    let mut signals = DegradationSignals::nominal();
    signals.diagnostic_coverage = Box::new(ConstantSeries(0.9));
    Component::new("LS-1", 1e-7, 8760.0, DemandMode::Low, 131_400.0, signals)
        .expect("valid solver config")
}

/// Shutdown valve: the weakest link, stress rises with cycling.
fn shutdown_valve() -> Component {
    let mut signals = DegradationSignals::nominal();
    signals.cycle_count = Box::new(|t: f64| t / 168.0); // weekly demand
    signals.stress_factor = Box::new(ConstantSeries(1.5));
    Component::new("XV-201", 8e-7, 8760.0, DemandMode::Low, 70_080.0, signals)
        .expect("valid valve config")
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("SILTIME-RS v{}", VERSION);
    println!("Time-dependent SIL engine demo: high-pressure protection loop");
    println!();

    let members = vec![pressure_transmitter(), logic_solver(), shutdown_valve()];
    let sif = SilLoop::new("SIF-204", Architecture::Series, 2, members)
        .expect("valid loop config");

    let model = MultiplicativeHazard::with_aging(2e-6, 1e-4);
    let engine = SilEngine::new(Box::new(model));

    // Evaluate across the mission: early life, mid-life, near the weakest
    // component's horizon, and past it.
    for &t in &[1000.0, 30_000.0, 65_000.0, 75_000.0] {
        match engine.evaluate(&sif, t) {
            Ok(report) => println!("{}", report.report()),
            Err(err) => println!("SIL(t) query at t = {} h failed: {}", t, err),
        }
        println!();
    }
}
