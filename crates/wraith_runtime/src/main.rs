//! Wraith - headless actor lifecycle simulation
//!
//! Usage:
//!   wraith                      # uses wraith.toml or built-in defaults
//!   WRAITH_CONFIG=run.toml wraith
//!   WRAITH_SEED=7 WRAITH_DURATION=300 wraith
//!   RUST_LOG=debug wraith       # show every state transition

use wraith_runtime::{Simulation, WraithConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Wraith v{}", env!("CARGO_PKG_VERSION"));

    let config = WraithConfig::load();
    config.print_summary();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(config.simulation.fast_forward)
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            log::error!("Failed to start runtime: {}", err);
            std::process::exit(1);
        }
    };

    let report = runtime.block_on(async {
        let simulation = Simulation::new(&config);
        simulation.run(&config.simulation).await
    });
    report.log_summary();
}
