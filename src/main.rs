use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Instant;

use tracing_subscriber::EnvFilter;
use vortex_tracer::config::read_config;
use vortex_tracer::display::Display;
use vortex_tracer::error::CommError;
use vortex_tracer::headless::{LogRenderer, ScriptedInput};
use vortex_tracer::simulation::Simulation;
use vortex_tracer::thread_comm::ThreadComm;
use vortex_tracer::{DISPLAY_RANK, SIMULATION_RANK};

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn main() -> ExitCode {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/config.toml"));
    let config = match read_config(&path) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(path = %path.display(), "{err}");
            return ExitCode::FAILURE;
        }
    };
    let (state, script) = match config.build().and_then(|s| Ok((s, config.script()?))) {
        Ok(built) => built,
        Err(err) => {
            tracing::error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        seed = config.seed,
        n_points = state.cloud.number_of_points(),
        n_vortices = state.vortices.number_of_vortices(),
        mobile = config.mobile,
        dt = config.dt,
        "starting"
    );

    let mut communicators = ThreadComm::create_communicators(config.n_peers);
    let simulation_comm = communicators.remove(SIMULATION_RANK);
    let display_comm = communicators.remove(DISPLAY_RANK);

    let start = Instant::now();
    let (display_result, simulation_result) = thread::scope(|s| {
        let simulation_state = state.clone();
        let simulation = s.spawn(|| -> Result<(), CommError> {
            let mut simulation = Simulation::new(
                simulation_comm,
                simulation_state,
                config.mobile,
                config.dt,
            );
            simulation.run()
        });
        let display = s.spawn(|| -> Result<(), CommError> {
            let mut display = Display::new(display_comm, state, config.mobile, config.dt);
            let mut input = ScriptedInput::new(script, config.display.max_ticks);
            let mut renderer = LogRenderer::new(config.display.log_every);
            display.run(&mut input, &mut renderer)
        });
        (join(display), join(simulation))
    });
    tracing::info!(runtime = ?start.elapsed(), "finished");

    let mut code = ExitCode::SUCCESS;
    for (role, result) in [
        ("display", display_result),
        ("simulation", simulation_result),
    ] {
        if let Err(err) = result {
            tracing::error!(role, "{err}");
            code = ExitCode::FAILURE;
        }
    }
    code
}

fn join(handle: thread::ScopedJoinHandle<'_, Result<(), CommError>>) -> Result<(), String> {
    match handle.join() {
        Ok(result) => result.map_err(|err| err.to_string()),
        Err(_) => Err("thread panicked".to_string()),
    }
}
