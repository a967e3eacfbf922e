//! Interactive ripple surface. Click or touch to drop a pulse.
//!
//! Usage: `ripple-surface [config.json]`

use ripple::SimulationConfig;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match SimulationConfig::load_json(Path::new(&path)) {
            Ok(config) => {
                log::info!("Loaded config from {path}");
                config
            }
            Err(e) => {
                log::error!("Failed to load {path}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => SimulationConfig::default(),
    };

    match surface::app::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
