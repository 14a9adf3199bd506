//! CLI logic for the Stitchflow routing engine.
//!
//! The CLI replays a gesture script against an engine, optionally attached to
//! an existing snapshot, settles connector positions and writes the resulting
//! snapshot.

pub mod error_adapter;
pub mod script;

mod args;
mod config;
mod error;

pub use args::Args;
pub use config::ConfigError;
pub use error::CliError;

use std::fs;

use futures::executor::block_on;
use log::info;

use stitchflow::{Engine, persistence::JsonFileStore, position::HeadlessLayout};

/// Run the Stitchflow CLI application
///
/// # Errors
///
/// Returns [`CliError`] for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed gesture scripts or snapshots
/// - Gestures rejected by the engine
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Replaying gesture script"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let mut engine = match &args.snapshot {
        Some(path) => Engine::load(&JsonFileStore::new(path), app_config)?,
        None => Engine::new(app_config),
    };

    let src = fs::read_to_string(&args.input)?;
    let gestures = match script::parse_script(&src) {
        Ok(gestures) => gestures,
        Err(error) => return Err(CliError::Script { src, error }),
    };

    for (index, gesture) in gestures.into_iter().enumerate() {
        let op = gesture.name();
        gesture
            .apply(&mut engine)
            .map_err(|source| CliError::Gesture { index, op, source })?;
    }

    let moved = block_on(engine.refresh_positions(&HeadlessLayout));
    info!(moved = moved; "Connector positions settled");

    engine.save(&JsonFileStore::new(&args.output))?;

    info!(output_file = args.output; "Snapshot written successfully");

    Ok(())
}
