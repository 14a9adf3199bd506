//! Error type of the CLI run.

use std::io;

use thiserror::Error;

use stitchflow::StitchflowError;

use crate::config::ConfigError;

/// Everything that can stop a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The gesture script is not valid JSON or names an unknown gesture.
    #[error("Invalid gesture script: {error}")]
    Script {
        src: String,
        #[source]
        error: serde_json::Error,
    },

    #[error(transparent)]
    Engine(#[from] StitchflowError),

    /// A gesture was rejected by the engine.
    #[error("Gesture {index} (`{op}`) failed: {source}")]
    Gesture {
        index: usize,
        op: &'static str,
        #[source]
        source: StitchflowError,
    },
}
