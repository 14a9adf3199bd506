//! Error adapter for converting [`CliError`] to miette diagnostics.
//!
//! This module provides the bridge between the CLI's error type and miette's
//! rich diagnostic formatting. Script syntax errors are rendered against the
//! script source; every other error is rendered as a plain report with a code
//! and, where one helps, a hint.

use std::{error::Error, fmt};

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use stitchflow::{StitchflowError, TransitionError};

use crate::{config::ConfigError, error::CliError};

/// Adapter for a syntax error in the gesture script.
pub struct ScriptDiagnostic<'a> {
    error: &'a serde_json::Error,
    src: &'a str,
}

impl<'a> ScriptDiagnostic<'a> {
    pub fn new(error: &'a serde_json::Error, src: &'a str) -> Self {
        Self { error, src }
    }

    /// Byte offset of the error position reported by the JSON parser.
    fn offset(&self) -> usize {
        let line = self.error.line().saturating_sub(1);
        let column = self.error.column().saturating_sub(1);
        let line_start: usize = self
            .src
            .split_inclusive('\n')
            .take(line)
            .map(str::len)
            .sum();
        (line_start + column).min(self.src.len())
    }
}

impl fmt::Debug for ScriptDiagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptDiagnostic")
            .field("error", &self.error)
            .finish()
    }
}

impl fmt::Display for ScriptDiagnostic<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid gesture script: {}", self.error)
    }
}

impl Error for ScriptDiagnostic<'_> {}

impl MietteDiagnostic for ScriptDiagnostic<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("stitchflow::script"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "a script is a JSON list of objects tagged with `op` \
             (add_part, connect, move, set_pending_step, confirm, edit, delete)",
        ))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = SourceSpan::new(self.offset().into(), 0);
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some("here".to_string()),
            span,
        ))))
    }
}

/// Adapter for [`CliError`] values without source information.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl ErrorAdapter<'_> {
    fn engine_error(&self) -> Option<&StitchflowError> {
        match self.0 {
            CliError::Engine(err) | CliError::Gesture { source: err, .. } => Some(err),
            _ => None,
        }
    }
}

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            CliError::Io(_) => "stitchflow::io",
            CliError::Config(_) => "stitchflow::config",
            CliError::Script { .. } => "stitchflow::script",
            CliError::Engine(err) | CliError::Gesture { source: err, .. } => engine_code(err),
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        if let CliError::Config(ConfigError::MissingFile(_)) = self.0 {
            return Some(Box::new("pass an existing TOML file to --config"));
        }
        match self.engine_error()? {
            StitchflowError::Validation(err) => Some(Box::new(format!(
                "fill in `{}` in the confirm settings",
                err.field()
            ))),
            StitchflowError::Transition(TransitionError::NotConfirmed(_)) => {
                Some(Box::new("only confirmed groups and parts can be edited"))
            }
            StitchflowError::Transition(TransitionError::AlreadyConfirmed(_)) => {
                Some(Box::new("reopen the group with `edit` before confirming it again"))
            }
            _ => None,
        }
    }
}

fn engine_code(err: &StitchflowError) -> &'static str {
    match err {
        StitchflowError::Io(_) => "stitchflow::io",
        StitchflowError::Snapshot(_) => "stitchflow::snapshot",
        StitchflowError::Graph(_) => "stitchflow::graph",
        StitchflowError::Validation(_) => "stitchflow::validation",
        StitchflowError::Transition(_) => "stitchflow::transition",
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A script error pointing into the script source.
    Script(ScriptDiagnostic<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Script(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Reportable::Script(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Script(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Script(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Script(d) => d.source_code(),
            Reportable::Error(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Script(d) => d.labels(),
            Reportable::Error(_) => None,
        }
    }
}

/// Convert a [`CliError`] into the reports to render.
pub fn to_reportables(err: &CliError) -> Vec<Reportable<'_>> {
    match err {
        CliError::Script { src, error } => vec![Reportable::Script(ScriptDiagnostic::new(error, src))],
        other => vec![Reportable::Error(ErrorAdapter(other))],
    }
}
