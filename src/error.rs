//! Error taxonomy for the generator.
//!
//! Three failure classes, kept deliberately distinct:
//! - configuration problems are rejected eagerly, before any row is
//!   synthesized, and name the offending field;
//! - schema violations mean a synthesizer produced an out-of-domain
//!   value (an anchor bug, not bad input) and are fatal for the run;
//! - sink write failures abort the affected table only. Batches already
//!   handed to the sink stay valid; the error carries enough context to
//!   report partial output.

use crate::tables::TableKind;

/// Error raised by a sink implementation while emitting a batch.
#[derive(Debug, Clone)]
pub struct SinkWriteError {
    message: String,
}

impl SinkWriteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<std::io::Error> for SinkWriteError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

impl std::fmt::Display for SinkWriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sink write failed: {}", self.message)
    }
}

impl std::error::Error for SinkWriteError {}

/// Errors surfaced by a generation run.
#[derive(Debug, Clone)]
pub enum SimError {
    /// Invalid `GenerationRequest` field. Raised before generation starts.
    Configuration {
        field: &'static str,
        message: String,
    },
    /// A synthesizer produced a value outside its documented domain.
    SchemaViolation {
        table: TableKind,
        field: &'static str,
        detail: String,
    },
    /// The sink failed while a table was being emitted. Earlier batches
    /// of that table remain committed.
    SinkWrite {
        table: TableKind,
        batches_committed: u64,
        source: SinkWriteError,
    },
}

impl SimError {
    pub fn configuration(field: &'static str, message: impl Into<String>) -> Self {
        Self::Configuration {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration { field, message } => {
                write!(f, "invalid configuration: {}: {}", field, message)
            }
            Self::SchemaViolation {
                table,
                field,
                detail,
            } => {
                write!(
                    f,
                    "schema violation in {} table: {}: {}",
                    table.name(),
                    field,
                    detail
                )
            }
            Self::SinkWrite {
                table,
                batches_committed,
                source,
            } => {
                write!(
                    f,
                    "{} table aborted after {} committed batches: {}",
                    table.name(),
                    batches_committed,
                    source
                )
            }
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SinkWrite { source, .. } => Some(source),
            _ => None,
        }
    }
}
