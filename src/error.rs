use std::path::PathBuf;

use serde_json::Error as JsonError;
use thiserror::Error;

use crate::device::DeviceKind;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("{reason} (input rank {input_rank}, filter rank {filter_rank})")]
    RankMismatch {
        reason: &'static str,
        input_rank: usize,
        filter_rank: usize,
    },
    #[error("`{name}` has {actual} entries, expected {expected}")]
    HyperparameterLengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("input has {input_channels} channels but filter expects {filter_channels}")]
    ChannelMismatch {
        input_channels: i64,
        filter_channels: i64,
    },
    #[error("`{name}`{} has invalid value {value}", .index.map(|i| format!("[{i}]")).unwrap_or_default())]
    InvalidHyperparameter {
        name: &'static str,
        index: Option<usize>,
        value: i64,
    },
    #[error("output dimension {dim} has non-positive extent {extent}")]
    DegenerateOutputShape { dim: usize, extent: i64 },
    #[error("output dimension {dim} overflows 64-bit extent arithmetic")]
    ExtentOverflow { dim: usize },
    #[error("operator `{op_type}` has no variable bound to slot `{slot}`")]
    MissingVariableSlot { op_type: String, slot: &'static str },
    #[error("operator `{op_type}` binds {count} variables to slot `{slot}`, expected exactly one")]
    SlotArity {
        op_type: String,
        slot: &'static str,
        count: usize,
    },
    #[error("operator `{op_type}` references unknown variable `{name}`")]
    UnknownVariable { op_type: String, name: String },
    #[error("operator `{op_type}` is missing attribute `{name}`")]
    MissingAttribute { op_type: String, name: &'static str },
    #[error("operator `{op_type}` attribute `{name}` must be {expected}")]
    AttributeType {
        op_type: String,
        name: &'static str,
        expected: &'static str,
    },
    #[error("operator `{op_type}` is not registered for backend {backend}. Supported: {available:?}")]
    UnsupportedOperator {
        op_type: String,
        backend: DeviceKind,
        available: Vec<&'static str>,
    },
    #[error("variable `{name}` exceeds tensor byte limit ({byte_length} > {limit})")]
    TensorLimit {
        name: String,
        byte_length: usize,
        limit: usize,
    },
    #[error("operation `{operation}` (#{index}) failed: {source}")]
    OperatorFailed {
        operation: String,
        index: usize,
        #[source]
        source: Box<OpError>,
    },
    #[error("program file {path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("program JSON could not be parsed: {source}")]
    Parse {
        #[from]
        source: JsonError,
    },
    #[error("unsupported program format: {reason}")]
    UnsupportedFormat { reason: String },
    #[error("inferred shapes could not be serialized: {source}")]
    Serialize {
        #[source]
        source: JsonError,
    },
}

impl OpError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OpError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn in_operation(self, operation: impl Into<String>, index: usize) -> Self {
        OpError::OperatorFailed {
            operation: operation.into(),
            index,
            source: Box::new(self),
        }
    }

    /// The error at the root of any `OperatorFailed` wrapping.
    pub fn root(&self) -> &OpError {
        match self {
            OpError::OperatorFailed { source, .. } => source.root(),
            other => other,
        }
    }
}
