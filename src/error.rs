use std::path::PathBuf;

use crate::graph::NodeId;
use serde_json::Error as JsonError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph file {path} could not be read: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("graph JSON could not be parsed: {source}")]
    Parse {
        #[from]
        source: JsonError,
    },
    #[error("invalid operand for parameter `{parameter}`: {reason}")]
    InvalidOperand { parameter: String, reason: String },
    #[error("named input `{name}` is given more than once")]
    DuplicateNamedInput { name: String },
    #[error("matrix of {rows}x{cols} cannot hold {len} values")]
    ShapeMismatch { rows: u32, cols: u32, len: usize },
    #[error("operand has no output named `{name}`")]
    UnknownOutput { name: String },
    #[error("graph must declare nodes and outputs")]
    EmptyGraph,
    #[error("node {node} references node {input} which does not exist")]
    InvalidNodeReference { node: NodeId, input: NodeId },
    #[error("node {node} consumes node {input} before it is created")]
    NodeNotReady { node: NodeId, input: NodeId },
    #[error("node {node} is malformed: {reason}")]
    MalformedNode { node: NodeId, reason: String },
    #[error("node {node} local data byte mismatch (expected {expected}, got {actual})")]
    LocalDataLengthMismatch {
        node: NodeId,
        expected: usize,
        actual: usize,
    },
    #[error("list node {node} output `{output}` does not alias the list")]
    ListOutputMismatch { node: NodeId, output: String },
    #[error("node {node} does not match the signature of `{operation}`: {reason}")]
    SignatureMismatch {
        node: NodeId,
        operation: String,
        reason: String,
    },
    #[error("DML signature could not be parsed: {reason}")]
    InvalidSignature { reason: String },
    #[error("no Rust binding can be rendered for `{name}`: {reason}")]
    UnsupportedBinding { name: String, reason: String },
    #[error("graph converter `{requested}` is not available. Supported: {available:?}")]
    UnknownConverter {
        requested: String,
        available: Vec<&'static str>,
    },
    #[error("graph conversion failed for {format}: {reason}")]
    ConversionFailed { format: String, reason: String },
    #[error("graph could not be exported to {path}: {source}")]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GraphError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GraphError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn export(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GraphError::ExportIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_operand(parameter: &str, reason: impl Into<String>) -> Self {
        GraphError::InvalidOperand {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }
}
