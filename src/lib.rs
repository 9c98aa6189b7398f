pub mod builtins;
pub mod context;
pub mod converters;
pub mod error;
pub mod generator;
pub mod graph;
pub mod graphviz;
pub mod loader;
pub mod signature;
pub mod validator;

pub use builtins::{pca, sherlock_predict};
pub use context::{Argument, Context, ContextProperties, Operand};
pub use converters::{ConvertedGraph, ConverterRegistry, DmlScript, GraphConverter};
pub use error::GraphError;
pub use generator::render_binding;
pub use graph::{
    GraphInfo, InputValue, ListOutput, Literal, LocalMatrix, NamedInput, NodeData, NodeId,
    OutputType,
};
pub use graphviz::graph_to_dot;
pub use loader::{load_graph_from_path, load_signature_from_path};
pub use signature::{Signature, ValueKind, parse_dml_signature};
pub use validator::{GraphValidator, ValidationArtifacts, ValidatorProperties};
