//! Execution context and operand handles.
//!
//! A [`Context`] owns the arena of deferred nodes for one session. Every
//! [`Operand`] is a handle into that arena; creating an operand records a node
//! but never evaluates anything.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, trace};

use crate::converters::dml::{DmlScript, render_script};
use crate::error::GraphError;
use crate::graph::{
    GraphInfo, InputValue, ListOutput, Literal, LocalMatrix, NamedInput, NodeData, NodeId,
    OutputType,
};
use crate::validator::{GraphValidator, ValidatorProperties, validate_signature};

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct ContextProperties {
    /// Prefix of the variable names used when rendering DML.
    pub variable_prefix: String,
}

impl Default for ContextProperties {
    fn default() -> Self {
        Self {
            variable_prefix: "V".to_string(),
        }
    }
}

struct ContextInner {
    id: u64,
    properties: ContextProperties,
    nodes: RefCell<Vec<NodeData>>,
}

#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextInner>,
}

/// A value bound to a builtin parameter: either a graph operand or a literal.
#[derive(Debug, Clone)]
pub enum Argument<'a> {
    Operand(&'a Operand),
    Literal(Literal),
}

impl<'a> From<&'a Operand> for Argument<'a> {
    fn from(operand: &'a Operand) -> Self {
        Argument::Operand(operand)
    }
}

impl From<i64> for Argument<'_> {
    fn from(value: i64) -> Self {
        Argument::Literal(Literal::Int(value))
    }
}

impl From<f64> for Argument<'_> {
    fn from(value: f64) -> Self {
        Argument::Literal(Literal::Double(value))
    }
}

impl From<bool> for Argument<'_> {
    fn from(value: bool) -> Self {
        Argument::Literal(Literal::Bool(value))
    }
}

impl From<&str> for Argument<'_> {
    fn from(value: &str) -> Self {
        Argument::Literal(Literal::Str(value.to_string()))
    }
}

impl From<Literal> for Argument<'_> {
    fn from(value: Literal) -> Self {
        Argument::Literal(value)
    }
}

impl Context {
    pub fn new() -> Self {
        Self::with_properties(ContextProperties::default())
    }

    pub fn with_properties(properties: ContextProperties) -> Self {
        Self {
            inner: Rc::new(ContextInner {
                id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
                properties,
                nodes: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn properties(&self) -> &ContextProperties {
        &self.inner.properties
    }

    pub fn node_count(&self) -> usize {
        self.inner.nodes.borrow().len()
    }

    pub fn node(&self, id: NodeId) -> Option<NodeData> {
        self.inner.nodes.borrow().get(id.0 as usize).cloned()
    }

    /// Snapshot of every node recorded so far, with `outputs` as the graph outputs.
    pub fn graph_info(&self, outputs: &[NodeId]) -> GraphInfo {
        GraphInfo {
            nodes: self.inner.nodes.borrow().clone(),
            outputs: outputs.to_vec(),
        }
    }

    /// Wraps client-side values (row-major) as a matrix operand.
    pub fn from_matrix(&self, rows: u32, cols: u32, values: &[f64]) -> Result<Operand, GraphError> {
        let expected = (rows as usize).checked_mul(cols as usize);
        if expected != Some(values.len()) {
            return Err(GraphError::ShapeMismatch {
                rows,
                cols,
                len: values.len(),
            });
        }
        let mut node = NodeData::new(None, OutputType::Matrix);
        node.local_data = Some(LocalMatrix::from_values(rows, cols, values));
        Ok(self.record(node))
    }

    pub fn scalar(&self, value: impl Into<Literal>) -> Operand {
        let mut node = NodeData::new(None, OutputType::Scalar);
        node.value = Some(value.into());
        self.record(node)
    }

    /// Matrix read by the engine from `path` when the script runs.
    pub fn read(&self, path: &str) -> Operand {
        let mut node = NodeData::new(Some("read".to_string()), OutputType::Matrix);
        node.unnamed_inputs
            .push(InputValue::Literal(Literal::Str(path.to_string())));
        self.record(node)
    }

    /// Records a deferred application of `operation` to `named_inputs`.
    ///
    /// Operands from another context, repeated parameter names and calls
    /// that do not fit a registered builtin signature are rejected before
    /// anything is recorded.
    pub fn create_node(
        &self,
        operation: &str,
        named_inputs: Vec<(&str, Argument<'_>)>,
        output_type: OutputType,
    ) -> Result<Operand, GraphError> {
        let mut node = NodeData::new(Some(operation.to_string()), output_type);
        node.named_inputs = self.resolve_named_inputs(named_inputs)?;
        validate_signature(self.next_id(), operation, &node)?;
        Ok(self.record(node))
    }

    /// Records a multi-output operation and one alias node per output.
    pub fn create_list(
        &self,
        operation: &str,
        named_inputs: Vec<(&str, Argument<'_>)>,
        outputs: &[(&str, OutputType)],
    ) -> Result<Operand, GraphError> {
        let mut node = NodeData::new(Some(operation.to_string()), OutputType::List);
        node.named_inputs = self.resolve_named_inputs(named_inputs)?;
        // Aliases are recorded right after the list node.
        let list_id = self.next_id();
        node.outputs = outputs
            .iter()
            .enumerate()
            .map(|(idx, (name, output_type))| ListOutput {
                name: name.to_string(),
                output_type: *output_type,
                node: NodeId(list_id.0 + 1 + idx as u32),
            })
            .collect();
        validate_signature(list_id, operation, &node)?;

        let list = self.record(node);
        for (idx, (_, output_type)) in outputs.iter().enumerate() {
            let mut alias = NodeData::new(None, *output_type);
            alias.named_inputs.push(NamedInput {
                name: format!("_{}", idx),
                value: InputValue::Node(list.id),
            });
            self.record(alias);
        }
        Ok(list)
    }

    fn next_id(&self) -> NodeId {
        NodeId(self.node_count() as u32)
    }

    fn resolve_named_inputs(
        &self,
        named_inputs: Vec<(&str, Argument<'_>)>,
    ) -> Result<Vec<NamedInput>, GraphError> {
        let mut resolved: Vec<NamedInput> = Vec::with_capacity(named_inputs.len());
        for (name, argument) in named_inputs {
            if resolved.iter().any(|input| input.name == name) {
                return Err(GraphError::DuplicateNamedInput {
                    name: name.to_string(),
                });
            }
            let value = match argument {
                Argument::Operand(operand) => {
                    if operand.context != *self {
                        return Err(GraphError::invalid_operand(
                            name,
                            format!(
                                "operand belongs to context {}, not {}",
                                operand.context.id(),
                                self.id()
                            ),
                        ));
                    }
                    InputValue::Node(operand.id)
                }
                Argument::Literal(literal) => InputValue::Literal(literal),
            };
            resolved.push(NamedInput {
                name: name.to_string(),
                value,
            });
        }
        Ok(resolved)
    }

    fn record(&self, node: NodeData) -> Operand {
        let output_type = node.output_type;
        let mut nodes = self.inner.nodes.borrow_mut();
        let id = NodeId(nodes.len() as u32);
        debug!(
            "recorded node {} `{}` ({:?})",
            id,
            node.display_name(),
            output_type
        );
        nodes.push(node);
        Operand {
            context: self.clone(),
            id,
            output_type,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Context {}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.inner.id)
            .field("nodes", &self.node_count())
            .finish()
    }
}

/// Handle to a deferred node. Equality is identity: same context, same node.
#[derive(Clone, PartialEq, Eq)]
pub struct Operand {
    context: Context,
    id: NodeId,
    output_type: OutputType,
}

impl Operand {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn output_type(&self) -> OutputType {
        self.output_type
    }

    pub fn node(&self) -> NodeData {
        self.context.inner.nodes.borrow()[self.id.0 as usize].clone()
    }

    /// Fails unless this operand can be used where a matrix is expected.
    ///
    /// Pure: nothing is recorded and the operand stays usable afterwards.
    pub fn check_matrix_op(&self, parameter: &str) -> Result<(), GraphError> {
        trace!(
            "checking `{}` (node {}) for matrix use",
            parameter, self.id
        );
        match self.output_type {
            OutputType::Matrix => Ok(()),
            other => Err(GraphError::invalid_operand(
                parameter,
                format!("expected a matrix operand, found {:?}", other),
            )),
        }
    }

    pub fn check_frame_op(&self, parameter: &str) -> Result<(), GraphError> {
        match self.output_type {
            OutputType::Frame => Ok(()),
            other => Err(GraphError::invalid_operand(
                parameter,
                format!("expected a frame operand, found {:?}", other),
            )),
        }
    }

    /// Looks up an output of a list operand by name.
    pub fn named_output(&self, name: &str) -> Result<Operand, GraphError> {
        let unknown = || GraphError::UnknownOutput {
            name: name.to_string(),
        };
        if self.output_type != OutputType::List {
            return Err(unknown());
        }
        let node = self.node();
        let output = node
            .outputs
            .iter()
            .find(|output| output.name == name)
            .ok_or_else(unknown)?;
        Ok(Operand {
            context: self.context.clone(),
            id: output.node,
            output_type: output.output_type,
        })
    }

    /// Outputs of a list operand in declaration order.
    pub fn outputs(&self) -> Vec<Operand> {
        self.node()
            .outputs
            .iter()
            .map(|output| Operand {
                context: self.context.clone(),
                id: output.node,
                output_type: output.output_type,
            })
            .collect()
    }

    pub fn abs(&self) -> Result<Operand, GraphError> {
        self.check_matrix_op("X")?;
        let mut node = NodeData::new(Some("abs".to_string()), OutputType::Matrix);
        node.unnamed_inputs.push(InputValue::Node(self.id));
        Ok(self.context.record(node))
    }

    /// Element-wise `+`; scalar plus scalar stays a scalar.
    pub fn try_add(&self, other: &Operand) -> Result<Operand, GraphError> {
        for (parameter, operand) in [("lhs", self), ("rhs", other)] {
            if !matches!(
                operand.output_type,
                OutputType::Matrix | OutputType::Scalar
            ) {
                return Err(GraphError::invalid_operand(
                    parameter,
                    format!(
                        "expected a matrix or scalar operand, found {:?}",
                        operand.output_type
                    ),
                ));
            }
        }
        if other.context != self.context {
            return Err(GraphError::invalid_operand(
                "rhs",
                "operand belongs to a different context",
            ));
        }
        let output_type = if self.output_type == OutputType::Scalar
            && other.output_type == OutputType::Scalar
        {
            OutputType::Scalar
        } else {
            OutputType::Matrix
        };
        let mut node = NodeData::new(Some("+".to_string()), output_type);
        node.unnamed_inputs = vec![InputValue::Node(self.id), InputValue::Node(other.id)];
        Ok(self.context.record(node))
    }

    pub fn to_graph_info(&self) -> GraphInfo {
        self.context.graph_info(&[self.id])
    }

    /// Validates the graph below this operand and renders it as a DML script.
    pub fn to_script(&self) -> Result<DmlScript, GraphError> {
        let graph = self.to_graph_info();
        GraphValidator::new(&graph, ValidatorProperties::default()).validate()?;
        render_script(&graph, &self.context.properties().variable_prefix)
    }
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operand")
            .field("context", &self.context.id())
            .field("id", &self.id)
            .field("output_type", &self.output_type)
            .finish()
    }
}
