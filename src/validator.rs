use std::collections::{BTreeSet, HashMap, HashSet};

use crate::builtins;
use crate::error::GraphError;
use crate::graph::{GraphInfo, InputValue, NodeData, NodeId, OutputType};

#[derive(Debug, Clone)]
pub struct ValidatorProperties {
    /// Check calls of registered builtins against their DML signatures.
    pub check_signatures: bool,
}

impl Default for ValidatorProperties {
    fn default() -> Self {
        Self {
            check_signatures: true,
        }
    }
}

#[derive(Debug)]
pub struct ValidationArtifacts {
    pub local_inputs: Vec<NodeId>,
    pub node_to_dependent_operations: HashMap<NodeId, Vec<String>>,
    pub reachable_nodes: BTreeSet<NodeId>,
}

pub struct GraphValidator<'a> {
    graph: &'a GraphInfo,
    properties: ValidatorProperties,
    node_to_dependents: HashMap<NodeId, Vec<String>>,
}

impl<'a> GraphValidator<'a> {
    pub fn new(graph: &'a GraphInfo, properties: ValidatorProperties) -> Self {
        Self {
            graph,
            properties,
            node_to_dependents: HashMap::new(),
        }
    }

    pub fn validate(mut self) -> Result<ValidationArtifacts, GraphError> {
        if self.graph.nodes.is_empty() || self.graph.outputs.is_empty() {
            return Err(GraphError::EmptyGraph);
        }
        if self.graph.nodes.len() >= u32::MAX as usize {
            return Err(GraphError::MalformedNode {
                node: NodeId(u32::MAX),
                reason: format!("graph holds {} nodes", self.graph.nodes.len()),
            });
        }

        let graph = self.graph;
        let mut local_inputs = Vec::new();
        for (idx, node) in graph.nodes.iter().enumerate() {
            let id = NodeId(idx as u32);
            self.validate_inputs(id, node)?;
            match (&node.operation, &node.value, &node.local_data) {
                (None, None, Some(local)) => {
                    self.validate_local_data(id, node)?;
                    let expected = local.expected_byte_length().ok_or_else(|| {
                        GraphError::MalformedNode {
                            node: id,
                            reason: "local data shape overflows".to_string(),
                        }
                    })?;
                    if local.data.len() != expected {
                        return Err(GraphError::LocalDataLengthMismatch {
                            node: id,
                            expected,
                            actual: local.data.len(),
                        });
                    }
                    local_inputs.push(id);
                }
                (None, Some(_), None) => {
                    if node.output_type != OutputType::Scalar || has_inputs(node) {
                        return Err(GraphError::MalformedNode {
                            node: id,
                            reason: "literal nodes must be scalars without inputs".to_string(),
                        });
                    }
                }
                (None, None, None) => self.validate_alias(id, node)?,
                (Some(operation), None, None) => {
                    if node.output_type == OutputType::List {
                        self.validate_list(id, node)?;
                    } else if !node.outputs.is_empty() {
                        return Err(GraphError::MalformedNode {
                            node: id,
                            reason: "only list nodes declare outputs".to_string(),
                        });
                    }
                    if self.properties.check_signatures {
                        validate_signature(id, operation, node)?;
                    }
                }
                _ => {
                    return Err(GraphError::MalformedNode {
                        node: id,
                        reason: "node mixes an operation, a literal and local data".to_string(),
                    });
                }
            }
        }

        let reachable_nodes = self.reachable_nodes()?;
        Ok(ValidationArtifacts {
            local_inputs,
            node_to_dependent_operations: self.node_to_dependents,
            reachable_nodes,
        })
    }

    fn validate_inputs(&mut self, id: NodeId, node: &NodeData) -> Result<(), GraphError> {
        let mut names = HashSet::new();
        for input in &node.named_inputs {
            if input.name.is_empty() {
                return Err(GraphError::MalformedNode {
                    node: id,
                    reason: "named input without a name".to_string(),
                });
            }
            if !names.insert(input.name.as_str()) {
                return Err(GraphError::DuplicateNamedInput {
                    name: input.name.clone(),
                });
            }
        }
        for input in node.input_nodes() {
            if self.graph.node(input).is_none() {
                return Err(GraphError::InvalidNodeReference { node: id, input });
            }
            if input >= id {
                return Err(GraphError::NodeNotReady { node: id, input });
            }
            self.node_to_dependents
                .entry(input)
                .or_default()
                .push(node.display_name());
        }
        Ok(())
    }

    fn validate_local_data(&self, id: NodeId, node: &NodeData) -> Result<(), GraphError> {
        if node.output_type != OutputType::Matrix || has_inputs(node) {
            return Err(GraphError::MalformedNode {
                node: id,
                reason: "local data must be a matrix without inputs".to_string(),
            });
        }
        Ok(())
    }

    /// An alias reads output `_<idx>` of a list node that points back at it.
    fn validate_alias(&self, id: NodeId, node: &NodeData) -> Result<(), GraphError> {
        let malformed = |reason: &str| GraphError::MalformedNode {
            node: id,
            reason: reason.to_string(),
        };
        if !node.unnamed_inputs.is_empty() {
            return Err(malformed("alias nodes take no unnamed inputs"));
        }
        let [input] = node.named_inputs.as_slice() else {
            return Err(malformed(
                "node has neither an operation, a value nor local data",
            ));
        };
        let InputValue::Node(list_id) = input.value else {
            return Err(malformed("alias must reference a list node"));
        };
        let index: usize = input
            .name
            .strip_prefix('_')
            .and_then(|idx| idx.parse().ok())
            .ok_or_else(|| malformed("alias input must be named `_<index>`"))?;
        let list = self
            .graph
            .node(list_id)
            .filter(|list| list.output_type == OutputType::List)
            .ok_or_else(|| malformed("alias must reference a list node"))?;
        match list.outputs.get(index) {
            Some(output) if output.node == id && output.output_type == node.output_type => Ok(()),
            _ => Err(GraphError::ListOutputMismatch {
                node: list_id,
                output: input.name.clone(),
            }),
        }
    }

    fn validate_list(&self, id: NodeId, node: &NodeData) -> Result<(), GraphError> {
        let mut names = HashSet::new();
        for (idx, output) in node.outputs.iter().enumerate() {
            let mismatch = || GraphError::ListOutputMismatch {
                node: id,
                output: output.name.clone(),
            };
            if !names.insert(output.name.as_str()) {
                return Err(mismatch());
            }
            let alias = self.graph.node(output.node).ok_or_else(mismatch)?;
            let expected = format!("_{}", idx);
            let points_back = matches!(
                alias.named_input(&expected),
                Some(InputValue::Node(list)) if *list == id
            );
            if !points_back || alias.operation.is_some() {
                return Err(mismatch());
            }
        }
        Ok(())
    }

    fn reachable_nodes(&self) -> Result<BTreeSet<NodeId>, GraphError> {
        let mut seen = BTreeSet::new();
        let mut stack = self.graph.outputs.clone();
        while let Some(id) = stack.pop() {
            let node = self.graph.node(id).ok_or(GraphError::InvalidNodeReference {
                node: id,
                input: id,
            })?;
            if seen.insert(id) {
                stack.extend(node.input_nodes());
            }
        }
        Ok(seen)
    }
}

fn has_inputs(node: &NodeData) -> bool {
    !node.unnamed_inputs.is_empty() || !node.named_inputs.is_empty()
}

/// Named inputs of a registered builtin call must be a subset of its
/// parameters that covers every required one.
pub(crate) fn validate_signature(
    id: NodeId,
    operation: &str,
    node: &NodeData,
) -> Result<(), GraphError> {
    let Some(signature) = builtins::signature(operation) else {
        return Ok(());
    };
    let mismatch = |reason: String| GraphError::SignatureMismatch {
        node: id,
        operation: operation.to_string(),
        reason,
    };
    if !node.unnamed_inputs.is_empty() {
        return Err(mismatch("builtins take named inputs only".to_string()));
    }
    if node.output_type != signature.output_type() {
        return Err(mismatch(format!(
            "output type {:?} differs from {:?}",
            node.output_type,
            signature.output_type()
        )));
    }
    for input in &node.named_inputs {
        if signature.param(&input.name).is_none() {
            return Err(mismatch(format!("unknown parameter `{}`", input.name)));
        }
    }
    for param in signature.required_params() {
        if node.named_input(&param.name).is_none() {
            return Err(mismatch(format!("missing parameter `{}`", param.name)));
        }
    }
    if node.output_type == OutputType::List && node.outputs.len() != signature.returns.len() {
        return Err(mismatch(format!(
            "declares {} outputs instead of {}",
            node.outputs.len(),
            signature.returns.len()
        )));
    }
    Ok(())
}
