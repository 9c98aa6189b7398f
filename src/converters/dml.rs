use std::collections::BTreeSet;
use std::fmt::Write;

use super::{ConvertedGraph, GraphConverter};
use crate::error::GraphError;
use crate::graph::{GraphInfo, InputValue, NodeData, NodeId, OutputType};

/// Client-side matrix that has to be bound to the script before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInput {
    pub name: String,
    pub node: NodeId,
    pub rows: u32,
    pub cols: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DmlScript {
    pub source: String,
    pub inputs: Vec<ScriptInput>,
    pub outputs: Vec<String>,
}

impl DmlScript {
    /// The script source preceded by comments naming its inputs and outputs.
    pub fn annotated_source(&self) -> String {
        let mut text = String::new();
        for input in &self.inputs {
            let _ = writeln!(text, "# input {} {}x{}", input.name, input.rows, input.cols);
        }
        for output in &self.outputs {
            let _ = writeln!(text, "# output {}", output);
        }
        text.push_str(&self.source);
        text
    }
}

/// Renders the nodes reachable from `graph.outputs` as DML statements in id order.
pub fn render_script(graph: &GraphInfo, prefix: &str) -> Result<DmlScript, GraphError> {
    let reachable = reachable_nodes(graph)?;
    let var = |id: NodeId| format!("{}{}", prefix, id);

    let mut source = String::new();
    let mut inputs = Vec::new();
    for &id in &reachable {
        let node = &graph.nodes[id.0 as usize];
        if let Some(local) = &node.local_data {
            inputs.push(ScriptInput {
                name: var(id),
                node: id,
                rows: local.rows,
                cols: local.cols,
            });
            continue;
        }
        let line = match &node.operation {
            None => render_data_node(id, node, &var)?,
            Some(operation) => render_call(id, operation, node, &var),
        };
        source.push_str(&line);
        source.push('\n');
    }

    // A list output is bound element-wise, as `[V1_0,V1_1] = ...` assigns it.
    let mut outputs = Vec::with_capacity(graph.outputs.len());
    for &id in &graph.outputs {
        let node = &graph.nodes[id.0 as usize];
        if node.output_type == OutputType::List && node.operation.is_some() {
            outputs.extend((0..node.outputs.len()).map(|idx| format!("{}_{}", var(id), idx)));
        } else {
            outputs.push(var(id));
        }
    }

    Ok(DmlScript {
        source,
        inputs,
        outputs,
    })
}

fn render_data_node(
    id: NodeId,
    node: &NodeData,
    var: &impl Fn(NodeId) -> String,
) -> Result<String, GraphError> {
    if let Some(literal) = &node.value {
        return Ok(format!("{} = {};", var(id), literal.to_dml()));
    }
    match node.named_inputs.as_slice() {
        [input] => {
            let list = input.value.node().ok_or_else(|| GraphError::MalformedNode {
                node: id,
                reason: "alias must reference a list node".to_string(),
            })?;
            let index = input.name.trim_start_matches('_');
            Ok(format!("{} = {}_{};", var(id), var(list), index))
        }
        _ => Err(GraphError::MalformedNode {
            node: id,
            reason: "node has neither an operation, a value nor local data".to_string(),
        }),
    }
}

fn render_call(
    id: NodeId,
    operation: &str,
    node: &NodeData,
    var: &impl Fn(NodeId) -> String,
) -> String {
    let value = |input: &InputValue| match input {
        InputValue::Node(node) => var(*node),
        InputValue::Literal(literal) => literal.to_dml(),
    };
    let target = if node.output_type == OutputType::List {
        let names: Vec<String> = (0..node.outputs.len())
            .map(|idx| format!("{}_{}", var(id), idx))
            .collect();
        format!("[{}]", names.join(","))
    } else {
        var(id)
    };

    let is_operator = !operation
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if is_operator && node.named_inputs.is_empty() {
        if let [lhs, rhs] = node.unnamed_inputs.as_slice() {
            return format!("{} = {} {} {};", target, value(lhs), operation, value(rhs));
        }
    }

    let arguments: Vec<String> = node
        .unnamed_inputs
        .iter()
        .map(value)
        .chain(
            node.named_inputs
                .iter()
                .map(|input| format!("{}={}", input.name, value(&input.value))),
        )
        .collect();
    format!("{} = {}({});", target, operation, arguments.join(", "))
}

fn reachable_nodes(graph: &GraphInfo) -> Result<BTreeSet<NodeId>, GraphError> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<NodeId> = graph.outputs.clone();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        let node = graph.node(id).ok_or(GraphError::InvalidNodeReference {
            node: id,
            input: id,
        })?;
        for input in node.input_nodes() {
            if graph.node(input).is_none() {
                return Err(GraphError::InvalidNodeReference { node: id, input });
            }
            stack.push(input);
        }
    }
    Ok(seen)
}

pub struct DmlConverter {
    variable_prefix: String,
}

impl DmlConverter {
    pub fn new(variable_prefix: impl Into<String>) -> Self {
        Self {
            variable_prefix: variable_prefix.into(),
        }
    }
}

impl Default for DmlConverter {
    fn default() -> Self {
        Self::new("V")
    }
}

impl GraphConverter for DmlConverter {
    fn format(&self) -> &'static str {
        "dml"
    }

    fn convert(&self, graph: &GraphInfo) -> Result<ConvertedGraph, GraphError> {
        let script = render_script(graph, &self.variable_prefix)?;
        Ok(ConvertedGraph {
            format: "dml",
            content_type: "text/plain",
            data: script.annotated_source().into_bytes(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;

    #[test]
    fn renders_local_inputs_and_calls() {
        let context = Context::new();
        let x = context.from_matrix(2, 1, &[1.0, 2.0]).unwrap();
        let y = x.abs().unwrap();

        let script = render_script(&y.to_graph_info(), "V").unwrap();
        assert_eq!(script.source, "V1 = abs(V0);\n");
        assert_eq!(
            script.inputs,
            vec![ScriptInput {
                name: "V0".to_string(),
                node: NodeId(0),
                rows: 2,
                cols: 1
            }]
        );
        assert_eq!(script.outputs, vec!["V1".to_string()]);
        assert!(script.annotated_source().starts_with("# input V0 2x1\n# output V1\n"));
    }

    #[test]
    fn renders_lists_aliases_and_operators() {
        let context = Context::new();
        let x = context.from_matrix(1, 2, &[1.0, 2.0]).unwrap();
        let list = context
            .create_list(
                "split",
                vec![("X", (&x).into()), ("f", 0.7f64.into())],
                &[("train", OutputType::Matrix), ("test", OutputType::Matrix)],
            )
            .unwrap();
        let train = list.named_output("train").unwrap();
        let test = list.named_output("test").unwrap();
        let sum = train.try_add(&test).unwrap();

        let script = render_script(&sum.to_graph_info(), "V").unwrap();
        assert_eq!(
            script.source,
            "[V1_0,V1_1] = split(X=V0, f=0.7);\nV2 = V1_0;\nV3 = V1_1;\nV4 = V2 + V3;\n"
        );
    }

    #[test]
    fn list_outputs_name_every_element() {
        let context = Context::new();
        let x = context.from_matrix(1, 2, &[1.0, 2.0]).unwrap();
        let list = context
            .create_list(
                "split",
                vec![("X", (&x).into())],
                &[("train", OutputType::Matrix), ("test", OutputType::Matrix)],
            )
            .unwrap();

        let script = render_script(&list.to_graph_info(), "V").unwrap();
        assert_eq!(script.source, "[V1_0,V1_1] = split(X=V0);\n");
        assert_eq!(script.outputs, ["V1_0", "V1_1"]);
        assert!(
            script
                .annotated_source()
                .starts_with("# input V0 1x2\n# output V1_0\n# output V1_1\n")
        );
    }

    #[test]
    fn skips_unreachable_nodes() {
        let context = Context::new();
        let _unused = context.scalar(1i64);
        let kept = context.scalar(true);

        let script = render_script(&kept.to_graph_info(), "tmp").unwrap();
        assert_eq!(script.source, "tmp1 = TRUE;\n");
    }

    #[test]
    fn reports_dangling_references() {
        let mut node = NodeData::new(Some("abs".to_string()), OutputType::Matrix);
        node.unnamed_inputs.push(InputValue::Node(NodeId(9)));
        let graph = GraphInfo {
            nodes: vec![node],
            outputs: vec![NodeId(0)],
        };
        assert!(matches!(
            render_script(&graph, "V"),
            Err(GraphError::InvalidNodeReference {
                node: NodeId(0),
                input: NodeId(9)
            })
        ));
    }
}
