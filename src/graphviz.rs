use std::fmt::Write;

use crate::graph::{GraphInfo, InputValue, NodeData, OutputType};

pub fn graph_to_dot(graph: &GraphInfo) -> String {
    let mut dot = String::from("digraph sysds {\n");
    dot.push_str("  rankdir=LR;\n");
    dot.push_str("  node [fontname=\"Helvetica\"];\n");
    dot.push_str("  edge [fontname=\"Helvetica\"];\n\n");

    for (idx, node) in graph.nodes.iter().enumerate() {
        let (shape, fill) = node_style(node);
        let mut label_lines = vec![format!("{} (#{})", node.display_name(), idx)];
        label_lines.push(format!("{:?}", node.output_type));
        if let Some(local) = &node.local_data {
            label_lines.push(format!("{}x{}", local.rows, local.cols));
        }
        for output in &node.outputs {
            label_lines.push(format!("-> {}", output.name));
        }
        let label = escape_label(&label_lines.join("\n"));
        let _ = writeln!(
            dot,
            "  node_{} [shape={},style=filled,fillcolor=\"{}\",label=\"{}\"];",
            idx, shape, fill, label
        );
    }

    dot.push('\n');

    for (idx, node) in graph.nodes.iter().enumerate() {
        for (input_idx, input) in node.unnamed_inputs.iter().enumerate() {
            if let InputValue::Node(source) = input {
                let _ = writeln!(
                    dot,
                    "  node_{} -> node_{} [label=\"in{}\"];",
                    source, idx, input_idx
                );
            }
        }
        for input in &node.named_inputs {
            if let InputValue::Node(source) = input.value {
                let _ = writeln!(
                    dot,
                    "  node_{} -> node_{} [label=\"{}\"];",
                    source,
                    idx,
                    escape_label(&input.name)
                );
            }
        }
    }

    for (position, output) in graph.outputs.iter().enumerate() {
        let _ = writeln!(
            dot,
            "  output_{} [shape=doublecircle,label=\"out{}\"];\n  node_{} -> output_{};",
            position, position, output, position
        );
    }

    dot.push_str("}\n");
    dot
}

fn node_style(node: &NodeData) -> (&'static str, &'static str) {
    if node.local_data.is_some() {
        ("oval", "#d0e6ff")
    } else if node.value.is_some() {
        ("diamond", "#f0f0f0")
    } else if node.operation.is_none() {
        ("point", "#ffffff")
    } else if node.output_type == OutputType::List {
        ("box3d", "#fff2cc")
    } else {
        ("box", "#d6f5d6")
    }
}

fn escape_label(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::graph_to_dot;
    use crate::builtins::pca;
    use crate::context::Context;

    #[test]
    fn exports_graphviz_with_nodes_and_edges() {
        let context = Context::new();
        let x = context.from_matrix(1, 3, &[1.0, 2.0, 3.0]).unwrap();
        let list = pca(&x, Some(1), None, None).unwrap();
        let scores = list.named_output("Xout").unwrap();

        let dot = graph_to_dot(&scores.to_graph_info());

        assert!(dot.starts_with("digraph sysds {\n"));
        assert!(dot.contains("node_0 [shape=oval"));
        assert!(dot.contains("1x3"));
        assert!(dot.contains("node_1 [shape=box3d"));
        assert!(dot.contains("-> ScaleFactor"));
        assert!(dot.contains("node_0 -> node_1 [label=\"X\"]"));
        assert!(dot.contains("node_1 -> node_2 [label=\"_0\"]"));
        assert!(dot.contains("node_2 -> output_0;"));
    }
}
