use std::fmt;

use serde::{Deserialize, Serialize};
use serde_with::{base64::Base64, serde_as};

/// Index of a node inside the arena of its context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    Matrix,
    Frame,
    Scalar,
    List,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Double(f64),
    Bool(bool),
    Str(String),
}

impl Literal {
    /// Renders the literal as a DML expression.
    pub fn to_dml(&self) -> String {
        match self {
            Literal::Int(value) => value.to_string(),
            Literal::Double(value) => {
                if value.is_finite() && value.fract() == 0.0 {
                    format!("{:.1}", value)
                } else {
                    value.to_string()
                }
            }
            Literal::Bool(true) => "TRUE".to_string(),
            Literal::Bool(false) => "FALSE".to_string(),
            Literal::Str(value) => format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"")),
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Double(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Str(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Str(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputValue {
    Node(NodeId),
    Literal(Literal),
}

impl InputValue {
    pub fn node(&self) -> Option<NodeId> {
        match self {
            InputValue::Node(id) => Some(*id),
            InputValue::Literal(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedInput {
    pub name: String,
    pub value: InputValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListOutput {
    pub name: String,
    pub output_type: OutputType,
    pub node: NodeId,
}

/// Matrix data that lives on the client and is handed to the engine as a script input.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalMatrix {
    pub rows: u32,
    pub cols: u32,
    #[serde_as(as = "Base64")]
    pub data: Vec<u8>,
}

impl LocalMatrix {
    pub fn from_values(rows: u32, cols: u32, values: &[f64]) -> Self {
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self { rows, cols, data }
    }

    pub fn element_count(&self) -> Option<usize> {
        (self.rows as usize).checked_mul(self.cols as usize)
    }

    pub fn expected_byte_length(&self) -> Option<usize> {
        self.element_count()?.checked_mul(std::mem::size_of::<f64>())
    }

    pub fn values(&self) -> Vec<f64> {
        self.data
            .chunks_exact(8)
            .map(|chunk| {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(chunk);
                f64::from_le_bytes(bytes)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// `None` for data nodes, scalar literals and list output aliases.
    #[serde(default)]
    pub operation: Option<String>,
    pub output_type: OutputType,
    #[serde(default)]
    pub unnamed_inputs: Vec<InputValue>,
    #[serde(default)]
    pub named_inputs: Vec<NamedInput>,
    #[serde(default)]
    pub outputs: Vec<ListOutput>,
    #[serde(default)]
    pub value: Option<Literal>,
    #[serde(default)]
    pub local_data: Option<LocalMatrix>,
}

impl NodeData {
    pub fn new(operation: Option<String>, output_type: OutputType) -> Self {
        Self {
            operation,
            output_type,
            unnamed_inputs: Vec::new(),
            named_inputs: Vec::new(),
            outputs: Vec::new(),
            value: None,
            local_data: None,
        }
    }

    pub fn named_input(&self, name: &str) -> Option<&InputValue> {
        self.named_inputs
            .iter()
            .find(|input| input.name == name)
            .map(|input| &input.value)
    }

    /// Node ids this node consumes, unnamed inputs first.
    pub fn input_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.unnamed_inputs
            .iter()
            .chain(self.named_inputs.iter().map(|input| &input.value))
            .filter_map(InputValue::node)
    }

    pub fn display_name(&self) -> String {
        match (&self.operation, &self.value, &self.local_data) {
            (Some(op), _, _) => op.clone(),
            (None, Some(literal), _) => literal.to_dml(),
            (None, None, Some(local)) => format!("local {}x{}", local.rows, local.cols),
            (None, None, None) => "alias".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphInfo {
    pub nodes: Vec<NodeData>,
    #[serde(default)]
    pub outputs: Vec<NodeId>,
}

impl GraphInfo {
    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_renders_as_dml() {
        assert_eq!(Literal::Int(3).to_dml(), "3");
        assert_eq!(Literal::Double(2.0).to_dml(), "2.0");
        assert_eq!(Literal::Double(0.25).to_dml(), "0.25");
        assert_eq!(Literal::Bool(false).to_dml(), "FALSE");
        assert_eq!(Literal::from("a\"b").to_dml(), "\"a\\\"b\"");
    }

    #[test]
    fn local_matrix_keeps_values() {
        let local = LocalMatrix::from_values(2, 2, &[1.0, -2.5, 3.0, 4.0]);
        assert_eq!(local.expected_byte_length(), Some(32));
        assert_eq!(local.data.len(), 32);
        assert_eq!(local.values(), vec![1.0, -2.5, 3.0, 4.0]);
    }

    #[test]
    fn graph_info_serializes_node_ids_as_numbers() {
        let mut node = NodeData::new(Some("abs".to_string()), OutputType::Matrix);
        node.unnamed_inputs.push(InputValue::Node(NodeId(0)));
        let graph = GraphInfo {
            nodes: vec![NodeData::new(None, OutputType::Matrix), node],
            outputs: vec![NodeId(1)],
        };
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["outputs"], serde_json::json!([1]));
        assert_eq!(json["nodes"][1]["unnamed_inputs"][0]["node"], 0);

        let back: GraphInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, graph);
    }
}
