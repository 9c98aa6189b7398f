use std::collections::HashMap;

use log::debug;

use crate::error::GraphError;
use crate::graph::GraphInfo;

pub mod dml;

pub use dml::{DmlConverter, DmlScript, ScriptInput};

#[derive(Debug, Clone)]
pub struct ConvertedGraph {
    pub format: &'static str,
    pub content_type: &'static str,
    pub data: Vec<u8>,
}

pub trait GraphConverter {
    fn format(&self) -> &'static str;
    fn convert(&self, graph: &GraphInfo) -> Result<ConvertedGraph, GraphError>;
}

#[derive(Debug, Default)]
pub struct JsonConverter;

impl GraphConverter for JsonConverter {
    fn format(&self) -> &'static str {
        "json"
    }

    fn convert(&self, graph: &GraphInfo) -> Result<ConvertedGraph, GraphError> {
        let mut data = serde_json::to_vec_pretty(graph)?;
        data.push(b'\n');
        Ok(ConvertedGraph {
            format: "json",
            content_type: "application/json",
            data,
        })
    }
}

pub struct ConverterRegistry {
    converters: HashMap<&'static str, Box<dyn GraphConverter + Send + Sync>>,
}

impl ConverterRegistry {
    pub fn with_defaults() -> Self {
        Self::with_variable_prefix("V")
    }

    pub fn with_variable_prefix(prefix: &str) -> Self {
        let mut registry = Self {
            converters: HashMap::new(),
        };
        registry.register(Box::new(DmlConverter::new(prefix)));
        registry.register(Box::new(JsonConverter));
        registry
    }

    /// Adds `converter`, replacing any converter of the same format.
    pub fn register(&mut self, converter: Box<dyn GraphConverter + Send + Sync>) {
        let format = converter.format();
        if self.converters.insert(format, converter).is_some() {
            debug!("replaced the `{}` converter", format);
        }
    }

    pub fn available_formats(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.converters.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn convert(&self, format: &str, graph: &GraphInfo) -> Result<ConvertedGraph, GraphError> {
        let key = format.to_ascii_lowercase();
        let Some(converter) = self.converters.get(key.as_str()) else {
            return Err(GraphError::UnknownConverter {
                requested: format.to_string(),
                available: self.available_formats(),
            });
        };
        debug!(
            "converting {} nodes ({} outputs) to `{}`",
            graph.nodes.len(),
            graph.outputs.len(),
            converter.format()
        );
        converter.convert(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConvertedGraph, ConverterRegistry, DmlConverter, GraphConverter};
    use crate::builtins::pca;
    use crate::context::Context;
    use crate::error::GraphError;
    use crate::graph::{GraphInfo, Literal, NodeData, NodeId, OutputType};

    /// One line per node: id, display name and output type.
    struct NodeListing;

    impl GraphConverter for NodeListing {
        fn format(&self) -> &'static str {
            "nodes"
        }

        fn convert(&self, graph: &GraphInfo) -> Result<ConvertedGraph, GraphError> {
            let listing: String = graph
                .nodes
                .iter()
                .enumerate()
                .map(|(idx, node)| format!("{} {} {:?}\n", idx, node.display_name(), node.output_type))
                .collect();
            Ok(ConvertedGraph {
                format: "nodes",
                content_type: "text/plain",
                data: listing.into_bytes(),
            })
        }
    }

    fn scalar_graph() -> GraphInfo {
        let mut node = NodeData::new(None, OutputType::Scalar);
        node.value = Some(Literal::Int(7));
        GraphInfo {
            nodes: vec![node],
            outputs: vec![NodeId(0)],
        }
    }

    #[test]
    fn registered_converters_see_list_aliases() {
        let context = Context::new();
        let x = context.from_matrix(1, 1, &[3.0]).unwrap();
        let list = pca(&x, None, Some(true), None).unwrap();

        let mut registry = ConverterRegistry::with_defaults();
        registry.register(Box::new(NodeListing));
        assert_eq!(registry.available_formats(), vec!["dml", "json", "nodes"]);

        let converted = registry.convert("Nodes", &list.to_graph_info()).unwrap();
        assert_eq!(
            String::from_utf8(converted.data).unwrap(),
            "0 local 1x1 Matrix\n1 pca List\n2 alias Matrix\n3 alias Matrix\n\
             4 alias Matrix\n5 alias Matrix\n"
        );
    }

    #[test]
    fn registering_a_format_again_replaces_it() {
        let mut registry = ConverterRegistry::with_defaults();
        registry.register(Box::new(DmlConverter::new("tmp")));
        assert_eq!(registry.available_formats(), vec!["dml", "json"]);

        let dml = registry.convert("dml", &scalar_graph()).unwrap();
        assert_eq!(String::from_utf8(dml.data).unwrap(), "# output tmp0\ntmp0 = 7;\n");
    }

    #[test]
    fn default_formats_are_case_insensitive() {
        let registry = ConverterRegistry::with_variable_prefix("T");
        assert_eq!(registry.available_formats(), vec!["dml", "json"]);

        let dml = registry.convert("DML", &scalar_graph()).unwrap();
        assert_eq!(String::from_utf8(dml.data).unwrap(), "# output T0\nT0 = 7;\n");

        let json = registry.convert("json", &scalar_graph()).unwrap();
        let back: GraphInfo = serde_json::from_slice(&json.data).unwrap();
        assert_eq!(back, scalar_graph());
    }

    #[test]
    fn unknown_format_lists_available() {
        let err = ConverterRegistry::with_defaults()
            .convert("xml", &scalar_graph())
            .unwrap_err();
        match err {
            GraphError::UnknownConverter {
                requested,
                available,
            } => {
                assert_eq!(requested, "xml");
                assert_eq!(available, vec!["dml", "json"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
