use std::fs;
use std::path::Path;

use crate::error::GraphError;
use crate::graph::GraphInfo;
use crate::signature::{Signature, parse_dml_signature};

/// Load a graph snapshot from a JSON file.
pub fn load_graph_from_path(path: impl AsRef<Path>) -> Result<GraphInfo, GraphError> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref).map_err(|err| GraphError::io(path_ref, err))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Load the first function signature declared in a DML script.
pub fn load_signature_from_path(path: impl AsRef<Path>) -> Result<Signature, GraphError> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref).map_err(|err| GraphError::io(path_ref, err))?;
    parse_dml_signature(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use std::io::Write;

    #[test]
    fn loads_a_saved_graph() {
        let context = Context::new();
        let x = context.from_matrix(1, 2, &[0.5, -1.0]).unwrap();
        let graph = x.abs().unwrap().to_graph_info();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&serde_json::to_vec(&graph).unwrap()).unwrap();

        let loaded = load_graph_from_path(file.path()).unwrap();
        assert_eq!(loaded, graph);
        assert_eq!(
            loaded.nodes[0].local_data.as_ref().unwrap().values(),
            vec![0.5, -1.0]
        );
    }

    #[test]
    fn reports_missing_files_and_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_graph_from_path(&missing),
            Err(GraphError::Io { ref path, .. }) if path == &missing
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            load_graph_from_path(&broken),
            Err(GraphError::Parse { .. })
        ));
    }

    #[test]
    fn loads_a_dml_signature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scale.dml");
        std::fs::write(
            &path,
            "# scales X\nm_scale = function(Matrix[Double] X, Double f = 1.0)\n  return (Matrix[Double] Y)\n{\n  Y = X * f\n}\n",
        )
        .unwrap();

        let signature = load_signature_from_path(&path).unwrap();
        assert_eq!(signature.name, "scale");
        assert_eq!(signature.params.len(), 2);
    }
}
