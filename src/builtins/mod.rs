//! Bindings for DML builtin functions.
//!
//! Each binding checks its operands in declaration order, assembles the named
//! inputs and records one deferred node in the context of its first operand.
//! The binding sources are produced by [`crate::generator::render_binding`]
//! from the DML headers below.

use std::sync::OnceLock;

use crate::signature::{Signature, parse_dml_signature};

mod pca;
mod sherlock_predict;

pub use pca::pca;
pub use sherlock_predict::sherlock_predict;

pub(crate) const SHERLOCK_PREDICT_HEADER: &str = "
m_sherlockPredict = function(Matrix[Double] X,
    Matrix[Double] cW1, Matrix[Double] cb1, Matrix[Double] cW2, Matrix[Double] cb2,
    Matrix[Double] cW3, Matrix[Double] cb3,
    Matrix[Double] wW1, Matrix[Double] wb1, Matrix[Double] wW2, Matrix[Double] wb2,
    Matrix[Double] wW3, Matrix[Double] wb3,
    Matrix[Double] pW1, Matrix[Double] pb1, Matrix[Double] pW2, Matrix[Double] pb2,
    Matrix[Double] pW3, Matrix[Double] pb3,
    Matrix[Double] sW1, Matrix[Double] sb1, Matrix[Double] sW2, Matrix[Double] sb2,
    Matrix[Double] sW3, Matrix[Double] sb3,
    Matrix[Double] fW1, Matrix[Double] fb1, Matrix[Double] fW2, Matrix[Double] fb2,
    Matrix[Double] fW3, Matrix[Double] fb3)
  return (Matrix[Double] probs)
";

pub(crate) const PCA_HEADER: &str = "
m_pca = function(Matrix[Double] X, Integer K=2, Boolean center=TRUE, Boolean scale=TRUE)
  return (Matrix[Double] Xout, Matrix[Double] Mout, Matrix[Double] Centering,
    Matrix[Double] ScaleFactor)
";

const HEADERS: [&str; 2] = [SHERLOCK_PREDICT_HEADER, PCA_HEADER];

/// Signatures of every builtin with a binding in this module.
pub fn signatures() -> &'static [Signature] {
    static SIGNATURES: OnceLock<Vec<Signature>> = OnceLock::new();
    SIGNATURES.get_or_init(|| {
        HEADERS
            .iter()
            .map(|header| parse_dml_signature(header).expect("builtin DML header must parse"))
            .collect()
    })
}

pub fn signature(operation: &str) -> Option<&'static Signature> {
    signatures().iter().find(|signature| signature.name == operation)
}
