// Autogenerated from the DML signature of `pca`.

use crate::context::{Argument, Operand};
use crate::error::GraphError;
use crate::graph::OutputType;

pub fn pca(
    x: &Operand,
    k: Option<i64>,
    center: Option<bool>,
    scale: Option<bool>,
) -> Result<Operand, GraphError> {
    x.check_matrix_op("X")?;
    let mut named_inputs: Vec<(&str, Argument<'_>)> = vec![("X", x.into())];
    if let Some(k) = k {
        named_inputs.push(("K", k.into()));
    }
    if let Some(center) = center {
        named_inputs.push(("center", center.into()));
    }
    if let Some(scale) = scale {
        named_inputs.push(("scale", scale.into()));
    }
    x.context().create_list(
        "pca",
        named_inputs,
        &[
            ("Xout", OutputType::Matrix),
            ("Mout", OutputType::Matrix),
            ("Centering", OutputType::Matrix),
            ("ScaleFactor", OutputType::Matrix),
        ],
    )
}
