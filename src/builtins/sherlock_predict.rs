// Autogenerated from the DML signature of `sherlockPredict`.

use crate::context::{Argument, Operand};
use crate::error::GraphError;
use crate::graph::OutputType;

#[allow(clippy::too_many_arguments)]
pub fn sherlock_predict(
    x: &Operand,
    c_w1: &Operand,
    cb1: &Operand,
    c_w2: &Operand,
    cb2: &Operand,
    c_w3: &Operand,
    cb3: &Operand,
    w_w1: &Operand,
    wb1: &Operand,
    w_w2: &Operand,
    wb2: &Operand,
    w_w3: &Operand,
    wb3: &Operand,
    p_w1: &Operand,
    pb1: &Operand,
    p_w2: &Operand,
    pb2: &Operand,
    p_w3: &Operand,
    pb3: &Operand,
    s_w1: &Operand,
    sb1: &Operand,
    s_w2: &Operand,
    sb2: &Operand,
    s_w3: &Operand,
    sb3: &Operand,
    f_w1: &Operand,
    fb1: &Operand,
    f_w2: &Operand,
    fb2: &Operand,
    f_w3: &Operand,
    fb3: &Operand,
) -> Result<Operand, GraphError> {
    x.check_matrix_op("X")?;
    c_w1.check_matrix_op("cW1")?;
    cb1.check_matrix_op("cb1")?;
    c_w2.check_matrix_op("cW2")?;
    cb2.check_matrix_op("cb2")?;
    c_w3.check_matrix_op("cW3")?;
    cb3.check_matrix_op("cb3")?;
    w_w1.check_matrix_op("wW1")?;
    wb1.check_matrix_op("wb1")?;
    w_w2.check_matrix_op("wW2")?;
    wb2.check_matrix_op("wb2")?;
    w_w3.check_matrix_op("wW3")?;
    wb3.check_matrix_op("wb3")?;
    p_w1.check_matrix_op("pW1")?;
    pb1.check_matrix_op("pb1")?;
    p_w2.check_matrix_op("pW2")?;
    pb2.check_matrix_op("pb2")?;
    p_w3.check_matrix_op("pW3")?;
    pb3.check_matrix_op("pb3")?;
    s_w1.check_matrix_op("sW1")?;
    sb1.check_matrix_op("sb1")?;
    s_w2.check_matrix_op("sW2")?;
    sb2.check_matrix_op("sb2")?;
    s_w3.check_matrix_op("sW3")?;
    sb3.check_matrix_op("sb3")?;
    f_w1.check_matrix_op("fW1")?;
    fb1.check_matrix_op("fb1")?;
    f_w2.check_matrix_op("fW2")?;
    fb2.check_matrix_op("fb2")?;
    f_w3.check_matrix_op("fW3")?;
    fb3.check_matrix_op("fb3")?;
    let named_inputs: Vec<(&str, Argument<'_>)> = vec![
        ("X", x.into()),
        ("cW1", c_w1.into()),
        ("cb1", cb1.into()),
        ("cW2", c_w2.into()),
        ("cb2", cb2.into()),
        ("cW3", c_w3.into()),
        ("cb3", cb3.into()),
        ("wW1", w_w1.into()),
        ("wb1", wb1.into()),
        ("wW2", w_w2.into()),
        ("wb2", wb2.into()),
        ("wW3", w_w3.into()),
        ("wb3", wb3.into()),
        ("pW1", p_w1.into()),
        ("pb1", pb1.into()),
        ("pW2", p_w2.into()),
        ("pb2", pb2.into()),
        ("pW3", p_w3.into()),
        ("pb3", pb3.into()),
        ("sW1", s_w1.into()),
        ("sb1", sb1.into()),
        ("sW2", s_w2.into()),
        ("sb2", sb2.into()),
        ("sW3", s_w3.into()),
        ("sb3", sb3.into()),
        ("fW1", f_w1.into()),
        ("fb1", fb1.into()),
        ("fW2", f_w2.into()),
        ("fb2", fb2.into()),
        ("fW3", f_w3.into()),
        ("fb3", fb3.into()),
    ];
    x.context()
        .create_node("sherlockPredict", named_inputs, OutputType::Matrix)
}
