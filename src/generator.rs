//! Renders Rust bindings for DML builtins from their signatures.

use std::fmt::Write;

use crate::error::GraphError;
use crate::graph::OutputType;
use crate::signature::{Param, Signature, ValueKind};

const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for", "if",
    "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return", "static",
    "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async", "await", "dyn",
    "gen",
];

/// Keywords that are not valid as raw identifiers either.
const UNBINDABLE: &[&str] = &["crate", "self", "super", "_"];

/// Locals of the generated function body.
const GENERATED_LOCALS: &[&str] = &["context", "named_inputs"];

/// `cW1` -> `c_w1`, `sherlockPredict` -> `sherlock_predict`.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            if prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    if RUST_KEYWORDS.contains(&out.as_str()) {
        format!("r#{}", out)
    } else {
        out
    }
}

fn rust_type(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Matrix | ValueKind::Frame | ValueKind::List => "&Operand",
        ValueKind::Integer => "i64",
        ValueKind::Double => "f64",
        ValueKind::Boolean => "bool",
        ValueKind::String => "&str",
    }
}

fn check_call(param: &Param, binding: &str) -> Option<String> {
    let check = match param.kind {
        ValueKind::Matrix => "check_matrix_op",
        ValueKind::Frame => "check_frame_op",
        _ => return None,
    };
    Some(format!("{}.{}(\"{}\")?;", binding, check, param.name))
}

fn output_type_path(kind: ValueKind) -> &'static str {
    match kind.output_type() {
        OutputType::Matrix => "OutputType::Matrix",
        OutputType::Frame => "OutputType::Frame",
        OutputType::Scalar => "OutputType::Scalar",
        OutputType::List => "OutputType::List",
        OutputType::None => "OutputType::None",
    }
}

fn binding_names(signature: &Signature) -> Result<Vec<String>, GraphError> {
    let unsupported = |reason: String| GraphError::UnsupportedBinding {
        name: signature.name.clone(),
        reason,
    };
    let function = to_snake_case(&signature.name);
    if UNBINDABLE.contains(&function.as_str()) {
        return Err(unsupported(format!(
            "function name maps to the keyword `{}`",
            function
        )));
    }

    let mut bindings: Vec<String> = Vec::with_capacity(signature.params.len());
    for param in &signature.params {
        let binding = to_snake_case(&param.name);
        if UNBINDABLE.contains(&binding.as_str()) || GENERATED_LOCALS.contains(&binding.as_str()) {
            return Err(unsupported(format!(
                "parameter `{}` maps to the reserved name `{}`",
                param.name, binding
            )));
        }
        if let Some(pos) = bindings.iter().position(|other| *other == binding) {
            return Err(unsupported(format!(
                "parameters `{}` and `{}` both map to `{}`",
                signature.params[pos].name, param.name, binding
            )));
        }
        bindings.push(binding);
    }
    Ok(bindings)
}

/// Emits the source of a binding module for `signature`.
///
/// Required operands are checked in declaration order, optional parameters
/// become `Option`s and are only forwarded when given. A binding without
/// operand parameters takes the context explicitly. Fails when two parameter
/// names map to the same Rust identifier or a name cannot be bound at all.
pub fn render_binding(signature: &Signature) -> Result<String, GraphError> {
    let bindings = binding_names(signature)?;
    let anchor = signature
        .params
        .iter()
        .zip(&bindings)
        .find(|(param, _)| param.kind.is_operand() && param.is_required())
        .map(|(_, binding)| binding.clone());
    let has_optional = signature.params.iter().any(|param| !param.is_required());

    let mut src = String::new();
    let _ = writeln!(
        src,
        "// Autogenerated from the DML signature of `{}`.\n",
        signature.name
    );
    if anchor.is_some() {
        src.push_str("use crate::context::{Argument, Operand};\n");
    } else {
        src.push_str("use crate::context::{Argument, Context, Operand};\n");
    }
    src.push_str("use crate::error::GraphError;\n");
    src.push_str("use crate::graph::OutputType;\n\n");

    let arity = signature.params.len() + usize::from(anchor.is_none());
    if arity > 7 {
        src.push_str("#[allow(clippy::too_many_arguments)]\n");
    }
    let _ = writeln!(src, "pub fn {}(", to_snake_case(&signature.name));
    if anchor.is_none() {
        src.push_str("    context: &Context,\n");
    }
    for (param, binding) in signature.params.iter().zip(&bindings) {
        let ty = rust_type(param.kind);
        if param.is_required() {
            let _ = writeln!(src, "    {}: {},", binding, ty);
        } else {
            let _ = writeln!(src, "    {}: Option<{}>,", binding, ty);
        }
    }
    src.push_str(") -> Result<Operand, GraphError> {\n");

    for (param, binding) in signature.params.iter().zip(&bindings) {
        let Some(check) = check_call(param, binding) else {
            continue;
        };
        if param.is_required() {
            let _ = writeln!(src, "    {}", check);
        } else {
            let _ = writeln!(
                src,
                "    if let Some({b}) = {b} {{\n        {c}\n    }}",
                b = binding,
                c = check
            );
        }
    }

    let required: Vec<String> = signature
        .params
        .iter()
        .zip(&bindings)
        .filter(|(param, _)| param.is_required())
        .map(|(param, binding)| format!("(\"{}\", {}.into())", param.name, binding))
        .collect();
    let mutability = if has_optional { "mut " } else { "" };
    if required.is_empty() {
        let _ = writeln!(
            src,
            "    let {}named_inputs: Vec<(&str, Argument<'_>)> = Vec::new();",
            mutability
        );
    } else if required.len() == 1 && has_optional {
        let _ = writeln!(
            src,
            "    let {}named_inputs: Vec<(&str, Argument<'_>)> = vec![{}];",
            mutability, required[0]
        );
    } else {
        let _ = writeln!(
            src,
            "    let {}named_inputs: Vec<(&str, Argument<'_>)> = vec![",
            mutability
        );
        for item in &required {
            let _ = writeln!(src, "        {},", item);
        }
        src.push_str("    ];\n");
    }
    for (param, binding) in signature.params.iter().zip(&bindings) {
        if !param.is_required() {
            let _ = writeln!(
                src,
                "    if let Some({b}) = {b} {{\n        named_inputs.push((\"{n}\", {b}.into()));\n    }}",
                b = binding,
                n = param.name
            );
        }
    }

    let context = match &anchor {
        Some(binding) => format!("{}.context()", binding),
        None => "context".to_string(),
    };
    if signature.returns.len() > 1 {
        let _ = writeln!(src, "    {}.create_list(", context);
        let _ = writeln!(src, "        \"{}\",", signature.name);
        src.push_str("        named_inputs,\n        &[\n");
        for ret in &signature.returns {
            let _ = writeln!(
                src,
                "            (\"{}\", {}),",
                ret.name,
                output_type_path(ret.kind)
            );
        }
        src.push_str("        ],\n    )\n");
    } else {
        let kind = signature
            .returns
            .first()
            .map_or("OutputType::None", |ret| output_type_path(ret.kind));
        let _ = writeln!(src, "    {}", context);
        let _ = writeln!(
            src,
            "        .create_node(\"{}\", named_inputs, {})",
            signature.name, kind
        );
    }
    src.push_str("}\n");
    Ok(src)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins;
    use crate::signature::parse_dml_signature;
    use rstest::rstest;

    #[rstest]
    #[case("X", "x")]
    #[case("cW1", "c_w1")]
    #[case("fb3", "fb3")]
    #[case("sherlockPredict", "sherlock_predict")]
    #[case("ScaleFactor", "scale_factor")]
    #[case("type", "r#type")]
    #[case("Self", "self")]
    fn converts_names_to_snake_case(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(to_snake_case(name), expected);
    }

    #[test]
    fn regenerates_the_sherlock_predict_binding() {
        let signature = builtins::signature("sherlockPredict").unwrap();
        let src = render_binding(signature).unwrap();
        let checked_in = include_str!("builtins/sherlock_predict.rs");

        assert!(src.contains("#[allow(clippy::too_many_arguments)]\npub fn sherlock_predict(\n"));
        assert_eq!(src.matches("check_matrix_op").count(), 31);
        assert!(src.contains("    c_w1.check_matrix_op(\"cW1\")?;\n"));
        assert!(src.contains("        (\"fb3\", fb3.into()),\n    ];\n"));
        assert!(src.contains(
            "    x.context()\n        .create_node(\"sherlockPredict\", named_inputs, OutputType::Matrix)\n"
        ));
        for line in src.lines().filter(|line| line.contains("check_matrix_op")) {
            assert!(checked_in.contains(line), "missing `{}`", line);
        }
    }

    #[test]
    fn regenerates_the_pca_binding() {
        let signature = builtins::signature("pca").unwrap();
        let src = render_binding(signature).unwrap();
        let checked_in = include_str!("builtins/pca.rs");

        assert!(!src.contains("too_many_arguments"));
        assert!(src.contains("    k: Option<i64>,\n"));
        assert!(src.contains(
            "    let mut named_inputs: Vec<(&str, Argument<'_>)> = vec![(\"X\", x.into())];\n"
        ));
        assert!(src.contains("            (\"ScaleFactor\", OutputType::Matrix),\n"));
        for line in src.lines() {
            assert!(checked_in.contains(line), "missing `{}`", line);
        }
    }

    #[test]
    fn scalar_only_builtins_take_the_context() {
        let signature =
            parse_dml_signature("m_seq = function(Integer from, Integer to) return (Matrix[Double] S)")
                .unwrap();
        let src = render_binding(&signature).unwrap();
        assert!(src.contains("use crate::context::{Argument, Context, Operand};"));
        assert!(src.contains("    context: &Context,\n    from: i64,\n    to: i64,\n"));
        assert!(src.contains("    context\n        .create_node(\"seq\", named_inputs, OutputType::Matrix)"));
        assert!(!src.contains("check_"));
    }

    #[test]
    fn optional_operands_are_checked_when_given() {
        let signature = parse_dml_signature(
            "m_f = function(Frame[Unknown] F, Matrix[Double] M = matrix(0, rows=1, cols=1)) return (Frame[Unknown] R)",
        )
        .unwrap();
        let src = render_binding(&signature).unwrap();
        assert!(src.contains("    f.check_frame_op(\"F\")?;\n"));
        assert!(src.contains("    if let Some(m) = m {\n        m.check_matrix_op(\"M\")?;\n    }\n"));
        assert!(src.contains("        named_inputs.push((\"M\", m.into()));\n"));
        assert!(src.contains("OutputType::Frame"));
    }

    #[rstest]
    #[case("m_f = function(Matrix[Double] X, Matrix[Double] x) return (Matrix[Double] R)")]
    #[case("m_f = function(Matrix[Double] self) return (Matrix[Double] R)")]
    #[case("m_f = function(Matrix[Double] Self) return (Matrix[Double] R)")]
    #[case("m_f = function(Matrix[Double] X, Integer context) return (Matrix[Double] R)")]
    #[case("m_f = function(Matrix[Double] namedInputs) return (Matrix[Double] R)")]
    #[case("m_crate = function(Matrix[Double] X) return (Matrix[Double] R)")]
    fn rejects_names_without_a_distinct_binding(#[case] header: &str) {
        let signature = parse_dml_signature(header).unwrap();
        assert!(matches!(
            render_binding(&signature),
            Err(GraphError::UnsupportedBinding { .. })
        ));
    }

    #[test]
    fn keywords_become_raw_identifiers() {
        let signature =
            parse_dml_signature("m_f = function(Matrix[Double] X, Integer type) return (Matrix[Double] R)")
                .unwrap();
        let src = render_binding(&signature).unwrap();
        assert!(src.contains("    r#type: i64,\n"));
        assert!(src.contains("(\"type\", r#type.into())"));
    }
}
