//! Parsing of DML function headers into builtin signatures.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::GraphError;
use crate::graph::OutputType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Matrix,
    Frame,
    List,
    Integer,
    Double,
    Boolean,
    String,
}

impl ValueKind {
    fn parse(type_name: &str) -> Option<Self> {
        match type_name.to_ascii_lowercase().as_str() {
            "matrix" => Some(ValueKind::Matrix),
            "frame" => Some(ValueKind::Frame),
            "list" => Some(ValueKind::List),
            "integer" | "int" => Some(ValueKind::Integer),
            "double" => Some(ValueKind::Double),
            "boolean" | "bool" => Some(ValueKind::Boolean),
            "string" => Some(ValueKind::String),
            _ => None,
        }
    }

    /// Whether values of this kind are passed as graph operands rather than literals.
    pub fn is_operand(self) -> bool {
        matches!(self, ValueKind::Matrix | ValueKind::Frame | ValueKind::List)
    }

    pub fn output_type(self) -> OutputType {
        match self {
            ValueKind::Matrix => OutputType::Matrix,
            ValueKind::Frame => OutputType::Frame,
            ValueKind::List => OutputType::List,
            ValueKind::Integer | ValueKind::Double | ValueKind::Boolean | ValueKind::String => {
                OutputType::Scalar
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ValueKind,
    /// Default as written in DML; `None` marks a required parameter.
    pub default: Option<String>,
}

impl Param {
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnValue {
    pub name: String,
    pub kind: ValueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub params: Vec<Param>,
    pub returns: Vec<ReturnValue>,
}

impl Signature {
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|param| param.name == name)
    }

    pub fn required_params(&self) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(|param| param.is_required())
    }

    /// A single return keeps its own kind; several returns come back as a list.
    pub fn output_type(&self) -> OutputType {
        match self.returns.as_slice() {
            [single] => single.kind.output_type(),
            [] => OutputType::None,
            _ => OutputType::List,
        }
    }
}

fn invalid(reason: impl Into<String>) -> GraphError {
    GraphError::InvalidSignature {
        reason: reason.into(),
    }
}

/// Parses `[m_]name = function(<params>) return (<returns>)`.
pub fn parse_dml_signature(text: &str) -> Result<Signature, GraphError> {
    static PATTERNS: OnceLock<(Regex, Regex, Regex)> = OnceLock::new();
    let (header_re, return_re, param_re) = PATTERNS.get_or_init(|| {
        (
            Regex::new(r"(?m)^\s*(?:m_)?([A-Za-z_][A-Za-z0-9_]*)\s*=\s*function\s*\(").unwrap(),
            Regex::new(r"^\s*return\s*\(").unwrap(),
            Regex::new(
                r"(?s)^\s*([A-Za-z]+)(?:\s*\[\s*([A-Za-z]+)\s*\])?\s+([A-Za-z_][A-Za-z0-9_]*)\s*(?:=\s*(.+?))?\s*$",
            )
            .unwrap(),
        )
    });

    let text = strip_comments(text);
    let header = header_re
        .captures(&text)
        .ok_or_else(|| invalid("no `name = function(...)` header found"))?;
    let name = header[1].to_string();
    let params_start = header.get(0).map_or(0, |m| m.end());
    let (params_text, rest) = split_parenthesized(&text[params_start..])
        .ok_or_else(|| invalid(format!("unbalanced parameter list of `{}`", name)))?;

    let returns_start = return_re
        .find(rest)
        .ok_or_else(|| invalid(format!("`{}` declares no return clause", name)))?
        .end();
    let (returns_text, _) = split_parenthesized(&rest[returns_start..])
        .ok_or_else(|| invalid(format!("unbalanced return list of `{}`", name)))?;

    let mut params = Vec::new();
    for item in split_top_level(params_text) {
        let caps = param_re
            .captures(item)
            .ok_or_else(|| invalid(format!("cannot parse parameter `{}`", item.trim())))?;
        let kind = ValueKind::parse(&caps[1])
            .ok_or_else(|| invalid(format!("unknown type `{}`", &caps[1])))?;
        let param_name = caps[3].to_string();
        if params.iter().any(|p: &Param| p.name == param_name) {
            return Err(invalid(format!("parameter `{}` declared twice", param_name)));
        }
        params.push(Param {
            name: param_name,
            kind,
            default: caps.get(4).map(|m| m.as_str().trim().to_string()),
        });
    }

    let mut returns = Vec::new();
    for item in split_top_level(returns_text) {
        let caps = param_re
            .captures(item)
            .ok_or_else(|| invalid(format!("cannot parse return value `{}`", item.trim())))?;
        if caps.get(4).is_some() {
            return Err(invalid(format!("return value `{}` has a default", &caps[3])));
        }
        let kind = ValueKind::parse(&caps[1])
            .ok_or_else(|| invalid(format!("unknown type `{}`", &caps[1])))?;
        returns.push(ReturnValue {
            name: caps[3].to_string(),
            kind,
        });
    }
    if returns.is_empty() {
        return Err(invalid(format!("`{}` returns nothing", name)));
    }

    Ok(Signature {
        name,
        params,
        returns,
    })
}

/// Drops `#` comments outside of string literals.
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        let mut in_string = false;
        for c in line.chars() {
            match c {
                '"' => in_string = !in_string,
                '#' if !in_string => break,
                _ => {}
            }
            out.push(c);
        }
        out.push('\n');
    }
    out
}

/// Splits `text` (just past an opening paren) at its matching close paren.
fn split_parenthesized(text: &str) -> Option<(&str, &str)> {
    let mut depth = 1usize;
    let mut in_string = false;
    for (idx, c) in text.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some((&text[..idx], &text[idx + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Comma-separated items, ignoring commas nested in brackets or strings.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '(' | '[' if !in_string => depth += 1,
            ')' | ']' if !in_string => depth = depth.saturating_sub(1),
            ',' if !in_string && depth == 0 => {
                items.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    items.push(&text[start..]);
    items.into_iter().filter(|item| !item.trim().is_empty()).collect()
}
