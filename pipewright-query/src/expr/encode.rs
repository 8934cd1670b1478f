//! The expression encoder.
//!
//! All operator shapes are decided in [`encode_call`] from the operator's
//! [`Form`]; no other code path writes an operator document.

use bson::{Bson, Document, doc};

use super::{Call, Expression, Form};
use crate::context::EncodeContext;
use crate::error::{EncodeError, EncodeResult, ensure_unique};

pub(super) fn encode(expr: &Expression, ctx: &EncodeContext) -> EncodeResult<Bson> {
    match expr {
        Expression::Value(v) => Ok(v.clone()),
        Expression::Literal(v) => Ok(Bson::Document(doc! { "$literal": v.clone() })),
        Expression::Field(path) => Ok(Bson::String(format!("${}", ctx.map_path(path)))),
        Expression::Variable(name) => Ok(Bson::String(format!("$${}", name))),
        Expression::Array(items) => encode_all(items, ctx).map(Bson::Array),
        Expression::Document(fields) => {
            ensure_unique("document expression", fields.iter().map(|(k, _)| k.as_str()))?;
            let mut out = Document::new();
            for (key, value) in fields {
                out.insert(key.clone(), encode(value, ctx)?);
            }
            Ok(Bson::Document(out))
        }
        Expression::Call(call) => encode_call(call, ctx),
        Expression::Sort(sort) => sort.encode(ctx).map(Bson::Document),
    }
}

fn encode_all(items: &[Expression], ctx: &EncodeContext) -> EncodeResult<Vec<Bson>> {
    items.iter().map(|e| encode(e, ctx)).collect()
}

fn encode_call(call: &Call, ctx: &EncodeContext) -> EncodeResult<Bson> {
    let name = call.op.name();

    let body = match call.op.form() {
        Form::Nullary => {
            if !call.args.is_empty() || !call.options.is_empty() {
                return Err(EncodeError::shape(name, "takes no arguments"));
            }
            Bson::Document(Document::new())
        }
        Form::Positional { min, max } => {
            if let Some((key, _)) = call.options.first() {
                return Err(EncodeError::shape(
                    name,
                    format!("does not accept option '{}'", key),
                ));
            }
            check_arity(name, call.args.len(), min, max)?;
            positional(&call.args, ctx)?
        }
        Form::Unary { key, options } => {
            check_arity(name, call.args.len(), 1, Some(1))?;
            check_known(name, call, options)?;
            if call.options.is_empty() {
                positional(&call.args, ctx)?
            } else {
                let mut out = Document::new();
                out.insert(key, encode(&call.args[0], ctx)?);
                for option in options {
                    if let Some(v) = call.get(option) {
                        out.insert(*option, encode(v, ctx)?);
                    }
                }
                Bson::Document(out)
            }
        }
        Form::Named(spec) => {
            if !call.args.is_empty() {
                return Err(EncodeError::shape(name, "takes named arguments only"));
            }
            check_known(name, call, spec.keys)?;

            for key in spec.required {
                if call.get(key).is_none() {
                    return Err(EncodeError::shape(
                        name,
                        format!("missing required argument '{}'", key),
                    ));
                }
            }

            if !spec.one_of.is_empty() {
                let present = spec.one_of.iter().filter(|k| call.get(k).is_some()).count();
                if present != 1 {
                    return Err(EncodeError::shape(
                        name,
                        format!("exactly one of {} must be set", spec.one_of.join(", ")),
                    ));
                }
            }

            for (a, b) in spec.conflicts {
                if call.get(a).is_some() && call.get(b).is_some() {
                    return Err(EncodeError::shape(
                        name,
                        format!("'{}' cannot be combined with '{}'", a, b),
                    ));
                }
            }

            for key in spec.non_empty {
                if matches!(call.get(key), Some(Expression::Array(items)) if items.is_empty()) {
                    return Err(EncodeError::shape(
                        name,
                        format!("'{}' requires at least one element", key),
                    ));
                }
            }

            let mut out = Document::new();
            for key in spec.keys {
                if let Some(v) = call.get(key) {
                    out.insert(*key, encode(v, ctx)?);
                }
            }
            Bson::Document(out)
        }
    };

    let mut out = Document::new();
    out.insert(name, body);
    Ok(Bson::Document(out))
}

/// A single operand is written bare, unless it encodes to an array, which the
/// server would read as an argument list; several operands form an array.
fn positional(args: &[Expression], ctx: &EncodeContext) -> EncodeResult<Bson> {
    match args {
        [single] => {
            let v = encode(single, ctx)?;
            Ok(match v {
                Bson::Array(_) => Bson::Array(vec![v]),
                other => other,
            })
        }
        _ => encode_all(args, ctx).map(Bson::Array),
    }
}

fn check_arity(
    name: &'static str,
    count: usize,
    min: usize,
    max: Option<usize>,
) -> EncodeResult<()> {
    let expected = match max {
        Some(max) if max == min => format!("{}", min),
        Some(max) => format!("{} to {}", min, max),
        None => format!("at least {}", min),
    };
    if count < min || max.is_some_and(|max| count > max) {
        return Err(EncodeError::shape(
            name,
            format!("expected {} operand(s), got {}", expected, count),
        ));
    }
    Ok(())
}

fn check_known(name: &'static str, call: &Call, known: &[&str]) -> EncodeResult<()> {
    for (key, _) in &call.options {
        if !known.contains(key) {
            return Err(EncodeError::shape(
                name,
                format!("unknown argument '{}'", key),
            ));
        }
    }
    Ok(())
}
