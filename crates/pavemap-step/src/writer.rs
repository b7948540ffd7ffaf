//! STEP File Writer
//!
//! Emits one instance per line in instance-number order. The HEADER section
//! is written back exactly as it was read.

use crate::encoding::encode_string;
use crate::{StepFile, StepValue};

pub fn write_step(file: &StepFile) -> String {
    let mut out = String::with_capacity(file.len() * 96 + 256);

    out.push_str("ISO-10303-21;\nHEADER;\n");
    for record in &file.header {
        out.push_str(&record.name);
        write_args(&mut out, &record.args);
        out.push_str(";\n");
    }
    out.push_str("ENDSEC;\nDATA;\n");

    for entity in file.iter() {
        out.push_str(&entity.id.to_string());
        out.push('=');
        if entity.is_complex() {
            out.push('(');
            for part in &entity.args {
                if let StepValue::Typed(name, inner) = part {
                    out.push_str(name);
                    match inner.as_ref() {
                        StepValue::List(items) => write_args(&mut out, items),
                        other => write_args(&mut out, std::slice::from_ref(other)),
                    }
                }
            }
            out.push(')');
        } else {
            out.push_str(&entity.type_name);
            write_args(&mut out, &entity.args);
        }
        out.push_str(";\n");
    }

    out.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
    out
}

fn write_args(out: &mut String, args: &[StepValue]) {
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_value(out, arg);
    }
    out.push(')');
}

fn write_value(out: &mut String, value: &StepValue) {
    match value {
        StepValue::Ref(id) => out.push_str(&id.to_string()),
        StepValue::Str(s) => {
            out.push('\'');
            out.push_str(&encode_string(s));
            out.push('\'');
        }
        StepValue::Enum(name) => {
            out.push('.');
            out.push_str(name);
            out.push('.');
        }
        StepValue::Bool(true) => out.push_str(".T."),
        StepValue::Bool(false) => out.push_str(".F."),
        StepValue::Int(n) => out.push_str(&n.to_string()),
        StepValue::Real(r) => out.push_str(&format_real(*r)),
        StepValue::Binary(hex) => {
            out.push('"');
            out.push_str(hex);
            out.push('"');
        }
        StepValue::Null => out.push('$'),
        StepValue::Omitted => out.push('*'),
        StepValue::List(items) => write_args(out, items),
        StepValue::Typed(name, inner) => {
            out.push_str(name);
            out.push('(');
            write_value(out, inner);
            out.push(')');
        }
    }
}

/// STEP reals need a decimal point in the mantissa and an upper-case `E`.
fn format_real(r: f64) -> String {
    if !r.is_finite() {
        return "$".to_string();
    }
    let s = format!("{r:?}");
    match s.split_once('e') {
        Some((mantissa, exp)) if mantissa.contains('.') => format!("{mantissa}E{exp}"),
        Some((mantissa, exp)) => format!("{mantissa}.E{exp}"),
        None => s,
    }
}
