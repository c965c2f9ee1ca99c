//! Scalar typing: YAML 1.2 core schema and core-tag coercion

use serde_yaml::{Number, Value};

fn is_null(s: &str) -> bool {
    matches!(s, "" | "~" | "null" | "Null" | "NULL")
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

fn parse_int(s: &str) -> Option<Value> {
    if let Some(oct) = s.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).ok().map(Value::from);
    }
    if let Some(hex) = s.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(Value::from);
    }
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::from(i));
    }
    s.parse::<u64>().ok().map(Value::from)
}

fn parse_float(s: &str) -> Option<f64> {
    match s {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }
    let body = s.strip_prefix(['-', '+']).unwrap_or(s);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (mantissa, None),
    };
    let digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    let valid_mantissa = match frac_part {
        Some(f) => digits(int_part) && digits(f) && !(int_part.is_empty() && f.is_empty()),
        None => !int_part.is_empty() && digits(int_part),
    };
    let valid_exponent = match exponent {
        Some(e) => {
            let e = e.strip_prefix(['-', '+']).unwrap_or(e);
            !e.is_empty() && digits(e)
        }
        None => true,
    };
    if valid_mantissa && valid_exponent {
        s.parse::<f64>().ok()
    } else {
        None
    }
}

/// Type a plain scalar per the YAML 1.2 core schema.
pub fn plain_scalar_value(s: &str) -> Value {
    if is_null(s) {
        return Value::Null;
    }
    if let Some(b) = parse_bool(s) {
        return Value::Bool(b);
    }
    if let Some(i) = parse_int(s) {
        return i;
    }
    if let Some(f) = parse_float(s) {
        return Value::Number(Number::from(f));
    }
    Value::String(s.to_string())
}

/// Text form of a scalar value for re-typing under a core tag
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        _ => None,
    }
}

/// Coerce a value under a core tag (`str`, `int`, `float`, `bool`, `null`,
/// `seq`, `map`). Returns `None` for suffixes that are not core tags.
pub fn coerce_core_tag(suffix: &str, value: Value) -> Option<Result<Value, String>> {
    let text = scalar_text(&value);
    let mismatch = |what: &str| Err(format!("value cannot be read as !!{}", what));
    let result = match suffix {
        "str" => match text {
            Some(t) => Ok(Value::String(t)),
            None => mismatch("str"),
        },
        "int" => match text.as_deref().and_then(parse_int) {
            Some(v) => Ok(v),
            None => mismatch("int"),
        },
        "float" => match text.as_deref() {
            Some(t) => match parse_float(t).or_else(|| t.parse::<f64>().ok()) {
                Some(f) => Ok(Value::Number(Number::from(f))),
                None => mismatch("float"),
            },
            None => mismatch("float"),
        },
        "bool" => match text.as_deref().and_then(parse_bool) {
            Some(b) => Ok(Value::Bool(b)),
            None => match value {
                Value::Bool(b) => Ok(Value::Bool(b)),
                _ => mismatch("bool"),
            },
        },
        "null" => match text.as_deref() {
            Some(t) if is_null(t) => Ok(Value::Null),
            _ => mismatch("null"),
        },
        "seq" => match value {
            Value::Sequence(_) => Ok(value),
            _ => mismatch("seq"),
        },
        "map" => match value {
            Value::Mapping(_) => Ok(value),
            _ => mismatch("map"),
        },
        _ => return None,
    };
    Some(result)
}
