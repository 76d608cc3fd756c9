//! PHP literal rendering in the shape of `var_export()`

use serde_json::Value;

const INDENT: &str = "  ";

/// Render a JSON value as a PHP literal
///
/// Objects and lists become `array ( ... )` blocks with one entry per line,
/// nested blocks start on their own line after `=> `.
pub fn var_export(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

/// Render a string as a single quoted PHP string
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Render an array key, integer-like keys stay unquoted
pub fn array_key(key: &str) -> String {
    match key.parse::<i64>() {
        Ok(number) if number.to_string() == key => key.to_string(),
        _ => quote(key),
    }
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    let entries: Vec<(String, &Value)> = match value {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| (index.to_string(), item))
            .collect(),
        Value::Object(map) => map.iter().map(|(key, item)| (array_key(key), item)).collect(),
        scalar => {
            out.push_str(&scalar_literal(scalar));
            return;
        }
    };

    let inner = INDENT.repeat(depth + 1);
    out.push_str("array (\n");
    for (key, item) in entries {
        out.push_str(&inner);
        out.push_str(&key);
        out.push_str(" => ");
        if item.is_array() || item.is_object() {
            out.push('\n');
            out.push_str(&inner);
        }
        write_value(out, item, depth + 1);
        out.push_str(",\n");
    }
    out.push_str(&INDENT.repeat(depth));
    out.push(')');
}

fn scalar_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => match (number.as_i64(), number.as_u64(), number.as_f64()) {
            (Some(int), _, _) => int.to_string(),
            (_, Some(uint), _) => uint.to_string(),
            (_, _, Some(float)) if float.fract() == 0.0 && float.is_finite() => format!("{:.1}", float),
            _ => number.to_string(),
        },
        Value::String(text) => quote(text),
        Value::Array(_) | Value::Object(_) => var_export(value),
    }
}
