use redis::Value;

/// Print a reply the way `redis-cli` does, one element per line for arrays.
pub fn format_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    let indent = "   ".repeat(depth);
    match value {
        Value::Nil => out.push_str("(nil)"),
        Value::Int(n) => out.push_str(&format!("(integer) {n}")),
        Value::Okay => out.push_str("OK"),
        Value::SimpleString(s) => out.push_str(s),
        Value::BulkString(bytes) => out.push_str(&format!("\"{}\"", String::from_utf8_lossy(bytes))),
        Value::Double(d) => out.push_str(&format!("(double) {d}")),
        Value::Boolean(b) => out.push_str(&format!("({b})")),
        Value::Array(items) | Value::Set(items) => {
            if items.is_empty() {
                out.push_str("(empty array)");
            }
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                    out.push_str(&indent);
                }
                out.push_str(&format!("{}) ", i + 1));
                write_value(out, item, depth + 1);
            }
        }
        Value::Map(pairs) => {
            for (i, (k, v)) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                    out.push_str(&indent);
                }
                out.push_str(&format!("{}# ", i + 1));
                write_value(out, k, depth + 1);
                out.push_str(" => ");
                write_value(out, v, depth + 1);
            }
        }
        other => out.push_str(&format!("{other:?}")),
    }
}
