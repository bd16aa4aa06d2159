//! ASCII tree rendering for parsed documents.

use dadl_parser::Value;

/// Render a tree with box-drawing branches. Map keys are sorted so output is
/// stable; list items are labeled by index. Multi-line strings hang under
/// their key.
pub fn render_tree(root: &Value) -> String {
    let mut out = String::from(".\n");
    match root {
        Value::Map(map) => {
            let entries = sorted_entries(map);
            render_children(&entries, "", &mut out);
        }
        Value::List(items) => {
            let entries = indexed_entries(items);
            render_children(&entries, "", &mut out);
        }
        other => {
            out.push_str(&format!("└── {}\n", scalar_text(other)));
        }
    }
    out
}

fn sorted_entries<'a>(
    map: &'a indexmap::IndexMap<String, Value>,
) -> Vec<(String, &'a Value)> {
    let mut entries: Vec<(String, &Value)> =
        map.iter().map(|(k, v)| (k.clone(), v)).collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

fn indexed_entries(items: &[Value]) -> Vec<(String, &Value)> {
    items
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("[{}]", i), v))
        .collect()
}

fn render_children(entries: &[(String, &Value)], prefix: &str, out: &mut String) {
    for (idx, (label, value)) in entries.iter().enumerate() {
        let last = idx + 1 == entries.len();
        let branch = if last { "└── " } else { "├── " };
        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });

        match value {
            Value::Map(map) => {
                out.push_str(&format!("{}{}{}\n", prefix, branch, label));
                render_children(&sorted_entries(map), &child_prefix, out);
            }
            Value::List(items) => {
                out.push_str(&format!("{}{}{}\n", prefix, branch, label));
                render_children(&indexed_entries(items), &child_prefix, out);
            }
            Value::String(text) if text.contains('\n') => {
                out.push_str(&format!("{}{}{}:\n", prefix, branch, label));
                for line in text.lines() {
                    out.push_str(&format!("{}{}\n", child_prefix, line));
                }
            }
            scalar => {
                out.push_str(&format!(
                    "{}{}{}: {}\n",
                    prefix,
                    branch,
                    label,
                    scalar_text(scalar)
                ));
            }
        }
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => "~".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::BigInt(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Map(_) | Value::List(_) => unreachable!("containers handled by caller"),
    }
}
