use serde::Serialize;
use serde_json::Value;

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

/// Render a serializable response in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => Ok(render_table(serde_json::to_value(value)?)),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response to stdout in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    println!("{}", render(value, format)?);
    Ok(())
}

fn render_table(value: Value) -> String {
    let prefs = ui::prefs();
    let options = table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    };

    match value {
        Value::Array(items) if items.is_empty() => String::from("(no rows)"),
        Value::Array(items) if items.iter().all(Value::is_object) => {
            let mut headers = Vec::<String>::new();
            for key in items.iter().filter_map(Value::as_object).flat_map(|map| map.keys()) {
                if !headers.contains(key) {
                    headers.push(key.clone());
                }
            }
            let rows = items
                .iter()
                .filter_map(Value::as_object)
                .map(|map| {
                    headers
                        .iter()
                        .map(|header| map.get(header).map_or_else(|| String::from("-"), cell))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>();
            let header_refs = headers.iter().map(String::as_str).collect::<Vec<_>>();
            table::render(&header_refs, &rows, options)
        }
        Value::Array(items) => {
            let rows = items.iter().map(|item| vec![cell(item)]).collect::<Vec<_>>();
            table::render(&["value"], &rows, options)
        }
        Value::Object(map) => flatten_object(&map, options),
        scalar => table::render(&["value"], &[vec![cell(&scalar)]], options),
    }
}

/// Key/value table; nested objects become dotted keys.
fn flatten_object(map: &serde_json::Map<String, Value>, options: table::TableOptions) -> String {
    fn walk(prefix: &str, value: &Value, rows: &mut Vec<Vec<String>>) {
        match value {
            Value::Object(map) => {
                for (key, value) in map {
                    let key = if prefix.is_empty() {
                        key.clone()
                    } else {
                        format!("{prefix}.{key}")
                    };
                    walk(&key, value, rows);
                }
            }
            other => rows.push(vec![prefix.to_string(), cell(other)]),
        }
    }

    let mut rows = Vec::new();
    for (key, value) in map {
        walk(key, value, &mut rows);
    }
    table::render(&["key", "value"], &rows, options)
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => other.to_string(),
    }
}
