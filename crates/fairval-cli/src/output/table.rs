use serde_json::Value;
use tabled::{builder::Builder, Table};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result_table(result, map);
            } else {
                print_flat_object(value);
            }
        }
        Value::Array(arr) => {
            print_array_table(arr);
        }
        _ => {
            println!("{}", value);
        }
    }
}

fn print_result_table(result: &Value, envelope: &serde_json::Map<String, Value>) {
    if let Some(grid) = as_sensitivity_grid(result) {
        print_grid_table(grid);
    } else if let Value::Object(res_map) = result {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in res_map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    } else {
        print_flat_object(&Value::Object(envelope.clone()));
    }

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

struct GridView<'a> {
    rate_axis: &'a [Value],
    terminal_axis: &'a [Value],
    cells: &'a [Value],
}

fn as_sensitivity_grid(result: &Value) -> Option<GridView<'_>> {
    let map = result.as_object()?;
    Some(GridView {
        rate_axis: map.get("rate_axis")?.as_array()?,
        terminal_axis: map.get("terminal_axis")?.as_array()?,
        cells: map.get("cells")?.as_array()?,
    })
}

/// Render the sensitivity grid as a matrix: discount rates down the
/// rows, terminal parameter values across the columns.
fn print_grid_table(grid: GridView<'_>) {
    let mut builder = Builder::default();

    let mut header: Vec<String> = vec!["WACC \\ terminal".to_string()];
    header.extend(grid.terminal_axis.iter().map(format_value));
    builder.push_record(header);

    for (i, row) in grid.cells.iter().enumerate() {
        let mut record: Vec<String> = vec![grid
            .rate_axis
            .get(i)
            .map(format_value)
            .unwrap_or_default()];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(|cell| match cell {
                Value::Null => "-".to_string(),
                other => format_value(other),
            }));
        }
        builder.push_record(record);
    }

    let table = Table::from(builder);
    println!("{}", table);
}

fn print_flat_object(value: &Value) {
    if let Value::Object(map) = value {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        for (key, val) in map {
            builder.push_record([key.as_str(), &format_value(val)]);
        }
        let table = Table::from(builder);
        println!("{}", table);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(h.as_str())
                            .map(format_value)
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        let table = Table::from(builder);
        println!("{}", table);
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
