use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                if write_grid_csv(&mut wtr, result) {
                    // Sensitivity matrix already written
                } else if let Value::Object(result) = result {
                    let _ = wtr.write_record(["field", "value"]);
                    for (key, val) in result {
                        let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                    }
                }
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_csv_value(val)]);
                }
            }
        }
        Value::Array(arr) => {
            write_array_csv(&mut wtr, arr);
        }
        _ => {
            let _ = wtr.write_record([&format_csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

/// Sensitivity grids become a matrix: first column the discount rate,
/// one column per terminal parameter value, blank cells where undefined.
fn write_grid_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, result: &Value) -> bool {
    let map = match result.as_object() {
        Some(map) => map,
        None => return false,
    };
    let (rate_axis, terminal_axis, cells) = match (
        map.get("rate_axis").and_then(|v| v.as_array()),
        map.get("terminal_axis").and_then(|v| v.as_array()),
        map.get("cells").and_then(|v| v.as_array()),
    ) {
        (Some(r), Some(t), Some(c)) => (r, t, c),
        _ => return false,
    };

    let mut header = vec!["wacc".to_string()];
    header.extend(terminal_axis.iter().map(format_csv_value));
    let _ = wtr.write_record(&header);

    for (i, row) in cells.iter().enumerate() {
        let mut record = vec![rate_axis
            .get(i)
            .map(format_csv_value)
            .unwrap_or_default()];
        if let Value::Array(row) = row {
            record.extend(row.iter().map(format_csv_value));
        }
        let _ = wtr.write_record(&record);
    }
    true
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(*h)
                            .map(format_csv_value)
                            .unwrap_or_default()
                    })
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
