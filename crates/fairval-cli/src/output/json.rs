use serde_json::Value;

/// Render a result as indented JSON on stdout.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => eprintln!("Could not serialize output: {e}"),
    }
}
