use serde_json::Value;
use std::io::{self, Read};

/// Read a JSON request piped through stdin. An interactive terminal or an
/// empty pipe yields None so the caller can fall through to flag input.
pub fn read_piped() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut raw = String::new();
    io::stdin().read_to_string(&mut raw)?;
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_str(raw)?))
}
