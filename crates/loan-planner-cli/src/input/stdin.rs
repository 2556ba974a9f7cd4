use serde_json::Value;
use std::io::{self, Read};

/// Read a piped plan from stdin, JSON or YAML.
/// Returns None for an interactive terminal or an empty pipe.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    tracing::debug!(bytes = buffer.len(), "stdin read");

    parse_piped(&buffer)
}

fn parse_piped(buffer: &str) -> Result<Option<Value>, Box<dyn std::error::Error>> {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str(trimmed) {
        Ok(value) => Ok(Some(value)),
        Err(json_err) => serde_yaml::from_str::<Value>(trimmed)
            .map(Some)
            .map_err(|_| format!("stdin is neither JSON nor YAML: {json_err}").into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piped_json_and_yaml_agree() {
        let json = parse_piped(r#"{"loans": [{"id": "car", "principal": "9000"}], "cash": "500"}"#)
            .unwrap()
            .unwrap();
        let yaml = parse_piped("loans:\n  - id: car\n    principal: \"9000\"\ncash: \"500\"\n")
            .unwrap()
            .unwrap();
        assert_eq!(json, yaml);
    }

    #[test]
    fn test_blank_pipe_is_no_input() {
        assert!(parse_piped("  \n").unwrap().is_none());
    }
}
