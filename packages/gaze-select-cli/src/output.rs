use gaze_select::SelectError;
use std::io::Write;
use std::path::Path;

/// Write a JSON document to stdout, or to `output_path` when given.
pub fn write_output(json: &str, output_path: Option<&str>) -> Result<(), SelectError> {
    match output_path {
        Some(path) => {
            std::fs::write(Path::new(path), format!("{}\n", json))?;
            log::info!("Wrote {}", path);
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(json.as_bytes())?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}

pub fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<String, SelectError> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    Ok(json)
}

/// Serialize and write in one step, mapping failures onto exit codes
pub fn emit<T: serde::Serialize>(value: &T, compact: bool, output_path: Option<&str>) -> i32 {
    match to_json(value, compact).and_then(|json| write_output(&json, output_path)) {
        Ok(()) => crate::exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            crate::exit_codes::EXECUTION_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_json_compact() {
        let value = serde_json::json!({"cell": [2, 4]});
        assert_eq!(to_json(&value, true).unwrap(), r#"{"cell":[2,4]}"#);
        assert!(to_json(&value, false).unwrap().contains('\n'));
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        write_output("{}", path.to_str()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}\n");
    }
}
