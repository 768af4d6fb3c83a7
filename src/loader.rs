use std::fs;
use std::path::Path;

use crate::desc::ProgramDesc;
use crate::error::OpError;

/// Parse a program description from JSON text.
pub fn program_from_json_str(contents: &str) -> Result<ProgramDesc, OpError> {
    Ok(serde_json::from_str(contents)?)
}

/// Load a program description from a `.json` file.
pub fn load_program_from_path(path: impl AsRef<Path>) -> Result<ProgramDesc, OpError> {
    let path_ref = path.as_ref();
    match path_ref.extension().and_then(|ext| ext.to_str()) {
        Some("json") => {}
        Some(ext) => {
            return Err(OpError::UnsupportedFormat {
                reason: format!("unsupported file extension `.{}`, use .json", ext),
            });
        }
        None => {
            return Err(OpError::UnsupportedFormat {
                reason: "no file extension found, use .json".to_string(),
            });
        }
    }

    let contents = fs::read_to_string(path_ref).map_err(|err| OpError::io(path_ref, err))?;
    program_from_json_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_program_json() {
        let program = program_from_json_str(
            r#"{
                "vars": {"x": {"data_type": "float32", "shape": [1, 4, 8, 8]}},
                "ops": []
            }"#,
        )
        .unwrap();
        assert_eq!(program.vars["x"].shape, vec![1, 4, 8, 8]);
        assert!(program.ops.is_empty());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = program_from_json_str(r#"{"vars": "#).unwrap_err();
        assert!(matches!(err, OpError::Parse { .. }));
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = load_program_from_path("model.yaml").unwrap_err();
        assert!(matches!(err, OpError::UnsupportedFormat { .. }));
        let err = load_program_from_path("model").unwrap_err();
        assert!(matches!(err, OpError::UnsupportedFormat { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_program_from_path("does/not/exist.json").unwrap_err();
        assert!(matches!(err, OpError::Io { .. }));
    }
}
