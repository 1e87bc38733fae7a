//! JSON output formatting.

use crate::error::Result;

/// Format a value as JSON.
pub fn format_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::error::ClientError;

    #[test]
    fn test_format_table_names() {
        let names = vec!["bar".to_string(), "baz".to_string()];
        assert_eq!(format_json(&names).unwrap(), r#"["bar","baz"]"#);
    }

    #[test]
    fn test_unserializable_value_is_json_error() {
        let by_tuple = HashMap::from([((1, 2), "pair")]);
        let err = format_json(&by_tuple).unwrap_err();
        assert!(matches!(err, ClientError::Json(_)));
    }
}
