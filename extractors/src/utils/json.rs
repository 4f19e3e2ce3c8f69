use serde_json::Value;

use crate::errors::ExtractorError;

pub(crate) fn json_get_object<'a>(object: &'a Value, key: &str) -> Result<&'a Value, ExtractorError> {
    let Some(value) = object.get(key) else {
        return Err(ExtractorError::EmbeddedDataMissingKey(format!(
            "JSON is missing '{key}'"
        )));
    };

    Ok(value)
}

pub(crate) fn json_get_array(object: &Value) -> Result<&Vec<Value>, ExtractorError> {
    let Some(value) = object.as_array() else {
        return Err(ExtractorError::EmbeddedDataInvalidShape(
            "JSON prop is not an array".into(),
        ));
    };

    Ok(value)
}

/// Walks `keys` from `object` down to the nested value
pub(crate) fn json_get_path<'a>(
    object: &'a Value,
    keys: &[&str],
) -> Result<&'a Value, ExtractorError> {
    keys.iter()
        .try_fold(object, |current, key| json_get_object(current, key))
}
