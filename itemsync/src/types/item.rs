use serde_json::{Map, Value};

use crate::bail;
use crate::error::{ErrorKind, SyncResult};

/// One workspace item as returned by the admin API.
///
/// Records are kept as opaque JSON objects. Only `id`, `name` and `type` are relied upon
/// downstream, and only after normalization.
pub type ItemRecord = Map<String, Value>;

/// One decoded response of the paginated items endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<ItemRecord>,
    /// Link to the next page; [`None`] when this is the last page.
    pub continuation: Option<String>,
}

impl Page {
    /// Decodes a page from a response body.
    ///
    /// The item list field must be present and an array of objects. The continuation field may
    /// be absent, `null` or empty, all of which end pagination; any other non-string value is
    /// rejected.
    pub fn from_body(body: &[u8], items_field: &str, continuation_field: &str) -> SyncResult<Page> {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(err) => bail!(
                ErrorKind::SourceResponseInvalid,
                "Page body is not valid JSON",
                err.to_string(),
                source: err
            ),
        };

        let Value::Object(mut object) = value else {
            bail!(
                ErrorKind::SourceResponseInvalid,
                "Page body is not a JSON object"
            );
        };

        let items = match object.remove(items_field) {
            Some(Value::Array(items)) => items,
            Some(other) => bail!(
                ErrorKind::SourceResponseInvalid,
                "Page item list field is not an array",
                format!("field `{items_field}` holds {}", json_type_name(&other))
            ),
            None => bail!(
                ErrorKind::SourceResponseInvalid,
                "Page is missing the item list field",
                format!("field `{items_field}` not found")
            ),
        };

        let items = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(record) => Ok(record),
                other => Err(crate::sync_error!(
                    ErrorKind::SourceResponseInvalid,
                    "Page item is not a JSON object",
                    format!("item {index} is {}", json_type_name(&other))
                )),
            })
            .collect::<SyncResult<Vec<_>>>()?;

        let continuation = match object.remove(continuation_field) {
            None | Some(Value::Null) => None,
            Some(Value::String(link)) if link.trim().is_empty() => None,
            Some(Value::String(link)) => Some(link),
            Some(other) => bail!(
                ErrorKind::SourceResponseInvalid,
                "Page continuation link is not a string",
                format!(
                    "field `{continuation_field}` holds {}",
                    json_type_name(&other)
                )
            ),
        };

        Ok(Page {
            items,
            continuation,
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
