use serde_json::Value;

use scrollfeed_core::{FetchResult, Pagination, ShapeError};

/// Decodes a response body into a [`FetchResult`].
///
/// Two shapes are understood: the `{success, data, pagination}` envelope and
/// the page-number form `{count, next, previous, results}`.
pub fn decode_fetch_result(body: &[u8]) -> Result<FetchResult, ShapeError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|err| ShapeError::InvalidJson(err.to_string()))?;
    decode_value(value)
}

pub fn decode_value(value: Value) -> Result<FetchResult, ShapeError> {
    let Value::Object(mut object) = value else {
        return Err(ShapeError::wrong_type("<root>", "object"));
    };

    if object.contains_key("results") && !object.contains_key("success") {
        let data = take_array(&mut object, "results")?;
        let has_next = match object.get("next") {
            None | Some(Value::Null) => false,
            Some(Value::String(next)) => !next.is_empty(),
            Some(_) => return Err(ShapeError::wrong_type("next", "string or null")),
        };
        return Ok(FetchResult::page(data, has_next));
    }

    let success = match object.get("success") {
        Some(Value::Bool(success)) => *success,
        Some(_) => return Err(ShapeError::wrong_type("success", "bool")),
        None => return Err(ShapeError::missing("success")),
    };
    let error = match object.remove("error") {
        None | Some(Value::Null) => None,
        Some(Value::String(message)) => Some(message),
        Some(other) => Some(other.to_string()),
    };
    let from_cache = matches!(object.get("fromCache"), Some(Value::Bool(true)));

    if !success {
        return Ok(FetchResult {
            from_cache,
            ..FetchResult::rejected(error.unwrap_or_default())
        });
    }

    let data = take_array(&mut object, "data")?;
    let pagination = match object.get("pagination") {
        None | Some(Value::Null) => None,
        Some(Value::Object(meta)) => {
            let flag = meta.get("has_next").or_else(|| meta.get("hasNext"));
            match flag {
                Some(Value::Bool(has_next)) => Some(Pagination {
                    has_next: *has_next,
                }),
                Some(_) => return Err(ShapeError::wrong_type("pagination.has_next", "bool")),
                None => return Err(ShapeError::missing("pagination.has_next")),
            }
        }
        Some(_) => return Err(ShapeError::wrong_type("pagination", "object")),
    };

    Ok(FetchResult {
        success,
        data,
        pagination,
        from_cache,
        error,
    })
}

fn take_array(
    object: &mut serde_json::Map<String, Value>,
    field: &str,
) -> Result<Vec<Value>, ShapeError> {
    match object.remove(field) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(ShapeError::wrong_type(field, "array")),
        None => Err(ShapeError::missing(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn envelope_with_pagination() {
        let result = decode_value(json!({
            "success": true,
            "data": [{"id": 1}],
            "pagination": {"has_next": true},
            "fromCache": true
        }))
        .unwrap();
        assert_eq!(
            result,
            FetchResult {
                from_cache: true,
                ..FetchResult::page(vec![json!({"id": 1})], true)
            }
        );
    }

    #[test]
    fn envelope_accepts_camel_case_flag_and_missing_pagination() {
        let camel = decode_value(json!({
            "success": true, "data": [], "pagination": {"hasNext": false}
        }))
        .unwrap();
        assert_eq!(camel.pagination, Some(Pagination { has_next: false }));

        let bare = decode_value(json!({"success": true, "data": []})).unwrap();
        assert_eq!(bare.pagination, None);
    }

    #[test]
    fn page_number_form_uses_next_link() {
        let result = decode_value(json!({
            "count": 45,
            "next": "http://api.test/campaigns/?page=3",
            "previous": "http://api.test/campaigns/?page=1",
            "results": [{"id": 13}]
        }))
        .unwrap();
        assert!(result.success);
        assert_eq!(result.pagination, Some(Pagination { has_next: true }));

        let last = decode_value(json!({"count": 1, "next": null, "results": []})).unwrap();
        assert_eq!(last.pagination, Some(Pagination { has_next: false }));
    }

    #[test]
    fn failure_envelope_keeps_message() {
        let result = decode_value(json!({"success": false, "error": "quota exceeded"})).unwrap();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn malformed_shapes_are_rejected() {
        assert_eq!(
            decode_value(json!({"data": []})),
            Err(ShapeError::missing("success"))
        );
        assert_eq!(
            decode_value(json!({"success": true})),
            Err(ShapeError::missing("data"))
        );
        assert_eq!(
            decode_value(json!({"success": true, "data": {}})),
            Err(ShapeError::wrong_type("data", "array"))
        );
        assert_eq!(
            decode_value(json!({"success": true, "data": [], "pagination": {"has_next": "yes"}})),
            Err(ShapeError::wrong_type("pagination.has_next", "bool"))
        );
        assert!(matches!(
            decode_fetch_result(b"<html>"),
            Err(ShapeError::InvalidJson(_))
        ));
    }
}
