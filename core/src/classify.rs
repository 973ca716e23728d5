//! Turn a raw `HttpResponse` into a decoded payload or a typed failure.
//!
//! The classifier never fails twice: if an error body cannot be parsed the
//! failure message falls back to `HTTP <status>: <reason>`.

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApiError, FieldErrors};
use crate::http::HttpResponse;

/// One entry of a FastAPI-style `detail` issue list.
#[derive(Debug, Deserialize)]
struct Issue {
    #[serde(default)]
    loc: Vec<Value>,
    msg: String,
}

/// Classify `response`.
///
/// * non-2xx: `Err(NotFound)` for 404, `Err(Http)` otherwise
/// * 204: `Ok(None)` whatever the body
/// * JSON content type: `Ok(Some(value))`
/// * anything else: `Ok(None)`
pub fn classify(response: &HttpResponse) -> Result<Option<Value>, ApiError> {
    if !response.is_success() {
        let err = failure(response);
        warn!(status = response.status, error = %err, "API error response");
        return Err(err);
    }

    if response.status == 204 {
        debug!(status = response.status, "API response without content");
        return Ok(None);
    }

    if !response.is_json() {
        debug!(status = response.status, "API response is not JSON, ignoring body");
        return Ok(None);
    }

    serde_json::from_str(&response.body)
        .map(Some)
        .map_err(|e| ApiError::Decode(e.to_string()))
}

fn failure(response: &HttpResponse) -> ApiError {
    let body: Value = serde_json::from_str(&response.body).unwrap_or(Value::Null);

    // Parts are read independently; a malformed one is skipped.
    let mut field_errors = FieldErrors::new();
    let message = detail_message(body.get("detail"), &mut field_errors)
        .or_else(|| envelope_message(body.get("error")))
        .unwrap_or_else(|| format!("HTTP {}: {}", response.status, response.reason()));

    if let Some(Value::Object(errors)) = body.get("errors") {
        for (field, value) in errors {
            if let Some(text) = field_message(value) {
                field_errors.insert(field.clone(), text);
            }
        }
    }

    if response.status == 404 {
        return ApiError::NotFound { message };
    }
    ApiError::Http {
        status: response.status,
        message,
        field_errors: (!field_errors.is_empty()).then_some(field_errors),
    }
}

/// `detail` as plain text, or as an issue list whose `loc` names a field.
fn detail_message(detail: Option<&Value>, field_errors: &mut FieldErrors) -> Option<String> {
    match detail? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Array(items) => {
            let issues: Vec<Issue> = items
                .iter()
                .filter_map(|item| Issue::deserialize(item).ok())
                .collect();
            for issue in &issues {
                if let Some(field) = issue.loc.last().and_then(Value::as_str) {
                    field_errors
                        .entry(field.to_string())
                        .or_insert_with(|| issue.msg.clone());
                }
            }
            let joined = issues
                .iter()
                .map(|i| i.msg.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

/// `error.message` from an `{"error": {..}}` envelope.
fn envelope_message(error: Option<&Value>) -> Option<String> {
    error?
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// A field error given as a string or a list of strings.
fn field_message(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let joined = items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; ");
            (!joined.is_empty()).then_some(joined)
        }
        _ => None,
    }
}

/// Decode a classified payload into `T`.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(payload: Option<Value>) -> Result<T, ApiError> {
    let value = payload.ok_or_else(|| ApiError::Decode("expected a JSON body, got none".into()))?;
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_content_returns_none_even_with_body() {
        let resp = HttpResponse::json(204, r#"{"ignored": true}"#);
        assert_eq!(classify(&resp).unwrap(), None);
    }

    #[test]
    fn non_json_content_type_returns_none() {
        let resp = HttpResponse::new(200, "<html>ok</html>").with_header("content-type", "text/html");
        assert_eq!(classify(&resp).unwrap(), None);
    }

    #[test]
    fn not_found_uses_detail_verbatim() {
        let resp = HttpResponse::json(404, r#"{"detail":"not found"}"#);
        let err = classify(&resp).unwrap_err();
        assert_eq!(err, ApiError::NotFound { message: "not found".into() });
        assert_eq!(err.to_string(), "not found");
    }

    #[test]
    fn unparseable_error_body_falls_back_to_status_line() {
        let resp = HttpResponse::new(500, "<<<garbage").with_header("content-type", "application/json");
        let err = classify(&resp).unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn field_errors_are_collected() {
        let resp = HttpResponse::json(
            422,
            r#"{"detail":"Validation failed","errors":{"name":"Name cannot be empty"}}"#,
        );
        let err = classify(&resp).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed");
        assert_eq!(err.field_errors().unwrap()["name"], "Name cannot be empty");
    }

    #[test]
    fn validation_issue_list_maps_loc_to_field() {
        let resp = HttpResponse::json(
            422,
            r#"{"detail":[{"loc":["body","category"],"msg":"Category cannot be empty","type":"value_error"}]}"#,
        );
        let err = classify(&resp).unwrap_err();
        assert_eq!(err.to_string(), "Category cannot be empty");
        assert_eq!(err.field_errors().unwrap()["category"], "Category cannot be empty");
    }

    #[test]
    fn error_envelope_message_is_used() {
        let resp = HttpResponse::json(
            400,
            r#"{"error":{"code":"http_error","message":"Bad filter","status":400}}"#,
        );
        assert_eq!(classify(&resp).unwrap_err().to_string(), "Bad filter");
    }

    #[test]
    fn list_valued_field_errors_keep_the_detail() {
        let resp = HttpResponse::json(
            422,
            r#"{"detail":"Validation failed","errors":{"name":["too short","not unique"],"category":"required"}}"#,
        );
        let err = classify(&resp).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed");
        let fields = err.field_errors().unwrap();
        assert_eq!(fields["name"], "too short; not unique");
        assert_eq!(fields["category"], "required");
    }

    #[test]
    fn plain_string_error_field_does_not_hide_detail() {
        let resp = HttpResponse::json(400, r#"{"detail":"Bad filter","error":"bad_request"}"#);
        let err = classify(&resp).unwrap_err();
        assert_eq!(err.to_string(), "Bad filter");
        assert_eq!(err.field_errors(), None);
    }

    #[test]
    fn odd_detail_shape_falls_through_to_envelope() {
        let resp = HttpResponse::json(
            400,
            r#"{"detail":{"nested":true},"error":{"message":"Bad filter"},"errors":[1,2]}"#,
        );
        assert_eq!(classify(&resp).unwrap_err().to_string(), "Bad filter");
    }

    #[test]
    fn decode_rejects_missing_payload() {
        let err = decode::<Vec<String>>(None).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
