use axum::http::HeaderMap;
use serde_json::Value;

use crate::guard::FormFields;

/// Parse a request body based on Content-Type header into flat form fields.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<FormFields, String> {
    let ct = content_type.unwrap_or("application/json");

    if body.is_empty() {
        return Ok(FormFields::new());
    }

    if ct.contains("application/json") {
        parse_json(body)
    } else if ct.contains("application/x-www-form-urlencoded") {
        parse_form_urlencoded(body)
    } else if ct.contains("multipart/form-data") {
        Err("multipart".to_string())
    } else {
        // Try JSON first, then form-urlencoded
        parse_json(body)
            .or_else(|_| parse_form_urlencoded(body))
            .map_err(|e| format!("Unable to parse body: {e}"))
    }
}

fn parse_json(body: &[u8]) -> Result<FormFields, String> {
    let value: Value = serde_json::from_slice(body).map_err(|e| format!("Invalid JSON: {e}"))?;
    let Value::Object(obj) = value else {
        return Err("Expected a JSON object of form fields".to_string());
    };

    let mut fields = FormFields::new();
    for (key, value) in obj {
        match value {
            Value::Null => {}
            Value::String(s) => {
                fields.insert(key, s);
            }
            Value::Bool(_) | Value::Number(_) => {
                fields.insert(key, value.to_string());
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(format!("Field {key} must be a plain value"));
            }
        }
    }
    Ok(fields)
}

fn parse_form_urlencoded(body: &[u8]) -> Result<FormFields, String> {
    let body_str = std::str::from_utf8(body).map_err(|e| format!("Invalid UTF-8: {e}"))?;
    Ok(form_urlencoded::parse(body_str.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect())
}

/// Parse multipart form data using multer. File parts are rejected.
pub async fn parse_multipart(headers: &HeaderMap, body: bytes::Bytes) -> Result<FormFields, String> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| "Missing multipart boundary".to_string())?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fields = FormFields::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Multipart error: {e}"))?
    {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        if field.file_name().is_some() {
            return Err(format!("File uploads are not accepted: {name}"));
        }
        let value = field
            .text()
            .await
            .map_err(|e| format!("Field read error: {e}"))?;
        fields.insert(name, value);
    }

    Ok(fields)
}
