use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header,
    Form, Json,
};
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::{Map, Value};

use super::error::ApiError;

/// Body extractor accepting `application/json`,
/// `application/x-www-form-urlencoded` or the text fields of
/// `multipart/form-data`. Any other content type (or none) yields
/// `T::default()`, so required-field validation reports what is missing.
pub struct JsonOrForm<T>(pub T);

impl<T, S> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::Malformed(e.body_text()))?;
            Ok(Self(value))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ApiError::Malformed(e.body_text()))?;
            Ok(Self(value))
        } else if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::Malformed(e.body_text()))?;
            let fields = multipart_text_fields(multipart).await?;
            serde_json::from_value(Value::Object(fields))
                .map(Self)
                .map_err(|e| ApiError::Malformed(e.to_string()))
        } else {
            Ok(Self(T::default()))
        }
    }
}

/// Text parts of a multipart body keyed by field name. Uploaded files are
/// skipped, as is any repeat of a name already seen.
async fn multipart_text_fields(mut multipart: Multipart) -> Result<Map<String, Value>, ApiError> {
    let mut fields = Map::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Malformed(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if field.file_name().is_some() || fields.contains_key(&name) {
            continue;
        }
        let text = field
            .text()
            .await
            .map_err(|e| ApiError::Malformed(e.body_text()))?;
        fields.insert(name, Value::String(text));
    }
    Ok(fields)
}

/// Accept a string, number or boolean field as text. Anything else is absent.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// The trimmed value if present and non-empty.
pub fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
