use axum::http::header;
use tracing::debug;
use wagate_core::{error::GatewayError, message::MediaPayload};

const DEFAULT_MIMETYPE: &str = "application/octet-stream";
const DEFAULT_FILENAME: &str = "Media";

/// Download `url` into a media payload.
///
/// The MIME type comes from the response `Content-Type`; the filename is the
/// last path segment of the final URL, or `Media` when there is none.
pub async fn fetch_media(http: &reqwest::Client, url: &str) -> Result<MediaPayload, GatewayError> {
    let resp = http
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| GatewayError::Media(format!("failed to fetch {url}: {e}")))?;

    let mimetype = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_MIMETYPE.to_string());

    let filename = resp
        .url()
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(|s| {
            urlencoding::decode(s)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| s.to_string())
        })
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

    let data = resp
        .bytes()
        .await
        .map_err(|e| GatewayError::Media(format!("failed to read {url}: {e}")))?
        .to_vec();

    debug!("fetched {} bytes of {mimetype} from {url}", data.len());
    Ok(MediaPayload {
        mimetype,
        data,
        filename,
    })
}
