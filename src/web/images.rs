use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::http::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    LAST_MODIFIED,
};
use axum::http::response::Builder;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use httpdate::{fmt_http_date, parse_http_date};

use super::flash::{self, set_flash};
use super::prelude::*;
use crate::constants::GENERATED_IMAGE_CACHE_CONTROL;
use crate::datauri::DataUri;

/// Cache validators for the current generated background.
#[derive(Clone, Debug)]
pub(crate) struct ImageCacheHeaders {
    etag: Option<HeaderValue>,
    last_modified: Option<HeaderValue>,
    modified_at: Option<SystemTime>,
}

impl ImageCacheHeaders {
    /// Builds validators from the payload size and when it arrived.
    pub(crate) fn for_generated(size: usize, modified_at: Option<SystemTime>) -> Self {
        let etag = build_etag(size, modified_at);
        let last_modified =
            modified_at.and_then(|modified| HeaderValue::from_str(&fmt_http_date(modified)).ok());
        Self {
            etag,
            last_modified,
            modified_at,
        }
    }

    /// Returns the ETag header value, if available.
    pub(crate) fn etag(&self) -> Option<&HeaderValue> {
        self.etag.as_ref()
    }

    /// Returns the Last-Modified header value, if available.
    pub(crate) fn last_modified(&self) -> Option<&HeaderValue> {
        self.last_modified.as_ref()
    }
}

/// Applies image cache headers to a response builder.
pub(crate) fn apply_cache_headers(mut builder: Builder, cache: &ImageCacheHeaders) -> Builder {
    builder = builder.header(CACHE_CONTROL, GENERATED_IMAGE_CACHE_CONTROL);
    if let Some(etag) = cache.etag() {
        builder = builder.header(ETAG, etag.clone());
    }
    if let Some(last_modified) = cache.last_modified() {
        builder = builder.header(LAST_MODIFIED, last_modified.clone());
    }
    builder
}

/// Returns true when the request matches a not-modified response.
pub(crate) fn is_not_modified(headers: &HeaderMap, cache: &ImageCacheHeaders) -> bool {
    if let Some(if_none_match) = headers.get(IF_NONE_MATCH) {
        if let Ok(value) = if_none_match.to_str() {
            let value = value.trim();
            if value == "*" {
                return true;
            }
            if let Some(etag) = cache.etag().and_then(|value| value.to_str().ok())
                && value.split(',').any(|candidate| candidate.trim() == etag)
            {
                return true;
            }
        }
        return false;
    }

    if let (Some(if_modified_since), Some(modified_at)) =
        (headers.get(IF_MODIFIED_SINCE), cache.modified_at)
        && let Ok(value) = if_modified_since.to_str()
        && let Ok(since) = parse_http_date(value)
        && modified_at <= since
    {
        return true;
    }

    false
}

/// Builds a 304 response that preserves cache headers.
pub(crate) fn not_modified_response(cache: &ImageCacheHeaders) -> Result<Response, HeroshotError> {
    let builder = Response::builder().status(StatusCode::NOT_MODIFIED);
    let builder = apply_cache_headers(builder, cache);
    builder.body(Body::empty()).map_err(HeroshotError::from)
}

fn build_etag(size: usize, modified_at: Option<SystemTime>) -> Option<HeaderValue> {
    let suffix = modified_at
        .and_then(|modified| modified.duration_since(UNIX_EPOCH).ok())
        .map(|duration| duration.as_millis().to_string())
        .unwrap_or_else(|| "0".to_string());
    let value = format!("W/\"{}-{}\"", size, suffix);
    HeaderValue::from_str(&value).ok()
}

/// handles GET /image/generated: the raw background, for the preview
pub(crate) async fn generated_image_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
    headers: HeaderMap,
) -> Result<Response, HeroshotError> {
    let (image, generated_at) = state
        .workspaces
        .with_workspace(&workspace.id, |current| {
            Ok((current.cover.generated_image.clone(), current.generated_at))
        })
        .await?;
    let image = image.ok_or_else(|| HeroshotError::NotFound("/image/generated".to_string()))?;

    let cache = ImageCacheHeaders::for_generated(image.len(), generated_at);
    if is_not_modified(&headers, &cache) {
        return not_modified_response(&cache);
    }

    let uri = DataUri::parse(&image)
        .map_err(|err| HeroshotError::InternalServerError(err.to_string()))?;
    let bytes = uri
        .bytes()
        .map_err(|err| HeroshotError::InternalServerError(err.to_string()))?;
    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, uri.mime_type);
    apply_cache_headers(builder, &cache)
        .body(Body::from(bytes))
        .map_err(HeroshotError::from)
}

/// handles GET /export: the composited PNG as a download
pub(crate) async fn export_handler(
    State(state): State<AppState>,
    workspace: CurrentWorkspace,
) -> Result<Response, HeroshotError> {
    let cover = state.workspaces.cover(&workspace.id).await?;
    let exporter = state.exporter.clone();
    let result = tokio::task::spawn_blocking(move || exporter.export(&cover))
        .await
        .map_err(|err| HeroshotError::InternalServerError(err.to_string()))?;

    let exported = match result {
        Ok(exported) => exported,
        Err(err) => {
            error!("Export failed: {}", err);
            set_flash(&workspace.session, flash::FLASH_EXPORT_FAILED).await?;
            return Ok(Redirect::to("/").into_response());
        }
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "image/png")
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", exported.file_name),
        )
        .header(CACHE_CONTROL, "no-store")
        .body(Body::from(exported.bytes))
        .map_err(HeroshotError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn etag_and_if_modified_since_validate() {
        let modified = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let cache = ImageCacheHeaders::for_generated(42, Some(modified));
        let etag = cache.etag().expect("etag").to_str().expect("ascii").to_string();
        assert_eq!(etag, "W/\"42-1700000000000\"");

        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_str(&etag).expect("header"));
        assert!(is_not_modified(&headers, &cache));

        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("W/\"1-1\""));
        assert!(!is_not_modified(&headers, &cache));

        let mut headers = HeaderMap::new();
        headers.insert(
            IF_MODIFIED_SINCE,
            HeaderValue::from_str(&fmt_http_date(modified)).expect("header"),
        );
        assert!(is_not_modified(&headers, &cache));
    }
}
