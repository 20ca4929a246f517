//! Request context used to build absolute media URLs
//!
//! Handlers take `Option<RequestContext>`: the extractor fails (and the
//! option is `None`) when neither a public base URL is configured nor the
//! request carries a host.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use axum_extra::{TypedHeader, headers::Host};

use crate::{error::ApiError, state::AppState};

const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// Base location media paths are resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    base_url: String,
}

impl RequestContext {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Resolve a stored media path against the base URL
    ///
    /// Paths that are already absolute URLs are returned unchanged.
    pub fn absolute_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        join_url(&self.base_url, path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn forwarded_scheme(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(FORWARDED_PROTO_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|scheme| !scheme.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let settings = &state.settings;

        let origin = match &settings.public_base_url {
            Some(base) => base.clone(),
            None => {
                let host = match TypedHeader::<Host>::from_request_parts(parts, state).await {
                    Ok(TypedHeader(host)) => host.to_string(),
                    Err(_) => parts
                        .uri
                        .authority()
                        .map(|authority| authority.to_string())
                        .ok_or_else(|| {
                            ApiError::BadRequest("Request has no host".to_string())
                        })?,
                };
                let scheme = forwarded_scheme(&parts.headers)
                    .or_else(|| parts.uri.scheme_str())
                    .unwrap_or("http");
                format!("{}://{}", scheme, host)
            }
        };

        let base_url = if settings.media_url.trim_matches('/').is_empty() {
            origin
        } else {
            join_url(&origin, &settings.media_url)
        };

        tracing::trace!(base_url = %base_url, "RequestContext extracted");
        Ok(RequestContext { base_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Settings, repositories::MemoryStore};
    use axum::http::Request;

    fn state_with(settings: Settings) -> AppState {
        AppState::in_memory(MemoryStore::new(), settings)
    }

    async fn extract(state: &AppState, request: Request<()>) -> Option<RequestContext> {
        let (mut parts, _) = request.into_parts();
        RequestContext::from_request_parts(&mut parts, state)
            .await
            .ok()
    }

    #[test]
    fn test_absolute_url_joins_base_and_path() {
        let context = RequestContext::new("https://host/");
        assert_eq!(
            context.absolute_url("avatars/alice.png"),
            "https://host/avatars/alice.png"
        );
        assert_eq!(
            context.absolute_url("/avatars/alice.png"),
            "https://host/avatars/alice.png"
        );
        assert_eq!(
            context.absolute_url("https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
    }

    #[tokio::test]
    async fn test_context_from_host_header() {
        let state = state_with(Settings::default());
        let request = Request::builder()
            .uri("/users/1")
            .header("host", "chat.example.com:8080")
            .header("x-forwarded-proto", "https")
            .body(())
            .unwrap();

        let context = extract(&state, request).await.unwrap();
        assert_eq!(
            context.absolute_url("a.png"),
            "https://chat.example.com:8080/a.png"
        );
    }

    #[tokio::test]
    async fn test_context_appends_media_prefix() {
        let settings = Settings {
            media_url: "/media/".to_string(),
            ..Settings::default()
        };
        let state = state_with(settings);
        let request = Request::builder()
            .uri("/users")
            .header("host", "localhost")
            .body(())
            .unwrap();

        let context = extract(&state, request).await.unwrap();
        assert_eq!(
            context.absolute_url("avatars/a.png"),
            "http://localhost/media/avatars/a.png"
        );
    }

    #[tokio::test]
    async fn test_configured_base_url_wins() {
        let settings = Settings {
            public_base_url: Some("https://host/".to_string()),
            ..Settings::default()
        };
        let state = state_with(settings);
        let request = Request::builder().uri("/users").body(()).unwrap();

        let context = extract(&state, request).await.unwrap();
        assert_eq!(context.absolute_url("a.png"), "https://host/a.png");
    }

    #[tokio::test]
    async fn test_no_host_means_no_context() {
        let state = state_with(Settings::default());
        let request = Request::builder().uri("/users").body(()).unwrap();

        assert!(extract(&state, request).await.is_none());
    }
}
