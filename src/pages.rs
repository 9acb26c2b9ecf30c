use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{HeaderMap, HeaderName, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{PageError, Result};

/// Request headers the page renderer needs to produce the same page the browser asked for.
const FORWARDED_REQUEST_HEADERS: [HeaderName; 5] = [
    header::COOKIE,
    header::ACCEPT,
    header::ACCEPT_LANGUAGE,
    header::CONTENT_TYPE,
    header::USER_AGENT,
];

/// Response headers copied back to the browser.
const RETURNED_RESPONSE_HEADERS: [HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::LOCATION,
    header::CACHE_CONTROL,
    header::SET_COOKIE,
];

/// PageRequest
///
/// An allowed navigation, captured after the route guard let it through.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub method: Method,
    /// Path plus query string, exactly as received.
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// PageResponse
///
/// What the renderer answered. Returned to the browser unchanged apart from any cookie
/// removals the guard appends afterwards.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl IntoResponse for PageResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

// 1. PageService Contract
/// PageService
///
/// The pass-through target for every request the guard allows. The real implementation
/// forwards to the page renderer over HTTP; the mock answers in memory for tests.
#[async_trait]
pub trait PageService: Send + Sync {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResponse>;
}

// 2. The Real Implementation
/// UpstreamPageService
///
/// Forwards to the renderer at `base_url`. Upstream redirects are never followed so the
/// browser sees them exactly as the renderer issued them.
#[derive(Clone)]
pub struct UpstreamPageService {
    client: reqwest::Client,
    base_url: String,
}

impl UpstreamPageService {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PageService for UpstreamPageService {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResponse> {
        let url = format!("{}{}", self.base_url, request.path_and_query);

        let mut forwarded = HeaderMap::new();
        for name in &FORWARDED_REQUEST_HEADERS {
            for value in request.headers.get_all(name) {
                forwarded.append(name.clone(), value.clone());
            }
        }

        let upstream = self
            .client
            .request(request.method, &url)
            .headers(forwarded)
            .body(request.body)
            .send()
            .await?;

        let status = upstream.status();
        let mut headers = HeaderMap::new();
        for name in &RETURNED_RESPONSE_HEADERS {
            for value in upstream.headers().get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }
        let body = upstream.bytes().await?;

        tracing::debug!(%url, %status, "page fetched from upstream");

        Ok(PageResponse {
            status,
            headers,
            body,
        })
    }
}

// 3. The Mock Implementation (For Tests)
/// MockPageService
///
/// Renders `<h1>{path}</h1>` for any request and records every path it served, so tests can
/// tell a pass-through apart from a redirect that never reached the page.
#[derive(Clone, Default)]
pub struct MockPageService {
    /// When true, every fetch fails as an unreachable renderer would.
    pub should_fail: bool,
    served: Arc<Mutex<Vec<String>>>,
}

impl MockPageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub async fn served_paths(&self) -> Vec<String> {
        self.served.lock().await.clone()
    }
}

#[async_trait]
impl PageService for MockPageService {
    async fn fetch_page(&self, request: PageRequest) -> Result<PageResponse> {
        if self.should_fail {
            return Err(PageError::Mock("renderer offline".to_string()));
        }

        self.served.lock().await.push(request.path_and_query.clone());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("text/html; charset=utf-8"),
        );

        Ok(PageResponse {
            status: StatusCode::OK,
            headers,
            body: Bytes::from(format!("<h1>{}</h1>", request.path_and_query)),
        })
    }
}

/// PageState
///
/// The shared handle to whichever page service is in use.
pub type PageState = Arc<dyn PageService>;
