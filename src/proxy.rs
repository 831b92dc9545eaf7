// Same-origin proxy for the upstream API: /media/* is forwarded verbatim
// (images and static files), /apix/* is forwarded with the API key header
// injected server-side so the key never reaches the browser.

use anyhow::Context;
use axum::{
    body::Body,
    extract::{Request, State},
    http::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE},
    response::Response,
};

use crate::AppState;
use crate::encar_api::API_KEY_HEADER;
use crate::error::AppError;

// Upload bodies through /apix are bounded; media requests carry none.
const MAX_FORWARD_BODY: usize = 10 * 1024 * 1024;

pub async fn forward(
    State(app_state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    let search = request
        .uri()
        .query()
        .map(|q| format!("?{q}"))
        .unwrap_or_default();
    let target = format!(
        "{}{}{}",
        app_state.settings.api_url.trim_end_matches('/'),
        path,
        search
    );

    let method = request.method().clone();
    let headers = request.headers().clone();
    let body = axum::body::to_bytes(request.into_body(), MAX_FORWARD_BODY)
        .await
        .map_err(anyhow::Error::new)
        .context("Failed to read proxied request body")?;

    tracing::debug!(target = %target, method = %method, "Forwarding request upstream");

    let mut upstream = app_state.http_client.request(method, &target);
    for name in [ACCEPT, CONTENT_TYPE] {
        if let Some(value) = headers.get(&name) {
            upstream = upstream.header(name.clone(), value.clone());
        }
    }
    // Only authenticated API paths get the key.
    if path.starts_with("/apix/") {
        if let Some(key) = &app_state.settings.api_key {
            upstream = upstream.header(API_KEY_HEADER, key);
        }
    }
    if !body.is_empty() {
        upstream = upstream.body(body);
    }

    let response = upstream
        .send()
        .await
        .context("Failed to reach the upstream API")?;

    let status = response.status();
    let content_type = response.headers().get(CONTENT_TYPE).cloned();
    let cache_control = response.headers().get(CACHE_CONTROL).cloned();
    let bytes = response
        .bytes()
        .await
        .context("Failed to read upstream response body")?;

    let mut reply = Response::builder().status(status);
    if let Some(value) = content_type {
        reply = reply.header(CONTENT_TYPE, value);
    }
    if let Some(value) = cache_control {
        reply = reply.header(CACHE_CONTROL, value);
    }
    let reply = reply
        .body(Body::from(bytes))
        .map_err(anyhow::Error::new)
        .context("Failed to assemble proxied response")?;
    Ok(reply)
}
