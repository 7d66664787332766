//! Editor backend: JSON API plus static files.

mod api;
mod lifecycle;
mod path;
mod response;
mod router;

use std::io::Read;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::json;
use tiny_http::{Method, Request};

use crate::config::BlogConfig;
use crate::embed::post::PostTemplate;
use crate::post::publish::Publisher;
use crate::store::Store;
use crate::{debug, log, logger};
use api::ApiError;
use response::Reply;
use router::{Route, url_path};

/// Where `GET /` sends the browser.
const EDITOR_PAGE: &str = "/editor/editor.html";

/// Everything a request handler needs.
pub struct AppState {
    pub config: BlogConfig,
    pub template: PostTemplate,
    pub store: Store,
}

impl AppState {
    pub fn new(config: BlogConfig) -> Result<Self> {
        let template = PostTemplate::load(config.paths.template.as_deref())?;
        let store = Store::new(&config);
        Ok(Self { config, template, store })
    }

    pub fn publisher(&self) -> Publisher<'_> {
        Publisher::new(&self.config, &self.template, &self.store)
    }
}

/// Bind and serve until Ctrl+C.
pub fn serve(config: BlogConfig) -> Result<()> {
    let workers = config.serve.workers.max(1);
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    crate::core::register_server(Arc::clone(&server));

    let state = Arc::new(AppState::new(config)?);
    debug!("serve"; "static files from {}", state.config.paths.static_root.display());
    debug!("serve"; "post template: {}", if state.template.is_builtin() { "built-in" } else { "custom" });
    log!("serve"; "http://{}", addr);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("serve-{i}"))
        .build()
        .context("failed to create request thread pool")?;

    for request in server.incoming_requests() {
        let state = Arc::clone(&state);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &state) {
                log!("serve"; "request error: {:#}", e);
            }
        });
    }
    Ok(())
}

fn handle_request(mut request: Request, state: &AppState) -> Result<()> {
    let started = Instant::now();
    let method = request.method().clone();
    let url = request.url().to_string();

    let reply = if crate::core::is_shutdown() {
        Reply::Unavailable
    } else {
        match read_body(&mut request, state.config.serve.max_body_bytes) {
            Ok(body) => route(state, &method, &url, &body),
            Err(err) => api_error(err),
        }
    };

    let status = reply.status();
    response::respond(request, reply)?;
    logger::request(method.as_str(), url_path(&url), status, started.elapsed());
    Ok(())
}

/// Read at most `limit` bytes of body.
fn read_body(request: &mut Request, limit: usize) -> Result<Vec<u8>, ApiError> {
    if request.body_length().is_some_and(|len| len > limit) {
        return Err(ApiError::PayloadTooLarge);
    }
    let mut body = Vec::new();
    request
        .as_reader()
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|_| ApiError::BadRequest("请求体读取失败"))?;
    if body.len() > limit {
        return Err(ApiError::PayloadTooLarge);
    }
    Ok(body)
}

/// Answer one request without touching the socket.
fn route(state: &AppState, method: &Method, url: &str, body: &[u8]) -> Reply {
    let Some(route) = Route::parse(method, url) else {
        return not_found(url);
    };

    match route {
        Route::Preflight => Reply::NoContent,
        Route::Root => Reply::Redirect(EDITOR_PAGE),
        Route::Static => match path::resolve_path(url, &state.config.paths.static_root) {
            Some(file) => Reply::File(file),
            None => not_found(url),
        },
        route => {
            let body = if route.has_body() { body } else { &[] };
            match api::handle(state, &route, body) {
                Ok(value) => Reply::json(200, value),
                Err(err) => api_error(err),
            }
        }
    }
}

fn api_error(err: ApiError) -> Reply {
    Reply::json(err.status(), err.body())
}

fn not_found(url: &str) -> Reply {
    Reply::json(404, json!({ "error": "页面未找到", "path": url_path(url) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use std::fs;

    fn state() -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("editor")).unwrap();
        fs::write(dir.path().join("editor/editor.html"), "<html></html>").unwrap();
        let state = AppState::new(test_config_at(dir.path())).unwrap();
        (dir, state)
    }

    #[test]
    fn test_site_routes() {
        let (_dir, state) = state();
        assert!(matches!(route(&state, &Method::Get, "/", b""), Reply::Redirect(EDITOR_PAGE)));
        assert!(matches!(route(&state, &Method::Options, "/api/posts", b""), Reply::NoContent));

        let Reply::File(file) = route(&state, &Method::Get, EDITOR_PAGE, b"") else {
            panic!("editor page not served");
        };
        assert!(file.ends_with("editor/editor.html"));
    }

    #[test]
    fn test_not_found() {
        let (_dir, state) = state();
        for url in ["/api/nope?x=1", "/missing.css", "/../etc/passwd"] {
            let Reply::Json { status, body } = route(&state, &Method::Get, url, b"") else {
                panic!("expected JSON for {url}");
            };
            assert_eq!(status, 404);
            assert_eq!(body["error"], "页面未找到");
        }
        let Reply::Json { body, .. } = route(&state, &Method::Patch, "/api/posts?q", b"") else {
            panic!("expected JSON");
        };
        assert_eq!(body["path"], "/api/posts");
    }

    #[test]
    fn test_api_replies() {
        let (_dir, state) = state();
        let reply = route(&state, &Method::Get, "/api/health", b"ignored");
        assert_eq!(reply.status(), 200);

        let reply = route(&state, &Method::Post, "/api/posts", br#"{"title":""}"#);
        let Reply::Json { status, body } = reply else { panic!("expected JSON") };
        assert_eq!(status, 400);
        assert_eq!(body["success"], false);
    }

    #[test]
    fn test_app_state_template() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config_at(dir.path());
        config.paths.template = Some(dir.path().join("missing.html"));
        assert!(AppState::new(config).is_err());
    }
}
