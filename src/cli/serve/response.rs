//! HTTP responses.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::utils::mime::{self, types::JSON};

/// What a request is answered with.
#[derive(Debug)]
pub enum Reply {
    Json { status: u16, body: Value },
    File(PathBuf),
    Redirect(&'static str),
    /// Answer to a CORS preflight.
    NoContent,
    /// Shutdown in progress.
    Unavailable,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self::Json { status, body }
    }

    pub const fn status(&self) -> u16 {
        match self {
            Self::Json { status, .. } => *status,
            Self::File(_) => 200,
            Self::Redirect(_) => 302,
            Self::NoContent => 204,
            Self::Unavailable => 503,
        }
    }
}

/// Send `reply`. Every response allows cross-origin use by the editor.
pub fn respond(request: Request, reply: Reply) -> Result<()> {
    let head = request.method() == &Method::Head;
    let status = StatusCode(reply.status());

    let response = match reply {
        Reply::Json { body, .. } => {
            let body = serde_json::to_vec(&body)?;
            Response::from_data(body).with_header(make_header("Content-Type", JSON))
        }
        Reply::File(path) => {
            let body = if head {
                Vec::new()
            } else {
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?
            };
            Response::from_data(body).with_header(make_header("Content-Type", mime::from_path(&path)))
        }
        Reply::Redirect(location) => Response::from_data(Vec::new()).with_header(make_header("Location", location)),
        Reply::NoContent => Response::from_data(Vec::new())
            .with_header(make_header("Access-Control-Allow-Methods", "GET, POST, PUT, DELETE, OPTIONS"))
            .with_header(make_header("Access-Control-Allow-Headers", "Content-Type")),
        Reply::Unavailable => Response::from_data(b"503 Service Unavailable".to_vec())
            .with_header(make_header("Content-Type", mime::types::PLAIN)),
    };

    let response = response
        .with_status_code(status)
        .with_header(make_header("Access-Control-Allow-Origin", "*"));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).expect("static header is valid ASCII")
}
