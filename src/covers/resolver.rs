//! Finds the cover path template that works for a given book.

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;

use crate::covers::candidate::{attempt_order, CoverPathCandidate};
use crate::covers::error::CoverError;
use crate::library::{is_auth_status, LibraryClient};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Cover bytes and the candidate that served them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    pub bytes: Bytes,
    pub content_type: String,
    pub candidate: usize,
}

/// Result of trying a single candidate.
enum Attempt {
    Found { bytes: Bytes, content_type: String },
    /// 404-class or non-image answer; try the next candidate.
    Missing { reason: String },
    /// Server trouble on this candidate; keep going but remember it.
    Degraded(CoverError),
    /// Stop probing and surface this error.
    Abort(CoverError),
}

pub struct PathResolver {
    candidates: Arc<[CoverPathCandidate]>,
}

impl PathResolver {
    pub fn new(candidates: Vec<CoverPathCandidate>) -> Self {
        Self {
            candidates: candidates.into(),
        }
    }

    pub fn candidates(&self) -> &[CoverPathCandidate] {
        &self.candidates
    }

    /// Fetch the cover for `book_id`, trying `hint` first.
    ///
    /// Authentication failures and unreachable-server errors abort the probe
    /// immediately. Any other failure moves on to the next candidate. When
    /// all candidates fail the result is `NotFound`, unless some candidate
    /// saw a server-side error, in which case that error is returned.
    pub async fn resolve_cover(
        &self,
        client: &LibraryClient,
        book_id: &str,
        hint: Option<usize>,
    ) -> Result<CoverImage, CoverError> {
        let mut degraded = None;

        for index in attempt_order(self.candidates.len(), hint) {
            let path = self.candidates[index].path_for(book_id);
            match attempt(client, &path).await {
                Attempt::Found { bytes, content_type } => {
                    tracing::debug!(
                        book_id = %book_id,
                        candidate = index,
                        hinted = hint == Some(index),
                        "Cover resolved"
                    );
                    return Ok(CoverImage {
                        bytes,
                        content_type,
                        candidate: index,
                    });
                }
                Attempt::Missing { reason } => {
                    tracing::debug!(book_id = %book_id, candidate = index, %reason, "Cover candidate missed");
                }
                Attempt::Degraded(err) => {
                    tracing::warn!(book_id = %book_id, candidate = index, error = %err, "Cover candidate failed");
                    degraded.get_or_insert(err);
                }
                Attempt::Abort(err) => return Err(err),
            }
        }

        Err(degraded.unwrap_or_else(|| CoverError::NotFound {
            book_id: book_id.to_string(),
        }))
    }
}

async fn attempt(client: &LibraryClient, path: &str) -> Attempt {
    let url = client.url(path);
    let response = match client.get(path).await {
        Ok(response) => response,
        Err(e) => return classify_transport(&url, &e),
    };

    let status = response.status();
    if is_auth_status(status) {
        return Attempt::Abort(CoverError::Authentication {
            status: Some(status.as_u16()),
            message: format!("{} returned {}", url, status),
            after_retry: false,
        });
    }
    if status.is_server_error() {
        return Attempt::Degraded(CoverError::Upstream {
            status: Some(status.as_u16()),
            message: format!("{} returned {}", url, status),
        });
    }
    if !status.is_success() {
        return Attempt::Missing {
            reason: format!("status {}", status),
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string();

    // Some servers answer a missing cover with a 200 login or error page.
    if !is_image_content_type(&content_type) {
        return Attempt::Missing {
            reason: format!("content-type {}", content_type),
        };
    }

    match response.bytes().await {
        Ok(bytes) if bytes.is_empty() => Attempt::Missing {
            reason: "empty body".to_string(),
        },
        Ok(bytes) => Attempt::Found { bytes, content_type },
        Err(e) => classify_transport(&url, &e),
    }
}

fn classify_transport(url: &str, err: &reqwest::Error) -> Attempt {
    match CoverError::from_transport(url, err) {
        err @ CoverError::Connectivity { .. } => Attempt::Abort(err),
        err => Attempt::Degraded(err),
    }
}

fn is_image_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("image/") || essence == FALLBACK_CONTENT_TYPE
}
