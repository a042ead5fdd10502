use reqwest::StatusCode;
use thiserror::Error;

/// Failures of a single backend request.
///
/// These never leave the remote layer: every [`crate::ExplorerApi`] method
/// logs them and degrades to `None` or an empty list.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("{route} returned no result")]
    NotFound { route: &'static str },

    #[error("{route} failed with status {status}: {body}")]
    Status {
        route: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("request to {route} failed")]
    Transport {
        route: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode {route} response")]
    Decode {
        route: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{route} returned an unusable value: {reason}")]
    Invalid { route: &'static str, reason: String },
}

/// User input rejected before any request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("input is empty")]
    Blank,
}

/// Map rendering rejected its input.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MapError {
    #[error("invalid coordinates ({lat}, {lon})")]
    InvalidCoordinates { lat: f64, lon: f64 },
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
