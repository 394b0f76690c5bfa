use std::time::Duration;

use crate::executor::{HttpClient, HttpError, HttpRequestParts};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("read `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid spec url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("fetch `{url}`: {source}")]
    Http {
        url: String,
        #[source]
        source: HttpError,
    },
    #[error("fetch `{url}`: HTTP {status}")]
    Status { url: String, status: u16 },
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Reads spec bytes from an `http(s)://` URL or a local path.
pub async fn load_spec(
    http: &dyn HttpClient,
    location: &str,
    timeout: Duration,
    max_bytes: usize,
) -> Result<Vec<u8>, FetchError> {
    if is_remote(location) {
        let url = url::Url::parse(location).map_err(|source| FetchError::InvalidUrl {
            url: location.to_string(),
            source,
        })?;
        let req = HttpRequestParts {
            method: "GET".to_string(),
            url,
            headers: Vec::new(),
            body: Vec::new(),
        };
        let resp = http
            .send(req, timeout, max_bytes)
            .await
            .map_err(|source| FetchError::Http {
                url: location.to_string(),
                source,
            })?;
        if !(200..300).contains(&resp.status) {
            return Err(FetchError::Status {
                url: location.to_string(),
                status: resp.status,
            });
        }
        Ok(resp.body)
    } else {
        let path = location.strip_prefix("file://").unwrap_or(location);
        std::fs::read(path).map_err(|source| FetchError::Io {
            path: path.to_string(),
            source,
        })
    }
}
