//! Cross-origin allow-list for the `/api` routes.
//!
//! Origins are configured as exact values (`https://app.example.com`) or as
//! subdomain wildcards (`https://*.netlify.app`). Credentials are never allowed.

use http::header::{HeaderValue, CONTENT_TYPE};
use http::{request, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OriginPatternError {
    #[error("missing scheme (expected http:// or https://)")]
    MissingScheme,
    #[error("unsupported scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("missing host")]
    EmptyHost,
    #[error("origins must not contain a path")]
    HasPath,
    #[error("'*' is only allowed as a leading '*.' subdomain wildcard")]
    MisplacedWildcard,
}

/// A single allowed origin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPattern {
    /// Matches one origin exactly (case-insensitive)
    Exact(String),
    /// Matches any origin under `scheme` whose host ends with `suffix`
    /// (which starts with '.') and has at least one label before it
    Subdomain { scheme: String, suffix: String },
}

impl OriginPattern {
    pub fn parse(raw: &str) -> Result<Self, OriginPatternError> {
        let normalized = raw.trim().to_ascii_lowercase();
        let (scheme, host) = normalized
            .split_once("://")
            .ok_or(OriginPatternError::MissingScheme)?;
        // Tolerate one trailing slash
        let host = host.strip_suffix('/').unwrap_or(host);

        if scheme != "http" && scheme != "https" {
            return Err(OriginPatternError::UnsupportedScheme(scheme.to_string()));
        }
        if host.is_empty() || host.chars().any(char::is_whitespace) {
            return Err(OriginPatternError::EmptyHost);
        }
        if host.contains('/') {
            return Err(OriginPatternError::HasPath);
        }

        match host.strip_prefix('*') {
            Some(rest) => {
                if !rest.starts_with('.') || rest.len() < 2 || rest.contains('*') {
                    return Err(OriginPatternError::MisplacedWildcard);
                }
                Ok(Self::Subdomain {
                    scheme: scheme.to_string(),
                    suffix: rest.to_string(),
                })
            }
            None if host.contains('*') => Err(OriginPatternError::MisplacedWildcard),
            None => Ok(Self::Exact(format!("{scheme}://{host}"))),
        }
    }

    /// Check a browser-supplied `Origin` header value against this pattern
    pub fn matches(&self, origin: &str) -> bool {
        let origin = origin.to_ascii_lowercase();
        match self {
            Self::Exact(allowed) => *allowed == origin,
            Self::Subdomain { scheme, suffix } => {
                let Some((origin_scheme, host)) = origin.split_once("://") else {
                    return false;
                };
                if origin_scheme != scheme {
                    return false;
                }
                match host.strip_suffix(suffix.as_str()) {
                    Some(label) => {
                        !label.is_empty()
                            && !label.starts_with('.')
                            && !label.ends_with('.')
                            && !label.contains(['/', ':'])
                    }
                    None => false,
                }
            }
        }
    }
}

/// Build the CORS layer for the given allow-list
pub fn cors_layer(patterns: Vec<OriginPattern>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &request::Parts| {
                origin
                    .to_str()
                    .map(|origin| patterns.iter().any(|p| p.matches(origin)))
                    .unwrap_or(false)
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(false)
}
