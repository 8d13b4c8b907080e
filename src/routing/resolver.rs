//! Upstream path inference.
//!
//! # Responsibilities
//! - Pick the first non-empty path hint (request path, forwarding headers)
//! - Map a hint onto a known upstream route or extract the part after `/api`
//! - Fall back to body shape sniffing, then to the login route
//!
//! # Design Decisions
//! - Hints are checked in priority order; only the first non-empty one is used
//! - Literal substring matching, no regex
//! - Resolution never fails; the default is logged as a guess

use std::fmt;

use crate::config::schema::ResolverConfig;
use crate::http::request::InboundRequest;
use crate::routing::shape::BodyShape;
use crate::routing::UpstreamPath;

/// Header set by the static host with the path before its rewrite.
pub const ORIGINAL_PATH_HEADER: &str = "x-netlify-original-path";

/// Header set by fronting proxies with the original request URI.
pub const FORWARDED_URI_HEADER: &str = "x-forwarded-uri";

pub const REFERER_HEADER: &str = "referer";

const LOGIN_MARKER: &str = "/api/Auth/login";
const REGISTER_MARKER: &str = "/api/Auth/register";
const API_PREFIX: &str = "/api";
const API_MARKER: &str = "/api/";

/// Where a resolved path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSource {
    /// The inbound request URI path.
    RequestPath,
    /// A forwarding header.
    Header(&'static str),
    /// The body shape.
    Body,
    /// Nothing matched.
    Default,
}

impl fmt::Display for PathSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSource::RequestPath => f.write_str("request-path"),
            PathSource::Header(name) => write!(f, "header:{}", name),
            PathSource::Body => f.write_str("body"),
            PathSource::Default => f.write_str("default"),
        }
    }
}

/// Outcome of path inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub path: UpstreamPath,
    pub source: PathSource,
}

/// A source of candidate path text on the inbound request.
pub trait PathHint: Send + Sync + fmt::Debug {
    /// Candidate text, if this hint has one.
    fn candidate(&self, req: &InboundRequest) -> Option<String>;

    /// Label used when this hint wins.
    fn source(&self) -> PathSource;
}

/// Reads a request header, optionally cutting it at the first `?`.
#[derive(Debug, Clone)]
pub struct HeaderHint {
    name: &'static str,
    strip_query: bool,
}

impl HeaderHint {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            strip_query: false,
        }
    }

    /// Keep only the part of the value before the first `?`.
    pub fn strip_query(mut self) -> Self {
        self.strip_query = true;
        self
    }
}

impl PathHint for HeaderHint {
    fn candidate(&self, req: &InboundRequest) -> Option<String> {
        let value = req.header(self.name)?;
        if self.strip_query {
            value.split('?').next().map(str::to_string)
        } else {
            Some(value)
        }
    }

    fn source(&self) -> PathSource {
        PathSource::Header(self.name)
    }
}

/// Uses the inbound URI path, but only when it carries the API marker.
///
/// Without the marker the path says nothing about the upstream route (the
/// relay may be mounted anywhere), so later hints still get a chance.
#[derive(Debug, Clone, Default)]
pub struct RequestPathHint;

impl PathHint for RequestPathHint {
    fn candidate(&self, req: &InboundRequest) -> Option<String> {
        req.path
            .contains(API_MARKER)
            .then(|| req.path.clone())
    }

    fn source(&self) -> PathSource {
        PathSource::RequestPath
    }
}

/// Map candidate text onto an upstream path.
///
/// Known auth routes win over generic extraction. Generic extraction takes
/// everything after the first `/api` that is followed by `/`, up to the next
/// `?` or the end of the text.
pub fn match_candidate(candidate: &str) -> Option<UpstreamPath> {
    if candidate.contains(LOGIN_MARKER) {
        return Some(UpstreamPath::Login);
    }
    if candidate.contains(REGISTER_MARKER) {
        return Some(UpstreamPath::Register);
    }

    let start = candidate.find(API_MARKER)? + API_PREFIX.len();
    let rest = &candidate[start..];
    let end = rest.find('?').unwrap_or(rest.len());
    Some(UpstreamPath::Other(rest[..end].to_string()))
}

/// Ordered path inference over a fixed set of hints.
#[derive(Debug)]
pub struct PathResolver {
    hints: Vec<Box<dyn PathHint>>,
}

impl PathResolver {
    /// Create a resolver that checks `hints` in order.
    pub fn new(hints: Vec<Box<dyn PathHint>>) -> Self {
        Self { hints }
    }

    /// Build the standard hint chain.
    pub fn from_config(config: &ResolverConfig) -> Self {
        let mut hints: Vec<Box<dyn PathHint>> = Vec::with_capacity(4);
        if config.trust_request_path {
            hints.push(Box::new(RequestPathHint));
        }
        hints.push(Box::new(HeaderHint::new(ORIGINAL_PATH_HEADER)));
        hints.push(Box::new(HeaderHint::new(FORWARDED_URI_HEADER)));
        hints.push(Box::new(HeaderHint::new(REFERER_HEADER).strip_query()));
        Self::new(hints)
    }

    /// Infer the upstream path for a request. Never fails.
    pub fn resolve(&self, req: &InboundRequest) -> Resolution {
        let hinted = self.hints.iter().find_map(|hint| {
            hint.candidate(req)
                .filter(|candidate| !candidate.is_empty())
                .map(|candidate| (hint.source(), candidate))
        });

        if let Some((source, candidate)) = hinted {
            if let Some(path) = match_candidate(&candidate) {
                return Resolution { path, source };
            }
            tracing::debug!(
                source = %source,
                candidate = %candidate,
                "Path hint carried no API route"
            );
        }

        if !req.body.is_empty() {
            if let Some(path) = BodyShape::sniff(&req.body).upstream_path() {
                return Resolution {
                    path,
                    source: PathSource::Body,
                };
            }
        }

        tracing::warn!(
            path = %UpstreamPath::Login,
            "No path signal found, falling back to default route"
        );
        Resolution {
            path: UpstreamPath::Login,
            source: PathSource::Default,
        }
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::from_config(&ResolverConfig::default())
    }
}
