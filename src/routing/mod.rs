//! Routing subsystem: decides which upstream route a request was meant for.
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → resolver.rs (path hints in priority order)
//!     → shape.rs (body shape, when no hint yields a route)
//!     → default route
//!     → UpstreamPath
//! ```

pub mod resolver;
pub mod shape;

use std::fmt;

pub use resolver::{PathResolver, PathSource, Resolution};
pub use shape::BodyShape;

/// Route on the upstream API, relative to its base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamPath {
    /// `/Auth/login`
    Login,
    /// `/Auth/register`
    Register,
    /// Any other route, as extracted from a path hint.
    Other(String),
}

impl UpstreamPath {
    pub fn as_str(&self) -> &str {
        match self {
            UpstreamPath::Login => "/Auth/login",
            UpstreamPath::Register => "/Auth/register",
            UpstreamPath::Other(path) => path,
        }
    }
}

impl fmt::Display for UpstreamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
