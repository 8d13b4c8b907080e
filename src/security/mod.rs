//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (cap the buffered body)
//!     → relay
//! Outgoing response:
//!     → headers.rs (attach CORS headers)
//! ```
//!
//! # Design Decisions
//! - Callers are not authenticated
//! - Every response, including local errors, carries the allow-origin header

pub mod headers;
pub mod limits;

pub use headers::CorsHeaders;
pub use limits::{read_body, BodyError};
