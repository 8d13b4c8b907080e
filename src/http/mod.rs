//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, body buffering)
//!     → request.rs (request ID, InboundRequest)
//!     → relay.rs (preflight, method gate, path inference, forward)
//!     → response.rs (status, CORS headers, body)
//!     → Send to client
//! ```

pub mod relay;
pub mod request;
pub mod response;
pub mod server;

pub use relay::{Relay, RelayOutcome};
pub use request::{InboundRequest, RelayRequestId, X_REQUEST_ID};
pub use response::RelayResponse;
pub use server::{HttpServer, ServerError};
