//! # netopt-reqwest
//!
//! [`reqwest`] adapters for netopt:
//!
//! - [`ReqwestTransport`] implements [`netopt_core::Transport`] for the
//!   request cache engine. Non-success statuses become
//!   [`TransportError::HttpStatus`](netopt_core::TransportError::HttpStatus),
//!   timeouts become `Timeout` and everything else `NetworkFailure`.
//! - [`ReqwestNetwork`] implements [`netopt_worker::Network`] for the service
//!   worker. Every status is a response; only a missing response is an error.
//!
//! Both accept a plain [`reqwest::Client`] or a
//! [`reqwest_middleware::ClientWithMiddleware`].
//!
//! ```no_run
//! use netopt::NetworkOptimizer;
//! use netopt_reqwest::ReqwestTransport;
//!
//! # fn build() -> Result<(), url::ParseError> {
//! let transport = ReqwestTransport::builder()
//!     .base_url("https://api.example.org/".parse()?)
//!     .header("x-client", "netopt")
//!     .build();
//! let optimizer = NetworkOptimizer::new(transport);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod network;
mod transport;

pub use client::HttpClient;
pub use network::ReqwestNetwork;
pub use transport::{ReqwestTransport, ReqwestTransportBuilder};

/// Per-call timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(45);
