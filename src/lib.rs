//! # Devo Alerts
//!
//! A Rust client library for managing alert definitions through the
//! [Devo Alerting API](https://docs.devo.com/confluence/ndt/latest/api-reference/alerting-api).
//!
//! ## Features
//!
//! - List, create, update and delete alert definitions
//! - Enable or disable alert definitions in bulk
//! - US and EU regional endpoints, or any endpoint override
//! - Raw response passthrough for callers that parse bodies themselves
//! - Non-success responses surfaced as [`DevoError::Api`] with status and body
//!
//! ## Example
//!
//! ```rust,no_run
//! use devo_alerts::{
//!     CorrelationContext, CorrelationTrigger, CreateRequest, DevoClient, StatusUpdateRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DevoClient::new("my-standalone-token")?;
//!
//!     let alert = CreateRequest::new(
//!         "HighErrorRate",
//!         "lib.my.alerts",
//!         CorrelationContext::new(
//!             "from siem.logtrust.web.activity where statusCode >= 500 select *",
//!             CorrelationTrigger::new("each"),
//!         )
//!         .with_priority(5),
//!     )
//!     .with_description("Web activity returned a server error");
//!
//!     let created = client.alerts().create(&alert).await?;
//!     client
//!         .alerts()
//!         .set_status(&StatusUpdateRequest::disable([created.id]))
//!         .await?;
//!     Ok(())
//! }
//! ```

mod alerts;
mod client;
mod endpoint;
mod errors;
mod query;
mod serde_helpers;
mod types;

pub use alerts::Alerts;
pub use client::{DevoClient, DevoClientBuilder, AUTH_HEADER, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
pub use endpoint::{
    Endpoint, Region, ALERTS_API_EU_DEFAULT_ENDPOINT, ALERTS_API_US_DEFAULT_ENDPOINT,
};
pub use errors::{DevoError, Result};
pub use types::{
    AlertDefinition, CorrelationContext, CorrelationTrigger, CreateRequest, DeleteRequest,
    ListRequest, StatusUpdateRequest, UpdateRequest,
};
