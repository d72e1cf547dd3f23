//! Microsoft Graph access layer.
//!
//! - `credentials` - Client credentials flow and token cache
//! - `client` - Authenticated REST client with pagination
//! - `query` - OData query options
//! - `types` - OData envelopes and error bodies

pub mod client;
pub mod credentials;
pub mod query;
pub mod types;

pub use client::{GraphClient, GraphSettings};
pub use credentials::{CertificateCredential, ClientCredential, TokenCache};
pub use query::{quote, segment, ODataQuery, MAX_PAGE_SIZE};
