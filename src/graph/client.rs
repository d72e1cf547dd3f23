//! Microsoft Graph API HTTP client with pagination.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::graph::credentials::{CertificateCredential, ClientCredential, TokenCache};
use crate::graph::query::ODataQuery;
use crate::graph::types::{ODataError, ODataPage};
use crate::metrics::Metrics;

/// Graph API version every path is resolved against.
pub const API_VERSION: &str = "v1.0";

/// Everything needed to reach Graph as an application.
#[derive(Debug)]
pub struct GraphSettings {
    pub tenant_id: String,
    pub client_id: String,
    pub credential: ClientCredential,
    pub scopes: Vec<String>,
    pub graph_endpoint: String,
    pub authority: String,
    pub timeout: Duration,
}

impl GraphSettings {
    /// Build settings from validated configuration, loading the certificate if one is set.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let credential = match (&config.client_secret, &config.certificate_path) {
            (_, Some(path)) => ClientCredential::Certificate(CertificateCredential::from_file(
                path,
                config.certificate_pwd.as_ref(),
            )?),
            (Some(secret), None) => {
                ClientCredential::Secret(SecretString::from(secret.expose_secret().to_string()))
            }
            (None, None) => {
                return Err(Error::Config("No client credential configured".to_string()))
            }
        };

        Ok(Self {
            tenant_id: config.tenant_id.clone().unwrap_or_default(),
            client_id: config.client_id.clone().unwrap_or_default(),
            credential,
            scopes: config.scopes.clone(),
            graph_endpoint: config.graph_endpoint.clone(),
            authority: config.authority.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }
}

/// Microsoft Graph API client.
///
/// One instance is shared by every tool for the lifetime of the process.
#[derive(Debug)]
pub struct GraphClient {
    http_client: reqwest::Client,
    token_cache: Arc<TokenCache>,
    base_url: String,
    metrics: Arc<Metrics>,
}

impl GraphClient {
    /// Creates a new Graph client.
    pub fn new(settings: GraphSettings, metrics: Arc<Metrics>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(concat!("entraid-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let token_cache = TokenCache::new(
            http_client.clone(),
            &settings.authority,
            &settings.tenant_id,
            settings.client_id,
            settings.credential,
            &settings.scopes,
            metrics.clone(),
        );

        Ok(Self {
            http_client,
            token_cache: Arc::new(token_cache),
            base_url: format!(
                "{}/{}",
                settings.graph_endpoint.trim_end_matches('/'),
                API_VERSION
            ),
            metrics,
        })
    }

    /// Returns the base URL for Graph API requests.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shared token cache.
    pub fn token_cache(&self) -> &Arc<TokenCache> {
        &self.token_cache
    }

    /// Resolve a relative path, or pass through an absolute continuation link.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Canonical `@odata.id` of a directory object, used in `$ref` bodies.
    pub fn directory_object_ref(&self, id: &str) -> Value {
        serde_json::json!({
            "@odata.id": format!("{}/directoryObjects/{}", self.base_url, id)
        })
    }

    fn build<B: Serialize + ?Sized>(
        &self,
        method: &Method,
        url: &str,
        query: Option<&ODataQuery>,
        body: Option<&B>,
        token: &str,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .http_client
            .request(method.clone(), url)
            .bearer_auth(token);

        if let Some(query) = query {
            let pairs = query.to_pairs();
            if !pairs.is_empty() {
                request = request.query(&pairs);
            }
            if query.eventual_consistency {
                request = request.header("ConsistencyLevel", "eventual");
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    /// Send a request. A 401 drops the cached token and the request is
    /// retried once with a freshly acquired one.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        query: Option<&ODataQuery>,
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let mut retried = false;
        loop {
            let token = self.token_cache.get_token().await?;
            let request = self.build(&method, url, query, body, &token);

            self.metrics.inc_graph_requests();
            let response = request.send().await?;
            let status = response.status();
            debug!("{} {} -> {}", method, url, status);

            if status.is_success() {
                return Ok(response);
            }

            self.metrics.inc_graph_errors();
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.token_cache.invalidate(&token).await;
                if !retried {
                    retried = true;
                    warn!(
                        "Graph rejected the access token for {} {}; retrying with a new token",
                        method, url
                    );
                    continue;
                }
            }

            let error_body = response.text().await.unwrap_or_default();
            let err = match serde_json::from_str::<ODataError>(&error_body) {
                Ok(odata) => Error::graph(status.as_u16(), odata.error.code, odata.error.message),
                Err(_) => Error::graph(
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown"),
                    error_body,
                ),
            };
            if err.is_permission_denied() {
                warn!("Graph denied {} {}: check the application's API permissions", method, url);
            }
            return Err(err);
        }
    }

    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(Value::Null)?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Performs a GET request and deserializes the body.
    #[instrument(skip(self, query))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &ODataQuery) -> Result<T> {
        let response = self
            .send(Method::GET, &self.url(path), Some(query), None::<&()>)
            .await?;
        Self::read_json(response).await
    }

    /// Performs a POST request and deserializes the created entity.
    #[instrument(skip(self, body))]
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .send(Method::POST, &self.url(path), None, Some(body))
            .await?;
        Self::read_json(response).await
    }

    /// Performs a POST request whose response carries no body (`$ref` writes).
    #[instrument(skip(self, body))]
    pub async fn post_no_content<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send(Method::POST, &self.url(path), None, Some(body))
            .await?;
        Ok(())
    }

    /// Performs a PATCH request. Graph answers with 204 No Content.
    #[instrument(skip(self, body))]
    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        self.send(Method::PATCH, &self.url(path), None, Some(body))
            .await?;
        Ok(())
    }

    /// Performs a DELETE request.
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, &self.url(path), None, None::<&()>)
            .await?;
        Ok(())
    }

    /// Fetch a collection, following `@odata.nextLink`.
    ///
    /// With a limit, `$top` is set to `min(limit, 999)` unless the query
    /// already sets one, paging stops once `limit` items are gathered, and the
    /// result is truncated to `limit`. Without a limit every page is read.
    #[instrument(skip(self, query))]
    pub async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &ODataQuery,
        limit: Option<usize>,
    ) -> Result<Vec<T>> {
        if limit == Some(0) {
            return Err(Error::validation("limit must be at least 1"));
        }

        let mut query = query.clone();
        if let (Some(limit), None) = (limit, query.top) {
            query = query.top(limit);
        }

        // Continuation links already carry the query; only headers are resent.
        let link_query = ODataQuery {
            eventual_consistency: query.eventual_consistency,
            ..ODataQuery::default()
        };

        let mut items: Vec<T> = Vec::new();
        let mut url = self.url(path);
        let mut page_query = &query;
        let mut pages = 0usize;

        loop {
            let response = self
                .send(Method::GET, &url, Some(page_query), None::<&()>)
                .await?;
            let page: ODataPage<T> = Self::read_json(response).await?;
            pages += 1;
            items.extend(page.value);

            if limit.is_some_and(|limit| items.len() >= limit) {
                break;
            }
            match page.next_link {
                Some(next) => {
                    url = next;
                    page_query = &link_query;
                }
                None => break,
            }
        }

        if let Some(limit) = limit {
            items.truncate(limit);
        }
        debug!("Fetched {} items from {} in {} page(s)", items.len(), path, pages);
        Ok(items)
    }
}
