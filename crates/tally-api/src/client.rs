// Async HTTP client for the aggregate endpoint.
//
// Base path: {base}/activities/aggregate
// Query: page, size, groupBy (csv, caller order), sort (optional)

use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{AggregatePage, ErrorBody};
use crate::transport::TransportConfig;

const AGGREGATE_PATH: &str = "activities/aggregate";

/// Parameters for one aggregate page request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateQuery {
    pub page: usize,
    pub size: usize,
    /// Grouping dimensions, sent comma-joined in this exact order.
    pub group_by: Vec<String>,
    /// `<field>,<asc|desc>`, sent only when present.
    pub sort: Option<String>,
}

impl AggregateQuery {
    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("page", self.page.to_string()), ("size", self.size.to_string())];
        if !self.group_by.is_empty() {
            params.push(("groupBy", self.group_by.join(",")));
        }
        if let Some(ref sort) = self.sort {
            params.push(("sort", sort.clone()));
        }
        params
    }
}

/// Raw client for `GET <base>/activities/aggregate`.
///
/// Performs exactly one HTTP round trip per call. Retry and caching are
/// the caller's business.
#[derive(Debug, Clone)]
pub struct AggregateClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AggregateClient {
    /// Build a client from a base URL (e.g. `http://localhost:8080/api`)
    /// and a transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The normalized base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    fn aggregate_url(&self) -> Result<Url, Error> {
        Ok(self.base_url.join(AGGREGATE_PATH)?)
    }

    /// Fetch one page of aggregated records.
    pub async fn fetch_aggregate(&self, query: &AggregateQuery) -> Result<AggregatePage, Error> {
        let url = self.aggregate_url()?;
        let params = query.to_params();
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(&params).send().await?;
        Self::handle_response(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response(resp: reqwest::Response) -> Result<AggregatePage, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&raw)
            .ok()
            .and_then(ErrorBody::into_message);

        Error::Api {
            status: status.as_u16(),
            message,
        }
    }
}
