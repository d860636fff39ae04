//! Reporting API client
//!
//! Request/response types for the search analytics query endpoint plus the
//! HTTP transport. The transport makes exactly one attempt per page;
//! failures propagate to the job (no retry at this layer).

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serpline_core::{HttpError, SHARED_RUNTIME, http_client};

use crate::job::JobDescriptor;

/// Fixed page size for row pagination
pub const ROW_LIMIT: usize = 25_000;

/// One page request against the search analytics endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRequest {
    pub start_date: String,
    pub end_date: String,
    pub search_type: String,
    pub dimensions: Vec<String>,
    pub row_limit: usize,
    pub start_row: usize,
    /// Omitted entirely when unset; some backends reject an empty value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation_type: Option<String>,
}

impl AnalyticsRequest {
    /// Build the request for one page of one search type.
    ///
    /// The date window is a single day (start = end) and the row offset is
    /// `ROW_LIMIT * page_index`, with `page_index` counted per search type.
    pub fn for_page(
        job: &JobDescriptor,
        date: NaiveDate,
        search_type: &str,
        page_index: usize,
    ) -> Self {
        let day = date.format("%Y-%m-%d").to_string();
        Self {
            start_date: day.clone(),
            end_date: day,
            search_type: search_type.to_string(),
            dimensions: job.dimensions.clone(),
            row_limit: ROW_LIMIT,
            start_row: ROW_LIMIT * page_index,
            aggregation_type: if job.aggregation_mode.is_empty() {
                None
            } else {
                Some(job.aggregation_mode.clone())
            },
        }
    }
}

/// Query response. A missing `rows` field is the explicit "nothing more"
/// signal that ends pagination.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsResponse {
    #[serde(default)]
    pub rows: Option<Vec<ReportRow>>,
}

/// One raw metrics row from the API.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRow {
    pub keys: RowKeys,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

/// Dimension keys of a row: either already split into one value per
/// dimension, or the composite bracketed list encoding as a single string.
///
/// Both forms occur in the wild, so the deserializer accepts a JSON array
/// of strings or a plain string without an intermediate `Value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKeys {
    Split(Vec<String>),
    Composite(String),
}

impl<'de> Deserialize<'de> for RowKeys {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeysVisitor;

        impl<'de> serde::de::Visitor<'de> for KeysVisitor {
            type Value = RowKeys;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an array of strings or a composite key string")
            }

            fn visit_str<E: serde::de::Error>(self, s: &str) -> Result<Self::Value, E> {
                Ok(RowKeys::Composite(s.to_string()))
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut keys = Vec::with_capacity(seq.size_hint().unwrap_or(4));
                while let Some(key) = seq.next_element::<String>()? {
                    keys.push(key);
                }
                Ok(RowKeys::Split(keys))
            }
        }

        deserializer.deserialize_any(KeysVisitor)
    }
}

/// Blocking query interface against the reporting API.
pub trait SearchAnalyticsApi: Send + Sync {
    fn query(
        &self,
        property: &str,
        request: &AnalyticsRequest,
    ) -> Result<AnalyticsResponse, HttpError>;
}

/// HTTP implementation of [`SearchAnalyticsApi`].
///
/// POSTs the request body to `{base}/sites/{property}/searchAnalytics/query`
/// with an optional per-property bearer token.
pub struct HttpAnalyticsClient {
    base_url: String,
    tokens: HashMap<String, String>,
    default_token: Option<String>,
}

impl HttpAnalyticsClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens: HashMap::new(),
            default_token: None,
        }
    }

    /// Register a bearer token for one property.
    pub fn with_token(mut self, property: &str, token: impl Into<String>) -> Self {
        self.tokens.insert(property.to_string(), token.into());
        self
    }

    /// Fallback token for properties without their own.
    pub fn with_default_token(mut self, token: impl Into<String>) -> Self {
        self.default_token = Some(token.into());
        self
    }

    fn token_for(&self, property: &str) -> Option<&str> {
        self.tokens
            .get(property)
            .map(String::as_str)
            .or(self.default_token.as_deref())
    }

    fn endpoint(&self, property: &str) -> String {
        format!(
            "{}/sites/{}/searchAnalytics/query",
            self.base_url,
            encode_site(property)
        )
    }
}

impl SearchAnalyticsApi for HttpAnalyticsClient {
    fn query(
        &self,
        property: &str,
        request: &AnalyticsRequest,
    ) -> Result<AnalyticsResponse, HttpError> {
        let url = self.endpoint(property);
        let token = self.token_for(property);

        let result: Result<AnalyticsResponse, reqwest::Error> =
            SHARED_RUNTIME.handle().block_on(async {
                let mut req = http_client().post(&url).json(request);
                if let Some(token) = token {
                    req = req.bearer_auth(token);
                }
                let resp = req.send().await?.error_for_status()?;
                resp.json::<AnalyticsResponse>().await
            });
        result.map_err(HttpError::from_reqwest)
    }
}

/// Percent-encode a property URL for use as a single path segment.
fn encode_site(property: &str) -> String {
    let mut out = String::with_capacity(property.len() * 3);
    for byte in property.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
