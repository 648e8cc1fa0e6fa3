//! HTTP seam for the hosted backend

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use crate::store::error::{RepoError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
        }
    }
}

/// One call against a table endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct RestRequest {
    pub method: Method,
    pub table: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RestRequest {
    pub fn get(table: &str) -> Self {
        Self {
            method: Method::Get,
            table: table.to_string(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(table: &str, body: Value) -> Self {
        Self {
            method: Method::Post,
            table: table.to_string(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn patch(table: &str, body: Value) -> Self {
        Self {
            method: Method::Patch,
            table: table.to_string(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query.push((key.to_string(), value.into()));
        self
    }

    /// Value of the first query parameter named `key`
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestResponse {
    pub status: u16,
    pub body: String,
}

/// Sends table requests to the hosted service.
///
/// Implementations report transport failures (no connection, timeout) as
/// `BackendUnavailable`; HTTP error statuses are returned as responses.
pub trait Transport {
    fn send(&self, request: &RestRequest) -> Result<RestResponse>;
}

/// Blocking `reqwest` transport for a PostgREST-style REST root
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    /// `base_url` is the REST root, e.g. `https://<project>.supabase.co/rest/v1`.
    /// `timeout = None` means requests never time out.
    pub fn new(base_url: &str, api_key: String, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RepoError::unavailable)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &RestRequest) -> Result<RestResponse> {
        let url = format!("{}/{}", self.base_url, request.table);
        tracing::debug!(method = request.method.as_str(), url = %url, query = ?request.query, "hosted request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Patch => self.client.patch(&url),
        };
        builder = builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .query(&request.query);
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().map_err(|e| {
            if e.is_connect() || e.is_timeout() || e.is_request() {
                RepoError::unavailable(e)
            } else {
                RepoError::Query {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| RepoError::Query {
            message: e.to_string(),
        })?;
        Ok(RestResponse { status, body })
    }
}
