//! REST client for the registration backend.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{BasicInfo, Department, Details, Location, Suggestion},
    protocol::{
        basic_info_route, departments_route, details_route, locations_route, NameLikeQuery,
        PageQuery,
    },
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClientApiError {
    #[error("failed to {operation}: {source}")]
    Transport {
        operation: &'static str,
        source: reqwest::Error,
    },
    #[error("failed to {operation}: server responded with {status}")]
    Status {
        operation: &'static str,
        status: StatusCode,
    },
    #[error("failed to {operation}: malformed response body: {source}")]
    Decode {
        operation: &'static str,
        source: reqwest::Error,
    },
}

impl ClientApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientApiError::Status { status, .. } => Some(*status),
            ClientApiError::Transport { source, .. } | ClientApiError::Decode { source, .. } => {
                source.status()
            }
        }
    }
}

#[async_trait]
pub trait EmployeeApi: Send + Sync {
    async fn search_departments(&self, query: &str) -> Result<Vec<Department>>;
    async fn search_locations(&self, query: &str) -> Result<Vec<Location>>;
    async fn list_basic_info_page(&self, page: PageQuery) -> Result<Vec<BasicInfo>>;
    async fn list_all_basic_info(&self) -> Result<Vec<BasicInfo>>;
    async fn create_basic_info(&self, info: &BasicInfo) -> Result<BasicInfo>;
    async fn list_details_page(&self, page: PageQuery) -> Result<Vec<Details>>;
    async fn list_all_details(&self) -> Result<Vec<Details>>;
    async fn create_details(&self, details: &Details) -> Result<Details>;
}

/// Talks to the JSON backend. Basic info and departments live on one base URL,
/// details and locations on another, which may be the same server.
pub struct HttpEmployeeApi {
    http: Client,
    basic_info_url: String,
    details_url: String,
}

impl HttpEmployeeApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self::with_endpoints(base_url.clone(), base_url)
    }

    pub fn with_endpoints(basic_info_url: impl Into<String>, details_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            basic_info_url: trim_base(basic_info_url.into()),
            details_url: trim_base(details_url.into()),
        }
    }

    async fn send_json<T: DeserializeOwned>(
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ClientApiError> {
        let response = request
            .send()
            .await
            .map_err(|source| ClientApiError::Transport { operation, source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientApiError::Status { operation, status });
        }
        debug!(operation, %status, "backend request succeeded");
        response
            .json::<T>()
            .await
            .map_err(|source| ClientApiError::Decode { operation, source })
    }
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}

#[async_trait]
impl EmployeeApi for HttpEmployeeApi {
    async fn search_departments(&self, query: &str) -> Result<Vec<Department>> {
        let request = self
            .http
            .get(format!("{}{}", self.basic_info_url, departments_route()))
            .query(&NameLikeQuery {
                name_like: query.to_string(),
            });
        Ok(Self::send_json("fetch departments", request).await?)
    }

    async fn search_locations(&self, query: &str) -> Result<Vec<Location>> {
        let request = self
            .http
            .get(format!("{}{}", self.details_url, locations_route()))
            .query(&NameLikeQuery {
                name_like: query.to_string(),
            });
        Ok(Self::send_json("fetch locations", request).await?)
    }

    async fn list_basic_info_page(&self, page: PageQuery) -> Result<Vec<BasicInfo>> {
        let request = self
            .http
            .get(format!("{}{}", self.basic_info_url, basic_info_route()))
            .query(&page);
        Ok(Self::send_json("fetch basic info", request).await?)
    }

    async fn list_all_basic_info(&self) -> Result<Vec<BasicInfo>> {
        let request = self
            .http
            .get(format!("{}{}", self.basic_info_url, basic_info_route()));
        Ok(Self::send_json("fetch all basic info", request).await?)
    }

    async fn create_basic_info(&self, info: &BasicInfo) -> Result<BasicInfo> {
        let request = self
            .http
            .post(format!("{}{}", self.basic_info_url, basic_info_route()))
            .json(info);
        Ok(Self::send_json("post basic info", request).await?)
    }

    async fn list_details_page(&self, page: PageQuery) -> Result<Vec<Details>> {
        let request = self
            .http
            .get(format!("{}{}", self.details_url, details_route()))
            .query(&page);
        Ok(Self::send_json("fetch details", request).await?)
    }

    async fn list_all_details(&self) -> Result<Vec<Details>> {
        let request = self
            .http
            .get(format!("{}{}", self.details_url, details_route()));
        Ok(Self::send_json("fetch all details", request).await?)
    }

    async fn create_details(&self, details: &Details) -> Result<Details> {
        let request = self
            .http
            .post(format!("{}{}", self.details_url, details_route()))
            .json(details);
        Ok(Self::send_json("post details", request).await?)
    }
}

/// Query-to-candidates lookup behind an autocomplete field.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>>;
}

pub struct DepartmentSuggestions(pub Arc<dyn EmployeeApi>);

#[async_trait]
impl SuggestionSource for DepartmentSuggestions {
    async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>> {
        self.0.search_departments(query).await
    }
}

pub struct LocationSuggestions(pub Arc<dyn EmployeeApi>);

#[async_trait]
impl SuggestionSource for LocationSuggestions {
    async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>> {
        self.0.search_locations(query).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
