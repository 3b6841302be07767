//! Typed SquashTM endpoints.
//!
//! Every call goes to the live service first. When fallback data is
//! configured and the live call ends in a transient failure (retries
//! exhausted, or the breaker is open), that one call is answered from the
//! fallback dataset; the next call tries the live service again.

use crate::client::{RequestOptions, ResilientHttpClient};
use crate::error::Result;
use crate::fallback::FallbackDataSource;
use crate::models::{collection, Folder, HalCollection, Page, PageRequest, Project, TestCase};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Projection requested for test-case listings.
pub const LISTING_FIELDS: &str = "name,reference,description,importance,nature,type,status";

/// Page sizes used by the listing endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageSizes {
    pub projects: u32,
    pub folders: u32,
    pub test_cases: u32,
}

impl Default for PageSizes {
    fn default() -> Self {
        Self {
            projects: 20,
            folders: 50,
            test_cases: 100,
        }
    }
}

pub struct SquashApi {
    client: Arc<ResilientHttpClient>,
    fallback: Option<Arc<FallbackDataSource>>,
    page_sizes: PageSizes,
}

impl SquashApi {
    pub fn new(client: Arc<ResilientHttpClient>) -> Self {
        Self {
            client,
            fallback: None,
            page_sizes: PageSizes::default(),
        }
    }

    pub fn with_fallback(mut self, data: FallbackDataSource) -> Self {
        self.fallback = Some(Arc::new(data));
        self
    }

    pub fn with_page_sizes(mut self, page_sizes: PageSizes) -> Self {
        self.page_sizes = page_sizes;
        self
    }

    pub fn client(&self) -> &Arc<ResilientHttpClient> {
        &self.client
    }

    pub fn page_sizes(&self) -> PageSizes {
        self.page_sizes
    }

    pub fn fallback_enabled(&self) -> bool {
        self.fallback.is_some()
    }

    /// Live GET, substituting fallback data for this call on a transient failure.
    pub async fn fetch<T: DeserializeOwned>(&self, endpoint: &str, options: &RequestOptions) -> Result<T> {
        self.fetch_with::<T, T, _>(endpoint, options, Ok).await
    }

    /// [`fetch`](Self::fetch) with a second decoding step. The live path runs
    /// `decode` inside the client, so a body whose items do not match counts
    /// as a breaker failure.
    pub async fn fetch_with<T, U, F>(&self, endpoint: &str, options: &RequestOptions, decode: F) -> Result<U>
    where
        T: DeserializeOwned,
        F: Fn(T) -> std::result::Result<U, serde_json::Error>,
    {
        let err = match self.client.get_with::<T, U, _>(endpoint, options, &decode).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !err.is_transient() {
            return Err(err);
        }

        let Some(body) = self
            .fallback
            .as_ref()
            .and_then(|data| data.respond(endpoint, options))
        else {
            return Err(err);
        };

        warn!(endpoint, error = %err, "Live request failed, serving fallback data");
        Ok(decode(serde_json::from_value(body)?)?)
    }

    pub async fn projects(&self, page: PageRequest) -> Result<Page<Project>> {
        self.page("/projects", page, None, collection::PROJECTS).await
    }

    /// First page of projects at the configured size.
    pub async fn root_projects(&self) -> Result<Vec<Project>> {
        let page = self.projects(PageRequest::first(self.page_sizes.projects)).await?;
        Ok(page.items)
    }

    pub async fn project_folders(&self, project_id: i64) -> Result<Vec<Folder>> {
        let endpoint = format!("/projects/{}/test-case-folders", project_id);
        let options = RequestOptions::new().with_page(0).with_size(self.page_sizes.folders);
        self.list(&endpoint, &options, collection::FOLDERS).await
    }

    pub async fn folder_subfolders(&self, folder_id: i64) -> Result<Vec<Folder>> {
        let endpoint = format!("/test-case-folders/{}/folders", folder_id);
        let options = RequestOptions::new().with_page(0).with_size(self.page_sizes.folders);
        self.list(&endpoint, &options, collection::FOLDERS).await
    }

    pub async fn folder_test_cases(&self, folder_id: i64) -> Result<Vec<TestCase>> {
        let endpoint = format!("/test-case-folders/{}/test-cases", folder_id);
        let options = RequestOptions::new()
            .with_page(0)
            .with_size(self.page_sizes.test_cases)
            .with_fields(LISTING_FIELDS);
        self.list(&endpoint, &options, collection::TEST_CASES).await
    }

    /// Paged listing of every test case in one project, folders flattened.
    pub async fn project_test_cases(&self, project_id: i64, page: PageRequest) -> Result<Page<TestCase>> {
        let endpoint = format!("/projects/{}/test-cases", project_id);
        self.page(&endpoint, page, Some(LISTING_FIELDS), collection::TEST_CASES)
            .await
    }

    /// Flat, paged listing across all projects.
    pub async fn test_cases(&self, page: PageRequest) -> Result<Page<TestCase>> {
        self.page("/test-cases", page, Some(LISTING_FIELDS), collection::TEST_CASES)
            .await
    }

    /// Full test case, steps included.
    pub async fn test_case(&self, id: i64) -> Result<TestCase> {
        self.fetch(&format!("/test-cases/{}", id), &RequestOptions::new())
            .await
    }

    async fn list<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        names: &[&str],
    ) -> Result<Vec<T>> {
        let items: Vec<T> = self
            .fetch_with(endpoint, options, |hal: HalCollection| hal.items(names))
            .await?;
        debug!(endpoint, count = items.len(), "Listed collection");
        Ok(items)
    }

    async fn page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: PageRequest,
        fields: Option<&str>,
        names: &[&str],
    ) -> Result<Page<T>> {
        let mut options = RequestOptions::new()
            .with_page(request.page)
            .with_size(request.size);
        if let Some(fields) = fields {
            options = options.with_fields(fields);
        }

        self.fetch_with(endpoint, &options, |hal: HalCollection| {
            let items: Vec<T> = hal.items(names)?;
            Ok(Page {
                total_elements: hal.total_elements(items.len()),
                items,
                request,
            })
        })
        .await
    }
}
