//! Wire models for the SquashTM REST API.
//!
//! Listing endpoints may be called with a field projection, so everything
//! beyond `id` and `name` is optional or defaulted.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

pub type Links = BTreeMap<String, Link>;

/// `page` block of a paginated HAL response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub number: u32,
}

/// HAL collection envelope: `{ _embedded: { <name>: [...] }, _links, page? }`.
///
/// Items stay as raw JSON until a caller asks for a named collection, since
/// the collection key differs per endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HalCollection {
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(rename = "_links", default)]
    pub links: Links,
    #[serde(default)]
    pub page: Option<PageInfo>,
}

impl HalCollection {
    /// Deserialize the first present collection among `names`.
    ///
    /// A missing `_embedded` block, or none of the names present, is an empty
    /// collection: the service omits `_embedded` when there is nothing to list.
    pub fn items<T: DeserializeOwned>(&self, names: &[&str]) -> Result<Vec<T>, serde_json::Error> {
        let Some(embedded) = &self.embedded else {
            return Ok(Vec::new());
        };
        match names.iter().find_map(|name| embedded.get(*name)) {
            Some(value) => Vec::<T>::deserialize(value),
            None => Ok(Vec::new()),
        }
    }

    pub fn total_elements(&self, item_count: usize) -> u64 {
        self.page
            .map(|p| p.total_elements)
            .unwrap_or(item_count as u64)
    }
}

/// Embedded collection names, with the dashed spelling some server versions use.
pub mod collection {
    pub const PROJECTS: &[&str] = &["projects"];
    pub const FOLDERS: &[&str] = &["folders", "test-case-folders"];
    pub const TEST_CASES: &[&str] = &["testCases", "test-cases"];
}

/// `{id, name}` reference to another entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub by: String,
    pub on: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLabel {
    pub code: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub template: bool,
    #[serde(default)]
    pub test_case_natures: Vec<String>,
    #[serde(default)]
    pub test_case_types: Vec<String>,
    #[serde(default)]
    pub allow_tc_modif_from_exec: bool,
    #[serde(default)]
    pub allow_automation_workflow: bool,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project: Option<EntityRef>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub parent: Option<EntityRef>,
    #[serde(default)]
    pub created: Option<AuditStamp>,
    #[serde(default)]
    pub last_modified: Option<AuditStamp>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

/// Values the server adds later land in `Unknown` instead of failing the
/// whole listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Importance {
    Low,
    Medium,
    High,
    VeryHigh,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestCaseStatus {
    WorkInProgress,
    UnderReview,
    Approved,
    Obsolete,
    ToBeUpdated,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    pub id: i64,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub expected_result: String,
    #[serde(default)]
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub prerequisite: Option<String>,
    #[serde(default)]
    pub importance: Option<Importance>,
    #[serde(default)]
    pub nature: Option<CodeLabel>,
    #[serde(rename = "type", default)]
    pub kind: Option<CodeLabel>,
    #[serde(default)]
    pub status: Option<TestCaseStatus>,
    #[serde(default)]
    pub project: Option<EntityRef>,
    #[serde(default)]
    pub folder: Option<EntityRef>,
    #[serde(default)]
    pub created: Option<AuditStamp>,
    #[serde(default)]
    pub last_modified: Option<AuditStamp>,
    #[serde(default)]
    pub steps: Vec<TestStep>,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    pub fn first(size: u32) -> Self {
        Self { page: 0, size }
    }

    /// Map a virtual-grid row window `[start_row, end_row)` onto a page.
    ///
    /// ```rust
    /// use squash_client::models::PageRequest;
    ///
    /// assert_eq!(PageRequest::for_window(200, 300, 100), PageRequest::new(2, 100));
    /// assert_eq!(PageRequest::for_window(0, 50, 100), PageRequest::new(0, 50));
    /// ```
    pub fn for_window(start_row: u32, end_row: u32, block_size: u32) -> Self {
        let page = start_row.checked_div(block_size).unwrap_or(0);
        let size = end_row.saturating_sub(start_row);
        let size = if size == 0 { block_size.max(1) } else { size };
        Self { page, size }
    }
}

/// One page of a flat listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_elements: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
