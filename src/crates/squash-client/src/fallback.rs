//! Static substitute dataset.
//!
//! Answers the same endpoints as the live service with bodies of the same
//! shape, so callers parse fallback data through exactly the code path they
//! use for live responses.

use crate::client::RequestOptions;
use crate::models::{
    AuditStamp, CodeLabel, EntityRef, Folder, Importance, Link, Links, PageInfo, Project, TestCase,
    TestCaseStatus, TestStep,
};
use serde::Serialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Default)]
pub struct FallbackDataSource {
    projects: Vec<Project>,
    folders: Vec<Folder>,
    test_cases: Vec<TestCase>,
}

impl FallbackDataSource {
    pub fn new(projects: Vec<Project>, folders: Vec<Folder>, test_cases: Vec<TestCase>) -> Self {
        Self {
            projects,
            folders,
            test_cases,
        }
    }

    /// Small demo hierarchy: two projects, two folders, two test cases.
    pub fn sample() -> Self {
        let project_one = EntityRef {
            id: 1,
            name: "Sample Project 1".into(),
        };

        let projects = vec![
            Project {
                id: 1,
                name: "Sample Project 1".into(),
                description: Some("Demo project for testing".into()),
                label: Some("PROJ1".into()),
                active: true,
                template: false,
                test_case_natures: vec!["FUNCTIONAL".into()],
                test_case_types: vec!["MANUAL".into()],
                allow_tc_modif_from_exec: true,
                allow_automation_workflow: false,
                links: links(&[("self", "/projects/1")]),
            },
            Project {
                id: 2,
                name: "Sample Project 2".into(),
                description: Some("Another demo project".into()),
                label: Some("PROJ2".into()),
                active: true,
                template: false,
                test_case_natures: vec!["FUNCTIONAL".into(), "NON_FUNCTIONAL".into()],
                test_case_types: vec!["MANUAL".into(), "AUTOMATED".into()],
                allow_tc_modif_from_exec: true,
                allow_automation_workflow: true,
                links: links(&[("self", "/projects/2")]),
            },
        ];

        let folders = [
            (101, "Authentication Tests", "Tests related to user authentication"),
            (102, "API Tests", "Tests for API functionality"),
        ]
        .into_iter()
        .map(|(id, name, description)| {
            let self_href = format!("/test-case-folders/{}", id);
            let content_href = format!("{}/content", self_href);
            Folder {
                id,
                name: name.into(),
                description: Some(description.into()),
                project: Some(project_one.clone()),
                path: Some(format!("/Sample Project 1/{}", name)),
                parent: None,
                created: Some(stamp("2024-01-01T00:00:00Z")),
                last_modified: Some(stamp("2024-01-15T00:00:00Z")),
                links: links(&[
                    ("self", self_href.as_str()),
                    ("project", "/projects/1"),
                    ("content", content_href.as_str()),
                ]),
            }
        })
        .collect();

        let test_cases = vec![
            TestCase {
                id: 1001,
                name: "Login with valid credentials".into(),
                reference: Some("TC-001".into()),
                description: Some("Test successful login with valid username and password".into()),
                prerequisite: Some("User account exists".into()),
                importance: Some(Importance::High),
                nature: Some(code_label("FUNCTIONAL", "Functional")),
                kind: Some(code_label("MANUAL", "Manual")),
                status: Some(TestCaseStatus::Approved),
                project: Some(project_one.clone()),
                folder: Some(EntityRef {
                    id: 101,
                    name: "Authentication Tests".into(),
                }),
                created: Some(stamp("2024-01-01T00:00:00Z")),
                last_modified: Some(stamp("2024-01-15T00:00:00Z")),
                steps: vec![
                    step(10001, 1, "Navigate to login page", "Login page is displayed"),
                    step(10002, 2, "Enter valid username and password", "Credentials are accepted"),
                ],
                links: links(&[
                    ("self", "/test-cases/1001"),
                    ("project", "/projects/1"),
                    ("steps", "/test-cases/1001/steps"),
                ]),
            },
            TestCase {
                id: 1002,
                name: "List projects returns first page".into(),
                reference: Some("TC-002".into()),
                description: Some("GET /projects answers with a paginated collection".into()),
                prerequisite: None,
                importance: Some(Importance::Medium),
                nature: Some(code_label("FUNCTIONAL", "Functional")),
                kind: Some(code_label("AUTOMATED", "Automated")),
                status: Some(TestCaseStatus::UnderReview),
                project: Some(project_one),
                folder: Some(EntityRef {
                    id: 102,
                    name: "API Tests".into(),
                }),
                created: Some(stamp("2024-01-02T00:00:00Z")),
                last_modified: Some(stamp("2024-01-16T00:00:00Z")),
                steps: vec![step(10003, 1, "Request /projects?page=0", "HTTP 200 with _embedded.projects")],
                links: links(&[
                    ("self", "/test-cases/1002"),
                    ("project", "/projects/1"),
                    ("steps", "/test-cases/1002/steps"),
                ]),
            },
        ];

        Self::new(projects, folders, test_cases)
    }

    /// Body the live service would return for `endpoint`, or `None` when the
    /// dataset has no answer for it.
    pub fn respond(&self, endpoint: &str, options: &RequestOptions) -> Option<Value> {
        let path = endpoint.split('?').next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["projects"] => Some(collection(endpoint, "projects", &self.projects, options)),
            ["projects", id, "test-case-folders"] => {
                let id = id.parse::<i64>().ok()?;
                let folders: Vec<&Folder> = self
                    .folders
                    .iter()
                    .filter(|f| f.project.as_ref().map(|p| p.id) == Some(id) && f.parent.is_none())
                    .collect();
                Some(collection(endpoint, "folders", &folders, options))
            }
            ["test-case-folders", id, "folders"] => {
                let id = id.parse::<i64>().ok()?;
                let folders: Vec<&Folder> = self
                    .folders
                    .iter()
                    .filter(|f| f.parent.as_ref().map(|p| p.id) == Some(id))
                    .collect();
                Some(collection(endpoint, "folders", &folders, options))
            }
            ["test-case-folders", id, "test-cases"] => {
                let id = id.parse::<i64>().ok()?;
                let cases: Vec<&TestCase> = self
                    .test_cases
                    .iter()
                    .filter(|c| c.folder.as_ref().map(|f| f.id) == Some(id))
                    .collect();
                Some(collection(endpoint, "testCases", &cases, options))
            }
            ["projects", id, "test-cases"] => {
                let id = id.parse::<i64>().ok()?;
                let cases: Vec<&TestCase> = self
                    .test_cases
                    .iter()
                    .filter(|c| c.project.as_ref().map(|p| p.id) == Some(id))
                    .collect();
                Some(collection(endpoint, "testCases", &cases, options))
            }
            ["test-cases"] => Some(collection(endpoint, "testCases", &self.test_cases, options)),
            ["test-cases", id] => {
                let id = id.parse::<i64>().ok()?;
                let case = self.test_cases.iter().find(|c| c.id == id)?;
                serde_json::to_value(case).ok()
            }
            _ => None,
        }
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn test_cases(&self) -> &[TestCase] {
        &self.test_cases
    }
}

/// HAL envelope with a `page` block derived from the requested slice.
fn collection<T: Serialize>(endpoint: &str, name: &str, items: &[T], options: &RequestOptions) -> Value {
    let total = items.len();
    let size = options.size.map(|s| s as usize).unwrap_or(total.max(1));
    let number = options.page.unwrap_or(0) as usize;
    let slice: Vec<&T> = items.iter().skip(number.saturating_mul(size)).take(size).collect();

    let page = PageInfo {
        size: size as u32,
        total_elements: total as u64,
        total_pages: total.div_ceil(size.max(1)) as u32,
        number: number as u32,
    };

    json!({
        "_embedded": { name: slice },
        "_links": { "self": { "href": endpoint } },
        "page": page,
    })
}

fn links(entries: &[(&str, &str)]) -> Links {
    entries
        .iter()
        .map(|(rel, href)| (rel.to_string(), Link { href: href.to_string() }))
        .collect()
}

fn stamp(on: &str) -> AuditStamp {
    AuditStamp {
        by: "admin".into(),
        on: on.into(),
    }
}

fn code_label(code: &str, label: &str) -> CodeLabel {
    CodeLabel {
        code: code.into(),
        label: Some(label.into()),
    }
}

fn step(id: i64, index: u32, action: &str, expected_result: &str) -> TestStep {
    TestStep {
        id,
        action: action.into(),
        expected_result: expected_result.into(),
        index,
    }
}
