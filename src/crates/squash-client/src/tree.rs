//! Lazily expanded project → folder → test-case tree.
//!
//! The forest lives in a `watch` channel. Every change replaces the path from
//! the root down to the changed node with fresh `Arc`s and reuses every other
//! subtree as is, so a snapshot handed out earlier never changes under its
//! holder and observers can compare subtrees with `Arc::ptr_eq`.

use crate::api::SquashApi;
use crate::error::{Result, SquashError};
use crate::models::{Folder, Project, TestCase};
use futures::future::join_all;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub type Forest = Vec<Arc<TreeNode>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Project,
    Folder,
    TestCase,
}

impl NodeKind {
    fn prefix(self) -> &'static str {
        match self {
            NodeKind::Project => "project",
            NodeKind::Folder => "folder",
            NodeKind::TestCase => "testcase",
        }
    }
}

/// Stable node identity: kind plus remote id, rendered as `folder-101`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub kind: NodeKind,
    pub remote_id: i64,
}

impl NodeId {
    pub fn new(kind: NodeKind, remote_id: i64) -> Self {
        Self { kind, remote_id }
    }

    pub fn project(remote_id: i64) -> Self {
        Self::new(NodeKind::Project, remote_id)
    }

    pub fn folder(remote_id: i64) -> Self {
        Self::new(NodeKind::Folder, remote_id)
    }

    pub fn test_case(remote_id: i64) -> Self {
        Self::new(NodeKind::TestCase, remote_id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind.prefix(), self.remote_id)
    }
}

impl FromStr for NodeId {
    type Err = SquashError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SquashError::InvalidRequest(format!("invalid node id {:?}", s));
        let (prefix, id) = s.rsplit_once('-').ok_or_else(invalid)?;
        let kind = match prefix {
            "project" => NodeKind::Project,
            "folder" => NodeKind::Folder,
            "testcase" => NodeKind::TestCase,
            _ => return Err(invalid()),
        };
        let remote_id = id.parse().map_err(|_| invalid())?;
        Ok(Self::new(kind, remote_id))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: String,
    pub path: String,
    pub parent: Option<NodeId>,
    /// `None` until loaded; `Some(vec![])` once loaded and found empty.
    pub children: Option<Vec<Arc<TreeNode>>>,
    pub has_children: bool,
    pub expanded: bool,
    pub loading: bool,
    pub test_case: Option<TestCase>,
}

impl TreeNode {
    pub fn from_project(project: &Project) -> Self {
        Self {
            id: NodeId::project(project.id),
            name: project.name.clone(),
            path: project.name.clone(),
            parent: None,
            children: None,
            has_children: true,
            expanded: false,
            loading: false,
            test_case: None,
        }
    }

    pub fn from_folder(folder: &Folder, parent: NodeId) -> Self {
        Self {
            id: NodeId::folder(folder.id),
            name: folder.name.clone(),
            path: folder
                .path
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| folder.name.clone()),
            parent: Some(parent),
            children: None,
            has_children: true,
            expanded: false,
            loading: false,
            test_case: None,
        }
    }

    pub fn from_test_case(test_case: TestCase, parent: NodeId) -> Self {
        let folder_name = test_case
            .folder
            .as_ref()
            .map(|f| f.name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("Unknown");
        Self {
            id: NodeId::test_case(test_case.id),
            name: test_case.name.clone(),
            path: format!("{}/{}", folder_name, test_case.name),
            parent: Some(parent),
            children: None,
            has_children: false,
            expanded: false,
            loading: false,
            test_case: Some(test_case),
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.id.kind
    }

    pub fn remote_id(&self) -> i64 {
        self.id.remote_id
    }

    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }

    pub fn is_leaf(&self) -> bool {
        self.id.kind == NodeKind::TestCase
    }

    fn with_children(&self, children: Vec<Arc<TreeNode>>) -> Self {
        let mut node = self.clone();
        node.has_children = !children.is_empty();
        node.children = Some(children);
        node.expanded = true;
        node.loading = false;
        node
    }
}

/// Depth-first lookup.
pub fn find_node(nodes: &[Arc<TreeNode>], id: &NodeId) -> Option<Arc<TreeNode>> {
    for node in nodes {
        if &node.id == id {
            return Some(node.clone());
        }
        if let Some(found) = node.children.as_deref().and_then(|c| find_node(c, id)) {
            return Some(found);
        }
    }
    None
}

/// Rebuild the path to `id`, sharing every untouched subtree.
fn replace_node(
    nodes: &[Arc<TreeNode>],
    id: &NodeId,
    update: &dyn Fn(&TreeNode) -> TreeNode,
) -> Option<(Forest, Arc<TreeNode>)> {
    for (index, node) in nodes.iter().enumerate() {
        let replaced = if &node.id == id {
            let fresh = Arc::new(update(node));
            Some((fresh.clone(), fresh))
        } else {
            node.children
                .as_deref()
                .and_then(|children| replace_node(children, id, update))
                .map(|(children, changed)| {
                    let mut copy = TreeNode::clone(node);
                    copy.children = Some(children);
                    (Arc::new(copy), changed)
                })
        };

        if let Some((fresh, changed)) = replaced {
            let mut rebuilt = nodes.to_vec();
            rebuilt[index] = fresh;
            return Some((rebuilt, changed));
        }
    }
    None
}

pub struct HierarchicalTreeLoader {
    api: Arc<SquashApi>,
    state: watch::Sender<Forest>,
}

impl HierarchicalTreeLoader {
    pub fn new(api: Arc<SquashApi>) -> Self {
        let (state, _) = watch::channel(Forest::new());
        Self { api, state }
    }

    /// Current forest. Cheap: clones the root `Arc`s only.
    pub fn snapshot(&self) -> Forest {
        self.state.borrow().clone()
    }

    /// Receiver notified on every tree change, `loading` flips included.
    pub fn subscribe(&self) -> watch::Receiver<Forest> {
        self.state.subscribe()
    }

    pub fn find(&self, id: &NodeId) -> Option<Arc<TreeNode>> {
        find_node(&self.state.borrow(), id)
    }

    /// Replace the forest with one unexpanded node per project.
    pub async fn load_roots(&self) -> Result<Forest> {
        let projects = self.api.root_projects().await?;
        let roots: Forest = projects
            .iter()
            .map(|p| Arc::new(TreeNode::from_project(p)))
            .collect();

        info!(count = roots.len(), "Loaded root projects");
        self.state.send_replace(roots.clone());
        Ok(roots)
    }

    /// Load and show the children of `id`.
    ///
    /// Already-loaded nodes are only marked expanded. On failure the node is
    /// left with `loading` cleared and children absent, so the expansion can
    /// be retried.
    pub async fn expand(&self, id: &NodeId) -> Result<Arc<TreeNode>> {
        let node = self
            .find(id)
            .ok_or_else(|| SquashError::NodeNotFound(id.to_string()))?;

        if node.is_leaf() {
            return Ok(node);
        }
        if node.is_loaded() {
            if node.expanded {
                return Ok(node);
            }
            return self.update(id, &|n| TreeNode {
                expanded: true,
                ..n.clone()
            });
        }

        self.update(id, &|n| TreeNode {
            loading: true,
            ..n.clone()
        })?;
        debug!(node = %id, "Expanding node");

        let loaded = match id.kind {
            NodeKind::Project => self.project_children(*id).await,
            NodeKind::Folder => self.folder_children(*id).await,
            NodeKind::TestCase => Ok(Vec::new()),
        };

        match loaded {
            Ok(children) => {
                debug!(node = %id, count = children.len(), "Node expanded");
                self.update(id, &|n| n.with_children(children.clone()))
            }
            Err(err) => {
                warn!(node = %id, error = %err, "Expansion failed");
                // the node may have been dropped by a concurrent load_roots
                let _ = self.update(id, &|n| TreeNode {
                    loading: false,
                    ..n.clone()
                });
                Err(err)
            }
        }
    }

    /// Expand several nodes concurrently; one failure does not stop the others.
    pub async fn expand_all(&self, ids: &[NodeId]) -> Vec<Result<Arc<TreeNode>>> {
        join_all(ids.iter().map(|id| self.expand(id))).await
    }

    /// Hide children without discarding them.
    pub fn collapse(&self, id: &NodeId) -> Result<Arc<TreeNode>> {
        self.update(id, &|n| TreeNode {
            expanded: false,
            ..n.clone()
        })
    }

    async fn project_children(&self, project: NodeId) -> Result<Vec<Arc<TreeNode>>> {
        let folders = self.api.project_folders(project.remote_id).await?;
        Ok(folders
            .iter()
            .map(|f| Arc::new(TreeNode::from_folder(f, project)))
            .collect())
    }

    async fn folder_children(&self, folder: NodeId) -> Result<Vec<Arc<TreeNode>>> {
        let (subfolders, test_cases) = tokio::join!(
            self.api.folder_subfolders(folder.remote_id),
            self.api.folder_test_cases(folder.remote_id),
        );

        let (subfolders, test_cases) = match (subfolders, test_cases) {
            (Err(err), Err(other)) => {
                debug!(node = %folder, error = %other, "Test case listing failed too");
                return Err(err);
            }
            (subfolders, test_cases) => (
                subfolders.unwrap_or_else(|err| {
                    warn!(node = %folder, error = %err, "Subfolder listing failed, continuing without");
                    Vec::new()
                }),
                test_cases.unwrap_or_else(|err| {
                    warn!(node = %folder, error = %err, "Test case listing failed, continuing without");
                    Vec::new()
                }),
            ),
        };

        let children = subfolders
            .iter()
            .map(|f| Arc::new(TreeNode::from_folder(f, folder)))
            .chain(
                test_cases
                    .into_iter()
                    .map(|tc| Arc::new(TreeNode::from_test_case(tc, folder))),
            )
            .collect();
        Ok(children)
    }

    fn update(&self, id: &NodeId, update: &dyn Fn(&TreeNode) -> TreeNode) -> Result<Arc<TreeNode>> {
        let mut changed = None;
        self.state.send_if_modified(|forest| match replace_node(forest, id, update) {
            Some((rebuilt, node)) => {
                *forest = rebuilt;
                changed = Some(node);
                true
            }
            None => false,
        });
        changed.ok_or_else(|| SquashError::NodeNotFound(id.to_string()))
    }
}
