/*
[INPUT]:  Outline chapters (Chapter -> Section -> Subsection) and node ids to toggle
[OUTPUT]: Immutable CatalogTree arena + SelectionState snapshots + flat selected id export
[POS]:    Selection layer - cascading checkbox semantics over the outline
[UPDATE]: When changing selection propagation, default selection, or export order
*/

use std::collections::{HashMap, HashSet};

use cardloom_adapter::{CardloomError, CatalogNode, Chapter, Result};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Chapter,
    Section,
    Subsection,
}

/// Checkbox rendering of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Checked,
    Unchecked,
    /// Some, but not all, descendants are selected
    Indeterminate,
}

/// One node of the outline, linked to its parent and children by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub kind: NodeKind,
    pub title: String,
    pub description: Option<String>,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub depth: usize,
}

impl CatalogEntry {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Outline stored as an arena keyed by node id.
///
/// The tree never changes after loading; selection lives in
/// [`SelectionState`] values passed in and returned by each operation.
#[derive(Debug, Clone, Default)]
pub struct CatalogTree {
    nodes: HashMap<String, CatalogEntry>,
    roots: Vec<String>,
    preorder: Vec<String>,
}

/// Selected node ids plus the expanded chapters of one selection session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: HashSet<String>,
    expanded: HashSet<String>,
}

impl SelectionState {
    pub fn is_selected(&self, node_id: &str) -> bool {
        self.selected.contains(node_id)
    }

    pub fn is_expanded(&self, chapter_id: &str) -> bool {
        self.expanded.contains(chapter_id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn selected(&self) -> &HashSet<String> {
        &self.selected
    }
}

/// Build the tree and its default session state: everything selected,
/// every chapter expanded.
pub fn load_catalog(chapters: &[Chapter]) -> Result<(CatalogTree, SelectionState)> {
    let tree = CatalogTree::from_chapters(chapters)?;
    let state = tree.full_selection();
    debug!(nodes = tree.len(), chapters = tree.roots.len(), "catalog loaded");
    Ok((tree, state))
}

impl CatalogTree {
    /// Index the outline. Duplicate or blank ids are rejected.
    pub fn from_chapters(chapters: &[Chapter]) -> Result<Self> {
        let mut tree = Self::default();
        for chapter in chapters {
            tree.roots.push(chapter.id.clone());
            tree.insert(CatalogNode::Chapter(chapter), None, 0)?;
        }
        Ok(tree)
    }

    fn insert(&mut self, node: CatalogNode<'_>, parent: Option<&str>, depth: usize) -> Result<()> {
        let id = node.id();
        if id.trim().is_empty() {
            return Err(CardloomError::Validation(format!(
                "catalog node {:?} has an empty id",
                node.title()
            )));
        }
        if self.nodes.contains_key(id) {
            return Err(CardloomError::Validation(format!(
                "duplicate catalog node id {id:?}"
            )));
        }

        let children = node.children();
        let kind = match node {
            CatalogNode::Chapter(_) => NodeKind::Chapter,
            CatalogNode::Section(_) => NodeKind::Section,
            CatalogNode::Subsection(_) => NodeKind::Subsection,
        };
        self.nodes.insert(
            id.to_string(),
            CatalogEntry {
                id: id.to_string(),
                kind,
                title: node.title().to_string(),
                description: node.description().map(str::to_string),
                parent: parent.map(str::to_string),
                children: children.iter().map(|child| child.id().to_string()).collect(),
                depth,
            },
        );
        self.preorder.push(id.to_string());

        for child in children {
            self.insert(child, Some(id), depth + 1)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn get(&self, node_id: &str) -> Option<&CatalogEntry> {
        self.nodes.get(node_id)
    }

    pub fn roots(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.roots.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Nodes in document order (parents before children)
    pub fn iter(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.preorder.iter().filter_map(|id| self.nodes.get(id))
    }

    fn entry(&self, node_id: &str) -> Result<&CatalogEntry> {
        self.nodes
            .get(node_id)
            .ok_or_else(|| CardloomError::NotFound(format!("catalog node {node_id}")))
    }

    /// `node_id` and all of its descendants
    fn subtree<'a>(&'a self, node_id: &'a str) -> Vec<&'a str> {
        let mut out = Vec::new();
        let mut stack = vec![node_id];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(entry) = self.nodes.get(id) {
                stack.extend(entry.children.iter().map(String::as_str));
            }
        }
        out
    }

    /// Every node selected, every chapter expanded
    pub fn full_selection(&self) -> SelectionState {
        SelectionState {
            selected: self.nodes.keys().cloned().collect(),
            expanded: self.roots.iter().cloned().collect(),
        }
    }

    /// Flip one node and its subtree, then re-derive its ancestors bottom-up.
    pub fn toggle_node(&self, state: &SelectionState, node_id: &str) -> Result<SelectionState> {
        let entry = self.entry(node_id)?;
        let select = !state.selected.contains(node_id);
        let mut next = state.clone();

        for id in self.subtree(&entry.id) {
            if select {
                next.selected.insert(id.to_string());
            } else {
                next.selected.remove(id);
            }
        }

        let mut parent = entry.parent.as_deref();
        while let Some(parent_id) = parent {
            let Some(ancestor) = self.nodes.get(parent_id) else {
                break;
            };
            let all_children = ancestor
                .children
                .iter()
                .all(|child| next.selected.contains(child));
            if all_children {
                next.selected.insert(ancestor.id.clone());
            } else {
                next.selected.remove(&ancestor.id);
            }
            parent = ancestor.parent.as_deref();
        }

        debug!(node_id, select, selected = next.selected.len(), "catalog node toggled");
        Ok(next)
    }

    /// Clear a non-empty selection, or select everything when it is empty.
    ///
    /// This is "select all or clear", not a tri-state toggle: a partial
    /// selection is cleared.
    pub fn toggle_all(&self, state: &SelectionState) -> SelectionState {
        let mut next = state.clone();
        if state.selected.is_empty() {
            next.selected = self.nodes.keys().cloned().collect();
        } else {
            next.selected.clear();
        }
        next
    }

    pub fn toggle_expanded(
        &self,
        state: &SelectionState,
        chapter_id: &str,
    ) -> Result<SelectionState> {
        let entry = self.entry(chapter_id)?;
        if entry.kind != NodeKind::Chapter {
            return Err(CardloomError::Validation(format!(
                "only chapters can be expanded, {chapter_id} is a {:?}",
                entry.kind
            )));
        }
        let mut next = state.clone();
        if !next.expanded.remove(chapter_id) {
            next.expanded.insert(chapter_id.to_string());
        }
        Ok(next)
    }

    pub fn check_state(&self, state: &SelectionState, node_id: &str) -> Result<CheckState> {
        let entry = self.entry(node_id)?;
        if state.selected.contains(node_id) {
            return Ok(CheckState::Checked);
        }
        let any_below = self
            .subtree(&entry.id)
            .into_iter()
            .skip(1)
            .any(|id| state.selected.contains(id));
        Ok(if any_below {
            CheckState::Indeterminate
        } else {
            CheckState::Unchecked
        })
    }

    /// Whether every non-leaf node is selected exactly when all its children are.
    pub fn is_consistent(&self, state: &SelectionState) -> bool {
        self.nodes.values().filter(|entry| !entry.is_leaf()).all(|entry| {
            let all_children = entry
                .children
                .iter()
                .all(|child| state.selected.contains(child));
            state.selected.contains(&entry.id) == all_children
        })
    }

    /// Selected ids in document order; the value handed to flashcard generation.
    pub fn export_selected_ids(&self, state: &SelectionState) -> Vec<String> {
        self.preorder
            .iter()
            .filter(|id| state.selected.contains(id.as_str()))
            .cloned()
            .collect()
    }
}
