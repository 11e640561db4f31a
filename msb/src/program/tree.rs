//! Arena-owned science-program tree with a reference-definition table.
//!
//! All nodes are owned by the [`ScienceProgram`] arena and addressed by
//! [`NodeId`] handles. Cross-links ("define once, reference elsewhere") are
//! kept out of the ownership graph: a reference node stores only the id
//! string, and every use site goes through [`ScienceProgram::resolve`].
//! Subtree moves are handle surgery on child lists; nothing is cloned.

use std::collections::HashMap;

use crate::error::{MsbError, MsbResult};
use crate::program::node::{MsbAttrs, Node, NodeId, NodeKind};

/// In-memory science program: arena, root, and definition table.
///
/// The definition table is populated while the document is loaded and is
/// read-only afterwards; lifecycle operations mutate only the tree links
/// and the count attributes.
///
/// # Examples
///
/// ```
/// use omp_msb::program::{MsbAttrs, NodeKind, ScienceProgram};
///
/// let mut prog = ScienceProgram::new();
/// let root = prog.root();
/// let msb = prog.add_child(root, NodeKind::Msb(MsbAttrs::new(2)));
/// assert_eq!(prog.children(root), &[msb]);
/// assert_eq!(prog.parent(msb), Some(root));
/// ```
#[derive(Debug, Clone)]
pub struct ScienceProgram {
    nodes: Vec<Node>,
    root: NodeId,
    project_id: Option<String>,
    definitions: HashMap<String, NodeId>,
}

impl ScienceProgram {
    /// Creates an empty program containing only the document root.
    pub fn new() -> Self {
        let root = NodeId::new(0);
        ScienceProgram {
            nodes: vec![Node::new(NodeKind::Program)],
            root,
            project_id: None,
            definitions: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn set_project_id(&mut self, project_id: &str) {
        self.project_id = Some(project_id.to_string());
    }

    /// Appends a new node under `parent` and returns its handle.
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let mut node = Node::new(kind);
        node.parent = Some(parent);
        self.nodes.push(node);
        self.nodes[parent.value()].children.push(id);
        id
    }

    /// Registers `node` as the definition for reference id `key`.
    ///
    /// Load-time only; the table is frozen once the document is built.
    pub fn define(&mut self, key: &str, node: NodeId) {
        self.definitions.insert(key.to_string(), node);
    }

    /// Marks `node` as a reference to the definition registered under `key`.
    pub fn set_reference(&mut self, node: NodeId, key: &str) {
        self.nodes[node.value()].ref_id = Some(key.to_string());
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.value()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.value()]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.value()].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.value()].parent
    }

    /// Resolves a node through the definition table.
    ///
    /// A node without a reference id resolves to itself. A node whose
    /// reference id has no registered definition is a structural error in
    /// the input document and aborts the calling operation. The table is
    /// never mutated here.
    pub fn resolve(&self, id: NodeId) -> MsbResult<NodeId> {
        match &self.nodes[id.value()].ref_id {
            None => Ok(id),
            Some(key) => self
                .definitions
                .get(key)
                .copied()
                .ok_or_else(|| MsbError::UnresolvedReference(key.clone())),
        }
    }

    /// Replaces a node's payload, clearing cached checksums for the
    /// enclosing block and for any block inside the replaced subtree.
    pub fn replace_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.value()].kind = kind;
        self.invalidate_checksums_under(id);
        if let Some(msb) = self.enclosing_msb(id) {
            self.clear_cached_checksum(msb);
        }
    }

    /// Preorder list of `id` and all its descendants.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            for &child in self.nodes[next.value()].children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Document-order list of every schedulable block in the program.
    pub fn msbs(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|id| self.nodes[id.value()].kind.is_msb())
            .collect()
    }

    /// Schedulable blocks in the subtree rooted at `id` (excluding `id`
    /// itself unless it is a block).
    pub fn msbs_under(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|n| self.nodes[n.value()].kind.is_msb())
            .collect()
    }

    /// True if any strict ancestor of `id` satisfies `pred`.
    pub(crate) fn has_ancestor(&self, id: NodeId, pred: impl Fn(&NodeKind) -> bool) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if pred(&self.nodes[node.value()].kind) {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Nearest strict ancestor satisfying `pred`.
    pub(crate) fn find_ancestor(
        &self,
        id: NodeId,
        pred: impl Fn(&NodeKind) -> bool,
    ) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if pred(&self.nodes[node.value()].kind) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Nearest enclosing schedulable block (including `id` itself).
    pub fn enclosing_msb(&self, id: NodeId) -> Option<NodeId> {
        if self.nodes[id.value()].kind.is_msb() {
            return Some(id);
        }
        self.find_ancestor(id, NodeKind::is_msb)
    }

    /// Detaches `id` from its parent, keeping the whole subtree intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.value()].parent.take() {
            self.nodes[parent.value()].children.retain(|&c| c != id);
        }
    }

    /// Reinserts a detached node as the sibling immediately after `anchor`.
    pub fn insert_after(&mut self, anchor: NodeId, id: NodeId) {
        let Some(parent) = self.nodes[anchor.value()].parent else {
            log::warn!("insert_after: anchor {} has no parent; attaching under root", anchor);
            self.nodes[id.value()].parent = Some(self.root);
            let root = self.root;
            self.nodes[root.value()].children.push(id);
            return;
        };
        let children = &mut self.nodes[parent.value()].children;
        let pos = children
            .iter()
            .position(|&c| c == anchor)
            .map(|p| p + 1)
            .unwrap_or(children.len());
        children.insert(pos, id);
        self.nodes[id.value()].parent = Some(parent);
    }

    /// Attributes of a schedulable block, if `id` is one.
    pub fn msb_attrs(&self, id: NodeId) -> Option<&MsbAttrs> {
        match &self.nodes[id.value()].kind {
            NodeKind::Msb(attrs) => Some(attrs),
            _ => None,
        }
    }

    pub(crate) fn msb_attrs_mut(&mut self, id: NodeId) -> Option<&mut MsbAttrs> {
        match &mut self.nodes[id.value()].kind {
            NodeKind::Msb(attrs) => Some(attrs),
            _ => None,
        }
    }

    /// Locates a block by its computed checksum.
    ///
    /// Checksums are computed (and cached) as needed; a structural error in
    /// any block aborts the lookup.
    pub fn find_msb(&mut self, checksum: &str) -> MsbResult<Option<NodeId>> {
        for id in self.msbs() {
            if self.checksum(id)? == checksum {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }
}

impl Default for ScienceProgram {
    fn default() -> Self {
        Self::new()
    }
}
