//! Arena-backed outline tree.
//!
//! # Responsibility
//! - Own every field of a document and the parent/child links between them.
//! - Provide structural mutation (append, insert, remove, move) and traversal.
//!
//! # Invariants
//! - Ownership flows parent -> children; the child -> parent link is a plain
//!   handle, never an owning edge.
//! - A field's `parent` names the node whose `children` contains it exactly once.
//! - A field is attached to at most one parent. Reparenting is remove-then-insert.
//! - Depth is derived from the live parent chain and never stored.
//! - Detached subtrees stay internally linked and can be attached again.
//! - Discarded slots are reused; a stale handle never resolves to the new
//!   occupant because every reuse bumps the slot generation.

use super::field::Field;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Handle to a node inside one [`FieldTree`].
///
/// Handles are only meaningful for the tree that minted them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId {
    index: usize,
    generation: u32,
}

impl FieldId {
    /// Arena slot. Slots are reused after [`FieldTree::discard`].
    pub fn index(self) -> usize {
        self.index
    }
}

impl Display for FieldId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// Depth reported for the synthetic document root.
pub const ROOT_DEPTH: i32 = -1;

pub type TreeResult<T> = Result<T, TreeError>;

/// Contract violations of the tree API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// Handle does not belong to this tree.
    UnknownField(FieldId),
    /// Attaching would make a node its own ancestor.
    CycleDetected { node: FieldId, parent: FieldId },
    /// Node already has a parent; detach it first.
    AlreadyAttached(FieldId),
    /// Node has no parent to be removed from.
    NotAttached(FieldId),
    /// Child position is outside the parent's children.
    IndexOutOfBounds { index: usize, len: usize },
    /// The document root can never be detached or reparented.
    RootNotMovable,
    /// The document root holds no field value.
    RootHasNoField,
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField(id) => write!(f, "field {id} does not belong to this tree"),
            Self::CycleDetected { node, parent } => {
                write!(f, "attaching {node} under {parent} would create a cycle")
            }
            Self::AlreadyAttached(id) => write!(f, "field {id} already has a parent"),
            Self::NotAttached(id) => write!(f, "field {id} has no parent"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "child index {index} out of bounds for {len} children")
            }
            Self::RootNotMovable => write!(f, "the document root cannot be moved"),
            Self::RootHasNoField => write!(f, "the document root holds no field"),
        }
    }
}

impl Error for TreeError {}

#[derive(Debug, Clone)]
struct Node {
    field: Option<Field>,
    parent: Option<FieldId>,
    children: Vec<FieldId>,
    generation: u32,
    live: bool,
}

impl Node {
    fn new(field: Option<Field>) -> Self {
        Self {
            field,
            parent: None,
            children: Vec::new(),
            generation: 0,
            live: true,
        }
    }
}

/// Outline tree rooted at a synthetic document root.
#[derive(Debug, Clone)]
pub struct FieldTree {
    nodes: Vec<Node>,
    free: Vec<usize>,
}

impl Default for FieldTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldTree {
    const ROOT: FieldId = FieldId {
        index: 0,
        generation: 0,
    };

    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(None)],
            free: Vec::new(),
        }
    }

    /// Synthetic root whose children are the top-level topics.
    pub fn root(&self) -> FieldId {
        Self::ROOT
    }

    /// Adds a detached field and returns its handle.
    ///
    /// Reuses a slot freed by [`FieldTree::discard`] when one is available.
    pub fn create(&mut self, field: Field) -> FieldId {
        if let Some(index) = self.free.pop() {
            let node = &mut self.nodes[index];
            node.field = Some(field);
            node.live = true;
            return FieldId {
                index,
                generation: node.generation,
            };
        }
        self.nodes.push(Node::new(Some(field)));
        FieldId {
            index: self.nodes.len() - 1,
            generation: 0,
        }
    }

    /// Drops a detached subtree and frees its slots for reuse.
    ///
    /// Returns the number of fields dropped. Handles into the subtree stop
    /// resolving afterwards.
    ///
    /// # Errors
    /// - [`TreeError::AlreadyAttached`] when `id` still has a parent.
    /// - [`TreeError::RootNotMovable`] for the document root.
    pub fn discard(&mut self, id: FieldId) -> TreeResult<usize> {
        if id == Self::ROOT {
            return Err(TreeError::RootNotMovable);
        }
        if self.node(id)?.parent.is_some() {
            return Err(TreeError::AlreadyAttached(id));
        }

        let mut pending = vec![id];
        let mut dropped = 0;
        while let Some(current) = pending.pop() {
            let node = &mut self.nodes[current.index];
            pending.append(&mut node.children);
            node.field = None;
            node.parent = None;
            node.live = false;
            node.generation = node.generation.wrapping_add(1);
            self.free.push(current.index);
            dropped += 1;
        }
        Ok(dropped)
    }

    /// Adds a field as the last child of `parent`.
    pub fn append_new(&mut self, parent: FieldId, field: Field) -> TreeResult<FieldId> {
        self.node(parent)?;
        let id = self.create(field);
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn contains(&self, id: FieldId) -> bool {
        self.slot(id).is_some()
    }

    /// Number of fields owned by the tree, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Field value; `None` for the root or a foreign handle.
    pub fn get(&self, id: FieldId) -> Option<&Field> {
        self.slot(id).and_then(|node| node.field.as_ref())
    }

    pub fn get_mut(&mut self, id: FieldId) -> Option<&mut Field> {
        self.node_mut(id).ok().and_then(|node| node.field.as_mut())
    }

    /// Field value, reporting why it is unavailable.
    pub fn field(&self, id: FieldId) -> TreeResult<&Field> {
        self.node(id)?.field.as_ref().ok_or(TreeError::RootHasNoField)
    }

    pub fn field_mut(&mut self, id: FieldId) -> TreeResult<&mut Field> {
        self.node_mut(id)?
            .field
            .as_mut()
            .ok_or(TreeError::RootHasNoField)
    }

    pub fn parent(&self, id: FieldId) -> Option<FieldId> {
        self.slot(id).and_then(|node| node.parent)
    }

    /// Children in sibling order. Foreign handles have none.
    pub fn children(&self, id: FieldId) -> &[FieldId] {
        self.slot(id)
            .map_or(&[][..], |node| node.children.as_slice())
    }

    pub fn last_child(&self, id: FieldId) -> Option<FieldId> {
        self.children(id).last().copied()
    }

    pub fn index_of(&self, parent: FieldId, child: FieldId) -> Option<usize> {
        self.children(parent)
            .iter()
            .position(|candidate| *candidate == child)
    }

    /// Depth derived from the parent chain.
    ///
    /// Top-level topics are at 0 and the document root at [`ROOT_DEPTH`]. The
    /// top of a detached subtree is at 0 as well.
    pub fn depth(&self, id: FieldId) -> TreeResult<i32> {
        self.node(id)?;
        let mut hops = 0;
        let mut cursor = id;
        while let Some(parent) = self.nodes[cursor.index].parent {
            hops += 1;
            cursor = parent;
        }
        Ok(if cursor == Self::ROOT { hops - 1 } else { hops })
    }

    /// Whether the node is reachable from the document root.
    pub fn is_attached(&self, id: FieldId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let mut cursor = id;
        while let Some(parent) = self.nodes[cursor.index].parent {
            cursor = parent;
        }
        cursor == Self::ROOT
    }

    /// Appends a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: FieldId, child: FieldId) -> TreeResult<()> {
        let len = self.node(parent)?.children.len();
        self.attach(parent, len, child)
    }

    /// Inserts a detached node at `index` among `parent`'s children.
    pub fn insert_child(&mut self, parent: FieldId, index: usize, child: FieldId) -> TreeResult<()> {
        self.attach(parent, index, child)
    }

    /// Detaches the child at `index` and returns it.
    ///
    /// The detached node keeps its own subtree and its arena slots until it is
    /// attached again or passed to [`FieldTree::discard`].
    pub fn remove_child(&mut self, parent: FieldId, index: usize) -> TreeResult<FieldId> {
        let node = self.node_mut(parent)?;
        let len = node.children.len();
        if index >= len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        let child = node.children.remove(index);
        let detached = &mut self.nodes[child.index];
        debug_assert_eq!(detached.parent, Some(parent));
        detached.parent = None;
        Ok(child)
    }

    /// Detaches a node from whichever parent holds it.
    pub fn remove_from_parent(&mut self, node: FieldId) -> TreeResult<()> {
        if node == Self::ROOT {
            return Err(TreeError::RootNotMovable);
        }
        let parent = self.node(node)?.parent.ok_or(TreeError::NotAttached(node))?;
        let index = self
            .index_of(parent, node)
            .ok_or(TreeError::NotAttached(node))?;
        self.remove_child(parent, index)?;
        Ok(())
    }

    /// Moves a node under `new_parent` at `index`, or last when `index` is `None`.
    ///
    /// Validation happens before the node is detached, so a rejected move
    /// leaves the tree unchanged.
    pub fn move_field(
        &mut self,
        node: FieldId,
        new_parent: FieldId,
        index: Option<usize>,
    ) -> TreeResult<()> {
        if node == Self::ROOT {
            return Err(TreeError::RootNotMovable);
        }
        self.node(node)?;
        self.node(new_parent)?;
        self.ensure_not_ancestor(node, new_parent)?;

        let old_parent = self.parent(node);
        let mut len = self.nodes[new_parent.index].children.len();
        if old_parent == Some(new_parent) {
            len -= 1;
        }
        let target = index.unwrap_or(len);
        if target > len {
            return Err(TreeError::IndexOutOfBounds { index: target, len });
        }

        if old_parent.is_some() {
            self.remove_from_parent(node)?;
        }
        self.attach(new_parent, target, node)
    }

    /// Pre-order walk over the descendants of `start`.
    ///
    /// Depths are relative: children of `start` are reported at 0.
    pub fn preorder(&self, start: FieldId) -> Preorder<'_> {
        let stack = self
            .children(start)
            .iter()
            .rev()
            .map(|child| (*child, 0))
            .collect();
        Preorder { tree: self, stack }
    }

    fn attach(&mut self, parent: FieldId, index: usize, child: FieldId) -> TreeResult<()> {
        if child == Self::ROOT {
            return Err(TreeError::RootNotMovable);
        }
        if self.node(child)?.parent.is_some() {
            return Err(TreeError::AlreadyAttached(child));
        }
        let len = self.node(parent)?.children.len();
        if index > len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        self.ensure_not_ancestor(child, parent)?;

        self.nodes[parent.index].children.insert(index, child);
        self.nodes[child.index].parent = Some(parent);
        Ok(())
    }

    fn ensure_not_ancestor(&self, node: FieldId, parent: FieldId) -> TreeResult<()> {
        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == node {
                return Err(TreeError::CycleDetected { node, parent });
            }
            cursor = self.nodes[current.index].parent;
        }
        Ok(())
    }

    fn slot(&self, id: FieldId) -> Option<&Node> {
        self.nodes
            .get(id.index)
            .filter(|node| node.live && node.generation == id.generation)
    }

    fn node(&self, id: FieldId) -> TreeResult<&Node> {
        self.slot(id).ok_or(TreeError::UnknownField(id))
    }

    fn node_mut(&mut self, id: FieldId) -> TreeResult<&mut Node> {
        self.nodes
            .get_mut(id.index)
            .filter(|node| node.live && node.generation == id.generation)
            .ok_or(TreeError::UnknownField(id))
    }
}

/// Iterator returned by [`FieldTree::preorder`].
pub struct Preorder<'a> {
    tree: &'a FieldTree,
    stack: Vec<(FieldId, usize)>,
}

impl Iterator for Preorder<'_> {
    type Item = (FieldId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        self.stack.extend(
            self.tree
                .children(id)
                .iter()
                .rev()
                .map(|child| (*child, depth + 1)),
        );
        Some((id, depth))
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldTree, TreeError, ROOT_DEPTH};
    use crate::model::field::Field;

    #[test]
    fn depth_follows_parent_chain() {
        let mut tree = FieldTree::new();
        let root = tree.root();
        let a = tree.append_new(root, Field::text("a")).unwrap();
        let b = tree.append_new(a, Field::text("b")).unwrap();

        assert_eq!(tree.depth(root).unwrap(), ROOT_DEPTH);
        assert_eq!(tree.depth(a).unwrap(), 0);
        assert_eq!(tree.depth(b).unwrap(), 1);
    }

    #[test]
    fn detached_subtree_keeps_links() {
        let mut tree = FieldTree::new();
        let root = tree.root();
        let a = tree.append_new(root, Field::text("a")).unwrap();
        let b = tree.append_new(a, Field::text("b")).unwrap();

        let removed = tree.remove_child(root, 0).unwrap();
        assert_eq!(removed, a);
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.parent(b), Some(a));
        assert!(!tree.is_attached(b));
        assert_eq!(tree.depth(b).unwrap(), 1);

        tree.append_child(root, a).unwrap();
        assert!(tree.is_attached(b));
    }

    #[test]
    fn attach_rejects_self_parenting() {
        let mut tree = FieldTree::new();
        let a = tree.create(Field::text("a"));
        assert_eq!(
            tree.append_child(a, a),
            Err(TreeError::CycleDetected { node: a, parent: a })
        );
    }

    #[test]
    fn preorder_reports_relative_depths() {
        let mut tree = FieldTree::new();
        let root = tree.root();
        let a = tree.append_new(root, Field::text("a")).unwrap();
        let b = tree.append_new(a, Field::text("b")).unwrap();
        let c = tree.append_new(root, Field::blank()).unwrap();

        let visited: Vec<_> = tree.preorder(root).collect();
        assert_eq!(visited, vec![(a, 0), (b, 1), (c, 0)]);
    }

    #[test]
    fn discard_frees_detached_subtree() {
        let mut tree = FieldTree::new();
        let root = tree.root();
        let a = tree.append_new(root, Field::text("a")).unwrap();
        let b = tree.append_new(a, Field::text("b")).unwrap();
        tree.append_new(root, Field::text("c")).unwrap();

        assert_eq!(tree.discard(a), Err(TreeError::AlreadyAttached(a)));
        tree.remove_from_parent(a).unwrap();
        assert_eq!(tree.discard(a), Ok(2));
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(b));
        assert_eq!(tree.field(a), Err(TreeError::UnknownField(a)));

        let reused = tree.create(Field::text("d"));
        assert_ne!(reused, a);
        assert_ne!(reused, b);
        assert!(reused.index() == a.index() || reused.index() == b.index());
        assert_eq!(tree.len(), 2);
        assert!(tree.get(a).is_none() && tree.get(b).is_none());
        assert_eq!(tree.append_child(root, b), Err(TreeError::UnknownField(b)));
    }

    #[test]
    fn root_cannot_be_discarded() {
        let mut tree = FieldTree::new();
        assert_eq!(tree.discard(tree.root()), Err(TreeError::RootNotMovable));
    }

    #[test]
    fn root_holds_no_field() {
        let tree = FieldTree::new();
        assert_eq!(tree.field(tree.root()), Err(TreeError::RootHasNoField));
        assert!(tree.get(tree.root()).is_none());
    }
}
