//! Bolota document container.
//!
//! # Responsibility
//! - Hold document properties (title, subtitle, creation date).
//! - Own the topic forest as the children of the tree root.
//!
//! # Invariants
//! - The tree root is never a topic; properties live outside the tree.
//! - `topics()` is always the root's children in document order.

use super::field::{Field, IconId, Timestamp};
use super::text::TextBuffer;
use super::tree::{FieldId, FieldTree, TreeResult};

/// In-memory Bolota document.
#[derive(Debug, Clone)]
pub struct Document {
    title: TextBuffer,
    subtitle: TextBuffer,
    created: Timestamp,
    tree: FieldTree,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document stamped with the current UTC time.
    pub fn new() -> Self {
        Self::with_created(Timestamp::now())
    }

    pub fn with_created(created: Timestamp) -> Self {
        Self {
            title: TextBuffer::default(),
            subtitle: TextBuffer::default(),
            created,
            tree: FieldTree::new(),
        }
    }

    pub(crate) fn from_parts(
        title: TextBuffer,
        subtitle: TextBuffer,
        created: Timestamp,
        tree: FieldTree,
    ) -> Self {
        Self {
            title,
            subtitle,
            created,
            tree,
        }
    }

    /// Sample outline exercising every field kind.
    pub fn example() -> Self {
        let mut doc = Self::new();
        doc.set_title("Example document");
        doc.set_subtitle("Just a simple example of a document.");

        doc.push_topic(Field::text("First topic"));
        doc.push_topic(Field::text("Second topic"));
        let third = doc.push_topic(Field::text("Third topic"));
        for child in [
            Field::text("Sub-item of third topic"),
            Field::icon("Example icon", IconId(10)),
            Field::text("Another sub-item of third topic"),
        ] {
            if let Err(err) = doc.push_child(third, child) {
                unreachable!("topic created by this document: {err}");
            }
        }
        doc.push_topic(Field::date("A sample date topic.", Timestamp::now()));
        doc.push_topic(Field::blank());
        doc.push_topic(Field::text("Fourth topic"));
        doc
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title.set(title);
    }

    pub fn title_buffer(&self) -> &TextBuffer {
        &self.title
    }

    pub fn subtitle(&self) -> &str {
        self.subtitle.as_str()
    }

    pub fn set_subtitle(&mut self, subtitle: impl Into<String>) {
        self.subtitle.set(subtitle);
    }

    pub fn subtitle_buffer(&self) -> &TextBuffer {
        &self.subtitle
    }

    pub fn created(&self) -> Timestamp {
        self.created
    }

    pub fn set_created(&mut self, created: Timestamp) {
        self.created = created;
    }

    /// Top-level topics in document order.
    pub fn topics(&self) -> &[FieldId] {
        self.tree.children(self.tree.root())
    }

    /// Appends a new top-level topic.
    pub fn push_topic(&mut self, field: Field) -> FieldId {
        let root = self.tree.root();
        match self.tree.append_new(root, field) {
            Ok(id) => id,
            Err(err) => unreachable!("the root always accepts new topics: {err}"),
        }
    }

    /// Appends a new child under an existing topic.
    pub fn push_child(&mut self, parent: FieldId, field: Field) -> TreeResult<FieldId> {
        self.tree.append_new(parent, field)
    }

    pub fn tree(&self) -> &FieldTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut FieldTree {
        &mut self.tree
    }

    /// Number of topics reachable from the root, at any depth.
    pub fn topic_count(&self) -> usize {
        self.tree.preorder(self.tree.root()).count()
    }
}
