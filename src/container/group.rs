//! Hierarchical container of groups and datasets.

use crate::core::types::{Dataset, NodeKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A node in the container: either a group of named children or a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Group(_) => NodeKind::Group,
            Node::Dataset(_) => NodeKind::Dataset,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(g) => Some(g),
            Node::Dataset(_) => None,
        }
    }

    pub fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            Node::Dataset(d) => Some(d),
            Node::Group(_) => None,
        }
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

impl From<Dataset> for Node {
    fn from(dataset: Dataset) -> Self {
        Node::Dataset(dataset)
    }
}

/// A group of named children.
///
/// Children keep their insertion order, which is the container's
/// enumeration order. Several validators treat that order as meaningful
/// (modalities, selections), so it is never sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group {
    children: IndexMap<String, Node>,
}

impl Group {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a child group.
    pub fn with_group(mut self, name: impl Into<String>, group: Group) -> Self {
        self.insert(name, group);
        self
    }

    /// Builder: add a child dataset.
    pub fn with_dataset(mut self, name: impl Into<String>, dataset: Dataset) -> Self {
        self.insert(name, dataset);
        self
    }

    /// Insert or replace a child, returning the previous node.
    ///
    /// A replaced child keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, node: impl Into<Node>) -> Option<Node> {
        self.children.insert(name.into(), node.into())
    }

    /// Remove a child, preserving the order of the others.
    pub fn remove(&mut self, name: &str) -> Option<Node> {
        self.children.shift_remove(name)
    }

    /// Look up a child by name.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    /// Mutable access to a child group, for building fixtures.
    pub fn group_mut(&mut self, name: &str) -> Option<&mut Group> {
        match self.children.get_mut(name) {
            Some(Node::Group(g)) => Some(g),
            _ => None,
        }
    }

    /// Whether a child of this name exists. Never fails.
    pub fn exists(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Child names in enumeration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Children in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }
}
