//! Container module.
//!
//! A state container is a tree of named groups and typed datasets. This
//! module provides the in-memory tree, checked readers over it, and JSON
//! persistence.

pub mod group;
pub mod access;
pub mod serialization;

pub use group::{Group, Node};
pub use access::StringField;
pub use serialization::load_state;
