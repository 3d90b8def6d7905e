//! a11y-snapshot - Serialize accessibility node trees into JSON snapshots.
//!
//! This crate walks a live, host-owned accessibility tree once, extracts a
//! capability-versioned attribute record for every node, and assembles the
//! records into a self-describing JSON document.
//!
//! # Overview
//!
//! A host platform exposes its tree through the [`NodeHandle`] trait. The
//! [`TreeSerializer`] visits nodes in pre-order, asks the [`NodeExtractor`]
//! for each node's record, and releases every child handle it acquires,
//! whatever happens while that child is processed. The [`CapabilitySet`]
//! decides which version-gated attributes are read at all.
//!
//! # Quick Start
//!
//! ```
//! use a11y_snapshot::fixture::{FixtureNode, FixtureSpec};
//! use a11y_snapshot::serialize_tree;
//!
//! let spec = FixtureSpec::from_json(r#"{
//!     "strings": {"className": "android.widget.FrameLayout"},
//!     "children": [{"strings": {"text": "Hello"}}]
//! }"#).unwrap();
//! let root = FixtureNode::root(spec);
//!
//! let record = serialize_tree(&root, 34);
//! assert_eq!(record.class_name, "android.widget.FrameLayout");
//! assert_eq!(record.children[0].text, "Hello");
//! ```
//!
//! # Modules
//!
//! - [`capabilities`]: Platform version to capability gates
//! - [`node`]: Host node trait, attribute selectors, scoped child release
//! - [`extractor`]: Per-node attribute extraction and extras sanitization
//! - [`serializer`]: Tree traversal with depth and fan-out limits
//! - [`actions`]: Action id to symbolic name table
//! - [`types`]: Output records, snapshot envelope, errors
//! - [`config`]: Snapshot configuration (TOML)
//! - [`fixture`]: JSON-described in-memory trees implementing [`NodeHandle`]

pub mod actions;
pub mod capabilities;
pub mod config;
pub mod extractor;
pub mod fixture;
pub mod node;
pub mod serializer;
pub mod types;

pub use capabilities::{Capability, CapabilitySet};
pub use config::{ConfigError, SnapshotConfig};
pub use extractor::NodeExtractor;
pub use node::{ChildGuard, NodeHandle};
pub use serializer::TreeSerializer;
pub use types::{NodeError, NodeRecord, SnapshotDocument, SnapshotError};

/// Serialize a whole tree with default limits for the given platform version.
pub fn serialize_tree<N: NodeHandle>(root: &N, platform_version: u32) -> NodeRecord {
    let config = SnapshotConfig::default().with_platform_version(platform_version);
    let capabilities = config.capabilities();
    TreeSerializer::new(&capabilities, &config).serialize(root)
}
