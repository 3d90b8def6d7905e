//! Tree traversal.
//!
//! [`TreeSerializer`] walks a host tree depth-first in pre-order, extracting
//! each node and nesting child records under `children` in host index order.
//! Every child handle is held in a [`ChildGuard`] and released as soon as its
//! subtree has been built.
//!
//! # Limits
//!
//! Depth and fan-out are capped by [`SnapshotConfig`]. A node whose children
//! were cut short is marked `truncated`; its subtree is otherwise valid.

use crate::capabilities::CapabilitySet;
use crate::config::SnapshotConfig;
use crate::extractor::NodeExtractor;
use crate::node::{ChildGuard, NodeHandle};
use crate::types::{NodeRecord, SnapshotDocument, SnapshotError};

/// Serializes host trees under one capability set and one set of limits.
///
/// # Example
///
/// ```
/// use a11y_snapshot::config::SnapshotConfig;
/// use a11y_snapshot::fixture::{FixtureNode, FixtureSpec};
/// use a11y_snapshot::serializer::TreeSerializer;
///
/// let spec = FixtureSpec::from_json(r#"{"children": [{}, null, {}]}"#).unwrap();
/// let root = FixtureNode::root(spec);
///
/// let config = SnapshotConfig::default().with_platform_version(34);
/// let caps = config.capabilities();
/// let record = TreeSerializer::new(&caps, &config).serialize(&root);
///
/// assert_eq!(record.children.len(), 2);
/// assert!(root.ledger().is_balanced());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TreeSerializer<'a> {
    capabilities: &'a CapabilitySet,
    extractor: NodeExtractor<'a>,
    max_depth: usize,
    max_children: usize,
}

impl<'a> TreeSerializer<'a> {
    pub fn new(capabilities: &'a CapabilitySet, config: &SnapshotConfig) -> Self {
        TreeSerializer {
            capabilities,
            extractor: NodeExtractor::new(capabilities),
            max_depth: config.max_depth,
            max_children: config.max_children,
        }
    }

    /// Serialize `root` and its whole subtree.
    ///
    /// The root handle stays owned by the caller; only handles acquired
    /// during the walk are released here.
    pub fn serialize<N: NodeHandle>(&self, root: &N) -> NodeRecord {
        self.serialize_at(root, 0)
    }

    /// Serialize a tree into a full snapshot envelope.
    ///
    /// # Errors
    ///
    /// - `SnapshotError::RootUnavailable` - the host produced no root node
    /// - `SnapshotError::Serialization` - the finished record could not be encoded
    pub fn capture<N: NodeHandle>(&self, root: Option<&N>) -> Result<SnapshotDocument, SnapshotError> {
        let root = root.ok_or_else(|| {
            log::error!("Root node unavailable, no snapshot taken");
            SnapshotError::RootUnavailable
        })?;

        let record = self.serialize(root);
        let document = SnapshotDocument::new(record, self.capabilities.platform_version())?;

        log::info!(
            "Captured snapshot {} ({} nodes, {} truncated)",
            document.snapshot_id,
            document.node_count,
            document.truncated_count
        );
        Ok(document)
    }

    fn serialize_at<N: NodeHandle>(&self, node: &N, depth: usize) -> NodeRecord {
        let mut record = self.extractor.extract(node);
        let child_count = record.child_count;

        if child_count == 0 {
            return record;
        }

        if depth >= self.max_depth {
            log::warn!(
                "Maximum depth {} reached, skipping {} children",
                self.max_depth,
                child_count
            );
            record.truncated = true;
            return record;
        }

        let visit = child_count.min(self.max_children);
        if visit < child_count {
            log::warn!(
                "Node has {} children, visiting the first {}",
                child_count,
                visit
            );
            record.truncated = true;
        }

        for index in 0..visit {
            let Some(child) = ChildGuard::acquire(node, index) else {
                log::debug!("No child handle at index {} of {}", index, child_count);
                continue;
            };
            let child_record = self.serialize_at(&*child, depth + 1);
            record.children.push(child_record);
            drop(child);
        }

        record
    }
}
