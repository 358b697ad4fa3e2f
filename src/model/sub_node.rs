//! Reversible mid-span beam splits: a `SubNode` records enough of the
//! original beam to reconstruct it if the split is undone.

use serde::{Deserialize, Serialize};

/// `t` is the original split location, in `(0, 1)` along the original beam.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubNode {
    pub id: u64,
    pub beam_id: u64,
    pub t: f64,
    pub node_id: u64,
    pub original_beam_start: u64,
    pub original_beam_end: u64,
    pub child_beam_ids: [u64; 2],
}

impl SubNode {
    pub fn new(
        id: u64,
        beam_id: u64,
        t: f64,
        node_id: u64,
        original_beam_start: u64,
        original_beam_end: u64,
        child_beam_ids: [u64; 2],
    ) -> Self {
        Self { id, beam_id, t, node_id, original_beam_start, original_beam_end, child_beam_ids }
    }

    /// Whether `node_id` participates in this split, as either the inserted
    /// mid-node or one of the original endpoints.
    pub fn references_node(&self, node_id: u64) -> bool {
        self.node_id == node_id || self.original_beam_start == node_id || self.original_beam_end == node_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_node_matches_any_endpoint() {
        let sn = SubNode::new(1, 10, 0.5, 99, 1, 2, [20, 21]);
        assert!(sn.references_node(99));
        assert!(sn.references_node(1));
        assert!(sn.references_node(2));
        assert!(!sn.references_node(3));
    }
}
