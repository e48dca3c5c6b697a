//! Versioned view of an instance subtree
//!
//! A component swap replaces the instance's descendants wholesale, so any
//! node reference obtained before the swap is dead afterwards. Rather than
//! relying on callers to remember that, reads go through [`SubtreeView`],
//! which tags its cached node list with a [`SwapGeneration`] and re-fetches
//! whenever the generation has advanced.

use compass_host::{DocumentHost, HostError, NodeRef, NodeId};

/// Monotonic version tag for an instance subtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct SwapGeneration(u64);

impl SwapGeneration {
    /// The generation before any swap
    #[inline]
    #[must_use]
    pub fn initial() -> Self {
        Self(0)
    }

    /// The generation after one more swap
    #[inline]
    #[must_use]
    pub fn advanced(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Cached descendant list that refuses to serve stale generations
#[derive(Debug)]
pub(crate) struct SubtreeView {
    root: NodeId,
    generation: SwapGeneration,
    fetched_at: Option<SwapGeneration>,
    nodes: Vec<NodeRef>,
}

impl SubtreeView {
    pub(crate) fn new(root: NodeId) -> Self {
        Self {
            root,
            generation: SwapGeneration::initial(),
            fetched_at: None,
            nodes: Vec::new(),
        }
    }

    /// Record that the root was swapped; cached nodes are now invalid
    pub(crate) fn advance(&mut self) {
        self.generation = self.generation.advanced();
    }

    /// Drop the cache without advancing the generation
    ///
    /// Used after a transient host failure, where the tree may have
    /// changed under us without a swap of our own.
    pub(crate) fn invalidate(&mut self) {
        self.fetched_at = None;
    }

    /// Current descendants, root first, re-fetched if the generation moved
    pub(crate) async fn nodes<H: DocumentHost>(
        &mut self,
        host: &H,
    ) -> Result<&[NodeRef], HostError> {
        if self.fetched_at != Some(self.generation) {
            self.nodes = host.descendant_instances(&self.root).await?;
            self.fetched_at = Some(self.generation);
        }
        Ok(&self.nodes)
    }
}
