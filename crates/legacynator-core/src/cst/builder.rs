//! Thin wrapper over Rowan's green node builder

use super::{CsSyntaxKind, CsSyntaxNode};
use rowan::{Checkpoint, GreenNode, GreenNodeBuilder};

/// Builds green trees for the C# CST
///
/// Mirrors `GreenNodeBuilder` but speaks `CsSyntaxKind`, so the parser never
/// touches raw kinds.
#[derive(Default)]
pub struct CstBuilder {
    inner: GreenNodeBuilder<'static>,
}

impl CstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_node(&mut self, kind: CsSyntaxKind) {
        self.inner.start_node(kind.into());
    }

    pub fn finish_node(&mut self) {
        self.inner.finish_node();
    }

    pub fn token(&mut self, kind: CsSyntaxKind, text: &str) {
        self.inner.token(kind.into(), text);
    }

    /// Remember the current position so a node can be wrapped around
    /// children that have already been added
    pub fn checkpoint(&self) -> Checkpoint {
        self.inner.checkpoint()
    }

    /// Start a node whose first child is whatever followed `checkpoint`
    ///
    /// When wrapping at several checkpoints, start the outermost first.
    pub fn start_node_at(&mut self, checkpoint: Checkpoint, kind: CsSyntaxKind) {
        self.inner.start_node_at(checkpoint, kind.into());
    }

    pub fn finish_green(self) -> GreenNode {
        self.inner.finish()
    }

    pub fn finish(self) -> CsSyntaxNode {
        CsSyntaxNode::new_root(self.finish_green())
    }
}
