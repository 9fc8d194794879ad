//! Playback Graph
//!
//! A minimal blend graph: N [`ClipNode`]s feeding one [`MixerNode`], whose
//! output is written to a leased skeletal animator.
//!
//! ```text
//! ClipNode(clip 0) ──w=1──┐
//! ClipNode(clip 1) ──w=1──┼──▶ MixerNode ──▶ AnimatorLease (pose sink)
//! ClipNode(clip N) ──w=1──┘
//! ```

pub mod clip_node;
pub mod mixer;
pub mod playback_graph;

pub use clip_node::ClipNode;
pub use mixer::{MixerInput, MixerNode};
pub use playback_graph::{ClipBinding, GraphState, PlaybackGraph};

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeKey;
}
