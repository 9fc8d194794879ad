use slotmap::SlotMap;

use crate::animation::clip::ClipHandle;
use crate::animation::graph::NodeKey;
use crate::animation::graph::clip_node::ClipNode;
use crate::animation::graph::mixer::MixerNode;
use crate::animation::pose::Pose;
use crate::rig::{AnimatorLease, SkeletalHost};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphState {
    Playing,
    Stopped,
}

/// Pairs a clip with the node sampling it inside one graph.
#[derive(Debug, Clone)]
pub struct ClipBinding {
    clip: ClipHandle,
    node: NodeKey,
}

impl ClipBinding {
    #[must_use]
    pub fn clip(&self) -> &ClipHandle {
        &self.clip
    }

    #[must_use]
    pub fn node(&self) -> NodeKey {
        self.node
    }
}

/// A mixer over one clip node per clip, bound to a leased animator.
///
/// The clip set is fixed at build time. Changing clips means building a new
/// graph.
#[derive(Debug)]
pub struct PlaybackGraph {
    nodes: SlotMap<NodeKey, ClipNode>,
    mixer: MixerNode,
    bindings: Vec<ClipBinding>,
    sink: Option<AnimatorLease>,
    state: GraphState,
    pose: Pose,
}

impl PlaybackGraph {
    /// Builds a mixer with one input per clip, in order.
    ///
    /// Every input gets weight `1` and every node starts at local time `0`.
    /// The mixer starts at speed `0`, so the graph is playing but frozen.
    #[must_use]
    pub fn build(sink: AnimatorLease, clips: &[ClipHandle]) -> Self {
        let mut nodes = SlotMap::with_capacity_and_key(clips.len());
        let mut mixer = MixerNode::new(clips.len());
        let mut bindings = Vec::with_capacity(clips.len());

        for (index, clip) in clips.iter().enumerate() {
            let node = nodes.insert(ClipNode::new(ClipHandle::clone(clip)));
            mixer.connect(index, node);
            mixer.set_input_weight(index, 1.0);
            bindings.push(ClipBinding {
                clip: ClipHandle::clone(clip),
                node,
            });
        }

        mixer.set_speed(0.0);
        mixer.play();

        log::debug!(
            "Built playback graph with {} clip(s) for animator {:?}",
            bindings.len(),
            sink.animator()
        );

        Self {
            nodes,
            mixer,
            bindings,
            sink: Some(sink),
            state: GraphState::Playing,
            pose: Pose::new(),
        }
    }

    #[must_use]
    pub fn bindings(&self) -> &[ClipBinding] {
        &self.bindings
    }

    #[must_use]
    pub fn mixer(&self) -> &MixerNode {
        &self.mixer
    }

    pub fn mixer_mut(&mut self) -> &mut MixerNode {
        &mut self.mixer
    }

    #[must_use]
    pub fn node(&self, key: NodeKey) -> Option<&ClipNode> {
        self.nodes.get(key)
    }

    #[must_use]
    pub fn state(&self) -> GraphState {
        self.state
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state == GraphState::Playing
    }

    pub fn play(&mut self) {
        self.state = GraphState::Playing;
    }

    pub fn stop(&mut self) {
        self.state = GraphState::Stopped;
    }

    /// Scrubs every binding to `progress × clip.duration`. `progress` is not
    /// clamped.
    pub fn set_progress(&mut self, progress: f32) {
        for binding in &self.bindings {
            if let Some(node) = self.nodes.get_mut(binding.node) {
                node.set_time(binding.clip.duration() * progress);
            }
        }
    }

    /// Progress of the first binding, or `None` for an empty graph.
    #[must_use]
    pub fn progress(&self) -> Option<f32> {
        let first = self.bindings.first()?;
        self.nodes.get(first.node).map(ClipNode::progress)
    }

    /// Advances node time by `dt × mixer speed` while playing and unpaused.
    pub fn advance(&mut self, dt: f32) {
        if !self.is_playing() {
            return;
        }
        let step = dt * self.mixer.effective_speed();
        if step == 0.0 {
            return;
        }
        for binding in &self.bindings {
            if let Some(node) = self.nodes.get_mut(binding.node) {
                node.advance(step);
            }
        }
        log::trace!("Advanced playback graph by {step}s");
    }

    /// Last evaluated pose.
    #[must_use]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn evaluate(&mut self) -> &Pose {
        self.mixer.evaluate(&mut self.nodes, &mut self.pose);
        &self.pose
    }

    /// Evaluates and writes the pose to the leased animator, if still held.
    pub fn push_pose(&mut self, host: &mut dyn SkeletalHost) {
        self.mixer.evaluate(&mut self.nodes, &mut self.pose);
        if let Some(sink) = &self.sink {
            host.apply_pose(sink.animator(), &self.pose);
        }
    }

    #[must_use]
    pub fn sink(&self) -> Option<&AnimatorLease> {
        self.sink.as_ref()
    }

    /// Hands the animator lease back to the caller; the graph keeps its
    /// nodes but no longer drives a target.
    pub fn take_sink(&mut self) -> Option<AnimatorLease> {
        self.sink.take()
    }
}
