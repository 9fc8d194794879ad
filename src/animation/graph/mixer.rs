use slotmap::SlotMap;

use crate::animation::graph::NodeKey;
use crate::animation::graph::clip_node::ClipNode;
use crate::animation::pose::{Pose, PoseAccumulator};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MixerInput {
    pub node: Option<NodeKey>,
    pub weight: f32,
}

/// Blends a fixed number of clip-node inputs into one pose.
///
/// The input count is set at construction and never changes. Weights are
/// applied as-is: inputs at weight 1 add up rather than average.
#[derive(Debug, Clone)]
pub struct MixerNode {
    inputs: Box<[MixerInput]>,
    speed: f32,
    paused: bool,
}

impl MixerNode {
    #[must_use]
    pub fn new(input_count: usize) -> Self {
        Self {
            inputs: vec![MixerInput::default(); input_count].into_boxed_slice(),
            speed: 1.0,
            paused: false,
        }
    }

    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    #[must_use]
    pub fn inputs(&self) -> &[MixerInput] {
        &self.inputs
    }

    #[must_use]
    pub fn input(&self, index: usize) -> Option<&MixerInput> {
        self.inputs.get(index)
    }

    /// Connects `node` to input `index`. Fails if the index is out of range or
    /// already connected.
    pub fn connect(&mut self, index: usize, node: NodeKey) -> bool {
        match self.inputs.get_mut(index) {
            Some(input) if input.node.is_none() => {
                input.node = Some(node);
                true
            }
            _ => false,
        }
    }

    pub fn set_input_weight(&mut self, index: usize, weight: f32) -> bool {
        let Some(input) = self.inputs.get_mut(index) else {
            return false;
        };
        input.weight = weight;
        true
    }

    #[must_use]
    pub fn input_weight(&self, index: usize) -> Option<f32> {
        self.inputs.get(index).map(|i| i.weight)
    }

    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn play(&mut self) {
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Rate at which connected nodes advance: `0` while paused.
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        if self.paused { 0.0 } else { self.speed }
    }

    /// Samples every connected input and writes the weighted sum into `pose`.
    pub fn evaluate(&self, nodes: &mut SlotMap<NodeKey, ClipNode>, pose: &mut Pose) {
        let mut acc = PoseAccumulator::new();
        for input in self.inputs.iter() {
            if input.weight == 0.0 {
                continue;
            }
            let Some(node) = input.node.and_then(|key| nodes.get_mut(key)) else {
                continue;
            };
            node.accumulate(input.weight, &mut acc);
        }
        acc.finish(pose);
    }
}
