/*!
 * Backend-neutral description of an audio processing graph.
 *
 * The compositor describes what to do with the clips (delay, mix, normalize)
 * as a small graph; a `MediaBackend` decides how to execute it.
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Handle to a stream inside a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRef {
    /// The n-th input file
    Input(usize),
    /// The output of the n-th node
    Node(usize),
}

/// Target sample format of a normalize step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// One processing step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioNode {
    /// Prepend silence to every channel
    Delay { source: StreamRef, delay: Duration },
    /// Additive mix of two streams, no gain reduction
    Mix { left: StreamRef, right: StreamRef },
    /// Resample and remap channels
    Normalize { source: StreamRef, format: StreamFormat },
}

/// Audio graph with file inputs and a single output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioGraph {
    inputs: Vec<PathBuf>,
    nodes: Vec<AudioNode>,
    output: Option<StreamRef>,
}

impl AudioGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input file
    pub fn input<P: AsRef<Path>>(&mut self, path: P) -> StreamRef {
        self.inputs.push(path.as_ref().to_path_buf());
        StreamRef::Input(self.inputs.len() - 1)
    }

    /// Shift a stream's onset by `delay`
    pub fn delay(&mut self, source: StreamRef, delay: Duration) -> StreamRef {
        self.push(AudioNode::Delay { source, delay })
    }

    /// Sum two streams
    pub fn mix(&mut self, left: StreamRef, right: StreamRef) -> StreamRef {
        self.push(AudioNode::Mix { left, right })
    }

    /// Convert a stream to a fixed sample rate and channel layout
    pub fn normalize(&mut self, source: StreamRef, format: StreamFormat) -> StreamRef {
        self.push(AudioNode::Normalize { source, format })
    }

    /// Mark the stream the graph produces
    pub fn set_output(&mut self, stream: StreamRef) {
        self.output = Some(stream);
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn nodes(&self) -> &[AudioNode] {
        &self.nodes
    }

    pub fn output(&self) -> Option<StreamRef> {
        self.output
    }

    fn push(&mut self, node: AudioNode) -> StreamRef {
        self.nodes.push(node);
        StreamRef::Node(self.nodes.len() - 1)
    }
}
