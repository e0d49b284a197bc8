//! Surface extraction: table-driven marching cubes over a leaf.
//!
//! ```text
//!   VoxelBuffer ──► extract_regular ──► MeshOutput            (cubes³)
//!        │
//!        └───────► extract_transition ──► TransitionMeshOutput (6 × cubes²)
//! ```
//!
//! Both passes are pure functions of a shared buffer, so every leaf of a
//! chunk can be extracted concurrently from one `Arc<VoxelBuffer>`.

mod regular;
mod transition;
mod vertex;

pub use regular::extract_regular;
pub use transition::extract_transition;
pub use vertex::{triangle_area, VertexSampler, DEGENERATE_AREA_EPSILON};

use crate::config::ChunkConfig;
use crate::octree::LeafKey;
use crate::storage::VoxelBuffer;
use crate::types::{MeshOutput, TransitionMeshOutput};

/// Which pass a task runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExtractionKind {
  Regular,
  Transition,
}

/// One unit of extraction work for a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExtractionTask {
  pub leaf: LeafKey,
  pub kind: ExtractionKind,
}

/// Result of an [`ExtractionTask`].
#[derive(Debug)]
pub enum ExtractionOutput {
  Regular(MeshOutput),
  Transition(TransitionMeshOutput),
}

impl ExtractionTask {
  /// Tasks a leaf needs: transition cells only exist above LOD 0.
  pub fn for_leaf(leaf: LeafKey) -> impl Iterator<Item = ExtractionTask> {
    let transition = (leaf.lod > 0).then_some(ExtractionKind::Transition);
    std::iter::once(ExtractionKind::Regular)
      .chain(transition)
      .map(move |kind| ExtractionTask { leaf, kind })
  }

  pub fn run(&self, buffer: &VoxelBuffer, config: &ChunkConfig) -> ExtractionOutput {
    let origin = self.leaf.position;
    match self.kind {
      ExtractionKind::Regular => {
        ExtractionOutput::Regular(extract_regular(buffer, config, origin, self.leaf.lod))
      }
      ExtractionKind::Transition => {
        ExtractionOutput::Transition(extract_transition(buffer, config, origin, self.leaf.lod))
      }
    }
  }
}
