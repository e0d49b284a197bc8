//! OctreeNode - one node of a chunk's LOD octree.
//!
//! A node is Uninitialized, a Leaf owning its extracted meshes, or a Branch
//! of exactly eight children one LOD finer. Never both.
//!
//! ```text
//!   child index bits        z
//!   bit 0 → +X              │  y
//!   bit 1 → +Y              │ ╱
//!   bit 2 → +Z              └──── x
//!
//!   child.local_position = parent.local_position + bits * child_size
//! ```
//!
//! Positions are chunk-local voxel coordinates. The root sits at the origin
//! with LOD `levels_of_detail - 1` and spans the whole chunk.

use glam::{IVec3, Vec3};

use super::bounds::VoxelBounds;
use super::lod::LodRanges;
use super::mask::{Face, TransitionMask};
use crate::config::ChunkConfig;
use crate::presentation::MeshHandle;
use crate::types::{MeshOutput, MeshVertex, TransitionMeshOutput};

// =============================================================================
// LeafKey
// =============================================================================

/// Volume-wide address of a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LeafKey {
  pub chunk: IVec3,
  /// Chunk-local voxel position of the leaf's minimum corner.
  pub position: IVec3,
  pub lod: u8,
}

impl LeafKey {
  /// Chunk and chunk-local voxel one step outside each quadrant centre of
  /// `face`.
  ///
  /// Four probes reach every neighbour across the face as long as adjacent
  /// leaves differ by at most one LOD. Probes past the chunk interior are
  /// rebased into the neighbouring chunk.
  pub fn face_probes(&self, face: Face, config: &ChunkConfig) -> [(IVec3, IVec3); 4] {
    let size = config.node_size(self.lod);
    let axis = face.axis();
    let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
    let (near, far) = (size / 4, size * 3 / 4);

    let mut base = self.position;
    base[axis] = if face.is_positive() {
      self.position[axis] + size
    } else {
      self.position[axis] - 1
    };

    let cs = IVec3::splat(config.chunk_size() as i32);
    [(near, near), (far, near), (near, far), (far, far)].map(|(a, b)| {
      let mut probe = base;
      probe[u] += a;
      probe[v] += b;
      let shift = probe.div_euclid(cs);
      (self.chunk + shift, probe - shift * cs)
    })
  }
}

// =============================================================================
// LeafData
// =============================================================================

/// Meshes and seam state owned by a leaf.
#[derive(Debug, Default)]
pub struct LeafData {
  regular: MeshOutput,
  transition: TransitionMeshOutput,
  mask: TransitionMask,
  handle: Option<MeshHandle>,
  needs_extraction: bool,
  dirty: bool,
}

impl LeafData {
  fn new() -> Self {
    Self {
      needs_extraction: true,
      ..Self::default()
    }
  }

  #[inline]
  pub fn mask(&self) -> TransitionMask {
    self.mask
  }

  /// Set one seam face. A change queues a filter pass.
  pub fn set_seam(&mut self, face: Face, on: bool) -> bool {
    let changed = self.mask.set(face, on);
    self.dirty |= changed;
    changed
  }

  #[inline]
  pub fn needs_extraction(&self) -> bool {
    self.needs_extraction
  }

  #[inline]
  pub fn request_extraction(&mut self) {
    self.needs_extraction = true;
  }

  /// Waiting for a filter pass.
  #[inline]
  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  pub fn regular(&self) -> &MeshOutput {
    &self.regular
  }

  pub fn transition(&self) -> &TransitionMeshOutput {
    &self.transition
  }

  pub fn apply_regular(&mut self, mesh: MeshOutput) {
    self.regular = mesh;
    self.needs_extraction = false;
    self.dirty = true;
  }

  pub fn apply_transition(&mut self, mesh: TransitionMeshOutput) {
    self.transition = mesh;
    self.dirty = true;
  }

  #[inline]
  pub fn handle(&self) -> Option<MeshHandle> {
    self.handle
  }

  pub fn set_handle(&mut self, handle: Option<MeshHandle>) -> Option<MeshHandle> {
    std::mem::replace(&mut self.handle, handle)
  }

  /// Regular mesh plus the seam faces selected by the mask.
  ///
  /// Transition indices are rebased past the regular vertices. Clears the
  /// dirty flag.
  pub fn compose(&mut self) -> (Vec<MeshVertex>, Vec<u32>) {
    self.dirty = false;
    let base = self.regular.vertices.len() as u32;
    let seams = self.transition.filtered_indices(self.mask.bits());

    let mut indices = Vec::with_capacity(self.regular.indices.len() + seams.len());
    indices.extend_from_slice(&self.regular.indices);
    indices.extend(seams.iter().map(|&i| i + base));

    let mut vertices = Vec::new();
    if !indices.is_empty() {
      vertices.reserve(self.regular.vertices.len() + self.transition.vertices.len());
      vertices.extend_from_slice(&self.regular.vertices);
      if !seams.is_empty() {
        vertices.extend_from_slice(&self.transition.vertices);
      }
    }
    (vertices, indices)
  }
}

// =============================================================================
// OctreeNode
// =============================================================================

#[derive(Debug, Default)]
pub enum NodeState {
  #[default]
  Uninitialized,
  Leaf(Box<LeafData>),
  Branch(Box<[OctreeNode; 8]>),
}

/// Inputs of one LOD validation pass over a chunk.
pub struct LodContext<'a> {
  pub chunk: IVec3,
  pub config: &'a ChunkConfig,
  pub ranges: &'a LodRanges,
  /// Viewer position in world units.
  pub viewer: Vec3,
}

/// Structural changes collected during LOD validation.
#[derive(Debug, Default)]
pub struct LodChanges {
  /// Leaves created this pass; each needs extraction and a seam broadcast.
  pub created: Vec<LeafKey>,
  /// Handles of disposed leaf meshes.
  pub released: Vec<MeshHandle>,
}

#[derive(Debug)]
pub struct OctreeNode {
  local_position: IVec3,
  lod: u8,
  size: i32,
  bounds: VoxelBounds,
  state: NodeState,
}

impl OctreeNode {
  fn new(local_position: IVec3, lod: u8, size: i32) -> Self {
    Self {
      local_position,
      lod,
      size,
      bounds: VoxelBounds::from_origin_size(local_position, size),
      state: NodeState::Uninitialized,
    }
  }

  /// Uninitialized root spanning a whole chunk.
  pub fn root(config: &ChunkConfig) -> Self {
    let lod = config.root_lod();
    Self::new(IVec3::ZERO, lod, config.node_size(lod))
  }

  #[inline]
  pub fn local_position(&self) -> IVec3 {
    self.local_position
  }

  #[inline]
  pub fn lod(&self) -> u8 {
    self.lod
  }

  /// Edge length in voxels.
  #[inline]
  pub fn size(&self) -> i32 {
    self.size
  }

  /// Voxels read by this node's cubes, corners included.
  #[inline]
  pub fn bounds(&self) -> VoxelBounds {
    self.bounds
  }

  #[inline]
  pub fn state(&self) -> &NodeState {
    &self.state
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    matches!(self.state, NodeState::Leaf(_))
  }

  #[inline]
  pub fn is_branch(&self) -> bool {
    matches!(self.state, NodeState::Branch(_))
  }

  pub fn leaf(&self) -> Option<&LeafData> {
    match &self.state {
      NodeState::Leaf(leaf) => Some(leaf),
      _ => None,
    }
  }

  pub fn children(&self) -> Option<&[OctreeNode; 8]> {
    match &self.state {
      NodeState::Branch(children) => Some(children),
      _ => None,
    }
  }

  pub fn key(&self, chunk: IVec3) -> LeafKey {
    LeafKey {
      chunk,
      position: self.local_position,
      lod: self.lod,
    }
  }

  // ---------------------------------------------------------------------------
  // State transitions
  // ---------------------------------------------------------------------------

  /// Split into eight children at `lod - 1`, dropping any leaf mesh.
  ///
  /// No-op for branches and LOD 0 nodes. Returns whether the node changed.
  pub fn subdivide(&mut self, config: &ChunkConfig, released: &mut Vec<MeshHandle>) -> bool {
    if self.lod == 0 || self.is_branch() {
      return false;
    }
    self.dispose(released);

    let lod = self.lod - 1;
    let size = config.node_size(lod);
    let origin = self.local_position;
    let children = std::array::from_fn(|i| {
      let bits = IVec3::new((i & 1) as i32, ((i >> 1) & 1) as i32, ((i >> 2) & 1) as i32);
      OctreeNode::new(origin + bits * size, lod, size)
    });
    self.state = NodeState::Branch(Box::new(children));
    true
  }

  /// Collapse into a leaf awaiting extraction, disposing all children.
  ///
  /// No-op for leaves. Returns whether a new leaf was created.
  pub fn make_leaf(&mut self, released: &mut Vec<MeshHandle>) -> bool {
    if self.is_leaf() {
      return false;
    }
    self.dispose(released);
    self.state = NodeState::Leaf(Box::new(LeafData::new()));
    true
  }

  /// Drop this node's subtree, collecting every mesh handle it held.
  pub fn dispose(&mut self, released: &mut Vec<MeshHandle>) {
    match std::mem::take(&mut self.state) {
      NodeState::Leaf(mut leaf) => released.extend(leaf.set_handle(None)),
      NodeState::Branch(mut children) => {
        for child in children.iter_mut() {
          child.dispose(released);
        }
      }
      NodeState::Uninitialized => {}
    }
  }

  // ---------------------------------------------------------------------------
  // Validation
  // ---------------------------------------------------------------------------

  /// Distance from the viewer to this node's centre, in world units.
  pub fn viewer_distance(&self, ctx: &LodContext) -> f32 {
    let centre = (ctx.config.chunk_origin(ctx.chunk) + self.local_position).as_vec3()
      + Vec3::splat(self.size as f32 * 0.5);
    ctx.config.voxel_to_world(centre).distance(ctx.viewer)
  }

  /// Make the subtree match the viewer's LOD bands.
  ///
  /// A node at or below its target LOD becomes a leaf; otherwise it
  /// subdivides and its children are validated in turn.
  pub fn validate_lods(&mut self, ctx: &LodContext, out: &mut LodChanges) {
    let target = ctx.ranges.target_lod(self.viewer_distance(ctx));
    if self.lod <= target {
      if self.make_leaf(&mut out.released) {
        out.created.push(self.key(ctx.chunk));
      }
      return;
    }

    self.subdivide(ctx.config, &mut out.released);
    if let NodeState::Branch(children) = &mut self.state {
      for child in children.iter_mut() {
        child.validate_lods(ctx, out);
      }
    }
  }

  /// Flag every leaf whose bounds touch `edited` for re-extraction.
  pub fn validate_edits(&mut self, chunk: IVec3, edited: &VoxelBounds, out: &mut Vec<LeafKey>) {
    if !self.bounds.intersects(edited) {
      return;
    }
    let key = self.key(chunk);
    match &mut self.state {
      NodeState::Leaf(leaf) => {
        leaf.request_extraction();
        out.push(key);
      }
      NodeState::Branch(children) => {
        for child in children.iter_mut() {
          child.validate_edits(chunk, edited, out);
        }
      }
      NodeState::Uninitialized => {}
    }
  }

  // ---------------------------------------------------------------------------
  // Lookup
  // ---------------------------------------------------------------------------

  #[inline]
  fn child_index(&self, point: IVec3) -> usize {
    let half = self.size / 2;
    let rel = point - self.local_position;
    (rel.x >= half) as usize | ((rel.y >= half) as usize) << 1 | ((rel.z >= half) as usize) << 2
  }

  #[inline]
  fn owns(&self, point: IVec3) -> bool {
    let rel = point - self.local_position;
    rel.min_element() >= 0 && rel.max_element() < self.size
  }

  /// Leaf whose half-open extent holds `point`.
  pub fn leaf_at(&self, point: IVec3) -> Option<&OctreeNode> {
    if !self.owns(point) {
      return None;
    }
    match &self.state {
      NodeState::Leaf(_) => Some(self),
      NodeState::Branch(children) => children[self.child_index(point)].leaf_at(point),
      NodeState::Uninitialized => None,
    }
  }

  /// Leaf data of the leaf at exactly `position` and `lod`.
  pub fn leaf_mut(&mut self, position: IVec3, lod: u8) -> Option<&mut LeafData> {
    if !self.owns(position) || self.lod < lod {
      return None;
    }
    if self.lod == lod {
      let exact = self.local_position == position;
      return match &mut self.state {
        NodeState::Leaf(leaf) if exact => Some(leaf),
        _ => None,
      };
    }
    let index = self.child_index(position);
    match &mut self.state {
      NodeState::Branch(children) => children[index].leaf_mut(position, lod),
      _ => None,
    }
  }

  /// Visit every leaf with its position and LOD.
  pub fn for_each_leaf_mut<F>(&mut self, f: &mut F)
  where
    F: FnMut(IVec3, u8, &mut LeafData),
  {
    match &mut self.state {
      NodeState::Leaf(leaf) => f(self.local_position, self.lod, leaf),
      NodeState::Branch(children) => {
        for child in children.iter_mut() {
          child.for_each_leaf_mut(f);
        }
      }
      NodeState::Uninitialized => {}
    }
  }

  /// Position and LOD of every leaf, in child order.
  pub fn leaves(&self) -> Vec<(IVec3, u8)> {
    let mut out = Vec::new();
    self.collect_leaves(&mut out);
    out
  }

  fn collect_leaves(&self, out: &mut Vec<(IVec3, u8)>) {
    match &self.state {
      NodeState::Leaf(_) => out.push((self.local_position, self.lod)),
      NodeState::Branch(children) => children.iter().for_each(|c| c.collect_leaves(out)),
      NodeState::Uninitialized => {}
    }
  }

  pub fn leaf_count(&self) -> usize {
    match &self.state {
      NodeState::Leaf(_) => 1,
      NodeState::Branch(children) => children.iter().map(OctreeNode::leaf_count).sum(),
      NodeState::Uninitialized => 0,
    }
  }
}

#[cfg(test)]
#[path = "node_test.rs"]
mod node_test;
