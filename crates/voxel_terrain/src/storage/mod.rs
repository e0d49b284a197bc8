//! Voxel storage: dense padded buffers, sparse RLE stores and the pool that
//! moves chunks between the two.

mod buffer;
mod density_range;
mod overrides;
mod pool;
mod sparse;

pub use buffer::VoxelBuffer;
pub use density_range::DensityRange;
pub use overrides::{Axis, PlaneRule, VoxelOverrides};
pub use pool::{DenseBufferPool, DenseLease};
pub use sparse::{pack, unpack, validate_runs, SparseRun, SparseVoxelStore};
