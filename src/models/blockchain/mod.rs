//! Chain-level domain models.

mod block;

pub use block::{BlockHeader, BlockInfo, BlockMeta, FinalizedBlockInfo};
