//! Per-element data transfer between a source and a target geometry.

mod attributes;
mod corner;
mod error;
mod morph;
mod positions;
mod stack;
mod vertex_group;

pub use attributes::{AttributeTransferOutcome, transfer_all_attributes};
pub use corner::transfer_corner_data;
pub use error::{Severity, TransferError, TransferResult};
pub use morph::{
    BASIS_NAME, MorphTransferReport, RelativeKeyOrder, clear_dangling_relative_keys, transfer_foreign_morph_targets,
    transfer_morph_targets,
};
pub use positions::{PositionReport, transfer_positions};
pub use stack::{EntityRemap, StackEntry, StackSyncReport, StackValue, claim_unprefixed, remap_references, sync_stack};
pub use vertex_group::{DEFAULT_EXPAND, InfluenceMap, build_influence_map, transfer_vertex_groups};
