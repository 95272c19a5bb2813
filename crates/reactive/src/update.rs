//! Notifications delivered to view subscribers.

use pivotal_core::{Epoch, RowIndex};
use pivotal_incremental::TreeDelta;

/// Identifier of a view within its table.
pub type ViewId = u64;

/// What one update batch did to one view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewUpdate {
    pub view: ViewId,
    /// Epoch of the batch.
    pub epoch: Epoch,
    /// Table rows whose placement or aggregate inputs were refreshed.
    pub rows: Vec<RowIndex>,
    pub groups_created: usize,
    pub groups_removed: usize,
}

impl ViewUpdate {
    pub fn from_delta(view: ViewId, epoch: Epoch, delta: TreeDelta) -> Self {
        Self {
            view,
            epoch,
            rows: delta.rows,
            groups_created: delta.groups_created,
            groups_removed: delta.groups_removed,
        }
    }

    /// Returns true if the group structure changed.
    pub fn is_structural(&self) -> bool {
        self.groups_created > 0 || self.groups_removed > 0
    }
}
