use slotmap::new_key_type;

/// 1-based inclusive sequence coordinate.
pub type Coord = u32;
pub type ScoreType = f32;

new_key_type! {
    /// Handle of a node stored in a [`FeatureArena`](crate::data_structs::FeatureArena).
    ///
    /// Handles are generational: once a node is freed its handle never
    /// resolves again, even if the slot is reused.
    pub struct NodeId;
}
