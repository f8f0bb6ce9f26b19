use crate::record::RecordHandle;

/// Stable identifier for a source's slot in the `MultiReader`'s source
/// arena; doubles as the insertion-order tiebreak used by every ordering
/// (spec §4.1). Never reused: `close_file` removes the slot's `MergeItem`
/// but `SourceId`s are never recycled within one `MultiReader` lifetime.
pub type SourceId = usize;

/// Pair of (reader, handle) representing one source's next-available
/// record slot (spec §3). The reader itself is not stored here — it lives
/// in the `MultiReader`'s source arena, addressed by `source_id`, which is
/// how the cache avoids holding a cyclic borrow back into the source list
/// (spec §9: "the cache holds indices, not pointers").
#[derive(Debug, Clone)]
pub struct MergeItem {
    pub source_id: SourceId,
    pub handle: RecordHandle,
}

impl MergeItem {
    pub fn new(source_id: SourceId, handle: RecordHandle) -> Self {
        MergeItem { source_id, handle }
    }
}
