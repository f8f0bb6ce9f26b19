use crate::header::SortOrder;
use crate::merge_item::MergeItem;

/// A total order over `MergeItem`s. The cache is parameterized over one
/// instance of this trait, fixed at construction (spec §4.1, §9).
///
/// `less` must only ever look at fields `next_core` already decoded
/// (`ref_id`, `position`, `query_name`) plus `source_id` for tiebreaking —
/// never at the lazily materialized text fields (spec §4.1, §9 "lazy text
/// decoding").
pub trait Ordering: Send + Sync {
    fn less(&self, a: &MergeItem, b: &MergeItem) -> bool;

    /// Human-readable name, used only in diagnostics.
    fn name(&self) -> &'static str;
}

/// `ref_id` ascending with `-1` (unmapped) sorting last, then `position`
/// ascending, then `source_id` ascending as a stable tiebreak.
pub struct ByCoordinate;

impl Ordering for ByCoordinate {
    fn less(&self, a: &MergeItem, b: &MergeItem) -> bool {
        let a_key = coordinate_key(a.handle.ref_id);
        let b_key = coordinate_key(b.handle.ref_id);
        (a_key, a.handle.position, a.source_id) < (b_key, b.handle.position, b.source_id)
    }

    fn name(&self) -> &'static str {
        "coordinate"
    }
}

/// `-1` sorts after every non-negative ref id, per spec §4.1.
pub(crate) fn coordinate_key(ref_id: i32) -> (bool, i32) {
    if ref_id < 0 {
        (true, 0)
    } else {
        (false, ref_id)
    }
}

/// Byte-wise lexicographic `query_name`, then `source_id` as a stable
/// tiebreak.
pub struct ByName;

impl Ordering for ByName {
    fn less(&self, a: &MergeItem, b: &MergeItem) -> bool {
        (a.handle.query_name.as_bytes(), a.source_id) < (b.handle.query_name.as_bytes(), b.source_id)
    }

    fn name(&self) -> &'static str {
        "queryname"
    }
}

/// Round-robins by source insertion order only, consuming each source's
/// backlog in native order (spec §4.1).
pub struct Unsorted;

impl Ordering for Unsorted {
    fn less(&self, a: &MergeItem, b: &MergeItem) -> bool {
        a.source_id < b.source_id
    }

    fn name(&self) -> &'static str {
        "unsorted"
    }
}

/// Selects the ordering implied by a source's declared sort order (spec
/// §4.3.1): coordinate -> ByCoordinate, queryname -> ByName, anything else
/// -> Unsorted.
pub fn ordering_for(sort_order: SortOrder) -> Box<dyn Ordering> {
    match sort_order {
        SortOrder::Coordinate => Box::new(ByCoordinate),
        SortOrder::QueryName => Box::new(ByName),
        SortOrder::Unsorted | SortOrder::Unknown => Box::new(Unsorted),
    }
}
