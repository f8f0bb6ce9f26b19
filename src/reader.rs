use crate::header::{Header, Region, ReferenceTable};
use crate::record::RecordHandle;

/// Index backend hint passed to `locate_index`/`create_index`. The core
/// never interprets the variant itself, it only forwards it (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    Linear,
    Bai,
    Csi,
}

/// Forwarded verbatim to every source via `set_index_cache_mode` (spec
/// §4.3). Left opaque to the core; a real backend interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCacheMode {
    None,
    PerChromosome,
    Full,
}

/// The external collaborator the spec declares out of scope (§1, §6):
/// single-file parsing of the binary record format, header text parsing, the
/// on-disk block index. `MultiReader` is generic over this trait so the
/// merge engine stays backend-agnostic.
pub trait FileReader {
    /// Opens the ALN file and its header.
    fn open(&mut self, path: &str) -> bool;

    /// Releases file resources.
    fn close(&mut self);

    /// Underlying stream status.
    fn is_open(&self) -> bool;

    /// The path used to open.
    fn filename(&self) -> &str;

    /// Parsed header.
    fn header(&self) -> &Header;

    fn reference_data(&self) -> &ReferenceTable;

    fn reference_count(&self) -> usize {
        self.reference_data().len()
    }

    fn reference_id(&self, name: &str) -> i32 {
        self.reference_data().id_of(name)
    }

    /// Loads the next record, eagerly decoding only the positional fields;
    /// `false` on EOF. Reuses `handle`'s storage (spec §4.1: "comparisons
    /// operate on fields already decoded by `next_core`").
    fn next_core(&mut self, handle: &mut RecordHandle) -> bool;

    /// Populates `handle`'s sequence, quality and tag fields from its raw
    /// payload (spec §3). Decoding is format-specific, so it lives on the
    /// reader; idempotency is enforced by `RecordHandle::build_text_with`.
    fn build_text(&self, handle: &mut RecordHandle);

    /// Repositions to the first record.
    fn rewind(&mut self) -> bool;

    /// Seeks to the first record at or after `(ref_id, pos)`. `false` is a
    /// permissible "no records there" result, not necessarily an I/O error
    /// (spec §6).
    fn jump(&mut self, ref_id: i32, pos: i32) -> bool;

    /// Restricts iteration to `region`; same best-effort semantics as
    /// `jump`.
    fn set_region(&mut self, region: Region) -> bool;

    fn has_index(&self) -> bool;

    fn locate_index(&mut self, index_type: IndexType) -> bool;

    fn create_index(&mut self, index_type: IndexType) -> bool;

    fn open_index(&mut self, path: &str) -> bool;

    fn set_index_cache_mode(&mut self, mode: IndexCacheMode);
}
