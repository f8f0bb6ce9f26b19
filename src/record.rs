/// Opaque, reusable buffer owning one partially-decoded record plus enough
/// metadata to build its text fields on demand (spec §3).
///
/// `next_core` on a `FileReader` only needs to populate `ref_id`, `position`
/// and `query_name`, which is what merge ordering compares on; `payload` and
/// the other text fields are decoded lazily by `build_text`.
#[derive(Debug, Clone, Default)]
pub struct RecordHandle {
    pub ref_id: i32,
    pub position: i32,
    pub query_name: String,

    /// Raw encoded bytes as produced by the backend; opaque to the merge
    /// engine, consumed only by `build_text`.
    pub payload: Vec<u8>,

    sequence: String,
    quality: String,
    tags: Vec<(String, String)>,
    text_materialized: bool,

    /// Populated by `MultiReader::next` once the handle is bound to a
    /// source; empty until then (spec §3).
    pub source_filename: String,
}

impl RecordHandle {
    pub fn new() -> Self {
        RecordHandle::default()
    }

    /// Resets positional fields and payload and clears the materialized
    /// flag; called by a `FileReader` before decoding the next record into
    /// a reused handle.
    pub fn reset(&mut self, ref_id: i32, position: i32, query_name: String, payload: Vec<u8>) {
        self.ref_id = ref_id;
        self.position = position;
        self.query_name = query_name;
        self.payload = payload;
        self.sequence.clear();
        self.quality.clear();
        self.tags.clear();
        self.text_materialized = false;
    }

    pub fn is_text_materialized(&self) -> bool {
        self.text_materialized
    }

    /// Populates sequence, quality and tag fields from `payload`. Idempotent
    /// (spec §3): a second call is a no-op.
    ///
    /// The core never needs to know the actual binary layout of `payload` —
    /// that decoding lives in the `FileReader` implementation. Here we
    /// accept a decode closure so the engine stays backend-agnostic while
    /// still only ever decoding once per handle.
    pub fn build_text_with<F>(&mut self, decode: F)
    where
        F: FnOnce(&[u8]) -> (String, String, Vec<(String, String)>),
    {
        if self.text_materialized {
            return;
        }
        let (sequence, quality, tags) = decode(&self.payload);
        self.sequence = sequence;
        self.quality = quality;
        self.tags = tags;
        self.text_materialized = true;
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn quality(&self) -> &str {
        &self.quality
    }

    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }
}
