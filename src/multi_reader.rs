use crate::cache::MergeCache;
use crate::error::{DiagnosticSink, LogSink};
use crate::header::{Header, Region, ReferenceTable};
use crate::merge_item::{MergeItem, SourceId};
use crate::ordering::ordering_for;
use crate::reader::{FileReader, IndexCacheMode, IndexType};
use crate::record::RecordHandle;

/// The orchestrator (spec §4.3): owns the source arena and the current
/// `MergeCache`, and implements every repositioning and read operation.
///
/// `R` is the concrete `FileReader` backend; every source in one
/// `MultiReader` uses the same backend, consistent with the spec's "all
/// live sources share one sort_order / reference table" invariant being
/// meaningful only when sources are otherwise comparable.
///
/// Closed sources leave a `None` tombstone behind rather than shifting the
/// arena (spec §9: "the cache holds indices, not pointers"); `SourceId`s
/// are therefore stable for the lifetime of the `MultiReader` and never
/// reused.
pub struct MultiReader<R: FileReader> {
    sources: Vec<Option<R>>,
    cache: Option<MergeCache>,
    sink: Box<dyn DiagnosticSink>,
}

impl<R: FileReader + Default> Default for MultiReader<R> {
    fn default() -> Self {
        MultiReader::new()
    }
}

impl<R: FileReader + Default> MultiReader<R> {
    pub fn new() -> Self {
        MultiReader {
            sources: Vec::new(),
            cache: None,
            sink: Box::new(LogSink),
        }
    }

    /// Same as `new`, but routes diagnostics through a caller-supplied sink
    /// instead of the default `log`-backed one (spec §6, §10).
    pub fn with_sink(sink: Box<dyn DiagnosticSink>) -> Self {
        MultiReader {
            sources: Vec::new(),
            cache: None,
            sink,
        }
    }

    /// Opens each file via a fresh `FileReader`. Appends a live source for
    /// every path that opens successfully; paths that fail are reported via
    /// the diagnostic sink and do not tear down sources that did open
    /// (spec §4.3). Validates and rebuilds the cache once all paths have
    /// been attempted.
    pub fn open(&mut self, filenames: &[String]) -> bool {
        let mut all_opened = true;
        for filename in filenames {
            let mut reader = R::default();
            if reader.open(filename) {
                self.sources.push(Some(reader));
            } else {
                self.sink.warn(&format!("failed to open source '{}'", filename));
                all_opened = false;
            }
        }

        if self.live_count() >= 2 && !self.validate() {
            return false;
        }

        let cache_ok = self.rebuild_cache();
        all_opened && cache_ok
    }

    /// Sugar for `open(&[filename])`.
    pub fn open_file(&mut self, filename: &str) -> bool {
        self.open(&[filename.to_string()])
    }

    /// Closes every source, drops every handle, drops the cache.
    pub fn close(&mut self) {
        for slot in self.sources.iter_mut() {
            if let Some(reader) = slot {
                reader.close();
            }
        }
        self.sources.clear();
        self.cache = None;
    }

    /// Closes the first source whose filename matches exactly. Evicts its
    /// cache entry before releasing the reader and handle (spec §4.3,
    /// "close-file evicts cache atomically"). Non-matching filenames are
    /// silently skipped.
    pub fn close_file(&mut self, filename: &str) -> bool {
        let found = self
            .sources
            .iter()
            .enumerate()
            .find_map(|(idx, slot)| match slot {
                Some(reader) if reader.filename() == filename => Some(idx),
                _ => None,
            });

        let Some(idx) = found else {
            return false;
        };

        if let Some(cache) = self.cache.as_mut() {
            cache.remove(idx);
        }
        if let Some(reader) = self.sources[idx].as_mut() {
            reader.close();
        }
        self.sources[idx] = None;

        if self.live_count() == 0 {
            self.cache = None;
        }
        true
    }

    /// Closes each filename in turn; one pass per filename (spec §4.3).
    /// Returns true iff every filename matched an open source.
    pub fn close_files(&mut self, filenames: &[String]) -> bool {
        let mut all_found = true;
        for filename in filenames {
            if !self.close_file(filename) {
                all_found = false;
            }
        }
        all_found
    }

    /// True iff any source's underlying stream reports open.
    pub fn has_open_readers(&self) -> bool {
        self.sources.iter().flatten().any(|reader| reader.is_open())
    }

    /// Rewinds every live source to its first record, then rebuilds the
    /// cache.
    pub fn rewind(&mut self) -> bool {
        for (idx, slot) in self.sources.iter_mut().enumerate() {
            if let Some(reader) = slot {
                if !reader.rewind() {
                    self.sink.warn(&format!(
                        "source #{} ('{}') failed to rewind",
                        idx,
                        reader.filename()
                    ));
                }
            }
        }
        self.rebuild_cache()
    }

    /// Attempts `jump(ref_id, pos)` on every live source; a per-source
    /// refusal is logged and treated as "no records there" (spec §4.3.5).
    /// Rebuilds the cache afterward regardless of individual outcomes.
    pub fn jump(&mut self, ref_id: i32, pos: i32) -> bool {
        for (idx, slot) in self.sources.iter_mut().enumerate() {
            if let Some(reader) = slot {
                if !reader.jump(ref_id, pos) {
                    self.sink.warn(&format!(
                        "source #{} ('{}') refused to jump to ({}, {})",
                        idx,
                        reader.filename(),
                        ref_id,
                        pos
                    ));
                }
            }
        }
        self.rebuild_cache()
    }

    /// Same best-effort pattern as `jump`, restricted to `region`.
    pub fn set_region(&mut self, region: Region) -> bool {
        for (idx, slot) in self.sources.iter_mut().enumerate() {
            if let Some(reader) = slot {
                if !reader.set_region(region) {
                    self.sink.warn(&format!(
                        "source #{} ('{}') refused region {:?}",
                        idx,
                        reader.filename(),
                        region
                    ));
                }
            }
        }
        self.rebuild_cache()
    }

    /// Produces the merged-order next record with text fields materialized
    /// (spec §4.3.3).
    pub fn next(&mut self, out: &mut RecordHandle) -> bool {
        self.next_impl(out, true)
    }

    /// Same as `next`, without materializing text fields.
    pub fn next_core(&mut self, out: &mut RecordHandle) -> bool {
        self.next_impl(out, false)
    }

    fn next_impl(&mut self, out: &mut RecordHandle, materialize_text: bool) -> bool {
        let Some(cache) = self.cache.as_mut() else {
            return false;
        };
        let Some(mut popped) = cache.pop_min() else {
            return false;
        };

        let source_id = popped.source_id;
        let Some(reader) = self.sources[source_id].as_mut() else {
            // Invariant violation recovery: the source was closed without
            // evicting this cache entry. Should not happen if close_file
            // is used, but never hand back a reference to a dropped
            // reader.
            return self.next_impl(out, materialize_text);
        };

        if materialize_text {
            reader.build_text(&mut popped.handle);
            popped.handle.source_filename = reader.filename().to_string();
        }
        *out = popped.handle.clone();

        if reader.next_core(&mut popped.handle) {
            self.cache.as_mut().unwrap().insert(popped);
        }
        true
    }

    /// Proxies to the first live source; all live sources are identical by
    /// invariant (spec §4.3).
    pub fn get_reference_count(&self) -> usize {
        self.first_reader().map(|r| r.reference_count()).unwrap_or(0)
    }

    pub fn get_reference_data(&self) -> Option<&ReferenceTable> {
        self.first_reader().map(|r| r.reference_data())
    }

    pub fn get_reference_id(&self, name: &str) -> i32 {
        self.first_reader().map(|r| r.reference_id(name)).unwrap_or(-1)
    }

    /// Merges read groups from every live source into the first source's
    /// header and serializes the result (spec §4.3.4). Returns an empty
    /// string if there are no live sources.
    pub fn get_header_text(&self) -> String {
        match self.get_header() {
            Some(header) => header.to_text(),
            None => String::new(),
        }
    }

    /// Same merge as `get_header_text`, returning the structured header.
    pub fn get_header(&self) -> Option<Header> {
        let mut iter = self.sources.iter().flatten();
        let first = iter.next()?;
        let mut merged = first.header().clone();
        for reader in iter {
            merged.merge_read_groups_from(reader.header());
        }
        Some(merged)
    }

    /// True iff every live source has an index loaded.
    pub fn has_indexes(&self) -> bool {
        self.sources.iter().flatten().all(|reader| reader.has_index())
    }

    /// For each source lacking an index, attempts to load one of
    /// `preferred_type`. AND-folds all results.
    pub fn locate_indexes(&mut self, preferred_type: IndexType) -> bool {
        let mut all_ok = true;
        for slot in self.sources.iter_mut() {
            if let Some(reader) = slot {
                if !reader.has_index() && !reader.locate_index(preferred_type) {
                    self.sink
                        .warn(&format!("no index located for source '{}'", reader.filename()));
                    all_ok = false;
                }
            }
        }
        all_ok
    }

    /// For each source lacking an index, builds one. AND-folds all
    /// results.
    pub fn create_indexes(&mut self, index_type: IndexType) -> bool {
        let mut all_ok = true;
        for slot in self.sources.iter_mut() {
            if let Some(reader) = slot {
                if !reader.has_index() && !reader.create_index(index_type) {
                    self.sink
                        .warn(&format!("failed to create index for source '{}'", reader.filename()));
                    all_ok = false;
                }
            }
        }
        all_ok
    }

    /// Pairs the i-th path with the i-th live source in list order (spec
    /// §4.3, §9: a documented coarse contract, no name matching). Stops
    /// early if there are fewer paths than sources, leaving the remaining
    /// sources untouched; fails immediately if there are more paths than
    /// sources.
    pub fn open_indexes(&mut self, paths: &[String]) -> bool {
        let live_indices: Vec<SourceId> = self
            .sources
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|_| idx))
            .collect();

        if paths.len() > live_indices.len() {
            self.sink.error("more index paths than open sources");
            return false;
        }

        let mut all_ok = true;
        for (path, source_idx) in paths.iter().zip(live_indices.iter()) {
            if let Some(reader) = self.sources[*source_idx].as_mut() {
                if !reader.open_index(path) {
                    self.sink
                        .warn(&format!("failed to open index '{}' for source '{}'", path, reader.filename()));
                    all_ok = false;
                }
            }
        }
        all_ok
    }

    /// Forwards `mode` to every live source.
    pub fn set_index_cache_mode(&mut self, mode: IndexCacheMode) {
        for slot in self.sources.iter_mut() {
            if let Some(reader) = slot {
                reader.set_index_cache_mode(mode);
            }
        }
    }

    fn first_reader(&self) -> Option<&R> {
        self.sources.iter().flatten().next()
    }

    fn live_count(&self) -> usize {
        self.sources.iter().flatten().count()
    }

    /// Rejects if any live source's sort order or reference table differs
    /// from the first's (spec §4.3.2). Called only when >= 2 live sources
    /// exist.
    fn validate(&mut self) -> bool {
        let mut iter = self.sources.iter().flatten();
        let Some(first) = iter.next() else {
            return true;
        };
        let first_sort_order = first.header().sort_order.as_header_tag();
        let first_refs = first.reference_data().clone();

        for reader in iter {
            if reader.header().sort_order.as_header_tag() != first_sort_order {
                self.sink.error(&format!(
                    "source '{}' has sort order '{}', expected '{}'",
                    reader.filename(),
                    reader.header().sort_order.as_header_tag(),
                    first_sort_order
                ));
                return false;
            }
            if reader.reference_data() != &first_refs {
                self.sink.error(&format!(
                    "source '{}' has a reference table incompatible with the first source",
                    reader.filename()
                ));
                return false;
            }
        }
        true
    }

    /// Rebuilds the cache from each live source's first post-reposition
    /// record (spec §4.3.1). Per-source EOF is not an error; only the
    /// cache construction itself can fail (e.g. no sources).
    fn rebuild_cache(&mut self) -> bool {
        let Some(ordering_source) = self.first_reader() else {
            self.cache = None;
            self.sink.warn("cache build failed: no open sources");
            return false;
        };
        let sort_order = ordering_source.header().sort_order;

        let mut cache = MergeCache::new(ordering_for(sort_order));
        cache.clear();

        for (source_id, slot) in self.sources.iter_mut().enumerate() {
            if let Some(reader) = slot {
                let mut handle = RecordHandle::new();
                if reader.next_core(&mut handle) {
                    cache.insert(MergeItem::new(source_id, handle));
                }
            }
        }

        self.cache = Some(cache);
        true
    }

    /// Number of entries currently buffered in the merge cache; exposed for
    /// tests and diagnostics, not part of the spec's public contract.
    #[cfg(test)]
    fn cache_size(&self) -> usize {
        self.cache.as_ref().map(|c| c.size()).unwrap_or(0)
    }
}
