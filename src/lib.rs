//! Multi-source merging engine for sorted alignment file streams.
//!
//! This crate is the *core* described by the project it is grounded on: it
//! coordinates N independent [`FileReader`](reader::FileReader) backends,
//! keeps a one-record lookahead per source, and exposes the union as a
//! single ordered stream via [`MultiReader`](multi_reader::MultiReader).
//! Parsing the binary record format, the text header, and the on-disk block
//! index are all out of scope here — they are the `FileReader`'s job. A
//! reference adapter backed by `noodles` is provided behind the `noodles`
//! feature for the common case of merging sorted BAM files.

pub mod cache;
pub mod error;
pub mod header;
pub mod merge_item;
pub mod multi_reader;
pub mod ordering;
pub mod reader;
pub mod record;

#[cfg(feature = "noodles")]
pub mod adapters;

pub use cache::MergeCache;
pub use error::{DiagnosticSink, LogSink, MergeError};
pub use header::{Header, ReadGroup, ReferenceEntry, ReferenceTable, Region, SortOrder};
pub use merge_item::{MergeItem, SourceId};
pub use multi_reader::MultiReader;
pub use ordering::{ByCoordinate, ByName, Ordering, Unsorted};
pub use reader::{FileReader, IndexCacheMode, IndexType};
pub use record::RecordHandle;

#[cfg(feature = "noodles")]
pub use adapters::noodles_reader::NoodlesFileReader;
