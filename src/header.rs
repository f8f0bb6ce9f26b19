use std::collections::BTreeMap;

/// Declared sort order of a single source, matched against the exact header
/// spellings in spec §6 ("coordinate", "queryname", "unsorted", "unknown").
/// Any other spelling falls back to `Unsorted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Coordinate,
    QueryName,
    Unsorted,
    Unknown,
}

impl SortOrder {
    /// Parses the exact header tag, defaulting unrecognized spellings to
    /// `Unsorted` per spec §4.3.1 ("anything else -> Unsorted").
    pub fn from_header_tag(tag: &str) -> SortOrder {
        match tag {
            "coordinate" => SortOrder::Coordinate,
            "queryname" => SortOrder::QueryName,
            "unsorted" => SortOrder::Unsorted,
            "unknown" => SortOrder::Unknown,
            _ => SortOrder::Unsorted,
        }
    }

    pub fn as_header_tag(&self) -> &'static str {
        match self {
            SortOrder::Coordinate => "coordinate",
            SortOrder::QueryName => "queryname",
            SortOrder::Unsorted => "unsorted",
            SortOrder::Unknown => "unknown",
        }
    }
}

/// `(name, length)` pair, equal iff both fields match exactly (spec §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub name: String,
    pub length: u32,
}

/// Ordered sequence of reference entries; position in the vector is the
/// reference id used throughout the crate (`-1` denotes unmapped/unknown).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    entries: Vec<ReferenceEntry>,
}

impl ReferenceTable {
    pub fn new(entries: Vec<ReferenceEntry>) -> Self {
        ReferenceTable { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, ref_id: i32) -> Option<&ReferenceEntry> {
        if ref_id < 0 {
            return None;
        }
        self.entries.get(ref_id as usize)
    }

    pub fn id_of(&self, name: &str) -> i32 {
        match self.entries.iter().position(|e| e.name == name) {
            Some(idx) => idx as i32,
            None => -1,
        }
    }

    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }
}

/// A read-group record, keyed by its `ID` field. Only the id and the raw
/// line are retained; the multireader never interprets other read-group
/// fields, it only deduplicates by id (spec §4.3.4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadGroup {
    pub id: String,
    pub raw_line: String,
}

/// Structured view of a source's text header (spec §3).
///
/// `read_groups` is a set-like mapping keyed by read-group id: inserting a
/// duplicate id is a no-op, matching the "first occurrence wins" contract
/// used by `MultiReader::get_header_text`.
#[derive(Debug, Clone)]
pub struct Header {
    pub sort_order: SortOrder,
    read_groups: BTreeMap<String, ReadGroup>,
    read_group_order: Vec<String>,
    /// Every other header line, verbatim, in original order (`@HD`, `@PG`,
    /// `@CO`, ...). Only ever taken from the first source (spec §4.3.4).
    other_lines: Vec<String>,
}

impl Default for Header {
    fn default() -> Self {
        Header::new(SortOrder::Unsorted, Vec::new())
    }
}

impl Header {
    pub fn new(sort_order: SortOrder, other_lines: Vec<String>) -> Self {
        Header {
            sort_order,
            read_groups: BTreeMap::new(),
            read_group_order: Vec::new(),
            other_lines,
        }
    }

    /// Inserts a read group; a no-op if `id` is already present (spec §3).
    pub fn insert_read_group(&mut self, group: ReadGroup) {
        if !self.read_groups.contains_key(&group.id) {
            self.read_group_order.push(group.id.clone());
            self.read_groups.insert(group.id.clone(), group);
        }
    }

    pub fn read_group_count(&self) -> usize {
        self.read_groups.len()
    }

    pub fn contains_read_group(&self, id: &str) -> bool {
        self.read_groups.contains_key(id)
    }

    /// Merges `other`'s read groups into `self`, first-writer-wins, then
    /// returns `self` (spec §4.3.4).
    pub fn merge_read_groups_from(&mut self, other: &Header) {
        for id in &other.read_group_order {
            if let Some(group) = other.read_groups.get(id) {
                self.insert_read_group(group.clone());
            }
        }
    }

    /// Serializes back to header text: `other_lines` verbatim, followed by
    /// one `@RG` line per read group in insertion order.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for line in &self.other_lines {
            text.push_str(line);
            text.push('\n');
        }
        for id in &self.read_group_order {
            if let Some(group) = self.read_groups.get(id) {
                text.push_str(&group.raw_line);
                text.push('\n');
            }
        }
        text
    }
}

/// Half-open interval over the `(ref_id, pos)` lexicographic space (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub left_ref_id: i32,
    pub left_pos: i32,
    pub right_ref_id: i32,
    pub right_pos: i32,
}

impl Region {
    pub fn new(left_ref_id: i32, left_pos: i32, right_ref_id: i32, right_pos: i32) -> Self {
        Region {
            left_ref_id,
            left_pos,
            right_ref_id,
            right_pos,
        }
    }
}
