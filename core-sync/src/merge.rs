//! # Merge Engine
//!
//! Builds the single document view shown to the user from the three source
//! listings.
//!
//! ## Overview
//!
//! Records are matched by comparison key (normalized name plus size).
//! Sources are visited in a fixed order, local then Dropbox then Drive, so
//! the first source to contribute a key supplies the record's metadata and
//! later sources only add their provenance tag.
//!
//! The merge is always rebuilt from the full listings. Disabling a source
//! and merging again drops that source's tags; nothing from a previous
//! merge is carried over.
//!
//! ## Usage
//!
//! ```ignore
//! use core_sync::merge::{merge, EnabledSources};
//!
//! let documents = merge(&local, &dropbox, &drive, EnabledSources::all());
//! for doc in &documents {
//!     println!("{} {:?}", doc.display_name, doc.source_tags);
//! }
//! ```

use bridge_traits::records::{DriveFile, DropboxFile, LocalDocument};
use core_library::normalizer::normalize_name;
use core_library::{DocumentRecord, SourceRecord, SourceTag};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Which sources take part in a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnabledSources {
    pub local: bool,
    pub dropbox: bool,
    pub drive: bool,
}

impl EnabledSources {
    pub fn all() -> Self {
        Self {
            local: true,
            dropbox: true,
            drive: true,
        }
    }

    pub fn only(tag: SourceTag) -> Self {
        Self {
            local: tag == SourceTag::Local,
            dropbox: tag == SourceTag::Dropbox,
            drive: tag == SourceTag::Drive,
        }
    }

    pub fn contains(&self, tag: SourceTag) -> bool {
        match tag {
            SourceTag::Local => self.local,
            SourceTag::Dropbox => self.dropbox,
            SourceTag::Drive => self.drive,
        }
    }
}

impl Default for EnabledSources {
    fn default() -> Self {
        Self::all()
    }
}

/// Merge raw listings into one record per comparison key, sorted by
/// display name.
pub fn merge(
    local: &[LocalDocument],
    dropbox: &[DropboxFile],
    drive: &[DriveFile],
    enabled: EnabledSources,
) -> Vec<DocumentRecord> {
    let records = local
        .iter()
        .cloned()
        .map(SourceRecord::Local)
        .chain(dropbox.iter().cloned().map(SourceRecord::Dropbox))
        .chain(drive.iter().cloned().map(SourceRecord::Drive));

    merge_records(records, enabled)
}

/// Merge already-tagged records.
///
/// Records are grouped by source first, so the input order across sources
/// does not matter; within a source the first record for a key wins.
pub fn merge_records<I>(records: I, enabled: EnabledSources) -> Vec<DocumentRecord>
where
    I: IntoIterator<Item = SourceRecord>,
{
    let mut by_source: [Vec<SourceRecord>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    for record in records {
        let tag = record.tag();
        if enabled.contains(tag) {
            by_source[precedence(tag)].push(record);
        }
    }

    let mut merged: Vec<DocumentRecord> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in by_source.into_iter().flatten() {
        let incoming = record.into_document();
        match index.get(&incoming.key) {
            Some(&slot) => absorb(&mut merged[slot], incoming),
            None => {
                index.insert(incoming.key.clone(), merged.len());
                merged.push(incoming);
            }
        }
    }

    merged.sort_by(compare_display_names);
    merged
}

fn precedence(tag: SourceTag) -> usize {
    match tag {
        SourceTag::Local => 0,
        SourceTag::Dropbox => 1,
        SourceTag::Drive => 2,
    }
}

/// Fold a duplicate from a later source into the record already held.
fn absorb(existing: &mut DocumentRecord, incoming: DocumentRecord) {
    existing.source_tags.extend(incoming.source_tags);

    if prefers_incoming_name(&existing.display_name, &incoming.display_name) {
        existing.display_name = incoming.display_name;
    }

    // Local records carry no locator; keep the first cloud one seen
    if existing.origin.is_none() {
        existing.origin = incoming.origin;
    }
}

/// A name with a space is taken as the original and one with underscores
/// as a sanitized copy. Any other pairing keeps the existing name.
pub fn prefers_incoming_name(existing: &str, incoming: &str) -> bool {
    incoming.contains(' ') && existing.contains('_') && !existing.contains(' ')
}

/// Sort key for display names: accents stripped, case folded, so
/// `"Éclair"` sorts with the `e`s rather than after `z`.
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn compare_display_names(a: &DocumentRecord, b: &DocumentRecord) -> Ordering {
    collation_key(&a.display_name)
        .cmp(&collation_key(&b.display_name))
        .then_with(|| a.display_name.to_lowercase().cmp(&b.display_name.to_lowercase()))
        .then_with(|| a.display_name.cmp(&b.display_name))
        .then_with(|| a.key.cmp(&b.key))
}

/// True when `local_records` already holds a copy of `cloud`.
///
/// A copy has the same normalized name and a size within `tolerance`
/// bytes (exclusive). This is a heuristic: re-encoded files can fall
/// outside the tolerance and distinct files can fall inside it.
pub fn already_synced(
    cloud: &DocumentRecord,
    local_records: &[DocumentRecord],
    tolerance: u64,
) -> bool {
    let name = normalize_name(&cloud.display_name);
    local_records
        .iter()
        .filter(|local| local.has_tag(SourceTag::Local))
        .any(|local| {
            normalize_name(&local.display_name) == name
                && local.size_bytes.abs_diff(cloud.size_bytes) < tolerance
        })
}
