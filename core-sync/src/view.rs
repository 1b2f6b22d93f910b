//! View state handed to the UI: the merged documents, the raw listings they
//! were built from, and loading flags.

use crate::merge::{merge, EnabledSources};
use bridge_traits::records::{DriveFile, DropboxFile, LocalDocument, UserProfile};
use core_library::{DocumentRecord, SourceRecord, SourceTag};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-provider sync switches stored by the local backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFlags {
    pub dropbox_sync: bool,
    pub drive_sync: bool,
}

impl From<&UserProfile> for SyncFlags {
    fn from(profile: &UserProfile) -> Self {
        Self {
            dropbox_sync: profile.dropbox_sync,
            drive_sync: profile.drive_sync,
        }
    }
}

/// Last listing of every source and the merge built from them.
#[derive(Debug, Default)]
pub struct DocumentView {
    local: Vec<LocalDocument>,
    dropbox: Vec<DropboxFile>,
    drive: Vec<DriveFile>,
    enabled: EnabledSources,
    sync_flags: SyncFlags,
    merged: Vec<DocumentRecord>,
}

impl DocumentView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents(&self) -> &[DocumentRecord] {
        &self.merged
    }

    pub fn sync_flags(&self) -> SyncFlags {
        self.sync_flags
    }

    pub fn enabled_sources(&self) -> EnabledSources {
        self.enabled
    }

    pub fn local_listing(&self) -> &[LocalDocument] {
        &self.local
    }

    /// Local documents in canonical form, unmerged.
    pub fn local_records(&self) -> Vec<DocumentRecord> {
        self.local
            .iter()
            .cloned()
            .map(|doc| SourceRecord::Local(doc).into_document())
            .collect()
    }

    pub fn set_profile(&mut self, profile: UserProfile) {
        self.sync_flags = SyncFlags::from(&profile);
        self.local = profile.documents;
    }

    pub fn set_dropbox(&mut self, files: Vec<DropboxFile>) {
        self.dropbox = files;
    }

    pub fn set_drive(&mut self, files: Vec<DriveFile>) {
        self.drive = files;
    }

    pub fn set_enabled(&mut self, enabled: EnabledSources) {
        self.enabled = enabled;
    }

    /// Drop a source's listing after it failed to load.
    pub fn clear(&mut self, source: SourceTag) {
        match source {
            SourceTag::Local => self.local.clear(),
            SourceTag::Dropbox => self.dropbox.clear(),
            SourceTag::Drive => self.drive.clear(),
        }
    }

    /// Re-merge from the full listings. Returns the document count.
    pub fn rebuild(&mut self) -> usize {
        self.merged = merge(&self.local, &self.dropbox, &self.drive, self.enabled);
        self.merged.len()
    }
}

// ============================================================================
// Loading flags
// ============================================================================

/// Which flag a [`LoadingGuard`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingFlag {
    Local,
    Dropbox,
    Drive,
    Syncing,
}

impl From<SourceTag> for LoadingFlag {
    fn from(tag: SourceTag) -> Self {
        match tag {
            SourceTag::Local => LoadingFlag::Local,
            SourceTag::Dropbox => LoadingFlag::Dropbox,
            SourceTag::Drive => LoadingFlag::Drive,
        }
    }
}

/// Loading indicators for long-running listings and syncs.
///
/// Each flag counts its live guards, so overlapping operations on the same
/// flag keep it raised until the last one finishes.
#[derive(Debug, Default)]
pub struct LoadingFlags {
    local: AtomicUsize,
    dropbox: AtomicUsize,
    drive: AtomicUsize,
    syncing: AtomicUsize,
}

/// Point-in-time copy of [`LoadingFlags`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingSnapshot {
    pub local: bool,
    pub dropbox: bool,
    pub drive: bool,
    pub syncing: bool,
}

impl LoadingFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `flag` until the returned guard is dropped.
    pub fn begin(&self, flag: LoadingFlag) -> LoadingGuard<'_> {
        self.slot(flag).fetch_add(1, Ordering::SeqCst);
        LoadingGuard { flags: self, flag }
    }

    pub fn is_set(&self, flag: LoadingFlag) -> bool {
        self.slot(flag).load(Ordering::SeqCst) > 0
    }

    pub fn snapshot(&self) -> LoadingSnapshot {
        LoadingSnapshot {
            local: self.is_set(LoadingFlag::Local),
            dropbox: self.is_set(LoadingFlag::Dropbox),
            drive: self.is_set(LoadingFlag::Drive),
            syncing: self.is_set(LoadingFlag::Syncing),
        }
    }

    fn slot(&self, flag: LoadingFlag) -> &AtomicUsize {
        match flag {
            LoadingFlag::Local => &self.local,
            LoadingFlag::Dropbox => &self.dropbox,
            LoadingFlag::Drive => &self.drive,
            LoadingFlag::Syncing => &self.syncing,
        }
    }
}

/// Releases its hold on the flag on drop, however the holder exits.
pub struct LoadingGuard<'a> {
    flags: &'a LoadingFlags,
    flag: LoadingFlag,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flags.slot(self.flag).fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            id: 1,
            username: "ana".into(),
            email: "ana@example.com".into(),
            documents: vec![LocalDocument {
                id: 3,
                name: "Notes.txt".into(),
                document: "aGk=".into(),
                doc_type: "text/plain".into(),
                user_id: Some(1),
                size: None,
                folder_id: None,
                date_created: None,
            }],
            dropbox_sync: true,
            drive_sync: false,
        }
    }

    #[test]
    fn test_guard_clears_flag_on_drop() {
        let flags = LoadingFlags::new();
        {
            let _guard = flags.begin(LoadingFlag::Drive);
            assert!(flags.snapshot().drive);
        }
        assert_eq!(flags.snapshot(), LoadingSnapshot::default());
    }

    #[test]
    fn test_guard_clears_flag_on_early_return() {
        fn failing(flags: &LoadingFlags) -> Result<(), ()> {
            let _guard = flags.begin(LoadingFlag::Syncing);
            Err(())
        }

        let flags = LoadingFlags::new();
        assert!(failing(&flags).is_err());
        assert!(!flags.is_set(LoadingFlag::Syncing));
    }

    #[test]
    fn test_overlapping_guards_keep_flag_raised() {
        let flags = LoadingFlags::new();
        let outer = flags.begin(LoadingFlag::Syncing);
        {
            let _inner = flags.begin(LoadingFlag::Syncing);
            assert!(flags.is_set(LoadingFlag::Syncing));
        }
        assert!(flags.is_set(LoadingFlag::Syncing));

        drop(outer);
        assert!(!flags.is_set(LoadingFlag::Syncing));
    }

    #[test]
    fn test_profile_sets_listing_and_flags() {
        let mut view = DocumentView::new();
        view.set_profile(profile());

        assert_eq!(
            view.sync_flags(),
            SyncFlags {
                dropbox_sync: true,
                drive_sync: false
            }
        );
        assert_eq!(view.rebuild(), 1);
        assert_eq!(view.documents()[0].display_name, "Notes.txt");
        assert_eq!(view.local_records().len(), 1);

        view.clear(SourceTag::Local);
        assert_eq!(view.rebuild(), 0);
    }
}
