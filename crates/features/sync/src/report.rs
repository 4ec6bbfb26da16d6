use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: usize,
    /// Remote calls that failed; those records stay unsynced for the next cycle.
    pub failed: usize,
    /// Records deleted or synced by someone else between snapshot and upload.
    pub skipped: usize,
    /// Records whose remote copy no longer exists, usually deleted from another device.
    /// They keep their `remote_id`, stay unsynced and are reported again next cycle.
    pub orphaned: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    /// Already present locally.
    pub skipped: usize,
    /// Deleted on this device; not re-imported.
    pub suppressed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionReport {
    pub deleted: usize,
    pub failed: usize,
}

/// Outcome of [`crate::Reconciler::full_sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub import: ImportReport,
    pub upload: UploadReport,
    pub deletions: DeletionReport,
}

impl SyncReport {
    /// Whether the sync imported or deleted anything.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.import.imported > 0 || self.deletions.deleted > 0
    }

    #[must_use]
    pub const fn failures(&self) -> usize {
        self.upload.failed + self.deletions.failed
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "imported {}, suppressed {}, uploaded {}, deleted {}, orphaned {}, failed {}",
            self.import.imported,
            self.import.suppressed,
            self.upload.uploaded,
            self.deletions.deleted,
            self.upload.orphaned,
            self.failures()
        )
    }
}
