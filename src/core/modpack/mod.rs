pub mod installer;
pub mod manifest;
pub mod report;

pub use installer::Installer;
pub use manifest::{FileEntry, FileEnv, ModManifest, Side, SideSupport, MANIFEST_FILE_NAME};
pub use report::{
    AttemptFailureKind, EntryOutcome, EntryReport, FailedAttempt, InstallReport, ReportCounts,
};
