//! Lifecycle controller for a single managed file
//!
//! The controller is a state machine over ABSENT and PRESENT:
//!
//! ```text
//! ABSENT  --create-->             PRESENT
//! PRESENT --read (no drift)-->    PRESENT, state unchanged
//! PRESENT --read (drift)-->       PRESENT, state taken from disk
//! PRESENT --update (changed)-->   PRESENT, file rewritten
//! PRESENT --delete-->             ABSENT
//! removed externally --read-->    ABSENT
//! ```
//!
//! Every call is synchronous and touches one file. The file is the source of
//! truth on read: drift is recorded, never repaired, until the next apply.

use crate::error::{FileError, Result};
use crate::hasher::digest;
use crate::model::{FileSpec, FileState, Observation};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Permission bits for every file the controller writes
pub const FILE_MODE: u32 = 0o644;

#[derive(Debug, Clone, Copy, Default)]
pub struct FileResourceController;

impl FileResourceController {
    pub fn new() -> Self {
        Self
    }

    /// Write the desired content, replacing whatever is there
    ///
    /// No state is produced when the write fails.
    pub fn create(&self, spec: &FileSpec) -> Result<FileState> {
        let bytes = spec.content().as_bytes();
        write_file(spec.filename(), bytes)?;

        let state = FileState::observed(spec.filename(), bytes);
        info!(
            filename = %spec.filename().display(),
            id = %state.identifier,
            "created file resource"
        );
        Ok(state)
    }

    /// Compare the file on disk against the recorded identifier
    pub fn read(&self, filename: &Path, prior: &FileState) -> Result<Observation> {
        let Some(bytes) = observe(filename)? else {
            info!(
                filename = %filename.display(),
                "file no longer exists, dropping state"
            );
            return Ok(Observation::Absent);
        };

        let current = digest(&bytes);
        if current == prior.identifier {
            debug!(filename = %filename.display(), id = %current, "no drift");
            return Ok(Observation::Unchanged(prior.clone()));
        }

        warn!(
            filename = %filename.display(),
            recorded = %prior.identifier,
            actual = %current,
            "file changed outside of management"
        );
        Ok(Observation::Drifted(FileState::observed(filename, &bytes)))
    }

    /// Rewrite the file when the desired content differs from the last
    /// recorded content, then refresh from disk
    pub fn update(&self, spec: &FileSpec, prior: &FileState) -> Result<Observation> {
        let filename = spec.filename();
        if is_absent(filename) {
            info!(
                filename = %filename.display(),
                "file no longer exists, resource must be recreated"
            );
            return Ok(Observation::Absent);
        }

        if spec.content() == prior.content {
            debug!(filename = %filename.display(), "content unchanged, skipping write");
            return self.read(filename, prior);
        }

        let bytes = spec.content().as_bytes();
        write_file(filename, bytes)?;
        let state = verify_written(filename, &digest(bytes))?;

        info!(
            filename = %filename.display(),
            from = %prior.identifier,
            to = %state.identifier,
            "updated file resource"
        );
        Ok(Observation::Written(state))
    }

    /// Remove the file; a file that is already gone is not an error
    ///
    /// Callers drop the resource's state whether or not this succeeds.
    pub fn delete(&self, filename: &Path) -> Result<()> {
        match fs::remove_file(filename) {
            Ok(()) => {
                info!(filename = %filename.display(), "deleted file resource");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(filename = %filename.display(), "file already absent");
                Ok(())
            }
            Err(e) => Err(FileError::io(filename, e)),
        }
    }
}

/// Existence check that only trusts a definite "not found"
///
/// Other metadata failures (e.g. permission denied on a parent) count as
/// present so that the following read reports the real error.
pub(crate) fn is_absent(filename: &Path) -> bool {
    match fs::metadata(filename) {
        Ok(_) => false,
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            debug!(filename = %filename.display(), "metadata check failed: {}", e);
            false
        }
    }
}

/// Full contents of the file, or None if it does not exist
fn observe(filename: &Path) -> Result<Option<Vec<u8>>> {
    if is_absent(filename) {
        return Ok(None);
    }
    fs::read(filename)
        .map(Some)
        .map_err(|e| FileError::io(filename, e))
}

/// Re-read a file just written and check it carries the expected digest
fn verify_written(filename: &Path, expected: &str) -> Result<FileState> {
    let Some(on_disk) = observe(filename)? else {
        return Err(FileError::VerificationFailed {
            path: filename.to_path_buf(),
            expected: expected.to_string(),
            actual: "<absent>".to_string(),
        });
    };

    let state = FileState::observed(filename, &on_disk);
    if state.identifier != expected {
        return Err(FileError::VerificationFailed {
            path: filename.to_path_buf(),
            expected: expected.to_string(),
            actual: state.identifier,
        });
    }
    Ok(state)
}

/// Write `bytes` to `filename`, creating it with `FILE_MODE` if needed
///
/// The mode of an existing file is left alone, so overwriting a writable file
/// owned by someone else does not fail after the content has landed.
fn write_file(filename: &Path, bytes: &[u8]) -> Result<()> {
    let creating = is_absent(filename);

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }

    let mut file = options
        .open(filename)
        .map_err(|e| FileError::io(filename, e))?;
    file.write_all(bytes)
        .map_err(|e| FileError::io(filename, e))?;

    // The open mode is filtered by the umask
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if creating {
            if let Err(e) = file.set_permissions(fs::Permissions::from_mode(FILE_MODE)) {
                warn!(filename = %filename.display(), "could not set file mode: {}", e);
            }
        }
    }
    #[cfg(not(unix))]
    let _ = creating;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::EMPTY_DIGEST;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn spec(dir: &TempDir, name: &str, content: &str) -> FileSpec {
        FileSpec::new(dir.path().join(name), content).unwrap()
    }

    #[test]
    fn create_writes_content_and_derives_identifier() {
        let dir = TempDir::new().unwrap();
        let spec = spec(&dir, "x.txt", "hello");

        let state = FileResourceController::new().create(&spec).unwrap();

        assert_eq!(fs::read_to_string(spec.filename()).unwrap(), "hello");
        assert_eq!(state.identifier, "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d");
        assert_eq!(state.hash, state.identifier);
        assert_eq!(state.content, "hello");
    }

    #[test]
    fn create_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let spec = spec(&dir, "x.txt", "new");
        fs::write(spec.filename(), "a much longer old content").unwrap();

        FileResourceController::new().create(&spec).unwrap();

        assert_eq!(fs::read_to_string(spec.filename()).unwrap(), "new");
    }

    #[test]
    fn create_empty_content() {
        let dir = TempDir::new().unwrap();
        let state = FileResourceController::new()
            .create(&spec(&dir, "empty.txt", ""))
            .unwrap();
        assert_eq!(state.identifier, EMPTY_DIGEST);
    }

    #[cfg(unix)]
    #[test]
    fn create_sets_fixed_mode_on_new_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let spec = spec(&dir, "x.txt", "hello");

        FileResourceController::new().create(&spec).unwrap();

        let mode = fs::metadata(spec.filename()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, FILE_MODE);
    }

    #[cfg(unix)]
    #[test]
    fn overwrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let controller = FileResourceController::new();
        let path = dir.path().join("shared.txt");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o666)).unwrap();

        let created = controller
            .create(&spec(&dir, "shared.txt", "new content"))
            .unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o666);
        assert_eq!(fs::read_to_string(&path).unwrap(), "new content");

        controller
            .update(&spec(&dir, "shared.txt", "newer"), &created)
            .unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o666);
        assert_eq!(fs::read_to_string(&path).unwrap(), "newer");
    }

    #[test]
    fn verify_written_accepts_matching_digest() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.txt");
        fs::write(&path, "hello").unwrap();

        let state = verify_written(&path, &digest(b"hello")).unwrap();

        assert_eq!(state.identifier, digest(b"hello"));
        assert_eq!(state.content, "hello");
    }

    #[test]
    fn verify_written_reports_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.txt");
        fs::write(&path, "B").unwrap();

        let err = verify_written(&path, &digest(b"A")).unwrap_err();

        match err {
            FileError::VerificationFailed {
                expected, actual, ..
            } => {
                assert_eq!(expected, "6dcd4ce23d88e2ee9568ba546c007c63d9131c1b");
                assert_eq!(actual, "ae4f281df5a5d0ff3cad6371f76d5c29b6d953ec");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn verify_written_reports_vanished_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.txt");

        let err = verify_written(&path, &digest(b"hello")).unwrap_err();

        assert!(matches!(
            err,
            FileError::VerificationFailed { ref actual, .. } if actual == "<absent>"
        ));
        assert_eq!(err.summary(), "File content verification failed");
    }

    #[test]
    fn create_fails_without_parent_directory() {
        let dir = TempDir::new().unwrap();
        let spec = spec(&dir, "missing/child.txt", "hello");

        let err = FileResourceController::new().create(&spec).unwrap_err();

        assert!(matches!(err, FileError::Io { .. }));
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn read_after_create_reports_no_drift() {
        let dir = TempDir::new().unwrap();
        let controller = FileResourceController::new();
        let spec = spec(&dir, "x.txt", "hello");
        let created = controller.create(&spec).unwrap();

        let observation = controller.read(spec.filename(), &created).unwrap();

        assert_eq!(observation, Observation::Unchanged(created));
    }

    #[test]
    fn read_detects_drift_without_touching_the_file() {
        let dir = TempDir::new().unwrap();
        let controller = FileResourceController::new();
        let spec = spec(&dir, "x.txt", "A");
        let created = controller.create(&spec).unwrap();
        fs::write(spec.filename(), "B").unwrap();

        let observation = controller.read(spec.filename(), &created).unwrap();

        let Observation::Drifted(state) = observation else {
            panic!("expected drift, got {:?}", observation);
        };
        assert_eq!(state.content, "B");
        assert_eq!(state.hash, digest(b"B"));
        assert_eq!(state.identifier, state.hash);
        assert_ne!(state.identifier, created.identifier);
        assert_eq!(fs::read_to_string(spec.filename()).unwrap(), "B");
    }

    #[test]
    fn read_of_removed_file_is_absent() {
        let dir = TempDir::new().unwrap();
        let controller = FileResourceController::new();
        let spec = spec(&dir, "x.txt", "hello");
        let created = controller.create(&spec).unwrap();
        fs::remove_file(spec.filename()).unwrap();

        let observation = controller.read(spec.filename(), &created).unwrap();

        assert!(observation.is_absent());
    }

    #[test]
    fn read_of_directory_surfaces_io_error() {
        let dir = TempDir::new().unwrap();
        let prior = FileState::observed(dir.path(), b"");

        let err = FileResourceController::new()
            .read(dir.path(), &prior)
            .unwrap_err();

        assert!(matches!(err, FileError::Io { .. }));
    }

    #[test]
    fn update_rewrites_changed_content() {
        let dir = TempDir::new().unwrap();
        let controller = FileResourceController::new();
        let created = controller.create(&spec(&dir, "x.txt", "hello")).unwrap();

        let desired = spec(&dir, "x.txt", "world");
        let observation = controller.update(&desired, &created).unwrap();

        let Observation::Written(state) = observation else {
            panic!("expected write, got {:?}", observation);
        };
        assert_eq!(fs::read_to_string(desired.filename()).unwrap(), "world");
        assert_eq!(state.identifier, "7c211433f02071597741e6ff5a8ea34789abbf43");
        assert_eq!(state.content, "world");
    }

    #[test]
    fn update_with_same_content_does_not_write() {
        let dir = TempDir::new().unwrap();
        let controller = FileResourceController::new();
        let desired = spec(&dir, "x.txt", "hello");
        let created = controller.create(&desired).unwrap();

        let past = SystemTime::now() - Duration::from_secs(3600);
        let file = fs::File::options()
            .write(true)
            .open(desired.filename())
            .unwrap();
        file.set_modified(past).unwrap();
        drop(file);

        let observation = controller.update(&desired, &created).unwrap();

        assert_eq!(observation, Observation::Unchanged(created.clone()));
        let modified = fs::metadata(desired.filename()).unwrap().modified().unwrap();
        assert!(modified < past + Duration::from_secs(1));
        assert_eq!(observation.state().unwrap().hash, digest(b"hello"));
    }

    #[test]
    fn update_without_content_change_still_reports_drift() {
        let dir = TempDir::new().unwrap();
        let controller = FileResourceController::new();
        let desired = spec(&dir, "x.txt", "hello");
        let created = controller.create(&desired).unwrap();
        fs::write(desired.filename(), "edited").unwrap();

        let observation = controller.update(&desired, &created).unwrap();

        assert!(matches!(observation, Observation::Drifted(ref s) if s.content == "edited"));
        assert_eq!(fs::read_to_string(desired.filename()).unwrap(), "edited");
    }

    #[test]
    fn update_of_removed_file_is_absent_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let controller = FileResourceController::new();
        let created = controller.create(&spec(&dir, "x.txt", "hello")).unwrap();
        fs::remove_file(dir.path().join("x.txt")).unwrap();

        let desired = spec(&dir, "x.txt", "world");
        let observation = controller.update(&desired, &created).unwrap();

        assert!(observation.is_absent());
        assert!(!desired.filename().exists());
    }

    #[test]
    fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let controller = FileResourceController::new();
        let spec = spec(&dir, "x.txt", "hello");
        controller.create(&spec).unwrap();

        controller.delete(spec.filename()).unwrap();
        controller.delete(spec.filename()).unwrap();

        assert!(!spec.filename().exists());
    }

    #[test]
    fn delete_failure_is_surfaced() {
        let dir = TempDir::new().unwrap();
        let err = FileResourceController::new()
            .delete(dir.path())
            .unwrap_err();
        assert!(matches!(err, FileError::Io { .. }));
    }
}
