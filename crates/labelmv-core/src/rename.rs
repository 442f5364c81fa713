//! Moving scan files (and their data directories) to their new names.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::RenameError;
use crate::models::config::RenameConfig;

/// Paths after a successful rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedPaths {
    /// New location of the file.
    pub file: PathBuf,
    /// New location of the companion data directory, if one was moved.
    pub companion_dir: Option<PathBuf>,
    /// The file already had the requested name; nothing moved.
    pub unchanged: bool,
}

/// Performs renames inside a target directory.
///
/// Never overwrites: a rename onto an existing path fails before anything is
/// touched.
#[derive(Debug, Clone, Default)]
pub struct RenameExecutor {
    config: RenameConfig,
}

impl RenameExecutor {
    pub fn new(config: RenameConfig) -> Self {
        Self { config }
    }

    /// Move `current` to `target_dir/new_name`.
    ///
    /// With `move_companion_dir` set, a sibling `<old stem>/` directory moves
    /// to `<new stem>/`. If that second move fails the file is moved back, so
    /// callers see both moved or neither. The one exception is a failed move
    /// back, reported as [`RenameError::PartialMove`].
    pub fn rename(
        &self,
        target_dir: &Path,
        current: &Path,
        new_name: &str,
    ) -> Result<RenamedPaths, RenameError> {
        validate_file_name(new_name)?;

        if fs::symlink_metadata(current).is_err() {
            return Err(RenameError::SourceMissing(current.to_path_buf()));
        }

        let destination = target_dir.join(new_name);
        if same_path(current, &destination) {
            debug!("{} already has the requested name", current.display());
            return Ok(RenamedPaths {
                file: destination,
                companion_dir: None,
                unchanged: true,
            });
        }

        if fs::symlink_metadata(&destination).is_ok() {
            return Err(RenameError::DestinationExists(destination));
        }

        let companion = if self.config.move_companion_dir {
            self.companion_move(current, &destination)?
        } else {
            None
        };

        move_together(current, &destination, companion.as_ref(), |from, to| {
            fs::rename(from, to)
        })?;

        info!("Renamed {} -> {}", current.display(), destination.display());

        Ok(RenamedPaths {
            file: destination,
            companion_dir: companion.map(|(_, to)| to),
            unchanged: false,
        })
    }

    /// Source and destination of the data directory move, if there is one.
    fn companion_move(
        &self,
        current: &Path,
        destination: &Path,
    ) -> Result<Option<(PathBuf, PathBuf)>, RenameError> {
        let (Some(old_stem), Some(new_stem)) = (current.file_stem(), destination.file_stem())
        else {
            return Ok(None);
        };

        let from = current.with_file_name(old_stem);
        if !from.is_dir() {
            return Ok(None);
        }

        let to = destination.with_file_name(new_stem);
        if fs::symlink_metadata(&to).is_ok() {
            return Err(RenameError::DestinationExists(to));
        }

        Ok(Some((from, to)))
    }
}

/// Move the file, then the companion directory, undoing the file move if the
/// second step fails.
fn move_together<M>(
    from: &Path,
    to: &Path,
    companion: Option<&(PathBuf, PathBuf)>,
    mv: M,
) -> Result<(), RenameError>
where
    M: Fn(&Path, &Path) -> std::io::Result<()>,
{
    mv(from, to).map_err(|source| move_error(from, to, source))?;

    let Some((dir_from, dir_to)) = companion else {
        return Ok(());
    };

    if let Err(source) = mv(dir_from, dir_to) {
        warn!(
            "Moving data directory {} failed, restoring {}",
            dir_from.display(),
            from.display()
        );
        if let Err(restore) = mv(to, from) {
            warn!(
                "Could not restore {} from {}: {}",
                from.display(),
                to.display(),
                restore
            );
            return Err(RenameError::PartialMove {
                file: to.to_path_buf(),
                source,
            });
        }
        return Err(move_error(dir_from, dir_to, source));
    }

    Ok(())
}

fn move_error(from: &Path, to: &Path, source: std::io::Error) -> RenameError {
    RenameError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    }
}

/// A bare, non-empty file name with no directory components.
pub(crate) fn validate_file_name(name: &str) -> Result<(), RenameError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        Err(RenameError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

fn same_path(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), b.parent().map(fs::canonicalize)) {
        (Ok(a), Some(Ok(parent))) => b.file_name().is_some_and(|name| a == parent.join(name)),
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("scan01.mrxs");
        fs::write(&file, b"slide").unwrap();
        (dir, file)
    }

    #[test]
    fn test_rename_file() {
        let (dir, file) = setup();
        let executor = RenameExecutor::default();

        let renamed = executor
            .rename(dir.path(), &file, "12-345_CD3_NP-102.mrxs")
            .unwrap();

        assert_eq!(renamed.file, dir.path().join("12-345_CD3_NP-102.mrxs"));
        assert!(renamed.file.exists());
        assert!(!file.exists());
        assert_eq!(renamed.companion_dir, None);
    }

    #[test]
    fn test_moves_companion_dir() {
        let (dir, file) = setup();
        let data = dir.path().join("scan01");
        fs::create_dir(&data).unwrap();
        fs::write(data.join("Slidedat.ini"), b"[GENERAL]").unwrap();

        let renamed = RenameExecutor::default()
            .rename(dir.path(), &file, "12-345_CD3_NP-102.mrxs")
            .unwrap();

        let moved = dir.path().join("12-345_CD3_NP-102");
        assert_eq!(renamed.companion_dir, Some(moved.clone()));
        assert!(moved.join("Slidedat.ini").exists());
        assert!(!data.exists());
    }

    #[test]
    fn test_companion_dir_disabled() {
        let (dir, file) = setup();
        fs::create_dir(dir.path().join("scan01")).unwrap();

        let executor = RenameExecutor::new(RenameConfig {
            move_companion_dir: false,
        });
        let renamed = executor.rename(dir.path(), &file, "new.mrxs").unwrap();

        assert_eq!(renamed.companion_dir, None);
        assert!(dir.path().join("scan01").is_dir());
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let (dir, file) = setup();
        let existing = dir.path().join("taken.mrxs");
        fs::write(&existing, b"other").unwrap();

        let err = RenameExecutor::default()
            .rename(dir.path(), &file, "taken.mrxs")
            .unwrap_err();

        assert!(matches!(err, RenameError::DestinationExists(p) if p == existing));
        assert!(file.exists());
        assert_eq!(fs::read(&existing).unwrap(), b"other");
    }

    #[test]
    fn test_companion_collision_leaves_everything() {
        let (dir, file) = setup();
        fs::create_dir(dir.path().join("scan01")).unwrap();
        fs::create_dir(dir.path().join("new")).unwrap();

        let err = RenameExecutor::default()
            .rename(dir.path(), &file, "new.mrxs")
            .unwrap_err();

        assert!(matches!(err, RenameError::DestinationExists(_)));
        assert!(file.exists());
        assert!(dir.path().join("scan01").is_dir());
        assert!(!dir.path().join("new.mrxs").exists());
    }

    #[test]
    fn test_same_name_is_noop() {
        let (dir, file) = setup();
        let renamed = RenameExecutor::default()
            .rename(dir.path(), &file, "scan01.mrxs")
            .unwrap();

        assert!(renamed.unchanged);
        assert!(file.exists());
    }

    #[test]
    fn test_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = RenameExecutor::default()
            .rename(dir.path(), &dir.path().join("gone.mrxs"), "x.mrxs")
            .unwrap_err();
        assert!(matches!(err, RenameError::SourceMissing(_)));
    }

    #[test]
    fn test_missing_target_dir_fails_cleanly() {
        let (dir, file) = setup();
        let err = RenameExecutor::default()
            .rename(&dir.path().join("nope"), &file, "x.mrxs")
            .unwrap_err();

        assert!(matches!(err, RenameError::Move { .. }));
        assert!(file.exists());
    }

    #[test]
    fn test_invalid_names() {
        let (dir, file) = setup();
        let executor = RenameExecutor::default();
        for name in ["", ".", "..", "../escape.mrxs", "a/b.mrxs", "a\\b.mrxs"] {
            let err = executor.rename(dir.path(), &file, name).unwrap_err();
            assert!(matches!(err, RenameError::InvalidName(_)), "{name}");
        }
        assert!(file.exists());
    }

    fn companion_fixture() -> (TempDir, PathBuf, PathBuf, (PathBuf, PathBuf)) {
        let (dir, file) = setup();
        let data = dir.path().join("scan01");
        fs::create_dir(&data).unwrap();
        let to = dir.path().join("new.mrxs");
        let companion = (data, dir.path().join("new"));
        (dir, file, to, companion)
    }

    #[test]
    fn test_companion_failure_restores_file() {
        let (_dir, file, to, companion) = companion_fixture();

        let err = move_together(&file, &to, Some(&companion), |from, to| {
            if from.is_dir() {
                Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))
            } else {
                fs::rename(from, to)
            }
        })
        .unwrap_err();

        assert!(matches!(err, RenameError::Move { ref from, .. } if *from == companion.0));
        assert!(file.exists());
        assert!(!to.exists());
        assert!(companion.0.is_dir());
        assert!(!companion.1.exists());
    }

    #[test]
    fn test_failed_restore_is_partial_move() {
        let (_dir, file, to, companion) = companion_fixture();
        let moved_back = to.clone();

        let err = move_together(&file, &to, Some(&companion), |from, dest| {
            if from.is_dir() || from == moved_back.as_path() {
                Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"))
            } else {
                fs::rename(from, dest)
            }
        })
        .unwrap_err();

        assert!(matches!(err, RenameError::PartialMove { ref file, .. } if *file == to));
        assert!(to.exists());
        assert!(!file.exists());
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("12-345_CD3_NP-102.mrxs").is_ok());
        assert!(validate_file_name("/abs/path.mrxs").is_err());
        assert!(validate_file_name("../up.mrxs").is_err());
    }
}
