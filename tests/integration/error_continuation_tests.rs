use hashdupe::duplicates::{ClassificationEvent, DuplicateFinder, FinderConfig, FinderError};
use hashdupe::scanner::{HashError, ScanError};
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_missing_root_fails_before_any_event() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("does-not-exist");

    let mut events: Vec<ClassificationEvent> = Vec::new();
    let result = DuplicateFinder::with_defaults().scan(&missing, &mut events);

    assert!(matches!(result, Err(FinderError::PathNotFound(p)) if p == missing));
    assert!(events.is_empty());
}

#[test]
fn test_root_must_be_directory() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    fs::write(&file, b"data").unwrap();

    let result = DuplicateFinder::with_defaults().estimate(&file);
    assert!(matches!(result, Err(FinderError::NotADirectory(_))));
}

#[test]
fn test_interrupted_scan_reports_interrupted() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"x").unwrap();

    let flag = Arc::new(AtomicBool::new(true));
    for threads in [1, 4] {
        let finder = DuplicateFinder::new(
            FinderConfig::default()
                .with_io_threads(threads)
                .with_shutdown_flag(flag.clone()),
        );
        let result = finder.find_duplicates(dir.path());
        assert!(matches!(result, Err(FinderError::Interrupted)));
    }
}

#[cfg(unix)]
fn can_bypass_permissions(path: &Path) -> bool {
    fs::read_dir(path).is_ok() || fs::File::open(path).is_ok()
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_counted_and_scan_continues() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("z"), b"same").unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::write(locked.join("inner"), b"same").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if can_bypass_permissions(&locked) {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(2));
    let result = finder.find_duplicates(dir.path());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    let (groups, summary) = result.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].duplicates.len(), 1);
    assert_eq!(summary.walk_errors, 1);
    assert_eq!(summary.skipped_files, 0);
    assert!(matches!(summary.errors[0], ScanError::PermissionDenied(_)));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_in_parallel_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    for name in ["a", "b", "c", "d"] {
        fs::write(dir.path().join(name), b"same").unwrap();
    }
    let locked = dir.path().join("b");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    if can_bypass_permissions(&locked) {
        return;
    }

    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_io_threads(3)
            .with_batch_size(2),
    );
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.total_files, 4);
    assert_eq!(summary.skipped_files, 1);
    assert_eq!(groups[0].duplicates.len(), 2);
    assert!(matches!(
        &summary.errors[0],
        ScanError::Hash(HashError::PermissionDenied(p)) if p == &locked
    ));
}
