use hashdupe::duplicates::{ClassificationEvent, DuplicateFinder, FinderConfig};
use hashdupe::scanner::WalkerConfig;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write(root: &Path, name: &str, content: &[u8]) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn sequential() -> DuplicateFinder {
    DuplicateFinder::new(FinderConfig::default().with_io_threads(1))
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.total_bytes, 0);
    assert_eq!(summary.group_count, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"content a");
    write(dir.path(), "b.txt", b"content b");
    write(dir.path(), "c.txt", b"content c");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.total_bytes, 27);
    assert_eq!(summary.reclaimable_bytes, 0);
}

#[test]
fn test_nested_duplicates_pick_first_in_traversal_order() {
    let dir = tempdir().unwrap();
    // Depth-first, name-sorted: a/deep/x, a/y, b, z/w
    write(dir.path(), "z/w", b"shared");
    write(dir.path(), "b", b"shared");
    write(dir.path(), "a/y", b"other");
    write(dir.path(), "a/deep/x", b"shared");

    let mut events: Vec<ClassificationEvent> = Vec::new();
    let report = sequential().scan(dir.path(), &mut events).unwrap();

    let order: Vec<_> = events
        .iter()
        .map(|e| {
            e.path()
                .strip_prefix(dir.path())
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    assert_eq!(order, vec!["a/deep/x", "a/y", "b", "z/w"]);

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert!(group.original.ends_with("a/deep/x"));
    assert_eq!(group.duplicates.len(), 2);
    assert!(group.duplicates[0].ends_with("b"));
    assert!(group.duplicates[1].ends_with("z/w"));
}

#[test]
fn test_rescan_is_idempotent() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        write(
            dir.path(),
            &format!("dir{}/file{}.dat", i % 4, i),
            format!("payload-{}", i % 5).as_bytes(),
        );
    }

    let finder = DuplicateFinder::with_defaults();
    let first = finder.scan(dir.path(), &mut hashdupe::duplicates::NullSink).unwrap();
    let second = finder.scan(dir.path(), &mut hashdupe::duplicates::NullSink).unwrap();

    assert_eq!(first.groups, second.groups);
    for (fingerprint, path) in first.archive.iter() {
        assert_eq!(second.archive.get(fingerprint), Some(path));
    }
}

#[test]
fn test_large_file_spans_many_chunks() {
    let dir = tempdir().unwrap();
    let content: Vec<u8> = (0..300_000u32).map(|i| (i % 251) as u8).collect();
    write(dir.path(), "big1", &content);
    write(dir.path(), "big2", &content);
    let mut different = content.clone();
    if let Some(last) = different.last_mut() {
        *last ^= 0xff;
    }
    write(dir.path(), "big3", &different);

    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_io_threads(1)
            .with_chunk_size(4096),
    );
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].duplicates.len(), 1);
    assert!(groups[0].duplicates[0].ends_with("big2"));
    assert_eq!(summary.reclaimable_bytes, 300_000);
}

#[test]
fn test_walker_options_flow_through() {
    let dir = tempdir().unwrap();
    write(dir.path(), "keep/a", b"same");
    write(dir.path(), "keep/b", b"same");
    write(dir.path(), ".hidden/c", b"same");
    write(dir.path(), "logs/d.log", b"same");
    write(dir.path(), "keep/deeper/still/e", b"same");

    let walker = WalkerConfig::default()
        .with_skip_hidden(true)
        .with_patterns(vec!["*.log".to_string()])
        .with_max_depth(Some(2));
    let finder = DuplicateFinder::new(FinderConfig::default().with_walker_config(walker));

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].duplicates.len(), 1);
}

#[test]
fn test_parallel_and_sequential_agree_across_batches() {
    let dir = tempdir().unwrap();
    for i in 0..100 {
        let content = if i % 10 == 0 {
            Vec::new()
        } else {
            format!("v{}", i % 13).into_bytes()
        };
        write(dir.path(), &format!("{:02}/{:03}", i % 9, i), &content);
    }

    let mut seq_events: Vec<ClassificationEvent> = Vec::new();
    let seq = sequential().scan(dir.path(), &mut seq_events).unwrap();

    for (threads, batch) in [(2, 1), (3, 7), (8, 256)] {
        let finder = DuplicateFinder::new(
            FinderConfig::default()
                .with_io_threads(threads)
                .with_batch_size(batch),
        );
        let mut events: Vec<ClassificationEvent> = Vec::new();
        let report = finder.scan(dir.path(), &mut events).unwrap();

        assert_eq!(events, seq_events, "threads={threads} batch={batch}");
        assert_eq!(report.groups, seq.groups);
        assert_eq!(report.summary.total_files, seq.summary.total_files);
        assert_eq!(report.summary.empty_files, 10);
    }
}
