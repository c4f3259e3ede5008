use hashdupe::duplicates::{ClassificationEvent, Classifier, DuplicateFinder, FinderConfig};
use hashdupe::scanner::{FileRecord, Fingerprint, Hasher};
use proptest::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CONTENTS: [&[u8]; 5] = [b"", b"a", b"alpha", b"beta beta", b"gamma gamma gamma"];

fn materialize(choices: &[usize]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (i, &choice) in choices.iter().enumerate() {
        fs::write(dir.path().join(format!("f{:03}", i)), CONTENTS[choice]).unwrap();
    }
    dir
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_hash_is_chunk_size_independent(
        content in prop::collection::vec(any::<u8>(), 0..20_000),
        chunk in 4096usize..16_384,
    ) {
        let mut small = Hasher::with_chunk_size(chunk);
        let mut default = Hasher::new();

        let a = small.hash_reader(content.as_slice()).unwrap();
        let b = default.hash_reader(content.as_slice()).unwrap();

        prop_assert_eq!(a, b);
        prop_assert_eq!(a, Fingerprint::of(&content));
    }

    #[test]
    fn test_classifier_first_seen_wins(keys in prop::collection::vec(0u8..6, 1..60)) {
        let mut classifier = Classifier::new();
        let mut first_seen: HashMap<u8, PathBuf> = HashMap::new();
        let mut expected_reclaim = 0u64;

        for (i, key) in keys.iter().enumerate() {
            let path = PathBuf::from(format!("/f{i}"));
            let size = u64::from(*key) + 1;
            let event = classifier.classify(
                FileRecord::new(path.clone(), size),
                Fingerprint::of(&[*key]),
            );

            match first_seen.get(key) {
                None => {
                    let is_original = matches!(event, ClassificationEvent::Original { .. });
                    prop_assert!(is_original, "expected original, got {:?}", event);
                    first_seen.insert(*key, path);
                }
                Some(original) => {
                    expected_reclaim += size;
                    match event {
                        ClassificationEvent::DuplicateOf { original_path, .. } => {
                            prop_assert_eq!(&original_path, original);
                        }
                        other => prop_assert!(false, "expected duplicate, got {:?}", other),
                    }
                }
            }
        }

        prop_assert_eq!(classifier.reclaimable_bytes(), expected_reclaim);
        prop_assert_eq!(classifier.archive().len(), first_seen.len());
        prop_assert_eq!(
            classifier.group_count(),
            classifier.groups().iter().filter(|g| !g.duplicates.is_empty()).count()
        );
    }

    #[test]
    fn test_scan_invariants(choices in prop::collection::vec(0usize..CONTENTS.len(), 0..24)) {
        let dir = materialize(&choices);

        let mut events: Vec<ClassificationEvent> = Vec::new();
        let report = DuplicateFinder::new(FinderConfig::default().with_io_threads(1))
            .scan(dir.path(), &mut events)
            .unwrap();
        let summary = &report.summary;

        let non_empty: Vec<usize> = choices.iter().copied().filter(|&c| c != 0).collect();
        let expected_bytes: u64 = non_empty.iter().map(|&c| CONTENTS[c].len() as u64).sum();

        prop_assert_eq!(summary.total_files, choices.len());
        prop_assert_eq!(summary.empty_files, choices.len() - non_empty.len());
        prop_assert_eq!(summary.total_bytes, expected_bytes);
        prop_assert_eq!(events.len(), non_empty.len());

        let reclaim: u64 = events
            .iter()
            .filter(|e| e.is_duplicate())
            .map(ClassificationEvent::size)
            .sum();
        prop_assert_eq!(summary.reclaimable_bytes, reclaim);

        // The original for each content is the lowest-numbered file holding it
        for event in &events {
            if let ClassificationEvent::DuplicateOf { original_path, fingerprint, .. } = event {
                let first = choices
                    .iter()
                    .position(|&c| c != 0 && Fingerprint::of(CONTENTS[c]) == *fingerprint)
                    .unwrap();
                let expected = format!("f{:03}", first);
                prop_assert!(
                    original_path.ends_with(&expected),
                    "{} should be the original, got {}",
                    expected,
                    original_path.display()
                );
            }
        }

        prop_assert!(!report.archive.contains(&Fingerprint::of(b"")));
    }

    #[test]
    fn test_sequential_equals_parallel(
        choices in prop::collection::vec(0usize..CONTENTS.len(), 0..24),
        threads in 2usize..6,
        batch in 1usize..8,
    ) {
        let dir = materialize(&choices);

        let mut seq: Vec<ClassificationEvent> = Vec::new();
        DuplicateFinder::new(FinderConfig::default().with_io_threads(1))
            .scan(dir.path(), &mut seq)
            .unwrap();

        let mut par: Vec<ClassificationEvent> = Vec::new();
        DuplicateFinder::new(
            FinderConfig::default()
                .with_io_threads(threads)
                .with_batch_size(batch),
        )
        .scan(dir.path(), &mut par)
        .unwrap();

        prop_assert_eq!(seq, par);
    }
}
