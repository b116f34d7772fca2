//! Integration tests for the resumable scanner
//!
//! These tests verify the complete scan workflow including:
//! - One emitted record per gathered file, in deterministic order
//! - Resume equivalence: stop-at-k-then-resume matches a straight run
//! - Cache hits on a second scan (no digest recomputation)
//! - Change detection via digest mismatch against the cache
//! - Recovery from corrupt cache files
//! - Partial-stop persistence of cursor and cache

use core_scanner::{
    hasher, HashFn, LyricsStatus, RootProgress, ScanEvent, ScanOrchestrator, ScanOutcome,
    ScanState, TrackRecord, TrackStatus,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Fixtures & helpers
// ============================================================================

/// Relative paths of the fixture library, in the order a scan must visit them
const FIXTURE_FILES: &[&str] = &[
    "albumA/01 - one.mp3",
    "albumA/02 - two.mp3",
    "albumB/track.flac",
    "zzz.ogg",
];

fn make_library(root: &Path) {
    for (i, rel) in FIXTURE_FILES.iter().enumerate() {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, format!("fake audio contents #{}", i)).unwrap();
    }
}

async fn run_scan(
    orchestrator: &ScanOrchestrator,
    resume: ScanState,
    cancel: CancellationToken,
) -> (Vec<ScanEvent>, ScanState, core_scanner::ScanSummary) {
    let (tx, mut rx) = mpsc::channel(1024);
    let collector = tokio::spawn(async move {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    });

    let (state, summary) = orchestrator.run(resume, &cancel, &tx).await;
    drop(tx);
    let events = collector.await.unwrap();
    (events, state, summary)
}

fn tracks(events: &[ScanEvent]) -> Vec<TrackRecord> {
    events
        .iter()
        .filter_map(|event| match event {
            ScanEvent::Track(record) => Some(record.clone()),
            _ => None,
        })
        .collect()
}

fn counting_hash_fn(counter: Arc<AtomicUsize>) -> HashFn {
    Arc::new(move |path| {
        counter.fetch_add(1, Ordering::SeqCst);
        hasher::hash_file(path)
    })
}

/// Raises `cancel` while hashing the k-th file, so the scan stops before
/// file k begins (files are hashed in scan order on a cold cache).
fn cancel_after_hash_fn(k: usize, cancel: CancellationToken) -> HashFn {
    let count = Arc::new(AtomicUsize::new(0));
    Arc::new(move |path| {
        let n = count.fetch_add(1, Ordering::SeqCst) + 1;
        if n == k {
            cancel.cancel();
        }
        hasher::hash_file(path)
    })
}

fn digest_and_status_by_path(records: &[TrackRecord]) -> HashMap<PathBuf, (String, TrackStatus)> {
    records
        .iter()
        .map(|r| (r.path.clone(), (r.digest.clone(), r.status)))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_full_scan_emits_record_per_file_in_order() {
    let dir = tempfile::tempdir().unwrap();
    make_library(dir.path());

    let orchestrator = ScanOrchestrator::new(vec![dir.path().to_path_buf()]);
    let (events, state, summary) =
        run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;

    let records = tracks(&events);
    let expected: Vec<PathBuf> = FIXTURE_FILES.iter().map(|rel| dir.path().join(rel)).collect();
    let emitted: Vec<PathBuf> = records.iter().map(|r| r.path.clone()).collect();
    assert_eq!(emitted, expected);

    for record in &records {
        // Fixture bytes carry no readable tags, so every record degrades the
        // same way while still getting a digest
        assert_eq!(record.status, TrackStatus::MissingTags);
        assert_eq!(record.digest.len(), 64);
        assert_eq!(record.lyrics, LyricsStatus::None);
    }

    assert_eq!(summary.outcome, ScanOutcome::Completed);
    assert_eq!(summary.total_files, FIXTURE_FILES.len());
    assert_eq!(summary.processed, FIXTURE_FILES.len());
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_scan_order_is_stable_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    make_library(dir.path());

    let orchestrator = ScanOrchestrator::new(vec![dir.path().to_path_buf()]);
    let (first, ..) = run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;
    let (second, ..) = run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;

    let first_paths: Vec<PathBuf> = tracks(&first).iter().map(|r| r.path.clone()).collect();
    let second_paths: Vec<PathBuf> = tracks(&second).iter().map(|r| r.path.clone()).collect();
    assert_eq!(first_paths, second_paths);
}

#[tokio::test]
async fn test_second_scan_never_rehashes_unchanged_files() {
    let dir = tempfile::tempdir().unwrap();
    make_library(dir.path());

    let orchestrator = ScanOrchestrator::new(vec![dir.path().to_path_buf()]);
    let (first_events, ..) =
        run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;

    let counter = Arc::new(AtomicUsize::new(0));
    let orchestrator = ScanOrchestrator::new(vec![dir.path().to_path_buf()])
        .with_hash_fn(counting_hash_fn(Arc::clone(&counter)));
    let (second_events, ..) =
        run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;

    assert_eq!(counter.load(Ordering::SeqCst), 0);

    // Cached digests match the freshly computed ones
    let first = digest_and_status_by_path(&tracks(&first_events));
    let second = digest_and_status_by_path(&tracks(&second_events));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_change_detection_reports_hash_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    make_library(dir.path());
    let changed = dir.path().join("albumA/01 - one.mp3");

    let orchestrator = ScanOrchestrator::new(vec![dir.path().to_path_buf()]);
    let (first_events, ..) =
        run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;
    let old_digest = tracks(&first_events)
        .iter()
        .find(|r| r.path == changed)
        .unwrap()
        .digest
        .clone();

    // Different bytes and length, so the cache entry is stale regardless of
    // mtime resolution
    std::fs::write(&changed, "completely different audio contents, much longer").unwrap();

    let (second_events, ..) =
        run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;
    let record = tracks(&second_events)
        .into_iter()
        .find(|r| r.path == changed)
        .unwrap();

    assert_eq!(record.status, TrackStatus::HashMismatch);
    assert_ne!(record.digest, old_digest);
    assert_eq!(record.digest.len(), 64);

    // The cache now holds the new truth: a third scan sees no mismatch and
    // recomputes nothing
    let counter = Arc::new(AtomicUsize::new(0));
    let orchestrator = ScanOrchestrator::new(vec![dir.path().to_path_buf()])
        .with_hash_fn(counting_hash_fn(Arc::clone(&counter)));
    let (third_events, ..) =
        run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);
    let record = tracks(&third_events)
        .into_iter()
        .find(|r| r.path == changed)
        .unwrap();
    assert_eq!(record.status, TrackStatus::MissingTags);
}

#[tokio::test]
async fn test_resume_equivalence_for_every_stop_point() {
    // Baseline: a straight scan of an identical tree
    let baseline_dir = tempfile::tempdir().unwrap();
    make_library(baseline_dir.path());
    let baseline_orchestrator = ScanOrchestrator::new(vec![baseline_dir.path().to_path_buf()]);
    let (baseline_events, ..) = run_scan(
        &baseline_orchestrator,
        ScanState::new(),
        CancellationToken::new(),
    )
    .await;
    let mut baseline = digest_and_status_by_path(&tracks(&baseline_events));
    // Compare by relative path so the two tempdirs line up
    let baseline: HashMap<PathBuf, (String, TrackStatus)> = baseline
        .drain()
        .map(|(path, v)| {
            (
                path.strip_prefix(baseline_dir.path()).unwrap().to_path_buf(),
                v,
            )
        })
        .collect();

    for k in 0..=FIXTURE_FILES.len() {
        let dir = tempfile::tempdir().unwrap();
        make_library(dir.path());
        let root = dir.path().to_path_buf();

        // First leg: stop after k files
        let cancel = CancellationToken::new();
        let orchestrator = ScanOrchestrator::new(vec![root.clone()])
            .with_hash_fn(cancel_after_hash_fn(k, cancel.clone()));
        if k == 0 {
            cancel.cancel();
        }
        let (first_events, state, summary) =
            run_scan(&orchestrator, ScanState::new(), cancel).await;
        let first_records = tracks(&first_events);
        assert_eq!(first_records.len(), k, "stop point k={}", k);
        if k > 0 && k < FIXTURE_FILES.len() {
            assert_eq!(summary.outcome, ScanOutcome::StoppedPartial);
            assert_eq!(state.progress(&root), RootProgress::InProgress(k));
        }

        // Second leg: resume to the end
        let orchestrator = ScanOrchestrator::new(vec![root.clone()]);
        let (second_events, final_state, second_summary) =
            run_scan(&orchestrator, state, CancellationToken::new()).await;
        let second_records = tracks(&second_events);

        assert!(final_state.is_empty(), "k={}", k);
        assert_eq!(second_summary.outcome, ScanOutcome::Completed);

        // Union of both legs must match the straight run exactly
        let mut union = digest_and_status_by_path(&first_records);
        union.extend(digest_and_status_by_path(&second_records));
        let union: HashMap<PathBuf, (String, TrackStatus)> = union
            .into_iter()
            .map(|(path, v)| (path.strip_prefix(dir.path()).unwrap().to_path_buf(), v))
            .collect();
        assert_eq!(union, baseline, "k={}", k);
    }
}

#[tokio::test]
async fn test_stop_midway_persists_cursor_and_partial_cache() {
    let dir = tempfile::tempdir().unwrap();
    make_library(dir.path());
    let root = dir.path().to_path_buf();

    let cancel = CancellationToken::new();
    let orchestrator = ScanOrchestrator::new(vec![root.clone()])
        .with_hash_fn(cancel_after_hash_fn(2, cancel.clone()));
    let (events, state, summary) = run_scan(&orchestrator, ScanState::new(), cancel).await;

    assert_eq!(summary.outcome, ScanOutcome::StoppedPartial);
    assert_eq!(tracks(&events).len(), 2);
    assert_eq!(state.progress(&root), RootProgress::InProgress(2));

    // The partial cache on disk covers exactly the processed files and parses
    // cleanly
    let cache_path = root.join(".musewatch/track-hashes.json");
    let raw = std::fs::read_to_string(&cache_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value.as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn test_corrupt_cache_is_rebuilt_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    make_library(dir.path());
    let cache_dir = dir.path().join(".musewatch");
    std::fs::create_dir_all(&cache_dir).unwrap();
    std::fs::write(cache_dir.join("track-hashes.json"), "\"just a string\"").unwrap();

    let orchestrator = ScanOrchestrator::new(vec![dir.path().to_path_buf()]);
    let (events, state, summary) =
        run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;

    assert_eq!(summary.outcome, ScanOutcome::Completed);
    assert!(state.is_empty());
    for record in tracks(&events) {
        assert_eq!(record.digest.len(), 64);
        assert_ne!(record.status, TrackStatus::HashFailed);
    }

    // The rebuilt cache is valid and complete
    let raw = std::fs::read_to_string(cache_dir.join("track-hashes.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value.as_object().unwrap().len(), FIXTURE_FILES.len());
}

#[tokio::test]
async fn test_cache_entry_missing_fields_forces_rehash_of_that_file_only() {
    let dir = tempfile::tempdir().unwrap();
    make_library(dir.path());

    // Warm the cache, then break one entry
    let orchestrator = ScanOrchestrator::new(vec![dir.path().to_path_buf()]);
    run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;

    let cache_path = dir.path().join(".musewatch/track-hashes.json");
    let raw = std::fs::read_to_string(&cache_path).unwrap();
    let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    value.as_object_mut().unwrap().insert(
        "zzz.ogg".to_string(),
        serde_json::json!({"digest": "only-a-digest"}),
    );
    std::fs::write(&cache_path, serde_json::to_string(&value).unwrap()).unwrap();

    let counter = Arc::new(AtomicUsize::new(0));
    let orchestrator = ScanOrchestrator::new(vec![dir.path().to_path_buf()])
        .with_hash_fn(counting_hash_fn(Arc::clone(&counter)));
    let (events, ..) = run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;

    // Only the broken entry is recomputed
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    let record = tracks(&events)
        .into_iter()
        .find(|r| r.file_name == "zzz.ogg")
        .unwrap();
    assert_eq!(record.digest.len(), 64);
    // A dropped entry is absent, not mismatched
    assert_eq!(record.status, TrackStatus::MissingTags);
}

#[tokio::test]
async fn test_unreadable_root_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    make_library(dir.path());

    let orchestrator = ScanOrchestrator::new(vec![
        PathBuf::from("/definitely/not/a/real/root"),
        dir.path().to_path_buf(),
    ]);
    let (events, state, summary) =
        run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;

    assert_eq!(summary.outcome, ScanOutcome::Completed);
    assert_eq!(tracks(&events).len(), FIXTURE_FILES.len());
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_empty_library_completes_with_empty_state() {
    let dir = tempfile::tempdir().unwrap();

    let orchestrator = ScanOrchestrator::new(vec![dir.path().to_path_buf()]);
    let (events, state, summary) =
        run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;

    assert_eq!(summary.outcome, ScanOutcome::Completed);
    assert_eq!(summary.total_files, 0);
    assert!(tracks(&events).is_empty());
    assert!(state.is_empty());
}

#[tokio::test]
async fn test_lyric_sidecars_classified_during_scan() {
    let dir = tempfile::tempdir().unwrap();
    make_library(dir.path());
    std::fs::write(dir.path().join("albumA/01 - one.lrc"), "[00:01.00] hi").unwrap();
    std::fs::write(dir.path().join("albumA/02 - two.txt"), "hi").unwrap();

    let orchestrator = ScanOrchestrator::new(vec![dir.path().to_path_buf()]);
    let (events, ..) = run_scan(&orchestrator, ScanState::new(), CancellationToken::new()).await;

    let records = tracks(&events);
    let by_name: HashMap<&str, &TrackRecord> = records
        .iter()
        .map(|r| (r.file_name.as_str(), r))
        .collect();
    assert_eq!(by_name["01 - one.mp3"].lyrics, LyricsStatus::Synced);
    assert_eq!(by_name["02 - two.mp3"].lyrics, LyricsStatus::Plain);
    assert_eq!(by_name["track.flac"].lyrics, LyricsStatus::None);
}

#[tokio::test]
async fn test_multi_root_resume_restarts_at_interrupted_root() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    make_library(dir_a.path());
    make_library(dir_b.path());
    let roots = vec![dir_a.path().to_path_buf(), dir_b.path().to_path_buf()];

    // Stop inside the second root: 4 files of root A, then 2 of root B
    let cancel = CancellationToken::new();
    let orchestrator =
        ScanOrchestrator::new(roots.clone()).with_hash_fn(cancel_after_hash_fn(6, cancel.clone()));
    let (events, state, summary) = run_scan(&orchestrator, ScanState::new(), cancel).await;

    assert_eq!(summary.outcome, ScanOutcome::StoppedPartial);
    assert_eq!(tracks(&events).len(), 6);
    assert_eq!(
        state.progress(dir_a.path()),
        RootProgress::Complete
    );
    assert_eq!(state.progress(dir_b.path()), RootProgress::InProgress(2));

    // Resume: only root B's remaining files are emitted
    let orchestrator = ScanOrchestrator::new(roots);
    let (events, final_state, summary) =
        run_scan(&orchestrator, state, CancellationToken::new()).await;

    let resumed_tracks = tracks(&events);
    assert_eq!(summary.outcome, ScanOutcome::Completed);
    assert!(final_state.is_empty());
    // Root A lost its cursor at the stop (completions are pruned on resume),
    // so it re-emits; root B picks up at its cursor
    assert_eq!(resumed_tracks.len(), FIXTURE_FILES.len() + 2);
    assert_eq!(summary.resumed, 2);
}
