// piisift-core/tests/snapshot_tests.rs
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use test_log::test;

use piisift_core::{
    analyze, merge_recognizers, AnalysisRequest, ErrorCode, HealthStatus, ModeSwitchRequest, ModeTable, PiiSiftError,
    RecognizerConfig, SnapshotStore,
};

const SPLIT_MODES: &str = r#"
default_mode: pesel_only
modes:
  - name: pesel_only
    recognizers: [pl_pesel]
    thresholds:
      GLOBAL: 0.10
  - name: cards_only
    recognizers: [credit_card]
    thresholds:
      GLOBAL: 0.80
"#;

const TEXT: &str = "card 4532015112830366 pesel 92032100157";

fn split_store() -> Result<SnapshotStore> {
    let modes: ModeTable = serde_yml::from_str(SPLIT_MODES)?;
    modes.validate()?;
    let store = SnapshotStore::new(RecognizerConfig::load_default_recognizers()?, modes);
    store.initialize()?;
    Ok(store)
}

fn scan_request() -> AnalysisRequest {
    AnalysisRequest {
        text: TEXT.to_string(),
        scan: true,
        ..AnalysisRequest::default()
    }
}

#[test]
fn test_each_mode_sees_only_its_recognizers() -> Result<()> {
    let store = split_store()?;
    let result = analyze(&store, &scan_request())?;
    assert_eq!(result.mode, "pesel_only");
    assert_eq!(result.entities.len(), 1);
    assert_eq!(result.entities[0].entity_type, "PL_PESEL");

    store.switch_mode(&ModeSwitchRequest {
        mode: "cards_only".to_string(),
        enable_context_enhancement: true,
    })?;
    let result = analyze(&store, &scan_request())?;
    assert_eq!(result.entities.len(), 1);
    assert_eq!(result.entities[0].entity_type, "CREDIT_CARD");
    assert!(result.entities[0].context_boosted);
    Ok(())
}

#[test]
fn test_readers_never_observe_mixed_snapshot() -> Result<()> {
    let store = Arc::new(split_store()?);
    let stop = Arc::new(AtomicBool::new(false));

    let writer = {
        let store = Arc::clone(&store);
        let stop = Arc::clone(&stop);
        thread::spawn(move || -> Result<()> {
            for i in 0..200 {
                let mode = if i % 2 == 0 { "cards_only" } else { "pesel_only" };
                store.switch_mode(&ModeSwitchRequest {
                    mode: mode.to_string(),
                    enable_context_enhancement: i % 3 != 0,
                })?;
            }
            stop.store(true, Ordering::SeqCst);
            Ok(())
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            let stop = Arc::clone(&stop);
            thread::spawn(move || -> Result<usize> {
                let mut checks = 0;
                while !stop.load(Ordering::SeqCst) {
                    let snapshot = store.current()?;
                    let names = snapshot.registry.recognizer_names();
                    match snapshot.mode.name.as_str() {
                        "pesel_only" => {
                            assert_eq!(names, vec!["pl_pesel"]);
                            assert_eq!(snapshot.mode.global_threshold(), 0.10);
                        }
                        "cards_only" => {
                            assert_eq!(names, vec!["credit_card"]);
                            assert_eq!(snapshot.mode.global_threshold(), 0.80);
                        }
                        other => panic!("unexpected mode {other}"),
                    }

                    let result = analyze(&store, &scan_request())?;
                    let expected = match result.mode.as_str() {
                        "pesel_only" => "PL_PESEL",
                        _ => "CREDIT_CARD",
                    };
                    assert!(result.entities.iter().all(|e| e.entity_type == expected));
                    checks += 1;
                }
                Ok(checks)
            })
        })
        .collect();

    writer.join().expect("writer panicked")?;
    for reader in readers {
        reader.join().expect("reader panicked")?;
    }
    assert_eq!(store.health().generation, 201);
    Ok(())
}

#[test]
fn test_failed_reload_degrades_but_keeps_serving() -> Result<()> {
    let store = split_store()?;
    let generation = store.health().generation;

    let bad: RecognizerConfig = serde_yml::from_str(
        r#"
recognizers:
  - name: pl_pesel
    entity_type: PL_PESEL
    patterns:
      - name: evil
        regex: '(\d+)+x'
        score: 0.5
"#,
    )?;
    let err = store.reload_recognizers(bad).unwrap_err();
    assert!(matches!(err, PiiSiftError::PatternRejected(_)));

    let health = store.health();
    assert_eq!(health.status, HealthStatus::Degraded);
    assert_eq!(health.error.as_ref().map(|e| e.code), Some(ErrorCode::PatternRejected));
    assert_eq!(health.current_mode.as_deref(), Some("pesel_only"));
    assert_eq!(health.generation, generation);

    let result = analyze(&store, &scan_request())?;
    assert_eq!(result.entities.len(), 1);

    store.switch_mode(&ModeSwitchRequest {
        mode: "pesel_only".to_string(),
        enable_context_enhancement: false,
    })?;
    assert_eq!(store.health().status, HealthStatus::Initialized);
    Ok(())
}

#[test]
fn test_uninitialized_store_reports_unavailable() -> Result<()> {
    let store = SnapshotStore::new(
        RecognizerConfig::load_default_recognizers()?,
        ModeTable::load_default_modes()?,
    );
    let err = analyze(&store, &scan_request()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::AnalyzerUnavailable);
    let health = store.health();
    assert_eq!(health.status, HealthStatus::Degraded);
    assert!(health.loaded_recognizers.is_empty());
    Ok(())
}

#[test]
fn test_concurrent_switches_never_revert_a_reload() -> Result<()> {
    let store = Arc::new(SnapshotStore::from_defaults()?);
    let extra: RecognizerConfig = serde_yml::from_str(
        r#"
recognizers:
  - name: employee_id
    entity_type: EMPLOYEE_ID
    patterns:
      - name: emp
        regex: '\bEMP-\d{6}\b'
        score: 0.9
"#,
    )?;
    let reloaded = merge_recognizers(RecognizerConfig::load_default_recognizers()?, Some(extra));
    let reload_done = Arc::new(AtomicBool::new(false));

    let switchers: Vec<_> = (0..3)
        .map(|t| {
            let store = Arc::clone(&store);
            let reload_done = Arc::clone(&reload_done);
            thread::spawn(move || -> Result<()> {
                for i in 0..60 {
                    let mode = if (i + t) % 2 == 0 { "high_recall" } else { "balanced" };
                    store.switch_mode(&ModeSwitchRequest {
                        mode: mode.to_string(),
                        enable_context_enhancement: true,
                    })?;
                    if reload_done.load(Ordering::SeqCst) {
                        let snapshot = store.current()?;
                        assert!(
                            snapshot.registry.recognizer("employee_id").is_some(),
                            "generation {} lost the reloaded definitions",
                            snapshot.generation
                        );
                    }
                }
                Ok(())
            })
        })
        .collect();

    let reloader = {
        let store = Arc::clone(&store);
        let reload_done = Arc::clone(&reload_done);
        thread::spawn(move || -> Result<()> {
            thread::yield_now();
            store.reload_recognizers(reloaded)?;
            reload_done.store(true, Ordering::SeqCst);
            Ok(())
        })
    };

    reloader.join().expect("reloader panicked")?;
    for switcher in switchers {
        switcher.join().expect("switcher panicked")?;
    }

    store.initialize()?;
    let snapshot = store.current()?;
    assert!(snapshot.registry.recognizer("employee_id").is_some());
    assert_eq!(store.health().status, HealthStatus::Initialized);
    assert_eq!(snapshot.generation, 1 + 3 * 60 + 1 + 1);
    Ok(())
}
