// piisift-core/tests/mode_tests.rs
use anyhow::Result;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

use piisift_core::{
    analyze, load_mode_table_by_name, merge_modes, AnalysisRequest, CandidateMatch, ModeSwitchRequest,
    ModeTable, PiiSiftError, RecognizerConfig, RejectionReason, SnapshotStore,
};

const USER_MODES: &str = r#"
default_mode: strict_names
modes:
  - name: strict_names
    thresholds:
      GLOBAL: 0.40
      PERSON: 0.95
    allow_list: [Acme]
  - name: balanced
    thresholds:
      GLOBAL: 0.45
      PERSON: 0.55
"#;

fn person_candidate(text: &str, needle: &str, score: f64) -> CandidateMatch {
    let start = text.find(needle).unwrap();
    CandidateMatch {
        entity_type: "PERSON".to_string(),
        start,
        end: start + needle.len(),
        text: needle.to_string(),
        score,
        recognizer_id: "ner".to_string(),
    }
}

#[test]
fn test_threshold_055_across_default_modes() -> Result<()> {
    let store = SnapshotStore::from_defaults()?;
    let text = "Report written by Maria Nowak.";
    let request = AnalysisRequest {
        text: text.to_string(),
        candidates: vec![person_candidate(text, "Maria Nowak", 0.55)],
        surface_rejections: true,
        ..AnalysisRequest::default()
    };

    let expectations = [("high_recall", true), ("balanced", false), ("high_precision", false)];
    for (mode, accepted) in expectations {
        store.switch_mode(&ModeSwitchRequest {
            mode: mode.to_string(),
            enable_context_enhancement: true,
        })?;
        let result = analyze(&store, &request)?;
        assert_eq!(result.mode, mode);
        assert_eq!(result.entities.len() == 1, accepted, "mode {}", mode);
        if !accepted {
            assert_eq!(result.rejected.unwrap()[0].reason, RejectionReason::LowScore);
        }
    }
    Ok(())
}

#[test]
fn test_unknown_mode_is_mode_invalid_and_keeps_snapshot() -> Result<()> {
    let store = SnapshotStore::from_defaults()?;
    let before = store.health();
    let err = store
        .switch_mode(&ModeSwitchRequest {
            mode: "paranoid".to_string(),
            enable_context_enhancement: true,
        })
        .unwrap_err();
    match err {
        PiiSiftError::ModeInvalid { requested, available } => {
            assert_eq!(requested, "paranoid");
            assert!(available.contains(&"balanced".to_string()));
        }
        other => panic!("unexpected error {other:?}"),
    }
    let after = store.health();
    assert_eq!(after.current_mode.as_deref(), Some("balanced"));
    assert_eq!(after.generation, before.generation);
    Ok(())
}

#[test]
fn test_load_mode_table_by_path_and_merge() -> Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(USER_MODES.as_bytes())?;
    let path = file.path().to_string_lossy().to_string();

    let user = load_mode_table_by_name(&path)?;
    assert_eq!(user.default_mode, "strict_names");

    let merged = merge_modes(ModeTable::load_default_modes()?, Some(user))?;
    assert_eq!(merged.default_mode, "strict_names");
    assert_eq!(merged.modes.len(), 4);
    assert_eq!(merged.get("balanced")?.threshold_for("PERSON"), 0.55);
    assert_eq!(merged.get("high_recall")?.threshold_for("PERSON"), 0.35);
    assert_eq!(merged.get("strict_names")?.threshold_for("CREDIT_CARD"), 0.40);
    Ok(())
}

#[test]
fn test_user_mode_allow_list_applies() -> Result<()> {
    let user: ModeTable = serde_yml::from_str(USER_MODES)?;
    let modes = merge_modes(ModeTable::load_default_modes()?, Some(user))?;
    let store = SnapshotStore::new(RecognizerConfig::load_default_recognizers()?, modes);
    store.initialize()?;

    let text = "Contact Acme Corporation today";
    let result = analyze(
        &store,
        &AnalysisRequest {
            text: text.to_string(),
            candidates: vec![person_candidate(text, "Acme Corporation", 0.99)],
            surface_rejections: true,
            ..AnalysisRequest::default()
        },
    )?;
    assert_eq!(result.mode, "strict_names");
    assert_eq!(result.rejected.unwrap()[0].reason, RejectionReason::AllowList);
    Ok(())
}

#[test]
fn test_mode_without_global_is_rejected() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("broken.yaml");
    std::fs::write(
        &path,
        "default_mode: broken\nmodes:\n  - name: broken\n    thresholds:\n      PERSON: 0.5\n",
    )?;
    assert!(ModeTable::load_from_file(&path).is_err());
    Ok(())
}

#[test]
fn test_missing_named_table_is_an_error() {
    assert!(load_mode_table_by_name("no_such_mode_table_anywhere").is_err());
}
