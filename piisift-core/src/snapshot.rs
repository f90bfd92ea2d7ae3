// File: piisift-core/src/snapshot.rs
//! Process-wide active mode and registry.
//!
//! A [`Snapshot`] pairs one detection mode with the registry built for it. The
//! [`SnapshotStore`] holds the current snapshot behind a single `Arc`. A mode
//! switch or recognizer reload builds a complete new snapshot off to the side
//! and publishes it by replacing that one `Arc`, so a reader always sees a
//! registry and thresholds that belong together. Readers load the `Arc`
//! without locking; writers serialize on a mutex that also guards the
//! recognizer definitions they rebuild from.
//!
//! When a rebuild fails the previous snapshot stays active and the store
//! reports itself degraded with the concrete error.
//!
//! License: MIT OR APACHE 2.0

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::RecognizerConfig;
use crate::errors::{ErrorReport, PiiSiftError};
use crate::modes::{DetectionMode, ModeTable};
use crate::registry::Registry;
use crate::sanitizers::compiler::DEFAULT_PROBE_BUDGET;

/// One consistent pairing of a mode with its registry.
#[derive(Debug)]
pub struct Snapshot {
    pub mode: DetectionMode,
    pub registry: Registry,
    pub context_enhancement: bool,
    /// Increases by one on every successful publish.
    pub generation: u64,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Initialized,
    Degraded,
}

/// Read surface of the health/introspection endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
    pub loaded_recognizers: Vec<String>,
    pub current_mode: Option<String>,
    pub generation: u64,
}

/// Read surface of the mode configuration endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeConfigView {
    pub current_mode: String,
    pub enable_context_enhancement: bool,
    pub thresholds: BTreeMap<String, f64>,
    pub global_threshold: f64,
    pub context_boost_factor: f64,
    pub min_context_score: f64,
    pub available_modes: Vec<String>,
}

fn default_true() -> bool {
    true
}

/// Write surface of the mode configuration endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSwitchRequest {
    pub mode: String,
    #[serde(default = "default_true")]
    pub enable_context_enhancement: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeSwitchOutcome {
    pub previous_mode: Option<String>,
    pub previous_context_enhancement: Option<bool>,
    pub new_mode: String,
    pub new_context_enhancement: bool,
}

/// State owned by writers: the definitions the next rebuild starts from and
/// the generation counter.
#[derive(Debug)]
struct WriterState {
    generation: u64,
    recognizers: Arc<RecognizerConfig>,
}

/// Holds the active snapshot and everything needed to rebuild it.
#[derive(Debug)]
pub struct SnapshotStore {
    current: ArcSwapOption<Snapshot>,
    last_error: ArcSwapOption<ErrorReport>,
    modes: ModeTable,
    /// Serializes writers; readers never take it.
    writer: Mutex<WriterState>,
    probe_budget: Duration,
}

impl SnapshotStore {
    /// Creates an uninitialized store. Call [`SnapshotStore::initialize`] or
    /// [`SnapshotStore::switch_mode`] before analysing.
    pub fn new(recognizers: RecognizerConfig, modes: ModeTable) -> Self {
        Self {
            current: ArcSwapOption::empty(),
            last_error: ArcSwapOption::empty(),
            modes,
            writer: Mutex::new(WriterState {
                generation: 0,
                recognizers: Arc::new(recognizers),
            }),
            probe_budget: DEFAULT_PROBE_BUDGET,
        }
    }

    pub fn with_probe_budget(mut self, budget: Duration) -> Self {
        self.probe_budget = budget;
        self
    }

    /// Builds the store from the embedded recognizers and modes and publishes
    /// the default mode with context enhancement on.
    pub fn from_defaults() -> anyhow::Result<Self> {
        let store = Self::new(
            RecognizerConfig::load_default_recognizers()?,
            ModeTable::load_default_modes()?,
        );
        store.initialize()?;
        Ok(store)
    }

    /// Publishes the table's default mode.
    pub fn initialize(&self) -> Result<ModeSwitchOutcome, PiiSiftError> {
        let default_mode = self.modes.default_mode.clone();
        self.switch_mode(&ModeSwitchRequest {
            mode: default_mode,
            enable_context_enhancement: true,
        })
    }

    pub fn modes(&self) -> &ModeTable {
        &self.modes
    }

    /// The active snapshot, or `AnalyzerUnavailable` if none was ever published.
    pub fn current(&self) -> Result<Arc<Snapshot>, PiiSiftError> {
        self.current.load_full().ok_or_else(|| {
            let reason = self
                .last_error()
                .map(|e| e.message)
                .unwrap_or_else(|| "no detection mode has been loaded".to_string());
            PiiSiftError::AnalyzerUnavailable(reason)
        })
    }

    fn last_error(&self) -> Option<ErrorReport> {
        self.last_error.load_full().map(|report| (*report).clone())
    }

    fn set_last_error(&self, report: Option<ErrorReport>) {
        self.last_error.store(report.map(Arc::new));
    }

    /// A writer panicking mid-build never published anything, so the state
    /// behind a poisoned lock is still the last consistent one.
    fn lock_writer(&self) -> MutexGuard<'_, WriterState> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically switches to another mode.
    ///
    /// An unknown mode name is the caller's mistake: it returns `ModeInvalid`
    /// and leaves the health status untouched. A failure while building the
    /// new registry keeps the previous snapshot active and marks the store
    /// degraded.
    pub fn switch_mode(&self, request: &ModeSwitchRequest) -> Result<ModeSwitchOutcome, PiiSiftError> {
        let mode = self.modes.get(&request.mode)?.clone();
        let mut writer = self.lock_writer();
        let recognizers = Arc::clone(&writer.recognizers);
        self.rebuild_and_publish(&mut writer, mode, &recognizers, request.enable_context_enhancement)
    }

    /// Replaces the recognizer definitions and rebuilds the current mode with them.
    ///
    /// On failure the old definitions and snapshot stay in place.
    pub fn reload_recognizers(&self, recognizers: RecognizerConfig) -> Result<ModeSwitchOutcome, PiiSiftError> {
        let mut writer = self.lock_writer();
        let (mode, context) = match self.current.load_full() {
            Some(snapshot) => (snapshot.mode.clone(), snapshot.context_enhancement),
            None => (self.modes.initial_mode()?.clone(), true),
        };
        let recognizers = Arc::new(recognizers);
        let outcome = self.rebuild_and_publish(&mut writer, mode, &recognizers, context)?;
        writer.recognizers = recognizers;
        Ok(outcome)
    }

    fn rebuild_and_publish(
        &self,
        writer: &mut WriterState,
        mode: DetectionMode,
        recognizers: &RecognizerConfig,
        context_enhancement: bool,
    ) -> Result<ModeSwitchOutcome, PiiSiftError> {
        let built = recognizers
            .select(mode.recognizers.as_deref())
            .and_then(|defs| Registry::build(defs, self.probe_budget));

        let registry = match built {
            Ok(registry) => registry,
            Err(err) => {
                error!("Rebuild for mode '{}' failed, keeping previous snapshot: {}", mode.name, err);
                self.set_last_error(Some(ErrorReport::from(&err)));
                return Err(err);
            }
        };

        writer.generation += 1;
        let snapshot = Arc::new(Snapshot {
            mode,
            registry,
            context_enhancement,
            generation: writer.generation,
            built_at: Utc::now(),
        });

        let previous = self.current.swap(Some(Arc::clone(&snapshot)));
        self.set_last_error(None);

        info!(
            "Published mode '{}' (generation {}, context enhancement {}).",
            snapshot.mode.name, snapshot.generation, context_enhancement
        );
        Ok(ModeSwitchOutcome {
            previous_mode: previous.as_ref().map(|s| s.mode.name.clone()),
            previous_context_enhancement: previous.as_ref().map(|s| s.context_enhancement),
            new_mode: snapshot.mode.name.clone(),
            new_context_enhancement: context_enhancement,
        })
    }

    /// Health and introspection report.
    pub fn health(&self) -> HealthReport {
        let snapshot = self.current().ok();
        let error = self.last_error();
        let status = if snapshot.is_some() && error.is_none() {
            HealthStatus::Initialized
        } else {
            HealthStatus::Degraded
        };
        let error = match (&snapshot, error) {
            (None, None) => Some(ErrorReport::from(&PiiSiftError::AnalyzerUnavailable(
                "no detection mode has been loaded".to_string(),
            ))),
            (_, e) => e,
        };

        HealthReport {
            status,
            error,
            loaded_recognizers: snapshot
                .as_ref()
                .map(|s| s.registry.recognizer_names())
                .unwrap_or_default(),
            current_mode: snapshot.as_ref().map(|s| s.mode.name.clone()),
            generation: snapshot.as_ref().map_or(0, |s| s.generation),
        }
    }

    /// Mode configuration read surface.
    pub fn config_view(&self) -> Result<ModeConfigView, PiiSiftError> {
        let snapshot = self.current()?;
        let mode = &snapshot.mode;
        Ok(ModeConfigView {
            current_mode: mode.name.clone(),
            enable_context_enhancement: snapshot.context_enhancement,
            thresholds: mode.thresholds.clone(),
            global_threshold: mode.global_threshold(),
            context_boost_factor: mode.context_boost_factor,
            min_context_score: mode.min_context_score,
            available_modes: self.modes.names(),
        })
    }
}
