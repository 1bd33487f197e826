// =============================================================================
// controller.rs - Machine à états d'échantillonnage
// controller.rs - Sampling state machine
// =============================================================================
//
// Active : chaque tick échantillonne, convertit et publie la lecture courante.
// Frozen : les ticks ne font rien, la dernière lecture reste affichée.
// Active: every tick samples, converts and publishes the current reading.
// Frozen: ticks do nothing, the last reading stays published.
// =============================================================================

use serde::Serialize;
use std::fmt;

use crate::color::{ColorModelSet, Rgb};
use crate::config;
use crate::error::SamplerError;
use crate::picker::{CursorPosition, PixelSampler};
use crate::store::{CaptureOutcome, HistoryEntry, HistoryStore};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum SamplingState {
    #[default]
    Active,
    Frozen,
}

impl fmt::Display for SamplingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SamplingState::Active => "active",
            SamplingState::Frozen => "frozen",
        })
    }
}

/// Lecture publiée : la couleur et l'endroit où elle a été prise
/// Published reading: the color and where it was taken
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Reading {
    pub colors: ColorModelSet,
    /// `None` until the first successful sample.
    pub position: Option<CursorPosition>,
}

impl Default for Reading {
    fn default() -> Self {
        Self {
            colors: ColorModelSet::from(Rgb::BLACK),
            position: None,
        }
    }
}

/// État de l'échantillonneur vu par l'interface (indicateur de statut)
/// Sampler condition as seen by the front-end (status indicator)
#[derive(Clone, Debug, Default, PartialEq)]
pub enum SamplerStatus {
    /// No tick has run yet.
    #[default]
    Pending,
    Ok,
    /// The last `streak` ticks failed; `error` is the latest failure.
    Failing { error: SamplerError, streak: u32 },
}

/// What one tick did
#[derive(Clone, Debug, PartialEq)]
pub enum Tick {
    Skipped,
    Updated(Reading),
    Failed(SamplerError),
}

/// Pilote l'échantillonneur et possède la lecture courante et l'historique
/// Drives the sampler and owns the current reading and the history
pub struct SamplingController<S: PixelSampler> {
    sampler: S,
    state: SamplingState,
    current: Reading,
    status: SamplerStatus,
    history: HistoryStore,
}

impl<S: PixelSampler> SamplingController<S> {
    pub fn new(sampler: S, history_capacity: usize) -> Self {
        Self {
            sampler,
            state: SamplingState::Active,
            current: Reading::default(),
            status: SamplerStatus::Pending,
            history: HistoryStore::new(history_capacity),
        }
    }

    pub fn sampler_name(&self) -> &'static str {
        self.sampler.name()
    }

    pub fn state(&self) -> SamplingState {
        self.state
    }

    pub fn current(&self) -> &Reading {
        &self.current
    }

    pub fn status(&self) -> &SamplerStatus {
        &self.status
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    // =========================================================================
    // TRANSITIONS
    // =========================================================================

    pub fn freeze(&mut self) -> SamplingState {
        self.set_state(SamplingState::Frozen)
    }

    pub fn unfreeze(&mut self) -> SamplingState {
        self.set_state(SamplingState::Active)
    }

    pub fn toggle_freeze(&mut self) -> SamplingState {
        match self.state {
            SamplingState::Active => self.freeze(),
            SamplingState::Frozen => self.unfreeze(),
        }
    }

    fn set_state(&mut self, state: SamplingState) -> SamplingState {
        if self.state != state {
            tracing::info!(from = %self.state, to = %state, "Sampling state changed");
            self.state = state;
        }
        self.state
    }

    // =========================================================================
    // TICK
    // =========================================================================

    /// Runs one sampling step. A failure keeps the previous reading.
    pub fn tick(&mut self) -> Tick {
        if self.state == SamplingState::Frozen {
            return Tick::Skipped;
        }

        match self.sampler.sample() {
            Ok(sample) => {
                if let SamplerStatus::Failing { streak, .. } = &self.status {
                    tracing::info!(failures = streak, "Sampler recovered");
                }
                self.current = Reading {
                    colors: ColorModelSet::from(sample.rgb),
                    position: Some(sample.position),
                };
                self.status = SamplerStatus::Ok;
                tracing::debug!(position = %sample.position, color = %sample.rgb.to_hex(), "Sampled");
                Tick::Updated(self.current)
            }
            Err(error) => {
                let streak = match &self.status {
                    SamplerStatus::Failing { streak, .. } => streak.saturating_add(1),
                    _ => 1,
                };
                if streak == 1 || streak % config::FAILURE_STREAK_WARNING == 0 {
                    tracing::warn!(%error, streak, backend = self.sampler.name(), "Sampling failed");
                } else {
                    tracing::debug!(%error, streak, "Sampling failed");
                }
                self.status = SamplerStatus::Failing {
                    error: error.clone(),
                    streak,
                };
                Tick::Failed(error)
            }
        }
    }

    // =========================================================================
    // HISTORIQUE
    // HISTORY
    // =========================================================================

    /// Ajoute la lecture courante, quel que soit l'état
    /// Appends the current reading, whatever the state
    pub fn capture(&mut self) -> CaptureOutcome {
        let outcome = self.history.push(self.current.colors);
        match &outcome {
            CaptureOutcome::Appended(entry) => {
                tracing::debug!(seq = entry.seq, color = %entry.colors.hex(), "Captured color");
            }
            CaptureOutcome::Evicted { entry, evicted } => {
                tracing::debug!(
                    seq = entry.seq,
                    color = %entry.colors.hex(),
                    evicted = evicted.seq,
                    "Captured color, oldest entry evicted"
                );
            }
            CaptureOutcome::Duplicate(entry) => {
                tracing::debug!(seq = entry.seq, "Capture ignored, same as last entry");
            }
        }
        outcome
    }

    pub fn replace_history(&mut self, colors: Vec<Rgb>) {
        let count = colors.len();
        self.history.replace(colors);
        tracing::info!(requested = count, kept = self.history.len(), "History replaced");
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        tracing::info!("History cleared");
    }

    pub fn remove_history(&mut self, index: usize) -> Option<HistoryEntry> {
        self.history.remove(index)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picker::scripted::{ScriptedSampler, Step};
    use std::time::Duration;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    fn controller(steps: Vec<Step>) -> SamplingController<ScriptedSampler> {
        SamplingController::new(ScriptedSampler::new(steps), 3)
    }

    #[test]
    fn test_initial_reading_is_black() {
        let controller = controller(vec![Step::Color(RED)]);
        assert_eq!(controller.state(), SamplingState::Active);
        assert_eq!(controller.current().colors.rgb, Rgb::BLACK);
        assert_eq!(controller.current().position, None);
        assert_eq!(controller.status(), &SamplerStatus::Pending);
    }

    #[test]
    fn test_tick_publishes_reading() {
        let mut controller = controller(vec![Step::Color(RED)]);
        assert!(matches!(controller.tick(), Tick::Updated(_)));
        assert_eq!(controller.current().colors, ColorModelSet::from(RED));
        assert_eq!(controller.current().position, Some(CursorPosition::new(0, 0)));
        assert_eq!(controller.status(), &SamplerStatus::Ok);
    }

    #[test]
    fn test_freeze_is_idempotent_and_suppresses_ticks() {
        let mut controller = controller(vec![Step::Color(RED), Step::Color(BLUE)]);
        controller.tick();
        let published = *controller.current();

        assert_eq!(controller.freeze(), SamplingState::Frozen);
        assert_eq!(controller.freeze(), SamplingState::Frozen);
        assert_eq!(controller.current(), &published);

        assert_eq!(controller.tick(), Tick::Skipped);
        assert_eq!(controller.current().colors.rgb, RED);

        assert_eq!(controller.unfreeze(), SamplingState::Active);
        controller.tick();
        assert_eq!(controller.current().colors.rgb, BLUE);
    }

    #[test]
    fn test_toggle_flips_state() {
        let mut controller = controller(vec![Step::Color(RED)]);
        assert_eq!(controller.toggle_freeze(), SamplingState::Frozen);
        assert_eq!(controller.toggle_freeze(), SamplingState::Active);
    }

    #[test]
    fn test_capture_dedups_and_is_bounded() {
        let mut controller = controller(vec![
            Step::Color(Rgb::new(1, 0, 0)),
            Step::Color(Rgb::new(2, 0, 0)),
            Step::Color(Rgb::new(3, 0, 0)),
            Step::Color(Rgb::new(4, 0, 0)),
        ]);
        controller.tick();
        assert!(matches!(controller.capture(), CaptureOutcome::Appended(_)));
        assert!(matches!(controller.capture(), CaptureOutcome::Duplicate(_)));
        assert_eq!(controller.history().len(), 1);

        for _ in 0..3 {
            controller.tick();
            controller.capture();
        }
        assert_eq!(controller.history().len(), 3);
        assert_eq!(controller.history().export()[0].rgb(), Rgb::new(2, 0, 0));
    }

    #[test]
    fn test_capture_works_while_frozen() {
        let mut controller = controller(vec![Step::Color(RED)]);
        controller.tick();
        controller.freeze();
        assert!(controller.capture().is_new());
        assert_eq!(controller.history().last().map(HistoryEntry::rgb), Some(RED));
    }

    #[test]
    fn test_timeout_keeps_reading_and_history() {
        let timeout = SamplerError::Timeout(Duration::from_millis(200));
        let mut controller = controller(vec![Step::Color(RED), Step::Fail(timeout.clone())]);
        controller.tick();
        controller.capture();
        let published = *controller.current();
        let history = controller.history().export();

        assert_eq!(controller.tick(), Tick::Failed(timeout.clone()));
        assert_eq!(controller.current(), &published);
        assert_eq!(controller.history().export(), history);
        assert_eq!(
            controller.status(),
            &SamplerStatus::Failing {
                error: timeout.clone(),
                streak: 1
            }
        );

        // Le dernier pas se répète : la série s'allonge
        // The last step repeats: the streak grows
        controller.tick();
        assert!(matches!(controller.status(), SamplerStatus::Failing { streak: 2, .. }));
    }

    #[test]
    fn test_recovery_resets_status() {
        let mut controller = controller(vec![
            Step::Fail(SamplerError::PermissionDenied("screen".to_string())),
            Step::Color(BLUE),
        ]);
        assert!(matches!(controller.tick(), Tick::Failed(SamplerError::PermissionDenied(_))));
        assert_eq!(controller.current().colors.rgb, Rgb::BLACK);
        controller.tick();
        assert_eq!(controller.status(), &SamplerStatus::Ok);
        assert_eq!(controller.current().colors.rgb, BLUE);
    }

    #[test]
    fn test_history_edits() {
        let mut controller = controller(vec![Step::Color(RED)]);
        controller.replace_history(vec![RED, BLUE]);
        assert_eq!(controller.history().len(), 2);
        assert_eq!(controller.remove_history(0).map(|e| e.rgb()), Some(RED));
        assert_eq!(controller.remove_history(5), None);
        controller.clear_history();
        assert!(controller.history().is_empty());
    }
}
