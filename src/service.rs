// =============================================================================
// service.rs - Boucle d'échantillonnage et poignée de commande
// service.rs - Sampling loop and command handle
// =============================================================================
//
// Un seul thread possède le contrôleur : il est le seul à modifier l'état et
// l'historique. Les commandes arrivent par un canal mpsc ; la lecture courante
// est publiée dans un instantané partagé que les lecteurs consultent sans
// passer par la boucle.
// One thread owns the controller and is the only writer of state and
// history. Commands arrive over an mpsc channel; the current reading is
// published to a shared snapshot that readers query without the loop.
// =============================================================================

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::color::Rgb;
use crate::controller::{Reading, SamplerStatus, SamplingController, SamplingState};
use crate::error::ServiceError;
use crate::picker::PixelSampler;
use crate::store::{CaptureOutcome, HistoryEntry};

/// Ce que les lecteurs voient sans bloquer
/// What readers see without blocking
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub reading: Reading,
    pub state: SamplingState,
    pub status: SamplerStatus,
}

type Reply<T> = mpsc::Sender<T>;

enum Command {
    Freeze(Reply<SamplingState>),
    Unfreeze(Reply<SamplingState>),
    Toggle(Reply<SamplingState>),
    Capture(Reply<CaptureOutcome>),
    History(Reply<Vec<HistoryEntry>>),
    Replace(Vec<Rgb>, Reply<()>),
    Clear(Reply<()>),
    Remove(usize, Reply<Option<HistoryEntry>>),
    Shutdown,
}

pub struct SamplingService;

impl SamplingService {
    /// Starts the loop on its own thread; the first tick runs immediately.
    pub fn spawn<S>(
        sampler: S,
        tick: Duration,
        history_capacity: usize,
    ) -> Result<SamplingHandle, ServiceError>
    where
        S: PixelSampler + 'static,
    {
        let (commands_tx, commands_rx) = mpsc::channel();
        let snapshot = Arc::new(RwLock::new(Snapshot::default()));
        let published = Arc::clone(&snapshot);
        let controller = SamplingController::new(sampler, history_capacity);

        tracing::info!(
            backend = controller.sampler_name(),
            tick_ms = tick.as_millis() as u64,
            history_capacity,
            "Starting sampling loop"
        );

        let worker = thread::Builder::new()
            .name("sampling-loop".to_string())
            .spawn(move || run_loop(controller, commands_rx, published, tick))
            .map_err(|e| ServiceError::Spawn(e.to_string()))?;

        Ok(SamplingHandle {
            commands: commands_tx,
            snapshot,
            worker: Some(worker),
        })
    }
}

fn publish<S: PixelSampler>(controller: &SamplingController<S>, snapshot: &RwLock<Snapshot>) {
    let mut guard = snapshot.write().unwrap_or_else(PoisonError::into_inner);
    guard.reading = *controller.current();
    guard.state = controller.state();
    guard.status = controller.status().clone();
}

fn run_loop<S: PixelSampler>(
    mut controller: SamplingController<S>,
    commands: mpsc::Receiver<Command>,
    snapshot: Arc<RwLock<Snapshot>>,
    tick: Duration,
) {
    let mut next_tick = Instant::now();

    loop {
        let now = Instant::now();
        if now >= next_tick {
            controller.tick();
            publish(&controller, &snapshot);
            next_tick = now + tick;
        }

        // Attend la prochaine échéance en traitant les commandes dès leur arrivée
        // Wait for the next tick while handling commands as they arrive
        let wait = next_tick.saturating_duration_since(Instant::now());
        let command = match commands.recv_timeout(wait) {
            Ok(command) => command,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        // Une réponse perdue (demandeur parti) n'est pas une erreur
        // A dropped reply (requester gone) is not an error
        match command {
            Command::Freeze(reply) => {
                let _ = reply.send(controller.freeze());
            }
            Command::Unfreeze(reply) => {
                let _ = reply.send(controller.unfreeze());
            }
            Command::Toggle(reply) => {
                let _ = reply.send(controller.toggle_freeze());
            }
            Command::Capture(reply) => {
                let _ = reply.send(controller.capture());
            }
            Command::History(reply) => {
                let _ = reply.send(controller.history().export());
            }
            Command::Replace(colors, reply) => {
                controller.replace_history(colors);
                let _ = reply.send(());
            }
            Command::Clear(reply) => {
                controller.clear_history();
                let _ = reply.send(());
            }
            Command::Remove(index, reply) => {
                let _ = reply.send(controller.remove_history(index));
            }
            Command::Shutdown => break,
        }
        publish(&controller, &snapshot);
    }

    tracing::info!("Sampling loop stopped");
}

// =============================================================================
// POIGNÉE
// HANDLE
// =============================================================================

/// Front-end access to a running loop. Dropping it stops the loop.
pub struct SamplingHandle {
    commands: mpsc::Sender<Command>,
    snapshot: Arc<RwLock<Snapshot>>,
    worker: Option<JoinHandle<()>>,
}

impl SamplingHandle {
    /// Dernier instantané publié, sans attendre la boucle
    /// Last published snapshot, without waiting on the loop
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current(&self) -> Reading {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .reading
    }

    pub fn status(&self) -> SamplerStatus {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
            .clone()
    }

    pub fn state(&self) -> SamplingState {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    fn request<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T, ServiceError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .send(command(reply_tx))
            .map_err(|_| ServiceError::Stopped)?;
        reply_rx.recv().map_err(|_| ServiceError::Stopped)
    }

    pub fn freeze(&self) -> Result<SamplingState, ServiceError> {
        self.request(Command::Freeze)
    }

    pub fn unfreeze(&self) -> Result<SamplingState, ServiceError> {
        self.request(Command::Unfreeze)
    }

    pub fn toggle_freeze(&self) -> Result<SamplingState, ServiceError> {
        self.request(Command::Toggle)
    }

    pub fn capture(&self) -> Result<CaptureOutcome, ServiceError> {
        self.request(Command::Capture)
    }

    /// Historique complet, du plus ancien au plus récent
    /// Full history, oldest first
    pub fn history(&self) -> Result<Vec<HistoryEntry>, ServiceError> {
        self.request(Command::History)
    }

    pub fn replace_history(&self, colors: Vec<Rgb>) -> Result<(), ServiceError> {
        self.request(|reply| Command::Replace(colors, reply))
    }

    pub fn clear_history(&self) -> Result<(), ServiceError> {
        self.request(Command::Clear)
    }

    pub fn remove_history(&self, index: usize) -> Result<Option<HistoryEntry>, ServiceError> {
        self.request(|reply| Command::Remove(index, reply))
    }

    /// Stops the loop and waits for it, at most one tick plus the sampler
    /// timeout.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.commands.send(Command::Shutdown);
            if worker.join().is_err() {
                tracing::error!("Sampling loop panicked");
            }
        }
    }
}

impl Drop for SamplingHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SamplerError;
    use crate::picker::scripted::{ScriptedSampler, Step};
    use crate::picker::TimedSampler;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const GREEN: Rgb = Rgb::new(0, 255, 0);

    fn spawn(steps: Vec<Step>) -> SamplingHandle {
        SamplingService::spawn(ScriptedSampler::new(steps), Duration::from_millis(5), 3).unwrap()
    }

    /// Attend qu'une condition devienne vraie (2 s maximum)
    /// Waits for a condition to hold (2 s at most)
    fn wait_for(handle: &SamplingHandle, condition: impl Fn(&Snapshot) -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition(&handle.snapshot()) {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn test_publishes_current_reading() {
        let handle = spawn(vec![Step::Color(RED)]);
        assert!(wait_for(&handle, |s| s.reading.colors.rgb == RED));
        assert_eq!(handle.status(), SamplerStatus::Ok);
        assert_eq!(handle.state(), SamplingState::Active);
        handle.shutdown();
    }

    #[test]
    fn test_freeze_holds_reading() {
        let handle = spawn(vec![Step::Color(RED)]);
        assert!(wait_for(&handle, |s| s.reading.colors.rgb == RED));

        assert_eq!(handle.freeze(), Ok(SamplingState::Frozen));
        assert_eq!(handle.freeze(), Ok(SamplingState::Frozen));
        let frozen = handle.current();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(handle.current(), frozen);
        assert_eq!(handle.state(), SamplingState::Frozen);

        assert_eq!(handle.toggle_freeze(), Ok(SamplingState::Active));
        assert_eq!(handle.unfreeze(), Ok(SamplingState::Active));
    }

    #[test]
    fn test_capture_and_history_commands() {
        let handle = spawn(vec![Step::Color(RED)]);
        assert!(wait_for(&handle, |s| s.reading.colors.rgb == RED));
        handle.freeze().unwrap();

        assert!(matches!(handle.capture(), Ok(CaptureOutcome::Appended(_))));
        assert!(matches!(handle.capture(), Ok(CaptureOutcome::Duplicate(_))));
        assert_eq!(handle.history().unwrap().len(), 1);

        handle.replace_history(vec![GREEN, RED]).unwrap();
        let rgbs: Vec<Rgb> = handle.history().unwrap().iter().map(HistoryEntry::rgb).collect();
        assert_eq!(rgbs, vec![GREEN, RED]);

        let removed = handle.remove_history(0).unwrap();
        assert_eq!(removed.map(|e| e.rgb()), Some(GREEN));
        assert_eq!(handle.remove_history(9), Ok(None));

        handle.clear_history().unwrap();
        assert!(handle.history().unwrap().is_empty());
    }

    #[test]
    fn test_failures_are_reported_not_fatal() {
        let handle = spawn(vec![
            Step::Color(RED),
            Step::Fail(SamplerError::Timeout(Duration::from_millis(200))),
        ]);
        assert!(wait_for(&handle, |s| matches!(s.status, SamplerStatus::Failing { .. })));
        assert_eq!(handle.current().colors.rgb, RED);
        // La boucle répond toujours / The loop still answers
        assert!(handle.capture().is_ok());
    }

    #[test]
    fn test_commands_not_stalled_by_slow_sampler() {
        let backend = ScriptedSampler::new([Step::Stall(Duration::from_secs(1), RED)]);
        let sampler = TimedSampler::spawn(Box::new(backend), Duration::from_millis(20));
        let handle = SamplingService::spawn(sampler, Duration::from_millis(5), 3).unwrap();

        let started = Instant::now();
        assert_eq!(handle.freeze(), Ok(SamplingState::Frozen));
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(matches!(
            handle.status(),
            SamplerStatus::Failing {
                error: SamplerError::Timeout(_),
                ..
            }
        ));
    }

    #[test]
    fn test_shutdown_stops_loop() {
        let handle = spawn(vec![Step::Color(RED)]);
        let commands = handle.commands.clone();
        handle.shutdown();
        let (reply_tx, _reply_rx) = mpsc::channel();
        assert!(commands.send(Command::Clear(reply_tx)).is_err());
    }
}
