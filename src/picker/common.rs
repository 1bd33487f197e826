//! =============================================================================
//! COMMON.RS - Code partagé entre les plateformes
//! COMMON.RS - Shared code between platforms
//! =============================================================================
//!
//! Lancement de processus borné dans le temps et décodage des pixels bruts.
//! Time-bounded process launching and raw pixel decoding.

#[cfg(any(test, target_os = "linux"))]
use std::{
    env, io,
    path::PathBuf,
    process::{Command, Output, Stdio},
    thread,
    time::{Duration, Instant},
};

#[cfg(any(test, target_os = "macos", target_os = "windows"))]
use crate::color::Rgb;
#[cfg(any(test, target_os = "linux"))]
use crate::error::SamplerError;

/// Intervalle de scrutation d'un processus enfant
/// Child process polling interval
#[cfg(any(test, target_os = "linux"))]
const POLL_INTERVAL: Duration = Duration::from_millis(2);

// =============================================================================
// PROCESSUS EXTERNES
// EXTERNAL PROCESSES
// =============================================================================

/// Runs a command to completion, killing it once `timeout` has elapsed.
///
/// A missing program maps to `BackendUnavailable`. The output is expected to
/// be small enough to fit in the pipe buffers, so it is read after exit.
#[cfg(any(test, target_os = "linux"))]
pub fn run_with_timeout(command: &mut Command, timeout: Duration) -> Result<Output, SamplerError> {
    let program = command.get_program().to_string_lossy().into_owned();
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                SamplerError::BackendUnavailable(format!("{program} not found in PATH"))
            }
            io::ErrorKind::PermissionDenied => {
                SamplerError::PermissionDenied(format!("cannot execute {program}"))
            }
            _ => SamplerError::Capture(format!("failed to start {program}: {e}")),
        })?;

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) if Instant::now() >= deadline => {
                // Tue le processus et récupère son statut pour éviter un zombie
                // Kill the process and reap it to avoid a zombie
                let _ = child.kill();
                let _ = child.wait();
                tracing::debug!(program = %program, "Killed external capture process after timeout");
                return Err(SamplerError::Timeout(timeout));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => return Err(SamplerError::Capture(format!("waiting for {program}: {e}"))),
        }
    }

    child
        .wait_with_output()
        .map_err(|e| SamplerError::Capture(format!("reading {program} output: {e}")))
}

/// Cherche un exécutable dans le PATH
/// Looks up an executable in PATH
#[cfg(any(test, target_os = "linux"))]
pub fn find_program(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}

// =============================================================================
// DÉCODAGE DES PIXELS
// PIXEL DECODING
// =============================================================================

/// Lit un pixel BGRA à `offset` (format natif de CoreGraphics)
/// Reads a BGRA pixel at `offset` (CoreGraphics native layout)
#[cfg(any(test, target_os = "macos"))]
pub fn pixel_from_bgra(data: &[u8], offset: usize) -> Option<Rgb> {
    let pixel = data.get(offset..offset + 3)?;
    Some(Rgb::new(pixel[2], pixel[1], pixel[0]))
}

/// Décode un COLORREF Win32 (0x00BBGGRR)
/// Decodes a Win32 COLORREF (0x00BBGGRR)
#[cfg(any(test, target_os = "windows"))]
pub fn rgb_from_colorref(value: u32) -> Rgb {
    Rgb::new(
        (value & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        ((value >> 16) & 0xFF) as u8,
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_from_bgra() {
        let data = [0x10, 0x20, 0x30, 0xFF, 0x01, 0x02, 0x03, 0xFF];
        assert_eq!(pixel_from_bgra(&data, 0), Some(Rgb::new(0x30, 0x20, 0x10)));
        assert_eq!(pixel_from_bgra(&data, 4), Some(Rgb::new(0x03, 0x02, 0x01)));
        assert_eq!(pixel_from_bgra(&data, 6), None);
    }

    #[test]
    fn test_find_program() {
        assert!(find_program("colorprobe-definitely-not-a-real-tool").is_none());
    }

    #[test]
    fn test_rgb_from_colorref() {
        assert_eq!(rgb_from_colorref(0x0080_00FF), Rgb::new(255, 0, 128));
        assert_eq!(rgb_from_colorref(0), Rgb::BLACK);
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let mut command = Command::new("colorprobe-definitely-not-a-real-tool");
        assert!(matches!(
            run_with_timeout(&mut command, Duration::from_millis(100)),
            Err(SamplerError::BackendUnavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_slow_process_is_killed() {
        let mut command = Command::new("sleep");
        command.arg("5");
        let started = Instant::now();
        let result = run_with_timeout(&mut command, Duration::from_millis(50));
        assert_eq!(result.err(), Some(SamplerError::Timeout(Duration::from_millis(50))));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_is_collected() {
        let mut command = Command::new("echo");
        command.arg("X=12");
        let output = run_with_timeout(&mut command, Duration::from_secs(2)).unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "X=12");
    }
}
