//! Linux implementation of the pixel sampler
//!
//! Uses companion command-line tools under X11:
//! - `xdotool getmouselocation --shell` for the pointer position
//! - ImageMagick `import` cropping the root window to one pixel, written as
//!   raw `rgb:` bytes on stdout
//!
//! Wayland compositors do not expose the pointer or the screen to these
//! tools; without an X `DISPLAY` the backend reports itself unavailable.

use std::env;
use std::process::Command;
use std::time::Duration;

use super::common::{find_program, run_with_timeout};
use super::{CursorPosition, PixelSampler};
use crate::color::Rgb;
use crate::error::SamplerError;

/// Outils requis et leur rôle
/// Required tools and what they are for
const REQUIRED_TOOLS: [(&str, &str); 2] = [
    ("xdotool", "pointer position (package xdotool)"),
    ("import", "screen capture (package imagemagick)"),
];

pub struct LinuxBackend {
    timeout: Duration,
}

impl LinuxBackend {
    /// Checks the session and tools up front so a broken setup fails at
    /// startup rather than on every tick.
    pub fn new(timeout: Duration) -> Result<Self, SamplerError> {
        if let Some(problem) = missing_requirements().into_iter().next() {
            return Err(SamplerError::BackendUnavailable(problem));
        }
        Ok(Self { timeout })
    }

    fn run(&self, command: &mut Command) -> Result<Vec<u8>, SamplerError> {
        let output = run_with_timeout(command, self.timeout)?;
        if output.status.success() {
            return Ok(output.stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(classify_failure(&stderr))
    }
}

impl PixelSampler for LinuxBackend {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn cursor_position(&mut self) -> Result<CursorPosition, SamplerError> {
        let stdout = self.run(Command::new("xdotool").args(["getmouselocation", "--shell"]))?;
        let text = String::from_utf8_lossy(&stdout);
        parse_shell_location(&text).ok_or_else(|| {
            SamplerError::Capture(format!("unexpected xdotool output: {}", text.trim()))
        })
    }

    fn pixel_color_at(&mut self, position: CursorPosition) -> Result<Rgb, SamplerError> {
        let crop = format!("1x1+{}+{}", position.x.max(0), position.y.max(0));
        let stdout = self.run(Command::new("import").args([
            "-silent", "-window", "root", "-crop", crop.as_str(), "-depth", "8", "rgb:-",
        ]))?;
        parse_raw_rgb(&stdout).ok_or_else(|| {
            SamplerError::Capture(format!("import returned {} bytes, expected 3", stdout.len()))
        })
    }
}

/// Vérifie DISPLAY et les outils (équivalent du contrôle au démarrage)
/// Checks DISPLAY and the tools (startup requirement check)
pub fn missing_requirements() -> Vec<String> {
    let mut problems = Vec::new();
    if env::var_os("DISPLAY").is_none() {
        let hint = if env::var_os("WAYLAND_DISPLAY").is_some() {
            " (Wayland session without XWayland)"
        } else {
            ""
        };
        problems.push(format!("no X11 DISPLAY is set{hint}"));
    }
    for (tool, purpose) in REQUIRED_TOOLS {
        if find_program(tool).is_none() {
            problems.push(format!("{tool} is missing: {purpose}"));
        }
    }
    problems
}

// =============================================================================
// ANALYSE DES SORTIES
// OUTPUT PARSING
// =============================================================================

/// Parses `X=..` / `Y=..` lines from `xdotool getmouselocation --shell`.
fn parse_shell_location(text: &str) -> Option<CursorPosition> {
    let mut x = None;
    let mut y = None;
    for line in text.lines() {
        match line.trim().split_once('=') {
            Some(("X", value)) => x = value.parse().ok(),
            Some(("Y", value)) => y = value.parse().ok(),
            _ => {}
        }
    }
    Some(CursorPosition::new(x?, y?))
}

fn parse_raw_rgb(bytes: &[u8]) -> Option<Rgb> {
    match bytes {
        [r, g, b, ..] => Some(Rgb::new(*r, *g, *b)),
        _ => None,
    }
}

/// Maps tool error output to the sampler error taxonomy.
fn classify_failure(stderr: &str) -> SamplerError {
    let lower = stderr.to_lowercase();
    if lower.contains("can't open display")
        || lower.contains("unable to open x server")
        || lower.contains("cannot open display")
    {
        SamplerError::BackendUnavailable(format!("X server unreachable: {stderr}"))
    } else if lower.contains("not authorized") || lower.contains("authorization required") {
        SamplerError::PermissionDenied(stderr.to_string())
    } else {
        SamplerError::Capture(stderr.to_string())
    }
}
