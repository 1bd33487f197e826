//! Palette files
//!
//! A palette is a JSON array of captured colors, oldest first:
//!
//! ```json
//! [{ "hex": "#FF0000", "values": { "RGB": "RGB(255, 0, 0)", "HSL": "HSL(0°, 100%, 50%)" } }]
//! ```
//!
//! `values` is informational. Loading only reads `hex` and recomputes every
//! representation from it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::color::{ColorModelSet, Rgb};
use crate::error::PaletteError;
use crate::store::HistoryEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub hex: String,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl From<&ColorModelSet> for PaletteEntry {
    fn from(colors: &ColorModelSet) -> Self {
        Self {
            hex: colors.hex(),
            values: colors
                .labeled_values()
                .into_iter()
                .map(|(label, text)| (label.to_string(), text))
                .collect(),
        }
    }
}

impl PaletteEntry {
    pub fn rgb(&self) -> Result<Rgb, PaletteError> {
        Ok(self.hex.parse::<Rgb>()?)
    }
}

/// Écrit l'historique dans un fichier palette
/// Writes history to a palette file
pub fn save(path: &Path, entries: &[HistoryEntry]) -> Result<(), PaletteError> {
    let palette: Vec<PaletteEntry> = entries
        .iter()
        .map(|entry| PaletteEntry::from(&entry.colors))
        .collect();
    let json = serde_json::to_string_pretty(&palette)?;
    // Écrit dans un fichier temporaire puis renomme
    // Write a temporary file, then rename it over the target
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, json)?;
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }
    tracing::info!(path = %path.display(), colors = palette.len(), "Palette saved");
    Ok(())
}

/// Lit un fichier palette ; une couleur invalide fait échouer tout le chargement
/// Reads a palette file; one invalid color fails the whole load
pub fn load(path: &Path) -> Result<Vec<Rgb>, PaletteError> {
    let json = fs::read_to_string(path)?;
    let palette: Vec<PaletteEntry> = serde_json::from_str(&json)?;
    let colors = palette
        .iter()
        .map(PaletteEntry::rgb)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(path = %path.display(), colors = colors.len(), "Palette loaded");
    Ok(colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::HistoryStore;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load_keeps_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("palette.json");
        let mut store = HistoryStore::new(10);
        store.replace([Rgb::new(255, 0, 0), Rgb::new(0, 128, 255)]);

        save(&path, &store.export()).unwrap();
        assert_eq!(
            load(&path).unwrap(),
            vec![Rgb::new(255, 0, 0), Rgb::new(0, 128, 255)]
        );
    }

    #[test]
    fn test_save_replaces_existing_file_without_leftovers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("palette.json");
        fs::write(&path, "old contents").unwrap();

        let mut store = HistoryStore::new(10);
        store.replace([Rgb::new(1, 2, 3)]);
        save(&path, &store.export()).unwrap();

        assert_eq!(load(&path).unwrap(), vec![Rgb::new(1, 2, 3)]);
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("palette.json")]);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("palette.json");
        assert!(matches!(save(&path, &[]), Err(PaletteError::Io(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_saved_entry_carries_labeled_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("palette.json");
        let mut store = HistoryStore::new(10);
        store.replace([Rgb::new(255, 0, 0)]);
        save(&path, &store.export()).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["hex"], "#FF0000");
        assert_eq!(raw[0]["values"]["RGB"], "RGB(255, 0, 0)");
        assert_eq!(raw[0]["values"]["HSL"], "HSL(0°, 100%, 50%)");
    }

    #[test]
    fn test_load_accepts_entries_without_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("palette.json");
        fs::write(&path, r##"[{"hex": "#00ff00"}]"##).unwrap();
        assert_eq!(load(&path).unwrap(), vec![Rgb::new(0, 255, 0)]);
    }

    #[test]
    fn test_load_rejects_bad_hex() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("palette.json");
        fs::write(&path, r##"[{"hex": "#GG0000", "values": {}}]"##).unwrap();
        assert!(matches!(load(&path), Err(PaletteError::Color(_))));
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            load(&dir.path().join("missing.json")),
            Err(PaletteError::Io(_))
        ));

        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(load(&path), Err(PaletteError::Json(_))));
    }
}
