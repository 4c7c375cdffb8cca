use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::fonts::DEFAULT_FONT_PATH;

/// Panel titles. `right` titles the panel holding the "before" table and
/// `left` titles the panel holding the "after" table, whatever their
/// on-screen position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PanelTitles {
    pub right: String,
    pub left: String,
}

impl Default for PanelTitles {
    fn default() -> Self {
        Self {
            right: "before".to_string(),
            left: "after".to_string(),
        }
    }
}

/// Colour-scale bounds and titles for a comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub vmax: f64,
    pub vmin: f64,
    /// Diverging midpoint. Kept on each panel; the linear red-to-green
    /// colormap does not shift around it.
    pub center: f64,
    #[serde(rename = "title")]
    pub titles: PanelTitles,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            vmax: 0.8,
            vmin: 0.2,
            center: 0.0,
            titles: PanelTitles::default(),
        }
    }
}

/// Physical size and typography of the rendered figure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width_inches: f64,
    pub height_inches: f64,
    pub dpi: u32,
    /// TrueType font used for every label. The default is a Debian/Ubuntu
    /// DejaVu Sans path; set this on systems that keep fonts elsewhere.
    pub font_path: PathBuf,
    pub title_points: f64,
    pub annotation_points: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width_inches: 6.4,
            height_inches: 4.8,
            dpi: 300,
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            title_points: 12.0,
            annotation_points: 7.0,
        }
    }
}

impl FigureConfig {
    pub fn pixel_size(&self) -> (u32, u32) {
        let px = |inches: f64| (inches * self.dpi as f64).round().max(1.0) as u32;
        (px(self.width_inches), px(self.height_inches))
    }

    /// Convert a typographic point size to pixels at this figure's DPI.
    pub fn points_to_pixels(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }
}

/// Load a JSON settings file, or write `initializer()` to `path` and use it.
pub fn load_or_init<T, F>(path: &Path, initializer: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> T,
{
    if path.exists() {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?;
        let value = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse settings at {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        return Ok(value);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let value = initializer();
    let serialized = serde_json::to_string_pretty(&value)?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write settings to {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote default settings");
    Ok(value)
}
