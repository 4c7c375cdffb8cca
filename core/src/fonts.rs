use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
};

use ab_glyph::FontRef;
use anyhow::{anyhow, Context, Result};
use plotters::style::{register_font, FontStyle};

/// Font used when the figure configuration does not name one. This is the
/// Debian/Ubuntu location of DejaVu Sans; other systems need `font_path` set.
pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

static REGISTERED: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();

/// Make the font at `path` available to plotters and return the family name
/// to draw with. Each path is read and registered at most once per process.
pub fn ensure_font(path: &Path) -> Result<String> {
    let family = family_name(path);
    let registry = REGISTERED.get_or_init(|| Mutex::new(HashSet::new()));
    let mut registered = registry
        .lock()
        .map_err(|_| anyhow!("font registry lock poisoned"))?;

    if registered.contains(path) {
        return Ok(family);
    }

    let bytes = fs::read(path).with_context(|| {
        format!(
            "failed to read font from {}; point the figure's `font_path` setting at a TTF file",
            path.display()
        )
    })?;
    FontRef::try_from_slice(&bytes)
        .map_err(|_| anyhow!("{} is not a usable font file", path.display()))?;

    // plotters keeps fonts for the life of the process.
    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
    register_font(&family, FontStyle::Normal, bytes)
        .map_err(|_| anyhow!("{} is not a usable font file", path.display()))?;

    tracing::debug!(font = %path.display(), "registered font");
    registered.insert(path.to_path_buf());
    Ok(family)
}

fn family_name(path: &Path) -> String {
    format!("biasmap:{}", path.display())
}
