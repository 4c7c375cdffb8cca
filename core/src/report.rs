use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_REPORT_TEMPLATE: &str = r"# Intersectional Bias Comparison

<!-- SECTION:overview start -->
<!-- Describe the dataset, the sensitive attribute pair and the mitigation being compared. -->
<!-- SECTION:overview end -->

## Configuration

<!-- SECTION:configuration start -->
<!-- Colour bounds and titles from the latest run. -->
<!-- SECTION:configuration end -->

## Panel Summary

<!-- SECTION:summary start -->
<!-- Per-panel statistics from the latest run. -->
<!-- SECTION:summary end -->

## Figure

<!-- SECTION:figure start -->
<!-- The rendered before/after heat maps. -->
<!-- SECTION:figure end -->

> Regions between `<!-- SECTION:name start/end -->` markers are rewritten on every run; edit outside them.
";

/// Replacement content for the region between a named pair of markers.
#[derive(Clone, Debug)]
pub struct ReportSection {
    id: String,
    content: String,
}

impl ReportSection {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    fn markers(&self) -> (String, String) {
        (
            format!("<!-- SECTION:{} start -->", self.id),
            format!("<!-- SECTION:{} end -->", self.id),
        )
    }

    fn splice(&self, document: &str) -> Result<String> {
        let (start, end) = self.markers();
        let open = document
            .find(&start)
            .ok_or_else(|| anyhow!("missing start marker: {}", start))?
            + start.len();
        let close = document[open..]
            .find(&end)
            .map(|offset| open + offset)
            .ok_or_else(|| anyhow!("missing end marker: {}", end))?;

        let body = self.content.trim_matches('\n');
        let mut spliced = String::with_capacity(document.len() + body.len() + 2);
        spliced.push_str(&document[..open]);
        spliced.push('\n');
        if !body.is_empty() {
            spliced.push_str(body);
            spliced.push('\n');
        }
        spliced.push_str(&document[close..]);
        Ok(spliced)
    }
}

/// Create the notebook from `template` unless it already exists.
pub fn ensure_report_file(path: &Path, template: &str) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, template)
        .with_context(|| format!("failed to write notebook template to {}", path.display()))
}

/// Rewrite each section in place. The file is untouched if any marker is missing.
pub fn update_sections(path: &Path, sections: &[ReportSection]) -> Result<()> {
    let original = fs::read_to_string(path)
        .with_context(|| format!("failed to read notebook at {}", path.display()))?;

    let updated = sections
        .iter()
        .try_fold(original, |document, section| section.splice(&document))
        .with_context(|| format!("failed to update notebook at {}", path.display()))?;

    fs::write(path, updated)
        .with_context(|| format!("failed to write notebook to {}", path.display()))
}
