use serde::{Deserialize, Serialize};
use std::path::Path;

/// Spacing constants for the sequential layout. Immutable for the duration of
/// a generation pass; all geometry on the wire is integral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub start_x: i32,
    pub start_y: i32,
    pub horizontal_spacing: i32,
    pub vertical_spacing: i32,
    pub subprocess_indent: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            start_x: 160,
            start_y: 100,
            horizontal_spacing: 150,
            vertical_spacing: 100,
            subprocess_indent: 50,
        }
    }
}

impl LayoutConfig {
    /// Position of the `index`-th node in traversal order. Pure: the same
    /// inputs always produce the same coordinates.
    pub fn position(&self, index: usize, level: usize, inside_subprocess: bool) -> (i32, i32) {
        let mut x = self.start_x + index as i32 * self.horizontal_spacing;
        let mut y = self.start_y + level as i32 * self.vertical_spacing;
        if inside_subprocess {
            x += self.subprocess_indent;
            y += self.subprocess_indent;
        }
        (x, y)
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    start_x: Option<i32>,
    start_y: Option<i32>,
    horizontal_spacing: Option<i32>,
    vertical_spacing: Option<i32>,
    subprocess_indent: Option<i32>,
}

/// Load layout constants, merging a JSON config file over the defaults when a
/// path is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let mut config = LayoutConfig::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: LayoutConfigFile = serde_json::from_str(&contents)?;

    if let Some(v) = parsed.start_x {
        config.start_x = v;
    }
    if let Some(v) = parsed.start_y {
        config.start_y = v;
    }
    if let Some(v) = parsed.horizontal_spacing {
        config.horizontal_spacing = v;
    }
    if let Some(v) = parsed.vertical_spacing {
        config.vertical_spacing = v;
    }
    if let Some(v) = parsed.subprocess_indent {
        config.subprocess_indent = v;
    }
    Ok(config)
}
