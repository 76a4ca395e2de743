//! UI theme handed to widgets through the ApplyTheme capability
//!
//! Styling rules belong to the widgets themselves. The layout only carries the
//! active theme and hands it to every widget it pushes (and to every live
//! widget when the theme changes).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Named palette of semantic colors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Semantic color name -> "#RRGGBB"
    #[serde(default)]
    pub colors: HashMap<String, String>,
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
}

fn default_font_scale() -> f32 {
    1.0
}

impl Default for Theme {
    fn default() -> Self {
        ThemePresets::dark()
    }
}

impl Theme {
    fn from_pairs(name: &str, description: &str, pairs: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            colors: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            font_scale: default_font_scale(),
        }
    }

    /// Get a color by semantic name
    pub fn color(&self, name: &str) -> Option<&str> {
        self.colors.get(name).map(String::as_str)
    }

    /// Fill any semantic color this theme leaves out from `base`
    pub fn merged_over(mut self, base: &Theme) -> Self {
        for (key, value) in &base.colors {
            self.colors
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }

    /// Problems with this theme (malformed colors, nonsensical font scale)
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push("theme has an empty name".to_string());
        }
        let mut keys: Vec<_> = self.colors.keys().collect();
        keys.sort();
        for key in keys {
            let value = &self.colors[key];
            if parse_hex_color(value).is_none() {
                problems.push(format!(
                    "theme '{}': color '{}' has invalid value '{}' (expected #RRGGBB)",
                    self.name, key, value
                ));
            }
        }
        if !(self.font_scale > 0.0 && self.font_scale <= 4.0) {
            problems.push(format!(
                "theme '{}': font_scale {} is outside (0, 4]",
                self.name, self.font_scale
            ));
        }
        problems
    }
}

/// Parse "#RRGGBB" into its components
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Built-in theme presets
pub struct ThemePresets;

impl ThemePresets {
    /// Get all available built-in themes
    pub fn all() -> HashMap<String, Theme> {
        let mut themes = HashMap::new();
        for theme in [Self::dark(), Self::light(), Self::high_contrast()] {
            themes.insert(theme.name.clone(), theme);
        }
        themes
    }

    pub fn get(name: &str) -> Option<Theme> {
        Self::all().remove(name)
    }

    pub fn dark() -> Theme {
        Theme::from_pairs(
            "dark",
            "Dark panels with a blue accent",
            &[
                ("text_primary", "#ffffff"),
                ("text_secondary", "#a0a0a0"),
                ("panel_background", "#1e1e1e"),
                ("menu_background", "#252526"),
                ("modal_background", "#101010"),
                ("modal_scrim", "#000000"),
                ("border", "#3c3c3c"),
                ("accent", "#4a9eff"),
            ],
        )
    }

    pub fn light() -> Theme {
        Theme::from_pairs(
            "light",
            "Light panels for bright rooms",
            &[
                ("text_primary", "#1e1e1e"),
                ("text_secondary", "#5a5a5a"),
                ("panel_background", "#f3f3f3"),
                ("menu_background", "#ffffff"),
                ("modal_background", "#e8e8e8"),
                ("modal_scrim", "#808080"),
                ("border", "#c8c8c8"),
                ("accent", "#005fb8"),
            ],
        )
    }

    pub fn high_contrast() -> Theme {
        Theme::from_pairs(
            "high-contrast",
            "Maximum contrast for low vision players",
            &[
                ("text_primary", "#ffffff"),
                ("text_secondary", "#ffff00"),
                ("panel_background", "#000000"),
                ("menu_background", "#000000"),
                ("modal_background", "#000000"),
                ("modal_scrim", "#000000"),
                ("border", "#ffffff"),
                ("accent", "#00ffff"),
            ],
        )
    }
}
