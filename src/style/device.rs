//! Device and environment context
//!
//! Unit conversion needs facts the engine cannot know on its own: viewport
//! dimensions, writing mode, the root font size, font metric ratios, and
//! `env()` values. Callers supply them through [`DeviceContext`]. Absence of
//! viewport dimensions is a hard error for viewport-relative units, never a
//! silent zero.

use rustc_hash::FxHashMap;

/// Writing mode, used to map the logical `vi`/`vb` units onto `vw`/`vh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritingMode {
  #[default]
  HorizontalTb,
  VerticalRl,
  VerticalLr,
}

impl WritingMode {
  pub fn is_vertical(self) -> bool {
    matches!(self, Self::VerticalRl | Self::VerticalLr)
  }
}

/// Font metric ratios per em, used for units whose exact value depends on
/// font data the engine does not load itself. Defaults follow common
/// heuristics when no font database is wired in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
  /// x-height / em (`ex`, `rex`)
  pub ex_ratio: f32,
  /// advance of '0' / em (`ch`, `rch`)
  pub ch_ratio: f32,
  /// cap height / em (`cap`)
  pub cap_ratio: f32,
  /// ideographic advance / em (`ic`, `ric`)
  pub ic_ratio: f32,
}

impl Default for FontMetrics {
  fn default() -> Self {
    Self {
      ex_ratio: 0.5,
      ch_ratio: 0.5,
      cap_ratio: 0.7,
      ic_ratio: 1.0,
    }
  }
}

/// Viewport dimensions in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
  pub width: f32,
  pub height: f32,
}

/// The externally supplied device/unit-conversion context.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceContext {
  /// Viewport dimensions; `None` makes viewport-relative units a hard error.
  pub viewport: Option<Viewport>,
  pub writing_mode: WritingMode,
  /// Root element font size in px (the `rem` basis).
  pub root_font_size: f32,
  /// Root element line height in px (the `rlh` basis).
  pub root_line_height: f32,
  pub metrics: FontMetrics,
  env: FxHashMap<String, String>,
}

impl Default for DeviceContext {
  fn default() -> Self {
    let mut env = FxHashMap::default();
    for name in [
      "safe-area-inset-top",
      "safe-area-inset-right",
      "safe-area-inset-bottom",
      "safe-area-inset-left",
    ] {
      env.insert(name.to_string(), "0px".to_string());
    }
    Self {
      viewport: None,
      writing_mode: WritingMode::default(),
      root_font_size: 16.0,
      root_line_height: 16.0 * 1.2,
      metrics: FontMetrics::default(),
      env,
    }
  }
}

impl DeviceContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_viewport(mut self, width: f32, height: f32) -> Self {
    self.viewport = Some(Viewport { width, height });
    self
  }

  pub fn with_writing_mode(mut self, mode: WritingMode) -> Self {
    self.writing_mode = mode;
    self
  }

  pub fn with_root_font_size(mut self, px: f32) -> Self {
    self.root_font_size = px;
    self.root_line_height = px * 1.2;
    self
  }

  pub fn with_root_line_height(mut self, px: f32) -> Self {
    self.root_line_height = px;
    self
  }

  pub fn with_metrics(mut self, metrics: FontMetrics) -> Self {
    self.metrics = metrics;
    self
  }

  /// Register or override an environment value (`env()` source).
  pub fn set_env(&mut self, name: &str, value: &str) {
    self.env.insert(name.to_string(), value.to_string());
  }

  pub fn env_value(&self, name: &str) -> Option<&str> {
    self.env.get(name).map(String::as_str)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_context_has_safe_area_env_values() {
    let device = DeviceContext::default();
    assert_eq!(device.env_value("safe-area-inset-top"), Some("0px"));
    assert_eq!(device.env_value("titlebar-area-x"), None);
  }

  #[test]
  fn root_font_size_tracks_line_height_default() {
    let device = DeviceContext::new().with_root_font_size(20.0);
    assert!((device.root_line_height - 24.0).abs() < f32::EPSILON);
  }

  #[test]
  fn custom_env_values_override() {
    let mut device = DeviceContext::new();
    device.set_env("safe-area-inset-top", "24px");
    assert_eq!(device.env_value("safe-area-inset-top"), Some("24px"));
  }
}
