//! Engine configuration
//!
//! All parser/matcher/resolver behavior toggles live here and are threaded
//! explicitly through constructors. There is no ambient global state: two
//! engines with different configurations can coexist in one process.

/// Document parsing mode, controlling case sensitivity of matching.
///
/// In quirks-style documents tag names, class names and ids compare
/// case-insensitively; standards mode compares tag names case-insensitively
/// (HTML convention) but classes and ids exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentMode {
  #[default]
  Standards,
  Quirks,
}

/// Acceptance flags for legacy compatibility quirk markers.
///
/// A recognized marker on a declaration is only honored when its flag is
/// enabled; with the flag disabled the whole declaration is dropped as
/// invalid (recorded as a warning, not an error). Unrecognized trailing
/// noise is silently discarded per forward-compatible parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompatConfig {
  /// Accept the `!ie` bang hack (`width: 600px !ie;`).
  pub allow_ie_bang: bool,
  /// Accept the trailing `\9` hack (`width: 200px\9;`).
  pub allow_backslash_hack: bool,
  /// Accept the doubled `!important!` hack.
  pub allow_double_important: bool,
}

impl CompatConfig {
  /// Everything off: strictly standard CSS.
  pub const STRICT: Self = Self {
    allow_ie_bang: false,
    allow_backslash_hack: false,
    allow_double_important: false,
  };

  /// Everything on: accept all recognized legacy markers.
  pub const PERMISSIVE: Self = Self {
    allow_ie_bang: true,
    allow_backslash_hack: true,
    allow_double_important: true,
  };
}

/// Complete engine configuration, passed by reference into the parser,
/// matcher, cascade, and resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
  pub mode: DocumentMode,
  pub compat: CompatConfig,
}

impl EngineConfig {
  pub fn standards() -> Self {
    Self::default()
  }

  pub fn quirks() -> Self {
    Self {
      mode: DocumentMode::Quirks,
      ..Self::default()
    }
  }

  pub fn with_compat(mut self, compat: CompatConfig) -> Self {
    self.compat = compat;
    self
  }
}
