//! User settings that gate and shape overlay rendering.

use crate::diagnostics::SeverityFilter;
use crate::events::{EventBus, OverlayEvent};
use chrono::format::{Item, StrftimeItems};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default maximum length (in characters) of an inline diagnostic message.
pub const DEFAULT_INLINE_DIAGNOSTIC_MAX_LENGTH: usize = 80;

/// Default `chrono` format string for blame dates.
pub const DEFAULT_BLAME_DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors produced while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings document is not valid JSON (or has wrongly typed fields).
    #[error("invalid overlay settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// `blame_date_format` contains a specifier `chrono` cannot format.
    #[error("invalid blame date format: {0:?}")]
    InvalidDateFormat(String),
}

/// Overlay settings.
///
/// Every field has a default, so a partial document only overrides what it names:
///
/// ```rust
/// use editor_overlay::OverlaySettings;
///
/// let settings = OverlaySettings::from_json_str(r#"{ "gutter_enabled": false }"#).unwrap();
/// assert!(!settings.gutter_enabled);
/// assert!(settings.inline_blame_enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    /// Show added/modified bars in the gutter.
    pub gutter_enabled: bool,
    /// Show inline blame text.
    pub inline_blame_enabled: bool,
    /// Show inline diagnostic messages.
    pub inline_diagnostics_enabled: bool,
    /// Severities shown as inline messages.
    pub inline_diagnostic_severities: SeverityFilter,
    /// Maximum inline message length in characters (ellipsis included).
    pub inline_diagnostic_max_length: usize,
    /// `chrono` format string used for blame dates.
    pub blame_date_format: String,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            gutter_enabled: true,
            inline_blame_enabled: true,
            inline_diagnostics_enabled: true,
            inline_diagnostic_severities: SeverityFilter::default(),
            inline_diagnostic_max_length: DEFAULT_INLINE_DIAGNOSTIC_MAX_LENGTH,
            blame_date_format: DEFAULT_BLAME_DATE_FORMAT.to_string(),
        }
    }
}

impl OverlaySettings {
    /// Parse a JSON settings document. Unknown keys are ignored.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check the values serde cannot: currently the blame date format.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !is_valid_date_format(&self.blame_date_format) {
            return Err(SettingsError::InvalidDateFormat(self.blame_date_format.clone()));
        }
        Ok(())
    }
}

/// `true` if every specifier of `format` is understood by `chrono`.
pub(crate) fn is_valid_date_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Synchronously readable, subscribable settings container.
pub struct SettingsStore {
    current: RwLock<Arc<OverlaySettings>>,
    bus: Arc<EventBus>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("current", &*self.current.read())
            .finish()
    }
}

impl SettingsStore {
    /// Create a store holding `initial`.
    pub fn new(initial: OverlaySettings, bus: Arc<EventBus>) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            bus,
        }
    }

    /// Current settings.
    pub fn get(&self) -> Arc<OverlaySettings> {
        Arc::clone(&self.current.read())
    }

    /// Replace the settings. Publishes one `SettingsChanged` event if the value changed and
    /// returns whether it did.
    pub fn set(&self, settings: OverlaySettings) -> bool {
        {
            let mut current = self.current.write();
            if **current == settings {
                return false;
            }
            *current = Arc::new(settings);
        }
        self.bus.publish(&OverlayEvent::SettingsChanged);
        true
    }

    /// Modify a copy of the current settings and store it via [`SettingsStore::set`].
    ///
    /// Any number of field changes made inside `f` produce at most one notification.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut OverlaySettings),
    {
        let mut next = (*self.get()).clone();
        f(&mut next);
        self.set(next)
    }
}
