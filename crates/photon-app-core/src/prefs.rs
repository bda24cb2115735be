// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Persisted preferences for photon tools: the print profile used for new
//! files and the analysis worker count.

use photon_file::PrintProfile;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigService, ConfigStore};

/// Store key the preferences live under.
pub const PREFS_KEY: &str = "prefs";

/// Saved tool preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ToolPrefs {
    /// Defaults applied when synthesizing a new file.
    pub profile: PrintProfile,
    /// Analysis worker count; `None` means one per available core.
    pub workers: Option<usize>,
}

impl ToolPrefs {
    /// Load from `service`, falling back to defaults when nothing is stored.
    pub fn load<S: ConfigStore>(service: &ConfigService<S>) -> Result<Self, ConfigError> {
        service.load_or_default(PREFS_KEY)
    }

    /// Persist to `service`.
    pub fn save<S: ConfigStore>(&self, service: &ConfigService<S>) -> Result<(), ConfigError> {
        service.save(PREFS_KEY, self)
    }

    /// Worker count to actually use.
    pub fn effective_workers(&self) -> usize {
        self.workers
            .filter(|&n| n > 0)
            .unwrap_or_else(photon_file::default_workers)
    }
}
