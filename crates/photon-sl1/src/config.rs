// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Settings gathered from the archive's `*.ini` entries.
//!
//! Every `key = value` line is stored as `<ini stem>.<key>`, so
//! `config.ini` yields `config.expTime` and `prusaslicer.ini` yields
//! `prusaslicer.bottle_cost`.

use std::collections::BTreeMap;

use crate::error::{Result, Sl1Error};

const USED_MATERIAL: &str = "config.usedMaterial";
const BOTTLE_VOLUME: &str = "prusaslicer.bottle_volume";
const BOTTLE_COST: &str = "prusaslicer.bottle_cost";
const BOTTLE_WEIGHT: &str = "prusaslicer.bottle_weight";

/// Flat key/value view over all ini entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sl1Config {
    values: BTreeMap<String, String>,
}

impl Sl1Config {
    /// Add the lines of one ini document named `stem`.
    ///
    /// Lines without `=` or with nothing after it are skipped. Later keys
    /// replace earlier ones.
    pub fn read_ini(&mut self, stem: &str, text: &str) {
        for line in text.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            if key.is_empty() || value.is_empty() {
                continue;
            }
            self.values
                .insert(format!("{stem}.{}", key.trim()), value.trim().to_owned());
        }
    }

    /// Raw value under a qualified key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| Sl1Error::MissingKey {
            key: key.to_owned(),
        })
    }

    fn float(&self, key: &str) -> Result<f32> {
        let raw = self.require(key)?;
        raw.parse().map_err(|_| Sl1Error::BadValue {
            key: key.to_owned(),
            value: raw.to_owned(),
        })
    }

    /// Integers are written as floats by some slicers (`12.0`).
    fn count(&self, key: &str) -> Result<u32> {
        self.float(key).map(|v| v.max(0.0) as u32)
    }

    fn float_or(&self, key: &str, default: f32) -> f32 {
        self.get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Number of layers (`config.numFast`).
    pub fn layer_count(&self) -> Result<u32> {
        self.count("config.numFast")
    }

    /// Whether the settings describe at least one layer.
    pub fn is_valid(&self) -> bool {
        self.layer_count().is_ok_and(|n| n > 0)
    }

    /// Number of bottom layers (`config.numFade`).
    pub fn bottom_layers(&self) -> Result<u32> {
        self.count("config.numFade")
    }

    /// Normal exposure in seconds.
    pub fn exposure_s(&self) -> Result<f32> {
        self.float("config.expTime")
    }

    /// Bottom exposure in seconds.
    pub fn bottom_exposure_s(&self) -> Result<f32> {
        self.float("config.expTimeFirst")
    }

    /// Layer height in millimeters.
    pub fn layer_height_mm(&self) -> Result<f32> {
        self.float("config.layerHeight")
    }

    /// Slicer's print-time estimate, when present.
    pub fn print_time_s(&self) -> Option<u32> {
        self.count("config.printTime").ok()
    }

    /// Prefix of the layer image names (`config.jobDir`).
    pub fn job_dir(&self) -> Result<&str> {
        self.require("config.jobDir")
    }

    /// Resin used by the job in milliliters.
    pub fn used_material_ml(&self) -> f32 {
        self.float_or(USED_MATERIAL, 0.0)
    }

    /// Resin density in g/ml from the bottle settings.
    pub fn density_g_per_ml(&self) -> f32 {
        let volume_ml = self.float_or(BOTTLE_VOLUME, 1000.0);
        let weight_kg = self.float_or(BOTTLE_WEIGHT, 1.0);
        weight_kg * 1000.0 / volume_ml
    }

    /// Resin weight of the job in grams.
    pub fn weight_g(&self) -> f32 {
        self.used_material_ml() * self.density_g_per_ml()
    }

    /// Resin cost of the job, in the bottle's currency.
    pub fn cost(&self) -> f32 {
        let volume_ml = self.float_or(BOTTLE_VOLUME, 1000.0);
        let bottle_cost = self.float_or(BOTTLE_COST, 0.0);
        self.used_material_ml() * bottle_cost / volume_ml
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    const CONFIG: &str = "\
action = print
jobDir = cube
expTime = 8.5
expTimeFirst = 35
layerHeight = 0.05
numFade = 10
numFast = 120
printTime = 1834.5
usedMaterial = 12.5
no separator here
empty =
";

    #[test]
    fn keys_are_qualified_and_trimmed() {
        let mut config = Sl1Config::default();
        config.read_ini("config", CONFIG);
        assert_eq!(config.get("config.jobDir"), Some("cube"));
        assert_eq!(config.get("config.action"), Some("print"));
        assert_eq!(config.get("config.empty"), None);
        assert_eq!(config.get("jobDir"), None);
        assert_eq!(config.layer_count().unwrap(), 120);
        assert_eq!(config.bottom_layers().unwrap(), 10);
        assert_eq!(config.exposure_s().unwrap(), 8.5);
        assert_eq!(config.print_time_s(), Some(1834));
        assert!(config.is_valid());
    }

    #[test]
    fn material_figures_follow_the_bottle() {
        let mut config = Sl1Config::default();
        config.read_ini("config", CONFIG);
        config.read_ini(
            "prusaslicer",
            "bottle_volume = 500\nbottle_cost = 25\nbottle_weight = 0.55\n",
        );
        assert!((config.density_g_per_ml() - 1.1).abs() < 1e-6);
        assert!((config.weight_g() - 13.75).abs() < 1e-4);
        assert!((config.cost() - 0.625).abs() < 1e-6);
    }

    #[test]
    fn bottle_defaults_apply_when_absent_or_unreadable() {
        let mut config = Sl1Config::default();
        config.read_ini("config", CONFIG);
        config.read_ini("prusaslicer", "bottle_volume = lots\n");
        assert_eq!(config.density_g_per_ml(), 1.0);
        assert_eq!(config.weight_g(), 12.5);
        assert_eq!(config.cost(), 0.0);
    }

    #[test]
    fn required_keys_are_reported() {
        let mut config = Sl1Config::default();
        assert!(!config.is_valid());
        assert!(matches!(
            config.exposure_s(),
            Err(Sl1Error::MissingKey { key }) if key == "config.expTime"
        ));
        config.read_ini("config", "expTime = fast\n");
        assert!(matches!(
            config.exposure_s(),
            Err(Sl1Error::BadValue { value, .. }) if value == "fast"
        ));
    }
}
