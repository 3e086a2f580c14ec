/*
This code is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 01/10/2026
Last Modified: 16/10/2026
License: MIT
*/

use super::values::ParamValue;
use std::collections::{BTreeMap, BTreeSet};

pub const EXTENT: &str = "extent";
pub const WORKSPACE: &str = "workspace";
pub const SCRATCH_WORKSPACE: &str = "scratchWorkspace";
pub const PARALLEL_PROCESSING_FACTOR: &str = "parallelProcessingFactor";
pub const OUTPUT_COORDINATE_SYSTEM: &str = "outputCoordinateSystem";
pub const CELL_SIZE: &str = "cellSize";
pub const XY_TOLERANCE: &str = "XYTolerance";
pub const XY_RESOLUTION: &str = "XYResolution";

/// Caller-owned execution environment overrides, passed explicitly into
/// every `execute()` call. Keys are matched exactly (case-sensitive).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentSettings {
    overrides: BTreeMap<String, ParamValue>,
}

impl EnvironmentSettings {
    pub fn new() -> EnvironmentSettings {
        EnvironmentSettings::default()
    }

    /// Builds settings from plain text values, e.g. those kept in settings.json.
    pub fn from_literals<'a, I>(literals: I) -> EnvironmentSettings
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut settings = EnvironmentSettings::new();
        for (key, value) in literals {
            settings.set(key, ParamValue::Text(value.clone()));
        }
        settings
    }

    pub fn set(&mut self, key: &str, value: ParamValue) -> &mut EnvironmentSettings {
        self.overrides.insert(key.to_string(), value);
        self
    }

    pub fn with(mut self, key: &str, value: ParamValue) -> EnvironmentSettings {
        self.set(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.overrides.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.overrides.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.overrides.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// The subset of these settings whose keys are in `valid_keys`.
    pub fn restricted_to(&self, valid_keys: &BTreeSet<String>) -> EnvironmentSettings {
        EnvironmentSettings {
            overrides: filter(self, valid_keys).applied,
        }
    }

    /// Overlays `other` on top of these settings; `other` wins on conflicts.
    pub fn merged_with(&self, other: &EnvironmentSettings) -> EnvironmentSettings {
        let mut merged = self.clone();
        for (key, value) in other.iter() {
            merged.set(key, value.clone());
        }
        merged
    }
}

/// Result of reconciling overrides with a tool's valid environment keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredEnvironment {
    pub applied: BTreeMap<String, ParamValue>,
    pub rejected: BTreeMap<String, ParamValue>,
}

/// Partitions `overrides` into the keys the tool honours and the rest.
pub fn filter(overrides: &EnvironmentSettings, valid_keys: &BTreeSet<String>) -> FilteredEnvironment {
    let mut ret = FilteredEnvironment::default();
    for (key, value) in overrides.iter() {
        if valid_keys.contains(key) {
            ret.applied.insert(key.clone(), value.clone());
        } else {
            ret.rejected.insert(key.clone(), value.clone());
        }
    }
    ret
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_filter_partitions_overrides() {
        let valid: BTreeSet<String> = [WORKSPACE.to_string()].into_iter().collect();
        let overrides = EnvironmentSettings::new()
            .with(WORKSPACE, ParamValue::text("/data/city.gdb"))
            .with(EXTENT, ParamValue::text("0 0 10 10"));
        let filtered = filter(&overrides, &valid);
        assert_eq!(filtered.applied.len(), 1);
        assert_eq!(filtered.applied[WORKSPACE], ParamValue::text("/data/city.gdb"));
        assert_eq!(filtered.rejected.len(), 1);
        assert_eq!(filtered.rejected[EXTENT], ParamValue::text("0 0 10 10"));
    }

    #[test]
    fn test_filter_with_no_valid_keys_rejects_everything() {
        let overrides = EnvironmentSettings::new().with(CELL_SIZE, ParamValue::Double(30.0));
        let filtered = filter(&overrides, &BTreeSet::new());
        assert!(filtered.applied.is_empty());
        assert_eq!(filtered.rejected.len(), 1);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let valid: BTreeSet<String> = [SCRATCH_WORKSPACE.to_string()].into_iter().collect();
        let overrides = EnvironmentSettings::new().with("scratchworkspace", ParamValue::text("/tmp"));
        assert_eq!(filter(&overrides, &valid).rejected.len(), 1);
    }

    #[test]
    fn test_restricted_to_drops_foreign_keys() {
        let valid: BTreeSet<String> = [EXTENT.to_string()].into_iter().collect();
        let defaults = EnvironmentSettings::new()
            .with(WORKSPACE, ParamValue::text("/data/city.gdb"))
            .with(EXTENT, ParamValue::text("0 0 10 10"));
        let restricted = defaults.restricted_to(&valid);
        assert_eq!(restricted.get(EXTENT), Some(&ParamValue::text("0 0 10 10")));
        assert_eq!(restricted.get(WORKSPACE), None);
        assert!(defaults.restricted_to(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_merged_with_prefers_overlay() {
        let base = EnvironmentSettings::new()
            .with(WORKSPACE, ParamValue::text("/a"))
            .with(CELL_SIZE, ParamValue::Long(10));
        let overlay = EnvironmentSettings::new().with(WORKSPACE, ParamValue::text("/b"));
        let merged = base.merged_with(&overlay);
        assert_eq!(merged.get(WORKSPACE), Some(&ParamValue::text("/b")));
        assert_eq!(merged.get(CELL_SIZE), Some(&ParamValue::Long(10)));
    }
}
