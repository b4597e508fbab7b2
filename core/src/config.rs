//! Generation parameters.
//!
//! Defaults reproduce the demo dataset: 10 visitors, 2 customers,
//! 3 products over 3 channels, seed 0, calendar year 2024.

use crate::error::{SimError, SimResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const MAX_DECIMAL_PRECISION: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub visitor_count: usize,
    pub customer_count: usize,
    pub product_count: usize,
    pub channel_list: Vec<String>,
    /// Chance that a click starts an application.
    pub submission_probability: f64,
    /// Chance that any stage after `applied` ends in `cancelled`.
    pub cancel_probability: f64,
    /// Chance that the decision stage approves.
    pub approve_reject_probability: f64,
    pub random_seed: u64,
    pub campaign_window_start: NaiveDateTime,
    pub campaign_window_end: NaiveDateTime,
    pub decimal_precision: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            visitor_count: 10,
            customer_count: 2,
            product_count: 3,
            channel_list: vec!["direct_marketing".into(), "web".into(), "mobile".into()],
            submission_probability: 0.05,
            cancel_probability: 0.1,
            approve_reject_probability: 0.5,
            random_seed: 0,
            campaign_window_start: datetime(2024, 1, 1, 0, 0, 0),
            campaign_window_end: datetime(2024, 12, 31, 23, 59, 59),
            decimal_precision: 4,
        }
    }
}

impl GeneratorConfig {
    /// Load from a JSON file. Keys absent from the file keep their defaults.
    /// In tests, use GeneratorConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: GeneratorConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Config with hardcoded values for use in tests.
    /// Submission odds are raised so small populations still apply.
    pub fn default_test() -> Self {
        Self {
            visitor_count: 40,
            customer_count: 8,
            submission_probability: 0.3,
            random_seed: 42,
            ..Self::default()
        }
    }

    /// Number of campaigns: one per (product, channel) pair.
    pub fn campaign_count(&self) -> usize {
        self.product_count * self.channel_list.len()
    }

    /// Reject configurations the generator cannot honour.
    pub fn validate(&self) -> SimResult<()> {
        if self.visitor_count == 0 {
            return Err(SimError::config("visitor_count", "must be positive"));
        }
        if self.product_count == 0 {
            return Err(SimError::config("product_count", "must be positive"));
        }
        if self.channel_list.is_empty() {
            return Err(SimError::config("channel_list", "must name at least one channel"));
        }
        let mut seen = HashSet::new();
        for name in &self.channel_list {
            if name.trim().is_empty() {
                return Err(SimError::config("channel_list", "contains an empty name"));
            }
            if !seen.insert(name.as_str()) {
                return Err(SimError::config("channel_list", format!("repeats '{name}'")));
            }
        }
        for (field, p) in [
            ("submission_probability", self.submission_probability),
            ("cancel_probability", self.cancel_probability),
            ("approve_reject_probability", self.approve_reject_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::config(field, format!("{p} is outside [0, 1]")));
            }
        }
        if self.campaign_window_end <= self.campaign_window_start {
            return Err(SimError::config(
                "campaign_window_end",
                format!(
                    "{} is not after campaign_window_start {}",
                    self.campaign_window_end, self.campaign_window_start
                ),
            ));
        }
        if self.decimal_precision > MAX_DECIMAL_PRECISION {
            return Err(SimError::config(
                "decimal_precision",
                format!("{} exceeds {MAX_DECIMAL_PRECISION}", self.decimal_precision),
            ));
        }
        Ok(())
    }
}

fn datetime(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(hh, mm, ss))
        .unwrap_or_default()
}
