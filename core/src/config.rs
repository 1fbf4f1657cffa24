use crate::types::CaseType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How scanned files are arranged under `src_path`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceLayout {
    /// Files live directly under `src_path`.
    Flat,
    /// Files live under `src_path/<YYMM>` for the current month.
    Monthly,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChromoConfig {
    pub database_path: String,
    pub src_path: PathBuf,
    /// A filename is a candidate when it contains this marker.
    pub src_ext: String,
    pub layout: SourceLayout,
    pub scan_interval_secs: u64,
    pub case_types: Vec<CaseType>,
    /// Offset used for record timestamps and the month directory.
    pub utc_offset_hours: i32,
}

impl Default for ChromoConfig {
    fn default() -> Self {
        Self {
            database_path: "chromo.db".into(),
            src_path: PathBuf::from("/media/msd"),
            src_ext: "MMI".into(),
            layout: SourceLayout::Monthly,
            scan_interval_secs: 600,
            case_types: CaseType::ALL.to_vec(),
            utc_offset_hours: 8,
        }
    }
}

impl ChromoConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    /// In tests, use ChromoConfig::default_test().
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: ChromoConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Flat layout rooted at `src_path`, in-memory database, UTC.
    pub fn default_test() -> Self {
        Self {
            database_path: ":memory:".into(),
            src_path: PathBuf::from("."),
            layout: SourceLayout::Flat,
            utc_offset_hours: 0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.scan_interval_secs == 0 {
            anyhow::bail!("scan_interval_secs must be > 0");
        }
        if self.src_ext.is_empty() {
            anyhow::bail!("src_ext must not be empty");
        }
        if self.case_types.is_empty() {
            anyhow::bail!("case_types must name at least one case type");
        }
        if !(-23..=23).contains(&self.utc_offset_hours) {
            anyhow::bail!("utc_offset_hours out of range: {}", self.utc_offset_hours);
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }
}
