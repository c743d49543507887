//! Override installers
//!
//! An installer hands the compiled rule set to whatever rewrites request
//! headers. Every install replaces the previous rule set entirely.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::rules::OverrideRule;

/// Receives the complete rule set whenever the pause flag or profiles change
pub trait OverrideInstaller {
    fn install(&mut self, rules: &[OverrideRule]) -> Result<()>;
}

/// Rule set document as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesDocument {
    pub generated_at: DateTime<Utc>,
    pub rules: Vec<OverrideRule>,
}

/// Writes the rule set as JSON for the host network layer to pick up
pub struct JsonRulesInstaller {
    path: PathBuf,
}

impl JsonRulesInstaller {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads back the last installed document
    pub fn load(&self) -> Result<RulesDocument> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read rules file: {:?}", self.path))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse rules file: {:?}", self.path))
    }
}

impl OverrideInstaller for JsonRulesInstaller {
    fn install(&mut self, rules: &[OverrideRule]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let document = RulesDocument {
            generated_at: Utc::now(),
            rules: rules.to_vec(),
        };
        let json = serde_json::to_string_pretty(&document)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write rules to {:?}", self.path))?;

        log::info!("Installed {} override rules to {:?}", rules.len(), self.path);
        Ok(())
    }
}
