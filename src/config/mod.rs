use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use uuid::Uuid;

use crate::core::processor::DEFAULT_MAX_APPLY_ATTEMPTS;
use crate::errors::LedgerError;

const CONFIG_FILE: &str = "config.json";
const TMP_SUFFIX: &str = "tmp";

/// Tunable behaviour of the ledger core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoreConfig {
    /// Category whose entries adjust net worth without counting as income
    /// or expense in monthly reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustment_category_id: Option<Uuid>,
    /// Retry bound for the atomic apply on conflict.
    #[serde(default = "CoreConfig::default_max_apply_attempts")]
    pub max_apply_attempts: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            adjustment_category_id: None,
            max_apply_attempts: Self::default_max_apply_attempts(),
        }
    }
}

impl CoreConfig {
    fn default_max_apply_attempts() -> u32 {
        DEFAULT_MAX_APPLY_ATTEMPTS
    }
}

/// Loads and saves the core configuration as JSON on disk.
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, LedgerError> {
        let base = dirs::data_dir()
            .ok_or_else(|| LedgerError::Storage("unable to resolve data directory".into()))?
            .join("ledger_core");
        Self::from_base(base)
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, LedgerError> {
        Self::from_base(base)
    }

    fn from_base(base: PathBuf) -> Result<Self, LedgerError> {
        fs::create_dir_all(&base)?;
        Ok(Self {
            path: base.join(CONFIG_FILE),
        })
    }

    pub fn load(&self) -> Result<CoreConfig, LedgerError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(CoreConfig::default())
        }
    }

    pub fn save(&self, config: &CoreConfig) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(config)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), LedgerError> {
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
