//! JSON/TOML solver configuration files
//!
//! Every section is optional; missing fields take their defaults.
//!
//! ## Example TOML Configuration
//!
//! ```toml
//! [amg]
//! cycle = "w_cycle"
//! smoother = "symmetric_gauss_seidel"
//!
//! [amg.transfer]
//! coarsening = "ruge_stuben"
//! interpolation = "ruge_stuben"
//! vect_limit = 100
//!
//! [amg.transfer.marking]
//! type = "relative"
//! theta = 0.25
//!
//! [tff.test_vector]
//! type = "sine"
//! frequency = 1.0
//!
//! [cg]
//! tolerance = 1e-10
//! max_iterations = 500
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AmgError, Result};
use crate::iterative::CgConfig;
use crate::preconditioners::AmgConfig;
use crate::tff::TffConfig;

/// Top-level configuration file contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// AMG hierarchy and cycle options
    pub amg: AmgConfig,

    /// TFF decomposition options
    pub tff: TffConfig,

    /// Outer conjugate gradient iteration
    pub cg: CgConfig,
}

impl SolverConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.amg.validate()?;
        self.tff.validate()?;
        if !(self.cg.tolerance.is_finite() && self.cg.tolerance > 0.0) {
            return Err(AmgError::InvalidParameter {
                name: "tolerance",
                value: self.cg.tolerance,
                reason: "must be finite and positive",
            });
        }
        Ok(())
    }
}

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format
    Json,
    /// TOML format
    Toml,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        match ext.to_lowercase().as_str() {
            "json" => Some(ConfigFormat::Json),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }
}

/// Load and validate a configuration file
///
/// Format is auto-detected from file extension (.json or .toml)
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SolverConfig> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| AmgError::UnsupportedFormat(path.display().to_string()))?;
    let content = fs::read_to_string(path)?;

    let config = parse_config(&content, format)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from a string
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<SolverConfig> {
    match format {
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| AmgError::Parse {
            line: e.line(),
            message: e.to_string(),
        }),
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| AmgError::Parse {
            line: e
                .span()
                .map(|span| content[..span.start].matches('\n').count() + 1)
                .unwrap_or(0),
            message: e.message().to_string(),
        }),
    }
}

/// Save configuration to a file
pub fn save_config<P: AsRef<Path>>(config: &SolverConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| AmgError::UnsupportedFormat(path.display().to_string()))?;

    let content = serialize_config(config, format)?;
    fs::write(path, content)?;
    Ok(())
}

/// Serialize configuration to a string
pub fn serialize_config(config: &SolverConfig, format: ConfigFormat) -> Result<String> {
    match format {
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).map_err(|e| AmgError::Serialize(e.to_string()))
        }
        ConfigFormat::Toml => {
            toml::to_string_pretty(config).map_err(|e| AmgError::Serialize(e.to_string()))
        }
    }
}
