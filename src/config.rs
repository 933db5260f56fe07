// ⚙️ Run configuration
// Seat target, mean mode and the shape of the input table.
//
// Layering: defaults < JSON settings file < CLI flags (applied in main.rs)

use crate::error::{ApportionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Seat total used for the House reference run (435 voting seats + 1)
pub const DEFAULT_TARGET_SEATS: u32 = 436;

// ============================================================================
// MEAN MODE
// ============================================================================

/// Which mean of `seats` and `seats + 1` divides the population
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeanMode {
    /// Huntington-Hill: sqrt(n * (n + 1))
    #[default]
    Geometric,

    /// Webster: n + 0.5
    Arithmetic,
}

impl MeanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeanMode::Geometric => "geometric",
            MeanMode::Arithmetic => "arithmetic",
        }
    }
}

impl fmt::Display for MeanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeanMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "geometric" | "huntington-hill" => Ok(MeanMode::Geometric),
            "arithmetic" | "webster" => Ok(MeanMode::Arithmetic),
            other => Err(format!(
                "unknown mean mode '{}' (expected geometric or arithmetic)",
                other
            )),
        }
    }
}

// ============================================================================
// RUN CONFIG
// ============================================================================

/// Parameters fixed for the duration of one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub target_total_seats: u32,
    pub mean_mode: MeanMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            target_total_seats: DEFAULT_TARGET_SEATS,
            mean_mode: MeanMode::default(),
        }
    }
}

impl RunConfig {
    pub fn new(target_total_seats: u32, mean_mode: MeanMode) -> Self {
        RunConfig {
            target_total_seats,
            mean_mode,
        }
    }
}

// ============================================================================
// TABLE FORMAT
// ============================================================================

/// Describes the delimited population table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableFormat {
    pub delimiter: char,
    pub name_column: String,
    pub population_column: String,
}

impl Default for TableFormat {
    fn default() -> Self {
        TableFormat {
            delimiter: '\t',
            name_column: "State".to_string(),
            population_column: "Population".to_string(),
        }
    }
}

impl TableFormat {
    /// The csv crate only splits on single bytes
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(ApportionError::InvalidDelimiter(self.delimiter))
        }
    }
}

// ============================================================================
// SETTINGS FILE
// ============================================================================

/// Optional JSON settings file, e.g.
///
/// ```json
/// { "run": { "target_total_seats": 435, "mean_mode": "arithmetic" },
///   "table": { "delimiter": ",", "name_column": "Name" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub run: RunConfig,
    pub table: TableFormat,
}

impl Settings {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
