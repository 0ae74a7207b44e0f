//! Monitor configuration
//!
//! Read from the `initialize` request or from a TOML file. Every field has a
//! default, so an empty file or `{}` is a valid configuration.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::machine::{Machine, Word};
use crate::watchpoint::WatchpointPool;

/// Physical memory base of the simulated platform
pub const DEFAULT_MEMORY_BASE: Word = 0x8000_0000;

/// Largest physical memory the monitor will allocate
pub const MAX_MEMORY_SIZE: usize = 0x1000_0000;

pub const MAX_WATCHPOINTS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Number of watchpoint slots
    pub watchpoint_capacity: usize,
    /// Longest expression accepted, in tokens
    pub max_tokens: usize,
    pub memory_base: Word,
    /// Physical memory size in bytes
    pub memory_size: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            watchpoint_capacity: 32,
            max_tokens: 32,
            memory_base: DEFAULT_MEMORY_BASE,
            memory_size: 0x10000,
        }
    }
}

impl MonitorConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Invalid monitor configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject sizes the monitor cannot allocate or address
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.memory_size <= MAX_MEMORY_SIZE,
            "memory_size 0x{:x} exceeds the maximum of 0x{:x}",
            self.memory_size,
            MAX_MEMORY_SIZE
        );
        ensure!(
            u64::from(self.memory_base) + self.memory_size as u64 <= 1 << 32,
            "memory at 0x{:08x}+0x{:x} does not fit in the 32-bit address space",
            self.memory_base,
            self.memory_size
        );
        ensure!(
            self.watchpoint_capacity <= MAX_WATCHPOINTS,
            "watchpoint_capacity {} exceeds the maximum of {}",
            self.watchpoint_capacity,
            MAX_WATCHPOINTS
        );
        Ok(())
    }

    /// Load a TOML configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml_str(&text).with_context(|| format!("In config file {:?}", path))
    }

    pub fn machine(&self) -> Machine {
        Machine::new(self.memory_base, self.memory_size)
    }

    pub fn watchpoint_pool(&self) -> WatchpointPool {
        WatchpointPool::new(self.watchpoint_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::from_toml_str("").unwrap();
        assert_eq!(config, MonitorConfig::default());
        assert_eq!(config.watchpoint_capacity, 32);
        assert_eq!(config.memory_base, 0x8000_0000);
    }

    #[test]
    fn test_partial_json() {
        let config: MonitorConfig = serde_json::from_str(r#"{"max_tokens": 64}"#).unwrap();
        assert_eq!(config.max_tokens, 64);
        assert_eq!(config.watchpoint_capacity, 32);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "watchpoint_capacity = 4").unwrap();
        writeln!(file, "memory_base = 0x1000").unwrap();

        let config = MonitorConfig::load(file.path()).unwrap();
        assert_eq!(config.watchpoint_capacity, 4);
        assert_eq!(config.memory_base, 0x1000);
        assert_eq!(config.watchpoint_pool().capacity(), 4);
        assert_eq!(config.machine().memory.base(), 0x1000);
    }

    #[test]
    fn test_load_errors() {
        assert!(MonitorConfig::load("/nonexistent/sdb.toml").is_err());

        let err = MonitorConfig::from_toml_str("max_tokens = \"many\"").unwrap_err();
        assert!(err.to_string().contains("Invalid monitor configuration"));
    }

    #[test]
    fn test_rejects_oversized_values() {
        let err = MonitorConfig::from_toml_str("memory_size = 0x7fffffffffffffff").unwrap_err();
        assert!(err.to_string().contains("memory_size"));

        let err = MonitorConfig::from_toml_str("watchpoint_capacity = 100000000").unwrap_err();
        assert!(err.to_string().contains("watchpoint_capacity"));

        let config = MonitorConfig {
            memory_base: 0xffff_0000,
            memory_size: 0x2_0000,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = MonitorConfig {
            memory_base: 0xffff_0000,
            memory_size: 0x1_0000,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_ok());
        assert!(MonitorConfig::default().validate().is_ok());
    }
}
