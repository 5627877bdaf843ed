//! Startup configuration from the environment.
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `PHYSMEM_BACKEND` | `devmem`, `fake` | `devmem` (`fake` with the `fake-map` feature) |
//! | `PHYSMEM_DEVICE` | path | `/dev/mem` |
//! | `PHYSMEM_LOG` | `off`, `error`, `warn`, `info`, `debug`, `trace` | `warn` |

use core::str::FromStr;
use log::LevelFilter;
use physmem_map::{Backend, DEFAULT_DEVICE, DevMemMapper, FakeMapper};
use std::path::PathBuf;

pub const BACKEND_VAR: &str = "PHYSMEM_BACKEND";
pub const DEVICE_VAR: &str = "PHYSMEM_DEVICE";
pub const LOG_VAR: &str = "PHYSMEM_LOG";

/// Which mapper the tools use.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BackendKind {
    DevMem,
    Fake,
}

impl BackendKind {
    #[must_use]
    pub const fn compiled_default() -> Self {
        if cfg!(feature = "fake-map") {
            Self::Fake
        } else {
            Self::DevMem
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devmem" | "dev-mem" | "mem" => Ok(Self::DevMem),
            "fake" | "test" => Ok(Self::Fake),
            other => Err(format!("unknown backend {other:?}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: BackendKind,
    pub device: PathBuf,
    pub log_level: LevelFilter,
    /// Rejected settings, to be logged once logging is up.
    pub issues: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::compiled_default(),
            device: PathBuf::from(DEFAULT_DEVICE),
            log_level: LevelFilter::Warn,
            issues: Vec::new(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset or invalid values keep their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup(BACKEND_VAR) {
            match value.parse() {
                Ok(backend) => config.backend = backend,
                Err(e) => config.issues.push(format!("{BACKEND_VAR}: {e}")),
            }
        }

        if let Some(value) = lookup(DEVICE_VAR).filter(|v| !v.is_empty()) {
            config.device = PathBuf::from(value);
        }

        if let Some(value) = lookup(LOG_VAR) {
            match value.trim().parse() {
                Ok(level) => config.log_level = level,
                Err(_) => config.issues.push(format!("{LOG_VAR}: unknown level {value:?}")),
            }
        }

        config
    }

    /// The mapping strategy this configuration selects.
    #[must_use]
    pub fn mapper(&self) -> Backend {
        match self.backend {
            BackendKind::DevMem => Backend::DevMem(DevMemMapper::new(&self.device)),
            BackendKind::Fake => Backend::Fake(FakeMapper),
        }
    }

    pub fn log_issues(&self) {
        for issue in &self.issues {
            log::warn!("{issue}; using default");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let c = config(&[]);
        assert_eq!(c.backend, BackendKind::compiled_default());
        assert_eq!(c.device, PathBuf::from("/dev/mem"));
        assert_eq!(c.log_level, LevelFilter::Warn);
        assert!(c.issues.is_empty());
    }

    #[test]
    fn reads_all_variables() {
        let c = config(&[
            (BACKEND_VAR, "FAKE"),
            (DEVICE_VAR, "/dev/fpga-bram"),
            (LOG_VAR, "debug"),
        ]);
        assert_eq!(c.backend, BackendKind::Fake);
        assert_eq!(c.device, PathBuf::from("/dev/fpga-bram"));
        assert_eq!(c.log_level, LevelFilter::Debug);
        assert!(c.mapper().is_fake());
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let c = config(&[(BACKEND_VAR, "ramdisk"), (LOG_VAR, "loud")]);
        assert_eq!(c.backend, BackendKind::compiled_default());
        assert_eq!(c.log_level, LevelFilter::Warn);
        assert_eq!(c.issues.len(), 2);
    }

    #[test]
    fn devmem_backend_uses_device() {
        let c = config(&[(BACKEND_VAR, "devmem"), (DEVICE_VAR, "/tmp/mem")]);
        match c.mapper() {
            Backend::DevMem(m) => assert_eq!(m.path(), std::path::Path::new("/tmp/mem")),
            Backend::Fake(_) => panic!("expected devmem backend"),
        }
    }
}
