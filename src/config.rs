use crate::serialize::{Namespaces, DEFAULT_DATA_NAMESPACE, DEFAULT_ONTOLOGY_NAMESPACE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of `microscope.toml`. Every field is optional; CLI flags override it.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct MicroscopeConfig {
    /// Output file of `scan`
    pub output: Option<String>,
    /// Gitignore-style patterns excluded from discovery
    pub exclude: Vec<String>,
    /// Call and instantiation targets whose owner starts with one of these are dropped
    pub ignored_owner_prefixes: Vec<String>,
    /// Worker threads, 1 for a sequential scan
    pub jobs: Option<usize>,
    pub ontology_namespace: Option<String>,
    pub data_namespace: Option<String>,
}

impl MicroscopeConfig {
    /// The configuration `init` writes
    pub fn starter() -> Self {
        Self {
            output: Some(DEFAULT_OUTPUT.to_string()),
            exclude: vec!["**/src/test/**".to_string()],
            ignored_owner_prefixes: vec!["kotlin.".to_string()],
            jobs: None,
            ontology_namespace: Some(DEFAULT_ONTOLOGY_NAMESPACE.to_string()),
            data_namespace: Some(DEFAULT_DATA_NAMESPACE.to_string()),
        }
    }

    pub fn namespaces(&self) -> Namespaces {
        Namespaces::new(
            self.ontology_namespace
                .as_deref()
                .unwrap_or(DEFAULT_ONTOLOGY_NAMESPACE),
            self.data_namespace.as_deref().unwrap_or(DEFAULT_DATA_NAMESPACE),
        )
    }
}

pub const DEFAULT_OUTPUT: &str = "model.ttl";

pub fn default_config_path() -> PathBuf {
    PathBuf::from("microscope.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<MicroscopeConfig>> {
    let explicit = path.is_some();
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        if explicit {
            anyhow::bail!("config file {} does not exist", path.display());
        }
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: MicroscopeConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &MicroscopeConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("microscope.toml");
        let config = MicroscopeConfig::starter();

        write_config(&path, &config, false).unwrap();
        assert_eq!(load_config(Some(&path)).unwrap(), Some(config));
    }

    #[test]
    fn test_write_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("microscope.toml");
        write_config(&path, &MicroscopeConfig::default(), false).unwrap();
        assert!(write_config(&path, &MicroscopeConfig::starter(), false).is_err());
        assert!(write_config(&path, &MicroscopeConfig::starter(), true).is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("microscope.toml");
        std::fs::write(&path, "jobs = 2\nexclude = [\"legacy/\"]\n").unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.jobs, Some(2));
        assert_eq!(config.exclude, vec!["legacy/".to_string()]);
        assert!(config.output.is_none());
        assert_eq!(config.namespaces(), Namespaces::default());
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("microscope.toml");
        std::fs::write(&path, "jobs = \"many\"\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }
}
