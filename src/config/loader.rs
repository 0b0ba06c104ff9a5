use crate::config::schema::AppConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use validator::Validate;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads a config file, picking the parser by extension, and
    /// validates the result. `None` yields the defaults.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<AppConfig> {
        let config = match path {
            Some(path) => Self::load_file(path.as_ref())?,
            None => AppConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<AppConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            _ => Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }
}
