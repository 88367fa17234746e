#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, Command, DocumentCommand, EntryCommand, EntryFields};
pub use toml_config::TomlConfig;

#[cfg(feature = "cli")]
impl CliConfig {
    /// Resolves the effective configuration: file (or environment), then flag overrides.
    pub fn resolve(&self) -> crate::utils::error::Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::from_env(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
        if let Some(model) = &self.model {
            config.classifier.model = model.clone();
        }
        Ok(config)
    }
}
