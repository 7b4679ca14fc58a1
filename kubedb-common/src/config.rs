// SPDX-FileCopyrightText: 2025 Timothy Pogue
//
// SPDX-License-Identifier: ISC

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use serde::{Serialize, Deserialize};
use figment::{Figment, Error, providers::{Format, Json, Yaml, Env, Serialized}};

use crate::constant::{DEFAULT_CATALOG_FILE, ENV_PREFIX};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[derive(Default)]
pub struct AppConfig {
    #[serde(default)]
    pub defaulter: DefaulterConfig,
}


#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DefaulterConfig {
    /// Path to the version catalog file, YAML or JSON
    #[serde(default)]
    pub catalog_file: String,
    /// Abort when the referenced version is not in the catalog. When disabled the
    /// manifest is emitted untouched instead.
    #[serde(default)]
    pub fail_on_missing_version: bool,
    #[serde(default)]
    pub output: OutputFormat,
}

impl Default for DefaulterConfig {
    fn default() -> Self {
        DefaulterConfig {
            catalog_file: DEFAULT_CATALOG_FILE.to_string(),
            fail_on_missing_version: true,
            output: OutputFormat::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

pub struct AppConfigBuilder {
    figment: Figment,
}

impl AppConfigBuilder {
    pub fn with_file(&mut self, path: &str) -> &mut Self {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        self.figment = match extension {
            "json" => self.figment.clone().merge(Json::file(path)),
            "yaml" | "yml" => self.figment.clone().merge(Yaml::file(path)),
            _ => self.figment.clone(),
        };
        self
    }

    pub fn with_env(&mut self) -> &mut Self {
        self.figment = self.figment.clone().merge(Env::prefixed(&format!("{}__", ENV_PREFIX)).split("__"));
        self
    }

    pub fn with_override_option(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.figment = self.figment.clone().merge(Serialized::default(key, value));
        }
        self
    }

    pub fn build(&self) -> Result<AppConfig, Error> {
        self.figment.extract()
    }
}

impl Default for AppConfigBuilder {
    fn default() -> Self {
        AppConfigBuilder {
            figment: Figment::from(Serialized::defaults(AppConfig::default()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_sources() {
        let config = AppConfigBuilder::default().build().unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.defaulter.catalog_file, DEFAULT_CATALOG_FILE);
        assert!(config.defaulter.fail_on_missing_version);
        assert_eq!(config.defaulter.output, OutputFormat::Yaml);
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", r#"
defaulter:
  catalog_file: /tmp/catalog.yaml
  output: json
"#)?;
            jail.set_env("KUBEDB__DEFAULTER__FAIL_ON_MISSING_VERSION", "false");

            let config = AppConfigBuilder::default()
                .with_file("config.yaml")
                .with_env()
                .build()?;

            assert_eq!(config.defaulter.catalog_file, "/tmp/catalog.yaml");
            assert_eq!(config.defaulter.output, OutputFormat::Json);
            assert!(!config.defaulter.fail_on_missing_version);
            Ok(())
        });
    }

    #[test]
    fn test_override_option_wins() {
        let config = AppConfigBuilder::default()
            .with_override_option("defaulter.catalog_file", Some("/srv/catalog.json"))
            .with_override_option("defaulter.output", None)
            .build()
            .unwrap();

        assert_eq!(config.defaulter.catalog_file, "/srv/catalog.json");
        assert_eq!(config.defaulter.output, OutputFormat::Yaml);
    }
}
