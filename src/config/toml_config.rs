use crate::utils::error::{Result, UtilError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_ENV_VAR: &str = "COREUTILS_CONFIG";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreutilsConfig {
    #[serde(default)]
    pub sandbox: SandboxConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxConfig {
    pub cwd: Option<String>,
    pub read_only: Option<bool>,
    /// Environment variables passed through to utilities. Empty keeps all.
    #[serde(default)]
    pub env_allow: Vec<String>,
    #[serde(default)]
    pub preopens: Vec<PreopenConfig>,
}

impl SandboxConfig {
    pub fn is_read_only(&self) -> bool {
        self.read_only.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreopenConfig {
    pub guest: String,
    /// Host directory backing `guest`; defaults to the same path.
    pub host: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl CoreutilsConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| UtilError::io(path.display().to_string(), e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| UtilError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value. Unset variables are
    /// left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;

        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| UtilError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.level.as_deref()
    }

    pub fn log_format(&self) -> &str {
        self.logging.format.as_deref().unwrap_or("compact")
    }
}

impl Validate for CoreutilsConfig {
    fn validate(&self) -> Result<()> {
        if let Some(cwd) = &self.sandbox.cwd {
            validation::validate_absolute_path("sandbox.cwd", cwd)?;
        }

        for preopen in &self.sandbox.preopens {
            validation::validate_absolute_path("sandbox.preopens.guest", &preopen.guest)?;
            if let Some(host) = &preopen.host {
                validation::validate_path("sandbox.preopens.host", host)?;
            }
        }

        for name in &self.sandbox.env_allow {
            validation::validate_non_empty_string("sandbox.env_allow", name)?;
        }

        if let Some(level) = &self.logging.level {
            validation::validate_non_empty_string("logging.level", level)?;
        }
        validation::validate_one_of("logging.format", self.log_format(), &["compact", "json"])?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[sandbox]
cwd = "/work"
read_only = true
env_allow = ["HOME", "LANG"]

[[sandbox.preopens]]
guest = "/work"
host = "/srv/work"

[[sandbox.preopens]]
guest = "/tmp"

[logging]
level = "coreutils=trace"
format = "json"
"#;

        let config = CoreutilsConfig::from_toml_str(toml_content).unwrap();

        assert!(config.sandbox.is_read_only());
        assert_eq!(config.sandbox.cwd.as_deref(), Some("/work"));
        assert_eq!(config.sandbox.env_allow, vec!["HOME", "LANG"]);
        assert_eq!(config.sandbox.preopens.len(), 2);
        assert_eq!(config.sandbox.preopens[1].host, None);
        assert_eq!(config.log_level(), Some("coreutils=trace"));
        assert_eq!(config.log_format(), "json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = CoreutilsConfig::from_toml_str("").unwrap();
        assert!(!config.sandbox.is_read_only());
        assert!(config.sandbox.preopens.is_empty());
        assert_eq!(config.log_format(), "compact");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("COREUTILS_TEST_SCRATCH", "/var/scratch");

        let toml_content = r#"
[[sandbox.preopens]]
guest = "/scratch"
host = "${COREUTILS_TEST_SCRATCH}"
"#;

        let config = CoreutilsConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.sandbox.preopens[0].host.as_deref(),
            Some("/var/scratch")
        );

        std::env::remove_var("COREUTILS_TEST_SCRATCH");
    }

    #[test]
    fn test_unset_variable_is_kept() {
        let toml_content = r#"
[sandbox]
cwd = "/${COREUTILS_TEST_UNSET_VARIABLE}"
"#;
        let config = CoreutilsConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.sandbox.cwd.as_deref(),
            Some("/${COREUTILS_TEST_UNSET_VARIABLE}")
        );
    }

    #[test]
    fn test_config_validation() {
        let relative_guest = r#"
[[sandbox.preopens]]
guest = "work"
"#;
        let config = CoreutilsConfig::from_toml_str(relative_guest).unwrap();
        assert!(config.validate().is_err());

        let bad_format = r#"
[logging]
format = "pretty"
"#;
        let config = CoreutilsConfig::from_toml_str(bad_format).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = CoreutilsConfig::from_toml_str("[sandbox\nread_only = 1").unwrap_err();
        assert!(matches!(err, UtilError::ConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[sandbox]\nread_only = true\n")
            .unwrap();

        let config = CoreutilsConfig::from_file(temp_file.path()).unwrap();
        assert!(config.sandbox.is_read_only());
    }
}
