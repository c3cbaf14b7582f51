use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MealError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Written out on first run so the user has something to fill in.
pub const CONFIG_TEMPLATE: &str = r#"# mealrs configuration
#
# email_address    MealPal account to log in with.
# use_secret_store Read the password from the OS keychain (populated with
#                  `mealrs save-pass`) instead of prompting on every run.

email_address = ""
use_secret_store = true
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    pub email_address: String,
    #[serde(default = "default_use_secret_store")]
    pub use_secret_store: bool,
}

fn default_use_secret_store() -> bool {
    true
}

impl FileConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| MealError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Writes the template when the file does not exist yet.
    /// Returns true when a fresh template was created.
    pub fn ensure_exists<P: AsRef<Path>>(path: P) -> Result<bool> {
        if path.as_ref().is_file() {
            return Ok(false);
        }
        std::fs::write(&path, CONFIG_TEMPLATE)?;
        Ok(true)
    }

    /// 替換環境變數 (例如 ${MEALPAL_EMAIL})
    fn substitute_env_vars(content: &str) -> String {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }
}

impl ConfigProvider for FileConfig {
    fn email_address(&self) -> &str {
        &self.email_address
    }

    fn use_secret_store(&self) -> bool {
        self.use_secret_store
    }
}

impl Validate for FileConfig {
    fn validate(&self) -> Result<()> {
        if self.email_address.trim().is_empty() {
            return Err(MealError::MissingConfigError {
                field: "email_address".to_string(),
            });
        }
        validation::validate_email("email_address", &self.email_address)
    }
}
