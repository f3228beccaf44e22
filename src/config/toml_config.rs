use crate::core::dispatch::{RetryPolicy, MAX_RETRY_DELAY};
use crate::core::engine::SwipeSettings;
use crate::core::feed::FeedSettings;
use crate::domain::model::WagerTerms;
use crate::utils::error::{Result, SwipeError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub feed: Option<FeedConfig>,
    pub swipe: Option<SwipeConfig>,
    pub wager: Option<WagerConfig>,
    pub retry: Option<RetryConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfig {
    pub match_threshold: Option<f64>,
    pub match_count: Option<usize>,
    pub global_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwipeConfig {
    pub threshold: Option<f64>,
    pub exit_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WagerConfig {
    pub amount: Option<u64>,
    pub currency: Option<String>,
    pub potential_payout: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub multiplier: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
}

fn env_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("static regex"))
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SwipeError::ConfigError {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);

        toml::from_str(&processed).map_err(|e| SwipeError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the variable's value. Unset variables are left
    /// verbatim so validation can name them.
    fn substitute_env_vars(content: &str) -> String {
        env_placeholder()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_resolved("backend.url", &self.backend.url)?;
        validation::validate_url("backend.url", &self.backend.url)?;
        validation::validate_resolved("backend.anon_key", &self.backend.anon_key)?;
        validation::validate_non_empty_string("backend.anon_key", &self.backend.anon_key)?;
        validation::validate_positive_number("backend.timeout_seconds", self.timeout().as_secs(), 1)?;

        let feed = self.feed_settings();
        validation::validate_range("feed.match_threshold", feed.match_threshold, -1.0, 1.0)?;
        validation::validate_positive_number("feed.match_count", feed.match_count as u64, 1)?;
        validation::validate_positive_number("feed.global_limit", feed.global_limit as u64, 1)?;

        let swipe = self.swipe_settings();
        validation::validate_range("swipe.threshold", swipe.threshold, 1.0, 10_000.0)?;

        let wager = self.wager_terms();
        validation::validate_positive_number("wager.amount", wager.amount, 1)?;
        validation::validate_non_empty_string("wager.currency", &wager.currency)?;

        let retry = self.retry_policy();
        validation::validate_range("retry.max_attempts", retry.max_attempts, 1, 20)?;
        validation::validate_range(
            "retry.base_delay_ms",
            retry.base_delay.as_millis(),
            0,
            MAX_RETRY_DELAY.as_millis(),
        )?;
        validation::validate_range("retry.multiplier", retry.multiplier, 1.0, 10.0)?;

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_seconds.unwrap_or(10))
    }

    pub fn feed_settings(&self) -> FeedSettings {
        let defaults = FeedSettings::default();
        let feed = self.feed.clone().unwrap_or_default();
        FeedSettings {
            match_threshold: feed.match_threshold.unwrap_or(defaults.match_threshold),
            match_count: feed.match_count.unwrap_or(defaults.match_count),
            global_limit: feed.global_limit.unwrap_or(defaults.global_limit),
        }
    }

    pub fn swipe_settings(&self) -> SwipeSettings {
        let defaults = SwipeSettings::default();
        let swipe = self.swipe.clone().unwrap_or_default();
        SwipeSettings {
            threshold: swipe.threshold.unwrap_or(defaults.threshold),
            exit_delay: swipe
                .exit_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.exit_delay),
        }
    }

    pub fn wager_terms(&self) -> WagerTerms {
        let defaults = WagerTerms::default();
        let wager = self.wager.clone().unwrap_or_default();
        WagerTerms {
            amount: wager.amount.unwrap_or(defaults.amount),
            currency: wager.currency.unwrap_or(defaults.currency),
            potential_payout: wager.potential_payout.unwrap_or(defaults.potential_payout),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        let retry = self.retry.clone().unwrap_or_default();
        RetryPolicy {
            max_attempts: retry.max_attempts.unwrap_or(defaults.max_attempts),
            base_delay: retry
                .base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
            multiplier: retry.multiplier.unwrap_or(defaults.multiplier),
        }
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.json)
            .unwrap_or(false)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[backend]
url = "https://abc.supabase.co"
anon_key = "anon-key"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = AppConfig::from_toml_str(MINIMAL).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.feed_settings(), FeedSettings::default());
        assert_eq!(config.swipe_settings(), SwipeSettings::default());
        assert_eq!(config.wager_terms(), WagerTerms::default());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert!(!config.json_logs());
    }

    #[test]
    fn test_full_config_overrides() {
        let toml_content = r#"
[backend]
url = "https://abc.supabase.co"
anon_key = "anon-key"
timeout_seconds = 3

[feed]
match_threshold = 0.25
match_count = 20
global_limit = 5

[swipe]
threshold = 120.0
exit_delay_ms = 350

[wager]
amount = 25
currency = "USDC"
potential_payout = 50

[retry]
max_attempts = 5
base_delay_ms = 100
multiplier = 3.0

[logging]
json = true
"#;
        let config = AppConfig::from_toml_str(toml_content).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.feed_settings().match_count, 20);
        assert_eq!(config.swipe_settings().threshold, 120.0);
        assert_eq!(
            config.swipe_settings().exit_delay,
            Duration::from_millis(350)
        );
        assert_eq!(config.wager_terms().currency, "USDC");
        assert_eq!(config.retry_policy().max_attempts, 5);
        assert!(config.json_logs());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SWIPE_TEST_SUPABASE_KEY", "from-env");

        let toml_content = r#"
[backend]
url = "https://abc.supabase.co"
anon_key = "${SWIPE_TEST_SUPABASE_KEY}"
"#;
        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.backend.anon_key, "from-env");

        std::env::remove_var("SWIPE_TEST_SUPABASE_KEY");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let toml_content = r#"
[backend]
url = "https://abc.supabase.co"
anon_key = "${SWIPE_TEST_NEVER_SET_VAR}"
"#;
        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(SwipeError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_invalid_values_fail_validation() {
        let bad_url = MINIMAL.replace("https://abc.supabase.co", "not a url");
        assert!(AppConfig::from_toml_str(&bad_url).unwrap().validate().is_err());

        let zero_threshold = format!("{}\n[swipe]\nthreshold = 0.0\n", MINIMAL);
        assert!(AppConfig::from_toml_str(&zero_threshold)
            .unwrap()
            .validate()
            .is_err());
    }

    #[test]
    fn test_missing_backend_section_is_a_parse_error() {
        assert!(AppConfig::from_toml_str("[feed]\nmatch_count = 3\n").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.backend.url, "https://abc.supabase.co");
    }

    #[test]
    fn test_unreadable_config_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("swipe-predict.toml");

        let err = AppConfig::from_file(&missing).unwrap_err();
        assert!(matches!(err, SwipeError::ConfigError { .. }));
        assert!(err.to_string().contains("swipe-predict.toml"));
    }

    #[test]
    fn test_retry_section_is_bounded() {
        let cases = [
            "max_attempts = 0",
            "max_attempts = 1000",
            "base_delay_ms = 3600000",
            "multiplier = -2.0",
            "multiplier = 0.5",
        ];
        for case in cases {
            let toml_content = format!("{}\n[retry]\n{}\n", MINIMAL, case);
            let config = AppConfig::from_toml_str(&toml_content).unwrap();
            assert!(
                matches!(
                    config.validate(),
                    Err(SwipeError::InvalidConfigValueError { .. })
                ),
                "{} should be rejected",
                case
            );
        }

        let edge = format!(
            "{}\n[retry]\nmax_attempts = 20\nbase_delay_ms = 60000\nmultiplier = 1.0\n",
            MINIMAL
        );
        assert!(AppConfig::from_toml_str(&edge).unwrap().validate().is_ok());
    }
}
