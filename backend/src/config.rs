//! Application configuration loaded via OrthoConfig.
//!
//! One [`AppSettings`] value is built at process start and handed to the
//! components that need it; nothing reads the environment after startup.

use ortho_config::OrthoConfig;
use pagination::ListLimits;
use serde::Deserialize;

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// Process-wide settings for the marketplace backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MARKET")]
pub struct AppSettings {
    /// Page size applied when list callers supply none.
    pub default_page_size: Option<u32>,
    /// Largest page size a list caller may request.
    pub max_page_size: Option<u32>,
    /// Emit logs as JSON instead of human-readable lines.
    #[ortho_config(default = false)]
    pub log_json: bool,
}

impl AppSettings {
    /// Configured default page size, falling back to the built-in default.
    pub fn default_page_size(&self) -> u32 {
        self.default_page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Configured maximum page size, falling back to the built-in default.
    pub fn max_page_size(&self) -> u32 {
        self.max_page_size.unwrap_or(MAX_PAGE_SIZE)
    }

    /// Page clamps handed to entity services.
    ///
    /// An unusable configured combination (zero or inverted values) falls
    /// back to the built-in clamps rather than failing startup.
    pub fn limits(&self) -> ListLimits {
        ListLimits::try_new(self.default_page_size(), self.max_page_size()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for configuration parsing.

    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    use super::*;

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("backend")]).expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env([
            ("MARKET_DEFAULT_PAGE_SIZE", None::<String>),
            ("MARKET_MAX_PAGE_SIZE", None::<String>),
            ("MARKET_LOG_JSON", None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.default_page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(settings.max_page_size(), MAX_PAGE_SIZE);
        assert!(!settings.log_json);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("MARKET_DEFAULT_PAGE_SIZE", Some("10".to_owned())),
            ("MARKET_MAX_PAGE_SIZE", Some("50".to_owned())),
            ("MARKET_LOG_JSON", Some("true".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(settings.default_page_size(), 10);
        assert_eq!(settings.max_page_size(), 50);
        assert!(settings.log_json);

        let limits = settings.limits();
        assert_eq!(limits.default_page_size(), 10);
        assert_eq!(limits.max_page_size(), 50);
    }

    #[rstest]
    fn unusable_limit_combinations_fall_back() {
        let _guard = lock_env([
            ("MARKET_DEFAULT_PAGE_SIZE", Some("500".to_owned())),
            ("MARKET_MAX_PAGE_SIZE", Some("50".to_owned())),
            ("MARKET_LOG_JSON", None::<String>),
        ]);

        let settings = load_from_empty_args();
        let limits = settings.limits();
        assert_eq!(limits.default_page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(limits.max_page_size(), MAX_PAGE_SIZE);
    }
}
