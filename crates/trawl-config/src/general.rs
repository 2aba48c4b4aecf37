//! General application configuration.

use serde::{Deserialize, Serialize};

/// Max results pre-selected in the submission form.
const fn default_max_results() -> u32 {
    25
}

/// Default row limit for list commands.
const fn default_limit() -> u32 {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Max results used when a submission does not specify one.
    #[serde(default = "default_max_results")]
    pub default_max_results: u32,

    /// Default result limit for list commands.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_max_results: default_max_results(),
            default_limit: default_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = GeneralConfig::default();
        assert_eq!(config.default_max_results, 25);
        assert_eq!(config.default_limit, 20);
    }
}
