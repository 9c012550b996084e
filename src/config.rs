// Bridge configuration

use serde::{Deserialize, Serialize};

use crate::codec::MoveProtocol;

/// Calling convention shared by every callable on the namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convention {
    /// Each call returns a Promise
    #[default]
    Promise,
    /// Each call returns `[value, error]`
    Tuple,
}

impl Convention {
    /// Global name used when the config does not set one
    pub fn default_namespace(self) -> &'static str {
        match self {
            Convention::Promise => "Scouts",
            Convention::Tuple => "__Scouts",
        }
    }
}

/// Options accepted by `install`
///
/// JavaScript usage:
/// ```js
/// install({ convention: "tuple", protocol: "text", logLevel: "debug" });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct BridgeConfig {
    pub namespace: Option<String>,
    pub convention: Convention,
    pub protocol: MoveProtocol,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            namespace: None,
            convention: Convention::default(),
            protocol: MoveProtocol::default(),
            log_level: default_log_level(),
        }
    }
}

impl BridgeConfig {
    pub fn namespace(&self) -> &str {
        self.namespace
            .as_deref()
            .unwrap_or_else(|| self.convention.default_namespace())
    }

    /// Parsed log level, falling back to `warn` for unknown names
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Warn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::decode;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config: BridgeConfig = decode(&json!({})).unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.namespace(), "Scouts");
        assert_eq!(config.protocol, MoveProtocol::Structured);
        assert_eq!(config.level_filter(), log::LevelFilter::Warn);
    }

    #[test]
    fn test_tuple_convention_namespace() {
        let config: BridgeConfig =
            decode(&json!({ "convention": "tuple", "protocol": "text", "logLevel": "debug" })).unwrap();
        assert_eq!(config.namespace(), "__Scouts");
        assert_eq!(config.protocol, MoveProtocol::Text);
        assert_eq!(config.level_filter(), log::LevelFilter::Debug);

        let named: BridgeConfig = decode(&json!({ "namespace": "Game" })).unwrap();
        assert_eq!(named.namespace(), "Game");
    }

    #[test]
    fn test_rejects_unknown_options() {
        assert!(decode::<BridgeConfig, _>(&json!({ "convention": "callback" })).is_err());
        assert!(decode::<BridgeConfig, _>(&json!({ "protcol": "text" })).is_err());
    }
}
