// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};

/// Component name used for the log directory and file prefix.
pub const LOG_COMPONENT_NAME: &str = "exchange";

/// Default log level when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Console output is opt-in via `LOG_TO_CONSOLE`.
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;

/// One row of the preloaded token table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEntry {
    pub ticker: String,
    /// Marks the single settlement currency
    #[serde(default)]
    pub quote: bool,
}

impl TokenEntry {
    fn new(ticker: &str, quote: bool) -> Self {
        Self {
            ticker: ticker.to_string(),
            quote,
        }
    }
}

/// Exchange configuration
///
/// The token table is the registry bootstrap: it is loaded once at
/// setup, after which the registry is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Preloaded token registry table
    #[serde(default)]
    pub tokens: Vec<TokenEntry>,
    /// Emit per-operation debug logs from the engine
    #[serde(default)]
    pub verbose_logging: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            tokens: vec![
                TokenEntry::new("DAI", true),
                TokenEntry::new("REP", false),
                TokenEntry::new("BAT", false),
                TokenEntry::new("ZRX", false),
            ],
            verbose_logging: false,
        }
    }
}

impl ExchangeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("EXCHANGE"))
            .build()?;

        cfg.try_deserialize()
    }

    /// Load configuration from file.
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("EXCHANGE"))
            .build()?;

        cfg.try_deserialize()
    }
}
