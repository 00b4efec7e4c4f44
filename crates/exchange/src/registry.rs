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

use std::{collections::HashMap, sync::Arc};

use crucible_sdk::types::Ticker;
use serde::{Deserialize, Serialize};

use crate::{asset::TokenAsset, types::ExchangeError};

/// Registered token: a ticker bound to its external asset handle
///
/// Exactly one registered token is the quote currency — the settlement
/// token every price is denominated in. Tokens are immutable once
/// registered.
#[derive(Clone)]
pub struct Token {
    pub ticker: Ticker,
    pub asset: Arc<dyn TokenAsset>,
    pub is_quote: bool,
}

/// Serializable registry row for the presentation layer's token list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub ticker: Ticker,
    pub is_quote: bool,
}

/// Append-only ticker lookup table
///
/// Registration order is preserved for the `tokens()` listing; there is
/// no removal operation.
#[derive(Default)]
pub struct TokenRegistry {
    tokens: HashMap<Ticker, Token>,
    listing: Vec<Ticker>,
    quote: Option<Ticker>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token.
    ///
    /// Rejects duplicate tickers and a second quote currency; the
    /// registry can hold at most one settlement token.
    pub fn register(
        &mut self,
        ticker: Ticker,
        asset: Arc<dyn TokenAsset>,
        is_quote: bool,
    ) -> Result<(), ExchangeError> {
        if self.tokens.contains_key(&ticker) {
            return Err(ExchangeError::DuplicateTicker(ticker));
        }
        if is_quote && let Some(existing) = self.quote {
            return Err(ExchangeError::QuoteAlreadyRegistered(existing));
        }

        if is_quote {
            self.quote = Some(ticker);
        }
        self.listing.push(ticker);
        self.tokens.insert(
            ticker,
            Token {
                ticker,
                asset,
                is_quote,
            },
        );
        Ok(())
    }

    pub fn lookup(&self, ticker: Ticker) -> Result<&Token, ExchangeError> {
        self.tokens
            .get(&ticker)
            .ok_or(ExchangeError::UnknownToken(ticker))
    }

    pub fn is_quote_currency(&self, ticker: Ticker) -> bool {
        self.quote == Some(ticker)
    }

    /// The settlement token, if one has been registered.
    pub fn quote_ticker(&self) -> Option<Ticker> {
        self.quote
    }

    /// All registered tokens in registration order.
    pub fn tokens(&self) -> Vec<TokenInfo> {
        self.listing
            .iter()
            .map(|ticker| TokenInfo {
                ticker: *ticker,
                is_quote: self.quote == Some(*ticker),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MemoryAsset;

    fn ticker(symbol: &str) -> Ticker {
        Ticker::new(symbol).unwrap()
    }

    fn registry_with_dai() -> TokenRegistry {
        let mut registry = TokenRegistry::new();
        registry
            .register(ticker("DAI"), Arc::new(MemoryAsset::new()), true)
            .unwrap();
        registry
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = registry_with_dai();
        registry
            .register(ticker("REP"), Arc::new(MemoryAsset::new()), false)
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.lookup(ticker("REP")).is_ok());
        assert!(matches!(
            registry.lookup(ticker("KNT")),
            Err(ExchangeError::UnknownToken(_))
        ));
    }

    #[test]
    fn test_duplicate_ticker_rejected() {
        let mut registry = registry_with_dai();
        let result = registry.register(ticker("DAI"), Arc::new(MemoryAsset::new()), false);
        assert!(matches!(result, Err(ExchangeError::DuplicateTicker(_))));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_single_quote_currency() {
        let mut registry = registry_with_dai();
        assert!(registry.is_quote_currency(ticker("DAI")));
        assert_eq!(registry.quote_ticker(), Some(ticker("DAI")));

        let result = registry.register(ticker("USDC"), Arc::new(MemoryAsset::new()), true);
        assert!(matches!(
            result,
            Err(ExchangeError::QuoteAlreadyRegistered(_))
        ));
    }

    #[test]
    fn test_listing_preserves_registration_order() {
        let mut registry = registry_with_dai();
        for symbol in ["REP", "BAT", "ZRX"] {
            registry
                .register(ticker(symbol), Arc::new(MemoryAsset::new()), false)
                .unwrap();
        }

        let tickers: Vec<_> = registry
            .tokens()
            .iter()
            .map(|t| t.ticker.to_string())
            .collect();
        assert_eq!(tickers, ["DAI", "REP", "BAT", "ZRX"]);
        assert!(registry.tokens()[0].is_quote);
        assert!(!registry.tokens()[1].is_quote);
    }
}
