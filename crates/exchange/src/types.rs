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

use crucible_sdk::types::{Address, Amount, OrderId, Price, Side, Ticker, TickerError, Trade};
use serde::{Deserialize, Serialize};

use crate::asset::AssetError;

/// Resting limit order
///
/// Created by limit-order placement with `filled = 0`; only the matching
/// engine ever increments `filled`, and the order leaves the book the
/// moment `filled == amount`. Invariant: `0 <= filled <= amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Monotonically increasing id, assigned at placement
    pub id: OrderId,
    pub trader: Address,
    pub side: Side,
    /// Base token; never the quote currency
    pub ticker: Ticker,
    /// Base-token quantity requested
    pub amount: Amount,
    /// Quote units per base unit
    pub price: Price,
    /// Quantity matched so far
    pub filled: Amount,
}

impl Order {
    /// Unfilled remainder available to an incoming market order.
    pub fn available(&self) -> Amount {
        self.amount - self.filled
    }

    pub fn is_filled(&self) -> bool {
        self.filled == self.amount
    }
}

/// Outcome of a market order
///
/// Market orders are accept-what's-available: any unmatched remainder is
/// discarded rather than rested in the book, so the report carries both
/// the requested and the executed quantity alongside the trades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOrderReport {
    pub requested: Amount,
    pub executed: Amount,
    pub trades: Vec<Trade>,
}

impl MarketOrderReport {
    pub fn fully_filled(&self) -> bool {
        self.executed == self.requested
    }

    /// Quantity the book could not satisfy (discarded, never rested).
    pub fn remaining(&self) -> Amount {
        self.requested - self.executed
    }
}

/// Error types for exchange operations
///
/// All of these are request-level rejections: the failed call leaves
/// ledgers and books exactly as they were, and the engine stays ready
/// for the next call.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("This token does not exist!")]
    UnknownToken(Ticker),
    #[error("Ticker already registered: {0}")]
    DuplicateTicker(Ticker),
    #[error("A quote currency is already registered: {0}")]
    QuoteAlreadyRegistered(Ticker),
    #[error("No quote currency is registered")]
    NoQuoteCurrency,
    #[error("You cannot trade in the quote currency!")]
    CannotTradeQuoteCurrency,
    #[error("Insufficient token balance!")]
    InsufficientBalance,
    #[error("You have insufficient token balance to make this trade!")]
    InsufficientTokenBalance,
    #[error("You have insufficient quote balance to make this trade!")]
    InsufficientQuoteBalance,
    #[error("Transfer failed: {0}")]
    TransferFailed(#[from] AssetError),
    #[error("Amount overflow")]
    AmountOverflow,
    #[error("Invalid ticker: {0}")]
    InvalidTicker(#[from] TickerError),
}
