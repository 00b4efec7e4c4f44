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

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Escrowed token quantity in base units.
///
/// Base units follow the 10^18 scaling of the backing asset contracts, so
/// a 64-bit integer is not wide enough to hold realistic balances.
pub type Amount = u128;

/// Price in quote base units per base-token unit.
pub type Price = u128;

/// Monotonically increasing order identifier, assigned by the engine.
pub type OrderId = u64;

/// Monotonically increasing trade ordinal, assigned by the engine.
///
/// Trade ids double as replay cursors for the trade feed, which is why
/// they are stable ordinals rather than random identifiers.
pub type TradeId = u64;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an incoming order matches against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Maximum ticker length in bytes.
pub const TICKER_LEN: usize = 8;

/// Error types for ticker parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickerError {
    #[error("ticker is empty")]
    Empty,
    #[error("ticker exceeds 8 bytes: {0}")]
    TooLong(String),
    #[error("ticker contains non-printable or non-ASCII bytes: {0}")]
    NotAscii(String),
}

/// Fixed-width token symbol
///
/// Tickers are bounded-length ASCII identifiers stored inline as a
/// NUL-padded byte array, so they are `Copy` and cheap to use as map
/// keys. The wire representation is the plain string form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticker([u8; TICKER_LEN]);

impl Ticker {
    /// Parse a ticker from its string form.
    pub fn new(symbol: &str) -> Result<Self, TickerError> {
        if symbol.is_empty() {
            return Err(TickerError::Empty);
        }
        if symbol.len() > TICKER_LEN {
            return Err(TickerError::TooLong(symbol.to_string()));
        }
        if !symbol.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(TickerError::NotAscii(symbol.to_string()));
        }

        let mut buf = [0u8; TICKER_LEN];
        buf[..symbol.len()].copy_from_slice(symbol.as_bytes());
        Ok(Self(buf))
    }

    /// String form with the NUL padding stripped.
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&b| b == 0).unwrap_or(TICKER_LEN);
        // Construction only admits ASCII bytes
        std::str::from_utf8(&self.0[..end]).unwrap_or("")
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticker({:?})", self.as_str())
    }
}

impl FromStr for Ticker {
    type Err = TickerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ticker::new(s)
    }
}

impl Serialize for Ticker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Ticker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        Ticker::new(&symbol).map_err(serde::de::Error::custom)
    }
}

/// Opaque trader identity
///
/// The engine never interprets addresses; they are escrow-ledger keys
/// handed in by whatever identity layer fronts the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Address {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Executed trade record
///
/// Created only as the byproduct of a match, priced at the resting
/// order's price, and immutable once appended to the trade log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Stable ordinal, unique per engine instance
    pub trade_id: TradeId,
    /// Base token that changed hands
    pub ticker: Ticker,
    /// Base-token quantity exchanged
    pub amount: Amount,
    /// Settlement price (quote units per base unit)
    pub price: Price,
    /// Trader who received the base token
    pub buyer: Address,
    /// Trader who received the quote currency
    pub seller: Address,
    /// Unix timestamp (seconds) of execution
    pub timestamp: u64,
}
