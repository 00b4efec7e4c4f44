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

//! Trade feed subscription
//!
//! The trade log is append-only and replayable from the beginning of
//! history, so a subscriber is nothing more than a cursor into the log.
//! Re-delivery is possible after a cursor rewind (reconnect semantics),
//! which is why each subscriber also keeps a local seen-set keyed by the
//! stable trade ordinal.

use std::collections::HashSet;

use crate::types::{Ticker, Trade, TradeId};

/// Replayable source of executed trades
///
/// Implemented by the engine (and by anything fronting its trade log).
/// `trades_since` returns every trade with `trade_id >= cursor`, in
/// trade-id order; delivering a trade more than once is permitted.
pub trait TradeSource {
    fn trades_since(&self, cursor: TradeId) -> Vec<Trade>;
}

/// Cursor-based trade subscriber with consumer-side deduplication
///
/// `poll` returns only trades the subscriber has not observed before,
/// optionally restricted to a single ticker. The seen-set guards against
/// re-delivery; the cursor keeps steady-state polling cheap.
#[derive(Debug, Clone, Default)]
pub struct TradeFeed {
    cursor: TradeId,
    seen: HashSet<TradeId>,
    ticker: Option<Ticker>,
}

impl TradeFeed {
    /// Subscribe to every trade, from the beginning of history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a single ticker's trades.
    pub fn for_ticker(ticker: Ticker) -> Self {
        Self {
            ticker: Some(ticker),
            ..Self::default()
        }
    }

    /// Drain new trades from the source.
    pub fn poll<S: TradeSource + ?Sized>(&mut self, source: &S) -> Vec<Trade> {
        let mut fresh = Vec::new();
        for trade in source.trades_since(self.cursor) {
            self.cursor = self.cursor.max(trade.trade_id + 1);
            if !self.seen.insert(trade.trade_id) {
                continue;
            }
            if let Some(ticker) = self.ticker
                && ticker != trade.ticker
            {
                continue;
            }
            fresh.push(trade);
        }
        fresh
    }

    /// Reset the cursor to the beginning of history.
    ///
    /// Used after reconnecting to a source whose log may have been
    /// re-delivered; the seen-set suppresses everything already observed.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Next trade ordinal this subscriber will ask for.
    pub fn cursor(&self) -> TradeId {
        self.cursor
    }
}
