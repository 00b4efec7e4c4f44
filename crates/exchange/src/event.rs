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

//! Trade event log
//!
//! Every executed trade is appended here with its stable ordinal id.
//! The log is the feed the presentation layer subscribes to: replayable
//! from the beginning of history, filterable downstream, deduplicated by
//! consumers on `trade_id` (see `crucible_sdk::feed`).

use std::sync::Mutex;

use crucible_sdk::types::{Trade, TradeId};
use thiserror::Error;

/// Error types for trade log operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to append trade: {0}")]
    AppendFailed(String),
}

/// Trade log trait - persistence layer for executed trades
///
/// Key properties:
/// - Append-only: trades are never modified or deleted after writing
/// - Ordered: trades replay in trade-id order
/// - Replayable: any cursor position can be re-read, so consumers must
///   deduplicate by `trade_id`
///
/// This abstraction allows different backing stores: an in-memory Vec
/// for development and testing, or a durable append log in deployments
/// that need crash recovery of the trade history.
pub trait TradeStorage: Send {
    /// Append one executed trade.
    fn append(&mut self, trade: Trade) -> Result<(), StorageError>;

    /// Replay trades with `trade_id >= from`, in trade-id order.
    fn replay_from(&self, from: TradeId) -> Vec<Trade>;

    /// Ordinal of the most recently appended trade.
    fn last_trade_id(&self) -> Option<TradeId>;

    /// Total count of recorded trades.
    fn trade_count(&self) -> usize;
}

/// In-memory trade log
///
/// No durability guarantees; suitable for development, testing, and
/// benchmarking the matching path without I/O overhead.
#[derive(Debug, Default)]
pub struct MemoryTradeStorage {
    trades: Mutex<Vec<Trade>>,
}

impl MemoryTradeStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TradeStorage for MemoryTradeStorage {
    fn append(&mut self, trade: Trade) -> Result<(), StorageError> {
        self.trades.lock().unwrap().push(trade);
        Ok(())
    }

    fn replay_from(&self, from: TradeId) -> Vec<Trade> {
        self.trades
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.trade_id >= from)
            .cloned()
            .collect()
    }

    fn last_trade_id(&self) -> Option<TradeId> {
        self.trades.lock().unwrap().last().map(|t| t.trade_id)
    }

    fn trade_count(&self) -> usize {
        self.trades.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crucible_sdk::types::{Address, Ticker};

    fn create_test_trade(trade_id: TradeId) -> Trade {
        Trade {
            trade_id,
            ticker: Ticker::new("REP").unwrap(),
            amount: 5,
            price: 10,
            buyer: Address::from("trader1"),
            seller: Address::from("trader2"),
            timestamp: 1000,
        }
    }

    #[test]
    fn test_append_and_replay() {
        let mut storage = MemoryTradeStorage::new();
        assert_eq!(storage.last_trade_id(), None);

        storage.append(create_test_trade(1)).unwrap();
        storage.append(create_test_trade(2)).unwrap();
        storage.append(create_test_trade(3)).unwrap();

        assert_eq!(storage.trade_count(), 3);
        assert_eq!(storage.last_trade_id(), Some(3));

        assert_eq!(storage.replay_from(0).len(), 3);
        assert_eq!(storage.replay_from(3).len(), 1);
        assert!(storage.replay_from(4).is_empty());
    }

    #[test]
    fn test_trade_wire_shape() {
        let trade = create_test_trade(7);
        let json = serde_json::to_value(&trade).unwrap();

        assert_eq!(json["trade_id"], 7);
        assert_eq!(json["ticker"], "REP");
        assert_eq!(json["buyer"], "trader1");
        assert_eq!(json["seller"], "trader2");
    }
}
