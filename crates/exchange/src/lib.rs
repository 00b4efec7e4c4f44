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

//! Crucible Exchange Engine
//!
//! A custodial order-matching exchange: traders deposit ERC20-style
//! tokens into an escrow ledger, place limit and market orders priced in
//! a single quote currency, and the engine matches market orders against
//! resting limit orders under price-time priority, updating balances and
//! appending trade records.
//!
//! Architecture:
//! - Serialized single-writer engine (`Exchange`) for deterministic,
//!   atomic operations — no partial state is ever observable
//! - Escrow ledger as the single source of truth for solvency
//! - External asset movement behind the `TokenAsset` capability trait
//! - Append-only, replayable trade log with ordinal trade ids

pub mod asset;
pub mod config;
pub mod engine;
pub mod event;
pub mod ledger;
pub mod logging;
pub mod orderbook;
pub mod registry;
pub mod types;

pub use asset::{AssetError, MemoryAsset, TokenAsset};
pub use config::{ExchangeConfig, TokenEntry};
pub use engine::Exchange;
pub use event::{MemoryTradeStorage, StorageError, TradeStorage};
pub use ledger::BalanceLedger;
pub use orderbook::{OrderBook, PriceLevel};
pub use registry::{Token, TokenInfo, TokenRegistry};
pub use types::*;
