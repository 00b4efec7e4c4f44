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

//! Crucible SDK - shared boundary types for the exchange engine
//!
//! This crate provides the types that cross the engine boundary — sides,
//! tickers, trader addresses, executed trades — together with the trade
//! feed subscriber consumed by presentation layers.
//!
//! The SDK is designed to be lightweight and embeddable:
//! - No background threads
//! - No runtime initialization
//! - No environment or configuration loading

pub mod feed;
pub mod types;

pub use feed::{TradeFeed, TradeSource};
pub use types::*;
