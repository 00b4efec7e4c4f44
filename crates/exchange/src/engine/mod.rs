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

//! Matching engine
//!
//! The `Exchange` owns every piece of mutable state — the token
//! registry, the escrow ledger, the per-ticker order books, and the
//! trade log — and serializes all mutation through `&mut self`. Each
//! operation is atomic end-to-end: it either completes fully or fails
//! leaving ledgers and books exactly as they were, and reads always
//! observe fully-settled state.
//!
//! Matching rules:
//! - Limit orders validate solvency against the live ledger balance,
//!   then rest in the book; they reserve nothing and never match on
//!   insertion.
//! - Market orders consume the opposite side of the book under
//!   price-time priority, settling each fill at the resting order's
//!   price; any unmatched remainder is discarded.

mod settlement;

use std::{collections::HashMap, sync::Arc, time::SystemTime};

use crucible_sdk::{
    feed::TradeSource,
    types::{Address, Amount, OrderId, Price, Side, Ticker, Trade, TradeId},
};
use tracing::{debug, error, info};

use crate::{
    asset::TokenAsset,
    config::ExchangeConfig,
    event::{MemoryTradeStorage, TradeStorage},
    ledger::BalanceLedger,
    orderbook::OrderBook,
    registry::{TokenInfo, TokenRegistry},
    types::{ExchangeError, MarketOrderReport, Order},
};
use settlement::FillPlan;

/// Custodial order-matching exchange
///
/// One instance is one isolated market venue: its registry, ledger,
/// books, and trade log share a lifecycle and are never reachable from
/// outside except through the operations below.
pub struct Exchange {
    registry: TokenRegistry,
    ledger: BalanceLedger,
    books: HashMap<Ticker, OrderBook>,
    trades: Box<dyn TradeStorage>,
    next_order_id: OrderId,
    next_trade_id: TradeId,
    verbose: bool,
}

impl Exchange {
    /// Create an empty exchange with in-memory trade storage.
    pub fn new() -> Self {
        Self::with_storage(Box::new(MemoryTradeStorage::new()))
    }

    /// Create an exchange over a caller-provided trade log.
    pub fn with_storage(trades: Box<dyn TradeStorage>) -> Self {
        Self {
            registry: TokenRegistry::new(),
            ledger: BalanceLedger::new(),
            books: HashMap::new(),
            trades,
            next_order_id: 0,
            next_trade_id: 0,
            verbose: false,
        }
    }

    /// Create an exchange with the configured token table preloaded.
    ///
    /// Every configured token is backed by a fresh
    /// [`MemoryAsset`](crate::asset::MemoryAsset); deployments with real
    /// asset contracts register their own handles instead.
    pub fn from_config(config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        let mut exchange = Self::new();
        exchange.verbose = config.verbose_logging;
        for entry in &config.tokens {
            let ticker = Ticker::new(&entry.ticker)?;
            exchange.register(ticker, Arc::new(crate::asset::MemoryAsset::new()), entry.quote)?;
        }
        Ok(exchange)
    }

    // ---- administrative ----

    /// Register a token for trading (or as the quote currency).
    pub fn register(
        &mut self,
        ticker: Ticker,
        asset: Arc<dyn TokenAsset>,
        is_quote: bool,
    ) -> Result<(), ExchangeError> {
        self.registry.register(ticker, asset, is_quote)?;
        info!(target: "engine", ticker = %ticker, is_quote, "token registered");
        Ok(())
    }

    /// All registered tokens, in registration order.
    pub fn tokens(&self) -> Vec<TokenInfo> {
        self.registry.tokens()
    }

    // ---- escrow ----

    /// Move funds from the trader's wallet into exchange escrow.
    ///
    /// The external transfer runs first; the ledger credit is the final
    /// step, so a refused transfer leaves no state behind.
    pub fn deposit(
        &mut self,
        trader: &Address,
        ticker: Ticker,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        let asset = self.registry.lookup(ticker)?.asset.clone();
        asset.transfer_in(trader, amount)?;
        self.ledger.credit(trader, ticker, amount);
        if self.verbose {
            debug!(target: "engine", trader = %trader, ticker = %ticker, amount = %amount, "deposit");
        }
        Ok(())
    }

    /// Move escrowed funds back to the trader's wallet.
    ///
    /// The ledger debit strictly precedes the external transfer, so a
    /// re-entrant call during the transfer observes the already-debited
    /// balance and cannot double-withdraw. A refused transfer restores
    /// the debit before the error surfaces.
    pub fn withdraw(
        &mut self,
        trader: &Address,
        ticker: Ticker,
        amount: Amount,
    ) -> Result<(), ExchangeError> {
        let asset = self.registry.lookup(ticker)?.asset.clone();
        self.ledger
            .debit(trader, ticker, amount)
            .map_err(|_| ExchangeError::InsufficientBalance)?;
        if let Err(refused) = asset.transfer_out(trader, amount) {
            self.ledger.credit(trader, ticker, amount);
            return Err(refused.into());
        }
        if self.verbose {
            debug!(target: "engine", trader = %trader, ticker = %ticker, amount = %amount, "withdraw");
        }
        Ok(())
    }

    /// Current escrowed balance (implicit zero when absent).
    pub fn balance_of(&self, trader: &Address, ticker: Ticker) -> Amount {
        self.ledger.balance_of(trader, ticker)
    }

    // ---- orders ----

    /// Place a resting limit order.
    ///
    /// Solvency is validated against the live ledger balance at creation
    /// time; no escrow is reserved, and settlement happens only when a
    /// market order matches the resting order.
    pub fn create_limit_order(
        &mut self,
        trader: &Address,
        ticker: Ticker,
        amount: Amount,
        price: Price,
        side: Side,
    ) -> Result<OrderId, ExchangeError> {
        let quote = self.ensure_tradable(ticker)?;

        match side {
            Side::Sell => {
                if self.ledger.balance_of(trader, ticker) < amount {
                    return Err(ExchangeError::InsufficientTokenBalance);
                }
            }
            Side::Buy => {
                let cost = amount
                    .checked_mul(price)
                    .ok_or(ExchangeError::AmountOverflow)?;
                if self.ledger.balance_of(trader, quote) < cost {
                    return Err(ExchangeError::InsufficientQuoteBalance);
                }
            }
        }

        self.next_order_id += 1;
        let order = Order {
            id: self.next_order_id,
            trader: trader.clone(),
            side,
            ticker,
            amount,
            price,
            filled: 0,
        };
        if self.verbose {
            debug!(
                target: "engine",
                order_id = order.id,
                trader = %trader,
                ticker = %ticker,
                side = ?side,
                amount = %amount,
                price = %price,
                "limit order resting"
            );
        }
        self.books
            .entry(ticker)
            .or_insert_with(|| OrderBook::new(ticker))
            .insert(order);
        Ok(self.next_order_id)
    }

    /// Execute a market order against the opposite side of the book.
    ///
    /// Accept-what's-available semantics: matching stops when the order
    /// is satisfied or the book is exhausted, and the remainder is
    /// discarded. A balance shortfall on any settlement leg rejects the
    /// entire call with no state change (plan, verify, then commit).
    pub fn create_market_order(
        &mut self,
        trader: &Address,
        ticker: Ticker,
        amount: Amount,
        side: Side,
    ) -> Result<MarketOrderReport, ExchangeError> {
        let quote = self.ensure_tradable(ticker)?;

        // Sellers must hold the full base quantity up front; buyers are
        // checked per settled leg only.
        if side == Side::Sell && self.ledger.balance_of(trader, ticker) < amount {
            return Err(ExchangeError::InsufficientTokenBalance);
        }

        let book = self
            .books
            .entry(ticker)
            .or_insert_with(|| OrderBook::new(ticker));
        let plan = FillPlan::build(book, &self.ledger, trader, ticker, quote, amount, side)?;
        let FillPlan {
            fills,
            executed,
            balances,
        } = plan;

        // Commit: balances first, then book state and trade records.
        // Everything past this point is infallible bookkeeping.
        self.ledger.commit(balances);

        let opposite = side.opposite();
        let timestamp = Self::timestamp();
        let mut trades = Vec::with_capacity(fills.len());
        for fill in fills {
            if let Some(resting) = book.best_mut(opposite) {
                debug_assert_eq!(resting.id, fill.maker_order_id);
                resting.filled += fill.traded;
                if resting.is_filled() {
                    let _ = book.advance(opposite);
                }
            }

            let (buyer, seller) = match side {
                Side::Buy => (trader.clone(), fill.maker),
                Side::Sell => (fill.maker, trader.clone()),
            };
            self.next_trade_id += 1;
            let trade = Trade {
                trade_id: self.next_trade_id,
                ticker,
                amount: fill.traded,
                price: fill.price,
                buyer,
                seller,
                timestamp,
            };
            info!(
                target: "engine",
                trade_id = trade.trade_id,
                ticker = %ticker,
                amount = %trade.amount,
                price = %trade.price,
                "trade executed"
            );
            if let Err(e) = self.trades.append(trade.clone()) {
                error!(target: "engine", trade_id = trade.trade_id, "failed to record trade: {}", e);
            }
            trades.push(trade);
        }

        Ok(MarketOrderReport {
            requested: amount,
            executed,
            trades,
        })
    }

    /// Read-only view of one side of a ticker's book, in book order.
    pub fn get_orders(&self, ticker: Ticker, side: Side) -> Result<Vec<Order>, ExchangeError> {
        self.registry.lookup(ticker)?;
        if self.registry.is_quote_currency(ticker) {
            return Err(ExchangeError::CannotTradeQuoteCurrency);
        }
        Ok(self
            .books
            .get(&ticker)
            .map(|book| book.snapshot(side))
            .unwrap_or_default())
    }

    /// Total count of recorded trades.
    pub fn trade_count(&self) -> usize {
        self.trades.trade_count()
    }

    // ---- internals ----

    /// Validate that a ticker names a registered base token, and resolve
    /// the quote currency prices are settled in.
    fn ensure_tradable(&self, ticker: Ticker) -> Result<Ticker, ExchangeError> {
        self.registry.lookup(ticker)?;
        if self.registry.is_quote_currency(ticker) {
            return Err(ExchangeError::CannotTradeQuoteCurrency);
        }
        self.registry
            .quote_ticker()
            .ok_or(ExchangeError::NoQuoteCurrency)
    }

    fn timestamp() -> u64 {
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }
}

impl Default for Exchange {
    fn default() -> Self {
        Self::new()
    }
}

impl TradeSource for Exchange {
    fn trades_since(&self, cursor: TradeId) -> Vec<Trade> {
        self.trades.replay_from(cursor)
    }
}
