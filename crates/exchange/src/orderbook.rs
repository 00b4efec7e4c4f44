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

use std::cmp::Reverse;
use std::collections::BTreeMap;

use crucible_sdk::types::{Amount, Price, Side, Ticker};

use crate::types::Order;

/// Price level in the order book
///
/// A price level contains all resting orders at a specific price in time
/// priority order (first-in-first-out). Order ids are monotonic, so FIFO
/// within a level is the same as ascending-id order.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    price: Price,
    orders: Vec<Order>,
}

impl PriceLevel {
    fn new(price: Price) -> Self {
        Self {
            price,
            orders: Vec::new(),
        }
    }

    fn push(&mut self, order: Order) {
        self.orders.push(order);
    }

    pub fn front(&self) -> Option<&Order> {
        self.orders.first()
    }

    fn front_mut(&mut self) -> Option<&mut Order> {
        self.orders.first_mut()
    }

    fn pop_front(&mut self) -> Option<Order> {
        if self.orders.is_empty() {
            None
        } else {
            Some(self.orders.remove(0))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }

    /// Total unfilled quantity resting at this level.
    pub fn total_available(&self) -> Amount {
        self.orders.iter().map(Order::available).sum()
    }

    pub fn price(&self) -> Price {
        self.price
    }
}

/// Limit order book for a single base token
///
/// Deterministic, single-writer book using BTreeMap for price-sorted
/// levels; the engine owns it exclusively, so there are no locks.
///
/// Sort invariant:
/// - Buy side: highest price first (descending via the Reverse wrapper),
///   ties broken by ascending order id
/// - Sell side: lowest price first (natural BTreeMap order), ties broken
///   by ascending order id
///
/// The head of each side is always the best available match for an
/// incoming market order.
#[derive(Debug, Clone)]
pub struct OrderBook {
    ticker: Ticker,
    /// Buy side: price (high to low) -> PriceLevel
    bids: BTreeMap<Reverse<Price>, PriceLevel>,
    /// Sell side: price (low to high) -> PriceLevel
    asks: BTreeMap<Price, PriceLevel>,
}

impl OrderBook {
    pub fn new(ticker: Ticker) -> Self {
        Self {
            ticker,
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    pub fn ticker(&self) -> Ticker {
        self.ticker
    }

    /// Insert a resting order on its side.
    pub fn insert(&mut self, order: Order) {
        match order.side {
            Side::Buy => {
                self.bids
                    .entry(Reverse(order.price))
                    .or_insert_with(|| PriceLevel::new(order.price))
                    .push(order);
            }
            Side::Sell => {
                self.asks
                    .entry(order.price)
                    .or_insert_with(|| PriceLevel::new(order.price))
                    .push(order);
            }
        }
    }

    /// Best resting order on a side (head of the sequence).
    pub fn best(&self, side: Side) -> Option<&Order> {
        match side {
            Side::Buy => self.bids.first_key_value().and_then(|(_, l)| l.front()),
            Side::Sell => self.asks.first_key_value().and_then(|(_, l)| l.front()),
        }
    }

    /// Mutable access to the head order, for fill bookkeeping.
    pub fn best_mut(&mut self, side: Side) -> Option<&mut Order> {
        match side {
            Side::Buy => self
                .bids
                .first_entry()
                .map(|e| e.into_mut())
                .and_then(PriceLevel::front_mut),
            Side::Sell => self
                .asks
                .first_entry()
                .map(|e| e.into_mut())
                .and_then(PriceLevel::front_mut),
        }
    }

    /// Remove the head of a side, dropping its level once emptied.
    pub fn advance(&mut self, side: Side) -> Option<Order> {
        match side {
            Side::Buy => {
                let mut entry = self.bids.first_entry()?;
                let order = entry.get_mut().pop_front();
                if entry.get().is_empty() {
                    entry.remove();
                }
                order
            }
            Side::Sell => {
                let mut entry = self.asks.first_entry()?;
                let order = entry.get_mut().pop_front();
                if entry.get().is_empty() {
                    entry.remove();
                }
                order
            }
        }
    }

    /// Iterate a side in book order (best first).
    pub fn iter(&self, side: Side) -> Box<dyn Iterator<Item = &Order> + '_> {
        match side {
            Side::Buy => Box::new(self.bids.values().flat_map(|l| l.orders.iter())),
            Side::Sell => Box::new(self.asks.values().flat_map(|l| l.orders.iter())),
        }
    }

    /// Read-only view of a side, in book order.
    pub fn snapshot(&self, side: Side) -> Vec<Order> {
        self.iter(side).cloned().collect()
    }

    /// Unfilled quantity resting at a specific price level.
    pub fn depth(&self, side: Side, price: Price) -> Option<Amount> {
        match side {
            Side::Buy => self.bids.get(&Reverse(price)).map(PriceLevel::total_available),
            Side::Sell => self.asks.get(&price).map(PriceLevel::total_available),
        }
    }

    pub fn len(&self, side: Side) -> usize {
        match side {
            Side::Buy => self.bids.values().map(PriceLevel::order_count).sum(),
            Side::Sell => self.asks.values().map(PriceLevel::order_count).sum(),
        }
    }

    pub fn is_empty(&self, side: Side) -> bool {
        match side {
            Side::Buy => self.bids.is_empty(),
            Side::Sell => self.asks.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crucible_sdk::types::Address;

    fn create_test_order(id: u64, side: Side, price: Price, amount: Amount) -> Order {
        Order {
            id,
            trader: Address::from("trader1"),
            side,
            ticker: Ticker::new("REP").unwrap(),
            amount,
            price,
            filled: 0,
        }
    }

    fn rep_book() -> OrderBook {
        OrderBook::new(Ticker::new("REP").unwrap())
    }

    #[test]
    fn test_buy_side_price_priority() {
        let mut book = rep_book();
        book.insert(create_test_order(1, Side::Buy, 10, 1));
        book.insert(create_test_order(2, Side::Buy, 11, 1));
        book.insert(create_test_order(3, Side::Buy, 9, 1));

        let prices: Vec<_> = book.snapshot(Side::Buy).iter().map(|o| o.price).collect();
        assert_eq!(prices, [11, 10, 9]);
        assert_eq!(book.best(Side::Buy).unwrap().id, 2);
    }

    #[test]
    fn test_sell_side_price_priority() {
        let mut book = rep_book();
        book.insert(create_test_order(1, Side::Sell, 10, 1));
        book.insert(create_test_order(2, Side::Sell, 9, 1));
        book.insert(create_test_order(3, Side::Sell, 11, 1));

        let prices: Vec<_> = book.snapshot(Side::Sell).iter().map(|o| o.price).collect();
        assert_eq!(prices, [9, 10, 11]);
        assert_eq!(book.best(Side::Sell).unwrap().id, 2);
    }

    #[test]
    fn test_time_priority_at_same_price() {
        let mut book = rep_book();
        book.insert(create_test_order(1, Side::Sell, 10, 1));
        book.insert(create_test_order(2, Side::Sell, 10, 1));
        book.insert(create_test_order(3, Side::Sell, 10, 1));

        let ids: Vec<_> = book.snapshot(Side::Sell).iter().map(|o| o.id).collect();
        assert_eq!(ids, [1, 2, 3]);

        assert_eq!(book.advance(Side::Sell).unwrap().id, 1);
        assert_eq!(book.best(Side::Sell).unwrap().id, 2);
    }

    #[test]
    fn test_advance_drops_empty_levels() {
        let mut book = rep_book();
        book.insert(create_test_order(1, Side::Buy, 11, 1));
        book.insert(create_test_order(2, Side::Buy, 10, 1));

        assert_eq!(book.advance(Side::Buy).unwrap().price, 11);
        assert_eq!(book.best(Side::Buy).unwrap().price, 10);
        assert_eq!(book.len(Side::Buy), 1);

        assert_eq!(book.advance(Side::Buy).unwrap().price, 10);
        assert!(book.is_empty(Side::Buy));
        assert!(book.advance(Side::Buy).is_none());
    }

    #[test]
    fn test_sides_are_independent() {
        let mut book = rep_book();
        book.insert(create_test_order(1, Side::Buy, 10, 1));

        assert!(book.is_empty(Side::Sell));
        assert!(book.best(Side::Sell).is_none());
        assert_eq!(book.len(Side::Buy), 1);
    }

    #[test]
    fn test_level_depth_skips_filled_quantity() {
        let mut book = rep_book();
        book.insert(create_test_order(1, Side::Buy, 10, 4));
        book.insert(create_test_order(2, Side::Buy, 10, 6));

        assert_eq!(book.depth(Side::Buy, 10), Some(10));

        if let Some(head) = book.best_mut(Side::Buy) {
            head.filled = 3;
        }
        assert_eq!(book.depth(Side::Buy, 10), Some(7));
        assert_eq!(book.depth(Side::Buy, 11), None);
    }
}
