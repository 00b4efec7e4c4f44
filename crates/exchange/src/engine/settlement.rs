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

//! Settlement planning for market orders
//!
//! A market order must settle whole or not at all: a balance shortfall on
//! any leg rejects the entire call with no state change. Instead of
//! mutating the ledger leg by leg and unwinding on failure, the plan is
//! computed against a scratch view of every touched balance — each leg's
//! debit re-verified against the running view — and only a fully verified
//! plan reaches the ledger, the book, and the trade log.

use std::collections::HashMap;

use crucible_sdk::types::{Address, Amount, OrderId, Price, Side, Ticker};

use crate::{ledger::BalanceLedger, orderbook::OrderBook, types::ExchangeError};

/// One planned fill against a resting order.
#[derive(Debug, Clone)]
pub(crate) struct Fill {
    pub maker: Address,
    pub maker_order_id: OrderId,
    /// Settlement price: always the resting order's price
    pub price: Price,
    pub traded: Amount,
}

/// Verified settlement plan for one market order.
#[derive(Debug)]
pub(crate) struct FillPlan {
    pub fills: Vec<Fill>,
    pub executed: Amount,
    /// Post-settlement balance for every `(trader, ticker)` touched
    pub balances: HashMap<(Address, Ticker), Amount>,
}

type BalanceView = HashMap<(Address, Ticker), Amount>;

fn view_entry<'a>(
    view: &'a mut BalanceView,
    ledger: &BalanceLedger,
    trader: &Address,
    ticker: Ticker,
) -> &'a mut Amount {
    view.entry((trader.clone(), ticker))
        .or_insert_with(|| ledger.balance_of(trader, ticker))
}

fn debit_view(
    view: &mut BalanceView,
    ledger: &BalanceLedger,
    trader: &Address,
    ticker: Ticker,
    amount: Amount,
    shortfall: ExchangeError,
) -> Result<(), ExchangeError> {
    let balance = view_entry(view, ledger, trader, ticker);
    if *balance < amount {
        return Err(shortfall);
    }
    *balance -= amount;
    Ok(())
}

fn credit_view(
    view: &mut BalanceView,
    ledger: &BalanceLedger,
    trader: &Address,
    ticker: Ticker,
    amount: Amount,
) {
    *view_entry(view, ledger, trader, ticker) += amount;
}

impl FillPlan {
    /// Walk the opposite side of the book, best price first, and plan
    /// fills until the order is satisfied or the book is exhausted.
    ///
    /// Settlement legs per fill, at the resting order's price:
    /// - base leg: seller -> buyer, `traded` base units
    /// - quote leg: buyer -> seller, `traded * price` quote units
    ///
    /// Both debits are verified against the running balance view, so a
    /// trader selling into their own bid (or any other self-crossing
    /// sequence) is checked exactly as the serialized leg-by-leg
    /// settlement would check it.
    pub(crate) fn build(
        book: &OrderBook,
        ledger: &BalanceLedger,
        taker: &Address,
        ticker: Ticker,
        quote: Ticker,
        amount: Amount,
        side: Side,
    ) -> Result<FillPlan, ExchangeError> {
        let mut fills = Vec::new();
        let mut balances = BalanceView::new();
        let mut remaining = amount;

        for resting in book.iter(side.opposite()) {
            if remaining == 0 {
                break;
            }

            let traded = remaining.min(resting.available());
            let quote_amount = traded
                .checked_mul(resting.price)
                .ok_or(ExchangeError::AmountOverflow)?;
            let (buyer, seller) = match side {
                Side::Buy => (taker, &resting.trader),
                Side::Sell => (&resting.trader, taker),
            };

            debit_view(
                &mut balances,
                ledger,
                seller,
                ticker,
                traded,
                ExchangeError::InsufficientTokenBalance,
            )?;
            credit_view(&mut balances, ledger, buyer, ticker, traded);

            debit_view(
                &mut balances,
                ledger,
                buyer,
                quote,
                quote_amount,
                ExchangeError::InsufficientQuoteBalance,
            )?;
            credit_view(&mut balances, ledger, seller, quote, quote_amount);

            fills.push(Fill {
                maker: resting.trader.clone(),
                maker_order_id: resting.id,
                price: resting.price,
                traded,
            });
            remaining -= traded;
        }

        Ok(FillPlan {
            fills,
            executed: amount - remaining,
            balances,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Order;

    fn ticker(symbol: &str) -> Ticker {
        Ticker::new(symbol).unwrap()
    }

    fn resting_buy(id: u64, trader: &str, price: Price, amount: Amount) -> Order {
        Order {
            id,
            trader: Address::from(trader),
            side: Side::Buy,
            ticker: ticker("REP"),
            amount,
            price,
            filled: 0,
        }
    }

    #[test]
    fn test_plan_consumes_best_price_first() {
        let mut book = OrderBook::new(ticker("REP"));
        book.insert(resting_buy(1, "trader1", 9, 10));
        book.insert(resting_buy(2, "trader2", 11, 10));

        let mut ledger = BalanceLedger::new();
        ledger.credit(&Address::from("trader1"), ticker("DAI"), 1000);
        ledger.credit(&Address::from("trader2"), ticker("DAI"), 1000);
        ledger.credit(&Address::from("seller"), ticker("REP"), 15);

        let plan = FillPlan::build(
            &book,
            &ledger,
            &Address::from("seller"),
            ticker("REP"),
            ticker("DAI"),
            15,
            Side::Sell,
        )
        .unwrap();

        assert_eq!(plan.executed, 15);
        assert_eq!(plan.fills.len(), 2);
        assert_eq!(plan.fills[0].price, 11);
        assert_eq!(plan.fills[0].traded, 10);
        assert_eq!(plan.fills[1].price, 9);
        assert_eq!(plan.fills[1].traded, 5);
    }

    #[test]
    fn test_maker_shortfall_rejects_whole_plan() {
        let mut book = OrderBook::new(ticker("REP"));
        book.insert(resting_buy(1, "trader1", 10, 10));
        book.insert(resting_buy(2, "trader2", 9, 10));

        // trader2's bid is no longer funded
        let mut ledger = BalanceLedger::new();
        ledger.credit(&Address::from("trader1"), ticker("DAI"), 100);
        ledger.credit(&Address::from("seller"), ticker("REP"), 20);

        let result = FillPlan::build(
            &book,
            &ledger,
            &Address::from("seller"),
            ticker("REP"),
            ticker("DAI"),
            20,
            Side::Sell,
        );
        assert!(matches!(
            result,
            Err(ExchangeError::InsufficientQuoteBalance)
        ));
    }

    #[test]
    fn test_cumulative_quote_debits_are_tracked() {
        let mut book = OrderBook::new(ticker("REP"));
        book.insert(resting_buy(1, "trader1", 10, 10));
        book.insert(resting_buy(2, "trader1", 10, 10));

        // Enough for one fill, not both
        let mut ledger = BalanceLedger::new();
        ledger.credit(&Address::from("trader1"), ticker("DAI"), 150);
        ledger.credit(&Address::from("seller"), ticker("REP"), 20);

        let result = FillPlan::build(
            &book,
            &ledger,
            &Address::from("seller"),
            ticker("REP"),
            ticker("DAI"),
            20,
            Side::Sell,
        );
        assert!(matches!(
            result,
            Err(ExchangeError::InsufficientQuoteBalance)
        ));
    }

    #[test]
    fn test_self_cross_settles_like_sequential_legs() {
        let mut book = OrderBook::new(ticker("REP"));
        book.insert(resting_buy(1, "trader1", 10, 5));

        // trader1 sells into their own bid: quote moves out and back
        let mut ledger = BalanceLedger::new();
        ledger.credit(&Address::from("trader1"), ticker("DAI"), 50);
        ledger.credit(&Address::from("trader1"), ticker("REP"), 5);

        let plan = FillPlan::build(
            &book,
            &ledger,
            &Address::from("trader1"),
            ticker("REP"),
            ticker("DAI"),
            5,
            Side::Sell,
        )
        .unwrap();

        assert_eq!(plan.executed, 5);
        let trader = Address::from("trader1");
        assert_eq!(plan.balances[&(trader.clone(), ticker("DAI"))], 50);
        assert_eq!(plan.balances[&(trader, ticker("REP"))], 5);
    }
}
