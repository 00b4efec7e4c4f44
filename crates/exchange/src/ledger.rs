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

use std::collections::HashMap;

use crucible_sdk::types::{Address, Amount, Ticker};
use thiserror::Error;

/// Raised when a debit would take an escrowed balance below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("insufficient escrowed balance")]
pub struct InsufficientFunds;

/// Escrowed balance ledger
///
/// One balance per `(trader, ticker)`, created lazily at first credit
/// and never negative: every debit is checked against the current
/// balance in the same step that mutates it. The ledger is the single
/// source of truth for solvency — external asset state is consulted
/// only through the transfer capability, never for balance checks.
#[derive(Debug, Default)]
pub struct BalanceLedger {
    balances: HashMap<(Address, Ticker), Amount>,
}

impl BalanceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current escrowed balance (implicit zero when absent).
    pub fn balance_of(&self, trader: &Address, ticker: Ticker) -> Amount {
        self.balances
            .get(&(trader.clone(), ticker))
            .copied()
            .unwrap_or_default()
    }

    pub fn credit(&mut self, trader: &Address, ticker: Ticker, amount: Amount) {
        *self
            .balances
            .entry((trader.clone(), ticker))
            .or_default() += amount;
    }

    /// Checked-then-mutated debit; fails without touching the balance.
    pub fn debit(
        &mut self,
        trader: &Address,
        ticker: Ticker,
        amount: Amount,
    ) -> Result<(), InsufficientFunds> {
        let balance = self.balances.entry((trader.clone(), ticker)).or_default();
        if *balance < amount {
            return Err(InsufficientFunds);
        }
        *balance -= amount;
        Ok(())
    }

    /// Write back balances computed by a verified settlement plan.
    ///
    /// The plan was built against a consistent read of this ledger under
    /// the engine's single-writer execution, so the write-back replaces
    /// every touched balance in one step — settlement commits whole or
    /// not at all.
    pub(crate) fn commit(&mut self, settled: HashMap<(Address, Ticker), Amount>) {
        for (key, balance) in settled {
            self.balances.insert(key, balance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(symbol: &str) -> Ticker {
        Ticker::new(symbol).unwrap()
    }

    #[test]
    fn test_lazy_zero_balance() {
        let ledger = BalanceLedger::new();
        assert_eq!(ledger.balance_of(&Address::from("trader1"), ticker("DAI")), 0);
    }

    #[test]
    fn test_credit_and_debit() {
        let mut ledger = BalanceLedger::new();
        let trader = Address::from("trader1");

        ledger.credit(&trader, ticker("DAI"), 100);
        assert_eq!(ledger.balance_of(&trader, ticker("DAI")), 100);

        ledger.debit(&trader, ticker("DAI"), 40).unwrap();
        assert_eq!(ledger.balance_of(&trader, ticker("DAI")), 60);
    }

    #[test]
    fn test_debit_never_goes_negative() {
        let mut ledger = BalanceLedger::new();
        let trader = Address::from("trader1");
        ledger.credit(&trader, ticker("DAI"), 50);

        assert_eq!(
            ledger.debit(&trader, ticker("DAI"), 51),
            Err(InsufficientFunds)
        );
        // Failed debit leaves the balance untouched
        assert_eq!(ledger.balance_of(&trader, ticker("DAI")), 50);
    }

    #[test]
    fn test_balances_are_per_ticker() {
        let mut ledger = BalanceLedger::new();
        let trader = Address::from("trader1");

        ledger.credit(&trader, ticker("DAI"), 100);
        assert_eq!(ledger.balance_of(&trader, ticker("REP")), 0);
        assert!(ledger.debit(&trader, ticker("REP"), 1).is_err());
    }

    #[test]
    fn test_commit_replaces_touched_balances() {
        let mut ledger = BalanceLedger::new();
        let trader1 = Address::from("trader1");
        let trader2 = Address::from("trader2");
        ledger.credit(&trader1, ticker("DAI"), 100);
        ledger.credit(&trader2, ticker("REP"), 100);

        let mut settled = HashMap::new();
        settled.insert((trader1.clone(), ticker("DAI")), 50u128);
        settled.insert((trader2.clone(), ticker("DAI")), 50u128);
        ledger.commit(settled);

        assert_eq!(ledger.balance_of(&trader1, ticker("DAI")), 50);
        assert_eq!(ledger.balance_of(&trader2, ticker("DAI")), 50);
        // Untouched balances survive
        assert_eq!(ledger.balance_of(&trader2, ticker("REP")), 100);
    }
}
