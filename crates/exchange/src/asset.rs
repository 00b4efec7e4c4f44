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

//! External asset-movement capability
//!
//! The engine never touches the underlying asset contracts directly; it
//! holds a handle per registered token and asks it to move funds in or
//! out of escrow. A transfer either succeeds or fails atomically — there
//! is no partial movement — and the engine's ledger is always mutated to
//! a consistent state before (withdraw) or after (deposit) the call, so
//! a re-entrant callback can never observe a half-settled balance.

use std::{collections::HashMap, sync::Mutex};

use crucible_sdk::types::{Address, Amount};
use thiserror::Error;

/// Error types for asset transfers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("insufficient allowance")]
    InsufficientAllowance,
    #[error("insufficient funds")]
    InsufficientFunds,
}

/// Handle to the external contract backing a registered token
///
/// `transfer_in` moves funds from the holder's wallet into exchange
/// escrow; `transfer_out` moves them back. Both are atomic
/// succeed-or-fail operations from the engine's point of view.
pub trait TokenAsset: Send + Sync {
    fn transfer_in(&self, from: &Address, amount: Amount) -> Result<(), AssetError>;
    fn transfer_out(&self, to: &Address, amount: Amount) -> Result<(), AssetError>;
}

#[derive(Debug, Default)]
struct AssetBook {
    /// Wallet balances outside the exchange
    wallets: HashMap<Address, Amount>,
    /// Per-holder spending allowance granted to the exchange
    allowances: HashMap<Address, Amount>,
    /// Total currently held in escrow
    escrowed: Amount,
}

/// In-memory asset implementation
///
/// Reproduces the approve/transferFrom flow of an ERC20-style contract:
/// `transfer_in` spends allowance and wallet balance, `transfer_out`
/// returns escrowed funds to the wallet. Suitable for development,
/// testing, and the config-driven preload; a production deployment
/// would implement [`TokenAsset`] against the real asset contract.
#[derive(Debug, Default)]
pub struct MemoryAsset {
    inner: Mutex<AssetBook>,
}

impl MemoryAsset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a holder's wallet (test/setup convenience).
    pub fn faucet(&self, holder: &Address, amount: Amount) {
        let mut book = self.inner.lock().unwrap();
        *book.wallets.entry(holder.clone()).or_default() += amount;
    }

    /// Authorize the exchange to spend from a holder's wallet.
    pub fn approve(&self, holder: &Address, amount: Amount) {
        let mut book = self.inner.lock().unwrap();
        book.allowances.insert(holder.clone(), amount);
    }

    /// Wallet balance outside the exchange.
    pub fn balance_of(&self, holder: &Address) -> Amount {
        let book = self.inner.lock().unwrap();
        book.wallets.get(holder).copied().unwrap_or_default()
    }

    /// Remaining spending allowance.
    pub fn allowance(&self, holder: &Address) -> Amount {
        let book = self.inner.lock().unwrap();
        book.allowances.get(holder).copied().unwrap_or_default()
    }

    /// Total currently escrowed with the exchange.
    pub fn escrowed(&self) -> Amount {
        self.inner.lock().unwrap().escrowed
    }
}

impl TokenAsset for MemoryAsset {
    fn transfer_in(&self, from: &Address, amount: Amount) -> Result<(), AssetError> {
        let mut book = self.inner.lock().unwrap();

        let allowance = book.allowances.get(from).copied().unwrap_or_default();
        if allowance < amount {
            return Err(AssetError::InsufficientAllowance);
        }
        let wallet = book.wallets.get(from).copied().unwrap_or_default();
        if wallet < amount {
            return Err(AssetError::InsufficientFunds);
        }

        book.allowances.insert(from.clone(), allowance - amount);
        book.wallets.insert(from.clone(), wallet - amount);
        book.escrowed += amount;
        Ok(())
    }

    fn transfer_out(&self, to: &Address, amount: Amount) -> Result<(), AssetError> {
        let mut book = self.inner.lock().unwrap();

        if book.escrowed < amount {
            return Err(AssetError::InsufficientFunds);
        }

        book.escrowed -= amount;
        *book.wallets.entry(to.clone()).or_default() += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trader() -> Address {
        Address::from("trader1")
    }

    #[test]
    fn test_transfer_in_requires_allowance() {
        let asset = MemoryAsset::new();
        asset.faucet(&trader(), 1000);

        assert_eq!(
            asset.transfer_in(&trader(), 100),
            Err(AssetError::InsufficientAllowance)
        );

        asset.approve(&trader(), 100);
        assert!(asset.transfer_in(&trader(), 100).is_ok());
        assert_eq!(asset.balance_of(&trader()), 900);
        assert_eq!(asset.allowance(&trader()), 0);
        assert_eq!(asset.escrowed(), 100);
    }

    #[test]
    fn test_transfer_in_requires_wallet_funds() {
        let asset = MemoryAsset::new();
        asset.faucet(&trader(), 50);
        asset.approve(&trader(), 100);

        assert_eq!(
            asset.transfer_in(&trader(), 100),
            Err(AssetError::InsufficientFunds)
        );
        // Nothing moved
        assert_eq!(asset.balance_of(&trader()), 50);
        assert_eq!(asset.allowance(&trader()), 100);
    }

    #[test]
    fn test_transfer_out_returns_escrow() {
        let asset = MemoryAsset::new();
        asset.faucet(&trader(), 100);
        asset.approve(&trader(), 100);
        asset.transfer_in(&trader(), 100).unwrap();

        asset.transfer_out(&trader(), 60).unwrap();
        assert_eq!(asset.balance_of(&trader()), 60);
        assert_eq!(asset.escrowed(), 40);

        assert_eq!(
            asset.transfer_out(&trader(), 41),
            Err(AssetError::InsufficientFunds)
        );
    }
}
