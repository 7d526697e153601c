// Copyright 2021 The Poolchain Developers
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

//! The derived balance index: one record per account, keyed by account
//! name, holding that account's balance in every currency it has
//! touched. The index is rebuilt from the pool store on every init, so
//! it is destroyed rather than migrated.

use std::collections::BTreeMap;

use poolchain_core::amount::Amount;
use poolchain_core::ser;
use poolchain_core::transaction::Transaction;
use poolchain_util::to_hex;

use crate::error::{Error, ErrorKind};

/// Per-account balances: currency name to amount, in the order the
/// record serializes them.
pub type AccountBalance = BTreeMap<Vec<u8>, Amount>;

/// The balance store. Purely derived from the pool store; mutated only
/// by the write path and the startup rebuild.
pub struct BalanceStore {
	db: poolchain_store::Store,
}

impl BalanceStore {
	/// Destroys any index left at `path` and creates a fresh, empty
	/// one.
	pub fn rebuild(path: &str) -> Result<BalanceStore, Error> {
		poolchain_store::Store::destroy(path)?;
		let db = poolchain_store::Store::create_new(path)?;
		Ok(BalanceStore { db })
	}

	/// Applies the transactions, in order, to the per-account
	/// balances: the amount is subtracted from the source account and
	/// added to the target account, per currency. Touched accounts are
	/// staged in memory and committed as one atomic batch; a failed
	/// batch reverts nothing and is repaired by the next rebuild.
	pub fn update_balances(&self, transactions: &[Transaction]) -> Result<(), Error> {
		let mut staged: BTreeMap<Vec<u8>, AccountBalance> = BTreeMap::new();

		for tx in transactions {
			let value = tx.value();

			let source = self.stage(&mut staged, tx.source_name())?;
			source
				.entry(tx.currency_name().to_vec())
				.or_insert_with(Amount::default)
				.sub(value);

			let target = self.stage(&mut staged, tx.target_name())?;
			target
				.entry(tx.currency_name().to_vec())
				.or_insert_with(Amount::default)
				.add(value);
		}

		let mut batch = self.db.batch();
		for (account, balances) in &staged {
			batch.put_ser(account, balances)?;
		}
		batch.commit().map_err(|e| {
			error!("balance batch write failed: {}", e);
			Error::from(e)
		})
	}

	/// Balance of one account in one currency; zero when either the
	/// account or the currency is unknown.
	pub fn get_balance(&self, account: &[u8], currency: &[u8]) -> Result<Amount, Error> {
		let balances = self.load(account)?;
		Ok(balances.get(currency).copied().unwrap_or_default())
	}

	/// Ensures an account's stored balances are loaded into the staging
	/// map, then hands the staged entry back.
	fn stage<'a>(
		&self,
		staged: &'a mut BTreeMap<Vec<u8>, AccountBalance>,
		account: &[u8],
	) -> Result<&'a mut AccountBalance, Error> {
		if !staged.contains_key(account) {
			let loaded = self.load(account)?;
			staged.insert(account.to_vec(), loaded);
		}
		Ok(staged.get_mut(account).expect("staged just above"))
	}

	/// Reads an account's balance record; a missing account is an
	/// empty record, a record that fails to decode is corruption.
	fn load(&self, account: &[u8]) -> Result<AccountBalance, Error> {
		let value = self.db.get(account).map_err(|e| {
			error!(
				"balance read failed for account key {}: {}",
				to_hex(account),
				e
			);
			Error::from(e)
		})?;
		match value {
			Some(value) => ser::deserialize(&value).map_err(|e| {
				error!(
					"invalid record in balance database under key {}: {}",
					to_hex(account),
					e
				);
				Error::from(ErrorKind::Corrupt(to_hex(account)))
			}),
			None => Ok(AccountBalance::new()),
		}
	}
}
