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

//! The transaction record. Its 808-byte packed layout is a frozen
//! storage invariant: the trailing block of every stored pool is
//! validated to be an exact multiple of it.

use crate::amount::Amount;
use crate::ser::{self, Readable, Reader, Writeable, Writer};
use std::fmt;
use uuid::Uuid;

/// Fixed byte length of the account-name and currency fields. The
/// content is NUL-terminated and NUL-padded.
pub const ACCOUNT_LEN: usize = 256;

/// Exact encoded size of a transaction record.
pub const TRANSACTION_SIZE: usize = 808;

// Alignment padding between the integer and fractional amount fields,
// zeroed on write and ignored on read. Part of the frozen layout.
const AMOUNT_PAD: usize = 4;

/// A single value transfer between two named accounts.
///
/// Layout, packed to 808 bytes: hash (u64), inner id (16 bytes),
/// source (256), target (256), amount (u32), 4 pad bytes, amount1
/// (u64), currency (256). All integers little-endian.
#[derive(Clone, PartialEq)]
pub struct Transaction {
	/// Caller-assigned transaction hash
	pub hash: u64,
	/// Caller-assigned inner identifier
	pub inner_id: Uuid,
	/// Source account name
	pub source: [u8; ACCOUNT_LEN],
	/// Target account name
	pub target: [u8; ACCOUNT_LEN],
	/// Unsigned integer part of the transferred amount
	pub amount: u32,
	/// Fractional part of the transferred amount, eighteen decimal
	/// digits
	pub amount1: u64,
	/// Currency name
	pub currency: [u8; ACCOUNT_LEN],
}

impl Transaction {
	/// Builds a transaction between two named accounts. Names and the
	/// currency are truncated if they don't fit the fixed field with
	/// its terminating NUL.
	pub fn new(
		hash: u64,
		inner_id: Uuid,
		source: &str,
		target: &str,
		amount: u32,
		amount1: u64,
		currency: &str,
	) -> Transaction {
		Transaction {
			hash,
			inner_id,
			source: fixed_name(source),
			target: fixed_name(target),
			amount,
			amount1,
			currency: fixed_name(currency),
		}
	}

	/// Source account name, up to the terminating NUL.
	pub fn source_name(&self) -> &[u8] {
		c_str(&self.source)
	}

	/// Target account name, up to the terminating NUL.
	pub fn target_name(&self) -> &[u8] {
		c_str(&self.target)
	}

	/// Currency name, up to the terminating NUL.
	pub fn currency_name(&self) -> &[u8] {
		c_str(&self.currency)
	}

	/// The transferred value as a signed fixed-point amount.
	pub fn value(&self) -> Amount {
		Amount::new(self.amount as i32, self.amount1)
	}

	/// Whether `addr` is the source or the target account of this
	/// transaction.
	pub fn involves(&self, addr: &[u8]) -> bool {
		self.source_name() == addr || self.target_name() == addr
	}
}

impl fmt::Debug for Transaction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Transaction")
			.field("hash", &self.hash)
			.field("inner_id", &self.inner_id)
			.field("source", &String::from_utf8_lossy(self.source_name()))
			.field("target", &String::from_utf8_lossy(self.target_name()))
			.field("amount", &self.amount)
			.field("amount1", &self.amount1)
			.field("currency", &String::from_utf8_lossy(self.currency_name()))
			.finish()
	}
}

impl Writeable for Transaction {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_u64(self.hash)?;
		writer.write_fixed_bytes(self.inner_id.as_bytes())?;
		writer.write_fixed_bytes(&self.source)?;
		writer.write_fixed_bytes(&self.target)?;
		writer.write_u32(self.amount)?;
		writer.write_fixed_bytes(&[0u8; AMOUNT_PAD])?;
		writer.write_u64(self.amount1)?;
		writer.write_fixed_bytes(&self.currency)
	}
}

impl Readable for Transaction {
	fn read<R: Reader>(reader: &mut R) -> Result<Transaction, ser::Error> {
		let hash = reader.read_u64()?;
		let mut id = [0u8; 16];
		id.copy_from_slice(&reader.read_fixed_bytes(16)?);
		let source = read_name(reader)?;
		let target = read_name(reader)?;
		let amount = reader.read_u32()?;
		reader.read_fixed_bytes(AMOUNT_PAD)?;
		let amount1 = reader.read_u64()?;
		let currency = read_name(reader)?;
		Ok(Transaction {
			hash,
			inner_id: Uuid::from_bytes(id),
			source,
			target,
			amount,
			amount1,
			currency,
		})
	}
}

/// Renders a UUID in the braced hyphenated form used by transaction
/// tooling, e.g. `{6ba7b810-9dad-11d1-80b4-00c04fd430c8}`.
pub fn uuid_to_string(uuid: &Uuid) -> String {
	format!("{{{}}}", uuid)
}

fn fixed_name(name: &str) -> [u8; ACCOUNT_LEN] {
	let mut buf = [0u8; ACCOUNT_LEN];
	let len = name.len().min(ACCOUNT_LEN - 1);
	buf[..len].copy_from_slice(&name.as_bytes()[..len]);
	buf
}

fn c_str(buf: &[u8]) -> &[u8] {
	match buf.iter().position(|&b| b == 0) {
		Some(pos) => &buf[..pos],
		None => buf,
	}
}

fn read_name<R: Reader>(reader: &mut R) -> Result<[u8; ACCOUNT_LEN], ser::Error> {
	let bytes = reader.read_fixed_bytes(ACCOUNT_LEN)?;
	let mut buf = [0u8; ACCOUNT_LEN];
	buf.copy_from_slice(&bytes);
	Ok(buf)
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ser;

	fn sample() -> Transaction {
		Transaction::new(
			0xDEADBEEF,
			Uuid::new_v4(),
			"Client 1",
			"Client 2",
			100,
			10_000_000_000_000_000,
			"CS",
		)
	}

	#[test]
	fn encoded_size_is_frozen() {
		let data = ser::ser_vec(&sample()).unwrap();
		assert_eq!(data.len(), TRANSACTION_SIZE);
		// field offsets of the packed layout
		assert_eq!(&data[0..4], &[0xEF, 0xBE, 0xAD, 0xDE]);
		assert_eq!(&data[24..32], b"Client 1");
		assert_eq!(&data[280..288], b"Client 2");
		assert_eq!(&data[536..540], &[100, 0, 0, 0]);
		assert_eq!(&data[540..544], &[0, 0, 0, 0]);
		assert_eq!(&data[552..554], b"CS");
	}

	#[test]
	fn round_trips() {
		let tx = sample();
		let data = ser::ser_vec(&tx).unwrap();
		let decoded: Transaction = ser::deserialize(&data).unwrap();
		assert_eq!(decoded, tx);
	}

	#[test]
	fn name_helpers_stop_at_nul() {
		let tx = sample();
		assert_eq!(tx.source_name(), b"Client 1");
		assert_eq!(tx.currency_name(), b"CS");
		assert!(tx.involves(b"Client 1"));
		assert!(tx.involves(b"Client 2"));
		assert!(!tx.involves(b"Client"));
	}

	#[test]
	fn uuid_renders_with_braces() {
		let uuid = Uuid::parse_str("6ba7b810-9dad-11d1-80b4-00c04fd430c8").unwrap();
		assert_eq!(
			uuid_to_string(&uuid),
			"{6ba7b810-9dad-11d1-80b4-00c04fd430c8}"
		);
	}
}
