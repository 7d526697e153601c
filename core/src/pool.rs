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

//! Pool records. A pool is one header followed by a packed run of
//! transactions, stored as a single value under its caller-chosen hash
//! and linked to its predecessor by the previous-pool hash.

use crate::ser::{self, Readable, Reader, Writeable, Writer};
use crate::transaction::{Transaction, TRANSACTION_SIZE};

/// Header preceding the packed transactions of a stored pool.
///
/// Wire order is exactly: previous-pool hash (16-bit length prefixed),
/// time, sequence, transaction count.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct PoolHeader {
	/// Hash of the previous pool in the chain, empty for a chain root
	pub prev_pool_hash: Vec<u8>,
	/// Caller-supplied creation time, seconds since epoch
	pub time: u64,
	/// Caller-assigned ordinal
	pub sequence: u64,
	/// Number of transactions in the trailing block
	pub transaction_count: u64,
}

impl PoolHeader {
	/// Encoded byte length: length prefix, previous hash, three u64
	/// fields.
	pub fn encoded_len(&self) -> usize {
		2 + self.prev_pool_hash.len() + 24
	}
}

impl Writeable for PoolHeader {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_bytes(&self.prev_pool_hash)?;
		writer.write_u64(self.time)?;
		writer.write_u64(self.sequence)?;
		writer.write_u64(self.transaction_count)
	}
}

impl Readable for PoolHeader {
	fn read<R: Reader>(reader: &mut R) -> Result<PoolHeader, ser::Error> {
		let prev_pool_hash = reader.read_bytes()?;
		let time = reader.read_u64()?;
		let sequence = reader.read_u64()?;
		let transaction_count = reader.read_u64()?;
		Ok(PoolHeader {
			prev_pool_hash,
			time,
			sequence,
			transaction_count,
		})
	}
}

/// A fully decoded pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
	/// The pool header
	pub header: PoolHeader,
	/// The transactions, in insertion order
	pub transactions: Vec<Transaction>,
}

impl Writeable for Pool {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		self.header.write(writer)?;
		for tx in &self.transactions {
			tx.write(writer)?;
		}
		Ok(())
	}
}

impl Readable for Pool {
	/// Reading validates the frozen sizing invariants: the body must be
	/// an exact multiple of the transaction record size and agree with
	/// the header count.
	fn read<R: Reader>(reader: &mut R) -> Result<Pool, ser::Error> {
		let header = PoolHeader::read(reader)?;
		let body = reader.remaining();
		if body % TRANSACTION_SIZE != 0 {
			return Err(ser::Error::CorruptedData);
		}
		let count = (body / TRANSACTION_SIZE) as u64;
		if count != header.transaction_count {
			return Err(ser::Error::CorruptedData);
		}
		let mut transactions = Vec::with_capacity(count as usize);
		for _ in 0..count {
			transactions.push(Transaction::read(reader)?);
		}
		Ok(Pool {
			header,
			transactions,
		})
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ser;
	use uuid::Uuid;

	fn header(prev: &[u8]) -> PoolHeader {
		PoolHeader {
			prev_pool_hash: prev.to_vec(),
			time: 1_500_000_000,
			sequence: 7,
			transaction_count: 0,
		}
	}

	#[test]
	fn header_round_trips_at_fixed_length() {
		let h = header(b"\x01\x02\x03\x04\x05\x06\x07\x08");
		let data = ser::ser_vec(&h).unwrap();
		assert_eq!(data.len(), h.encoded_len());
		assert_eq!(data.len(), 2 + 8 + 24);
		let decoded: PoolHeader = ser::deserialize(&data).unwrap();
		assert_eq!(decoded, h);

		let root = header(b"");
		let data = ser::ser_vec(&root).unwrap();
		assert_eq!(data.len(), 26);
		let decoded: PoolHeader = ser::deserialize(&data).unwrap();
		assert_eq!(decoded, root);
	}

	#[test]
	fn pool_round_trips() {
		let tx = Transaction::new(1, Uuid::new_v4(), "a", "b", 5, 0, "CS");
		let pool = Pool {
			header: PoolHeader {
				prev_pool_hash: vec![],
				time: 42,
				sequence: 1,
				transaction_count: 1,
			},
			transactions: vec![tx],
		};
		let data = ser::ser_vec(&pool).unwrap();
		assert_eq!(data.len(), 26 + TRANSACTION_SIZE);
		let decoded: Pool = ser::deserialize(&data).unwrap();
		assert_eq!(decoded, pool);
	}

	#[test]
	fn missized_body_is_rejected() {
		let mut data = ser::ser_vec(&header(b"")).unwrap();
		data.extend_from_slice(&[0u8; TRANSACTION_SIZE - 1]);
		assert!(ser::deserialize::<Pool>(&data).is_err());
	}

	#[test]
	fn count_mismatch_is_rejected() {
		// header claims two transactions, body carries one
		let mut h = header(b"");
		h.transaction_count = 2;
		let mut data = ser::ser_vec(&h).unwrap();
		data.extend_from_slice(&[0u8; TRANSACTION_SIZE]);
		assert!(ser::deserialize::<Pool>(&data).is_err());
	}

	#[test]
	fn truncated_header_is_rejected() {
		let data = ser::ser_vec(&header(b"\x01\x02")).unwrap();
		assert!(ser::deserialize::<PoolHeader>(&data[..data.len() - 3]).is_err());
	}
}
