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

//! Fixed-point money arithmetic. Balances carry eighteen decimal
//! digits of fraction next to a signed integer part, and every
//! mutation of the balance index goes through the add/sub operations
//! defined here.

use crate::ser::{self, Readable, Reader, Writeable, Writer};
use std::fmt;

/// Largest representable fraction: eighteen nines. A fraction of
/// `AMOUNT_MAX_FRACTION + 1` carries into the integer part.
pub const AMOUNT_MAX_FRACTION: u64 = 999_999_999_999_999_999;

/// A signed fixed-point amount, `integral + fraction / 10^18`.
///
/// Negative values keep a non-negative fraction complement: -0.01 is
/// `(-1, 990_000_000_000_000_000)` and a pure integer -2 is `(-2, 0)`.
/// The integer part wraps on overflow; callers operating near the i32
/// range keep their own guards.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Amount {
	/// Signed integer part
	pub integral: i32,
	/// Decimal fraction, kept within `AMOUNT_MAX_FRACTION`
	pub fraction: u64,
}

impl Amount {
	/// Builds an amount from its two fixed-point fields.
	pub fn new(integral: i32, fraction: u64) -> Amount {
		Amount { integral, fraction }
	}

	/// Adds `other` to this amount, carrying fraction overflow into the
	/// integer part. Fractions beyond `AMOUNT_MAX_FRACTION` are clamped
	/// before the operation.
	pub fn add(&mut self, other: Amount) {
		let fs = other.fraction.min(AMOUNT_MAX_FRACTION);
		self.fraction = self.fraction.min(AMOUNT_MAX_FRACTION);

		self.fraction += fs;
		self.integral = self.integral.wrapping_add(other.integral);
		if self.fraction > AMOUNT_MAX_FRACTION {
			self.fraction -= AMOUNT_MAX_FRACTION + 1;
			self.integral = self.integral.wrapping_add(1);
		}
	}

	/// Subtracts `other` from this amount, borrowing from the integer
	/// part when the fraction underflows. Same clamping rules as `add`.
	pub fn sub(&mut self, other: Amount) {
		let fs = other.fraction.min(AMOUNT_MAX_FRACTION);
		self.fraction = self.fraction.min(AMOUNT_MAX_FRACTION);

		self.integral = self.integral.wrapping_sub(other.integral);
		if fs > self.fraction {
			self.fraction += AMOUNT_MAX_FRACTION + 1;
			self.integral = self.integral.wrapping_sub(1);
		}
		self.fraction -= fs;
	}

	/// Renders the amount as a plain decimal string, trimming trailing
	/// fractional zeros but keeping at least `min_digits` of them.
	pub fn to_decimal(&self, min_digits: usize) -> String {
		let mut integral = self.integral;
		let mut fraction = self.fraction;
		let mut out = String::with_capacity(32);

		if integral < 0 && fraction != 0 {
			// shift to a magnitude with non-negative fraction
			fraction = (AMOUNT_MAX_FRACTION + 1).wrapping_sub(fraction);
			integral = -(integral + 1);
			out.push('-');
		}
		out.push_str(&integral.to_string());

		if fraction != 0 || min_digits > 0 {
			out.push('.');
			let digits = format!("{:018}", fraction);
			let mut keep = digits.len();
			while keep > min_digits && digits.as_bytes()[keep - 1] == b'0' {
				keep -= 1;
			}
			out.push_str(&digits[..keep]);
		}
		out
	}
}

impl fmt::Display for Amount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.to_decimal(0))
	}
}

impl Writeable for Amount {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ser::Error> {
		writer.write_i32(self.integral)?;
		writer.write_u64(self.fraction)
	}
}

impl Readable for Amount {
	fn read<R: Reader>(reader: &mut R) -> Result<Amount, ser::Error> {
		let integral = reader.read_i32()?;
		let fraction = reader.read_u64()?;
		Ok(Amount { integral, fraction })
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::ser;

	#[test]
	fn renders_canonical_decimal() {
		assert_eq!(Amount::new(2, 10_000_000_000_000_000).to_decimal(0), "2.01");
		assert_eq!(
			Amount::new(-2, 10_000_000_000_000_000).to_decimal(0),
			"-1.99"
		);
		assert_eq!(Amount::new(0, 0).to_decimal(2), "0.00");
		assert_eq!(Amount::new(2, 100).to_decimal(0), "2.0000000000000001");
		assert_eq!(Amount::new(-2, 0).to_decimal(0), "-2");
		assert_eq!(Amount::new(0, 0).to_decimal(0), "0");
		assert_eq!(
			Amount::new(0, 5_000_000_000_000_000).to_decimal(0),
			"0.005"
		);
	}

	#[test]
	fn add_carries_fraction_overflow() {
		let mut a = Amount::new(1, 990_000_000_000_000_000);
		a.add(Amount::new(0, 20_000_000_000_000_000));
		assert_eq!(a, Amount::new(2, 10_000_000_000_000_000));
	}

	#[test]
	fn sub_borrows_from_integer_part() {
		let mut a = Amount::new(0, 0);
		a.sub(Amount::new(100, 10_000_000_000_000_000));
		// -100.01 as complement form
		assert_eq!(a, Amount::new(-101, 990_000_000_000_000_000));
		assert_eq!(a.to_decimal(0), "-100.01");
	}

	#[test]
	fn add_and_sub_are_inverse() {
		let cases = [
			(Amount::new(0, 0), Amount::new(3, 141_592_653_589_793_238)),
			(Amount::new(-7, 5), Amount::new(7, 999_999_999_999_999_999)),
			(Amount::new(42, 999_999_999_999_999_999), Amount::new(0, 1)),
		];
		for &(start, delta) in cases.iter() {
			let mut a = start;
			a.add(delta);
			a.sub(delta);
			assert_eq!(a, start);
		}
	}

	#[test]
	fn out_of_range_fractions_are_clamped() {
		let mut a = Amount::new(0, u64::max_value());
		a.add(Amount::new(1, 0));
		assert_eq!(a, Amount::new(1, AMOUNT_MAX_FRACTION));
	}

	#[test]
	fn integer_part_wraps_like_the_storage_format() {
		let mut a = Amount::new(i32::max_value(), 0);
		a.add(Amount::new(1, 0));
		assert_eq!(a.integral, i32::min_value());
	}

	#[test]
	fn encodes_as_twelve_bytes() {
		let a = Amount::new(-5, 42);
		let data = ser::ser_vec(&a).unwrap();
		assert_eq!(data.len(), 12);
		let decoded: Amount = ser::deserialize(&data).unwrap();
		assert_eq!(decoded, a);
	}
}
