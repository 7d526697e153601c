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

//! Implements hex-encoding from bytes to string and decoding of strings
//! to bytes. Pool hashes travel as uppercase hex in transaction ids and
//! in every diagnostic line, so the encoder is uppercase and the decoder
//! is tolerant: it simply stops at the first pair that is not hex.

use std::fmt::Write;

/// Encode the provided bytes into an uppercase hex string
pub fn to_hex(bytes: &[u8]) -> String {
	let mut s = String::with_capacity(bytes.len() * 2);
	for byte in bytes {
		write!(&mut s, "{:02X}", byte).expect("Unable to write");
	}
	s
}

/// Decode a hex string into bytes, two digits per byte, accepting both
/// cases. Decoding stops at the first pair containing a non-hex digit
/// and the already-decoded prefix is returned; no error is raised. An
/// odd trailing digit is ignored.
pub fn from_hex(hex_str: &str) -> Vec<u8> {
	let mut res = Vec::with_capacity(hex_str.len() / 2);
	for pair in hex_str.as_bytes().chunks(2) {
		if pair.len() < 2 {
			break;
		}
		match (hex_digit(pair[0]), hex_digit(pair[1])) {
			(Some(hi), Some(lo)) => res.push((hi << 4) | lo),
			_ => break,
		}
	}
	res
}

fn hex_digit(c: u8) -> Option<u8> {
	match c {
		b'0'..=b'9' => Some(c - b'0'),
		b'a'..=b'f' => Some(c - b'a' + 10),
		b'A'..=b'F' => Some(c - b'A' + 10),
		_ => None,
	}
}
