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

//! Serialization and deserialization layer specialized for the binary
//! store formats: little-endian, tight, no framing beyond 16-bit length
//! prefixes. Ensures consistency and safety.
//!
//! To use it simply implement `Writeable` or `Readable` and then use the
//! `serialize` or `deserialize` functions on them as appropriate.

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::cmp;
use std::collections::BTreeMap;
use std::io;

/// Longest byte string representable behind a 16-bit length prefix.
/// Anything beyond this is silently truncated on write.
pub const MAX_BYTES_LEN: usize = 65535;

/// Possible errors deriving from serializing or deserializing.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum Error {
	/// Wraps an io error produced when writing to an underlying sink
	#[fail(display = "io error: {}", _0)]
	IOErr(String),
	/// Input ended before a value could be fully read
	#[fail(display = "unexpected end of input")]
	UnexpectedEof,
	/// A declared length points past the end of the input
	#[fail(display = "declared length {} exceeds remaining input", _0)]
	TooLargeReadErr(u64),
	/// Data wasn't in a consumable format
	#[fail(display = "corrupted data")]
	CorruptedData,
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error::IOErr(format!("{}", e))
	}
}

/// Implementations defined how different numbers and binary structures
/// are written to an underlying stream or container (depending on
/// implementation).
pub trait Writer {
	/// Writes raw bytes as-is, with no length prefix. The reader is
	/// expected to know the actual length on read.
	fn write_fixed_bytes(&mut self, bytes: &[u8]) -> Result<(), Error>;

	/// Writes a u8 as bytes
	fn write_u8(&mut self, n: u8) -> Result<(), Error> {
		self.write_fixed_bytes(&[n])
	}

	/// Writes a u16 as little-endian bytes
	fn write_u16(&mut self, n: u16) -> Result<(), Error> {
		let mut buf = [0; 2];
		LittleEndian::write_u16(&mut buf, n);
		self.write_fixed_bytes(&buf)
	}

	/// Writes a u32 as little-endian bytes
	fn write_u32(&mut self, n: u32) -> Result<(), Error> {
		let mut buf = [0; 4];
		LittleEndian::write_u32(&mut buf, n);
		self.write_fixed_bytes(&buf)
	}

	/// Writes a u64 as little-endian bytes
	fn write_u64(&mut self, n: u64) -> Result<(), Error> {
		let mut buf = [0; 8];
		LittleEndian::write_u64(&mut buf, n);
		self.write_fixed_bytes(&buf)
	}

	/// Writes an i32 as little-endian bytes
	fn write_i32(&mut self, n: i32) -> Result<(), Error> {
		let mut buf = [0; 4];
		LittleEndian::write_i32(&mut buf, n);
		self.write_fixed_bytes(&buf)
	}

	/// Writes an i64 as little-endian bytes
	fn write_i64(&mut self, n: i64) -> Result<(), Error> {
		let mut buf = [0; 8];
		LittleEndian::write_i64(&mut buf, n);
		self.write_fixed_bytes(&buf)
	}

	/// Writes a variable length byte string, prefixed by its 16-bit
	/// length. Data beyond `MAX_BYTES_LEN` is silently dropped, so
	/// callers must keep hashes and account names within the prefix.
	fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
		let len = cmp::min(bytes.len(), MAX_BYTES_LEN);
		self.write_u16(len as u16)?;
		self.write_fixed_bytes(&bytes[..len])
	}
}

/// Implementations defined how different numbers and binary structures
/// are read from an underlying byte source, consuming the stream and
/// advancing. All reads fail cleanly when the remaining input is short.
pub trait Reader {
	/// Read a u8 from the underlying source
	fn read_u8(&mut self) -> Result<u8, Error>;
	/// Read a little-endian u16
	fn read_u16(&mut self) -> Result<u16, Error>;
	/// Read a little-endian u32
	fn read_u32(&mut self) -> Result<u32, Error>;
	/// Read a little-endian u64
	fn read_u64(&mut self) -> Result<u64, Error>;
	/// Read a little-endian i32
	fn read_i32(&mut self) -> Result<i32, Error>;
	/// Read a little-endian i64
	fn read_i64(&mut self) -> Result<i64, Error>;
	/// Read a byte string prefixed by its 16-bit length
	fn read_bytes(&mut self) -> Result<Vec<u8>, Error>;
	/// Read a fixed number of bytes from the underlying source
	fn read_fixed_bytes(&mut self, length: usize) -> Result<Vec<u8>, Error>;
	/// Number of bytes left to consume
	fn remaining(&self) -> usize;
}

/// Trait that every type that can be serialized as binary must
/// implement. Writes directly to a Writer.
pub trait Writeable {
	/// Write the data held by this Writeable to the provided writer
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), Error>;
}

/// Trait that every type that can be deserialized from binary must
/// implement. Reads directly from a Reader.
pub trait Readable: Sized {
	/// Reads the data necessary to this Readable from the provided reader
	fn read<R: Reader>(reader: &mut R) -> Result<Self, Error>;
}

/// Deserializes a Readable from a byte slice, the form every stored
/// record arrives in.
pub fn deserialize<T: Readable>(source: &[u8]) -> Result<T, Error> {
	let mut reader = BinReader::new(source);
	T::read(&mut reader)
}

/// Serializes a Writeable into any std::io::Write implementation.
pub fn serialize<W: Writeable>(sink: &mut dyn io::Write, thing: &W) -> Result<(), Error> {
	let mut writer = BinWriter::new(sink);
	thing.write(&mut writer)
}

/// Utility function to serialize a writeable directly in memory using a
/// Vec<u8>.
pub fn ser_vec<W: Writeable>(thing: &W) -> Result<Vec<u8>, Error> {
	let mut vec = Vec::new();
	serialize(&mut vec, thing)?;
	Ok(vec)
}

/// Utility wrapper for an underlying byte slice, consumed from the
/// front. Defines higher level methods to read numbers, byte strings
/// and maps.
pub struct BinReader<'a> {
	source: &'a [u8],
}

impl<'a> BinReader<'a> {
	/// Builds a reader over the provided slice.
	pub fn new(source: &'a [u8]) -> BinReader<'a> {
		BinReader { source }
	}
}

impl<'a> Reader for BinReader<'a> {
	fn read_u8(&mut self) -> Result<u8, Error> {
		self.source.read_u8().map_err(|_| Error::UnexpectedEof)
	}
	fn read_u16(&mut self) -> Result<u16, Error> {
		self.source
			.read_u16::<LittleEndian>()
			.map_err(|_| Error::UnexpectedEof)
	}
	fn read_u32(&mut self) -> Result<u32, Error> {
		self.source
			.read_u32::<LittleEndian>()
			.map_err(|_| Error::UnexpectedEof)
	}
	fn read_u64(&mut self) -> Result<u64, Error> {
		self.source
			.read_u64::<LittleEndian>()
			.map_err(|_| Error::UnexpectedEof)
	}
	fn read_i32(&mut self) -> Result<i32, Error> {
		self.source
			.read_i32::<LittleEndian>()
			.map_err(|_| Error::UnexpectedEof)
	}
	fn read_i64(&mut self) -> Result<i64, Error> {
		self.source
			.read_i64::<LittleEndian>()
			.map_err(|_| Error::UnexpectedEof)
	}
	fn read_bytes(&mut self) -> Result<Vec<u8>, Error> {
		let len = self.read_u16()? as usize;
		if len > self.source.len() {
			return Err(Error::TooLargeReadErr(len as u64));
		}
		self.read_fixed_bytes(len)
	}
	fn read_fixed_bytes(&mut self, length: usize) -> Result<Vec<u8>, Error> {
		if length > self.source.len() {
			return Err(Error::UnexpectedEof);
		}
		let (head, tail) = self.source.split_at(length);
		self.source = tail;
		Ok(head.to_vec())
	}
	fn remaining(&self) -> usize {
		self.source.len()
	}
}

/// Utility wrapper for an underlying byte Writer. Defines higher level
/// methods to write numbers, byte strings and maps.
pub struct BinWriter<'a> {
	sink: &'a mut dyn io::Write,
}

impl<'a> BinWriter<'a> {
	/// Wraps a standard Write in a new BinWriter.
	pub fn new(sink: &'a mut dyn io::Write) -> BinWriter<'a> {
		BinWriter { sink }
	}
}

impl<'a> Writer for BinWriter<'a> {
	fn write_fixed_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
		self.sink.write_all(bytes)?;
		Ok(())
	}
}

/// A string-keyed map is emitted as its 16-bit entry count, then each
/// (key, value) pair in the map's natural key order.
impl<T: Writeable> Writeable for BTreeMap<Vec<u8>, T> {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), Error> {
		writer.write_u16(self.len() as u16)?;
		for (key, value) in self {
			writer.write_bytes(key)?;
			value.write(writer)?;
		}
		Ok(())
	}
}

impl<T: Readable> Readable for BTreeMap<Vec<u8>, T> {
	fn read<R: Reader>(reader: &mut R) -> Result<BTreeMap<Vec<u8>, T>, Error> {
		let count = reader.read_u16()? as usize;
		// an entry takes more than one byte, so a count beyond the
		// remaining input cannot possibly be satisfied
		if count > reader.remaining() {
			return Err(Error::TooLargeReadErr(count as u64));
		}
		let mut map = BTreeMap::new();
		for _ in 0..count {
			let key = reader.read_bytes()?;
			let value = T::read(reader)?;
			map.insert(key, value);
		}
		Ok(map)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	impl Writeable for u64 {
		fn write<W: Writer>(&self, writer: &mut W) -> Result<(), Error> {
			writer.write_u64(*self)
		}
	}

	impl Readable for u64 {
		fn read<R: Reader>(reader: &mut R) -> Result<u64, Error> {
			reader.read_u64()
		}
	}

	#[test]
	fn primitives_are_little_endian() {
		let mut vec = vec![];
		{
			let mut writer = BinWriter::new(&mut vec);
			writer.write_u16(0x0102).unwrap();
			writer.write_u32(0x03040506).unwrap();
			writer.write_u64(0x0708090A0B0C0D0E).unwrap();
			writer.write_i32(-1).unwrap();
		}
		assert_eq!(
			vec,
			vec![
				0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 0x0E, 0x0D, 0x0C, 0x0B, 0x0A, 0x09, 0x08,
				0x07, 0xFF, 0xFF, 0xFF, 0xFF,
			]
		);
	}

	#[test]
	fn byte_strings_round_trip() {
		let mut vec = vec![];
		{
			let mut writer = BinWriter::new(&mut vec);
			writer.write_bytes(b"hello").unwrap();
		}
		assert_eq!(&vec[..2], &[5, 0]);
		let mut reader = BinReader::new(&vec);
		assert_eq!(reader.read_bytes().unwrap(), b"hello".to_vec());
		assert_eq!(reader.remaining(), 0);
	}

	#[test]
	fn short_input_fails_cleanly() {
		let mut reader = BinReader::new(&[1, 2, 3]);
		assert_eq!(reader.read_u64(), Err(Error::UnexpectedEof));

		// declared length of 5 with only 2 bytes behind it
		let mut reader = BinReader::new(&[5, 0, 1, 2]);
		assert_eq!(reader.read_bytes(), Err(Error::TooLargeReadErr(5)));
	}

	#[test]
	fn oversize_byte_strings_are_truncated() {
		let big = vec![7u8; MAX_BYTES_LEN + 10];
		let mut vec = vec![];
		{
			let mut writer = BinWriter::new(&mut vec);
			writer.write_bytes(&big).unwrap();
		}
		assert_eq!(vec.len(), 2 + MAX_BYTES_LEN);
		let mut reader = BinReader::new(&vec);
		assert_eq!(reader.read_bytes().unwrap().len(), MAX_BYTES_LEN);
	}

	#[test]
	fn maps_round_trip_in_key_order() {
		let mut map: BTreeMap<Vec<u8>, u64> = BTreeMap::new();
		map.insert(b"zulu".to_vec(), 26);
		map.insert(b"alpha".to_vec(), 1);

		let data = ser_vec(&map).unwrap();
		// count, then "alpha" before "zulu"
		assert_eq!(&data[..2], &[2, 0]);
		assert_eq!(&data[4..9], b"alpha");

		let decoded: BTreeMap<Vec<u8>, u64> = deserialize(&data).unwrap();
		assert_eq!(decoded, map);
	}

	#[test]
	fn map_with_impossible_count_is_rejected() {
		// count 500 declared with 2 bytes of input behind it
		let res: Result<BTreeMap<Vec<u8>, u64>, Error> = deserialize(&[0xF4, 0x01, 0x00, 0x00]);
		assert_eq!(res, Err(Error::TooLargeReadErr(500)));
	}
}
