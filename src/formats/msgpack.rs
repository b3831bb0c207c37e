//! MessagePack, decoded and encoded by hand.
//!
//! The decoder reads exactly one object and leaves the read position right
//! after it, so trailing bytes reach the strict remainder check. That is
//! what keeps auto-detection honest: a JSON document starting with `{` is a
//! valid one-byte MessagePack fixint followed by garbage.
//!
//! Dates and times are written as ISO-8601 strings. The timestamp extension
//! (type `-1`) is understood on input and decodes to a UTC datetime.

use crate::datetime::Timestamp;
use crate::{Codec, CodecDescriptor, Error, Input, Mapping, Result, Value};
use chrono::{DateTime, FixedOffset};
use num_bigint::BigInt;
use std::fmt;

const ID: &str = "msgpack";

/// Containers nested deeper than this are rejected.
const MAX_DEPTH: usize = 512;

const TIMESTAMP_EXT: i8 = -1;

/// Why a MessagePack object could not be read.
#[derive(Debug)]
enum MsgPackError {
    UnexpectedEof,
    InvalidByte(usize),
    InvalidUtf8(usize),
    InvalidTimestamp,
    UnsupportedExtension(i8),
    TooDeep,
}

impl fmt::Display for MsgPackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MsgPackError::UnexpectedEof => f.write_str("unexpected end of input"),
            MsgPackError::InvalidByte(at) => write!(f, "invalid MessagePack byte at offset {}", at),
            MsgPackError::InvalidUtf8(at) => write!(f, "invalid UTF-8 in string at offset {}", at),
            MsgPackError::InvalidTimestamp => f.write_str("invalid timestamp extension"),
            MsgPackError::UnsupportedExtension(kind) => {
                write!(f, "unsupported extension type {}", kind)
            }
            MsgPackError::TooDeep => write!(f, "nesting deeper than {} levels", MAX_DEPTH),
        }
    }
}

impl From<MsgPackError> for Error {
    fn from(err: MsgPackError) -> Self {
        Error::decode(ID, err)
    }
}

pub struct MsgPackCodec {
    descriptor: CodecDescriptor,
}

impl Default for MsgPackCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MsgPackCodec {
    #[must_use]
    pub fn new() -> Self {
        MsgPackCodec {
            descriptor: CodecDescriptor::new(ID, "MessagePack")
                .with_extensions(&[".msgpack", ".mpk"])
                .binary(),
        }
    }
}

impl Codec for MsgPackCodec {
    fn descriptor(&self) -> &CodecDescriptor {
        &self.descriptor
    }

    /// A lone printable byte is a valid fixint, but as a file it is text.
    fn check_detectable(&self, bytes: &[u8]) -> Result<()> {
        match bytes {
            [byte] if byte.is_ascii_graphic() || byte.is_ascii_whitespace() => Err(Error::decode(
                ID,
                "single text byte is not a MessagePack document",
            )),
            _ => Ok(()),
        }
    }

    fn decode(&self, input: &mut Input<'_>) -> Result<Value> {
        let mut decoder = Decoder { input, depth: 0 };
        Ok(decoder.read_any()?)
    }

    fn encode(&self, value: &Value, _pretty: bool) -> Result<Vec<u8>> {
        let mut encoder = Encoder { out: Vec::new() };
        encoder.write_any(value)?;
        Ok(encoder.out)
    }
}

struct Decoder<'i, 'a> {
    input: &'i mut Input<'a>,
    depth: usize,
}

impl<'a> Decoder<'_, 'a> {
    fn bytes(&mut self, n: usize) -> std::result::Result<&'a [u8], MsgPackError> {
        if self.input.remaining().len() < n {
            return Err(MsgPackError::UnexpectedEof);
        }
        Ok(self.input.take(n))
    }

    fn array<const N: usize>(&mut self) -> std::result::Result<[u8; N], MsgPackError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> std::result::Result<u8, MsgPackError> {
        Ok(self.array::<1>()?[0])
    }

    fn u16(&mut self) -> std::result::Result<u16, MsgPackError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    fn u32(&mut self) -> std::result::Result<u32, MsgPackError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    fn u64(&mut self) -> std::result::Result<u64, MsgPackError> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    fn read_any(&mut self) -> std::result::Result<Value, MsgPackError> {
        let at = self.input.position();
        let byte = self.u8()?;
        Ok(match byte {
            0x00..=0x7f => Value::Integer(i64::from(byte)),
            0x80..=0x8f => self.read_map(usize::from(byte & 0x0f))?,
            0x90..=0x9f => self.read_seq(usize::from(byte & 0x0f))?,
            0xa0..=0xbf => self.read_str(usize::from(byte & 0x1f))?,
            0xc0 => Value::Null,
            0xc2 => Value::Bool(false),
            0xc3 => Value::Bool(true),
            0xc4 => {
                let n = usize::from(self.u8()?);
                Value::Bytes(self.bytes(n)?.to_vec())
            }
            0xc5 => {
                let n = usize::from(self.u16()?);
                Value::Bytes(self.bytes(n)?.to_vec())
            }
            0xc6 => {
                let n = self.u32()? as usize;
                Value::Bytes(self.bytes(n)?.to_vec())
            }
            0xc7 => {
                let n = usize::from(self.u8()?);
                self.read_ext(n)?
            }
            0xc8 => {
                let n = usize::from(self.u16()?);
                self.read_ext(n)?
            }
            0xc9 => {
                let n = self.u32()? as usize;
                self.read_ext(n)?
            }
            0xca => Value::Float(f64::from(f32::from_bits(self.u32()?))),
            0xcb => Value::Float(f64::from_bits(self.u64()?)),
            0xcc => Value::Integer(i64::from(self.u8()?)),
            0xcd => Value::Integer(i64::from(self.u16()?)),
            0xce => Value::Integer(i64::from(self.u32()?)),
            0xcf => Value::from(self.u64()?),
            0xd0 => Value::Integer(i64::from(self.u8()? as i8)),
            0xd1 => Value::Integer(i64::from(self.u16()? as i16)),
            0xd2 => Value::Integer(i64::from(self.u32()? as i32)),
            0xd3 => Value::Integer(self.u64()? as i64),
            0xd4 => self.read_ext(1)?,
            0xd5 => self.read_ext(2)?,
            0xd6 => self.read_ext(4)?,
            0xd7 => self.read_ext(8)?,
            0xd8 => self.read_ext(16)?,
            0xd9 => {
                let n = usize::from(self.u8()?);
                self.read_str(n)?
            }
            0xda => {
                let n = usize::from(self.u16()?);
                self.read_str(n)?
            }
            0xdb => {
                let n = self.u32()? as usize;
                self.read_str(n)?
            }
            0xdc => {
                let n = usize::from(self.u16()?);
                self.read_seq(n)?
            }
            0xdd => {
                let n = self.u32()? as usize;
                self.read_seq(n)?
            }
            0xde => {
                let n = usize::from(self.u16()?);
                self.read_map(n)?
            }
            0xdf => {
                let n = self.u32()? as usize;
                self.read_map(n)?
            }
            0xe0..=0xff => Value::Integer(i64::from(byte as i8)),
            0xc1 => return Err(MsgPackError::InvalidByte(at)),
        })
    }

    fn read_str(&mut self, n: usize) -> std::result::Result<Value, MsgPackError> {
        let at = self.input.position();
        let bytes = self.bytes(n)?;
        std::str::from_utf8(bytes)
            .map(|s| Value::Text(s.to_string()))
            .map_err(|_| MsgPackError::InvalidUtf8(at))
    }

    fn descend(&mut self) -> std::result::Result<(), MsgPackError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(MsgPackError::TooDeep);
        }
        Ok(())
    }

    fn read_seq(&mut self, n: usize) -> std::result::Result<Value, MsgPackError> {
        self.descend()?;
        // every element takes at least one byte
        let mut items = Vec::with_capacity(n.min(self.input.remaining().len()));
        for _ in 0..n {
            items.push(self.read_any()?);
        }
        self.depth -= 1;
        Ok(Value::Sequence(items))
    }

    fn read_map(&mut self, n: usize) -> std::result::Result<Value, MsgPackError> {
        self.descend()?;
        let mut map = Mapping::with_capacity(n.min(self.input.remaining().len() / 2));
        for _ in 0..n {
            let key = self.read_any()?;
            let value = self.read_any()?;
            map.push(key, value);
        }
        self.depth -= 1;
        Ok(Value::Mapping(map))
    }

    fn read_ext(&mut self, n: usize) -> std::result::Result<Value, MsgPackError> {
        let kind = self.u8()? as i8;
        let data = self.bytes(n)?;
        if kind != TIMESTAMP_EXT {
            return Err(MsgPackError::UnsupportedExtension(kind));
        }
        let (seconds, nanos) = match data.len() {
            4 => (i64::from(u32::from_be_bytes([data[0], data[1], data[2], data[3]])), 0),
            8 => {
                let word = u64::from_be_bytes([
                    data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
                ]);
                ((word & 0x0003_ffff_ffff) as i64, (word >> 34) as u32)
            }
            12 => {
                let nanos = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
                let seconds = i64::from_be_bytes([
                    data[4], data[5], data[6], data[7], data[8], data[9], data[10], data[11],
                ]);
                (seconds, nanos)
            }
            _ => return Err(MsgPackError::InvalidTimestamp),
        };
        let utc = DateTime::from_timestamp(seconds, nanos).ok_or(MsgPackError::InvalidTimestamp)?;
        let offset = FixedOffset::east_opt(0).ok_or(MsgPackError::InvalidTimestamp)?;
        Ok(Value::DateTime(Timestamp::with_offset(utc.naive_utc(), offset)))
    }
}

struct Encoder {
    out: Vec<u8>,
}

impl Encoder {
    fn write_any(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Null => self.out.push(0xc0),
            Value::Bool(b) => self.out.push(if *b { 0xc3 } else { 0xc2 }),
            Value::Integer(i) => self.write_integer(*i),
            Value::BigInt(big) => self.write_big_int(big)?,
            Value::Float(f) => {
                self.out.push(0xcb);
                self.out.extend_from_slice(&f.to_bits().to_be_bytes());
            }
            Value::Text(s) => self.write_str(s)?,
            Value::Bytes(bytes) => self.write_bin(bytes)?,
            Value::Date(_) | Value::Time(_) | Value::DateTime(_) => {
                self.write_str(&value.to_string())?;
            }
            Value::Sequence(items) => {
                self.write_header(items.len(), (0x90, 0x0f), 0xdc, 0xdd)?;
                for item in items {
                    self.write_any(item)?;
                }
            }
            Value::Mapping(map) => {
                self.write_header(map.len(), (0x80, 0x0f), 0xde, 0xdf)?;
                for (key, item) in map {
                    self.write_any(key)?;
                    self.write_any(item)?;
                }
            }
        }
        Ok(())
    }

    fn write_integer(&mut self, i: i64) {
        if i >= 0 {
            self.write_unsigned(i as u64);
        } else if i >= -32 {
            self.out.push(i as i8 as u8);
        } else if i >= i64::from(i8::MIN) {
            self.out.push(0xd0);
            self.out.push(i as i8 as u8);
        } else if i >= i64::from(i16::MIN) {
            self.out.push(0xd1);
            self.out.extend_from_slice(&(i as i16).to_be_bytes());
        } else if i >= i64::from(i32::MIN) {
            self.out.push(0xd2);
            self.out.extend_from_slice(&(i as i32).to_be_bytes());
        } else {
            self.out.push(0xd3);
            self.out.extend_from_slice(&i.to_be_bytes());
        }
    }

    fn write_unsigned(&mut self, u: u64) {
        if u <= 0x7f {
            self.out.push(u as u8);
        } else if u <= u64::from(u8::MAX) {
            self.out.push(0xcc);
            self.out.push(u as u8);
        } else if u <= u64::from(u16::MAX) {
            self.out.push(0xcd);
            self.out.extend_from_slice(&(u as u16).to_be_bytes());
        } else if u <= u64::from(u32::MAX) {
            self.out.push(0xce);
            self.out.extend_from_slice(&(u as u32).to_be_bytes());
        } else {
            self.out.push(0xcf);
            self.out.extend_from_slice(&u.to_be_bytes());
        }
    }

    fn write_big_int(&mut self, big: &BigInt) -> Result<()> {
        if let Ok(i) = i64::try_from(big) {
            self.write_integer(i);
        } else if let Ok(u) = u64::try_from(big) {
            self.write_unsigned(u);
        } else {
            return Err(Error::encode(ID, format!("{} exceeds 64 bits", big)));
        }
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<()> {
        let len = s.len();
        if len <= 31 {
            self.out.push(0xa0 | len as u8);
        } else if len <= usize::from(u8::MAX) {
            self.out.push(0xd9);
            self.out.push(len as u8);
        } else {
            self.write_len(len, 0xda, 0xdb)?;
        }
        self.out.extend_from_slice(s.as_bytes());
        Ok(())
    }

    fn write_bin(&mut self, bytes: &[u8]) -> Result<()> {
        let len = bytes.len();
        if len <= usize::from(u8::MAX) {
            self.out.push(0xc4);
            self.out.push(len as u8);
        } else {
            self.write_len(len, 0xc5, 0xc6)?;
        }
        self.out.extend_from_slice(bytes);
        Ok(())
    }

    /// Header of an array or map: fixed form, then 16 and 32 bit lengths.
    fn write_header(&mut self, len: usize, fixed: (u8, usize), marker16: u8, marker32: u8) -> Result<()> {
        let (fix_marker, fix_max) = fixed;
        if len <= fix_max {
            self.out.push(fix_marker | len as u8);
            Ok(())
        } else {
            self.write_len(len, marker16, marker32)
        }
    }

    fn write_len(&mut self, len: usize, marker16: u8, marker32: u8) -> Result<()> {
        if let Ok(short) = u16::try_from(len) {
            self.out.push(marker16);
            self.out.extend_from_slice(&short.to_be_bytes());
        } else if let Ok(long) = u32::try_from(len) {
            self.out.push(marker32);
            self.out.extend_from_slice(&long.to_be_bytes());
        } else {
            return Err(Error::encode(ID, format!("length {} exceeds 32 bits", len)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    fn encode(value: &Value) -> Vec<u8> {
        MsgPackCodec::new().encode(value, false).unwrap()
    }

    fn decode(bytes: &[u8]) -> Value {
        MsgPackCodec::new().decode_slice(bytes, true).unwrap()
    }

    #[test]
    fn test_encode_smallest_forms() {
        assert_eq!(encode(&value!(null)), [0xc0]);
        assert_eq!(encode(&value!(true)), [0xc3]);
        assert_eq!(encode(&value!(5)), [0x05]);
        assert_eq!(encode(&value!(-1)), [0xff]);
        assert_eq!(encode(&value!(-33)), [0xd0, 0xdf]);
        assert_eq!(encode(&value!(200)), [0xcc, 0xc8]);
        assert_eq!(encode(&value!(65536)), [0xce, 0x00, 0x01, 0x00, 0x00]);
        assert_eq!(encode(&value!("a")), [0xa1, b'a']);
        assert_eq!(encode(&value!({"a": [1]})), [0x81, 0xa1, b'a', 0x91, 0x01]);
    }

    #[test]
    fn test_round_trip() {
        let mut map = Mapping::new();
        map.push(1, value!("int key"));
        map.push(
            "list",
            Value::Sequence(vec![
                Value::Float(1.5),
                Value::Integer(-100_000),
                Value::from("x".repeat(40)),
                Value::Null,
            ]),
        );
        map.push("bytes", Value::Bytes(vec![0, 1, 2]));
        map.push("big", Value::from(u64::MAX));
        let v = Value::Mapping(map);
        assert_eq!(decode(&encode(&v)), v);

        let long: Vec<Value> = (0..20).map(Value::from).collect();
        let v = Value::Sequence(long);
        assert_eq!(decode(&encode(&v)), v);
    }

    #[test]
    fn test_float32() {
        assert_eq!(decode(&[0xca, 0x3f, 0xc0, 0x00, 0x00]), Value::Float(1.5));
    }

    #[test]
    fn test_dates_written_as_text() {
        let date = Value::Date(chrono::NaiveDate::from_ymd_opt(2020, 2, 20).unwrap());
        assert_eq!(decode(&encode(&date)), value!("2020-02-20"));
    }

    #[test]
    fn test_timestamp_extension() {
        // fixext 4, type -1, 1 second after the epoch
        let v = decode(&[0xd6, 0xff, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(v.to_string(), "1970-01-01T00:00:01+00:00");
    }

    #[test]
    fn test_decode_leaves_remainder() {
        let mut input = Input::new(b"{\"a\":1}");
        assert_eq!(MsgPackCodec::new().decode(&mut input).unwrap(), value!(123));
        assert_eq!(input.position(), 1);
    }

    #[test]
    fn test_decode_errors() {
        let codec = MsgPackCodec::new();
        for bytes in [&[0xc1][..], &[0x92, 0x01], &[0xa2, 0xff, 0xfe], &[0xd4, 0x05, 0x00], &[]] {
            assert!(
                matches!(codec.decode_slice(bytes, true), Err(Error::Decode { .. })),
                "{bytes:?}"
            );
        }
    }

    #[test]
    fn test_single_text_byte_not_detectable() {
        let codec = MsgPackCodec::new();
        assert!(matches!(codec.check_detectable(b"x"), Err(Error::Decode { .. })));
        assert!(codec.check_detectable(&[0x2a, 0x01]).is_ok());
        assert!(codec.check_detectable(&[0xc0]).is_ok());
        // still a fixint when the format is named
        assert_eq!(codec.decode_slice(b"x", true).unwrap(), Value::Integer(120));
    }

    #[test]
    fn test_depth_limit() {
        let mut bytes = vec![0x91; MAX_DEPTH + 1];
        bytes.push(0xc0);
        assert!(matches!(
            MsgPackCodec::new().decode_slice(&bytes, true),
            Err(Error::Decode { .. })
        ));
    }
}
