//! TOML through the `toml` crate.
//!
//! Documents are whole files, so decoding consumes all input. TOML's native
//! dates, times and offset datetimes map onto the value model's temporal
//! leaves. A document must be a table: other roots are stored under the
//! `DEFAULT` key and unwrapped again on decode.

use crate::codec::{unwrap_root, wrap_root};
use crate::datetime::Timestamp;
use crate::{Codec, CodecDescriptor, Error, Input, Mapping, NormalizationPolicy, Result, Value};
use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use toml::value::{Date, Datetime, Offset, Time};

const ID: &str = "toml";

pub struct TomlCodec {
    descriptor: CodecDescriptor,
}

impl Default for TomlCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl TomlCodec {
    #[must_use]
    pub fn new() -> Self {
        TomlCodec {
            descriptor: CodecDescriptor::new(ID, "TOML")
                .with_extensions(&[".toml"])
                .with_pre_encode(
                    NormalizationPolicy::new()
                        .with_allow_date(true)
                        .with_skip_null_keys(true)
                        .with_skip_null_values(true)
                        .with_force_string_keys(true),
                ),
        }
    }
}

impl Codec for TomlCodec {
    fn descriptor(&self) -> &CodecDescriptor {
        &self.descriptor
    }

    fn decode(&self, input: &mut Input<'_>) -> Result<Value> {
        let text = input.take_str(ID)?;
        let table: toml::Table = toml::from_str(text).map_err(|e| Error::decode(ID, e.message()))?;
        let value = from_toml(toml::Value::Table(table))?;
        Ok(unwrap_root(value))
    }

    fn encode(&self, value: &Value, pretty: bool) -> Result<Vec<u8>> {
        let table = match to_toml(&wrap_root(value))? {
            toml::Value::Table(table) => table,
            _ => return Err(Error::encode(ID, "document root must be a table")),
        };
        let text = if pretty {
            toml::to_string_pretty(&table)
        } else {
            toml::to_string(&table)
        };
        text.map(String::into_bytes).map_err(|e| Error::encode(ID, e))
    }
}

fn from_toml(value: toml::Value) -> Result<Value> {
    Ok(match value {
        toml::Value::String(s) => Value::Text(s),
        toml::Value::Integer(i) => Value::Integer(i),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => from_datetime(&dt)?,
        toml::Value::Array(items) => Value::Sequence(
            items
                .into_iter()
                .map(from_toml)
                .collect::<Result<Vec<_>>>()?,
        ),
        toml::Value::Table(table) => {
            let mut map = Mapping::with_capacity(table.len());
            for (key, item) in table {
                map.push(key, from_toml(item)?);
            }
            Value::Mapping(map)
        }
    })
}

fn from_datetime(dt: &Datetime) -> Result<Value> {
    let invalid = || Error::decode(ID, format!("invalid datetime {}", dt));
    let date = match dt.date {
        Some(d) => Some(
            NaiveDate::from_ymd_opt(i32::from(d.year), u32::from(d.month), u32::from(d.day))
                .ok_or_else(invalid)?,
        ),
        None => None,
    };
    let time = match dt.time {
        Some(t) => Some(
            NaiveTime::from_hms_nano_opt(
                u32::from(t.hour),
                u32::from(t.minute),
                u32::from(t.second),
                t.nanosecond,
            )
            .ok_or_else(invalid)?,
        ),
        None => None,
    };
    let offset = match dt.offset {
        Some(Offset::Z) => FixedOffset::east_opt(0),
        Some(Offset::Custom { minutes }) => Some(
            FixedOffset::east_opt(i32::from(minutes) * 60).ok_or_else(invalid)?,
        ),
        None => None,
    };

    match (date, time) {
        (Some(date), Some(time)) => {
            let datetime = NaiveDateTime::new(date, time);
            Ok(Value::DateTime(match offset {
                Some(offset) => Timestamp::with_offset(datetime, offset),
                None => Timestamp::local(datetime),
            }))
        }
        (Some(date), None) => Ok(Value::Date(date)),
        (None, Some(time)) => Ok(Value::Time(time)),
        (None, None) => Err(invalid()),
    }
}

fn to_toml(value: &Value) -> Result<toml::Value> {
    Ok(match value {
        Value::Null => return Err(Error::encode(ID, "TOML has no null value")),
        Value::Bool(b) => toml::Value::Boolean(*b),
        Value::Integer(i) => toml::Value::Integer(*i),
        Value::BigInt(big) => toml::Value::Integer(
            i64::try_from(big).map_err(|_| Error::encode(ID, format!("{} does not fit a TOML integer", big)))?,
        ),
        Value::Float(f) => toml::Value::Float(*f),
        Value::Text(s) => toml::Value::String(s.clone()),
        Value::Bytes(_) => return Err(Error::encode(ID, "TOML has no binary value")),
        Value::Date(d) => toml::Value::Datetime(Datetime {
            date: Some(to_date(d)?),
            time: None,
            offset: None,
        }),
        Value::Time(t) => toml::Value::Datetime(Datetime {
            date: None,
            time: Some(to_time(t)),
            offset: None,
        }),
        Value::DateTime(ts) => toml::Value::Datetime(Datetime {
            date: Some(to_date(&ts.datetime.date())?),
            time: Some(to_time(&ts.datetime.time())),
            offset: ts.offset.map(to_offset),
        }),
        Value::Sequence(items) => {
            toml::Value::Array(items.iter().map(to_toml).collect::<Result<Vec<_>>>()?)
        }
        Value::Mapping(map) => {
            let mut table = toml::Table::new();
            for (key, item) in map {
                let key = key
                    .as_str()
                    .ok_or_else(|| Error::encode(ID, format!("key {} is not text", key)))?;
                table.insert(key.to_string(), to_toml(item)?);
            }
            toml::Value::Table(table)
        }
    })
}

fn to_date(date: &NaiveDate) -> Result<Date> {
    let year = u16::try_from(date.year())
        .ok()
        .filter(|year| *year <= 9999)
        .ok_or_else(|| Error::encode(ID, format!("year {} out of range", date.year())))?;
    Ok(Date {
        year,
        month: date.month() as u8,
        day: date.day() as u8,
    })
}

fn to_time(time: &NaiveTime) -> Time {
    Time {
        hour: time.hour() as u8,
        minute: time.minute() as u8,
        second: time.second() as u8,
        nanosecond: time.nanosecond(),
    }
}

fn to_offset(offset: FixedOffset) -> Offset {
    match offset.local_minus_utc() {
        0 => Offset::Z,
        seconds => Offset::Custom {
            minutes: (seconds / 60) as i16,
        },
    }
}
