//! Built-in codecs.
//!
//! | id        | extensions           | bound policies                                   |
//! |-----------|----------------------|--------------------------------------------------|
//! | `json`    | `.json`              | encode: text keys                                |
//! | `toml`    | `.toml`              | encode: native dates, no nulls, text keys        |
//! | `msgpack` | `.msgpack`, `.mpk`   | none                                             |
//! | `ini`     | `.ini`, `.cfg`       | encode: joined lists, JSON below two levels; decode: the reverse |
//! | `yaml`    | `.yaml`, `.yml`      | decode: ISO-8601 text to dates                   |

mod ini;
mod json;
mod msgpack;
mod toml;
mod yaml;

pub use self::ini::IniCodec;
pub use self::json::JsonCodec;
pub use self::msgpack::MsgPackCodec;
pub use self::toml::TomlCodec;
pub use self::yaml::YamlCodec;

use crate::Codec;
use std::sync::Arc;

/// The built-in codecs, in detection order.
///
/// Formats with unambiguous syntax go first; YAML, which accepts almost any
/// text as a scalar, goes last.
#[must_use]
pub fn builtin() -> Vec<Arc<dyn Codec>> {
    vec![
        Arc::new(JsonCodec::new()),
        Arc::new(TomlCodec::new()),
        Arc::new(MsgPackCodec::new()),
        Arc::new(IniCodec::new()),
        Arc::new(YamlCodec::new()),
    ]
}
