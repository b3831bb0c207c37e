//! # config_formats
//!
//! Convert structured data between JSON, TOML, YAML, MessagePack and INI.
//!
//! ## How it works
//!
//! Every format decodes into one canonical [`Value`] tree and encodes from
//! it. Formats differ in what they can store (TOML has no null, INI has no
//! nesting, JSON has no dates), so a [`NormalizationPolicy`] describes how a
//! tree is reshaped for a target: render dates as text, drop nulls, force
//! text keys, join lists into `a;b;c` strings, or embed deep subtrees as
//! JSON text. Each codec carries the policies its format needs, and callers
//! can add their own on top.
//!
//! ```text
//! bytes -> detect/decode -> post-decode policy -> user policy
//!       -> query -> prefix -> pre-encode policy -> encode -> bytes
//! ```
//!
//! ## Key Features
//!
//! - **Auto-detection**: codecs are tried in order, and only one that
//!   consumes the whole input is accepted
//! - **Explicit loss**: everything a conversion drops or reshapes is named
//!   in a policy, and policies are plain serde structs
//! - **Pluggable codecs**: implement [`Codec`] and register it with a
//!   [`Registry`]
//!
//! ## Quick Start
//!
//! ```rust
//! use config_formats::{convert, Conversion};
//!
//! let toml = b"[server]\nport = 8080\nstarted = 2020-02-20\n";
//! let yaml = convert(toml, None, "yaml", &Conversion::new()).unwrap();
//! assert_eq!(
//!     String::from_utf8(yaml).unwrap(),
//!     "server:\n  port: 8080\n  started: 2020-02-20\n"
//! );
//! ```
//!
//! ### Normalizing values directly
//!
//! ```rust
//! use config_formats::{normalize, value, NormalizationPolicy};
//!
//! let policy = NormalizationPolicy::new()
//!     .with_parse_str(true)
//!     .with_parse_simple_lists(true);
//!
//! let raw = value!({"hosts": "a;b;c", "port": "80", "tls": "off"});
//! assert_eq!(
//!     normalize(&raw, &policy),
//!     value!({"hosts": ["a", "b", "c"], "port": 80, "tls": false})
//! );
//! ```
//!
//! ### Detection
//!
//! ```rust
//! use config_formats::{detect, value};
//!
//! let detected = detect(b"name: demo\nreplicas: 3\n").unwrap();
//! assert_eq!(detected.codec.id(), "yaml");
//! assert_eq!(detected.value, value!({"name": "demo", "replicas": 3}));
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and never installs a subscriber:
//! `debug` for detection attempts and conversions, `trace` for strict
//! remainder checks and subtree escapes, `warn` when a subtree cannot be
//! serialized and falls back to plain text.
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Normalization never fails and never modifies its input
//! - Errors carry the format they came from; see [`Error`]

pub mod codec;
pub mod convert;
pub mod datetime;
pub mod detect;
pub mod error;
pub mod formats;
pub mod input;
pub mod macros;
pub mod map;
pub mod normalize;
pub mod policy;
pub mod query;
pub mod registry;
pub mod value;
pub mod wrap;

pub use codec::{Codec, CodecDescriptor};
pub use convert::{convert, from_str, read, to_string, write, Conversion};
pub use datetime::Timestamp;
pub use detect::{detect, Detected};
pub use error::{Error, FormatFailure, Result};
pub use input::{check_remainder, Input};
pub use map::Mapping;
pub use normalize::{normalize, Normalizer, SubtreeSerializer};
pub use policy::NormalizationPolicy;
pub use query::query;
pub use registry::Registry;
pub use value::{Kind, Value};
pub use wrap::wrap;
