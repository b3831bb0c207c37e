//! Registering a codec of your own next to the built-in ones.
//!
//! Run with: cargo run --example custom_codec

use config_formats::{
    value, Codec, CodecDescriptor, Conversion, Error, Input, NormalizationPolicy, Registry,
    Result, Value,
};
use std::sync::Arc;

/// `KEY=value` lines, as found in `.env` files.
struct DotEnv {
    descriptor: CodecDescriptor,
}

impl DotEnv {
    fn new() -> Self {
        DotEnv {
            descriptor: CodecDescriptor::new("env", "dotenv")
                .with_extensions(&[".env"])
                .with_pre_encode(
                    NormalizationPolicy::new()
                        .with_force_string_keys(true)
                        .with_skip_null_values(true)
                        .with_max_level(1, "json"),
                )
                .with_post_decode(NormalizationPolicy::new().with_parse_str(true)),
        }
    }
}

impl Codec for DotEnv {
    fn descriptor(&self) -> &CodecDescriptor {
        &self.descriptor
    }

    fn decode(&self, input: &mut Input<'_>) -> Result<Value> {
        let text = input.take_str("env")?;
        let mut map = config_formats::Mapping::new();
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| Error::decode("env", format!("expected KEY=value, got {:?}", line)))?;
            map.insert(key.trim(), Value::from(value.trim()));
        }
        Ok(Value::Mapping(map))
    }

    fn encode(&self, value: &Value, _pretty: bool) -> Result<Vec<u8>> {
        let map = value
            .as_mapping()
            .ok_or_else(|| Error::encode("env", "root must be a mapping"))?;
        let mut out = String::new();
        for (key, item) in map {
            out.push_str(&format!("{}={}\n", key.to_text(), item.to_text()));
        }
        Ok(out.into_bytes())
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut registry = Registry::with_builtin_codecs();
    registry.register(Arc::new(DotEnv::new()))?;

    let config = value!({
        "PORT": 8080,
        "DEBUG": false,
        "HOSTS": ["a", "b"],
        "UNSET": null
    });

    let env = registry.encode("env", &config, false)?;
    println!("{}", String::from_utf8(env.clone())?);

    let yaml = registry.convert(&env, Some(".env"), "yaml", &Conversion::new())?;
    println!("{}", String::from_utf8(yaml)?);
    Ok(())
}
