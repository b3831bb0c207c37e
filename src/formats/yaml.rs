//! YAML through `serde_yaml`.
//!
//! Tags are dropped in favor of the tagged value. Since `serde_yaml` has no
//! timestamp type, ISO-8601 scalars come back as text and the post-decode
//! policy turns them into temporal leaves.

use crate::{Codec, CodecDescriptor, Error, Input, Mapping, NormalizationPolicy, Result, Value};

const ID: &str = "yaml";

pub struct YamlCodec {
    descriptor: CodecDescriptor,
}

impl Default for YamlCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl YamlCodec {
    #[must_use]
    pub fn new() -> Self {
        YamlCodec {
            descriptor: CodecDescriptor::new(ID, "YAML")
                .with_extensions(&[".yaml", ".yml"])
                .with_post_decode(
                    NormalizationPolicy::new()
                        .with_allow_date(true)
                        .with_parse_date(true),
                ),
        }
    }
}

impl Codec for YamlCodec {
    fn descriptor(&self) -> &CodecDescriptor {
        &self.descriptor
    }

    fn decode(&self, input: &mut Input<'_>) -> Result<Value> {
        let text = input.take_str(ID)?;
        let doc: serde_yaml::Value = serde_yaml::from_str(text).map_err(|e| Error::decode(ID, e))?;
        Ok(from_yaml(doc))
    }

    fn encode(&self, value: &Value, _pretty: bool) -> Result<Vec<u8>> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| Error::encode(ID, e))
    }
}

fn from_yaml(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_yaml::Value::String(s) => Value::Text(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Sequence(items.into_iter().map(from_yaml).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let mut out = Mapping::with_capacity(map.len());
            for (key, item) in map {
                out.push(from_yaml(key), from_yaml(item));
            }
            Value::Mapping(out)
        }
        serde_yaml::Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value;

    fn decode(text: &str) -> Value {
        YamlCodec::new().decode_slice(text.as_bytes(), true).unwrap()
    }

    #[test]
    fn test_decode_scalars_and_containers() {
        let v = decode("name: demo\nports: [80, 443]\nratio: 0.5\nnothing: ~\nflag: yes\n");
        assert_eq!(
            v,
            value!({"name": "demo", "ports": [80, 443], "ratio": 0.5, "nothing": null, "flag": "yes"})
        );
    }

    #[test]
    fn test_decode_non_text_keys() {
        let v = decode("1: one\ntrue: yes\n");
        let map = v.as_mapping().unwrap();
        assert_eq!(map.get_value(&Value::Integer(1)), Some(&value!("one")));
        assert_eq!(map.get_value(&Value::Bool(true)), Some(&value!("yes")));
    }

    #[test]
    fn test_decode_drops_tags() {
        assert_eq!(decode("!custom 5\n"), value!(5));
    }

    #[test]
    fn test_encode_round_trip() {
        let v = value!({"a": [1, "two", null], "b": {"c": 2.5}});
        let bytes = YamlCodec::new().encode(&v, false).unwrap();
        assert_eq!(YamlCodec::new().decode_slice(&bytes, true).unwrap(), v);
    }

    #[test]
    fn test_multiple_documents_rejected() {
        assert!(matches!(
            YamlCodec::new().decode_slice(b"a: 1\n---\nb: 2\n", true),
            Err(Error::Decode { .. })
        ));
    }
}
