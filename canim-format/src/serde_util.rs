//! Serde adapters for the interchange representation
//!
//! Byte spans become lowercase hex strings, hashes become `0x%08X` strings, and
//! floats that JSON cannot carry (NaN, infinities) become their bit pattern.

/// `Vec<u8>` as a hex string
pub(crate) mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text.trim()).map_err(serde::de::Error::custom)
    }
}

/// `Option<Vec<u8>>` as an optional hex string
pub(crate) mod hex_bytes_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => hex::decode(text.trim())
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Four-byte tag as text when printable, otherwise `0x` + hex
pub(crate) mod tag4 {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tag: &[u8; 4], serializer: S) -> Result<S::Ok, S::Error> {
        if tag.iter().all(|b| b.is_ascii_graphic()) && !tag.starts_with(b"0x") {
            serializer.serialize_str(&crate::codec::decode_ascii_lossy(tag))
        } else {
            serializer.serialize_str(&format!("0x{}", hex::encode(tag)))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 4], D::Error> {
        let text = String::deserialize(deserializer)?;
        let bytes = match text.strip_prefix("0x") {
            Some(digits) => hex::decode(digits).map_err(serde::de::Error::custom)?,
            None => text.into_bytes(),
        };
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("tag must be exactly 4 bytes"))
    }
}

/// `f32`, with non-finite values carried as `"0x%08X"` bit patterns
pub(crate) mod float {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f32),
        Bits(String),
    }

    pub fn serialize<S: Serializer>(value: &f32, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f32(*value)
        } else {
            serializer.serialize_str(&format!("0x{:08X}", value.to_bits()))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Bits(text) => super::parse_hex_u32(&text)
                .map(f32::from_bits)
                .ok_or_else(|| serde::de::Error::custom(format!("bad float bits: {text}"))),
        }
    }
}

/// `u32` hash as a `0x%08X` string; plain numbers are accepted on input
pub(crate) mod hash32 {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    pub(super) enum Repr {
        Number(u32),
        Text(String),
    }

    impl Repr {
        pub(super) fn into_u32<E: serde::de::Error>(self) -> Result<u32, E> {
            match self {
                Repr::Number(value) => Ok(value),
                Repr::Text(text) => super::parse_hex_u32(&text)
                    .ok_or_else(|| E::custom(format!("bad hash: {text}"))),
            }
        }
    }

    pub fn serialize<S: Serializer>(value: &u32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{value:08X}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        Repr::deserialize(deserializer)?.into_u32()
    }
}

/// `Vec<u32>` of hashes
pub(crate) mod hash32_seq {
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::hash32::Repr;

    pub fn serialize<S: Serializer>(values: &[u32], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&format!("0x{value:08X}"))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u32>, D::Error> {
        Vec::<Repr>::deserialize(deserializer)?
            .into_iter()
            .map(Repr::into_u32)
            .collect()
    }
}

fn parse_hex_u32(text: &str) -> Option<u32> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))?;
    u32::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Probe {
        #[serde(with = "super::float")]
        value: f32,
        #[serde(with = "super::hash32")]
        hash: u32,
        #[serde(with = "super::tag4")]
        tag: [u8; 4],
        #[serde(with = "super::hex_bytes")]
        raw: Vec<u8>,
    }

    #[test]
    fn test_non_finite_float_survives_json() {
        let probe = Probe {
            value: f32::from_bits(0x7FC0_0001),
            hash: 0xDEADBEEF,
            tag: *b"SHNA",
            raw: vec![0, 0xFF],
        };
        let json = serde_json::to_string(&probe).unwrap();
        assert!(json.contains("\"0x7FC00001\""));
        assert!(json.contains("\"0xDEADBEEF\""));
        assert!(json.contains("\"00ff\""));
        let back: Probe = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value.to_bits(), 0x7FC0_0001);
        assert_eq!(back.hash, 0xDEADBEEF);
        assert_eq!(back.raw, vec![0, 0xFF]);
    }

    #[test]
    fn test_unprintable_tag_uses_hex() {
        let probe = Probe {
            value: 1.0,
            hash: 7,
            tag: [0, 1, 2, 3],
            raw: Vec::new(),
        };
        let json = serde_json::to_string(&probe).unwrap();
        assert!(json.contains("\"0x00010203\""));
        let back: Probe = serde_json::from_str(&json).unwrap();
        assert_eq!(back, probe);
    }

    #[test]
    fn test_hash_accepts_plain_number() {
        let back: Probe =
            serde_json::from_str(r#"{"value":2.5,"hash":42,"tag":"MHIT","raw":""}"#).unwrap();
        assert_eq!(back.hash, 42);
        assert_eq!(back.value, 2.5);
    }
}
