//! Serde helpers encoding arkworks values as 0x-prefixed hex of their compressed
//! canonical form, so published proofs stay readable in JSON.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::de::Error as DeError;
use serde::ser::Error as SerError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

fn to_hex<T: CanonicalSerialize>(value: &T) -> Result<String, ark_serialize::SerializationError> {
    let mut bytes = Vec::with_capacity(value.compressed_size());
    value.serialize_compressed(&mut bytes)?;
    Ok(format!("0x{}", hex::encode(bytes)))
}

fn from_hex<T: CanonicalDeserialize>(s: &str) -> Result<T, String> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(trimmed).map_err(|e| format!("invalid hex: {e}"))?;
    T::deserialize_compressed(&mut &bytes[..]).map_err(|e| format!("invalid encoding: {e}"))
}

/// Group elements (points of `G`, `G1`, `G2` or the pairing target group).
pub mod curve {
    use super::*;

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: CanonicalSerialize,
        S: Serializer,
    {
        let hex = to_hex(value).map_err(SerError::custom)?;
        serializer.serialize_str(&hex)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: CanonicalDeserialize,
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        from_hex(&s).map_err(DeError::custom)
    }
}

/// Sequences of group elements.
pub mod curve_vec {
    use super::*;

    #[allow(clippy::ptr_arg)]
    pub fn serialize<T, S>(values: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: CanonicalSerialize,
        S: Serializer,
    {
        let encoded = values
            .iter()
            .map(|value| to_hex(value).map_err(SerError::custom))
            .collect::<Result<Vec<_>, _>>()?;
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        T: CanonicalDeserialize,
        D: Deserializer<'de>,
    {
        let encoded = Vec::<String>::deserialize(deserializer)?;
        encoded
            .iter()
            .map(|s| from_hex(s).map_err(DeError::custom))
            .collect()
    }
}

/// Scalars share the point encoding; the module name documents intent at the field site.
pub mod field {
    pub use super::curve::{deserialize, serialize};
}

pub mod field_vec {
    pub use super::curve_vec::{deserialize, serialize};
}

/// Opaque proof bytes as a 0x-prefixed hex string.
pub mod bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(DeError::custom)
    }
}
