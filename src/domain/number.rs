//! JSON encoding for `f64` fields that keeps non-finite values.
//!
//! Setters store any `f64`, but JSON has no NaN or infinity. Finite values are
//! written as numbers; NaN, `+inf` and `-inf` as the strings `"NaN"`, `"inf"`
//! and `"-inf"`. Reading accepts both forms, `null` stays an error.

use std::fmt;

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const NAN: &str = "NaN";
const INF: &str = "inf";
const NEG_INF: &str = "-inf";

/// `f64` with the lossless encoding.
#[derive(Debug, Clone, Copy)]
struct Lossless(f64);

impl Serialize for Lossless {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if v.is_nan() {
            serializer.serialize_str(NAN)
        } else if v == f64::INFINITY {
            serializer.serialize_str(INF)
        } else if v == f64::NEG_INFINITY {
            serializer.serialize_str(NEG_INF)
        } else {
            serializer.serialize_f64(v)
        }
    }
}

struct LosslessVisitor;

impl<'de> Visitor<'de> for LosslessVisitor {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a number or one of \"{NAN}\", \"{INF}\", \"{NEG_INF}\"")
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
        match v {
            NAN => Ok(f64::NAN),
            INF => Ok(f64::INFINITY),
            NEG_INF => Ok(f64::NEG_INFINITY),
            other => Err(E::invalid_value(Unexpected::Str(other), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for Lossless {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LosslessVisitor).map(Lossless)
    }
}

/// `#[serde(with = "...")]` for `f64`.
pub(crate) mod lossless {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        Lossless(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Lossless::deserialize(deserializer).map(|n| n.0)
    }
}

/// `#[serde(with = "...")]` for `Option<f64>`; pair with `default`.
pub(crate) mod lossless_option {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        value.map(Lossless).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Option::<Lossless>::deserialize(deserializer).map(|n| n.map(|n| n.0))
    }
}

/// `#[serde(with = "...")]` for `Vec<f64>`.
pub(crate) mod lossless_vec {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| Lossless(*v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        Vec::<Lossless>::deserialize(deserializer).map(|v| v.into_iter().map(|n| n.0).collect())
    }
}
