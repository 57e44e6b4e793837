//! Serde helpers for floats that may be infinite or NaN.
//!
//! JSON has no literal for `inf`/`NaN` and `serde_json` writes them as `null`,
//! which then fails to load back into `f64`. Finite values stay plain numbers;
//! non-finite ones are written as the strings `"inf"`, `"-inf"` and `"nan"`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum JsonFloat {
    Number(f64),
    Text(String),
}

impl From<f64> for JsonFloat {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            JsonFloat::Number(v)
        } else if v.is_nan() {
            JsonFloat::Text("nan".to_string())
        } else if v > 0.0 {
            JsonFloat::Text("inf".to_string())
        } else {
            JsonFloat::Text("-inf".to_string())
        }
    }
}

impl JsonFloat {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            JsonFloat::Number(v) => Ok(v),
            JsonFloat::Text(s) => match s.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(E::custom(format!("expected a number, \"inf\", \"-inf\" or \"nan\", got \"{other}\""))),
            },
        }
    }
}

/// `#[serde(with = "float_json::vec")]` for `Vec<f64>`.
pub mod vec {
    use super::*;

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        let out: Vec<JsonFloat> = values.iter().map(|&v| JsonFloat::from(v)).collect();
        out.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        Vec::<JsonFloat>::deserialize(deserializer)?
            .into_iter()
            .map(JsonFloat::into_f64::<D::Error>)
            .collect()
    }
}

/// `#[serde(with = "float_json::matrix")]` for row-major `Vec<Vec<f64>>`.
pub mod matrix {
    use super::*;

    pub fn serialize<S: Serializer>(rows: &[Vec<f64>], serializer: S) -> Result<S::Ok, S::Error> {
        let out: Vec<Vec<JsonFloat>> = rows
            .iter()
            .map(|row| row.iter().map(|&v| JsonFloat::from(v)).collect())
            .collect();
        out.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<f64>>, D::Error> {
        Vec::<Vec<JsonFloat>>::deserialize(deserializer)?
            .into_iter()
            .map(|row| row.into_iter().map(JsonFloat::into_f64::<D::Error>).collect())
            .collect()
    }
}

/// `#[serde(with = "float_json::scalar")]` for a single `f64`.
pub mod scalar {
    use super::*;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        JsonFloat::from(*value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        JsonFloat::deserialize(deserializer)?.into_f64()
    }
}
