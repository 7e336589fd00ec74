use serde::{Serialize, de::DeserializeOwned};

use crate::error::{Error, Result};

/// Payload format for records on the bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON text (default).
    #[default]
    Json,

    /// CBOR binary.
    Cbor,
}

impl Format {
    /// MIME type of payloads in this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Cbor => "application/cbor",
        }
    }

    /// Guess the format of a payload from its first byte.
    pub fn detect(data: &[u8]) -> Format {
        match data.first() {
            Some(b'{') | Some(b'[') => Format::Json,
            _ => Format::Cbor,
        }
    }
}

/// Encode a value to bytes using the specified format.
pub fn encode<T: Serialize>(value: &T, format: Format) -> Result<Vec<u8>> {
    match format {
        Format::Json => Ok(serde_json::to_vec(value)?),
        Format::Cbor => {
            let mut buf = Vec::new();
            ciborium::into_writer(value, &mut buf)?;
            Ok(buf)
        }
    }
}

/// Decode bytes to a value using the specified format.
pub fn decode<T: DeserializeOwned>(data: &[u8], format: Format) -> Result<T> {
    match format {
        Format::Json => Ok(serde_json::from_slice(data)?),
        Format::Cbor => ciborium::from_reader(data).map_err(|e| Error::Cbor(e.to_string())),
    }
}

/// Decode bytes, detecting the format from the payload.
pub fn decode_auto<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    decode(data, Format::detect(data))
}
