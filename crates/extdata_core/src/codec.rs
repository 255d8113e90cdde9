//! Record envelopes and their CBOR encoding.
//!
//! Every stored blob is a CBOR map `{ version, data }`. The version is read
//! on its own first, so a record written by another namespace version can be
//! archived even when its payload no longer decodes as the current type.

use crate::error::{CoreError, CoreResult};
use crate::version::VersionNumber;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A type that can be stored in the registry.
///
/// Implemented for every `serde` type that is `Send + 'static`; plugins
/// only need `#[derive(Serialize, Deserialize)]` on their record structs.
pub trait Record: Serialize + DeserializeOwned + Send + 'static {}

impl<T> Record for T where T: Serialize + DeserializeOwned + Send + 'static {}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: VersionNumber,
    data: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    version: VersionNumber,
    data: T,
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    version: VersionNumber,
}

/// Encodes `record` with the version it was written under.
///
/// # Errors
///
/// Returns [`CoreError::Codec`] if the record cannot be serialized.
pub fn encode_record<T: Serialize>(version: VersionNumber, record: &T) -> CoreResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(
        &EnvelopeRef {
            version,
            data: record,
        },
        &mut bytes,
    )
    .map_err(|e| CoreError::codec(e.to_string()))?;
    Ok(bytes)
}

/// Decodes a full envelope.
///
/// # Errors
///
/// Returns [`CoreError::Codec`] if the bytes are not an envelope holding a `T`.
pub fn decode_record<T: DeserializeOwned>(bytes: &[u8]) -> CoreResult<(VersionNumber, T)> {
    let envelope: Envelope<T> =
        ciborium::from_reader(bytes).map_err(|e| CoreError::codec(e.to_string()))?;
    Ok((envelope.version, envelope.data))
}

/// Reads only the version of an envelope, skipping the payload.
///
/// # Errors
///
/// Returns [`CoreError::Codec`] if the bytes are not an envelope.
pub fn read_version(bytes: &[u8]) -> CoreResult<VersionNumber> {
    let header: EnvelopeHeader =
        ciborium::from_reader(bytes).map_err(|e| CoreError::codec(e.to_string()))?;
    Ok(header.version)
}
