//! Relay id codec.
//!
//! The GraphQL API identifies entities with opaque ids of the form
//! `base64("<TypeName>-<integer>")`. Decoding never fails loudly: a malformed
//! id resolves to `None` and the caller picks a sentinel.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use thiserror::Error;

use crate::types::{Backing, Category, Comment, Location, Project, Reward, Update, User};

const LENIENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("not valid base64")]
    Base64,
    #[error("decoded id is not UTF-8")]
    Utf8,
    #[error("no type separator in {0:?}")]
    MissingSeparator(String),
    #[error("non-numeric id suffix in {0:?}")]
    NotNumeric(String),
}

/// An entity addressable by a relay id.
pub trait Relay {
    const TYPE_NAME: &'static str;

    fn id(&self) -> i64;
}

macro_rules! relay_entity {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Relay for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn id(&self) -> i64 {
                    self.id
                }
            }
        )*
    };
}

relay_entity!(Backing, Category, Comment, Location, Project, Reward, Update, User);

/// Strict decode that reports why an id was rejected.
pub fn try_decode_relay_id(encoded: &str) -> Result<i64, DecodeError> {
    let trimmed = encoded.trim();
    let bytes = STANDARD_LENIENT
        .decode(trimmed)
        .or_else(|_| URL_SAFE_LENIENT.decode(trimmed))
        .map_err(|_| DecodeError::Base64)?;
    let text = String::from_utf8(bytes).map_err(|_| DecodeError::Utf8)?;

    let (_, suffix) = text
        .rsplit_once('-')
        .ok_or_else(|| DecodeError::MissingSeparator(text.clone()))?;

    suffix
        .parse::<i64>()
        .ok()
        .and_then(i64::checked_abs)
        .ok_or_else(|| DecodeError::NotNumeric(text.clone()))
}

/// Decode a relay id into its integer id, or `None` if it is malformed.
pub fn decode_relay_id(encoded: &str) -> Option<i64> {
    match try_decode_relay_id(encoded) {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::debug!("Ignoring undecodable relay id {encoded:?}: {e}");
            None
        }
    }
}

/// Encode an entity's id as a relay id using the URL-safe alphabet.
pub fn encode_relay_id<T: Relay>(entity: &T) -> String {
    encode_relay_id_parts(T::TYPE_NAME, entity.id())
}

/// Encode a raw `(type, id)` pair, for ids that are not wrapped in an entity yet.
pub fn encode_relay_id_parts(type_name: &str, id: i64) -> String {
    base64::engine::general_purpose::URL_SAFE.encode(format!("{type_name}-{id}"))
}
