use serde::de::DeserializeOwned;

use crate::error::FetchError;

/// Decodes a body that is either an array of `T` or a single `T`.
///
/// Array decoding is tried first. When both fail, the error for the shape the
/// body actually has is returned.
pub fn decode_one_or_many<T: DeserializeOwned>(body: &[u8]) -> Result<Vec<T>, FetchError> {
    let array_err = match serde_json::from_slice::<Vec<T>>(body) {
        Ok(many) => return Ok(many),
        Err(e) => e,
    };

    match serde_json::from_slice::<T>(body) {
        Ok(one) => Ok(vec![one]),
        Err(object_err) => {
            let looks_like_array = body
                .iter()
                .find(|b| !b.is_ascii_whitespace())
                .is_some_and(|b| *b == b'[');
            Err(FetchError::Decode(if looks_like_array {
                array_err
            } else {
                object_err
            }))
        }
    }
}
