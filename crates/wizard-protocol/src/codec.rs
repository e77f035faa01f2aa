//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The turn service decodes inbound submissions and encodes outbound events
//! through a [`Codec`], so the byte format is a single swap point.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because a codec is shared by every request
/// handler task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do not
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`. Behind the default `json` feature.
///
/// ```rust
/// use wizard_protocol::{Action, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Action::Guard).unwrap();
/// let decoded: Action = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, Action::Guard);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{Action, LobbyId, PlayerId, PlayerToken, Swap, TurnRequest};

    #[test]
    fn test_json_codec_turn_request_round_trip() {
        let codec = JsonCodec;
        let req = TurnRequest {
            lobby_id: LobbyId(1),
            player_id: PlayerId(2),
            token: PlayerToken::new("t"),
            turn_actions: vec![Action::Attack { move_slot: 0 }],
            turn_swap: vec![Swap(1)],
        };

        let bytes = codec.encode(&req).unwrap();
        let decoded: TurnRequest = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn test_json_codec_decode_garbage_returns_decode_error() {
        let result: Result<TurnRequest, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
