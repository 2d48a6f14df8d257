//! Incremental RFC 6455 frame codec (spec.md §4.7).
//!
//! Hand-rolled rather than built on `tokio-tungstenite`, for the same
//! "nontrivial stateful codec" reason `netcore-http` hand-rolls HTTP/1.1:
//! frame decode/encode, masking, and continuation coalescing is exactly
//! the kind of protocol-specific state machine this workspace keeps
//! in-house per crate.

use bytes::{Buf, Bytes, BytesMut};
use netcore_core::{Error, ErrorKind, Result};

use crate::types::{WsFrame, WsMessage, WsOpcode};

/// Which side of the connection a [`WsCodec`] is decoding for. Per spec.md
/// §6, client-originated frames are always masked and server-originated
/// frames are never masked; decode enforces the opposite expectation of
/// whatever it's fed, and encode emits the opposite convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Decode frames sent by a client (expected masked); encode frames as
    /// a server (unmasked).
    Server,
    /// Decode frames sent by a server (expected unmasked); encode frames
    /// as a client (masked).
    Client,
}

/// Incremental frame parser and message assembler, fed bytes as they
/// arrive off a [`netcore_core::Session`] receive callback.
#[derive(Debug)]
pub struct WsCodec {
    role: Role,
    buffer: BytesMut,
    assembling: Option<(WsOpcode, BytesMut)>,
}

impl WsCodec {
    /// Construct a fresh codec for `role`.
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            buffer: BytesMut::new(),
            assembling: None,
        }
    }

    /// Feed newly received bytes, returning every message that became
    /// complete as a result.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<WsMessage>> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();
        while let Some(frame) = self.try_parse_frame()? {
            if let Some(message) = self.process_frame(frame)? {
                out.push(message);
            }
        }
        Ok(out)
    }

    fn try_parse_frame(&mut self) -> Result<Option<WsFrame>> {
        if self.buffer.len() < 2 {
            return Ok(None);
        }
        let byte0 = self.buffer[0];
        let byte1 = self.buffer[1];
        let fin = byte0 & 0x80 != 0;
        let opcode = WsOpcode::from_byte(byte0 & 0x0F)
            .ok_or_else(|| Error::new(ErrorKind::WsBadOpcode, "unrecognized websocket opcode"))?;
        let masked = byte1 & 0x80 != 0;
        let len7 = byte1 & 0x7F;

        let expect_masked = self.role == Role::Server;
        if masked != expect_masked {
            return Err(Error::new(
                ErrorKind::WsBadMask,
                "frame's mask bit does not match the sender's required convention",
            ));
        }
        if opcode.is_control() && (!fin || len7 > 125) {
            return Err(Error::new(ErrorKind::WsProtocol, "control frames must not be fragmented and are capped at 125 bytes"));
        }

        let mut cursor = 2usize;
        let len: u64 = match len7 {
            126 => {
                if self.buffer.len() < cursor + 2 {
                    return Ok(None);
                }
                let len = u16::from_be_bytes([self.buffer[cursor], self.buffer[cursor + 1]]);
                cursor += 2;
                u64::from(len)
            }
            127 => {
                if self.buffer.len() < cursor + 8 {
                    return Ok(None);
                }
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&self.buffer[cursor..cursor + 8]);
                cursor += 8;
                u64::from_be_bytes(raw)
            }
            n => u64::from(n),
        };

        let mask = if masked {
            if self.buffer.len() < cursor + 4 {
                return Ok(None);
            }
            let mut key = [0u8; 4];
            key.copy_from_slice(&self.buffer[cursor..cursor + 4]);
            cursor += 4;
            Some(key)
        } else {
            None
        };

        let len = usize::try_from(len).map_err(|_| Error::new(ErrorKind::WsBadFrame, "frame length overflows usize"))?;
        if self.buffer.len() < cursor + len {
            return Ok(None);
        }

        self.buffer.advance(cursor);
        let mut payload = self.buffer.split_to(len);
        if let Some(key) = mask {
            for (i, b) in payload.iter_mut().enumerate() {
                *b ^= key[i % 4];
            }
        }

        Ok(Some(WsFrame {
            fin,
            opcode,
            mask,
            payload: payload.freeze(),
        }))
    }

    fn process_frame(&mut self, frame: WsFrame) -> Result<Option<WsMessage>> {
        if frame.opcode.is_control() {
            return Ok(Some(match frame.opcode {
                WsOpcode::Close => Self::parse_close(&frame.payload),
                WsOpcode::Ping => WsMessage::Ping(frame.payload),
                WsOpcode::Pong => WsMessage::Pong(frame.payload),
                _ => unreachable!("is_control() only true for Close/Ping/Pong"),
            }));
        }

        match frame.opcode {
            WsOpcode::Continuation => {
                let Some((_, collected)) = &mut self.assembling else {
                    return Err(Error::new(ErrorKind::WsProtocol, "continuation frame with no data message in progress"));
                };
                collected.extend_from_slice(&frame.payload);
                if frame.fin {
                    let (opcode, collected) = self.assembling.take().expect("checked Some above");
                    Ok(Some(Self::finish_data_message(opcode, collected.freeze())?))
                } else {
                    Ok(None)
                }
            }
            WsOpcode::Text | WsOpcode::Binary => {
                if self.assembling.is_some() {
                    return Err(Error::new(ErrorKind::WsProtocol, "new data frame while a continuation is pending"));
                }
                if frame.fin {
                    Ok(Some(Self::finish_data_message(frame.opcode, frame.payload)?))
                } else {
                    let mut collected = BytesMut::new();
                    collected.extend_from_slice(&frame.payload);
                    self.assembling = Some((frame.opcode, collected));
                    Ok(None)
                }
            }
            _ => unreachable!("control opcodes handled above"),
        }
    }

    fn finish_data_message(opcode: WsOpcode, payload: Bytes) -> Result<WsMessage> {
        match opcode {
            WsOpcode::Text => {
                let text = String::from_utf8(payload.to_vec())
                    .map_err(|_| Error::new(ErrorKind::WsBadFrame, "text message is not valid utf-8"))?;
                Ok(WsMessage::Text(text))
            }
            WsOpcode::Binary => Ok(WsMessage::Binary(payload)),
            _ => unreachable!("only Text/Binary assemble into a data message"),
        }
    }

    fn parse_close(payload: &[u8]) -> WsMessage {
        if payload.len() < 2 {
            return WsMessage::Close { code: None, reason: String::new() };
        }
        let code = u16::from_be_bytes([payload[0], payload[1]]);
        let reason = String::from_utf8_lossy(&payload[2..]).into_owned();
        WsMessage::Close { code: Some(code), reason }
    }
}

/// Encode one unfragmented frame for `role`: client frames are masked with
/// a freshly generated 32-bit key, server frames are emitted unmasked
/// (spec.md §4.7, §6).
#[must_use]
pub fn encode_frame(role: Role, opcode: WsOpcode, payload: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(payload.len() + 14);
    out.extend_from_slice(&[0x80 | opcode.as_byte()]);

    let masked = role == Role::Client;
    let mask_bit = if masked { 0x80 } else { 0x00 };
    let len = payload.len();
    if len < 126 {
        out.extend_from_slice(&[mask_bit | len as u8]);
    } else if len <= u64::from(u16::MAX) {
        out.extend_from_slice(&[mask_bit | 126]);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.extend_from_slice(&[mask_bit | 127]);
        out.extend_from_slice(&(len as u64).to_be_bytes());
    }

    if masked {
        let key = random_mask_key();
        out.extend_from_slice(&key);
        let start = out.len();
        out.extend_from_slice(payload);
        for (i, b) in out[start..].iter_mut().enumerate() {
            *b ^= key[i % 4];
        }
    } else {
        out.extend_from_slice(payload);
    }

    out.freeze()
}

/// A text frame.
#[must_use]
pub fn encode_text(role: Role, text: &str) -> Bytes {
    encode_frame(role, WsOpcode::Text, text.as_bytes())
}

/// A binary frame.
#[must_use]
pub fn encode_binary(role: Role, payload: &[u8]) -> Bytes {
    encode_frame(role, WsOpcode::Binary, payload)
}

/// A close frame carrying `code` and `reason`, per RFC 6455 §5.5.1.
#[must_use]
pub fn encode_close(role: Role, code: u16, reason: &str) -> Bytes {
    let mut payload = Vec::with_capacity(2 + reason.len());
    payload.extend_from_slice(&code.to_be_bytes());
    payload.extend_from_slice(reason.as_bytes());
    encode_frame(role, WsOpcode::Close, &payload)
}

/// A ping frame.
#[must_use]
pub fn encode_ping(role: Role, payload: &[u8]) -> Bytes {
    encode_frame(role, WsOpcode::Ping, payload)
}

/// A pong frame, normally echoing the payload of the ping it answers.
#[must_use]
pub fn encode_pong(role: Role, payload: &[u8]) -> Bytes {
    encode_frame(role, WsOpcode::Pong, payload)
}

fn random_mask_key() -> [u8; 4] {
    fastrand::u32(..).to_ne_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_frames_are_never_masked() {
        let wire = encode_text(Role::Server, "test");
        assert_eq!(wire[1] & 0x80, 0);
    }

    #[test]
    fn client_frames_are_always_masked() {
        let wire = encode_text(Role::Client, "test");
        assert_eq!(wire[1] & 0x80, 0x80);
    }

    #[test]
    fn encode_then_decode_round_trips_text() {
        let wire = encode_text(Role::Client, "test");
        let mut codec = WsCodec::new(Role::Server);
        let messages = codec.feed(&wire).unwrap();
        assert_eq!(messages.len(), 1);
        let WsMessage::Text(text) = &messages[0] else { panic!("expected text message") };
        assert_eq!(text, "test");
    }

    #[test]
    fn decode_rejects_mismatched_mask_convention() {
        // A server-framed (unmasked) frame fed to a codec expecting
        // client-originated (masked) frames must be rejected.
        let wire = encode_text(Role::Server, "test");
        let mut codec = WsCodec::new(Role::Server);
        let err = codec.feed(&wire).unwrap_err();
        assert_eq!(err.kind, ErrorKind::WsBadMask);
    }

    #[test]
    fn continuation_frames_coalesce_into_one_message() {
        let mut codec = WsCodec::new(Role::Server);
        let mut first = encode_frame(Role::Client, WsOpcode::Text, b"te").to_vec();
        first[0] &= 0x7F; // clear fin
        let second = encode_frame(Role::Client, WsOpcode::Continuation, b"st").to_vec();

        let messages = codec.feed(&first).unwrap();
        assert!(messages.is_empty());
        let messages = codec.feed(&second).unwrap();
        assert_eq!(messages.len(), 1);
        let WsMessage::Text(text) = &messages[0] else { panic!("expected text message") };
        assert_eq!(text, "test");
    }

    #[test]
    fn parses_frame_split_across_multiple_feeds() {
        let wire = encode_text(Role::Client, "test");
        let mut codec = WsCodec::new(Role::Server);
        assert!(codec.feed(&wire[..3]).unwrap().is_empty());
        let messages = codec.feed(&wire[3..]).unwrap();
        assert_eq!(messages.len(), 1);
    }
}
