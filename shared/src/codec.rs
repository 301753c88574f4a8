//! Length-prefixed bincode frames.
//!
//! A frame is a big-endian `u32` byte count followed by that many bytes of a
//! bincode encoded [`Packet`].

use crate::Packet;
use bincode::{deserialize, serialize};
use std::fmt;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const MAX_FRAME_LEN: usize = 1024 * 1024;

#[derive(Debug)]
pub enum CodecError {
    Io(io::Error),
    Bincode(bincode::Error),
    FrameTooLarge { len: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Io(err) => write!(f, "I/O error: {}", err),
            CodecError::Bincode(err) => write!(f, "Malformed packet: {}", err),
            CodecError::FrameTooLarge { len } => {
                write!(f, "Frame of {} bytes exceeds the {} byte limit", len, MAX_FRAME_LEN)
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Io(err) => Some(err),
            CodecError::Bincode(err) => Some(err),
            CodecError::FrameTooLarge { .. } => None,
        }
    }
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        CodecError::Io(err)
    }
}

impl From<bincode::Error> for CodecError {
    fn from(err: bincode::Error) -> Self {
        CodecError::Bincode(err)
    }
}

/// Encodes a packet into a complete frame.
pub fn encode_frame(packet: &Packet) -> Result<Vec<u8>, CodecError> {
    let payload = serialize(packet)?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(CodecError::FrameTooLarge { len: payload.len() });
    }
    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<(), CodecError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(packet)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads the next packet. Returns `Ok(None)` when the peer closed the stream
/// between two frames.
pub async fn read_packet<R>(reader: &mut R) -> Result<Option<Packet>, CodecError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    }

    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_FRAME_LEN {
        return Err(CodecError::FrameTooLarge { len });
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(deserialize(&payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, Face, Position};

    #[tokio::test]
    async fn test_frames_round_trip_over_a_pipe() {
        let (mut client, mut server) = tokio::io::duplex(256);
        let sent = vec![
            Packet::Connect {
                client_version: 1,
                username: "ada".to_string(),
            },
            Packet::Action(Action::PlayCard {
                slot: 1,
                position: Position::new(-1, 1),
                face: Face::Back,
            }),
            Packet::Disconnect,
        ];
        for packet in &sent {
            write_packet(&mut client, packet).await.unwrap();
        }
        drop(client);

        let mut received = Vec::new();
        while let Some(packet) = read_packet(&mut server).await.unwrap() {
            received.push(packet);
        }
        assert_eq!(received, sent);
    }

    #[test]
    fn test_frame_header_is_big_endian_length() {
        let frame = encode_frame(&Packet::Disconnect).unwrap();
        let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(len, frame.len() - 4);
    }

    #[tokio::test]
    async fn test_oversized_header_is_rejected() {
        let mut bytes: &[u8] = &[0xFF, 0xFF, 0xFF, 0xFF];
        let err = read_packet(&mut bytes).await.unwrap_err();
        assert!(matches!(err, CodecError::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_truncated_payload_is_an_io_error() {
        let mut bytes: &[u8] = &[0, 0, 0, 9, 1, 2];
        let err = tokio_test::assert_err!(read_packet(&mut bytes).await);
        assert!(matches!(err, CodecError::Io(_)));
    }

    #[tokio::test]
    async fn test_garbage_payload_is_a_decode_error() {
        let mut bytes: &[u8] = &[0, 0, 0, 2, 0xEE, 0xEE];
        let err = read_packet(&mut bytes).await.unwrap_err();
        assert!(matches!(err, CodecError::Bincode(_)));
    }
}
