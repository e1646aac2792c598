use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Maximum accepted frame size. Guards against a misbehaving peer claiming
/// an enormous length prefix and exhausting memory.
pub const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

/// Writes `payload` as a single length-prefixed frame: a big-endian `u32`
/// byte count followed by the payload itself.
pub async fn write_frame<W>(w: &mut W, payload: &[u8]) -> std::io::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let len = payload.len() as u32;
    w.write_all(&len.to_be_bytes()).await?;
    w.write_all(payload).await?;
    w.flush().await
}

/// Reads one length-prefixed frame, returning `UnexpectedEof` if the peer
/// closes mid-frame and `InvalidData` if the declared length exceeds
/// [`MAX_FRAME_BYTES`].
pub async fn read_frame<R>(r: &mut R) -> std::io::Result<Vec<u8>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    r.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("frame of {len} bytes exceeds max of {MAX_FRAME_BYTES}"),
        ));
    }
    let mut buf = vec![0u8; len as usize];
    r.read_exact(&mut buf).await?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frame_round_trips_over_an_in_memory_duplex() {
        let (mut a, mut b) = tokio::io::duplex(1024);
        write_frame(&mut a, b"hello manager").await.unwrap();
        let got = read_frame(&mut b).await.unwrap();
        assert_eq!(got, b"hello manager");
    }

    #[tokio::test]
    async fn empty_payload_round_trips() {
        let (mut a, mut b) = tokio::io::duplex(64);
        write_frame(&mut a, b"").await.unwrap();
        let got = read_frame(&mut b).await.unwrap();
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn oversized_declared_length_is_rejected() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let huge = (MAX_FRAME_BYTES + 1).to_be_bytes();
        a.write_all(&huge).await.unwrap();
        let err = read_frame(&mut b).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
