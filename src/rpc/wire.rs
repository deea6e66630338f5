//! Frame codec for the RPC transport
//!
//! Every message travels as a 4-byte big-endian length prefix followed by the
//! prost-encoded envelope. Frames are bounded so a misbehaving peer cannot
//! make the server buffer arbitrary amounts of memory.

use prost::Message;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, StardustError};

/// Upper bound on a single frame's payload
pub const MAX_FRAME_LEN: u32 = 4 * 1024 * 1024;

/// Write one length-prefixed message
pub async fn write_frame<W, M>(writer: &mut W, message: &M) -> Result<()>
where
    W: AsyncWrite + Unpin,
    M: Message,
{
    let body = message.encode_to_vec();
    if body.len() as u64 > MAX_FRAME_LEN as u64 {
        return Err(StardustError::Internal(format!(
            "frame of {} bytes exceeds limit",
            body.len()
        )));
    }

    writer.write_u32(body.len() as u32).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed message.
///
/// Returns `Ok(None)` on a clean end-of-stream (peer closed between frames).
pub async fn read_frame<R, M>(reader: &mut R) -> Result<Option<M>>
where
    R: AsyncRead + Unpin,
    M: Message + Default,
{
    // Only a stream that ends before the first prefix byte is a clean EOF;
    // one that dies mid-prefix is a broken frame
    let mut prefix = [0u8; 4];
    let mut filled = 0;
    while filled < prefix.len() {
        let n = reader.read(&mut prefix[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(StardustError::Rpc(
                "connection closed mid-frame".to_string(),
            ));
        }
        filled += n;
    }
    let len = u32::from_be_bytes(prefix);

    if len > MAX_FRAME_LEN {
        return Err(StardustError::Rpc(format!(
            "frame of {} bytes exceeds limit",
            len
        )));
    }

    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body).await?;

    M::decode(body.as_slice())
        .map(Some)
        .map_err(|e| StardustError::Rpc(format!("malformed frame: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::proto::{Method, RpcRequest};

    #[tokio::test]
    async fn test_frame_round_trip() {
        let request = RpcRequest {
            method: Method::GetProxyGroup as i32,
            body: vec![1, 2, 3],
        };

        let mut buf = Vec::new();
        write_frame(&mut buf, &request).await.unwrap();

        let mut cursor = buf.as_slice();
        let decoded: RpcRequest = read_frame(&mut cursor).await.unwrap().unwrap();
        assert_eq!(decoded, request);
    }

    #[tokio::test]
    async fn test_read_frame_clean_eof() {
        let mut empty: &[u8] = &[];
        let frame: Option<RpcRequest> = read_frame(&mut empty).await.unwrap();
        assert!(frame.is_none());
    }

    #[tokio::test]
    async fn test_read_frame_truncated_prefix_is_an_error() {
        // Peer died two bytes into the length prefix
        let mut cursor: &[u8] = &[0x00, 0x00];
        let result: Result<Option<RpcRequest>> = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(StardustError::Rpc(_))));
    }

    #[tokio::test]
    async fn test_read_frame_rejects_oversized_length() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(MAX_FRAME_LEN + 1).to_be_bytes());

        let mut cursor = buf.as_slice();
        let result: Result<Option<RpcRequest>> = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(StardustError::Rpc(_))));
    }

    #[tokio::test]
    async fn test_read_frame_rejects_garbage_payload() {
        let garbage = [0xffu8; 8];
        let mut buf = Vec::new();
        buf.extend_from_slice(&(garbage.len() as u32).to_be_bytes());
        buf.extend_from_slice(&garbage);

        let mut cursor = buf.as_slice();
        let result: Result<Option<RpcRequest>> = read_frame(&mut cursor).await;
        assert!(matches!(result, Err(StardustError::Rpc(_))));
    }

    #[tokio::test]
    async fn test_read_frame_truncated_body() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&16u32.to_be_bytes());
        buf.extend_from_slice(&[0u8; 4]); // body cut short

        let mut cursor = buf.as_slice();
        let result: Result<Option<RpcRequest>> = read_frame(&mut cursor).await;
        assert!(result.is_err());
    }
}
