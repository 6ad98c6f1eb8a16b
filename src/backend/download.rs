//! Chunked streaming download of audio files.

use std::io::{self, Write};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::TryStreamExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::io::StreamReader;

use super::types::BackendError;

/// Default chunk size for streaming downloads (5 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Download `url` into `sink`, holding at most `chunk_size` bytes in memory.
///
/// Returns the number of bytes written.
pub async fn download_file<W>(
    url: &str,
    sink: &mut W,
    chunk_size: usize,
) -> Result<u64, BackendError>
where
    W: AsyncWrite + Unpin,
{
    if chunk_size == 0 {
        return Err(zero_chunk_size().into());
    }

    let response = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

    if !response.status().is_success() {
        return Err(BackendError::RequestFailed(format!(
            "Download failed: {}",
            response.status()
        )));
    }

    let reader = StreamReader::new(response.bytes_stream().map_err(io::Error::other));
    tokio::pin!(reader);

    let written = copy_chunked(&mut reader, sink, chunk_size).await?;
    tracing::info!(url, bytes = written, "Download complete");

    Ok(written)
}

fn zero_chunk_size() -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        "chunk size must be greater than zero",
    )
}

/// Copy `reader` into `sink` one chunk at a time.
///
/// Each chunk is filled by repeated reads until it is full or a read returns
/// zero bytes, then written out. The first zero-length read ends the copy.
pub async fn copy_chunked<R, W>(reader: &mut R, sink: &mut W, chunk_size: usize) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if chunk_size == 0 {
        return Err(zero_chunk_size());
    }

    let mut buffer = vec![0u8; chunk_size];
    let mut total = 0u64;

    loop {
        let mut filled = 0;
        let mut exhausted = false;

        while filled < chunk_size {
            let read = reader.read(&mut buffer[filled..]).await?;
            if read == 0 {
                exhausted = true;
                break;
            }
            filled += read;
        }

        if filled > 0 {
            sink.write_all(&buffer[..filled]).await?;
            total += filled as u64;
        }

        if exhausted {
            break;
        }
    }

    sink.flush().await?;
    Ok(total)
}

/// Adapts a blocking [`Write`] to [`AsyncWrite`].
///
/// Only meant for the dedicated runtime of the blocking API, where stalling
/// the executor thread on a write is harmless.
pub struct BlockingSink<W>(pub W);

impl<W: Write + Unpin> AsyncWrite for BlockingSink<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(self.get_mut().0.write(buf))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(self.get_mut().0.flush())
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(self.get_mut().0.flush())
    }
}
