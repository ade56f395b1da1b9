use crate::bridge::CommandHandler;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::SplitStream;
use tracing::{info, instrument, trace};

/// Answers newline-delimited JSON commands until the reader is exhausted, one response line per request line.
#[instrument(skip_all)]
pub async fn listen<R, W>(reader: R, mut writer: W, handler: &CommandHandler) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("🌉 Listening for commands...");
    // Raw segments, so a line that is not UTF-8 is answered like any other malformed line
    let mut lines = SplitStream::new(reader.split(b'\n'));

    while let Some(line) = lines.next().await {
        let line = line?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        trace!("🌉 Received: {}", String::from_utf8_lossy(&line));
        let response = handler.handle_line(&line).await;

        let mut bytes = serde_json::to_vec(&response)?;
        bytes.push(b'\n');
        writer.write_all(&bytes).await?;
        writer.flush().await?;
    }

    info!("🌉 Input closed, stopped listening");
    Ok(())
}
