//! Newline-delimited JSON-RPC over stdin/stdout.
//!
//! One request is handled at a time. Stdout carries protocol messages only;
//! all logging goes to stderr.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::server::McpServer;

/// Serve requests from `reader`, writing responses to `writer`, until EOF or cancellation.
pub async fn serve<R, W>(
    server: &McpServer,
    mut reader: R,
    mut writer: W,
    cancel: CancellationToken,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();

    loop {
        line.clear();
        let n = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Stdio transport cancelled");
                break;
            }
            read = reader.read_until(b'\n', &mut line) => read?,
        };
        if n == 0 {
            info!("Stdin closed");
            break;
        }

        // Decoding happens in the validator so a bad line gets -32700.
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            continue;
        }

        let Some(response) = server.handle_bytes(trimmed).await else {
            continue;
        };
        let json = serde_json::to_string(&response).map_err(std::io::Error::other)?;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Run the stdio transport on the process stdin/stdout.
pub async fn run(server: &McpServer, cancel: CancellationToken) -> std::io::Result<()> {
    info!("MCP stdio transport started (JSON-RPC 2.0 over stdio)");
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    let result = serve(server, reader, writer, cancel).await;
    info!("MCP stdio transport stopped");
    result
}
