//! Stdio transport — reads JSON-RPC from stdin, writes to stdout.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::protocol::ProtocolHandler;
use crate::types::{to_value, JsonRpcError, McpError, McpResult, RequestId};

use super::framing;

/// Stdio transport for desktop MCP clients.
pub struct StdioTransport {
    handler: ProtocolHandler,
}

impl StdioTransport {
    pub fn new(handler: ProtocolHandler) -> Self {
        Self { handler }
    }

    /// Serve stdin/stdout until EOF.
    pub async fn run(&self) -> McpResult<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve(reader, writer).await
    }

    /// Serve any line-oriented reader/writer pair until EOF.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();

        tracing::info!("Stdio transport started");

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                tracing::info!("EOF on stdin, shutting down");
                break;
            }

            // Bad bytes only poison their own line.
            let parsed = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => framing::parse_message(line),
                Err(e) => Err(McpError::ParseError(format!("Invalid UTF-8: {e}"))),
            };

            let response = match parsed {
                Ok(msg) => self.handler.handle_message(msg).await,
                Err(e) => {
                    tracing::warn!("Parse error: {e}");
                    Some(to_value(&JsonRpcError::new(
                        RequestId::Null,
                        e.code(),
                        e.to_string(),
                    )))
                }
            };

            if let Some(response) = response {
                let framed = framing::frame_message(&response)?;
                writer.write_all(framed.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }
}
