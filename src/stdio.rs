//! Line-delimited JSON-RPC over stdin/stdout
//!
//! One message per input line, one response per output line. Notifications
//! produce no output. Logging stays on stderr.

use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{error, info};

use crate::mcp::rpc::RpcReply;
use crate::mcp::server::handle_json_rpc_bytes;
use crate::AppState;

pub async fn run_stdio(state: AppState) -> io::Result<()> {
    info!("stdio transport starting");

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = BufWriter::new(io::stdout());

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        if let Some(reply) = reply_line(&state, &line).await {
            stdout.write_all(reply.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    info!("stdin closed, stdio transport stopping");
    Ok(())
}

/// Serialized reply for one input line, `None` for notifications.
pub async fn reply_line(state: &AppState, line: &str) -> Option<String> {
    let serialized = match handle_json_rpc_bytes(state, line.as_bytes()).await {
        RpcReply::Ok(response) | RpcReply::Rejected(response) => serde_json::to_string(&response),
        RpcReply::Batch(responses) => serde_json::to_string(&responses),
        RpcReply::Accepted => return None,
    };

    match serialized {
        Ok(text) => Some(text),
        Err(err) => {
            error!(error = %err, "failed to serialize stdio response");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    #[tokio::test]
    async fn request_line_yields_one_response_line() {
        let state = AppState::for_tests();
        let reply = reply_line(&state, r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
            .await
            .expect("response line");

        assert!(!reply.contains('\n'));
        let value: Value = serde_json::from_str(&reply).expect("json line");
        assert_eq!(value, json!({ "jsonrpc": "2.0", "id": 1, "result": {} }));
    }

    #[tokio::test]
    async fn notification_line_yields_nothing() {
        let state = AppState::for_tests();
        let reply = reply_line(
            &state,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        )
        .await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn garbage_line_yields_parse_error() {
        let state = AppState::for_tests();
        let reply = reply_line(&state, "{not json").await.expect("response line");
        let value: Value = serde_json::from_str(&reply).expect("json line");
        assert_eq!(value["error"]["code"], -32700);
        assert_eq!(value["id"], Value::Null);
    }
}
