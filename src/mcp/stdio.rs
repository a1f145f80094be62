// src/mcp/stdio.rs

//! Line-delimited JSON-RPC over a byte stream (stdin/stdout in production).
//!
//! Each request runs as its own task; responses funnel through one writer
//! so lines never interleave.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::mcp::handler::handle_mcp_request;
use crate::mcp::protocol::{error_codes, Request, Response};
use crate::AppState;

/// Serves requests from `reader` until EOF, then waits for every in-flight
/// response to be written.
pub async fn serve<R, W>(reader: R, mut writer: W, state: AppState) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Response>();

    let writer_task = tokio::spawn(async move {
        while let Some(response) = rx.recv().await {
            let mut line = match serde_json::to_string(&response) {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to encode response: {}", e);
                    continue;
                }
            };
            debug!("Sending: {}", line);
            line.push('\n');
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut in_flight = JoinSet::new();
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("Received: {}", line);
        reap_finished(&mut in_flight);

        match serde_json::from_str::<Request>(line) {
            Ok(request) => {
                let state = state.clone();
                let tx = tx.clone();
                in_flight.spawn(async move {
                    if let Some(response) = handle_mcp_request(request, state).await {
                        // the writer only stops once every sender is gone
                        let _ = tx.send(response);
                    }
                });
            }
            Err(parse_error) => {
                error!("JSON parse error: {}", parse_error);
                let _ = tx.send(Response::error(
                    serde_json::Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {parse_error}"),
                ));
            }
        }
    }

    info!("EOF received, draining {} in-flight request(s)", in_flight.len());
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!("Request task failed: {}", e);
        }
    }
    drop(tx);

    match writer_task.await {
        Ok(result) => result,
        Err(e) => Err(std::io::Error::new(std::io::ErrorKind::Other, e)),
    }
}

/// Drops tasks that already completed so a long session only holds the
/// requests still running.
fn reap_finished(in_flight: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(joined) = in_flight.try_join_next() {
        if let Err(e) = joined {
            error!("Request task failed: {}", e);
        }
        reaped += 1;
    }
    reaped
}

/// Runs [`serve`] on the process's stdin and stdout.
pub async fn run_stdio(state: AppState) -> std::io::Result<()> {
    info!("Starting MCP server on stdin/stdout...");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let result = serve(stdin, tokio::io::stdout(), state).await;
    info!("MCP server shutting down");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn finished_requests_leave_the_set() {
        let mut in_flight = JoinSet::new();
        for _ in 0..50 {
            in_flight.spawn(async {});
        }
        let (release, hold) = tokio::sync::oneshot::channel::<()>();
        in_flight.spawn(async move {
            let _ = hold.await;
        });
        in_flight.spawn(async { panic!("handler blew up") });

        let mut reaped = 0;
        while in_flight.len() > 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            reaped += reap_finished(&mut in_flight);
        }
        assert_eq!(reaped, 51);

        release.send(()).unwrap();
        while !in_flight.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
            reaped += reap_finished(&mut in_flight);
        }
        assert_eq!(reaped, 52);
    }
}
