//! Binary entry point: loads config, opens the account store, and runs a
//! line-delimited stdio JSON command loop (spec §6). Each line in is
//! `{"command": "dw_<op>", "id": <int>, "params": [...]}`; each line out is
//! `{"id": <int>, "error": <string | null>, "result": [...]}`.
//!
//! The framing, transport, and session lifecycle spec §6 places outside
//! this core's scope are intentionally this thin: stdio exists so the
//! operation table can be driven manually or from a test harness, not as a
//! production session protocol.

mod dispatch;

use std::path::PathBuf;

use dw_wallet::Wallet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt};

#[derive(Debug, Deserialize)]
struct Request {
    command: String,
    id: i64,
    #[serde(default)]
    params: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct Response {
    id: i64,
    error: Option<String>,
    result: Vec<Value>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dw_common::logging::init_tracing();

    let mut args = std::env::args().skip(1);
    let accounts_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./accounts"));
    let settings_path = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("./settings.toml"));

    let wallet = match Wallet::open(accounts_dir, settings_path) {
        Ok(wallet) => wallet,
        Err(err) => {
            tracing::error!(error = %err, "failed to open wallet");
            std::process::exit(1);
        }
    };

    run(wallet).await;
}

async fn run(wallet: Wallet) {
    let stdin = io::BufReader::new(io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = io::stdout();

    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(&wallet, request).await,
            Err(err) => {
                tracing::warn!(error = %err, "malformed request line");
                Response { id: -1, error: Some("malformed_request".to_string()), result: vec![] }
            }
        };

        let Ok(mut encoded) = serde_json::to_string(&response) else { continue };
        encoded.push('\n');
        if stdout.write_all(encoded.as_bytes()).await.is_err() || stdout.flush().await.is_err() {
            break;
        }
    }
}

async fn handle_request(wallet: &Wallet, request: Request) -> Response {
    match dispatch::handle(wallet, &request.command, &request.params).await {
        Ok(result) => Response { id: request.id, error: None, result },
        Err(err) => {
            let wire_name = err.wire_name().map(str::to_string).unwrap_or_else(|| err.to_string());
            tracing::warn!(command = %request.command, error = %err, "command failed");
            Response { id: request.id, error: Some(wire_name), result: vec![] }
        }
    }
}
