//! sdb Server
//!
//! JSON-RPC command dispatcher for the simulator monitor.
//! Communicates via stdin/stdout for easy subprocess management.
//!
//! Usage: `sdb-server [CONFIG.toml]`

use std::io::{self, BufRead, Write};

use anyhow::Result;
use sdb_core::protocol::RpcMessage;
use sdb_core::{MonitorConfig, Request, Response};
use tracing::{debug, error, info};

mod handler;

fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is for JSON-RPC)
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    info!("sdb-server starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => MonitorConfig::load(&path)?,
        None => MonitorConfig::default(),
    };
    debug!("Config: {:?}", config);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    let mut handler = handler::Handler::new(config);

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to read line: {}", e);
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        debug!("Received: {}", line);

        let mut shutdown = false;
        let response = match serde_json::from_str::<RpcMessage<Request>>(&line) {
            Ok(msg) => {
                shutdown = matches!(msg.content, Request::Shutdown);
                let result = handler.handle(&msg.content);
                RpcMessage::new(msg.id.unwrap_or(0), result)
            }
            Err(e) => RpcMessage::new(0, Response::error(format!("Parse error: {}", e))),
        };

        let response_json = serde_json::to_string(&response)?;
        debug!("Sending: {}", response_json);
        writeln!(stdout, "{}", response_json)?;
        stdout.flush()?;

        if shutdown {
            break;
        }
    }

    info!("sdb-server shutting down");
    Ok(())
}
