//! JSON-RPC Protocol definitions
//!
//! Defines the communication protocol between a monitor front end and
//! sdb-server. One JSON message per line.

use serde::{Deserialize, Serialize};

use crate::config::MonitorConfig;
use crate::machine::Word;
use crate::watchpoint::Watchpoint;

/// Which `info` listing to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoKind {
    /// Registers
    #[serde(rename = "r")]
    Registers,
    /// Watchpoints
    #[serde(rename = "w")]
    Watchpoints,
}

/// Request from the front end to sdb-server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum Request {
    /// Reset machine state and watchpoints
    #[serde(rename = "initialize")]
    Initialize {
        #[serde(default)]
        config: Option<MonitorConfig>,
    },

    /// Evaluate an expression (`p EXPR`)
    #[serde(rename = "eval")]
    Eval { expr: String },

    /// Dump `count` words starting at the value of `expr` (`x N EXPR`)
    #[serde(rename = "examine")]
    Examine { count: usize, expr: String },

    /// Set a watchpoint (`w EXPR`)
    #[serde(rename = "watch")]
    Watch { expr: String },

    /// Delete a watchpoint (`d N`)
    #[serde(rename = "delete")]
    Delete { id: usize },

    /// `info r` / `info w`
    #[serde(rename = "info")]
    Info { what: InfoKind },

    /// Update a register, as the simulator would after executing
    #[serde(rename = "set_register")]
    SetRegister { name: String, value: Word },

    /// Store words into memory starting at `address`
    #[serde(rename = "write_memory")]
    WriteMemory { address: Word, words: Vec<Word> },

    /// Shutdown the server
    #[serde(rename = "shutdown")]
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterValue {
    pub name: String,
    pub value: Word,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryWord {
    pub address: Word,
    pub value: Word,
}

/// Response from sdb-server to the front end
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    EvalResult { value: Word, hex: String },
    Memory { words: Vec<MemoryWord> },
    Watchpoint { id: usize, expr: String },
    Registers { registers: Vec<RegisterValue> },
    Watchpoints { watchpoints: Vec<Watchpoint>, table: String },
    Success { ok: bool },
    Error { error: String },
}

impl Response {
    pub fn success() -> Self {
        Response::Success { ok: true }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Response::Error { error: msg.into() }
    }

    pub fn eval_result(value: Word) -> Self {
        Response::EvalResult {
            value,
            hex: format!("{:#010x}", value),
        }
    }
}

/// JSON-RPC message wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcMessage<T> {
    pub jsonrpc: String,
    pub id: Option<u64>,
    #[serde(flatten)]
    pub content: T,
}

impl<T> RpcMessage<T> {
    pub fn new(id: u64, content: T) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: Some(id),
            content,
        }
    }
}
