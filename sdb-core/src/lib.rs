//! sdb Core Library
//!
//! Core functionality for a simulator debugger monitor:
//! - Expression tokenizing and evaluation against registers and memory
//! - Watchpoint pool
//! - Reference RV32 register file and physical memory
//! - JSON-RPC protocol and configuration

pub mod config;
pub mod expr;
pub mod machine;
pub mod protocol;
pub mod watchpoint;

pub use config::MonitorConfig;
pub use expr::{tokenize_and_evaluate, EvalError, Evaluator, LexError, Token, TokenKind};
pub use machine::{Machine, MemoryReader, RegisterLookup, Word};
pub use protocol::{Request, Response};
pub use watchpoint::{Watchpoint, WatchpointError, WatchpointPool};
