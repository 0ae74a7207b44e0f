//! Request handler for sdb-server

use sdb_core::expr::{self, EvalError};
use sdb_core::machine::{BadAddress, Machine, MemoryReader, DEREF_WIDTH};
use sdb_core::protocol::{InfoKind, MemoryWord, RegisterValue};
use sdb_core::watchpoint::{render_table, WatchpointPool};
use sdb_core::{MonitorConfig, Request, Response, Word};
use tracing::{debug, info, warn};

pub struct Handler {
    config: MonitorConfig,
    machine: Machine,
    watchpoints: WatchpointPool,
}

impl Handler {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            machine: config.machine(),
            watchpoints: config.watchpoint_pool(),
            config,
        }
    }

    pub fn handle(&mut self, request: &Request) -> Response {
        match request {
            Request::Initialize { config } => self.handle_initialize(config.clone()),
            Request::Eval { expr } => self.handle_eval(expr),
            Request::Examine { count, expr } => self.handle_examine(*count, expr),
            Request::Watch { expr } => self.handle_watch(expr),
            Request::Delete { id } => self.handle_delete(*id),
            Request::Info { what } => self.handle_info(*what),
            Request::SetRegister { name, value } => self.handle_set_register(name, *value),
            Request::WriteMemory { address, words } => self.handle_write_memory(*address, words),
            Request::Shutdown => {
                info!("Shutdown requested");
                Response::success()
            }
        }
    }

    fn handle_initialize(&mut self, config: Option<MonitorConfig>) -> Response {
        if let Some(config) = config {
            if let Err(e) = config.validate() {
                warn!("Rejected configuration: {:#}", e);
                return Response::error(format!("{:#}", e));
            }
            self.config = config;
        }
        info!(
            "Initializing: {} watchpoints, memory 0x{:08x}+0x{:x}",
            self.config.watchpoint_capacity, self.config.memory_base, self.config.memory_size
        );

        self.machine = self.config.machine();
        self.watchpoints = self.config.watchpoint_pool();
        Response::success()
    }

    fn evaluate(&self, expr_str: &str) -> Result<Word, EvalError> {
        expr::tokenize_and_evaluate(
            expr_str,
            &self.machine.registers,
            &self.machine.memory,
            self.config.max_tokens,
        )
    }

    fn handle_eval(&self, expr_str: &str) -> Response {
        debug!("Eval request: expr={}", expr_str);

        match self.evaluate(expr_str) {
            Ok(value) => Response::eval_result(value),
            Err(e) => Self::eval_error(expr_str, e),
        }
    }

    fn handle_examine(&self, count: usize, expr_str: &str) -> Response {
        debug!("Examine request: count={}, expr={}", count, expr_str);

        let base = match self.evaluate(expr_str) {
            Ok(value) => value,
            Err(e) => return Self::eval_error(expr_str, e),
        };

        let limit = self.machine.memory.size() / DEREF_WIDTH;
        if count > limit {
            return Response::error(format!(
                "Cannot examine {} words, physical memory holds {}",
                count, limit
            ));
        }

        let words = (0..count)
            .map(|i| {
                let address = word_address(base, i).ok_or(BadAddress {
                    address: base,
                    width: DEREF_WIDTH,
                })?;
                let value = self.machine.memory.read(address, DEREF_WIDTH)?;
                Ok(MemoryWord { address, value })
            })
            .collect::<Result<Vec<_>, BadAddress>>();

        match words {
            Ok(words) => Response::Memory { words },
            Err(e) => Response::error(e.to_string()),
        }
    }

    fn handle_watch(&mut self, expr_str: &str) -> Response {
        debug!("Watch request: expr={}", expr_str);

        // Reject expressions that can never be evaluated
        if let Err(e) = expr::prepare(expr_str, self.config.max_tokens) {
            return Self::eval_error(expr_str, e);
        }

        let expr_str = expr_str.trim();
        match self.watchpoints.create(expr_str) {
            Ok(id) => {
                info!("Watchpoint {}: {}", id, expr_str);
                Response::Watchpoint {
                    id,
                    expr: expr_str.to_string(),
                }
            }
            Err(e) => {
                warn!("{}", e);
                Response::error(e.to_string())
            }
        }
    }

    fn handle_delete(&mut self, id: usize) -> Response {
        debug!("Delete request: id={}", id);

        match self.watchpoints.delete(id) {
            Ok(_) => Response::success(),
            Err(e) => Response::error(e.to_string()),
        }
    }

    fn handle_info(&self, what: InfoKind) -> Response {
        match what {
            InfoKind::Registers => Response::Registers {
                registers: self
                    .machine
                    .registers
                    .iter()
                    .map(|(name, value)| RegisterValue {
                        name: name.to_string(),
                        value,
                    })
                    .collect(),
            },
            InfoKind::Watchpoints => Response::Watchpoints {
                watchpoints: self.watchpoints.list().cloned().collect(),
                table: render_table(self.watchpoints.list()),
            },
        }
    }

    fn handle_set_register(&mut self, name: &str, value: Word) -> Response {
        let name = name.strip_prefix('$').unwrap_or(name);
        match self.machine.registers.set(name, value) {
            Ok(()) => Response::success(),
            Err(e) => Response::error(e.to_string()),
        }
    }

    fn handle_write_memory(&mut self, address: Word, words: &[Word]) -> Response {
        let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
        match self.machine.memory.load(address, &bytes) {
            Ok(()) => Response::success(),
            Err(e) => Response::error(e.to_string()),
        }
    }

    /// Error response; lexing errors also point at the offending column
    fn eval_error(expr_str: &str, err: EvalError) -> Response {
        match &err {
            EvalError::Lex(lex) => {
                Response::error(format!("{}\n{}", err, lex.caret_line(expr_str)))
            }
            _ => Response::error(err.to_string()),
        }
    }
}

/// Address of the `index`-th word after `base`
fn word_address(base: Word, index: usize) -> Option<Word> {
    let offset = index.checked_mul(DEREF_WIDTH)?;
    Some(base.wrapping_add(Word::try_from(offset).ok()?))
}
