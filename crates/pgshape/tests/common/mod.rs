//! Recording stand-in for a database connection.

#![allow(dead_code)]

use pgshape::{BuiltStatement, Connection, DriverError, Record};
use std::sync::Mutex;

/// What the stub answers to one statement.
pub enum Reply {
    Rows(Vec<Record>),
    Affected(u64),
    Fail(&'static str),
    /// Server rejection with this SQLSTATE
    Reject(&'static str),
}

type Responder = Box<dyn Fn(&BuiltStatement) -> Reply + Send + Sync>;

/// A [`Connection`] that records every statement it receives and answers
/// through a caller-supplied closure.
pub struct StubConnection {
    log: Mutex<Vec<BuiltStatement>>,
    responder: Responder,
}

impl StubConnection {
    pub fn new(responder: impl Fn(&BuiltStatement) -> Reply + Send + Sync + 'static) -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    /// Probes find a row when `probe_hit` is set; INSERT ... RETURNING echoes
    /// the inserted row; every other statement affects one row.
    pub fn echo(probe_hit: bool) -> Self {
        Self::new(move |stmt| {
            if is_probe(stmt) {
                return if probe_hit {
                    Reply::Rows(vec![Record::from_pairs([("?column?", 1i32)])])
                } else {
                    Reply::Rows(Vec::new())
                };
            }
            if stmt.sql().starts_with("INSERT") {
                return Reply::Rows(vec![echo_params(stmt)]);
            }
            Reply::Affected(1)
        })
    }

    /// Every statement returns these rows.
    pub fn rows(rows: Vec<Record>) -> Self {
        Self::new(move |_| Reply::Rows(rows.clone()))
    }

    pub fn statements(&self) -> Vec<BuiltStatement> {
        self.log.lock().unwrap().clone()
    }

    pub fn sql_log(&self) -> Vec<String> {
        self.statements()
            .iter()
            .map(|s| s.sql().to_string())
            .collect()
    }

    /// Whether a statement starting with `prefix` was issued.
    pub fn issued(&self, prefix: &str) -> bool {
        self.sql_log().iter().any(|sql| sql.starts_with(prefix))
    }

    fn reply(&self, stmt: &BuiltStatement) -> Reply {
        self.log.lock().unwrap().push(stmt.clone());
        (self.responder)(stmt)
    }
}

impl Connection for StubConnection {
    async fn query(&self, stmt: &BuiltStatement) -> Result<Vec<Record>, DriverError> {
        match self.reply(stmt) {
            Reply::Rows(rows) => Ok(rows),
            Reply::Affected(_) => Ok(Vec::new()),
            Reply::Fail(message) => Err(DriverError::other(message)),
            Reply::Reject(code) => Err(DriverError::server(code, "rejected")),
        }
    }

    async fn execute(&self, stmt: &BuiltStatement) -> Result<u64, DriverError> {
        match self.reply(stmt) {
            Reply::Rows(rows) => Ok(rows.len() as u64),
            Reply::Affected(n) => Ok(n),
            Reply::Fail(message) => Err(DriverError::other(message)),
            Reply::Reject(code) => Err(DriverError::server(code, "rejected")),
        }
    }
}

pub fn is_probe(stmt: &BuiltStatement) -> bool {
    stmt.sql().starts_with("SELECT 1 FROM")
}

/// A row holding every bound parameter under its name.
pub fn echo_params(stmt: &BuiltStatement) -> Record {
    Record::from_pairs(
        stmt.param_names()
            .zip(stmt.values())
            .map(|(name, value)| (name, value.clone())),
    )
}
