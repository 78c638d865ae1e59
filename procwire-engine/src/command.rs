//! Commands issued against a connection.

use procwire_core::{InvocationStyle, Parameter, ProcedureName};
use std::fmt;

/// Identifier of a transaction opened on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

/// What a command runs.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    /// A stored procedure call; the backend renders the call text.
    StoredProcedure {
        name: ProcedureName,
        style: InvocationStyle,
    },
    /// Literal statement text (cursor fetch/close).
    Text(String),
}

/// A command with its ordered, named parameters and attached transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    kind: CommandKind,
    parameters: Vec<Parameter>,
    transaction: Option<TransactionId>,
}

impl Command {
    pub fn stored_procedure(name: ProcedureName, style: InvocationStyle) -> Self {
        Self {
            kind: CommandKind::StoredProcedure { name, style },
            parameters: Vec::new(),
            transaction: None,
        }
    }

    pub fn text(sql: impl Into<String>) -> Self {
        Self {
            kind: CommandKind::Text(sql.into()),
            parameters: Vec::new(),
            transaction: None,
        }
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn bind(&mut self, parameters: Vec<Parameter>) {
        self.parameters.extend(parameters);
    }

    pub fn clear_parameters(&mut self) {
        self.parameters.clear();
    }

    pub fn attach(&mut self, transaction: TransactionId) {
        self.transaction = Some(transaction);
    }

    pub fn transaction(&self) -> Option<TransactionId> {
        self.transaction
    }

    /// Procedure name, for stored procedure commands.
    pub fn procedure(&self) -> Option<&ProcedureName> {
        match &self.kind {
            CommandKind::StoredProcedure { name, .. } => Some(name),
            CommandKind::Text(_) => None,
        }
    }
}

/// Quote an SQL identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// `FETCH ALL FROM "<cursor>"`.
pub fn fetch_all(cursor: &str) -> Command {
    Command::text(format!("FETCH ALL FROM {}", quote_ident(cursor)))
}

/// `CLOSE "<cursor>"`.
pub fn close_cursor(cursor: &str) -> Command {
    Command::text(format!("CLOSE {}", quote_ident(cursor)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_doubles_quotes() {
        assert_eq!(quote_ident("cur_a"), "\"cur_a\"");
        assert_eq!(quote_ident("<unnamed portal 1>"), "\"<unnamed portal 1>\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_fetch_all_text() {
        assert_eq!(
            fetch_all("cur_a").kind(),
            &CommandKind::Text("FETCH ALL FROM \"cur_a\"".to_string())
        );
    }

    #[test]
    fn test_attach_and_clear() {
        let mut command = Command::stored_procedure(
            ProcedureName::new(None, "get_order"),
            InvocationStyle::Function,
        );
        command.bind(vec![Parameter::new("id", procwire_core::SqlValue::I32(1))]);
        command.attach(TransactionId(3));
        assert_eq!(command.transaction(), Some(TransactionId(3)));
        assert_eq!(command.parameters().len(), 1);
        command.clear_parameters();
        assert!(command.parameters().is_empty());
    }
}
