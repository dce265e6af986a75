use crate::ast::Command;

/// An ordered sequence of commands applied to one input value.
///
/// An empty statement returns its input unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Statement {
    pub commands: Vec<Command>,
}

impl Statement {
    pub fn new(commands: Vec<Command>) -> Self {
        Statement { commands }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The command that decides whether the statement reads or writes
    pub fn last(&self) -> Option<&Command> {
        self.commands.last()
    }
}

/// Statements joined by `|`; each consumes the previous one's result.
#[derive(Debug, Clone, PartialEq)]
pub struct PipedStatement {
    pub statements: Vec<Statement>,
}

/// A complete parsed query.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Statement(Statement),
    Piped(PipedStatement),
}

impl Query {
    /// Build a query from pipe segments, collapsing a single segment
    pub fn from_segments(mut statements: Vec<Statement>) -> Self {
        match statements.len() {
            0 => Query::default(),
            1 => Query::Statement(statements.remove(0)),
            _ => Query::Piped(PipedStatement { statements }),
        }
    }

    /// The pipe segments in evaluation order
    pub fn statements(&self) -> &[Statement] {
        match self {
            Query::Statement(statement) => std::slice::from_ref(statement),
            Query::Piped(piped) => &piped.statements,
        }
    }

    pub fn into_statements(self) -> Vec<Statement> {
        match self {
            Query::Statement(statement) => vec![statement],
            Query::Piped(piped) => piped.statements,
        }
    }
}

impl Default for Query {
    fn default() -> Self {
        Query::Statement(Statement::default())
    }
}
