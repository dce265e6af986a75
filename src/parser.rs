use std::fmt;

use crate::{
    ast::{Command, Function, IteratorSpec, Operand, Query, SelectorKey, Statement},
    convert::json_to_value,
    cursor::Cursor,
    value::Value,
};

/// Characters that end an untyped token and must be escaped to be used literally.
pub const SPECIAL_CHARS: [char; 10] = [',', '[', ']', '#', '.', '(', ')', '=', ':', '|'];

/// Escape character: `~c` stands for `c`.
pub const ESCAPE_CHAR: char = '~';

const TYPED_PREFIXES: [&str; 4] = ["i(", "s(", "f(", "j("];

/// Category of a [`ParseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The query ended where more input was required
    UnexpectedEnd,
    /// A character other than the expected one was found
    UnexpectedCharacter,
    /// A grammar rule was violated
    Syntax,
    /// A literal could not be used or coerced as required
    Type,
}

/// Error raised while parsing a query.
///
/// Carries the full query text and the character index where parsing failed,
/// so callers can point at the problem:
///
/// ```text
///  query : .world=hello.x
///                      ^
///  error : Statement of type Assignment must be the last statement
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub query: String,
    pub index: usize,
    pub message: String,
}

impl ParseError {
    /// A line with a caret under the failing index, aligned with the query text
    pub fn caret(&self) -> String {
        format!("{}^", " ".repeat(self.index))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " query : {}", self.query)?;
        writeln!(f, "         {}", self.caret())?;
        write!(f, " error : {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Recursive-descent parser over a [`Cursor`].
///
/// Every decision is made on one character of lookahead, so no routine ever
/// backtracks.
pub struct Parser<'q> {
    cursor: Cursor<'q>,
}

impl<'q> Parser<'q> {
    pub fn new(query: &'q str) -> Self {
        Parser {
            cursor: Cursor::new(query),
        }
    }

    /// Parse the whole query text
    pub fn parse(&mut self) -> Result<Query, ParseError> {
        let query = self.parse_query(&[])?;

        if self.cursor.has_more() {
            return Err(self.unexpected_character());
        }
        Ok(query)
    }

    /// Parse pipe-separated statements until end of input or a character in `stop`
    fn parse_query(&mut self, stop: &[char]) -> Result<Query, ParseError> {
        let mut segments = Vec::new();
        let mut commands: Vec<Command> = Vec::new();
        let mut after_group = false;

        while self.cursor.has_more() {
            if self.cursor.at_any(stop) {
                break;
            }
            if let Some(last) = commands.last()
                && last.is_terminal()
                && !self.cursor.matches("|")
            {
                return Err(self.cursor.error(
                    ParseErrorKind::Syntax,
                    format!("Statement of type {} must be the last statement", last.name()),
                ));
            }

            match self.cursor.current_char() {
                Some('[') => {
                    if !commands.is_empty() {
                        return Err(self.cursor.error(
                            ParseErrorKind::Syntax,
                            "List construction cannot happen in the middle of query",
                        ));
                    }
                    commands.push(self.parse_list_construction()?);
                }
                Some('(') => {
                    if !commands.is_empty() {
                        return Err(self.cursor.error(
                            ParseErrorKind::Syntax,
                            "Nested statement must begin a statement",
                        ));
                    }
                    let group = self.parse_group()?;
                    segments.extend(group.into_statements());
                    after_group = true;
                    continue;
                }
                Some('|') => {
                    self.cursor.pop(1);
                    if !(after_group && commands.is_empty()) {
                        segments.push(Statement::new(std::mem::take(&mut commands)));
                    }
                }
                Some('.') => {
                    if self.cursor.matches(".[") {
                        commands.push(self.parse_iterator()?);
                    } else {
                        commands.push(self.parse_selector()?);
                    }
                }
                Some('=') => {
                    let target = match commands.pop() {
                        Some(target) => target,
                        None => {
                            return Err(self.cursor.error(
                                ParseErrorKind::Syntax,
                                "Syntax Error : Cannot assign to root",
                            ));
                        }
                    };
                    commands.push(self.parse_assignment(target)?);
                }
                Some('#') => commands.push(self.parse_function_chain()?),
                _ => return Err(self.unexpected_character()),
            }
            after_group = false;
        }

        if !(after_group && commands.is_empty()) {
            segments.push(Statement::new(commands));
        }
        Ok(Query::from_segments(segments))
    }

    /// Parse `( query )`
    fn parse_group(&mut self) -> Result<Query, ParseError> {
        self.cursor.expect(&["("])?;
        self.cursor.pop(1); // consume (
        let query = self.parse_query(&[')'])?;
        self.cursor.expect(&[")"])?;
        self.cursor.pop(1); // consume )
        Ok(query)
    }

    fn parse_selector(&mut self) -> Result<Command, ParseError> {
        self.cursor.expect(&["."])?;
        self.cursor.pop(1); // consume .

        if !self.cursor.has_more() || self.cursor.at_any(&SPECIAL_CHARS) {
            let kind = if self.cursor.has_more() {
                ParseErrorKind::Syntax
            } else {
                ParseErrorKind::UnexpectedEnd
            };
            return Err(self
                .cursor
                .error(kind, "Syntax Error : Expected a selector after '.'"));
        }

        let start = self.cursor.index();
        let key = match self.parse_value()? {
            Value::String(s) => SelectorKey::String(s),
            Value::Integer(n) => SelectorKey::Integer(n),
            Value::Float(n) => SelectorKey::Float(n),
            other => {
                return Err(self.cursor.error_at(
                    start,
                    ParseErrorKind::Type,
                    format!("Type Error : Unable to use type {} for selector", other.kind()),
                ));
            }
        };
        Ok(Command::Selector(key))
    }

    /// Parse `.[*]`, `.[N]`, `.[a:b]`, `.[a:]` or `.[:b]`.
    ///
    /// A single index collapses to a selector.
    fn parse_iterator(&mut self) -> Result<Command, ParseError> {
        self.cursor.expect(&[".["])?;
        self.cursor.pop(2); // consume .[

        if !self.cursor.has_more() {
            return Err(self.cursor.error(
                ParseErrorKind::UnexpectedEnd,
                "Syntax Error : Unexpected end of query",
            ));
        }
        if self.cursor.matches("*]") {
            self.cursor.pop(2);
            return Ok(Command::Iterator(IteratorSpec::Wildcard));
        }

        let start_index = self.cursor.index();
        let start = self.parse_bound()?;

        if self.cursor.matches(":") {
            self.cursor.pop(1); // consume :
            let end = self.parse_bound()?;
            self.cursor.expect(&["]"])?;
            self.cursor.pop(1);
            return Ok(Command::Iterator(IteratorSpec::Range { start, end }));
        }

        self.cursor.expect(&["]"])?;
        self.cursor.pop(1);

        match start {
            Some(index) => Ok(Command::Selector(SelectorKey::Integer(index))),
            None => Err(self.cursor.error_at(
                start_index,
                ParseErrorKind::Syntax,
                "Syntax Error : Expected an index or range inside '.[ ]'",
            )),
        }
    }

    /// One side of a range; an empty bound is `None`
    fn parse_bound(&mut self) -> Result<Option<i64>, ParseError> {
        if !self.cursor.has_more() || self.cursor.at_any(&SPECIAL_CHARS) {
            return Ok(None);
        }
        let start = self.cursor.index();
        match self.parse_value()? {
            Value::Integer(n) => Ok(Some(n)),
            other => Err(self.cursor.error_at(
                start,
                ParseErrorKind::Type,
                format!(
                    "Type Error : Unable to use type {} for list iteration",
                    other.kind()
                ),
            )),
        }
    }

    /// Parse `=value` or `=(query)`; `target` is the command before `=`
    fn parse_assignment(&mut self, target: Command) -> Result<Command, ParseError> {
        let target = match target {
            Command::Selector(key) => key,
            other => {
                return Err(self.cursor.error(
                    ParseErrorKind::Syntax,
                    format!("Syntax Error : Cannot assign to {}", other.name()),
                ));
            }
        };

        self.cursor.expect(&["="])?;
        self.cursor.pop(1); // consume =

        let value = if self.cursor.matches("(") {
            Operand::Query(self.parse_group()?)
        } else {
            Operand::Literal(self.parse_value()?)
        };

        Ok(Command::Assignment { target, value })
    }

    fn parse_function_chain(&mut self) -> Result<Command, ParseError> {
        let mut functions = Vec::new();
        while self.cursor.matches("#") {
            functions.push(self.parse_function()?);
        }
        Ok(Command::FunctionChain(functions))
    }

    /// Parse `#name(arg, (query), ...)`. Names may contain `.` for namespacing.
    fn parse_function(&mut self) -> Result<Function, ParseError> {
        self.cursor.expect(&["#"])?;
        self.cursor.pop(1); // consume #

        let name_start = self.cursor.index();
        let name_stops: Vec<char> = SPECIAL_CHARS.iter().copied().filter(|c| *c != '.').collect();
        let name = self.parse_string(&name_stops)?;
        if name.is_empty() {
            return Err(self.cursor.error_at(
                name_start,
                ParseErrorKind::Syntax,
                "Syntax Error : Expected a function name after '#'",
            ));
        }

        self.cursor.expect(&["("])?;
        self.cursor.pop(1);

        let mut args = Vec::new();
        loop {
            self.skip_spaces();
            if !self.cursor.has_more() || self.cursor.matches(")") {
                break;
            }

            args.push(self.parse_element()?);

            self.skip_spaces();
            if self.cursor.matches(",") {
                self.cursor.pop(1);
            } else {
                self.cursor.expect(&[")"])?;
            }
        }

        self.cursor.expect(&[")"])?;
        self.cursor.pop(1);

        Ok(Function { name, args })
    }

    /// Parse `[element, element, ...]`
    fn parse_list_construction(&mut self) -> Result<Command, ParseError> {
        self.cursor.expect(&["["])?;
        self.cursor.pop(1); // consume [

        let mut elements = Vec::new();
        loop {
            self.skip_spaces();
            if !self.cursor.has_more() || self.cursor.matches("]") {
                break;
            }

            elements.push(self.parse_element()?);

            self.skip_spaces();
            if self.cursor.matches(",") {
                self.cursor.pop(1);
            } else {
                self.cursor.expect(&[",", "]"])?;
            }
        }

        self.cursor.expect(&["]"])?;
        self.cursor.pop(1);
        Ok(Command::ListConstruction(elements))
    }

    /// One function argument or list element.
    ///
    /// Leading spaces are skipped by the caller; an untyped token loses its
    /// trailing spaces before coercion, so `f(a, 0)` passes `0` as an integer.
    fn parse_element(&mut self) -> Result<Operand, ParseError> {
        if self.cursor.matches("(") {
            Ok(Operand::Query(self.parse_group()?))
        } else if self.cursor.matches_any(&TYPED_PREFIXES) {
            Ok(Operand::Literal(self.parse_value()?))
        } else {
            let token = self.parse_string(&SPECIAL_CHARS)?;
            Ok(Operand::Literal(coerce_literal(token.trim_end().to_string())))
        }
    }

    /// Parse a typed literal (`i(..)`, `f(..)`, `s(..)`, `j(..)`) or an untyped token
    fn parse_value(&mut self) -> Result<Value, ParseError> {
        if !self.cursor.matches_any(&TYPED_PREFIXES) {
            let token = self.parse_string(&SPECIAL_CHARS)?;
            return Ok(coerce_literal(token));
        }

        let tag = self.cursor.current_char();
        self.cursor.pop(2); // consume tag and (
        let body_start = self.cursor.index();

        if !self.cursor.has_more() {
            return Err(self.cursor.error(
                ParseErrorKind::UnexpectedEnd,
                "Syntax Error : Unexpected end of query",
            ));
        }
        let body = self.parse_string(&[')'])?;
        self.cursor.expect(&[")"])?;
        self.cursor.pop(1);

        let type_error = |message: String| {
            self.cursor
                .error_at(body_start, ParseErrorKind::Type, message)
        };

        match tag {
            Some('i') => body
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| type_error(format!("Type Error : Unable to parse {} as int", body))),
            Some('f') => match body.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Value::Float(n)),
                _ => Err(type_error(format!(
                    "Type Error : Unable to parse {} as float",
                    body
                ))),
            },
            Some('j') => match serde_json::from_str::<serde_json::Value>(&body) {
                Ok(json) if json.is_object() || json.is_array() => Ok(json_to_value(json)),
                Ok(json) => Err(type_error(format!(
                    "Type Error : Unknown type {} after parsing a json type",
                    json_to_value(json).kind()
                ))),
                Err(_) => Err(type_error(format!(
                    "Type Error : Unable to parse {} as json-type",
                    body
                ))),
            },
            _ => Ok(Value::String(body)),
        }
    }

    /// Read characters up to one in `stop`, resolving `~` escapes
    fn parse_string(&mut self, stop: &[char]) -> Result<String, ParseError> {
        let mut result = String::new();

        while let Some(ch) = self.cursor.current_char() {
            if ch == ESCAPE_CHAR {
                self.cursor.pop(1); // consume ~
                match self.cursor.next_char() {
                    Some(escaped) => result.push(escaped),
                    None => {
                        return Err(self.cursor.error(
                            ParseErrorKind::UnexpectedEnd,
                            "Unexpected end of string",
                        ));
                    }
                }
                continue;
            }
            if stop.contains(&ch) {
                break;
            }
            result.push(ch);
            self.cursor.pop(1);
        }
        Ok(result)
    }

    fn skip_spaces(&mut self) {
        while self.cursor.current_char().is_some_and(char::is_whitespace) {
            self.cursor.pop(1);
        }
    }

    fn unexpected_character(&self) -> ParseError {
        let found = self.cursor.current_char().map(String::from).unwrap_or_default();
        self.cursor.error(
            ParseErrorKind::UnexpectedCharacter,
            format!("Syntax Error : Unexpected character '{}'", found),
        )
    }
}

/// Coerce an untyped token: integer, then finite float, else string.
///
/// # Examples
///
/// ```
/// use jpio::{Value, parser::coerce_literal};
///
/// assert_eq!(coerce_literal("42".into()), Value::Integer(42));
/// assert_eq!(coerce_literal("4.5".into()), Value::Float(4.5));
/// assert_eq!(coerce_literal("inf".into()), Value::String("inf".into()));
/// ```
pub fn coerce_literal(token: String) -> Value {
    if let Ok(n) = token.parse::<i64>() {
        return Value::Integer(n);
    }
    if let Ok(n) = token.parse::<f64>()
        && n.is_finite()
    {
        return Value::Float(n);
    }
    Value::String(token)
}

/// Parse a complete query.
///
/// # Examples
///
/// ```
/// use jpio::{parse, Query};
///
/// let query = parse(".books.[*].name").unwrap();
/// assert!(matches!(query, Query::Statement(ref s) if s.commands.len() == 3));
/// ```
pub fn parse(query: &str) -> Result<Query, ParseError> {
    let parsed = Parser::new(query).parse()?;
    log::debug!(
        "parsed query {:?} into {} statement(s)",
        query,
        parsed.statements().len()
    );
    Ok(parsed)
}
