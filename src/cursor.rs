use crate::parser::{ParseError, ParseErrorKind};

/// Position-tracking view over the raw query text.
///
/// Every lexical decision of the parser goes through a `Cursor`. The index
/// counts characters, not bytes, and always stays within `0..=len`.
#[derive(Debug, Clone)]
pub struct Cursor<'q> {
    query: &'q str,
    input: Vec<char>,
    position: usize,
}

impl<'q> Cursor<'q> {
    pub fn new(query: &'q str) -> Self {
        Cursor {
            query,
            input: query.chars().collect(),
            position: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.position < self.input.len()
    }

    /// The character under the cursor, if any
    pub fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    pub fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    /// Up to `length` characters from the cursor, or `None` past the end.
    ///
    /// Near the end of input the returned text is shorter than `length`.
    pub fn peek(&self, length: usize) -> Option<String> {
        if !self.has_more() {
            return None;
        }
        let end = (self.position + length).min(self.input.len());
        Some(self.input[self.position..end].iter().collect())
    }

    /// Advance by `amount`, clamped to the end of input
    pub fn pop(&mut self, amount: usize) {
        self.position = (self.position + amount).min(self.input.len());
    }

    /// Consume and return one character
    pub fn next_char(&mut self) -> Option<char> {
        let ch = self.current_char();
        self.pop(1);
        ch
    }

    /// Test whether the text at the cursor starts with `pattern`, without consuming
    pub fn matches(&self, pattern: &str) -> bool {
        if !self.has_more() || pattern.is_empty() {
            return false;
        }
        pattern
            .chars()
            .enumerate()
            .all(|(offset, expected)| self.peek_char(offset) == Some(expected))
    }

    pub fn matches_any(&self, patterns: &[&str]) -> bool {
        patterns.iter().any(|p| self.matches(p))
    }

    /// Test whether the character under the cursor is one of `chars`
    pub fn at_any(&self, chars: &[char]) -> bool {
        self.current_char().is_some_and(|c| chars.contains(&c))
    }

    /// Fail unless the text at the cursor matches one of `patterns`.
    ///
    /// Nothing is consumed either way.
    pub fn expect(&self, patterns: &[&str]) -> Result<(), ParseError> {
        let expected = patterns.join(" or ");

        if !self.has_more() {
            return Err(self.error(
                ParseErrorKind::UnexpectedEnd,
                format!("Syntax Error : Unexpected end of query, expects {}", expected),
            ));
        }
        if !self.matches_any(patterns) {
            let width = patterns.iter().map(|p| p.chars().count()).max().unwrap_or(1);
            let found = self.peek(width).unwrap_or_default();
            return Err(self.error(
                ParseErrorKind::UnexpectedCharacter,
                format!(
                    "Syntax Error : Unexpected character '{}', expects '{}'",
                    found, expected
                ),
            ));
        }
        Ok(())
    }

    /// Build an error at the current index
    pub fn error(&self, kind: ParseErrorKind, message: impl Into<String>) -> ParseError {
        self.error_at(self.position, kind, message)
    }

    pub fn error_at(
        &self,
        index: usize,
        kind: ParseErrorKind,
        message: impl Into<String>,
    ) -> ParseError {
        ParseError {
            kind,
            query: self.query.to_string(),
            index,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_past_end() {
        let mut cursor = Cursor::new("ab");
        assert_eq!(cursor.peek(5).as_deref(), Some("ab"));
        cursor.pop(2);
        assert_eq!(cursor.peek(1), None);
        assert!(!cursor.has_more());
    }

    #[test]
    fn test_pop_is_clamped() {
        let mut cursor = Cursor::new(".a");
        cursor.pop(10);
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.next_char(), None);
        assert_eq!(cursor.index(), 2);
    }

    #[test]
    fn test_expect_reports_index() {
        let mut cursor = Cursor::new(".a)");
        cursor.pop(1);
        let err = cursor.expect(&[")"]).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedCharacter);
        assert_eq!(err.index, 1);

        cursor.pop(5);
        let err = cursor.expect(&[")"]).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);
    }
}
