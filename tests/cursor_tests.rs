use jpio::{Cursor, ParseErrorKind};

#[test]
fn test_new_cursor_starts_at_zero() {
    let cursor = Cursor::new(".a.b");
    assert_eq!(cursor.index(), 0);
    assert_eq!(cursor.len(), 4);
    assert!(cursor.has_more());
    assert_eq!(cursor.current_char(), Some('.'));
}

#[test]
fn test_empty_query() {
    let cursor = Cursor::new("");
    assert!(cursor.is_empty());
    assert!(!cursor.has_more());
    assert_eq!(cursor.current_char(), None);
    assert_eq!(cursor.peek(1), None);
    assert!(!cursor.matches("."));
}

#[test]
fn test_peek_does_not_consume() {
    let cursor = Cursor::new("#sort()");
    assert_eq!(cursor.peek(5), Some("#sort".to_string()));
    assert_eq!(cursor.peek(100), Some("#sort()".to_string()));
    assert_eq!(cursor.peek_char(1), Some('s'));
    assert_eq!(cursor.index(), 0);
}

#[test]
fn test_pop_and_next_char() {
    let mut cursor = Cursor::new("ab");
    assert_eq!(cursor.next_char(), Some('a'));
    assert_eq!(cursor.next_char(), Some('b'));
    assert_eq!(cursor.next_char(), None);
    assert_eq!(cursor.index(), 2);

    cursor.pop(10);
    assert_eq!(cursor.index(), 2);
}

#[test]
fn test_index_counts_characters() {
    let mut cursor = Cursor::new(".héllo");
    cursor.pop(3);
    assert_eq!(cursor.current_char(), Some('l'));
    assert_eq!(cursor.len(), 6);
}

#[test]
fn test_matches_patterns() {
    let mut cursor = Cursor::new(".[*]");
    assert!(cursor.matches(".["));
    assert!(!cursor.matches(".[*]x"));
    assert!(cursor.matches_any(&["#", ".["]));
    assert!(cursor.at_any(&['.', '#']));

    cursor.pop(2);
    assert!(cursor.matches("*]"));
    assert!(!cursor.at_any(&['.', '#']));
}

#[test]
fn test_expect_unexpected_character() {
    let mut cursor = Cursor::new(".a=5");
    cursor.pop(2);
    let err = cursor.expect(&["]"]).unwrap_err();

    assert_eq!(err.kind, ParseErrorKind::UnexpectedCharacter);
    assert_eq!(err.index, 2);
    assert_eq!(err.query, ".a=5");
    assert!(err.message.contains("Unexpected character '='"));
}

#[test]
fn test_expect_unexpected_end() {
    let mut cursor = Cursor::new("#f(");
    cursor.pop(3);
    let err = cursor.expect(&[")"]).unwrap_err();

    assert_eq!(err.kind, ParseErrorKind::UnexpectedEnd);
    assert_eq!(err.index, 3);
    assert!(err.message.contains("Unexpected end of query, expects )"));
}

#[test]
fn test_expect_success_consumes_nothing() {
    let cursor = Cursor::new("|.a");
    assert!(cursor.expect(&[",", "|"]).is_ok());
    assert_eq!(cursor.index(), 0);
}
