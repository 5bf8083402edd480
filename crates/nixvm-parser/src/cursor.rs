//! Character cursor over nixvm source text.
//!
//! Tracks a byte offset plus 1-based line and column, classifies characters,
//! and skips trivia (whitespace and comments). The parser drives it directly;
//! there is no separate token stream.

/// A location in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

/// Characters that can start an identifier.
pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Characters that can continue an identifier. Includes `.`, so `a.b` is a
/// single identifier.
pub fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit() || matches!(c, '-' | '\'' | '.')
}

/// Characters collected into operator text.
pub fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '&' | '|' | '!' | '?'
    )
}

pub fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

/// Cursor over an immutable source buffer.
pub struct Cursor<'a> {
    source: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            offset: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// The current character, or `'\0'` at end of input.
    pub fn peek(&self) -> char {
        self.rest().chars().next().unwrap_or('\0')
    }

    /// The character after the current one, or `'\0'`.
    pub fn peek_next(&self) -> char {
        self.rest().chars().nth(1).unwrap_or('\0')
    }

    /// Unconsumed input.
    pub fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    /// Consume one character, keeping line and column current.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.rest().chars().next()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consume `c` if it is the current character.
    pub fn eat(&mut self, c: char) -> bool {
        if !self.is_at_end() && self.peek() == c {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume `literal` if the input continues with it.
    pub fn eat_str(&mut self, literal: &str) -> bool {
        if !self.rest().starts_with(literal) {
            return false;
        }
        for _ in literal.chars() {
            self.advance();
        }
        true
    }

    /// Consume characters while `pred` holds and return them.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while !self.is_at_end() && pred(self.peek()) {
            self.advance();
        }
        &self.source[start..self.pos]
    }

    /// The identifier word starting at the cursor, without consuming it.
    /// Empty when the current character cannot start an identifier.
    pub fn word(&self) -> &'a str {
        let rest = self.rest();
        if !rest.starts_with(is_ident_start) {
            return "";
        }
        let end = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
        &rest[..end]
    }

    /// Consume `keyword` if the next word is exactly `keyword`.
    pub fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.word() == keyword && self.eat_str(keyword)
    }

    /// Jump to the end of input.
    pub fn skip_to_end(&mut self) {
        while self.advance().is_some() {}
    }

    pub fn skip_whitespace(&mut self) {
        self.eat_while(is_whitespace);
    }

    /// Skip a `//` or `#` comment through the end of the line.
    pub fn skip_line_comment(&mut self) {
        self.eat_while(|c| c != '\n');
        self.eat('\n');
    }

    /// Skip a `/* ... */` comment. Returns false if input ended first.
    pub fn skip_block_comment(&mut self) -> bool {
        self.eat_str("/*");
        loop {
            if self.is_at_end() {
                return false;
            }
            if self.eat_str("*/") {
                return true;
            }
            self.advance();
        }
    }

    /// Skip whitespace and, when `comments` is set, comments.
    ///
    /// Returns the start of an unterminated block comment as the error.
    pub fn skip_trivia(&mut self, comments: bool) -> Result<(), Position> {
        loop {
            self.skip_whitespace();
            if !comments {
                return Ok(());
            }
            match (self.peek(), self.peek_next()) {
                ('#', _) | ('/', '/') => self.skip_line_comment(),
                ('/', '*') => {
                    let start = self.position();
                    if !self.skip_block_comment() {
                        return Err(start);
                    }
                }
                _ => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // =========================================================================
    // Classification
    // =========================================================================

    #[test]
    fn test_ident_classes() {
        assert!(is_ident_start('a'));
        assert!(is_ident_start('_'));
        assert!(!is_ident_start('1'));
        assert!(!is_ident_start('-'));

        for c in ['z', '9', '-', '\'', '.'] {
            assert!(is_ident_char(c), "{c:?} should continue an identifier");
        }
        assert!(!is_ident_char('='));
        assert!(!is_ident_char(' '));
    }

    #[test]
    fn test_operator_chars() {
        for c in "+-*/%<>=&|!?".chars() {
            assert!(is_operator_char(c));
        }
        assert!(!is_operator_char('('));
        assert!(!is_operator_char('.'));
    }

    // =========================================================================
    // Position tracking
    // =========================================================================

    #[test]
    fn test_newline_resets_column() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.eat_while(|c| c != 'c');
        assert_eq!(
            cursor.position(),
            Position {
                offset: 3,
                line: 2,
                column: 1
            }
        );
    }

    #[test]
    fn test_multibyte_advances_one_column() {
        let mut cursor = Cursor::new("é=");
        assert_eq!(cursor.advance(), Some('é'));
        assert_eq!(cursor.offset(), 2);
        assert_eq!(cursor.position().column, 2);
        assert_eq!(cursor.peek(), '=');
    }

    #[test]
    fn test_peek_at_end() {
        let mut cursor = Cursor::new("x");
        assert_eq!(cursor.peek_next(), '\0');
        cursor.advance();
        assert!(cursor.is_at_end());
        assert_eq!(cursor.peek(), '\0');
        assert_eq!(cursor.advance(), None);
    }

    // =========================================================================
    // Words and keywords
    // =========================================================================

    #[test]
    fn test_word_is_maximal() {
        let cursor = Cursor::new("iffy-name.attr = 1");
        assert_eq!(cursor.word(), "iffy-name.attr");
        assert_eq!(Cursor::new("1abc").word(), "");
    }

    #[test]
    fn test_eat_keyword_requires_whole_word() {
        let mut cursor = Cursor::new("input");
        assert!(!cursor.eat_keyword("in"));
        assert_eq!(cursor.offset(), 0);

        let mut cursor = Cursor::new("in x");
        assert!(cursor.eat_keyword("in"));
        assert_eq!(cursor.rest(), " x");
    }

    // =========================================================================
    // Trivia
    // =========================================================================

    #[test]
    fn test_skip_whitespace_tracks_lines() {
        let mut cursor = Cursor::new(" \t\r\n  x");
        cursor.skip_whitespace();
        assert_eq!(cursor.peek(), 'x');
        assert_eq!(cursor.position().line, 2);
        assert_eq!(cursor.position().column, 3);
    }

    #[test]
    fn test_skip_comments() {
        let mut cursor = Cursor::new("// one\n# two\n/* three\n */ x");
        assert_eq!(cursor.skip_trivia(true), Ok(()));
        assert_eq!(cursor.peek(), 'x');
        assert_eq!(cursor.position().line, 4);
    }

    #[test]
    fn test_comments_kept_when_disabled() {
        let mut cursor = Cursor::new("  // x");
        assert_eq!(cursor.skip_trivia(false), Ok(()));
        assert_eq!(cursor.rest(), "// x");
    }

    #[test]
    fn test_unterminated_block_comment() {
        let mut cursor = Cursor::new(" /* open");
        let err = cursor.skip_trivia(true).unwrap_err();
        assert_eq!(err.column, 2);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_eat_str_mismatch_does_not_advance() {
        let mut cursor = Cursor::new("thex");
        assert!(!cursor.eat_str("then"));
        assert_eq!(cursor.offset(), 0);
        assert!(cursor.eat_str("the"));
        assert_eq!(cursor.position().column, 4);
    }
}
