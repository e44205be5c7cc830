// ABOUTME: Two-pass lexer: raw token scan, then classification of Unknown tokens

use crate::error::ReadError;
use crate::special_form::SpecialForm;
use crate::token::{RawToken, Token};
use std::iter::Peekable;
use std::str::Chars;

const BUILTIN_NAMES: &[&str] = &[
    ".+", ".-", ".*", "./", ".<", ".<=", ".>", ".>=", ".=", ".==", ".list", ".concat", ".seq",
    ".first", ".next", ".rest", ".conj", ".reduce", ".rand", ".print",
];

fn is_builtin_name(s: &str) -> bool {
    BUILTIN_NAMES.contains(&s)
}

fn is_delimiter(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '[' | ']' | '{' | '}' | '\'' | '`' | '~' | ';' | '"' | '#' | '\\'
    ) || c.is_whitespace()
        || c == ','
}

fn is_literal_terminator(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '\\' | '(' | ')' | '[' | ']' | '{' | '}' | '"' | '`' | '@' | '~'
        )
}

struct RawLexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> RawLexer<'a> {
    fn new(src: &'a str) -> Self {
        RawLexer {
            chars: src.chars().peekable(),
        }
    }

    fn next_token(&mut self) -> Result<Option<RawToken>, ReadError> {
        loop {
            match self.chars.peek() {
                None => return Ok(None),
                Some(&c) if c.is_whitespace() || c == ',' => {
                    self.chars.next();
                    continue;
                }
                Some(&';') => {
                    while let Some(&c) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                    continue;
                }
                _ => break,
            }
        }

        let c = match self.chars.next() {
            Some(c) => c,
            None => return Ok(None),
        };

        let tok = match c {
            '(' => RawToken::LParen,
            ')' => RawToken::RParen,
            '[' => RawToken::LBracket,
            ']' => RawToken::RBracket,
            '{' => RawToken::LBrace,
            '}' => RawToken::RBrace,
            '\'' => RawToken::Quote,
            '`' => RawToken::SyntaxQuote,
            '~' => {
                if self.chars.peek() == Some(&'@') {
                    self.chars.next();
                    RawToken::UnquoteSplice
                } else {
                    RawToken::Unquote
                }
            }
            '#' => self.lex_dispatch()?,
            '"' => RawToken::StringLiteral(self.lex_string()?),
            '\\' => RawToken::CharLiteral(self.lex_char_literal()?),
            other => {
                let mut s = String::new();
                s.push(other);
                while let Some(&c) = self.chars.peek() {
                    if is_delimiter(c) {
                        break;
                    }
                    s.push(c);
                    self.chars.next();
                }
                RawToken::Unknown(s)
            }
        };
        Ok(Some(tok))
    }

    fn lex_dispatch(&mut self) -> Result<RawToken, ReadError> {
        match self.chars.next() {
            Some('{') => Ok(RawToken::SetStart),
            Some('"') => Ok(RawToken::RegexPattern(self.lex_regex_body()?)),
            Some('\'') => Ok(RawToken::VarQuote),
            Some('(') => Ok(RawToken::InlineFnStart),
            Some('_') => Ok(RawToken::IgnoreNext),
            Some(other) => Err(ReadError::InvalidDispatchMacro(other)),
            None => Err(ReadError::InvalidDispatchMacro('\0')),
        }
    }

    /// Regex literal bodies use raw escape rules: a backslash still
    /// protects the following character from terminating the literal, but
    /// no escape sequence is decoded — the stored pattern keeps backslashes
    /// verbatim (spec.md §4.1).
    fn lex_regex_body(&mut self) -> Result<String, ReadError> {
        let mut s = String::new();
        loop {
            match self.chars.next() {
                None => return Err(ReadError::NonTerminatedString),
                Some('"') => return Ok(s),
                Some('\\') => {
                    s.push('\\');
                    match self.chars.next() {
                        Some(c) => s.push(c),
                        None => return Err(ReadError::NonTerminatedString),
                    }
                }
                Some(c) => s.push(c),
            }
        }
    }

    fn lex_string(&mut self) -> Result<String, ReadError> {
        let mut s = String::new();
        loop {
            match self.chars.next() {
                None => return Err(ReadError::NonTerminatedString),
                Some('"') => return Ok(s),
                Some('\\') => match self.chars.next() {
                    Some('r') => s.push('\r'),
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('"') => s.push('"'),
                    Some('\\') => s.push('\\'),
                    Some(other) => return Err(ReadError::InvalidStringEscapeSequence(other)),
                    None => return Err(ReadError::NonTerminatedString),
                },
                Some(c) => s.push(c),
            }
        }
    }

    fn lex_char_literal(&mut self) -> Result<char, ReadError> {
        let first = self
            .chars
            .next()
            .ok_or_else(|| ReadError::InvalidCharacter(String::new()))?;

        match self.chars.peek() {
            None => return Ok(first),
            Some(&next) if is_literal_terminator(next) => return Ok(first),
            _ => {}
        }

        let mut run = String::new();
        run.push(first);
        while let Some(&c) = self.chars.peek() {
            if is_literal_terminator(c) {
                break;
            }
            run.push(c);
            self.chars.next();
        }

        match run.as_str() {
            "space" => Ok(' '),
            "tab" => Ok('\t'),
            "newline" => Ok('\n'),
            "return" => Ok('\r'),
            "backspace" => Ok('\u{8}'),
            "formfeed" => Ok('\u{c}'),
            _ if run.starts_with('u') => {
                let hex = &run[1..];
                if hex.len() == 4 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    let code = u32::from_str_radix(hex, 16).unwrap();
                    char::from_u32(code).ok_or(ReadError::InvalidUnicode(run))
                } else {
                    Err(ReadError::InvalidUnicode(run))
                }
            }
            _ if run.starts_with('o') => {
                let oct = &run[1..];
                if oct.len() == 3 && oct.chars().all(|c| ('0'..='7').contains(&c)) {
                    let value = u32::from_str_radix(oct, 8).unwrap();
                    if value < 256 {
                        Ok(char::from_u32(value).unwrap())
                    } else {
                        Err(ReadError::InvalidOctal(run))
                    }
                } else {
                    Err(ReadError::InvalidOctal(run))
                }
            }
            _ => Err(ReadError::InvalidCharacter(run)),
        }
    }
}

fn classify(raw: RawToken) -> Result<Token, ReadError> {
    let s = match raw {
        RawToken::LParen => return Ok(Token::LParen),
        RawToken::RParen => return Ok(Token::RParen),
        RawToken::LBracket => return Ok(Token::LBracket),
        RawToken::RBracket => return Ok(Token::RBracket),
        RawToken::LBrace => return Ok(Token::LBrace),
        RawToken::RBrace => return Ok(Token::RBrace),
        RawToken::Quote => return Ok(Token::Quote),
        RawToken::SyntaxQuote => return Ok(Token::SyntaxQuote),
        RawToken::Unquote => return Ok(Token::Unquote),
        RawToken::UnquoteSplice => return Ok(Token::UnquoteSplice),
        RawToken::VarQuote => return Ok(Token::VarQuote),
        RawToken::SetStart => return Ok(Token::SetStart),
        RawToken::InlineFnStart => return Ok(Token::InlineFnStart),
        RawToken::IgnoreNext => return Ok(Token::IgnoreNext),
        RawToken::CharLiteral(c) => return Ok(Token::CharLiteral(c)),
        RawToken::StringLiteral(s) => return Ok(Token::StringLiteral(s)),
        RawToken::RegexPattern(s) => return Ok(Token::RegexPattern(s)),
        RawToken::Unknown(s) => s,
    };

    if let Some(sf) = SpecialForm::from_name(&s) {
        return Ok(Token::Special(sf.name().to_string()));
    }
    if is_builtin_name(&s) {
        return Ok(Token::BuiltIn(s));
    }
    if s == ":" {
        return Err(ReadError::InvalidKeyword(s));
    }
    if let Some(rest) = s.strip_prefix(':') {
        return Ok(Token::Keyword(rest.to_string()));
    }
    match s.as_str() {
        "nil" => return Ok(Token::Nil),
        "true" => return Ok(Token::Bool(true)),
        "false" => return Ok(Token::Bool(false)),
        _ => {}
    }
    if let Some(n) = parse_number(&s) {
        return Ok(n);
    }
    Ok(Token::Identifier(s))
}

fn parse_number(s: &str) -> Option<Token> {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let dot_count = body.chars().filter(|&c| c == '.').count();
    if dot_count > 1 {
        return None;
    }
    if !body.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    if dot_count == 1 {
        s.parse::<f64>().ok().map(Token::Float)
    } else {
        s.parse::<i64>().ok().map(Token::Integer)
    }
}

/// Runs both lexer passes over `src`, returning a classified token stream.
pub fn lex(src: &str) -> Result<Vec<Token>, ReadError> {
    let mut raw_lexer = RawLexer::new(src);
    let mut tokens = Vec::new();
    while let Some(raw) = raw_lexer.next_token()? {
        tokens.push(classify(raw)?);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_basic_arithmetic_form() {
        let tokens = lex("(+ 1 2.5)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LParen,
                Token::Identifier("+".to_string()),
                Token::Integer(1),
                Token::Float(2.5),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn classifies_special_forms_and_builtins() {
        let tokens = lex("(if (.+ a 1) true false)").unwrap();
        assert!(tokens.contains(&Token::Special("if".to_string())));
        assert!(tokens.contains(&Token::BuiltIn(".+".to_string())));
        assert!(tokens.contains(&Token::Bool(true)));
        assert!(tokens.contains(&Token::Bool(false)));
    }

    #[test]
    fn keyword_and_bare_colon() {
        let tokens = lex(":foo").unwrap();
        assert_eq!(tokens, vec![Token::Keyword("foo".to_string())]);
        assert_eq!(lex(":").unwrap_err(), ReadError::InvalidKeyword(":".to_string()));
    }

    #[test]
    fn string_escapes_and_unterminated() {
        let tokens = lex(r#""a\nb""#).unwrap();
        assert_eq!(tokens, vec![Token::StringLiteral("a\nb".to_string())]);
        assert_eq!(lex("\"abc").unwrap_err(), ReadError::NonTerminatedString);
        assert_eq!(
            lex(r#""a\qb""#).unwrap_err(),
            ReadError::InvalidStringEscapeSequence('q')
        );
    }

    #[test]
    fn char_literal_forms() {
        assert_eq!(lex(r"\a").unwrap(), vec![Token::CharLiteral('a')]);
        assert_eq!(lex(r"\space").unwrap(), vec![Token::CharLiteral(' ')]);
        assert_eq!(lex(r"\newline").unwrap(), vec![Token::CharLiteral('\n')]);
        assert_eq!(lex(r"\A").unwrap(), vec![Token::CharLiteral('A')]);
        assert_eq!(lex(r"\o101").unwrap(), vec![Token::CharLiteral('A')]);
    }

    #[test]
    fn tilde_and_tilde_at() {
        let tokens = lex("~a ~@b").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Unquote,
                Token::Identifier("a".to_string()),
                Token::UnquoteSplice,
                Token::Identifier("b".to_string()),
            ]
        );
    }

    #[test]
    fn regex_literal_keeps_raw_escapes() {
        let tokens = lex(r#"#"a\"b""#).unwrap();
        assert_eq!(tokens, vec![Token::RegexPattern(r#"a\"b"#.to_string())]);
    }

    #[test]
    fn dispatch_macro_chars() {
        assert_eq!(lex("#{").unwrap(), vec![Token::SetStart]);
        assert_eq!(lex("#'x").unwrap()[0], Token::VarQuote);
        assert_eq!(lex("#(").unwrap(), vec![Token::InlineFnStart]);
        assert_eq!(lex("#_x").unwrap()[0], Token::IgnoreNext);
        assert_eq!(
            lex("#@").unwrap_err(),
            ReadError::InvalidDispatchMacro('@')
        );
    }

    #[test]
    fn comments_are_discarded() {
        let tokens = lex("; a comment\n1 ; trailing\n2").unwrap();
        assert_eq!(tokens, vec![Token::Integer(1), Token::Integer(2)]);
    }

    #[test]
    fn negative_and_float_numbers() {
        assert_eq!(lex("-5").unwrap(), vec![Token::Integer(-5)]);
        assert_eq!(lex("-5.5").unwrap(), vec![Token::Float(-5.5)]);
        assert_eq!(lex("3.14").unwrap(), vec![Token::Float(3.14)]);
    }
}
