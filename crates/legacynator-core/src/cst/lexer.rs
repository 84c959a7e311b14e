//! CST-aware lexer that preserves all trivia (whitespace, comments, directives)
//!
//! Every byte of the input ends up in exactly one token, which is what makes
//! `parse(source).text() == source` hold. Documentation comment lines (`///`)
//! are split further: plain XML runs become `XmlText`, while the value of every
//! `cref` attribute is lexed as ordinary C# so the parser can build a
//! structured cross-reference out of it.

use crate::cst::CsSyntaxKind;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

/// Simple span representing a range in the source
pub type CstSpan = Range<usize>;

/// A lexer error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerError {
    pub message: String,
    pub span: CstSpan,
}

impl LexerError {
    pub fn new(message: impl Into<String>, span: CstSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// A token with its syntax kind and span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CstToken {
    pub kind: CsSyntaxKind,
    pub text: String,
    pub span: CstSpan,
}

impl CstToken {
    pub fn new(kind: CsSyntaxKind, text: impl Into<String>, span: CstSpan) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Result returned by the CST lexer
pub type CstLexResult = (Vec<CstToken>, Vec<LexerError>);

static CREF_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bcref(\s*)=(\s*)(["'])"#).expect("cref attribute pattern is valid")
});

/// Lex input preserving ALL trivia for CST construction
///
/// - Whitespace runs become `Whitespace` tokens
/// - `\n`, `\r\n` and lone `\r` become `Newline` tokens
/// - Comments and preprocessor lines are kept verbatim
///
/// Lexing never fails: unexpected characters become `Unknown` tokens and are
/// reported in the returned error list.
pub fn lex_with_trivia(input: &str) -> CstLexResult {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    lex_into(input, 0, &mut tokens, &mut errors);
    (tokens, errors)
}

fn lex_into(input: &str, base: usize, tokens: &mut Vec<CstToken>, errors: &mut Vec<LexerError>) {
    let len = input.len();
    let mut i = 0usize;
    let mut at_line_start = true;

    while i < len {
        let Some((current, size)) = next_char(input, i) else {
            break;
        };
        let start = i;

        let (kind, end) = match current {
            '\n' => (CsSyntaxKind::Newline, i + size),
            '\r' => {
                // \r\n is a single newline
                let mut end = i + size;
                if let Some(('\n', nl_size)) = next_char(input, end) {
                    end += nl_size;
                }
                (CsSyntaxKind::Newline, end)
            }
            c if c.is_whitespace() => {
                let mut end = i + size;
                while let Some((next_ch, next_size)) = next_char(input, end) {
                    if next_ch.is_whitespace() && next_ch != '\n' && next_ch != '\r' {
                        end += next_size;
                    } else {
                        break;
                    }
                }
                (CsSyntaxKind::Whitespace, end)
            }
            '/' if input[i..].starts_with("///") && !input[i..].starts_with("////") => {
                let end = line_end(input, start);
                lex_doc_comment(input, base, start, end, tokens, errors);
                at_line_start = false;
                i = end;
                continue;
            }
            '/' if input[i..].starts_with("//") => (CsSyntaxKind::CommentLine, line_end(input, start)),
            '/' if input[i..].starts_with("/*") => match input[i + 2..].find("*/") {
                Some(rel) => (CsSyntaxKind::CommentBlock, i + 2 + rel + 2),
                None => {
                    errors.push(LexerError::new(
                        "Unterminated block comment",
                        span(base + start, base + len),
                    ));
                    (CsSyntaxKind::CommentBlock, len)
                }
            },
            '#' if at_line_start => (CsSyntaxKind::Directive, line_end(input, start)),
            '"' => {
                let (end, error) = lex_string_literal(input, start);
                push_error(errors, error, base);
                (CsSyntaxKind::String, end)
            }
            '@' | '$' => match lex_prefixed(input, start) {
                Some((kind, end, error)) => {
                    push_error(errors, error, base);
                    (kind, end)
                }
                None => (CsSyntaxKind::Punct, i + size),
            },
            '\'' => {
                let (end, error) = lex_char_literal(input, start);
                push_error(errors, error, base);
                (CsSyntaxKind::Char, end)
            }
            c if c.is_ascii_digit() => (CsSyntaxKind::Number, lex_number(input, start)),
            '.' if next_char(input, i + size).is_some_and(|(c, _)| c.is_ascii_digit()) => {
                (CsSyntaxKind::Number, lex_number(input, start))
            }
            c if is_ident_start(c) => {
                let end = lex_ident_end(input, start);
                let kind = CsSyntaxKind::from_keyword(&input[start..end])
                    .unwrap_or(CsSyntaxKind::Ident);
                (kind, end)
            }
            '{' => (CsSyntaxKind::LBrace, i + size),
            '}' => (CsSyntaxKind::RBrace, i + size),
            '(' => (CsSyntaxKind::LParen, i + size),
            ')' => (CsSyntaxKind::RParen, i + size),
            '[' => (CsSyntaxKind::LBracket, i + size),
            ']' => (CsSyntaxKind::RBracket, i + size),
            '<' => (CsSyntaxKind::Lt, i + size),
            '>' => (CsSyntaxKind::Gt, i + size),
            ';' => (CsSyntaxKind::Semicolon, i + size),
            ',' => (CsSyntaxKind::Comma, i + size),
            '.' => (CsSyntaxKind::Dot, i + size),
            '?' => (CsSyntaxKind::Question, i + size),
            '*' => (CsSyntaxKind::Asterisk, i + size),
            '~' => (CsSyntaxKind::Tilde, i + size),
            ':' if input[i..].starts_with("::") => (CsSyntaxKind::ColonColon, i + 2),
            ':' => (CsSyntaxKind::Colon, i + size),
            '=' if input[i..].starts_with("=>") => (CsSyntaxKind::Arrow, i + 2),
            '=' if input[i..].starts_with("==") => (CsSyntaxKind::Punct, i + 2),
            '=' => (CsSyntaxKind::Equals, i + size),
            c if c.is_ascii_punctuation() => (CsSyntaxKind::Punct, i + size),
            c => {
                errors.push(LexerError::new(
                    format!("Unexpected character '{}'", c.escape_debug()),
                    span(base + start, base + i + size),
                ));
                (CsSyntaxKind::Unknown, i + size)
            }
        };

        tokens.push(CstToken::new(
            kind,
            &input[start..end],
            span(base + start, base + end),
        ));

        match kind {
            CsSyntaxKind::Newline => at_line_start = true,
            CsSyntaxKind::Whitespace => {}
            // A block comment that spans lines still ends somewhere mid-line
            _ => at_line_start = false,
        }
        i = end;
    }
}

/// Split one `///` line into XML text runs and lexed `cref` values
fn lex_doc_comment(
    input: &str,
    base: usize,
    start: usize,
    end: usize,
    tokens: &mut Vec<CstToken>,
    errors: &mut Vec<LexerError>,
) {
    let marker_end = start + 3;
    tokens.push(CstToken::new(
        CsSyntaxKind::DocCommentStart,
        "///",
        span(base + start, base + marker_end),
    ));

    let line = &input[marker_end..end];
    let mut cursor = 0usize;

    for caps in CREF_ATTRIBUTE.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() < cursor {
            continue;
        }
        let (Some(ws_before), Some(ws_after), Some(quote)) = (caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };

        let quote_char = quote.as_str();
        let value_start = quote.end();
        let Some(close_rel) = line[value_start..].find(quote_char) else {
            errors.push(LexerError::new(
                "Unterminated cref attribute value",
                span(
                    base + marker_end + whole.start(),
                    base + marker_end + line.len(),
                ),
            ));
            break;
        };
        let value_end = value_start + close_rel;

        let abs = |offset: usize| marker_end + offset;
        push_xml_text(input, base, abs(cursor), abs(whole.start()), tokens);
        tokens.push(CstToken::new(
            CsSyntaxKind::XmlAttributeName,
            "cref",
            span(base + abs(whole.start()), base + abs(whole.start() + 4)),
        ));
        push_whitespace(input, base, abs(ws_before.start()), abs(ws_before.end()), tokens);
        tokens.push(CstToken::new(
            CsSyntaxKind::Equals,
            "=",
            span(base + abs(ws_before.end()), base + abs(ws_after.start())),
        ));
        push_whitespace(input, base, abs(ws_after.start()), abs(ws_after.end()), tokens);
        tokens.push(CstToken::new(
            CsSyntaxKind::XmlQuote,
            quote_char,
            span(base + abs(quote.start()), base + abs(value_start)),
        ));

        // The attribute value is ordinary C#, minus line structure
        lex_into(
            &input[abs(value_start)..abs(value_end)],
            base + abs(value_start),
            tokens,
            errors,
        );

        tokens.push(CstToken::new(
            CsSyntaxKind::XmlQuote,
            quote_char,
            span(base + abs(value_end), base + abs(value_end + 1)),
        ));
        cursor = value_end + 1;
    }

    push_xml_text(input, base, marker_end + cursor, end, tokens);
}

fn push_xml_text(input: &str, base: usize, start: usize, end: usize, tokens: &mut Vec<CstToken>) {
    if start < end {
        tokens.push(CstToken::new(
            CsSyntaxKind::XmlText,
            &input[start..end],
            span(base + start, base + end),
        ));
    }
}

fn push_whitespace(input: &str, base: usize, start: usize, end: usize, tokens: &mut Vec<CstToken>) {
    if start < end {
        tokens.push(CstToken::new(
            CsSyntaxKind::Whitespace,
            &input[start..end],
            span(base + start, base + end),
        ));
    }
}

/// Literals and identifiers introduced by `@` or `$`
fn lex_prefixed(input: &str, start: usize) -> Option<(CsSyntaxKind, usize, Option<LexerError>)> {
    let rest = &input[start..];

    if let Some(after_at) = rest.strip_prefix('@') {
        if after_at.starts_with('"') {
            let (end, error) = lex_verbatim_string(input, start + 1);
            return Some((CsSyntaxKind::String, end, error));
        }
        if after_at.starts_with("$\"") {
            let (end, error) = lex_interpolated_body(input, start + 2, true);
            return Some((CsSyntaxKind::String, end, error));
        }
        if after_at.chars().next().is_some_and(is_ident_start) {
            // Verbatim identifier: never a keyword
            return Some((CsSyntaxKind::Ident, lex_ident_end(input, start + 1), None));
        }
        return None;
    }

    let dollars = rest.chars().take_while(|&c| c == '$').count();
    let after = &rest[dollars..];
    if let Some(after_at) = after.strip_prefix('@') {
        if after_at.starts_with('"') {
            let (end, error) = lex_interpolated_body(input, start + dollars + 1, true);
            return Some((CsSyntaxKind::String, end, error));
        }
        return None;
    }
    if after.starts_with("\"\"\"") {
        let (end, error) = lex_raw_string(input, start + dollars);
        return Some((CsSyntaxKind::String, end, error));
    }
    if after.starts_with('"') {
        let (end, error) = lex_interpolated_body(input, start + dollars, false);
        return Some((CsSyntaxKind::String, end, error));
    }
    None
}

/// Regular `"..."` or raw `"""..."""` string starting at `start`
fn lex_string_literal(input: &str, start: usize) -> (usize, Option<LexerError>) {
    if input[start..].starts_with("\"\"\"") {
        return lex_raw_string(input, start);
    }

    let mut i = start + 1;
    while let Some((c, size)) = next_char(input, i) {
        match c {
            '\\' => {
                i += size;
                if let Some((_, escaped)) = next_char(input, i) {
                    i += escaped;
                }
            }
            '"' => return (i + size, None),
            '\n' | '\r' => {
                return (
                    i,
                    Some(LexerError::new("Unterminated string literal", span(start, i))),
                );
            }
            _ => i += size,
        }
    }
    (
        input.len(),
        Some(LexerError::new(
            "Unterminated string literal",
            span(start, input.len()),
        )),
    )
}

/// Verbatim `@"..."` string; `quote` is the offset of the opening quote
fn lex_verbatim_string(input: &str, quote: usize) -> (usize, Option<LexerError>) {
    let mut i = quote + 1;
    while let Some((c, size)) = next_char(input, i) {
        if c == '"' {
            if input[i + size..].starts_with('"') {
                i += size + 1;
                continue;
            }
            return (i + size, None);
        }
        i += size;
    }
    (
        input.len(),
        Some(LexerError::new(
            "Unterminated verbatim string literal",
            span(quote, input.len()),
        )),
    )
}

/// Raw string literal: N >= 3 quotes, closed by the same number of quotes
fn lex_raw_string(input: &str, quote: usize) -> (usize, Option<LexerError>) {
    let count = input[quote..].chars().take_while(|&c| c == '"').count();
    let delimiter = "\"".repeat(count);
    let body_start = quote + count;
    match input[body_start..].find(&delimiter) {
        Some(rel) => {
            let mut end = body_start + rel + count;
            // Extra quotes directly after the delimiter belong to the literal
            while input[end..].starts_with('"') {
                end += 1;
            }
            (end, None)
        }
        None => (
            input.len(),
            Some(LexerError::new(
                "Unterminated raw string literal",
                span(quote, input.len()),
            )),
        ),
    }
}

/// Body of an interpolated string; `quote` is the offset of the opening quote
fn lex_interpolated_body(input: &str, quote: usize, verbatim: bool) -> (usize, Option<LexerError>) {
    let mut i = quote + 1;
    let mut depth = 0usize;

    while let Some((c, size)) = next_char(input, i) {
        if depth == 0 {
            match c {
                '\\' if !verbatim => {
                    i += size;
                    if let Some((_, escaped)) = next_char(input, i) {
                        i += escaped;
                    }
                    continue;
                }
                '"' if verbatim && input[i + size..].starts_with('"') => {
                    i += size + 1;
                    continue;
                }
                '"' => return (i + size, None),
                '{' if input[i + size..].starts_with('{') => {
                    i += size + 1;
                    continue;
                }
                '{' => depth = 1,
                '\n' | '\r' if !verbatim => {
                    return (
                        i,
                        Some(LexerError::new(
                            "Unterminated interpolated string literal",
                            span(quote, i),
                        )),
                    );
                }
                _ => {}
            }
            i += size;
            continue;
        }

        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            '"' => {
                let (end, _) = lex_string_literal(input, i);
                i = end;
                continue;
            }
            '\'' => {
                let (end, _) = lex_char_literal(input, i);
                i = end;
                continue;
            }
            _ => {}
        }
        i += size;
    }

    (
        input.len(),
        Some(LexerError::new(
            "Unterminated interpolated string literal",
            span(quote, input.len()),
        )),
    )
}

fn lex_char_literal(input: &str, start: usize) -> (usize, Option<LexerError>) {
    let mut i = start + 1;
    while let Some((c, size)) = next_char(input, i) {
        match c {
            '\\' => {
                i += size;
                if let Some((_, escaped)) = next_char(input, i) {
                    i += escaped;
                }
            }
            '\'' => return (i + size, None),
            '\n' | '\r' => {
                return (
                    i,
                    Some(LexerError::new("Unterminated character literal", span(start, i))),
                );
            }
            _ => i += size,
        }
    }
    (
        input.len(),
        Some(LexerError::new(
            "Unterminated character literal",
            span(start, input.len()),
        )),
    )
}

fn lex_number(input: &str, start: usize) -> usize {
    let mut end = start;
    let mut prev = '\0';
    let hex = input[start..].starts_with("0x") || input[start..].starts_with("0X");

    while let Some((c, size)) = next_char(input, end) {
        let continues = c.is_ascii_alphanumeric()
            || c == '_'
            || (c == '.' && next_char(input, end + size).is_some_and(|(n, _)| n.is_ascii_digit()))
            || ((c == '+' || c == '-') && matches!(prev, 'e' | 'E') && !hex);
        if !continues {
            break;
        }
        prev = c;
        end += size;
    }
    end
}

fn lex_ident_end(input: &str, start: usize) -> usize {
    let mut end = start;
    while let Some((c, size)) = next_char(input, end) {
        if c.is_alphanumeric() || c == '_' {
            end += size;
        } else {
            break;
        }
    }
    end
}

fn line_end(input: &str, start: usize) -> usize {
    input[start..]
        .find(['\n', '\r'])
        .map_or(input.len(), |rel| start + rel)
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn push_error(errors: &mut Vec<LexerError>, error: Option<LexerError>, base: usize) {
    if let Some(mut err) = error {
        err.span = span(base + err.span.start, base + err.span.end);
        errors.push(err);
    }
}

fn next_char(input: &str, offset: usize) -> Option<(char, usize)> {
    input[offset..].chars().next().map(|c| (c, c.len_utf8()))
}

fn span(start: usize, end: usize) -> CstSpan {
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<CsSyntaxKind> {
        lex_with_trivia(source).0.into_iter().map(|t| t.kind).collect()
    }

    fn concat(source: &str) -> String {
        lex_with_trivia(source)
            .0
            .into_iter()
            .map(|t| t.text)
            .collect()
    }

    #[test]
    fn test_lex_using_directive() {
        assert_eq!(
            kinds("using Moq;"),
            vec![
                CsSyntaxKind::UsingKw,
                CsSyntaxKind::Whitespace,
                CsSyntaxKind::Ident,
                CsSyntaxKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_lex_preserves_every_byte() {
        let source = "namespace Moq.Core\r\n{\r\n\t// comment\r\n  /* block */ int x = @\"a\"\"b\";\r\n}\n";
        assert_eq!(concat(source), source);
    }

    #[test]
    fn test_lex_newline_variants() {
        assert_eq!(
            kinds("a\r\nb\rc\n"),
            vec![
                CsSyntaxKind::Ident,
                CsSyntaxKind::Newline,
                CsSyntaxKind::Ident,
                CsSyntaxKind::Newline,
                CsSyntaxKind::Ident,
                CsSyntaxKind::Newline,
            ]
        );
    }

    #[test]
    fn test_lex_doc_comment_with_cref() {
        let (tokens, errors) = lex_with_trivia("/// <see cref=\"Moq.Times\"/>");
        assert!(errors.is_empty());
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CsSyntaxKind::DocCommentStart,
                CsSyntaxKind::XmlText,
                CsSyntaxKind::XmlAttributeName,
                CsSyntaxKind::Equals,
                CsSyntaxKind::XmlQuote,
                CsSyntaxKind::Ident,
                CsSyntaxKind::Dot,
                CsSyntaxKind::Ident,
                CsSyntaxKind::XmlQuote,
                CsSyntaxKind::XmlText,
            ]
        );
        assert_eq!(tokens[5].span, 15..18);
        assert_eq!(tokens[5].text, "Moq");
    }

    #[test]
    fn test_lex_doc_comment_single_quotes_and_spacing() {
        let source = "/// <see cref = 'Moq.Mock{T}.Setup(Moq.Times)' />";
        assert_eq!(concat(source), source);
        let tokens = lex_with_trivia(source).0;
        assert_eq!(
            tokens
                .iter()
                .filter(|t| t.kind == CsSyntaxKind::XmlQuote)
                .count(),
            2
        );
        assert!(tokens.iter().any(|t| t.kind == CsSyntaxKind::LBrace));
    }

    #[test]
    fn test_four_slashes_is_plain_comment() {
        assert_eq!(kinds("//// <see cref=\"Moq\"/>"), vec![CsSyntaxKind::CommentLine]);
    }

    #[test]
    fn test_lex_keywords_and_verbatim_identifier() {
        assert_eq!(
            kinds("class @class"),
            vec![
                CsSyntaxKind::ClassKw,
                CsSyntaxKind::Whitespace,
                CsSyntaxKind::Ident,
            ]
        );
    }

    #[test]
    fn test_lex_directive_only_at_line_start() {
        assert_eq!(
            kinds("  #if DEBUG\nx"),
            vec![
                CsSyntaxKind::Whitespace,
                CsSyntaxKind::Directive,
                CsSyntaxKind::Newline,
                CsSyntaxKind::Ident,
            ]
        );
    }

    #[test]
    fn test_lex_interpolated_string_with_nested_quotes() {
        let source = r#"$"{Format("x")} and {{braces}}";"#;
        let tokens = lex_with_trivia(source).0;
        assert_eq!(tokens[0].kind, CsSyntaxKind::String);
        assert_eq!(tokens[0].text, r#"$"{Format("x")} and {{braces}}""#);
        assert_eq!(tokens[1].kind, CsSyntaxKind::Semicolon);
    }

    #[test]
    fn test_lex_raw_string() {
        let source = "\"\"\"\nMoq.Times \"quoted\"\n\"\"\";";
        let tokens = lex_with_trivia(source).0;
        assert_eq!(tokens[0].kind, CsSyntaxKind::String);
        assert_eq!(tokens[1].kind, CsSyntaxKind::Semicolon);
    }

    #[test]
    fn test_lex_unterminated_string_reports_error() {
        let (tokens, errors) = lex_with_trivia("\"abc\nx");
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens[0].text, "\"abc");
        assert_eq!(tokens[1].kind, CsSyntaxKind::Newline);
    }

    #[test]
    fn test_lex_unknown_character() {
        let (tokens, errors) = lex_with_trivia("a \u{0} b");
        assert_eq!(errors.len(), 1);
        assert!(tokens.iter().any(|t| t.kind == CsSyntaxKind::Unknown));
    }

    #[test]
    fn test_lex_arrow_and_alias_qualifier() {
        assert_eq!(
            kinds("global::Moq => =="),
            vec![
                CsSyntaxKind::Ident,
                CsSyntaxKind::ColonColon,
                CsSyntaxKind::Ident,
                CsSyntaxKind::Whitespace,
                CsSyntaxKind::Arrow,
                CsSyntaxKind::Whitespace,
                CsSyntaxKind::Punct,
            ]
        );
    }

    #[test]
    fn test_lex_numbers() {
        assert_eq!(concat("1.5e-3f 0x1F .5m"), "1.5e-3f 0x1F .5m");
        assert_eq!(
            kinds("1.5e-3f"),
            vec![CsSyntaxKind::Number],
        );
    }
}
