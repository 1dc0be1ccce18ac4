//! Lexical analyzer for Weft source text.
//!
//! The lexer converts source text into a stream of [`Token`]s. It recovers
//! from errors by skipping a character and carrying on, so one pass reports
//! every lexical problem in the file.

use winnow::{
    Parser as _,
    combinator::{alt, cut_err, delimited, not, peek, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Diagnostic details attached to winnow errors with `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parses `u{XXXX}` after the backslash of a unicode escape.
///
/// Commits after the `u` so malformed escapes report their own code instead
/// of falling back to "invalid escape sequence".
fn string_escape_unicode(input: &mut Input<'_>, escape_start: usize) -> IResult<char> {
    preceded(
        'u',
        cut_err(
            delimited(
                '{',
                take_while(1..=6, |c: char| c.is_ascii_hexdigit()),
                '}',
            )
            .context(LexerDiagnostic {
                code: ErrorCode::E004,
                message: "invalid unicode escape",
                help: Some("use format `\\u{XXXX}` with 1-6 hex digits"),
                start: escape_start,
            })
            .verify_map(|hex: &str| u32::from_str_radix(hex, 16).ok().and_then(char::from_u32))
            .context(LexerDiagnostic {
                code: ErrorCode::E005,
                message: "invalid unicode codepoint",
                help: Some("valid range: `0x0000`-`0xD7FF` or `0xE000`-`0x10FFFF`"),
                start: escape_start,
            }),
        ),
    )
    .parse_next(input)
}

fn string_escape_char(input: &mut Input<'_>) -> IResult<char> {
    one_of(['n', 'r', 't', '\\', '"', '0'])
        .map(|c| match c {
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            '0' => '\0',
            other => other,
        })
        .parse_next(input)
}

/// Parses an escape sequence starting with a backslash.
fn string_escape(input: &mut Input<'_>) -> IResult<char> {
    let escape_start = input.current_token_start();

    '\\'.parse_next(input)?;

    match string_escape_unicode(input, escape_start) {
        Ok(ch) => return Ok(ch),
        Err(ErrMode::Backtrack(_)) => {}
        Err(e) => return Err(e),
    }

    if let Ok(ch) = string_escape_char(input) {
        return Ok(ch);
    }

    Err(ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        LexerDiagnostic {
            code: ErrorCode::E003,
            message: "invalid escape sequence",
            help: Some("valid escapes: `\\n`, `\\r`, `\\t`, `\\\\`, `\\\"`, `\\0`, `\\u{}`"),
            start: escape_start,
        },
    )))
}

/// Parses a double-quoted string literal on a single line.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let string_char = none_of(['"', '\\', '\n', '\r']);
    let string_content =
        repeat(0.., alt((string_escape, string_char))).fold(String::new, |mut acc, ch| {
            acc.push(ch);
            acc
        });

    let start_pos = input.current_token_start();

    '"'.parse_next(input)
        .map_err(|_: ErrMode<ContextError<LexerDiagnostic>>| {
            ErrMode::Backtrack(ContextError::new())
        })?;

    cut_err(terminated(string_content, '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add closing `\"`"),
            start: start_pos,
        })
        .parse_next(input)
        .map(Token::StringLiteral)
}

/// Parses an unsigned decimal integer not glued to an identifier.
fn integer_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start_pos = input.current_token_start();
    let digits = terminated(
        take_while(1.., |c: char| c.is_ascii_digit()),
        peek(not(one_of(is_identifier_char))),
    )
    .parse_next(input)?;

    match digits.parse::<u64>() {
        Ok(value) => Ok(Token::IntegerLiteral(value)),
        Err(_) => Err(ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            LexerDiagnostic {
                code: ErrorCode::E006,
                message: "integer literal out of range",
                help: Some("integers must fit in 64 bits"),
                start: start_pos,
            },
        ))),
    }
}

fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded("//", take_while(0.., |c| c != '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

/// Parses keywords with word boundary checking.
fn keyword<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    terminated(
        alt((
            literal("diagram").value(Token::Diagram),
            literal("brick").value(Token::Brick),
            literal("grade").value(Token::Grade),
            literal("tokens").value(Token::Tokens),
            literal("let").value(Token::Let),
            literal("compose").value(Token::Compose),
        )),
        peek(not(one_of(is_identifier_char))),
    )
    .parse_next(input)
}

/// Parses identifiers: a letter or underscore, then letters, digits or underscores.
fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., is_identifier_char)
        .verify(|s: &str| {
            s.chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        })
        .map(Token::Identifier)
        .parse_next(input)
}

fn operator<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        literal("->").value(Token::Arrow),
        literal(">>").value(Token::Sequential),
        '∘'.value(Token::Sequential),
        '*'.value(Token::Parallel),
        '⊗'.value(Token::Parallel),
        '='.value(Token::Equals),
        ':'.value(Token::Colon),
    ))
    .parse_next(input)
}

fn punctuation<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        '('.value(Token::LeftParen),
        ')'.value(Token::RightParen),
        ';'.value(Token::Semicolon),
        ','.value(Token::Comma),
    ))
    .parse_next(input)
}

/// Parses whitespace other than newlines.
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,
        string_literal,
        operator,
        keyword,
        integer_literal,
        identifier,
        punctuation,
        newline,
        whitespace,
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();
    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(e) => {
                    let error_pos = input.current_token_start();
                    let width = input.chars().next().map_or(1, char::len_utf8);
                    self.diagnostics
                        .emit(Self::convert_err_mode(e, error_pos, width));

                    // A failed string literal has consumed up to the error, so
                    // resume there; anything else skips the offending character.
                    if !input.is_empty() {
                        input.next_token();
                    }
                }
            }
        }
    }

    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        let tokens = self.tokens;
        self.diagnostics.finish().map(|_| tokens)
    }

    /// Converts a winnow error into a diagnostic.
    ///
    /// Falls back to E002 (unexpected character) if no context was attached;
    /// `width` is the byte length of the character at the error position.
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
        width: usize,
    ) -> Diagnostic {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos.max(*start + 1));
            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(help) = help {
                diag = diag.with_help(*help);
            }
            return diag;
        }

        let span = Span::new(error_pos..error_pos.saturating_add(width));
        Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description())
    }
}

/// Tokenizes `input`, collecting every lexical error.
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_token(input: &str) -> Token<'_> {
        let mut located = LocatingSlice::new(input);
        positioned_token(&mut located)
            .unwrap_or_else(|_| panic!("failed to lex {input:?}"))
            .token
    }

    fn meaningful(input: &str) -> Vec<Token<'_>> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .filter(|t| !t.is_trivia())
            .collect()
    }

    #[test]
    fn test_keywords() {
        assert_eq!(single_token("diagram"), Token::Diagram);
        assert_eq!(single_token("brick"), Token::Brick);
        assert_eq!(single_token("grade"), Token::Grade);
        assert_eq!(single_token("tokens"), Token::Tokens);
        assert_eq!(single_token("let"), Token::Let);
        assert_eq!(single_token("compose"), Token::Compose);
    }

    #[test]
    fn test_keyword_word_boundary() {
        assert_eq!(single_token("letter"), Token::Identifier("letter"));
        assert_eq!(single_token("bricks"), Token::Identifier("bricks"));
        assert_eq!(single_token("grade_1"), Token::Identifier("grade_1"));
    }

    #[test]
    fn test_operators_and_aliases() {
        assert_eq!(
            meaningful("a >> b ∘ c * d ⊗ e"),
            [
                Token::Identifier("a"),
                Token::Sequential,
                Token::Identifier("b"),
                Token::Sequential,
                Token::Identifier("c"),
                Token::Parallel,
                Token::Identifier("d"),
                Token::Parallel,
                Token::Identifier("e"),
            ]
        );
    }

    #[test]
    fn test_brick_declaration() {
        assert_eq!(
            meaningful("brick f \"F\": (a, b) -> () grade 1 tokens 150;"),
            [
                Token::Brick,
                Token::Identifier("f"),
                Token::StringLiteral("F".to_string()),
                Token::Colon,
                Token::LeftParen,
                Token::Identifier("a"),
                Token::Comma,
                Token::Identifier("b"),
                Token::RightParen,
                Token::Arrow,
                Token::LeftParen,
                Token::RightParen,
                Token::Grade,
                Token::IntegerLiteral(1),
                Token::Tokens,
                Token::IntegerLiteral(150),
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            single_token(r#""tab\there \"q\" \u{2297}""#),
            Token::StringLiteral("tab\there \"q\" ⊗".to_string())
        );
    }

    #[test]
    fn test_spans_are_byte_offsets() {
        let tokens = tokenize("let ⊗x").unwrap();
        assert_eq!(tokens[0].span, Span::new(0..3));
        assert_eq!(tokens[2].token, Token::Parallel);
        assert_eq!(tokens[2].span, Span::new(4..7));
        assert_eq!(tokens[3].span, Span::new(7..8));
    }

    #[test]
    fn test_comment_and_newline() {
        let tokens = tokenize("// note\nlet").unwrap();
        assert_eq!(tokens[0].token, Token::LineComment(" note"));
        assert_eq!(tokens[1].token, Token::Newline);
        assert_eq!(tokens[2].token, Token::Let);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("diagram \"open").unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E001));
    }

    #[test]
    fn test_invalid_escape() {
        let err = tokenize(r#""bad \q""#).unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E003));
    }

    #[test]
    fn test_invalid_codepoint() {
        let err = tokenize(r#""\u{D800}""#).unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E005));
    }

    #[test]
    fn test_integer_overflow() {
        let err = tokenize("tokens 99999999999999999999999").unwrap_err();
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E006));
    }

    #[test]
    fn test_multiple_unexpected_characters() {
        let err = tokenize("a $ b # c").unwrap_err();
        let codes: Vec<_> = err.diagnostics().iter().map(|d| d.code()).collect();
        assert_eq!(codes, [Some(ErrorCode::E002), Some(ErrorCode::E002)]);
        assert_eq!(err.diagnostics()[0].primary_span(), Some(Span::new(2..3)));
    }
}
