//! Parser for Weft source tokens.
//!
//! Transforms the token stream from the [`lexer`](super::lexer) into the
//! statements of [`parser_types`](super::parser_types). The public entry
//! point is [`build_document`]. A statement that fails to parse is reported
//! and skipped up to the next `;`, so one run reports every malformed
//! statement.
//!
//! Expression grammar, loosest first:
//!
//! ```text
//! expression := parallel ( (">>" | "∘") parallel )*
//! parallel   := atom ( ("*" | "⊗") atom )*
//! atom       := name | "(" expression ")"
//! ```

use bumpalo::Bump;
use winnow::{
    Parser as _,
    combinator::{opt, peek, preceded, repeat, separated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    parser_types as types,
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what was expected
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) where the failing statement starts
    StartOffset(usize),
}

type Input<'a> = TokenSlice<'a, PositionedToken<'a>>;
type IResult<O> = ModalResult<O, ContextError<Context>>;

/// Deepest parenthesis nesting accepted in an expression.
const MAX_NESTING: usize = 512;

/// Runs `f` and turns any failure into a committed error that remembers
/// where the statement started.
fn cut_from<'a, O, F>(input: &mut Input<'a>, start_remaining: usize, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'a>) -> IResult<O>,
{
    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(e)) | Err(ErrMode::Cut(e)) => Err(ErrMode::Cut(e.add_context(
            input,
            &input.checkpoint(),
            Context::StartOffset(start_remaining),
        ))),
        Err(e) => Err(e),
    }
}

/// Builds a committed error with a label.
fn cut_error(input: &Input<'_>, label: &'static str) -> ErrMode<ContextError<Context>> {
    ErrMode::Cut(ContextError::new().add_context(input, &input.checkpoint(), Context::Label(label)))
}

fn ws_comment(input: &mut Input<'_>) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| token.token.is_trivia())
        .void()
        .parse_next(input)
}

fn ws_comments0(input: &mut Input<'_>) -> IResult<()> {
    repeat(0.., ws_comment).parse_next(input)
}

/// Parses one meaningful token accepted by `matches` and returns its span.
fn expect(
    input: &mut Input<'_>,
    label: &'static str,
    matches: fn(&Token<'_>) -> bool,
) -> IResult<Span> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'_>| matches(&token.token).then_some(token.span)),
    )
    .context(Context::Label(label))
    .parse_next(input)
}

/// Consumes the next meaningful token if `matches` accepts it.
fn eat(input: &mut Input<'_>, matches: fn(&Token<'_>) -> bool) -> bool {
    let checkpoint = input.checkpoint();
    let _ = ws_comments0.parse_next(input);
    match any::<_, ErrMode<ContextError<Context>>>.parse_next(input) {
        Ok(token) if matches(&token.token) => true,
        _ => {
            input.reset(&checkpoint);
            false
        }
    }
}

fn semicolon(input: &mut Input<'_>) -> IResult<Span> {
    expect(input, "`;`", |token| matches!(token, Token::Semicolon))
}

fn identifier<'a>(input: &mut Input<'a>) -> IResult<Spanned<&'a str>> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'a>| match &token.token {
            Token::Identifier(name) => Some(Spanned::new(*name, token.span)),
            _ => None,
        }),
    )
    .context(Context::Label("identifier"))
    .parse_next(input)
}

fn string_literal(input: &mut Input<'_>) -> IResult<Spanned<String>> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'_>| match &token.token {
            Token::StringLiteral(s) => Some(Spanned::new(s.clone(), token.span)),
            _ => None,
        }),
    )
    .context(Context::Label("string literal"))
    .parse_next(input)
}

fn integer_literal(input: &mut Input<'_>) -> IResult<Spanned<u64>> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'_>| match &token.token {
            Token::IntegerLiteral(value) => Some(Spanned::new(*value, token.span)),
            _ => None,
        }),
    )
    .context(Context::Label("integer"))
    .parse_next(input)
}

/// Parses `(a, b, c)`, possibly empty.
fn port_list<'a>(input: &mut Input<'a>) -> IResult<Vec<Spanned<&'a str>>> {
    expect(input, "`(`", |token| matches!(token, Token::LeftParen))?;
    let ports: Option<Vec<_>> = opt(separated(
        1..,
        identifier,
        |input: &mut Input<'a>| expect(input, "`,`", |token| matches!(token, Token::Comma)),
    ))
    .parse_next(input)?;
    expect(input, "`,` or `)`", |token| matches!(token, Token::RightParen))?;
    Ok(ports.unwrap_or_default())
}

/// Parses `grade N` or `tokens N`.
fn brick_attribute(input: &mut Input<'_>) -> IResult<types::BrickAttribute> {
    if eat(input, |token| matches!(token, Token::Grade)) {
        return integer_literal
            .map(types::BrickAttribute::Grade)
            .parse_next(input)
            .map_err(|e| e.cut());
    }
    if eat(input, |token| matches!(token, Token::Tokens)) {
        return integer_literal
            .map(types::BrickAttribute::Tokens)
            .parse_next(input)
            .map_err(|e| e.cut());
    }
    Err(ErrMode::Backtrack(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        Context::Label("`grade`, `tokens` or `;`"),
    )))
}

/// `diagram "Title";`
fn diagram_header<'a>(input: &mut Input<'a>) -> IResult<types::Statement<'a>> {
    let keyword = expect(input, "`diagram`", |token| matches!(token, Token::Diagram))?;
    let title = string_literal.parse_next(input)?;
    let end = semicolon(input)?;
    Ok(types::Statement::Diagram {
        title,
        span: keyword.union(end),
    })
}

/// `brick name "Label": (inputs) -> (outputs) grade 1 tokens 150;`
fn brick_declaration<'a>(input: &mut Input<'a>) -> IResult<types::Statement<'a>> {
    let keyword = expect(input, "`brick`", |token| matches!(token, Token::Brick))?;
    let name = identifier.parse_next(input)?;
    let label = opt(string_literal).parse_next(input)?;
    expect(input, "`:`", |token| matches!(token, Token::Colon))?;
    let inputs = port_list(input)?;
    expect(input, "`->`", |token| matches!(token, Token::Arrow))?;
    let outputs = port_list(input)?;
    let attributes = repeat(0.., brick_attribute).parse_next(input)?;
    let end = semicolon(input)?;

    Ok(types::Statement::Brick(types::BrickDecl {
        name,
        label,
        inputs,
        outputs,
        attributes,
        span: keyword.union(end),
    }))
}

/// `let name = expr;`
fn let_binding<'a>(input: &mut Input<'a>, arena: &'a Bump) -> IResult<types::Statement<'a>> {
    let keyword = expect(input, "`let`", |token| matches!(token, Token::Let))?;
    let name = identifier.parse_next(input)?;
    expect(input, "`=`", |token| matches!(token, Token::Equals))?;
    let value = expression(input, arena, 0)?;
    let end = semicolon(input)?;
    Ok(types::Statement::Let {
        name,
        value,
        span: keyword.union(end),
    })
}

/// `compose expr;`
fn compose<'a>(input: &mut Input<'a>, arena: &'a Bump) -> IResult<types::Statement<'a>> {
    let keyword = expect(input, "`compose`", |token| matches!(token, Token::Compose))?;
    let value = expression(input, arena, 0)?;
    let end = semicolon(input)?;
    Ok(types::Statement::Compose {
        value,
        span: keyword.union(end),
    })
}

fn expression<'a>(
    input: &mut Input<'a>,
    arena: &'a Bump,
    nesting: usize,
) -> IResult<&'a types::Expr<'a>> {
    let mut left = parallel(input, arena, nesting)?;
    while eat(input, |token| matches!(token, Token::Sequential)) {
        let right = parallel(input, arena, nesting)?;
        left = arena.alloc(types::Expr::Seq { left, right });
    }
    Ok(left)
}

fn parallel<'a>(
    input: &mut Input<'a>,
    arena: &'a Bump,
    nesting: usize,
) -> IResult<&'a types::Expr<'a>> {
    let mut left = atom(input, arena, nesting)?;
    while eat(input, |token| matches!(token, Token::Parallel)) {
        let right = atom(input, arena, nesting)?;
        left = arena.alloc(types::Expr::Par { left, right });
    }
    Ok(left)
}

fn atom<'a>(
    input: &mut Input<'a>,
    arena: &'a Bump,
    nesting: usize,
) -> IResult<&'a types::Expr<'a>> {
    if eat(input, |token| matches!(token, Token::LeftParen)) {
        if nesting >= MAX_NESTING {
            return Err(cut_error(input, "fewer nested parentheses"));
        }
        let inner = expression(input, arena, nesting + 1)?;
        expect(input, "`)`", |token| matches!(token, Token::RightParen))?;
        return Ok(inner);
    }

    let name = preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'a>| match &token.token {
            Token::Identifier(name) => Some(Spanned::new(*name, token.span)),
            _ => None,
        }),
    )
    .context(Context::Label("a brick or binding name"))
    .parse_next(input)?;
    Ok(arena.alloc(types::Expr::Name(name)))
}

/// Parses one statement, dispatching on its leading keyword.
fn statement<'a>(input: &mut Input<'a>, arena: &'a Bump) -> IResult<types::Statement<'a>> {
    let start = input.eof_offset();
    let next = peek(any).parse_next(input)?;
    match next.token {
        Token::Diagram => cut_from(input, start, diagram_header),
        Token::Brick => cut_from(input, start, brick_declaration),
        Token::Let => cut_from(input, start, |input| let_binding(input, arena)),
        Token::Compose => cut_from(input, start, |input| compose(input, arena)),
        _ => Err(cut_error(
            input,
            "`diagram`, `brick`, `let` or `compose`",
        )),
    }
}

/// Skips past the next `;` or to the end of input.
fn recover(input: &mut Input<'_>) {
    while let Some(token) = input.next_token() {
        if matches!(token.token, Token::Semicolon) {
            break;
        }
    }
}

/// Converts a winnow error into a diagnostic.
///
/// The primary label points at the first meaningful token at or after the
/// failure position; a secondary label covers the statement parsed so far.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken<'_>],
    current_remaining: usize,
) -> Diagnostic {
    let end_offset = tokens.len() - current_remaining;
    let found = tokens[end_offset..]
        .iter()
        .find(|token| !token.token.is_trivia());
    let end_of_input = tokens
        .last()
        .map(|token| Span::new(token.span.end()..token.span.end()))
        .unwrap_or_default();

    let context = match error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e,
        ErrMode::Incomplete(_) => {
            return Diagnostic::error("incomplete input, more tokens expected")
                .with_code(ErrorCode::E101)
                .with_label(end_of_input, "incomplete")
                .with_help("ensure input is complete");
        }
    };

    let expected = context.context().find_map(|ctx| match ctx {
        Context::Label(label) => Some(*label),
        Context::StartOffset(_) => None,
    });
    let start_offset = context
        .context()
        .find_map(|ctx| match ctx {
            Context::StartOffset(remaining) => Some(tokens.len() - remaining),
            Context::Label(_) => None,
        })
        .unwrap_or(end_offset);

    let mut diagnostic = match (expected, found) {
        (Some(expected), Some(found)) => {
            Diagnostic::error(format!("expected {expected}, found `{}`", found.token))
                .with_code(ErrorCode::E100)
                .with_label(found.span, "unexpected token")
        }
        (None, Some(found)) => Diagnostic::error(format!("unexpected token `{}`", found.token))
            .with_code(ErrorCode::E100)
            .with_label(found.span, "unexpected token"),
        (Some(expected), None) => {
            Diagnostic::error(format!("expected {expected}, found end of input"))
                .with_code(ErrorCode::E101)
                .with_label(end_of_input, "input ends here")
        }
        (None, None) => Diagnostic::error("unexpected end of input")
            .with_code(ErrorCode::E101)
            .with_label(end_of_input, "input ends here"),
    };

    let statement_span = tokens[start_offset..end_offset.max(start_offset)]
        .iter()
        .filter(|token| !token.token.is_trivia())
        .map(|token| token.span)
        .reduce(|acc, span| acc.union(span));
    if let Some(span) = statement_span {
        diagnostic = diagnostic.with_secondary_label(span, "in this statement");
    }

    if matches!(expected, Some("`;`")) {
        diagnostic = diagnostic.with_help("statements end with `;`");
    }
    diagnostic
}

/// Parses all statements of a token stream.
///
/// Expression nodes are allocated in `arena`.
pub fn build_document<'a>(
    tokens: &'a [PositionedToken<'a>],
    arena: &'a Bump,
) -> Result<types::Document<'a>, ParseError> {
    let mut input = TokenSlice::new(tokens);
    let mut statements = Vec::new();
    let mut diagnostics = DiagnosticCollector::new();

    loop {
        let _ = ws_comments0.parse_next(&mut input);
        if input.eof_offset() == 0 {
            break;
        }
        match statement(&mut input, arena) {
            Ok(statement) => statements.push(statement),
            Err(error) => {
                let remaining = input.eof_offset();
                diagnostics.emit(convert_error(error, tokens, remaining));
                recover(&mut input);
            }
        }
    }

    diagnostics.finish()?;

    let span = match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => first.span.union(last.span),
        _ => Span::default(),
    };
    Ok(types::Document { statements, span })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_expression(source: &str) -> String {
        let tokens = tokenize(source).unwrap();
        let arena = Bump::new();
        let mut input = TokenSlice::new(&tokens);
        expression(&mut input, &arena, 0).unwrap().to_string()
    }

    fn parse_errors(source: &str) -> Vec<Diagnostic> {
        let tokens = tokenize(source).unwrap();
        let arena = Bump::new();
        build_document(&tokens, &arena)
            .unwrap_err()
            .diagnostics()
            .to_vec()
    }

    #[test]
    fn test_parallel_binds_tighter() {
        assert_eq!(parse_expression("a >> b * c"), "(a >> (b * c))");
        assert_eq!(parse_expression("a * b >> c"), "((a * b) >> c)");
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(parse_expression("a >> b >> c"), "((a >> b) >> c)");
        assert_eq!(parse_expression("a ⊗ b ⊗ c"), "((a * b) * c)");
    }

    #[test]
    fn test_parentheses_group() {
        assert_eq!(parse_expression("(a >> b) * c"), "((a >> b) * c)");
        assert_eq!(parse_expression("a ∘ (b ∘ c)"), "(a >> (b >> c))");
    }

    #[test]
    fn test_expression_span_covers_operands() {
        let tokens = tokenize("fetch >> store").unwrap();
        let arena = Bump::new();
        let mut input = TokenSlice::new(&tokens);
        let expr = expression(&mut input, &arena, 0).unwrap();
        assert_eq!(expr.span(), Span::new(0..14));
    }

    #[test]
    fn test_full_document() {
        let source = r#"
            // pipeline
            diagram "Pipeline";
            brick fetch "Fetch Data": () -> (raw) grade 0;
            brick summarize: (raw) -> (summary) grade 1 tokens 150;
            let both = summarize * summarize;
            compose fetch >> both;
        "#;
        let tokens = tokenize(source).unwrap();
        let arena = Bump::new();
        let document = build_document(&tokens, &arena).unwrap();

        assert_eq!(document.statements.len(), 5);
        let types::Statement::Brick(brick) = &document.statements[2] else {
            panic!("expected a brick declaration");
        };
        assert_eq!(*brick.name.inner(), "summarize");
        assert!(brick.label.is_none());
        assert_eq!(brick.inputs.len(), 1);
        assert_eq!(brick.attributes.len(), 2);
    }

    #[test]
    fn test_empty_port_lists() {
        let tokens = tokenize("brick noop: () -> ();").unwrap();
        let arena = Bump::new();
        let document = build_document(&tokens, &arena).unwrap();
        let types::Statement::Brick(brick) = &document.statements[0] else {
            panic!("expected a brick declaration");
        };
        assert!(brick.inputs.is_empty());
        assert!(brick.outputs.is_empty());
        assert!(brick.attributes.is_empty());
    }

    #[test]
    fn test_missing_semicolon() {
        let errors = parse_errors("compose a >> b\nlet x = a;");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code(), Some(ErrorCode::E100));
        assert_eq!(errors[0].message(), "expected `;`, found `let`");
        assert_eq!(errors[0].help(), Some("statements end with `;`"));
    }

    #[test]
    fn test_errors_in_several_statements() {
        let errors = parse_errors("brick a: (x -> ();\nlet = b;\ncompose a;");
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.code() == Some(ErrorCode::E100)));
    }

    #[test]
    fn test_unknown_statement() {
        let errors = parse_errors("fetch >> store;");
        assert_eq!(
            errors[0].message(),
            "expected `diagram`, `brick`, `let` or `compose`, found `fetch`"
        );
    }

    #[test]
    fn test_truncated_input() {
        let errors = parse_errors("compose a >>");
        assert_eq!(errors[0].code(), Some(ErrorCode::E101));
    }

    #[test]
    fn test_missing_grade_value() {
        let errors = parse_errors("brick a: () -> () grade;");
        assert_eq!(errors[0].message(), "expected integer, found `;`");
    }
}
