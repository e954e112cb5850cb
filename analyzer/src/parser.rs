// Parser for adrift .sk sketch files.
//
// Parses a token stream (from the lexer) into an AST. Uses chumsky
// combinators.
//
// Preconditions: input is a valid token stream from `lexer::lex()`.
// Postconditions: returns an AST plus any parse errors (non-fatal).
// Failure modes: syntax errors produce `Rich` diagnostics; parsing continues.
// Side effects: none.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

use crate::ast::*;
use crate::lexer::Token;

/// Result of parsing: AST plus any errors.
#[derive(Debug)]
pub struct ParseResult {
    pub program: Option<Program>,
    pub errors: Vec<Rich<'static, Token, SimpleSpan>>,
}

/// Parse a sketch source string. Lexes then parses.
///
/// Returns an AST (if parsing succeeded) plus any errors.
pub fn parse(source: &str) -> ParseResult {
    let lex_result = crate::lexer::lex(source);
    let len = source.len();

    // Convert lexer output to chumsky stream.
    let token_iter = lex_result.tokens.into_iter().map(|(tok, span)| {
        let cspan: SimpleSpan = (span.start..span.end).into();
        (tok, cspan)
    });
    let eoi: SimpleSpan = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let parser = program_parser(source);
    let (program, parse_errors) = parser.parse(stream).into_output_errors();

    // Merge lex errors + parse errors.
    let mut all_errors: Vec<Rich<'static, Token, SimpleSpan>> = lex_result
        .errors
        .into_iter()
        .map(|e| {
            let span: SimpleSpan = (e.span.start..e.span.end).into();
            Rich::custom(span, e.message)
        })
        .collect();
    all_errors.extend(parse_errors.into_iter().map(|e| e.into_owned()));

    ParseResult {
        program,
        errors: all_errors,
    }
}

// ── Main parser builder ──
//
// All grammar rules are built inside `program_parser` so that the `source`
// reference is captured once and shared by all combinators. This avoids
// complex lifetime annotations on per-rule helper functions.

fn program_parser<'tokens, 'src: 'tokens, I>(
    source: &'src str,
) -> impl Parser<'tokens, I, Program, extra::Err<Rich<'tokens, Token, SimpleSpan>>> + 'src
where
    'tokens: 'src,
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    // ── Identifier ──

    let ident = just(Token::Ident).map_with(move |_, e| {
        let span: SimpleSpan = e.span();
        Ident {
            name: source[span.start()..span.end()].to_string(),
            span,
        }
    });

    // ── Type reference: IDENT ('<' type_ref (',' type_ref)* '>')? ──

    let type_ref = recursive(|type_ref| {
        ident
            .clone()
            .then(
                type_ref
                    .separated_by(just(Token::Comma))
                    .at_least(1)
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::Lt), just(Token::Gt))
                    .or_not(),
            )
            .map_with(|(name, args), e| TypeRef {
                name,
                args: args.unwrap_or_default(),
                span: e.span(),
            })
    });

    // ── Parameter list: IDENT ':' type_ref (',' ...)* ──

    let param = ident
        .clone()
        .then_ignore(just(Token::Colon))
        .then(type_ref.clone())
        .map_with(|(name, ty), e| Param {
            name,
            ty,
            span: e.span(),
        });

    let param_list = param
        .separated_by(just(Token::Comma))
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LParen), just(Token::RParen));

    // ── Return clause: '->' type_ref (optional) ──

    let ret_clause = just(Token::Arrow).ignore_then(type_ref.clone()).or_not();

    // ── Generic parameter list: '<' IDENT (',' IDENT)* '>' (optional) ──

    let generics = ident
        .clone()
        .separated_by(just(Token::Comma))
        .at_least(1)
        .collect::<Vec<_>>()
        .delimited_by(just(Token::Lt), just(Token::Gt))
        .or_not()
        .map(Option::unwrap_or_default);

    // ── Method signature: 'fn' IDENT '(' params? ')' ret? ──

    let method_sig = just(Token::Fn)
        .ignore_then(ident.clone())
        .then(param_list.clone())
        .then(ret_clause.clone())
        .map_with(|((name, params), ret), e| MethodSig {
            name,
            params,
            ret,
            span: e.span(),
        });

    // ── Property: 'prop' IDENT ':' type_ref '{' ('get'|'set')+ '}' ──

    let accessor = just(Token::Get).to(true).or(just(Token::Set).to(false));

    let prop_decl = just(Token::Prop)
        .ignore_then(ident.clone())
        .then_ignore(just(Token::Colon))
        .then(type_ref.clone())
        .then(
            accessor
                .repeated()
                .at_least(1)
                .collect::<Vec<_>>()
                .delimited_by(just(Token::LBrace), just(Token::RBrace)),
        )
        .map_with(|((name, ty), accessors), e| PropDecl {
            name,
            ty,
            has_getter: accessors.iter().any(|&g| g),
            has_setter: accessors.iter().any(|&g| !g),
            span: e.span(),
        });

    // ── Call expressions, arguments, lambdas, blocks ──
    //
    // Mutually recursive: blocks hold call statements, call arguments hold
    // lambdas and nested calls, lambda bodies are blocks.

    let call_expr = recursive(|call_expr| {
        let block = call_expr
            .clone()
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LBrace), just(Token::RBrace))
            .map_with(|calls, e| Block {
                calls,
                span: e.span(),
            });

        let lambda = just(Token::Async)
            .or_not()
            .then_ignore(just(Token::Fn))
            .then(param_list.clone())
            .then(ret_clause.clone())
            .then(block)
            .map(|(((asyncness, params), ret), body)| Lambda {
                is_async: asyncness.is_some(),
                params,
                ret,
                body,
            });

        let literal = select! {
            Token::Number(n) => ExprKind::Number(n),
            Token::StringLit(s) => ExprKind::StringLit(s),
        };

        // Call before bare name: both start with IDENT, the call commits
        // on the following '('.
        let arg = lambda
            .map(ExprKind::Lambda)
            .or(call_expr.map(ExprKind::Call))
            .or(literal)
            .or(ident.clone().map(|i| ExprKind::Name(i.name)))
            .map_with(|kind, e| Expr {
                kind,
                span: e.span(),
            });

        ident
            .clone()
            .then(
                arg.separated_by(just(Token::Comma))
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LParen), just(Token::RParen)),
            )
            .map_with(|(callee, args), e| CallExpr {
                callee,
                args,
                span: e.span(),
            })
    });

    let block = call_expr
        .clone()
        .repeated()
        .collect::<Vec<_>>()
        .delimited_by(just(Token::LBrace), just(Token::RBrace))
        .map_with(|calls, e| Block {
            calls,
            span: e.span(),
        });

    // ── Items ──

    let item = recursive(|item| {
        let member = method_sig
            .clone()
            .map(Member::Method)
            .or(prop_decl.map(Member::Prop));

        let type_decl = just(Token::Type)
            .ignore_then(ident.clone())
            .then(generics.clone())
            .then(
                member
                    .repeated()
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LBrace), just(Token::RBrace)),
            )
            .map(|((name, type_params), members)| {
                ItemKind::Type(TypeDecl {
                    name,
                    type_params,
                    members,
                })
            });

        let delegate_decl = just(Token::Delegate)
            .ignore_then(ident.clone())
            .then(generics.clone())
            .then(param_list.clone())
            .then(ret_clause.clone())
            .map(|(((name, type_params), params), ret)| {
                ItemKind::Delegate(DelegateDecl {
                    name,
                    type_params,
                    params,
                    ret,
                })
            });

        let fn_decl = just(Token::Async)
            .or_not()
            .then_ignore(just(Token::Fn))
            .then(ident.clone())
            .then(param_list.clone())
            .then(ret_clause.clone())
            .then(block.clone().or_not())
            .map(|((((asyncness, name), params), ret), body)| {
                ItemKind::Fn(FnDecl {
                    is_async: asyncness.is_some(),
                    name,
                    params,
                    ret,
                    body,
                })
            });

        let extend_decl = just(Token::Extend)
            .ignore_then(type_ref.clone())
            .then(
                method_sig
                    .clone()
                    .repeated()
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LBrace), just(Token::RBrace)),
            )
            .map(|(target, methods)| ItemKind::Extend(ExtendDecl { target, methods }));

        let scope_decl = just(Token::Scope)
            .ignore_then(ident.clone())
            .then(
                item.repeated()
                    .collect::<Vec<_>>()
                    .delimited_by(just(Token::LBrace), just(Token::RBrace)),
            )
            .map(|(name, items)| ItemKind::Scope(ScopeDecl { name, items }));

        type_decl
            .or(delegate_decl)
            .or(fn_decl)
            .or(extend_decl)
            .or(scope_decl)
            .map_with(|kind, e| Item {
                kind,
                span: e.span(),
            })
    });

    item.repeated()
        .collect::<Vec<_>>()
        .map_with(|items, e| Program {
            items,
            span: e.span(),
        })
}

// ── Tests ──
