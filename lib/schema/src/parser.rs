//! nom parser for the SpiceDB schema DSL.
//!
//! Example DSL:
//! ```text
//! use expiration
//!
//! caveat on_weekday(day string) {
//!   day != "saturday" && day != "sunday"
//! }
//!
//! definition acme/document {
//!     relation parent: acme/folder
//!     relation reader: user | user:* | group#member with on_weekday
//!
//!     permission view = reader + parent->view - banned
//! }
//! ```
//!
//! Operator precedence (lowest to highest): union (`+`), intersection
//! (`&`), exclusion (`-`). Arrows bind tighter than every binary operator.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_until, take_while},
    character::complete::{char, multispace1, satisfy},
    combinator::{all_consuming, cut, map, not, opt, recognize, value},
    error::{ErrorKind, VerboseError, VerboseErrorKind, context},
    multi::{many0, many1, separated_list0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
};
use zed_typegen_core::SchemaDiagnostic;

use crate::ast::{
    AllowedType, ArrowFunction, CaveatAst, CaveatParameter, DefinitionAst, Expression, Item,
    Member, PermissionAst, RelationAst, Spanned, SubjectKind,
};

type PResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

// ============ Helper Parsers ============

fn line_comment(input: &str) -> PResult<'_, ()> {
    value((), pair(tag("//"), take_while(|c| c != '\n' && c != '\r')))(input)
}

fn block_comment(input: &str) -> PResult<'_, ()> {
    value(
        (),
        preceded(
            tag("/*"),
            cut(context("block comment", terminated(take_until("*/"), tag("*/")))),
        ),
    )(input)
}

fn trivia(input: &str) -> PResult<'_, ()> {
    alt((value((), multispace1), line_comment, block_comment))(input)
}

/// Optional whitespace and comments.
fn ws(input: &str) -> PResult<'_, ()> {
    value((), many0(trivia))(input)
}

/// Mandatory whitespace or comments.
fn ws1(input: &str) -> PResult<'_, ()> {
    value((), many1(trivia))(input)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn identifier(input: &str) -> PResult<'_, &str> {
    context(
        "identifier",
        recognize(pair(
            satisfy(|c| c.is_ascii_alphabetic()),
            take_while(is_ident_char),
        )),
    )(input)
}

/// A definition or caveat name with an optional prefix path, e.g. `acme/document`.
fn type_path(input: &str) -> PResult<'_, &str> {
    context(
        "type name",
        recognize(pair(identifier, many0(pair(char('/'), identifier)))),
    )(input)
}

/// Matches `word` only when it is not the start of a longer identifier.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    terminated(tag(word), not(satisfy(is_ident_char)))
}

/// Records where the wrapped parser started.
fn spanned<'a, O>(
    mut parser: impl FnMut(&'a str) -> PResult<'a, O>,
) -> impl FnMut(&'a str) -> PResult<'a, Spanned<O>> {
    move |input: &'a str| {
        let (rest, value) = parser(input)?;
        Ok((
            rest,
            Spanned {
                value,
                tail: input.len(),
            },
        ))
    }
}

// ============ Expression Parsers ============

fn arrow_function(input: &str) -> PResult<'_, ArrowFunction> {
    alt((
        value(ArrowFunction::Any, keyword("any")),
        value(ArrowFunction::All, keyword("all")),
    ))(input)
}

/// Parses `rel`, `rel->perm`, `rel.any(perm)` or `rel.all(perm)`.
fn reference_or_arrow(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, tupleset) = spanned(identifier)(input)?;
    let (input, arrow) = opt(alt((
        map(
            preceded(tuple((ws, tag("->"), ws)), cut(spanned(identifier))),
            |computed| (ArrowFunction::Arrow, computed),
        ),
        preceded(
            char('.'),
            pair(
                arrow_function,
                cut(delimited(
                    pair(char('('), ws),
                    spanned(identifier),
                    pair(ws, char(')')),
                )),
            ),
        ),
    )))(input)?;

    let expression = match arrow {
        Some((function, computed)) => Expression::Arrow {
            function,
            tupleset,
            computed,
        },
        None => Expression::Reference(tupleset),
    };
    Ok((input, expression))
}

fn primary(input: &str) -> PResult<'_, Expression<'_>> {
    context(
        "expression",
        alt((
            value(Expression::Nil, keyword("nil")),
            delimited(
                pair(char('('), ws),
                cut(expression),
                cut(preceded(ws, char(')'))),
            ),
            reference_or_arrow,
        )),
    )(input)
}

fn exclusion(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, first) = primary(input)?;
    let (input, rest) = many0(preceded(
        tuple((ws, char('-'), not(char('>')), ws)),
        cut(primary),
    ))(input)?;
    let expression = rest.into_iter().fold(first, |base, subtract| {
        Expression::Exclusion(Box::new(base), Box::new(subtract))
    });
    Ok((input, expression))
}

fn intersection(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, first) = exclusion(input)?;
    let (input, rest) = many0(preceded(tuple((ws, char('&'), ws)), cut(exclusion)))(input)?;
    Ok((input, collect_operands(first, rest, Expression::Intersection)))
}

fn union(input: &str) -> PResult<'_, Expression<'_>> {
    let (input, first) = intersection(input)?;
    let (input, rest) = many0(preceded(tuple((ws, char('+'), ws)), cut(intersection)))(input)?;
    Ok((input, collect_operands(first, rest, Expression::Union)))
}

fn expression(input: &str) -> PResult<'_, Expression<'_>> {
    union(input)
}

fn collect_operands<'a>(
    first: Expression<'a>,
    rest: Vec<Expression<'a>>,
    combine: fn(Vec<Expression<'a>>) -> Expression<'a>,
) -> Expression<'a> {
    if rest.is_empty() {
        first
    } else {
        let mut children = Vec::with_capacity(rest.len() + 1);
        children.push(first);
        children.extend(rest);
        combine(children)
    }
}

// ============ Member Parsers ============

fn subject_kind(input: &str) -> PResult<'_, SubjectKind<'_>> {
    map(
        opt(alt((
            value(SubjectKind::Wildcard, tag(":*")),
            map(
                preceded(char('#'), cut(spanned(identifier))),
                SubjectKind::Relation,
            ),
        ))),
        |kind| kind.unwrap_or(SubjectKind::Object),
    )(input)
}

/// Parses `user`, `user:*`, `group#member`, optionally followed by
/// `with caveat_name and expiration`.
fn allowed_type(input: &str) -> PResult<'_, AllowedType<'_>> {
    context(
        "subject type",
        map(
            tuple((
                spanned(type_path),
                subject_kind,
                opt(preceded(
                    tuple((ws1, keyword("with"), ws1)),
                    cut(separated_list1(
                        tuple((ws1, keyword("and"), ws1)),
                        spanned(type_path),
                    )),
                )),
            )),
            |(type_name, subject, traits)| AllowedType {
                type_name,
                subject,
                traits: traits.unwrap_or_default(),
            },
        ),
    )(input)
}

fn relation(input: &str) -> PResult<'_, Member<'_>> {
    let (input, _) = keyword("relation")(input)?;
    cut(context(
        "relation",
        map(
            tuple((
                ws1,
                spanned(identifier),
                ws,
                char(':'),
                ws,
                separated_list1(tuple((ws, char('|'), ws)), allowed_type),
            )),
            |(_, name, _, _, _, allowed_types)| {
                Member::Relation(RelationAst {
                    name,
                    allowed_types,
                })
            },
        ),
    ))(input)
}

fn permission(input: &str) -> PResult<'_, Member<'_>> {
    let (input, _) = keyword("permission")(input)?;
    cut(context(
        "permission",
        map(
            tuple((ws1, spanned(identifier), ws, char('='), ws, expression)),
            |(_, name, _, _, _, expression)| {
                Member::Permission(PermissionAst { name, expression })
            },
        ),
    ))(input)
}

fn member(input: &str) -> PResult<'_, Member<'_>> {
    alt((relation, permission))(input)
}

// ============ Item Parsers ============

fn definition(input: &str) -> PResult<'_, Item<'_>> {
    let (input, _) = keyword("definition")(input)?;
    cut(context(
        "definition",
        map(
            tuple((
                ws1,
                spanned(type_path),
                ws,
                char('{'),
                ws,
                many0(terminated(member, ws)),
                context("definition body", char('}')),
            )),
            |(_, name, _, _, _, members, _)| Item::Definition(DefinitionAst { name, members }),
        ),
    ))(input)
}

/// A caveat parameter type such as `int`, `list<string>` or `map<list<int>>`.
fn parameter_type(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        identifier,
        opt(delimited(
            pair(char('<'), ws),
            separated_list1(tuple((ws, char(','), ws)), parameter_type),
            pair(ws, char('>')),
        )),
    ))(input)
}

fn caveat_parameter(input: &str) -> PResult<'_, CaveatParameter<'_>> {
    context(
        "caveat parameter",
        map(
            tuple((identifier, ws1, parameter_type)),
            |(name, _, type_name)| CaveatParameter { name, type_name },
        ),
    )(input)
}

/// Takes everything up to the `}` that closes the caveat body, skipping
/// nested braces and quoted strings.
fn caveat_body(input: &str) -> PResult<'_, &str> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, c) in input.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == open {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' if depth == 0 => return Ok((&input[idx..], &input[..idx])),
            '}' => depth -= 1,
            _ => {}
        }
    }

    Err(nom::Err::Failure(VerboseError {
        errors: vec![(&input[input.len()..], VerboseErrorKind::Char('}'))],
    }))
}

fn caveat(input: &str) -> PResult<'_, Item<'_>> {
    let (input, _) = keyword("caveat")(input)?;
    cut(context(
        "caveat",
        map(
            tuple((
                ws1,
                spanned(type_path),
                ws,
                char('('),
                ws,
                separated_list0(tuple((ws, char(','), ws)), caveat_parameter),
                ws,
                char(')'),
                ws,
                char('{'),
                caveat_body,
                char('}'),
            )),
            |(_, name, _, _, _, parameters, _, _, _, _, expression, _)| {
                Item::Caveat(CaveatAst {
                    name,
                    parameters,
                    expression,
                })
            },
        ),
    ))(input)
}

fn use_directive(input: &str) -> PResult<'_, Item<'_>> {
    let (input, _) = keyword("use")(input)?;
    cut(context(
        "use directive",
        map(preceded(ws1, spanned(identifier)), Item::Use),
    ))(input)
}

fn item(input: &str) -> PResult<'_, Item<'_>> {
    alt((definition, caveat, use_directive))(input)
}

// ============ Public API ============

/// Parses schema text into top-level items.
pub(crate) fn parse_schema(source: &str) -> Result<Vec<Item<'_>>, SchemaDiagnostic> {
    match all_consuming(preceded(ws, many0(terminated(item, ws))))(source) {
        Ok((_, items)) => Ok(items),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(to_diagnostic(source, &e)),
        Err(nom::Err::Incomplete(_)) => Err(SchemaDiagnostic::new("incomplete schema")),
    }
}

/// Describes the innermost failure and the construct it happened in.
fn to_diagnostic(source: &str, error: &VerboseError<&str>) -> SchemaDiagnostic {
    let Some((location, kind)) = error.errors.first() else {
        return SchemaDiagnostic::new("invalid schema");
    };
    let offset = source.len().saturating_sub(location.len());

    let contexts: Vec<&str> = error
        .errors
        .iter()
        .filter_map(|(_, kind)| match kind {
            VerboseErrorKind::Context(ctx) => Some(*ctx),
            _ => None,
        })
        .collect();

    let (expected, enclosing) = match kind {
        VerboseErrorKind::Char(c) => (format!("expected '{c}'"), contexts.first()),
        VerboseErrorKind::Nom(ErrorKind::Eof) if contexts.is_empty() => (
            "expected `definition`, `caveat` or `use`".to_string(),
            None,
        ),
        _ => match contexts.split_first() {
            Some((innermost, outer)) => (format!("expected {innermost}"), outer.first()),
            None => ("unexpected input".to_string(), None),
        },
    };

    let message = match enclosing {
        Some(ctx) => format!("{expected} in {ctx}"),
        None => expected,
    };
    SchemaDiagnostic::at_offset(message, source, offset)
}
