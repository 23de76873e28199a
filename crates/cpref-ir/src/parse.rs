use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while},
    character::complete::{anychar, char, digit0, digit1, multispace0, satisfy},
    combinator::{cut, eof, map, map_res, not, opt, recognize, value, verify},
    error::{context, VerboseError, VerboseErrorKind},
    multi::{fold_many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::ast::{CompareOp, Condition, Consequent, RangeOp, RuleAst};
use crate::value::Value;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
}

/// Parses a theory given as a JSON array of rule records.
pub fn parse_rules_json(json: &str) -> Result<Vec<RuleAst>, ParseError> {
    Ok(serde_json::from_str(json)?)
}

/// Parses a theory written in the rule language:
///
/// ```text
/// IF region = 'US' THEN price < 100 > price >= 100 [brand]
/// AND color = 'red' > color = 'blue'
/// ```
pub fn parse_rules(text: &str) -> Result<Vec<RuleAst>, ParseError> {
    theory(text)
        .map(|(_, rules)| rules)
        .map_err(|err| syntax_error(text, err))
}

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Locates the innermost failure in `text` and names the closest expectation.
fn syntax_error(text: &str, err: nom::Err<VerboseError<&str>>) -> ParseError {
    let (rest, expected) = match &err {
        nom::Err::Incomplete(_) => ("", None),
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let rest = e.errors.first().map_or("", |(rest, _)| *rest);
            let expected = e.errors.iter().find_map(|(_, kind)| match kind {
                VerboseErrorKind::Context(expected) => Some(*expected),
                _ => None,
            });
            (rest, expected)
        }
    };

    let found = match rest.chars().next() {
        Some(c) => format!("'{c}'"),
        None => "end of input".to_string(),
    };
    let message = match expected {
        Some(expected) => format!("expected {expected}, found {found}"),
        None => format!("unexpected {found}"),
    };

    let offset = text.len().saturating_sub(rest.len());
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    ParseError::Syntax {
        line,
        column,
        message,
    }
}

// ── Tokens ─────────────────────────────────────────────────────

const KEYWORDS: [&str; 3] = ["if", "and", "then"];

fn is_keyword(word: &str) -> bool {
    KEYWORDS.iter().any(|k| word.eq_ignore_ascii_case(k))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> Res<'a, O>
where
    F: FnMut(&'a str) -> Res<'a, O>,
{
    preceded(multispace0, inner)
}

/// Case-insensitive keyword that does not run into a following word.
fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> Res<'a, &'a str> {
    ws(terminated(tag_no_case(word), not(satisfy(is_word_char))))
}

fn identifier(input: &str) -> Res<'_, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_alphabetic() || c == '_'),
        take_while(is_word_char),
    ))(input)
}

/// Attribute names are case-insensitive and stored lowercased.
fn attribute(input: &str) -> Res<'_, String> {
    ws(map(
        verify(identifier, |name: &str| !is_keyword(name)),
        str::to_lowercase,
    ))(input)
}

fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> Res<'a, String> {
    preceded(
        char(quote),
        cut(terminated(
            fold_many0(
                alt((
                    preceded(char('\\'), anychar),
                    satisfy(move |c| c != quote && c != '\\'),
                )),
                String::new,
                |mut s, c| {
                    s.push(c);
                    s
                },
            ),
            context("a closing quote", char(quote)),
        )),
    )
}

fn number(input: &str) -> Res<'_, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            opt(pair(char('.'), digit0)),
        ))),
        str::parse::<f64>,
    )(input)
}

fn scalar(input: &str) -> Res<'_, Value> {
    context(
        "a quoted string or a number",
        ws(alt((
            map(quoted('\''), Value::Text),
            map(quoted('"'), Value::Text),
            map(number, Value::Number),
        ))),
    )(input)
}

fn compare_op(input: &str) -> Res<'_, CompareOp> {
    context(
        "a comparison operator",
        ws(alt((
            value(CompareOp::Le, tag("<=")),
            value(CompareOp::Lt, tag("<")),
            value(CompareOp::Ge, tag(">=")),
            value(CompareOp::Gt, tag(">")),
            value(CompareOp::Eq, tag("=")),
        ))),
    )(input)
}

fn range_op(input: &str) -> Res<'_, RangeOp> {
    context(
        "'<' or '<='",
        ws(alt((
            value(RangeOp::Le, tag("<=")),
            value(RangeOp::Lt, tag("<")),
        ))),
    )(input)
}

// ── Grammar ────────────────────────────────────────────────────

fn theory(input: &str) -> Res<'_, Vec<RuleAst>> {
    let (input, rules) = separated_list1(keyword("and"), cut(rule))(input)?;
    let (input, _) = context("'AND' or end of input", ws(eof))(input)?;
    Ok((input, rules))
}

fn rule(input: &str) -> Res<'_, RuleAst> {
    let (input, antecedent) = opt(delimited(
        keyword("if"),
        cut(separated_list1(keyword("and"), condition)),
        cut(context("'THEN'", keyword("then"))),
    ))(input)?;

    let (input, preferred) = condition(input)?;
    let (input, _) = context("'>'", ws(char('>')))(input)?;
    let (input, not_preferred) = cut(condition)(input)?;

    let (input, indifferent_attributes) = opt(preceded(
        ws(char('[')),
        cut(terminated(
            separated_list1(ws(char(',')), context("an attribute name", attribute)),
            context("',' or ']'", ws(char(']'))),
        )),
    ))(input)?;

    Ok((
        input,
        RuleAst {
            antecedent: antecedent.unwrap_or_default(),
            consequent: Consequent {
                preferred,
                not_preferred,
            },
            indifferent_attributes: indifferent_attributes.unwrap_or_default(),
        },
    ))
}

/// A compare condition starts with an attribute, a range with a value.
fn condition(input: &str) -> Res<'_, Condition> {
    context("a condition", alt((range_condition, compare_condition)))(input)
}

fn compare_condition(input: &str) -> Res<'_, Condition> {
    let (input, attribute) = attribute(input)?;
    let (input, (op, value)) = cut(pair(compare_op, scalar))(input)?;
    Ok((
        input,
        Condition::Compare {
            attribute,
            op,
            value,
        },
    ))
}

fn range_condition(input: &str) -> Res<'_, Condition> {
    let (input, low) = scalar(input)?;
    let (input, (low_op, attribute, high_op, high)) = cut(tuple((
        range_op,
        context("an attribute name", attribute),
        range_op,
        scalar,
    )))(input)?;
    Ok((
        input,
        Condition::Range {
            attribute,
            low,
            low_op,
            high_op,
            high,
        },
    ))
}
