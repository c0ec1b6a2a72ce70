//! Parser for Python-literal scrape exports.
//!
//! The scraper writes each fetched page as `str(result)`, a Python literal
//! rather than JSON: single-quoted strings, `True`/`False`/`None`, and
//! nested lists/dicts. This parses the subset those exports actually use.

use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag},
    character::complete::{char, multispace0},
    combinator::{map, opt, value},
    multi::separated_list0,
    number::complete::double,
    sequence::{delimited, preceded, separated_pair, terminated},
    IResult,
};

/// A parsed Python literal value
#[derive(Debug, Clone, PartialEq)]
pub enum PyValue {
    Str(String),
    Num(f64),
    Bool(bool),
    None,
    List(Vec<PyValue>),
    Dict(HashMap<String, PyValue>),
}

impl PyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PyValue::Num(n) => Some(*n),
            // Scores frequently arrive as strings like '8.7'.
            PyValue::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PyValue]> {
        match self {
            PyValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Dict field access
    pub fn get(&self, key: &str) -> Option<&PyValue> {
        match self {
            PyValue::Dict(map) => map.get(key),
            _ => None,
        }
    }
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn escape_char(input: &str) -> IResult<&str, &str> {
    alt((
        value("\\", char('\\')),
        value("'", char('\'')),
        value("\"", char('"')),
        value("\n", char('n')),
        value("\t", char('t')),
        value("\r", char('r')),
    ))(input)
}

fn single_quoted(input: &str) -> IResult<&str, String> {
    delimited(
        char('\''),
        map(
            opt(escaped_transform(is_not("\\'"), '\\', escape_char)),
            Option::unwrap_or_default,
        ),
        char('\''),
    )(input)
}

fn double_quoted(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(
            opt(escaped_transform(is_not("\\\""), '\\', escape_char)),
            Option::unwrap_or_default,
        ),
        char('"'),
    )(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    alt((single_quoted, double_quoted))(input)
}

fn py_string(input: &str) -> IResult<&str, PyValue> {
    map(string_literal, PyValue::Str)(input)
}

fn py_number(input: &str) -> IResult<&str, PyValue> {
    map(double, PyValue::Num)(input)
}

fn py_keyword(input: &str) -> IResult<&str, PyValue> {
    alt((
        value(PyValue::Bool(true), tag("True")),
        value(PyValue::Bool(false), tag("False")),
        value(PyValue::None, tag("None")),
    ))(input)
}

fn py_list(input: &str) -> IResult<&str, PyValue> {
    map(
        delimited(
            char('['),
            terminated(
                separated_list0(ws(char(',')), py_value),
                opt(ws(char(','))),
            ),
            ws(char(']')),
        ),
        PyValue::List,
    )(input)
}

fn dict_entry(input: &str) -> IResult<&str, (String, PyValue)> {
    separated_pair(ws(string_literal), char(':'), ws(py_value))(input)
}

fn py_dict(input: &str) -> IResult<&str, PyValue> {
    map(
        delimited(
            char('{'),
            terminated(
                separated_list0(ws(char(',')), dict_entry),
                opt(ws(char(','))),
            ),
            ws(char('}')),
        ),
        |entries| PyValue::Dict(entries.into_iter().collect()),
    )(input)
}

fn py_value(input: &str) -> IResult<&str, PyValue> {
    preceded(
        multispace0,
        alt((py_string, py_keyword, py_dict, py_list, py_number)),
    )(input)
}

/// Parses one complete Python literal, requiring all input be consumed
pub fn parse(input: &str) -> Option<PyValue> {
    let (rest, parsed) = ws(py_value)(input).ok()?;
    rest.is_empty().then_some(parsed)
}
