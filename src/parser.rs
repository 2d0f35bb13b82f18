use nix::unistd::Pid;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_until, take_while, take_while1, take_while_m_n},
    character::complete::{char, digit1, hex_digit1, oct_digit1, satisfy, space0, space1},
    combinator::{all_consuming, consumed, map, map_res, not, opt, recognize, rest, value, verify},
    multi::{count, fold_many0, many0, separated_list0},
    sequence::{delimited, pair, preceded, separated_pair, terminated, tuple},
    IResult,
};

use crate::{auxiliary::constants::general::IMPLICIT_PID, error::ParseError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuotedBuffer {
    pub raw: String,
    pub decoded: Vec<u8>,
    pub truncated: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StructEntry {
    pub name: Option<String>,
    pub value: Literal,
}

/// One argument exactly as strace printed it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Literal {
    Integer(u64),
    SignedInteger(i64),
    // terms in the order they were printed, never reduced here
    Flags(Vec<Literal>),
    Buffer(QuotedBuffer),
    Array(Vec<Literal>),
    Struct(Vec<StructEntry>),
    Identifier(String),
    Call { function: String, args: Vec<Literal> },
    MacAddress([u8; 6]),
    Null,
}

impl Literal {
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Literal::Integer(value) => Some(*value),
            Literal::SignedInteger(value) => Some(*value as u64),
            Literal::Null => Some(0),
            _ => None,
        }
    }

    pub fn terms(&self) -> &[Literal] {
        match self {
            Literal::Flags(terms) => terms,
            single => std::slice::from_ref(single),
        }
    }

    // anything that ends up as a number once constants are looked up
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Literal::Integer(_)
                | Literal::SignedInteger(_)
                | Literal::Flags(_)
                | Literal::Identifier(_)
                | Literal::Call { .. }
                | Literal::Null
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReturnValue {
    Value(i64),
    Failed { value: i64, errno: Option<String> },
    // `= ?`, the call never returned to userland
    Unknown { errno: Option<String> },
}

impl ReturnValue {
    pub fn is_failure(&self) -> bool {
        !matches!(self, ReturnValue::Value(_))
    }

    pub fn value(&self) -> Option<i64> {
        match self {
            ReturnValue::Value(value) | ReturnValue::Failed { value, .. } => Some(*value),
            ReturnValue::Unknown { .. } => None,
        }
    }

    pub fn errno(&self) -> Option<&str> {
        match self {
            ReturnValue::Value(_) => None,
            ReturnValue::Failed { errno, .. } | ReturnValue::Unknown { errno } => errno.as_deref(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceRecord {
    pub pid: Pid,
    pub line: usize,
    pub name: String,
    pub args: Vec<Literal>,
    pub ret: ReturnValue,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartialCall {
    pub pid: Pid,
    pub line: usize,
    pub name: String,
    pub args: Vec<Literal>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TraceLine {
    Call(TraceRecord),
    Unfinished(PartialCall),
    Resumed { call: PartialCall, ret: ReturnValue },
    Ignored,
}

enum Body<'a> {
    Complete {
        name: &'a str,
        args: Vec<Literal>,
        ret: ReturnValue,
    },
    Unfinished {
        name: &'a str,
        args: Vec<Literal>,
    },
    Resumed {
        name: &'a str,
        args: Vec<Literal>,
        ret: ReturnValue,
    },
    Notice,
}

pub fn parse_line(line: usize, text: &str) -> Result<TraceLine, ParseError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(TraceLine::Ignored);
    }
    let (pid, body) = match all_consuming(parse_trace_line)(trimmed) {
        Ok((_, parsed)) => parsed,
        Err(err) => return Err(ParseError::new(line, trimmed, describe_failure(trimmed, err))),
    };
    let pid = Pid::from_raw(pid.unwrap_or(IMPLICIT_PID));
    let partial = |name: &str, args| PartialCall {
        pid,
        line,
        name: name.to_string(),
        args,
    };
    Ok(match body {
        Body::Complete { name, args, ret } => TraceLine::Call(TraceRecord {
            pid,
            line,
            name: name.to_string(),
            args,
            ret,
        }),
        Body::Unfinished { name, args } => TraceLine::Unfinished(partial(name, args)),
        Body::Resumed { name, args, ret } => TraceLine::Resumed {
            call: partial(name, args),
            ret,
        },
        Body::Notice => TraceLine::Ignored,
    })
}

pub fn parse_lines(text: &str) -> impl Iterator<Item = Result<TraceLine, ParseError>> + '_ {
    text.lines()
        .enumerate()
        .map(|(index, line)| parse_line(index + 1, line))
}

fn describe_failure(input: &str, err: nom::Err<nom::error::Error<&str>>) -> String {
    match err {
        nom::Err::Error(err) | nom::Err::Failure(err) => {
            let column = input.len() - err.input.len() + 1;
            format!("unexpected input at column {column} ({:?})", err.code)
        }
        nom::Err::Incomplete(_) => "line ended early".to_string(),
    }
}

fn parse_trace_line(input: &str) -> IResult<&str, (Option<i32>, Body<'_>)> {
    let (input, pid) = opt(terminated(parse_pid, space1))(input)?;
    let (input, body) = alt((parse_notice, parse_resumed_call, parse_started_call))(input)?;
    Ok((input, (pid, body)))
}

fn parse_decimal_pid(input: &str) -> IResult<&str, i32> {
    map_res(digit1, str::parse::<i32>)(input)
}

fn parse_pid(input: &str) -> IResult<&str, i32> {
    alt((
        parse_decimal_pid,
        delimited(pair(tag("[pid"), space1), parse_decimal_pid, char(']')),
    ))(input)
}

// `+++ exited with 0 +++`, `--- SIGCHLD {...} ---`
fn parse_notice(input: &str) -> IResult<&str, Body<'_>> {
    map(pair(alt((tag("+++"), tag("---"))), rest), |_| Body::Notice)(input)
}

fn parse_started_call(input: &str) -> IResult<&str, Body<'_>> {
    let (input, name) = parse_identifier(input)?;
    let (input, _) = pair(char('('), space0)(input)?;
    let (input, args) = parse_arguments(input)?;
    let (input, ret) = alt((map(parse_outcome, Some), map(parse_unfinished_marker, |_| None)))(input)?;
    let body = match ret {
        Some(ret) => Body::Complete { name, args, ret },
        None => Body::Unfinished { name, args },
    };
    Ok((input, body))
}

fn parse_resumed_call(input: &str) -> IResult<&str, Body<'_>> {
    let (input, _) = pair(tag("<..."), space1)(input)?;
    let (input, name) = parse_identifier(input)?;
    let (input, _) = tuple((space1, tag("resumed>"), opt(char(',')), space0))(input)?;
    let (input, args) = parse_arguments(input)?;
    let (input, ret) = parse_outcome(input)?;
    Ok((input, Body::Resumed { name, args, ret }))
}

fn parse_unfinished_marker(input: &str) -> IResult<&str, &str> {
    // `read(7,  <unfinished ...>` keeps the comma of the missing argument
    preceded(
        tuple((opt(char(',')), space0)),
        terminated(tag("<unfinished ...>"), rest),
    )(input)
}

fn parse_outcome(input: &str) -> IResult<&str, ReturnValue> {
    preceded(
        tuple((space0, char(')'), space0, char('='), space0)),
        alt((parse_unknown_return, parse_numeric_return)),
    )(input)
}

fn parse_unknown_return(input: &str) -> IResult<&str, ReturnValue> {
    let (input, _) = char('?')(input)?;
    let (input, errno) = opt(preceded(space1, parse_errno_name))(input)?;
    let (input, _) = rest(input)?;
    let errno = errno.map(str::to_string);
    Ok((input, ReturnValue::Unknown { errno }))
}

fn parse_numeric_return(input: &str) -> IResult<&str, ReturnValue> {
    let (input, number) = parse_number(input)?;
    let (input, errno) = opt(preceded(space1, parse_errno_name))(input)?;
    // errno message, `(flags O_RDWR)` annotations, timings
    let (input, _) = rest(input)?;
    let value = match number {
        Literal::SignedInteger(value) => value,
        other => other.as_integer().unwrap_or_default() as i64,
    };
    let ret = if value < 0 || errno.is_some() {
        ReturnValue::Failed {
            value,
            errno: errno.map(str::to_string),
        }
    } else {
        ReturnValue::Value(value)
    };
    Ok((input, ret))
}

fn parse_errno_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        char('E'),
        take_while(|c: char| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_'),
    ))(input)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(is_identifier_char),
    ))(input)
}

fn parse_separator(input: &str) -> IResult<&str, char> {
    delimited(space0, char(','), space0)(input)
}

// clone and friends print `flags=...` at the top level, only the value matters
fn parse_argument(input: &str) -> IResult<&str, Literal> {
    preceded(opt(terminated(parse_identifier, char('='))), parse_literal)(input)
}

fn parse_arguments(input: &str) -> IResult<&str, Vec<Literal>> {
    separated_list0(parse_separator, parse_argument)(input)
}

fn parse_literal(input: &str) -> IResult<&str, Literal> {
    let (input, first) = parse_term(input)?;
    let (input, mut terms) = many0(preceded(tuple((space0, char('|'), space0)), parse_term))(input)?;
    let (input, _) = many0(parse_comment)(input)?;
    if terms.is_empty() {
        return Ok((input, first));
    }
    terms.insert(0, first);
    Ok((input, Literal::Flags(terms)))
}

// `0x7ffd1 /* 20 vars */`, the annotation carries nothing a program needs
fn parse_comment(input: &str) -> IResult<&str, &str> {
    preceded(space0, delimited(tag("/*"), take_until("*/"), tag("*/")))(input)
}

fn parse_term(input: &str) -> IResult<&str, Literal> {
    alt((
        map(parse_quoted_buffer, Literal::Buffer),
        map(parse_array, Literal::Array),
        map(parse_struct, Literal::Struct),
        map(parse_mac_address, Literal::MacAddress),
        parse_number,
        value(Literal::Null, terminated(tag("NULL"), not(satisfy(is_identifier_char)))),
        parse_identifier_or_call,
    ))(input)
}

fn parse_number(input: &str) -> IResult<&str, Literal> {
    alt((
        map_res(preceded(alt((tag("0x"), tag("0X"))), hex_digit1), |digits| {
            u64::from_str_radix(digits, 16).map(Literal::Integer)
        }),
        map_res(recognize(pair(char('-'), digit1)), |digits: &str| {
            digits.parse::<i64>().map(Literal::SignedInteger)
        }),
        // strace prints modes and masks with a leading zero
        map_res(preceded(char('0'), oct_digit1), |digits| {
            u64::from_str_radix(digits, 8).map(Literal::Integer)
        }),
        map_res(digit1, |digits: &str| digits.parse::<u64>().map(Literal::Integer)),
    ))(input)
}

fn parse_hex_pair(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()), |hex| {
        u8::from_str_radix(hex, 16)
    })(input)
}

fn parse_mac_address(input: &str) -> IResult<&str, [u8; 6]> {
    let (input, first) = parse_hex_pair(input)?;
    let (input, others) = count(preceded(char(':'), parse_hex_pair), 5)(input)?;
    let mut mac = [first; 6];
    mac[1..].copy_from_slice(&others);
    Ok((input, mac))
}

fn parse_identifier_or_call(input: &str) -> IResult<&str, Literal> {
    let (input, name) = parse_identifier(input)?;
    let (input, args) = opt(delimited(
        pair(char('('), space0),
        parse_arguments,
        pair(space0, char(')')),
    ))(input)?;
    let literal = match args {
        Some(args) => Literal::Call {
            function: name.to_string(),
            args,
        },
        None => Literal::Identifier(name.to_string()),
    };
    Ok((input, literal))
}

// `...` marks entries strace chose not to print
fn parse_elision<T: Clone>(input: &str) -> IResult<&str, Option<T>> {
    value(None, tag("..."))(input)
}

fn parse_array(input: &str) -> IResult<&str, Vec<Literal>> {
    let element = alt((parse_elision, map(parse_literal, Some)));
    let (input, elements) = delimited(
        pair(char('['), space0),
        separated_list0(parse_separator, element),
        tuple((opt(parse_separator), space0, char(']'))),
    )(input)?;
    Ok((input, elements.into_iter().flatten().collect()))
}

fn parse_struct_entry(input: &str) -> IResult<&str, Option<StructEntry>> {
    alt((
        parse_elision,
        map(
            separated_pair(parse_identifier, char('='), parse_literal),
            |(name, value)| {
                Some(StructEntry {
                    name: Some(name.to_string()),
                    value,
                })
            },
        ),
        map(parse_literal, |value| Some(StructEntry { name: None, value })),
    ))(input)
}

fn parse_struct(input: &str) -> IResult<&str, Vec<StructEntry>> {
    let (input, entries) = delimited(
        pair(char('{'), space0),
        separated_list0(parse_separator, parse_struct_entry),
        tuple((opt(parse_separator), space0, char('}'))),
    )(input)?;
    Ok((input, entries.into_iter().flatten().collect()))
}

fn parse_quoted_buffer(input: &str) -> IResult<&str, QuotedBuffer> {
    let (input, (raw, decoded)) =
        delimited(char('"'), consumed(parse_encoded_string), char('"'))(input)?;
    let (input, ellipsis) = opt(tag("..."))(input)?;
    Ok((
        input,
        QuotedBuffer {
            raw: raw.to_string(),
            decoded,
            truncated: ellipsis.is_some(),
        },
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StringFragment<'a> {
    Literal(&'a str),
    EscapedByte(u8),
}

fn parse_str_literal(input: &str) -> IResult<&str, &str> {
    verify(is_not("\"\\"), |s: &str| !s.is_empty())(input)
}

fn parse_hex_escape(input: &str) -> IResult<&str, u8> {
    preceded(char('x'), parse_hex_pair)(input)
}

fn parse_octal_escape(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(1, 3, |c: char| ('0'..='7').contains(&c)), |digits| {
        u8::from_str_radix(digits, 8)
    })(input)
}

fn parse_escaped_byte(input: &str) -> IResult<&str, u8> {
    preceded(
        char('\\'),
        alt((
            parse_hex_escape,
            parse_octal_escape,
            value(b'\t', char('t')),
            value(b'\n', char('n')),
            value(0x0b, char('v')),
            value(0x0c, char('f')),
            value(b'\r', char('r')),
            value(0x07, char('a')),
            value(b'"', char('"')),
            value(b'\'', char('\'')),
            value(b'\\', char('\\')),
        )),
    )(input)
}

fn parse_str_fragment(input: &str) -> IResult<&str, StringFragment<'_>> {
    alt((
        map(parse_str_literal, StringFragment::Literal),
        map(parse_escaped_byte, StringFragment::EscapedByte),
    ))(input)
}

fn parse_encoded_string(input: &str) -> IResult<&str, Vec<u8>> {
    fold_many0(
        parse_str_fragment,
        Vec::new,
        |mut bytes, fragment| {
            match fragment {
                StringFragment::Literal(s) => bytes.extend(s.as_bytes()),
                StringFragment::EscapedByte(byte) => bytes.push(byte),
            }
            bytes
        },
    )(input)
}
