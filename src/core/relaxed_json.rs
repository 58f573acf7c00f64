// Copyright 2025 Eric Jingryd (tidynest@proton.me)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! src/core/relaxed_json.rs
//!
//! Relaxed JSON decoding for keymap and settings files
//!
//! Editor keymaps are "JSON with comments": they allow `//` and `/* */`
//! comments and dangling commas before `]` or `}`. Decoding is done in
//! three passes:
//! 1. `strip_comments`: remove comments and insignificant whitespace
//! 2. `strip_dangling_commas`: drop `,` that only precedes a closer
//! 3. strict decoding with `serde_json`
//!
//! String literals pass through both cleaning passes untouched, so a value
//! like `"// not a comment"` survives.

use nom::{
    branch::alt,
    bytes::complete::{is_not, take_till1},
    character::complete::{anychar, char, multispace0, one_of},
    combinator::{map, recognize},
    multi::many0_count,
    IResult, Parser,
};
use serde_json::Value;

/// Scanner mode for `strip_comments`. The three non-code modes are
/// mutually exclusive.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Mode {
    Code,
    String,
    BlockComment,
    LineComment,
}

/// Remove comments and whitespace outside string literals
///
/// A `"` toggles string mode only outside comments, and closes a string only
/// when preceded by an even number of backslashes. Everything inside a
/// comment is discarded, including a trailing line-continuation backslash.
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut mode = Mode::Code;
    let mut backslashes = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match mode {
            Mode::String => {
                out.push(c);
                if c == '"' && backslashes % 2 == 0 {
                    mode = Mode::Code;
                }
                backslashes = if c == '\\' { backslashes + 1 } else { 0 };
            }
            Mode::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    mode = Mode::Code;
                }
            }
            Mode::LineComment => {
                if c == '\n' || c == '\r' {
                    mode = Mode::Code;
                }
            }
            Mode::Code => match c {
                '"' => {
                    out.push(c);
                    backslashes = 0;
                    mode = Mode::String;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    mode = Mode::BlockComment;
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    mode = Mode::LineComment;
                }
                ' ' | '\t' | '\n' | '\r' => {}
                _ => out.push(c),
            },
        }
    }

    out
}

/// One lexical piece of the dangling-comma pass.
#[derive(Debug, PartialEq)]
enum Segment<'a> {
    /// Copied to the output as-is
    Verbatim(&'a str),
    /// A comma followed only by whitespace and a closer
    DanglingComma { gap: &'a str, close: char },
}

fn dangling_comma(input: &str) -> IResult<&str, Segment<'_>> {
    map((char(','), multispace0, one_of("]}")), |(_, gap, close)| {
        Segment::DanglingComma { gap, close }
    })
    .parse(input)
}

fn double_quoted(input: &str) -> IResult<&str, &str> {
    recognize((
        char('"'),
        many0_count(alt((is_not("\"\\"), recognize((char('\\'), anychar))))),
        char('"'),
    ))
    .parse(input)
}

fn single_quoted(input: &str) -> IResult<&str, &str> {
    recognize((
        char('\''),
        many0_count(alt((is_not("'\\"), recognize((char('\\'), anychar))))),
        char('\''),
    ))
    .parse(input)
}

fn segment(input: &str) -> IResult<&str, Segment<'_>> {
    alt((
        dangling_comma,
        map(double_quoted, Segment::Verbatim),
        map(single_quoted, Segment::Verbatim),
        map(
            take_till1(|c: char| matches!(c, ',' | '"' | '\'')),
            Segment::Verbatim,
        ),
        map(recognize(anychar), Segment::Verbatim),
    ))
    .parse(input)
}

/// Remove commas that are followed only by whitespace and `]` or `}`
///
/// Whitespace between the comma and the closer is kept. Commas inside
/// quoted literals are never touched.
pub fn strip_dangling_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while !rest.is_empty() {
        match segment(rest) {
            Ok((remaining, Segment::Verbatim(piece))) => {
                out.push_str(piece);
                rest = remaining;
            }
            Ok((remaining, Segment::DanglingComma { gap, close })) => {
                out.push_str(gap);
                out.push(close);
                rest = remaining;
            }
            Err(_) => {
                out.push_str(rest);
                break;
            }
        }
    }

    out
}

/// Run both cleaning passes.
pub fn clean(text: &str) -> String {
    strip_dangling_commas(&strip_comments(text))
}

/// Clean then strictly decode a relaxed JSON document.
pub fn from_str(text: &str) -> serde_json::Result<Value> {
    serde_json::from_str(&clean(text))
}
