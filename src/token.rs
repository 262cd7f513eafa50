// BSD 3-Clause License
//
// Copyright © 2021 Keegan Saunders
// Copyright © 2021 VTIL Project
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this
//    list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice,
//    this list of conditions and the following disclaimer in the documentation
//    and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its
//    contributors may be used to endorse or promote products derived from
//    this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.
//

use crate::{Error, NameId, NameTable, Result};

/// One element of the flat token stream
///
/// Every source line that carries at least one token is terminated by a
/// [`Token::LineEnd`] so the parser can recognize statement boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// An interned token
    Id(NameId),
    /// Logical end of a source line
    LineEnd,
}

impl Token {
    /// The interned identifier, `NameId(0)` for a line end
    pub fn id(self) -> NameId {
        match self {
            Token::Id(id) => id,
            Token::LineEnd => NameId::none(),
        }
    }
}

/// The fixed keyword set of the netlist grammar
///
/// Values index into [`KeywordMap`]; `None` is the unused zero slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Kw {
    /// Unused zero slot
    None = 0,
    /// `module`
    Module,
    /// `end`
    End,
    /// `input`
    Input,
    /// `output`
    Output,
    /// `inout`
    Inout,
    /// `upto`
    Upto,
    /// `signed`
    Signed,
    /// `offset`
    Offset,
    /// `parameter`
    Parameter,
    /// `wire`
    Wire,
    /// `connect`
    Connect,
    /// `cell`
    Cell,
    /// `width`
    Width,
    /// `attribute`
    Attribute,
}

const KEYWORDS: &[(Kw, &str)] = &[
    (Kw::Module, "module"),
    (Kw::End, "end"),
    (Kw::Input, "input"),
    (Kw::Output, "output"),
    (Kw::Inout, "inout"),
    (Kw::Upto, "upto"),
    (Kw::Signed, "signed"),
    (Kw::Offset, "offset"),
    (Kw::Parameter, "parameter"),
    (Kw::Wire, "wire"),
    (Kw::Connect, "connect"),
    (Kw::Cell, "cell"),
    (Kw::Width, "width"),
    (Kw::Attribute, "attribute"),
];

/// Keyword identifiers resolved once per load
///
/// Keywords that never occur in the input resolve to the null identifier,
/// so a comparison against them can never match a real token.
#[derive(Debug)]
pub struct KeywordMap {
    ids: [NameId; 15],
}

impl KeywordMap {
    /// Resolves the keyword set against an already populated [`NameTable`]
    pub fn resolve(names: &NameTable) -> KeywordMap {
        let mut ids = [NameId::none(); 15];
        for &(kw, s) in KEYWORDS {
            ids[kw as usize] = names.find(s);
        }
        KeywordMap { ids }
    }

    /// Whether `id` is the given keyword
    pub fn is(&self, id: NameId, kw: Kw) -> bool {
        !id.is_none() && self.ids[kw as usize] == id
    }
}

/// Splits one line into whitespace-separated tokens, keeping quoted
/// substrings (including the quote characters) intact.
fn split_line(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut tokens = Vec::new();
    let mut start = None;
    let mut quote = false;
    for (i, &b) in bytes.iter().enumerate() {
        let sep = !quote && (b == b' ' || b == b'\t' || b == b'\r');
        if b == b'"' {
            quote = !quote;
        }
        if sep {
            if let Some(s) = start.take() {
                tokens.push(&line[s..i]);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(&line[s..]);
    }
    tokens
}

/// Tokenizes a netlist source buffer
///
/// Interns `"module"` first so its identifier is always 1, strips
/// `#`-comment lines, and appends a [`Token::LineEnd`] after every line
/// that produced at least one token.
pub fn tokenize(source: &[u8], names: &mut NameTable) -> Result<Vec<Token>> {
    let id = names.find_or_add("module");
    assert_eq!(id, NameId(1));
    let mut tokens = Vec::with_capacity(1024);
    for (n, raw) in source.split(|&b| b == b'\n').enumerate() {
        if raw.first() == Some(&b'#') {
            continue;
        }
        let line = std::str::from_utf8(raw).map_err(|e| Error::Parse {
            line: n + 1,
            msg: format!("line is not valid UTF-8: {}", e),
        })?;
        let parts = split_line(line);
        if parts.is_empty() {
            continue;
        }
        for part in parts {
            tokens.push(Token::Id(names.find_or_add(part)));
        }
        tokens.push(Token::LineEnd);
    }
    Ok(tokens)
}

/// 1-based source line of the token at `pos`, counting line ends
///
/// Comment and empty lines are not represented in the stream, so this is
/// the line among the lines that carried tokens; good enough to point a
/// reader at the offending statement.
pub fn line_of(tokens: &[Token], pos: usize) -> usize {
    1 + tokens[..pos.min(tokens.len())]
        .iter()
        .filter(|t| **t == Token::LineEnd)
        .count()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn basic() {
        use crate::*;

        let src = b"# comment line\nmodule top\n  wire width 4 x\nend\n";
        let mut names = NameTable::new();
        let tokens = tokenize(src, &mut names).unwrap();
        assert_eq!(names.find("module"), NameId(1));
        assert_eq!(tokens[0], Token::Id(NameId(1)));
        assert_eq!(tokens[2], Token::LineEnd);
        let ends = tokens.iter().filter(|t| **t == Token::LineEnd).count();
        assert_eq!(ends, 3);
        let kw = KeywordMap::resolve(&names);
        assert!(kw.is(tokens[0].id(), Kw::Module));
        assert!(kw.is(tokens[3].id(), Kw::Wire));
        assert!(!kw.is(names.find("top"), Kw::Module));
        // "parameter" never occurs, so nothing can match it
        assert!(!kw.is(names.find("top"), Kw::Parameter));
    }

    #[test]
    fn quoted_spaces() {
        use crate::*;

        let src = b"attribute \\src \"mul.v 13\"\n";
        let mut names = NameTable::new();
        let tokens = tokenize(src, &mut names).unwrap();
        // attribute, \src, "mul.v 13", line end
        assert_eq!(tokens.len(), 4);
        assert_eq!(names.str(tokens[2].id()), "\"mul.v 13\"");
    }

    #[test]
    fn line_numbers() {
        use crate::*;

        let src = b"module a\nend\nmodule b\nend\n";
        let mut names = NameTable::new();
        let tokens = tokenize(src, &mut names).unwrap();
        assert_eq!(line_of(&tokens, 0), 1);
        assert_eq!(line_of(&tokens, 5), 3);
    }
}
