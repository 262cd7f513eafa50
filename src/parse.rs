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

use crate::token::{line_of, KeywordMap, Kw, Token};
use crate::{
    Cell, CellBinding, Constant, Error, Library, Module, NameId, Result, Signal, Slice, Wire,
    WireFlags,
};

/// Builds the in-memory library from a token stream
///
/// Statement-driven: each source line is one statement, recognized by
/// comparing its leading token against the pre-resolved keyword set.
pub struct Parser<'a> {
    lib: &'a mut Library,
    tokens: &'a [Token],
    kw: KeywordMap,
}

impl<'a> Parser<'a> {
    /// Parser over an already tokenized source
    pub fn new(lib: &'a mut Library, tokens: &'a [Token]) -> Parser<'a> {
        let kw = KeywordMap::resolve(&lib.pools.names);
        Parser { lib, tokens, kw }
    }

    /// Parses every top-level statement into the library
    pub fn parse(mut self) -> Result<()> {
        let mut i = 0;
        while i < self.tokens.len() {
            let id = self.tokens[i].id();
            if self.kw.is(id, Kw::Module) {
                i = self.read_module(i + 1)?;
            } else if self.kw.is(id, Kw::Attribute) {
                i = self.read_attribute(i + 1)?;
            } else {
                i += 1;
            }
        }
        Ok(())
    }

    fn err(&self, pos: usize, msg: impl Into<String>) -> Error {
        Error::Parse {
            line: line_of(self.tokens, pos),
            msg: msg.into(),
        }
    }

    fn tok_id(&self, pos: usize) -> NameId {
        if pos < self.tokens.len() {
            self.tokens[pos].id()
        } else {
            NameId::none()
        }
    }

    fn expect_line_end(&self, pos: usize) -> Result<()> {
        if pos < self.tokens.len() && self.tokens[pos] == Token::LineEnd {
            Ok(())
        } else {
            Err(self.err(pos, "expected end of line"))
        }
    }

    /// Buffers one `attribute K V` statement
    fn read_attribute(&mut self, mut pos: usize) -> Result<usize> {
        let par = self.tok_id(pos);
        let val = self.tok_id(pos + 1);
        if par.is_none() || val.is_none() {
            return Err(self.err(pos, "attribute needs a name and a value"));
        }
        pos += 2;
        self.expect_line_end(pos)?;
        self.lib.attr_temp.push((par, val));
        Ok(pos)
    }

    /// Finds the `end` matching a `module`, skipping nested `cell … end`
    fn match_end(&self, start: usize) -> Result<usize> {
        let mut depth = 0usize;
        for i in start..self.tokens.len() {
            let id = self.tokens[i].id();
            if self.kw.is(id, Kw::Cell) {
                depth += 1;
            } else if self.kw.is(id, Kw::End) {
                if depth == 0 {
                    return Ok(i);
                }
                depth -= 1;
            }
        }
        Err(self.err(start, "missing end of module"))
    }

    /// Parses one `module NAME … end` block, returning the position of
    /// its `end`
    fn read_module(&mut self, pos: usize) -> Result<usize> {
        let name = self.tok_id(pos);
        if name.is_none() {
            return Err(self.err(pos, "module needs a name"));
        }
        let end = self.match_end(pos)?;
        let mut module = Module::new(name);
        module.attrs = std::mem::take(&mut self.lib.attr_temp);
        module.slice0 = self.lib.pools.slices.len();

        let mut i = pos + 1;
        while i < end {
            let id = self.tokens[i].id();
            if self.kw.is(id, Kw::Wire) {
                i = self.read_wire(&mut module, i + 1)?;
            } else if self.kw.is(id, Kw::Attribute) {
                i = self.read_attribute(i + 1)?;
            } else if self.kw.is(id, Kw::Cell) {
                i = self.read_cell(&mut module, i + 1)?;
            } else if self.kw.is(id, Kw::Connect) {
                i = self.read_connect(&mut module, i + 1)?;
            } else {
                i += 1;
            }
        }

        module.slice1 = self.lib.pools.slices.len();
        self.lib.modules.push(module);
        Ok(end + 1)
    }

    fn read_int(&self, pos: usize) -> Result<i32> {
        let id = self.tok_id(pos);
        if id.is_none() {
            return Err(self.err(pos, "expected a number"));
        }
        self.lib
            .pools
            .str(id)
            .parse()
            .map_err(|_| self.err(pos, format!("bad number `{}`", self.lib.pools.str(id))))
    }

    /// Parses one `wire … NAME` statement
    ///
    /// The name is the last token of the line; any pending attributes are
    /// dropped, wires do not carry them.
    fn read_wire(&mut self, module: &mut Module, mut pos: usize) -> Result<usize> {
        self.lib.attr_temp.clear();
        let mut wire = Wire {
            flags: WireFlags::empty(),
            name: NameId::none(),
            width: 1,
            offset: 0,
            number: 0,
            bit_start: -1,
        };
        let mut last = NameId::none();
        while pos < self.tokens.len() && self.tokens[pos] != Token::LineEnd {
            let id = self.tokens[pos].id();
            if self.kw.is(id, Kw::Width) {
                wire.width = self.read_int(pos + 1)? as u32;
                pos += 1;
            } else if self.kw.is(id, Kw::Offset) {
                wire.offset = self.read_int(pos + 1)?;
                pos += 1;
            } else if self.kw.is(id, Kw::Input) {
                wire.number = self.read_int(pos + 1)?;
                wire.flags |= WireFlags::INPUT;
                module.n_inputs += 1;
                pos += 1;
            } else if self.kw.is(id, Kw::Output) {
                wire.number = self.read_int(pos + 1)?;
                wire.flags |= WireFlags::OUTPUT;
                module.n_outputs += 1;
                pos += 1;
            } else if self.kw.is(id, Kw::Signed) {
                wire.flags |= WireFlags::SIGNED;
            } else if self.kw.is(id, Kw::Upto) {
                wire.flags |= WireFlags::UPTO;
            }
            last = self.tokens[pos].id();
            pos += 1;
        }
        if last.is_none() {
            return Err(self.err(pos, "wire needs a name"));
        }
        wire.name = last;
        module.wires.push(wire);
        Ok(pos)
    }

    /// Parses one module-scope `connect SIG SIG` statement
    fn read_connect(&mut self, module: &mut Module, mut pos: usize) -> Result<usize> {
        let lhs = self.read_sig(&mut pos)?;
        let rhs = self.read_sig(&mut pos)?;
        self.expect_line_end(pos)?;
        module.conns.push((lhs, rhs));
        Ok(pos)
    }

    /// Parses one `cell TYPE INSTANCE … end` block
    fn read_cell(&mut self, module: &mut Module, mut pos: usize) -> Result<usize> {
        let ty = self.tok_id(pos);
        let instance = self.tok_id(pos + 1);
        if ty.is_none() || instance.is_none() {
            return Err(self.err(pos, "cell needs a type and an instance name"));
        }
        pos += 2;
        self.expect_line_end(pos)?;

        let mut cell = Cell {
            ty,
            instance,
            binding: CellBinding::Unresolved,
            n_inputs: 0,
            mark: false,
            attrs: std::mem::take(&mut self.lib.attr_temp),
            params: Vec::new(),
            conns: Vec::new(),
        };

        while pos < self.tokens.len() {
            let id = self.tokens[pos].id();
            if self.kw.is(id, Kw::End) {
                pos += 1;
                self.expect_line_end(pos)?;
                module.cells.push(cell);
                return Ok(pos);
            }
            if self.kw.is(id, Kw::Parameter) || self.kw.is(id, Kw::Connect) {
                let is_param = self.kw.is(id, Kw::Parameter);
                pos += 1;
                let par = self.read_sig(&mut pos)?;
                let val = self.read_sig(&mut pos)?;
                self.expect_line_end(pos)?;
                let par = match par {
                    Signal::Wire(name) => name,
                    _ => return Err(self.err(pos, "port name expected")),
                };
                if is_param {
                    cell.params.push((par, val));
                } else {
                    cell.conns.push((par, val));
                }
            } else {
                pos += 1;
            }
        }
        Err(self.err(pos, "missing end of cell"))
    }

    /// Parses one signal expression starting at `*pos`
    fn read_sig(&mut self, pos: &mut usize) -> Result<Signal> {
        let id = self.tok_id(*pos);
        if id.is_none() {
            return Err(self.err(*pos, "expected a signal"));
        }
        let first = self.lib.pools.str(id).as_bytes()[0];
        if first.is_ascii_digit() {
            *pos += 1;
            return self.read_const(id, *pos - 1);
        }
        if first == b'{' {
            *pos += 1;
            return self.read_concat(pos);
        }
        *pos += 1;
        let next = self.tok_id(*pos);
        if !next.is_none() && self.lib.pools.str(next).as_bytes()[0] == b'[' {
            *pos += 1;
            return self.read_slice(next, id, *pos - 1);
        }
        Ok(Signal::Wire(id))
    }

    /// Parses a `W'bits` or untyped integer constant token
    fn read_const(&mut self, id: NameId, pos: usize) -> Result<Signal> {
        let constant = {
            let tok = self.lib.pools.str(id);
            let digits: String = tok.chars().take_while(|c| c.is_ascii_digit()).collect();
            if let Some(quote) = tok.find('\'') {
                let width: usize = digits
                    .parse()
                    .map_err(|_| self.err(pos, format!("bad constant `{}`", tok)))?;
                let bits = &tok[quote + 1..];
                if bits.len() < width {
                    return Err(self.err(pos, format!("bad constant `{}`", tok)));
                }
                let mut words = vec![0u32; (width + 31) / 32];
                for (i, c) in bits.bytes().rev().take(width).enumerate() {
                    if c == b'1' {
                        words[i / 32] |= 1 << (i % 32);
                    }
                }
                Constant {
                    width: width as i32,
                    words,
                }
            } else {
                let value: u32 = tok
                    .parse()
                    .map_err(|_| self.err(pos, format!("bad constant `{}`", tok)))?;
                Constant::untyped(value)
            }
        };
        self.lib.pools.consts.push(constant);
        Ok(Signal::Const(self.lib.pools.consts.len() - 1))
    }

    /// Parses a `[L]` or `[L:R]` token following a wire name
    fn read_slice(&mut self, tok: NameId, wire: NameId, pos: usize) -> Result<Signal> {
        let (left, right) = {
            let s = self.lib.pools.str(tok);
            if !s.starts_with('[') || !s.ends_with(']') {
                return Err(self.err(pos, format!("bad slice `{}`", s)));
            }
            let inner = &s[1..s.len() - 1];
            let mut parts = inner.splitn(2, ':');
            let left: i32 = parts
                .next()
                .unwrap_or("")
                .parse()
                .map_err(|_| self.err(pos, format!("bad slice `{}`", s)))?;
            let right = match parts.next() {
                Some(r) => r
                    .parse()
                    .map_err(|_| self.err(pos, format!("bad slice `{}`", s)))?,
                None => left,
            };
            (left, right)
        };
        self.lib.pools.slices.push(Slice { wire, left, right });
        Ok(Signal::Slice(self.lib.pools.slices.len() - 1))
    }

    /// Parses the members of a `{ … }` concatenation
    fn read_concat(&mut self, pos: &mut usize) -> Result<Signal> {
        let mut members = Vec::new();
        loop {
            let id = self.tok_id(*pos);
            if id.is_none() {
                return Err(self.err(*pos, "unterminated concatenation"));
            }
            if self.lib.pools.str(id).as_bytes()[0] == b'}' {
                *pos += 1;
                break;
            }
            members.push(self.read_sig(pos)?);
        }
        if members.is_empty() {
            return Err(self.err(*pos, "empty concatenation"));
        }
        self.lib.pools.concats.push(members);
        Ok(Signal::Concat(self.lib.pools.concats.len() - 1))
    }
}
