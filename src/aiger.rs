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

use crate::aig::{lit_compl, lit_var, Aig};
use crate::{Error, Result};
use scroll::{
    ctx::{self, SizeWith},
    Endian, Pwrite,
};
use std::path::Path;

/// Binary AIGER view of an [`Aig`], serializable with scroll
///
/// Inputs are renumbered 1..I, AND nodes follow in definition order, so
/// the delta encoding of the `aig` format applies directly.
pub struct Aiger<'a>(pub &'a Aig);

struct Layout {
    header: String,
    output_lines: Vec<String>,
    // (delta0, delta1) per AND node, already renumbered
    deltas: Vec<(u32, u32)>,
}

fn varint_len(mut delta: u32) -> usize {
    let mut len = 1;
    while delta >= 0x80 {
        delta >>= 7;
        len += 1;
    }
    len
}

fn layout(aig: &Aig) -> Layout {
    let n_inputs = aig.input_count();
    let n_ands = aig.and_count();
    // old object -> renumbered literal
    let mut map = vec![0u32; aig.node_count()];
    let mut next_var = 1u32;
    for obj in 1..aig.node_count() {
        if aig.and_fanins(obj).is_none() {
            map[obj] = next_var << 1;
            next_var += 1;
        }
    }
    let mut deltas = Vec::with_capacity(n_ands);
    for obj in 1..aig.node_count() {
        if let Some((f0, f1)) = aig.and_fanins(obj) {
            let lhs = next_var << 1;
            map[obj] = lhs;
            next_var += 1;
            let a = map[lit_var(f0)] | lit_compl(f0) as u32;
            let b = map[lit_var(f1)] | lit_compl(f1) as u32;
            let (rhs0, rhs1) = if a >= b { (a, b) } else { (b, a) };
            assert!(lhs > rhs0);
            deltas.push((lhs - rhs0, rhs0 - rhs1));
        }
    }
    let output_lines = aig
        .outputs()
        .iter()
        .map(|&out| format!("{}\n", map[lit_var(out)] | lit_compl(out) as u32))
        .collect();
    Layout {
        header: format!(
            "aig {} {} 0 {} {}\n",
            n_inputs + n_ands,
            n_inputs,
            aig.output_count(),
            n_ands
        ),
        output_lines,
        deltas,
    }
}

impl<'a> ctx::SizeWith<Aiger<'a>> for Aiger<'a> {
    fn size_with(aiger: &Aiger) -> usize {
        let layout = layout(aiger.0);
        let mut size = layout.header.len();
        for line in &layout.output_lines {
            size += line.len();
        }
        for &(d0, d1) in &layout.deltas {
            size += varint_len(d0) + varint_len(d1);
        }
        size
    }
}

impl<'a> ctx::TryIntoCtx<Endian> for Aiger<'a> {
    type Error = Error;

    fn try_into_ctx(self, sink: &mut [u8], _endian: Endian) -> Result<usize> {
        let layout = layout(self.0);
        let offset = &mut 0;

        sink.gwrite::<&[u8]>(layout.header.as_bytes(), offset)?;
        for line in &layout.output_lines {
            sink.gwrite::<&[u8]>(line.as_bytes(), offset)?;
        }
        for &(d0, d1) in &layout.deltas {
            for mut delta in [d0, d1].iter().copied() {
                while delta >= 0x80 {
                    sink.gwrite::<u8>((delta & 0x7f) as u8 | 0x80, offset)?;
                    delta >>= 7;
                }
                sink.gwrite::<u8>(delta as u8, offset)?;
            }
        }
        Ok(*offset)
    }
}

/// Writes the graph to `path` in the binary AIGER format
pub fn write_aiger<P: AsRef<Path>>(aig: &Aig, path: P) -> Result<()> {
    let size = Aiger::size_with(&Aiger(aig));
    let mut buffer = vec![0u8; size];
    let written = buffer.pwrite_with(Aiger(aig), 0, scroll::LE)?;
    assert_eq!(written, size);
    std::fs::write(path, &buffer)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aig::lit_not;
    use scroll::ctx::SizeWith;

    #[test]
    fn basic() {
        // single AND with one inverted output
        let mut g = Aig::new();
        let a = g.append_input();
        let b = g.append_input();
        g.hash_begin();
        let ab = g.and(a, b);
        g.hash_end();
        g.append_output(lit_not(ab));

        let size = Aiger::size_with(&Aiger(&g));
        let mut buffer = vec![0u8; size];
        let written = buffer.pwrite_with(Aiger(&g), 0, scroll::LE).unwrap();
        assert_eq!(written, size);

        // header, one output line "7\n", then deltas 2 and 2
        let text = String::from_utf8_lossy(&buffer[..written]);
        assert!(text.starts_with("aig 3 2 0 1 1\n"));
        assert!(text.contains("7\n"));
        assert_eq!(&buffer[written - 2..], &[2, 2]);
    }

    #[test]
    fn varint_encoding() {
        assert_eq!(super::varint_len(0), 1);
        assert_eq!(super::varint_len(127), 1);
        assert_eq!(super::varint_len(128), 2);
        assert_eq!(super::varint_len(1 << 14), 3);
    }
}
