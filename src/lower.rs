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

use crate::aig::{lit_not, Aig, Lit, LIT_FALSE, LIT_TRUE};
use crate::Oper;

/// Truncates or pads a bit vector to `width`, filling with zero or the
/// sign bit
fn extend(bits: &[Lit], width: usize, signed: bool) -> Vec<Lit> {
    let mut out: Vec<Lit> = bits.iter().take(width).copied().collect();
    let fill = if signed && !bits.is_empty() {
        bits[bits.len() - 1]
    } else {
        LIT_FALSE
    };
    while out.len() < width {
        out.push(fill);
    }
    out
}

/// Ripple-carry sum of two equal-width vectors
fn adder(g: &mut Aig, a: &[Lit], b: &[Lit], carry_in: Lit) -> (Vec<Lit>, Lit) {
    assert_eq!(a.len(), b.len());
    let mut carry = carry_in;
    let mut sum = Vec::with_capacity(a.len());
    for (&x, &y) in a.iter().zip(b) {
        let xy = g.xor(x, y);
        sum.push(g.xor(xy, carry));
        let p = g.and(x, y);
        let q = g.and(carry, xy);
        carry = g.or(p, q);
    }
    (sum, carry)
}

/// Two's complement negation
fn negate(g: &mut Aig, a: &[Lit]) -> Vec<Lit> {
    let inv: Vec<Lit> = a.iter().map(|&l| lit_not(l)).collect();
    let zero = vec![LIT_FALSE; a.len()];
    adder(g, &inv, &zero, LIT_TRUE).0
}

fn reduce_and(g: &mut Aig, a: &[Lit]) -> Lit {
    a.iter().fold(LIT_TRUE, |acc, &l| g.and(acc, l))
}

fn reduce_or(g: &mut Aig, a: &[Lit]) -> Lit {
    a.iter().fold(LIT_FALSE, |acc, &l| g.or(acc, l))
}

fn reduce_xor(g: &mut Aig, a: &[Lit]) -> Lit {
    a.iter().fold(LIT_FALSE, |acc, &l| g.xor(acc, l))
}

/// A single bit zero-extended to `width`
fn widen_bit(bit: Lit, width: usize) -> Vec<Lit> {
    let mut out = vec![LIT_FALSE; width.max(1)];
    out[0] = bit;
    out.truncate(width);
    out
}

/// Per-bit `c ? t : e` over equal-width vectors
fn mux_vec(g: &mut Aig, c: Lit, t: &[Lit], e: &[Lit]) -> Vec<Lit> {
    assert_eq!(t.len(), e.len());
    t.iter()
        .zip(e)
        .map(|(&x, &y)| g.mux(c, x, y))
        .collect()
}

/// Barrel shifter over a non-constant shift amount
///
/// Stage `j` conditionally shifts by `2^j`; amounts at or beyond the
/// width select the fill on every bit.
fn shifter(g: &mut Aig, a: Vec<Lit>, b: &[Lit], fill: Lit, left: bool) -> Vec<Lit> {
    let width = a.len();
    let mut cur = a;
    for (j, &bj) in b.iter().enumerate() {
        if bj == LIT_FALSE {
            continue;
        }
        let shift = 1usize.checked_shl(j as u32).unwrap_or(usize::MAX);
        let shifted: Vec<Lit> = if shift >= width {
            vec![fill; width]
        } else if left {
            let mut v = vec![fill; shift];
            v.extend_from_slice(&cur[..width - shift]);
            v
        } else {
            let mut v = cur[shift..].to_vec();
            v.resize(width, fill);
            v
        };
        cur = mux_vec(g, bj, &shifted, &cur);
    }
    cur
}

/// `a < b` over the operands' own widths, honoring per-side signedness
fn less_than(g: &mut Aig, a: &[Lit], b: &[Lit], sign0: bool, sign1: bool) -> Lit {
    let w = a.len().max(b.len()) + 1;
    let ae = extend(a, w, sign0);
    let be: Vec<Lit> = extend(b, w, sign1).iter().map(|&l| lit_not(l)).collect();
    let (diff, _) = adder(g, &ae, &be, LIT_TRUE);
    diff[w - 1]
}

/// `a == b`, honoring per-side signedness
fn equal(g: &mut Aig, a: &[Lit], b: &[Lit], sign0: bool, sign1: bool) -> Lit {
    let w = a.len().max(b.len()) + 1;
    let ae = extend(a, w, sign0);
    let be = extend(b, w, sign1);
    let diffs: Vec<Lit> = ae
        .iter()
        .zip(&be)
        .map(|(&x, &y)| g.xor(x, y))
        .collect();
    lit_not(reduce_or(g, &diffs))
}

/// Shift-and-add multiplier at the accumulator width
fn multiplier(g: &mut Aig, a: &[Lit], b: &[Lit]) -> Vec<Lit> {
    let width = a.len();
    assert_eq!(width, b.len());
    let mut acc = vec![LIT_FALSE; width];
    for j in 0..width {
        if b[j] == LIT_FALSE {
            continue;
        }
        let mut partial = vec![LIT_FALSE; j];
        for i in 0..width - j {
            partial.push(g.and(a[i], b[j]));
        }
        acc = adder(g, &acc, &partial, LIT_FALSE).0;
    }
    acc
}

/// Restoring divider; returns unsigned quotient and remainder
fn divider(g: &mut Aig, a: &[Lit], d: &[Lit]) -> (Vec<Lit>, Vec<Lit>) {
    let width = a.len();
    assert_eq!(width, d.len());
    let d_ext: Vec<Lit> = extend(d, width + 1, false)
        .iter()
        .map(|&l| lit_not(l))
        .collect();
    let mut rem = vec![LIT_FALSE; width + 1];
    let mut quo = vec![LIT_FALSE; width];
    for i in (0..width).rev() {
        rem.pop();
        rem.insert(0, a[i]);
        let (diff, take) = adder(g, &rem, &d_ext, LIT_TRUE);
        rem = mux_vec(g, take, &diff, &rem);
        quo[i] = take;
    }
    rem.truncate(width);
    (quo, rem)
}

/// Lowers one word-level operator to AIG nodes
///
/// `ins` holds one little-endian literal vector per input port in port
/// order; the result is the output's `nrange` bits. `sign0`/`sign1`
/// carry the declared signedness of the first and second input.
pub fn blast_node(
    g: &mut Aig,
    oper: Oper,
    ins: &[Vec<Lit>],
    nrange: usize,
    sign0: bool,
    sign1: bool,
) -> Vec<Lit> {
    match oper {
        Oper::Buf => extend(&ins[0], nrange, sign0),
        Oper::Inv => extend(&ins[0], nrange, sign0)
            .iter()
            .map(|&l| lit_not(l))
            .collect(),
        Oper::Neg => {
            let a = extend(&ins[0], nrange, sign0);
            negate(g, &a)
        }
        Oper::RedAnd => widen_bit(reduce_and(g, &ins[0]), nrange),
        Oper::RedOr => widen_bit(reduce_or(g, &ins[0]), nrange),
        Oper::RedXor => widen_bit(reduce_xor(g, &ins[0]), nrange),
        Oper::RedXnor => {
            let r = reduce_xor(g, &ins[0]);
            widen_bit(lit_not(r), nrange)
        }
        Oper::LogicNot => {
            let r = reduce_or(g, &ins[0]);
            widen_bit(lit_not(r), nrange)
        }
        Oper::LogicAnd => {
            let a = reduce_or(g, &ins[0]);
            let b = reduce_or(g, &ins[1]);
            let r = g.and(a, b);
            widen_bit(r, nrange)
        }
        Oper::LogicOr => {
            let a = reduce_or(g, &ins[0]);
            let b = reduce_or(g, &ins[1]);
            let r = g.or(a, b);
            widen_bit(r, nrange)
        }
        Oper::And | Oper::Or | Oper::Xor | Oper::Xnor => {
            let a = extend(&ins[0], nrange, sign0);
            let b = extend(&ins[1], nrange, sign1);
            a.iter()
                .zip(&b)
                .map(|(&x, &y)| match oper {
                    Oper::And => g.and(x, y),
                    Oper::Or => g.or(x, y),
                    Oper::Xor => g.xor(x, y),
                    _ => lit_not(g.xor(x, y)),
                })
                .collect()
        }
        Oper::Shl | Oper::Sshl => {
            let a = extend(&ins[0], nrange, sign0);
            shifter(g, a, &ins[1], LIT_FALSE, true)
        }
        Oper::Shr | Oper::Sshr => {
            let a = extend(&ins[0], nrange, sign0);
            let fill = if oper == Oper::Sshr && sign0 {
                a[nrange - 1]
            } else {
                LIT_FALSE
            };
            shifter(g, a, &ins[1], fill, false)
        }
        Oper::Lt => widen_bit(less_than(g, &ins[0], &ins[1], sign0, sign1), nrange),
        Oper::Gt => widen_bit(less_than(g, &ins[1], &ins[0], sign1, sign0), nrange),
        Oper::Le => {
            let r = less_than(g, &ins[1], &ins[0], sign1, sign0);
            widen_bit(lit_not(r), nrange)
        }
        Oper::Ge => {
            let r = less_than(g, &ins[0], &ins[1], sign0, sign1);
            widen_bit(lit_not(r), nrange)
        }
        Oper::Eq => widen_bit(equal(g, &ins[0], &ins[1], sign0, sign1), nrange),
        Oper::Ne => {
            let r = equal(g, &ins[0], &ins[1], sign0, sign1);
            widen_bit(lit_not(r), nrange)
        }
        Oper::Add => {
            let a = extend(&ins[0], nrange, sign0);
            let b = extend(&ins[1], nrange, sign1);
            adder(g, &a, &b, LIT_FALSE).0
        }
        Oper::Sub => {
            let a = extend(&ins[0], nrange, sign0);
            let b: Vec<Lit> = extend(&ins[1], nrange, sign1)
                .iter()
                .map(|&l| lit_not(l))
                .collect();
            adder(g, &a, &b, LIT_TRUE).0
        }
        Oper::Mul => {
            let a = extend(&ins[0], nrange, sign0);
            let b = extend(&ins[1], nrange, sign1);
            multiplier(g, &a, &b)
        }
        Oper::Div | Oper::Mod => {
            let signed = sign0 && sign1;
            let w = nrange.max(ins[0].len()).max(ins[1].len());
            let a = extend(&ins[0], w, sign0);
            let d = extend(&ins[1], w, sign1);
            let (quo, rem) = if signed {
                let sa = a[w - 1];
                let sd = d[w - 1];
                let neg_a = negate(g, &a);
                let abs_a = mux_vec(g, sa, &neg_a, &a);
                let neg_d = negate(g, &d);
                let abs_d = mux_vec(g, sd, &neg_d, &d);
                let (uq, ur) = divider(g, &abs_a, &abs_d);
                let flip = g.xor(sa, sd);
                let neg_q = negate(g, &uq);
                let neg_r = negate(g, &ur);
                (mux_vec(g, flip, &neg_q, &uq), mux_vec(g, sa, &neg_r, &ur))
            } else {
                divider(g, &a, &d)
            };
            let result = if oper == Oper::Div { quo } else { rem };
            extend(&result, nrange, signed)
        }
        Oper::Pow => {
            let mut base = extend(&ins[0], nrange, sign0);
            let one = widen_bit(LIT_TRUE, nrange);
            let mut acc = one;
            for (j, &bj) in ins[1].iter().enumerate() {
                let stepped = multiplier(g, &acc, &base);
                acc = mux_vec(g, bj, &stepped, &acc);
                if j + 1 < ins[1].len() {
                    base = multiplier(g, &base, &base);
                }
            }
            acc
        }
        Oper::Mux => {
            let a = extend(&ins[0], nrange, false);
            let b = extend(&ins[1], nrange, false);
            mux_vec(g, ins[2][0], &b, &a)
        }
        Oper::Pmux => {
            let mut cur = extend(&ins[0], nrange, false);
            for (i, &si) in ins[2].iter().enumerate() {
                let lo = i * nrange;
                let hi = (lo + nrange).min(ins[1].len());
                let part = extend(&ins[1][lo.min(ins[1].len())..hi], nrange, false);
                cur = mux_vec(g, si, &part, &cur);
            }
            cur
        }
        Oper::Dff | Oper::None => unreachable!("handled by the blaster"),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn eval(oper: Oper, widths: &[usize], nrange: usize, signs: (bool, bool), vals: &[u64]) -> u64 {
        let mut g = Aig::new();
        let mut ins = Vec::new();
        let mut patterns = Vec::new();
        for (&w, &v) in widths.iter().zip(vals) {
            let mut bits = Vec::new();
            for b in 0..w {
                bits.push(g.append_input());
                patterns.push(if (v >> b) & 1 != 0 { !0u64 } else { 0 });
            }
            ins.push(bits);
        }
        g.hash_begin();
        let out = blast_node(&mut g, oper, &ins, nrange, signs.0, signs.1);
        g.hash_end();
        assert_eq!(out.len(), nrange);
        for &lit in &out {
            g.append_output(lit);
        }
        let words = g.simulate(&patterns);
        let mut result = 0u64;
        for (b, word) in words.iter().enumerate() {
            if word & 1 != 0 {
                result |= 1 << b;
            }
        }
        result
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval(Oper::Add, &[4, 4], 4, (false, false), &[7, 9]), 0);
        assert_eq!(eval(Oper::Add, &[4, 4], 5, (false, false), &[7, 9]), 16);
        assert_eq!(eval(Oper::Sub, &[4, 4], 4, (false, false), &[3, 5]), 14);
        assert_eq!(eval(Oper::Mul, &[4, 4], 8, (false, false), &[11, 13]), 143);
        assert_eq!(eval(Oper::Neg, &[4], 4, (false, false), &[1]), 15);
    }

    #[test]
    fn division() {
        assert_eq!(eval(Oper::Div, &[8, 8], 8, (false, false), &[100, 7]), 14);
        assert_eq!(eval(Oper::Mod, &[8, 8], 8, (false, false), &[100, 7]), 2);
        // -7 / 2 = -3 truncated
        assert_eq!(
            eval(Oper::Div, &[4, 4], 4, (true, true), &[0b1001, 2]),
            0b1101
        );
        // -7 % 2 = -1
        assert_eq!(
            eval(Oper::Mod, &[4, 4], 4, (true, true), &[0b1001, 2]),
            0b1111
        );
    }

    #[test]
    fn shifts() {
        assert_eq!(eval(Oper::Shl, &[4, 2], 4, (false, false), &[0b0011, 2]), 0b1100);
        assert_eq!(eval(Oper::Shr, &[4, 2], 4, (false, false), &[0b1100, 2]), 0b0011);
        // arithmetic right shift keeps the sign
        assert_eq!(
            eval(Oper::Sshr, &[4, 2], 4, (true, false), &[0b1000, 2]),
            0b1110
        );
        // shifting out everything leaves the fill
        assert_eq!(eval(Oper::Shr, &[4, 3], 4, (false, false), &[0b1111, 5]), 0);
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval(Oper::Lt, &[4, 4], 1, (false, false), &[3, 5]), 1);
        assert_eq!(eval(Oper::Lt, &[4, 4], 1, (false, false), &[5, 3]), 0);
        // signed: -1 < 1
        assert_eq!(eval(Oper::Lt, &[4, 4], 1, (true, true), &[0xf, 1]), 1);
        // unsigned: 15 > 1
        assert_eq!(eval(Oper::Lt, &[4, 4], 1, (false, false), &[0xf, 1]), 0);
        assert_eq!(eval(Oper::Eq, &[4, 4], 1, (false, false), &[9, 9]), 1);
        assert_eq!(eval(Oper::Ne, &[4, 4], 1, (false, false), &[9, 8]), 1);
        assert_eq!(eval(Oper::Le, &[4, 4], 1, (false, false), &[5, 5]), 1);
        assert_eq!(eval(Oper::Ge, &[4, 4], 1, (false, false), &[4, 5]), 0);
    }

    #[test]
    fn logic_and_reductions() {
        assert_eq!(eval(Oper::RedAnd, &[4], 1, (false, false), &[0xf]), 1);
        assert_eq!(eval(Oper::RedAnd, &[4], 1, (false, false), &[0xe]), 0);
        assert_eq!(eval(Oper::RedOr, &[4], 1, (false, false), &[0]), 0);
        assert_eq!(eval(Oper::RedXor, &[4], 1, (false, false), &[0b0111]), 1);
        assert_eq!(eval(Oper::RedXnor, &[4], 1, (false, false), &[0b0111]), 0);
        assert_eq!(eval(Oper::LogicNot, &[4], 1, (false, false), &[0]), 1);
        assert_eq!(eval(Oper::LogicAnd, &[4, 4], 1, (false, false), &[2, 0]), 0);
        assert_eq!(eval(Oper::LogicOr, &[4, 4], 1, (false, false), &[2, 0]), 1);
    }

    #[test]
    fn muxes() {
        assert_eq!(
            eval(Oper::Mux, &[4, 4, 1], 4, (false, false), &[3, 12, 0]),
            3
        );
        assert_eq!(
            eval(Oper::Mux, &[4, 4, 1], 4, (false, false), &[3, 12, 1]),
            12
        );
        // pmux selects one-hot slices of B, defaulting to A
        assert_eq!(
            eval(Oper::Pmux, &[4, 8, 2], 4, (false, false), &[5, 0x21, 0b10]),
            2
        );
        assert_eq!(
            eval(Oper::Pmux, &[4, 8, 2], 4, (false, false), &[5, 0x21, 0b00]),
            5
        );
    }

    #[test]
    fn power() {
        assert_eq!(eval(Oper::Pow, &[4, 3], 8, (false, false), &[3, 4]), 81);
        assert_eq!(eval(Oper::Pow, &[4, 3], 8, (false, false), &[2, 0]), 1);
    }

    #[test]
    fn widths_and_signs() {
        // zero vs sign extension through Buf
        assert_eq!(eval(Oper::Buf, &[4], 8, (false, false), &[0b1010]), 0b1010);
        assert_eq!(
            eval(Oper::Buf, &[4], 8, (true, false), &[0b1010]),
            0b11111010
        );
        assert_eq!(eval(Oper::Inv, &[4], 4, (false, false), &[0b1010]), 0b0101);
    }
}
