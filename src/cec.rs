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

use crate::Aig;

/// Inputs up to this count are checked by exhaustive enumeration
pub const EXHAUSTIVE_VARS: usize = 20;

/// Outcome of a combinational check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The property holds for every input assignment
    Proven,
    /// A counterexample was found
    Disproven,
    /// The check was inconclusive at this effort
    Unknown,
}

// 64 input words for patterns base..base+63 of an n-input enumeration
fn enumeration_chunk(n: usize, base: u64) -> Vec<u64> {
    let mut words = vec![0u64; n];
    for t in 0..64u64 {
        let assignment = base + t;
        for (i, word) in words.iter_mut().enumerate() {
            if (assignment >> i) & 1 != 0 {
                *word |= 1 << t;
            }
        }
    }
    words
}

fn chunk_mask(n: usize, base: u64) -> u64 {
    let total = 1u64 << n;
    if base + 64 <= total {
        !0
    } else {
        (1u64 << (total - base)) - 1
    }
}

// xorshift64; deterministic so checks are reproducible
fn next_random(state: &mut u64) -> u64 {
    *state ^= *state << 13;
    *state ^= *state >> 7;
    *state ^= *state << 17;
    *state
}

/// Checks two graphs with identical I/O signatures for combinational
/// equivalence
///
/// Small input counts are enumerated exhaustively and decide the check;
/// larger graphs get `effort` rounds of randomized simulation, which can
/// only disprove.
pub fn verify_two(a: &Aig, b: &Aig, effort: usize) -> Status {
    if a.input_count() != b.input_count() || a.output_count() != b.output_count() {
        return Status::Disproven;
    }
    let n = a.input_count();
    if n <= EXHAUSTIVE_VARS {
        let total = 1u64 << n;
        let mut base = 0;
        while base < total {
            let inputs = enumeration_chunk(n, base);
            let mask = chunk_mask(n, base);
            let oa = a.simulate(&inputs);
            let ob = b.simulate(&inputs);
            for (x, y) in oa.iter().zip(&ob) {
                if (x ^ y) & mask != 0 {
                    return Status::Disproven;
                }
            }
            base += 64;
        }
        return Status::Proven;
    }
    let mut state = 0x2545f4914f6cdd1d;
    for _ in 0..effort {
        let inputs: Vec<u64> = (0..n).map(|_| next_random(&mut state)).collect();
        let oa = a.simulate(&inputs);
        let ob = b.simulate(&inputs);
        if oa != ob {
            return Status::Disproven;
        }
    }
    Status::Unknown
}

/// Simple satisfiability check: is any output ever 1?
///
/// `Proven` means unsatisfiable (every output is constant 0), which is
/// the "verified" outcome for an inverted-and-ORed miter.
pub fn solve_simple(g: &Aig) -> Status {
    let n = g.input_count();
    if n <= EXHAUSTIVE_VARS {
        let total = 1u64 << n;
        let mut base = 0;
        while base < total {
            let inputs = enumeration_chunk(n, base);
            let mask = chunk_mask(n, base);
            for word in g.simulate(&inputs) {
                if word & mask != 0 {
                    return Status::Disproven;
                }
            }
            base += 64;
        }
        return Status::Proven;
    }
    let mut state = 0x9e3779b97f4a7c15;
    for _ in 0..256 {
        let inputs: Vec<u64> = (0..n).map(|_| next_random(&mut state)).collect();
        if g.simulate(&inputs).iter().any(|&w| w != 0) {
            return Status::Disproven;
        }
    }
    Status::Unknown
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::aig::{lit_not, Aig};

    // a & b built directly
    fn and_graph() -> Aig {
        let mut g = Aig::new();
        let a = g.append_input();
        let b = g.append_input();
        g.hash_begin();
        let ab = g.and(a, b);
        g.hash_end();
        g.append_output(ab);
        g
    }

    // a & b via double negation, structurally different
    fn and_graph_demorgan() -> Aig {
        let mut g = Aig::new();
        let a = g.append_input();
        let b = g.append_input();
        g.hash_begin();
        let or = g.or(lit_not(a), lit_not(b));
        g.hash_end();
        g.append_output(lit_not(or));
        g
    }

    #[test]
    fn equivalent_pair() {
        assert_eq!(verify_two(&and_graph(), &and_graph_demorgan(), 8), Status::Proven);
    }

    #[test]
    fn different_pair() {
        let mut g = Aig::new();
        let a = g.append_input();
        let b = g.append_input();
        g.hash_begin();
        let o = g.or(a, b);
        g.hash_end();
        g.append_output(o);
        assert_eq!(verify_two(&and_graph(), &g, 8), Status::Disproven);
    }

    #[test]
    fn signature_mismatch() {
        let mut g = Aig::new();
        let a = g.append_input();
        g.append_output(a);
        assert_eq!(verify_two(&and_graph(), &g, 8), Status::Disproven);
    }

    #[test]
    fn miter_solving() {
        // and == and: miter output is constant 0
        let a = and_graph();
        let b = and_graph_demorgan();
        let mut miter = Aig::new();
        let i0 = miter.append_input();
        let i1 = miter.append_input();
        miter.hash_begin();
        let mut la = vec![i0, i1];
        miter.dup_rebuild(&a, &mut la);
        let mut lb = vec![i0, i1];
        miter.dup_rebuild(&b, &mut lb);
        let diff = miter.xor(la[0], lb[0]);
        miter.hash_end();
        miter.append_output(diff);
        assert_eq!(solve_simple(&miter), Status::Proven);

        // an invertible output is satisfiable
        let mut sat = Aig::new();
        let x = sat.append_input();
        sat.append_output(lit_not(x));
        assert_eq!(solve_simple(&sat), Status::Disproven);
    }
}
