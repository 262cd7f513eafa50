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

use std::collections::HashMap;

/// An AIG literal: variable index shifted left once, low bit set when
/// complemented. Literal 0 is constant false, literal 1 constant true.
pub type Lit = i32;

/// Constant false
pub const LIT_FALSE: Lit = 0;
/// Constant true
pub const LIT_TRUE: Lit = 1;

/// Complements a literal
pub fn lit_not(lit: Lit) -> Lit {
    lit ^ 1
}

/// The variable of a literal
pub fn lit_var(lit: Lit) -> usize {
    (lit >> 1) as usize
}

/// Whether the literal is complemented
pub fn lit_compl(lit: Lit) -> bool {
    lit & 1 != 0
}

const CI_NODE: (Lit, Lit) = (-1, -1);

/// A structurally hashed And-Inverter-Graph
///
/// Object 0 is the constant; combinational inputs and AND nodes share the
/// object space. AND fanins are stored as ordered literal pairs.
#[derive(Debug, Clone, Default)]
pub struct Aig {
    /// Fanin literal pairs; `(-1, -1)` marks a combinational input
    nodes: Vec<(Lit, Lit)>,
    /// Object indices of the combinational inputs, in creation order
    inputs: Vec<usize>,
    /// Output literals, in creation order
    outputs: Vec<Lit>,
    /// Structural hash table, active between `hash_begin`/`hash_end`
    strash: Option<HashMap<(Lit, Lit), Lit>>,
}

impl Aig {
    /// Empty graph holding only the constant node
    pub fn new() -> Aig {
        Aig {
            nodes: vec![(0, 0)],
            inputs: Vec::new(),
            outputs: Vec::new(),
            strash: None,
        }
    }

    /// Number of combinational inputs
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of outputs
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Number of AND nodes
    pub fn and_count(&self) -> usize {
        self.nodes.len() - 1 - self.inputs.len()
    }

    /// The output literals
    pub fn outputs(&self) -> &[Lit] {
        &self.outputs
    }

    /// Fanins of the AND node backing `obj`, `None` for inputs and the
    /// constant
    pub fn and_fanins(&self, obj: usize) -> Option<(Lit, Lit)> {
        if obj == 0 || self.nodes[obj] == CI_NODE {
            None
        } else {
            Some(self.nodes[obj])
        }
    }

    /// Total object count including the constant and the inputs
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Appends a combinational input and returns its literal
    pub fn append_input(&mut self) -> Lit {
        let obj = self.nodes.len();
        self.nodes.push(CI_NODE);
        self.inputs.push(obj);
        (obj as i32) << 1
    }

    /// Appends an output driven by `lit`
    pub fn append_output(&mut self, lit: Lit) {
        assert!(lit_var(lit) < self.nodes.len());
        self.outputs.push(lit);
    }

    /// Starts structural hashing, folding the existing AND nodes into
    /// the table
    pub fn hash_begin(&mut self) {
        let mut table = HashMap::new();
        for (obj, &fanins) in self.nodes.iter().enumerate().skip(1) {
            if fanins != CI_NODE {
                table.insert(fanins, (obj as i32) << 1);
            }
        }
        self.strash = Some(table);
    }

    /// Stops structural hashing
    pub fn hash_end(&mut self) {
        self.strash = None;
    }

    /// The AND of two literals, with constant folding and hashing
    pub fn and(&mut self, a: Lit, b: Lit) -> Lit {
        if a == LIT_FALSE || b == LIT_FALSE || a == lit_not(b) {
            return LIT_FALSE;
        }
        if a == LIT_TRUE || a == b {
            return b;
        }
        if b == LIT_TRUE {
            return a;
        }
        let key = if a < b { (a, b) } else { (b, a) };
        if let Some(table) = &self.strash {
            if let Some(&lit) = table.get(&key) {
                return lit;
            }
        }
        let obj = self.nodes.len();
        self.nodes.push(key);
        let lit = (obj as i32) << 1;
        if let Some(table) = &mut self.strash {
            table.insert(key, lit);
        }
        lit
    }

    /// The OR of two literals
    pub fn or(&mut self, a: Lit, b: Lit) -> Lit {
        lit_not(self.and(lit_not(a), lit_not(b)))
    }

    /// The XOR of two literals
    pub fn xor(&mut self, a: Lit, b: Lit) -> Lit {
        let f = self.and(a, lit_not(b));
        let g = self.and(lit_not(a), b);
        self.or(f, g)
    }

    /// `c ? t : e`
    pub fn mux(&mut self, c: Lit, t: Lit, e: Lit) -> Lit {
        let f = self.and(c, t);
        let g = self.and(lit_not(c), e);
        self.or(f, g)
    }

    fn cleanup_rec(&self, map: &mut Vec<Lit>, new: &mut Aig, obj: usize) {
        if map[obj] != -1 {
            return;
        }
        let (f0, f1) = self.nodes[obj];
        assert!(self.nodes[obj] != CI_NODE, "dangling input literal");
        self.cleanup_rec(map, new, lit_var(f0));
        self.cleanup_rec(map, new, lit_var(f1));
        let a = map[lit_var(f0)] ^ (f0 & 1);
        let b = map[lit_var(f1)] ^ (f1 & 1);
        map[obj] = new.and(a, b);
    }

    /// Rebuilds the graph keeping only nodes reachable from the outputs
    ///
    /// Inputs are preserved in order even when unused, so the I/O
    /// signature is unchanged.
    pub fn cleanup(&self) -> Aig {
        let mut new = Aig::new();
        let mut map = vec![-1; self.nodes.len()];
        map[0] = LIT_FALSE;
        for &obj in &self.inputs {
            map[obj] = new.append_input();
        }
        new.hash_begin();
        for &out in &self.outputs {
            self.cleanup_rec(&mut map, &mut new, lit_var(out));
        }
        for &out in &self.outputs {
            new.append_output(map[lit_var(out)] ^ (out & 1));
        }
        new.hash_end();
        new
    }

    /// Duplicates `source` into this graph under the input literals in
    /// `lits`, replacing the vector's contents with the mapped output
    /// literals
    ///
    /// This is the splice step of hierarchical blasting: the callee's
    /// AIG is rebuilt on top of the caller's input bits.
    pub fn dup_rebuild(&mut self, source: &Aig, lits: &mut Vec<Lit>) {
        assert_eq!(lits.len(), source.input_count());
        let mut map = vec![-1; source.nodes.len()];
        map[0] = LIT_FALSE;
        for (k, &obj) in source.inputs.iter().enumerate() {
            map[obj] = lits[k];
        }
        for (obj, &(f0, f1)) in source.nodes.iter().enumerate().skip(1) {
            if (f0, f1) == CI_NODE {
                continue;
            }
            let a = map[lit_var(f0)] ^ (f0 & 1);
            let b = map[lit_var(f1)] ^ (f1 & 1);
            assert!(a >= 0 && b >= 0);
            map[obj] = self.and(a, b);
        }
        lits.clear();
        for &out in &source.outputs {
            lits.push(map[lit_var(out)] ^ (out & 1));
        }
    }

    /// Evaluates the graph over one 64-pattern word per input
    pub fn simulate(&self, inputs: &[u64]) -> Vec<u64> {
        assert_eq!(inputs.len(), self.inputs.len());
        let mut values = vec![0u64; self.nodes.len()];
        let mut next_input = 0;
        for (obj, &(f0, f1)) in self.nodes.iter().enumerate().skip(1) {
            if (f0, f1) == CI_NODE {
                values[obj] = inputs[next_input];
                next_input += 1;
            } else {
                let a = values[lit_var(f0)] ^ if lit_compl(f0) { !0 } else { 0 };
                let b = values[lit_var(f1)] ^ if lit_compl(f1) { !0 } else { 0 };
                values[obj] = a & b;
            }
        }
        self.outputs
            .iter()
            .map(|&out| values[lit_var(out)] ^ if lit_compl(out) { !0 } else { 0 })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn folding_and_hashing() {
        let mut g = Aig::new();
        let a = g.append_input();
        let b = g.append_input();
        g.hash_begin();
        assert_eq!(g.and(a, LIT_FALSE), LIT_FALSE);
        assert_eq!(g.and(a, LIT_TRUE), a);
        assert_eq!(g.and(a, a), a);
        assert_eq!(g.and(a, lit_not(a)), LIT_FALSE);
        let ab = g.and(a, b);
        assert_eq!(g.and(b, a), ab);
        assert_eq!(g.and_count(), 1);
        g.hash_end();
    }

    #[test]
    fn cleanup_drops_dangling() {
        let mut g = Aig::new();
        let a = g.append_input();
        let b = g.append_input();
        g.hash_begin();
        let ab = g.and(a, b);
        let _dead = g.and(lit_not(a), b);
        g.hash_end();
        g.append_output(lit_not(ab));
        let clean = g.cleanup();
        assert_eq!(clean.input_count(), 2);
        assert_eq!(clean.output_count(), 1);
        assert_eq!(clean.and_count(), 1);
        // NAND truth table survives the rebuild
        let out = clean.simulate(&[0b0101, 0b0011]);
        assert_eq!(out[0] & 0xf, 0b1110);
    }

    #[test]
    fn dup_rebuild_splices() {
        // sub computes x & y
        let mut sub = Aig::new();
        let x = sub.append_input();
        let y = sub.append_input();
        sub.hash_begin();
        let xy = sub.and(x, y);
        sub.hash_end();
        sub.append_output(xy);

        // sink feeds it ~a and b
        let mut sink = Aig::new();
        let a = sink.append_input();
        let b = sink.append_input();
        sink.hash_begin();
        let mut lits = vec![lit_not(a), b];
        sink.dup_rebuild(&sub, &mut lits);
        sink.hash_end();
        assert_eq!(lits.len(), 1);
        sink.append_output(lits[0]);
        let out = sink.simulate(&[0b0101, 0b0011]);
        // output = !a & b
        assert_eq!(out[0] & 0xf, 0b0010);
    }

    #[test]
    fn simulate_mux() {
        let mut g = Aig::new();
        let c = g.append_input();
        let t = g.append_input();
        let e = g.append_input();
        g.hash_begin();
        let m = g.mux(c, t, e);
        g.hash_end();
        g.append_output(m);
        // c selects t when 1, e when 0
        let out = g.simulate(&[0b1100, 0b1010, 0b0110]);
        assert_eq!(out[0] & 0xf, 0b1010 & 0b1100 | 0b0110 & !0b1100 & 0xf);
    }
}
