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

use crate::{Aig, NameId, NameTable, Oper};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// Flags describing wire properties
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct WireFlags: u32 {
        /// The wire is a primary input of its module
        const INPUT = 1 << 0;
        /// The wire is a primary output of its module
        const OUTPUT = 1 << 1;
        /// The wire carries a signed value
        const SIGNED = 1 << 2;
        /// The declared bit range runs from low to high; cleared by
        /// range normalization
        const UPTO = 1 << 3;
    }
}

/// A named bit-vector of fixed width within a module
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct Wire {
    /// Flags describing the wire
    pub flags: WireFlags,
    /// The wire name
    pub name: NameId,
    /// Width in bits (at least 1)
    pub width: u32,
    /// Declared base bit index; cleared by range normalization
    pub offset: i32,
    /// 1-based order among inputs or outputs, 0 for internal wires
    pub number: i32,
    /// Base index into the per-bit literal vector, -1 until assigned
    pub bit_start: i32,
}

impl Wire {
    /// Whether the wire is a primary input
    pub fn is_input(&self) -> bool {
        self.flags.contains(WireFlags::INPUT)
    }

    /// Whether the wire is a primary output
    pub fn is_output(&self) -> bool {
        self.flags.contains(WireFlags::OUTPUT)
    }
}

/// A sized or untyped constant
///
/// Sized constants store their bits little-endian in 32-bit words. An
/// untyped integer literal has `width` -1 and its value in `words[0]`;
/// its effective width is 32.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Constant {
    /// Declared width in bits, -1 for an untyped integer literal
    pub width: i32,
    /// Value bits, little-endian
    pub words: Vec<u32>,
}

impl Constant {
    /// An untyped integer literal
    pub fn untyped(value: u32) -> Constant {
        Constant {
            width: -1,
            words: vec![value],
        }
    }

    /// Effective width in bits
    pub fn nbits(&self) -> usize {
        if self.width < 0 {
            32
        } else {
            self.width as usize
        }
    }

    /// Value of bit `i`
    pub fn bit(&self, i: usize) -> bool {
        (self.words[i / 32] >> (i % 32)) & 1 != 0
    }

    /// The constant as a plain integer, for parameter values
    ///
    /// `None` when the constant is too wide to fit one word.
    pub fn int_value(&self) -> Option<u32> {
        if self.width >= 32 {
            return None;
        }
        Some(self.words[0])
    }
}

/// A contiguous bit selection `wire[left:right]` out of a named wire
///
/// A single-bit selection has `left == right`. After range normalization
/// `0 <= right <= left < width`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct Slice {
    /// Name of the sliced wire
    pub wire: NameId,
    /// Upper selected bit
    pub left: i32,
    /// Lower selected bit
    pub right: i32,
}

/// An expression producing or consuming a bit-vector
///
/// Payloads of the pooled variants are indices into the corresponding
/// [`Pools`] sequence.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// An entire wire, by name
    Wire(NameId),
    /// A constant from the constant pool
    Const(usize),
    /// A bit selection from the slice pool
    Slice(usize),
    /// A concatenation from the concatenation pool, most significant
    /// member first
    Concat(usize),
}

/// What a cell's type string resolved to
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellBinding {
    /// Not linked yet
    Unresolved,
    /// A built-in word-level operator
    Oper(Oper),
    /// The callee module is not defined in this library
    BlackBox,
    /// Instance of the library module with this index
    Module(usize),
}

/// An instance of an operator or of another module
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct Cell {
    /// The cell type name (e.g. `$add`, or a module name)
    pub ty: NameId,
    /// The instance name
    pub instance: NameId,
    /// Resolved meaning of the type name
    pub binding: CellBinding,
    /// Number of leading connections that are input ports
    pub n_inputs: usize,
    /// Scheduling mark
    pub mark: bool,
    /// Attribute pairs attached to this instance
    pub attrs: Vec<(NameId, NameId)>,
    /// Parameter bindings, port name to signal
    pub params: Vec<(NameId, Signal)>,
    /// Port connections, port name to signal, inputs first
    pub conns: Vec<(NameId, Signal)>,
}

impl Cell {
    /// Number of output connections
    pub fn n_outputs(&self) -> usize {
        self.conns.len() - self.n_inputs
    }

    /// The input connections
    pub fn inputs(&self) -> &[(NameId, Signal)] {
        &self.conns[..self.n_inputs]
    }

    /// The output connections
    pub fn outputs(&self) -> &[(NameId, Signal)] {
        &self.conns[self.n_inputs..]
    }

    /// Integer value of a constant parameter, `None` when absent
    pub fn param_value(&self, pools: &Pools, name: &str) -> Option<u32> {
        let id = pools.names.find(name);
        if id.is_none() {
            return None;
        }
        for &(par, val) in &self.params {
            if par == id {
                if let Signal::Const(c) = val {
                    return pools.consts[c].int_value();
                }
            }
        }
        None
    }
}

/// Shared expression pools and the name table
///
/// Populated by the parser, read-only for every later pass.
#[derive(Debug, Default)]
pub struct Pools {
    /// Interned object names
    pub names: NameTable,
    /// Constant pool
    pub consts: Vec<Constant>,
    /// Slice pool
    pub slices: Vec<Slice>,
    /// Concatenation pool
    pub concats: Vec<Vec<Signal>>,
}

impl Pools {
    /// The string interned under `id`
    pub fn str(&self, id: NameId) -> &str {
        self.names.str(id)
    }
}

/// A single hardware module of the design
///
/// After wire ordering `wires[0..n_inputs]` are the inputs and
/// `wires[n_inputs..n_inputs + n_outputs]` the outputs, both in declared
/// port order; the rest are internal.
#[derive(Debug, Default)]
pub struct Module {
    /// The module name
    pub name: NameId,
    /// Number of input wires
    pub n_inputs: usize,
    /// Number of output wires
    pub n_outputs: usize,
    /// All wires declared in the module
    pub wires: Vec<Wire>,
    /// Operator cells and module instantiations
    pub cells: Vec<Cell>,
    /// Module-scope connection pairs
    pub conns: Vec<(Signal, Signal)>,
    /// Attribute pairs attached to the module
    pub attrs: Vec<(NameId, NameId)>,
    /// First slice pool index belonging to this module
    pub slice0: usize,
    /// One past the last slice pool index belonging to this module
    pub slice1: usize,
    /// Dataflow schedule over the merged input/cell/connection space
    pub order: Vec<usize>,
    /// Per-bit producer step or AIG literal, -1 unknown
    pub lits: Vec<i32>,
    /// Scratch storage for collected bits
    pub bit_temp: Vec<i32>,
    /// Bit-level view derived by blasting
    pub aig: Option<Aig>,
    /// Final topological position assigned by the linker
    pub place: i32,
}

impl Module {
    /// Empty module with the given name
    pub fn new(name: NameId) -> Module {
        Module {
            name,
            place: -1,
            ..Module::default()
        }
    }

    /// Total object count: inputs, outputs, cells and connections
    pub fn obj_count(&self) -> usize {
        self.n_inputs + self.n_outputs + self.cells.len() + self.conns.len()
    }

    /// Counts inputs/outputs and their bit totals
    pub fn count_pio(&self) -> (usize, usize, usize, usize) {
        let mut counts = (0, 0, 0, 0);
        for wire in &self.wires {
            if wire.is_input() {
                counts.0 += 1;
                counts.1 += wire.width as usize;
            }
            if wire.is_output() {
                counts.2 += 1;
                counts.3 += wire.width as usize;
            }
        }
        assert_eq!(self.n_inputs, counts.0);
        assert_eq!(self.n_outputs, counts.2);
        counts
    }

    /// Assigns each wire its base position in the per-bit literal vector
    /// and returns the total bit count
    pub fn range_wires(&mut self) -> usize {
        let mut bits = 0usize;
        for wire in &mut self.wires {
            wire.bit_start = bits as i32;
            bits += wire.width as usize;
        }
        bits
    }

    /// Registers every wire of the module in the shared scratch map
    ///
    /// The map must be all -1 on entry; [`Module::unmap_wires`] restores
    /// that state and asserts it.
    pub fn map_wires(&self, wire_map: &mut [i32]) {
        for (i, wire) in self.wires.iter().enumerate() {
            assert_eq!(wire_map[wire.name.index()], -1);
            wire_map[wire.name.index()] = i as i32;
        }
    }

    /// Clears this module's entries from the shared scratch map and
    /// asserts the map is empty again
    pub fn unmap_wires(&self, wire_map: &mut [i32]) {
        for (i, wire) in self.wires.iter().enumerate() {
            assert_eq!(wire_map[wire.name.index()], i as i32);
            wire_map[wire.name.index()] = -1;
        }
        for &value in wire_map.iter() {
            assert_eq!(value, -1);
        }
    }

    /// Wire index for a mapped name
    pub fn wire_of(&self, wire_map: &[i32], name: NameId) -> usize {
        let w = wire_map[name.index()];
        assert!(w >= 0);
        w as usize
    }

    fn wire_span(&self, wire_map: &[i32], name: NameId, left: i32, right: i32) -> (usize, usize) {
        let wire = &self.wires[self.wire_of(wire_map, name)];
        let left = if left == -1 {
            wire.width as i32 - 1
        } else {
            left
        };
        let right = if right == -1 { 0 } else { right };
        assert!(0 <= right && right <= left);
        let first = wire.bit_start as usize;
        (first + right as usize, first + left as usize)
    }

    /// Bit width of a signal
    pub fn sig_width(&self, pools: &Pools, wire_map: &[i32], sig: Signal) -> usize {
        match sig {
            Signal::Wire(name) => self.wires[self.wire_of(wire_map, name)].width as usize,
            Signal::Const(c) => pools.consts[c].nbits(),
            Signal::Slice(s) => {
                let slice = &pools.slices[s];
                (slice.left - slice.right + 1) as usize
            }
            Signal::Concat(c) => pools.concats[c]
                .iter()
                .map(|&s| self.sig_width(pools, wire_map, s))
                .sum(),
        }
    }

    /// Whether every bit of the signal has a defined producer
    pub fn sig_defined(&self, pools: &Pools, wire_map: &[i32], sig: Signal) -> bool {
        match sig {
            Signal::Wire(name) => {
                let (lo, hi) = self.wire_span(wire_map, name, -1, -1);
                self.lits[lo..=hi].iter().all(|&l| l != -1)
            }
            Signal::Const(_) => true,
            Signal::Slice(s) => {
                let slice = &pools.slices[s];
                let (lo, hi) = self.wire_span(wire_map, slice.wire, slice.left, slice.right);
                self.lits[lo..=hi].iter().all(|&l| l != -1)
            }
            Signal::Concat(c) => pools.concats[c]
                .iter()
                .all(|&s| self.sig_defined(pools, wire_map, s)),
        }
    }

    /// Defines every bit of the signal to `value`
    ///
    /// Every destination bit must be undefined; constants cannot be a
    /// definition target.
    pub fn sig_set(&mut self, pools: &Pools, wire_map: &[i32], sig: Signal, value: i32) {
        match sig {
            Signal::Wire(name) => {
                let (lo, hi) = self.wire_span(wire_map, name, -1, -1);
                for lit in &mut self.lits[lo..=hi] {
                    assert_eq!(*lit, -1);
                    *lit = value;
                }
            }
            Signal::Const(_) => panic!("constant on the left-hand side"),
            Signal::Slice(s) => {
                let slice = pools.slices[s];
                let (lo, hi) = self.wire_span(wire_map, slice.wire, slice.left, slice.right);
                for lit in &mut self.lits[lo..=hi] {
                    assert_eq!(*lit, -1);
                    *lit = value;
                }
            }
            Signal::Concat(c) => {
                for i in 0..pools.concats[c].len() {
                    self.sig_set(pools, wire_map, pools.concats[c][i], value);
                }
            }
        }
    }

    /// Appends the signal's bits to `bit_temp`, least significant first
    ///
    /// Concatenation members are visited in reverse declared order since
    /// the textual form is most-significant-first. Constant bits become
    /// the literals 0 and 1.
    pub fn sig_collect(&mut self, pools: &Pools, wire_map: &[i32], sig: Signal) {
        match sig {
            Signal::Wire(name) => {
                let (lo, hi) = self.wire_span(wire_map, name, -1, -1);
                for i in lo..=hi {
                    assert_ne!(self.lits[i], -1);
                    self.bit_temp.push(self.lits[i]);
                }
            }
            Signal::Const(c) => {
                let constant = &pools.consts[c];
                for i in 0..constant.nbits() {
                    self.bit_temp.push(constant.bit(i) as i32);
                }
            }
            Signal::Slice(s) => {
                let slice = pools.slices[s];
                let (lo, hi) = self.wire_span(wire_map, slice.wire, slice.left, slice.right);
                for i in lo..=hi {
                    assert_ne!(self.lits[i], -1);
                    self.bit_temp.push(self.lits[i]);
                }
            }
            Signal::Concat(c) => {
                for i in (0..pools.concats[c].len()).rev() {
                    self.sig_collect(pools, wire_map, pools.concats[c][i]);
                }
            }
        }
    }

    /// Writes `lits` into the signal's bits, least significant first,
    /// and returns how many literals were consumed
    ///
    /// Destination bits must be undefined; the insertion may consume
    /// fewer literals than provided (an untyped constant source may be
    /// wider than its destination).
    pub fn sig_insert(
        &mut self,
        pools: &Pools,
        wire_map: &[i32],
        sig: Signal,
        lits: &[i32],
    ) -> usize {
        match sig {
            Signal::Wire(name) => {
                let (lo, hi) = self.wire_span(wire_map, name, -1, -1);
                let mut k = 0;
                for i in lo..=hi {
                    assert_eq!(self.lits[i], -1);
                    self.lits[i] = lits[k];
                    k += 1;
                }
                k
            }
            Signal::Const(_) => panic!("constant on the left-hand side"),
            Signal::Slice(s) => {
                let slice = pools.slices[s];
                let (lo, hi) = self.wire_span(wire_map, slice.wire, slice.left, slice.right);
                let mut k = 0;
                for i in lo..=hi {
                    assert_eq!(self.lits[i], -1);
                    self.lits[i] = lits[k];
                    k += 1;
                }
                k
            }
            Signal::Concat(c) => {
                let mut k = 0;
                for i in (0..pools.concats[c].len()).rev() {
                    k += self.sig_insert(pools, wire_map, pools.concats[c][i], &lits[k..]);
                }
                k
            }
        }
    }
}

/// The design library: all modules, the name table and the shared pools
///
/// Module order is insertion order until the linker rewrites it to
/// dependency order (callees before callers).
#[derive(Debug, Default)]
pub struct Library {
    /// All modules of the design
    pub modules: Vec<Module>,
    /// Shared pools and names
    pub pools: Pools,
    /// Scratch map from name index to wire index, -1 when unmapped
    ///
    /// Must be observed all -1 on entry to and exit from every pass that
    /// borrows it.
    pub wire_map: Vec<i32>,
    /// Pending attribute pairs, flushed onto the next cell or module
    pub attr_temp: Vec<(NameId, NameId)>,
    /// Dump each blasted module to `temp<N>.aig`
    pub dump_blasted: bool,
    /// Monotonic counter for blast dump file names
    pub blast_counter: usize,
}

impl Library {
    /// Empty library
    pub fn new() -> Library {
        Library::default()
    }

    /// Index of the module with the given name
    pub fn find_module(&self, name: NameId) -> Option<usize> {
        self.modules.iter().position(|m| m.name == name)
    }

    /// The top module (the last one in dependency order)
    pub fn top(&self) -> &Module {
        self.modules.last().expect("empty library")
    }

    /// Grows the shared scratch map to cover every interned name
    pub fn ensure_wire_map(&mut self) {
        self.wire_map.resize(self.pools.names.count(), -1);
    }

    /// The string interned under `id`
    pub fn str(&self, id: NameId) -> &str {
        self.pools.str(id)
    }
}
