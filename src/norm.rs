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

use crate::{CellBinding, Library, WireFlags};

const PORT_CLASS: i64 = 1 << 30;

/// Canonicalizes the library after linking
///
/// Rewrites every slice into the zero-based little-endian bit space of
/// its wire, orders wires inputs-outputs-internals, and re-permutes each
/// hierarchical instance's connections to its callee's new wire order.
/// Running it twice is a no-op.
pub fn normalize(lib: &mut Library) {
    norm_ranges(lib);
    order_wires(lib);
    update_instances(lib);
}

/// Rebases slice bounds by the wire offset and flips bounds of `upto`
/// wires, then clears both wire fields
pub fn norm_ranges(lib: &mut Library) {
    lib.ensure_wire_map();
    let Library {
        ref mut modules,
        ref mut pools,
        ref mut wire_map,
        ..
    } = *lib;
    for module in modules.iter_mut() {
        module.map_wires(wire_map);
        for i in module.slice0..module.slice1 {
            let slice = &mut pools.slices[i];
            let wire = &module.wires[wire_map[slice.wire.index()] as usize];
            assert_eq!(wire.name, slice.wire);
            slice.left -= wire.offset;
            slice.right -= wire.offset;
            if wire.flags.contains(WireFlags::UPTO) {
                std::mem::swap(&mut slice.left, &mut slice.right);
            }
        }
        for wire in &mut module.wires {
            wire.flags.remove(WireFlags::UPTO);
            wire.offset = 0;
        }
        module.unmap_wires(wire_map);
    }
}

/// Stably reorders each module's wires: inputs by port number, then
/// outputs by port number, then internals in declared order
pub fn order_wires(lib: &mut Library) {
    for module in &mut lib.modules {
        let mut cost = 0;
        let keyed: Vec<i64> = module
            .wires
            .iter()
            .map(|wire| {
                let is_io = wire.is_input() || wire.is_output();
                assert_eq!(is_io, wire.number > 0);
                if wire.is_input() {
                    wire.number as i64
                } else if wire.is_output() {
                    PORT_CLASS + wire.number as i64
                } else {
                    cost += 1;
                    2 * PORT_CLASS + cost
                }
            })
            .collect();
        let mut perm: Vec<usize> = (0..module.wires.len()).collect();
        perm.sort_by_key(|&i| keyed[i]);
        module.wires = perm.iter().map(|&i| module.wires[i]).collect();
    }
}

/// Reorders every hierarchical instance's connection list to match its
/// callee's wire order, so `conns[k]` addresses `callee.wires[k]`
pub fn update_instances(lib: &mut Library) {
    lib.ensure_wire_map();
    let wire_names: Vec<Vec<_>> = lib
        .modules
        .iter()
        .map(|m| m.wires.iter().map(|w| w.name).collect())
        .collect();
    let io_counts: Vec<_> = lib
        .modules
        .iter()
        .map(|m| m.n_inputs + m.n_outputs)
        .collect();

    let Library {
        ref mut modules,
        ref mut wire_map,
        ..
    } = *lib;
    for module in modules.iter_mut() {
        for cell in &mut module.cells {
            let callee = match cell.binding {
                CellBinding::Module(k) => k,
                _ => continue,
            };
            assert_eq!(cell.conns.len(), io_counts[callee]);
            for (k, &(par, _)) in cell.conns.iter().enumerate() {
                wire_map[par.index()] = k as i32;
            }
            let mut permuted = Vec::with_capacity(cell.conns.len());
            for name in wire_names[callee].iter().take(cell.conns.len()) {
                let k = wire_map[name.index()];
                assert!(k >= 0);
                let pair = cell.conns[k as usize];
                assert_eq!(pair.0, *name);
                wire_map[name.index()] = -1;
                permuted.push(pair);
            }
            cell.conns = permuted;
        }
    }
    for &value in wire_map.iter() {
        assert_eq!(value, -1);
    }
}

#[cfg(test)]
mod test {
    use crate::token::tokenize;
    use crate::*;

    fn prepared(src: &str) -> Library {
        let mut lib = Library::new();
        let tokens = tokenize(src.as_bytes(), &mut lib.pools.names).unwrap();
        Parser::new(&mut lib, &tokens).parse().unwrap();
        link(&mut lib);
        normalize(&mut lib);
        lib
    }

    #[test]
    fn slice_rebase_and_upto() {
        let lib = prepared(
            "module m\n\
             \x20 wire width 8 offset 4 v\n\
             \x20 wire width 8 upto u\n\
             \x20 wire width 8 y\n\
             \x20 connect y v [7:4]\n\
             \x20 connect y u [0:3]\n\
             end\n",
        );
        // offset removed from the slice bounds
        let s0 = &lib.pools.slices[0];
        assert_eq!((s0.left, s0.right), (3, 0));
        // upto bounds are swapped into little-endian orientation
        let s1 = &lib.pools.slices[1];
        assert_eq!((s1.left, s1.right), (3, 0));
        for wire in &lib.modules[0].wires {
            assert_eq!(wire.offset, 0);
            assert!(!wire.flags.contains(WireFlags::UPTO));
        }
        // bounds are little-endian and in range after normalization
        for slice in &lib.pools.slices {
            assert!(0 <= slice.right && slice.right <= slice.left);
        }
    }

    #[test]
    fn wire_order() {
        let lib = prepared(
            "module m\n\
             \x20 wire t0\n\
             \x20 wire output 1 y\n\
             \x20 wire input 2 b\n\
             \x20 wire input 1 a\n\
             \x20 wire t1\n\
             end\n",
        );
        let m = &lib.modules[0];
        let names: Vec<_> = m.wires.iter().map(|w| lib.str(w.name)).collect();
        assert_eq!(names, ["a", "b", "y", "t0", "t1"]);
        assert!(m.wires[..m.n_inputs].iter().all(|w| w.is_input()));
        assert!(m.wires[m.n_inputs..m.n_inputs + m.n_outputs]
            .iter()
            .all(|w| w.is_output()));
    }

    #[test]
    fn instance_permutation() {
        // instance lists ports as in1, out, in0; canonical order is
        // in0, in1, out
        let lib = prepared(
            "module sub\n\
             \x20 wire input 1 in0\n\
             \x20 wire input 2 in1\n\
             \x20 wire output 1 out\n\
             \x20 connect out in0\n\
             end\n\
             module top\n\
             \x20 wire input 1 w0\n\
             \x20 wire input 2 w1\n\
             \x20 wire output 1 w2\n\
             \x20 cell sub u0\n\
             \x20   connect in1 w1\n\
             \x20   connect out w2\n\
             \x20   connect in0 w0\n\
             \x20 end\n\
             end\n",
        );
        let top = &lib.modules[1];
        let sub = &lib.modules[0];
        let cell = &top.cells[0];
        // the k-th connection names the k-th callee wire
        for (k, &(par, _)) in cell.conns.iter().enumerate() {
            assert_eq!(par, sub.wires[k].name);
        }
        let targets: Vec<_> = cell
            .conns
            .iter()
            .map(|&(_, sig)| match sig {
                Signal::Wire(n) => lib.str(n),
                _ => panic!(),
            })
            .collect();
        assert_eq!(targets, ["w0", "w1", "w2"]);
    }

    #[test]
    fn idempotent() {
        let mut lib = prepared(
            "module m\n\
             \x20 wire width 8 upto offset 2 u\n\
             \x20 wire width 8 output 1 y\n\
             \x20 connect y u [2:9]\n\
             end\n",
        );
        let snapshot = format!("{:?}", lib.pools.slices);
        normalize(&mut lib);
        assert_eq!(snapshot, format!("{:?}", lib.pools.slices));
    }
}
