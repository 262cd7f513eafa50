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

use crate::{Error, Library, Module, Pools, Result};
use tracing::warn;

/// Computes the dataflow schedule of every module
///
/// A module whose output bits cannot all be produced fails with
/// [`Error::Schedule`]; cells that never fire but are not needed by any
/// output are only reported.
pub fn schedule(lib: &mut Library) -> Result<()> {
    lib.ensure_wire_map();
    let Library {
        ref mut modules,
        ref pools,
        ref mut wire_map,
        ..
    } = *lib;
    for module in modules.iter_mut() {
        order_cells(module, pools, wire_map)?;
    }
    Ok(())
}

/// Seeds the literal vector with the primary inputs
fn init_inputs(module: &mut Module) {
    for i in 0..module.n_inputs {
        let first = module.wires[i].bit_start as usize;
        let width = module.wires[i].width as usize;
        let step = module.order.len() as i32;
        for lit in &mut module.lits[first..first + width] {
            assert_eq!(*lit, -1);
            *lit = step;
        }
        module.order.push(i);
    }
}

/// One pass over the connections; returns whether any fired
///
/// A connection with exactly one defined side propagates; the pair is
/// swapped in place so the source is always on the left for consumers.
fn review_conns(module: &mut Module, pools: &Pools, wire_map: &[i32]) -> bool {
    let mut changed = false;
    for i in 0..module.conns.len() {
        let (lhs, rhs) = module.conns[i];
        let s0 = module.sig_defined(pools, wire_map, lhs);
        let s1 = module.sig_defined(pools, wire_map, rhs);
        if s0 == s1 {
            continue;
        }
        if !s0 && s1 {
            module.conns[i] = (rhs, lhs);
        }
        let step = module.order.len() as i32;
        let dst = module.conns[i].1;
        module.sig_set(pools, wire_map, dst, step);
        module
            .order
            .push(module.n_inputs + module.cells.len() + i);
        changed = true;
    }
    changed
}

/// One pass over the unscheduled cells; returns whether any fired
fn review_cells(module: &mut Module, pools: &Pools, wire_map: &[i32]) -> bool {
    let mut changed = false;
    for ci in 0..module.cells.len() {
        if module.cells[ci].mark {
            continue;
        }
        let ready = (0..module.cells[ci].n_inputs)
            .all(|k| module.sig_defined(pools, wire_map, module.cells[ci].conns[k].1));
        if !ready {
            continue;
        }
        let step = module.order.len() as i32;
        let outputs: Vec<_> = module.cells[ci].outputs().iter().map(|&(_, s)| s).collect();
        for sig in outputs {
            module.sig_set(pools, wire_map, sig, step);
        }
        module.order.push(module.n_inputs + ci);
        module.cells[ci].mark = true;
        changed = true;
    }
    changed
}

/// Schedules one module: inputs first, then the connection/cell fixed
/// point, then the output check
pub fn order_cells(module: &mut Module, pools: &Pools, wire_map: &mut Vec<i32>) -> Result<()> {
    let nbits = module.range_wires();
    module.lits.clear();
    module.lits.resize(nbits, -1);
    module.order.clear();
    module.order.reserve(module.obj_count());
    init_inputs(module);

    module.map_wires(wire_map);
    review_conns(module, pools, wire_map);
    loop {
        let cells = review_cells(module, pools, wire_map);
        let conns = review_conns(module, pools, wire_map);
        if !cells && !conns {
            break;
        }
    }
    module.unmap_wires(wire_map);

    let mut undefined = Vec::new();
    for i in 0..module.n_outputs {
        let wire = &module.wires[module.n_inputs + i];
        let first = wire.bit_start as usize;
        let bits = &module.lits[first..first + wire.width as usize];
        if bits.iter().any(|&l| l == -1) {
            undefined.push(pools.str(wire.name).to_string());
        }
    }
    let unscheduled: Vec<_> = module
        .cells
        .iter()
        .filter(|c| !c.mark)
        .map(|c| pools.str(c.instance).to_string())
        .collect();
    if !undefined.is_empty() {
        return Err(Error::Schedule {
            module: pools.str(module.name).to_string(),
            detail: format!(
                "undefined outputs: {}; unscheduled cells: {}",
                undefined.join(", "),
                if unscheduled.is_empty() {
                    "none".to_string()
                } else {
                    unscheduled.join(", ")
                }
            ),
        });
    }
    if !unscheduled.is_empty() {
        warn!(
            module = pools.str(module.name),
            "unused cells: {}",
            unscheduled.join(", ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::token::tokenize;
    use crate::*;

    fn scheduled(src: &str) -> Result<Library> {
        let mut lib = Library::new();
        let tokens = tokenize(src.as_bytes(), &mut lib.pools.names).unwrap();
        Parser::new(&mut lib, &tokens).parse().unwrap();
        link(&mut lib);
        normalize(&mut lib);
        schedule(&mut lib)?;
        Ok(lib)
    }

    #[test]
    fn single_gate() {
        let lib = scheduled(
            "module m1\n\
             \x20 wire input 1 a\n\
             \x20 wire input 2 b\n\
             \x20 wire output 1 y\n\
             \x20 cell $and g0\n\
             \x20   connect \\A a\n\
             \x20   connect \\B b\n\
             \x20   connect \\Y y\n\
             \x20 end\n\
             end\n",
        )
        .unwrap();
        let m = &lib.modules[0];
        // inputs a, b then the cell; the output is driven directly
        assert_eq!(m.order, [0, 1, 2]);
        assert!(m.cells[0].mark);
        // every bit has a producer and the ranges are packed
        assert!(m.lits.iter().all(|&l| l != -1));
        assert_eq!(m.lits.len(), 3);
    }

    #[test]
    fn chained_connections() {
        // t is only defined through a connection from the cell output u
        let lib = scheduled(
            "module m\n\
             \x20 wire input 1 a\n\
             \x20 wire output 1 y\n\
             \x20 wire u\n\
             \x20 wire t\n\
             \x20 cell $not n0\n\
             \x20   connect \\A t\n\
             \x20   connect \\Y y\n\
             \x20 end\n\
             \x20 connect t u\n\
             \x20 connect u a\n\
             end\n",
        )
        .unwrap();
        let m = &lib.modules[0];
        // the cell fires only after both connections have propagated
        let cell_step = m
            .order
            .iter()
            .position(|&e| e >= m.n_inputs && e < m.n_inputs + m.cells.len())
            .unwrap();
        assert_eq!(cell_step, 3);
        // every bit's producer is a valid schedule step
        for &lit in &m.lits {
            assert!(lit >= 0 && (lit as usize) < m.order.len());
        }
    }

    #[test]
    fn cycle_is_an_error() {
        let err = scheduled(
            "module m\n\
             \x20 wire input 1 a\n\
             \x20 wire output 1 y\n\
             \x20 wire u\n\
             \x20 cell $and g0\n\
             \x20   connect \\A u\n\
             \x20   connect \\B a\n\
             \x20   connect \\Y u\n\
             \x20 end\n\
             \x20 connect y u\n\
             end\n",
        )
        .unwrap_err();
        match err {
            Error::Schedule { module, detail } => {
                assert_eq!(module, "m");
                assert!(detail.contains("y"));
                assert!(detail.contains("g0"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn unused_cell_is_soft() {
        // u0 drives nothing an output needs; scheduling still succeeds
        let lib = scheduled(
            "module m\n\
             \x20 wire input 1 a\n\
             \x20 wire output 1 y\n\
             \x20 wire dead\n\
             \x20 wire dead2\n\
             \x20 cell $and g0\n\
             \x20   connect \\A dead\n\
             \x20   connect \\B dead2\n\
             \x20   connect \\Y dead2\n\
             \x20 end\n\
             \x20 connect y a\n\
             end\n",
        )
        .unwrap();
        assert!(!lib.modules[0].cells[0].mark);
    }
}
