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

use crate::aig::Aig;
use crate::lower::blast_node;
use crate::{CellBinding, Error, Library, Module, Oper, Pools, Result};
use tracing::{debug, warn};

/// Bit-blasts every module that does not have an AIG yet, callees first
///
/// Modules must already be linked, normalized and scheduled. With
/// [`Library::dump_blasted`] set, each result is also written to
/// `temp<N>.aig` with a library-wide counter.
pub fn blast_all(lib: &mut Library) -> Result<()> {
    lib.ensure_wire_map();
    for m in 0..lib.modules.len() {
        if lib.modules[m].aig.is_some() {
            continue;
        }
        let aig = blast_module(lib, m)?;
        if lib.dump_blasted {
            let file = format!("temp{}.aig", lib.blast_counter);
            lib.blast_counter += 1;
            crate::aiger::write_aiger(&aig, &file)?;
            debug!(
                module = lib.pools.str(lib.modules[m].name),
                "dumped blasted AIG into \"{}\"", file
            );
        }
        lib.modules[m].aig = Some(aig);
    }
    Ok(())
}

fn blast_error(pools: &Pools, module: &Module, cell: usize, msg: &str) -> Error {
    Error::Blast {
        module: pools.str(module.name).to_string(),
        cell: pools.str(module.cells[cell].instance).to_string(),
        msg: msg.to_string(),
    }
}

/// Copies the source bits of a connection into its destination
fn blast_connect(module: &mut Module, pools: &Pools, wire_map: &[i32], index: usize) {
    let (src, dst) = module.conns[index];
    module.bit_temp.clear();
    module.sig_collect(pools, wire_map, src);
    let bits = std::mem::take(&mut module.bit_temp);
    let n = module.sig_insert(pools, wire_map, dst, &bits);
    assert_eq!(n, bits.len());
    module.bit_temp = bits;
}

/// Splices the callee's AIG into the caller under the instance's input
/// bits and distributes the returned output literals
fn blast_hierarchy(
    module: &mut Module,
    pools: &Pools,
    wire_map: &[i32],
    g: &mut Aig,
    index: usize,
    callee: &Aig,
) {
    module.bit_temp.clear();
    for k in 0..module.cells[index].n_inputs {
        let sig = module.cells[index].conns[k].1;
        module.sig_collect(pools, wire_map, sig);
    }
    let mut lits = std::mem::take(&mut module.bit_temp);
    g.dup_rebuild(callee, &mut lits);
    let outputs: Vec<_> = module.cells[index]
        .outputs()
        .iter()
        .map(|&(_, sig)| sig)
        .collect();
    let mut consumed = 0;
    for sig in outputs {
        consumed += module.sig_insert(pools, wire_map, sig, &lits[consumed..]);
    }
    assert_eq!(consumed, lits.len());
    module.bit_temp = lits;
}

/// Flattens a flip-flop to a transparent latch: `\Q` mirrors `\D`
fn blast_dff(
    module: &mut Module,
    pools: &Pools,
    wire_map: &[i32],
    index: usize,
) -> Result<()> {
    let d_name = pools.names.find("\\D");
    let d_sig = module.cells[index]
        .inputs()
        .iter()
        .find(|&&(par, _)| !d_name.is_none() && par == d_name)
        .map(|&(_, sig)| sig)
        .ok_or_else(|| blast_error(pools, module, index, "flip-flop has no \\D port"))?;
    module.bit_temp.clear();
    module.sig_collect(pools, wire_map, d_sig);
    let bits = std::mem::take(&mut module.bit_temp);
    let outputs: Vec<_> = module.cells[index]
        .outputs()
        .iter()
        .map(|&(_, sig)| sig)
        .collect();
    let mut consumed = 0;
    for sig in outputs {
        consumed += module.sig_insert(pools, wire_map, sig, &bits[consumed..]);
    }
    assert_eq!(consumed, bits.len());
    module.bit_temp = bits;
    Ok(())
}

/// Lowers one operator cell: signedness from the `\A_SIGNED`/`\B_SIGNED`
/// parameters, output width from the output signal
fn blast_operator(
    module: &mut Module,
    pools: &Pools,
    wire_map: &[i32],
    g: &mut Aig,
    index: usize,
    oper: Oper,
) -> Result<()> {
    let sign0 = module.cells[index]
        .param_value(pools, "\\A_SIGNED")
        .unwrap_or(0)
        != 0;
    let sign1 = module.cells[index]
        .param_value(pools, "\\B_SIGNED")
        .unwrap_or(0)
        != 0;
    let out_sig = module.cells[index]
        .outputs()
        .last()
        .map(|&(_, sig)| sig)
        .ok_or_else(|| blast_error(pools, module, index, "operator has no output"))?;
    let nrange = module.sig_width(pools, wire_map, out_sig);
    assert!(nrange > 0);

    let mut ins = Vec::with_capacity(module.cells[index].n_inputs);
    for k in 0..module.cells[index].n_inputs {
        let sig = module.cells[index].conns[k].1;
        module.bit_temp.clear();
        module.sig_collect(pools, wire_map, sig);
        ins.push(module.bit_temp.clone());
    }
    let result = blast_node(g, oper, &ins, nrange, sign0, sign1);
    assert_eq!(result.len(), nrange);
    let n = module.sig_insert(pools, wire_map, out_sig, &result);
    assert_eq!(n, result.len());
    Ok(())
}

fn blast_module(lib: &mut Library, m: usize) -> Result<Aig> {
    let Library {
        ref mut modules,
        ref pools,
        ref mut wire_map,
        ..
    } = *lib;
    let (done, rest) = modules.split_at_mut(m);
    let module = &mut rest[0];

    let mut g = Aig::new();
    let nbits = module.range_wires();
    module.lits.clear();
    module.lits.resize(nbits, -1);
    module.map_wires(wire_map);

    for i in 0..module.n_inputs {
        let first = module.wires[i].bit_start as usize;
        let width = module.wires[i].width as usize;
        for b in 0..width {
            assert_eq!(module.lits[first + b], -1);
            module.lits[first + b] = g.append_input();
        }
    }

    g.hash_begin();
    let mut skipped = false;
    let order = module.order.clone();
    for &entry in &order {
        if entry < module.n_inputs {
            continue;
        }
        if entry >= module.n_inputs + module.cells.len() {
            let index = entry - module.n_inputs - module.cells.len();
            if skipped && !module.sig_defined(pools, wire_map, module.conns[index].0) {
                module.unmap_wires(wire_map);
                return Err(Error::Blast {
                    module: pools.str(module.name).to_string(),
                    cell: String::new(),
                    msg: "connection depends on an unblasted black box".to_string(),
                });
            }
            blast_connect(module, pools, wire_map, index);
            continue;
        }
        let index = entry - module.n_inputs;
        if skipped {
            let ready = (0..module.cells[index].n_inputs)
                .all(|k| module.sig_defined(pools, wire_map, module.cells[index].conns[k].1));
            if !ready {
                let err = blast_error(
                    pools,
                    module,
                    index,
                    "cell depends on an unblasted black box",
                );
                module.unmap_wires(wire_map);
                return Err(err);
            }
        }
        match module.cells[index].binding {
            CellBinding::Module(callee) => {
                assert!(callee < m);
                let callee_aig = done[callee]
                    .aig
                    .as_ref()
                    .expect("callee blasted before caller");
                blast_hierarchy(module, pools, wire_map, &mut g, index, callee_aig);
            }
            CellBinding::Oper(Oper::Dff) => {
                blast_dff(module, pools, wire_map, index).map_err(|e| {
                    module.unmap_wires(wire_map);
                    e
                })?
            }
            CellBinding::Oper(Oper::None) => {
                let err = blast_error(pools, module, index, "operator has no lowering");
                module.unmap_wires(wire_map);
                return Err(err);
            }
            CellBinding::Oper(oper) => {
                blast_operator(module, pools, wire_map, &mut g, index, oper).map_err(|e| {
                    module.unmap_wires(wire_map);
                    e
                })?
            }
            CellBinding::BlackBox | CellBinding::Unresolved => {
                warn!(
                    module = pools.str(module.name),
                    cell = pools.str(module.cells[index].ty),
                    "cannot blast black box"
                );
                skipped = true;
            }
        }
    }
    g.hash_end();

    for i in 0..module.n_outputs {
        let wire = module.wires[module.n_inputs + i];
        let first = wire.bit_start as usize;
        for b in 0..wire.width as usize {
            let lit = module.lits[first + b];
            if lit == -1 {
                let msg = format!(
                    "output {} left undefined by an unblasted black box",
                    pools.str(wire.name)
                );
                module.unmap_wires(wire_map);
                return Err(Error::Blast {
                    module: pools.str(module.name).to_string(),
                    cell: String::new(),
                    msg,
                });
            }
            g.append_output(lit);
        }
    }
    module.unmap_wires(wire_map);
    Ok(g.cleanup())
}

#[cfg(test)]
mod test {
    use crate::token::tokenize;
    use crate::*;

    fn blasted(src: &str) -> Result<Library> {
        let mut lib = Library::new();
        let tokens = tokenize(src.as_bytes(), &mut lib.pools.names)?;
        Parser::new(&mut lib, &tokens).parse()?;
        link(&mut lib);
        lib.prepare()?;
        blast_all(&mut lib)?;
        Ok(lib)
    }

    fn outputs_for(aig: &Aig, values: &[u64]) -> Vec<u64> {
        let patterns: Vec<u64> = values.iter().map(|&v| if v != 0 { !0 } else { 0 }).collect();
        aig.simulate(&patterns).iter().map(|w| w & 1).collect()
    }

    #[test]
    fn single_and_gate() {
        let lib = blasted(
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
        let aig = lib.modules[0].aig.as_ref().unwrap();
        assert_eq!(aig.input_count(), 2);
        assert_eq!(aig.output_count(), 1);
        assert_eq!(aig.and_count(), 1);
        assert_eq!(outputs_for(aig, &[1, 1]), [1]);
        assert_eq!(outputs_for(aig, &[1, 0]), [0]);
    }

    #[test]
    fn bit_reversal() {
        // concatenation is most-significant-first, so listing x's bits
        // from 0 upward reverses them into y
        let lib = blasted(
            "module rev\n\
             \x20 wire width 4 input 1 x\n\
             \x20 wire width 4 output 1 y\n\
             \x20 connect y { x [0] x [1] x [2] x [3] }\n\
             end\n",
        )
        .unwrap();
        let aig = lib.modules[0].aig.as_ref().unwrap();
        assert_eq!(aig.input_count(), 4);
        assert_eq!(aig.output_count(), 4);
        assert_eq!(aig.and_count(), 0);
        // output k equals input 3-k
        for k in 0..4 {
            let mut values = [0u64; 4];
            values[3 - k] = 1;
            let out = outputs_for(aig, &values);
            for (j, &bit) in out.iter().enumerate() {
                assert_eq!(bit, (j == k) as u64);
            }
        }
    }

    #[test]
    fn signed_parameter_reaches_lowering() {
        // $pos sign-extends its 2-bit input into 4 bits only when
        // \A_SIGNED is 1'1
        let src = |signed: &str| {
            format!(
                "module m\n\
                 \x20 wire width 2 input 1 a\n\
                 \x20 wire width 4 output 1 y\n\
                 \x20 cell $pos p0\n\
                 \x20   parameter \\A_SIGNED {}\n\
                 \x20   connect \\A a\n\
                 \x20   connect \\Y y\n\
                 \x20 end\n\
                 end\n",
                signed
            )
        };
        let lib = blasted(&src("1'1")).unwrap();
        let aig = lib.modules[0].aig.as_ref().unwrap();
        assert_eq!(outputs_for(aig, &[0, 1]), [0, 1, 1, 1]);
        let lib = blasted(&src("1'0")).unwrap();
        let aig = lib.modules[0].aig.as_ref().unwrap();
        assert_eq!(outputs_for(aig, &[0, 1]), [0, 1, 0, 0]);
    }

    #[test]
    fn hierarchy_with_permuted_ports() {
        let lib = blasted(
            "module top\n\
             \x20 wire input 1 w0\n\
             \x20 wire input 2 w1\n\
             \x20 wire output 1 w2\n\
             \x20 cell sub u0\n\
             \x20   connect in1 w1\n\
             \x20   connect out w2\n\
             \x20   connect in0 w0\n\
             \x20 end\n\
             end\n\
             module sub\n\
             \x20 wire input 1 in0\n\
             \x20 wire input 2 in1\n\
             \x20 wire output 1 out\n\
             \x20 cell $xor g\n\
             \x20   connect \\A in0\n\
             \x20   connect \\B in1\n\
             \x20   connect \\Y out\n\
             \x20 end\n\
             end\n",
        )
        .unwrap();
        // sub was moved before top by the linker
        assert_eq!(lib.str(lib.modules[0].name), "sub");
        let top = lib.modules[1].aig.as_ref().unwrap();
        assert_eq!(top.input_count(), 2);
        assert_eq!(outputs_for(top, &[1, 0]), [1]);
        assert_eq!(outputs_for(top, &[1, 1]), [0]);
    }

    #[test]
    fn upto_slice_collects_the_same_bits() {
        // an upto wire sliced [0:3] addresses the same four bits after
        // normalization flips the bounds
        let lib = blasted(
            "module m\n\
             \x20 wire width 4 input 1 x\n\
             \x20 wire width 8 upto u\n\
             \x20 wire width 4 output 1 y\n\
             \x20 connect u { x x }\n\
             \x20 connect y u [0:3]\n\
             end\n",
        )
        .unwrap();
        let aig = lib.modules[0].aig.as_ref().unwrap();
        // y takes the low half of u, which mirrors x
        assert_eq!(outputs_for(aig, &[1, 0, 1, 0]), [1, 0, 1, 0]);
    }

    #[test]
    fn constant_connection() {
        let lib = blasted(
            "module m\n\
             \x20 wire width 4 output 1 y\n\
             \x20 connect y 4'0110\n\
             end\n",
        )
        .unwrap();
        let aig = lib.modules[0].aig.as_ref().unwrap();
        assert_eq!(aig.input_count(), 0);
        let out = aig.simulate(&[]);
        let bits: Vec<u64> = out.iter().map(|w| w & 1).collect();
        assert_eq!(bits, [0, 1, 1, 0]);
    }

    #[test]
    fn flip_flop_is_transparent() {
        let lib = blasted(
            "module m\n\
             \x20 wire input 1 clk\n\
             \x20 wire width 2 input 2 d\n\
             \x20 wire width 2 output 1 q\n\
             \x20 cell $dff f0\n\
             \x20   connect \\CLK clk\n\
             \x20   connect \\D d\n\
             \x20   connect \\Q q\n\
             \x20 end\n\
             end\n",
        )
        .unwrap();
        let aig = lib.modules[0].aig.as_ref().unwrap();
        assert_eq!(outputs_for(aig, &[0, 1, 0]), [1, 0]);
        assert_eq!(outputs_for(aig, &[1, 0, 1]), [0, 1]);
    }

    #[test]
    fn blackbox_feeding_output_is_an_error() {
        let err = blasted(
            "module m\n\
             \x20 wire input 1 a\n\
             \x20 wire output 1 y\n\
             \x20 cell mystery u0\n\
             \x20   connect \\a a\n\
             \x20   connect \\y y\n\
             \x20 end\n\
             end\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Blast { .. }));
    }

    #[test]
    fn divfloor_is_a_blast_error() {
        let err = blasted(
            "module m\n\
             \x20 wire width 4 input 1 a\n\
             \x20 wire width 4 input 2 b\n\
             \x20 wire width 4 output 1 y\n\
             \x20 cell $divfloor d0\n\
             \x20   connect \\A a\n\
             \x20   connect \\B b\n\
             \x20   connect \\Y y\n\
             \x20 end\n\
             end\n",
        )
        .unwrap_err();
        match err {
            Error::Blast { module, cell, .. } => {
                assert_eq!(module, "m");
                assert_eq!(cell, "d0");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
