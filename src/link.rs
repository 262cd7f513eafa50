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

use crate::{CellBinding, Library, Oper};
use std::collections::BTreeMap;
use tracing::warn;

/// Resolves every cell type and reorders modules callees-first
///
/// Undefined callee modules become blackboxes and are summarized per
/// module; linking itself never fails. Returns the total number of
/// blackbox instances found.
pub fn link(lib: &mut Library) -> usize {
    let undefined = resolve_cells(lib);
    reorder_modules(lib);
    undefined
}

/// Resolves cell type strings to operators or module indices and fills
/// in each cell's input count
fn resolve_cells(lib: &mut Library) -> usize {
    let module_names: Vec<_> = lib.modules.iter().map(|m| m.name).collect();
    let module_inputs: Vec<_> = lib.modules.iter().map(|m| m.n_inputs).collect();
    let mut total_undef = 0;

    for module in &mut lib.modules {
        // type name -> count of blackbox instances with that type
        let mut undefs: BTreeMap<&str, usize> = BTreeMap::new();
        for cell in &mut module.cells {
            let ty = lib.pools.names.str(cell.ty);
            if ty.starts_with('$') && !ty.starts_with("$paramod") {
                match Oper::from_type(ty) {
                    Some(oper) => {
                        if ty == "$shiftx" {
                            warn!(
                                cell = lib.pools.names.str(cell.instance),
                                "treating $shiftx as a logical shift right"
                            );
                        }
                        cell.binding = CellBinding::Oper(oper);
                        cell.n_inputs = cell.conns.len() - 1;
                    }
                    None => {
                        cell.binding = CellBinding::BlackBox;
                        *undefs.entry(ty).or_insert(0) += 1;
                    }
                }
                continue;
            }
            match module_names.iter().position(|&n| n == cell.ty) {
                Some(index) => {
                    cell.binding = CellBinding::Module(index);
                    cell.n_inputs = module_inputs[index];
                }
                None => {
                    cell.binding = CellBinding::BlackBox;
                    *undefs.entry(ty).or_insert(0) += 1;
                }
            }
        }
        if !undefs.is_empty() {
            let count: usize = undefs.values().sum();
            total_undef += count;
            let summary: Vec<_> = undefs
                .iter()
                .map(|(ty, n)| format!("{} ({})", ty, n))
                .collect();
            warn!(
                module = lib.pools.names.str(module.name),
                instances = count,
                "blackbox instances: {}",
                summary.join("  ")
            );
        }
    }
    total_undef
}

fn reorder_rec(deps: &[Vec<usize>], place: &mut [i32], order: &mut Vec<usize>, i: usize) {
    for &callee in &deps[i] {
        if place[callee] == -1 {
            reorder_rec(deps, place, order, callee);
        }
    }
    assert_eq!(place[i], -1);
    place[i] = order.len() as i32;
    order.push(i);
}

/// Rewrites the module sequence so every callee precedes its callers and
/// remaps all hierarchical cell bindings to the new indices
pub fn reorder_modules(lib: &mut Library) {
    let deps: Vec<Vec<usize>> = lib
        .modules
        .iter()
        .map(|m| {
            m.cells
                .iter()
                .filter_map(|c| match c.binding {
                    CellBinding::Module(k) => Some(k),
                    _ => None,
                })
                .collect()
        })
        .collect();

    let n = lib.modules.len();
    let mut place = vec![-1i32; n];
    let mut order = Vec::with_capacity(n);
    for i in 0..n {
        if place[i] == -1 {
            reorder_rec(&deps, &mut place, &mut order, i);
        }
    }
    assert_eq!(order.len(), n);

    let mut slots: Vec<Option<crate::Module>> = (0..n).map(|_| None).collect();
    for (i, mut module) in lib.modules.drain(..).enumerate() {
        for cell in &mut module.cells {
            if let CellBinding::Module(k) = cell.binding {
                cell.binding = CellBinding::Module(place[k] as usize);
            }
        }
        module.place = place[i];
        slots[place[i] as usize] = Some(module);
    }
    lib.modules = slots.into_iter().map(Option::unwrap).collect();
}

#[cfg(test)]
mod test {
    use crate::token::tokenize;
    use crate::*;

    fn linked(src: &str) -> (Library, usize) {
        let mut lib = Library::new();
        let tokens = tokenize(src.as_bytes(), &mut lib.pools.names).unwrap();
        Parser::new(&mut lib, &tokens).parse().unwrap();
        let undef = link(&mut lib);
        (lib, undef)
    }

    #[test]
    fn operator_binding() {
        let (lib, undef) = linked(
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
        );
        assert_eq!(undef, 0);
        let cell = &lib.modules[0].cells[0];
        assert_eq!(cell.binding, CellBinding::Oper(Oper::And));
        assert_eq!(cell.n_inputs, 2);
        assert_eq!(cell.n_outputs(), 1);
    }

    #[test]
    fn callees_precede_callers() {
        // top is declared first and instantiates sub
        let (lib, undef) = linked(
            "module top\n\
             \x20 wire input 1 i\n\
             \x20 wire output 1 o\n\
             \x20 cell sub u0\n\
             \x20   connect \\x i\n\
             \x20   connect \\y o\n\
             \x20 end\n\
             end\n\
             module sub\n\
             \x20 wire input 1 x\n\
             \x20 wire output 1 y\n\
             \x20 connect y x\n\
             end\n",
        );
        assert_eq!(undef, 0);
        assert_eq!(lib.str(lib.modules[0].name), "sub");
        assert_eq!(lib.str(lib.modules[1].name), "top");
        assert_eq!(lib.find_module(lib.modules[1].name), Some(1));
        let cell = &lib.modules[1].cells[0];
        assert_eq!(cell.binding, CellBinding::Module(0));
        assert_eq!(cell.n_inputs, 1);
        // callee position precedes the caller's
        assert!(lib.modules[0].place < lib.modules[1].place);
        // reordering again is a no-op
        let before: Vec<_> = lib.modules.iter().map(|m| m.name).collect();
        let mut lib = lib;
        reorder_modules(&mut lib);
        let after: Vec<_> = lib.modules.iter().map(|m| m.name).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn blackbox() {
        let (lib, undef) = linked(
            "module m\n\
             \x20 wire input 1 a\n\
             \x20 wire output 1 y\n\
             \x20 cell mystery u0\n\
             \x20   connect \\a a\n\
             \x20   connect \\y y\n\
             \x20 end\n\
             end\n",
        );
        assert_eq!(undef, 1);
        assert_eq!(lib.modules[0].cells[0].binding, CellBinding::BlackBox);
    }
}
