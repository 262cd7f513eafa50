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

use crate::aig::{lit_not, Aig, Lit, LIT_FALSE};
use crate::cec::{solve_simple, verify_two, Status};
use crate::{blast_all, Error, Library, Result};
use tracing::{debug, info};

/// Simulation rounds granted to each pairwise check
const PAIR_EFFORT: usize = 64;

/// Finds one provably equivalent module pair, keeps the smaller AIG for
/// both, and re-blasts the library so callers pick it up
///
/// Returns whether a pair was merged. Call repeatedly to converge.
pub fn preprocess(lib: &mut Library) -> Result<bool> {
    info!("performing preprocessing for verification");
    let mut merged = None;
    'outer: for i in 0..lib.modules.len() {
        for k in i + 1..lib.modules.len() {
            let (a, b) = match (&lib.modules[i].aig, &lib.modules[k].aig) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            if a.input_count() != b.input_count() || a.output_count() != b.output_count() {
                continue;
            }
            if verify_two(a, b, PAIR_EFFORT) != Status::Proven {
                continue;
            }
            info!(
                "proved equivalent modules: {} == {}",
                lib.str(lib.modules[i].name),
                lib.str(lib.modules[k].name)
            );
            // keep whichever has fewer AND nodes in both slots
            if a.and_count() <= b.and_count() {
                lib.modules[k].aig = lib.modules[i].aig.clone();
            } else {
                lib.modules[i].aig = lib.modules[k].aig.clone();
            }
            merged = Some((i, k));
            break 'outer;
        }
    }
    let (i, k) = match merged {
        Some(pair) => pair,
        None => {
            debug!("preprocessing not succeeded");
            return Ok(false);
        }
    };
    // release every other AIG and rebuild, so hierarchical references
    // pick up the deduplicated sub-AIGs
    for (j, module) in lib.modules.iter_mut().enumerate() {
        if j != i && j != k {
            module.aig = None;
        }
    }
    blast_all(lib)?;
    Ok(true)
}

/// Verifies the top module: all of its outputs must be constant 1
///
/// The top AIG is duplicated, each output is inverted and the inverted
/// bits are ORed into a single miter output; an unsatisfiable miter
/// proves the property.
pub fn solve(lib: &Library) -> Result<Status> {
    let top = lib.top();
    let aig = top
        .aig
        .as_ref()
        .ok_or_else(|| Error::Verify("top module is not blasted".to_string()))?;

    let mut miter = Aig::new();
    let mut lits: Vec<Lit> = (0..aig.input_count())
        .map(|_| miter.append_input())
        .collect();
    miter.hash_begin();
    miter.dup_rebuild(aig, &mut lits);
    let mut any = LIT_FALSE;
    for &out in &lits {
        any = miter.or(any, lit_not(out));
    }
    miter.hash_end();
    miter.append_output(any);

    let status = solve_simple(&miter);
    match status {
        Status::Proven => info!("verification problem solved"),
        _ => info!("verification problem is NOT solved"),
    }
    Ok(status)
}
