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

use std::io;
use thiserror::Error;

/// Custom `Error` for netlist reading and elaboration
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occured while reading or writing a file
    #[error("{0}")]
    Io(#[from] io::Error),
    /// An error occured during parsing due to a malformed netlist
    #[error("Parse error at line {line}: {msg}")]
    Parse {
        /// 1-based source line of the offending token
        line: usize,
        /// What went wrong
        msg: String,
    },
    /// A non-blackbox cell references a module that is not defined
    #[error("Link error: {0}")]
    Link(String),
    /// Scheduling could not define every output bit of a module
    #[error("Schedule error in module {module}: {detail}")]
    Schedule {
        /// Name of the module that failed to schedule
        module: String,
        /// Undefined outputs and the cells left unscheduled
        detail: String,
    },
    /// Bit-blasting hit a cell that cannot be lowered
    #[error("Blast error in module {module}, cell {cell}: {msg}")]
    Blast {
        /// Name of the module being blasted
        module: String,
        /// Instance name of the offending cell
        cell: String,
        /// What went wrong
        msg: String,
    },
    /// The equivalence check failed or was inconclusive
    #[error("Verification failed: {0}")]
    Verify(String),
    /// Error inside of [Scroll](https://docs.rs/scroll) occured
    #[error("{0}")]
    Scroll(#[from] scroll::Error),
}
