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

use indexmap::IndexSet;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Interned name identifier
///
/// `NameId(0)` is reserved as the null identifier, so a lookup result of
/// zero always means "absent".
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NameId(pub u32);

impl NameId {
    /// The reserved null identifier
    pub fn none() -> NameId {
        NameId(0)
    }

    /// Whether this is the reserved null identifier
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Index usable for table lookups keyed by name
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NameId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Table interning byte strings to stable integer identifiers
///
/// Identifiers are handed out in insertion order starting at 1 and never
/// change afterwards. The table is populated during tokenization and
/// read-only for every later pass.
#[derive(Debug, Default)]
pub struct NameTable {
    strings: IndexSet<String>,
}

impl NameTable {
    /// Empty table
    pub fn new() -> NameTable {
        NameTable {
            strings: IndexSet::new(),
        }
    }

    /// Looks up an existing name, `NameId(0)` if absent
    pub fn find(&self, s: &str) -> NameId {
        match self.strings.get_index_of(s) {
            Some(i) => NameId(i as u32 + 1),
            None => NameId::none(),
        }
    }

    /// Looks up a name, interning it first if absent
    pub fn find_or_add(&mut self, s: &str) -> NameId {
        let (i, _) = self.strings.insert_full(s.to_string());
        NameId(i as u32 + 1)
    }

    /// The string interned under `id`
    ///
    /// Panics when `id` is the null identifier or out of range.
    pub fn str(&self, id: NameId) -> &str {
        self.strings
            .get_index(id.0 as usize - 1)
            .expect("invalid name id")
    }

    /// One past the largest identifier handed out so far
    pub fn count(&self) -> usize {
        self.strings.len() + 1
    }
}
