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

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Word-level operator of a resolved cell
///
/// Each variant covers one family of `$`-typed cells from the input; the
/// lowering in [`blast_node`](crate::blast_node) knows how to turn every
/// variant except [`Oper::None`] into AIG nodes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oper {
    /// Operator without a lowering (`$divfloor`, `$modfoor`)
    None,
    /// Y = +A
    Buf,
    /// Y = ~A
    Inv,
    /// Y = -A
    Neg,
    /// Y = &A
    RedAnd,
    /// Y = |A
    RedOr,
    /// Y = ^A
    RedXor,
    /// Y = ~^A
    RedXnor,
    /// Y = !A
    LogicNot,
    /// Y = A && B
    LogicAnd,
    /// Y = A || B
    LogicOr,
    /// Y = A & B
    And,
    /// Y = A | B
    Or,
    /// Y = A ^ B
    Xor,
    /// Y = A ~^ B
    Xnor,
    /// Y = A << B
    Shl,
    /// Y = A >> B
    Shr,
    /// Y = A <<< B
    Sshl,
    /// Y = A >>> B
    Sshr,
    /// Y = A < B
    Lt,
    /// Y = A <= B
    Le,
    /// Y = A > B
    Gt,
    /// Y = A >= B
    Ge,
    /// Y = A == B
    Eq,
    /// Y = A != B
    Ne,
    /// Y = A + B
    Add,
    /// Y = A - B
    Sub,
    /// Y = A * B
    Mul,
    /// Y = A / B
    Div,
    /// Y = A % B
    Mod,
    /// Y = A ** B
    Pow,
    /// Y = S ? B : A
    Mux,
    /// One-hot wide multiplexer
    Pmux,
    /// Flip-flop, flattened to a transparent latch
    Dff,
}

impl Oper {
    /// Resolves a `$`-prefixed cell type to an operator
    ///
    /// `$shiftx` maps to [`Oper::Shr`]; the caller is expected to diagnose
    /// the substitution. Unknown types return `None`.
    pub fn from_type(ty: &str) -> Option<Oper> {
        Some(match ty {
            "$not" => Oper::Inv,
            "$pos" => Oper::Buf,
            "$neg" => Oper::Neg,
            "$reduce_and" => Oper::RedAnd,
            "$reduce_or" | "$reduce_bool" => Oper::RedOr,
            "$reduce_xor" => Oper::RedXor,
            "$reduce_xnor" => Oper::RedXnor,
            "$logic_not" => Oper::LogicNot,
            "$logic_and" => Oper::LogicAnd,
            "$logic_or" => Oper::LogicOr,
            "$and" => Oper::And,
            "$or" => Oper::Or,
            "$xor" => Oper::Xor,
            "$xnor" => Oper::Xnor,
            "$shl" => Oper::Shl,
            "$shr" | "$shiftx" => Oper::Shr,
            "$sshl" => Oper::Sshl,
            "$sshr" => Oper::Sshr,
            "$lt" => Oper::Lt,
            "$le" => Oper::Le,
            "$ge" => Oper::Ge,
            "$gt" => Oper::Gt,
            "$eq" | "$eqx" => Oper::Eq,
            "$ne" | "$nex" => Oper::Ne,
            "$add" => Oper::Add,
            "$sub" => Oper::Sub,
            "$mul" => Oper::Mul,
            "$div" => Oper::Div,
            "$mod" => Oper::Mod,
            "$pow" => Oper::Pow,
            "$modfoor" | "$divfloor" => Oper::None,
            "$mux" => Oper::Mux,
            "$pmux" => Oper::Pmux,
            "$dff" | "$adff" | "$sdff" => Oper::Dff,
            _ => return None,
        })
    }

    /// Name of the operator
    pub fn name(&self) -> &'static str {
        match self {
            Oper::None => "none",
            Oper::Buf => "buf",
            Oper::Inv => "inv",
            Oper::Neg => "neg",
            Oper::RedAnd => "redand",
            Oper::RedOr => "redor",
            Oper::RedXor => "redxor",
            Oper::RedXnor => "redxnor",
            Oper::LogicNot => "lnot",
            Oper::LogicAnd => "land",
            Oper::LogicOr => "lor",
            Oper::And => "and",
            Oper::Or => "or",
            Oper::Xor => "xor",
            Oper::Xnor => "xnor",
            Oper::Shl => "shl",
            Oper::Shr => "shr",
            Oper::Sshl => "sshl",
            Oper::Sshr => "sshr",
            Oper::Lt => "lt",
            Oper::Le => "le",
            Oper::Gt => "gt",
            Oper::Ge => "ge",
            Oper::Eq => "eq",
            Oper::Ne => "ne",
            Oper::Add => "add",
            Oper::Sub => "sub",
            Oper::Mul => "mul",
            Oper::Div => "div",
            Oper::Mod => "mod",
            Oper::Pow => "pow",
            Oper::Mux => "mux",
            Oper::Pmux => "pmux",
            Oper::Dff => "dff",
        }
    }
}
