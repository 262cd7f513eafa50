//! Word-level RTL netlist front end with AIG bit-blasting.
//!
//! The crate reads a textual word-level netlist (modules of wires, typed
//! cells and explicit connections), links and normalizes the design,
//! schedules each module into dataflow order, and lowers every module to
//! a bit-level And-Inverter-Graph for combinational equivalence
//! checking:
//!
//! ```ignore
//! use rtl_blast::{cec::Status, LibraryReader};
//!
//! let mut lib = LibraryReader::from_path("design.rtl")?;
//! lib.prepare()?;
//! lib.blast()?;
//! while lib.preprocess()? {}
//! assert_eq!(lib.solve()?, Status::Proven);
//! ```

use memmap::MmapOptions;
use std::fs::File;
use std::io;
use std::path::Path;

#[macro_use]
extern crate bitflags;

mod aig;
mod aiger;
mod blast;
pub mod cec;
mod dump;
mod equiv;
mod error;
mod ir;
mod link;
mod lower;
mod names;
mod norm;
mod oper;
mod parse;
mod sched;
pub mod token;

pub use aig::{lit_compl, lit_not, lit_var, Aig, Lit, LIT_FALSE, LIT_TRUE};
pub use aiger::{write_aiger, Aiger};
pub use blast::blast_all;
pub use cec::Status;
pub use dump::{dump_library, dump_module, dump_opers, dump_sig, dump_stats};
pub use equiv::{preprocess, solve};
pub use error::Error;
pub use ir::{
    Cell, CellBinding, Constant, Library, Module, Pools, Signal, Slice, Wire, WireFlags,
};
pub use link::{link, reorder_modules};
pub use lower::blast_node;
pub use names::{NameId, NameTable};
pub use norm::{norm_ranges, normalize, order_wires, update_instances};
pub use oper::Oper;
pub use parse::Parser;
pub use sched::{order_cells, schedule};

pub type Result<T> = std::result::Result<T, error::Error>;

/// Reader for textual word-level netlists
pub struct LibraryReader;

impl LibraryReader {
    /// Tries to load and link a netlist from the given path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Library> {
        let file = File::open(path.as_ref())?;
        if file.metadata()?.len() == 0 {
            return Self::from_bytes(&b""[..]);
        }
        let source = unsafe { MmapOptions::new().map(&file)? };
        Self::from_bytes(&source[..])
    }

    /// Loads and links a netlist from an in-memory buffer
    pub fn from_bytes<B: AsRef<[u8]>>(source: B) -> Result<Library> {
        let mut lib = Library::new();
        let tokens = token::tokenize(source.as_ref(), &mut lib.pools.names)?;
        Parser::new(&mut lib, &tokens).parse()?;
        link(&mut lib);
        Ok(lib)
    }
}

impl Library {
    /// Normalizes and schedules the linked design
    pub fn prepare(&mut self) -> Result<()> {
        normalize(self);
        schedule(self)
    }

    /// Bit-blasts every module, callees first
    pub fn blast(&mut self) -> Result<()> {
        blast_all(self)
    }

    /// One equivalence-dedup round; returns whether a pair was merged
    pub fn preprocess(&mut self) -> Result<bool> {
        equiv::preprocess(self)
    }

    /// Verifies the top module's outputs are constant 1
    pub fn solve(&self) -> Result<Status> {
        equiv::solve(self)
    }

    /// Fails with [`Error::Link`] when any instance is a blackbox
    pub fn require_defined(&self) -> Result<()> {
        let mut missing = Vec::new();
        for module in &self.modules {
            for cell in &module.cells {
                if cell.binding == CellBinding::BlackBox {
                    missing.push(format!(
                        "{}.{} ({})",
                        self.str(module.name),
                        self.str(cell.instance),
                        self.str(cell.ty)
                    ));
                }
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Link(format!(
                "undefined modules referenced: {}",
                missing.join(", ")
            )))
        }
    }

    /// Dumps the design in the textual netlist grammar
    pub fn print<W: io::Write>(&self, buffer: &mut W) -> io::Result<()> {
        dump_library(buffer, self)
    }

    /// Writes the textual dump to a file
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = File::create(path.as_ref())?;
        dump_library(&mut file, self)?;
        Ok(())
    }
}
