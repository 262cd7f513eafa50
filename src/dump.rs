use crate::{CellBinding, Library, Module, Signal, Wire, WireFlags};
use std::collections::BTreeMap;
use std::io;

/// Dumps one signal expression. This format round-trips through the
/// parser
pub fn dump_sig(buffer: &mut dyn io::Write, lib: &Library, sig: Signal) -> io::Result<()> {
    match sig {
        Signal::Wire(name) => write!(buffer, " {}", lib.str(name)),
        Signal::Const(c) => {
            let constant = &lib.pools.consts[c];
            if constant.width == -1 {
                return write!(buffer, " {}", constant.words[0]);
            }
            write!(buffer, " {}'", constant.width)?;
            for i in (0..constant.width as usize).rev() {
                write!(buffer, "{}", constant.bit(i) as u32)?;
            }
            Ok(())
        }
        Signal::Slice(s) => {
            let slice = &lib.pools.slices[s];
            if slice.left == slice.right {
                write!(buffer, " {} [{}]", lib.str(slice.wire), slice.left)
            } else {
                write!(
                    buffer,
                    " {} [{}:{}]",
                    lib.str(slice.wire),
                    slice.left,
                    slice.right
                )
            }
        }
        Signal::Concat(c) => {
            write!(buffer, " {{")?;
            for i in 0..lib.pools.concats[c].len() {
                dump_sig(buffer, lib, lib.pools.concats[c][i])?;
            }
            write!(buffer, " }}")
        }
    }
}

fn dump_wire(buffer: &mut dyn io::Write, lib: &Library, wire: &Wire) -> io::Result<()> {
    write!(buffer, "  wire")?;
    if wire.width != 1 {
        write!(buffer, " width {}", wire.width)?;
    }
    if wire.offset != 0 {
        write!(buffer, " offset {}", wire.offset)?;
    }
    if wire.flags.contains(WireFlags::UPTO) {
        write!(buffer, " upto")?;
    }
    if wire.is_input() {
        write!(buffer, " input {}", wire.number)?;
    }
    if wire.is_output() {
        write!(buffer, " output {}", wire.number)?;
    }
    if wire.flags.contains(WireFlags::SIGNED) {
        write!(buffer, " signed")?;
    }
    writeln!(buffer, " {}", lib.str(wire.name))
}

/// Dumps one module in the textual netlist grammar
pub fn dump_module(buffer: &mut dyn io::Write, lib: &Library, module: &Module) -> io::Result<()> {
    writeln!(buffer)?;
    for &(par, val) in &module.attrs {
        writeln!(buffer, "attribute {} {}", lib.str(par), lib.str(val))?;
    }
    writeln!(buffer, "module {}", lib.str(module.name))?;
    for wire in &module.wires {
        dump_wire(buffer, lib, wire)?;
    }
    for cell in &module.cells {
        for &(par, val) in &cell.attrs {
            writeln!(buffer, "  attribute {} {}", lib.str(par), lib.str(val))?;
        }
        writeln!(
            buffer,
            "  cell {} {}",
            lib.str(cell.ty),
            lib.str(cell.instance)
        )?;
        for &(par, val) in &cell.params {
            write!(buffer, "    parameter {}", lib.str(par))?;
            dump_sig(buffer, lib, val)?;
            writeln!(buffer)?;
        }
        for &(par, val) in &cell.conns {
            write!(buffer, "    connect {}", lib.str(par))?;
            dump_sig(buffer, lib, val)?;
            writeln!(buffer)?;
        }
        writeln!(buffer, "  end")?;
    }
    for &(lhs, rhs) in &module.conns {
        write!(buffer, "  connect")?;
        dump_sig(buffer, lib, lhs)?;
        dump_sig(buffer, lib, rhs)?;
        writeln!(buffer)?;
    }
    writeln!(buffer, "end")
}

/// Dumps the whole library; the output parses back to the same design
pub fn dump_library(buffer: &mut dyn io::Write, lib: &Library) -> io::Result<()> {
    writeln!(buffer)?;
    writeln!(buffer, "# Generated netlist dump")?;
    for module in &lib.modules {
        dump_module(buffer, lib, module)?;
    }
    Ok(())
}

/// Prints a histogram of the instances of one module by resolved kind
pub fn dump_opers(buffer: &mut dyn io::Write, module: &Module) -> io::Result<()> {
    if module.cells.is_empty() {
        return Ok(());
    }
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for cell in &module.cells {
        let kind = match cell.binding {
            CellBinding::Oper(oper) => oper.name(),
            CellBinding::Module(_) => "user",
            CellBinding::BlackBox | CellBinding::Unresolved => "blackbox",
        };
        *counts.entry(kind).or_insert(0) += 1;
    }
    write!(
        buffer,
        "There are {} instances in this network:",
        module.cells.len()
    )?;
    for (kind, count) in counts {
        write!(buffer, "  {} ({})", kind, count)?;
    }
    writeln!(buffer)
}

/// Prints one statistics line per module
pub fn dump_stats(buffer: &mut dyn io::Write, lib: &Library) -> io::Result<()> {
    let symbols = lib
        .modules
        .iter()
        .map(|m| lib.str(m.name).len())
        .max()
        .unwrap_or(0);
    for module in &lib.modules {
        let (pi, pi_bits, po, po_bits) = module.count_pio();
        write!(buffer, "{:>1$} : ", lib.str(module.name), symbols + 2)?;
        write!(buffer, "PI = {:3} ({:3})  ", pi, pi_bits)?;
        write!(buffer, "PO = {:3} ({:3})  ", po, po_bits)?;
        write!(buffer, "Wire = {:6}   ", module.wires.len())?;
        write!(buffer, "Cell = {:6}   ", module.cells.len())?;
        writeln!(buffer, "Con = {:6}", module.conns.len())?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::token::tokenize;
    use crate::*;

    const SRC: &str = "attribute \\top 1\n\
         module m1\n\
         \x20 wire width 4 input 1 a\n\
         \x20 wire width 4 offset 2 upto u\n\
         \x20 wire width 4 output 1 y\n\
         \x20 attribute \\src \"m.v 3\"\n\
         \x20 cell $add g0\n\
         \x20   parameter \\A_SIGNED 1'0\n\
         \x20   connect \\A a\n\
         \x20   connect \\B u [3:2]\n\
         \x20   connect \\Y y\n\
         \x20 end\n\
         \x20 connect u { a [0] a [1:2] 7 }\n\
         end\n";

    fn parse_str(src: &str) -> Library {
        let mut lib = Library::new();
        let tokens = tokenize(src.as_bytes(), &mut lib.pools.names).unwrap();
        Parser::new(&mut lib, &tokens).parse().unwrap();
        lib
    }

    #[test]
    fn round_trip() {
        let lib = parse_str(SRC);
        let mut first = Vec::new();
        dump_library(&mut first, &lib).unwrap();

        let reparsed = parse_str(std::str::from_utf8(&first).unwrap());
        let mut second = Vec::new();
        dump_library(&mut second, &reparsed).unwrap();
        assert_eq!(first, second);

        // structure survives as well
        assert_eq!(lib.modules.len(), reparsed.modules.len());
        assert_eq!(lib.modules[0].wires.len(), reparsed.modules[0].wires.len());
        assert_eq!(lib.modules[0].cells.len(), reparsed.modules[0].cells.len());
        assert_eq!(lib.modules[0].conns.len(), reparsed.modules[0].conns.len());
        assert_eq!(lib.pools.slices.len(), reparsed.pools.slices.len());
    }

    #[test]
    fn stats_and_histogram() {
        let mut lib = parse_str(SRC);
        link(&mut lib);
        let mut out = Vec::new();
        dump_stats(&mut out, &lib).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("m1"));
        assert!(text.contains("PI =   1"));
        let mut out = Vec::new();
        dump_opers(&mut out, &lib.modules[0]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("add (1)"));
    }

    #[test]
    fn quoted_attribute_round_trips() {
        let lib = parse_str(SRC);
        let mut out = Vec::new();
        dump_library(&mut out, &lib).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("attribute \\src \"m.v 3\""));
    }
}
