// trace_loader.rs
//
// A small textual trace format for feeding instruction streams into the
// Tomasulo engine without hand-building `Instruction` values. One
// instruction per line:
//
//   <opcode> <pc> r_in0,r_in1,r_in2 r_out0,r_out1
//
// `opcode` is a bare integer (the engine treats opcodes as opaque; the
// caller's `OpcodeOracle` gives them meaning), `pc` is hex or decimal, and
// register slots use `-` for "does not apply". Blank lines and lines
// starting with `#` are skipped.
//
// This is intentionally minimal: it exists to drive tests and the CLI demo
// program, not to be a general assembly syntax.

use crate::trace::{Instruction, RegId, TraceChunk, DNA};
use std::fmt;

#[derive(Debug)]
pub struct TraceParseError {
    pub line: usize,
    pub message: String,
}

impl fmt::Display for TraceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for TraceParseError {}

pub fn parse_trace(source: &str) -> Result<TraceChunk, TraceParseError> {
    let mut table = Vec::new();
    for (line_no, raw_line) in source.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let index = table.len();
        table.push(parse_line(line, line_no + 1, index)?);
    }
    Ok(TraceChunk::new(table))
}

fn parse_line(line: &str, line_no: usize, index: usize) -> Result<Instruction, TraceParseError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 4 {
        return Err(err(line_no, format!("expected 4 fields, found {}", fields.len())));
    }

    let opcode = parse_u32(fields[0], line_no)?;
    let pc = parse_u32(fields[1], line_no)?;
    let r_in = parse_regs::<3>(fields[2], line_no)?;
    let r_out = parse_regs::<2>(fields[3], line_no)?;

    Ok(Instruction::new(opcode, pc, index, r_in, r_out))
}

fn parse_u32(field: &str, line_no: usize) -> Result<u32, TraceParseError> {
    if let Some(hex) = field.strip_prefix("0x") {
        u32::from_str_radix(hex, 16).map_err(|e| err(line_no, format!("bad hex integer {:?}: {}", field, e)))
    } else {
        field.parse().map_err(|e| err(line_no, format!("bad integer {:?}: {}", field, e)))
    }
}

fn parse_regs<const N: usize>(field: &str, line_no: usize) -> Result<[RegId; N], TraceParseError> {
    let mut out = [DNA; N];
    let parts: Vec<&str> = field.split(',').collect();
    if parts.len() != N {
        return Err(err(line_no, format!("expected {} register slots, found {}", N, parts.len())));
    }
    for (slot, part) in parts.iter().enumerate() {
        out[slot] = if *part == "-" {
            DNA
        } else {
            part.parse().map_err(|e| err(line_no, format!("bad register id {:?}: {}", part, e)))?
        };
    }
    Ok(out)
}

fn err(line: usize, message: String) -> TraceParseError {
    TraceParseError { line, message }
}
