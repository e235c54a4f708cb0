// visualization.rs
//
// Per-cycle rendering of engine state: what's occupying each functional
// unit, how many reservation stations are in flight, and who (if anyone)
// holds the common data bus this cycle. Driven by `TomasuloEngine::step`
// rather than `run`, since the whole point is to watch cycles go by.

use crate::tomasulo::TomasuloEngine;
use colored::Colorize;

#[derive(Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Clone)]
pub struct CycleVisualizer {
    pub colorize: bool,
    pub format: OutputFormat,
}

impl CycleVisualizer {
    pub fn new() -> Self {
        Self { colorize: true, format: OutputFormat::Text }
    }

    pub fn render(&self, engine: &TomasuloEngine, cycle: u64) -> String {
        match self.format {
            OutputFormat::Text => self.render_text(engine, cycle),
            OutputFormat::Csv => self.render_csv(engine, cycle),
            OutputFormat::Json => self.render_json(engine, cycle),
        }
    }

    fn render_text(&self, engine: &TomasuloEngine, cycle: u64) -> String {
        let mut out = String::new();
        out.push_str(&format!("=== cycle {} ===\n", cycle));

        out.push_str(&format!(
            "reservation stations: INT {}  FP {}\n",
            engine.rs_int_len(),
            engine.rs_fp_len()
        ));

        out.push_str("functional units:\n");
        for (slot, tag) in engine.fu_int_occupants() {
            let instr = &engine.instructions()[tag.0];
            out.push_str(&format!("  INT[{}]: {}\n", slot, self.describe(instr.pc, tag.0)));
        }
        for (slot, tag) in engine.fu_fp_occupants() {
            let instr = &engine.instructions()[tag.0];
            out.push_str(&format!("  FP[{}]:  {}\n", slot, self.describe(instr.pc, tag.0)));
        }

        match engine.cdb_occupant() {
            Some(tag) => {
                let instr = &engine.instructions()[tag.0];
                let line = format!("CDB: {}", self.describe(instr.pc, tag.0));
                out.push_str(&format!("{}\n", if self.colorize { line.green().to_string() } else { line }));
            },
            None => out.push_str("CDB: idle\n"),
        }

        out
    }

    fn render_csv(&self, engine: &TomasuloEngine, cycle: u64) -> String {
        let cdb = engine.cdb_occupant().map(|t| format!("{}", t.0)).unwrap_or_default();
        format!(
            "{},{},{},{}\n",
            cycle,
            engine.rs_int_len(),
            engine.rs_fp_len(),
            cdb
        )
    }

    fn render_json(&self, engine: &TomasuloEngine, cycle: u64) -> String {
        let fu_int: Vec<String> = engine
            .fu_int_occupants()
            .map(|(slot, tag)| format!("{{\"slot\":{},\"instr\":{}}}", slot, tag.0))
            .collect();
        let fu_fp: Vec<String> = engine
            .fu_fp_occupants()
            .map(|(slot, tag)| format!("{{\"slot\":{},\"instr\":{}}}", slot, tag.0))
            .collect();
        let cdb = engine
            .cdb_occupant()
            .map(|t| t.0.to_string())
            .unwrap_or_else(|| "null".to_string());

        format!(
            "{{\"cycle\":{},\"rs_int\":{},\"rs_fp\":{},\"fu_int\":[{}],\"fu_fp\":[{}],\"cdb\":{}}}\n",
            cycle,
            engine.rs_int_len(),
            engine.rs_fp_len(),
            fu_int.join(","),
            fu_fp.join(","),
            cdb
        )
    }

    fn describe(&self, pc: u32, index: usize) -> String {
        format!("#{} @0x{:08x}", index, pc)
    }
}

impl Default for CycleVisualizer {
    fn default() -> Self {
        Self::new()
    }
}
