use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tomasulo_sim::tomasulo::{TomasuloConfig, TomasuloEngine};
use tomasulo_sim::trace::{Instruction, OpcodeOracle, TraceChunk, DNA};

struct BenchIsa;

impl OpcodeOracle for BenchIsa {
    fn is_uncond_ctrl(&self, _opcode: u32) -> bool {
        false
    }
    fn is_cond_ctrl(&self, _opcode: u32) -> bool {
        false
    }
    fn is_icomp(&self, opcode: u32) -> bool {
        opcode == 0
    }
    fn is_fcomp(&self, opcode: u32) -> bool {
        opcode == 1
    }
    fn is_load(&self, _opcode: u32) -> bool {
        false
    }
    fn is_store(&self, _opcode: u32) -> bool {
        false
    }
    fn is_trap(&self, _opcode: u32) -> bool {
        false
    }
}

/// A long dependency chain: each instruction reads the previous one's
/// output, forcing full serialization through issue/execute/CDB.
fn chained_trace(len: usize) -> TraceChunk {
    let mut table = Vec::with_capacity(len);
    let mut prev_reg = DNA;
    for i in 0..len {
        let r_in = [prev_reg, DNA, DNA];
        let r_out = [(i % 30) as i16, DNA];
        table.push(Instruction::new(0, i as u32 * 4, i, r_in, r_out));
        prev_reg = r_out[0];
    }
    TraceChunk::new(table)
}

/// A wide independent trace: every instruction is ready immediately, so
/// throughput is bound entirely by reservation-station and FU capacity.
fn independent_trace(len: usize) -> TraceChunk {
    let mut table = Vec::with_capacity(len);
    for i in 0..len {
        table.push(Instruction::new(0, i as u32 * 4, i, [DNA, DNA, DNA], [DNA, DNA]));
    }
    TraceChunk::new(table)
}

fn bench_chained(c: &mut Criterion) {
    c.bench_function("chained_dependency_chain_256", |b| {
        b.iter(|| {
            let mut engine = TomasuloEngine::new(chained_trace(256), TomasuloConfig::new(32)).unwrap();
            black_box(engine.run(&BenchIsa).unwrap())
        })
    });
}

fn bench_independent(c: &mut Criterion) {
    c.bench_function("independent_instructions_256", |b| {
        b.iter(|| {
            let mut engine = TomasuloEngine::new(independent_trace(256), TomasuloConfig::new(32)).unwrap();
            black_box(engine.run(&BenchIsa).unwrap())
        })
    });
}

criterion_group!(benches, bench_chained, bench_independent);
criterion_main!(benches);
