// config.rs
//
// Compile-time parameters of the Tomasulo engine, wrapped in a builder so
// callers can scale the machine for experiments without touching engine
// code. Defaults match the reference constants from the original source.

/// How the CDB resolves two functional units completing in the same cycle.
/// See DESIGN.md for the rationale behind defaulting to the faithful port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdbArbitration {
    /// The later-scanned completion overwrites the CDB slot set by an
    /// earlier completion in the same cycle; both vacate their FU and RS
    /// entries regardless. Matches `execute_To_CDB` in the original source.
    OverwriteOnCollision,
    /// The later completion keeps its FU occupied and does not advance
    /// until the CDB is free. Corrected behavior, not what the original
    /// source does.
    StallLoser,
}

#[derive(Debug, Clone)]
pub struct TomasuloConfig {
    pub ifq_size: usize,
    pub rs_int: usize,
    pub rs_fp: usize,
    pub fu_int: usize,
    pub fu_fp: usize,
    pub latency_int: u64,
    pub latency_fp: u64,
    pub total_regs: u16,
    pub cdb_arbitration: CdbArbitration,
    /// Optional watchdog: abort if the simulation hasn't drained by this
    /// cycle. A safety net for malformed traces, not part of the core
    /// scheduling algorithm.
    pub max_cycles: Option<u64>,
}

impl TomasuloConfig {
    pub fn new(total_regs: u16) -> Self {
        Self {
            ifq_size: 10,
            rs_int: 4,
            rs_fp: 2,
            fu_int: 2,
            fu_fp: 1,
            latency_int: 4,
            latency_fp: 9,
            total_regs,
            cdb_arbitration: CdbArbitration::OverwriteOnCollision,
            max_cycles: None,
        }
    }

    pub fn with_ifq_size(mut self, size: usize) -> Self {
        assert!(size > 0, "instruction queue capacity must be positive");
        self.ifq_size = size;
        self
    }

    pub fn with_rs_sizes(mut self, rs_int: usize, rs_fp: usize) -> Self {
        assert!(rs_int > 0 && rs_fp > 0, "reservation station pools must be non-empty");
        self.rs_int = rs_int;
        self.rs_fp = rs_fp;
        self
    }

    pub fn with_fu_counts(mut self, fu_int: usize, fu_fp: usize) -> Self {
        assert!(fu_int > 0 && fu_fp > 0, "functional unit pools must be non-empty");
        self.fu_int = fu_int;
        self.fu_fp = fu_fp;
        self
    }

    pub fn with_latencies(mut self, latency_int: u64, latency_fp: u64) -> Self {
        assert!(latency_int > 0 && latency_fp > 0, "latencies must be positive");
        self.latency_int = latency_int;
        self.latency_fp = latency_fp;
        self
    }

    pub fn with_cdb_arbitration(mut self, mode: CdbArbitration) -> Self {
        self.cdb_arbitration = mode;
        self
    }

    pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }
}

impl Default for TomasuloConfig {
    fn default() -> Self {
        Self::new(32)
    }
}
