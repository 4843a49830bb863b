//! Randomized rewrite simulator
//!
//! Builds a seeded random tree, then applies a seeded random sequence of
//! rewrites and policy scans to it. After every operation the tree must hold
//! the same records as at the start, and once its separators are known to be
//! clean they must stay clean.

use cog_core::{
    check, scan, Cog, CogHandle, InvariantViolation, Key, PolicyKind, Reach, Record, RewriteOp,
    SENTINEL_VALUE,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use crate::loader;

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Total operations to execute
    pub total_operations: u64,
    /// Upper bound on records in the initial tree
    pub max_records: usize,
    /// Keys are drawn from `[0, max_key)`
    pub max_key: Key,
    /// Threshold used by generated cracker scans
    pub cracker_min_size: usize,
    /// Stop conditions
    pub stop_on_first_violation: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            total_operations: 1_000,
            max_records: 512,
            max_key: 1_000,
            cracker_min_size: 16,
            stop_on_first_violation: true,
        }
    }
}

/// Shape of the generated starting tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitialShape {
    /// Single unsorted leaf
    Array,
    /// Single sorted leaf
    SortedArray,
    /// Two unsorted leaves
    Concat,
    /// Leaves already partitioned around the separator
    CleanBTree,
    /// Leaves ignoring the separator
    DirtyBTree,
    /// Clean BTree followed by an unsorted leaf
    ConcatOverBTree,
}

/// Operations the simulator can generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedOperation {
    /// A rewrite through one of the drivers
    Rewrite(RewriteOp, Reach),
    /// A full scan under a policy
    Scan(PolicyKind),
}

impl SimulatedOperation {
    fn label(&self) -> String {
        match self {
            Self::Rewrite(op, reach) => {
                let op = match op {
                    RewriteOp::Sort => "sort",
                    RewriteOp::Split(_) => "split",
                    RewriteOp::Pushdown => "pushdown",
                };
                let reach = match reach {
                    Reach::Node => "node",
                    Reach::Tree => "tree",
                    Reach::Target(_) => "target",
                    Reach::PathTo(_) => "path",
                };
                format!("{op}/{reach}")
            }
            Self::Scan(PolicyKind::Naive) => "scan/naive".to_string(),
            Self::Scan(PolicyKind::Cracker { .. }) => "scan/cracker".to_string(),
        }
    }
}

impl fmt::Display for SimulatedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rewrite(op, reach) => write!(f, "{op} via {reach:?}"),
            Self::Scan(kind) => write!(f, "scan with {kind:?}"),
        }
    }
}

/// A violation detected during simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Record count changed
    SizeChanged {
        /// Index of the offending operation
        operation_index: u64,
        /// The operation
        operation: SimulatedOperation,
        /// Size before the run
        expected: usize,
        /// Size after the operation
        actual: usize,
    },
    /// Same count, different records
    RecordsChanged {
        /// Index of the offending operation
        operation_index: u64,
        /// The operation
        operation: SimulatedOperation,
    },
    /// A scan produced a different number of records than the tree holds
    ScanMismatch {
        /// Index of the offending operation
        operation_index: u64,
        /// Tree size
        expected: usize,
        /// Records produced
        scanned: usize,
    },
    /// Sortedness or separator broken on a clean tree
    Invariant {
        /// Index of the offending operation
        operation_index: u64,
        /// The operation
        operation: SimulatedOperation,
        /// What broke
        violation: InvariantViolation,
    },
}

/// Statistics collected during simulation
#[derive(Debug, Clone, Default)]
pub struct OperationStats {
    /// Operations executed
    pub total_operations: u64,
    /// Of which rewrites
    pub rewrites: u64,
    /// Of which scans
    pub scans: u64,
    /// Records produced across all scans
    pub records_scanned: u64,
    /// Per-kind counts
    pub operations_by_type: BTreeMap<String, u64>,
}

impl OperationStats {
    /// Count one operation
    pub fn record(&mut self, operation: &SimulatedOperation, scanned: Option<usize>) {
        self.total_operations += 1;
        *self.operations_by_type.entry(operation.label()).or_insert(0) += 1;
        match scanned {
            Some(records) => {
                self.scans += 1;
                self.records_scanned += records as u64;
            }
            None => self.rewrites += 1,
        }
    }
}

/// Final report from the simulator
#[derive(Debug, Clone)]
pub struct SimulatorReport {
    /// Configuration used
    pub config: SimulatorConfig,
    /// Starting tree
    pub initial_shape: InitialShape,
    /// Counters
    pub stats: OperationStats,
    /// Everything that went wrong
    pub violations: Vec<Violation>,
    /// Records in the tree at the end
    pub final_size: usize,
    /// Tree height at the end
    pub final_depth: usize,
    /// Leaves at the end
    pub final_leaves: usize,
}

impl SimulatorReport {
    /// Check if simulation passed all criteria
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Generate a text report
    #[must_use]
    pub fn generate_text(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Cog Simulator Report ===\n\n");
        report.push_str(&format!("Seed: {}\n", self.config.seed));
        report.push_str(&format!("Initial Shape: {:?}\n", self.initial_shape));
        report.push_str(&format!("Total Operations: {}\n", self.stats.total_operations));
        report.push_str(&format!("Rewrites: {}\n", self.stats.rewrites));
        report.push_str(&format!("Scans: {}\n", self.stats.scans));
        report.push_str(&format!("Records Scanned: {}\n", self.stats.records_scanned));
        report.push_str(&format!("Violations: {}\n", self.violations.len()));
        report.push_str(&format!("Final Size: {}\n", self.final_size));
        report.push_str(&format!("Final Depth: {}\n", self.final_depth));
        report.push_str(&format!("Final Leaves: {}\n", self.final_leaves));

        if !self.stats.operations_by_type.is_empty() {
            report.push_str("\n=== Operations ===\n");
            for (label, count) in &self.stats.operations_by_type {
                report.push_str(&format!("{label}: {count}\n"));
            }
        }

        if !self.violations.is_empty() {
            report.push_str("\n=== Violations ===\n");
            for (i, v) in self.violations.iter().enumerate() {
                report.push_str(&format!("{}. {:?}\n", i + 1, v));
            }
        }

        report.push_str(&format!(
            "\n=== Result: {} ===\n",
            if self.passed() { "PASS" } else { "FAIL" }
        ));

        report
    }
}

/// Run the simulator
#[must_use]
pub fn run_simulator(config: SimulatorConfig) -> SimulatorReport {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let (initial_shape, root) = generate_initial_tree(&mut rng, &config);
    let expected = sorted_records(&root);
    // Only a DirtyBTree starts with broken separators; a whole-tree
    // pushdown repairs it, and nothing breaks them again afterwards.
    let mut clean = initial_shape != InitialShape::DirtyBTree;
    let mut stats = OperationStats::default();
    let mut violations = Vec::new();

    tracing::info!(seed = config.seed, shape = ?initial_shape, size = expected.len(), "simulator start");

    for i in 0..config.total_operations {
        let operation = generate_operation(&mut rng, &config);
        let scanned = execute_operation(&root, operation);
        let before = violations.len();

        let actual = root.size();
        if actual != expected.len() {
            violations.push(Violation::SizeChanged {
                operation_index: i,
                operation,
                expected: expected.len(),
                actual,
            });
        } else if sorted_records(&root) != expected {
            violations.push(Violation::RecordsChanged {
                operation_index: i,
                operation,
            });
        }

        if let Some(scanned) = scanned {
            if scanned != expected.len() {
                violations.push(Violation::ScanMismatch {
                    operation_index: i,
                    expected: expected.len(),
                    scanned,
                });
            }
        }

        if operation == SimulatedOperation::Rewrite(RewriteOp::Pushdown, Reach::Tree) {
            clean = true;
        }
        if clean {
            if let Err(violation) = check(&root) {
                violations.push(Violation::Invariant {
                    operation_index: i,
                    operation,
                    violation,
                });
            }
        }

        stats.record(&operation, scanned);

        if violations.len() > before {
            tracing::warn!(index = i, %operation, "violation detected");
            if config.stop_on_first_violation {
                break;
            }
        }
    }

    SimulatorReport {
        final_size: root.size(),
        final_depth: root.depth(),
        final_leaves: root.leaf_count(),
        config,
        initial_shape,
        stats,
        violations,
    }
}

fn sorted_records(root: &CogHandle) -> Vec<Record> {
    let mut records: Vec<Record> = root.iter().collect();
    records.sort_unstable();
    records
}

fn random_leaf(rng: &mut StdRng, config: &SimulatorConfig, range: Range<Key>) -> CogHandle {
    let len = rng.random_range(0..=config.max_records / 2);
    let len = if range.is_empty() { 0 } else { len };
    let keys = (0..len).map(|_| rng.random_range(range.clone()));
    loader::array_for_buffer(&loader::load_buffer(keys, SENTINEL_VALUE))
}

fn generate_initial_tree(rng: &mut StdRng, config: &SimulatorConfig) -> (InitialShape, CogHandle) {
    let max_key = config.max_key.max(1);
    let all = 0..max_key;
    let sep = rng.random_range(0..max_key);

    let shape = match rng.random_range(0..6) {
        0 => InitialShape::Array,
        1 => InitialShape::SortedArray,
        2 => InitialShape::Concat,
        3 => InitialShape::CleanBTree,
        4 => InitialShape::DirtyBTree,
        _ => InitialShape::ConcatOverBTree,
    };

    let root = match shape {
        InitialShape::Array => random_leaf(rng, config, all),
        InitialShape::SortedArray => {
            let leaf = random_leaf(rng, config, all);
            RewriteOp::Sort.apply(&leaf);
            leaf
        }
        InitialShape::Concat => {
            let left = random_leaf(rng, config, all.clone());
            let right = random_leaf(rng, config, all);
            CogHandle::new(Cog::concat(left, right))
        }
        InitialShape::CleanBTree => {
            let left = random_leaf(rng, config, 0..sep);
            let right = random_leaf(rng, config, sep..max_key);
            CogHandle::new(Cog::btree(left, sep, right))
        }
        InitialShape::DirtyBTree => {
            let left = random_leaf(rng, config, all.clone());
            let right = random_leaf(rng, config, all);
            CogHandle::new(Cog::btree(left, sep, right))
        }
        InitialShape::ConcatOverBTree => {
            let left = random_leaf(rng, config, 0..sep);
            let right = random_leaf(rng, config, sep..max_key);
            let tree = CogHandle::new(Cog::btree(left, sep, right));
            let tail = random_leaf(rng, config, all);
            CogHandle::new(Cog::concat(tree, tail))
        }
    };
    (shape, root)
}

fn generate_operation(rng: &mut StdRng, config: &SimulatorConfig) -> SimulatedOperation {
    if rng.random_bool(0.2) {
        let kind = if rng.random_bool(0.5) {
            PolicyKind::Naive
        } else {
            PolicyKind::Cracker {
                min_size: config.cracker_min_size,
            }
        };
        return SimulatedOperation::Scan(kind);
    }

    let op = match rng.random_range(0..3) {
        0 => RewriteOp::Sort,
        1 => RewriteOp::Split(random_target(rng, config)),
        _ => RewriteOp::Pushdown,
    };
    let reach = match rng.random_range(0..4) {
        0 => Reach::Node,
        1 => Reach::Tree,
        2 => Reach::Target(random_target(rng, config)),
        _ => Reach::PathTo(random_target(rng, config)),
    };
    SimulatedOperation::Rewrite(op, reach)
}

// Targets may fall just outside the key range.
fn random_target(rng: &mut StdRng, config: &SimulatorConfig) -> Key {
    rng.random_range(-1..=config.max_key)
}

fn execute_operation(root: &CogHandle, operation: SimulatedOperation) -> Option<usize> {
    match operation {
        SimulatedOperation::Rewrite(op, reach) => {
            op.apply_with(reach, root);
            None
        }
        SimulatedOperation::Scan(kind) => {
            let policy = kind.build();
            Some(scan(root, policy.as_ref()).records)
        }
    }
}
