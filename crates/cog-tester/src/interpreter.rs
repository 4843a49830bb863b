//! Line-oriented command interpreter
//!
//! Scripts build Cog structures on a stack and run rewrites, scans and
//! diagnostics against the top of it. One command per line; blank lines and
//! lines starting with `#` are skipped.
//!
//! | Command | Effect |
//! |---|---|
//! | `array random <len> <max>` | push an Array of random keys in `[0, max)` |
//! | `array sorted <len> <max>` | same, as a SortedArray |
//! | `array explicit <k>...` | push an Array of the given keys |
//! | `concat` | pop `a`, pop `b`, push `Concat(a, b)` |
//! | `btree <sep>` | pop `b`, pop `a`, push `BTree(a, sep, b)` |
//! | `size` / `dump` / `check` | report on the top |
//! | `scan` / `time_scan` | scan the top under the current policy |
//! | `split_array <t>` / `rec_split_array <t>` | split the top / along the path to `t` |
//! | `sort_array` / `rec_sort_array` | sort the top / every node |
//! | `pushdown_array` / `rec_pushdown_array` / `tgt_pushdown_array <t>` | pushdown at the top / every node / the target |
//! | `policy naive` / `policy cracker <min>` | swap the scan policy |

use crate::config::TesterConfig;
use crate::error::TesterError;
use crate::loader;
use cog_core::{
    check, scan, scan_with, Cog, CogHandle, Key, PolicyKind, Reach, RewriteOp, RewritePolicy,
};
use rand::{rngs::StdRng, SeedableRng};
use std::io::{BufRead, Write};
use std::str::{FromStr, SplitWhitespace};

const RULER: &str = "---------------";

/// How `array` fills its buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fill {
    /// Uniform random keys
    Random {
        /// Record count
        len: usize,
        /// Exclusive key bound
        max: Key,
    },
    /// Uniform random keys, sorted
    Sorted {
        /// Record count
        len: usize,
        /// Exclusive key bound
        max: Key,
    },
    /// Keys given on the line
    Explicit(Vec<Key>),
}

/// A parsed script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Push a new leaf
    Array(Fill),
    /// Combine the top two entries
    Concat,
    /// Combine the top two entries around a separator
    BTree(Key),
    /// Print record count
    Size,
    /// Print the structure
    Dump,
    /// Print every key
    Scan,
    /// Scan and print timings
    TimeScan,
    /// Verify sortedness and separators
    Check,
    /// Run a rewrite through a driver
    Rewrite(RewriteOp, Reach),
    /// Swap the scan policy
    Policy {
        /// Name as typed
        name: String,
        /// Resolved policy
        kind: PolicyKind,
    },
}

impl Command {
    /// Parse one line; `None` for blanks and comments
    ///
    /// # Errors
    /// Unknown commands, bad fill modes, missing or malformed arguments,
    /// unknown policy names.
    pub fn parse(line: &str) -> Result<Option<Self>, TesterError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let mut tokens = line.split_whitespace();
        let Some(word) = tokens.next() else {
            return Ok(None);
        };

        let command = match word {
            "array" => Self::Array(parse_fill(&mut tokens)?),
            "concat" => Self::Concat,
            "btree" => Self::BTree(required(&mut tokens, "btree", "sep")?),
            "size" => Self::Size,
            "dump" => Self::Dump,
            "scan" => Self::Scan,
            "time_scan" => Self::TimeScan,
            "check" => Self::Check,
            "split_array" => {
                let target = required(&mut tokens, "split_array", "target")?;
                Self::Rewrite(RewriteOp::Split(target), Reach::Node)
            }
            "rec_split_array" => {
                let target = required(&mut tokens, "rec_split_array", "target")?;
                Self::Rewrite(RewriteOp::Split(target), Reach::PathTo(target))
            }
            "sort_array" => Self::Rewrite(RewriteOp::Sort, Reach::Node),
            "rec_sort_array" => Self::Rewrite(RewriteOp::Sort, Reach::Tree),
            "pushdown_array" => Self::Rewrite(RewriteOp::Pushdown, Reach::Node),
            "rec_pushdown_array" => Self::Rewrite(RewriteOp::Pushdown, Reach::Tree),
            "tgt_pushdown_array" => {
                let target = required(&mut tokens, "tgt_pushdown_array", "target")?;
                Self::Rewrite(RewriteOp::Pushdown, Reach::Target(target))
            }
            "policy" => {
                let name = tokens.next().ok_or(TesterError::MissingArgument {
                    op: "policy",
                    arg: "name",
                })?;
                let min_size = optional(&mut tokens, "policy", "min")?;
                Self::Policy {
                    name: name.to_string(),
                    kind: PolicyKind::parse(name, min_size)?,
                }
            }
            other => return Err(TesterError::UnknownOperation(other.to_string())),
        };
        Ok(Some(command))
    }
}

fn parse_fill(tokens: &mut SplitWhitespace<'_>) -> Result<Fill, TesterError> {
    let mode = tokens.next().ok_or(TesterError::MissingArgument {
        op: "array",
        arg: "mode",
    })?;
    match mode {
        "random" => Ok(Fill::Random {
            len: required(tokens, "array", "len")?,
            max: required(tokens, "array", "max")?,
        }),
        "sorted" => Ok(Fill::Sorted {
            len: required(tokens, "array", "len")?,
            max: required(tokens, "array", "max")?,
        }),
        "explicit" => tokens
            .map(|token| parse_token(token, "array", "key"))
            .collect::<Result<Vec<_>, _>>()
            .map(Fill::Explicit),
        other => Err(TesterError::InvalidFillMode(other.to_string())),
    }
}

fn parse_token<T: FromStr>(
    token: &str,
    op: &'static str,
    arg: &'static str,
) -> Result<T, TesterError> {
    token.parse().map_err(|_| TesterError::InvalidNumber {
        op,
        arg,
        value: token.to_string(),
    })
}

fn required<T: FromStr>(
    tokens: &mut SplitWhitespace<'_>,
    op: &'static str,
    arg: &'static str,
) -> Result<T, TesterError> {
    let token = tokens.next().ok_or(TesterError::MissingArgument { op, arg })?;
    parse_token(token, op, arg)
}

fn optional<T: FromStr>(
    tokens: &mut SplitWhitespace<'_>,
    op: &'static str,
    arg: &'static str,
) -> Result<Option<T>, TesterError> {
    tokens.next().map(|token| parse_token(token, op, arg)).transpose()
}

/// Stack-based script interpreter writing its report to `W`
pub struct CogTester<W: Write> {
    stack: Vec<CogHandle>,
    policy: Box<dyn RewritePolicy>,
    rng: StdRng,
    config: TesterConfig,
    out: W,
}

impl<W: Write> CogTester<W> {
    /// Create an interpreter with the configured seed and starting policy
    ///
    /// # Errors
    /// Returns [`TesterError::Config`] if the configured policy is unknown.
    pub fn new(config: TesterConfig, out: W) -> Result<Self, TesterError> {
        let policy = config.initial_policy()?.build();
        Ok(Self {
            stack: Vec::new(),
            policy,
            rng: StdRng::seed_from_u64(config.seed),
            config,
            out,
        })
    }

    /// Structures on the stack, bottom first
    #[must_use]
    pub fn stack(&self) -> &[CogHandle] {
        &self.stack
    }

    /// Name of the active policy
    #[must_use]
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Consume the interpreter, returning the output sink
    pub fn into_output(self) -> W {
        self.out
    }

    /// Run every line of `input`, stopping at the first failure
    ///
    /// # Errors
    /// The failing line's error wrapped in [`TesterError::AtLine`].
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<(), TesterError> {
        for (index, line) in input.lines().enumerate() {
            let line = line?;
            if let Err(e) = self.execute(&line) {
                tracing::warn!(line = index + 1, error = %e, "command rejected");
                return Err(e.at_line(index + 1));
            }
        }
        self.out.flush()?;
        Ok(())
    }

    /// Parse and execute one line
    ///
    /// # Errors
    /// Parse errors, stack underflow, failed checks and output errors.
    pub fn execute(&mut self, line: &str) -> Result<(), TesterError> {
        let Some(command) = Command::parse(line)? else {
            return Ok(());
        };
        if self.config.echo_commands {
            writeln!(self.out, "> {}", line.trim())?;
        }
        tracing::debug!(command = ?command, depth = self.stack.len(), "execute");
        self.apply(command)
    }

    /// Execute an already parsed command
    ///
    /// # Errors
    /// As [`execute`](Self::execute), minus parsing.
    pub fn apply(&mut self, command: Command) -> Result<(), TesterError> {
        match command {
            Command::Array(fill) => {
                let value = self.config.sentinel_value;
                let handle = match fill {
                    Fill::Random { len, max } => {
                        loader::build_random_array(&mut self.rng, len, max, value)?
                    }
                    Fill::Sorted { len, max } => {
                        loader::build_random_sorted_array(&mut self.rng, len, max, value)?
                    }
                    Fill::Explicit(keys) => {
                        loader::array_for_buffer(&loader::load_buffer(keys, value))
                    }
                };
                self.stack.push(handle);
            }
            Command::Concat => {
                let [a, b] = self.pop_pair("concat")?;
                self.stack.push(CogHandle::new(Cog::concat(a, b)));
            }
            Command::BTree(sep) => {
                let [b, a] = self.pop_pair("btree")?;
                self.stack.push(CogHandle::new(Cog::btree(a, sep, b)));
            }
            Command::Size => {
                let size = self.top("size")?.size();
                writeln!(self.out, "Size: {size} records")?;
            }
            Command::Dump => {
                let dump = self.top("dump")?.print_debug(1);
                writeln!(self.out, "gROOT")?;
                write!(self.out, "{dump}")?;
            }
            Command::Check => {
                let handle = self.top("check")?.clone();
                check(&handle)?;
                writeln!(
                    self.out,
                    "Check: OK (depth {}, {} leaves)",
                    handle.depth(),
                    handle.leaf_count()
                )?;
            }
            Command::Scan => self.print_scan()?,
            Command::TimeScan => self.time_scan()?,
            Command::Rewrite(op, reach) => {
                let handle = self.top("rewrite")?.clone();
                tracing::info!(op = %op, reach = ?reach, size = handle.size(), "rewrite");
                op.apply_with(reach, &handle);
            }
            Command::Policy { name, kind } => {
                self.policy = kind.build();
                tracing::info!(policy = self.policy.name(), "policy changed");
                writeln!(self.out, "Now using policy '{name}' -> '{}'", self.policy.name())?;
            }
        }
        Ok(())
    }

    fn top(&self, op: &'static str) -> Result<&CogHandle, TesterError> {
        self.stack.last().ok_or(TesterError::EmptyStack {
            op,
            needed: 1,
            found: 0,
        })
    }

    /// Pop two entries, most recent first
    fn pop_pair(&mut self, op: &'static str) -> Result<[CogHandle; 2], TesterError> {
        let found = self.stack.len();
        if found < 2 {
            return Err(TesterError::EmptyStack { op, needed: 2, found });
        }
        match (self.stack.pop(), self.stack.pop()) {
            (Some(top), Some(below)) => Ok([top, below]),
            _ => Err(TesterError::EmptyStack { op, needed: 2, found }),
        }
    }

    fn print_scan(&mut self) -> Result<(), TesterError> {
        let handle = self.top("scan")?.clone();
        let Self { out, policy, .. } = self;

        writeln!(out, "{RULER}")?;
        let mut written = Ok(());
        scan_with(&handle, &**policy, |row, record| {
            if written.is_ok() {
                written = writeln!(out, "{row} -> {}", record.key);
            }
        });
        written?;
        writeln!(out, "{RULER}")?;
        Ok(())
    }

    fn time_scan(&mut self) -> Result<(), TesterError> {
        let handle = self.top("time_scan")?.clone();
        let report = scan(&handle, self.policy.as_ref());

        writeln!(self.out, "{RULER}")?;
        writeln!(self.out, "Records Scanned: {}", report.records)?;
        writeln!(self.out, "Time Taken: {} us", report.elapsed.as_micros())?;
        if let Some(per_record) = report.per_record() {
            writeln!(self.out, "Time/Record: {:.4} us", per_record.as_secs_f64() * 1e6)?;
        }
        writeln!(self.out, "{RULER}")?;
        Ok(())
    }
}
