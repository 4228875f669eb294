//! Resumable run state
//!
//! A ledger is rebuilt from an existing report, collects the results of
//! the current run and finally yields the merged statistics that become
//! the report's new `FINAL STATISTICS` block.
//!
//! ```text
//! Fresh --begin--> Active --finalize--> Finalized
//! Fresh --load--> Resuming --> Active
//! ```
use crate::FINAL_STATISTICS;
use crate::classify::Outcome;
use crate::error::LedgerError;
use crate::instance::InstanceKind;
use crate::solver::{RunResult, SolverRole};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Counts per outcome for one solver.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally([usize; Outcome::ALL.len()]);

impl Tally {
    pub fn get(&self, outcome: Outcome) -> usize {
        self.0[outcome.index()]
    }
    fn set(&mut self, outcome: Outcome, n: usize) {
        self.0[outcome.index()] = n;
    }
    fn incr(&mut self, outcome: Outcome) {
        self.0[outcome.index()] += 1;
    }
}

/// Aggregate statistics of a report.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub total: usize,
    tallies: [Tally; SolverRole::ALL.len()],
}

impl Stats {
    pub fn tally(&self, role: SolverRole) -> &Tally {
        &self.tallies[role.index()]
    }

    pub fn count(&self, role: SolverRole, outcome: Outcome) -> usize {
        self.tally(role).get(outcome)
    }

    fn add(&mut self, result: &RunResult) {
        self.total += 1;
        for role in SolverRole::ALL {
            if let Some(run) = result.run(role) {
                self.tallies[role.index()].incr(run.outcome);
            }
        }
    }

    /// Field-by-field sum.
    pub fn merged(&self, other: &Stats) -> Stats {
        let mut sum = self.clone();
        sum.total += other.total;
        for (mine, theirs) in sum.tallies.iter_mut().zip(other.tallies.iter()) {
            for (a, b) in mine.0.iter_mut().zip(theirs.0.iter()) {
                *a += b;
            }
        }
        sum
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedgerState {
    /// nothing loaded yet
    Fresh,
    /// parsing a prior report
    Resuming,
    /// accepting results
    Active,
    /// statistics handed out; no more results
    Finalized,
}

#[derive(Debug)]
pub struct Ledger {
    kind: InstanceKind,
    state: LedgerState,
    processed: HashSet<String>,
    prior: Stats,
    session: Stats,
    skipped: usize,
    column_header: Option<String>,
}

impl Ledger {
    pub fn new(kind: InstanceKind) -> Self {
        Ledger {
            kind,
            state: LedgerState::Fresh,
            processed: HashSet::new(),
            prior: Stats::default(),
            session: Stats::default(),
            skipped: 0,
            column_header: None,
        }
    }

    pub fn state(&self) -> LedgerState {
        self.state
    }

    fn require(&self, state: LedgerState, operation: &'static str) -> Result<(), LedgerError> {
        if self.state == state {
            Ok(())
        } else {
            Err(LedgerError::InvalidTransition {
                operation,
                state: self.state,
            })
        }
    }

    /// Start without a prior report.
    pub fn begin(&mut self) -> Result<(), LedgerError> {
        self.require(LedgerState::Fresh, "begin")?;
        self.state = LedgerState::Active;
        Ok(())
    }

    /// Rebuild the processed set and prior statistics from a report.
    /// Unreadable lines are skipped; a report without a statistics block
    /// has no prior aggregate.
    pub fn load(&mut self, report: &str) -> Result<(), LedgerError> {
        self.require(LedgerState::Fresh, "load")?;
        self.state = LedgerState::Resuming;
        let (data, aggregate) = split_report(report);
        let mut previous: Option<&str> = None;
        for line in data.lines() {
            if let Some(id) = row_id(self.kind, line) {
                self.processed.insert(id.to_string());
            } else if line.contains("-----") && self.column_header.is_none() {
                self.column_header = previous
                    .filter(|l| l.contains('|'))
                    .map(|l| l.trim_end().to_string());
            }
            previous = Some(line);
        }
        if let Some(aggregate) = aggregate {
            self.prior = parse_statistics(self.kind, aggregate);
        }
        debug!(
            "resumed {} instances, {} counted in prior statistics",
            self.processed.len(),
            self.prior.total
        );
        self.state = LedgerState::Active;
        Ok(())
    }

    pub fn is_processed(&self, id: &str) -> bool {
        self.processed.contains(id)
    }

    /// True for an instance already in the ledger; such skips are tallied
    /// but never counted in the statistics.
    pub fn should_skip(&mut self, id: &str) -> bool {
        let skip = self.processed.contains(id);
        if skip {
            self.skipped += 1;
        }
        skip
    }

    /// Count a new result. Returns `false`, counting nothing, when the
    /// instance is already in the ledger.
    pub fn record(&mut self, result: &RunResult) -> Result<bool, LedgerError> {
        self.require(LedgerState::Active, "record")?;
        if !self.processed.insert(result.instance_id.clone()) {
            warn!("{} is already in the report; not counted", result.instance_id);
            return Ok(false);
        }
        self.session.add(result);
        Ok(true)
    }

    /// Close the ledger and return prior plus session statistics.
    pub fn finalize(&mut self) -> Result<Stats, LedgerError> {
        self.require(LedgerState::Active, "finalize")?;
        self.state = LedgerState::Finalized;
        Ok(self.prior.merged(&self.session))
    }

    pub fn processed(&self) -> &HashSet<String> {
        &self.processed
    }
    pub fn prior(&self) -> &Stats {
        &self.prior
    }
    pub fn session(&self) -> &Stats {
        &self.session
    }
    pub fn skipped(&self) -> usize {
        self.skipped
    }
    /// The column header line of the loaded report, if any.
    pub fn column_header(&self) -> Option<&str> {
        self.column_header.as_deref()
    }
}

/// Split a report at the first `FINAL STATISTICS:` line into the data part
/// and the aggregate part.
pub fn split_report(report: &str) -> (&str, Option<&str>) {
    let mut offset = 0;
    for line in report.split_inclusive('\n') {
        if line.contains(FINAL_STATISTICS) {
            return (&report[..offset], Some(&report[offset..]));
        }
        offset += line.len();
    }
    (report, None)
}

/// The instance id of a result row: its second field, provided that names
/// an instance file.
pub fn row_id(kind: InstanceKind, line: &str) -> Option<&str> {
    if !line.contains('|') {
        return None;
    }
    let field = line.split('|').nth(1)?.trim();
    kind.extensions()
        .iter()
        .any(|ext| field.contains(&format!(".{}", ext)))
        .then_some(field)
}

/// Read the counters of a `FINAL STATISTICS` block.
pub fn parse_statistics(kind: InstanceKind, block: &str) -> Stats {
    let mut stats = Stats::default();
    let mut context: Option<SolverRole> = None;
    for line in block.lines() {
        if let Some(role) = SolverRole::ALL
            .into_iter()
            .find(|r| line.contains(&format!("{} Results:", r.name(kind))))
        {
            context = Some(role);
            continue;
        }
        if line.contains("Total instances:") {
            if let Some(n) = counter(line) {
                stats.total = n;
            }
            context = None;
            continue;
        }
        let Some(role) = context else {
            continue;
        };
        let Some((label, _)) = line.split_once(':') else {
            continue;
        };
        if let Some(outcome) = Outcome::ALL
            .into_iter()
            .find(|o| o.stat_label(kind).eq_ignore_ascii_case(label.trim()))
        {
            if let Some(n) = counter(line) {
                stats.tallies[role.index()].set(outcome, n);
            }
        }
    }
    stats
}

fn counter(line: &str) -> Option<usize> {
    let (_, value) = line.split_once(':')?;
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!("ignoring unreadable statistics line: {}", line.trim());
            None
        }
    }
}
