use std::collections::HashMap;

use nix::unistd::Pid;
use tracing::warn;

use crate::{
    auxiliary::constants::general::FORKING_CALLS,
    error::{ConvertError, ParseError},
    parser::{parse_lines, PartialCall, TraceLine, TraceRecord},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessTrace {
    pub pid: Pid,
    pub parent: Option<Pid>,
    pub records: Vec<TraceRecord>,
}

/// Every process of one trace, in order of first appearance.
#[derive(Debug, Default)]
pub struct TraceTree {
    root: Option<Pid>,
    processes: Vec<ProcessTrace>,
    index: HashMap<Pid, usize>,
    pending: HashMap<Pid, PartialCall>,
    parents: HashMap<Pid, Pid>,
    pub line_errors: Vec<ParseError>,
}

impl TraceTree {
    pub fn parse(text: &str) -> Self {
        Self::assemble(parse_lines(text))
    }

    pub fn assemble(lines: impl IntoIterator<Item = Result<TraceLine, ParseError>>) -> Self {
        let mut tree = TraceTree::default();
        for line in lines {
            match line {
                Ok(line) => tree.take_line(line),
                Err(error) => {
                    warn!(line = error.line, reason = %error.reason, "skipping unparseable trace line");
                    tree.line_errors.push(error);
                }
            }
        }
        for (pid, unfinished) in tree.pending.drain() {
            warn!(%pid, call = %unfinished.name, line = unfinished.line, "call never resumed, dropping it");
        }
        for process in tree.processes.iter_mut() {
            process.parent = tree.parents.get(&process.pid).copied();
        }
        tree
    }

    fn take_line(&mut self, line: TraceLine) {
        match line {
            TraceLine::Call(record) => self.push(record),
            TraceLine::Unfinished(partial) => {
                if let Some(replaced) = self.pending.insert(partial.pid, partial) {
                    warn!(pid = %replaced.pid, call = %replaced.name, "unfinished call overtaken by another one");
                }
            }
            TraceLine::Resumed { call, ret } => match self.pending.remove(&call.pid) {
                Some(mut start) if start.name == call.name => {
                    start.args.extend(call.args);
                    self.push(TraceRecord {
                        pid: call.pid,
                        line: call.line,
                        name: call.name,
                        args: start.args,
                        ret,
                    });
                }
                other => {
                    if let Some(start) = other {
                        self.pending.insert(start.pid, start);
                    }
                    let error = ParseError::new(
                        call.line,
                        format!("<... {} resumed>", call.name),
                        "resumed call without a matching unfinished half",
                    );
                    warn!(line = error.line, reason = %error.reason, "skipping resumed call");
                    self.line_errors.push(error);
                }
            },
            TraceLine::Ignored => {}
        }
    }

    fn push(&mut self, record: TraceRecord) {
        if FORKING_CALLS.contains(&record.name.as_str()) {
            if let Some(child) = record.ret.value().filter(|value| *value > 0) {
                self.parents.insert(Pid::from_raw(child as i32), record.pid);
            }
        }
        let pid = record.pid;
        let slot = match self.index.get(&pid) {
            Some(slot) => *slot,
            None => {
                self.processes.push(ProcessTrace {
                    pid,
                    parent: None,
                    records: Vec::new(),
                });
                self.index.insert(pid, self.processes.len() - 1);
                self.processes.len() - 1
            }
        };
        self.root.get_or_insert(pid);
        self.processes[slot].records.push(record);
    }

    pub fn designate_root(&mut self, pid: Pid) -> Result<(), ConvertError> {
        if !self.index.contains_key(&pid) {
            return Err(ConvertError::UnknownRootPid(pid));
        }
        self.root = Some(pid);
        Ok(())
    }

    pub fn root(&self) -> Option<Pid> {
        self.root
    }

    pub fn get(&self, pid: Pid) -> Option<&ProcessTrace> {
        self.index.get(&pid).map(|slot| &self.processes[*slot])
    }

    pub fn processes(&self) -> impl Iterator<Item = &ProcessTrace> {
        self.processes.iter()
    }

    pub fn record_count(&self) -> usize {
        self.processes.iter().map(|process| process.records.len()).sum()
    }
}
