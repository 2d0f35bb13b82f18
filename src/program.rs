use nix::unistd::Pid;
use tracing::{debug, info, warn};

use crate::{
    argument_builder::ArgumentBuilder,
    error::{ConvertError, ParseError},
    memory::{MemoryAllocator, MemoryModel, MemoryRegion},
    parser::TraceRecord,
    resource_tracker::{ResourceHandle, ResourceTracker},
    syscall_object::ResolvedCall,
    trace_tree::{ProcessTrace, TraceTree},
    types::SyscallCatalog,
    utilities::interpret_return_value,
    variant_resolver::resolve_variant,
};

#[derive(Clone, Copy, Debug, Default)]
pub struct ConvertOptions {
    // defaults to the first process seen in the trace
    pub root_pid: Option<Pid>,
    pub memory: MemoryModel,
}

/// The calls of one traced process, ready for a serializer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    pub pid: Pid,
    pub parent: Option<Pid>,
    pub calls: Vec<ResolvedCall>,
}

impl Program {
    pub fn regions(&self) -> Vec<&MemoryRegion> {
        self.calls.iter().flat_map(ResolvedCall::regions).collect()
    }

    pub fn handles_created(&self) -> Vec<&ResourceHandle> {
        self.calls.iter().flat_map(ResolvedCall::produced).collect()
    }
}

/// Converts one process trace, with its own address space and resource bindings.
pub struct ProgramBuilder<'c> {
    catalog: &'c dyn SyscallCatalog,
    memory: MemoryAllocator,
    tracker: ResourceTracker,
}

impl<'c> ProgramBuilder<'c> {
    pub fn new(catalog: &'c dyn SyscallCatalog, options: &ConvertOptions) -> Self {
        ProgramBuilder {
            catalog,
            memory: MemoryAllocator::new(options.memory),
            tracker: ResourceTracker::new(),
        }
    }

    pub fn build(mut self, process: &ProcessTrace) -> Program {
        let calls: Vec<ResolvedCall> = process
            .records
            .iter()
            .filter_map(|record| self.resolve_call(process.pid, record))
            .collect();
        info!(
            pid = %process.pid,
            records = process.records.len(),
            calls = calls.len(),
            handles = self.tracker.handles_created(process.pid),
            "converted process"
        );
        Program {
            pid: process.pid,
            parent: process.parent,
            calls,
        }
    }

    fn resolve_call(&mut self, pid: Pid, record: &TraceRecord) -> Option<ResolvedCall> {
        let Some(sysno) = self.catalog.lookup(&record.name) else {
            warn!(line = record.line, call = %record.name, "syscall not in the catalog, dropping it");
            return None;
        };
        let Some(choice) = resolve_variant(self.catalog, sysno, &record.args, &self.tracker, pid)
        else {
            warn!(line = record.line, call = %record.name, "catalog has no descriptor for syscall");
            return None;
        };
        let variant = choice.variant;
        debug!(line = record.line, variant = %variant.name, score = choice.score, "variant chosen");

        let result = interpret_return_value(&record.ret);
        let succeeded = !record.ret.is_failure() && record.ret.value().is_some_and(|value| value >= 0);
        let args = ArgumentBuilder::new(
            self.catalog,
            &mut self.memory,
            &mut self.tracker,
            pid,
            succeeded,
        )
        .build_call(variant, &record.args);

        let ret = match (variant.ret, record.ret.value()) {
            (Some(kind), Some(value)) if succeeded => {
                self.tracker.bind_new_resource(pid, value as u64, kind)
            }
            _ => None,
        };
        Some(ResolvedCall {
            sysno,
            variant: variant.name.clone(),
            args,
            ret,
            result,
            line: record.line,
            fallback: choice.fallback,
        })
    }
}

#[derive(Debug)]
pub struct Conversion {
    pub root: Pid,
    // ordered by pid
    pub programs: Vec<Program>,
    pub line_errors: Vec<ParseError>,
}

impl Conversion {
    pub fn program(&self, pid: Pid) -> Option<&Program> {
        self.programs.iter().find(|program| program.pid == pid)
    }

    pub fn root_program(&self) -> Option<&Program> {
        self.program(self.root)
    }

    /// Processes forked by `pid`, in pid order.
    pub fn children(&self, pid: Pid) -> Vec<Pid> {
        self.programs
            .iter()
            .filter(|program| program.parent == Some(pid))
            .map(|program| program.pid)
            .collect()
    }
}

/// Parses `text` and converts every process in it.
///
/// Malformed lines are skipped and reported in [`Conversion::line_errors`];
/// only a trace without a single usable record fails.
pub fn convert_trace(
    text: &str,
    catalog: &dyn SyscallCatalog,
    options: &ConvertOptions,
) -> Result<Conversion, ConvertError> {
    let mut tree = TraceTree::parse(text);
    if let Some(pid) = options.root_pid.filter(|_| tree.record_count() > 0) {
        tree.designate_root(pid)?;
    }
    let Some(root) = tree.root().filter(|_| tree.record_count() > 0) else {
        return Err(ConvertError::EmptyTrace {
            lines: text.lines().count(),
            errors: tree.line_errors.len(),
        });
    };

    let mut programs: Vec<Program> = tree
        .processes()
        .map(|process| ProgramBuilder::new(catalog, options).build(process))
        .collect();
    programs.sort_by_key(|program| program.pid.as_raw());

    Ok(Conversion {
        root,
        programs,
        line_errors: tree.line_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auxiliary::constants::general::IMPLICIT_PID,
        syscall_object::{ArgumentValue, ResourceArg, SyscallResult},
        syscall_skeleton_map::SkeletonCatalog,
    };

    fn convert(text: &str) -> Conversion {
        convert_trace(text, &SkeletonCatalog, &ConvertOptions::default()).unwrap()
    }

    #[test]
    fn returned_descriptors_flow_into_later_calls() {
        let conversion = convert("open(\"file\", 66) = 3\nwrite(3, \"somedata\", 8) = 8\n");
        assert_eq!(conversion.root, Pid::from_raw(IMPLICIT_PID));
        let program = conversion.root_program().unwrap();
        assert_eq!(program.calls.len(), 2);

        let opened = program.calls[0].ret.clone().unwrap();
        assert_eq!(opened.id, 0);
        assert!(matches!(
            &program.calls[1].args[0],
            ArgumentValue::Resource { arg: ResourceArg::Use(handle), .. } if *handle == opened
        ));
    }

    #[test]
    fn children_come_from_fork_results() {
        let conversion = convert(
            "10 clone(child_stack=NULL, flags=SIGCHLD) = 11\n\
             11 getpid() = 11\n\
             10 fork() = -1 EAGAIN (Resource temporarily unavailable)\n",
        );
        assert_eq!(conversion.children(Pid::from_raw(10)), vec![Pid::from_raw(11)]);
        assert!(conversion.children(Pid::from_raw(11)).is_empty());
    }

    #[test]
    fn failed_calls_are_kept_without_binding() {
        let conversion = convert(
            "open(\"missing\", 0) = -1 ENOENT (No such file or directory)\n\
             close(3) = -1 EBADF (Bad file descriptor)\n",
        );
        let program = conversion.root_program().unwrap();
        assert_eq!(program.calls.len(), 2);
        assert!(program.calls.iter().all(ResolvedCall::failed));
        assert!(program.handles_created().is_empty());
        assert!(matches!(program.calls[0].result, SyscallResult::Fail(Some(_))));
    }

    #[test]
    fn unknown_calls_are_dropped() {
        let conversion = convert("frobnicate(1) = 0\ngetpid() = 42\n");
        let program = conversion.root_program().unwrap();
        let names: Vec<&str> = program.calls.iter().map(|call| call.variant.as_str()).collect();
        assert_eq!(names, vec!["getpid"]);
    }

    #[test]
    fn every_process_gets_its_own_address_space() {
        let conversion = convert(
            "20 open(\"a\", 0) = 3\n\
             10 open(\"b\", 0) = 3\n",
        );
        let pids: Vec<i32> = conversion.programs.iter().map(|program| program.pid.as_raw()).collect();
        assert_eq!(pids, vec![10, 20]);
        assert_eq!(conversion.root, Pid::from_raw(20));
        for program in &conversion.programs {
            assert_eq!(program.regions()[0].base_address, MemoryModel::default().base_address);
            assert_eq!(program.calls[0].ret.as_ref().map(|handle| handle.id), Some(0));
        }
    }

    #[test]
    fn empty_and_root_errors_are_fatal() {
        let catalog = SkeletonCatalog;
        let options = ConvertOptions::default();
        assert!(matches!(
            convert_trace("garbage\n+++ exited with 0 +++\n", &catalog, &options),
            Err(ConvertError::EmptyTrace { lines: 2, errors: 1 })
        ));
        let pinned = ConvertOptions {
            root_pid: Some(Pid::from_raw(7)),
            ..ConvertOptions::default()
        };
        assert!(matches!(
            convert_trace("5 getpid() = 5\n", &catalog, &pinned),
            Err(ConvertError::UnknownRootPid(_))
        ));
    }
}
