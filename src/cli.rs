use std::{path::PathBuf, sync::LazyLock};

use clap::Parser;

pub static TRACE2PROG_ARGS: LazyLock<Trace2ProgArgs> = LazyLock::new(Trace2ProgArgs::parse);
pub static FAILED_ONLY: LazyLock<bool> = LazyLock::new(|| TRACE2PROG_ARGS.failed_only);
pub static SUMMARY: LazyLock<bool> = LazyLock::new(|| TRACE2PROG_ARGS.summary);
pub static ONLY_PID: LazyLock<Option<i32>> = LazyLock::new(|| TRACE2PROG_ARGS.pid);
pub static ROOT_PID: LazyLock<Option<i32>> = LazyLock::new(|| TRACE2PROG_ARGS.root);
pub static OUTPUT_FILE: LazyLock<Option<&'static PathBuf>> =
    LazyLock::new(|| TRACE2PROG_ARGS.output.as_ref());

#[derive(Parser, Debug)]
#[command(
    about = "trace2prog turns strace output into the syscall programs a fuzzer replays.",
    version
)]
pub struct Trace2ProgArgs {
    /// strace output to convert, `-` reads standard input
    pub trace: PathBuf,

    /// only print the program of this process
    #[arg(short = 'p', long = "pid")]
    pub pid: Option<i32>,

    /// process the trace is rooted at, defaults to the first one seen
    #[arg(short = 'r', long = "root")]
    pub root: Option<i32>,

    /// provide a summary table of chosen variants at the end
    #[arg(short = 'c', long)]
    pub summary: bool,

    /// only print failed syscalls
    #[arg(short = 'Z', long = "failed-only")]
    pub failed_only: bool,

    /// write the programs to this file instead of stderr
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let args = Trace2ProgArgs::try_parse_from([
            "trace2prog",
            "-c",
            "-Z",
            "-p",
            "12",
            "--root",
            "10",
            "-o",
            "out.txt",
            "trace.txt",
        ])
        .unwrap();
        assert!(args.summary && args.failed_only);
        assert_eq!(args.pid, Some(12));
        assert_eq!(args.root, Some(10));
        assert_eq!(args.trace, PathBuf::from("trace.txt"));
        assert_eq!(args.output, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn a_trace_is_required() {
        assert!(Trace2ProgArgs::try_parse_from(["trace2prog", "-c"]).is_err());
    }
}
