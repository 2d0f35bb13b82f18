use nix::unistd::Pid;

/// A trace line the grammar could not make sense of.
///
/// These are recoverable: the line is skipped and collected on the
/// [`Conversion`](crate::program::Conversion).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}: {text}")]
pub struct ParseError {
    pub line: usize,
    pub text: String,
    pub reason: String,
}

impl ParseError {
    pub fn new(line: usize, text: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseError {
            line,
            text: text.into(),
            reason: reason.into(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("trace holds no usable syscall records ({lines} lines read, {errors} unparseable)")]
    EmptyTrace { lines: usize, errors: usize },

    #[error("process {0} does not appear in the trace")]
    UnknownRootPid(Pid),
}
