//! Converts strace output into typed syscall programs.
//!
//! Each traced process becomes a [`Program`]: its calls resolved to the most
//! specific syscall variant of a [`SyscallCatalog`], their literals built into
//! typed [`ArgumentValue`]s laid out in a simulated data area, and the
//! descriptors flowing between calls tracked as symbolic resource handles.

pub mod argument_builder;
pub mod auxiliary;
pub mod error;
pub mod memory;
pub mod parser;
pub mod program;
pub mod resource_tracker;
pub mod syscall_object;
pub mod syscall_skeleton_map;
pub mod trace_tree;
pub mod types;
pub mod utilities;
pub mod variant_resolver;

pub use error::{ConvertError, ParseError};
pub use memory::{MemoryModel, MemoryRegion};
pub use parser::{Literal, ReturnValue, TraceRecord};
pub use program::{convert_trace, Conversion, ConvertOptions, Program, ProgramBuilder};
pub use resource_tracker::{ResourceHandle, ResourceTracker};
pub use syscall_object::{
    ArgumentValue, ErrnoVariant, IntKind, ResolvedCall, ResourceArg, SyscallResult, UnionChoice,
};
pub use syscall_skeleton_map::SkeletonCatalog;
pub use trace_tree::{ProcessTrace, TraceTree};
pub use types::{FieldType, SyscallCatalog, SyscallVariant};
