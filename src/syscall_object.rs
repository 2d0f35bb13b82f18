use std::fmt::Display;

use nix::errno::Errno;
use syscalls::Sysno;

use crate::{
    auxiliary::kernel_errno::KernelErrno,
    memory::{poke, word_bytes, MemoryRegion},
    resource_tracker::ResourceHandle,
    types::{Endianness, IntType},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrnoVariant {
    Userland(Errno),
    Kernel(KernelErrno),
    Unrecognized(String),
}

impl Display for ErrnoVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrnoVariant::Userland(errno) => write!(f, "{errno:?}: {}", errno.desc()),
            ErrnoVariant::Kernel(kernel_errno) => write!(f, "{kernel_errno}"),
            ErrnoVariant::Unrecognized(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyscallResult {
    Success(i64),
    Fail(Option<ErrnoVariant>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntKind {
    Plain,
    Const,
    Flags,
    Len,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceArg {
    Use(ResourceHandle),
    Produce(ResourceHandle),
    Literal(u64),
}

impl ResourceArg {
    pub fn raw(&self) -> u64 {
        match self {
            ResourceArg::Use(handle) | ResourceArg::Produce(handle) => handle.raw,
            ResourceArg::Literal(raw) => *raw,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnionChoice {
    Branch { name: &'static str, tag: u64 },
    // no branch for this discriminant, the literal's bytes are kept as they were
    Opaque { discriminant: Option<u64> },
}

/// A literal after it was fitted to its field descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgumentValue {
    Integer {
        value: u64,
        int: IntType,
        kind: IntKind,
    },
    Resource {
        arg: ResourceArg,
        width: u8,
    },
    // buffer stored inside its parent
    Data(Vec<u8>),
    // buffer passed by reference
    Buffer(MemoryRegion),
    Pointer {
        region: Option<MemoryRegion>,
        pointee: Option<Box<ArgumentValue>>,
    },
    Struct {
        name: &'static str,
        fields: Vec<(&'static str, ArgumentValue)>,
    },
    Union {
        name: &'static str,
        choice: UnionChoice,
        value: Box<ArgumentValue>,
        fixed_size: Option<usize>,
    },
    Array(Vec<ArgumentValue>),
}

fn int_bytes(value: u64, width: u8, endianness: Endianness) -> Vec<u8> {
    let size = usize::from(width / 8).min(8);
    let mut bytes = value.to_le_bytes()[..size].to_vec();
    if endianness == Endianness::Big {
        bytes.reverse();
    }
    bytes
}

impl ArgumentValue {
    pub fn null_pointer() -> Self {
        ArgumentValue::Pointer {
            region: None,
            pointee: None,
        }
    }

    /// The bytes this value occupies in its parent, packed.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ArgumentValue::Integer { value, int, .. } => {
                int_bytes(*value, int.width, int.endianness)
            }
            ArgumentValue::Resource { arg, width } => {
                int_bytes(arg.raw(), *width, Endianness::Little)
            }
            ArgumentValue::Data(bytes) => bytes.clone(),
            ArgumentValue::Buffer(region) => word_bytes(region.base_address).to_vec(),
            ArgumentValue::Pointer { region, .. } => {
                word_bytes(region.as_ref().map_or(0, |region| region.base_address)).to_vec()
            }
            ArgumentValue::Struct { fields, .. } => {
                let mut bytes = Vec::new();
                let mut offset = 0;
                for (_, field) in fields {
                    let encoded = field.encode();
                    poke(&mut bytes, offset, &encoded);
                    offset += encoded.len();
                }
                bytes
            }
            ArgumentValue::Union {
                value, fixed_size, ..
            } => {
                let mut bytes = value.encode();
                if let Some(size) = fixed_size {
                    bytes.resize(*size, 0);
                }
                bytes
            }
            ArgumentValue::Array(elements) => {
                elements.iter().flat_map(ArgumentValue::encode).collect()
            }
        }
    }

    /// Byte size of what a `Len` field pointing here measures.
    pub fn measured_size(&self) -> Option<u64> {
        match self {
            ArgumentValue::Buffer(region) => Some(region.length),
            ArgumentValue::Pointer {
                region: Some(region),
                ..
            } => Some(region.length),
            ArgumentValue::Pointer { region: None, .. } => None,
            ArgumentValue::Data(bytes) => Some(bytes.len() as u64),
            ArgumentValue::Array(_) | ArgumentValue::Struct { .. } | ArgumentValue::Union { .. } => {
                Some(self.encode().len() as u64)
            }
            ArgumentValue::Integer { .. } | ArgumentValue::Resource { .. } => None,
        }
    }

    fn visit<'a>(&'a self, on_value: &mut impl FnMut(&'a ArgumentValue)) {
        on_value(self);
        match self {
            ArgumentValue::Pointer {
                pointee: Some(pointee),
                ..
            } => pointee.visit(on_value),
            ArgumentValue::Struct { fields, .. } => {
                fields.iter().for_each(|(_, field)| field.visit(on_value))
            }
            ArgumentValue::Union { value, .. } => value.visit(on_value),
            ArgumentValue::Array(elements) => {
                elements.iter().for_each(|element| element.visit(on_value))
            }
            _ => {}
        }
    }

    pub fn regions(&self) -> Vec<&MemoryRegion> {
        let mut regions = Vec::new();
        self.visit(&mut |value| match value {
            ArgumentValue::Buffer(region)
            | ArgumentValue::Pointer {
                region: Some(region),
                ..
            } => regions.push(region),
            _ => {}
        });
        regions
    }

    pub fn resources(&self) -> Vec<&ResourceArg> {
        let mut resources = Vec::new();
        self.visit(&mut |value| {
            if let ArgumentValue::Resource { arg, .. } = value {
                resources.push(arg);
            }
        });
        resources
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedCall {
    pub sysno: Sysno,
    pub variant: String,
    pub args: Vec<ArgumentValue>,
    pub ret: Option<ResourceHandle>,
    pub result: SyscallResult,
    pub line: usize,
    // no variant admitted the literals, the base descriptor took them best-effort
    pub fallback: bool,
}

impl ResolvedCall {
    pub fn failed(&self) -> bool {
        matches!(self.result, SyscallResult::Fail(_))
    }

    pub fn errno(&self) -> Option<&ErrnoVariant> {
        match &self.result {
            SyscallResult::Fail(errno) => errno.as_ref(),
            SyscallResult::Success(_) => None,
        }
    }

    /// Handles this call created, output arguments first, then the return value.
    pub fn produced(&self) -> Vec<&ResourceHandle> {
        let mut produced: Vec<&ResourceHandle> = self
            .args
            .iter()
            .flat_map(ArgumentValue::resources)
            .filter_map(|arg| match arg {
                ResourceArg::Produce(handle) => Some(handle),
                _ => None,
            })
            .collect();
        produced.extend(self.ret.as_ref());
        produced
    }

    pub fn uses(&self) -> Vec<&ResourceHandle> {
        self.args
            .iter()
            .flat_map(ArgumentValue::resources)
            .filter_map(|arg| match arg {
                ResourceArg::Use(handle) => Some(handle),
                _ => None,
            })
            .collect()
    }

    pub fn regions(&self) -> Vec<&MemoryRegion> {
        self.args.iter().flat_map(ArgumentValue::regions).collect()
    }
}
