use syscalls::Sysno;

use crate::utilities::truncate_to_width;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
    InOut,
}

impl Direction {
    pub fn produces(&self) -> bool {
        matches!(self, Direction::Out)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// A kind of kernel object a syscall can hand out and later take back.
///
/// `lineage` runs from the root family down to the kind itself, so
/// `sock_tcp` is `["fd", "sock", "sock_in", "sock_tcp"]`.
#[derive(Debug, PartialEq, Eq)]
pub struct ResourceKind {
    pub name: &'static str,
    pub lineage: &'static [&'static str],
    pub width: u8,
    pub special_values: &'static [u64],
}

impl ResourceKind {
    pub fn family(&self) -> &'static str {
        self.lineage.first().copied().unwrap_or(self.name)
    }

    // self is the same kind as `other` or a refinement of it
    pub fn descends_from(&self, other: &ResourceKind) -> bool {
        self.lineage.starts_with(other.lineage)
    }

    pub fn is_compatible(&self, other: &ResourceKind) -> bool {
        self.descends_from(other) || other.descends_from(self)
    }

    pub fn is_sentinel(&self, raw: u64) -> bool {
        let narrowed = truncate_to_width(raw, self.width);
        raw == u64::MAX
            || narrowed == truncate_to_width(u64::MAX, self.width)
            || self
                .special_values
                .iter()
                .any(|special| truncate_to_width(*special, self.width) == narrowed)
    }

    pub fn default_value(&self) -> u64 {
        self.special_values.first().copied().unwrap_or(u64::MAX)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntType {
    pub width: u8,
    pub endianness: Endianness,
    pub default: u64,
}

impl IntType {
    pub const fn new(width: u8) -> Self {
        IntType {
            width,
            endianness: Endianness::Little,
            default: 0,
        }
    }

    pub const fn big_endian(width: u8) -> Self {
        IntType {
            width,
            endianness: Endianness::Big,
            default: 0,
        }
    }

    pub fn bytes(&self) -> usize {
        usize::from(self.width / 8)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Blob,
    CString,
    Filename,
}

impl BufferKind {
    pub fn requires_nul(&self) -> bool {
        matches!(self, BufferKind::CString | BufferKind::Filename)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BufferType {
    pub kind: BufferKind,
    pub fixed_len: Option<usize>,
    pub dir: Direction,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StructType {
    pub name: &'static str,
    pub fields: Vec<Field>,
}

impl StructType {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }
}

/// How a union literal names the branch it was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchSelector {
    // the numeric value of this struct entry is the branch tag
    FieldValue(&'static str),
    // a leading NUL in this buffer entry selects the abstract branch
    LeadingNul(&'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnionBranch {
    pub name: &'static str,
    pub tag: u64,
    pub ty: FieldType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnionType {
    pub name: &'static str,
    pub selector: BranchSelector,
    pub branches: Vec<UnionBranch>,
    // None when the union is as large as its chosen branch
    pub fixed_size: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldType {
    Int(IntType),
    Const { value: u64, int: IntType },
    Flags { values: &'static [u64], int: IntType },
    Len { of: &'static str, int: IntType },
    Buffer(BufferType),
    Ptr { elem: Box<FieldType>, dir: Direction },
    Struct(StructType),
    Union(UnionType),
    Array { elem: Box<FieldType>, len: Option<usize> },
    Resource { kind: &'static ResourceKind, dir: Direction },
}

impl FieldType {
    pub fn int_type(&self) -> Option<IntType> {
        match self {
            FieldType::Int(int)
            | FieldType::Const { int, .. }
            | FieldType::Flags { int, .. }
            | FieldType::Len { int, .. } => Some(*int),
            _ => None,
        }
    }

    // what a `[value]` literal unwraps into when it stands for a pointer to this type
    pub fn is_scalar(&self) -> bool {
        self.int_type().is_some() || matches!(self, FieldType::Resource { .. })
    }

    pub fn is_byte(&self) -> bool {
        self.int_type().is_some_and(|int| int.width == 8)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyscallVariant {
    pub name: String,
    pub sysno: Sysno,
    pub fields: Vec<Field>,
    pub ret: Option<&'static ResourceKind>,
}

impl SyscallVariant {
    pub fn is_base(&self) -> bool {
        !self.name.contains('$')
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }
}

/// Read-only view of a syscall descriptor corpus.
pub trait SyscallCatalog {
    fn lookup(&self, name: &str) -> Option<Sysno>;

    /// All variants sharing one syscall number, in declaration order.
    fn variants_for(&self, sysno: Sysno) -> &[SyscallVariant];

    fn constant(&self, name: &str) -> Option<u64>;

    fn branch_for<'u>(&self, union: &'u UnionType, tag: u64) -> Option<&'u UnionBranch> {
        union.branches.iter().find(|branch| branch.tag == tag)
    }

    fn base_variant(&self, sysno: Sysno) -> Option<&SyscallVariant> {
        let variants = self.variants_for(sysno);
        variants
            .iter()
            .find(|variant| variant.is_base())
            .or_else(|| variants.first())
    }
}
