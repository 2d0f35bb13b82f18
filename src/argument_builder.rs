use nix::unistd::Pid;
use tracing::debug;

use crate::{
    memory::{word_bytes, MemoryAllocator},
    parser::{Literal, StructEntry},
    resource_tracker::{ResourceResolution, ResourceTracker},
    syscall_object::{ArgumentValue, IntKind, ResourceArg, UnionChoice},
    types::{
        BranchSelector, BufferType, FieldType, IntType, ResourceKind, StructType, SyscallCatalog,
        SyscallVariant, UnionType,
    },
    utilities::{literal_value, truncate_to_width},
    variant_resolver::{discriminant, select_branch},
};

// where a value lives: passed in a register, or inside the memory of its parent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Placement {
    Argument,
    Inline,
}

/// Fits the literals of one traced call to the fields of its variant.
pub struct ArgumentBuilder<'a> {
    catalog: &'a dyn SyscallCatalog,
    memory: &'a mut MemoryAllocator,
    tracker: &'a mut ResourceTracker,
    pid: Pid,
    // output resources only bind when the call produced them
    succeeded: bool,
}

impl<'a> ArgumentBuilder<'a> {
    pub fn new(
        catalog: &'a dyn SyscallCatalog,
        memory: &'a mut MemoryAllocator,
        tracker: &'a mut ResourceTracker,
        pid: Pid,
        succeeded: bool,
    ) -> Self {
        ArgumentBuilder {
            catalog,
            memory,
            tracker,
            pid,
            succeeded,
        }
    }

    pub fn build_call(&mut self, variant: &SyscallVariant, args: &[Literal]) -> Vec<ArgumentValue> {
        if args.len() > variant.fields.len() {
            debug!(
                variant = %variant.name,
                surplus = args.len() - variant.fields.len(),
                "dropping literals past the last declared field"
            );
        }
        let mut values: Vec<ArgumentValue> = variant
            .fields
            .iter()
            .enumerate()
            .map(|(position, field)| match args.get(position) {
                Some(literal) => self.build(literal, &field.ty, Placement::Argument),
                None => self.default_value(&field.ty, Placement::Argument),
            })
            .collect();
        recompute_lengths(variant, &mut values);
        values
    }

    pub fn build_argument(&mut self, literal: &Literal, ty: &FieldType) -> ArgumentValue {
        self.build(literal, ty, Placement::Argument)
    }

    fn build(&mut self, literal: &Literal, ty: &FieldType, placement: Placement) -> ArgumentValue {
        match ty {
            FieldType::Int(int) => self.build_integer(literal, ty, *int, IntKind::Plain, placement),
            FieldType::Flags { int, .. } => {
                self.build_integer(literal, ty, *int, IntKind::Flags, placement)
            }
            FieldType::Len { int, .. } => {
                self.build_integer(literal, ty, *int, IntKind::Len, placement)
            }
            FieldType::Const { value, int } => {
                if let Some(traced) = literal_value(literal, self.catalog) {
                    if truncate_to_width(traced, int.width) != truncate_to_width(*value, int.width) {
                        debug!(traced, expected = *value, "constant field traced with another value");
                    }
                }
                integer(*value, *int, IntKind::Const)
            }
            FieldType::Buffer(buffer) => self.build_buffer(literal, ty, buffer, placement),
            FieldType::Ptr { elem, .. } => self.build_pointer(literal, elem),
            FieldType::Struct(layout) => match literal {
                Literal::Struct(entries) => self.build_struct(layout, entries),
                _ => self.degrade(literal, ty, placement),
            },
            FieldType::Union(union) => match literal {
                Literal::Struct(entries) => self.build_union(union, literal, entries),
                _ => self.degrade(literal, ty, placement),
            },
            FieldType::Array { elem, len } => {
                // surplus elements are never built, an output resource among them would bind
                let limit = len.unwrap_or(usize::MAX);
                let elements = match literal {
                    Literal::Array(elements) => elements
                        .iter()
                        .take(limit)
                        .map(|element| self.build(element, elem, Placement::Inline))
                        .collect(),
                    Literal::Struct(entries) if entries.iter().all(|entry| entry.name.is_none()) => {
                        entries
                            .iter()
                            .take(limit)
                            .map(|entry| self.build(&entry.value, elem, Placement::Inline))
                            .collect()
                    }
                    Literal::Buffer(bytes) if elem.is_byte() => bytes
                        .decoded
                        .iter()
                        .take(limit)
                        .map(|byte| self.build(&Literal::Integer(u64::from(*byte)), elem, Placement::Inline))
                        .collect(),
                    _ => return self.degrade(literal, ty, placement),
                };
                self.pad_array(elements, elem, *len)
            }
            FieldType::Resource { kind, dir } => match literal_value(literal, self.catalog) {
                Some(raw) => self.build_resource(raw, *kind, dir.produces()),
                None => self.degrade(literal, ty, placement),
            },
        }
    }

    fn build_integer(
        &mut self,
        literal: &Literal,
        ty: &FieldType,
        int: IntType,
        kind: IntKind,
        placement: Placement,
    ) -> ArgumentValue {
        match literal_value(literal, self.catalog) {
            Some(value) => integer(truncate_to_width(value, int.width), int, kind),
            None => self.degrade(literal, ty, placement),
        }
    }

    fn build_buffer(
        &mut self,
        literal: &Literal,
        ty: &FieldType,
        buffer: &BufferType,
        placement: Placement,
    ) -> ArgumentValue {
        let mut contents = match literal {
            Literal::Buffer(quoted) => quoted.decoded.clone(),
            Literal::MacAddress(address) => address.to_vec(),
            Literal::Array(elements) => elements
                .iter()
                .flat_map(|element| literal_bytes(element, self.catalog))
                .collect(),
            Literal::Null if placement == Placement::Argument => {
                return ArgumentValue::null_pointer();
            }
            // strace printed only where the buffer was
            Literal::Integer(_) | Literal::Null => default_contents(buffer),
            _ => return self.degrade(literal, ty, placement),
        };
        if buffer.kind.requires_nul() && contents.last() != Some(&0) {
            contents.push(0);
        }
        if let Some(fixed_len) = buffer.fixed_len {
            contents.resize(fixed_len, 0);
        }
        self.place_bytes(contents, placement)
    }

    fn place_bytes(&mut self, contents: Vec<u8>, placement: Placement) -> ArgumentValue {
        match placement {
            Placement::Argument => ArgumentValue::Buffer(self.memory.allocate(contents)),
            Placement::Inline => ArgumentValue::Data(contents),
        }
    }

    fn build_pointer(&mut self, literal: &Literal, elem: &FieldType) -> ArgumentValue {
        let pointee = match literal {
            Literal::Integer(_) | Literal::SignedInteger(_) | Literal::Null => {
                if literal.as_integer() == Some(0) {
                    return ArgumentValue::null_pointer();
                }
                self.default_value(elem, Placement::Inline)
            }
            Literal::Array(elements) if elem.is_scalar() && elements.len() == 1 => {
                self.build(&elements[0], elem, Placement::Inline)
            }
            pointee => self.build(pointee, elem, Placement::Inline),
        };
        self.point_at(pointee)
    }

    // the pointee's own pointers were allocated while it was built, it lands after them
    fn point_at(&mut self, pointee: ArgumentValue) -> ArgumentValue {
        let region = self.memory.allocate(pointee.encode());
        ArgumentValue::Pointer {
            region: Some(region),
            pointee: Some(Box::new(pointee)),
        }
    }

    fn build_struct(&mut self, layout: &StructType, entries: &[StructEntry]) -> ArgumentValue {
        let mut slots: Vec<Option<ArgumentValue>> = vec![None; layout.fields.len()];
        for (position, entry) in entries.iter().enumerate() {
            let index = match &entry.name {
                Some(name) => layout.field_index(name),
                None => (position < layout.fields.len()).then_some(position),
            };
            let Some(index) = index else {
                debug!(
                    layout = layout.name,
                    entry = entry.name.as_deref().unwrap_or("<bare>"),
                    "struct entry has no matching field"
                );
                continue;
            };
            slots[index] = Some(self.build(&entry.value, &layout.fields[index].ty, Placement::Inline));
        }
        let fields = layout
            .fields
            .iter()
            .zip(slots)
            .map(|(field, slot)| {
                let value = slot.unwrap_or_else(|| self.default_value(&field.ty, Placement::Inline));
                (field.name, value)
            })
            .collect();
        ArgumentValue::Struct {
            name: layout.name,
            fields,
        }
    }

    fn build_union(
        &mut self,
        union: &UnionType,
        literal: &Literal,
        entries: &[StructEntry],
    ) -> ArgumentValue {
        if let Some(branch) = select_branch(self.catalog, union, entries) {
            let value = self.build(literal, &branch.ty, Placement::Inline);
            return ArgumentValue::Union {
                name: union.name,
                choice: UnionChoice::Branch {
                    name: branch.name,
                    tag: branch.tag,
                },
                value: Box::new(value),
                fixed_size: union.fixed_size,
            };
        }
        let discriminant = match union.selector {
            BranchSelector::FieldValue(name) => discriminant(entries, name)
                .and_then(|value| literal_value(value, self.catalog)),
            BranchSelector::LeadingNul(_) => None,
        };
        debug!(union = union.name, ?discriminant, "unmapped discriminant, keeping raw bytes");
        let bytes = entries
            .iter()
            .flat_map(|entry| literal_bytes(&entry.value, self.catalog))
            .collect();
        ArgumentValue::Union {
            name: union.name,
            choice: UnionChoice::Opaque { discriminant },
            value: Box::new(ArgumentValue::Data(bytes)),
            fixed_size: union.fixed_size,
        }
    }

    fn pad_array(
        &mut self,
        mut elements: Vec<ArgumentValue>,
        elem: &FieldType,
        len: Option<usize>,
    ) -> ArgumentValue {
        if let Some(len) = len {
            while elements.len() < len {
                elements.push(self.default_value(elem, Placement::Inline));
            }
        }
        ArgumentValue::Array(elements)
    }

    fn build_resource(&mut self, raw: u64, kind: &'static ResourceKind, produced: bool) -> ArgumentValue {
        let arg = if produced {
            match self.succeeded {
                true => self
                    .tracker
                    .bind_new_resource(self.pid, raw, kind)
                    .map_or(ResourceArg::Literal(raw), ResourceArg::Produce),
                false => ResourceArg::Literal(raw),
            }
        } else {
            match self.tracker.resolve_argument(self.pid, raw, kind) {
                ResourceResolution::Handle(handle) => ResourceArg::Use(handle),
                ResourceResolution::Literal(raw) => ResourceArg::Literal(raw),
            }
        };
        ArgumentValue::Resource {
            arg,
            width: kind.width,
        }
    }

    fn degrade(&mut self, literal: &Literal, ty: &FieldType, placement: Placement) -> ArgumentValue {
        debug!(?literal, "literal does not fit its field, using the default");
        self.default_value(ty, placement)
    }

    fn default_value(&mut self, ty: &FieldType, placement: Placement) -> ArgumentValue {
        match ty {
            FieldType::Int(int) => integer(int.default, *int, IntKind::Plain),
            FieldType::Flags { int, .. } => integer(int.default, *int, IntKind::Flags),
            FieldType::Len { int, .. } => integer(int.default, *int, IntKind::Len),
            FieldType::Const { value, int } => integer(*value, *int, IntKind::Const),
            FieldType::Buffer(buffer) => {
                let contents = match buffer.fixed_len {
                    Some(fixed_len) => vec![0; fixed_len],
                    None => default_contents(buffer),
                };
                self.place_bytes(contents, placement)
            }
            FieldType::Ptr { .. } => ArgumentValue::null_pointer(),
            FieldType::Struct(layout) => ArgumentValue::Struct {
                name: layout.name,
                fields: layout
                    .fields
                    .iter()
                    .map(|field| (field.name, self.default_value(&field.ty, Placement::Inline)))
                    .collect(),
            },
            FieldType::Union(union) => {
                let (choice, value) = match union.branches.first() {
                    Some(branch) => (
                        UnionChoice::Branch {
                            name: branch.name,
                            tag: branch.tag,
                        },
                        self.default_value(&branch.ty, Placement::Inline),
                    ),
                    None => (
                        UnionChoice::Opaque { discriminant: None },
                        ArgumentValue::Data(Vec::new()),
                    ),
                };
                ArgumentValue::Union {
                    name: union.name,
                    choice,
                    value: Box::new(value),
                    fixed_size: union.fixed_size,
                }
            }
            FieldType::Array { elem, len } => ArgumentValue::Array(
                (0..len.unwrap_or(0))
                    .map(|_| self.default_value(elem, Placement::Inline))
                    .collect(),
            ),
            FieldType::Resource { kind, .. } => ArgumentValue::Resource {
                arg: ResourceArg::Literal(kind.default_value()),
                width: kind.width,
            },
        }
    }
}

fn integer(value: u64, int: IntType, kind: IntKind) -> ArgumentValue {
    ArgumentValue::Integer { value, int, kind }
}

fn default_contents(buffer: &BufferType) -> Vec<u8> {
    match buffer.kind.requires_nul() {
        true => vec![0],
        false => Vec::new(),
    }
}

// raw bytes of a literal no field describes, integers as machine words
fn literal_bytes(literal: &Literal, catalog: &dyn SyscallCatalog) -> Vec<u8> {
    match literal {
        Literal::Buffer(quoted) => quoted.decoded.clone(),
        Literal::MacAddress(address) => address.to_vec(),
        Literal::Array(elements) => elements
            .iter()
            .flat_map(|element| literal_bytes(element, catalog))
            .collect(),
        Literal::Struct(entries) => entries
            .iter()
            .flat_map(|entry| literal_bytes(&entry.value, catalog))
            .collect(),
        numeric => literal_value(numeric, catalog)
            .map(|value| word_bytes(value).to_vec())
            .unwrap_or_default(),
    }
}

fn recompute_lengths(variant: &SyscallVariant, values: &mut [ArgumentValue]) {
    for (index, field) in variant.fields.iter().enumerate() {
        let FieldType::Len { of, int } = &field.ty else {
            continue;
        };
        let Some(size) = variant
            .field_index(of)
            .and_then(|target| values.get(target))
            .and_then(ArgumentValue::measured_size)
        else {
            continue;
        };
        if let Some(ArgumentValue::Integer { value, .. }) = values.get_mut(index) {
            *value = truncate_to_width(size, int.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        memory::MemoryModel,
        parser::{parse_line, QuotedBuffer, TraceLine},
        syscall_skeleton_map::{SkeletonCatalog, FD, SOCK_IN},
    };

    struct Fixture {
        catalog: SkeletonCatalog,
        memory: MemoryAllocator,
        tracker: ResourceTracker,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                catalog: SkeletonCatalog,
                memory: MemoryAllocator::new(MemoryModel::default()),
                tracker: ResourceTracker::new(),
            }
        }

        // builds the line against the named variant
        fn build(&mut self, variant: &str, line: &str, succeeded: bool) -> Vec<ArgumentValue> {
            let TraceLine::Call(record) = parse_line(1, line).unwrap() else {
                panic!("not a complete call: {line}");
            };
            let sysno = self.catalog.lookup(&record.name).unwrap();
            let variant = self
                .catalog
                .variants_for(sysno)
                .iter()
                .find(|candidate| candidate.name == variant)
                .unwrap();
            let mut builder = ArgumentBuilder::new(
                &self.catalog,
                &mut self.memory,
                &mut self.tracker,
                Pid::from_raw(1),
                succeeded,
            );
            builder.build_call(variant, &record.args)
        }
    }

    fn pointee(value: &ArgumentValue) -> &ArgumentValue {
        match value {
            ArgumentValue::Pointer {
                pointee: Some(pointee),
                ..
            } => pointee,
            other => panic!("expected a pointer, got {other:?}"),
        }
    }

    #[test]
    fn strings_gain_a_terminator_and_a_region() {
        let mut fixture = Fixture::new();
        let args = fixture.build("open", "open(\"file\", O_RDWR|O_CREAT, 0644) = 3", true);
        let ArgumentValue::Buffer(path) = &args[0] else {
            panic!("path is passed by reference");
        };
        assert_eq!(path.contents, b"file\0".to_vec());
        assert_eq!(path.base_address, 0x7f00_0000_0000);
        assert!(matches!(args[1], ArgumentValue::Integer { value: 0o102, kind: IntKind::Flags, .. }));
        assert!(matches!(args[2], ArgumentValue::Integer { value: 0o644, .. }));
    }

    #[test]
    fn already_terminated_strings_are_kept() {
        let mut fixture = Fixture::new();
        let args = fixture.build("open", "open(\"file\\0\", 0) = 3", true);
        let ArgumentValue::Buffer(path) = &args[0] else {
            panic!("path is passed by reference");
        };
        assert_eq!(path.length, 5);
    }

    #[test]
    fn lengths_follow_the_measured_argument() {
        let mut fixture = Fixture::new();
        let args = fixture.build("write", "write(1, \"ab\\x00c\", 99) = 4", true);
        assert!(matches!(args[2], ArgumentValue::Integer { value: 4, kind: IntKind::Len, .. }));
        assert!(matches!(
            &args[0],
            ArgumentValue::Resource { arg: ResourceArg::Literal(1), width: 32 }
        ));
    }

    #[test]
    fn output_descriptors_bind_in_declaration_order() {
        let mut fixture = Fixture::new();
        let args = fixture.build("pipe", "pipe([5, 6]) = 0", true);
        let ArgumentValue::Array(pair) = pointee(&args[0]) else {
            panic!("pipe fills an array");
        };
        let ids: Vec<usize> = pair
            .iter()
            .map(|value| match value {
                ArgumentValue::Resource { arg: ResourceArg::Produce(handle), .. } => handle.id,
                other => panic!("expected a produced handle, got {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec![0, 1]);

        let write = fixture.build("write", "write(6, \"x\", 1) = 1", true);
        assert!(matches!(
            &write[0],
            ArgumentValue::Resource { arg: ResourceArg::Use(handle), .. } if handle.id == 1
        ));
    }

    #[test]
    fn short_fixed_arrays_pad_with_defaults() {
        let mut fixture = Fixture::new();
        let args = fixture.build("pipe", "pipe([5]) = 0", true);
        let ArgumentValue::Array(pair) = pointee(&args[0]) else {
            panic!("pipe fills an array");
        };
        assert_eq!(pair.len(), 2);
        assert!(matches!(
            &pair[1],
            ArgumentValue::Resource { arg: ResourceArg::Literal(u64::MAX), width: 32 }
        ));
        assert_eq!(fixture.tracker.handles_created(Pid::from_raw(1)), 1);
    }

    #[test]
    fn surplus_array_elements_are_dropped_before_binding() {
        let mut fixture = Fixture::new();
        let args = fixture.build("pipe", "pipe([5, 6, 7]) = 0", true);
        let ArgumentValue::Array(pair) = pointee(&args[0]) else {
            panic!("pipe fills an array");
        };
        assert_eq!(pair.len(), 2);
        assert_eq!(fixture.tracker.handles_created(Pid::from_raw(1)), 2);

        let write = fixture.build("write", "write(7, \"x\", 1) = 1", true);
        assert!(matches!(
            &write[0],
            ArgumentValue::Resource { arg: ResourceArg::Literal(7), .. }
        ));
    }

    #[test]
    fn failed_calls_produce_nothing() {
        let mut fixture = Fixture::new();
        let args = fixture.build("pipe", "pipe([5, 6]) = -1 EMFILE (Too many open files)", false);
        assert_eq!(fixture.tracker.handles_created(Pid::from_raw(1)), 0);
        let ArgumentValue::Array(pair) = pointee(&args[0]) else {
            panic!("pipe fills an array");
        };
        assert!(pair
            .iter()
            .all(|value| matches!(value, ArgumentValue::Resource { arg: ResourceArg::Literal(_), .. })));
    }

    #[test]
    fn inet_addresses_build_their_branch() {
        let mut fixture = Fixture::new();
        fixture.tracker.bind_new_resource(Pid::from_raw(1), 3, &SOCK_IN);
        let args = fixture.build(
            "connect",
            "connect(3, {sa_family=AF_INET, sin_port=htons(37957), sin_addr=inet_addr(\"127.0.0.1\")}, 16) = 0",
            true,
        );
        let ArgumentValue::Union { choice, value, .. } = pointee(&args[1]) else {
            panic!("generic connect takes a sockaddr union");
        };
        assert_eq!(choice, &UnionChoice::Branch { name: "in", tag: 2 });
        let encoded = value.encode();
        assert_eq!(&encoded[..8], &[2, 0, 0x94, 0x45, 127, 0, 0, 1]);
        assert_eq!(encoded.len(), 16);
        // the union is as large as its biggest member
        assert!(matches!(args[2], ArgumentValue::Integer { value: 128, .. }));
    }

    #[test]
    fn unix_addresses_split_on_a_leading_nul() {
        let mut fixture = Fixture::new();
        let path = fixture.build(
            "bind",
            "bind(3, {sa_family=AF_UNIX, sun_path=\"/tmp/sock\"}, 110) = 0",
            true,
        );
        let ArgumentValue::Union { value: family, .. } = pointee(&path[1]) else {
            panic!("sockaddr union");
        };
        let ArgumentValue::Union { choice, value, .. } = family.as_ref() else {
            panic!("nested unix union");
        };
        assert_eq!(choice, &UnionChoice::Branch { name: "file", tag: 1 });
        assert!(value.encode().ends_with(b"/tmp/sock\0"));

        let hidden = fixture.build(
            "bind",
            "bind(3, {sa_family=AF_UNIX, sun_path=\"\\0hidden\"}, 110) = 0",
            true,
        );
        let ArgumentValue::Union { value: family, .. } = pointee(&hidden[1]) else {
            panic!("sockaddr union");
        };
        assert!(matches!(
            family.as_ref(),
            ArgumentValue::Union { choice: UnionChoice::Branch { name: "abs", .. }, .. }
        ));
    }

    #[test]
    fn netlink_addresses_carry_pid_and_groups() {
        let mut fixture = Fixture::new();
        let args = fixture.build(
            "bind",
            "bind(3, {sa_family=AF_NETLINK, nl_pid=0, nl_groups=00000003}, 12) = 0",
            true,
        );
        let ArgumentValue::Union { choice, value, .. } = pointee(&args[1]) else {
            panic!("sockaddr union");
        };
        assert_eq!(choice, &UnionChoice::Branch { name: "nl", tag: 16 });
        assert_eq!(value.encode(), vec![16, 0, 0, 0, 0, 0, 0, 0, 3, 0, 0, 0]);
    }

    #[test]
    fn unknown_families_stay_opaque() {
        let mut fixture = Fixture::new();
        let args = fixture.build("bind", "bind(3, {sa_family=0x63, sa_data=\"ab\"}, 16) = 0", true);
        let ArgumentValue::Union { choice, value, .. } = pointee(&args[1]) else {
            panic!("sockaddr union");
        };
        assert_eq!(choice, &UnionChoice::Opaque { discriminant: Some(0x63) });
        let mut expected = 0x63u64.to_le_bytes().to_vec();
        expected.extend_from_slice(b"ab");
        assert_eq!(value.as_ref(), &ArgumentValue::Data(expected));
    }

    #[test]
    fn struct_fields_fill_by_name_and_default_when_absent() {
        let mut fixture = Fixture::new();
        let args = fixture.build(
            "ioctl$sock_ifreq",
            "ioctl(3, SIOCGIFINDEX, {ifr_name=\"lo\", bogus=1}) = 0",
            true,
        );
        let ArgumentValue::Struct { fields, .. } = pointee(&args[2]) else {
            panic!("ifreq is a struct");
        };
        assert_eq!(fields[0].0, "ifr_name");
        let mut name = b"lo\0".to_vec();
        name.resize(16, 0);
        assert_eq!(fields[0].1, ArgumentValue::Data(name));
        assert_eq!(fields[1].1, ArgumentValue::Data(vec![0; 24]));
    }

    #[test]
    fn scalar_pointers_unwrap_and_null_stays_null() {
        let mut fixture = Fixture::new();
        let args = fixture.build("ioctl$int_in", "ioctl(5, FIONBIO, [1]) = 0", true);
        assert!(matches!(pointee(&args[2]), ArgumentValue::Integer { value: 1, .. }));

        let null = fixture.build("ioctl$int_in", "ioctl(5, FIONBIO, NULL) = 0", true);
        assert_eq!(null[2], ArgumentValue::null_pointer());
    }

    #[test]
    fn bare_addresses_allocate_default_pointees() {
        let mut fixture = Fixture::new();
        let args = fixture.build(
            "getsockopt$inet_sctp6_SCTP_RESET_STREAMS",
            "getsockopt(-1, 132, 119, 0x200005c0, [14]) = -1 EBADF (Bad file descriptor)",
            false,
        );
        assert!(matches!(
            &args[0],
            ArgumentValue::Resource { arg: ResourceArg::Literal(u64::MAX), .. }
        ));
        let ArgumentValue::Pointer { region: Some(region), .. } = &args[3] else {
            panic!("option value is allocated");
        };
        assert_eq!(region.contents, vec![0; 8]);
    }

    #[test]
    fn misfits_degrade_to_defaults() {
        let catalog = SkeletonCatalog;
        let mut memory = MemoryAllocator::new(MemoryModel::default());
        let mut tracker = ResourceTracker::new();
        let mut builder = ArgumentBuilder::new(&catalog, &mut memory, &mut tracker, Pid::from_raw(1), true);
        let fd = FieldType::Resource {
            kind: &FD,
            dir: crate::types::Direction::In,
        };
        let value = builder.build_argument(&Literal::Struct(vec![]), &fd);
        assert_eq!(
            value,
            ArgumentValue::Resource {
                arg: ResourceArg::Literal(u64::MAX),
                width: 32
            }
        );
        let quoted = Literal::Buffer(QuotedBuffer {
            raw: "x".into(),
            decoded: b"x".to_vec(),
            truncated: false,
        });
        let int = FieldType::Int(IntType::new(32));
        assert!(matches!(builder.build_argument(&quoted, &int), ArgumentValue::Integer { value: 0, .. }));
    }
}
