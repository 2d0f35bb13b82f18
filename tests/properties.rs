//! Properties of the conversion that hold for any input shape: flag
//! reduction, the region allocator and resource handle numbering.

use nix::unistd::Pid;
use proptest::prelude::*;
use trace2prog::{
    convert_trace,
    memory::MemoryAllocator,
    syscall_skeleton_map::FD,
    utilities::literal_value,
    ArgumentValue, ConvertOptions, Literal, MemoryModel, ResourceArg, ResourceTracker,
    SkeletonCatalog,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A flag expression reduces to the OR of its terms, in any order.
    #[test]
    fn flag_expressions_or_reduce(terms in prop::collection::vec(any::<u32>(), 1..8)) {
        let literal = Literal::Flags(terms.iter().map(|term| Literal::Integer(u64::from(*term))).collect());
        let expected = terms.iter().fold(0u64, |reduced, term| reduced | u64::from(*term));
        prop_assert_eq!(literal_value(&literal, &SkeletonCatalog), Some(expected));
    }

    /// Regions handed out within one program only ever move up and never overlap.
    #[test]
    fn regions_are_increasing_and_disjoint(
        lengths in prop::collection::vec(0usize..300, 1..32),
        granule in prop::sample::select(vec![1u64, 8, 64, 4096]),
    ) {
        let mut allocator = MemoryAllocator::new(MemoryModel {
            granule,
            ..MemoryModel::default()
        });
        let regions: Vec<_> = lengths
            .iter()
            .map(|length| allocator.allocate(vec![0xaa; *length]))
            .collect();
        for pair in regions.windows(2) {
            prop_assert!(pair[0].base_address < pair[1].base_address);
            prop_assert!(!pair[0].overlaps(&pair[1]));
            prop_assert!(pair[0].end() <= pair[1].base_address);
        }
    }

    /// Every new binding in a process gets an id above all earlier ones.
    #[test]
    fn handle_ids_strictly_increase(raws in prop::collection::vec(0u64..1024, 1..40)) {
        let mut tracker = ResourceTracker::new();
        let pid = Pid::from_raw(1);
        let mut last = None;
        for raw in raws {
            let handle = tracker.bind_new_resource(pid, raw, &FD).unwrap();
            if let Some(last) = last {
                prop_assert!(handle.id > last);
            }
            last = Some(handle.id);
        }
    }

    /// Until it is rebound, a returned descriptor is always passed on as its handle.
    #[test]
    fn later_uses_reference_the_latest_binding(
        fds in prop::collection::vec(3u64..12, 1..10),
        uses in prop::collection::vec(any::<prop::sample::Index>(), 1..10),
    ) {
        let mut trace = String::new();
        for fd in &fds {
            trace.push_str(&format!("open(\"f\", 0) = {fd}\n"));
        }
        for index in &uses {
            trace.push_str(&format!("close({}) = 0\n", fds[index.index(fds.len())]));
        }
        let conversion = convert_trace(&trace, &SkeletonCatalog, &ConvertOptions::default()).unwrap();
        let program = conversion.root_program().unwrap();
        let (opens, closes) = program.calls.split_at(fds.len());

        for (index, close) in uses.iter().zip(closes) {
            let fd = fds[index.index(fds.len())];
            let latest = opens
                .iter()
                .filter_map(|open| open.ret.as_ref())
                .filter(|handle| handle.raw == fd)
                .last()
                .unwrap();
            match &close.args[0] {
                ArgumentValue::Resource { arg: ResourceArg::Use(handle), .. } => {
                    prop_assert_eq!(handle, latest)
                }
                other => prop_assert!(false, "close took {:?}", other),
            }
        }
    }
}
