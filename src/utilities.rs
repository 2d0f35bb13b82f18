use std::{
    collections::HashMap,
    net::Ipv4Addr,
    sync::LazyLock,
};

use nix::errno::Errno;
use syscalls::Sysno;
use tracing::debug;

use crate::{
    auxiliary::{constants::general::MAX_USERLAND_ERRNO, kernel_errno::KernelErrno},
    parser::{Literal, ReturnValue},
    syscall_object::{ErrnoVariant, SyscallResult},
    syscall_skeleton_map::{initialize_constants_map, initialize_skeletons_map},
    types::{SyscallCatalog, SyscallVariant},
};

pub static SYSKELETON_MAP: LazyLock<HashMap<Sysno, Vec<SyscallVariant>>> =
    LazyLock::new(initialize_skeletons_map);
pub static SYSNO_NAMES: LazyLock<HashMap<&'static str, Sysno>> = LazyLock::new(|| {
    SYSKELETON_MAP
        .keys()
        .map(|sysno| (sysno.name(), *sysno))
        .collect()
});
pub static CONSTANTS_MAP: LazyLock<HashMap<&'static str, u64>> =
    LazyLock::new(initialize_constants_map);
pub static ERRNO_NAMES: LazyLock<HashMap<String, Errno>> = LazyLock::new(|| {
    (1..=MAX_USERLAND_ERRNO)
        .map(Errno::from_raw)
        .filter(|errno| *errno != Errno::UnknownErrno)
        .map(|errno| (format!("{errno:?}"), errno))
        .collect()
});

pub fn truncate_to_width(value: u64, width: u8) -> u64 {
    if width >= 64 {
        value
    } else {
        value & ((1u64 << width) - 1)
    }
}

/// Numeric value of a literal, with flag terms OR-ed together and
/// symbolic names looked up in the catalog. Structured literals have none.
pub fn literal_value(literal: &Literal, catalog: &dyn SyscallCatalog) -> Option<u64> {
    match literal {
        Literal::Integer(_) | Literal::SignedInteger(_) | Literal::Null => literal.as_integer(),
        Literal::Flags(terms) => terms.iter().try_fold(0, |reduced, term| {
            literal_value(term, catalog).map(|value| reduced | value)
        }),
        Literal::Identifier(name) => Some(catalog.constant(name).unwrap_or_else(|| {
            debug!(constant = %name, "unknown constant, counting it as 0");
            0
        })),
        Literal::Call { function, args } => helper_value(function, args, catalog),
        Literal::Buffer(_)
        | Literal::Array(_)
        | Literal::Struct(_)
        | Literal::MacAddress(_) => None,
    }
}

// strace's rendering helpers, values stay in host order
fn helper_value(function: &str, args: &[Literal], catalog: &dyn SyscallCatalog) -> Option<u64> {
    match (function, args) {
        ("htons" | "htonl" | "ntohs" | "ntohl" | "htobe16" | "htobe32", [arg]) => {
            literal_value(arg, catalog)
        }
        ("inet_addr", [Literal::Buffer(address)]) => parse_ipv4(&address.decoded),
        _ => {
            debug!(function, "unrecognised helper in trace literal");
            None
        }
    }
}

pub fn parse_ipv4(bytes: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(bytes).ok()?;
    let address: Ipv4Addr = text.parse().ok()?;
    Some(u64::from(u32::from(address)))
}

// every term is either one of `values` or made only of their bits
pub fn flag_terms_known(literal: &Literal, values: &[u64], catalog: &dyn SyscallCatalog) -> bool {
    let mask = values.iter().fold(0, |mask, value| mask | value);
    literal.terms().iter().all(|term| {
        let value = match term {
            Literal::Identifier(name) => catalog.constant(name),
            other => literal_value(other, catalog),
        };
        value.is_some_and(|value| values.contains(&value) || value & !mask == 0)
    })
}

pub fn classify_errno(name: &str) -> ErrnoVariant {
    if let Some(errno) = ERRNO_NAMES.get(name) {
        return ErrnoVariant::Userland(*errno);
    }
    match KernelErrno::from_name(name) {
        Some(kernel_errno) => ErrnoVariant::Kernel(kernel_errno),
        None => ErrnoVariant::Unrecognized(name.to_string()),
    }
}

pub fn interpret_return_value(ret: &ReturnValue) -> SyscallResult {
    match ret {
        ReturnValue::Value(value) if *value >= 0 => SyscallResult::Success(*value),
        failed => SyscallResult::Fail(failed.errno().map(classify_errno)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::QuotedBuffer, syscall_skeleton_map::SkeletonCatalog};

    #[test]
    fn widths_truncate_from_the_top() {
        assert_eq!(truncate_to_width(0x1_0000_0801, 32), 0x801);
        assert_eq!(truncate_to_width(u64::MAX, 16), 0xffff);
        assert_eq!(truncate_to_width(u64::MAX, 64), u64::MAX);
    }

    #[test]
    fn flag_expressions_reduce_through_the_constant_table() {
        let catalog = SkeletonCatalog;
        let flags = Literal::Flags(vec![Literal::Integer(1), Literal::Integer(2048)]);
        assert_eq!(literal_value(&flags, &catalog), Some(0x801));

        let symbolic = Literal::Flags(vec![
            Literal::Identifier("SOCK_STREAM".into()),
            Literal::Identifier("SOCK_CLOEXEC".into()),
        ]);
        assert_eq!(literal_value(&symbolic, &catalog), Some(0x80001));

        let unknown = Literal::Identifier("MADE_UP".into());
        assert_eq!(literal_value(&unknown, &catalog), Some(0));
        assert_eq!(literal_value(&Literal::Array(vec![]), &catalog), None);
    }

    #[test]
    fn helpers_unwrap() {
        let catalog = SkeletonCatalog;
        let port = Literal::Call {
            function: "htons".into(),
            args: vec![Literal::Integer(37957)],
        };
        assert_eq!(literal_value(&port, &catalog), Some(37957));

        let address = Literal::Call {
            function: "inet_addr".into(),
            args: vec![Literal::Buffer(QuotedBuffer {
                raw: "127.0.0.1".into(),
                decoded: b"127.0.0.1".to_vec(),
                truncated: false,
            })],
        };
        assert_eq!(literal_value(&address, &catalog), Some(0x7f00_0001));
    }

    #[test]
    fn flag_terms_are_checked_against_known_values() {
        let catalog = SkeletonCatalog;
        let values = [1, 2, 2048, 524288];
        let known = Literal::Flags(vec![Literal::Integer(1), Literal::Integer(2048)]);
        assert!(flag_terms_known(&known, &values, &catalog));
        assert!(flag_terms_known(&Literal::Integer(0x801), &values, &catalog));
        assert!(!flag_terms_known(&Literal::Integer(4), &values, &catalog));
        assert!(!flag_terms_known(
            &Literal::Identifier("MADE_UP".into()),
            &values,
            &catalog
        ));
    }

    #[test]
    fn errno_names_split_into_userland_and_kernel() {
        assert_eq!(classify_errno("EBADF"), ErrnoVariant::Userland(Errno::EBADF));
        assert_eq!(
            classify_errno("ERESTARTSYS"),
            ErrnoVariant::Kernel(KernelErrno::ERESTARTSYS)
        );
        assert_eq!(
            classify_errno("EWHATEVER"),
            ErrnoVariant::Unrecognized("EWHATEVER".into())
        );
    }

    #[test]
    fn return_values_become_results() {
        assert_eq!(
            interpret_return_value(&ReturnValue::Value(3)),
            SyscallResult::Success(3)
        );
        assert_eq!(
            interpret_return_value(&ReturnValue::Failed {
                value: -1,
                errno: Some("ENOENT".into())
            }),
            SyscallResult::Fail(Some(ErrnoVariant::Userland(Errno::ENOENT)))
        );
        assert_eq!(
            interpret_return_value(&ReturnValue::Unknown { errno: None }),
            SyscallResult::Fail(None)
        );
        assert_eq!(
            interpret_return_value(&ReturnValue::Value(-2)),
            SyscallResult::Fail(None)
        );
    }
}
