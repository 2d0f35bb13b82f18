use std::collections::HashMap;

use nix::libc;
use syscalls::Sysno;

use crate::{
    auxiliary::constants::{
        general::{UNIX_ABSTRACT_TAG, UNIX_PATH_TAG},
        ioctl::{
            FIOASYNC, FIONBIO, SIOCGIFFLAGS, SIOCGIFHWADDR, SIOCGIFINDEX, SIOCGIFMTU, SIOCGIFNAME,
            SIOCSIFFLAGS,
        },
        ioprio::{IOPRIO_WHO_PGRP, IOPRIO_WHO_PROCESS, IOPRIO_WHO_USER},
        net::{CAN_RAW, ETH_P_ALL_BE, SCTP_RESET_STREAMS, SOCK_PACKET, SOL_SCTP},
    },
    types::{
        BranchSelector, BufferKind, BufferType, Direction, Field, FieldType, IntType,
        ResourceKind, StructType, SyscallCatalog, SyscallVariant, UnionBranch, UnionType,
    },
    utilities::{CONSTANTS_MAP, SYSKELETON_MAP, SYSNO_NAMES},
};

const AT_FDCWD: u64 = libc::AT_FDCWD as u64;

pub static FD: ResourceKind = ResourceKind {
    name: "fd",
    lineage: &["fd"],
    width: 32,
    special_values: &[u64::MAX, AT_FDCWD],
};
pub static FD_INOTIFY: ResourceKind = ResourceKind {
    name: "fd_inotify",
    lineage: &["fd", "fd_inotify"],
    width: 32,
    special_values: &[u64::MAX],
};
pub static SOCK: ResourceKind = ResourceKind {
    name: "sock",
    lineage: &["fd", "sock"],
    width: 32,
    special_values: &[u64::MAX],
};
pub static SOCK_UNIX: ResourceKind = ResourceKind {
    name: "sock_unix",
    lineage: &["fd", "sock", "sock_unix"],
    width: 32,
    special_values: &[u64::MAX],
};
pub static SOCK_IN: ResourceKind = ResourceKind {
    name: "sock_in",
    lineage: &["fd", "sock", "sock_in"],
    width: 32,
    special_values: &[u64::MAX],
};
pub static SOCK_TCP: ResourceKind = ResourceKind {
    name: "sock_tcp",
    lineage: &["fd", "sock", "sock_in", "sock_tcp"],
    width: 32,
    special_values: &[u64::MAX],
};
pub static SOCK_UDP: ResourceKind = ResourceKind {
    name: "sock_udp",
    lineage: &["fd", "sock", "sock_in", "sock_udp"],
    width: 32,
    special_values: &[u64::MAX],
};
pub static SOCK_IN6: ResourceKind = ResourceKind {
    name: "sock_in6",
    lineage: &["fd", "sock", "sock_in6"],
    width: 32,
    special_values: &[u64::MAX],
};
pub static SOCK_SCTP6: ResourceKind = ResourceKind {
    name: "sock_sctp6",
    lineage: &["fd", "sock", "sock_in6", "sock_sctp6"],
    width: 32,
    special_values: &[u64::MAX],
};
pub static SOCK_PACKET_KIND: ResourceKind = ResourceKind {
    name: "sock_packet",
    lineage: &["fd", "sock", "sock_packet"],
    width: 32,
    special_values: &[u64::MAX],
};
pub static SOCK_NETLINK: ResourceKind = ResourceKind {
    name: "sock_netlink",
    lineage: &["fd", "sock", "sock_netlink"],
    width: 32,
    special_values: &[u64::MAX],
};
pub static SOCK_CAN: ResourceKind = ResourceKind {
    name: "sock_can",
    lineage: &["fd", "sock", "sock_can"],
    width: 32,
    special_values: &[u64::MAX],
};
pub static INOTIFY_WD: ResourceKind = ResourceKind {
    name: "inotify_wd",
    lineage: &["inotify_wd"],
    width: 32,
    special_values: &[u64::MAX],
};
// 0 names the calling process, never a child
pub static PID: ResourceKind = ResourceKind {
    name: "pid",
    lineage: &["pid"],
    width: 32,
    special_values: &[0, u64::MAX],
};
pub static SHMID: ResourceKind = ResourceKind {
    name: "shmid",
    lineage: &["ipc", "shmid"],
    width: 32,
    special_values: &[u64::MAX],
};

const OPEN_FLAGS: &[u64] = &[
    libc::O_RDONLY as u64,
    libc::O_WRONLY as u64,
    libc::O_RDWR as u64,
    libc::O_CREAT as u64,
    libc::O_EXCL as u64,
    libc::O_NOCTTY as u64,
    libc::O_TRUNC as u64,
    libc::O_APPEND as u64,
    libc::O_NONBLOCK as u64,
    libc::O_DSYNC as u64,
    libc::O_SYNC as u64,
    libc::O_DIRECT as u64,
    libc::O_DIRECTORY as u64,
    libc::O_NOFOLLOW as u64,
    libc::O_CLOEXEC as u64,
    libc::O_PATH as u64,
    libc::O_TMPFILE as u64,
];
const OPEN_MODES: &[u64] = &[
    libc::S_IRUSR as u64,
    libc::S_IWUSR as u64,
    libc::S_IXUSR as u64,
    libc::S_IRGRP as u64,
    libc::S_IWGRP as u64,
    libc::S_IXGRP as u64,
    libc::S_IROTH as u64,
    libc::S_IWOTH as u64,
    libc::S_IXOTH as u64,
];
const PIPE_FLAGS: &[u64] = &[
    libc::O_NONBLOCK as u64,
    libc::O_CLOEXEC as u64,
    libc::O_DIRECT as u64,
];
const DUP3_FLAGS: &[u64] = &[libc::O_CLOEXEC as u64];
const SEEK_WHENCE: &[u64] = &[
    libc::SEEK_SET as u64,
    libc::SEEK_CUR as u64,
    libc::SEEK_END as u64,
    libc::SEEK_DATA as u64,
    libc::SEEK_HOLE as u64,
];
const SOCKET_DOMAINS: &[u64] = &[
    libc::AF_UNIX as u64,
    libc::AF_INET as u64,
    libc::AF_INET6 as u64,
    libc::AF_NETLINK as u64,
    libc::AF_PACKET as u64,
    libc::AF_CAN as u64,
];
const SOCKET_TYPES: &[u64] = &[
    libc::SOCK_STREAM as u64,
    libc::SOCK_DGRAM as u64,
    libc::SOCK_RAW as u64,
    libc::SOCK_SEQPACKET as u64,
    SOCK_PACKET,
    libc::SOCK_NONBLOCK as u64,
    libc::SOCK_CLOEXEC as u64,
];
const UNIX_SOCKET_TYPES: &[u64] = &[
    libc::SOCK_STREAM as u64,
    libc::SOCK_DGRAM as u64,
    libc::SOCK_SEQPACKET as u64,
    libc::SOCK_NONBLOCK as u64,
    libc::SOCK_CLOEXEC as u64,
];
const PACKET_SOCKET_TYPES: &[u64] = &[
    libc::SOCK_DGRAM as u64,
    libc::SOCK_RAW as u64,
    SOCK_PACKET,
    libc::SOCK_NONBLOCK as u64,
    libc::SOCK_CLOEXEC as u64,
];
const SOCKOPT_SOCK_INT: &[u64] = &[
    libc::SO_REUSEADDR as u64,
    libc::SO_KEEPALIVE as u64,
    libc::SO_BROADCAST as u64,
    libc::SO_SNDBUF as u64,
    libc::SO_RCVBUF as u64,
    libc::SO_REUSEPORT as u64,
];
const IOCTL_INT_IN: &[u64] = &[FIONBIO, FIOASYNC];
const SOCKIOS_IFREQ: &[u64] = &[
    SIOCGIFNAME,
    SIOCGIFFLAGS,
    SIOCSIFFLAGS,
    SIOCGIFMTU,
    SIOCGIFHWADDR,
    SIOCGIFINDEX,
];
const INOTIFY_INIT_FLAGS: &[u64] = &[libc::IN_NONBLOCK as u64, libc::IN_CLOEXEC as u64];
const INOTIFY_MASK: &[u64] = &[
    libc::IN_ACCESS as u64,
    libc::IN_MODIFY as u64,
    libc::IN_ATTRIB as u64,
    libc::IN_CLOSE_WRITE as u64,
    libc::IN_CLOSE_NOWRITE as u64,
    libc::IN_OPEN as u64,
    libc::IN_MOVED_FROM as u64,
    libc::IN_MOVED_TO as u64,
    libc::IN_CREATE as u64,
    libc::IN_DELETE as u64,
    libc::IN_DELETE_SELF as u64,
    libc::IN_MOVE_SELF as u64,
];
const IOPRIO_WHICH: &[u64] = &[IOPRIO_WHO_PROCESS, IOPRIO_WHO_PGRP, IOPRIO_WHO_USER];
const SHMGET_FLAGS: &[u64] = &[
    libc::IPC_CREAT as u64,
    libc::IPC_EXCL as u64,
    libc::S_IRUSR as u64,
    libc::S_IWUSR as u64,
];
const SIGNALS: &[u64] = &[
    libc::SIGHUP as u64,
    libc::SIGINT as u64,
    libc::SIGQUIT as u64,
    libc::SIGKILL as u64,
    libc::SIGUSR1 as u64,
    libc::SIGUSR2 as u64,
    libc::SIGTERM as u64,
    libc::SIGCHLD as u64,
    libc::SIGCONT as u64,
    libc::SIGSTOP as u64,
];
const CLONE_FLAGS: &[u64] = &[
    libc::CLONE_VM as u64,
    libc::CLONE_FS as u64,
    libc::CLONE_FILES as u64,
    libc::CLONE_SIGHAND as u64,
    libc::CLONE_THREAD as u64,
    libc::CLONE_PARENT_SETTID as u64,
    libc::CLONE_CHILD_CLEARTID as u64,
    libc::CLONE_CHILD_SETTID as u64,
    libc::CLONE_SETTLS as u64,
    libc::SIGCHLD as u64,
];

fn int(width: u8) -> FieldType {
    FieldType::Int(IntType::new(width))
}

fn int_be(width: u8) -> FieldType {
    FieldType::Int(IntType::big_endian(width))
}

fn konst(value: u64, width: u8) -> FieldType {
    FieldType::Const {
        value,
        int: IntType::new(width),
    }
}

fn flags(values: &'static [u64], width: u8) -> FieldType {
    FieldType::Flags {
        values,
        int: IntType::new(width),
    }
}

fn len(of: &'static str, width: u8) -> FieldType {
    FieldType::Len {
        of,
        int: IntType::new(width),
    }
}

fn resource(kind: &'static ResourceKind) -> FieldType {
    FieldType::Resource {
        kind,
        dir: Direction::In,
    }
}

fn resource_out(kind: &'static ResourceKind) -> FieldType {
    FieldType::Resource {
        kind,
        dir: Direction::Out,
    }
}

fn ptr(dir: Direction, elem: FieldType) -> FieldType {
    FieldType::Ptr {
        elem: Box::new(elem),
        dir,
    }
}

fn buffer(kind: BufferKind, dir: Direction, fixed_len: Option<usize>) -> FieldType {
    FieldType::Buffer(BufferType {
        kind,
        fixed_len,
        dir,
    })
}

fn filename() -> FieldType {
    buffer(BufferKind::Filename, Direction::In, None)
}

fn array(elem: FieldType, len: Option<usize>) -> FieldType {
    FieldType::Array {
        elem: Box::new(elem),
        len,
    }
}

fn field(name: &'static str, ty: FieldType) -> Field {
    Field { name, ty }
}

fn structure(name: &'static str, fields: Vec<Field>) -> FieldType {
    FieldType::Struct(StructType { name, fields })
}

fn variant(
    sysno: Sysno,
    specialization: Option<&str>,
    fields: Vec<Field>,
    ret: Option<&'static ResourceKind>,
) -> SyscallVariant {
    let name = match specialization {
        Some(suffix) => format!("{}${}", sysno.name(), suffix),
        None => sysno.name().to_string(),
    };
    SyscallVariant {
        name,
        sysno,
        fields,
        ret,
    }
}

// every sockaddr flavour is keyed on the sa_family entry strace prints first
fn sockaddr_in() -> FieldType {
    structure(
        "sockaddr_in",
        vec![
            field("sa_family", konst(libc::AF_INET as u64, 16)),
            field("sin_port", int_be(16)),
            field("sin_addr", int_be(32)),
            field("sin_zero", array(int(8), Some(8))),
        ],
    )
}

fn sockaddr_un() -> FieldType {
    let file = structure(
        "sockaddr_un_file",
        vec![
            field("sa_family", konst(libc::AF_UNIX as u64, 16)),
            field("sun_path", filename()),
        ],
    );
    let abstract_name = structure(
        "sockaddr_un_abstract",
        vec![
            field("sa_family", konst(libc::AF_UNIX as u64, 16)),
            field("sun_path", buffer(BufferKind::Blob, Direction::In, None)),
        ],
    );
    FieldType::Union(UnionType {
        name: "sockaddr_un",
        selector: BranchSelector::LeadingNul("sun_path"),
        branches: vec![
            UnionBranch {
                name: "file",
                tag: UNIX_PATH_TAG,
                ty: file,
            },
            UnionBranch {
                name: "abs",
                tag: UNIX_ABSTRACT_TAG,
                ty: abstract_name,
            },
        ],
        fixed_size: Some(110),
    })
}

fn sockaddr_nl() -> FieldType {
    structure(
        "sockaddr_nl",
        vec![
            field("sa_family", konst(libc::AF_NETLINK as u64, 16)),
            field("nl_pad", int(16)),
            field("nl_pid", int(32)),
            field("nl_groups", int(32)),
        ],
    )
}

fn sockaddr() -> FieldType {
    FieldType::Union(UnionType {
        name: "sockaddr",
        selector: BranchSelector::FieldValue("sa_family"),
        branches: vec![
            UnionBranch {
                name: "un",
                tag: libc::AF_UNIX as u64,
                ty: sockaddr_un(),
            },
            UnionBranch {
                name: "in",
                tag: libc::AF_INET as u64,
                ty: sockaddr_in(),
            },
            UnionBranch {
                name: "nl",
                tag: libc::AF_NETLINK as u64,
                ty: sockaddr_nl(),
            },
        ],
        fixed_size: Some(128),
    })
}

fn ifreq() -> FieldType {
    structure(
        "ifreq",
        vec![
            field("ifr_name", buffer(BufferKind::CString, Direction::In, Some(16))),
            field("ifr_hwaddr", buffer(BufferKind::Blob, Direction::InOut, Some(24))),
        ],
    )
}

fn sctp_reset_streams() -> FieldType {
    structure(
        "sctp_reset_streams",
        vec![
            field("srs_assoc_id", int(32)),
            field("srs_flags", int(16)),
            field("srs_number_streams", int(16)),
        ],
    )
}

fn sockaddr_calls(sysno: Sysno, netlink_variant: bool) -> Vec<SyscallVariant> {
    let with_addr = |kind: &'static ResourceKind, addr: FieldType| {
        vec![
            field("fd", resource(kind)),
            field("addr", ptr(Direction::In, addr)),
            field("addrlen", len("addr", 32)),
        ]
    };
    let mut variants = vec![
        variant(sysno, None, with_addr(&SOCK, sockaddr()), None),
        variant(sysno, Some("unix"), with_addr(&SOCK_UNIX, sockaddr_un()), None),
        variant(sysno, Some("inet"), with_addr(&SOCK_IN, sockaddr_in()), None),
    ];
    if netlink_variant {
        variants.push(variant(
            sysno,
            Some("netlink"),
            with_addr(&SOCK_NETLINK, sockaddr_nl()),
            None,
        ));
    }
    variants
}

pub fn initialize_skeletons_map() -> HashMap<Sysno, Vec<SyscallVariant>> {
    use Direction::*;
    let mut variants: Vec<SyscallVariant> = vec![
        variant(
            Sysno::open,
            None,
            vec![
                field("file", filename()),
                field("flags", flags(OPEN_FLAGS, 32)),
                field("mode", flags(OPEN_MODES, 32)),
            ],
            Some(&FD),
        ),
        variant(
            Sysno::openat,
            None,
            vec![
                field("fd", resource(&FD)),
                field("file", filename()),
                field("flags", flags(OPEN_FLAGS, 32)),
                field("mode", flags(OPEN_MODES, 32)),
            ],
            Some(&FD),
        ),
        variant(Sysno::close, None, vec![field("fd", resource(&FD))], None),
        variant(
            Sysno::read,
            None,
            vec![
                field("fd", resource(&FD)),
                field("buf", buffer(BufferKind::Blob, Out, None)),
                field("count", len("buf", 64)),
            ],
            None,
        ),
        variant(
            Sysno::write,
            None,
            vec![
                field("fd", resource(&FD)),
                field("buf", buffer(BufferKind::Blob, In, None)),
                field("count", len("buf", 64)),
            ],
            None,
        ),
        variant(
            Sysno::lseek,
            None,
            vec![
                field("fd", resource(&FD)),
                field("offset", int(64)),
                field("whence", flags(SEEK_WHENCE, 32)),
            ],
            None,
        ),
        variant(
            Sysno::pipe,
            None,
            vec![field(
                "pipefd",
                ptr(Out, array(resource_out(&FD), Some(2))),
            )],
            None,
        ),
        variant(
            Sysno::pipe2,
            None,
            vec![
                field("pipefd", ptr(Out, array(resource_out(&FD), Some(2)))),
                field("flags", flags(PIPE_FLAGS, 32)),
            ],
            None,
        ),
        variant(Sysno::dup, None, vec![field("oldfd", resource(&FD))], Some(&FD)),
        variant(
            Sysno::dup2,
            None,
            vec![field("oldfd", resource(&FD)), field("newfd", resource(&FD))],
            Some(&FD),
        ),
        variant(
            Sysno::dup3,
            None,
            vec![
                field("oldfd", resource(&FD)),
                field("newfd", resource(&FD)),
                field("flags", flags(DUP3_FLAGS, 32)),
            ],
            Some(&FD),
        ),
        // sockets, generic first, specializations in the order they are preferred on ties
        variant(
            Sysno::socket,
            None,
            vec![
                field("domain", flags(SOCKET_DOMAINS, 32)),
                field("type", flags(SOCKET_TYPES, 32)),
                field("proto", int(32)),
            ],
            Some(&SOCK),
        ),
        variant(
            Sysno::socket,
            Some("unix"),
            vec![
                field("domain", konst(libc::AF_UNIX as u64, 32)),
                field("type", flags(UNIX_SOCKET_TYPES, 32)),
                field("proto", konst(0, 32)),
            ],
            Some(&SOCK_UNIX),
        ),
        variant(
            Sysno::socket,
            Some("inet"),
            vec![
                field("domain", konst(libc::AF_INET as u64, 32)),
                field("type", flags(SOCKET_TYPES, 32)),
                field("proto", int(32)),
            ],
            Some(&SOCK_IN),
        ),
        variant(
            Sysno::socket,
            Some("inet_tcp"),
            vec![
                field("domain", konst(libc::AF_INET as u64, 32)),
                field("type", konst(libc::SOCK_STREAM as u64, 32)),
                field("proto", konst(0, 32)),
            ],
            Some(&SOCK_TCP),
        ),
        variant(
            Sysno::socket,
            Some("inet_udp"),
            vec![
                field("domain", konst(libc::AF_INET as u64, 32)),
                field("type", konst(libc::SOCK_DGRAM as u64, 32)),
                field("proto", konst(0, 32)),
            ],
            Some(&SOCK_UDP),
        ),
        variant(
            Sysno::socket,
            Some("inet6_sctp"),
            vec![
                field("domain", konst(libc::AF_INET6 as u64, 32)),
                field("type", konst(libc::SOCK_SEQPACKET as u64, 32)),
                field("proto", konst(SOL_SCTP, 32)),
            ],
            Some(&SOCK_SCTP6),
        ),
        variant(
            Sysno::socket,
            Some("packet"),
            vec![
                field("domain", konst(libc::AF_PACKET as u64, 32)),
                field("type", flags(PACKET_SOCKET_TYPES, 32)),
                field("proto", konst(ETH_P_ALL_BE, 32)),
            ],
            Some(&SOCK_PACKET_KIND),
        ),
        variant(
            Sysno::socket,
            Some("netlink"),
            vec![
                field("domain", konst(libc::AF_NETLINK as u64, 32)),
                field("type", konst(libc::SOCK_RAW as u64, 32)),
                field("proto", int(32)),
            ],
            Some(&SOCK_NETLINK),
        ),
        variant(
            Sysno::socket,
            Some("can_raw"),
            vec![
                field("domain", konst(libc::AF_CAN as u64, 32)),
                field("type", konst(libc::SOCK_RAW as u64, 32)),
                field("proto", konst(CAN_RAW, 32)),
            ],
            Some(&SOCK_CAN),
        ),
        variant(
            Sysno::ioctl,
            None,
            vec![
                field("fd", resource(&FD)),
                field("cmd", int(32)),
                field("arg", int(64)),
            ],
            None,
        ),
        variant(
            Sysno::ioctl,
            Some("int_in"),
            vec![
                field("fd", resource(&FD)),
                field("cmd", flags(IOCTL_INT_IN, 32)),
                field("v", ptr(In, int(64))),
            ],
            None,
        ),
        variant(
            Sysno::ioctl,
            Some("sock_ifreq"),
            vec![
                field("fd", resource(&SOCK)),
                field("cmd", flags(SOCKIOS_IFREQ, 32)),
                field("arg", ptr(InOut, ifreq())),
            ],
            None,
        ),
        variant(
            Sysno::ioctl,
            Some("ifreq_SIOCGIFINDEX_team"),
            vec![
                field("fd", resource(&SOCK)),
                field("cmd", konst(SIOCGIFINDEX, 32)),
                field("arg", ptr(InOut, ifreq())),
            ],
            None,
        ),
        variant(
            Sysno::setsockopt,
            None,
            vec![
                field("fd", resource(&SOCK)),
                field("level", int(32)),
                field("optname", int(32)),
                field("optval", buffer(BufferKind::Blob, In, None)),
                field("optlen", len("optval", 32)),
            ],
            None,
        ),
        variant(
            Sysno::setsockopt,
            Some("sock_int"),
            vec![
                field("fd", resource(&SOCK)),
                field("level", konst(libc::SOL_SOCKET as u64, 32)),
                field("optname", flags(SOCKOPT_SOCK_INT, 32)),
                field("optval", ptr(In, int(32))),
                field("optlen", len("optval", 32)),
            ],
            None,
        ),
        variant(
            Sysno::getsockopt,
            None,
            vec![
                field("fd", resource(&SOCK)),
                field("level", int(32)),
                field("optname", int(32)),
                field("optval", buffer(BufferKind::Blob, Out, None)),
                field("optlen", ptr(InOut, int(32))),
            ],
            None,
        ),
        variant(
            Sysno::getsockopt,
            Some("inet_sctp6_SCTP_RESET_STREAMS"),
            vec![
                field("fd", resource(&SOCK_SCTP6)),
                field("level", konst(SOL_SCTP, 32)),
                field("optname", konst(SCTP_RESET_STREAMS, 32)),
                field("optval", ptr(Out, sctp_reset_streams())),
                field("optlen", ptr(InOut, int(32))),
            ],
            None,
        ),
        variant(Sysno::inotify_init, None, vec![], Some(&FD_INOTIFY)),
        variant(
            Sysno::inotify_init1,
            None,
            vec![field("flags", flags(INOTIFY_INIT_FLAGS, 32))],
            Some(&FD_INOTIFY),
        ),
        variant(
            Sysno::inotify_add_watch,
            None,
            vec![
                field("fd", resource(&FD_INOTIFY)),
                field("file", filename()),
                field("mask", flags(INOTIFY_MASK, 32)),
            ],
            Some(&INOTIFY_WD),
        ),
        variant(
            Sysno::inotify_rm_watch,
            None,
            vec![
                field("fd", resource(&FD_INOTIFY)),
                field("wd", resource(&INOTIFY_WD)),
            ],
            None,
        ),
        variant(
            Sysno::ioprio_get,
            None,
            vec![field("which", flags(IOPRIO_WHICH, 32)), field("who", int(32))],
            None,
        ),
        variant(
            Sysno::ioprio_get,
            Some("pid"),
            vec![
                field("which", konst(IOPRIO_WHO_PROCESS, 32)),
                field("who", resource(&PID)),
            ],
            None,
        ),
        variant(
            Sysno::ioprio_get,
            Some("uid"),
            vec![
                field("which", konst(IOPRIO_WHO_USER, 32)),
                field("who", int(32)),
            ],
            None,
        ),
        variant(
            Sysno::shmget,
            None,
            vec![
                field("key", int(32)),
                field("size", int(64)),
                field("flags", flags(SHMGET_FLAGS, 32)),
                field("unused", int(64)),
            ],
            Some(&SHMID),
        ),
        variant(Sysno::getpid, None, vec![], Some(&PID)),
        variant(
            Sysno::kill,
            None,
            vec![field("pid", resource(&PID)), field("sig", flags(SIGNALS, 32))],
            None,
        ),
        variant(Sysno::fork, None, vec![], Some(&PID)),
        variant(
            Sysno::clone,
            None,
            vec![
                field("flags", flags(CLONE_FLAGS, 64)),
                field("sp", int(64)),
                field("parentid", int(64)),
                field("childtid", int(64)),
                field("tls", int(64)),
            ],
            Some(&PID),
        ),
    ];
    variants.extend(sockaddr_calls(Sysno::connect, false));
    variants.extend(sockaddr_calls(Sysno::bind, true));

    let mut map: HashMap<Sysno, Vec<SyscallVariant>> = HashMap::new();
    for variant in variants {
        map.entry(variant.sysno).or_default().push(variant);
    }
    map
}

macro_rules! libc_constants {
    ($($name:ident),* $(,)?) => {
        [$((stringify!($name), libc::$name as u64)),*]
    };
}

pub fn initialize_constants_map() -> HashMap<&'static str, u64> {
    let from_libc = libc_constants![
        AF_UNSPEC, AF_UNIX, AF_INET, AF_INET6, AF_NETLINK, AF_PACKET, AF_CAN,
        SOCK_STREAM, SOCK_DGRAM, SOCK_RAW, SOCK_SEQPACKET, SOCK_NONBLOCK, SOCK_CLOEXEC,
        O_RDONLY, O_WRONLY, O_RDWR, O_CREAT, O_EXCL, O_NOCTTY, O_TRUNC, O_APPEND, O_NONBLOCK,
        O_DSYNC, O_SYNC, O_DIRECT, O_DIRECTORY, O_NOFOLLOW, O_CLOEXEC, O_PATH, O_TMPFILE,
        O_LARGEFILE, AT_FDCWD,
        S_IFREG, S_IFDIR, S_IFCHR, S_IFIFO, S_IFSOCK,
        S_IRUSR, S_IWUSR, S_IXUSR, S_IRGRP, S_IWGRP, S_IXGRP, S_IROTH, S_IWOTH, S_IXOTH,
        SEEK_SET, SEEK_CUR, SEEK_END, SEEK_DATA, SEEK_HOLE,
        SOL_SOCKET, SO_REUSEADDR, SO_KEEPALIVE, SO_BROADCAST, SO_SNDBUF, SO_RCVBUF, SO_REUSEPORT,
        IPPROTO_IP, IPPROTO_TCP, IPPROTO_UDP, NETLINK_ROUTE, ETH_P_ALL,
        IN_ACCESS, IN_MODIFY, IN_ATTRIB, IN_CLOSE_WRITE, IN_CLOSE_NOWRITE, IN_OPEN,
        IN_MOVED_FROM, IN_MOVED_TO, IN_CREATE, IN_DELETE, IN_DELETE_SELF, IN_MOVE_SELF,
        IN_NONBLOCK, IN_CLOEXEC,
        IPC_PRIVATE, IPC_CREAT, IPC_EXCL,
        SIGHUP, SIGINT, SIGQUIT, SIGKILL, SIGUSR1, SIGUSR2, SIGTERM, SIGCHLD, SIGCONT, SIGSTOP,
        CLONE_VM, CLONE_FS, CLONE_FILES, CLONE_SIGHAND, CLONE_THREAD, CLONE_PARENT_SETTID,
        CLONE_CHILD_CLEARTID, CLONE_CHILD_SETTID, CLONE_SETTLS,
    ];
    let local = [
        ("FIONBIO", FIONBIO),
        ("FIOASYNC", FIOASYNC),
        ("SIOCGIFNAME", SIOCGIFNAME),
        ("SIOCGIFFLAGS", SIOCGIFFLAGS),
        ("SIOCSIFFLAGS", SIOCSIFFLAGS),
        ("SIOCGIFMTU", SIOCGIFMTU),
        ("SIOCGIFHWADDR", SIOCGIFHWADDR),
        ("SIOCGIFINDEX", SIOCGIFINDEX),
        ("SOL_SCTP", SOL_SCTP),
        ("IPPROTO_SCTP", SOL_SCTP),
        ("SCTP_RESET_STREAMS", SCTP_RESET_STREAMS),
        ("SOCK_PACKET", SOCK_PACKET),
        ("CAN_RAW", CAN_RAW),
        ("IOPRIO_WHO_PROCESS", IOPRIO_WHO_PROCESS),
        ("IOPRIO_WHO_PGRP", IOPRIO_WHO_PGRP),
        ("IOPRIO_WHO_USER", IOPRIO_WHO_USER),
    ];
    from_libc.into_iter().chain(local).collect()
}

/// The catalog compiled into the crate, x86_64 linux.
#[derive(Clone, Copy, Debug, Default)]
pub struct SkeletonCatalog;

impl SyscallCatalog for SkeletonCatalog {
    fn lookup(&self, name: &str) -> Option<Sysno> {
        SYSNO_NAMES.get(name).copied()
    }

    fn variants_for(&self, sysno: Sysno) -> &[SyscallVariant] {
        SYSKELETON_MAP
            .get(&sysno)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn constant(&self, name: &str) -> Option<u64> {
        CONSTANTS_MAP.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_call_has_a_base_variant_declared_first() {
        for (sysno, variants) in SYSKELETON_MAP.iter() {
            assert!(variants[0].is_base(), "{sysno:?} starts with {}", variants[0].name);
            assert_eq!(variants.iter().filter(|variant| variant.is_base()).count(), 1);
        }
    }

    #[test]
    fn variant_names_carry_their_specialization() {
        let catalog = SkeletonCatalog;
        let socket_no = catalog.lookup("socket").unwrap();
        let names: Vec<&str> = catalog
            .variants_for(socket_no)
            .iter()
            .map(|variant| variant.name.as_str())
            .collect();
        assert!(names.contains(&"socket$unix"));
        assert!(names.contains(&"socket$can_raw"));
        assert_eq!(catalog.lookup("not_a_syscall"), None);
    }

    #[test]
    fn constants_come_from_libc_and_local_tables() {
        let catalog = SkeletonCatalog;
        assert_eq!(catalog.constant("AF_INET"), Some(2));
        assert_eq!(catalog.constant("O_CREAT"), Some(0o100));
        assert_eq!(catalog.constant("AT_FDCWD"), Some(-100i64 as u64));
        assert_eq!(catalog.constant("SIOCGIFINDEX"), Some(0x8933));
        assert_eq!(catalog.constant("NOPE"), None);
    }

    #[test]
    fn sockaddr_branches_are_found_by_family() {
        let catalog = SkeletonCatalog;
        let FieldType::Union(sockaddr) = sockaddr() else {
            panic!("sockaddr is a union");
        };
        assert_eq!(catalog.branch_for(&sockaddr, 16).map(|branch| branch.name), Some("nl"));
        assert_eq!(catalog.branch_for(&sockaddr, 2).map(|branch| branch.name), Some("in"));
        assert!(catalog.branch_for(&sockaddr, 29).is_none());
    }

    #[test]
    fn resource_lineages_relate_sockets() {
        assert!(SOCK_TCP.descends_from(&SOCK_IN));
        assert!(SOCK_TCP.descends_from(&FD));
        assert!(!SOCK_UNIX.descends_from(&SOCK_IN));
        assert!(FD.is_compatible(&SOCK_UNIX));
        assert!(!SOCK_UNIX.is_compatible(&SOCK_IN));
        assert_eq!(INOTIFY_WD.family(), "inotify_wd");
        assert!(FD.is_sentinel(AT_FDCWD));
        assert!(FD.is_sentinel(0xffff_ffff));
        assert!(PID.is_sentinel(0));
        assert!(!FD.is_sentinel(3));
    }
}
