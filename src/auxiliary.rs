pub mod constants {
    pub mod memory {
        // where the fuzzer maps its data area
        pub const DATA_BASE_ADDRESS: u64 = 0x7f00_0000_0000;
        pub const DATA_GRANULE: u64 = 64;
    }
    pub mod general {
        pub const IMPLICIT_PID: i32 = 0;
        // the highest errno nix knows a name for on x86_64 linux
        pub const MAX_USERLAND_ERRNO: i32 = 133;
        pub const FORKING_CALLS: [&str; 4] = ["clone", "clone3", "fork", "vfork"];
        // sockaddr_un branches, picked by whether sun_path starts with a NUL
        pub const UNIX_ABSTRACT_TAG: u64 = 0;
        pub const UNIX_PATH_TAG: u64 = 1;
    }
    pub mod ioctl {
        pub const FIONBIO: u64 = 0x5421;
        pub const FIOASYNC: u64 = 0x5452;
        pub const SIOCGIFNAME: u64 = 0x8910;
        pub const SIOCGIFFLAGS: u64 = 0x8913;
        pub const SIOCSIFFLAGS: u64 = 0x8914;
        pub const SIOCGIFMTU: u64 = 0x8921;
        pub const SIOCGIFHWADDR: u64 = 0x8927;
        pub const SIOCGIFINDEX: u64 = 0x8933;
    }
    pub mod net {
        pub const SOL_SCTP: u64 = 132;
        pub const SCTP_RESET_STREAMS: u64 = 119;
        pub const CAN_RAW: u64 = 1;
        // ETH_P_ALL as it appears on the wire
        pub const ETH_P_ALL_BE: u64 = 0x300;
        pub const SOCK_PACKET: u64 = 10;
    }
    pub mod ioprio {
        pub const IOPRIO_WHO_PROCESS: u64 = 1;
        pub const IOPRIO_WHO_PGRP: u64 = 2;
        pub const IOPRIO_WHO_USER: u64 = 3;
    }
}

pub mod kernel_errno {
    // kernel side errnos, not visible to userland
    // strace still prints them for interrupted calls: `= ? ERESTARTSYS (...)`
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    #[repr(i32)]
    pub enum KernelErrno {
        ERESTARTSYS = 512,
        ERESTARTNOINTR = 513,
        ERESTARTNOHAND = 514,
        ENOIOCTLCMD = 515,
        ERESTART_RESTARTBLOCK = 516,
        EPROBE_DEFER = 517,
        EOPENSTALE = 518,
        ENOPARAM = 519,
        EBADHANDLE = 521,
        ENOTSYNC = 522,
        EBADCOOKIE = 523,
        ENOTSUPP = 524,
        ETOOSMALL = 525,
        ESERVERFAULT = 526,
        EBADTYPE = 527,
        EJUKEBOX = 528,
        EIOCBQUEUED = 529,
        ERECALLCONFLICT = 530,
        ENOGRACE = 531,
    }

    use KernelErrno::*;
    static KERNEL_ERRNOS: [(KernelErrno, &str, &str); 19] = [
        (ERESTARTSYS, "ERESTARTSYS", "Interrupted by a signal, restart if it has no handler or a SA_RESTART handler exists"),
        (ERESTARTNOINTR, "ERESTARTNOINTR", "Interrupted by a signal, restart always"),
        (ERESTARTNOHAND, "ERESTARTNOHAND", "Interrupted by a signal, restart if it has no handler"),
        (ENOIOCTLCMD, "ENOIOCTLCMD", "No ioctl command"),
        (ERESTART_RESTARTBLOCK, "ERESTART_RESTARTBLOCK", "Interrupted by a signal, restart by calling restart_syscall"),
        (EPROBE_DEFER, "EPROBE_DEFER", "Driver requests probe retry"),
        (EOPENSTALE, "EOPENSTALE", "Open found a stale dentry"),
        (ENOPARAM, "ENOPARAM", "Parameter not supported"),
        (EBADHANDLE, "EBADHANDLE", "Illegal NFS file handle"),
        (ENOTSYNC, "ENOTSYNC", "Update synchronization mismatch"),
        (EBADCOOKIE, "EBADCOOKIE", "Cookie is stale"),
        (ENOTSUPP, "ENOTSUPP", "Operation is not supported"),
        (ETOOSMALL, "ETOOSMALL", "Buffer or request is too small"),
        (ESERVERFAULT, "ESERVERFAULT", "An untranslatable error occurred"),
        (EBADTYPE, "EBADTYPE", "Type not supported by server"),
        (EJUKEBOX, "EJUKEBOX", "Request initiated, but will not complete before timeout"),
        (EIOCBQUEUED, "EIOCBQUEUED", "iocb queued, will get completion event"),
        (ERECALLCONFLICT, "ERECALLCONFLICT", "conflict with recalled state"),
        (ENOGRACE, "ENOGRACE", "NFS file lock reclaim refused"),
    ];

    impl std::fmt::Display for KernelErrno {
        fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "{}: {}", self.name(), self.desc())
        }
    }

    impl KernelErrno {
        pub fn from_name(name: &str) -> Option<KernelErrno> {
            KERNEL_ERRNOS
                .iter()
                .find(|(_, errno_name, _)| *errno_name == name)
                .map(|(kernel_errno, _, _)| *kernel_errno)
        }

        fn entry(&self) -> Option<&'static (KernelErrno, &'static str, &'static str)> {
            KERNEL_ERRNOS.iter().find(|(kernel_errno, _, _)| kernel_errno == self)
        }

        pub fn name(&self) -> &'static str {
            self.entry().map_or("UNKNOWN", |(_, name, _)| *name)
        }

        pub fn desc(&self) -> &'static str {
            self.entry().map_or("Unknown errno", |(_, _, desc)| *desc)
        }
    }

}
