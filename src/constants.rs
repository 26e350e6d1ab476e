#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Constant values shared across the grader.

/// Number of device roles that must resolve before a group is graded.
pub const MIN_RESOLVED_ROLES: usize = 4;

/// Separator placed between comments in an output record.
pub const COMMENT_SEPARATOR: &str = " | ";

/// Native VLAN expected on every trunk.
pub const NATIVE_VLAN: u64 = 123;

/// Standby priority a router assumes when none is configured.
pub const DEFAULT_STANDBY_PRIORITY: u64 = 100;

/// Trunk on TOR-D1 that leaves the native VLAN untouched.
pub const UNTAGGED_UPLINK: &str = "GigabitEthernet1/0/11";

/// Prefix of every named EIGRP process.
pub const EIGRP_PROCESS_PREFIX: &str = "OntarioTech";

/// Loopback address of Toronto, the campus NTP source.
pub const TORONTO_LOOPBACK: &str = "1.1.1.1";

/// Loopback address of the ISP, the stratum 2 NTP master.
pub const ISP_LOOPBACK: &str = "2.2.2.2";

/// Tunnel bandwidth, in kbit/s.
pub const TUNNEL_BANDWIDTH: u64 = 1_000_000;

/// Access ports carrying PortFast and BPDU Guard.
pub const EDGE_PORTS: std::ops::RangeInclusive<u32> = 12..=24;
