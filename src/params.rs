#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Group-specific expected values.
//!
//! Every value a rule compares against is a function of the group number
//! alone. Numbers are widened to `u64` before any arithmetic, so every
//! function is defined for every `u32`.

use std::{collections::BTreeMap, net::Ipv4Addr};

use serde::{Deserialize, Serialize};

use crate::{
    constants::{EIGRP_PROCESS_PREFIX, ISP_LOOPBACK, TORONTO_LOOPBACK},
    ios::Role,
};

/// Dotted masks for prefix lengths /24 through /32.
const CIDR_MASKS: [(&str, &str); 9] = [
    ("32", "255.255.255.255"),
    ("31", "255.255.255.254"),
    ("30", "255.255.255.252"),
    ("29", "255.255.255.248"),
    ("28", "255.255.255.240"),
    ("27", "255.255.255.224"),
    ("26", "255.255.255.192"),
    ("25", "255.255.255.128"),
    ("24", "255.255.255.0"),
];

/// Converts a prefix length to a dotted mask.
///
/// Lengths /24 to /32 come from a fixed table; anything else, including an
/// already dotted mask, is returned unchanged.
pub fn dotted_mask(mask: &str) -> &str {
    let bare = mask.trim_start_matches('/');
    CIDR_MASKS
        .iter()
        .find(|(len, _)| *len == bare)
        .map_or(mask, |(_, dotted)| *dotted)
}

/// Splits `a.b.c.d/len` into the address and its dotted mask.
pub fn split_cidr(cidr: &str) -> (&str, Option<&str>) {
    match cidr.split_once('/') {
        Some((ip, mask)) => (ip, Some(dotted_mask(mask))),
        None => (cidr, None),
    }
}

/// Whether `address` lies inside `subnet`, given as `a.b.c.d/len`.
///
/// Malformed input is never inside anything.
pub fn address_in_subnet(address: &str, subnet: &str) -> bool {
    let Some((network, len)) = subnet.split_once('/') else {
        return false;
    };
    let (Ok(address), Ok(network), Ok(len)) =
        (address.parse::<Ipv4Addr>(), network.parse::<Ipv4Addr>(), len.parse::<u32>())
    else {
        return false;
    };
    if len > 32 {
        return false;
    }

    let mask = u32::MAX.checked_shl(32 - len).unwrap_or(0);
    u32::from(address) & mask == u32::from(network) & mask
}

/// The expected values for one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupParams {
    /// Group number taken from the group label.
    group: u32,
}

impl GroupParams {
    /// Expected values for group `group`.
    pub fn new(group: u32) -> Self {
        Self { group }
    }

    /// The group number.
    pub fn group(&self) -> u32 {
        self.group
    }

    /// The group number, widened for arithmetic.
    fn n(&self) -> u64 {
        u64::from(self.group)
    }

    /// Second user VLAN, `200 + n`.
    pub fn vlan_2xx(&self) -> u64 {
        200 + self.n()
    }

    /// Third user VLAN, `300 + n`.
    pub fn vlan_3xx(&self) -> u64 {
        300 + self.n()
    }

    /// The three user VLANs: 10, 2xx, 3xx.
    pub fn user_vlans(&self) -> [u64; 3] {
        [10, self.vlan_2xx(), self.vlan_3xx()]
    }

    /// HSRP group number for `vlan`, `2n + vlan`.
    pub fn hsrp_group(&self, vlan: u64) -> u64 {
        2 * self.n() + vlan
    }

    /// Spanning-tree cost on TOR-A1's Port-channel2, `2n + 10`.
    pub fn port_cost(&self) -> u64 {
        2 * self.n() + 10
    }

    /// Tunnel delay, `2n + 20`.
    pub fn tunnel_delay(&self) -> u64 {
        2 * self.n() + 20
    }

    /// Tunnel key, `3n`.
    pub fn tunnel_key(&self) -> u64 {
        3 * self.n()
    }

    /// NHRP network id.
    pub fn nhrp_network_id(&self) -> u64 {
        self.n()
    }

    /// IKE policy number.
    pub fn ike_policy(&self) -> u64 {
        self.n()
    }

    /// EIGRP autonomous system.
    pub fn eigrp_as(&self) -> u64 {
        self.n()
    }

    /// Canonical EIGRP process name.
    pub fn eigrp_process_name(&self) -> String {
        format!("{EIGRP_PROCESS_PREFIX}{:02}", self.group)
    }

    /// Expression accepting the EIGRP process name with or without padding.
    pub fn eigrp_process_pattern(&self) -> String {
        format!("{EIGRP_PROCESS_PREFIX}0?{}", self.group)
    }

    /// VLAN 10 subnet.
    pub fn lan_subnet(&self) -> String {
        format!("172.16.{}.0/24", self.group)
    }

    /// VLAN 10 network address, as written in routing statements.
    pub fn lan_network(&self) -> String {
        format!("172.16.{}.0", self.group)
    }

    /// Toronto's VLAN 10 sub-interface address.
    pub fn lan_address(&self) -> String {
        format!("172.16.{}.1/24", self.group)
    }

    /// VLAN 10 default gateway (HSRP virtual address).
    pub fn lan_gateway(&self) -> String {
        format!("172.16.{}.254", self.group)
    }

    /// DMVPN overlay network address.
    pub fn tunnel_network(&self) -> String {
        format!("10.1.{}.0", self.group)
    }

    /// Overlay address of a DMVPN site.
    pub fn tunnel_address(&self, role: Role) -> Option<String> {
        let host = match role {
            Role::Toronto => 1,
            Role::Ottawa => 2,
            Role::Oshawa => 3,
            _ => return None,
        };
        Some(format!("10.1.{}.{host}", self.group))
    }

    /// Internet-facing interface and address of a DMVPN site.
    pub fn internet_uplink(&self, role: Role) -> Option<(&'static str, String)> {
        match role {
            Role::Toronto => {
                Some(("GigabitEthernet0/0/1.100", format!("199.212.32.{}", self.group)))
            }
            Role::Ottawa => Some(("GigabitEthernet0/0/1", format!("209.165.200.{}", self.group))),
            Role::Oshawa => Some(("GigabitEthernet0/0/1", format!("198.51.100.{}", self.group))),
            _ => None,
        }
    }

    /// Internet subnet a site must keep out of EIGRP.
    pub fn internet_subnet(&self, role: Role) -> Option<&'static str> {
        match role {
            Role::Toronto => Some("199.212.32.0/24"),
            Role::Ottawa => Some("209.165.200.0/24"),
            Role::Oshawa => Some("198.51.100.0/24"),
            _ => None,
        }
    }

    /// Loopback1 address, also the EIGRP router id.
    pub fn router_id(&self, role: Role) -> Option<&'static str> {
        match role {
            Role::Toronto => Some(TORONTO_LOOPBACK),
            Role::Isp => Some(ISP_LOOPBACK),
            Role::Ottawa => Some("3.3.3.3"),
            Role::Oshawa => Some("4.4.4.4"),
            _ => None,
        }
    }

    /// Networks a router must advertise into EIGRP.
    pub fn eigrp_networks(&self, role: Role) -> Vec<String> {
        let fixed: &[&str] = match role {
            Role::Toronto => &["1.1.1.1", "10.202.10.0"],
            Role::Isp => &["2.2.2.2", "10.202.10.0", "10.202.20.0"],
            Role::Ottawa => &["3.3.3.3", "10.202.20.0", "172.16.84.0", "172.16.85.0", "172.16.86.0"],
            Role::Oshawa => &["4.4.4.4", "172.16.87.0", "172.16.88.0", "172.16.89.0"],
            _ => &[],
        };

        let mut networks: Vec<String> = fixed.iter().map(|s| s.to_string()).collect();
        if Role::SITES.contains(&role) {
            networks.insert(1, self.tunnel_network());
        }
        if role == Role::Toronto {
            networks.push(self.lan_network());
        }
        networks
    }

    /// Expected interface addresses, in CIDR notation.
    pub fn interface_addresses(&self, role: Role) -> Vec<(&'static str, String)> {
        let n = self.group;
        match role {
            Role::Isp => vec![
                ("GigabitEthernet0/0/0", "10.202.10.2/29".to_string()),
                ("GigabitEthernet0/0/1", "10.202.20.2/29".to_string()),
                ("Loopback1", "2.2.2.2/32".to_string()),
            ],
            Role::Toronto => vec![
                ("GigabitEthernet0/0/0", "10.202.10.1/29".to_string()),
                ("GigabitEthernet0/0/1.10", self.lan_address()),
                ("GigabitEthernet0/0/1.100", format!("199.212.32.{n}/24")),
                ("Loopback1", "1.1.1.1/32".to_string()),
                ("Tunnel1", format!("10.1.{n}.1/24")),
            ],
            Role::Ottawa => vec![
                ("GigabitEthernet0/0/0", "10.202.20.3/29".to_string()),
                ("GigabitEthernet0/0/1", format!("209.165.200.{n}/24")),
                ("Loopback1", "3.3.3.3/32".to_string()),
                ("Loopback101", format!("172.16.84.{n}/24")),
                ("Loopback102", format!("172.16.85.{n}/24")),
                ("Loopback103", format!("172.16.86.{n}/24")),
                ("Tunnel1", format!("10.1.{n}.2/24")),
            ],
            Role::Oshawa => vec![
                ("GigabitEthernet0/0/1", format!("198.51.100.{n}/24")),
                ("Loopback1", "4.4.4.4/32".to_string()),
                ("Loopback101", format!("172.16.87.{n}/24")),
                ("Loopback102", format!("172.16.88.{n}/24")),
                ("Loopback103", format!("172.16.89.{n}/24")),
                ("Tunnel1", format!("10.1.{n}.3/24")),
            ],
            Role::TorD2 => vec![
                ("Vlan100", "199.212.32.254/24".to_string()),
                ("Vlan300", "209.165.200.254/24".to_string()),
                ("Vlan400", "198.51.100.254/24".to_string()),
            ],
            _ => Vec::new(),
        }
    }

    /// Collects the values an instructor needs to build a working
    /// configuration for this group.
    pub fn answer_key(&self) -> AnswerKey {
        let interfaces = Role::ALL
            .into_iter()
            .filter_map(|role| {
                let addresses: BTreeMap<String, String> = self
                    .interface_addresses(role)
                    .into_iter()
                    .map(|(name, cidr)| (name.to_string(), cidr))
                    .collect();
                (!addresses.is_empty()).then_some((role, addresses))
            })
            .collect();

        AnswerKey {
            group: self.group,
            vlan_2xx: self.vlan_2xx(),
            vlan_3xx: self.vlan_3xx(),
            hsrp_groups: self
                .user_vlans()
                .into_iter()
                .map(|vlan| (vlan, self.hsrp_group(vlan)))
                .collect(),
            port_cost: self.port_cost(),
            tunnel_key: self.tunnel_key(),
            tunnel_delay: self.tunnel_delay(),
            lan_gateway: self.lan_gateway(),
            eigrp_process: self.eigrp_process_name(),
            interfaces,
        }
    }
}

/// Expected values for one group, ready to serialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKey {
    /// Group number.
    pub group:         u32,
    /// VLAN 2xx id.
    pub vlan_2xx:      u64,
    /// VLAN 3xx id.
    pub vlan_3xx:      u64,
    /// HSRP group per user VLAN.
    pub hsrp_groups:   BTreeMap<u64, u64>,
    /// TOR-A1 Port-channel2 cost.
    pub port_cost:     u64,
    /// DMVPN tunnel key.
    pub tunnel_key:    u64,
    /// DMVPN tunnel delay.
    pub tunnel_delay:  u64,
    /// VLAN 10 default gateway.
    pub lan_gateway:   String,
    /// EIGRP process name.
    pub eigrp_process: String,
    /// Interface addresses per role.
    pub interfaces:    BTreeMap<Role, BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_outside_the_table_pass_through() {
        assert_eq!(dotted_mask("24"), "255.255.255.0");
        assert_eq!(dotted_mask("/30"), "255.255.255.252");
        assert_eq!(dotted_mask("16"), "16");
        assert_eq!(dotted_mask("255.255.0.0"), "255.255.0.0");
    }

    #[test]
    fn subnet_membership_handles_edges() {
        assert!(address_in_subnet("172.16.7.254", "172.16.7.0/24"));
        assert!(!address_in_subnet("172.16.8.1", "172.16.7.0/24"));
        assert!(address_in_subnet("8.8.8.8", "0.0.0.0/0"));
        assert!(address_in_subnet("1.1.1.1", "1.1.1.1/32"));
        assert!(!address_in_subnet("not-an-ip", "172.16.7.0/24"));
        assert!(!address_in_subnet("172.16.7.1", "172.16.7.0/33"));
        assert!(!address_in_subnet("172.16.7.1", "172.16.7.0"));
    }
}
