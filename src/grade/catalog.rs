#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The case-study tasks, instantiated for one group.

use super::rule::{Block, Category, Check, DocCheck, Rule, Task};
use crate::{
    constants::{EDGE_PORTS, ISP_LOOPBACK, NATIVE_VLAN, TORONTO_LOOPBACK, TUNNEL_BANDWIDTH, UNTAGGED_UPLINK},
    error::GradeError,
    ios::{Pattern, QueryError, Role},
    params::{GroupParams, split_cidr},
};

/// Switch port `GigabitEthernet1/0/<port>`.
fn switch_port(port: u32) -> String {
    format!("GigabitEthernet1/0/{port}")
}

/// Exact-line check.
fn line(text: impl Into<String>) -> Check {
    Check::Line(text.into())
}

/// Substring check.
fn contains(text: impl Into<String>) -> Check {
    Check::Contains(text.into())
}

/// One block rule per interface, each with the same checks.
fn on_interfaces(
    roles: &[Role],
    interfaces: impl IntoIterator<Item = String>,
    checks: &[Check],
) -> Result<Vec<Rule>, QueryError> {
    interfaces
        .into_iter()
        .map(|name| Ok(Rule::block(roles, Block::interface(&name)?, checks.to_vec())))
        .collect()
}

/// Trunk ports of a switch.
fn trunk_ports(role: Role) -> Vec<String> {
    match role {
        Role::TorD1 => (1..=8).chain([11]).map(switch_port).collect(),
        Role::TorD2 => (1..=8).map(switch_port).collect(),
        Role::TorA1 | Role::TorA2 => (1..=4).map(switch_port).collect(),
        _ => Vec::new(),
    }
}

/// Port-channels of a switch and their member ports.
fn channels(role: Role) -> Vec<(u64, Vec<u32>)> {
    match role {
        Role::TorD1 | Role::TorD2 => vec![(1, vec![1, 2, 3, 4]), (2, vec![5, 6]), (3, vec![7, 8])],
        Role::TorA1 | Role::TorA2 => vec![(2, vec![1, 2]), (3, vec![3, 4])],
        _ => Vec::new(),
    }
}

/// Every task, in declaration order, with expected values for `params`.
pub fn tasks(params: &GroupParams) -> Result<Vec<Task>, GradeError> {
    Ok(vec![
        addressing(params)?,
        switch_configuration(params)?,
        spanning_tree(params)?,
        first_hop_redundancy(params)?,
        mpls()?,
        dmvpn(params)?,
        routing(params)?,
        ip_services()?,
    ])
}

/// Task 1: interface addresses.
pub fn addressing(params: &GroupParams) -> Result<Task, QueryError> {
    let mut rules = Vec::new();
    for role in Role::ALL {
        for (interface, cidr) in params.interface_addresses(role) {
            let (ip, mask) = split_cidr(&cidr);
            rules.push(Rule::block(
                &[role],
                Block::interface(interface)?,
                vec![Check::Address {
                    ip:   ip.to_string(),
                    mask: mask.map(str::to_string),
                }],
            ));
        }
    }

    Ok(Task::builder()
        .name("Task 1: Addressing")
        .out_of(10.0)
        .categories(vec![
            Category::builder()
                .name("interface addressing")
                .budget(10.0)
                .rules(rules)
                .build(),
        ])
        .build())
}

/// Task 2: trunks, EtherChannels and SVIs.
pub fn switch_configuration(params: &GroupParams) -> Result<Task, QueryError> {
    let mut trunk = Vec::new();
    let mut dtp = Vec::new();
    let mut native = Vec::new();
    let mut etherchannel = Vec::new();

    for role in Role::SWITCHES {
        let ports = trunk_ports(role);
        trunk.extend(on_interfaces(&[role], ports.clone(), &[line("switchport mode trunk")])?);
        dtp.extend(on_interfaces(&[role], ports.clone(), &[line("switchport nonegotiate")])?);

        let tagged = ports
            .into_iter()
            .filter(|port| !(role == Role::TorD1 && port == UNTAGGED_UPLINK));
        native.extend(on_interfaces(
            &[role],
            tagged,
            &[line(format!("switchport trunk native vlan {NATIVE_VLAN}"))],
        )?);

        for (group, members) in channels(role) {
            let members: Vec<String> = members.into_iter().map(switch_port).collect();
            let mut checks: Vec<Check> = members
                .iter()
                .map(|interface| Check::ChannelMember {
                    interface: interface.clone(),
                    group,
                })
                .collect();
            checks.push(Check::ChannelProtocol { members });
            etherchannel.push(Rule::block(
                &[role],
                Block::interface(&format!("Port-channel{group}"))?,
                checks,
            ));
        }
    }

    let svis = on_interfaces(
        &Role::SWITCHES,
        params.user_vlans().map(|vlan| format!("Vlan{vlan}")),
        &[Check::HasAddress],
    )?;

    Ok(Task::builder()
        .name("Task 2: Switch Configuration")
        .out_of(15.0)
        .categories(vec![
            Category::builder().name("trunk mode").budget(4.0).rules(trunk).build(),
            Category::builder()
                .name("DTP disabled")
                .budget(2.0)
                .bonus(1.0)
                .rules(dtp)
                .build(),
            Category::builder().name("native VLAN").budget(2.0).rules(native).build(),
            Category::builder()
                .name("EtherChannel")
                .budget(4.0)
                .rules(etherchannel)
                .build(),
            Category::builder().name("SVIs").budget(3.0).rules(svis).build(),
        ])
        .build())
}

/// Task 3: root bridges, port cost, edge ports and root guard.
pub fn spanning_tree(params: &GroupParams) -> Result<Task, QueryError> {
    let (vlan_2xx, vlan_3xx) = (params.vlan_2xx(), params.vlan_3xx());
    let root = vec![
        Rule::document(&[Role::TorD1], DocCheck::SpanningTreeOrder {
            preferred: vec![10, vlan_3xx],
            over:      vec![vlan_2xx],
        }),
        Rule::document(&[Role::TorD2], DocCheck::SpanningTreeOrder {
            preferred: vec![vlan_2xx],
            over:      vec![10, vlan_3xx],
        }),
    ];

    let cost = vec![Rule::block(
        &[Role::TorA1],
        Block::interface("Port-channel2")?,
        vec![Check::Setting {
            keys:  vec!["spanning-tree vlan 10 cost".into(), "spanning-tree cost".into()],
            value: params.port_cost().to_string(),
        }],
    )];

    let edge = on_interfaces(&Role::ACCESS, EDGE_PORTS.map(switch_port), &[
        line("spanning-tree portfast"),
        line("spanning-tree bpduguard enable"),
    ])?;

    let guard = on_interfaces(&Role::DISTRIBUTION, [5, 6].map(switch_port), &[line(
        "spanning-tree guard root",
    )])?;

    Ok(Task::builder()
        .name("Task 3: Spanning Tree")
        .out_of(10.0)
        .categories(vec![
            Category::builder().name("root bridge").budget(2.0).rules(root).build(),
            Category::builder().name("port cost").budget(1.0).rules(cost).build(),
            Category::builder().name("edge ports").budget(5.0).rules(edge).build(),
            Category::builder().name("root guard").budget(2.0).rules(guard).build(),
        ])
        .build())
}

/// Task 4: HSRP, gateway priorities, tracking and access-switch gateways.
pub fn first_hop_redundancy(params: &GroupParams) -> Result<Task, QueryError> {
    let (vlan_2xx, vlan_3xx) = (params.vlan_2xx(), params.vlan_3xx());
    let standby = |vlan| (vlan, params.hsrp_group(vlan));

    let mut hsrp = Vec::new();
    for vlan in params.user_vlans() {
        let group = params.hsrp_group(vlan);
        hsrp.push(Rule::block(
            &Role::DISTRIBUTION,
            Block::interface(&format!("Vlan{vlan}"))?,
            vec![
                line("standby version 2"),
                line(format!("standby {group} preempt")),
                Check::VirtualIp {
                    group,
                    subnet: (vlan == 10).then(|| params.lan_subnet()),
                },
            ],
        ));
    }

    let primary = vec![
        Rule::document(&[Role::TorD1], DocCheck::StandbyOrder {
            preferred: vec![standby(10), standby(vlan_3xx)],
            over:      vec![standby(vlan_2xx)],
        }),
        Rule::document(&[Role::TorD2], DocCheck::StandbyOrder {
            preferred: vec![standby(vlan_2xx)],
            over:      vec![standby(10), standby(vlan_3xx)],
        }),
    ];

    let group_2xx = params.hsrp_group(vlan_2xx);
    let tracking = vec![Rule::block(
        &[Role::TorD2],
        Block::interface(&format!("Vlan{vlan_2xx}"))?,
        vec![contains(format!("standby {group_2xx} track {group_2xx}")), contains("decrement")],
    )];

    let gateway = vec![Rule::document(
        &Role::ACCESS,
        DocCheck::Line(format!("ip default-gateway {}", params.lan_gateway())),
    )];

    Ok(Task::builder()
        .name("Task 4: First Hop Redundancy")
        .out_of(10.0)
        .categories(vec![
            Category::builder().name("HSRP").budget(5.0).rules(hsrp).build(),
            Category::builder()
                .name("primary gateway")
                .budget(2.0)
                .rules(primary)
                .build(),
            Category::builder()
                .name("object tracking")
                .budget(1.0)
                .rules(tracking)
                .build(),
            Category::builder()
                .name("default gateway")
                .budget(2.0)
                .rules(gateway)
                .build(),
        ])
        .build())
}

/// Task 5: MPLS on the core links and LDP router ids.
pub fn mpls() -> Result<Task, QueryError> {
    let link = [line("mpls ip"), line("mpls label protocol ldp")];
    let mut links = on_interfaces(&[Role::Toronto, Role::Ottawa], ["GigabitEthernet0/0/0".to_string()], &link)?;
    links.extend(on_interfaces(
        &[Role::Isp],
        ["GigabitEthernet0/0/0".to_string(), "GigabitEthernet0/0/1".to_string()],
        &link,
    )?);

    let ldp = vec![Rule::document(
        &[Role::Toronto, Role::Isp, Role::Ottawa],
        DocCheck::Line("mpls ldp router-id Loopback1 force".into()),
    )];

    Ok(Task::builder()
        .name("Task 5: MPLS")
        .out_of(12.0)
        .categories(vec![
            Category::builder().name("MPLS links").budget(8.0).rules(links).build(),
            Category::builder().name("LDP router-id").budget(4.0).rules(ldp).build(),
        ])
        .build())
}

/// Task 6: INET VRF, mGRE tunnels, NHRP and IPsec.
pub fn dmvpn(params: &GroupParams) -> Result<Task, QueryError> {
    let mut vrf = vec![Rule::document(&[Role::TorD2], DocCheck::present("vrf definition INET")?)];
    vrf.extend(on_interfaces(
        &[Role::TorD2],
        ["Vlan100", "Vlan300", "Vlan400"].map(String::from),
        &[line("vrf forwarding INET")],
    )?);

    let mut tunnel = Vec::new();
    let mut nhrp = Vec::new();
    let mut ipsec = Vec::new();
    for role in Role::SITES {
        let Some((uplink, public_ip)) = params.internet_uplink(role) else {
            continue;
        };
        let Some(overlay_ip) = params.tunnel_address(role) else {
            continue;
        };

        tunnel.push(Rule::block(&[role], Block::interface("Tunnel1")?, vec![
            line("tunnel mode gre multipoint"),
            Check::AnyLine(vec![
                format!("tunnel source {uplink}"),
                format!("tunnel source {public_ip}"),
            ]),
            line(format!("tunnel key {}", params.tunnel_key())),
            Check::Address {
                ip:   overlay_ip,
                mask: Some("255.255.255.0".into()),
            },
            line(format!("bandwidth {TUNNEL_BANDWIDTH}")),
            line(format!("delay {}", params.tunnel_delay())),
        ]));

        let mut nhrp_checks = vec![
            line(format!("ip nhrp network-id {}", params.nhrp_network_id())),
            contains("ip nhrp authentication"),
        ];
        if role == Role::Toronto {
            nhrp_checks.push(line("ip nhrp redirect"));
        }
        nhrp.push(Rule::block(&[role], Block::interface("Tunnel1")?, nhrp_checks));
    }

    ipsec.push(Rule::document(&Role::SITES, DocCheck::Present {
        what:    "ISAKMP key for 0.0.0.0".into(),
        pattern: Pattern::new(r"crypto isakmp key \S+ address 0\.0\.0\.0")?,
    }));
    ipsec.push(Rule::block(
        &Role::SITES,
        Block::words(&format!("crypto isakmp policy {}", params.ike_policy()))?,
        ["sha512", "aes 256", "pre-share", "group 14"]
            .into_iter()
            .map(contains)
            .collect(),
    ));
    ipsec.push(Rule::block(
        &Role::SITES,
        Block::new(
            "crypto ipsec transform-set *_TRANS",
            Pattern::new(r"crypto ipsec transform-set \S+_TRANS(?:\s|$)")?,
        ),
        vec![
            Check::HeaderContains("esp-aes 256".into()),
            Check::HeaderContains("esp-sha512-hmac".into()),
            line("mode transport"),
        ],
    ));
    ipsec.push(Rule::block(
        &Role::SITES,
        Block::new(
            "crypto ipsec profile *_PROFILE",
            Pattern::new(r"crypto ipsec profile \S+_PROFILE(?:\s|$)")?,
        ),
        vec![contains("set transform-set")],
    ));
    ipsec.push(Rule::block(&Role::SITES, Block::interface("Tunnel1")?, vec![contains(
        "tunnel protection ipsec profile",
    )]));

    Ok(Task::builder()
        .name("Task 6: DMVPN Phase 3")
        .out_of(20.0)
        .categories(vec![
            Category::builder().name("INET VRF").budget(3.0).rules(vrf).build(),
            Category::builder()
                .name("tunnel interface")
                .budget(7.0)
                .rules(tunnel)
                .build(),
            Category::builder().name("NHRP").budget(3.0).rules(nhrp).build(),
            Category::builder().name("IPsec").budget(7.0).rules(ipsec).build(),
        ])
        .build())
}

/// Task 7: named EIGRP and static routes.
pub fn routing(params: &GroupParams) -> Result<Task, QueryError> {
    let process = Block::new(
        format!("router eigrp {}", params.eigrp_process_name()),
        Pattern::new(&format!(r"router eigrp {}(?:\s|$)", params.eigrp_process_pattern()))?,
    );
    let family = Block::words(&format!(
        "address-family ipv4 unicast autonomous-system {}",
        params.eigrp_as()
    ))?;

    let mut eigrp = Vec::new();
    for role in Role::ROUTERS {
        let mut checks: Vec<Check> = params
            .eigrp_networks(role)
            .into_iter()
            .map(Check::Network)
            .collect();
        if let Some(subnet) = params.internet_subnet(role) {
            checks.push(Check::NoNetworkWithin(subnet.to_string()));
        }
        if let Some(router_id) = params.router_id(role) {
            checks.push(line(format!("eigrp router-id {router_id}")));
        }

        eigrp.push(Rule::block(&[role], process.clone(), vec![Check::Nested {
            block: family.clone(),
            checks,
        }]));
    }

    let statics = vec![
        Rule::document(
            &Role::DISTRIBUTION,
            DocCheck::Line(format!("ip route 0.0.0.0 0.0.0.0 172.16.{}.1", params.group())),
        ),
        Rule::document(
            &[Role::Toronto],
            DocCheck::Line(format!("ip route 172.16.0.0 255.255.0.0 {}", params.lan_gateway())),
        ),
    ];

    Ok(Task::builder()
        .name("Task 7: Routing")
        .out_of(15.0)
        .categories(vec![
            Category::builder().name("EIGRP").budget(11.0).rules(eigrp).build(),
            Category::builder()
                .name("static routes")
                .budget(4.0)
                .rules(statics)
                .build(),
        ])
        .build())
}

/// Task 8: clock and NTP.
pub fn ip_services() -> Result<Task, QueryError> {
    let clock = vec![
        Rule::document(&Role::ALL, DocCheck::present("clock timezone EST -5")?),
        Rule::document(&Role::ALL, DocCheck::present("clock summer-time EDT recurring")?),
    ];

    let master = vec![Rule::document(&[Role::Isp], DocCheck::present("ntp master 2")?)];

    let clients = vec![
        Rule::document(&Role::SITES, DocCheck::present(&format!("ntp server {ISP_LOOPBACK}"))?),
        Rule::document(&Role::SWITCHES, DocCheck::present(&format!("ntp server {TORONTO_LOOPBACK}"))?),
    ];

    Ok(Task::builder()
        .name("Task 8: IP Services")
        .out_of(8.0)
        .categories(vec![
            Category::builder().name("clock").budget(3.0).rules(clock).build(),
            Category::builder().name("NTP master").budget(2.0).rules(master).build(),
            Category::builder().name("NTP clients").budget(3.0).rules(clients).build(),
        ])
        .build())
}
