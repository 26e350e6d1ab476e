//! Tests for the per-group expected values.

use cfgrade::{
    Role,
    params::{GroupParams, address_in_subnet, dotted_mask, split_cidr},
};

#[test]
fn group_seven_values() {
    let params = GroupParams::new(7);

    assert_eq!(params.vlan_2xx(), 207);
    assert_eq!(params.vlan_3xx(), 307);
    assert_eq!(params.hsrp_group(10), 24);
    assert_eq!(params.hsrp_group(207), 221);
    assert_eq!(params.port_cost(), 24);
    assert_eq!(params.tunnel_delay(), 34);
    assert_eq!(params.tunnel_key(), 21);
    assert_eq!(params.lan_address(), "172.16.7.1/24");
    assert_eq!(params.lan_gateway(), "172.16.7.254");
    assert_eq!(params.tunnel_address(Role::Oshawa).as_deref(), Some("10.1.7.3"));
    assert_eq!(params.tunnel_address(Role::Isp), None);
    assert_eq!(params.eigrp_process_name(), "OntarioTech07");
}

#[test]
fn cidr_conversion() {
    assert_eq!(dotted_mask("24"), "255.255.255.0");
    assert_eq!(dotted_mask("29"), "255.255.255.248");
    assert_eq!(split_cidr("172.16.7.1/24"), ("172.16.7.1", Some("255.255.255.0")));
    assert_eq!(split_cidr("172.16.7.1"), ("172.16.7.1", None));
}

#[test]
fn extreme_group_numbers_do_not_overflow() {
    for group in [0, 1, 99, u32::MAX] {
        let params = GroupParams::new(group);
        let n = u64::from(group);

        assert_eq!(params.vlan_3xx(), 300 + n);
        assert_eq!(params.hsrp_group(params.vlan_3xx()), 2 * n + 300 + n);
        assert_eq!(params.tunnel_key(), 3 * n);
        assert!(params.eigrp_process_pattern().ends_with(&group.to_string()));
        for role in Role::ALL {
            let _ = params.interface_addresses(role);
            let _ = params.eigrp_networks(role);
        }
        let _ = params.answer_key();
    }
}

#[test]
fn toronto_advertises_overlay_and_lan() {
    let networks = GroupParams::new(7).eigrp_networks(Role::Toronto);
    assert_eq!(networks, vec!["1.1.1.1", "10.1.7.0", "10.202.10.0", "172.16.7.0"]);
    assert!(GroupParams::new(7).eigrp_networks(Role::TorA1).is_empty());
}

#[test]
fn interface_table_matches_each_role() {
    let params = GroupParams::new(7);

    let d2: Vec<_> = params
        .interface_addresses(Role::TorD2)
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(d2, vec!["Vlan100", "Vlan300", "Vlan400"]);
    assert!(params.interface_addresses(Role::TorA1).is_empty());
    assert!(
        params
            .interface_addresses(Role::Ottawa)
            .contains(&("Loopback103", "172.16.86.7/24".to_string()))
    );
}

#[test]
fn internet_subnets_contain_site_addresses() {
    let params = GroupParams::new(7);
    for role in Role::SITES {
        let (_, public_ip) = params.internet_uplink(role).expect("site uplink");
        let subnet = params.internet_subnet(role).expect("site subnet");
        assert!(address_in_subnet(&public_ip, subnet), "{role}");
    }
}

#[test]
fn answer_key_serializes() {
    let key = GroupParams::new(7).answer_key();
    let json = serde_json::to_value(&key).expect("serialize");

    assert_eq!(json["group"], 7);
    assert_eq!(json["port_cost"], 24);
    assert_eq!(json["interfaces"]["Toronto"]["Tunnel1"], "10.1.7.1/24");
    assert_eq!(json["interfaces"]["TOR-D2"]["Vlan100"], "199.212.32.254/24");
    assert_eq!(json["hsrp_groups"]["207"], 221);
}
