//! Tests for the configuration parser and query primitives.

use cfgrade::ios::{CommentPolicy, ConfigDocument, ParseOptions, Pattern, QueryError};

const SAMPLE: &str = "\
hostname TOR-D1
!
interface Vlan10
 ip address 172.16.7.2 255.255.255.0
 standby version 2
 standby 24 ip 172.16.7.254
!
interface Vlan100
 ip address 199.212.32.254 255.255.255.0
!
router eigrp OntarioTech07
 address-family ipv4 unicast autonomous-system 7
  network 1.1.1.1 0.0.0.0
  eigrp router-id 1.1.1.1
 exit-address-family
";

#[test]
fn top_level_preserves_source_order_and_count() {
    let doc = ConfigDocument::parse(SAMPLE);
    let top: Vec<_> = doc.top_level().map(|stmt| stmt.text()).collect();

    assert_eq!(top, vec![
        "hostname TOR-D1",
        "!",
        "interface Vlan10",
        "!",
        "interface Vlan100",
        "!",
        "router eigrp OntarioTech07",
    ]);
    assert_eq!(doc.len(), SAMPLE.lines().filter(|l| !l.trim().is_empty()).count());
}

#[test]
fn children_nest_by_indentation() {
    let doc = ConfigDocument::parse(SAMPLE);
    let router = doc
        .top_level()
        .find(|stmt| stmt.text().starts_with("router eigrp"))
        .expect("router block");

    let family = router.children().next().expect("address family");
    assert_eq!(family.depth(), 1);
    assert_eq!(family.parent(), Some(router));
    assert_eq!(family.children_text(), vec!["network 1.1.1.1 0.0.0.0", "eigrp router-id 1.1.1.1"]);
    assert_eq!(router.children_text().last(), Some(&"exit-address-family"));
}

/// Network addresses under the first top-level block.
fn first_block_networks(doc: &ConfigDocument) -> impl Iterator<Item = &str> {
    doc.top_level()
        .take(1)
        .flat_map(|block| block.children())
        .filter_map(|child| child.text().strip_prefix("network "))
}

#[test]
fn children_outlive_the_statement_handle() {
    let doc = ConfigDocument::parse("router eigrp X\n network 1.1.1.1\n network 10.1.7.0\n");
    assert_eq!(first_block_networks(&doc).collect::<Vec<_>>(), vec!["1.1.1.1", "10.1.7.0"]);
}

#[test]
fn over_indented_lines_attach_to_nearest_ancestor() {
    let doc = ConfigDocument::parse("interface Tunnel1\n      tunnel key 21\n  delay 34\nend\n");
    let tunnel = doc.top_level().next().expect("tunnel");

    assert_eq!(tunnel.children_text(), vec!["tunnel key 21", "delay 34"]);
    assert_eq!(doc.top_level().count(), 2);
}

#[test]
fn comments_can_be_skipped() {
    let kept = ConfigDocument::parse(SAMPLE);
    let skipped = ConfigDocument::parse_with(
        SAMPLE,
        &ParseOptions::default().with_comments(CommentPolicy::Skip),
    );

    assert_eq!(kept.top_level().count(), 7);
    assert_eq!(skipped.top_level().count(), 4);
    assert!(skipped.top_level().all(|stmt| !stmt.text().starts_with('!')));
}

#[test]
fn empty_input_yields_empty_document() {
    let doc = ConfigDocument::parse("\n   \n\n");
    assert!(doc.is_empty());
    assert_eq!(doc.top_level().count(), 0);
}

#[test]
fn exact_interface_lookup_does_not_match_longer_names() {
    let doc = ConfigDocument::parse(SAMPLE);
    let vlan10 = Pattern::exact("interface Vlan10").expect("pattern");
    let prefix = Pattern::new("interface Vlan10").expect("pattern");

    assert_eq!(doc.find_top_level(&vlan10).len(), 1);
    assert_eq!(doc.find_top_level(&prefix).len(), 2);
}

#[test]
fn child_primitives_distinguish_exact_and_substring() {
    let doc = ConfigDocument::parse(SAMPLE);
    let vlan10 = doc
        .first_top_level(&Pattern::exact("interface Vlan10").expect("pattern"))
        .expect("Vlan10");

    assert!(vlan10.contains_among_children("standby version 2"));
    assert!(!vlan10.contains_among_children("standby version"));
    assert!(vlan10.any_child_contains("standby 24 ip"));
    assert_eq!(
        vlan10
            .find_child(&Pattern::new(r"standby \d+ ip").expect("pattern"))
            .map(|stmt| stmt.text()),
        Some("standby 24 ip 172.16.7.254")
    );
    assert!(vlan10.child_starting_with("ip address").is_some());
    assert!(doc.has_top_level_line("hostname TOR-D1"));
    assert!(!doc.has_top_level_line("hostname"));
}

#[test]
fn case_insensitive_patterns_capture() {
    let pattern = Pattern::case_insensitive(r"hostname\s+(\S+)").expect("pattern");
    assert_eq!(pattern.capture("HOSTNAME OSH-R1", 1), Some("OSH-R1"));
    assert!(!Pattern::new("hostname").expect("pattern").is_match("HOSTNAME x"));
}

#[test]
fn invalid_patterns_are_reported() {
    let err = Pattern::new("interface (").expect_err("unbalanced group");
    assert!(matches!(err, QueryError::InvalidPattern { ref pattern, .. } if pattern == "interface ("));
}
