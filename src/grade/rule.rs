#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Declarative grading rules.
//!
//! A [`Task`] is a list of weighted [`Category`]s, each a list of [`Rule`]s.
//! Rules hold concrete expected values: the catalogue builds them for one
//! group immediately before evaluation.

use std::fmt;

use bon::Builder;
use itertools::Itertools;

use crate::{
    constants::DEFAULT_STANDBY_PRIORITY,
    ios::{ConfigDocument, Pattern, QueryError, Role, Statement},
    params::address_in_subnet,
};

/// A top-level construct a rule inspects, such as an interface.
#[derive(Debug, Clone)]
pub struct Block {
    /// How the construct is named in comments.
    label:   String,
    /// Matcher for the header line.
    pattern: Pattern,
}

impl Block {
    /// A block labelled `label`, located by `pattern`.
    pub fn new(label: impl Into<String>, pattern: Pattern) -> Self {
        Self {
            label: label.into(),
            pattern,
        }
    }

    /// `interface <name>`, matched exactly so `Vlan10` never finds `Vlan100`.
    pub fn interface(name: &str) -> Result<Self, QueryError> {
        let header = format!("interface {name}");
        Ok(Self::new(header.clone(), Pattern::exact(&header)?))
    }

    /// A header starting with the words `header`.
    pub fn words(header: &str) -> Result<Self, QueryError> {
        Ok(Self::new(header, Pattern::words(header)?))
    }

    /// Label used in comments.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// First top-level statement this block refers to.
    pub fn locate<'a>(&self, doc: &'a ConfigDocument) -> Option<Statement<'a>> {
        doc.first_top_level(&self.pattern)
    }

    /// First child of `parent` this block refers to.
    pub fn locate_child<'a>(&self, parent: Statement<'a>) -> Option<Statement<'a>> {
        parent.find_child(&self.pattern)
    }
}

/// Link aggregation protocol implied by a `channel-group` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BundleProtocol {
    /// `active` or `passive`.
    Lacp,
    /// `desirable` or `auto`.
    Pagp,
    /// `on`, or no mode at all.
    Static,
}

impl BundleProtocol {
    /// Classifies a `channel-group N mode X` line.
    pub fn from_line(line: &str) -> Self {
        let mode = line
            .split_whitespace()
            .skip_while(|word| *word != "mode")
            .nth(1);

        match mode {
            Some("active" | "passive") => BundleProtocol::Lacp,
            Some("desirable" | "auto") => BundleProtocol::Pagp,
            _ => BundleProtocol::Static,
        }
    }
}

impl fmt::Display for BundleProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BundleProtocol::Lacp => "LACP",
            BundleProtocol::Pagp => "PAgP",
            BundleProtocol::Static => "Static",
        })
    }
}

/// A check made against the children of a located block.
#[derive(Debug, Clone)]
pub enum Check {
    /// A child reads exactly this line.
    Line(String),
    /// A child reads exactly one of these lines.
    AnyLine(Vec<String>),
    /// A child contains this fragment.
    Contains(String),
    /// The block header itself contains this fragment.
    HeaderContains(String),
    /// An `ip address` child carries this address (and mask, when given).
    Address {
        /// Expected address.
        ip:   String,
        /// Expected dotted mask.
        mask: Option<String>,
    },
    /// Some `ip address` child is present.
    HasAddress,
    /// A child starting with one of `keys` ends in `value`.
    Setting {
        /// Accepted spellings of the setting.
        keys:  Vec<String>,
        /// Expected final token.
        value: String,
    },
    /// A `network <address>` child is present.
    Network(String),
    /// No `network` child falls inside this subnet.
    NoNetworkWithin(String),
    /// A `standby <group> ip <address>` child is present.
    VirtualIp {
        /// HSRP group.
        group:  u64,
        /// Subnet the virtual address must fall in.
        subnet: Option<String>,
    },
    /// The interface exists and is bundled with `channel-group <group>`.
    ChannelMember {
        /// Member interface name.
        interface: String,
        /// Channel number.
        group:     u64,
    },
    /// Every bundled member uses the same protocol.
    ChannelProtocol {
        /// Member interface names.
        members: Vec<String>,
    },
    /// Checks run against a child block, such as an address family.
    Nested {
        /// The child construct.
        block:  Block,
        /// Checks against its children.
        checks: Vec<Check>,
    },
}

impl Check {
    /// Sub-checks this check stands for.
    pub fn sub_checks(&self) -> usize {
        match self {
            Check::Nested { checks, .. } => checks.iter().map(Check::sub_checks).sum(),
            _ => 1,
        }
    }

    /// Tests a leaf check against `stmt`; the error describes what was wrong.
    ///
    /// [`Check::Nested`] is structural and always passes here; the evaluator
    /// descends into it instead.
    pub fn test(&self, doc: &ConfigDocument, stmt: Statement<'_>) -> Result<(), String> {
        match self {
            Check::Line(line) => stmt
                .contains_among_children(line)
                .then_some(())
                .ok_or_else(|| format!("missing '{line}'")),
            Check::AnyLine(lines) => lines
                .iter()
                .any(|line| stmt.contains_among_children(line))
                .then_some(())
                .ok_or_else(|| {
                    format!(
                        "expected one of {}",
                        lines.iter().map(|l| format!("'{l}'")).join(", ")
                    )
                }),
            Check::Contains(fragment) => stmt
                .any_child_contains(fragment)
                .then_some(())
                .ok_or_else(|| format!("no line containing '{fragment}'")),
            Check::HeaderContains(fragment) => stmt
                .text()
                .contains(fragment.as_str())
                .then_some(())
                .ok_or_else(|| format!("'{fragment}' not set")),
            Check::Address { ip, mask } => test_address(stmt, ip, mask.as_deref()),
            Check::HasAddress => stmt
                .child_starting_with("ip address ")
                .map(|_| ())
                .ok_or_else(|| "no IP address".to_string()),
            Check::Setting { keys, value } => test_setting(stmt, keys, value),
            Check::Network(network) => network_lines(stmt)
                .any(|address| address == network)
                .then_some(())
                .ok_or_else(|| format!("missing 'network {network}'")),
            Check::NoNetworkWithin(subnet) => {
                let leaked = network_lines(stmt)
                    .filter(|address| address_in_subnet(address, subnet))
                    .collect_vec();
                if leaked.is_empty() {
                    Ok(())
                } else {
                    Err(format!("must not advertise {}", leaked.join(", ")))
                }
            }
            Check::VirtualIp { group, subnet } => test_virtual_ip(stmt, *group, subnet.as_deref()),
            Check::ChannelMember { interface, group } => test_member(doc, interface, *group),
            Check::ChannelProtocol { members } => test_protocol(doc, members),
            Check::Nested { .. } => Ok(()),
        }
    }
}

/// Looks for `ip address <ip> <mask>` among the children.
fn test_address(stmt: Statement<'_>, ip: &str, mask: Option<&str>) -> Result<(), String> {
    let found = stmt
        .children()
        .filter(|child| child.text().starts_with("ip address "))
        .map(|child| child.text().split_whitespace().skip(2).collect_vec())
        .collect_vec();

    let matches = found.iter().any(|tokens| {
        tokens.first() == Some(&ip) && mask.is_none_or(|mask| tokens.get(1) == Some(&mask))
    });
    if matches {
        return Ok(());
    }

    let expected = match mask {
        Some(mask) => format!("{ip} {mask}"),
        None => ip.to_string(),
    };
    let found = found
        .first()
        .map_or_else(|| "none".to_string(), |tokens| tokens.join(" "));
    Err(format!("expected address {expected}, found {found}"))
}

/// Looks for a child spelled like one of `keys` whose last token is `value`.
fn test_setting(stmt: Statement<'_>, keys: &[String], value: &str) -> Result<(), String> {
    let Some(key) = keys.first() else {
        return Ok(());
    };

    let found = stmt.children().find(|child| {
        keys.iter().any(|key| {
            child
                .text()
                .strip_prefix(key.as_str())
                .is_some_and(|rest| rest.starts_with(char::is_whitespace))
        })
    });

    match found {
        None => Err(format!("missing '{key} {value}'")),
        Some(child) if child.text().split_whitespace().last() == Some(value) => Ok(()),
        Some(child) => Err(format!("expected '{key} {value}', found '{}'", child.text())),
    }
}

/// Addresses named by `network` children.
fn network_lines<'a>(stmt: Statement<'a>) -> impl Iterator<Item = &'a str> + 'a {
    stmt.children().filter_map(|child| {
        let mut words = child.text().split_whitespace();
        (words.next() == Some("network")).then(|| words.next()).flatten()
    })
}

/// Looks for `standby <group> ip <address>`.
fn test_virtual_ip(stmt: Statement<'_>, group: u64, subnet: Option<&str>) -> Result<(), String> {
    let prefix = format!("standby {group} ip");
    let Some(child) = stmt.children().find(|child| {
        child
            .text()
            .strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
    }) else {
        return Err(format!("missing virtual IP for standby group {group}"));
    };

    let address = child.text().split_whitespace().nth(3);
    match (address, subnet) {
        (_, None) => Ok(()),
        (Some(address), Some(subnet)) if address_in_subnet(address, subnet) => Ok(()),
        (address, Some(subnet)) => Err(format!(
            "virtual IP {} is outside {subnet}",
            address.unwrap_or("(none)")
        )),
    }
}

/// First `channel-group` line of an interface.
fn channel_group_line<'a>(doc: &'a ConfigDocument, interface: &str) -> Option<&'a str> {
    let header = format!("interface {interface}");
    doc.top_level()
        .find(|stmt| stmt.text() == header)
        .and_then(|stmt| stmt.child_starting_with("channel-group"))
        .map(|child| child.text())
}

/// Checks one EtherChannel member.
fn test_member(doc: &ConfigDocument, interface: &str, group: u64) -> Result<(), String> {
    let header = format!("interface {interface}");
    if !doc.has_top_level_line(&header) {
        return Err(format!("member {interface} missing"));
    }

    let bundled = channel_group_line(doc, interface).is_some_and(|line| {
        line.split_whitespace().nth(1) == Some(group.to_string().as_str())
    });
    if bundled {
        Ok(())
    } else {
        Err(format!("{interface} not bundled with 'channel-group {group}'"))
    }
}

/// Checks that every bundled member agrees on the protocol.
fn test_protocol(doc: &ConfigDocument, members: &[String]) -> Result<(), String> {
    let protocols = members
        .iter()
        .filter_map(|member| channel_group_line(doc, member))
        .map(BundleProtocol::from_line)
        .sorted()
        .dedup()
        .collect_vec();

    if protocols.len() > 1 {
        Err(format!("members disagree on protocol ({})", protocols.iter().join(", ")))
    } else {
        if let Some(protocol) = protocols.first() {
            tracing::debug!("Channel members use {protocol}.");
        }
        Ok(())
    }
}

/// A check made against a whole configuration.
#[derive(Debug, Clone)]
pub enum DocCheck {
    /// Some top-level statement matches.
    Present {
        /// How the construct is named in comments.
        what:    String,
        /// Matcher for the statement.
        pattern: Pattern,
    },
    /// A top-level statement reads exactly this line.
    Line(String),
    /// Bridge priorities of `preferred` VLANs are all lower than those of
    /// `over`.
    SpanningTreeOrder {
        /// VLANs this switch should be root for.
        preferred: Vec<u64>,
        /// VLANs it should not.
        over:      Vec<u64>,
    },
    /// Standby priorities of `preferred` VLANs are all higher than those of
    /// `over`. Each entry is `(vlan, hsrp group)`.
    StandbyOrder {
        /// VLANs this switch should be active for.
        preferred: Vec<(u64, u64)>,
        /// VLANs it should stand by for.
        over:      Vec<(u64, u64)>,
    },
}

impl DocCheck {
    /// A check for a top-level statement starting with the words `text`.
    pub fn present(text: &str) -> Result<Self, QueryError> {
        Ok(DocCheck::Present {
            what:    format!("'{text}'"),
            pattern: Pattern::words(text)?,
        })
    }

    /// Tests the check; the error describes what was wrong.
    pub fn test(&self, doc: &ConfigDocument) -> Result<(), String> {
        match self {
            DocCheck::Present { what, pattern } => doc
                .first_top_level(pattern)
                .map(|_| ())
                .ok_or_else(|| format!("missing {what}")),
            DocCheck::Line(line) => doc
                .has_top_level_line(line)
                .then_some(())
                .ok_or_else(|| format!("missing '{line}'")),
            DocCheck::SpanningTreeOrder { preferred, over } => {
                let lookup = |vlan: &u64| {
                    bridge_priority(doc, *vlan)
                        .ok_or_else(|| format!("no spanning-tree priority for VLAN {vlan}"))
                };
                let preferred = preferred.iter().map(lookup).collect::<Result<Vec<_>, _>>()?;
                let over = over.iter().map(lookup).collect::<Result<Vec<_>, _>>()?;
                ordered(&preferred, &over, |p, o| p < o, "bridge priority", "lower")
            }
            DocCheck::StandbyOrder { preferred, over } => {
                let lookup = |&(vlan, group): &(u64, u64)| (vlan, standby_priority(doc, vlan, group));
                let preferred = preferred.iter().map(lookup).collect_vec();
                let over = over.iter().map(lookup).collect_vec();
                ordered(&preferred, &over, |p, o| p > o, "standby priority", "higher")
            }
        }
    }
}

/// Compares every `(vlan, priority)` in `preferred` against every one in
/// `over`.
fn ordered(
    preferred: &[(u64, u64)],
    over: &[(u64, u64)],
    holds: impl Fn(u64, u64) -> bool,
    what: &str,
    direction: &str,
) -> Result<(), String> {
    let broken = preferred
        .iter()
        .cartesian_product(over)
        .find(|((_, p), (_, o))| !holds(*p, *o));

    match broken {
        None => Ok(()),
        Some(((pv, p), (ov, o))) => Err(format!(
            "VLAN {pv} {what} {p} is not {direction} than VLAN {ov} {what} {o}"
        )),
    }
}

/// Bridge priority configured for `vlan`, as `(vlan, priority)`.
fn bridge_priority(doc: &ConfigDocument, vlan: u64) -> Option<(u64, u64)> {
    doc.top_level().find_map(|stmt| {
        let rest = stmt.text().strip_prefix("spanning-tree vlan ")?;
        let (list, priority) = rest.split_once(" priority ")?;
        if !vlan_list_contains(list.trim(), vlan) {
            return None;
        }
        priority.trim().parse().ok().map(|priority| (vlan, priority))
    })
}

/// Whether a VLAN list such as `10,307` or `200-210` names `vlan`.
pub fn vlan_list_contains(list: &str, vlan: u64) -> bool {
    list.split(',').any(|item| match item.split_once('-') {
        Some((low, high)) => match (low.trim().parse::<u64>(), high.trim().parse::<u64>()) {
            (Ok(low), Ok(high)) => (low..=high).contains(&vlan),
            _ => false,
        },
        None => item.trim().parse::<u64>() == Ok(vlan),
    })
}

/// Standby priority of `group` on `interface Vlan<vlan>`, defaulting when
/// unset.
fn standby_priority(doc: &ConfigDocument, vlan: u64, group: u64) -> u64 {
    let header = format!("interface Vlan{vlan}");
    let prefix = format!("standby {group} priority ");
    doc.top_level()
        .find(|stmt| stmt.text() == header)
        .and_then(|stmt| {
            stmt.children().find_map(|child| {
                child
                    .text()
                    .strip_prefix(prefix.as_str())
                    .and_then(|rest| rest.split_whitespace().next())
                    .and_then(|p| p.parse().ok())
            })
        })
        .unwrap_or(DEFAULT_STANDBY_PRIORITY)
}

/// One graded requirement, applied to each device of the listed roles.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Locate a block on each device, then check its children.
    Block {
        /// Devices the rule applies to.
        roles:  Vec<Role>,
        /// Construct to locate.
        block:  Block,
        /// Checks against the located construct.
        checks: Vec<Check>,
    },
    /// Check the whole configuration of each device.
    Document {
        /// Devices the rule applies to.
        roles: Vec<Role>,
        /// The check.
        check: DocCheck,
    },
}

impl Rule {
    /// A block rule.
    pub fn block(roles: &[Role], block: Block, checks: Vec<Check>) -> Self {
        Rule::Block {
            roles: roles.to_vec(),
            block,
            checks,
        }
    }

    /// A document rule.
    pub fn document(roles: &[Role], check: DocCheck) -> Self {
        Rule::Document {
            roles: roles.to_vec(),
            check,
        }
    }

    /// Devices the rule applies to.
    pub fn roles(&self) -> &[Role] {
        match self {
            Rule::Block { roles, .. } | Rule::Document { roles, .. } => roles,
        }
    }

    /// Sub-checks made on each applicable device.
    pub fn sub_checks(&self) -> usize {
        match self {
            Rule::Block { checks, .. } => checks.iter().map(Check::sub_checks).sum(),
            Rule::Document { .. } => 1,
        }
    }
}

/// A weighted group of rules.
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct Category {
    /// Name used in logs.
    name:   String,
    /// Points split evenly across the declared sub-checks.
    budget: f64,
    /// Awarded when every evaluated sub-check passed.
    #[builder(default)]
    bonus:  f64,
    /// Rules in evaluation order.
    #[builder(default)]
    rules:  Vec<Rule>,
}

impl Category {
    /// Category name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bonus points.
    pub fn bonus(&self) -> f64 {
        self.bonus
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Sub-checks declared across all rules and roles, whether or not the
    /// devices were submitted.
    pub fn declared_sub_checks(&self) -> usize {
        self.rules
            .iter()
            .map(|rule| rule.roles().len() * rule.sub_checks())
            .sum()
    }

    /// Points lost per failed sub-check.
    pub fn delta(&self) -> f64 {
        match self.declared_sub_checks() {
            0 => 0.0,
            declared => self.budget / declared as f64,
        }
    }
}

/// A graded task: weighted categories and a maximum.
#[derive(Debug, Clone, Builder)]
#[builder(on(String, into))]
pub struct Task {
    /// Name used in output records.
    name:       String,
    /// Maximum grade.
    out_of:     f64,
    /// Categories in evaluation order.
    #[builder(default)]
    categories: Vec<Category>,
}

impl Task {
    /// Task name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum grade.
    pub fn out_of(&self) -> f64 {
        self.out_of
    }

    /// Categories in evaluation order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vlan_lists_accept_commas_and_ranges() {
        assert!(vlan_list_contains("10,307", 307));
        assert!(vlan_list_contains("200-210", 207));
        assert!(!vlan_list_contains("10,307", 207));
        assert!(!vlan_list_contains("x-y", 1));
    }

    #[test]
    fn channel_modes_map_to_protocols() {
        assert_eq!(BundleProtocol::from_line("channel-group 1 mode active"), BundleProtocol::Lacp);
        assert_eq!(BundleProtocol::from_line("channel-group 1 mode auto"), BundleProtocol::Pagp);
        assert_eq!(BundleProtocol::from_line("channel-group 1 mode on"), BundleProtocol::Static);
        assert_eq!(BundleProtocol::from_line("channel-group 1"), BundleProtocol::Static);
    }

    #[test]
    fn setting_compares_the_final_token() {
        let doc = ConfigDocument::parse(
            "interface Port-channel2\n spanning-tree vlan 10 cost 24\n",
        );
        let stmt = doc.top_level().next().expect("one statement");
        let check = Check::Setting {
            keys:  vec!["spanning-tree vlan 10 cost".into(), "spanning-tree cost".into()],
            value: "24".into(),
        };
        assert!(check.test(&doc, stmt).is_ok());

        let wrong = Check::Setting {
            keys:  vec!["spanning-tree cost".into()],
            value: "24".into(),
        };
        assert!(wrong.test(&doc, stmt).is_err());
    }
}
