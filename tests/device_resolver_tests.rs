//! Tests for matching submitted files to device roles.

use cfgrade::{
    GradeError, Role,
    ios::{DeviceResolver, ParseOptions, SubmissionFile},
};

fn file(name: &str, content: &str) -> SubmissionFile {
    SubmissionFile::new(name, content)
}

#[test]
fn file_names_then_hostnames() {
    let resolver = DeviceResolver::new(3, ParseOptions::default());
    let devices = resolver
        .resolve(vec![
            file("TOR-A1-config.txt", "hostname Switch\n"),
            file("ottawa.cfg", "hostname R2\n"),
            file("unnamed1.txt", "!\nhostname OSH-R1\n"),
        ])
        .expect("three roles");

    let roles: Vec<Role> = devices.keys().copied().collect();
    assert_eq!(roles, vec![Role::Ottawa, Role::Oshawa, Role::TorA1]);
    assert_eq!(devices[&Role::Oshawa].source(), "unnamed1.txt");
}

#[test]
fn too_few_roles_is_reported() {
    let resolver = DeviceResolver::default();
    let err = resolver
        .resolve(vec![file("isp.txt", ""), file("toronto.txt", "")])
        .expect_err("only two roles");

    assert!(matches!(err, GradeError::InsufficientDevices { found: 2, required: 4 }));
}

#[test]
fn later_file_overwrites_earlier_one() {
    let resolver = DeviceResolver::new(1, ParseOptions::default());
    let devices = resolver
        .resolve(vec![
            file("isp-draft.txt", "hostname ISP\n"),
            file("isp-final.txt", "hostname ISP\nntp master 2\n"),
        ])
        .expect("one role");

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[&Role::Isp].source(), "isp-final.txt");
}

#[test]
fn unmatched_and_unreadable_files_are_dropped() {
    let resolver = DeviceResolver::new(1, ParseOptions::default());
    let devices = resolver
        .resolve(vec![
            file("notes.txt", "nothing to see here\n"),
            file("router9.txt", "hostname Core9\n"),
            SubmissionFile::unreadable("mystery.bin", "permission denied"),
            file("TOR-D2.txt", "hostname TOR-D2\n"),
        ])
        .expect("one role");

    assert_eq!(devices.keys().copied().collect::<Vec<_>>(), vec![Role::TorD2]);
}

#[test]
fn keyword_table_order_breaks_ties() {
    assert_eq!(Role::from_keywords("toronto-isp.txt"), Some(Role::Toronto));
    assert_eq!(Role::from_keywords("TOR-D1_final.txt"), Some(Role::TorD1));
    assert_eq!(Role::from_keywords("backup-d2.txt"), Some(Role::TorD2));
    assert_eq!(Role::from_keywords("unnamed1.txt"), None);
}

#[test]
fn glued_keywords_fall_back_to_the_hostname() {
    assert_eq!(Role::from_keywords("SwitchA1.txt"), None);
    assert_eq!(Role::from_keywords("TORA1.txt"), None);

    let resolver = DeviceResolver::new(2, ParseOptions::default());
    let devices = resolver
        .resolve(vec![
            file("SwitchA1.txt", "hostname TOR-A1\n"),
            file("TORA2.txt", "hostname Switch\n"),
            file("Switch-A2.txt", "hostname Switch\n"),
        ])
        .expect("two roles");

    let roles: Vec<Role> = devices.keys().copied().collect();
    assert_eq!(roles, vec![Role::TorA1, Role::TorA2]);
    assert_eq!(devices[&Role::TorA1].source(), "SwitchA1.txt");
    assert_eq!(devices[&Role::TorA2].source(), "Switch-A2.txt");
}

#[test]
fn hostname_extraction_ignores_case() {
    let resolver = DeviceResolver::default();
    assert_eq!(resolver.extract_hostname("!\n HOSTNAME Ott-R1 \n"), Some("Ott-R1"));
    assert_eq!(resolver.extract_hostname("no hostname here"), None);
}

#[test]
fn unreadable_content_surfaces_on_parse() {
    let resolver = DeviceResolver::new(1, ParseOptions::default());
    let devices = resolver
        .resolve(vec![SubmissionFile::from_bytes("isp.txt", vec![0xff, 0xfe, 0x00])])
        .expect("name alone resolves");

    let err = devices[&Role::Isp].document().expect_err("invalid UTF-8");
    assert!(matches!(err, GradeError::Unreadable { ref source_file, .. } if source_file == "isp.txt"));
}
