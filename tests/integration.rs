//! Integration tests for `resolvconf-manager`.
//!
//! Tests marked `#[ignore]` touch the real `/etc/resolv.conf` and require root:
//!
//! ```bash
//! sudo cargo test -- --ignored
//! ```

use resolvconf_manager::{
    DesiredDnsConfig, DomainEntry, FileConfigurator, FileWatcher, ReapplyRequest, Repair,
    ResolvConfError,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const ORIGINAL: &str = "# managed by dhclient\n\
                        nameserver 8.8.8.8\n\
                        search corp.example old.example\n\
                        options ndots:2\n";

fn scratch() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resolv.conf");
    std::fs::write(&path, ORIGINAL).unwrap();
    (dir, path)
}

fn desired() -> DesiredDnsConfig {
    DesiredDnsConfig::new("100.64.0.1").with_domain(DomainEntry::new("corp.example"))
}

// ---------------------------------------------------------------------------
// Tempdir tests (no root required)
// ---------------------------------------------------------------------------

#[test]
fn full_lifecycle() {
    let (_dir, path) = scratch();
    let mut c = FileConfigurator::with_path(&path);
    assert!(!c.is_managed());

    c.apply_dns_config(&desired()).unwrap();
    assert!(c.is_managed());

    let written = std::fs::read_to_string(&path).unwrap();
    let body: Vec<&str> = written.lines().skip(3).collect();
    assert_eq!(
        body,
        vec![
            "options ndots:2",
            "search corp.example old.example",
            "nameserver 100.64.0.1",
            "nameserver 8.8.8.8",
        ]
    );

    c.restore_host_dns().unwrap();
    assert!(!c.is_managed());
    assert!(!c.backup_path().exists());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), ORIGINAL);
}

#[test]
fn restart_keeps_original_backup() {
    let (_dir, path) = scratch();
    FileConfigurator::with_path(&path)
        .apply_dns_config(&desired())
        .unwrap();
    let first = std::fs::read(&path).unwrap();

    // A new process finds the backup and must not back up generated content.
    let mut c = FileConfigurator::with_path(&path);
    assert!(c.is_managed());
    c.apply_dns_config(&desired()).unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), first);
    assert_eq!(std::fs::read_to_string(c.backup_path()).unwrap(), ORIGINAL);

    c.restore_host_dns().unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), ORIGINAL);
}

#[test]
fn no_route_all_restores_and_fails() {
    let (_dir, path) = scratch();
    let mut c = FileConfigurator::with_path(&path);
    c.apply_dns_config(&desired()).unwrap();

    let err = c
        .apply_dns_config(&desired().with_route_all(false))
        .unwrap_err();
    assert!(matches!(err, ResolvConfError::NoRouteAll));
    assert!(!c.backup_path().exists());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), ORIGINAL);
}

#[test]
fn search_list_respects_limits() {
    let (_dir, path) = scratch();
    let mut c = FileConfigurator::with_path(&path);

    let mut config = DesiredDnsConfig::new("100.64.0.1");
    for i in 0..7 {
        config = config.with_domain(DomainEntry::new(format!("{i}{}", "d".repeat(49))));
    }
    c.apply_dns_config(&config).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    let search = written
        .lines()
        .find(|l| l.starts_with("search "))
        .unwrap();
    assert!(search.len() <= 256);

    // Four long desired domains fit; the short previous ones top the list up.
    let domains: Vec<&str> = search.split_whitespace().skip(1).collect();
    assert_eq!(domains.len(), 6);
    assert!(domains[..4].iter().all(|d| d.len() == 50));
    assert_eq!(domains[4..], ["corp.example", "old.example"]);
}

#[test]
fn watcher_repairs_external_rewrite() {
    let (_dir, path) = scratch();
    let watcher = FileWatcher::new(&path).with_interval(Duration::from_millis(10));
    let mut c = FileConfigurator::with_repair(&path, watcher);

    c.apply_dns_config(&desired()).unwrap();
    let applied = std::fs::read(&path).unwrap();

    std::fs::write(&path, "nameserver 192.168.1.1\n").unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let mut repaired = false;
    while Instant::now() < deadline {
        if c.process_repairs().unwrap() {
            repaired = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    assert!(repaired);
    assert_eq!(std::fs::read(&path).unwrap(), applied);
    assert!(c.repair().is_watching());

    c.restore_host_dns().unwrap();
    assert!(!c.repair().is_watching());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), ORIGINAL);
}

#[test]
fn own_write_does_not_trigger_repair() {
    let (_dir, path) = scratch();
    let watcher = FileWatcher::new(&path).with_interval(Duration::from_millis(5));
    let mut c = FileConfigurator::with_repair(&path, watcher);

    c.apply_dns_config(&desired()).unwrap();
    c.apply_dns_config(&desired()).unwrap();
    std::thread::sleep(Duration::from_millis(50));

    assert!(!c.process_repairs().unwrap());
}

#[test]
fn custom_repair_receives_applied_values() {
    #[derive(Default)]
    struct Last(Option<ReapplyRequest>);

    impl Repair for Last {
        fn watch(&mut self, request: ReapplyRequest) {
            self.0 = Some(request);
        }
        fn stop(&mut self) {
            self.0 = None;
        }
        fn try_recv(&mut self) -> Option<ReapplyRequest> {
            None
        }
    }

    let (_dir, path) = scratch();
    let mut c = FileConfigurator::with_repair(&path, Last::default());
    c.apply_dns_config(
        &desired()
            .with_domain(DomainEntry::new("match.example").match_only())
            .with_domain(DomainEntry::new("extra.example")),
    )
    .unwrap();

    assert_eq!(
        c.repair().0,
        Some(ReapplyRequest {
            search_domains: vec!["corp.example".to_string(), "extra.example".to_string()],
            name_server: "100.64.0.1".to_string(),
        })
    );
}

#[cfg(unix)]
#[test]
fn permissions_survive_apply_and_restore() {
    use std::os::unix::fs::PermissionsExt;

    let (_dir, path) = scratch();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

    let mut c = FileConfigurator::with_path(&path);
    c.apply_dns_config(&desired()).unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);

    c.restore_host_dns().unwrap();
    let mode = std::fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}

// ---------------------------------------------------------------------------
// Root-only tests
// ---------------------------------------------------------------------------

#[test]
#[ignore = "requires root to write /etc/resolv.conf"]
fn real_apply_and_restore() {
    let original = std::fs::read("/etc/resolv.conf").unwrap();
    let mut c = FileConfigurator::new();

    c.apply_dns_config(&desired()).unwrap();
    assert!(
        std::fs::read_to_string("/etc/resolv.conf")
            .unwrap()
            .contains("nameserver 100.64.0.1")
    );

    c.restore_host_dns().unwrap();
    assert_eq!(std::fs::read("/etc/resolv.conf").unwrap(), original);
}
