use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use wardenxdp_loader::config::load_from_path;

fn tmp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_nanos();
    std::env::temp_dir().join(format!("wardenxdp-{nanos}-{name}.toml"))
}

#[test]
fn loads_minimal_config_with_defaults() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let path = tmp_path("minimal");
    fs::write(&path, "interface = \"eth0\"\n")?;

    let cfg = load_from_path(&path)?;
    assert_eq!(cfg.interface, "eth0");
    assert!(cfg.whitelist.is_empty());
    assert!(cfg.acl_ports.is_empty());
    assert_eq!(cfg.rate_limit.burst, wardenxdp_common::DEFAULT_BURST);
    assert_eq!(cfg.rate_limit.refill_period_ns, wardenxdp_common::DEFAULT_REFILL_PERIOD_NS);
    Ok(())
}

#[test]
fn loads_whitelist_and_acl_ports() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let path = tmp_path("full");
    let toml = r#"
interface = "eth1"
whitelist = ["203.0.113.5", "2001:db8::1"]
acl_ports = [22, 80, 443]

[rate_limit]
refill_period_ns = 500000
burst = 50
"#;
    fs::write(&path, toml)?;

    let cfg = load_from_path(&path)?;
    assert_eq!(cfg.whitelist, vec!["203.0.113.5", "2001:db8::1"]);
    assert_eq!(cfg.acl_ports, vec![22, 80, 443]);
    assert_eq!(cfg.rate_limit.burst, 50);
    Ok(())
}

#[test]
fn rejects_acl_port_outside_bitmap_width() {
    let path = tmp_path("bad-port");
    fs::write(&path, "interface = \"eth0\"\nacl_ports = [64]\n").expect("write config");

    let result = load_from_path(&path);
    assert!(result.is_err());
}

#[test]
fn missing_file_is_an_error() {
    let result = load_from_path("/nonexistent/wardenxdp.toml");
    assert!(result.is_err());
}
