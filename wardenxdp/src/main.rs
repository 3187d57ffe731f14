use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use wardenxdp_loader::{config, stats, tables, Pipeline};

#[derive(Parser, Debug)]
#[command(author, version, about = "XDP packet-filter pipeline daemon")]
struct Cli {
    /// Path to the configuration TOML file.
    #[arg(short, long, value_name = "FILE", default_value = "wardenxdp.toml")]
    config: PathBuf,

    /// Interval, in seconds, between fastpath/slowpath stat log lines.
    #[arg(long, default_value_t = 10)]
    stats_interval_secs: u64,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        error!(%err, "wardenxdp exited with error");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> wardenxdp_loader::Result<()> {
    let cfg = config::load_from_path(&cli.config)?;
    info!(interface = %cfg.interface, whitelist = cfg.whitelist.len(), acl_ports = cfg.acl_ports.len(), "configuration loaded");

    let mut pipeline = Pipeline::attach(&cfg.interface)?;
    seed_tables(&mut pipeline, &cfg)?;

    let mut ticker = tokio::time::interval(Duration::from_secs(cli.stats_interval_secs.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match stats::path_stats(&pipeline) {
                    Ok(s) => info!(fast_hits = s.fast_hits, slow_hits = s.slow_hits, "path stats"),
                    Err(err) => error!(%err, "failed to read path stats"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!(interface = pipeline.interface(), "shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn seed_tables(
    pipeline: &mut Pipeline,
    cfg: &config::LoaderConfig,
) -> wardenxdp_loader::Result<()> {
    for entry in &cfg.whitelist {
        let addr = entry
            .parse()
            .map_err(|_| wardenxdp_loader::LoaderError::InvalidAddress(entry.clone()))?;
        tables::whitelist_add(pipeline, addr)?;
    }
    for entry in &cfg.blacklist {
        let addr = entry
            .parse()
            .map_err(|_| wardenxdp_loader::LoaderError::InvalidAddress(entry.clone()))?;
        tables::blacklist_add(pipeline, addr)?;
    }
    if !cfg.acl_ports.is_empty() {
        tables::set_acl_ports(pipeline, &cfg.acl_ports)?;
    }
    for entry in &cfg.icmp_allow {
        tables::icmp_allow_add(pipeline, entry.family.as_family_tag(), entry.icmp_type, entry.icmp_code)?;
    }
    tables::set_panic(pipeline, cfg.panic)?;
    tables::set_global_bypass(pipeline, cfg.global_bypass)?;

    let rl = wardenxdp_common::RateLimitConfig {
        refill_period_ns: cfg.rate_limit.refill_period_ns,
        burst: cfg.rate_limit.burst,
        _pad: 0,
    };
    pipeline.rate_limit_cfg()?.set(0, rl, 0)?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).with_target(false).init();
}
