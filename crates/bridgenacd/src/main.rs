//! Bridge NAC daemon entry point.
//!
//! Wires the session manager to the portal control API, starts the periodic
//! expiry sweep, and serves until interrupted.

use bridgenacd::{router, AppState};
use chrono::TimeDelta;
use clap::Parser;
use log::{debug, error, info, warn};
use nac_access::{
    AccessConfig, AccessStore, Clock, MemoryStore, RoleResolver, SessionManager, StaticResolver,
    SystemClock,
};
use nac_gateway::{MemoryGateway, RuleGateway};
use nac_policy::{PolicyCompiler, PolicyConfig};
use nac_types::AccessRole;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Bridge network access control daemon
#[derive(Parser, Debug)]
#[command(name = "bridgenacd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Portal control API listen address
    #[arg(short = 'l', long, default_value = "127.0.0.1:9090")]
    listen: String,

    /// Captive portal IPv4 address clients are restricted to
    #[arg(long, default_value = "10.0.0.1")]
    portal_host: Ipv4Addr,

    /// Captive portal port
    #[arg(long, default_value = "8080")]
    portal_port: u16,

    /// Block DNS for unauthenticated guests (allowed by default)
    #[arg(long)]
    no_guest_dns: bool,

    /// Guest session TTL in seconds
    #[arg(long, default_value = "900")]
    guest_ttl: i64,

    /// User session TTL in seconds
    #[arg(long, default_value = "28800")]
    user_ttl: i64,

    /// Admin session TTL in seconds
    #[arg(long, default_value = "86400")]
    admin_ttl: i64,

    /// Expiry sweep interval in seconds
    #[arg(long, default_value = "30")]
    sweep_interval: u64,

    /// Portal account, `username:password:role`; repeatable
    #[arg(short = 'u', long = "user")]
    users: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_account(entry: &str) -> Result<(String, String, AccessRole), String> {
    let mut parts = entry.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(password), Some(role)) if !name.is_empty() && !password.is_empty() => {
            let role: AccessRole = role
                .parse()
                .map_err(|_| format!("unknown role in account entry '{entry}'"))?;
            Ok((name.to_string(), password.to_string(), role))
        }
        _ => Err(format!(
            "malformed account entry '{entry}', expected username:password:role"
        )),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    info!("Starting bridgenacd");
    info!("Listen address: {}", args.listen);
    info!("Portal: {}:{}", args.portal_host, args.portal_port);
    info!(
        "Session TTLs: guest {}s, user {}s, admin {}s",
        args.guest_ttl, args.user_ttl, args.admin_ttl
    );
    info!("Sweep interval: {}s", args.sweep_interval);

    let mut resolver = StaticResolver::new();
    for entry in &args.users {
        match parse_account(entry) {
            Ok((name, password, role)) => {
                info!("Portal account: {name} ({role})");
                resolver = resolver.with_user(name, password, role);
            }
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        }
    }

    let mut policy = PolicyConfig::default()
        .with_portal(SocketAddrV4::new(args.portal_host, args.portal_port));
    policy.allow_guest_dns = !args.no_guest_dns;
    let config = AccessConfig::default().with_ttls(
        TimeDelta::seconds(args.guest_ttl),
        TimeDelta::seconds(args.user_ttl),
        TimeDelta::seconds(args.admin_ttl),
    );

    // In-memory gateway; a real device adapter plugs in at the RuleGateway
    // trait.
    let gateway: Arc<dyn RuleGateway> = Arc::new(MemoryGateway::new());
    let store: Arc<dyn AccessStore> = Arc::new(MemoryStore::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let manager = Arc::new(SessionManager::new(
        store,
        gateway,
        Arc::new(resolver) as Arc<dyn RoleResolver>,
        PolicyCompiler::new(policy),
        clock,
        config,
    ));

    let sweeper = Arc::clone(&manager);
    let sweep_interval = args.sweep_interval;
    let sweep_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(sweep_interval.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let swept = sweeper.sweep().await;
            let purged = sweeper.purge_expired();
            debug!("sweep tick: {swept} retired, {purged} purged");
        }
    });

    let app = router(Arc::new(AppState::new(manager)));

    let listener = match tokio::net::TcpListener::bind(&args.listen).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind {}: {err}", args.listen);
            sweep_task.abort();
            return ExitCode::FAILURE;
        }
    };

    info!("Portal control API listening on {}", args.listen);
    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    sweep_task.abort();

    if let Err(err) = serve_result {
        error!("Server error: {err}");
        return ExitCode::FAILURE;
    }

    info!("bridgenacd shutdown complete");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => warn!("Received SIGINT, shutting down gracefully..."),
        Err(err) => error!("Failed to listen for ctrl-c: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account() {
        let (name, password, role) = parse_account("alice:pw:user").unwrap();
        assert_eq!(name, "alice");
        assert_eq!(password, "pw");
        assert_eq!(role, AccessRole::User);
    }

    #[test]
    fn test_parse_account_rejects_malformed() {
        assert!(parse_account("alice").is_err());
        assert!(parse_account("alice:pw").is_err());
        assert!(parse_account(":pw:user").is_err());
        assert!(parse_account("alice:pw:wizard").is_err());
    }
}
