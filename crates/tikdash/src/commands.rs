//! Command handlers. Router-scoped commands run as one-shots: connect,
//! act, disconnect — the CLI never keeps sessions across invocations.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use tabled::Tabled;

use tikdash_config::RouterStore;
use tikdash_core::service::ServiceConfig;
use tikdash_core::{
    ActiveSession, ConnectRequest, Discovery, DiscoveredDevice, HotspotProfile, HotspotService,
    HotspotUser, HotspotUserRequest, RestConnector, SessionSummary,
};

use crate::cli::{DiscoverArgs, GlobalOpts, HotspotArgs, HotspotCommand, RouterArgs};
use crate::error::CliError;
use crate::output::{render_list, render_single};

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Identity")]
    identity: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Board")]
    board: String,
}

impl From<&DiscoveredDevice> for DeviceRow {
    fn from(d: &DiscoveredDevice) -> Self {
        Self {
            identity: d.identity.clone().unwrap_or_default(),
            address: d.host().unwrap_or_default(),
            mac: d.mac_address.clone().unwrap_or_default(),
            version: d.version.clone().unwrap_or_default(),
            board: d
                .board_name
                .clone()
                .or_else(|| d.platform.clone())
                .unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct ActiveRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Uptime")]
    uptime: String,
    #[tabled(rename = "In")]
    bytes_in: String,
    #[tabled(rename = "Out")]
    bytes_out: String,
}

impl From<&ActiveSession> for ActiveRow {
    fn from(s: &ActiveSession) -> Self {
        Self {
            id: s.id.clone(),
            user: s.user.clone(),
            address: s.address.clone().unwrap_or_default(),
            mac: s.mac.clone().unwrap_or_default(),
            uptime: s.uptime.clone().unwrap_or_default(),
            bytes_in: fmt_bytes(s.bytes_in),
            bytes_out: fmt_bytes(s.bytes_out),
        }
    }
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Password")]
    password: String,
    #[tabled(rename = "Profile")]
    profile: String,
    #[tabled(rename = "Disabled")]
    disabled: String,
}

impl From<&HotspotUser> for UserRow {
    fn from(u: &HotspotUser) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            password: u.password.clone().unwrap_or_default(),
            profile: u.profile.clone().unwrap_or_default(),
            disabled: if u.disabled { "yes" } else { "no" }.into(),
        }
    }
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Rate Limit")]
    rate_limit: String,
    #[tabled(rename = "Session Timeout")]
    session_timeout: String,
    #[tabled(rename = "Shared")]
    shared_users: String,
}

impl From<&HotspotProfile> for ProfileRow {
    fn from(p: &HotspotProfile) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            rate_limit: p.rate_limit.clone().unwrap_or_default(),
            session_timeout: p.session_timeout.clone().unwrap_or_default(),
            shared_users: p.shared_users.clone().unwrap_or_default(),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn discover(args: DiscoverArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let service = build_service(10, args.window);

    eprintln!("Scanning the local broadcast domain for {}s...", args.window);
    let response = service.discover().await;

    println!(
        "{}",
        render_list(global.output, &response.devices, |d| DeviceRow::from(d))?
    );
    eprintln!("{}", response.message);
    Ok(())
}

pub async fn test(args: RouterArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let service = build_service(args.timeout, 5);
    let response = service
        .test_connection(
            args.host.clone(),
            args.username.clone(),
            SecretString::from(args.password.clone()),
            Some(args.port),
        )
        .await;

    if !response.success {
        return Err(CliError::Connect(response.message));
    }

    println!(
        "{}",
        render_single(global.output, &response, |r| format!(
            "{} (identity: {})",
            r.message,
            r.identity.as_deref().unwrap_or("unknown")
        ))?
    );
    Ok(())
}

pub async fn info(args: RouterArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let service = build_service(args.timeout, 5);
    let session_id = connect_oneshot(&service, &args).await?;

    let result = match service.get_session(&session_id).await {
        response if response.success => {
            let summary = response
                .session
                .ok_or_else(|| CliError::Operation("lookup succeeded without a session".into()))?;
            println!("{}", render_single(global.output, &summary, session_detail)?);
            Ok(())
        }
        response => Err(CliError::Operation(response.message)),
    };

    let _ = service.disconnect(&session_id).await;
    result
}

pub async fn hotspot(args: HotspotArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let service = build_service(args.router.timeout, 5);
    let session_id = connect_oneshot(&service, &args.router).await?;

    let result = run_hotspot(&service, &session_id, args.command, global).await;

    let _ = service.disconnect(&session_id).await;
    result
}

async fn run_hotspot(
    service: &HotspotService,
    session_id: &str,
    command: HotspotCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match command {
        HotspotCommand::Active => {
            let response = service.get_active_sessions(session_id).await;
            if !response.success {
                return Err(operation(response.message));
            }
            println!(
                "{}",
                render_list(global.output, &response.sessions, |s| ActiveRow::from(s))?
            );
        }
        HotspotCommand::Users => {
            let response = service.get_hotspot_users(session_id).await;
            if !response.success {
                return Err(operation(response.message));
            }
            println!(
                "{}",
                render_list(global.output, &response.users, |u| UserRow::from(u))?
            );
        }
        HotspotCommand::Profiles => {
            let response = service.get_hotspot_profiles(session_id).await;
            if !response.success {
                return Err(operation(response.message));
            }
            println!(
                "{}",
                render_list(global.output, &response.profiles, |p| ProfileRow::from(p))?
            );
        }
        HotspotCommand::AddUser {
            name,
            password,
            profile,
            comment,
        } => {
            let response = service
                .create_hotspot_user(
                    session_id,
                    HotspotUserRequest {
                        name,
                        password,
                        profile,
                        comment,
                    },
                )
                .await;
            if !response.success {
                return Err(CliError::Operation(response.message));
            }
            println!("{}", response.message);
        }
        HotspotCommand::RemoveUser { id } => {
            let response = service.delete_hotspot_user(session_id, &id).await;
            if !response.success {
                return Err(CliError::Operation(response.message));
            }
            println!("{}", response.message);
        }
        HotspotCommand::Kick { id } => {
            let response = service.disconnect_active_session(session_id, &id).await;
            if !response.success {
                return Err(CliError::Operation(response.message));
            }
            println!("{}", response.message);
        }
    }

    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────

fn build_service(timeout_secs: u64, window_secs: u64) -> HotspotService {
    let config = ServiceConfig {
        connect_timeout: Duration::from_secs(timeout_secs),
        sweep_interval: Duration::ZERO, // one-shot process, no sweeper
        discovery: Discovery {
            window: Duration::from_secs(window_secs),
            ..Discovery::default()
        },
    };
    HotspotService::new(Arc::new(RestConnector), Arc::new(RouterStore::open()), config)
}

async fn connect_oneshot(
    service: &HotspotService,
    args: &RouterArgs,
) -> Result<String, CliError> {
    let response = service
        .connect(ConnectRequest {
            session_id: None,
            name: None,
            host: args.host.clone(),
            username: args.username.clone(),
            password: SecretString::from(args.password.clone()),
            port: Some(args.port),
        })
        .await;

    if !response.success {
        return Err(CliError::Connect(response.message));
    }
    response
        .session
        .map(|s| s.id)
        .ok_or_else(|| CliError::Operation("connect succeeded without a session".into()))
}

fn operation(message: Option<String>) -> CliError {
    CliError::Operation(message.unwrap_or_else(|| "operation failed".into()))
}

fn session_detail(s: &SessionSummary) -> String {
    [
        format!("Identity:     {}", s.identity),
        format!("Host:         {}:{}", s.host, s.port),
        format!("Model:        {}", s.model),
        format!("Version:      {}", s.version),
        format!("Uptime:       {}", s.uptime),
        format!("CPU load:     {}%", s.cpu_load),
        format!(
            "Memory:       {} free of {}",
            fmt_bytes(s.free_memory),
            fmt_bytes(s.total_memory)
        ),
        format!(
            "Online users: {}",
            s.active_users
                .map_or_else(|| "-".into(), |n: usize| n.to_string())
        ),
    ]
    .join("\n")
}

/// Compact byte formatting for tables (`12.3 MiB`).
fn fmt_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
