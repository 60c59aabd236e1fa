//! Argument definitions.

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "tikdash",
    version,
    about = "Discover MikroTik routers and manage their hotspots from the terminal"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scan the local broadcast domain for RouterOS devices
    Discover(DiscoverArgs),

    /// Probe a router's API service and credentials
    Test(RouterArgs),

    /// Show a router's identity, stats, and online-client count
    Info(RouterArgs),

    /// Hotspot management on one router
    Hotspot(HotspotArgs),
}

#[derive(Debug, Args)]
pub struct DiscoverArgs {
    /// Scan window in seconds
    #[arg(long, default_value_t = 5)]
    pub window: u64,
}

/// Connection flags shared by every router-scoped command.
#[derive(Debug, Args)]
pub struct RouterArgs {
    /// Router address
    #[arg(long)]
    pub host: String,

    /// API username
    #[arg(long, short, default_value = "admin")]
    pub username: String,

    /// API password
    #[arg(long, short, env = "TIKDASH_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// API service port
    #[arg(long, default_value_t = tikdash_core::DEFAULT_API_PORT)]
    pub port: u16,

    /// Connect timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,
}

#[derive(Debug, Args)]
pub struct HotspotArgs {
    #[command(flatten)]
    pub router: RouterArgs,

    #[command(subcommand)]
    pub command: HotspotCommand,
}

#[derive(Debug, Subcommand)]
pub enum HotspotCommand {
    /// Clients currently online through the captive portal
    Active,

    /// Provisioned hotspot accounts
    Users,

    /// Hotspot user profiles
    Profiles,

    /// Provision a hotspot account
    AddUser {
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Delete a hotspot account by its internal id (e.g. `*3`)
    RemoveUser { id: String },

    /// Kick an online client by its active-session id
    Kick { id: String },
}
