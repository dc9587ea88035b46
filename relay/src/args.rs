use std::path::PathBuf;

use clap::Parser;

/// Gateway for MCP server fleets on a container orchestrator
#[derive(Debug, Parser)]
#[command(name = "relay", version, about)]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Which plane this process serves
    #[arg(long, value_enum, default_value_t = RoleArg::Gateway)]
    pub role: RoleArg,
}

/// CLI role selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RoleArg {
    /// Control plane plus session-affine reverse proxy
    Gateway,
    /// Aggregated MCP server for registered tools
    Toolgateway,
}
