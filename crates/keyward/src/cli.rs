//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// keyward - access key lifecycle for object-storage control planes
#[derive(Parser, Debug)]
#[command(name = "keyward")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory holding config.yaml and the role store (default: ~/.keyward)
    #[arg(long, global = true, env = "KEYWARD_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Control-plane connection settings
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Role management
    #[command(subcommand)]
    Role(RoleCommands),

    /// Print the current credentials of a role
    Creds(CredsArgs),

    /// Namespace onboarding and migration
    #[command(subcommand)]
    Namespace(NamespaceCommands),

    /// IAM user onboarding
    #[command(subcommand)]
    IamUser(IamUserCommands),

    /// Run any operation by name with JSON arguments
    Call(CallArgs),
}

// Config commands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the configuration (password masked)
    Show,

    /// Write the configuration
    Set(ConfigSetArgs),

    /// Rotate the control-plane account password
    RotateRoot,
}

#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Management API base URL, e.g. https://ecs.example.com:4443
    #[arg(long)]
    pub url: String,

    /// Management account
    #[arg(long)]
    pub username: String,

    /// Management account password
    #[arg(long, env = "KEYWARD_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub skip_ssl: bool,
}

// Role commands
#[derive(Subcommand, Debug)]
pub enum RoleCommands {
    /// Show a role and its key metadata
    Show(RoleNameArgs),

    /// List role names
    List,

    /// Register a role, adopting the IAM user named after the first '_'
    Create(RoleCreateArgs),

    /// Delete a role, its keys and its IAM user
    Delete(RoleNameArgs),

    /// Add a second key, or replace the older of two
    Rotate(RoleNameArgs),
}

#[derive(Args, Debug)]
pub struct RoleNameArgs {
    /// Role name
    pub name: String,
}

#[derive(Args, Debug)]
pub struct RoleCreateArgs {
    /// Role name, <namespace>_<username>
    pub name: String,

    /// Namespace of the IAM user
    #[arg(short, long)]
    pub namespace: String,

    /// Default lease in seconds
    #[arg(long)]
    pub ttl: Option<u64>,

    /// Maximum lease in seconds
    #[arg(long)]
    pub max_ttl: Option<u64>,
}

#[derive(Args, Debug)]
pub struct CredsArgs {
    /// Role name
    pub name: String,
}

// Namespace commands
#[derive(Subcommand, Debug)]
pub enum NamespaceCommands {
    /// Onboard a new IAM user into an existing namespace
    Onboard(NamespaceOnboardArgs),

    /// Bring every IAM and legacy user of a namespace under management
    Migrate(NamespaceArgs),

    /// List namespaces with managed roles
    List,

    /// Remove the namespace's roles and deactivate it
    Delete(NamespaceArgs),
}

#[derive(Args, Debug)]
pub struct NamespaceOnboardArgs {
    pub namespace: String,

    pub username: String,

    /// Store the role under this name instead of <namespace>_<username>
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args, Debug)]
pub struct NamespaceArgs {
    pub namespace: String,
}

// IAM user commands
#[derive(Subcommand, Debug)]
pub enum IamUserCommands {
    /// Onboard a new IAM user
    Onboard(IamUserOnboardArgs),
}

#[derive(Args, Debug)]
pub struct IamUserOnboardArgs {
    pub namespace: String,

    pub username: String,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Operation name, e.g. role/rotate
    pub operation: String,

    /// JSON arguments
    #[arg(short, long)]
    pub data: Option<String>,
}
