use clap::{Parser, Subcommand};

/// Fleetgate — brand-isolated fleet analytics API
#[derive(Parser)]
#[command(name = "fleetgate", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to bind (overrides FLEETGATE_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage brand operators
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Provision an operator for a brand
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        brand: String,
    },
    /// List provisioned operators
    List,
}
