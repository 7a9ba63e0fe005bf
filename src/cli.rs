use clap::{Parser, Subcommand};

/// sguard — drive the session guard against a running API
#[derive(Parser)]
#[command(name = "sguard", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Exchange credentials for a token and store it
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "GUARD_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Drop the stored token
    Logout,

    /// Show the user the stored token belongs to
    Whoami,

    /// Run the page-load check for a path
    Boot {
        /// Current page path
        #[arg(long, default_value = "/")]
        path: String,
    },

    /// Simulate clicking a link on a page
    Click {
        href: String,
        /// Current page path
        #[arg(long, default_value = "/")]
        path: String,
    },

    /// Send a request through the guarded client
    Fetch {
        /// Request path, relative to GUARD_BASE_URL
        target: String,
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
        /// Current page path
        #[arg(long, default_value = "/")]
        path: String,
    },
}
