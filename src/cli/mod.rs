//! CLI module for Syllabus
//!
//! Provides command-line interface parsing for the syllabus-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Syllabus - chat with your class material
///
/// Teachers upload subject documents; students ask questions that are answered
/// from the most relevant passages of those documents.
#[derive(Parser, Debug)]
#[command(
    name = "syllabus-server",
    version,
    about = "Syllabus - retrieval-augmented chat over class material",
    long_about = "Teachers upload subject documents, which are chunked and embedded.\n\
                  Students ask questions that are answered from the closest chunks.\n\n\
                  Run without arguments to start the server, or use 'init' to scaffold a config.",
    after_help = "EXAMPLES:\n    \
                  syllabus-server init                          # Write syllabus.toml and .env.example\n    \
                  syllabus-server                               # Start the server\n    \
                  syllabus-server token t-1 --role teacher      # Mint a teacher token\n    \
                  syllabus-server token s-1 --role student --standard 10 --division A\n    \
                  syllabus-server --config my.toml config --validate"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "syllabus.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve,

    /// Write a starter syllabus.toml and .env.example
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// Provider used for embeddings and generation
        #[arg(long, value_enum, default_value_t = InitProvider::Ollama)]
        provider: InitProvider,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "3000")]
        port: u16,
    },

    /// Mint a signed access token for local testing
    Token {
        /// Token subject (teacher or student id)
        subject: String,

        /// Role carried by the token
        #[arg(long, value_enum)]
        role: TokenRole,

        /// Class standard (students only)
        #[arg(long, required_if_eq("role", "student"))]
        standard: Option<String>,

        /// Class division (students only)
        #[arg(long, required_if_eq("role", "student"))]
        division: Option<String>,
    },

    /// Show configuration information
    Config {
        /// Show the full configuration as TOML
        #[arg(short = 'f', long)]
        full: bool,

        /// Validate the configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// Provider presets for `init`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InitProvider {
    Ollama,
    Openai,
}

/// Roles accepted by `token`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TokenRole {
    Teacher,
    Student,
}

impl From<TokenRole> for crate::types::Role {
    fn from(role: TokenRole) -> Self {
        match role {
            TokenRole::Teacher => crate::types::Role::Teacher,
            TokenRole::Student => crate::types::Role::Student,
        }
    }
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
