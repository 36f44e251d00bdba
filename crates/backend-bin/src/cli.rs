//! Command-line interface for the `passgate` operator tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use passgate_lib::common::TokenDomain;

/// passgate - password and token tooling
#[derive(Parser, Debug)]
#[command(name = "passgate", version, about, long_about = None, propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = passgate_lib::config::DEFAULT_CONFIG_FILE,
        env = "PASSGATE_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a password against the password policy
    CheckPassword {
        password: String,
    },

    /// Hash a password (the policy is enforced first)
    HashPassword {
        password: String,
    },

    /// Verify a password against a stored hash
    VerifyPassword {
        /// Stored hash in PHC string format
        #[arg(long)]
        hash: String,
        password: String,
    },

    /// Generate a random signing secret
    GenerateSecret {
        /// Amount of random data in bytes
        #[arg(long, default_value_t = passgate_lib::auth::secret_generator::DEFAULT_SECRET_BYTES)]
        bytes: usize,
    },

    /// Issue a token for a subject
    IssueToken {
        #[arg(long, value_enum, default_value_t = DomainArg::Access)]
        domain: DomainArg,
        subject: String,
    },

    /// Validate a token and print its claims
    ValidateToken {
        #[arg(long, value_enum, default_value_t = DomainArg::Access)]
        domain: DomainArg,
        token: String,
    },

    /// Print the effective configuration with secrets redacted
    ShowConfig,

    /// Run register, login, refresh and logout against an in-memory store
    Demo {
        #[arg(long, default_value = "demo@example.com")]
        email: String,
        #[arg(long, default_value = "demo_user")]
        username: String,
        #[arg(long, default_value = "Demo.Passw0rd")]
        password: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainArg {
    Access,
    Refresh,
}

impl From<DomainArg> for TokenDomain {
    fn from(arg: DomainArg) -> Self {
        match arg {
            DomainArg::Access => TokenDomain::Access,
            DomainArg::Refresh => TokenDomain::Refresh,
        }
    }
}
