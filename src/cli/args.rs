//! CLI argument definitions using clap
//!
//! Commands:
//! - fieldguard read --type <t> --filter <json> [--page n] [--size n] [--sort f] [--desc]
//! - fieldguard create --type <t> --submission <json>
//! - fieldguard update --type <t> --filter <json> --submission <json> [--submit] [--returning]
//! - fieldguard delete --type <t> --filter <json>
//! - fieldguard exec  (one JSON operation on stdin)
//! - fieldguard layout --type <t>
//!
//! Every command acts as the identity given by `--user-id` and `--role`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::schema::{Requester, Roles};

/// fieldguard - field-level access control over a document store
#[derive(Parser, Debug)]
#[command(name = "fieldguard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file; defaults apply when it does not exist
    #[arg(long, global = true, default_value = "./fieldguard.json")]
    pub config: PathBuf,

    #[command(flatten)]
    pub identity: Identity,

    #[command(subcommand)]
    pub command: Command,
}

/// Identity the command runs as
#[derive(Args, Debug, Clone, Default)]
pub struct Identity {
    /// Id of the caller's own user document
    #[arg(long, global = true)]
    pub user_id: Option<String>,

    /// Role held by the caller (repeatable)
    #[arg(long = "role", value_enum, global = true)]
    pub roles: Vec<RoleArg>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleArg {
    Admin,
    Organizer,
    Volunteer,
    Hacker,
}

impl Identity {
    pub fn requester(&self) -> Requester {
        let mut roles = Roles::default();
        for role in &self.roles {
            match role {
                RoleArg::Admin => roles.admin = true,
                RoleArg::Organizer => roles.organizer = true,
                RoleArg::Volunteer => roles.volunteer = true,
                RoleArg::Hacker => roles.hacker = true,
            }
        }
        Requester {
            id: self.user_id.clone(),
            roles,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read projected documents
    Read {
        #[arg(long = "type")]
        object_type: String,

        /// Mongo-style JSON filter
        #[arg(long)]
        filter: String,

        /// Zero-based page index
        #[arg(long)]
        page: Option<usize>,

        #[arg(long)]
        size: Option<usize>,

        /// Dot path to sort by
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },

    /// Create a document from a submission
    Create {
        #[arg(long = "type")]
        object_type: String,

        /// JSON submission
        #[arg(long)]
        submission: String,
    },

    /// Update every document matching a filter
    Update {
        #[arg(long = "type")]
        object_type: String,

        #[arg(long)]
        filter: String,

        #[arg(long)]
        submission: String,

        /// Apply submission rules instead of write rules
        #[arg(long)]
        submit: bool,

        /// Print the patched documents instead of their ids
        #[arg(long)]
        returning: bool,
    },

    /// Delete every document matching a filter
    Delete {
        #[arg(long = "type")]
        object_type: String,

        #[arg(long)]
        filter: String,
    },

    /// Execute one JSON operation read from stdin
    Exec,

    /// Print the persisted field layout of an object type
    Layout {
        #[arg(long = "type")]
        object_type: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
