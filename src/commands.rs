//! CLI command definitions
//!
//! All CLI structs and subcommand enums are defined here.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// maildb - manage the SQLite database shared by Postfix and Dovecot
#[derive(Parser, Debug)]
#[command(name = "maildb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Database file (default: from the config file, else /etc/postfix/private/mail.db)
    #[arg(long, global = true, env = "MAILDB_DB")]
    pub db: Option<PathBuf>,

    /// Path to config file (default: <config dir>/maildb/config.yaml)
    #[arg(short, long, global = true, env = "MAILDB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print records as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty database
    Create,

    /// Manage domains
    #[command(subcommand)]
    Domain(DomainCommands),

    /// Manage access rules (restriction class actions)
    #[command(subcommand)]
    Access(AccessCommands),

    /// Manage transports
    #[command(subcommand)]
    Transport(TransportCommands),

    /// Manage addresses and their overrides
    #[command(subcommand)]
    Address(AddressCommands),

    /// Manage local aliases (aliases(5) style)
    #[command(subcommand)]
    Alias(AliasCommands),

    /// Manage virtual aliases
    #[command(subcommand)]
    Virtual(AliasCommands),

    /// Manage virtual mailboxes
    #[command(subcommand)]
    Mailbox(MailboxCommands),
}

/// Name argument shared by show/delete
#[derive(Args, Debug)]
pub struct NameArg {
    pub name: String,
}

/// Pattern argument for list
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Name pattern; '*' matches anything
    #[arg(default_value = "*")]
    pub pattern: String,
}

/// Input for import
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// File to read (default: stdin)
    pub file: Option<PathBuf>,
}

/// Record name plus field assignments
#[derive(Args, Debug)]
pub struct EditArgs {
    pub name: String,

    /// Assignments such as rclass=STALL; an empty value clears the field
    #[arg(value_name = "KEY=VALUE")]
    pub assignments: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum DomainCommands {
    /// Add a domain
    Add {
        name: String,

        /// internet, local, relay, virtual or vmailbox
        #[arg(short = 'C', long)]
        class: Option<String>,

        /// transport=, access=, rclass=, vuid=, vgid=
        #[arg(value_name = "KEY=VALUE")]
        assignments: Vec<String>,
    },
    /// Change fields of a domain (class=, transport=, access=, rclass=, vuid=, vgid=)
    Edit(EditArgs),
    /// Delete a domain no address uses
    Delete(NameArg),
    /// Show one domain
    Show(NameArg),
    /// List domains
    List(ListArgs),
    /// Import domains: `name class [key=value ...]`
    Import(ImportArgs),
    /// Export domains
    Export,
}

#[derive(Subcommand, Debug)]
pub enum AccessCommands {
    /// Add an access rule
    Add { name: String, action: String },
    /// Change an access rule (action=)
    Edit(EditArgs),
    /// Delete an access rule nothing uses
    Delete(NameArg),
    /// Show one access rule
    Show(NameArg),
    /// List access rules
    List(ListArgs),
    /// Import access rules: `name action`
    Import(ImportArgs),
    /// Export access rules
    Export,
}

#[derive(Subcommand, Debug)]
pub enum TransportCommands {
    /// Add a transport
    Add {
        name: String,

        /// transport:nexthop, either side may be empty
        #[arg(value_name = "TRANSPORT:NEXTHOP")]
        spec: String,
    },
    /// Change a transport (transport=, nexthop=)
    Edit(EditArgs),
    /// Delete a transport nothing uses
    Delete(NameArg),
    /// Show one transport
    Show(NameArg),
    /// List transports
    List(ListArgs),
    /// Import transports: `name transport:nexthop`
    Import(ImportArgs),
    /// Export transports
    Export,
}

#[derive(Subcommand, Debug)]
pub enum AddressCommands {
    /// Add an address, creating its domain if needed
    Add(EditArgs),
    /// Change address overrides (transport=, access=, rclass=)
    Edit(EditArgs),
    /// Delete an address that is not an alias, recipient or mailbox
    Delete(NameArg),
    /// Show one address
    Show(NameArg),
    /// List addresses
    List(ListArgs),
    /// Import addresses: `address [key=value, ...]`
    Import(ImportArgs),
    /// Export addresses
    Export,
}

#[derive(Subcommand, Debug)]
pub enum AliasCommands {
    /// Add recipients to an alias, creating it if needed
    Add {
        alias: String,

        #[arg(required = true)]
        recipients: Vec<String>,
    },
    /// Remove one recipient; removing the last removes the alias
    Remove { alias: String, recipient: String },
    /// Remove an alias and all its recipients
    Delete(NameArg),
    /// Show one alias
    Show(NameArg),
    /// List aliases
    List(ListArgs),
    /// Import aliases
    Import(ImportArgs),
    /// Export aliases
    Export,
}

#[derive(Subcommand, Debug)]
pub enum MailboxCommands {
    /// Add a mailbox in a vmailbox domain
    Add(EditArgs),
    /// Change a mailbox (pw_type=, password=, uid=, gid=, quota=, home=)
    Edit {
        #[command(flatten)]
        edit: EditArgs,

        /// Allow logins
        #[arg(long, conflicts_with = "disable")]
        enable: bool,

        /// Refuse logins
        #[arg(long)]
        disable: bool,
    },
    /// Delete a mailbox no alias delivers to
    Delete(NameArg),
    /// Show one mailbox
    Show(NameArg),
    /// List mailboxes
    List(ListArgs),
    /// Import mailboxes in passwd-file form
    Import(ImportArgs),
    /// Export mailboxes in passwd-file form
    Export,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_mailbox_edit() {
        let cli = Cli::try_parse_from([
            "maildb",
            "--db",
            "/tmp/mail.db",
            "mailbox",
            "edit",
            "jeff@pobox.org",
            "pw_type=CRYPT",
            "--disable",
        ])
        .unwrap();
        match cli.command {
            Commands::Mailbox(MailboxCommands::Edit { edit, enable, disable }) => {
                assert_eq!(edit.name, "jeff@pobox.org");
                assert_eq!(edit.assignments, vec!["pw_type=CRYPT"]);
                assert!(!enable);
                assert!(disable);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_alias_add_requires_recipients() {
        assert!(Cli::try_parse_from(["maildb", "alias", "add", "postmaster"]).is_err());
    }
}
