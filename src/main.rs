//! maildb - mail database administration
//!
//! Main entry point for the maildb CLI.

mod commands;

use anyhow::Context;
use clap::Parser;
use commands::{
    AccessCommands, AddressCommands, AliasCommands, Cli, Commands, DomainCommands, EditArgs,
    ImportArgs, MailboxCommands, TransportCommands,
};
use maildb::config::MailDbConfig;
use maildb::db::Database;
use maildb::maps::{self, MapKind};
use maildb::MailDbError;
use maildb::repo::{
    parse_assignment, AccessRule, Address, Alias, AliasKind, Domain, DomainClass, Mailbox,
    Transport, DEFAULT_QUOTA,
};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process;

fn main() {
    let cli = Cli::parse();

    let config = match MailDbConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = maildb::logging::init(&config.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(cli, config) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli, config: MailDbConfig) -> anyhow::Result<()> {
    let path = config.database_path(cli.db.as_deref());
    let options = config.open_options();

    if let Commands::Create = cli.command {
        Database::create_with_options(&path, &options)
            .with_context(|| format!("cannot create {}", path.display()))?;
        println!("Created {}", path.display());
        return Ok(());
    }

    let db = Database::open_with_options(&path, &options)?;
    let out = Output { json: cli.json };

    match cli.command {
        Commands::Create => Ok(()),
        Commands::Domain(cmd) => domain_command(&db, cmd, out),
        Commands::Access(cmd) => access_command(&db, cmd, out),
        Commands::Transport(cmd) => transport_command(&db, cmd, out),
        Commands::Address(cmd) => address_command(&db, cmd, out),
        Commands::Alias(cmd) => alias_command(&db, AliasKind::Local, cmd, out),
        Commands::Virtual(cmd) => alias_command(&db, AliasKind::Virtual, cmd, out),
        Commands::Mailbox(cmd) => mailbox_command(&db, cmd, out),
    }
}

/// How records are printed
#[derive(Clone, Copy)]
struct Output {
    json: bool,
}

impl Output {
    /// Print `Label: value` lines, `--` for unset fields
    fn show<T: Serialize>(&self, record: &T, fields: &[(&str, Option<String>)]) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(record)?);
            return Ok(());
        }
        let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 1;
        for (label, value) in fields {
            println!(
                "{:<width$} {}",
                format!("{}:", label),
                value.as_deref().unwrap_or("--"),
                width = width
            );
        }
        Ok(())
    }

    fn list<T: Serialize>(&self, records: &[T], line: impl Fn(&T) -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(records)?);
        } else {
            for record in records {
                println!("{}", line(record));
            }
        }
        Ok(())
    }
}

fn import(db: &Database, kind: MapKind, args: ImportArgs) -> anyhow::Result<()> {
    let count = match &args.file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open {}", path.display()))?;
            maps::import(db, kind, BufReader::new(file))
        }
        None => maps::import(db, kind, io::stdin().lock()),
    }
    .with_context(|| match &args.file {
        Some(path) => format!("import from {} failed", path.display()),
        None => "import failed".to_string(),
    })?;
    eprintln!("Imported {} {} record(s)", count, kind);
    Ok(())
}

fn export(db: &Database, kind: MapKind) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    maps::export(db, kind, &mut out)?;
    out.flush()?;
    Ok(())
}

fn assignments(items: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    Ok(items
        .iter()
        .map(|item| parse_assignment(item))
        .collect::<maildb::Result<Vec<_>>>()?)
}

fn show_domain(out: Output, domain: &Domain) -> anyhow::Result<()> {
    out.show(
        domain,
        &[
            ("Domain", Some(domain.name.clone())),
            ("Class", Some(domain.class.to_string())),
            ("Transport", domain.transport.clone()),
            ("Access", domain.access.clone()),
            ("Restrictions", domain.rclass.clone()),
            ("UID", domain.vuid.map(|v| v.to_string())),
            ("GID", domain.vgid.map(|v| v.to_string())),
        ],
    )
}

fn domain_command(db: &Database, cmd: DomainCommands, out: Output) -> anyhow::Result<()> {
    match cmd {
        DomainCommands::Add {
            name,
            class,
            assignments: items,
        } => {
            let fields = assignments(&items)?;
            let class: Option<DomainClass> = class.map(|c| c.parse()).transpose()?;
            let domain = db.transaction(|db| {
                let mut domain = db.domains().insert(&name, class)?;
                for (key, value) in &fields {
                    domain.apply(key, value)?;
                }
                Ok(domain.record().clone())
            })?;
            show_domain(out, &domain)
        }
        DomainCommands::Edit(EditArgs {
            name,
            assignments: items,
        }) => {
            let fields = assignments(&items)?;
            let domain = db.transaction(|db| {
                let mut domain = db.domains().get(&name)?;
                for (key, value) in &fields {
                    domain.apply(key, value)?;
                }
                Ok(domain.record().clone())
            })?;
            show_domain(out, &domain)
        }
        DomainCommands::Delete(arg) => Ok(db.transaction(|db| db.domains().delete(&arg.name))?),
        DomainCommands::Show(arg) => show_domain(out, &db.domains().lookup(&arg.name)?),
        DomainCommands::List(args) => out.list(&db.domains().find(&args.pattern)?, Domain::to_line),
        DomainCommands::Import(args) => import(db, MapKind::Domain, args),
        DomainCommands::Export => export(db, MapKind::Domain),
    }
}

fn show_access(out: Output, rule: &AccessRule) -> anyhow::Result<()> {
    out.show(
        rule,
        &[
            ("Name", Some(rule.name.clone())),
            ("Action", Some(rule.action.clone())),
        ],
    )
}

fn access_command(db: &Database, cmd: AccessCommands, out: Output) -> anyhow::Result<()> {
    match cmd {
        AccessCommands::Add { name, action } => {
            let rule = db.transaction(|db| {
                Ok(db.access().insert(&name, &action)?.record().clone())
            })?;
            show_access(out, &rule)
        }
        AccessCommands::Edit(EditArgs {
            name,
            assignments: items,
        }) => {
            let fields = assignments(&items)?;
            let rule = db.transaction(|db| {
                let mut rule = db.access().get(&name)?;
                for (key, value) in &fields {
                    rule.apply(key, value)?;
                }
                Ok(rule.record().clone())
            })?;
            show_access(out, &rule)
        }
        AccessCommands::Delete(arg) => Ok(db.transaction(|db| db.access().delete(&arg.name))?),
        AccessCommands::Show(arg) => show_access(out, &db.access().lookup(&arg.name)?),
        AccessCommands::List(args) => out.list(&db.access().find(&args.pattern)?, AccessRule::to_line),
        AccessCommands::Import(args) => import(db, MapKind::Access, args),
        AccessCommands::Export => export(db, MapKind::Access),
    }
}

fn show_transport(out: Output, transport: &Transport) -> anyhow::Result<()> {
    out.show(
        transport,
        &[
            ("Name", Some(transport.name.clone())),
            ("Transport", transport.transport.clone()),
            ("Nexthop", transport.nexthop.clone()),
        ],
    )
}

fn transport_command(db: &Database, cmd: TransportCommands, out: Output) -> anyhow::Result<()> {
    match cmd {
        TransportCommands::Add { name, spec } => {
            let (transport, nexthop) = Transport::parse_spec(&spec)?;
            let transport = db.transaction(|db| {
                Ok(db
                    .transports()
                    .insert(
                        &name,
                        transport.as_deref().unwrap_or_default(),
                        nexthop.as_deref().unwrap_or_default(),
                    )?
                    .record()
                    .clone())
            })?;
            show_transport(out, &transport)
        }
        TransportCommands::Edit(EditArgs {
            name,
            assignments: items,
        }) => {
            let fields = assignments(&items)?;
            let transport = db.transaction(|db| {
                let mut transport = db.transports().get(&name)?;
                for (key, value) in &fields {
                    transport.apply(key, value)?;
                }
                Ok(transport.record().clone())
            })?;
            show_transport(out, &transport)
        }
        TransportCommands::Delete(arg) => {
            Ok(db.transaction(|db| db.transports().delete(&arg.name))?)
        }
        TransportCommands::Show(arg) => show_transport(out, &db.transports().lookup(&arg.name)?),
        TransportCommands::List(args) => {
            out.list(&db.transports().find(&args.pattern)?, Transport::to_line)
        }
        TransportCommands::Import(args) => import(db, MapKind::Transport, args),
        TransportCommands::Export => export(db, MapKind::Transport),
    }
}

fn show_address(out: Output, address: &Address) -> anyhow::Result<()> {
    out.show(
        address,
        &[
            ("Address", Some(address.address.clone())),
            ("Transport", address.transport.clone()),
            ("Access", address.access.clone()),
            ("Restrictions", address.rclass.clone()),
        ],
    )
}

fn address_command(db: &Database, cmd: AddressCommands, out: Output) -> anyhow::Result<()> {
    match cmd {
        AddressCommands::Add(EditArgs {
            name,
            assignments: items,
        }) => {
            let fields = assignments(&items)?;
            let address = db.transaction(|db| {
                let mut address = db.addresses().insert(&name)?;
                for (key, value) in &fields {
                    address.apply(key, value)?;
                }
                Ok(address.record().clone())
            })?;
            show_address(out, &address)
        }
        AddressCommands::Edit(EditArgs {
            name,
            assignments: items,
        }) => {
            let fields = assignments(&items)?;
            let address = db.transaction(|db| {
                let mut address = db.addresses().get(&name)?;
                for (key, value) in &fields {
                    address.apply(key, value)?;
                }
                Ok(address.record().clone())
            })?;
            show_address(out, &address)
        }
        AddressCommands::Delete(arg) => {
            Ok(db.transaction(|db| db.addresses().delete(&arg.name))?)
        }
        AddressCommands::Show(arg) => show_address(out, &db.addresses().lookup(&arg.name)?),
        AddressCommands::List(args) => {
            out.list(&db.addresses().find(&args.pattern)?, Address::to_line)
        }
        AddressCommands::Import(args) => import(db, MapKind::Address, args),
        AddressCommands::Export => export(db, MapKind::Address),
    }
}

fn show_alias(out: Output, alias: &Alias) -> anyhow::Result<()> {
    out.show(
        alias,
        &[
            ("Alias", Some(alias.address.clone())),
            ("Kind", Some(alias.kind.to_string())),
            ("Recipients", Some(alias.recipients.join(", "))),
        ],
    )
}

/// Fail unless `alias` names an alias of the kind the command manages
fn check_kind(kind: AliasKind, alias: &str) -> anyhow::Result<()> {
    let parts = maildb::mail::decode_address(alias)?;
    match (kind, parts.domain.is_some()) {
        (AliasKind::Local, true) => {
            anyhow::bail!("{} has a domain; use 'maildb virtual' for virtual aliases", alias)
        }
        (AliasKind::Virtual, false) => {
            anyhow::bail!("{} has no domain; use 'maildb alias' for local aliases", alias)
        }
        _ => Ok(()),
    }
}

fn alias_command(
    db: &Database,
    kind: AliasKind,
    cmd: AliasCommands,
    out: Output,
) -> anyhow::Result<()> {
    let map = match kind {
        AliasKind::Local => MapKind::LocalAlias,
        AliasKind::Virtual => MapKind::VirtualAlias,
    };

    match cmd {
        AliasCommands::Add { alias, recipients } => {
            check_kind(kind, &alias)?;
            let alias = db.transaction(|db| db.aliases().make_alias(&alias, &recipients))?;
            show_alias(out, &alias)
        }
        AliasCommands::Remove { alias, recipient } => {
            check_kind(kind, &alias)?;
            db.transaction(|db| db.aliases().remove_recipient(&alias, &recipient))?;
            match db.aliases().lookup(&alias) {
                Ok(remaining) => show_alias(out, &remaining),
                Err(e) if e.is_not_found() || matches!(e, MailDbError::NotAlias(_)) => {
                    eprintln!("Removed alias {}", alias);
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
        AliasCommands::Delete(arg) => {
            check_kind(kind, &arg.name)?;
            Ok(db.transaction(|db| db.aliases().remove_alias(&arg.name))?)
        }
        AliasCommands::Show(arg) => show_alias(out, &db.aliases().lookup(&arg.name)?),
        AliasCommands::List(args) => {
            out.list(&db.aliases().find_kind(Some(kind), &args.pattern)?, Alias::to_line)
        }
        AliasCommands::Import(args) => import(db, map, args),
        AliasCommands::Export => export(db, map),
    }
}

fn show_mailbox(out: Output, mailbox: &Mailbox) -> anyhow::Result<()> {
    let quota = match mailbox.quota.as_deref() {
        Some("0") => "none".to_string(),
        Some(quota) => quota.to_string(),
        None => format!("{} (default)", DEFAULT_QUOTA),
    };
    out.show(
        mailbox,
        &[
            ("Mailbox", Some(mailbox.address.clone())),
            ("Password type", Some(mailbox.pw_type.to_string())),
            ("Password", mailbox.password.clone()),
            ("UID", mailbox.uid.map(|v| v.to_string())),
            ("GID", mailbox.gid.map(|v| v.to_string())),
            ("Home", mailbox.home.clone()),
            ("Quota", Some(quota)),
            ("Enabled", Some(mailbox.enabled.to_string())),
        ],
    )
}

fn mailbox_command(db: &Database, cmd: MailboxCommands, out: Output) -> anyhow::Result<()> {
    match cmd {
        MailboxCommands::Add(EditArgs {
            name,
            assignments: items,
        }) => {
            let fields = assignments(&items)?;
            let mailbox = db.transaction(|db| {
                let mut mailbox = db.mailboxes().insert(&name)?;
                for (key, value) in &fields {
                    mailbox.apply(key, value)?;
                }
                Ok(mailbox.record().clone())
            })?;
            show_mailbox(out, &mailbox)
        }
        MailboxCommands::Edit {
            edit,
            enable,
            disable,
        } => {
            let fields = assignments(&edit.assignments)?;
            let mailbox = db.transaction(|db| {
                let mut mailbox = db.mailboxes().get(&edit.name)?;
                for (key, value) in &fields {
                    mailbox.apply(key, value)?;
                }
                if enable {
                    mailbox.enable()?;
                }
                if disable {
                    mailbox.disable()?;
                }
                Ok(mailbox.record().clone())
            })?;
            show_mailbox(out, &mailbox)
        }
        MailboxCommands::Delete(arg) => {
            Ok(db.transaction(|db| db.mailboxes().delete(&arg.name))?)
        }
        MailboxCommands::Show(arg) => show_mailbox(out, &db.mailboxes().lookup(&arg.name)?),
        MailboxCommands::List(args) => {
            out.list(&db.mailboxes().find(&args.pattern)?, Mailbox::to_line)
        }
        MailboxCommands::Import(args) => import(db, MapKind::Mailbox, args),
        MailboxCommands::Export => export(db, MapKind::Mailbox),
    }
}
