//! CLI entry point for `mailto`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};

use mailto::apps::{select_clients, ClientCatalog, SpotlightCatalog};
use mailto::compose::Composer;
use mailto::config::{self, Config};
use mailto::contacts::{CachedContacts, ContactSource};
use mailto::format::{Formatter, MailtoUrl};
use mailto::launch::{DefaultClient, Launcher, OpenLauncher, PrintLauncher, SystemDefaultClient};
use mailto::search::{complete, FuzzyContactMatcher, Suggestion};
use mailto::settings::{ClientApp, FileSettings, SettingsStore};

#[derive(Parser)]
#[command(
    name = "mailto",
    version,
    about = "Compose email to your contacts from a launcher search box"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Read contacts from this JSON file instead of the cache
    #[arg(long, global = true, value_name = "FILE")]
    contacts: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest recipients for a search-box query
    Search {
        /// The whole query text, e.g. "bob@example.com, su"
        #[arg(default_value = "")]
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Open a new message to the given recipients
    Compose {
        /// Comma-separated recipients as accumulated by `search`
        #[arg(default_value = "")]
        recipients: String,
        #[arg(short, long)]
        subject: Option<String>,
        /// Print the URI instead of opening it
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the mailto: URI for the given recipients
    Url {
        /// Comma-separated recipients, optionally "Name <email>"
        #[arg(default_value = "")]
        recipients: String,
        /// Format for this client bundle ID instead of the selected one
        #[arg(short, long)]
        client: Option<String>,
        #[arg(short, long)]
        subject: Option<String>,
        /// Leave recipient names out
        #[arg(long)]
        no_names: bool,
    },
    /// Decode the recipients and subject of a mailto: URI
    Inspect {
        uri: String,
        #[arg(long)]
        json: bool,
    },
    /// Show or change the email client used for composing
    Client {
        #[command(subcommand)]
        action: ClientCommand,
    },
    /// Turn recipient names in composed URIs on or off
    Names {
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        enabled: bool,
    },
    /// Show the formatting rules for a client
    Rules {
        /// Client bundle ID; the default rules if omitted
        client: Option<String>,
        /// List every configured client pattern
        #[arg(long)]
        all: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

#[derive(Subcommand)]
enum ClientCommand {
    /// Show the selected client and the system default
    Get,
    /// List installed email clients
    List,
    /// Select the installed client whose name best matches a query
    Select {
        /// Part of the app name, e.g. "air"
        query: String,
    },
    /// Select a client by app path or bundle ID
    Set {
        /// Path to an app bundle, or a bundle ID
        target: String,
        /// Display name, when setting a bundle ID
        #[arg(long)]
        name: Option<String>,
    },
    /// Follow the system default client again
    Clear,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::load_config()?;

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Search { query, json } => cmd_search(&config, cli.contacts, &query, json),
        Commands::Compose {
            recipients,
            subject,
            dry_run,
        } => cmd_compose(&config, cli.contacts, &recipients, subject.as_deref(), dry_run),
        Commands::Url {
            recipients,
            client,
            subject,
            no_names,
        } => cmd_url(
            &config,
            cli.contacts,
            &recipients,
            client.as_deref(),
            subject.as_deref(),
            no_names,
        ),
        Commands::Inspect { uri, json } => cmd_inspect(&uri, json),
        Commands::Client { action } => cmd_client(&config, action),
        Commands::Names { enabled } => cmd_names(&config, enabled),
        Commands::Rules { client, all } => cmd_rules(&config, client.as_deref(), all),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailto.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn contact_source(config: &Config, override_path: Option<PathBuf>) -> CachedContacts {
    let cache = override_path.unwrap_or_else(|| config::contacts_cache_path(config));
    CachedContacts::new(cache, config::contacts_updating_path(config))
}

fn load_settings(config: &Config) -> anyhow::Result<FileSettings> {
    Ok(FileSettings::load(config::settings_path(config))?)
}

/// Print suggestions for a query.
fn cmd_search(
    config: &Config,
    contacts_path: Option<PathBuf>,
    query: &str,
    json: bool,
) -> anyhow::Result<()> {
    let source = contact_source(config, contacts_path);
    let contacts = source.list_contacts()?;
    let matcher = FuzzyContactMatcher::new(config.search.clone());
    let suggestions = complete(query, &contacts, &matcher, source.is_updating());

    if json {
        let output = serde_json::json!({ "items": suggestions });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_suggestions(&suggestions);
    }
    Ok(())
}

fn print_suggestions(suggestions: &[Suggestion]) {
    for suggestion in suggestions {
        match suggestion {
            Suggestion::ComposeEmpty => println!("  Write new email"),
            Suggestion::InvalidAddress { address } => {
                println!("  ! {address} is not a valid email address")
            }
            Suggestion::ComposeTo { recipients } => println!("  Write mail to {recipients}"),
            Suggestion::Contact {
                title,
                address,
                is_group,
                ..
            } => {
                let marker = if *is_group { "group" } else { "" };
                println!("  {title:<30} {address} {marker}");
            }
            Suggestion::Updating => println!("  (updating contacts...)"),
        }
    }
}

/// Compose a new message in the selected client.
fn cmd_compose(
    config: &Config,
    contacts_path: Option<PathBuf>,
    recipients: &str,
    subject: Option<&str>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let contacts = contact_source(config, contacts_path).list_contacts()?;
    let settings = load_settings(config)?;
    let rules = config.rule_table()?;
    let default_client = SystemDefaultClient::new(config.general.default_client.clone());
    let launcher: Box<dyn Launcher> = if dry_run {
        Box::new(PrintLauncher)
    } else {
        Box::new(OpenLauncher)
    };

    let subject = subject.or(config.format.subject.as_deref());
    // Skipped recipients are logged by the composer
    Composer::new(&rules)
        .with_escape_policy(config.format.escape_policy())
        .with_subject(subject)
        .compose(
            recipients,
            &contacts,
            settings.get(),
            &default_client,
            launcher.as_ref(),
        )?;
    Ok(())
}

/// Print the URI for explicit recipients.
fn cmd_url(
    config: &Config,
    contacts_path: Option<PathBuf>,
    recipients: &str,
    client: Option<&str>,
    subject: Option<&str>,
    no_names: bool,
) -> anyhow::Result<()> {
    let contacts = contact_source(config, contacts_path).list_contacts()?;
    let rules = config.rule_table()?;
    let mut settings = load_settings(config)?.get().clone();
    if let Some(bundle_id) = client {
        settings.client = Some(ClientApp::from_bundle_id(bundle_id));
    }
    if no_names {
        settings.use_names = false;
    }

    let default_client = SystemDefaultClient::new(config.general.default_client.clone());
    let subject = subject.or(config.format.subject.as_deref());
    let composition = Composer::new(&rules)
        .with_escape_policy(config.format.escape_policy())
        .with_subject(subject)
        .build(recipients, &contacts, &settings, &default_client);

    for warning in &composition.warnings {
        eprintln!("  Skipped: {warning}");
    }
    println!("{}", composition.url);
    Ok(())
}

/// Decode a mailto: URI.
fn cmd_inspect(uri: &str, json: bool) -> anyhow::Result<()> {
    let url = MailtoUrl::new(uri);
    let recipients = url.recipients();
    let subject = url.subject();

    if json {
        let output = serde_json::json!({
            "recipients": recipients,
            "subject": subject,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!();
    println!("  {} recipient(s)", recipients.len());
    for recipient in &recipients {
        println!(
            "  {:<30} {}",
            recipient.name.as_deref().unwrap_or(""),
            recipient.email
        );
    }
    if let Some(subject) = subject {
        println!("  {:<30} {}", "Subject", subject);
    }
    println!();
    Ok(())
}

fn cmd_client(config: &Config, action: ClientCommand) -> anyhow::Result<()> {
    let mut store = load_settings(config)?;
    match action {
        ClientCommand::Get => {
            let default_client = SystemDefaultClient::new(config.general.default_client.clone());
            let selected = store
                .get()
                .client
                .as_ref()
                .and_then(ClientApp::launch_target)
                .unwrap_or_else(|| "(system default)".to_string());
            let system = default_client
                .current_default_client()
                .unwrap_or_else(|| "(unknown)".to_string());
            println!("  {:<20} {}", "Selected client", selected);
            println!("  {:<20} {}", "System default", system);
            println!("  {:<20} {}", "Include names", store.get().use_names);
        }
        ClientCommand::List => {
            let selected = store.get().client.clone();
            for app in SpotlightCatalog::default().mail_clients()? {
                let marker = if selected.as_ref() == Some(&app) { "*" } else { " " };
                println!(
                    "{marker} {:<24} {:<36} {}",
                    app.display_name(),
                    app.bundle_id.as_deref().unwrap_or("-"),
                    app.path.as_ref().map(|p| p.display().to_string()).unwrap_or_default()
                );
            }
        }
        ClientCommand::Select { query } => {
            let clients = SpotlightCatalog::default().mail_clients()?;
            let hits = select_clients(&query, &clients);
            let Some(&app) = hits.first() else {
                anyhow::bail!("No installed email client matches '{query}'");
            };
            for other in hits.iter().skip(1) {
                println!("  Also matching: {}", other.display_name());
            }
            save_client(&mut store, app.clone())?;
        }
        ClientCommand::Set { target, name } => {
            let path = Path::new(&target);
            let mut app = if target.ends_with(".app") || path.is_absolute() || path.exists() {
                SpotlightCatalog::default().app_at(path)?
            } else {
                ClientApp::from_bundle_id(&target)
            };
            if name.is_some() {
                app.name = name;
            }
            save_client(&mut store, app)?;
        }
        ClientCommand::Clear => {
            let mut settings = store.get().clone();
            settings.client = None;
            store.set(settings);
            store.save()?;
            println!("  Using the system default client");
        }
    }
    Ok(())
}

fn save_client(store: &mut FileSettings, app: ClientApp) -> anyhow::Result<()> {
    let label = app.display_name().to_string();
    let mut settings = store.get().clone();
    settings.client = Some(app);
    store.set(settings);
    store.save()?;
    println!("  Email client set to {label}");
    Ok(())
}

fn cmd_names(config: &Config, enabled: bool) -> anyhow::Result<()> {
    let mut store = load_settings(config)?;
    let mut settings = store.get().clone();
    settings.use_names = enabled;
    store.set(settings);
    store.save()?;
    println!(
        "  Recipient names {}",
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Print the effective rules for a client, or the whole table.
fn cmd_rules(config: &Config, client: Option<&str>, all: bool) -> anyhow::Result<()> {
    let table = config.rule_table()?;
    if all {
        for rule in table.clients() {
            println!("  {}", rule.pattern);
        }
        println!("  * (default)");
        return Ok(());
    }

    let rules = table.lookup(client);
    print!("{}", toml::to_string_pretty(rules)?);

    // Show what a typical two-recipient URI looks like for this client
    let sample = mailto::model::address::Recipient::parse_list(
        "Bob Test <bob@example.com>, \"Probe, Jürgen\" <probi@example.com>",
    );
    let url = Formatter::new(rules)
        .with_escape_policy(config.format.escape_policy())
        .format(&sample, true, None);
    println!();
    println!("# example: {url}");
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailto", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
