use std::collections::HashMap;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crownpeak_dqm::config::Config;
use crownpeak_dqm::credentials::CredentialStore;
use crownpeak_dqm::dqm::{DqmCredentials, Operation, DEFAULT_BASE_URL};
use crownpeak_dqm::nodes::{NodeContext, NodeRegistry};

const PASSWORD_ENV: &str = "CROWNPEAK_DQM_PASSWORD";

#[derive(Parser)]
#[command(name = "crownpeak-dqm")]
#[command(about = "Crownpeak DQM workflow node", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported DQM operations
    Operations,
    /// Run the crownpeak node once
    Run {
        /// Operation tag (e.g., listAssets, getAssetDetails)
        #[arg(short, long)]
        operation: String,
        /// Credential profile name
        #[arg(short, long)]
        credential: Option<String>,
        /// Operation parameters (key=value)
        #[arg(short, long = "param", value_parser = parse_var)]
        params: Vec<(String, String)>,
        /// Input item or array of items (JSON)
        #[arg(short, long)]
        input: Option<String>,
        /// Record failed items as errors and keep going
        #[arg(long)]
        continue_on_fail: bool,
    },
    /// Manage DQM credential profiles
    Credentials {
        #[command(subcommand)]
        action: CredentialActions,
    },
}

#[derive(Subcommand)]
enum CredentialActions {
    /// Enable encryption for stored profiles
    Init,
    /// Set a credential profile
    Set {
        /// Profile name (e.g., crownpeak)
        name: String,
        /// DQM API key (or read from stdin)
        #[arg(short = 'k', long)]
        api_key: Option<String>,
        /// DQM website ID
        #[arg(short, long, default_value = "")]
        website_id: String,
        /// API base URL
        #[arg(short, long, default_value = DEFAULT_BASE_URL)]
        base_url: String,
    },
    /// List stored profiles
    List,
    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },
}

fn parse_var(s: &str) -> std::result::Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("Invalid parameter format '{}'. Expected key=value", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "crownpeak_dqm=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Operations => cmd_operations(),
        Commands::Run {
            operation,
            credential,
            params,
            input,
            continue_on_fail,
        } => {
            cmd_run(
                &operation,
                credential.as_deref(),
                &params,
                input.as_deref(),
                continue_on_fail,
            )
            .await?
        }
        Commands::Credentials { action } => match action {
            CredentialActions::Init => cmd_credentials_init().await?,
            CredentialActions::Set {
                name,
                api_key,
                website_id,
                base_url,
            } => cmd_credentials_set(&name, api_key.as_deref(), &website_id, &base_url).await?,
            CredentialActions::List => cmd_credentials_list().await?,
            CredentialActions::Delete { name } => cmd_credentials_delete(&name).await?,
        },
    }

    Ok(())
}

fn cmd_operations() {
    println!("{:<28} {:<8} {}", "OPERATION", "METHOD", "PATH");
    println!("{}", "-".repeat(78));

    for operation in Operation::ALL {
        println!(
            "{:<28} {:<8} {}",
            operation.as_str(),
            operation.method(),
            operation.path_template()
        );
        println!(
            "{:<28} {}: {}",
            "",
            operation.display_name(),
            operation.description()
        );
    }
}

async fn cmd_run(
    operation: &str,
    credential: Option<&str>,
    params: &[(String, String)],
    input: Option<&str>,
    continue_on_fail: bool,
) -> anyhow::Result<()> {
    let config = Config::load();
    let profile = credential
        .map(str::to_string)
        .unwrap_or_else(|| config.dqm.default_credential.clone());

    let mut node_config = json!({
        "operation": operation,
        "credential": profile,
        "continue_on_fail": continue_on_fail,
    });
    for (key, value) in params {
        node_config[key.as_str()] = json!(value);
    }

    let input: Value = match input {
        Some(raw) => serde_json::from_str(raw)?,
        None => Value::Null,
    };

    let store = open_store().await?;
    let mut credentials = HashMap::new();
    if let Some(resolved) = store.resolve_json(&profile)? {
        credentials.insert(profile.clone(), resolved);
    }

    let ctx = NodeContext::new(&uuid::Uuid::new_v4().to_string())
        .with_input(input)
        .with_credentials(credentials);

    let registry = NodeRegistry::with_config(config.dqm);
    let result = registry.execute("crownpeak", &node_config, &ctx).await?;

    println!("{}", serde_json::to_string_pretty(&result.data)?);
    Ok(())
}

// ============================================================================
// Credentials Commands
// ============================================================================

fn read_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, BufRead};

    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }

    eprintln!("{}", prompt);
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Load the default store, unlocking it when encryption is enabled.
async fn open_store() -> anyhow::Result<CredentialStore> {
    let mut store = CredentialStore::load().await?;
    if store.is_encryption_initialized() {
        let password = read_password(&format!(
            "Enter credential store password (or set {}):",
            PASSWORD_ENV
        ))?;
        store.unlock(&password).await?;
    }
    Ok(store)
}

async fn cmd_credentials_init() -> anyhow::Result<()> {
    let mut store = CredentialStore::load().await?;
    if store.is_encryption_initialized() {
        anyhow::bail!("Credential store encryption is already initialized");
    }
    if !store.list().is_empty() {
        anyhow::bail!(
            "Credential store already holds plaintext profiles. Delete them before enabling encryption."
        );
    }

    let password = read_password("Enter a password for the credential store:")?;
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }

    store.initialize_encryption(&password).await?;
    println!("✓ Credential store encryption enabled");
    println!("  Location: {}", store.path().display());

    Ok(())
}

async fn cmd_credentials_set(
    name: &str,
    api_key: Option<&str>,
    website_id: &str,
    base_url: &str,
) -> anyhow::Result<()> {
    use std::io::{self, BufRead};

    // Get key from argument or stdin
    let api_key = match api_key {
        Some(k) => k.to_string(),
        None => {
            eprintln!("Enter DQM API key (or pipe from stdin):");
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line.trim().to_string()
        }
    };

    if api_key.is_empty() {
        anyhow::bail!("API key cannot be empty");
    }

    let credentials = DqmCredentials::new(api_key, website_id, base_url);
    let mut store = open_store().await?;
    store.set_profile(name, &credentials).await?;

    println!("✓ Credential '{}' saved", name);
    println!("  API key: {}", CredentialStore::mask_value(&credentials.api_key));
    if !website_id.is_empty() {
        println!("  Website: {}", website_id);
    }

    Ok(())
}

async fn cmd_credentials_list() -> anyhow::Result<()> {
    let store = CredentialStore::load().await?;
    let profiles = store.list();

    if profiles.is_empty() {
        println!("No credentials stored.");
        println!();
        println!("Add one with: crownpeak-dqm credentials set <name> -k <api-key> -w <website-id>");
        return Ok(());
    }

    println!(
        "{:<16} {:<16} {:<40} {:<10} {:<16}",
        "NAME", "WEBSITE", "BASE URL", "ENCRYPTED", "UPDATED"
    );
    println!("{}", "-".repeat(100));

    for profile in profiles {
        let website = if profile.website_id.is_empty() {
            "-"
        } else {
            profile.website_id.as_str()
        };
        let updated = profile.updated_at.format("%Y-%m-%d %H:%M");
        println!(
            "{:<16} {:<16} {:<40} {:<10} {:<16}",
            profile.name,
            website,
            profile.base_url,
            if profile.is_encrypted() { "yes" } else { "no" },
            updated
        );
    }

    Ok(())
}

async fn cmd_credentials_delete(name: &str) -> anyhow::Result<()> {
    let mut store = CredentialStore::load().await?;
    let deleted = store.delete(name).await?;

    if deleted {
        println!("✓ Credential '{}' deleted", name);
    } else {
        println!("Credential '{}' not found", name);
    }

    Ok(())
}
