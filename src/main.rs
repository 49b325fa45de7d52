use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use notify_actions::config::load_settings;
use notify_actions::logging::{Timer, init_tracing};
use notify_actions::slack::{
    ChannelResolver, DirectoryMode, Resolution, SlackClient, strip_channel_name,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "notify-actions", version, about = "Slack channel resolution for alert rules")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a channel (#name) or member (@name) to its Slack id
    Resolve {
        /// Channel or member name, with or without a leading # / @
        name: String,

        /// Workspace token; defaults to SLACK_BOT_TOKEN
        #[arg(long, env = "SLACK_BOT_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Use the legacy channels/groups/users directories
        #[arg(long)]
        legacy: bool,

        /// Give up after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Print why a lookup failed instead of just "not found"
        #[arg(long)]
        explain: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_settings().context("failed to load configuration")?;
    init_tracing(&settings.logging);
    tracing::debug!(
        api_base_url = %settings.slack.api_base_url,
        legacy_app = settings.slack.legacy_app,
        "Configuration loaded"
    );

    match cli.command {
        Command::Resolve {
            name,
            token,
            legacy,
            timeout_secs,
            explain,
        } => {
            let token = token
                .or_else(|| settings.slack.bot_token.clone())
                .context("no Slack token: pass --token or set SLACK_BOT_TOKEN")?;
            let mode = DirectoryMode::from_legacy_flag(legacy || settings.slack.legacy_app);
            let timeout = timeout_secs
                .map(Duration::from_secs)
                .unwrap_or_else(|| settings.slack.resolve_timeout());

            let client = Arc::new(SlackClient::new(&settings.slack)?);
            let resolver =
                ChannelResolver::new(client, mode).with_page_limit(settings.slack.page_limit);

            let resolution = {
                let _timer = Timer::new("resolve_channel");
                resolver.lookup(&token, &name, timeout).await
            };

            let stripped = strip_channel_name(&name);
            match &resolution {
                Resolution::Found { kind, id, .. } => {
                    println!("{}{} -> {}", kind.prefix(), stripped, id);
                }
                other if explain => {
                    bail!("could not resolve {}: {:?}", name, other);
                }
                other => {
                    bail!("{}{} not found", other.kind().prefix(), stripped);
                }
            }
        }
    }

    Ok(())
}
