//! Contact Form Relay CLI
//!
//! # Usage
//!
//! ```bash
//! contact-relay serve
//! contact-relay show
//! contact-relay show --relay-url http://localhost:8888
//! contact-relay submit --field email=jane@example.com --field interests=pricing,support
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use contact_relay::{
    build_router,
    render::{collect_values, parse_assignment, render_form},
    ConfigArgs, DirectGateway, FormShell, FormsGateway, HubSpotClient, RelayClient, RelayConfig, RelayState,
    ShellState, SUCCESS_MESSAGE,
};

#[derive(Parser)]
#[command(name = "contact-relay")]
#[command(version)]
#[command(about = "Render a HubSpot contact form and relay its submissions", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay for browser front-ends
    Serve,
    /// Load and print the form
    Show {
        /// Go through a running relay instead of calling HubSpot directly
        #[arg(long)]
        relay_url: Option<String>,
    },
    /// Fill in and submit the form
    Submit {
        /// Go through a running relay instead of calling HubSpot directly
        #[arg(long)]
        relay_url: Option<String>,

        /// Answer as name=value; multi-select answers are comma separated
        #[arg(long = "field", short = 'f')]
        fields: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => serve(cli.config).await,
        Commands::Show { relay_url } => {
            let mut shell = shell(cli.config, relay_url.as_deref())?;
            let definition = shell.load().await?;
            print!("{}", render_form(definition));
            Ok(())
        }
        Commands::Submit { relay_url, fields } => {
            let mut shell = shell(cli.config, relay_url.as_deref())?;
            submit(&mut shell, &fields).await
        }
    }
}

async fn serve(args: ConfigArgs) -> anyhow::Result<()> {
    let config = RelayConfig::try_from(args)?;
    let addr = config.listen_addr;
    let state = RelayState::new(config).context("building HubSpot client")?;

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!("Server is running on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Direct access needs the full configuration, the relay only the form id
fn shell(args: ConfigArgs, relay_url: Option<&str>) -> anyhow::Result<FormShell<Box<dyn FormsGateway>>> {
    if let Some(url) = relay_url {
        let gateway = Box::new(RelayClient::new(url)) as Box<dyn FormsGateway>;
        return Ok(FormShell::new(gateway, args.require_form_id()?));
    }

    let config = RelayConfig::try_from(args)?;
    let client = HubSpotClient::from_config(&config).context("building HubSpot client")?;
    let gateway = Box::new(DirectGateway::new(client, &config)) as Box<dyn FormsGateway>;
    Ok(FormShell::new(gateway, config.form_id))
}

async fn submit(shell: &mut FormShell<Box<dyn FormsGateway>>, fields: &[String]) -> anyhow::Result<()> {
    let answers = fields
        .iter()
        .map(|f| parse_assignment(f))
        .collect::<Result<Vec<_>, _>>()?;

    let definition = shell.load().await?;
    let raw = collect_values(definition, &answers)?;

    match shell.submit(&raw).await? {
        ShellState::Submitted => {
            println!("{}", SUCCESS_MESSAGE);
            Ok(())
        }
        ShellState::SubmitError { message } => anyhow::bail!("{}", message),
        other => anyhow::bail!("unexpected state after submit: {:?}", other),
    }
}
