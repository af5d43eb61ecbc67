//! One-shot calculator: submit a single form and print the result block.

use anyhow::{bail, Context, Result};
use clap::Parser;
use nact_web::cli::{init_tracing, FrontendArgs};
use nact_web::{transport, Calculation, Controller, FormSnapshot, SessionConfig, TransportEvent};
use tracing::info;

#[derive(Parser)]
#[command(name = "nact", version, about = "Neutron activation and scattering calculator")]
struct Cli {
    #[command(flatten)]
    frontend: FrontendArgs,

    /// Calculation to run: activation or scattering
    #[arg(long, default_value = "activation", value_parser = parse_calculation)]
    calculate: Calculation,

    /// Form field as NAME=VALUE, e.g. --field sample=Co --field time_off=720
    #[arg(long = "field", short = 'f', value_parser = parse_field)]
    fields: Vec<(String, String)>,
}

fn parse_calculation(raw: &str) -> Result<Calculation, String> {
    Calculation::parse(raw).ok_or_else(|| format!("unknown calculation {raw:?}"))
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got {raw:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = cli.frontend.load_config().context("loading configuration")?;
    let (session, warnings) = SessionConfig::from_launch(&config.session);
    info!(
        transport = config.transport.kind.as_str(),
        endpoint = %config.transport.endpoint(),
        cutoff = session.cutoff,
        "configuration loaded"
    );

    let mut controller = Controller::new(session, &warnings, transport::from_config(&config.transport));
    let mut events = controller.start().await;

    while !controller.is_ready() {
        let Some(event) = events.recv().await else {
            bail!("transport stopped before it was ready");
        };
        let failed = matches!(event, TransportEvent::Response(_));
        controller.handle_event(event);
        if failed {
            print!("{}", controller.results_html());
            bail!("transport failed to start");
        }
    }

    let form: FormSnapshot = cli.fields.into_iter().collect();
    controller
        .click(cli.calculate, &form)
        .context("submitting form")?;

    if controller.is_busy() {
        let event = events
            .recv()
            .await
            .context("transport stopped before replying")?;
        controller.handle_event(event);
    }

    print!("{}", controller.results_html());
    Ok(())
}
