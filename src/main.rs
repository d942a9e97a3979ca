use clap::Parser;
use rule_track::cli::{self, Args};
use rule_track::console::Console;
use rule_track::mgmt::ManagementClient;
use rule_track::prompt::LinePrompter;
use rule_track::service::PublishWorkflow;
use rule_track::{telemetry, Config, Result};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    args.apply_to(&mut config);
    telemetry::init(&config.telemetry);

    let console = Console::new(&config.output);
    match run(&args, config, console.clone()).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            console.error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: &Args, mut config: Config, console: Console) -> Result<u8> {
    let mut prompter = LinePrompter::stdio();
    if args.interactive {
        cli::prompt_missing(&mut config, &mut prompter)?;
    }

    let client = ManagementClient::new(&config.server)?;
    info!(server = %client.base_url(), "using management server");

    let request = args.run_request(&config);
    let mut workflow = PublishWorkflow::new(Arc::new(client), prompter, console, config.poll);
    let outcome = workflow.run(request).await?;

    Ok(outcome.exit_code(args.interactive))
}
