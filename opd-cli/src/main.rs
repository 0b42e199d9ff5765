//! OPD CLI - command line client for the operations dashboard backend.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "opd",
    version,
    about = "Operations dashboard toolkit: letters, radios, SWR signal and call records"
)]
struct Cli {
    #[command(flatten)]
    config: opd_cmd::Config,

    #[command(subcommand)]
    command: opd_cmd::Command,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    opd_cmd::run(cli.config, cli.command).await
}
