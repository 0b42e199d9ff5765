//! Command implementations for the OPD CLI.
//!
//! Every subcommand runs against one [`context::Context`]: the local store,
//! the permissions cached in it and, when the command needs the backend, an
//! API client built from the global options.

use clap::Subcommand;

pub mod context;
pub mod fleet;
pub mod output;
pub mod resource;
pub mod scrap;
pub mod session;
pub mod swr;

pub use context::{Config, Context};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record or clear the login session
    #[command(subcommand)]
    Session(session::SessionCommand),

    /// Landing route and menu for the current permissions
    #[command(subcommand)]
    Route(session::RouteCommand),

    /// Inspect the local store
    #[command(subcommand)]
    Store(session::StoreCommand),

    /// List, create, update or delete records of a collection
    Resource(resource::ResourceArgs),

    /// SWR yearly pivot, notes and import
    #[command(subcommand)]
    Swr(swr::SwrCommand),

    /// Call record statistics per fleet
    #[command(subcommand)]
    Fleet(fleet::FleetCommand),

    /// Radio scrap summary
    #[command(subcommand)]
    Scrap(scrap::ScrapCommand),
}

pub async fn run(config: Config, command: Command) -> anyhow::Result<()> {
    let mut ctx = Context::open(config)?;
    match command {
        Command::Session(command) => session::run_session(&mut ctx, command),
        Command::Route(command) => session::run_route(&ctx, command),
        Command::Store(command) => session::run_store(&ctx, command),
        Command::Resource(args) => resource::run_resource(&ctx, args).await,
        Command::Swr(command) => swr::run_swr(&ctx, command).await,
        Command::Fleet(command) => fleet::run_fleet(&ctx, command).await,
        Command::Scrap(command) => scrap::run_scrap(&ctx, command).await,
    }
}
