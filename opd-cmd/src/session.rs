//! Session, navigation and local store commands.
//!
//! Logging in against the backend is outside this tool: `session login`
//! records a token and permission list obtained elsewhere.

use crate::context::Context;
use crate::output::{print_json, print_records, print_table};
use anyhow::Context as _;
use clap::Subcommand;
use log::info;
use opd_core::storage::{clear_session, keys, ClientStorage};
use opd_data::navigation::{menu_items, required_permission};
use opd_data::permissions::RouteDecision;
use serde_json::json;

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Store a token and permission list obtained from the backend login
    Login {
        #[arg(long)]
        token: String,

        /// JSON array of permission names, e.g. '["docs.view"]'
        #[arg(long)]
        permissions: String,

        /// Raw JSON of the logged-in user
        #[arg(long)]
        user: Option<String>,
    },

    /// Forget token, permissions and user (cached notes are kept)
    Logout,

    /// Show what the current session may do
    Show,
}

#[derive(Subcommand, Debug)]
pub enum RouteCommand {
    /// Landing route for the current permissions
    Default,

    /// Sidebar entries the session may open
    Menu,

    /// Check whether a route may be opened
    Check { route: String },
}

#[derive(Subcommand, Debug)]
pub enum StoreCommand {
    /// List stored entries
    List {
        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Drop cached SWR notes, for one year or all of them
    ClearNotes {
        #[arg(long)]
        year: Option<i32>,
    },
}

/// Parse and normalize a permission list before it is stored.
fn normalize_permissions(raw: &str) -> anyhow::Result<String> {
    let list: Vec<String> =
        serde_json::from_str(raw).context("permissions must be a JSON array of strings")?;
    Ok(serde_json::to_string(&list)?)
}

pub fn run_session(ctx: &mut Context, command: SessionCommand) -> anyhow::Result<()> {
    match command {
        SessionCommand::Login {
            token,
            permissions,
            user,
        } => {
            let permissions = normalize_permissions(&permissions)?;
            ctx.storage.set_item(keys::TOKEN, token.trim())?;
            ctx.storage.set_item(keys::PERMISSIONS, &permissions)?;
            match user {
                Some(user) => ctx.storage.set_item(keys::USER, &user)?,
                None => ctx.storage.remove_item(keys::USER)?,
            }
            ctx.permissions = opd_data::permissions::PermissionStore::from_json(&permissions);
            info!(
                "[OPD] session: stored, landing route {}",
                ctx.permissions.resolve_default_route()
            );
            Ok(())
        }
        SessionCommand::Logout => {
            clear_session(ctx.storage.as_ref())?;
            ctx.permissions.invalidate();
            Ok(())
        }
        SessionCommand::Show => {
            let logged_in = ctx.storage.get_item(keys::TOKEN)?.is_some();
            let granted: Vec<&str> = ctx.permissions.granted().collect();
            let landing = ctx.permissions.resolve_default_route();
            if ctx.config.json {
                print_json(&json!({
                    "loggedIn": logged_in,
                    "permissions": granted,
                    "defaultRoute": landing,
                }))
            } else {
                print_table(
                    &["logged_in", "default_route", "permissions"],
                    &[vec![logged_in.to_string(), landing.to_string(), granted.join(",")]],
                )
            }
        }
    }
}

pub fn run_route(ctx: &Context, command: RouteCommand) -> anyhow::Result<()> {
    match command {
        RouteCommand::Default => {
            println!("{}", ctx.permissions.resolve_default_route());
            Ok(())
        }
        RouteCommand::Menu => {
            let items = menu_items(&ctx.permissions);
            if ctx.config.json {
                print_json(&items)
            } else {
                let rows: Vec<Vec<String>> = items
                    .iter()
                    .map(|m| vec![m.title.to_string(), m.route.to_string()])
                    .collect();
                print_table(&["title", "route"], &rows)
            }
        }
        RouteCommand::Check { route } => {
            let decision = ctx.permissions.guard(&route, required_permission(&route));
            match decision {
                RouteDecision::Render => println!("render {}", route),
                RouteDecision::Redirect(target) => println!("redirect {}", target),
            }
            Ok(())
        }
    }
}

pub fn run_store(ctx: &Context, command: StoreCommand) -> anyhow::Result<()> {
    match command {
        StoreCommand::List { prefix } => {
            let entries = ctx.storage.entries(&prefix)?;
            if ctx.config.json {
                print_json(&entries)
            } else {
                print_records(&entries)
            }
        }
        StoreCommand::ClearNotes { year } => {
            let prefix = match year {
                Some(year) => format!("{}{}:", keys::SWR_NOTES_PREFIX, year),
                None => keys::SWR_NOTES_PREFIX.to_string(),
            };
            let removed = ctx.storage.remove_prefix(&prefix)?;
            println!("removed {} cached note entries", removed);
            Ok(())
        }
    }
}
