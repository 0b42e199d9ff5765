//! Generic CRUD commands over every backend collection.

use crate::context::Context;
use crate::output::{confirm, print_json, print_records};
use anyhow::{anyhow, Context as _};
use clap::{Args, Subcommand, ValueEnum};
use log::info;
use opd_core::letters::{Company, DocumentType, LetterNumber};
use opd_core::pagination::{Sort, SortDirection};
use opd_core::radio::{RadioConventional, RadioGrafir, RadioScrap, RadioTrunking};
use opd_core::resource::Resource;
use opd_core::swr::{SwrChannel, SwrHistory, SwrSite};
use opd_data::list::{LoadState, ListController};
use serde_json::json;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    Companies,
    DocumentTypes,
    LetterNumbers,
    RadioTrunkings,
    RadioConventionals,
    RadioGrafirs,
    RadioScraps,
    SwrSites,
    SwrChannels,
    SwrHistories,
}

impl ResourceKind {
    /// Screen whose permission governs this collection.
    pub fn route(self) -> &'static str {
        match self {
            ResourceKind::Companies => "/companies",
            ResourceKind::DocumentTypes => "/document-types",
            ResourceKind::LetterNumbers => "/letter-numbers",
            ResourceKind::RadioTrunkings => "/inspeksi-kpc/radio-trunking",
            ResourceKind::RadioConventionals => "/inspeksi-kpc/radio-conventional",
            ResourceKind::RadioGrafirs => "/inspeksi-kpc/radio-grafir",
            ResourceKind::RadioScraps => "/inspeksi-kpc/radio-scrap",
            ResourceKind::SwrSites => "/swr/sites",
            ResourceKind::SwrChannels => "/swr/channels",
            ResourceKind::SwrHistories => "/swr/history",
        }
    }
}

#[derive(Args, Debug)]
pub struct ResourceArgs {
    #[arg(value_enum)]
    pub kind: ResourceKind,

    #[command(subcommand)]
    pub action: ResourceAction,
}

#[derive(Subcommand, Debug)]
pub enum ResourceAction {
    /// List one page
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        page_size: u32,

        #[arg(long)]
        search: Option<String>,

        #[arg(long)]
        sort_by: Option<String>,

        #[arg(long, default_value = "asc")]
        sort_dir: SortDirection,

        /// Resource filter as key=value, repeatable
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },

    /// Create a record from a JSON payload
    Create {
        #[arg(long)]
        data: String,
    },

    /// Update a record from a JSON payload of the editable fields
    Update {
        id: i64,

        #[arg(long)]
        data: String,
    },

    /// Delete a record
    Delete {
        id: i64,

        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("filter '{}' is not key=value", raw)),
    }
}

pub async fn run_resource(ctx: &Context, args: ResourceArgs) -> anyhow::Result<()> {
    ctx.guard(args.kind.route())?;
    match args.kind {
        ResourceKind::Companies => run_action::<Company>(ctx, args.action).await,
        ResourceKind::DocumentTypes => run_action::<DocumentType>(ctx, args.action).await,
        ResourceKind::LetterNumbers => run_action::<LetterNumber>(ctx, args.action).await,
        ResourceKind::RadioTrunkings => run_action::<RadioTrunking>(ctx, args.action).await,
        ResourceKind::RadioConventionals => run_action::<RadioConventional>(ctx, args.action).await,
        ResourceKind::RadioGrafirs => run_action::<RadioGrafir>(ctx, args.action).await,
        ResourceKind::RadioScraps => run_action::<RadioScrap>(ctx, args.action).await,
        ResourceKind::SwrSites => run_action::<SwrSite>(ctx, args.action).await,
        ResourceKind::SwrChannels => run_action::<SwrChannel>(ctx, args.action).await,
        ResourceKind::SwrHistories => run_action::<SwrHistory>(ctx, args.action).await,
    }
}

async fn run_action<R: Resource>(ctx: &Context, action: ResourceAction) -> anyhow::Result<()> {
    let api = ctx.api()?;
    match action {
        ResourceAction::List {
            page,
            page_size,
            search,
            sort_by,
            sort_dir,
            filters,
        } => {
            let mut controller: ListController<R> = ListController::new(page_size);
            controller.set_search(search.as_deref().unwrap_or(""));
            controller.set_sort(sort_by.map(|field| Sort {
                field,
                direction: sort_dir,
            }));
            for (key, value) in &filters {
                controller.set_filter(key, Some(value));
            }
            controller.set_page(page);
            controller.refresh(&api).await?;

            if let LoadState::Error(message) = controller.state() {
                return Err(anyhow!(message.clone()));
            }
            let info = controller.info();
            info!(
                "[OPD] cli: {} page {}/{} ({} total)",
                R::LABEL,
                info.current_page,
                info.total_pages,
                info.total_count
            );
            if ctx.config.json {
                print_json(&json!({ "rows": controller.rows(), "info": info }))
            } else {
                print_records(controller.rows())
            }
        }
        ResourceAction::Create { data } => {
            let payload: R::Create = serde_json::from_str(&data)
                .with_context(|| format!("invalid {} payload", R::LABEL))?;
            let mut controller: ListController<R> = ListController::new(10);
            controller.create(&api, &payload).await?;
            println!("created {}", R::LABEL);
            Ok(())
        }
        ResourceAction::Update { id, data } => {
            let payload: R::Update = serde_json::from_str(&data)
                .with_context(|| format!("invalid {} payload", R::LABEL))?;
            let mut controller: ListController<R> = ListController::new(10);
            controller.update(&api, id, &payload).await?;
            println!("updated {} {}", R::LABEL, id);
            Ok(())
        }
        ResourceAction::Delete { id, yes } => {
            let mut controller: ListController<R> = ListController::new(10);
            let deleted = controller
                .delete(&api, id, |prompt| confirm(prompt, yes))
                .await?;
            if deleted {
                println!("deleted {} {}", R::LABEL, id);
            } else {
                println!("cancelled");
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opd_data::navigation::required_permission;

    #[test]
    fn every_kind_maps_to_a_guarded_screen() {
        for kind in ResourceKind::value_variants() {
            assert!(
                required_permission(kind.route()).is_some(),
                "{:?} has no menu permission",
                kind
            );
        }
    }

    #[test]
    fn filters_need_a_key() {
        assert_eq!(
            parse_filter("isActive=true").unwrap(),
            ("isActive".to_string(), "true".to_string())
        );
        assert_eq!(
            parse_filter("swrChannelId= 4").unwrap(),
            ("swrChannelId".to_string(), "4".to_string())
        );
        assert!(parse_filter("=x").is_err());
        assert!(parse_filter("novalue").is_err());
    }
}
