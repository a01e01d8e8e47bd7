//! `baselines` subcommand execution

use crate::output::{render_comparison, render_detail, render_list};
use crate::prompt::TerminalConfirm;
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use sprintforge_baseline::{
    AutoConfirm, BaselineLifecycleController, BaselineListModel, ComparisonPoller,
    ComparisonViewModel, Confirmation, SortKey,
};
use sprintforge_client::{BaselineApi, ClientConfig, HttpBaselineApi, StaticToken};
use sprintforge_model::{BaselineId, ForgeError, ProjectId};
use sprintforge_query::QueryCache;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

fn project(args: &ArgMatches) -> Result<ProjectId> {
    args.get_one::<ProjectId>("project")
        .copied()
        .context("missing --project")
}

fn baseline(args: &ArgMatches) -> Result<BaselineId> {
    args.get_one::<BaselineId>("baseline")
        .copied()
        .context("missing baseline id")
}

/// API, cache and configuration shared by every subcommand
pub struct App {
    api: Arc<dyn BaselineApi>,
    cache: QueryCache,
    config: ClientConfig,
    confirm: Arc<dyn Confirmation>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Wire the HTTP client from configuration
    ///
    /// # Errors
    /// `ForgeError::Config` if the HTTP client cannot be built.
    pub fn connect(config: ClientConfig) -> Result<Self, ForgeError> {
        let tokens = Arc::new(StaticToken::from_option(config.token.clone()));
        let api = Arc::new(HttpBaselineApi::new(&config, tokens)?);
        Ok(Self::new(api, config))
    }

    /// Use an existing API implementation
    #[must_use]
    pub fn new(api: Arc<dyn BaselineApi>, config: ClientConfig) -> Self {
        let cache = QueryCache::with_ttl(config.cache_capacity, config.cache_ttl());
        Self {
            api,
            cache,
            config,
            confirm: Arc::new(TerminalConfirm),
        }
    }

    /// Replace the terminal prompt used by `delete`
    #[must_use]
    pub fn with_confirmation(mut self, confirm: Arc<dyn Confirmation>) -> Self {
        self.confirm = confirm;
        self
    }

    fn controller(&self, confirm: Arc<dyn Confirmation>) -> BaselineLifecycleController {
        BaselineLifecycleController::new(Arc::clone(&self.api), self.cache.clone(), confirm)
    }

    async fn view_model(&self, args: &ArgMatches) -> Result<ComparisonViewModel, ForgeError> {
        let vm = ComparisonViewModel::new(Arc::clone(&self.api), self.cache.clone());
        vm.set_include_unchanged(args.get_flag("include-unchanged")).await?;
        vm.set_sort_key(args.get_one::<SortKey>("sort").copied().unwrap_or_default());
        Ok(vm)
    }

    /// Run one `baselines` subcommand, writing its output to `out`
    ///
    /// # Errors
    /// Any API failure, or a declined delete.
    pub async fn run<W: Write + Send>(&self, matches: &ArgMatches, out: &mut W) -> Result<()> {
        match matches.subcommand() {
            Some(("list", args)) => {
                let page = args.get_one::<u32>("page").copied().unwrap_or(1);
                let limit = args
                    .get_one::<u32>("limit")
                    .copied()
                    .unwrap_or(self.config.page_limit);
                let model = BaselineListModel::new(Arc::clone(&self.api), self.cache.clone());
                let list = model.load(project(args)?, page, limit).await?;
                write!(out, "{}", render_list(&list))?;
            }
            Some(("show", args)) => {
                let detail = self.api.get_baseline(project(args)?, baseline(args)?).await?;
                write!(out, "{}", render_detail(&detail))?;
            }
            Some(("create", args)) => {
                let name = args.get_one::<String>("name").map_or("", String::as_str);
                let description = args.get_one::<String>("description").cloned();
                let created = self
                    .controller(Arc::clone(&self.confirm))
                    .create(project(args)?, name, description)
                    .await?;
                writeln!(out, "Created baseline {} ({})", created.name, created.id)?;
            }
            Some(("delete", args)) => {
                let confirm: Arc<dyn Confirmation> = if args.get_flag("yes") {
                    Arc::new(AutoConfirm(true))
                } else {
                    Arc::clone(&self.confirm)
                };
                let id = baseline(args)?;
                match self.controller(confirm).delete(project(args)?, id).await {
                    Ok(()) => writeln!(out, "Deleted baseline {id}")?,
                    Err(ForgeError::Cancelled) => bail!("delete cancelled"),
                    Err(e) => return Err(e.into()),
                }
            }
            Some(("activate", args)) => {
                let response = self
                    .controller(Arc::clone(&self.confirm))
                    .activate(project(args)?, baseline(args)?)
                    .await?;
                writeln!(out, "{} ({})", response.message, response.id)?;
            }
            Some(("compare", args)) => {
                let vm = self.view_model(args).await?;
                let view = vm.load(project(args)?, baseline(args)?).await?;
                if args.get_flag("json") {
                    serde_json::to_writer_pretty(&mut *out, &view)?;
                    writeln!(out)?;
                } else {
                    write!(out, "{}", render_comparison(&view))?;
                }
            }
            Some(("watch", args)) => self.watch(args, out).await?,
            Some((other, _)) => bail!("unknown baselines command {other:?}"),
            None => bail!("missing baselines command"),
        }
        Ok(())
    }

    async fn watch<W: Write + Send>(&self, args: &ArgMatches, out: &mut W) -> Result<()> {
        let interval = args
            .get_one::<u64>("interval")
            .map_or_else(|| self.config.poll_interval(), |s| Duration::from_secs(*s));
        let vm = Arc::new(self.view_model(args).await?);
        let mut views = vm.subscribe();
        if let Err(e) = vm.load(project(args)?, baseline(args)?).await {
            tracing::warn!(error = %e, "initial comparison load failed");
        }
        let _poller = ComparisonPoller::spawn(Arc::clone(&vm), &self.cache, interval);
        tracing::info!(interval_secs = interval.as_secs(), "watching comparison");

        let mut shown = None;
        loop {
            let view = views.borrow_and_update().clone();
            if !view.loading && shown.as_ref() != Some(&view) {
                write!(out, "{}", render_comparison(&view))?;
                writeln!(out)?;
                out.flush()?;
                shown = Some(view);
            }
            tokio::select! {
                changed = views.changed() => if changed.is_err() { break },
                _ = tokio::signal::ctrl_c() => break,
            }
        }
        Ok(())
    }
}
