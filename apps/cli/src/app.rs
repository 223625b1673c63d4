//! Application flow: wires the workshop core to the console.

use std::io::Write;
use std::path::{Path, PathBuf};

use moduploader_protocol::{CATEGORY_TAG, PublishedFileId};
use moduploader_workshop::{
    GameVersionSource, MetadataResolver, ModDescriptor, PublishOutcome, PublishResult,
    UploadOrchestrator, WorkshopService, filter,
};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::Command;
use crate::config::Config;
use crate::console::{ConsoleProgress, format_listing};
use crate::interactive;

/// Checks that the content folder and optional preview exist.
pub fn check_paths(content: &Path, preview: Option<&Path>) -> anyhow::Result<()> {
    if !content.is_dir() {
        anyhow::bail!("content folder not found: {}", content.display());
    }
    if let Some(preview) = preview
        && !preview.is_file()
    {
        anyhow::bail!("preview image not found: {}", preview.display());
    }
    Ok(())
}

pub struct App<'a> {
    resolver: MetadataResolver<'a>,
    orchestrator: UploadOrchestrator<'a>,
    cancel: CancellationToken,
}

impl<'a> App<'a> {
    pub fn new(
        service: &'a dyn WorkshopService,
        versions: &'a dyn GameVersionSource,
        config: &Config,
        cancel: CancellationToken,
    ) -> Self {
        let resolver = MetadataResolver::new(service, config.app_id())
            .with_poll(config.poll_settings())
            .with_cancel(cancel.clone());
        Self {
            resolver,
            orchestrator: UploadOrchestrator::new(service, versions, config.upload_settings()),
            cancel,
        }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub async fn run(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::NewMod {
                title,
                content,
                preview,
            } => {
                let mut descriptor = self.resolver.resolve_new(title, None, Vec::new());
                self.publish(&mut descriptor, content, preview).await?;
            }
            Command::Update {
                item,
                content,
                preview,
            } => {
                let mut descriptor = self.fetch(item).await?;
                self.publish(&mut descriptor, content, preview).await?;
            }
            Command::List { json } => self.list(json, None).await?,
            Command::Interactive => {
                let input = BufReader::new(tokio::io::stdin());
                interactive::run(self, input, std::io::stdout()).await?;
            }
        }
        Ok(())
    }

    /// Resolves an existing item and tells the operator which one it is.
    pub async fn fetch(&self, item: PublishedFileId) -> anyhow::Result<ModDescriptor> {
        println!("Fetching item information...");
        let descriptor = self.resolver.resolve_by_id(item).await?;
        println!("Will update: {} ({item})", descriptor.title);
        Ok(descriptor)
    }

    pub fn new_descriptor(
        &self,
        title: String,
        description: Option<String>,
        tags: Vec<String>,
    ) -> ModDescriptor {
        self.resolver.resolve_new(title, description, tags)
    }

    /// Submits `descriptor` and reports the result on the console.
    pub async fn publish(
        &self,
        descriptor: &mut ModDescriptor,
        content: PathBuf,
        preview: Option<PathBuf>,
    ) -> anyhow::Result<PublishOutcome> {
        self.publish_to(descriptor, content, preview, &mut std::io::stdout())
            .await
    }

    /// Like [`publish`](Self::publish), writing the success report to `out`.
    /// A failure is only returned, never written.
    pub async fn publish_to<W: Write>(
        &self,
        descriptor: &mut ModDescriptor,
        content: PathBuf,
        preview: Option<PathBuf>,
        out: &mut W,
    ) -> anyhow::Result<PublishOutcome> {
        let sink = ConsoleProgress::default();
        let result = self
            .orchestrator
            .submit_with_paths(descriptor, content, preview, &sink, &self.cancel)
            .await;
        sink.finish();

        if let PublishResult::Failure(reason) = PublishResult::from(&result) {
            debug!(%reason, "publish failed");
        }
        let outcome = result?;
        writeln!(out, "Upload succeeded: {} ({})", descriptor.title, outcome.id)?;
        if outcome.needs_legal_agreement {
            writeln!(
                out,
                "Accept the Steam Workshop legal agreement to make the item visible: {}",
                outcome.link()
            )?;
        } else {
            writeln!(out, "Workshop page: {}", outcome.link())?;
        }
        Ok(outcome)
    }

    /// Prints the operator's mods, as text or JSON, narrowed by `query`.
    pub async fn list(&self, json: bool, query: Option<&str>) -> anyhow::Result<()> {
        if !json {
            println!("Fetching your mods...");
        }
        let items = self.resolver.list_owned().await?;
        let matched = filter(&items, query.unwrap_or_default());
        if json {
            let mods: Vec<_> = matched
                .into_iter()
                .filter(|i| i.has_tag(CATEGORY_TAG))
                .collect();
            println!("{}", serde_json::to_string_pretty(&mods)?);
        } else {
            println!("{}", format_listing(matched));
        }
        Ok(())
    }
}
