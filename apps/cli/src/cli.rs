//! Command-line arguments.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use moduploader_protocol::{PublishedFileId, parse_item_reference};

#[derive(Debug, Parser)]
#[command(
    name = "moduploader",
    version,
    about = "Publish Cities: Skylines mods to the Steam Workshop",
    long_about = "Publish Cities: Skylines mods to the Steam Workshop without starting the game.

Run without arguments for the interactive console.

EXAMPLES:
  moduploader --newmod \"My Mod\" ./build               # create an item with the default preview
  moduploader --update 123456789 ./build preview.png  # update content and preview
  moduploader --list --json                           # list your published mods",
    group(ArgGroup::new("mode").args(["newmod", "update", "list"]).multiple(false))
)]
pub struct Cli {
    /// Create a new item
    #[arg(long, num_args = 2..=3, value_names = ["TITLE", "CONTENT_PATH", "PREVIEW_PATH"])]
    pub newmod: Option<Vec<String>>,

    /// Update an existing item, by id or workshop URL
    #[arg(long, num_args = 2..=3, value_names = ["ITEM", "CONTENT_PATH", "PREVIEW_PATH"])]
    pub update: Option<Vec<String>>,

    /// List your published mods
    #[arg(long)]
    pub list: bool,

    /// Print the listing as JSON
    #[arg(long, requires = "list")]
    pub json: bool,

    /// Log debug output to the console
    #[arg(short, long)]
    pub verbose: bool,
}

/// What the process was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    NewMod {
        title: String,
        content: PathBuf,
        preview: Option<PathBuf>,
    },
    Update {
        item: PublishedFileId,
        content: PathBuf,
        preview: Option<PathBuf>,
    },
    List {
        json: bool,
    },
    Interactive,
}

impl Cli {
    /// Parses the process arguments, accepting the single-dash legacy forms.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    pub fn command(&self) -> anyhow::Result<Command> {
        if let Some(values) = &self.newmod {
            let (title, content, preview) = split_triple(values);
            if title.trim().is_empty() {
                anyhow::bail!("title must not be empty");
            }
            return Ok(Command::NewMod {
                title: title.to_string(),
                content,
                preview,
            });
        }
        if let Some(values) = &self.update {
            let (item, content, preview) = split_triple(values);
            let item = parse_item_reference(item)?;
            return Ok(Command::Update {
                item,
                content,
                preview,
            });
        }
        if self.list {
            return Ok(Command::List { json: self.json });
        }
        Ok(Command::Interactive)
    }
}

/// First value, content path, optional preview path. clap guarantees two
/// or three values.
fn split_triple(values: &[String]) -> (&str, PathBuf, Option<PathBuf>) {
    let first = values.first().map(String::as_str).unwrap_or_default();
    let content = values.get(1).map(PathBuf::from).unwrap_or_default();
    let preview = values.get(2).map(PathBuf::from);
    (first, content, preview)
}

/// Rewrites `-newmod`, `-update`, `-list` and `-help` (any case) to their
/// double-dash forms.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let lower = arg.to_str().map(str::to_ascii_lowercase);
            match lower.as_deref() {
                Some("-newmod") => "--newmod".into(),
                Some("-update") => "--update".into(),
                Some("-list") => "--list".into(),
                Some("-help") => "--help".into(),
                _ => arg,
            }
        })
        .collect()
}
