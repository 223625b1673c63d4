//! Interactive console.

use std::io::Write;
use std::path::PathBuf;

use moduploader_protocol::{PublishedFileId, parse_item_reference};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio_util::sync::CancellationToken;

use crate::app::App;

const MENU: &str = "Enter a command:
  newmod                             create a new mod
  mymod [search]                     list your mods
  <id or URL> [-UpdatePreviewOnly]   update an existing mod
  exit                               quit";

const PREVIEW_ONLY_FLAG: &str = "-updatepreviewonly";

/// A line typed at the main prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    NewMod,
    MyMods {
        query: Option<String>,
    },
    Update {
        item: PublishedFileId,
        preview_only: bool,
    },
    Exit,
    Invalid(String),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let lower = line.to_ascii_lowercase();
    match lower.as_str() {
        "" => Input::Invalid("please enter a command".into()),
        "newmod" => Input::NewMod,
        "exit" => Input::Exit,
        _ if lower.split_whitespace().next() == Some("mymod") => {
            let query = line["mymod".len()..].trim();
            Input::MyMods {
                query: optional(query),
            }
        }
        _ => {
            let first = line.split_whitespace().next().unwrap_or_default();
            match parse_item_reference(first) {
                Ok(item) => Input::Update {
                    item,
                    preview_only: lower.contains(PREVIEW_ONLY_FLAG),
                },
                Err(e) => Input::Invalid(e.to_string()),
            }
        }
    }
}

/// Reads answers line by line, giving up when input ends or the operator
/// cancels.
pub struct Prompter<R, W> {
    lines: Lines<R>,
    out: W,
    cancel: CancellationToken,
}

impl<R, W> Prompter<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, out: W, cancel: CancellationToken) -> Self {
        Self {
            lines: input.lines(),
            out,
            cancel,
        }
    }

    pub fn say(&mut self, text: &str) -> anyhow::Result<()> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }

    /// Next trimmed line, or `None` at end of input.
    pub async fn read_line(&mut self) -> anyhow::Result<Option<String>> {
        tokio::select! {
            line = self.lines.next_line() => Ok(line?.map(|l| l.trim().to_string())),
            _ = self.cancel.cancelled() => Ok(None),
        }
    }

    pub async fn ask(&mut self, question: &str) -> anyhow::Result<String> {
        self.say(question)?;
        match self.read_line().await? {
            Some(answer) => Ok(answer),
            None => anyhow::bail!("input closed"),
        }
    }

    /// Repeats `question` until `parse` accepts the answer.
    pub async fn ask_until<T>(
        &mut self,
        question: &str,
        parse: impl Fn(&str) -> Result<T, String>,
    ) -> anyhow::Result<T> {
        loop {
            let answer = self.ask(question).await?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(problem) => self.say(&problem)?,
            }
        }
    }
}

fn required(answer: &str) -> Result<String, String> {
    if answer.is_empty() {
        Err("A value is required.".into())
    } else {
        Ok(answer.to_string())
    }
}

fn optional(answer: &str) -> Option<String> {
    (!answer.is_empty()).then(|| answer.to_string())
}

fn content_dir(answer: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(unquote(answer));
    if path.is_dir() {
        Ok(path)
    } else {
        Err(format!("Folder not found: {}", path.display()))
    }
}

fn preview_file(answer: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(unquote(answer));
    if path.is_file() {
        Ok(path)
    } else {
        Err(format!("File not found: {}", path.display()))
    }
}

fn optional_preview(answer: &str) -> Result<Option<PathBuf>, String> {
    if answer.is_empty() {
        Ok(None)
    } else {
        preview_file(answer).map(Some)
    }
}

/// Strips the quotes a shell drag-and-drop adds around paths.
fn unquote(answer: &str) -> &str {
    answer.trim().trim_matches('"')
}

pub fn split_tags(answer: &str) -> Vec<String> {
    answer
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Runs the prompt loop until `exit`, end of input or cancellation.
pub async fn run<R, W>(app: &App<'_>, input: R, out: W) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut prompter = Prompter::new(input, out, app.cancel_token().clone());
    prompter.say(&format!("Mod Uploader {}", env!("CARGO_PKG_VERSION")))?;

    loop {
        prompter.say("")?;
        prompter.say(MENU)?;
        let Some(line) = prompter.read_line().await? else {
            break;
        };

        let result = match parse_input(&line) {
            Input::Exit => break,
            Input::Invalid(reason) => {
                prompter.say(&format!("Invalid input: {reason}"))?;
                continue;
            }
            Input::MyMods { query } => app.list(false, query.as_deref()).await,
            Input::NewMod => new_mod(app, &mut prompter).await,
            Input::Update { item, preview_only } => {
                update(app, &mut prompter, item, preview_only).await
            }
        };

        if let Err(e) = result {
            tracing::debug!(error = %e, "command failed");
            prompter.say(&format!("Error: {e:#}"))?;
        }
        if app.cancel_token().is_cancelled() {
            break;
        }
    }
    Ok(())
}

async fn new_mod<R, W>(app: &App<'_>, prompter: &mut Prompter<R, W>) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let title = prompter.ask_until("Title:", required).await?;
    let description = optional(&prompter.ask("Description (optional):").await?);
    let tags = split_tags(&prompter.ask("Tags, comma separated (optional):").await?);
    let content = prompter.ask_until("Content folder:", content_dir).await?;
    let preview = prompter
        .ask_until("Preview image (empty for the default):", optional_preview)
        .await?;

    let mut descriptor = app.new_descriptor(title, description, tags);
    app.publish(&mut descriptor, content, preview).await?;
    Ok(())
}

async fn update<R, W>(
    app: &App<'_>,
    prompter: &mut Prompter<R, W>,
    item: PublishedFileId,
    preview_only: bool,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut descriptor = app.fetch(item).await?;
    descriptor.update_preview_only = preview_only;

    let (content, preview) = if preview_only {
        let preview = prompter.ask_until("Preview image:", preview_file).await?;
        (PathBuf::new(), Some(preview))
    } else {
        let content = prompter.ask_until("Content folder:", content_dir).await?;
        let preview = prompter
            .ask_until("Preview image (empty to keep the current one):", optional_preview)
            .await?;
        (content, preview)
    };
    descriptor.change_log = optional(&prompter.ask("Change note (optional):").await?);

    app.publish(&mut descriptor, content, preview).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_commands_ignore_case() {
        assert_eq!(parse_input("NewMod"), Input::NewMod);
        assert_eq!(parse_input(" mymod "), Input::MyMods { query: None });
        assert_eq!(parse_input("EXIT"), Input::Exit);
    }

    #[test]
    fn mymod_takes_a_search() {
        assert_eq!(
            parse_input("MyMod traffic manager"),
            Input::MyMods {
                query: Some("traffic manager".into()),
            }
        );
        assert!(matches!(parse_input("mymods"), Input::Invalid(_)));
    }

    #[test]
    fn id_with_preview_flag() {
        assert_eq!(
            parse_input("12345 -UpdatePreviewOnly"),
            Input::Update {
                item: PublishedFileId(12345),
                preview_only: true,
            }
        );
        assert_eq!(
            parse_input("12345"),
            Input::Update {
                item: PublishedFileId(12345),
                preview_only: false,
            }
        );
    }

    #[test]
    fn workshop_url_is_an_update() {
        assert_eq!(
            parse_input("https://steamcommunity.com/sharedfiles/filedetails/?id=42 -updatepreviewonly"),
            Input::Update {
                item: PublishedFileId(42),
                preview_only: true,
            }
        );
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(parse_input(""), Input::Invalid(_)));
        assert!(matches!(parse_input("upload please"), Input::Invalid(_)));
        assert!(matches!(
            parse_input("https://example.com/?id=1"),
            Input::Invalid(reason) if reason.contains("example.com")
        ));
    }

    #[test]
    fn tags_are_split_and_trimmed() {
        assert_eq!(split_tags(" Traffic, ,Roads ,"), vec!["Traffic", "Roads"]);
        assert!(split_tags("").is_empty());
    }

    #[tokio::test]
    async fn prompter_repeats_until_valid() {
        let tmp = tempfile::tempdir().unwrap();
        let input = format!("/nonexistent/mod\n\"{}\"\n", tmp.path().display());
        let mut out = Vec::new();
        let mut prompter = Prompter::new(input.as_bytes(), &mut out, CancellationToken::new());

        let dir = prompter.ask_until("Content folder:", content_dir).await.unwrap();
        assert_eq!(dir, tmp.path());
        drop(prompter);

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.matches("Content folder:").count(), 2);
        assert!(printed.contains("Folder not found: /nonexistent/mod"));
    }

    #[tokio::test]
    async fn prompter_reports_closed_input() {
        let mut prompter = Prompter::new(&b""[..], Vec::new(), CancellationToken::new());
        assert!(prompter.read_line().await.unwrap().is_none());
        assert!(prompter.ask("Title:").await.is_err());
    }

    #[tokio::test]
    async fn cancelled_prompter_stops_reading() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (_writer, reader) = tokio::io::duplex(64);
        let mut prompter = Prompter::new(
            tokio::io::BufReader::new(reader),
            Vec::new(),
            cancel,
        );
        assert!(prompter.read_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn optional_preview_accepts_blank() {
        let mut prompter = Prompter::new(&b"\n"[..], Vec::new(), CancellationToken::new());
        let preview = prompter
            .ask_until("Preview image:", optional_preview)
            .await
            .unwrap();
        assert_eq!(preview, None);
    }
}
