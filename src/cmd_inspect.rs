//! `inspect` subcommand: an interactive panel over a page fixture.
//!
//! The fixture is loaded into a [`Page`], a page agent is injected through a
//! local relay, and a [`PanelController`] drives it from stdin commands.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use dominspect_agent::{AgentHandle, addressing};
use dominspect_config::{Config, SettingsStore};
use dominspect_dom::{Document, Page, PageEvent};
use dominspect_panel::{PanelController, render_tree};
use dominspect_protocols::{Ack, Command, CommandTarget, ElementPath, InspectError, TabId};
use dominspect_relay::{Relay, RelayHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const TAB: TabId = TabId(1);

const HELP: &str = "\
Commands:
  show               current element
  tree               current element with descendants
  child N            enter child N
  parent             go to the parent element
  back               previous element
  select PATH        select by path, e.g. /1/0
  hover PATH         preview an element
  unhover            drop the preview
  click PATH         click an element in the page
  strip              remove the highlighted element's inline style as a page script would
  raw JSON           send a wire command, e.g. raw {\"type\":\"getRoot\"}
  pagehide           hide the page (ends the session)
  history            list the back stack
  state              page agent and relay status
  help               this text
  quit               clean up and exit";

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Show,
    Tree,
    Child(u32),
    Parent,
    Back,
    Select(ElementPath),
    Hover(ElementPath),
    Unhover,
    Click(ElementPath),
    Strip,
    Raw(Command),
    PageHide,
    History,
    State,
    Help,
    Quit,
}

impl ShellCommand {
    /// Parse a line. `Ok(None)` for blank lines.
    fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        if let Some(json) = line.trim_start().strip_prefix("raw") {
            if json.is_empty() || json.starts_with(char::is_whitespace) {
                let command = Command::from_json(json.trim())
                    .context("'raw' needs a JSON command")?;
                return Ok(Some(Self::Raw(command)));
            }
        }

        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let argument = words.next();
        if words.next().is_some() {
            bail!("too many arguments for '{}'", verb);
        }

        let path = || -> anyhow::Result<ElementPath> {
            let raw = argument.with_context(|| format!("'{}' needs a path", verb))?;
            Ok(raw.parse::<ElementPath>()?)
        };

        let command = match verb {
            "show" | "s" => Self::Show,
            "tree" | "t" => Self::Tree,
            "child" | "c" => {
                let raw = argument.context("'child' needs an index")?;
                let index = raw
                    .parse()
                    .with_context(|| format!("invalid child index '{}'", raw))?;
                Self::Child(index)
            }
            "parent" | "up" | "u" => Self::Parent,
            "back" | "b" => Self::Back,
            "select" => Self::Select(path()?),
            "hover" => Self::Hover(path()?),
            "unhover" => Self::Unhover,
            "click" => Self::Click(path()?),
            "strip" => Self::Strip,
            "pagehide" => Self::PageHide,
            "history" | "h" => Self::History,
            "state" => Self::State,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => bail!("unknown command '{}' (try 'help')", other),
        };
        Ok(Some(command))
    }
}

struct Session {
    config: Config,
    page: Page,
    relay: RelayHandle,
    agent: AgentHandle,
    panel: PanelController,
}

pub(crate) async fn handle_inspect_command(
    config: Config,
    fixture: &Path,
    settings: &SettingsStore,
) -> anyhow::Result<()> {
    if !settings.load()?.enabled {
        bail!(
            "inspection is disabled in {} (run `dominspect settings enable`)",
            settings.path().display()
        );
    }

    let document = Document::load_fixture(fixture)
        .with_context(|| format!("cannot load page fixture {}", fixture.display()))?;
    let page = Page::new(document);

    let (relay, relay_task) = Relay::spawn(config.panel.ack_timeout());
    let (agent, agent_task) =
        relay.inject_agent(TAB, page.clone(), config.agent.clone(), &config.highlight)?;
    let panel = PanelController::from_config(Arc::new(relay.clone()), relay.subscribe(), &config.panel);

    let ack = relay.inspect(TAB, config.panel.ack_timeout()).await?;
    if !ack.success {
        bail!("activation refused: {}", ack.error.unwrap_or_default());
    }
    info!("Inspecting {}", fixture.display());

    let mut session = Session {
        config,
        page,
        relay,
        agent,
        panel,
    };
    if !session.panel.open().await? {
        bail!("page did not return its root element");
    }
    session.show();
    println!("Type 'help' for commands.");

    let result = session.repl().await;

    if let Err(e) = session.panel.close().await {
        warn!("Cleanup failed: {}", e);
    }
    session.relay.shutdown();
    let _ = relay_task.await;
    agent_task.abort();
    result
}

impl Session {
    async fn repl(&mut self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            prompt()?;
            let Some(line) = lines.next_line().await? else {
                return Ok(());
            };

            // Clicks and reconnect echoes arrive between commands.
            if self.panel.pump() > 0 {
                println!("(page selection changed)");
            }

            let command = match ShellCommand::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    println!("{:#}", e);
                    continue;
                }
            };
            if command == ShellCommand::Quit {
                return Ok(());
            }
            match self.run(command).await {
                Ok(()) => {}
                Err(e) => println!("error: {:#}", e),
            }
            if self.agent.is_stopped() {
                println!("Page agent stopped.");
                return Ok(());
            }
        }
    }

    async fn run(&mut self, command: ShellCommand) -> anyhow::Result<()> {
        match command {
            ShellCommand::Show => self.show(),
            ShellCommand::Tree => self.tree(),
            ShellCommand::Child(index) => {
                let moved = self.panel.enter_child(index).await?;
                self.after_navigation(moved, "no such child");
            }
            ShellCommand::Parent => {
                let moved = self.panel.go_to_parent().await?;
                self.after_navigation(moved, "already at the root");
            }
            ShellCommand::Back => {
                if !self.panel.history().can_go_back() {
                    println!("history is empty");
                    return Ok(());
                }
                let moved = self.panel.back().await?;
                self.after_navigation(moved, "history is empty");
            }
            ShellCommand::Select(path) => {
                let moved = self.panel.select(path).await?;
                self.after_navigation(moved, "path does not resolve");
            }
            ShellCommand::Hover(path) => report(self.panel.hover(path).await?),
            ShellCommand::Unhover => report(self.panel.unhover().await?),
            ShellCommand::Click(path) => self.click(&path).await?,
            ShellCommand::Strip => self.strip().await?,
            ShellCommand::Raw(command) => {
                let ack = self
                    .relay
                    .send(command)
                    .resolve(self.config.panel.ack_timeout())
                    .await?;
                report(ack);
                if self.panel.pump() > 0 {
                    self.show();
                }
            }
            ShellCommand::PageHide => {
                let listeners = self.page.dispatch(PageEvent::PageHide);
                println!("pagehide delivered to {} listener(s)", listeners);
            }
            ShellCommand::History => self.history(),
            ShellCommand::State => self.state().await?,
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => {}
        }
        Ok(())
    }

    fn show(&self) {
        match self.panel.current() {
            Some(element) => print!("{}", render_tree(element, 0)),
            None => println!("(nothing selected)"),
        }
    }

    fn tree(&self) {
        match self.panel.current() {
            Some(element) => print!("{}", render_tree(element, self.config.panel.tree_depth)),
            None => println!("(nothing selected)"),
        }
    }

    fn after_navigation(&self, moved: bool, refusal: &str) {
        if moved {
            self.show();
        } else {
            println!("{}", refusal);
        }
    }

    async fn click(&mut self, path: &ElementPath) -> anyhow::Result<()> {
        let node = addressing::resolve(&self.page.document().lock(), path)
            .ok_or_else(|| InspectError::PathResolution(path.clone()))?;
        let listening = self.agent.state().await?.listening;
        let click = self.page.click(node);
        if !listening {
            println!("click went to the page (inspection inactive)");
            return Ok(());
        }
        self.panel.await_update().await?;
        if click.is_default_prevented() {
            println!("(page default action suppressed)");
        }
        self.show();
        Ok(())
    }

    async fn strip(&self) -> anyhow::Result<()> {
        let state = self.agent.state().await?;
        let Some(path) = state.highlighted else {
            println!("nothing is highlighted");
            return Ok(());
        };
        let mut document = self.page.document().lock();
        let node = addressing::resolve(&document, &path)
            .ok_or_else(|| InspectError::PathResolution(path.clone()))?;
        document.remove_attribute(node, "style");
        println!("inline style removed from {}", path);
        Ok(())
    }

    fn history(&self) {
        let history = self.panel.history();
        if !history.can_go_back() {
            println!("(no history)");
        }
        for (i, element) in history.entries().iter().enumerate() {
            println!("{:>3}  {}  {}", i, element.label(), element.path);
        }
        if let Some(current) = history.current() {
            println!("  *  {}  {}", current.label(), current.path);
        }
    }

    async fn state(&self) -> anyhow::Result<()> {
        let agent = self.agent.state().await?;
        let relay = self.relay.status().await?;
        println!("Page agent:");
        println!("{}", serde_json::to_string_pretty(&agent)?);
        println!("Relay:");
        println!("  current:     {:?}", relay.current);
        if let Some(at) = relay.activated_at {
            println!("  activated:   {}", at.to_rfc3339());
        }
        println!("  tabs:        {}", relay.tabs.len());
        println!("  open links:  {}", relay.open_links);
        Ok(())
    }
}

fn report(ack: Ack) {
    match ack.error {
        Some(error) => println!("refused: {}", error),
        None => println!("ok"),
    }
}

fn prompt() -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    write!(stdout, "> ")?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ShellCommand {
        ShellCommand::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_navigation() {
        assert_eq!(parse("child 2"), ShellCommand::Child(2));
        assert_eq!(parse("  up "), ShellCommand::Parent);
        assert_eq!(parse("b"), ShellCommand::Back);
        assert_eq!(
            parse("select /1/0"),
            ShellCommand::Select(ElementPath::from_indices(vec![1, 0]))
        );
        assert_eq!(parse("hover /"), ShellCommand::Hover(ElementPath::root()));
        assert_eq!(parse("quit"), ShellCommand::Quit);
    }

    #[test]
    fn test_parse_raw_command() {
        assert_eq!(
            parse(r#"raw {"type":"select","path":[1,0]}"#),
            ShellCommand::Raw(Command::Select {
                path: ElementPath::from_indices(vec![1, 0])
            })
        );
        assert!(ShellCommand::parse(r#"raw {"type":"preview","path":[-1]}"#).is_err());
        assert!(ShellCommand::parse("raw").is_err());
        assert!(ShellCommand::parse("rawr").is_err());
    }

    #[test]
    fn test_parse_blank_line() {
        assert!(ShellCommand::parse("   ").unwrap().is_none());
    }

    #[test]
    fn test_parse_errors() {
        assert!(ShellCommand::parse("child").is_err());
        assert!(ShellCommand::parse("child -1").is_err());
        assert!(ShellCommand::parse("select").is_err());
        assert!(ShellCommand::parse("select /a/b").is_err());
        assert!(ShellCommand::parse("show now").is_err());

        let err = ShellCommand::parse("dance").unwrap_err();
        assert_eq!(err.to_string(), "unknown command 'dance' (try 'help')");
    }
}
