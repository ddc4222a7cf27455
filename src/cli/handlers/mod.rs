use std::io::{BufRead, Write};
use std::time::Duration;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::fs::{Filesystem, OsFilesystem};
use crate::io::recent::{RecentFiles, default_recent_path};
use crate::io::watcher::NotifyWatcher;
use crate::model::config::EditorConfig;
use crate::model::identity::FileIdentity;
use crate::model::intent::{NavigationIntent, Viewport};
use crate::ops::policy::{CloseChoice, Confirmation, UserPrompt};
use crate::ops::resolve::resolve;
use crate::parse::wiki_link::{find_links, link_at};
use crate::session::navigator::{NavOutcome, Navigator};
use crate::session::window::{DisplaySurface, WindowId};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// How often `watch` drains the watcher.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let yes = cli.yes;

    match cli.command {
        Commands::Resolve(args) => cmd_resolve(args, json),
        Commands::Shift(args) => {
            cmd_navigate(&args.file, NavigationIntent::ShiftByDays(args.n), json, yes)
        }
        Commands::Seq(args) => {
            cmd_navigate(&args.file, NavigationIntent::ShiftBySequence(args.n), json, yes)
        }
        Commands::Up(args) => cmd_navigate(&args.file, NavigationIntent::LevelUp, json, yes),
        Commands::Down(args) => cmd_navigate(&args.file, NavigationIntent::LevelDown, json, yes),
        Commands::Link(args) => cmd_link(args, json, yes),
        Commands::Insert(args) => cmd_navigate(
            &args.file,
            NavigationIntent::InsertSequenceSlot(args.n),
            json,
            yes,
        ),
        Commands::Remove(args) => cmd_remove(args, json, yes),
        Commands::Links(args) => cmd_links(args, json),
        Commands::Recent(args) => cmd_recent(args, json),
        Commands::Watch(args) => cmd_watch(args, json),
    }
}

// ---------------------------------------------------------------------------
// Host collaborators
// ---------------------------------------------------------------------------

/// Asks on stderr, reads the answer from stdin. Anything but y/yes declines.
pub struct TerminalPrompt {
    assume_yes: bool,
}

impl TerminalPrompt {
    pub fn new(assume_yes: bool) -> Self {
        TerminalPrompt { assume_yes }
    }

    fn ask(&self, question: &str) -> Confirmation {
        if self.assume_yes {
            return Confirmation::Accepted;
        }
        parse_answer(&read_answer(&format!("{} [y/N] ", question)))
    }
}

fn read_answer(question: &str) -> String {
    eprint!("{}", question);
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line).is_err() {
        line.clear();
    }
    line
}

fn parse_answer(line: &str) -> Confirmation {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Confirmation::Accepted,
        _ => Confirmation::Declined,
    }
}

fn parse_close_answer(line: &str) -> CloseChoice {
    match line.trim().to_lowercase().as_str() {
        "s" | "save" | "y" | "yes" => CloseChoice::Save,
        "d" | "discard" | "n" | "no" => CloseChoice::Discard,
        _ => CloseChoice::Cancel,
    }
}

impl UserPrompt for TerminalPrompt {
    fn confirm_create(&mut self, target_name: &str) -> Confirmation {
        self.ask(&format!("Create {}?", target_name))
    }

    fn confirm_delete(&mut self, target_name: &str) -> Confirmation {
        self.ask(&format!("Delete {}?", target_name))
    }

    fn confirm_close(&mut self, target_name: &str) -> CloseChoice {
        if self.assume_yes {
            return CloseChoice::Save;
        }
        parse_close_answer(&read_answer(&format!(
            "Save changes to {}? [s]ave/[d]iscard/[C]ancel ",
            target_name
        )))
    }
}

/// Surface for a terminal: content is not displayed, external changes are
/// reported one per line.
pub struct ConsoleSurface {
    json: bool,
}

impl DisplaySurface for ConsoleSurface {
    fn load_content(&mut self, path: &FileIdentity, text: &str) {
        tracing::debug!(path = %path, bytes = text.len(), "content loaded");
    }

    fn notify_external_change(&mut self, path: &FileIdentity, new_text: &str, local_dirty: bool) {
        if self.json {
            let change = ChangeJson {
                path: path.to_string(),
                dirty: local_dirty,
                bytes: new_text.len(),
            };
            if let Ok(line) = serde_json::to_string(&change) {
                println!("{}", line);
            }
        } else {
            println!("changed: {}", path);
        }
        let _ = std::io::stdout().flush();
    }

    fn restore_cursor(&mut self, _offset: usize) {}

    fn restore_scroll(&mut self, _offset: usize) {}

    fn current_text(&self) -> Option<String> {
        None
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn recent_files(config: &EditorConfig) -> RecentFiles {
    let path = config
        .recent
        .path
        .clone()
        .unwrap_or_else(default_recent_path);
    RecentFiles::new(path, config.recent.limit)
}

fn host(
    config: &EditorConfig,
    json: bool,
) -> Result<Navigator<OsFilesystem, NotifyWatcher>, Box<dyn std::error::Error>> {
    let watcher = NotifyWatcher::new(Duration::from_millis(config.watch.debounce_ms))?;
    let factory = Box::new(move || Box::new(ConsoleSurface { json }) as Box<dyn DisplaySurface>);
    Ok(Navigator::new(OsFilesystem, watcher, factory).with_recent(recent_files(config)))
}

/// Open `file` in a fresh window of `nav`.
fn open_start(
    nav: &mut Navigator<OsFilesystem, NotifyWatcher>,
    file: &str,
) -> Result<WindowId, Box<dyn std::error::Error>> {
    let path = FileIdentity::from_cwd(file)?;
    match nav.open_window(&path)? {
        NavOutcome::Loaded { window, .. } | NavOutcome::Focused(window) => Ok(window),
        other => Err(format!("could not open {}: {}", path, format_outcome(&other)).into()),
    }
}

fn print_outcome(outcome: &NavOutcome, json: bool) -> CmdResult {
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome_to_json(outcome))?);
    } else {
        println!("{}", format_outcome(outcome));
    }
    Ok(())
}

fn parse_step(arg: Option<&str>) -> Result<i64, Box<dyn std::error::Error>> {
    let raw = arg.ok_or("missing step count")?;
    raw.parse::<i64>()
        .map_err(|_| format!("invalid step count '{}'", raw).into())
}

fn intent_from(kind: IntentKind, arg: Option<&str>) -> Result<NavigationIntent, Box<dyn std::error::Error>> {
    Ok(match kind {
        IntentKind::Shift => NavigationIntent::ShiftByDays(parse_step(arg)?),
        IntentKind::Seq => NavigationIntent::ShiftBySequence(parse_step(arg)?),
        IntentKind::Up => NavigationIntent::LevelUp,
        IntentKind::Down => NavigationIntent::LevelDown,
        IntentKind::Link => NavigationIntent::FollowLink(arg.ok_or("missing link text")?.to_string()),
        IntentKind::Insert => NavigationIntent::InsertSequenceSlot(parse_step(arg)?),
    })
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_resolve(args: ResolveArgs, json: bool) -> CmdResult {
    let current = FileIdentity::from_cwd(&args.file)?;
    let intent = intent_from(args.intent, args.arg.as_deref())?;
    let target = resolve(&OsFilesystem, &current, &intent);

    if json {
        println!("{}", serde_json::to_string_pretty(&target)?);
    } else {
        match &target {
            Some(t) => println!("{}", format_target(t)),
            None => println!("no target"),
        }
    }
    Ok(())
}

fn cmd_navigate(file: &str, intent: NavigationIntent, json: bool, yes: bool) -> CmdResult {
    let config = config_io::read_config();
    let mut nav = host(&config, json)?;
    let window = open_start(&mut nav, file)?;
    let mut prompt = TerminalPrompt::new(yes);
    let outcome = nav.navigate_with(window, &intent, Viewport::default(), &mut prompt)?;
    print_outcome(&outcome, json)
}

fn cmd_link(args: LinkArgs, json: bool, yes: bool) -> CmdResult {
    let text = match (args.text, args.at) {
        (Some(text), _) => text,
        (None, Some(offset)) => {
            let path = FileIdentity::from_cwd(&args.file)?;
            let body = OsFilesystem.read_text(path.path())?;
            link_at(&body, offset)
                .map(|link| link.target)
                .ok_or_else(|| format!("no link at offset {} in {}", offset, args.file))?
        }
        (None, None) => return Err("link text or --at is required".into()),
    };
    cmd_navigate(&args.file, NavigationIntent::FollowLink(text), json, yes)
}

fn cmd_remove(args: FileArg, json: bool, yes: bool) -> CmdResult {
    let config = config_io::read_config();
    let mut nav = host(&config, json)?;
    let window = open_start(&mut nav, &args.file)?;
    let mut prompt = TerminalPrompt::new(yes);
    let outcome = nav.remove_sequence_note(window, &mut prompt)?;
    print_outcome(&outcome, json)
}

fn cmd_links(args: FileArg, json: bool) -> CmdResult {
    let path = FileIdentity::from_cwd(&args.file)?;
    let text = OsFilesystem.read_text(path.path())?;
    let links = find_links(&text);

    if json {
        let items: Vec<LinkJson> = links.iter().map(link_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for link in &links {
            println!("{}", link.target);
        }
    }
    Ok(())
}

fn cmd_recent(args: RecentArgs, json: bool) -> CmdResult {
    let config = config_io::read_config();
    let recent = recent_files(&config);

    if args.clear {
        recent.clear()?;
        if !json {
            println!("cleared {}", recent.path().display());
        }
        return Ok(());
    }

    let entries = recent.load();
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!("{}", format_recent(entry));
        }
    }
    Ok(())
}

fn cmd_watch(args: FileArg, json: bool) -> CmdResult {
    let config = config_io::read_config();
    let mut nav = host(&config, json)?;
    let window = open_start(&mut nav, &args.file)?;
    tracing::info!(window = window.0, file = %args.file, "watching");
    if !json {
        eprintln!("watching {} (Ctrl-C to stop)", args.file);
    }
    loop {
        std::thread::sleep(POLL_INTERVAL);
        nav.process_changes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers() {
        assert_eq!(parse_answer("y\n"), Confirmation::Accepted);
        assert_eq!(parse_answer(" YES "), Confirmation::Accepted);
        assert_eq!(parse_answer("\n"), Confirmation::Declined);
        assert_eq!(parse_answer("nope"), Confirmation::Declined);
    }

    #[test]
    fn close_answers() {
        assert_eq!(parse_close_answer("s\n"), CloseChoice::Save);
        assert_eq!(parse_close_answer("Discard"), CloseChoice::Discard);
        assert_eq!(parse_close_answer("n"), CloseChoice::Discard);
        assert_eq!(parse_close_answer("\n"), CloseChoice::Cancel);
        assert_eq!(parse_close_answer("later"), CloseChoice::Cancel);
    }

    #[test]
    fn assume_yes_never_reads_stdin() {
        let mut prompt = TerminalPrompt::new(true);
        assert_eq!(prompt.confirm_create("card02.md"), Confirmation::Accepted);
        assert_eq!(prompt.confirm_delete("card02.md"), Confirmation::Accepted);
        assert_eq!(prompt.confirm_close("card02.md"), CloseChoice::Save);
    }

    #[test]
    fn intents_from_arguments() {
        assert_eq!(
            intent_from(IntentKind::Shift, Some("-3")).unwrap(),
            NavigationIntent::ShiftByDays(-3)
        );
        assert_eq!(
            intent_from(IntentKind::Link, Some("notes/x")).unwrap(),
            NavigationIntent::FollowLink("notes/x".into())
        );
        assert_eq!(intent_from(IntentKind::Up, None).unwrap(), NavigationIntent::LevelUp);
        assert!(intent_from(IntentKind::Seq, None).is_err());
        assert!(intent_from(IntentKind::Insert, Some("two")).is_err());
    }
}
