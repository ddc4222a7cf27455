use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "bext", about = concat!("bext v", env!("CARGO_PKG_VERSION"), " - navigate a folder of markdown notes"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Answer yes to every create/delete question
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show where a navigation would go, without touching anything
    Resolve(ResolveArgs),
    /// Move by days along the date chain (falls back to the sequence chain)
    Shift(StepArgs),
    /// Move along the sequence chain
    Seq(StepArgs),
    /// Go to the month note or nearest index.md
    Up(FileArg),
    /// Go to the _<name> child note
    Down(FileArg),
    /// Follow an internal link
    Link(LinkArgs),
    /// Open a new sequence slot at current + n, renumbering later notes
    Insert(StepArgs),
    /// Delete a sequence note and close the gap
    Remove(FileArg),
    /// List the [[links]] in a note
    Links(FileArg),
    /// Show or clear the recently opened notes
    Recent(RecentArgs),
    /// Print external changes to a note until interrupted
    Watch(FileArg),
}

// ---------------------------------------------------------------------------
// Args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct FileArg {
    /// Note to start from
    pub file: String,
}

#[derive(Args)]
pub struct StepArgs {
    /// Note to start from
    pub file: String,
    /// Step count (negative goes backwards)
    #[arg(allow_hyphen_values = true)]
    pub n: i64,
}

#[derive(Args)]
pub struct LinkArgs {
    /// Note containing the link
    pub file: String,
    /// Link text, as written between [[ and ]]
    #[arg(required_unless_present = "at", conflicts_with = "at")]
    pub text: Option<String>,
    /// Follow the link found at this byte offset of the note instead
    #[arg(long)]
    pub at: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum IntentKind {
    Shift,
    Seq,
    Up,
    Down,
    Link,
    Insert,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Note to start from
    pub file: String,
    /// Kind of navigation
    #[arg(value_enum)]
    pub intent: IntentKind,
    /// Step count, or link text for `link`
    #[arg(allow_hyphen_values = true)]
    pub arg: Option<String>,
}

#[derive(Args)]
pub struct RecentArgs {
    /// Forget every entry
    #[arg(long)]
    pub clear: bool,
}
