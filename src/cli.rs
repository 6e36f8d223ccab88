use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::gratitude::GratitudeAction;
use crate::commands::milestone::MilestoneAction;
use crate::commands::review::ReviewAction;
use crate::commands::saved::{SavedAction, SavedOptions};
use crate::commands::sobriety::SobrietyAction;
use crate::commands::{self, CommandReport};
use crate::journal::date_key::DateKey;
use crate::journal::practice::Domain;

/// Exit status when a command ran but reported issues.
const EXIT_ISSUES: i32 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "journal",
    version,
    about = "Local-first recovery journal: daily gratitude, evening review, sobriety milestones"
)]
pub struct Cli {
    /// Print the command report as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Today's gratitude list.
    #[command(subcommand)]
    Gratitude(GratitudeCommand),
    /// Today's evening review.
    #[command(subcommand)]
    Review(ReviewCommand),
    /// Saved entries of one practice.
    Saved(SavedArgs),
    /// This week's completions and streaks.
    Progress(DomainArgs),
    /// Totals over a trailing window of days.
    Insights(InsightsArgs),
    /// Sobriety anniversaries.
    #[command(subcommand)]
    Milestone(MilestoneCommand),
    /// Sobriety date and time-sober range.
    #[command(subcommand)]
    Sobriety(SobrietyCommand),
    /// Repair the ledgers from the saved archives.
    Reconcile,
    /// Paths, lock holder and store counts.
    Status,
}

#[derive(Debug, Subcommand)]
enum GratitudeCommand {
    Today,
    Add {
        #[arg(required = true)]
        items: Vec<String>,
    },
    Set {
        items: Vec<String>,
    },
    /// Remove one item by its 1-based position.
    DeleteItem {
        index: usize,
    },
    /// Mark today complete, optionally appending items first.
    Complete {
        items: Vec<String>,
    },
    Reopen,
}

#[derive(Debug, Subcommand)]
enum ReviewCommand {
    Today,
    Complete {
        /// Questions answered yes, e.g. `--yes kindness,prayer_meditation`.
        #[arg(long, value_delimiter = ',')]
        yes: Vec<String>,
        /// Detailed review JSON saved alongside the answers.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    Reopen,
}

#[derive(Debug, Args)]
struct DomainArgs {
    /// `gratitude` or `evening-review`.
    domain: Domain,
}

#[derive(Debug, Args)]
struct SavedArgs {
    domain: Domain,
    #[command(subcommand)]
    command: SavedCommand,
}

#[derive(Debug, Subcommand)]
enum SavedCommand {
    List,
    Show {
        date: DateKey,
    },
    Delete {
        date: DateKey,
    },
    Share {
        date: DateKey,
    },
    Save {
        /// Defaults to today.
        #[arg(long)]
        date: Option<DateKey>,
        #[arg(long = "item")]
        items: Vec<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct InsightsArgs {
    domain: Domain,
    #[arg(long, default_value_t = commands::insights::DEFAULT_WINDOW_DAYS)]
    days: u32,
}

#[derive(Debug, Subcommand)]
enum MilestoneCommand {
    Check {
        /// Overrides the stored sobriety date.
        #[arg(long)]
        start: Option<DateKey>,
    },
    Ack {
        #[arg(long)]
        start: Option<DateKey>,
    },
}

#[derive(Debug, Subcommand)]
enum SobrietyCommand {
    Show,
    Set { date: DateKey },
    Skip,
}

fn dispatch(command: Command) -> Result<CommandReport> {
    match command {
        Command::Gratitude(cmd) => {
            let action = match cmd {
                GratitudeCommand::Today => GratitudeAction::Today,
                GratitudeCommand::Add { items } => GratitudeAction::Add { items },
                GratitudeCommand::Set { items } => GratitudeAction::Set { items },
                GratitudeCommand::DeleteItem { index } => GratitudeAction::DeleteItem { index },
                GratitudeCommand::Complete { items } => GratitudeAction::Complete { items },
                GratitudeCommand::Reopen => GratitudeAction::Reopen,
            };
            commands::gratitude::run(&action)
        }
        Command::Review(cmd) => {
            let action = match cmd {
                ReviewCommand::Today => ReviewAction::Today,
                ReviewCommand::Complete { yes, file } => ReviewAction::Complete { yes, file },
                ReviewCommand::Reopen => ReviewAction::Reopen,
            };
            commands::review::run(&action)
        }
        Command::Saved(args) => {
            let action = match args.command {
                SavedCommand::List => SavedAction::List,
                SavedCommand::Show { date } => SavedAction::Show { date },
                SavedCommand::Delete { date } => SavedAction::Delete { date },
                SavedCommand::Share { date } => SavedAction::Share { date },
                SavedCommand::Save { date, items, file } => SavedAction::Save { date, items, file },
            };
            commands::saved::run(&SavedOptions {
                domain: args.domain,
                action,
            })
        }
        Command::Progress(args) => commands::progress::run(args.domain),
        Command::Insights(args) => commands::insights::run(args.domain, args.days),
        Command::Milestone(cmd) => {
            let action = match cmd {
                MilestoneCommand::Check { start } => MilestoneAction::Check { start },
                MilestoneCommand::Ack { start } => MilestoneAction::Ack { start },
            };
            commands::milestone::run(&action)
        }
        Command::Sobriety(cmd) => {
            let action = match cmd {
                SobrietyCommand::Show => SobrietyAction::Show,
                SobrietyCommand::Set { date } => SobrietyAction::Set { date },
                SobrietyCommand::Skip => SobrietyAction::Skip,
            };
            commands::sobriety::run(&action)
        }
        Command::Reconcile => commands::reconcile::run(),
        Command::Status => commands::status::run(),
    }
}

fn render_text(report: &CommandReport) -> String {
    let mut out = format!("{}: {}\n", report.command, if report.ok { "ok" } else { "issues" });
    for line in &report.details {
        out.push_str(&format!("  {line}\n"));
    }
    for line in &report.issues {
        out.push_str(&format!("  ! {line}\n"));
    }
    out
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let report = dispatch(cli.command)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }

    if !report.ok {
        std::process::exit(EXIT_ISSUES);
    }
    Ok(())
}
