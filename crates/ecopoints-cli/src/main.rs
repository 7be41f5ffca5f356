#![forbid(unsafe_code)]

mod cmd;
mod identity;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use ecopoints_core::ErrorCode;
use ecopoints_core::config::{self, EffectiveConfig};
use output::{CliError, OutputMode, render_error};
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "eco",
    author,
    version,
    about = "ecopoints: rewards ledger for waste reporting and collection",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging (ignored when `ECO_LOG` is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Act as this user (identity key, usually an email).
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn user_flag(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize an ecopoints ledger",
        long_about = "Create .ecopoints/ in the current directory with a migrated ledger database and a default config.",
        after_help = "EXAMPLES:\n    # Initialize a ledger in the current directory\n    eco init\n\n    # Rewrite the default config\n    eco init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Register or sign in a user",
        long_about = "Create the user on first sign-in; signing in again returns the existing record.",
        after_help = "EXAMPLES:\n    eco signin --email ada@example.org --name Ada"
    )]
    Signin(cmd::signin::SigninArgs),

    #[command(
        next_help_heading = "Points",
        about = "Credit earned points",
        long_about = "Append an earned entry for a waste report or a collection.",
        after_help = "EXAMPLES:\n    # Points for a verified report\n    eco credit --kind report --amount 50 --description \"Reported dumping on Elm St\"\n\n    # Points for a collection; the quantity feeds `eco impact`\n    eco credit --kind collect --amount 30 --description \"Collected 6 kg of plastic\""
    )]
    Credit(cmd::credit::CreditArgs),

    #[command(
        next_help_heading = "Points",
        about = "Show the current balance",
        long_about = "Recompute the balance from the ledger. The `entries` count can be passed to `eco redeem --expect-entries`.",
        after_help = "EXAMPLES:\n    eco balance\n\n    eco --user ada@example.org balance --json"
    )]
    Balance(cmd::balance::BalanceArgs),

    #[command(
        next_help_heading = "Points",
        about = "Show ledger history",
        after_help = "EXAMPLES:\n    eco history -n 10"
    )]
    History(cmd::history::HistoryArgs),

    #[command(
        next_help_heading = "Rewards",
        about = "Browse and manage the reward catalog",
        after_help = "EXAMPLES:\n    eco rewards list\n\n    eco rewards add --name \"Tote bag\" --cost 120 --collection-info \"Town hall\"\n\n    eco rewards disable 3"
    )]
    Rewards {
        #[command(subcommand)]
        command: cmd::rewards::RewardsCommand,
    },

    #[command(
        next_help_heading = "Rewards",
        about = "Redeem a reward or the whole balance",
        long_about = "Spend points atomically. The balance is checked and the debit appended under one write lock.",
        after_help = "EXAMPLES:\n    # Redeem reward #3\n    eco redeem 3\n\n    # Redeem everything, but only if nothing changed since `eco balance`\n    eco redeem --all --expect-entries 4"
    )]
    Redeem(cmd::redeem::RedeemArgs),

    #[command(
        next_help_heading = "Rewards",
        about = "List or acknowledge notifications",
        after_help = "EXAMPLES:\n    eco notifications\n\n    eco notifications --all\n\n    eco notifications read 12"
    )]
    Notifications(cmd::notifications::NotificationsArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Summarize community impact",
        after_help = "EXAMPLES:\n    eco impact\n\n    eco impact --window 500 --json"
    )]
    Impact(cmd::impact::ImpactArgs),

    #[command(
        next_help_heading = "Reports",
        about = "Verify ledger integrity",
        long_about = "Recompute every user's entry hash chain and check for balances in deficit."
    )]
    Verify(cmd::verify::VerifyArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    eco completions bash > ~/.local/share/bash-completion/completions/eco"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("ECO_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "ecopoints=debug,eco=debug,info"
        } else {
            "ecopoints=info,eco=info,warn"
        })
    });

    let format = env::var("ECO_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_config(project_root: &std::path::Path, cli: &Cli) -> anyhow::Result<EffectiveConfig> {
    match config::resolve_config(project_root) {
        Ok(config) => Ok(config),
        Err(err) => {
            let output = output::resolve_output_mode(cli.format, cli.json, None);
            render_error(
                output,
                &CliError::from_code(ErrorCode::ConfigParseError, format!("{err:#}")),
            )?;
            Err(err)
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let project_root = env::current_dir()?;
    let config = load_config(&project_root, &cli)?;
    let output = output::resolve_output_mode(cli.format, cli.json, config.user.output.as_deref());
    debug!(?output, root = %project_root.display(), "resolved session");

    let session = cmd::Session {
        project_root: &project_root,
        config: &config,
        output,
        user_flag: cli.user_flag(),
    };

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, &session),
        Commands::Signin(args) => cmd::signin::run_signin(args, &session),
        Commands::Credit(args) => cmd::credit::run_credit(args, &session),
        Commands::Balance(args) => cmd::balance::run_balance(args, &session),
        Commands::History(args) => cmd::history::run_history(args, &session),
        Commands::Rewards { command } => cmd::rewards::run_rewards(command, &session),
        Commands::Redeem(args) => cmd::redeem::run_redeem(args, &session),
        Commands::Notifications(args) => cmd::notifications::run_notifications(args, &session),
        Commands::Impact(args) => cmd::impact::run_impact(args, &session),
        Commands::Verify(args) => cmd::verify::run_verify(args, &session),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command, &mut std::io::stdout())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmd::notifications::NotificationsCommand;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn json_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["eco", "balance", "--json"]);
        assert!(cli.json);
        assert!(cli.format.is_none());
    }

    #[test]
    fn format_flag_parses_before_subcommand() {
        let cli = Cli::parse_from(["eco", "--format", "text", "history"]);
        assert_eq!(cli.format, Some(OutputMode::Text));
    }

    #[test]
    fn user_flag_parsed() {
        let cli = Cli::parse_from(["eco", "--user", "ada@example.org", "balance"]);
        assert_eq!(cli.user_flag(), Some("ada@example.org"));

        let cli = Cli::parse_from(["eco", "redeem", "2", "--user", "bob@example.org"]);
        assert_eq!(cli.user_flag(), Some("bob@example.org"));
    }

    #[test]
    fn user_flag_none_by_default() {
        let cli = Cli::parse_from(["eco", "impact"]);
        assert!(cli.user_flag().is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn notifications_read_subcommand_parses() {
        let cli = Cli::parse_from(["eco", "notifications", "read", "12"]);
        let Commands::Notifications(args) = cli.command else {
            panic!("expected notifications");
        };
        assert!(matches!(
            args.command,
            Some(NotificationsCommand::Read { id: 12 })
        ));
    }

    #[test]
    fn notifications_all_flag_parses() {
        let cli = Cli::parse_from(["eco", "notifications", "--all"]);
        let Commands::Notifications(args) = cli.command else {
            panic!("expected notifications");
        };
        assert!(args.all);
        assert!(args.command.is_none());
    }

    #[test]
    fn completions_subcommand_parses() {
        let cli = Cli::parse_from(["eco", "completions", "bash"]);
        assert!(matches!(
            cli.command,
            Commands::Completions(cmd::completions::CompletionsArgs {
                shell: clap_complete::Shell::Bash,
            })
        ));
    }

    #[test]
    fn completion_script_names_the_binary() {
        let mut command = Cli::command();
        let mut buf = Vec::new();
        cmd::completions::run_completions(clap_complete::Shell::Bash, &mut command, &mut buf)
            .expect("generate completions");
        let script = String::from_utf8(buf).expect("utf8 script");
        assert!(script.contains("_eco()"));
    }

    #[test]
    fn all_subcommands_listed() {
        let subcommands = [
            vec!["eco", "init"],
            vec!["eco", "signin", "--email", "a@b.c"],
            vec!["eco", "credit", "--kind", "report", "--amount", "5"],
            vec!["eco", "balance"],
            vec!["eco", "history"],
            vec!["eco", "rewards", "list"],
            vec!["eco", "rewards", "add", "--name", "Mug", "--cost", "30"],
            vec!["eco", "rewards", "enable", "1"],
            vec!["eco", "rewards", "disable", "1"],
            vec!["eco", "redeem", "1"],
            vec!["eco", "redeem", "--all"],
            vec!["eco", "notifications"],
            vec!["eco", "impact"],
            vec!["eco", "verify"],
            vec!["eco", "completions", "zsh"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "Failed to parse {args:?}: {:?}", result.err());
        }
    }
}
