mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use orgstars::config::BrowserConfig;
use orgstars::credentials::FileCredentialStore;
use orgstars::logging::{self, LogLevel};

#[derive(Parser)]
#[command(name = "orgstars")]
#[command(about = "Browse a GitHub organisation's repositories and watch their stars move", long_about = None)]
#[command(version)]
struct Cli {
    /// Log verbosity (RUST_LOG overrides)
    #[arg(long, value_enum, global = true, default_value_t = LogLevel::Warn, env = "ORGSTARS_LOG")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List an organisation's repositories and stream live star counts
    #[command(short_flag = 'b', visible_alias = "ls")]
    Browse {
        /// Organisation or user (defaults to the configured organisation)
        organisation: Option<String>,
        /// Stop after this many live star updates
        #[arg(long, short = 'n')]
        updates: Option<usize>,
        /// Read searches and commands from stdin while browsing
        #[arg(long, short = 'i')]
        interactive: bool,
    },
    /// Show one repository in detail
    #[command(short_flag = 's')]
    Show {
        /// Full repository name (e.g., swiftlang/swift)
        full_name: String,
    },
    /// Manage the GitHub personal access token
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Store a token (raises the rate limit from 60 to 5000 requests per hour)
    Set { token: String },
    /// Forget the stored token
    Clear,
    /// Say whether a token is stored
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level)?;

    let config = BrowserConfig::load()?;
    let store = FileCredentialStore::default_location()?;

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
        Some(Commands::Browse {
            organisation,
            updates,
            interactive,
        }) => {
            let options = commands::BrowseOptions {
                organisation,
                updates,
                interactive,
            };
            commands::browse(&config, &store, options).await
        }
        Some(Commands::Show { full_name }) => commands::show_repository(&config, &store, &full_name).await,
        Some(Commands::Token { action }) => match action {
            TokenAction::Set { token } => commands::set_token(&store, Some(token)),
            TokenAction::Clear => commands::set_token(&store, None),
            TokenAction::Status => commands::token_status(&store),
        },
        Some(Commands::Completions { shell }) => {
            commands::generate_completions(shell);
            Ok(())
        }
    }
}
