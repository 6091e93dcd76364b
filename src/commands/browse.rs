use orgstars::config::BrowserConfig;
use orgstars::credentials::CredentialStore;
use orgstars::github::GitHubClient;
use orgstars::live::MockLiveServer;
use orgstars::{BrowserChange, BrowserController, BrowserState, LoadOutcome, Query, Rejection};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::TryRecvError;

pub struct BrowseOptions {
    pub organisation: Option<String>,
    pub updates: Option<usize>,
    pub interactive: bool,
}

pub fn github_client(config: &BrowserConfig, store: &dyn CredentialStore) -> anyhow::Result<GitHubClient> {
    let token = store.token()?;
    Ok(GitHubClient::new(&config.api_base_url, token)?)
}

enum Input {
    Search(String),
    Reset,
    Show(usize),
    Quit,
    Help,
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    match line {
        ":q" | ":quit" => Input::Quit,
        ":r" | ":reset" => Input::Reset,
        ":h" | ":help" => Input::Help,
        _ => {
            if let Some(rest) = line.strip_prefix(":show ") {
                if let Ok(n) = rest.trim().parse::<usize>() {
                    return Input::Show(n);
                }
            }
            Input::Search(line.to_string())
        }
    }
}

pub async fn browse(
    config: &BrowserConfig,
    store: &dyn CredentialStore,
    options: BrowseOptions,
) -> anyhow::Result<()> {
    let client = github_client(config, store)?;
    if !client.has_token() {
        eprintln!("No token stored; GitHub allows 60 requests per hour. See `orgstars token set`.");
    }
    let live = MockLiveServer::new(config.live_tick(), config.live_step);
    let mut controller = BrowserController::new(Arc::new(client), Arc::new(live), config.default_query());
    let mut changes = controller.subscribe_changes();

    let outcome = match options.organisation.as_deref().and_then(Query::parse) {
        Some(query) => controller.load(query),
        None => controller.reset(),
    };
    report_outcome(outcome);

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = options.interactive;
    let mut seen_updates = 0usize;

    if options.interactive {
        print_help();
    }

    loop {
        tokio::select! {
            processed = controller.process_next() => {
                if !processed {
                    break;
                }
            }
            line = stdin.next_line(), if stdin_open => {
                match line? {
                    None => stdin_open = false,
                    Some(line) => match parse_input(&line) {
                        Input::Quit => break,
                        Input::Help => print_help(),
                        Input::Reset => report_outcome(controller.reset()),
                        Input::Search(text) => report_outcome(controller.search(&text)),
                        Input::Show(n) => show_at(&controller, n).await,
                    },
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }

        loop {
            match changes.try_recv() {
                Ok(BrowserChange::StateChanged { .. }) => print_state(&controller),
                Ok(BrowserChange::StarsChanged { repository_id, stars }) => {
                    print_star_update(&controller, repository_id, stars);
                    seen_updates += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "change notifications lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        if options.updates.is_some_and(|limit| seen_updates >= limit) {
            break;
        }
        // Nothing more will ever arrive unless the user types.
        if !stdin_open && nothing_left_to_watch(&controller) {
            break;
        }
    }

    Ok(())
}

fn nothing_left_to_watch(controller: &BrowserController) -> bool {
    if !controller.is_settled() {
        return false;
    }
    match controller.state() {
        BrowserState::Failed(..) => true,
        BrowserState::Loaded(..) => controller.active_subscriptions().is_empty(),
        _ => false,
    }
}

fn report_outcome(outcome: LoadOutcome) {
    match outcome {
        LoadOutcome::Started { .. } => {}
        LoadOutcome::Rejected(Rejection::Busy) => println!("Still loading, try again in a moment."),
        LoadOutcome::Rejected(Rejection::EmptyQuery) => {}
    }
}

fn print_help() {
    println!("Type an organisation to search, `:show N` for details, `:reset` for the default, `:quit` to leave.");
}

fn print_state(controller: &BrowserController) {
    match controller.state() {
        BrowserState::Idle => {}
        BrowserState::Loading(query) => println!("Loading {}...", query),
        BrowserState::Loaded(query, repos) => {
            if repos.is_empty() {
                println!("{} has no public repositories.", query);
                return;
            }
            println!("\n{} repositories in {}:\n", repos.len(), query);
            for (i, repo) in repos.iter().enumerate() {
                println!("  {:>3}. {}", i + 1, repo.full_name);
                println!("       ⭐ {}", controller.effective_star_count(repo));
                if let Some(desc) = &repo.description {
                    println!("       {}", desc);
                }
            }
            println!();
        }
        BrowserState::Failed(_, message) => {
            eprintln!("{}", message);
            eprintln!("Type `:reset` (or run `orgstars browse`) to go back to {}.", controller.default_organisation());
        }
    }
}

fn print_star_update(controller: &BrowserController, repository_id: u64, stars: u64) {
    if let Some(repo) = controller
        .current_repositories()
        .iter()
        .find(|r| r.id == repository_id)
    {
        let delta = stars.saturating_sub(repo.stargazers_count);
        println!("  ⭐ {} {} (+{} since load)", repo.full_name, stars, delta);
    }
}

async fn show_at(controller: &BrowserController, n: usize) {
    let Some(repo) = n.checked_sub(1).and_then(|i| controller.repository_at(i)) else {
        println!("No repository #{}.", n);
        return;
    };
    match controller.repository_detail(&repo.full_name).await {
        Ok(detail) => super::show::print_detail(&detail, Some(controller.effective_star_count(repo))),
        Err(e) => {
            tracing::warn!(full_name = %repo.full_name, "detail fetch failed: {}", e);
            eprintln!("{}", orgstars::controller::detail_failure_message(&repo.full_name));
        }
    }
}
