use super::browse::github_client;
use orgstars::config::BrowserConfig;
use orgstars::controller::detail_failure_message;
use orgstars::credentials::CredentialStore;
use orgstars::github::RepositoryFetcher;
use orgstars::RepositoryDetail;

pub async fn show_repository(
    config: &BrowserConfig,
    store: &dyn CredentialStore,
    full_name: &str,
) -> anyhow::Result<()> {
    let client = github_client(config, store)?;
    match client.fetch_repository_detail(full_name.trim()).await {
        Ok(detail) => {
            print_detail(&detail, None);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(full_name, "detail fetch failed: {}", e);
            anyhow::bail!(detail_failure_message(full_name.trim()))
        }
    }
}

/// `live_stars` overrides the fetched count when the caller has a fresher one.
pub fn print_detail(detail: &RepositoryDetail, live_stars: Option<u64>) {
    println!("\n{}", "=".repeat(60));
    println!("{}", detail.full_name);
    println!("{}", "=".repeat(60));
    println!("Name:        {}", detail.name);
    match &detail.description {
        Some(desc) => println!("Description: {}", desc),
        None => println!("Description: (no description)"),
    }
    println!("Stars:       {}", live_stars.unwrap_or(detail.stargazers_count));
    println!("Forks:       {}", detail.forks());
    if let Some(language) = &detail.language {
        println!("Language:    {}", language);
    }
    if let Some(updated) = detail.updated_at {
        println!("Updated:     {}", updated.format("%Y-%m-%d %H:%M UTC"));
    }
    println!("URL:         {}\n", detail.html_url);
}
