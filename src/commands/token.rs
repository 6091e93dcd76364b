use orgstars::credentials::CredentialStore;

pub fn set_token(store: &dyn CredentialStore, token: Option<String>) -> anyhow::Result<()> {
    let clearing = token.as_deref().map_or(true, |t| t.trim().is_empty());
    store.set_token(token)?;
    if clearing {
        println!("Token cleared.");
    } else {
        println!("✓ Token saved");
    }
    Ok(())
}

pub fn token_status(store: &dyn CredentialStore) -> anyhow::Result<()> {
    match store.token()? {
        Some(token) => {
            let tail: String = token.chars().skip(token.chars().count().saturating_sub(4)).collect();
            println!("Token stored (…{})", tail);
        }
        None => println!("No token stored. Requests are limited to 60 per hour."),
    }
    Ok(())
}
