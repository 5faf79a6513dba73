use anyhow::Result;
use gphotos_core::config::GphotosConfig;
use gphotos_provider_google::CredentialProvider;
use owo_colors::OwoColorize;

pub async fn run() -> Result<()> {
    let config = GphotosConfig::load()?;
    let credentials = CredentialProvider::from_config(&config)?;

    println!("Authenticating with Google Photos...");

    let token = credentials.get_token().await?;

    println!("{}", "Authenticated!".green());
    println!("Token cached at {}", credentials.cache_path().display());
    if !token.scopes().is_empty() {
        println!("Granted scopes: {}", token.scopes().join(" "));
    }
    if let Some(expires_at) = token.expires_at() {
        println!(
            "{}",
            format!("Access token valid until {}", expires_at.to_rfc3339()).dimmed()
        );
    }
    println!("\nRun `gphotos get <destination>` to download today's media.");

    Ok(())
}
