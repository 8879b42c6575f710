use std::error::Error;

use scm_engine::{Client, ErrorKind, ProviderConfig, UserService};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; variables may come from the process environment.
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err.into());
        }
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,scm_engine=info"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    let cfg = ProviderConfig::from_env()?;
    info!(provider = %cfg.kind, base_url = %cfg.base_url, "scm-bridge starting");

    let client = Client::from_config(cfg)?;
    let users = client.users();

    let (user, response) = users.find().await?;
    info!(
        login = %user.login,
        name = %user.name,
        email = user.email.as_deref().unwrap_or(""),
        status = response.status,
        rate_remaining = response.rate.remaining,
        "authenticated user resolved"
    );

    match users.list_invitations().await {
        Ok((invitations, response)) => {
            info!(
                count = invitations.len(),
                has_next = response.page.has_next(),
                "pending invitations"
            );
            for invite in &invitations {
                info!(
                    id = invite.id,
                    repository = %invite.repository,
                    permissions = %invite.permissions,
                    "invitation"
                );
            }
        }
        Err(err) if err.kind() == ErrorKind::Unsupported => {
            warn!(provider = %client.kind(), "{err}");
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
