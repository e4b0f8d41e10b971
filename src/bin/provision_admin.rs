use portfolio_api::provisioning::{SupabaseIdentityAdmin, provision_admin};
use std::{env, process::ExitCode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// provision-admin
///
/// One-shot bootstrap of the operator account. Safe to re-run.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let identity_url = env::var("IDENTITY_URL").expect("FATAL: IDENTITY_URL is required");
    let service_key =
        env::var("IDENTITY_SERVICE_KEY").expect("FATAL: IDENTITY_SERVICE_KEY is required");
    let email = env::var("ADMIN_EMAIL").unwrap_or_default();
    let password = env::var("ADMIN_PASSWORD").unwrap_or_default();

    let admin = SupabaseIdentityAdmin::new(&identity_url, &service_key);

    match provision_admin(&admin, &email, &password).await {
        Ok(outcome) => {
            tracing::info!(
                uid = %outcome.uid,
                email = %outcome.email,
                created = outcome.created,
                "admin provisioned"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("admin provisioning failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
