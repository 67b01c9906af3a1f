use std::path::PathBuf;
use std::sync::Arc;

use clinic_core::{ClinicConfig, ClinicDb};
use clinic_notify::{TwilioConfig, TwilioSender};
use clinic_store::Store;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod routes;
mod state;

use state::AppState;

/// Main entry point for the clinic branch records service.
///
/// # Environment Variables
/// - `CLINIC_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Directory for document storage (default: "clinic_data")
/// - `REMINDER_TOKEN`: Shared secret for the reminder trigger endpoint (optional)
/// - `TWILIO_ACCOUNT_SID` / `TWILIO_AUTH_TOKEN` / `TWILIO_FROM`: SMS provider
///   credentials; reminders are recorded as unsent when absent
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_run=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CLINIC_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("CLINIC_DATA_DIR").unwrap_or_else(|_| "clinic_data".into());

    let config = ClinicConfig::new(
        PathBuf::from(data_dir),
        std::env::var("REMINDER_TOKEN").ok(),
    )?;

    let store = Store::open(config.data_dir())?;
    let db = Arc::new(ClinicDb::open(&store)?);

    let sms = TwilioConfig::from_values(
        std::env::var("TWILIO_ACCOUNT_SID").ok(),
        std::env::var("TWILIO_AUTH_TOKEN").ok(),
        std::env::var("TWILIO_FROM").ok(),
    )
    .map(TwilioSender::new);
    if sms.is_none() {
        tracing::warn!("Twilio credentials not configured; reminders will be marked unsent");
    }

    let state = AppState {
        db,
        config: Arc::new(config),
        sms,
    };

    tracing::info!("++ Starting clinic REST on {}", rest_addr);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, routes::router(state)).await?;

    Ok(())
}
