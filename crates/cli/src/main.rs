use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use clinic_core::patients::PatientIndex;
use clinic_core::payments::PaymentLedger;
use clinic_core::reminders::ReminderDispatcher;
use clinic_core::ClinicDb;
use clinic_notify::{TwilioConfig, TwilioSender};
use clinic_store::Store;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic branch records operations CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send due follow-up reminders (cron entry point)
    DispatchReminders,
    /// Remove stale pending payment duplicates
    CleanupPayments,
    /// Show patient counts per branch
    Counts,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let data_dir = std::env::var("CLINIC_DATA_DIR").unwrap_or_else(|_| "clinic_data".into());
    let store = Store::open(&data_dir)?;
    let db = Arc::new(ClinicDb::open(&store)?);

    match cli.command {
        Some(Commands::DispatchReminders) => {
            let sender = TwilioConfig::from_values(
                std::env::var("TWILIO_ACCOUNT_SID").ok(),
                std::env::var("TWILIO_AUTH_TOKEN").ok(),
                std::env::var("TWILIO_FROM").ok(),
            )
            .map(TwilioSender::new);

            let dispatcher = ReminderDispatcher::new(db);
            let reports = dispatcher.dispatch_due(Utc::now(), sender.as_ref()).await?;
            if reports.is_empty() {
                println!("No reminders due.");
            } else {
                for report in &reports {
                    println!("{}: {}", report.visit_no, report.result);
                }
                println!("Processed {} follow-up(s).", reports.len());
            }
        }
        Some(Commands::CleanupPayments) => {
            let summary = PaymentLedger::new(db).cleanup_stale_pending()?;
            println!(
                "Removed {} stale pending record(s) across {} duplicate group(s).",
                summary.removed_pending_records, summary.duplicate_groups
            );
        }
        Some(Commands::Counts) => {
            let counts = PatientIndex::new(db).counts()?;
            for (branch, count) in &counts.per_branch {
                println!("{branch}: {count}");
            }
            println!("Total: {}", counts.total);
        }
        None => {
            println!("Use 'clinic --help' for commands");
        }
    }

    Ok(())
}
