//! # Clinic Core
//!
//! Core business logic for the clinic branch records service:
//! - appointment listing with payment reconciliation
//! - closed-day calendar policy and next-appointment scheduling
//! - follow-up reminder dispatch with contact re-verification
//! - visit intake, prescription image and lab report references
//!
//! **No API concerns**: HTTP routing, OpenAPI documentation and request/
//! response mapping belong in the `clinic-run` binary. Everything here works
//! against a [`ClinicDb`] handle constructed once at process startup and
//! passed in explicitly.

pub mod appointments;
pub mod calendar;
pub mod config;
pub mod error;
pub mod intake;
pub mod patients;
pub mod payments;
pub mod prescriptions;
pub mod records;
pub mod reminders;
pub mod repos;
pub mod reports;
pub mod schedule;

pub use config::ClinicConfig;
pub use error::{ClinicError, ClinicResult};
pub use repos::ClinicDb;
