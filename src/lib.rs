//! endfield-checkin - Daily attendance automation for Arknights: Endfield
//!
//! Exchanges an account token for an SKPort session, enumerates the Endfield
//! roles bound to the account and claims the daily attendance reward for
//! each of them, reporting the outcome to an optional Discord webhook.
//!
//! # Architecture
//!
//! - [`skport`] - API client, request signing, handshake, roles and attendance
//! - [`runner`] - Sequential orchestration and pacing
//! - [`report`] - Run transcript
//! - [`notifications`] - Report delivery channels
//! - [`config`] - Configuration from environment or TOML
//! - [`models`] - Core data structures
//! - [`error`] - Unified error type
//!
//! # Example
//!
//! ```no_run
//! use endfield_checkin::config::Config;
//! use endfield_checkin::runner::Runner;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let summary = Runner::new(&config)?.run().await;
//!     println!("{}", summary.report.render());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod notifications;
pub mod report;
pub mod runner;
pub mod skport;

pub use models::{ClaimOutcome, Role, SessionCredential};
pub use skport::sign::sign;
