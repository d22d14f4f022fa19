//! Run orchestration
//!
//! Drives every configured account through session → roles → per-role
//! claim, strictly one request at a time:
//!
//! ```text
//! account 1: session → roles → role 1 → (pace) → role 2 → …
//!   (pace)
//! account 2: …
//! ```
//!
//! Failures are contained at the smallest unit that owns them: a role
//! failure only affects that role, a session or binding failure skips the
//! rest of that account. Everything is recorded in one [`RunReport`].

pub mod pacing;

use crate::config::{AccountSource, Config};
use crate::error::Result;
use crate::models::{ClaimOutcome, Role, SessionCredential};
use crate::notifications::{self, Channel};
use crate::report::RunReport;
use crate::skport::{
    AttendanceClaimer, CredentialProvider, DirectCredential, RoleResolver, SkportClient,
    TokenExchange,
};

pub use pacing::Pacer;

/// What to do with the resolved roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Check and claim attendance for every role
    CheckIn,
    /// Only list roles, without touching attendance
    ListRoles,
}

/// Outcome for one role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleResult {
    pub role: Role,
    pub outcome: ClaimOutcome,
}

/// Outcome for one account
#[derive(Debug, Clone)]
pub struct AccountSummary {
    /// 1-based position in the configured account list
    pub index: usize,
    /// Name of the credential strategy used
    pub strategy: String,
    /// Results per role, in binding order
    pub roles: Vec<RoleResult>,
    /// Session or binding error that stopped the account early
    pub error: Option<String>,
}

impl AccountSummary {
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && !self.roles.iter().any(|r| r.outcome.is_failure())
    }
}

/// Everything a run produced
#[derive(Debug)]
pub struct RunSummary {
    pub report: RunReport,
    pub accounts: Vec<AccountSummary>,
    /// Whether any error was recorded while processing accounts
    pub failed: bool,
}

/// Pick the credential strategy for an account
pub fn provider_for(source: &AccountSource) -> Box<dyn CredentialProvider> {
    match source {
        AccountSource::Token { token } => Box::new(TokenExchange::new(token.clone())),
        AccountSource::Credential { cred, secret } => {
            Box::new(DirectCredential::new(cred.clone(), secret.clone()))
        }
    }
}

/// Sequential check-in runner
pub struct Runner {
    client: SkportClient,
    accounts: Vec<AccountSource>,
    pacer: Pacer,
    channels: Vec<Box<dyn Channel>>,
}

impl Runner {
    /// Create a runner with the channels described by `config.notify`
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: SkportClient::new(&config.api)?,
            accounts: config.accounts.clone(),
            pacer: Pacer::new(&config.pacing),
            channels: notifications::channels_from_config(&config.notify),
        })
    }

    /// Replace the notification channels
    pub fn with_channels(mut self, channels: Vec<Box<dyn Channel>>) -> Self {
        self.channels = channels;
        self
    }

    /// Check in every account, then notify
    pub async fn run(&self) -> RunSummary {
        self.execute(RunMode::CheckIn).await
    }

    /// Resolve and list roles of every account without claiming
    pub async fn list_roles(&self) -> RunSummary {
        self.execute(RunMode::ListRoles).await
    }

    async fn execute(&self, mode: RunMode) -> RunSummary {
        let mut report = RunReport::new();
        let mut accounts = Vec::with_capacity(self.accounts.len());

        for (i, source) in self.accounts.iter().enumerate() {
            self.pacer.before_account().await;
            let summary = self.run_account(i + 1, source, mode, &mut report).await;
            accounts.push(summary);
        }

        // Decided before delivery so a failed notification cannot flip it.
        let failed = report.has_errors();

        if mode == RunMode::CheckIn {
            notifications::deliver(&self.channels, &mut report).await;
        }

        tracing::info!(
            accounts = accounts.len(),
            errors = report.error_count(),
            failed,
            "Run finished"
        );

        RunSummary {
            report,
            accounts,
            failed,
        }
    }

    async fn run_account(
        &self,
        index: usize,
        source: &AccountSource,
        mode: RunMode,
        report: &mut RunReport,
    ) -> AccountSummary {
        report.debug(format!("----- CHECKING IN FOR ACCOUNT {index} -----"));

        let provider = provider_for(source);
        let mut summary = AccountSummary {
            index,
            strategy: provider.name().to_string(),
            roles: Vec::new(),
            error: None,
        };

        let (session, roles) = match self.prepare_account(index, provider.as_ref(), report).await {
            Ok(prepared) => prepared,
            Err(e) => {
                tracing::debug!(account = index, category = %e.category(), "Account skipped");
                report.error(format!("Account {index}: {e}"));
                summary.error = Some(e.to_string());
                return summary;
            }
        };

        let claimer = AttendanceClaimer::new(&self.client);
        for role in roles {
            let outcome = match mode {
                RunMode::ListRoles => {
                    report.info(format!(
                        "  → {} uid {} ({})",
                        role.label(),
                        role.role_id,
                        role.composite_id
                    ));
                    continue;
                }
                RunMode::CheckIn => {
                    self.pacer.before_role().await;
                    claimer
                        .claim_for_role(&session, &role)
                        .await
                        .unwrap_or_else(|e| ClaimOutcome::Failed(e.to_string()))
                }
            };

            let line = format!("  → {}: {}", role.label(), outcome.describe());
            if outcome.is_failure() {
                report.error(line);
            } else {
                report.info(line);
            }
            summary.roles.push(RoleResult { role, outcome });
        }

        summary
    }

    /// Obtain a session and its roles for one account
    async fn prepare_account(
        &self,
        index: usize,
        provider: &dyn CredentialProvider,
        report: &mut RunReport,
    ) -> Result<(SessionCredential, Vec<Role>)> {
        let session = provider.session(&self.client).await?;
        report.info(format!("Account {index}: obtained cred and salt"));

        let roles = RoleResolver::new(&self.client).list_roles(&session).await?;
        report.info(format!("Account {index}: Found {} role(s)", roles.len()));

        Ok((session, roles))
    }
}
