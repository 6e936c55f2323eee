//! Rotation run orchestration
//!
//! One call to [`Rotator::run`] is one batch reconciliation:
//!
//! 1. load the durable state and the live client list
//! 2. let the [`RotationEngine`] decide what changes
//! 3. add the minted credential, write the proxy configuration, reload
//! 4. remove every retired credential, write once, reload once
//! 5. save the durable state
//! 6. send one notification per change
//!
//! The proxy configuration is written and reloaded at most twice per run.
//! Sink failures are counted in the [`RunReport`] and never abort the run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::artifact::{ClientsAdapter, ConfigArtifact};
use crate::config::RotorConfig;
use crate::core::{ConfigError, CredentialId, RotorResult, SinkError};
use crate::rotation::{RotationEngine, RotationOutcome, RotationPolicy};
use crate::sink::{LogNotifier, NotificationEvent, NotificationSender, ReloadSignal};
use crate::state::{RotationState, StateStore};

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Credential added to the proxy configuration
    pub minted: Option<CredentialId>,

    /// Credentials removed from the proxy configuration
    pub retired: Vec<CredentialId>,

    /// Live credential adopted as current
    pub adopted: Option<CredentialId>,

    /// Reload or notification failures
    pub sink_failures: usize,

    /// Nothing was written and no sink was called
    pub dry_run: bool,
}

impl RunReport {
    /// Whether every sink call succeeded
    pub fn is_clean(&self) -> bool {
        self.sink_failures == 0
    }

    /// Whether the live credential set changed (or would have, in a dry run)
    pub fn changed(&self) -> bool {
        self.minted.is_some() || !self.retired.is_empty()
    }
}

/// Snapshot of the durable state and the live client list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Configured policy
    pub policy: RotationPolicy,

    /// Durable state as loaded
    pub state: RotationState,

    /// Credentials in the proxy configuration, in document order
    pub live: Vec<CredentialId>,

    /// Earliest time the next mint can happen
    pub next_rotation: Option<DateTime<Utc>>,
}

/// Runs rotations against one proxy configuration
pub struct Rotator<R, N> {
    engine: RotationEngine,
    policy: RotationPolicy,
    store: StateStore,
    config_path: PathBuf,
    clients: ClientsAdapter,
    reload: R,
    notifier: N,
}

impl<R, N> std::fmt::Debug for Rotator<R, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rotator")
            .field("engine", &self.engine)
            .field("policy", &self.policy)
            .field("store", &self.store)
            .field("config_path", &self.config_path)
            .finish_non_exhaustive()
    }
}

impl<R: ReloadSignal, N: NotificationSender> Rotator<R, N> {
    /// Create a rotator from a validated configuration and explicit sinks
    pub fn new(config: &RotorConfig, reload: R, notifier: N) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            engine: RotationEngine::new(config.schedule()?),
            policy: config.policy,
            store: StateStore::new(config.state_path.clone()),
            config_path: config.config_path.clone(),
            clients: config.clients_adapter()?,
            reload,
            notifier,
        })
    }

    /// Run one rotation at `now`
    ///
    /// # Errors
    ///
    /// * `Storage` if the state file cannot be read or written
    /// * `Artifact` if the proxy configuration cannot be read or written
    pub async fn run(&self, now: DateTime<Utc>) -> RotorResult<RunReport> {
        let (state, artifact, live) = self.load().await?;
        let outcome = self.engine.evaluate(now, state, &live);
        self.log_outcome(&outcome);

        let mut report = RunReport {
            minted: outcome.minted.as_ref().map(|m| m.id),
            retired: Vec::new(),
            adopted: outcome.adopted,
            sink_failures: 0,
            dry_run: false,
        };
        self.apply(now, outcome, artifact, &live, &mut report).await?;

        info!(
            minted = ?report.minted,
            retired = report.retired.len(),
            sink_failures = report.sink_failures,
            "Rotation run complete"
        );
        Ok(report)
    }

    /// Evaluate a rotation at `now` without writing anything or calling sinks
    pub async fn dry_run(&self, now: DateTime<Utc>) -> RotorResult<RunReport> {
        let (state, _, live) = self.load().await?;
        let outcome = self.engine.evaluate(now, state, &live);
        self.log_outcome(&outcome);

        let report = RunReport {
            minted: outcome.minted.as_ref().map(|m| m.id),
            retired: outcome.retired.iter().map(|r| r.id).collect(),
            adopted: outcome.adopted,
            sink_failures: 0,
            dry_run: true,
        };
        info!(minted = ?report.minted, retired = ?report.retired, "Dry run, nothing written");
        Ok(report)
    }

    /// Load the state and the live client list without changing anything
    pub async fn status(&self) -> RotorResult<StatusReport> {
        let (state, _, live) = self.load().await?;
        let next_rotation = state
            .last_rotation()
            .and_then(|last| last.checked_add_signed(self.engine.schedule().interval()));

        Ok(StatusReport {
            policy: self.policy,
            state,
            live: live.into_iter().collect(),
            next_rotation,
        })
    }

    async fn load(&self) -> RotorResult<(RotationState, ConfigArtifact, IndexSet<CredentialId>)> {
        let state = self.store.load(self.policy).await?;
        let artifact = ConfigArtifact::load(&self.config_path, self.clients.clone()).await?;
        let live = artifact.list()?;
        debug!(live = live.len(), tracked = state.tracked().len(), "Loaded rotation inputs");
        Ok((state, artifact, live))
    }

    async fn apply(
        &self,
        now: DateTime<Utc>,
        outcome: RotationOutcome,
        mut artifact: ConfigArtifact,
        live: &IndexSet<CredentialId>,
        report: &mut RunReport,
    ) -> RotorResult<()> {
        let RotationOutcome {
            mut state,
            minted,
            retired,
            ..
        } = outcome;
        let mut events = Vec::new();

        if let Some(minted) = &minted {
            if !live.contains(&minted.id) {
                artifact.add(minted.id)?;
                // On failure the state is not saved, so the mint is retried
                artifact.save().await?;
            }
            info!(credential_id = %minted.id, "Credential added");
            self.reload(report).await;
            events.push(NotificationEvent::added(minted));
        }

        let mut removed = Vec::new();
        for entry in &retired {
            if artifact.remove(entry.id)? > 0 {
                removed.push(entry);
            }
        }

        if !removed.is_empty() {
            if let Err(err) = artifact.save().await {
                for entry in &removed {
                    state.requeue(entry);
                }
                if let Err(save_err) = self.store.save(&state).await {
                    error!(error = %save_err, "Failed to save rotation state after a failed retirement");
                }
                self.notify_all(&events, report).await;
                return Err(err.into());
            }

            for entry in &removed {
                info!(credential_id = %entry.id, retire_at = %entry.retire_at, "Credential removed");
                report.retired.push(entry.id);
                events.push(NotificationEvent::removed(entry, now));
            }
            self.reload(report).await;
        }

        // The proxy configuration already changed, so report it either way
        if let Err(err) = self.store.save(&state).await {
            self.notify_all(&events, report).await;
            return Err(err.into());
        }
        self.notify_all(&events, report).await;
        Ok(())
    }

    async fn reload(&self, report: &mut RunReport) {
        if let Err(err) = self.reload.reload().await {
            self.sink_failed("reload", &err, report);
        }
    }

    async fn notify_all(&self, events: &[NotificationEvent], report: &mut RunReport) {
        for event in events {
            if let Err(err) = self.notifier.send(event).await {
                self.sink_failed("notify", &err, report);
            }
        }
    }

    fn sink_failed(&self, sink: &'static str, err: &SinkError, report: &mut RunReport) {
        warn!(sink, error = %err, "Sink call failed, continuing");
        report.sink_failures += 1;
    }

    fn log_outcome(&self, outcome: &RotationOutcome) {
        if let Some(adopted) = outcome.adopted {
            info!(credential_id = %adopted, "Adopted live credential as current");
        }
        for id in &outcome.dropped {
            debug!(credential_id = %id, "Scheduled credential already gone, dropping");
        }
        if !outcome.has_mutations() {
            debug!("No rotation or retirement due");
        }
    }
}

impl<R: ReloadSignal> Rotator<R, Box<dyn NotificationSender>> {
    /// Create a rotator that notifies through the configured channel
    ///
    /// Uses Telegram when `config.telegram` is set, the log otherwise.
    pub fn with_configured_notifier(config: &RotorConfig, reload: R) -> Result<Self, ConfigError> {
        let notifier = configured_notifier(config)?;
        Self::new(config, reload, notifier)
    }
}

#[cfg(feature = "telegram")]
fn configured_notifier(config: &RotorConfig) -> Result<Box<dyn NotificationSender>, ConfigError> {
    use crate::sink::TelegramNotifier;

    match &config.telegram {
        Some(telegram) => {
            let notifier = TelegramNotifier::new(
                telegram.bot_token.clone(),
                telegram.chat_id.clone(),
                telegram.timeout(),
            )
            .map_err(|e| ConfigError::InvalidValue {
                field: "telegram".to_string(),
                reason: e.to_string(),
            })?
            .with_api_base(telegram.api_base.clone());
            Ok(Box::new(notifier))
        }
        None => Ok(Box::new(LogNotifier)),
    }
}

#[cfg(not(feature = "telegram"))]
fn configured_notifier(config: &RotorConfig) -> Result<Box<dyn NotificationSender>, ConfigError> {
    if config.telegram.is_some() {
        warn!("Telegram is configured but support is not compiled in; logging events instead");
    }
    Ok(Box::new(LogNotifier))
}
