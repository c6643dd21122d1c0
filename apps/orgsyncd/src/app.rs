//! One reconciliation cycle, wired end to end.

use async_trait::async_trait;
use tracing::info;

use orgsync_config::Config;
use orgsync_directory::{build_snapshot, LdapDirectory};
use orgsync_engine::{CycleReport, SyncEngine, SyncResult};
use orgsync_gitea::GiteaClient;

use crate::scheduler::CycleRunner;

/// The assembled application: directory client plus engine.
pub struct App {
    config: Config,
    directory: LdapDirectory,
    engine: SyncEngine<GiteaClient>,
}

impl App {
    /// Wire up clients and the engine from validated configuration.
    pub fn new(config: Config) -> SyncResult<Self> {
        let directory = LdapDirectory::new(config.ldap.clone());
        let gitea = GiteaClient::new(&config.gitea)?;
        let engine = SyncEngine::new(config.clone(), gitea)?;

        Ok(Self {
            config,
            directory,
            engine,
        })
    }
}

#[async_trait]
impl CycleRunner for App {
    /// Fetch the directory, build the snapshot, reconcile.
    async fn run_cycle(&self) -> SyncResult<CycleReport> {
        info!("Starting reconciliation cycle");

        let raw = self.directory.fetch().await?;
        let snapshot = build_snapshot(&raw, &self.config.ldap)?;

        self.engine.run(&snapshot).await
    }
}
