//! Process-wide test fixture
//!
//! A [`TestRun`] owns the connection and keyring for a whole suite. Each
//! test case deploys its own contract through it; the run is closed with
//! an explicit [`TestRun::teardown`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::config::{ContractProfile, HarnessConfig};
use crate::connection::Connection;
use crate::deploy::{ConstructorArgs, Deployer};
use crate::logging::init_tracing;
use crate::psp34::Psp34;
use crate::session::ContractSession;
use crate::signer::{Keyring, Signer};
use crate::transport::Transport;
use crate::HarnessResult;

/// Totals reported by [`TestRun::teardown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Contracts deployed during the run
    pub deployments: usize,
    /// RPC requests issued during the run
    pub requests: u64,
}

/// Connection, keyring and deployer shared by a suite
pub struct TestRun {
    config: HarnessConfig,
    connection: Connection,
    keyring: Keyring,
    deployer: Deployer,
    deployments: AtomicUsize,
}

impl TestRun {
    /// Connect to the configured endpoint
    #[cfg(feature = "http")]
    pub async fn setup(config: HarnessConfig) -> HarnessResult<Self> {
        init_tracing(&config.log_filter);
        let connection = Connection::connect(&config.endpoint).await?;
        Self::assemble(config, connection)
    }

    /// Run over a custom transport, e.g. an in-process node
    pub async fn with_transport(
        config: HarnessConfig,
        transport: impl Transport + 'static,
    ) -> HarnessResult<Self> {
        init_tracing(&config.log_filter);
        let connection = Connection::with_transport(transport);
        let chain = connection.chain_info().await?;
        tracing::info!(chain = %chain.chain, profile = %config.profile.name, "test run started");
        Self::assemble(config, connection)
    }

    fn assemble(config: HarnessConfig, connection: Connection) -> HarnessResult<Self> {
        let mut keyring = Keyring::dev()?;
        keyring.add_uri(&config.deployer)?;
        let deployer = Deployer::new(
            connection.clone(),
            Arc::new(config.profile.clone()),
            config.deploy_gas_limit,
            config.budget_multiplier,
        );
        Ok(Self {
            config,
            connection,
            keyring,
            deployer,
            deployments: AtomicUsize::new(0),
        })
    }

    /// Active configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Contract profile under test
    pub fn profile(&self) -> &ContractProfile {
        &self.config.profile
    }

    /// Shared connection
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Keyring
    pub fn keyring(&self) -> &Keyring {
        &self.keyring
    }

    /// Signer by keyring URI
    pub fn signer(&self, uri: &str) -> HarnessResult<Signer> {
        self.keyring.signer(uri)
    }

    /// The configured deploying account
    pub fn deployer_signer(&self) -> HarnessResult<Signer> {
        self.keyring.signer(&self.config.deployer)
    }

    /// Deploy a fresh contract as the configured deployer
    pub async fn deploy(&self, args: &ConstructorArgs) -> HarnessResult<ContractSession> {
        let signer = self.deployer_signer()?;
        self.deploy_as(&signer, args).await
    }

    /// Deploy a fresh contract as `signer`
    pub async fn deploy_as(&self, signer: &Signer, args: &ConstructorArgs) -> HarnessResult<ContractSession> {
        let session = self.deployer.deploy(signer, args).await?;
        self.deployments.fetch_add(1, Ordering::Relaxed);
        Ok(session)
    }

    /// Deploy and wrap in the typed PSP34 facade
    pub async fn deploy_psp34(&self, args: &ConstructorArgs) -> HarnessResult<Psp34> {
        Ok(Psp34::new(self.deploy(args).await?))
    }

    /// Close the run
    pub fn teardown(self) -> RunSummary {
        let summary = RunSummary {
            deployments: self.deployments.load(Ordering::Relaxed),
            requests: self.connection.request_count(),
        };
        tracing::info!(
            deployments = summary.deployments,
            requests = summary.requests,
            "test run finished"
        );
        summary
    }
}
