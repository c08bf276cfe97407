//! Harness configuration and contract profiles

use psp34_primitives::Weight;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::contract::{psp34_messages, ContractSpec};
use crate::{HarnessError, HarnessResult};

/// Environment variable overriding [`HarnessConfig::endpoint`]
pub const ENV_ENDPOINT: &str = "PSP34_ENDPOINT";
/// Environment variable selecting a profile preset by name
pub const ENV_PROFILE: &str = "PSP34_PROFILE";

/// Harness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Node gateway URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Multiplier applied to estimated budgets by `transact_estimated`
    #[serde(default = "default_budget_multiplier")]
    pub budget_multiplier: u64,
    /// Budget for contract instantiation
    #[serde(default = "default_deploy_gas_limit")]
    pub deploy_gas_limit: Weight,
    /// Fallback tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Keyring URI of the deploying account
    #[serde(default = "default_deployer")]
    pub deployer: String,
    /// Contract variant under test
    #[serde(default)]
    pub profile: ContractProfile,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:9944".to_string()
}

fn default_budget_multiplier() -> u64 {
    2
}

fn default_deploy_gas_limit() -> Weight {
    1_000_000
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_deployer() -> String {
    "//Alice".to_string()
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            budget_multiplier: default_budget_multiplier(),
            deploy_gas_limit: default_deploy_gas_limit(),
            log_filter: default_log_filter(),
            deployer: default_deployer(),
            profile: ContractProfile::default(),
        }
    }
}

impl HarnessConfig {
    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> HarnessResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)?.apply_env()
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> HarnessResult<Self> {
        Self::default().apply_env()
    }

    /// Apply `PSP34_ENDPOINT` and `PSP34_PROFILE`
    pub fn apply_env(self) -> HarnessResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> HarnessResult<Self> {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(name) = lookup(ENV_PROFILE) {
            self.profile = ContractProfile::preset(&name)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Serialize to TOML text
    pub fn to_toml_string(&self) -> HarnessResult<String> {
        toml::to_string_pretty(self).map_err(|e| HarnessError::Config(e.to_string()))
    }

    fn validate(&self) -> HarnessResult<()> {
        if self.endpoint.is_empty() {
            return Err(HarnessError::Config("endpoint is empty".to_string()));
        }
        if self.budget_multiplier == 0 {
            return Err(HarnessError::Config(
                "budget_multiplier must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Constructor argument layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructorSchema {
    /// name, symbol, base URI, price
    Minimal,
    /// name, symbol, base URI, max supply, price
    PayableMint,
    /// payable mint plus project account, phase timestamps and refund terms
    Launchpad,
}

impl ConstructorSchema {
    /// Constructor fields in wire order
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            ConstructorSchema::Minimal => &["name", "symbol", "base_uri", "price_per_mint"],
            ConstructorSchema::PayableMint => {
                &["name", "symbol", "base_uri", "max_supply", "price_per_mint"]
            }
            ConstructorSchema::Launchpad => &[
                "name",
                "symbol",
                "base_uri",
                "max_supply",
                "price_per_mint",
                "project_account_id",
                "prepresale_start_at",
                "presale_start_at",
                "public_sale_start_at",
                "public_sale_end_at",
                "refund_periods",
                "refund_shares",
                "refund_address",
            ],
        }
    }

    /// Constructor message name
    pub fn constructor_name(&self) -> &'static str {
        "new"
    }
}

/// How return values are enveloped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultUnwrapping {
    /// Plain messages return bare values; fallible ones `{"ok"|"err"}`
    Auto,
    /// Every response carries an extra outer `{"ok": …}` dispatch envelope
    Explicit,
}

/// How minting is gated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MintPhaseModel {
    /// Always open
    Open,
    /// One mint per account until the owner sets the mint-end flag
    MintEndFlag,
    /// Phase enum; only the public phase mints
    StatusEnum,
}

/// Error identifiers the contract variant reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorIdentifiers {
    /// Mint attempted after the mint-end flag was set
    pub mint_ended: String,
    /// Second mint from the same account
    pub duplicate_mint: String,
    /// Mint outside the public phase
    pub phase_closed: String,
    /// Attached value differs from price × count
    pub bad_mint_value: String,
    /// Mint would exceed max supply
    pub collection_full: String,
    /// Owner-only message called by someone else
    pub not_owner: String,
}

impl Default for ErrorIdentifiers {
    fn default() -> Self {
        Self {
            mint_ended: "MintEnd".to_string(),
            duplicate_mint: "CannotMintMoreThanOnce".to_string(),
            phase_closed: "UnableToMint".to_string(),
            bad_mint_value: "BadMintValue".to_string(),
            collection_full: "CollectionIsFull".to_string(),
            not_owner: "O::CallerIsNotOwner".to_string(),
        }
    }
}

/// One contract variant under test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProfileRepr")]
pub struct ContractProfile {
    /// Preset or custom name
    pub name: String,
    /// Constructor layout
    pub constructor: ConstructorSchema,
    /// Return-value envelope convention
    pub unwrapping: ResultUnwrapping,
    /// Mint gating
    pub minting: MintPhaseModel,
    /// Error identifiers
    pub errors: ErrorIdentifiers,
}

impl ContractProfile {
    /// Four-argument constructor with the mint-end flag
    pub fn minimal() -> Self {
        Self {
            name: "minimal".to_string(),
            constructor: ConstructorSchema::Minimal,
            unwrapping: ResultUnwrapping::Auto,
            minting: MintPhaseModel::MintEndFlag,
            errors: ErrorIdentifiers::default(),
        }
    }

    /// Capped supply with open minting
    pub fn payable_mint() -> Self {
        Self {
            name: "payable_mint".to_string(),
            constructor: ConstructorSchema::PayableMint,
            unwrapping: ResultUnwrapping::Auto,
            minting: MintPhaseModel::Open,
            errors: ErrorIdentifiers::default(),
        }
    }

    /// Launchpad variant with phased minting
    pub fn launchpad() -> Self {
        Self {
            name: "launchpad".to_string(),
            constructor: ConstructorSchema::Launchpad,
            unwrapping: ResultUnwrapping::Explicit,
            minting: MintPhaseModel::StatusEnum,
            errors: ErrorIdentifiers::default(),
        }
    }

    /// Preset by name
    pub fn preset(name: &str) -> HarnessResult<Self> {
        match name {
            "minimal" => Ok(Self::minimal()),
            "payable_mint" => Ok(Self::payable_mint()),
            "launchpad" => Ok(Self::launchpad()),
            other => Err(HarnessError::Config(format!("unknown profile preset {:?}", other))),
        }
    }

    /// Message table for this variant
    pub fn messages(&self) -> ContractSpec {
        psp34_messages(self.minting)
    }
}

impl Default for ContractProfile {
    fn default() -> Self {
        Self::minimal()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileRepr {
    Preset(String),
    Table(ProfileTable),
}

#[derive(Deserialize)]
struct ProfileTable {
    #[serde(default)]
    preset: Option<String>,
    name: Option<String>,
    constructor: Option<ConstructorSchema>,
    unwrapping: Option<ResultUnwrapping>,
    minting: Option<MintPhaseModel>,
    #[serde(default)]
    errors: Option<ErrorIdentifiers>,
}

impl TryFrom<ProfileRepr> for ContractProfile {
    type Error = HarnessError;

    fn try_from(repr: ProfileRepr) -> Result<Self, Self::Error> {
        match repr {
            ProfileRepr::Preset(name) => Self::preset(&name),
            ProfileRepr::Table(table) => {
                let base = match &table.preset {
                    Some(name) => Self::preset(name)?,
                    None => Self::default(),
                };
                Ok(Self {
                    name: table.name.or(table.preset).unwrap_or(base.name),
                    constructor: table.constructor.unwrap_or(base.constructor),
                    unwrapping: table.unwrapping.unwrap_or(base.unwrapping),
                    minting: table.minting.unwrap_or(base.minting),
                    errors: table.errors.unwrap_or(base.errors),
                })
            }
        }
    }
}
