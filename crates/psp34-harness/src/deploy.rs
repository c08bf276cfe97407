//! Contract deployment

use psp34_primitives::{AccountId, Balance, Timestamp, Weight};
use std::sync::Arc;

use crate::config::{ConstructorSchema, ContractProfile};
use crate::connection::Connection;
use crate::rpc::{InstantiateRequest, SignedInstantiate};
use crate::session::ContractSession;
use crate::signer::Signer;
use crate::value::Value;
use crate::{HarnessError, HarnessResult};

/// Every constructor input any profile knows about
///
/// The profile's [`ConstructorSchema`] picks and orders the fields that
/// are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorArgs {
    /// Collection name
    pub name: String,
    /// Collection symbol
    pub symbol: String,
    /// Token URI prefix
    pub base_uri: String,
    /// Supply cap; 0 means unbounded
    pub max_supply: u64,
    /// Price of one token
    pub price_per_mint: Balance,
    /// Account receiving mint proceeds
    pub project_account_id: Option<AccountId>,
    /// Phase start: pre-presale
    pub prepresale_start_at: Timestamp,
    /// Phase start: presale
    pub presale_start_at: Timestamp,
    /// Phase start: public sale
    pub public_sale_start_at: Timestamp,
    /// Public sale end
    pub public_sale_end_at: Timestamp,
    /// Refund windows
    pub refund_periods: Vec<u64>,
    /// Refund share per window
    pub refund_shares: Vec<u32>,
    /// Refund collection account
    pub refund_address: Option<AccountId>,
}

impl Default for ConstructorArgs {
    fn default() -> Self {
        Self {
            name: "Shiden34".to_string(),
            symbol: "SH34".to_string(),
            base_uri: "ipfs://tokenUriPrefix/".to_string(),
            max_supply: 0,
            price_per_mint: 1_000_000_000_000_000_000,
            project_account_id: None,
            prepresale_start_at: 0,
            presale_start_at: 0,
            public_sale_start_at: 0,
            public_sale_end_at: 0,
            refund_periods: Vec::new(),
            refund_shares: Vec::new(),
            refund_address: None,
        }
    }
}

impl ConstructorArgs {
    /// Supply cap
    pub fn max_supply(mut self, max_supply: u64) -> Self {
        self.max_supply = max_supply;
        self
    }

    /// Price of one token
    pub fn price(mut self, price: Balance) -> Self {
        self.price_per_mint = price;
        self
    }

    /// Project account and refund address
    pub fn accounts(mut self, project: AccountId, refund: AccountId) -> Self {
        self.project_account_id = Some(project);
        self.refund_address = Some(refund);
        self
    }

    /// Sale phase boundaries
    pub fn phases(mut self, prepresale: Timestamp, presale: Timestamp, public: Timestamp, end: Timestamp) -> Self {
        self.prepresale_start_at = prepresale;
        self.presale_start_at = presale;
        self.public_sale_start_at = public;
        self.public_sale_end_at = end;
        self
    }

    /// Arguments in schema order
    pub fn encode(&self, schema: ConstructorSchema) -> HarnessResult<Vec<Value>> {
        if self.refund_periods.len() != self.refund_shares.len() {
            return Err(HarnessError::Deploy(format!(
                "{} refund periods but {} refund shares",
                self.refund_periods.len(),
                self.refund_shares.len()
            )));
        }
        schema
            .fields()
            .iter()
            .map(|field| self.field(field))
            .collect()
    }

    fn field(&self, field: &str) -> HarnessResult<Value> {
        let missing = || HarnessError::Deploy(format!("constructor field {} is required", field));
        let value = match field {
            "name" => Value::from(self.name.as_str()),
            "symbol" => Value::from(self.symbol.as_str()),
            "base_uri" => Value::from(self.base_uri.as_str()),
            "max_supply" => Value::from(self.max_supply),
            "price_per_mint" => Value::from(self.price_per_mint),
            "project_account_id" => Value::from(self.project_account_id.ok_or_else(missing)?),
            "prepresale_start_at" => Value::from(self.prepresale_start_at),
            "presale_start_at" => Value::from(self.presale_start_at),
            "public_sale_start_at" => Value::from(self.public_sale_start_at),
            "public_sale_end_at" => Value::from(self.public_sale_end_at),
            "refund_periods" => Value::from(self.refund_periods.clone()),
            "refund_shares" => Value::from(self.refund_shares.clone()),
            "refund_address" => Value::from(self.refund_address.ok_or_else(missing)?),
            other => {
                return Err(HarnessError::Deploy(format!(
                    "unknown constructor field {}",
                    other
                )))
            }
        };
        Ok(value)
    }
}

/// Deploys fresh contract instances
#[derive(Clone, Debug)]
pub struct Deployer {
    connection: Connection,
    profile: Arc<ContractProfile>,
    gas_limit: Weight,
    budget_multiplier: u64,
}

impl Deployer {
    /// Create a deployer
    pub fn new(
        connection: Connection,
        profile: Arc<ContractProfile>,
        gas_limit: Weight,
        budget_multiplier: u64,
    ) -> Self {
        Self {
            connection,
            profile,
            gas_limit,
            budget_multiplier,
        }
    }

    /// Instantiate a contract and bind a session to it for `signer`
    pub async fn deploy(&self, signer: &Signer, args: &ConstructorArgs) -> HarnessResult<ContractSession> {
        let schema = self.profile.constructor;
        let encoded = args.encode(schema)?;

        let origin = signer.account_id();
        let nonce = self.connection.next_nonce(&origin).await?;
        let request = InstantiateRequest {
            origin,
            constructor: schema.constructor_name().to_string(),
            args: encoded.iter().map(Value::to_json).collect(),
            value: 0,
            gas_limit: self.gas_limit,
        };
        let signature = signer.sign(&request, nonce)?;
        let signed = SignedInstantiate {
            request,
            nonce,
            signature,
        };

        let instantiated = self.connection.instantiate(&signed).await.map_err(|e| match e {
            HarnessError::Rpc { code, message, .. } => {
                HarnessError::Deploy(format!("instantiate rejected ({}): {}", code, message))
            }
            other => other,
        })?;

        tracing::info!(
            profile = %self.profile.name,
            address = %instantiated.address,
            deployer = signer.label(),
            gas = instantiated.gas_consumed,
            "contract deployed"
        );

        Ok(ContractSession::new(
            self.connection.clone(),
            instantiated.address,
            signer.clone(),
            self.profile.clone(),
            self.budget_multiplier,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{code, method};
    use crate::transport::MockTransport;
    use psp34_primitives::H256;
    use serde_json::json;

    #[test]
    fn test_encode_minimal() {
        let args = ConstructorArgs::default().price(5);
        let encoded = args.encode(ConstructorSchema::Minimal).unwrap();
        assert_eq!(encoded.len(), 4);
        assert_eq!(encoded[0], Value::from("Shiden34"));
        assert_eq!(encoded[3], Value::from(5u128));
    }

    #[test]
    fn test_encode_launchpad_requires_accounts() {
        let args = ConstructorArgs::default();
        assert!(matches!(
            args.encode(ConstructorSchema::Launchpad),
            Err(HarnessError::Deploy(_))
        ));

        let account = AccountId::from_bytes([3u8; 32]);
        let encoded = args
            .accounts(account, account)
            .encode(ConstructorSchema::Launchpad)
            .unwrap();
        assert_eq!(encoded.len(), 13);
        assert_eq!(encoded[5], Value::from(account));
    }

    #[test]
    fn test_refund_terms_must_align() {
        let mut args = ConstructorArgs::default();
        args.refund_periods = vec![100, 200];
        args.refund_shares = vec![50];
        assert!(args.encode(ConstructorSchema::PayableMint).is_err());
    }

    #[tokio::test]
    async fn test_deploy_binds_session() {
        let mock = MockTransport::new();
        let address = AccountId::from_bytes([4u8; 32]);
        mock.push_response(
            method::INSTANTIATE,
            json!({
                "address": address.to_hex(),
                "gasConsumed": 1000,
                "events": [],
                "blockHash": H256::ZERO.to_hex(),
            }),
        );
        let deployer = Deployer::new(
            Connection::with_transport(mock.clone()),
            Arc::new(ContractProfile::payable_mint()),
            1_000_000,
            2,
        );
        let alice = Signer::from_uri("//Alice").unwrap();

        let session = deployer
            .deploy(&alice, &ConstructorArgs::default().max_supply(10))
            .await
            .unwrap();
        assert_eq!(session.address(), address);
        assert_eq!(session.signer(), &alice);

        let sent = &mock.requests()[1].params[0];
        assert_eq!(sent["request"]["args"].as_array().map(Vec::len), Some(5));
        assert_eq!(sent["request"]["gasLimit"], 1_000_000);
    }

    #[tokio::test]
    async fn test_deploy_rejection() {
        let mock = MockTransport::new();
        mock.push_error(method::INSTANTIATE, code::INVALID_TRANSACTION, "bad signature", None);
        let deployer = Deployer::new(
            Connection::with_transport(mock),
            Arc::new(ContractProfile::minimal()),
            1_000_000,
            2,
        );
        let alice = Signer::from_uri("//Alice").unwrap();

        assert!(matches!(
            deployer.deploy(&alice, &ConstructorArgs::default()).await,
            Err(HarnessError::Deploy(_))
        ));
    }
}
