//! Typed PSP34 facade over a [`ContractSession`]

use psp34_primitives::{AccountId, Balance, Id};

use crate::outcome::{CallOutcome, ContractError};
use crate::session::ContractSession;
use crate::signer::Signer;
use crate::value::Value;
use crate::{HarnessError, HarnessResult};

/// PSP34 collection bound to one signer
///
/// Queries return decoded values; state-changing messages return the full
/// [`CallOutcome`] so callers can inspect events and rejections. Every
/// transaction is budgeted from a preceding dry run.
#[derive(Clone, Debug)]
pub struct Psp34 {
    session: ContractSession,
}

fn malformed(message: &str, value: &Value) -> HarnessError {
    HarnessError::MalformedResponse(format!("{} returned {}", message, value))
}

impl Psp34 {
    /// Wrap a session
    pub fn new(session: ContractSession) -> Self {
        Self { session }
    }

    /// Underlying session
    pub fn session(&self) -> &ContractSession {
        &self.session
    }

    /// Contract address
    pub fn address(&self) -> AccountId {
        self.session.address()
    }

    /// Same collection, different signer
    pub fn with_signer(&self, signer: &Signer) -> Self {
        Self::new(self.session.with_signer(signer))
    }

    async fn value_of(&self, message: &str, args: &[Value]) -> HarnessResult<Value> {
        self.session.query(message, args).await?.expect_value()
    }

    async fn u128_of(&self, message: &str, args: &[Value]) -> HarnessResult<u128> {
        let value = self.value_of(message, args).await?;
        value.as_u128().ok_or_else(|| malformed(message, &value))
    }

    async fn bool_of(&self, message: &str, args: &[Value]) -> HarnessResult<bool> {
        let value = self.value_of(message, args).await?;
        value.as_bool().ok_or_else(|| malformed(message, &value))
    }

    async fn fallible_id(&self, message: &str, args: &[Value]) -> HarnessResult<Result<Id, ContractError>> {
        let outcome = self.session.query(message, args).await?;
        match outcome.result {
            Ok(value) => value
                .as_id()
                .cloned()
                .map(Ok)
                .ok_or_else(|| malformed(message, &value)),
            Err(err) => Ok(Err(err)),
        }
    }

    // ==================== Queries ====================

    /// Collection identifier
    pub async fn collection_id(&self) -> HarnessResult<Id> {
        let value = self.value_of("collectionId", &[]).await?;
        value.as_id().cloned().ok_or_else(|| malformed("collectionId", &value))
    }

    /// Number of minted tokens
    pub async fn total_supply(&self) -> HarnessResult<u128> {
        self.u128_of("totalSupply", &[]).await
    }

    /// Supply cap; 0 means unbounded
    pub async fn max_supply(&self) -> HarnessResult<u64> {
        let value = self.value_of("maxSupply", &[]).await?;
        value.as_u64().ok_or_else(|| malformed("maxSupply", &value))
    }

    /// Price of one token
    pub async fn price(&self) -> HarnessResult<Balance> {
        self.u128_of("price", &[]).await
    }

    /// Contract owner
    pub async fn owner(&self) -> HarnessResult<AccountId> {
        self.value_of("owner", &[]).await?.as_account()
    }

    /// Tokens held by `account`
    pub async fn balance_of(&self, account: &AccountId) -> HarnessResult<u32> {
        let value = self.value_of("balanceOf", &[Value::from(account)]).await?;
        value
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| malformed("balanceOf", &value))
    }

    /// Owner of `id`, if minted
    pub async fn owner_of(&self, id: &Id) -> HarnessResult<Option<AccountId>> {
        let value = self.value_of("ownerOf", &[Value::from(id)]).await?;
        if value.is_null() {
            return Ok(None);
        }
        value.as_account().map(Some)
    }

    /// Whether `operator` may move `id` (or every token when `None`) of `owner`
    pub async fn allowance(&self, owner: &AccountId, operator: &AccountId, id: Option<&Id>) -> HarnessResult<bool> {
        self.bool_of(
            "allowance",
            &[Value::from(owner), Value::from(operator), Value::from(id.cloned())],
        )
        .await
    }

    /// Token at `index` in mint order
    pub async fn token_by_index(&self, index: u128) -> HarnessResult<Result<Id, ContractError>> {
        self.fallible_id("tokenByIndex", &[Value::from(index)]).await
    }

    /// Token at `index` among those held by `owner`
    pub async fn owners_token_by_index(
        &self,
        owner: &AccountId,
        index: u128,
    ) -> HarnessResult<Result<Id, ContractError>> {
        self.fallible_id("ownersTokenByIndex", &[Value::from(owner), Value::from(index)])
            .await
    }

    /// Metadata URI of token `id`
    pub async fn token_uri(&self, id: u64) -> HarnessResult<Result<String, ContractError>> {
        let outcome = self.session.query("tokenUri", &[Value::from(id)]).await?;
        match outcome.result {
            Ok(Value::Str(uri)) => Ok(Ok(uri)),
            Ok(other) => Err(malformed("tokenUri", &other)),
            Err(err) => Ok(Err(err)),
        }
    }

    /// Per-call mint cap
    pub async fn max_mint_amount(&self) -> HarnessResult<u64> {
        let value = self.value_of("getMaxMintAmount", &[]).await?;
        value.as_u64().ok_or_else(|| malformed("getMaxMintAmount", &value))
    }

    /// Whether minting has been closed by the owner
    pub async fn mint_end(&self) -> HarnessResult<bool> {
        self.bool_of("getMintEnd", &[]).await
    }

    /// Whether `account` has already minted
    pub async fn is_account_minted(&self, account: &AccountId) -> HarnessResult<bool> {
        self.bool_of("getIsAccountMinted", &[Value::from(account)]).await
    }

    /// Current sale phase name
    pub async fn minting_status(&self) -> HarnessResult<String> {
        let value = self.value_of("getMintingStatus", &[]).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| malformed("getMintingStatus", &value))
    }

    // ==================== Transactions ====================

    /// Mint the next token to the signer, paying the listed price
    pub async fn mint_next(&self) -> HarnessResult<CallOutcome> {
        let price = self.price().await?;
        self.mint_next_paying(price).await
    }

    /// Mint the next token with an explicit payment
    pub async fn mint_next_paying(&self, value: Balance) -> HarnessResult<CallOutcome> {
        self.session.transact_estimated("mintNext", &[], value).await
    }

    /// Mint `count` tokens to `to`, paying price × count
    pub async fn mint(&self, to: &AccountId, count: u64) -> HarnessResult<CallOutcome> {
        let price = self.price().await?;
        let value = price.saturating_mul(count as u128);
        self.session
            .transact_estimated("mint", &[Value::from(to), Value::from(count)], value)
            .await
    }

    /// Move `id` to `to`
    pub async fn transfer(&self, to: &AccountId, id: &Id, data: &[u8]) -> HarnessResult<CallOutcome> {
        let data = Value::List(data.iter().map(|b| Value::from(*b)).collect());
        self.session
            .transact_estimated("transfer", &[Value::from(to), Value::from(id), data], 0)
            .await
    }

    /// Grant or revoke `operator` on `id` (or every token when `None`)
    pub async fn approve(&self, operator: &AccountId, id: Option<&Id>, approved: bool) -> HarnessResult<CallOutcome> {
        self.session
            .transact_estimated(
                "approve",
                &[Value::from(operator), Value::from(id.cloned()), Value::from(approved)],
                0,
            )
            .await
    }

    /// Set the mint-end flag
    pub async fn set_mint_end(&self, ended: bool) -> HarnessResult<CallOutcome> {
        self.session
            .transact_estimated("setMintEnd", &[Value::from(ended)], 0)
            .await
    }

    /// Force a sale phase, or return to timestamp-derived phases with `None`
    pub async fn set_minting_status(&self, status: Option<u8>) -> HarnessResult<CallOutcome> {
        self.session
            .transact_estimated("setMintingStatus", &[Value::from(status)], 0)
            .await
    }

    /// Change the per-call mint cap
    pub async fn set_max_mint_amount(&self, amount: u64) -> HarnessResult<CallOutcome> {
        self.session
            .transact_estimated("setMaxMintAmount", &[Value::from(amount)], 0)
            .await
    }

    /// Change the token URI prefix
    pub async fn set_base_uri(&self, uri: &str) -> HarnessResult<CallOutcome> {
        self.session
            .transact_estimated("setBaseUri", &[Value::from(uri)], 0)
            .await
    }
}
