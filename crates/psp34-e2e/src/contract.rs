//! PSP34 contract double
//!
//! An enumerable PSP34 collection with owner-gated settings and one of
//! three mint gates, selected by the [`ContractProfile`] it was
//! instantiated under. Messages take and return harness [`Value`]s so the
//! node can serve them without a codec of its own.

use psp34_harness::config::{ConstructorSchema, ContractProfile, ErrorIdentifiers, MintPhaseModel};
use psp34_harness::rpc::RawEvent;
use psp34_harness::{error_decoder, ContractError, Value};
use psp34_primitives::{AccountId, Balance, Id, Timestamp};
use std::collections::{BTreeMap, BTreeSet};

use crate::{DevNodeError, NodeResult};

/// Per-call mint cap a fresh collection starts with
pub const DEFAULT_MAX_MINT_AMOUNT: u64 = 10;

/// Rejection returned by a fallible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Psp34Error {
    /// Collection-specific error carrying its identifier
    Custom(String),
    /// No such token
    TokenNotExists,
    /// Caller is neither owner nor approved
    NotApproved,
    /// Owner tried to approve itself
    SelfApprove,
}

impl Psp34Error {
    /// Wire form, with custom identifiers hex-encoded
    pub fn to_contract_error(&self) -> ContractError {
        match self {
            Psp34Error::Custom(identifier) => ContractError::Custom(error_decoder::encode(identifier)),
            Psp34Error::TokenNotExists => ContractError::Standard("TokenNotExists".to_string()),
            Psp34Error::NotApproved => ContractError::Standard("NotApproved".to_string()),
            Psp34Error::SelfApprove => ContractError::Standard("SelfApprove".to_string()),
        }
    }
}

/// Sale phase of a launchpad collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintingStatus {
    /// Before any sale
    Closed,
    /// Whitelisted pre-presale
    Prepresale,
    /// Whitelisted presale
    Presale,
    /// Open to everyone
    Public,
    /// Sale over or sold out
    End,
}

impl MintingStatus {
    /// Status for a forced index; unknown indices read as closed
    pub fn from_index(index: u8) -> Self {
        match index {
            1 => MintingStatus::Prepresale,
            2 => MintingStatus::Presale,
            3 => MintingStatus::Public,
            4 => MintingStatus::End,
            _ => MintingStatus::Closed,
        }
    }

    /// Name returned by `getMintingStatus`
    pub fn as_str(&self) -> &'static str {
        match self {
            MintingStatus::Closed => "closed",
            MintingStatus::Prepresale => "prepresale",
            MintingStatus::Presale => "presale",
            MintingStatus::Public => "public",
            MintingStatus::End => "end",
        }
    }
}

/// Call environment supplied by the node
#[derive(Debug, Clone, Copy)]
pub struct ExecContext {
    /// Contract address
    pub contract: AccountId,
    /// Message origin
    pub caller: AccountId,
    /// Attached value
    pub value: Balance,
    /// Block timestamp in milliseconds
    pub now: Timestamp,
}

/// What a message returned
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Plain value, no result envelope
    Plain(Value),
    /// `Result`-returning message
    Fallible(Result<Value, Psp34Error>),
}

impl Reply {
    /// False when a fallible message returned `Err`
    pub fn is_success(&self) -> bool {
        !matches!(self, Reply::Fallible(Err(_)))
    }

    /// Render without the dispatch envelope
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Reply::Plain(value) => value.to_json(),
            Reply::Fallible(Ok(value)) => serde_json::json!({ "ok": value.to_json() }),
            Reply::Fallible(Err(err)) => {
                serde_json::json!({ "err": err.to_contract_error().to_json() })
            }
        }
    }
}

/// Result of one message execution
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    /// Return value
    pub reply: Reply,
    /// Events emitted during the call
    pub events: Vec<RawEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Phases {
    prepresale_start_at: Timestamp,
    presale_start_at: Timestamp,
    public_sale_start_at: Timestamp,
    public_sale_end_at: Timestamp,
}

/// In-memory PSP34 collection
#[derive(Debug, Clone)]
pub struct Psp34Double {
    minting: MintPhaseModel,
    errors: ErrorIdentifiers,
    owner: AccountId,
    base_uri: String,
    max_supply: u64,
    price_per_mint: Balance,
    max_amount: u64,
    next_id: u64,
    // Mint order; enumeration follows it
    tokens: Vec<(Id, AccountId)>,
    approvals: BTreeSet<(AccountId, AccountId, Option<Id>)>,
    mint_end: bool,
    minted: BTreeSet<AccountId>,
    forced_status: Option<u8>,
    phases: Option<Phases>,
    events: Vec<RawEvent>,
}

/// Positional arguments of one call
struct Args<'a> {
    message: &'a str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    fn new(message: &'a str, values: &'a [Value], arity: usize) -> NodeResult<Self> {
        if values.len() != arity {
            return Err(DevNodeError::Trapped(format!(
                "{} expects {} arguments, got {}",
                message,
                arity,
                values.len()
            )));
        }
        Ok(Self { message, values })
    }

    fn undecodable(&self, index: usize) -> DevNodeError {
        DevNodeError::Trapped(format!(
            "could not decode argument {} of {}",
            index, self.message
        ))
    }

    fn get(&self, index: usize) -> NodeResult<&Value> {
        self.values.get(index).ok_or_else(|| self.undecodable(index))
    }

    fn account(&self, index: usize) -> NodeResult<AccountId> {
        self.get(index)?.as_account().map_err(|_| self.undecodable(index))
    }

    fn id(&self, index: usize) -> NodeResult<Id> {
        self.get(index)?.as_id().cloned().ok_or_else(|| self.undecodable(index))
    }

    fn optional_id(&self, index: usize) -> NodeResult<Option<Id>> {
        match self.get(index)? {
            Value::Null => Ok(None),
            _ => self.id(index).map(Some),
        }
    }

    fn u64(&self, index: usize) -> NodeResult<u64> {
        self.get(index)?.as_u64().ok_or_else(|| self.undecodable(index))
    }

    fn u128(&self, index: usize) -> NodeResult<u128> {
        self.get(index)?.as_u128().ok_or_else(|| self.undecodable(index))
    }

    fn bool(&self, index: usize) -> NodeResult<bool> {
        self.get(index)?.as_bool().ok_or_else(|| self.undecodable(index))
    }

    fn string(&self, index: usize) -> NodeResult<String> {
        self.get(index)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.undecodable(index))
    }

    fn optional_u8(&self, index: usize) -> NodeResult<Option<u8>> {
        match self.get(index)? {
            Value::Null => Ok(None),
            value => value
                .as_u64()
                .and_then(|v| u8::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| self.undecodable(index)),
        }
    }

    fn bytes(&self, index: usize) -> NodeResult<Vec<u8>> {
        match self.get(index)? {
            Value::List(items) => items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .ok_or_else(|| self.undecodable(index)),
            _ => Err(self.undecodable(index)),
        }
    }
}

fn transfer_event(from: Option<AccountId>, to: Option<AccountId>, id: &Id) -> RawEvent {
    let mut args = serde_json::Map::new();
    args.insert("from".to_string(), Value::from(from).to_json());
    args.insert("to".to_string(), Value::from(to).to_json());
    args.insert("id".to_string(), Value::from(id).to_json());
    RawEvent {
        name: "Transfer".to_string(),
        args,
    }
}

fn approval_event(from: AccountId, to: AccountId, id: Option<Id>, approved: bool) -> RawEvent {
    let mut args = serde_json::Map::new();
    args.insert("from".to_string(), Value::from(from).to_json());
    args.insert("to".to_string(), Value::from(to).to_json());
    args.insert("id".to_string(), Value::from(id).to_json());
    args.insert("approved".to_string(), Value::from(approved).to_json());
    RawEvent {
        name: "Approval".to_string(),
        args,
    }
}

impl Psp34Double {
    /// Run the constructor for `profile` with arguments in schema order
    pub fn instantiate(profile: &ContractProfile, owner: AccountId, args: &[Value]) -> NodeResult<Self> {
        let fields = profile.constructor.fields();
        let args = Args::new("new", args, fields.len())?;
        let field = |name: &str| {
            fields
                .iter()
                .position(|f| *f == name)
                .ok_or_else(|| DevNodeError::Trapped(format!("constructor has no field {}", name)))
        };

        let base_uri = args.string(field("base_uri")?)?;
        let price_per_mint = args.u128(field("price_per_mint")?)?;
        let max_supply = match profile.constructor {
            ConstructorSchema::Minimal => 0,
            _ => args.u64(field("max_supply")?)?,
        };
        let phases = match profile.constructor {
            ConstructorSchema::Launchpad => {
                let refund_periods = args.get(field("refund_periods")?)?;
                let refund_shares = args.get(field("refund_shares")?)?;
                match (refund_periods, refund_shares) {
                    (Value::List(periods), Value::List(shares)) if periods.len() == shares.len() => {}
                    _ => return Err(DevNodeError::Trapped("refund terms do not align".to_string())),
                }
                args.account(field("project_account_id")?)?;
                args.account(field("refund_address")?)?;
                Some(Phases {
                    prepresale_start_at: args.u64(field("prepresale_start_at")?)?,
                    presale_start_at: args.u64(field("presale_start_at")?)?,
                    public_sale_start_at: args.u64(field("public_sale_start_at")?)?,
                    public_sale_end_at: args.u64(field("public_sale_end_at")?)?,
                })
            }
            _ => None,
        };
        args.string(field("name")?)?;
        args.string(field("symbol")?)?;

        Ok(Self {
            minting: profile.minting,
            errors: profile.errors.clone(),
            owner,
            base_uri,
            max_supply,
            price_per_mint,
            max_amount: DEFAULT_MAX_MINT_AMOUNT,
            next_id: 1,
            tokens: Vec::new(),
            approvals: BTreeSet::new(),
            mint_end: false,
            minted: BTreeSet::new(),
            forced_status: None,
            phases,
            events: Vec::new(),
        })
    }

    /// Contract owner
    pub fn owner(&self) -> AccountId {
        self.owner
    }

    /// Number of minted tokens
    pub fn total_supply(&self) -> usize {
        self.tokens.len()
    }

    /// Current sale phase at `now`
    pub fn minting_status(&self, now: Timestamp) -> MintingStatus {
        if let Some(index) = self.forced_status {
            return MintingStatus::from_index(index);
        }
        let Some(phases) = &self.phases else {
            return MintingStatus::Public;
        };
        let sold_out = self.max_supply > 0 && self.tokens.len() as u64 >= self.max_supply;
        if now > phases.public_sale_end_at || sold_out {
            MintingStatus::End
        } else if now > phases.public_sale_start_at {
            MintingStatus::Public
        } else if now > phases.presale_start_at {
            MintingStatus::Presale
        } else if now > phases.prepresale_start_at {
            MintingStatus::Prepresale
        } else {
            MintingStatus::Closed
        }
    }

    /// Dispatch `message`
    ///
    /// Traps on unknown messages and undecodable input. Events are only
    /// meaningful when the reply is a success.
    pub fn call(&mut self, ctx: &ExecContext, message: &str, values: &[Value]) -> NodeResult<Execution> {
        self.events.clear();
        let reply = self.dispatch(ctx, message, values)?;
        Ok(Execution {
            reply,
            events: std::mem::take(&mut self.events),
        })
    }

    fn dispatch(&mut self, ctx: &ExecContext, message: &str, values: &[Value]) -> NodeResult<Reply> {
        let plain = |v: Value| -> NodeResult<Reply> { Ok(Reply::Plain(v)) };
        match message {
            "collectionId" => {
                Args::new(message, values, 0)?;
                plain(Value::Id(Id::Bytes(ctx.contract.as_bytes().to_vec())))
            }
            "totalSupply" => {
                Args::new(message, values, 0)?;
                plain(Value::wrapped(self.tokens.len() as u128))
            }
            "balanceOf" => {
                let owner = Args::new(message, values, 1)?.account(0)?;
                plain(Value::from(self.balance_of(&owner)))
            }
            "ownerOf" => {
                let id = Args::new(message, values, 1)?.id(0)?;
                plain(Value::from(self.owner_of(&id)))
            }
            "allowance" => {
                let args = Args::new(message, values, 3)?;
                let allowed = self.allowance(&args.account(0)?, &args.account(1)?, args.optional_id(2)?.as_ref());
                plain(Value::from(allowed))
            }
            "transfer" => {
                let args = Args::new(message, values, 3)?;
                let (to, id) = (args.account(0)?, args.id(1)?);
                args.bytes(2)?;
                Ok(Reply::Fallible(self.transfer(ctx.caller, to, id)))
            }
            "approve" => {
                let args = Args::new(message, values, 3)?;
                let (operator, id, approved) = (args.account(0)?, args.optional_id(1)?, args.bool(2)?);
                Ok(Reply::Fallible(self.approve(ctx.caller, operator, id, approved)))
            }
            "tokenByIndex" => {
                let index = Args::new(message, values, 1)?.u128(0)?;
                let id = usize::try_from(index)
                    .ok()
                    .and_then(|i| self.tokens.get(i))
                    .map(|(id, _)| Value::Id(id.clone()))
                    .ok_or(Psp34Error::TokenNotExists);
                Ok(Reply::Fallible(id))
            }
            "ownersTokenByIndex" => {
                let args = Args::new(message, values, 2)?;
                let (owner, index) = (args.account(0)?, args.u128(1)?);
                let id = usize::try_from(index)
                    .ok()
                    .and_then(|i| self.tokens.iter().filter(|(_, o)| *o == owner).nth(i))
                    .map(|(id, _)| Value::Id(id.clone()))
                    .ok_or(Psp34Error::TokenNotExists);
                Ok(Reply::Fallible(id))
            }
            "owner" => {
                Args::new(message, values, 0)?;
                plain(Value::from(self.owner))
            }
            "maxSupply" => {
                Args::new(message, values, 0)?;
                plain(Value::wrapped(self.max_supply))
            }
            "price" => {
                Args::new(message, values, 0)?;
                plain(Value::wrapped(self.price_per_mint))
            }
            "tokenUri" => {
                let id = Args::new(message, values, 1)?.u64(0)?;
                let uri = match self.owner_of(&Id::U64(id)) {
                    Some(_) => Ok(Value::from(format!("{}{}.json", self.base_uri, id))),
                    None => Err(Psp34Error::TokenNotExists),
                };
                Ok(Reply::Fallible(uri))
            }
            "getMaxMintAmount" => {
                Args::new(message, values, 0)?;
                plain(Value::wrapped(self.max_amount))
            }
            "setBaseUri" => {
                let uri = Args::new(message, values, 1)?.string(0)?;
                Ok(Reply::Fallible(self.only_owner(ctx).map(|()| {
                    self.base_uri = uri;
                    Value::Null
                })))
            }
            "setMaxMintAmount" => {
                let amount = Args::new(message, values, 1)?.u64(0)?;
                Ok(Reply::Fallible(self.only_owner(ctx).map(|()| {
                    self.max_amount = amount;
                    Value::Null
                })))
            }
            "mintNext" => {
                Args::new(message, values, 0)?;
                Ok(Reply::Fallible(self.mint(ctx, ctx.caller, 1)))
            }
            "mint" => {
                let args = Args::new(message, values, 2)?;
                let (to, count) = (args.account(0)?, args.u64(1)?);
                Ok(Reply::Fallible(self.mint(ctx, to, count)))
            }
            "setMintEnd" if self.minting == MintPhaseModel::MintEndFlag => {
                let ended = Args::new(message, values, 1)?.bool(0)?;
                Ok(Reply::Fallible(self.only_owner(ctx).map(|()| {
                    self.mint_end = ended;
                    Value::Null
                })))
            }
            "getMintEnd" if self.minting == MintPhaseModel::MintEndFlag => {
                Args::new(message, values, 0)?;
                plain(Value::from(self.mint_end))
            }
            "getIsAccountMinted" if self.minting == MintPhaseModel::MintEndFlag => {
                let account = Args::new(message, values, 1)?.account(0)?;
                plain(Value::from(self.minted.contains(&account)))
            }
            "setMintingStatus" if self.minting == MintPhaseModel::StatusEnum => {
                let status = Args::new(message, values, 1)?.optional_u8(0)?;
                Ok(Reply::Fallible(self.only_owner(ctx).map(|()| {
                    self.forced_status = status;
                    Value::Null
                })))
            }
            "getMintingStatus" if self.minting == MintPhaseModel::StatusEnum => {
                Args::new(message, values, 0)?;
                plain(Value::from(self.minting_status(ctx.now).as_str()))
            }
            other => Err(DevNodeError::Trapped(format!("unknown message {}", other))),
        }
    }

    fn custom(identifier: &str) -> Psp34Error {
        Psp34Error::Custom(identifier.to_string())
    }

    fn only_owner(&self, ctx: &ExecContext) -> Result<(), Psp34Error> {
        if ctx.caller == self.owner {
            Ok(())
        } else {
            Err(Self::custom(&self.errors.not_owner))
        }
    }

    fn balance_of(&self, owner: &AccountId) -> u32 {
        self.tokens.iter().filter(|(_, o)| o == owner).count() as u32
    }

    fn owner_of(&self, id: &Id) -> Option<AccountId> {
        self.tokens.iter().find(|(t, _)| t == id).map(|(_, owner)| *owner)
    }

    fn allowance(&self, owner: &AccountId, operator: &AccountId, id: Option<&Id>) -> bool {
        self.approvals.contains(&(*owner, *operator, None))
            || id.is_some_and(|id| self.approvals.contains(&(*owner, *operator, Some(id.clone()))))
    }

    fn mint(&mut self, ctx: &ExecContext, to: AccountId, count: u64) -> Result<Value, Psp34Error> {
        if count == 0 {
            return Err(Self::custom("CannotMintZeroTokens"));
        }
        if count > self.max_amount {
            return Err(Self::custom("TooManyTokensToMint"));
        }
        if self.max_supply > 0 && (self.tokens.len() as u64).saturating_add(count) > self.max_supply {
            return Err(Self::custom(&self.errors.collection_full));
        }

        match self.minting {
            MintPhaseModel::Open => {}
            MintPhaseModel::MintEndFlag => {
                if self.mint_end {
                    return Err(Self::custom(&self.errors.mint_ended));
                }
                if self.minted.contains(&ctx.caller) {
                    return Err(Self::custom(&self.errors.duplicate_mint));
                }
            }
            MintPhaseModel::StatusEnum => {
                if self.minting_status(ctx.now) != MintingStatus::Public {
                    return Err(Self::custom(&self.errors.phase_closed));
                }
            }
        }

        match self.price_per_mint.checked_mul(count as u128) {
            Some(expected) if expected == ctx.value => {}
            _ => return Err(Self::custom(&self.errors.bad_mint_value)),
        }

        for _ in 0..count {
            let id = Id::U64(self.next_id);
            self.next_id += 1;
            self.events.push(transfer_event(None, Some(to), &id));
            self.tokens.push((id, to));
        }
        if self.minting == MintPhaseModel::MintEndFlag {
            self.minted.insert(ctx.caller);
        }
        Ok(Value::Null)
    }

    fn transfer(&mut self, caller: AccountId, to: AccountId, id: Id) -> Result<Value, Psp34Error> {
        let owner = self.owner_of(&id).ok_or(Psp34Error::TokenNotExists)?;
        if owner != caller && !self.allowance(&owner, &caller, Some(&id)) {
            return Err(Psp34Error::NotApproved);
        }

        self.approvals
            .retain(|(from, _, token)| !(*from == owner && token.as_ref() == Some(&id)));
        if let Some(entry) = self.tokens.iter_mut().find(|(t, _)| *t == id) {
            entry.1 = to;
        }
        self.events.push(transfer_event(Some(owner), Some(to), &id));
        Ok(Value::Null)
    }

    fn approve(
        &mut self,
        caller: AccountId,
        operator: AccountId,
        id: Option<Id>,
        approved: bool,
    ) -> Result<Value, Psp34Error> {
        let mut from = caller;
        if let Some(id) = &id {
            let owner = self.owner_of(id).ok_or(Psp34Error::TokenNotExists)?;
            if approved && owner == operator {
                return Err(Psp34Error::SelfApprove);
            }
            if owner != caller && !self.allowance(&owner, &caller, None) {
                return Err(Psp34Error::NotApproved);
            }
            from = owner;
        }

        if approved {
            self.approvals.insert((from, operator, id.clone()));
        } else {
            self.approvals.remove(&(from, operator, id.clone()));
        }
        self.events.push(approval_event(from, operator, id, approved));
        Ok(Value::Null)
    }
}

/// Contract state indexed by address
pub type ContractStore = BTreeMap<AccountId, Psp34Double>;

#[cfg(test)]
mod tests {
    use super::*;

    fn account(byte: u8) -> AccountId {
        AccountId::from_bytes([byte; 32])
    }

    fn ctx(caller: AccountId, value: Balance) -> ExecContext {
        ExecContext {
            contract: account(0xCC),
            caller,
            value,
            now: 1_000,
        }
    }

    fn minimal(price: Balance) -> Psp34Double {
        let args = [
            Value::from("Shiden34"),
            Value::from("SH34"),
            Value::from("ipfs://tokenUriPrefix/"),
            Value::from(price),
        ];
        Psp34Double::instantiate(&ContractProfile::minimal(), account(1), &args).unwrap()
    }

    fn fallible(execution: Execution) -> Result<Value, Psp34Error> {
        match execution.reply {
            Reply::Fallible(result) => result,
            Reply::Plain(v) => panic!("expected fallible reply, got {}", v),
        }
    }

    #[test]
    fn test_mint_checks_run_in_order() {
        let mut nft = minimal(10);
        let bob = account(2);

        let err = fallible(nft.call(&ctx(bob, 10), "mint", &[Value::from(bob), Value::from(0u64)]).unwrap());
        assert_eq!(err, Err(Psp34Error::Custom("CannotMintZeroTokens".into())));

        let err = fallible(nft.call(&ctx(bob, 110), "mint", &[Value::from(bob), Value::from(11u64)]).unwrap());
        assert_eq!(err, Err(Psp34Error::Custom("TooManyTokensToMint".into())));

        let err = fallible(nft.call(&ctx(bob, 5), "mintNext", &[]).unwrap());
        assert_eq!(err, Err(Psp34Error::Custom("BadMintValue".into())));

        let ok = nft.call(&ctx(bob, 30), "mint", &[Value::from(bob), Value::from(3u64)]).unwrap();
        assert!(ok.reply.is_success());
        assert_eq!(ok.events.len(), 3);
        assert_eq!(nft.total_supply(), 3);
    }

    #[test]
    fn test_mint_end_and_duplicate_mint() {
        let mut nft = minimal(0);
        let (alice, bob) = (account(1), account(2));

        assert!(nft.call(&ctx(bob, 0), "mintNext", &[]).unwrap().reply.is_success());
        let again = fallible(nft.call(&ctx(bob, 0), "mintNext", &[]).unwrap());
        assert_eq!(again, Err(Psp34Error::Custom("CannotMintMoreThanOnce".into())));

        let denied = fallible(nft.call(&ctx(bob, 0), "setMintEnd", &[Value::from(true)]).unwrap());
        assert_eq!(denied, Err(Psp34Error::Custom("O::CallerIsNotOwner".into())));

        nft.call(&ctx(alice, 0), "setMintEnd", &[Value::from(true)]).unwrap();
        let ended = fallible(nft.call(&ctx(account(3), 0), "mintNext", &[]).unwrap());
        assert_eq!(ended, Err(Psp34Error::Custom("MintEnd".into())));
    }

    #[test]
    fn test_transfer_requires_approval() {
        let mut nft = minimal(0);
        let (alice, bob, charlie) = (account(1), account(2), account(3));
        nft.call(&ctx(bob, 0), "mintNext", &[]).unwrap();
        let token = Value::Id(Id::U64(1));

        let stolen = fallible(
            nft.call(&ctx(charlie, 0), "transfer", &[Value::from(charlie), token.clone(), Value::List(vec![])])
                .unwrap(),
        );
        assert_eq!(stolen, Err(Psp34Error::NotApproved));

        nft.call(&ctx(bob, 0), "approve", &[Value::from(charlie), token.clone(), Value::from(true)])
            .unwrap();
        let moved = nft
            .call(&ctx(charlie, 0), "transfer", &[Value::from(alice), token.clone(), Value::List(vec![])])
            .unwrap();
        assert!(moved.reply.is_success());
        assert_eq!(nft.owner_of(&Id::U64(1)), Some(alice));
        // per-token approval is consumed by the transfer
        assert!(!nft.allowance(&bob, &charlie, Some(&Id::U64(1))));
    }

    #[test]
    fn test_self_approve_rejected() {
        let mut nft = minimal(0);
        let bob = account(2);
        nft.call(&ctx(bob, 0), "mintNext", &[]).unwrap();
        let result = fallible(
            nft.call(&ctx(bob, 0), "approve", &[Value::from(bob), Value::Id(Id::U64(1)), Value::from(true)])
                .unwrap(),
        );
        assert_eq!(result, Err(Psp34Error::SelfApprove));
    }

    #[test]
    fn test_unknown_message_traps() {
        let mut nft = minimal(0);
        assert!(matches!(
            nft.call(&ctx(account(2), 0), "getMintingStatus", &[]),
            Err(DevNodeError::Trapped(_))
        ));
        assert!(matches!(
            nft.call(&ctx(account(2), 0), "balanceOf", &[]),
            Err(DevNodeError::Trapped(_))
        ));
    }

    #[test]
    fn test_status_from_timestamps() {
        let owner = account(1);
        let mut args = vec![
            Value::from("Shiden34"),
            Value::from("SH34"),
            Value::from("ipfs://x/"),
            Value::from(2u64),
            Value::from(1u128),
            Value::from(owner),
            Value::from(100u64),
            Value::from(200u64),
            Value::from(300u64),
            Value::from(400u64),
            Value::List(vec![]),
            Value::List(vec![]),
            Value::from(owner),
        ];
        let nft = Psp34Double::instantiate(&ContractProfile::launchpad(), owner, &args).unwrap();
        assert_eq!(nft.minting_status(50), MintingStatus::Closed);
        assert_eq!(nft.minting_status(150), MintingStatus::Prepresale);
        assert_eq!(nft.minting_status(250), MintingStatus::Presale);
        assert_eq!(nft.minting_status(350), MintingStatus::Public);
        assert_eq!(nft.minting_status(450), MintingStatus::End);

        args[10] = Value::List(vec![Value::from(1u64)]);
        assert!(Psp34Double::instantiate(&ContractProfile::launchpad(), owner, &args).is_err());
    }

    #[test]
    fn test_custom_error_wire_form() {
        let err = Psp34Error::Custom("MintEnd".into()).to_contract_error();
        assert_eq!(err.custom_payload(), Some("0x4d696e74456e64"));
        assert_eq!(
            Psp34Error::TokenNotExists.to_contract_error().to_json(),
            serde_json::json!({ "tokenNotExists": null })
        );
    }
}
