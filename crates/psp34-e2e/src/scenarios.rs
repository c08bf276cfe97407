//! E2E scenarios for the minimal Shiden34 collection
//!
//! Each test deploys a fresh collection on a fresh [`DevNode`] and drives
//! it only through the harness, the way a suite would drive a live node.

#[cfg(test)]
mod tests {
    use crate::gas;
    use crate::node::{DevNode, FUNDED_BALANCE};
    use psp34_harness::rpc::code;
    use psp34_harness::{
        CallOptions, ConstructorArgs, ContractProfile, EventArgs, HarnessConfig, HarnessError,
        Id, OutcomeAssertions, Psp34, Signer, TestRun, Value,
    };

    const PRICE_PER_MINT: u128 = 1_000_000_000_000_000_000;
    const BASE_URI: &str = "ipfs://tokenUriPrefix/";

    struct Suite {
        run: TestRun,
        node: DevNode,
        nft: Psp34,
        alice: Signer,
        bob: Signer,
    }

    impl Suite {
        async fn setup() -> anyhow::Result<Self> {
            let node = DevNode::new(ContractProfile::minimal())?;
            let run = TestRun::with_transport(HarnessConfig::default(), node.clone()).await?;
            let nft = run
                .deploy_psp34(&ConstructorArgs::default().price(PRICE_PER_MINT))
                .await?;
            let alice = run.deployer_signer()?;
            let bob = run.signer("//Bob")?;
            Ok(Self {
                run,
                node,
                nft,
                alice,
                bob,
            })
        }

        fn as_bob(&self) -> Psp34 {
            self.nft.with_signer(&self.bob)
        }
    }

    // ==================== Collection ====================

    #[tokio::test]
    async fn test_create_collection_works() -> anyhow::Result<()> {
        let suite = Suite::setup().await?;

        assert_eq!(suite.nft.total_supply().await?, 0);
        assert_eq!(suite.nft.owner().await?, suite.alice.account_id());
        assert_eq!(suite.nft.max_supply().await?, 0);
        assert_eq!(suite.nft.price().await?, PRICE_PER_MINT);
        assert_eq!(suite.nft.max_mint_amount().await?, 10);
        assert!(!suite.nft.mint_end().await?);

        let collection = suite.nft.collection_id().await?;
        assert_eq!(collection, Id::Bytes(suite.nft.address().as_bytes().to_vec()));

        let summary = suite.run.teardown();
        assert_eq!(summary.deployments, 1);
        Ok(())
    }

    // ==================== Minting ====================

    #[tokio::test]
    async fn test_mint_next_works() -> anyhow::Result<()> {
        let suite = Suite::setup().await?;
        let bob = suite.bob.account_id();
        let token = Id::U64(1);

        assert_eq!(suite.nft.total_supply().await?, 0);

        let minted = suite.as_bob().mint_next().await?;
        minted.assert_ok()?;
        assert_eq!(minted.gas_required, gas::MINT_NEXT);
        assert!(minted.block_hash.is_some());

        assert_eq!(suite.nft.total_supply().await?, 1);
        assert_eq!(suite.nft.balance_of(&bob).await?, 1);
        assert_eq!(suite.nft.owner_of(&token).await?, Some(bob));
        minted.assert_event(
            "Transfer",
            &EventArgs::new()
                .with("from", Value::Null)
                .with("to", bob)
                .with("id", token),
        )?;

        // payment moved to the contract
        assert_eq!(suite.node.balance_of(&suite.nft.address()), PRICE_PER_MINT);
        assert_eq!(suite.node.balance_of(&bob), FUNDED_BALANCE - PRICE_PER_MINT);
        Ok(())
    }

    #[tokio::test]
    async fn test_cannot_mint_after_mint_end() -> anyhow::Result<()> {
        let suite = Suite::setup().await?;
        assert_eq!(suite.nft.total_supply().await?, 0);

        suite.nft.set_mint_end(true).await?.assert_ok()?;
        assert!(suite.nft.mint_end().await?);

        let dry_run = suite
            .as_bob()
            .session()
            .query_with_value("mintNext", &[], PRICE_PER_MINT)
            .await?;
        let err = dry_run.domain_error().expect("mint should be rejected");
        assert_eq!(err.custom_payload(), Some("0x4d696e74456e64"));
        assert_eq!(err.identifier()?, "MintEnd");

        let rejected = suite.as_bob().mint_next().await?;
        rejected.assert_rejected_with("MintEnd")?;
        assert!(matches!(
            rejected.assert_event("Transfer", &EventArgs::new()),
            Err(HarnessError::EventNotFound { .. })
        ));
        assert_eq!(suite.nft.total_supply().await?, 0);
        // rejected payment stays with the caller
        assert_eq!(suite.node.balance_of(&suite.nft.address()), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_only_owner_ends_mint() -> anyhow::Result<()> {
        let suite = Suite::setup().await?;

        let denied = suite.as_bob().set_mint_end(true).await?;
        denied.assert_rejected_with("O::CallerIsNotOwner")?;
        assert!(!suite.nft.mint_end().await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_cannot_mint_twice() -> anyhow::Result<()> {
        let suite = Suite::setup().await?;
        let bob = suite.bob.account_id();

        assert_eq!(suite.nft.total_supply().await?, 0);
        assert!(!suite.nft.is_account_minted(&bob).await?);

        suite.as_bob().mint_next().await?.assert_ok()?;
        assert!(suite.nft.is_account_minted(&bob).await?);

        let dry_run = suite
            .as_bob()
            .session()
            .query_with_value("mintNext", &[], PRICE_PER_MINT)
            .await?;
        assert_eq!(
            dry_run.domain_error().and_then(|e| e.custom_payload()),
            Some("0x43616e6e6f744d696e744d6f72655468616e4f6e6365")
        );

        let again = suite.as_bob().mint_next().await?;
        again.assert_rejected_with("CannotMintMoreThanOnce")?;
        assert_eq!(suite.nft.total_supply().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_mint_with_wrong_value_rejected() -> anyhow::Result<()> {
        let suite = Suite::setup().await?;

        let underpaid = suite.as_bob().mint_next_paying(PRICE_PER_MINT / 2).await?;
        underpaid.assert_rejected_with("BadMintValue")?;
        assert_eq!(suite.nft.total_supply().await?, 0);
        assert!(!suite.nft.is_account_minted(&suite.bob.account_id()).await?);
        Ok(())
    }

    // ==================== Transfer & Approval ====================

    #[tokio::test]
    async fn test_token_transfer_works() -> anyhow::Result<()> {
        let suite = Suite::setup().await?;
        let (alice, bob) = (suite.alice.account_id(), suite.bob.account_id());

        let minted = suite.as_bob().mint_next().await?;
        let first = suite.nft.token_by_index(0).await??;
        minted.assert_event(
            "Transfer",
            &EventArgs::new()
                .with("from", Value::Null)
                .with("to", bob)
                .with("id", first.clone()),
        )?;

        let moved = suite.as_bob().transfer(&alice, &first, &[]).await?;
        moved.assert_ok()?;

        assert_eq!(suite.nft.owner_of(&first).await?, Some(alice));
        assert_eq!(suite.nft.balance_of(&bob).await?, 0);
        assert_eq!(suite.nft.balance_of(&alice).await?, 1);
        moved.assert_event(
            "Transfer",
            &EventArgs::new()
                .with("from", bob)
                .with("to", alice)
                .with("id", first),
        )?;
        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_of_missing_token_rejected() -> anyhow::Result<()> {
        let suite = Suite::setup().await?;

        let outcome = suite
            .as_bob()
            .transfer(&suite.alice.account_id(), &Id::U64(42), &[])
            .await?;
        outcome.assert_rejected_with("TokenNotExists")?;
        Ok(())
    }

    #[tokio::test]
    async fn test_token_approval_works() -> anyhow::Result<()> {
        let suite = Suite::setup().await?;
        let (alice, bob) = (suite.alice.account_id(), suite.bob.account_id());

        suite.as_bob().mint_next().await?.assert_ok()?;
        let first = suite.nft.token_by_index(0).await??;

        let approved = suite.as_bob().approve(&alice, Some(&first), true).await?;
        approved.assert_ok()?;

        assert_eq!(suite.nft.owner_of(&first).await?, Some(bob));
        assert!(suite.nft.allowance(&bob, &alice, Some(&first)).await?);
        approved.assert_event(
            "Approval",
            &EventArgs::new()
                .with("from", bob)
                .with("to", alice)
                .with("id", first.clone())
                .with("approved", true),
        )?;

        // the operator can now move it
        let moved = suite.nft.transfer(&alice, &first, &[]).await?;
        moved.assert_ok()?;
        assert_eq!(suite.nft.owner_of(&first).await?, Some(alice));
        assert!(!suite.nft.allowance(&bob, &alice, Some(&first)).await?);
        Ok(())
    }

    // ==================== Metadata ====================

    #[tokio::test]
    async fn test_token_uri() -> anyhow::Result<()> {
        let suite = Suite::setup().await?;

        let missing = suite.nft.token_uri(1).await?;
        assert_eq!(missing.unwrap_err().identifier()?, "TokenNotExists");

        suite.as_bob().mint_next().await?.assert_ok()?;
        assert_eq!(suite.nft.token_uri(1).await?.unwrap(), format!("{}1.json", BASE_URI));

        suite.nft.set_base_uri("ipfs://moved/").await?.assert_ok()?;
        assert_eq!(suite.nft.token_uri(1).await?.unwrap(), "ipfs://moved/1.json");
        Ok(())
    }

    // ==================== Budgets ====================

    #[tokio::test]
    async fn test_node_rejects_short_budget() -> anyhow::Result<()> {
        let suite = Suite::setup().await?;
        let bob = suite.bob.account_id();
        let before = suite.node.nonce(&bob);

        // no prior dry run, so the node is the one to refuse
        let result = suite
            .as_bob()
            .session()
            .transact(
                "mintNext",
                &[],
                CallOptions::with_gas_limit(gas::MINT_NEXT - 1).value(PRICE_PER_MINT),
            )
            .await;
        match result {
            Err(HarnessError::InsufficientBudget {
                required, provided, ..
            }) => {
                assert_eq!(required, gas::MINT_NEXT);
                assert_eq!(provided, gas::MINT_NEXT - 1);
            }
            other => panic!("expected InsufficientBudget, got {:?}", other),
        }
        assert_eq!(suite.node.nonce(&bob), before + 1);
        assert_eq!(suite.nft.total_supply().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unfunded_account_cannot_pay() -> anyhow::Result<()> {
        let suite = Suite::setup().await?;
        let stranger = Signer::random();
        let account = stranger.account_id();
        assert_eq!(suite.node.balance_of(&account), 0);
        let block = suite.node.block_number();

        // the dry run passes; the node refuses the signed payment
        let result = suite.nft.with_signer(&stranger).mint_next().await;
        assert!(matches!(
            result,
            Err(HarnessError::Rpc {
                code: code::INVALID_TRANSACTION,
                ..
            })
        ));
        assert_eq!(suite.node.nonce(&account), 0);
        assert_eq!(suite.node.block_number(), block);
        assert_eq!(suite.nft.total_supply().await?, 0);

        suite.node.fund(&account, PRICE_PER_MINT);
        suite.nft.with_signer(&stranger).mint_next().await?.assert_ok()?;
        assert_eq!(suite.nft.balance_of(&account).await?, 1);
        assert_eq!(suite.node.balance_of(&account), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_message_never_reaches_node() -> anyhow::Result<()> {
        let suite = Suite::setup().await?;
        let before = suite.run.connection().request_count();

        let result = suite.nft.session().query("getMintingStatus", &[]).await;
        assert!(matches!(result, Err(HarnessError::Abi(_))));
        assert_eq!(suite.run.connection().request_count(), before);
        Ok(())
    }
}
