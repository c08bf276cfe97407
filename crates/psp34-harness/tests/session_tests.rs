//! Session integration tests for psp34-harness
//!
//! Drives the typed PSP34 facade against a scripted transport and checks
//! what goes over the wire.

use psp34_harness::rpc::method;
use psp34_harness::{
    AccountId, CallOptions, ConstructorArgs, ContractProfile, EventArgs, HarnessConfig,
    HarnessError, Id, MockTransport, OutcomeAssertions, TestRun, H256,
};
use serde_json::json;

const CONTRACT: [u8; 32] = [0xc0; 32];

fn instantiated() -> serde_json::Value {
    json!({
        "address": AccountId::from_bytes(CONTRACT).to_hex(),
        "gasConsumed": 1000,
        "events": [],
        "blockHash": H256::ZERO.to_hex(),
    })
}

fn dry_run(result: serde_json::Value, gas: u64) -> serde_json::Value {
    json!({ "result": result, "gasRequired": gas, "gasConsumed": gas })
}

async fn run_with(mock: &MockTransport, profile: ContractProfile) -> TestRun {
    mock.set_default(method::INSTANTIATE, instantiated());
    let config = HarnessConfig {
        profile,
        ..HarnessConfig::default()
    };
    TestRun::with_transport(config, mock.clone()).await.unwrap()
}

// ==================== Mint Flow ====================

#[tokio::test]
async fn test_mint_next_budgets_twice_the_estimate() -> anyhow::Result<()> {
    let mock = MockTransport::new();
    let run = run_with(&mock, ContractProfile::minimal()).await;
    let nft = run.deploy_psp34(&ConstructorArgs::default()).await?;
    let bob = run.signer("//Bob")?;

    mock.push_response(method::CALL, dry_run(json!({ "rawNumber": "1000" }), 50));
    mock.push_response(method::CALL, dry_run(json!({ "ok": null }), 400));
    mock.push_response(
        method::SUBMIT_AND_WATCH,
        json!({
            "result": { "ok": null },
            "gasConsumed": 380,
            "events": [{
                "name": "Transfer",
                "args": { "from": null, "to": bob.address(), "id": { "u64": 1 } },
            }],
            "blockHash": H256::from_bytes([1u8; 32]).to_hex(),
        }),
    );

    let outcome = nft.with_signer(&bob).mint_next().await?;
    outcome.assert_event(
        "Transfer",
        &EventArgs::new()
            .with("from", None::<Id>)
            .with("to", bob.address())
            .with("id", Id::U64(1)),
    )?;
    assert_eq!(outcome.gas_required, 400);

    let submit = mock
        .requests()
        .into_iter()
        .find(|r| r.method == method::SUBMIT_AND_WATCH)
        .expect("submitted");
    let call = &submit.params[0]["call"];
    assert_eq!(call["gasLimit"], 800);
    assert_eq!(call["value"], "1000");
    assert_eq!(call["origin"], bob.address());
    Ok(())
}

#[tokio::test]
async fn test_explicit_profile_unwraps_dispatch_envelope() -> anyhow::Result<()> {
    let mock = MockTransport::new();
    let run = run_with(&mock, ContractProfile::launchpad()).await;
    let args = ConstructorArgs::default().accounts(
        run.signer("//Charlie")?.account_id(),
        run.signer("//Dave")?.account_id(),
    );
    let nft = run.deploy_psp34(&args).await?;

    mock.push_response(method::CALL, dry_run(json!({ "ok": { "rawNumber": "7" } }), 10));
    assert_eq!(nft.total_supply().await?, 7);

    mock.push_response(
        method::CALL,
        dry_run(json!({ "ok": { "err": { "tokenNotExists": null } } }), 10),
    );
    let missing = nft.token_by_index(99).await?;
    assert_eq!(missing.unwrap_err().identifier()?, "TokenNotExists");

    mock.push_response(method::CALL, dry_run(json!({ "err": { "module": 8 } }), 10));
    assert!(matches!(
        nft.total_supply().await,
        Err(HarnessError::MalformedResponse(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_owner_of_unminted_is_none() -> anyhow::Result<()> {
    let mock = MockTransport::new();
    let run = run_with(&mock, ContractProfile::minimal()).await;
    let nft = run.deploy_psp34(&ConstructorArgs::default()).await?;

    mock.push_response(method::CALL, dry_run(json!(null), 10));
    assert_eq!(nft.owner_of(&Id::U64(1)).await?, None);
    Ok(())
}

// ==================== Budget Handling ====================

#[tokio::test]
async fn test_underbudget_transaction_never_leaves_harness() -> anyhow::Result<()> {
    let mock = MockTransport::new();
    let run = run_with(&mock, ContractProfile::minimal()).await;
    let session = run.deploy(&ConstructorArgs::default()).await?;

    mock.push_response(method::CALL, dry_run(json!({ "ok": null }), 1_000));
    let estimate = session.query("setMintEnd", &[true.into()]).await?;

    let result = session
        .transact(
            "setMintEnd",
            &[true.into()],
            CallOptions::with_gas_limit(estimate.gas_required - 1),
        )
        .await;
    assert!(matches!(result, Err(HarnessError::InsufficientBudget { .. })));
    assert_eq!(mock.count(method::SUBMIT_AND_WATCH), 0);

    let summary = run.teardown();
    assert_eq!(summary.deployments, 1);
    Ok(())
}
