//! End-to-end ledger scenario through the public library API

use std::sync::Arc;

use memo_credits::ledger::{
    BalanceQueryService, LedgerEngine, LedgerError, LedgerStore, MemoryLedgerStore,
    TransactionKind,
};

fn setup() -> (LedgerEngine, BalanceQueryService) {
    let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedgerStore::new());
    (
        LedgerEngine::new(store.clone()),
        BalanceQueryService::new(store),
    )
}

#[tokio::test]
async fn test_fresh_recharge_deduct_overdraw() {
    let (engine, query) = setup();
    let user = 42;

    assert_eq!(query.get_balance(user).await.unwrap().balance, 0);

    let recharged = engine
        .recharge(user, 100, "tx1", Some("purchase"))
        .await
        .unwrap();
    assert_eq!(recharged.new_balance, 100);

    let deducted = engine.deduct(user, 30, "note 1", Some(1)).await.unwrap();
    assert_eq!(deducted.remaining_balance, 70);

    let err = engine.deduct(user, 1000, "note 2", None).await.unwrap_err();
    match err {
        LedgerError::InsufficientFunds {
            current_balance,
            required_amount,
        } => {
            assert_eq!(current_balance, 70);
            assert_eq!(required_amount, 1000);
        }
        other => panic!("expected InsufficientFunds, got {:?}", other),
    }
    assert_eq!(query.get_balance(user).await.unwrap().balance, 70);

    let dup = engine.recharge(user, 100, "tx1", None).await.unwrap_err();
    assert!(matches!(dup, LedgerError::DuplicateTransaction(_)));
    assert_eq!(query.get_balance(user).await.unwrap().balance, 70);

    let page = query.list_transactions(user, None, None).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.list[0].kind, TransactionKind::Deduct);
    assert_eq!(page.list[0].balance_after, 70);
    assert_eq!(page.list[1].kind, TransactionKind::Recharge);
    assert_eq!(page.list[1].external_transaction_id.as_deref(), Some("tx1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deducts_drain_balance() {
    let (engine, query) = setup();
    let engine = Arc::new(engine);
    engine.recharge(1, 50, "seed", None).await.unwrap();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.deduct(1, 5, &format!("n{}", i), None).await })
        })
        .collect();
    for h in handles {
        h.await.unwrap().unwrap();
    }

    assert_eq!(query.get_balance(1).await.unwrap().balance, 0);
    let page = query.list_transactions(1, Some(1), Some(100)).await.unwrap();
    assert_eq!(page.total, 11);
}
