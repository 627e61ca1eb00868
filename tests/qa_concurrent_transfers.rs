use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use bank_ledger::account::{Account, Iban};
use bank_ledger::config::ProcessingConfig;
use bank_ledger::core_types::{AccountId, Amount};
use bank_ledger::locking::LockingConfig;
use bank_ledger::persistence::{
    AccountRepository, InMemoryAccountRepository, InMemoryTransactionRepository,
    TransactionRepository,
};
use bank_ledger::processing::{LoggingErrorNotifier, TransactionProcessingService};
use bank_ledger::transaction::{Transaction, TransactionStatus, TransactionType};

const WAIT: Duration = Duration::from_secs(10);

struct Bank {
    accounts: Arc<InMemoryAccountRepository>,
    transactions: Arc<InMemoryTransactionRepository>,
    service: TransactionProcessingService,
}

/// Account A (id 1) and B (id 2) with different owners, both funded
fn bank(initial: Amount) -> Bank {
    let accounts = Arc::new(InMemoryAccountRepository::new());
    for (id, owner) in [(1, 10), (2, 20)] {
        let mut account = Account::new(id, owner, Iban::generate(owner, 1).unwrap());
        account.deposit(initial).unwrap();
        accounts.insert(account);
    }
    let transactions = Arc::new(InMemoryTransactionRepository::new(accounts.clone()));
    let config = ProcessingConfig {
        workers: 8,
        ..ProcessingConfig::default()
    };
    let service = TransactionProcessingService::start(
        accounts.clone(),
        transactions.clone(),
        // generous budget: contention here is expected, not a failure
        LockingConfig::new(50, 1, 20, 1000),
        &config,
        Arc::new(LoggingErrorNotifier),
    );
    Bank {
        accounts,
        transactions,
        service,
    }
}

impl Bank {
    async fn account(&self, id: AccountId) -> Account {
        self.accounts.get_by_id(id).await.unwrap()
    }

    async fn transfer(&self, from: AccountId, to: AccountId, amount: Amount) -> Transaction {
        let tx = Transaction::transfer(
            TransactionType::TransferInternal,
            self.account(from).await,
            self.account(to).await,
            amount,
            format!("{from}->{to}"),
        )
        .unwrap();
        self.transactions.insert(tx).await.unwrap()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn qa_concurrent_opposite_transfers_conserve_balances() {
    let bank = bank(dec!(1000));

    let mut ids = Vec::new();
    let mut expected_a = dec!(1000);
    for i in 1..=50 {
        let amount = Decimal::from(i);
        let tx = if i % 2 == 0 {
            expected_a -= amount;
            bank.transfer(1, 2, amount).await
        } else {
            expected_a += amount;
            bank.transfer(2, 1, amount).await
        };
        ids.push(tx.id());
    }

    let summary = bank.service.process_all_new().await.unwrap();
    assert_eq!(summary.submitted, 50, "every transfer is valid at dispatch");

    for id in ids {
        let tx = bank.service.await_terminal(id, WAIT).await.unwrap();
        assert_eq!(tx.status(), TransactionStatus::Done, "transaction {id}");
    }

    let a = bank.account(1).await.balance();
    let b = bank.account(2).await.balance();
    assert_eq!(a, expected_a, "no lost update on A");
    assert_eq!(a + b, dec!(2000), "money is neither created nor destroyed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn qa_crossed_pairs_never_deadlock() {
    let bank = bank(dec!(100));
    let processor = bank.service.processor().clone();

    for round in 0..25 {
        let mut t1 = bank.transfer(1, 2, dec!(1)).await;
        let mut t2 = bank.transfer(2, 1, dec!(1)).await;

        let p1 = processor.clone();
        let p2 = processor.clone();
        let both = tokio::time::timeout(WAIT, async move {
            let h1 = tokio::spawn(async move { p1.process_transaction(&mut t1).await });
            let h2 = tokio::spawn(async move { p2.process_transaction(&mut t2).await });
            (h1.await.unwrap(), h2.await.unwrap())
        })
        .await;

        assert_eq!(
            both.unwrap_or_else(|_| panic!("round {round} deadlocked")),
            (TransactionStatus::Done, TransactionStatus::Done)
        );
    }

    assert_eq!(bank.account(1).await.balance(), dec!(100));
    assert_eq!(bank.account(2).await.balance(), dec!(100));
    let locks = processor.lock_manager();
    assert_eq!(locks.acquired_count(), locks.released_count());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn qa_single_account_updates_are_serialized() {
    let bank = bank(dec!(0.01));

    let mut ids = Vec::new();
    for _ in 0..100 {
        let tx = Transaction::deposit(bank.account(1).await, dec!(1), "drip").unwrap();
        ids.push(bank.transactions.insert(tx).await.unwrap().id());
    }
    bank.service.process_all_new().await.unwrap();

    for id in ids {
        let tx = bank.service.await_terminal(id, WAIT).await.unwrap();
        assert_eq!(tx.status(), TransactionStatus::Done);
    }
    assert_eq!(bank.account(1).await.balance(), dec!(100.01));
}
