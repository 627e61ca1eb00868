//! Bank Ledger demo runner
//!
//! Wires the processing engine over the in-memory stores, seeds a few
//! accounts, dispatches one batch and prints the resulting balances.
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│  Service  │───▶│ Workers  │───▶│ Balances │
//! │  (YAML)  │    │(validate) │    │(lock+run)│    │  (log)   │
//! └──────────┘    └───────────┘    └──────────┘    └──────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rust_decimal::Decimal;

use bank_ledger::account::{Account, Iban, IbanAnalyzer};
use bank_ledger::config::AppConfig;
use bank_ledger::persistence::{
    AccountRepository, InMemoryAccountRepository, InMemoryTransactionRepository,
    TransactionRepository,
};
use bank_ledger::processing::{LoggingErrorNotifier, TransactionProcessingService};
use bank_ledger::transaction::Transaction;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let app_config = AppConfig::load(&env).with_context(|| format!("loading {env} config"))?;
    let _log_guard = bank_ledger::logging::init_logging(&app_config);

    tracing::info!("Starting bank ledger in {} mode", env);

    let bank_id = app_config.processing.bank_account_id;
    let accounts = Arc::new(InMemoryAccountRepository::new());
    accounts.insert(Account::new(1, 1, Iban::generate(1, 1)?));
    accounts.insert(Account::new(2, 1, Iban::generate(1, 2)?));
    accounts.insert(Account::new(3, 2, Iban::generate(2, 1)?));
    accounts.insert(Account::new(bank_id, 0, Iban::generate(0, 1)?));

    let transactions = Arc::new(InMemoryTransactionRepository::new(accounts.clone()));
    let service = TransactionProcessingService::start(
        accounts.clone(),
        transactions.clone(),
        app_config.locking,
        &app_config.processing,
        Arc::new(LoggingErrorNotifier),
    );

    // Fund account 1 first so the batch below validates against it
    let salary = transactions
        .insert(Transaction::deposit(
            accounts.get_by_id(1).await?,
            Decimal::new(1_000_00, 2),
            "Salary",
        )?)
        .await?;
    service.process_by_id(salary.id()).await?;
    service
        .await_terminal(salary.id(), Duration::from_secs(5))
        .await?;

    let analyzer = IbanAnalyzer::new();
    let own = accounts.get_by_id(1).await?;
    let mut batch = Vec::new();
    for (destination, amount, title) in [
        (2, Decimal::new(150_00, 2), "Savings"),
        (3, Decimal::new(200_00, 2), "Rent"),
    ] {
        let destination = accounts.get_by_id(destination).await?;
        let kind = analyzer.resolve_for_accounts(&own, &destination)?;
        batch.push(Transaction::transfer(kind, own.clone(), destination, amount, title)?);
    }

    // A German account, classified external before the transfer is built
    let foreign: Iban = "DE89 3704 0044 0532 0130 00".parse()?;
    tracing::info!(
        iban = %foreign.masked(),
        kind = %analyzer.resolve_transfer_type(own.iban(), &foreign)?,
        "Classified foreign destination"
    );
    let external = Transaction::transfer(
        bank_ledger::TransactionType::TransferExternal,
        own.clone(),
        accounts.get_by_id(3).await?,
        Decimal::new(100_00, 2),
        "Invoice",
    )?;
    if let Some(fee) = external.fee_for()? {
        batch.push(fee);
    }
    batch.push(external);
    batch.push(Transaction::withdrawal(
        own.clone(),
        Decimal::new(5_000_00, 2),
        "Too large",
    )?);

    let mut ids = Vec::new();
    for tx in batch {
        ids.push(transactions.insert(tx).await?.id());
    }

    let summary = service.process_all_new().await?;
    tracing::info!(?summary, "Batch dispatched");

    for id in ids {
        let tx = transactions.get_by_id(id).await?;
        let tx = if tx.status().is_final() {
            tx
        } else {
            service.await_terminal(id, Duration::from_secs(5)).await?
        };
        tracing::info!(
            tx_id = id,
            kind = %tx.kind(),
            amount = %tx.amount(),
            status = %tx.status(),
            "Transaction finished"
        );
    }

    for id in [1, 2, 3, bank_id] {
        let account = accounts.get_by_id(id).await?;
        tracing::info!(
            account_id = id,
            iban = %account.iban().to_formatted(),
            balance = %account.balance(),
            "Final balance"
        );
    }

    service.shutdown().await;
    Ok(())
}
