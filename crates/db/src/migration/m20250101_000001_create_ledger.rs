//! Ledger schema: accounts and their append-only ledger entries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(LEDGER_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS ledger_entries CASCADE;
             DROP TABLE IF EXISTS accounts CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const LEDGER_SQL: &str = r"
-- Accounts hold the authoritative balance
CREATE TABLE accounts (
    account_id BIGINT PRIMARY KEY,
    balance NUMERIC(30, 5) NOT NULL,
    created_date TIMESTAMPTZ NOT NULL DEFAULT now(),
    last_modified_date TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_account_id_positive CHECK (account_id > 0),
    CONSTRAINT chk_balance_non_negative CHECK (balance >= 0)
);

-- Signed movements; the entries of an account sum to its balance
CREATE TABLE ledger_entries (
    entry_id BIGSERIAL PRIMARY KEY,
    account_id BIGINT NOT NULL REFERENCES accounts(account_id),
    amount NUMERIC(30, 5) NOT NULL,
    created_date TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Index for per-account history in entry order
CREATE INDEX idx_ledger_entries_account ON ledger_entries(account_id, entry_id);
";
