//! Account store adapter.
//!
//! Two logical record sets, pending and active, each keyed by email. An
//! email is in at most one of them: a pending insert fails if the email is
//! active, and promotion moves the record in one step. The Postgres
//! implementation keeps one table per set and serializes writes for one
//! email with a transaction-scoped advisory lock; the per-table uniqueness
//! constraints decide concurrent signups for the same email.

use crate::errors::AuthError;
use crate::models::{Account, AccountFilter, AccountSet};
use sqlx::{PgPool, Postgres, Transaction};

const PENDING_EMAIL_CONSTRAINT: &str = "pending_accounts_email_key";
const ACTIVE_EMAIL_CONSTRAINT: &str = "active_accounts_email_key";

/// Storage operations used by registration and sign-in.
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    /// First account in `set` matching `filter`.
    async fn find(&self, set: AccountSet, filter: &AccountFilter)
        -> Result<Option<Account>, AuthError>;

    /// Insert `account` into `set`.
    ///
    /// An email collision is reported as `AlreadyPending` for the pending set
    /// and `AlreadyRegistered` for the active set. A pending insert for an
    /// email that is already active fails with `AlreadyRegistered`.
    async fn insert(&self, set: AccountSet, account: &Account) -> Result<(), AuthError>;

    /// Delete every account in `set` matching `filter`, returning how many
    /// were removed.
    async fn delete(&self, set: AccountSet, filter: &AccountFilter) -> Result<u64, AuthError>;

    /// Move a pending account to the active set with its confirmation token
    /// cleared, returning the active record.
    ///
    /// Removal and insertion happen as one step. If the pending record is
    /// already gone (a concurrent confirm won) this fails with `NotPending`.
    async fn promote(&self, pending: &Account) -> Result<Account, AuthError>;
}

/// Active copy of a pending account.
fn activated(pending: &Account) -> Account {
    Account {
        email: pending.email.clone(),
        password_hash: pending.password_hash.clone(),
        confirm_token: None,
        created_at: chrono::Utc::now().timestamp(),
    }
}

fn table(set: AccountSet) -> &'static str {
    match set {
        AccountSet::Pending => "pending_accounts",
        AccountSet::Active => "active_accounts",
    }
}

fn filter_clause(filter: &AccountFilter) -> (&'static str, &str) {
    match filter {
        AccountFilter::Email(email) => ("email", email.as_str()),
        AccountFilter::ConfirmationToken(token) => ("confirm_token", token.as_str()),
    }
}

/// Map an insert failure, turning email uniqueness violations into the
/// matching conflict error.
fn map_insert_error(set: AccountSet, e: sqlx::Error) -> AuthError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some(PENDING_EMAIL_CONSTRAINT) => return AuthError::AlreadyPending,
                Some(ACTIVE_EMAIL_CONSTRAINT) => return AuthError::AlreadyRegistered,
                _ => {}
            }
        }
    }
    AuthError::Database(format!(
        "Failed to insert into {} accounts: {}",
        set.as_str(),
        e
    ))
}

/// Block until no other transaction holds the lock for `email`.
///
/// Released when the transaction ends.
async fn lock_email(tx: &mut Transaction<'_, Postgres>, email: &str) -> Result<(), AuthError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(email)
        .execute(&mut **tx)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to lock account email: {}", e)))?;
    Ok(())
}

/// Postgres-backed account store.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl PgAccountStore {
    async fn begin(&self) -> Result<Transaction<'static, Postgres>, AuthError> {
        self.pool
            .begin()
            .await
            .map_err(|e| AuthError::Database(format!("Failed to begin transaction: {}", e)))
    }

    /// Insert a pending account unless its email is already active.
    ///
    /// Holding the email lock orders this against a promotion of the same
    /// email, so the active check sees any promotion that finished first.
    async fn insert_pending(&self, account: &Account) -> Result<(), AuthError> {
        let mut tx = self.begin().await?;
        lock_email(&mut tx, &account.email).await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO pending_accounts (email, password_hash, confirm_token, created_at)
            SELECT $1, $2, $3, $4
            WHERE NOT EXISTS (SELECT 1 FROM active_accounts WHERE email = $1)
            "#,
        )
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.confirm_token)
        .bind(account.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_error(AccountSet::Pending, e))?
        .rows_affected();

        if inserted == 0 {
            return Err(AuthError::AlreadyRegistered);
        }

        tx.commit()
            .await
            .map_err(|e| AuthError::Database(format!("Failed to commit pending insert: {}", e)))
    }
}

#[async_trait::async_trait]
impl AccountStore for PgAccountStore {
    async fn find(
        &self,
        set: AccountSet,
        filter: &AccountFilter,
    ) -> Result<Option<Account>, AuthError> {
        let (column, value) = filter_clause(filter);
        let query = format!(
            "SELECT email, password_hash, confirm_token, created_at FROM {} WHERE {} = $1 LIMIT 1",
            table(set),
            column
        );

        sqlx::query_as::<_, Account>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AuthError::Database(format!(
                    "Failed to fetch {} account: {}",
                    set.as_str(),
                    e
                ))
            })
    }

    async fn insert(&self, set: AccountSet, account: &Account) -> Result<(), AuthError> {
        if set == AccountSet::Pending {
            return self.insert_pending(account).await;
        }

        let query = format!(
            "INSERT INTO {} (email, password_hash, confirm_token, created_at) VALUES ($1, $2, $3, $4)",
            table(set)
        );

        sqlx::query(&query)
            .bind(&account.email)
            .bind(&account.password_hash)
            .bind(&account.confirm_token)
            .bind(account.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| map_insert_error(set, e))?;

        Ok(())
    }

    async fn delete(&self, set: AccountSet, filter: &AccountFilter) -> Result<u64, AuthError> {
        let (column, value) = filter_clause(filter);
        let query = format!("DELETE FROM {} WHERE {} = $1", table(set), column);

        let result = sqlx::query(&query)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AuthError::Database(format!(
                    "Failed to delete {} account: {}",
                    set.as_str(),
                    e
                ))
            })?;

        Ok(result.rows_affected())
    }

    async fn promote(&self, pending: &Account) -> Result<Account, AuthError> {
        let token = pending.confirm_token.as_deref().ok_or(AuthError::NotPending)?;

        let mut tx = self.begin().await?;
        lock_email(&mut tx, &pending.email).await?;

        let removed = sqlx::query("DELETE FROM pending_accounts WHERE confirm_token = $1")
            .bind(token)
            .execute(&mut *tx)
            .await
            .map_err(|e| AuthError::Database(format!("Failed to delete pending account: {}", e)))?
            .rows_affected();

        if removed == 0 {
            // Dropping the transaction rolls it back.
            return Err(AuthError::NotPending);
        }

        let active = activated(pending);
        sqlx::query(
            r#"
            INSERT INTO active_accounts (email, password_hash, confirm_token, created_at)
            VALUES ($1, $2, NULL, $3)
            "#,
        )
        .bind(&active.email)
        .bind(&active.password_hash)
        .bind(active.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_insert_error(AccountSet::Active, e))?;

        tx.commit()
            .await
            .map_err(|e| AuthError::Database(format!("Failed to commit promotion: {}", e)))?;

        Ok(active)
    }
}

/// In-memory account store for tests.
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct Inner {
        pending: Vec<Account>,
        active: Vec<Account>,
    }

    impl Inner {
        fn set_mut(&mut self, set: AccountSet) -> &mut Vec<Account> {
            match set {
                AccountSet::Pending => &mut self.pending,
                AccountSet::Active => &mut self.active,
            }
        }
    }

    /// Thread-safe in-memory store with the same conflict semantics as
    /// `PgAccountStore`. Can be switched to fail or stall every call.
    #[derive(Clone, Default)]
    pub struct InMemoryAccountStore {
        inner: Arc<Mutex<Inner>>,
        failing: Arc<AtomicBool>,
        delay: Arc<Mutex<Option<Duration>>>,
        calls: Arc<Mutex<HashMap<&'static str, usize>>>,
        total_calls: Arc<AtomicUsize>,
    }

    impl InMemoryAccountStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every subsequent call fail with a database error.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Delay every subsequent call by `delay`.
        pub fn set_delay(&self, delay: Option<Duration>) {
            if let Ok(mut guard) = self.delay.lock() {
                *guard = delay;
            }
        }

        /// Snapshot of the accounts in `set`.
        pub fn accounts(&self, set: AccountSet) -> Vec<Account> {
            match self.inner.lock() {
                Ok(mut inner) => inner.set_mut(set).clone(),
                Err(_) => Vec::new(),
            }
        }

        /// Account in `set` with `email`, if any.
        pub fn get(&self, set: AccountSet, email: &str) -> Option<Account> {
            self.accounts(set).into_iter().find(|a| a.email == email)
        }

        /// Seed an account directly, bypassing conflict checks.
        pub fn seed(&self, set: AccountSet, account: Account) {
            if let Ok(mut inner) = self.inner.lock() {
                inner.set_mut(set).push(account);
            }
        }

        /// Number of calls made for `operation` (`find`, `insert`, `delete`).
        pub fn call_count(&self, operation: &str) -> usize {
            self.calls
                .lock()
                .ok()
                .and_then(|calls| calls.get(operation).copied())
                .unwrap_or(0)
        }

        pub fn total_calls(&self) -> usize {
            self.total_calls.load(Ordering::SeqCst)
        }

        async fn enter(&self, operation: &'static str) -> Result<(), AuthError> {
            self.total_calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut calls) = self.calls.lock() {
                *calls.entry(operation).or_insert(0) += 1;
            }

            let delay = self.delay.lock().ok().and_then(|d| *d);
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            if self.failing.load(Ordering::SeqCst) {
                return Err(AuthError::Database(format!(
                    "Mock store failure on {}",
                    operation
                )));
            }
            Ok(())
        }

        fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, AuthError> {
            self.inner
                .lock()
                .map_err(|_| AuthError::Database("Mock store poisoned".to_string()))
        }
    }

    #[async_trait::async_trait]
    impl AccountStore for InMemoryAccountStore {
        async fn find(
            &self,
            set: AccountSet,
            filter: &AccountFilter,
        ) -> Result<Option<Account>, AuthError> {
            self.enter("find").await?;
            let mut inner = self.lock()?;
            Ok(inner
                .set_mut(set)
                .iter()
                .find(|a| filter.matches(a))
                .cloned())
        }

        async fn insert(&self, set: AccountSet, account: &Account) -> Result<(), AuthError> {
            self.enter("insert").await?;
            let mut inner = self.lock()?;
            if set == AccountSet::Pending && inner.active.iter().any(|a| a.email == account.email)
            {
                return Err(AuthError::AlreadyRegistered);
            }
            let accounts = inner.set_mut(set);
            if accounts.iter().any(|a| a.email == account.email) {
                return Err(match set {
                    AccountSet::Pending => AuthError::AlreadyPending,
                    AccountSet::Active => AuthError::AlreadyRegistered,
                });
            }
            accounts.push(account.clone());
            Ok(())
        }

        async fn delete(
            &self,
            set: AccountSet,
            filter: &AccountFilter,
        ) -> Result<u64, AuthError> {
            self.enter("delete").await?;
            let mut inner = self.lock()?;
            let accounts = inner.set_mut(set);
            let before = accounts.len();
            accounts.retain(|a| !filter.matches(a));
            Ok((before - accounts.len()) as u64)
        }

        async fn promote(&self, pending: &Account) -> Result<Account, AuthError> {
            self.enter("promote").await?;
            let token = pending.confirm_token.as_deref().ok_or(AuthError::NotPending)?;

            let mut inner = self.lock()?;
            let position = inner
                .pending
                .iter()
                .position(|a| a.confirm_token.as_deref() == Some(token))
                .ok_or(AuthError::NotPending)?;
            if inner.active.iter().any(|a| a.email == pending.email) {
                return Err(AuthError::AlreadyRegistered);
            }

            inner.pending.remove(position);
            let active = activated(pending);
            inner.active.push(active.clone());
            Ok(active)
        }
    }

}
