use crate::{
    entities::wallet_account::{self, Entity as WalletAccountEntity},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{info, instrument, warn};

const MAX_CAS_ATTEMPTS: u32 = 16;

/// Service owning the per-user spendable balance ledger.
///
/// Balances are mutated through the same atomic conditional-update
/// primitive as stock: compute against the value that was read, commit
/// only if the row version is unchanged, retry on conflict. Debits
/// refuse to push the balance below zero.
#[derive(Clone)]
pub struct WalletService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl WalletService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Reads the current balance, creating an empty account on first use.
    #[instrument(skip(self))]
    pub async fn get_balance(&self, user_id: &str) -> Result<Decimal, ServiceError> {
        let account = self.get_or_create_account(user_id).await?;
        Ok(account.balance)
    }

    /// Debits the account by `amount`. Fails with an insufficient-funds
    /// error when the balance at commit time cannot cover it.
    #[instrument(skip(self), fields(user_id = %user_id, amount = %amount))]
    pub async fn debit(&self, user_id: &str, amount: Decimal) -> Result<Decimal, ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Debit amount must be positive".to_string(),
            ));
        }

        self.get_or_create_account(user_id).await?;

        let remaining = self
            .apply_balance_mutation(user_id, |current| {
                let next = current - amount;
                if next < Decimal::ZERO {
                    Err(ServiceError::InsufficientFunds(format!(
                        "insufficient wallet balance for {}: requested {}, available {}",
                        user_id, amount, current
                    )))
                } else {
                    Ok(next)
                }
            })
            .await?;

        if let Err(e) = self
            .event_sender
            .send(Event::WalletDebited {
                user_id: user_id.to_string(),
                amount,
            })
            .await
        {
            warn!(error = %e, user_id = %user_id, "Failed to send wallet debited event");
        }

        info!(user_id = %user_id, amount = %amount, remaining = %remaining, "Wallet debited");
        Ok(remaining)
    }

    /// Credits the account by `amount`, creating it when missing.
    #[instrument(skip(self), fields(user_id = %user_id, amount = %amount))]
    pub async fn credit(&self, user_id: &str, amount: Decimal) -> Result<Decimal, ServiceError> {
        if amount <= Decimal::ZERO {
            return Err(ServiceError::InvalidInput(
                "Credit amount must be positive".to_string(),
            ));
        }

        self.get_or_create_account(user_id).await?;

        let balance = self
            .apply_balance_mutation(user_id, |current| Ok(current + amount))
            .await?;

        if let Err(e) = self
            .event_sender
            .send(Event::WalletCredited {
                user_id: user_id.to_string(),
                amount,
            })
            .await
        {
            warn!(error = %e, user_id = %user_id, "Failed to send wallet credited event");
        }

        Ok(balance)
    }

    /// The conditional-update primitive over the balance column.
    async fn apply_balance_mutation<F>(
        &self,
        user_id: &str,
        mut f: F,
    ) -> Result<Decimal, ServiceError>
    where
        F: FnMut(Decimal) -> Result<Decimal, ServiceError>,
    {
        let db = &*self.db;

        for attempt in 0..MAX_CAS_ATTEMPTS {
            let account = WalletAccountEntity::find_by_id(user_id.to_string())
                .one(db)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Wallet account {} not found", user_id))
                })?;

            let next = f(account.balance)?;

            let result = WalletAccountEntity::update_many()
                .col_expr(wallet_account::Column::Balance, Expr::value(next))
                .col_expr(wallet_account::Column::UpdatedAt, Expr::value(Utc::now()))
                .col_expr(
                    wallet_account::Column::Version,
                    Expr::value(account.version + 1),
                )
                .filter(wallet_account::Column::UserId.eq(user_id))
                .filter(wallet_account::Column::Version.eq(account.version))
                .exec(db)
                .await
                .map_err(ServiceError::DatabaseError)?;

            if result.rows_affected == 1 {
                return Ok(next);
            }

            warn!(
                user_id = %user_id,
                attempt = attempt + 1,
                "Concurrent balance update detected, retrying"
            );
        }

        Err(ServiceError::ConcurrentModification(format!(
            "wallet account {}",
            user_id
        )))
    }

    async fn get_or_create_account(
        &self,
        user_id: &str,
    ) -> Result<wallet_account::Model, ServiceError> {
        let db = &*self.db;

        if let Some(account) = WalletAccountEntity::find_by_id(user_id.to_string())
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
        {
            return Ok(account);
        }

        let account = wallet_account::ActiveModel {
            user_id: Set(user_id.to_string()),
            balance: Set(Decimal::ZERO),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            version: Set(1),
        };

        match account.insert(db).await {
            Ok(model) => Ok(model),
            // A concurrent first-use insert may have won; read it back.
            Err(_) => WalletAccountEntity::find_by_id(user_id.to_string())
                .one(db)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Failed to create wallet account for {}",
                        user_id
                    ))
                }),
        }
    }
}
