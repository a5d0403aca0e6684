use crate::{
    entities::withdraw_request::{self, Entity as WithdrawRequestEntity, WithdrawStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    services::wallet::WalletService,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateWithdrawInput {
    #[validate(length(min = 1, message = "User id is required"))]
    pub user_id: String,
    pub amount: Decimal,
    /// Payout destination (account number, IFSC, holder name).
    pub bank_details: serde_json::Value,
}

/// Withdraw-request lifecycle over the wallet ledger.
///
/// Approval is the only consumer-facing debit besides checkout; it
/// uses the same conditional-update primitive, so an approval against
/// a drained wallet fails cleanly and leaves the request pending.
#[derive(Clone)]
pub struct WithdrawalService {
    db: Arc<DatabaseConnection>,
    wallet: Arc<WalletService>,
    event_sender: EventSender,
}

impl WithdrawalService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        wallet: Arc<WalletService>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            wallet,
            event_sender,
        }
    }

    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn create_request(
        &self,
        input: CreateWithdrawInput,
    ) -> Result<withdraw_request::Model, ServiceError> {
        input.validate()?;
        if input.amount <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Withdrawal amount must be positive".to_string(),
            ));
        }

        let balance = self.wallet.get_balance(&input.user_id).await?;
        if balance < input.amount {
            return Err(ServiceError::InsufficientFunds(format!(
                "insufficient wallet balance for {}: requested {}, available {}",
                input.user_id, input.amount, balance
            )));
        }

        let model = withdraw_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(input.user_id),
            amount: Set(input.amount),
            bank_details: Set(serde_json::to_string(&input.bank_details)?),
            status: Set(WithdrawStatus::Pending.as_str().to_string()),
            admin_note: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
            version: Set(1),
        };

        let created = model.insert(&*self.db).await?;

        if let Err(e) = self
            .event_sender
            .send(Event::WithdrawRequested(created.id))
            .await
        {
            warn!(error = %e, request_id = %created.id, "Failed to send withdraw requested event");
        }

        info!(request_id = %created.id, "Withdrawal requested");
        Ok(created)
    }

    /// Approves a pending request, debiting the wallet. The balance is
    /// re-checked by the debit itself; the status flip is claimed with
    /// a version check so a double approval cannot debit twice.
    #[instrument(skip(self), fields(request_id = %request_id))]
    pub async fn approve(&self, request_id: Uuid) -> Result<withdraw_request::Model, ServiceError> {
        let request = self.get_request_required(request_id).await?;
        if request.status != WithdrawStatus::Pending.as_str() {
            return Err(ServiceError::InvalidStatus(format!(
                "Withdrawal {} is '{}', expected 'pending'",
                request_id, request.status
            )));
        }

        // Claim the request before touching the wallet so a concurrent
        // approval conflicts here rather than double-debiting.
        let claimed = WithdrawRequestEntity::update_many()
            .col_expr(
                withdraw_request::Column::Status,
                Expr::value(WithdrawStatus::Approved.as_str()),
            )
            .col_expr(withdraw_request::Column::UpdatedAt, Expr::value(Utc::now()))
            .col_expr(
                withdraw_request::Column::Version,
                Expr::value(request.version + 1),
            )
            .filter(withdraw_request::Column::Id.eq(request_id))
            .filter(withdraw_request::Column::Status.eq(WithdrawStatus::Pending.as_str()))
            .filter(withdraw_request::Column::Version.eq(request.version))
            .exec(&*self.db)
            .await?;

        if claimed.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "Withdrawal {} was concurrently updated",
                request_id
            )));
        }

        match self.wallet.debit(&request.user_id, request.amount).await {
            Ok(_) => {}
            Err(e) => {
                // Roll the claim back so the request can be retried
                // once the balance allows it.
                let reverted = WithdrawRequestEntity::update_many()
                    .col_expr(
                        withdraw_request::Column::Status,
                        Expr::value(WithdrawStatus::Pending.as_str()),
                    )
                    .col_expr(withdraw_request::Column::UpdatedAt, Expr::value(Utc::now()))
                    .col_expr(
                        withdraw_request::Column::Version,
                        Expr::value(request.version + 2),
                    )
                    .filter(withdraw_request::Column::Id.eq(request_id))
                    .exec(&*self.db)
                    .await;
                if let Err(revert_err) = reverted {
                    warn!(
                        request_id = %request_id,
                        error = %revert_err,
                        "Failed to revert withdrawal claim after debit failure"
                    );
                }
                return Err(e);
            }
        }

        if let Err(e) = self
            .event_sender
            .send(Event::WithdrawApproved(request_id))
            .await
        {
            warn!(error = %e, request_id = %request_id, "Failed to send withdraw approved event");
        }

        info!(request_id = %request_id, "Withdrawal approved");
        self.get_request_required(request_id).await
    }

    /// Rejects a pending request with a mandatory note.
    #[instrument(skip(self), fields(request_id = %request_id))]
    pub async fn reject(
        &self,
        request_id: Uuid,
        note: &str,
    ) -> Result<withdraw_request::Model, ServiceError> {
        if note.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "A rejection note is required".to_string(),
            ));
        }

        let request = self.get_request_required(request_id).await?;
        if request.status != WithdrawStatus::Pending.as_str() {
            return Err(ServiceError::InvalidStatus(format!(
                "Withdrawal {} is '{}', expected 'pending'",
                request_id, request.status
            )));
        }

        let result = WithdrawRequestEntity::update_many()
            .col_expr(
                withdraw_request::Column::Status,
                Expr::value(WithdrawStatus::Rejected.as_str()),
            )
            .col_expr(
                withdraw_request::Column::AdminNote,
                Expr::value(note.to_string()),
            )
            .col_expr(withdraw_request::Column::UpdatedAt, Expr::value(Utc::now()))
            .col_expr(
                withdraw_request::Column::Version,
                Expr::value(request.version + 1),
            )
            .filter(withdraw_request::Column::Id.eq(request_id))
            .filter(withdraw_request::Column::Status.eq(WithdrawStatus::Pending.as_str()))
            .filter(withdraw_request::Column::Version.eq(request.version))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "Withdrawal {} was concurrently updated",
                request_id
            )));
        }

        if let Err(e) = self
            .event_sender
            .send(Event::WithdrawRejected(request_id))
            .await
        {
            warn!(error = %e, request_id = %request_id, "Failed to send withdraw rejected event");
        }

        self.get_request_required(request_id).await
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<withdraw_request::Model>, ServiceError> {
        Ok(WithdrawRequestEntity::find()
            .filter(withdraw_request::Column::UserId.eq(user_id))
            .order_by_desc(withdraw_request::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    async fn get_request_required(
        &self,
        request_id: Uuid,
    ) -> Result<withdraw_request::Model, ServiceError> {
        WithdrawRequestEntity::find_by_id(request_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Withdrawal request {} not found", request_id))
            })
    }
}
