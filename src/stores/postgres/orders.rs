//! PostgreSQL order and payment repository.

use super::store_err;
use crate::error::{EngineError, Result};
use crate::providers::{MatchCommit, OrderRepository, PaymentInsert};
use crate::types::{
    BuyerId, MatchId, Money, OrderId, OrderStatus, Payment, PaymentId, PaymentKind, PaymentStatus,
    TicketOrder, Zone,
};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, buyer_id, match_id, zone, quantity, total, status, \
     payment_reference, ussd_code, created_at, expires_at";

const PAYMENT_COLUMNS: &str = "id, order_id, kind, amount, status, source_reference, \
     payer_reference, received_at, created_at";

/// PostgreSQL [`OrderRepository`].
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Create a repository over a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn order_from_row(row: &PgRow) -> Result<TicketOrder> {
    let read = |e: sqlx::Error| EngineError::Store(format!("corrupt order row: {e}"));
    Ok(TicketOrder {
        id: OrderId::from_uuid(row.try_get("id").map_err(read)?),
        buyer_id: row
            .try_get::<Option<Uuid>, _>("buyer_id")
            .map_err(read)?
            .map(BuyerId::from_uuid),
        match_id: MatchId::from_uuid(row.try_get("match_id").map_err(read)?),
        zone: Zone::new(row.try_get::<String, _>("zone").map_err(read)?),
        quantity: u32::try_from(row.try_get::<i32, _>("quantity").map_err(read)?)
            .map_err(|_| EngineError::Store("corrupt order row: negative quantity".into()))?,
        total: Money::from_minor(row.try_get("total").map_err(read)?),
        status: parse_order_status(&row.try_get::<String, _>("status").map_err(read)?)?,
        payment_reference: row.try_get("payment_reference").map_err(read)?,
        ussd_code: row.try_get("ussd_code").map_err(read)?,
        created_at: row.try_get("created_at").map_err(read)?,
        expires_at: row.try_get("expires_at").map_err(read)?,
    })
}

fn payment_from_row(row: &PgRow) -> Result<Payment> {
    let read = |e: sqlx::Error| EngineError::Store(format!("corrupt payment row: {e}"));
    Ok(Payment {
        id: PaymentId::from_uuid(row.try_get("id").map_err(read)?),
        order_id: row
            .try_get::<Option<Uuid>, _>("order_id")
            .map_err(read)?
            .map(OrderId::from_uuid),
        kind: parse_payment_kind(&row.try_get::<String, _>("kind").map_err(read)?)?,
        amount: Money::from_minor(row.try_get("amount").map_err(read)?),
        status: parse_payment_status(&row.try_get::<String, _>("status").map_err(read)?)?,
        source_reference: row.try_get("source_reference").map_err(read)?,
        payer_reference: row.try_get("payer_reference").map_err(read)?,
        received_at: row.try_get("received_at").map_err(read)?,
        created_at: row.try_get("created_at").map_err(read)?,
    })
}

fn parse_order_status(status: &str) -> Result<OrderStatus> {
    match status {
        "pending" => Ok(OrderStatus::Pending),
        "paid" => Ok(OrderStatus::Paid),
        "cancelled" => Ok(OrderStatus::Cancelled),
        "expired" => Ok(OrderStatus::Expired),
        other => Err(EngineError::Store(format!("unknown order status {other}"))),
    }
}

fn parse_payment_kind(kind: &str) -> Result<PaymentKind> {
    match kind {
        "ticket" => Ok(PaymentKind::Ticket),
        "shop" => Ok(PaymentKind::Shop),
        "donation" => Ok(PaymentKind::Donation),
        other => Err(EngineError::Store(format!("unknown payment kind {other}"))),
    }
}

fn parse_payment_status(status: &str) -> Result<PaymentStatus> {
    match status {
        "pending" => Ok(PaymentStatus::Pending),
        "confirmed" => Ok(PaymentStatus::Confirmed),
        "failed" => Ok(PaymentStatus::Failed),
        other => Err(EngineError::Store(format!("unknown payment status {other}"))),
    }
}

/// Bind a payment's columns onto an INSERT in `PAYMENT_COLUMNS` order.
fn bind_payment<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    payment: &Payment,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(*payment.id.as_uuid())
        .bind(payment.order_id.map(|id| *id.as_uuid()))
        .bind(payment.kind.as_str())
        .bind(payment.amount.minor())
        .bind(payment.status.as_str())
        .bind(payment.source_reference.clone())
        .bind(payment.payer_reference.clone())
        .bind(payment.received_at)
        .bind(payment.created_at)
}

impl OrderRepository for PostgresOrderRepository {
    async fn insert_order(&self, order: &TicketOrder) -> Result<()> {
        sqlx::query(
            "INSERT INTO ticket_orders \
             (id, buyer_id, match_id, zone, quantity, total, status, \
              payment_reference, ussd_code, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(*order.id.as_uuid())
        .bind(order.buyer_id.map(|id| *id.as_uuid()))
        .bind(*order.match_id.as_uuid())
        .bind(order.zone.as_str())
        .bind(i32::try_from(order.quantity).unwrap_or(i32::MAX))
        .bind(order.total.minor())
        .bind(order.status.as_str())
        .bind(order.payment_reference.clone())
        .bind(order.ussd_code.clone())
        .bind(order.created_at)
        .bind(order.expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| store_err("failed to insert order", e))?;
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<TicketOrder>> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM ticket_orders WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_err("failed to get order", e))?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn list_orders_for_buyer(&self, buyer: BuyerId) -> Result<Vec<TicketOrder>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM ticket_orders \
             WHERE buyer_id = $1 ORDER BY created_at DESC"
        ))
        .bind(*buyer.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_err("failed to list orders", e))?;

        rows.iter().map(order_from_row).collect()
    }

    async fn reserved_quantity(&self, match_id: MatchId, zone: &Zone) -> Result<u32> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(quantity), 0) AS reserved FROM ticket_orders \
             WHERE match_id = $1 AND zone = $2 AND status IN ('pending', 'paid')",
        )
        .bind(*match_id.as_uuid())
        .bind(zone.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| store_err("failed to count reserved seats", e))?;

        let reserved: i64 = row
            .try_get("reserved")
            .map_err(|e| EngineError::Store(format!("corrupt count: {e}")))?;
        Ok(u32::try_from(reserved).unwrap_or(u32::MAX))
    }

    async fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<TicketOrder>> {
        let row = sqlx::query(&format!(
            "UPDATE ticket_orders SET status = $1 \
             WHERE id = $2 AND status = $3 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(to.as_str())
        .bind(*id.as_uuid())
        .bind(from.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_err("failed to transition order", e))?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn pending_orders_in_window(
        &self,
        amount: Money,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<TicketOrder>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM ticket_orders \
             WHERE status = 'pending' AND total = $1 AND created_at >= $2 \
             ORDER BY created_at ASC"
        ))
        .bind(amount.minor())
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| store_err("failed to load match candidates", e))?;

        rows.iter().map(order_from_row).collect()
    }

    async fn find_payment_by_source_reference(
        &self,
        source_reference: &str,
    ) -> Result<Option<Payment>> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE source_reference = $1"
        ))
        .bind(source_reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_err("failed to look up payment", e))?;

        row.as_ref().map(payment_from_row).transpose()
    }

    async fn find_payment_by_order(&self, order_id: OrderId) -> Result<Option<Payment>> {
        let row = sqlx::query(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = $1 \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(*order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_err("failed to look up payment", e))?;

        row.as_ref().map(payment_from_row).transpose()
    }

    async fn commit_match(&self, order_id: OrderId, payment: Payment) -> Result<MatchCommit> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| store_err("failed to begin match commit", e))?;

        // Uniqueness first: the ON CONFLICT guard makes concurrent commits
        // of one event collapse into a single row.
        let inserted = bind_payment(
            sqlx::query(&format!(
                "INSERT INTO payments ({PAYMENT_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 ON CONFLICT (source_reference) DO NOTHING"
            )),
            &payment,
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| store_err("failed to insert payment", e))?;

        if inserted.rows_affected() == 0 {
            drop(tx);
            let existing = self
                .find_payment_by_source_reference(&payment.source_reference)
                .await?
                .ok_or_else(|| EngineError::Store("payment vanished under conflict".into()))?;
            return Ok(MatchCommit::DuplicateSource(existing));
        }

        let row = sqlx::query(&format!(
            "UPDATE ticket_orders SET status = 'paid', payment_reference = $1 \
             WHERE id = $2 AND status = 'pending' RETURNING {ORDER_COLUMNS}"
        ))
        .bind(payment.source_reference.clone())
        .bind(*order_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| store_err("failed to mark order paid", e))?;

        match row {
            Some(row) => {
                let order = order_from_row(&row)?;
                tx.commit()
                    .await
                    .map_err(|e| store_err("failed to commit match", e))?;
                Ok(MatchCommit::Committed(order))
            }
            None => {
                tx.rollback()
                    .await
                    .map_err(|e| store_err("failed to roll back match", e))?;
                Ok(MatchCommit::NotPending)
            }
        }
    }

    async fn insert_payment(&self, payment: Payment) -> Result<PaymentInsert> {
        let inserted = bind_payment(
            sqlx::query(&format!(
                "INSERT INTO payments ({PAYMENT_COLUMNS}) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 ON CONFLICT (source_reference) DO NOTHING"
            )),
            &payment,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| store_err("failed to insert payment", e))?;

        if inserted.rows_affected() == 0 {
            let existing = self
                .find_payment_by_source_reference(&payment.source_reference)
                .await?
                .ok_or_else(|| EngineError::Store("payment vanished under conflict".into()))?;
            return Ok(PaymentInsert::Existing(existing));
        }
        Ok(PaymentInsert::Created(payment))
    }

    async fn fail_payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        let row = sqlx::query(&format!(
            "UPDATE payments SET status = 'failed' \
             WHERE id = $1 AND status = 'confirmed' RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| store_err("failed to fail payment", e))?;

        row.as_ref().map(payment_from_row).transpose()
    }
}
