// src/services/sales.rs
//
// Sale lifecycle: create, update (merge-then-recalculate with replace-all
// children), archive. Every operation is one transaction; any failure
// aborts with nothing written.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dtos::sale::{CreateSaleRequest, PaymentInput, SaleLineInput, UpdateSaleRequest};
use crate::error::AppError;
use crate::models::sale::{Payment, Sale, SaleLine, STATUS_ARCHIVED};
use crate::services::calculator::{ComputedLine, SaleTotals};
use crate::services::checkout::CheckoutService;

const SALE_COLUMNS: &str = "sale_id, org_id, terminal_id, customer_id, sale_number, status, \
     sale_type, subtotal, tax_total, discount_total, grand_total, amount_paid, balance_due, \
     sale_date, notes, created_by, created_at, updated_at";

#[derive(Clone, Default)]
pub struct SalesService {
    checkout: CheckoutService,
}

impl SalesService {
    pub fn new() -> Self {
        Self {
            checkout: CheckoutService::new(),
        }
    }

    /// Lists sales for the organization, newest first. Archived sales are
    /// excluded.
    pub async fn get_by_org(
        &self,
        pool: &PgPool,
        org_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Sale>, AppError> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales
             WHERE org_id = $1 AND status <> $2
             ORDER BY sale_date DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(org_id)
        .bind(STATUS_ARCHIVED)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(sales)
    }

    /// Fetches one non-archived sale with its lines and payments, scoped to
    /// the organization.
    pub async fn get_with_relations(
        &self,
        pool: &PgPool,
        org_id: Uuid,
        sale_id: Uuid,
    ) -> Result<(Sale, Vec<SaleLine>, Vec<Payment>), AppError> {
        let mut conn = pool.acquire().await?;

        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales
             WHERE sale_id = $1 AND org_id = $2 AND status <> $3"
        ))
        .bind(sale_id)
        .bind(org_id)
        .bind(STATUS_ARCHIVED)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("Sale not found"))?;

        let (lines, payments) = load_children(&mut *conn, sale_id).await?;
        Ok((sale, lines, payments))
    }

    /// Creates a sale header plus its line and payment children in a single
    /// transaction, with totals computed by the checkout engine.
    pub async fn create_sale(
        &self,
        pool: &PgPool,
        org_id: Uuid,
        draft: CreateSaleRequest,
    ) -> Result<(Sale, Vec<SaleLine>, Vec<Payment>), AppError> {
        let mut tx = pool.begin().await?;

        let totals = self.checkout.calculate(&mut *tx, org_id, &draft).await?;

        let sale = sqlx::query_as::<_, Sale>(&format!(
            "INSERT INTO sales
                 (sale_id, org_id, terminal_id, customer_id, sale_number, status, sale_type,
                  subtotal, tax_total, discount_total, grand_total, amount_paid, balance_due,
                  sale_date, notes, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING {SALE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(org_id)
        .bind(draft.terminal_id)
        .bind(draft.customer_id)
        .bind(&draft.sale_number)
        .bind(&draft.status)
        .bind(&draft.sale_type)
        .bind(totals.subtotal)
        .bind(totals.tax_total)
        .bind(totals.discount_total)
        .bind(totals.grand_total)
        .bind(totals.amount_paid)
        .bind(totals.balance_due)
        .bind(draft.sale_date)
        .bind(&draft.notes)
        .bind(draft.created_by)
        .fetch_one(&mut *tx)
        .await?;

        let lines = insert_lines(&mut *tx, &sale, &draft.lines, &totals).await?;
        let payments = insert_payments(&mut *tx, &sale, &draft.payments).await?;

        tx.commit().await?;

        tracing::info!(sale_id = %sale.sale_id, org_id = %org_id, grand_total = %sale.grand_total, "Sale created");
        Ok((sale, lines, payments))
    }

    /// Merges a partial patch onto the persisted sale, recomputes totals,
    /// and replaces all children. Archived sales are immutable.
    pub async fn update_sale(
        &self,
        pool: &PgPool,
        org_id: Uuid,
        sale_id: Uuid,
        patch: UpdateSaleRequest,
    ) -> Result<(Sale, Vec<SaleLine>, Vec<Payment>), AppError> {
        let mut tx = pool.begin().await?;

        let existing = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales
             WHERE sale_id = $1 AND org_id = $2"
        ))
        .bind(sale_id)
        .bind(org_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found("Sale not found"))?;

        if existing.is_archived() {
            return Err(AppError::not_found("Sale not found or archived"));
        }

        let (old_lines, old_payments) = load_children(&mut *tx, sale_id).await?;
        let draft = patch.into_recalculation_draft(&existing, &old_lines, &old_payments);

        let totals = self.checkout.calculate(&mut *tx, org_id, &draft).await?;

        let sale = sqlx::query_as::<_, Sale>(&format!(
            "UPDATE sales SET
                 terminal_id = $1, customer_id = $2, status = $3, sale_type = $4,
                 subtotal = $5, tax_total = $6, discount_total = $7, grand_total = $8,
                 amount_paid = $9, balance_due = $10, sale_date = $11, notes = $12,
                 updated_at = NOW()
             WHERE sale_id = $13
             RETURNING {SALE_COLUMNS}"
        ))
        .bind(draft.terminal_id)
        .bind(draft.customer_id)
        .bind(&draft.status)
        .bind(&draft.sale_type)
        .bind(totals.subtotal)
        .bind(totals.tax_total)
        .bind(totals.discount_total)
        .bind(totals.grand_total)
        .bind(totals.amount_paid)
        .bind(totals.balance_due)
        .bind(draft.sale_date)
        .bind(&draft.notes)
        .bind(sale_id)
        .fetch_one(&mut *tx)
        .await?;

        // Replace-all: old child rows go away, freshly computed ones come
        // in with new ids.
        sqlx::query("DELETE FROM sale_lines WHERE sale_id = $1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM payments WHERE sale_id = $1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        let lines = insert_lines(&mut *tx, &sale, &draft.lines, &totals).await?;
        let payments = insert_payments(&mut *tx, &sale, &draft.payments).await?;

        tx.commit().await?;

        tracing::info!(sale_id = %sale.sale_id, org_id = %org_id, grand_total = %sale.grand_total, "Sale recalculated");
        Ok((sale, lines, payments))
    }

    /// Flips the sale's status to archived. Totals and children are left as
    /// last computed; archiving an already-archived sale is a state error.
    pub async fn archive_sale(
        &self,
        pool: &PgPool,
        org_id: Uuid,
        sale_id: Uuid,
    ) -> Result<(Sale, Vec<SaleLine>, Vec<Payment>), AppError> {
        let mut conn = pool.acquire().await?;

        let sale = sqlx::query_as::<_, Sale>(&format!(
            "UPDATE sales SET status = $1, updated_at = NOW()
             WHERE sale_id = $2 AND org_id = $3 AND status <> $1
             RETURNING {SALE_COLUMNS}"
        ))
        .bind(STATUS_ARCHIVED)
        .bind(sale_id)
        .bind(org_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("Sale not found"))?;

        let (lines, payments) = load_children(&mut *conn, sale_id).await?;

        tracing::info!(sale_id = %sale.sale_id, org_id = %org_id, "Sale archived");
        Ok((sale, lines, payments))
    }
}

async fn load_children(
    conn: &mut PgConnection,
    sale_id: Uuid,
) -> Result<(Vec<SaleLine>, Vec<Payment>), AppError> {
    let lines = sqlx::query_as::<_, SaleLine>(
        "SELECT sale_line_id, sale_id, org_id, line_number, item_id, description,
                quantity, unit_price, discount_amount, tax_id, tax_amount, line_total,
                created_at
         FROM sale_lines WHERE sale_id = $1 ORDER BY line_number",
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    let payments = sqlx::query_as::<_, Payment>(
        "SELECT payment_id, sale_id, org_id, payment_method, amount, currency,
                external_ref, processed_at, created_at
         FROM payments WHERE sale_id = $1 ORDER BY processed_at",
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok((lines, payments))
}

async fn insert_lines(
    conn: &mut PgConnection,
    sale: &Sale,
    inputs: &[SaleLineInput],
    totals: &SaleTotals,
) -> Result<Vec<SaleLine>, AppError> {
    let mut lines = Vec::with_capacity(inputs.len());
    for (input, calc) in inputs.iter().zip(&totals.lines) {
        lines.push(insert_line(conn, sale, input, calc).await?);
    }
    Ok(lines)
}

async fn insert_line(
    conn: &mut PgConnection,
    sale: &Sale,
    input: &SaleLineInput,
    calc: &ComputedLine,
) -> Result<SaleLine, AppError> {
    let line = sqlx::query_as::<_, SaleLine>(
        "INSERT INTO sale_lines
             (sale_line_id, sale_id, org_id, line_number, item_id, description,
              quantity, unit_price, discount_amount, tax_id, tax_amount, line_total)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         RETURNING sale_line_id, sale_id, org_id, line_number, item_id, description,
                   quantity, unit_price, discount_amount, tax_id, tax_amount, line_total,
                   created_at",
    )
    .bind(Uuid::new_v4())
    .bind(sale.sale_id)
    .bind(sale.org_id)
    .bind(input.line_number)
    .bind(input.item_id)
    .bind(&input.description)
    .bind(calc.quantity)
    .bind(calc.unit_price)
    .bind(calc.discount_amount)
    .bind(calc.tax_id)
    .bind(calc.tax_amount)
    .bind(calc.line_total)
    .fetch_one(&mut *conn)
    .await?;

    Ok(line)
}

async fn insert_payments(
    conn: &mut PgConnection,
    sale: &Sale,
    inputs: &[PaymentInput],
) -> Result<Vec<Payment>, AppError> {
    let mut payments = Vec::with_capacity(inputs.len());
    for input in inputs {
        let payment = sqlx::query_as::<_, Payment>(
            "INSERT INTO payments
                 (payment_id, sale_id, org_id, payment_method, amount, currency,
                  external_ref, processed_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING payment_id, sale_id, org_id, payment_method, amount, currency,
                       external_ref, processed_at, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(sale.sale_id)
        .bind(sale.org_id)
        .bind(&input.payment_method)
        .bind(input.amount)
        .bind(&input.currency)
        .bind(&input.external_ref)
        .bind(input.processed_at)
        .fetch_one(&mut *conn)
        .await?;
        payments.push(payment);
    }
    Ok(payments)
}
