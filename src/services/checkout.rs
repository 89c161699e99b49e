// src/services/checkout.rs
//
// Checkout orchestration: structural fast-fail validation, catalog loading,
// then delegation to the pure calculator.

use std::collections::HashSet;

use sqlx::PgConnection;
use uuid::Uuid;

use crate::dtos::sale::CreateSaleRequest;
use crate::error::AppError;
use crate::services::calculator::{calculate_sale, SaleTotals};
use crate::services::catalog;

/// Pre-flight checks run before any catalog access. The calculator repeats
/// the quantity/discount/payment checks defensively; the two must stay in
/// agreement.
pub fn validate_draft(draft: &CreateSaleRequest) -> Result<(), AppError> {
    if draft.lines.is_empty() {
        return Err(AppError::validation("A sale must contain at least one line"));
    }

    let mut seen = HashSet::with_capacity(draft.lines.len());
    for line in &draft.lines {
        if line.quantity <= rust_decimal::Decimal::ZERO {
            return Err(AppError::validation("Quantity must be greater than 0"));
        }
        if let Some(discount) = line.discount_amount {
            if discount < rust_decimal::Decimal::ZERO {
                return Err(AppError::validation("Discount amount cannot be negative"));
            }
        }
        if !seen.insert(line.line_number) {
            return Err(AppError::validation(format!(
                "Duplicate line number: {}",
                line.line_number
            )));
        }
    }

    for payment in &draft.payments {
        if payment.amount < rust_decimal::Decimal::ZERO {
            return Err(AppError::validation("Payment amounts cannot be negative"));
        }
    }

    Ok(())
}

/// Stateless checkout engine. Loads the org-scoped catalog snapshot the
/// draft references and computes authoritative totals.
#[derive(Clone, Default)]
pub struct CheckoutService;

impl CheckoutService {
    pub fn new() -> Self {
        Self
    }

    pub async fn calculate(
        &self,
        conn: &mut PgConnection,
        org_id: Uuid,
        draft: &CreateSaleRequest,
    ) -> Result<SaleTotals, AppError> {
        validate_draft(draft)?;

        let item_ids: Vec<Uuid> = {
            let mut seen = HashSet::new();
            draft
                .lines
                .iter()
                .map(|l| l.item_id)
                .filter(|id| seen.insert(*id))
                .collect()
        };
        let items = catalog::load_items(conn, org_id, &item_ids).await?;

        // Tax ids to resolve: explicit line overrides plus the defaults of
        // the items actually referenced (auto-fill happens in the
        // calculator, so the defaults must be loadable too).
        let tax_ids: Vec<Uuid> = {
            let mut seen = HashSet::new();
            draft
                .lines
                .iter()
                .filter_map(|l| l.tax_id)
                .chain(items.iter().filter_map(|i| i.tax_id))
                .filter(|id| seen.insert(*id))
                .collect()
        };
        let tax_rates = catalog::load_tax_rates(conn, org_id, &tax_ids).await?;

        calculate_sale(draft, &items, &tax_rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::sale::{PaymentInput, SaleLineInput};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn draft_with_lines(lines: Vec<SaleLineInput>) -> CreateSaleRequest {
        CreateSaleRequest {
            terminal_id: None,
            customer_id: None,
            sale_number: None,
            status: "open".to_string(),
            sale_type: "pos".to_string(),
            sale_date: Utc::now(),
            notes: None,
            created_by: None,
            lines,
            payments: vec![],
        }
    }

    fn line(number: i32) -> SaleLineInput {
        SaleLineInput {
            item_id: Uuid::new_v4(),
            line_number: number,
            description: None,
            quantity: dec!(1),
            unit_price: None,
            discount_amount: None,
            tax_id: None,
        }
    }

    #[test]
    fn empty_line_list_is_rejected() {
        let err = validate_draft(&draft_with_lines(vec![])).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn duplicate_line_numbers_are_rejected() {
        let err = validate_draft(&draft_with_lines(vec![line(1), line(1)])).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn non_positive_quantity_is_rejected() {
        let mut l = line(1);
        l.quantity = dec!(-2);
        let err = validate_draft(&draft_with_lines(vec![l])).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn negative_payment_is_rejected() {
        let mut draft = draft_with_lines(vec![line(1)]);
        draft.payments.push(PaymentInput {
            payment_method: "cash".to_string(),
            amount: dec!(-1),
            currency: "USD".to_string(),
            external_ref: None,
            processed_at: Utc::now(),
        });
        let err = validate_draft(&draft).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn well_formed_draft_passes() {
        assert!(validate_draft(&draft_with_lines(vec![line(1), line(2)])).is_ok());
    }
}
