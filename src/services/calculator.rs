// src/services/calculator.rs
//
// Pure checkout arithmetic. No I/O: callers load the catalog first and pass
// it in, so identical inputs always produce identical totals.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::dtos::sale::{CreateSaleRequest, SaleLineInput};
use crate::error::AppError;
use crate::models::item::Item;
use crate::models::tax_rate::TaxRate;

/// Currency minor-unit precision. Line totals are rounded here, once,
/// half-up; intermediate values stay exact.
const MINOR_UNIT_DP: u32 = 2;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Authoritative, engine-derived line. Never mutated; superseded entirely on
/// any edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputedLine {
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
    /// Resolved tax reference: the line's explicit tax id, else the item's
    /// default.
    pub tax_id: Option<Uuid>,
    pub line_subtotal: Decimal,
    pub tax_amount: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Decimal,
    pub tax_total: Decimal,
    pub discount_total: Decimal,
    pub grand_total: Decimal,
    pub amount_paid: Decimal,
    pub balance_due: Decimal,
    pub lines: Vec<ComputedLine>,
}

// Caller-supplied magnitudes can overflow Decimal; all arithmetic below is
// checked and reports this instead of panicking.
fn amount_out_of_range() -> AppError {
    AppError::validation("Monetary amount exceeds the supported range")
}

pub fn validate_line(line: &SaleLineInput) -> Result<(), AppError> {
    if line.quantity <= Decimal::ZERO {
        return Err(AppError::validation("Quantity must be greater than 0"));
    }
    if let Some(discount) = line.discount_amount {
        if discount < Decimal::ZERO {
            return Err(AppError::validation("Discount amount cannot be negative"));
        }
    }
    Ok(())
}

/// Computes one line: price defaults from the item, discount applies before
/// tax, tax is a flat percentage of the discounted subtotal.
pub fn calculate_line(
    line: &SaleLineInput,
    item: &Item,
    tax_rate: Option<&TaxRate>,
) -> Result<ComputedLine, AppError> {
    let quantity = line.quantity;
    let unit_price = line.unit_price.unwrap_or(item.default_price);
    let discount = line.discount_amount.unwrap_or(Decimal::ZERO);

    let line_subtotal = quantity
        .checked_mul(unit_price)
        .and_then(|gross| gross.checked_sub(discount))
        .ok_or_else(amount_out_of_range)?;
    if line_subtotal < Decimal::ZERO {
        return Err(AppError::validation(
            "Line subtotal cannot be negative (discount too large)",
        ));
    }

    let tax_amount = match tax_rate {
        Some(rate) => line_subtotal
            .checked_mul(rate.rate_percent)
            .map(|v| v / HUNDRED)
            .ok_or_else(amount_out_of_range)?,
        None => Decimal::ZERO,
    };

    // The single rounding point: half-up to the currency minor unit.
    let line_total = line_subtotal
        .checked_add(tax_amount)
        .ok_or_else(amount_out_of_range)?
        .round_dp_with_strategy(MINOR_UNIT_DP, RoundingStrategy::MidpointAwayFromZero);

    Ok(ComputedLine {
        quantity,
        unit_price,
        discount_amount: discount,
        tax_id: line.tax_id.or(item.tax_id),
        line_subtotal,
        tax_amount,
        line_total,
    })
}

/// Computes authoritative totals for a draft sale against a loaded catalog
/// snapshot.
///
/// A referenced item or tax rate absent from the snapshot is a reference
/// error: the loaders are org-scoped, so absence means the id is stale or
/// belongs to another tenant.
pub fn calculate_sale(
    draft: &CreateSaleRequest,
    items: &[Item],
    tax_rates: &[TaxRate],
) -> Result<SaleTotals, AppError> {
    let item_map: HashMap<Uuid, &Item> = items.iter().map(|i| (i.item_id, i)).collect();
    let tax_map: HashMap<Uuid, &TaxRate> = tax_rates.iter().map(|t| (t.tax_id, t)).collect();

    let mut subtotal = Decimal::ZERO;
    let mut tax_total = Decimal::ZERO;
    let mut discount_total = Decimal::ZERO;
    let mut grand_total = Decimal::ZERO;
    let mut lines = Vec::with_capacity(draft.lines.len());

    for line in &draft.lines {
        let item = item_map
            .get(&line.item_id)
            .ok_or_else(|| AppError::reference(format!("Item not found in this org: {}", line.item_id)))?;

        validate_line(line)?;

        // Auto-fill the tax reference from the item when the line has none.
        let tax_id = line.tax_id.or(item.tax_id);
        let tax_rate = match tax_id {
            Some(id) => Some(
                *tax_map
                    .get(&id)
                    .ok_or_else(|| AppError::reference(format!("Tax rate not found: {id}")))?,
            ),
            None => None,
        };

        let calc = calculate_line(line, item, tax_rate)?;

        // Header subtotal is gross of discounts so that
        // grand_total == subtotal - discount_total + tax_total.
        subtotal = calc
            .line_subtotal
            .checked_add(calc.discount_amount)
            .and_then(|gross| subtotal.checked_add(gross))
            .ok_or_else(amount_out_of_range)?;
        tax_total = tax_total
            .checked_add(calc.tax_amount)
            .ok_or_else(amount_out_of_range)?;
        discount_total = discount_total
            .checked_add(calc.discount_amount)
            .ok_or_else(amount_out_of_range)?;
        grand_total = grand_total
            .checked_add(calc.line_total)
            .ok_or_else(amount_out_of_range)?;

        lines.push(calc);
    }

    let mut amount_paid = Decimal::ZERO;
    for payment in &draft.payments {
        if payment.amount < Decimal::ZERO {
            return Err(AppError::validation("Payment amounts cannot be negative"));
        }
        amount_paid = amount_paid
            .checked_add(payment.amount)
            .ok_or_else(amount_out_of_range)?;
    }

    let balance_due = grand_total
        .checked_sub(amount_paid)
        .ok_or_else(amount_out_of_range)?;

    Ok(SaleTotals {
        subtotal,
        tax_total,
        discount_total,
        grand_total,
        amount_paid,
        balance_due,
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::sale::PaymentInput;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn item(org_id: Uuid, price: Decimal, tax_id: Option<Uuid>) -> Item {
        let now = Utc::now();
        Item {
            item_id: Uuid::new_v4(),
            org_id,
            sku: None,
            name: "Widget".to_string(),
            description: None,
            default_price: price,
            tax_id,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn tax_rate(org_id: Uuid, percent: Decimal) -> TaxRate {
        let now = Utc::now();
        TaxRate {
            tax_id: Uuid::new_v4(),
            org_id,
            name: "Standard".to_string(),
            rate_percent: percent,
            is_compound: false,
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(item_id: Uuid, quantity: Decimal) -> SaleLineInput {
        SaleLineInput {
            item_id,
            line_number: 1,
            description: None,
            quantity,
            unit_price: None,
            discount_amount: None,
            tax_id: None,
        }
    }

    fn draft(lines: Vec<SaleLineInput>, payments: Vec<PaymentInput>) -> CreateSaleRequest {
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
            payments,
        }
    }

    fn payment(amount: Decimal) -> PaymentInput {
        PaymentInput {
            payment_method: "cash".to_string(),
            amount,
            currency: "USD".to_string(),
            external_ref: None,
            processed_at: Utc::now(),
        }
    }

    #[test]
    fn two_units_with_default_tax() {
        // Item at 10.00 with an 8% default rate, quantity 2, one 16.00
        // payment: 20.00 + 1.60 tax, 5.60 still due.
        let org = Uuid::new_v4();
        let rate = tax_rate(org, dec!(8));
        let rate_id = rate.tax_id;
        let it = item(org, dec!(10.00), Some(rate.tax_id));
        let d = draft(vec![line(it.item_id, dec!(2))], vec![payment(dec!(16.00))]);

        let totals = calculate_sale(&d, &[it], &[rate]).unwrap();
        assert_eq!(totals.subtotal, dec!(20.00));
        assert_eq!(totals.tax_total, dec!(1.60));
        assert_eq!(totals.discount_total, dec!(0));
        assert_eq!(totals.grand_total, dec!(21.60));
        assert_eq!(totals.amount_paid, dec!(16.00));
        assert_eq!(totals.balance_due, dec!(5.60));
        assert_eq!(totals.lines.len(), 1);
        assert_eq!(totals.lines[0].line_total, dec!(21.60));
        // Tax reference was auto-filled from the item default.
        assert_eq!(totals.lines[0].tax_id, Some(rate_id));
    }

    #[test]
    fn explicit_price_overrides_item_default() {
        let org = Uuid::new_v4();
        let it = item(org, dec!(10.00), None);
        let mut l = line(it.item_id, dec!(1));
        l.unit_price = Some(dec!(7.50));

        let calc = calculate_line(&l, &it, None).unwrap();
        assert_eq!(calc.unit_price, dec!(7.50));
        assert_eq!(calc.line_total, dec!(7.50));
        assert_eq!(calc.tax_amount, dec!(0));
    }

    #[test]
    fn discount_larger_than_value_is_rejected_not_clamped() {
        let org = Uuid::new_v4();
        let it = item(org, dec!(10.00), None);
        let mut l = line(it.item_id, dec!(1));
        l.discount_amount = Some(dec!(12.00));

        let err = calculate_line(&l, &it, None).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn negative_discount_fails_validation() {
        let it = item(Uuid::new_v4(), dec!(10.00), None);
        let mut l = line(it.item_id, dec!(1));
        l.discount_amount = Some(dec!(-1));
        assert!(matches!(validate_line(&l), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn zero_quantity_fails_validation() {
        let it = item(Uuid::new_v4(), dec!(10.00), None);
        let l = line(it.item_id, dec!(0));
        assert!(matches!(validate_line(&l), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn line_total_rounds_half_up_once() {
        // 19.99 at 8.25%: tax is 1.649175, total 21.639175 -> 21.64.
        let org = Uuid::new_v4();
        let rate = tax_rate(org, dec!(8.25));
        let it = item(org, dec!(19.99), Some(rate.tax_id));
        let l = line(it.item_id, dec!(1));

        let calc = calculate_line(&l, &it, Some(&rate)).unwrap();
        assert_eq!(calc.line_subtotal, dec!(19.99));
        assert_eq!(calc.tax_amount, dec!(1.649175));
        assert_eq!(calc.line_total, dec!(21.64));
    }

    #[test]
    fn unknown_item_is_a_reference_error() {
        let org = Uuid::new_v4();
        let it = item(org, dec!(10.00), None);
        let d = draft(vec![line(Uuid::new_v4(), dec!(1))], vec![]);

        let err = calculate_sale(&d, &[it], &[]).unwrap_err();
        assert!(matches!(err, AppError::Reference(_)));
    }

    #[test]
    fn dangling_tax_reference_is_a_reference_error() {
        // The item's default tax id is auto-filled but the rate was not
        // loadable for this org.
        let org = Uuid::new_v4();
        let it = item(org, dec!(10.00), Some(Uuid::new_v4()));
        let d = draft(vec![line(it.item_id, dec!(1))], vec![]);

        let err = calculate_sale(&d, &[it], &[]).unwrap_err();
        assert!(matches!(err, AppError::Reference(_)));
    }

    #[test]
    fn explicit_tax_reference_wins_over_item_default() {
        let org = Uuid::new_v4();
        let default_rate = tax_rate(org, dec!(8));
        let override_rate = tax_rate(org, dec!(20));
        let it = item(org, dec!(10.00), Some(default_rate.tax_id));
        let mut l = line(it.item_id, dec!(1));
        l.tax_id = Some(override_rate.tax_id);
        let d = draft(vec![l], vec![]);

        let totals = calculate_sale(&d, &[it], &[default_rate, override_rate.clone()]).unwrap();
        assert_eq!(totals.tax_total, dec!(2.00));
        assert_eq!(totals.lines[0].tax_id, Some(override_rate.tax_id));
    }

    #[test]
    fn negative_payment_fails_validation() {
        let org = Uuid::new_v4();
        let it = item(org, dec!(10.00), None);
        let d = draft(vec![line(it.item_id, dec!(1))], vec![payment(dec!(-5))]);

        let err = calculate_sale(&d, &[it], &[]).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn overpayment_yields_negative_balance_due() {
        let org = Uuid::new_v4();
        let it = item(org, dec!(10.00), None);
        let d = draft(vec![line(it.item_id, dec!(1))], vec![payment(dec!(15.00))]);

        let totals = calculate_sale(&d, &[it], &[]).unwrap();
        assert_eq!(totals.balance_due, dec!(-5.00));
    }

    #[test]
    fn calculation_is_idempotent_for_fixed_inputs() {
        let org = Uuid::new_v4();
        let rate = tax_rate(org, dec!(7.5));
        let it = item(org, dec!(3.33), Some(rate.tax_id));
        let mut l = line(it.item_id, dec!(4));
        l.discount_amount = Some(dec!(1.25));
        let d = draft(vec![l], vec![payment(dec!(10.00))]);

        let first = calculate_sale(&d, &[it.clone()], &[rate.clone()]).unwrap();
        let second = calculate_sale(&d, &[it], &[rate]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn totals_invariants_hold_across_mixed_lines() {
        let org = Uuid::new_v4();
        let rate = tax_rate(org, dec!(8.25));
        let taxed = item(org, dec!(19.99), Some(rate.tax_id));
        let untaxed = item(org, dec!(5.00), None);

        let mut discounted = line(taxed.item_id, dec!(3));
        discounted.line_number = 1;
        discounted.discount_amount = Some(dec!(2.50));
        let mut plain = line(untaxed.item_id, dec!(2));
        plain.line_number = 2;

        let d = draft(vec![discounted, plain], vec![payment(dec!(30.00))]);
        let totals = calculate_sale(&d, &[taxed, untaxed], &[rate]).unwrap();

        let line_sum: Decimal = totals.lines.iter().map(|l| l.line_total).sum();
        assert_eq!(totals.grand_total, line_sum);

        // Header identity holds to the currency minor unit.
        let identity = totals.subtotal - totals.discount_total + totals.tax_total;
        let diff = (totals.grand_total - identity).abs();
        assert!(diff < dec!(0.01), "diff was {diff}");

        assert_eq!(totals.balance_due, totals.grand_total - totals.amount_paid);
    }

    #[test]
    fn overflowing_quantity_is_rejected_not_a_panic() {
        // A quantity at the edge of Decimal overflows the multiply; the
        // engine must report it as invalid input, not crash the request.
        let org = Uuid::new_v4();
        let it = item(org, dec!(10.00), None);
        let l = line(it.item_id, Decimal::MAX);

        let err = calculate_line(&l, &it, None).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let d = draft(vec![line(it.item_id, Decimal::MAX)], vec![]);
        let err = calculate_sale(&d, &[it], &[]).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn overflowing_payment_sum_is_rejected() {
        let org = Uuid::new_v4();
        let it = item(org, dec!(10.00), None);
        let d = draft(
            vec![line(it.item_id, dec!(1))],
            vec![payment(Decimal::MAX), payment(Decimal::MAX)],
        );

        let err = calculate_sale(&d, &[it], &[]).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn compound_flag_is_not_stacked() {
        // A compound rate behaves exactly like a simple one.
        let org = Uuid::new_v4();
        let mut rate = tax_rate(org, dec!(10));
        rate.is_compound = true;
        let it = item(org, dec!(10.00), Some(rate.tax_id));
        let l = line(it.item_id, dec!(1));

        let calc = calculate_line(&l, &it, Some(&rate)).unwrap();
        assert_eq!(calc.tax_amount, dec!(1.000));
        assert_eq!(calc.line_total, dec!(11.00));
    }
}
