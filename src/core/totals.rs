//! Line-item and document totals.
//!
//! All arithmetic runs on [`Decimal`]; money values are rounded to cents
//! half-away-from-zero exactly once, at the money-value boundary. The
//! withholding base is the taxable total — computing it from the
//! VAT-inclusive subtotal is the classic defect this module exists to rule
//! out.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::types::{Client, Document, LineItem, TaxBreakdownEntry, Totals, VatRate};

/// Round to cents, half away from zero (standard currency rounding).
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Ritenuta d'acconto policy.
///
/// Decides applicability from the client's fiscal attributes and computes
/// the amount from the taxable total. Split payment and the flat-rate
/// regime both exclude withholding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WithholdingPolicy;

impl WithholdingPolicy {
    /// Withholding for a document with the given taxable total.
    ///
    /// The base is the taxable total, never the VAT-inclusive subtotal:
    /// imponibile €1000 at 20% gives €200, whatever the VAT on top.
    pub fn assess(&self, client: &Client, taxable_total: Decimal) -> Decimal {
        if client.split_payment || client.flat_rate_regime || !client.subject_to_withholding {
            return Decimal::ZERO;
        }
        let base = taxable_total * client.withholding_base_portion / dec!(100);
        round_money(base * client.withholding_rate / dec!(100))
    }
}

/// Imposta di bollo policy.
///
/// A fixed duty owed on VAT-exempt documents above a statutory threshold,
/// which under the flat-rate regime means every invoice past the
/// threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct StampDutyPolicy {
    /// Fixed duty amount.
    pub amount: Decimal,
    /// Duty applies strictly above this taxable total.
    pub threshold: Decimal,
}

impl Default for StampDutyPolicy {
    fn default() -> Self {
        // Statutory values: €2.00 duty above €77.47.
        Self {
            amount: dec!(2.00),
            threshold: dec!(77.47),
        }
    }
}

impl StampDutyPolicy {
    pub fn assess(&self, client: &Client, taxable_total: Decimal) -> Decimal {
        if client.flat_rate_regime && taxable_total > self.threshold {
            self.amount
        } else {
            Decimal::ZERO
        }
    }
}

/// The pluggable fiscal policies consulted by the aggregator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FiscalPolicies {
    pub withholding: WithholdingPolicy,
    pub stamp_duty: StampDutyPolicy,
}

/// Compute all document totals in place.
///
/// Sets the derived amounts on every line and `document.totals`. The
/// result is a pure function of items, client fiscal attributes and
/// discounts: recomputing on unchanged input is idempotent, bit for bit.
pub fn calculate_totals(document: &mut Document, client: &Client, policies: &FiscalPolicies) {
    // Item bases net of their own discounts, full precision.
    let own_bases: Vec<Decimal> = document.items.iter().map(base_after_item_discounts).collect();

    // Document-level percent discount scales every item alike.
    let percent_factor = match document.discount_percent {
        Some(p) => (dec!(100) - p) / dec!(100),
        None => Decimal::ONE,
    };
    let scaled: Vec<Decimal> = own_bases.iter().map(|b| b * percent_factor).collect();

    // The fixed document discount is split across items in proportion to
    // their bases.
    let scaled_sum: Decimal = scaled.iter().copied().sum();
    let doc_amount = document.discount_amount.unwrap_or(Decimal::ZERO);

    let mut taxable_total = Decimal::ZERO;
    let mut tax_total = Decimal::ZERO;
    let mut groups: BTreeMap<VatRate, (Decimal, Decimal)> = BTreeMap::new();

    for (item, base) in document.items.iter_mut().zip(scaled) {
        let share = if doc_amount.is_zero() || scaled_sum.is_zero() {
            Decimal::ZERO
        } else {
            doc_amount * base / scaled_sum
        };

        // The one rounding point for each money value.
        let taxable_base = round_money(base - share);
        let rate = effective_rate(item, client);
        let tax_amount = round_money(taxable_base * rate.percent() / dec!(100));

        item.taxable_base = Some(taxable_base);
        item.tax_amount = Some(tax_amount);
        item.total = Some(taxable_base + tax_amount);

        taxable_total += taxable_base;
        tax_total += tax_amount;
        let entry = groups.entry(rate).or_insert((Decimal::ZERO, Decimal::ZERO));
        entry.0 += taxable_base;
        entry.1 += tax_amount;
    }

    let document_total = taxable_total + tax_total;
    let withholding = policies.withholding.assess(client, taxable_total);
    let stamp_duty = policies.stamp_duty.assess(client, taxable_total);
    // Stamp duty is added on top; withholding never reduces it.
    let amount_due = document_total - withholding + stamp_duty;

    let tax_breakdown = groups
        .into_iter()
        .map(|(rate, (taxable_amount, tax_amount))| TaxBreakdownEntry {
            rate,
            taxable_amount,
            tax_amount,
        })
        .collect();

    document.totals = Some(Totals {
        taxable_total,
        tax_total,
        document_total,
        withholding,
        stamp_duty,
        amount_due,
        tax_breakdown,
    });
}

/// Item base after the item's own percent and fixed discounts, before the
/// document-level discount and before rounding.
fn base_after_item_discounts(item: &LineItem) -> Decimal {
    let mut base = item.quantity * item.unit_price;
    if let Some(p) = item.discount_percent {
        base -= base * p / dec!(100);
    }
    if let Some(a) = item.discount_amount {
        base -= a;
    }
    base
}

/// Flat-rate issuers charge no output VAT: every line is zero-rated
/// regardless of its nominal rate.
fn effective_rate(item: &LineItem, client: &Client) -> VatRate {
    if client.flat_rate_regime {
        VatRate::Zero
    } else {
        item.vat_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builder::{ClientBuilder, DocumentBuilder, LineItemBuilder};
    use crate::core::types::ClientCategory;
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    fn plain_client() -> Client {
        ClientBuilder::new("Acme Srl").category(ClientCategory::Company).build()
    }

    fn professional() -> Client {
        ClientBuilder::new("Studio Bianchi")
            .category(ClientCategory::Professional)
            .withholding(dec!(20))
            .build()
    }

    fn single_item_doc(client: &Client) -> Document {
        DocumentBuilder::new(client.id, date())
            .add_item(LineItemBuilder::new("Consulenza", dec!(10), dec!(100)).build())
            .build()
            .unwrap()
    }

    #[test]
    fn plain_invoice_totals() {
        let client = plain_client();
        let mut doc = single_item_doc(&client);
        calculate_totals(&mut doc, &client, &FiscalPolicies::default());

        let totals = doc.totals.unwrap();
        assert_eq!(totals.taxable_total, dec!(1000.00));
        assert_eq!(totals.tax_total, dec!(220.00));
        assert_eq!(totals.document_total, dec!(1220.00));
        assert_eq!(totals.withholding, dec!(0));
        assert_eq!(totals.amount_due, dec!(1220.00));
    }

    #[test]
    fn withholding_computed_on_taxable_total() {
        // Imponibile 1000, IVA 220, ritenuta 20% of 1000 = 200 (not 244):
        // due = 1000 + 220 - 200 = 1020.
        let client = professional();
        let mut doc = single_item_doc(&client);
        calculate_totals(&mut doc, &client, &FiscalPolicies::default());

        let totals = doc.totals.unwrap();
        assert_eq!(totals.withholding, dec!(200.00));
        assert_eq!(totals.amount_due, dec!(1020.00));
    }

    #[test]
    fn withholding_base_portion_reduces_the_base() {
        // Commercial-agent style: 23% on half the base.
        let client = ClientBuilder::new("Agente")
            .category(ClientCategory::Professional)
            .withholding(dec!(23))
            .withholding_base_portion(dec!(50))
            .build();
        let mut doc = single_item_doc(&client);
        calculate_totals(&mut doc, &client, &FiscalPolicies::default());

        // 1000 * 50% * 23% = 115
        assert_eq!(doc.totals.unwrap().withholding, dec!(115.00));
    }

    #[test]
    fn split_payment_excludes_withholding() {
        let client = ClientBuilder::new("Comune di Milano")
            .category(ClientCategory::PublicAdministration)
            .withholding(dec!(20))
            .split_payment()
            .build();
        let mut doc = single_item_doc(&client);
        calculate_totals(&mut doc, &client, &FiscalPolicies::default());

        assert_eq!(doc.totals.unwrap().withholding, dec!(0));
    }

    #[test]
    fn flat_rate_zero_vat_zero_withholding_stamp_duty() {
        let client = ClientBuilder::new("Cliente forfettario")
            .category(ClientCategory::Company)
            .withholding(dec!(20))
            .flat_rate()
            .build();
        let mut doc = single_item_doc(&client);
        calculate_totals(&mut doc, &client, &FiscalPolicies::default());

        let totals = doc.totals.unwrap();
        assert_eq!(totals.tax_total, dec!(0));
        assert_eq!(totals.withholding, dec!(0));
        assert_eq!(totals.stamp_duty, dec!(2.00));
        assert_eq!(totals.amount_due, dec!(1002.00));
        // Breakdown collapses to a single zero-rate row.
        assert_eq!(totals.tax_breakdown.len(), 1);
        assert_eq!(totals.tax_breakdown[0].rate, VatRate::Zero);
        assert_eq!(totals.tax_breakdown[0].taxable_amount, dec!(1000.00));
    }

    #[test]
    fn flat_rate_below_threshold_has_no_stamp_duty() {
        let client = ClientBuilder::new("Cliente forfettario")
            .category(ClientCategory::Company)
            .flat_rate()
            .build();
        let mut doc = DocumentBuilder::new(client.id, date())
            .add_item(LineItemBuilder::new("Piccolo lavoro", dec!(1), dec!(77.47)).build())
            .build()
            .unwrap();
        calculate_totals(&mut doc, &client, &FiscalPolicies::default());

        // Exactly at the threshold: duty applies strictly above it.
        assert_eq!(doc.totals.unwrap().stamp_duty, dec!(0));
    }

    #[test]
    fn breakdown_groups_by_rate_sorted() {
        let client = plain_client();
        let mut doc = DocumentBuilder::new(client.id, date())
            .add_item(LineItemBuilder::new("Libri", dec!(3), dec!(20)).vat_rate(VatRate::SuperReduced4).build())
            .add_item(LineItemBuilder::new("Hosting", dec!(1), dec!(100)).build())
            .add_item(LineItemBuilder::new("Alimentari", dec!(2), dec!(15)).vat_rate(VatRate::Reduced10).build())
            .add_item(LineItemBuilder::new("Consulenza", dec!(2), dec!(50)).build())
            .build()
            .unwrap();
        calculate_totals(&mut doc, &client, &FiscalPolicies::default());

        let totals = doc.totals.unwrap();
        let rates: Vec<_> = totals.tax_breakdown.iter().map(|e| e.rate).collect();
        assert_eq!(
            rates,
            vec![VatRate::SuperReduced4, VatRate::Reduced10, VatRate::Ordinary22]
        );
        // 22% group merges the two ordinary-rate lines.
        let ordinary = &totals.tax_breakdown[2];
        assert_eq!(ordinary.taxable_amount, dec!(200.00));
        assert_eq!(ordinary.tax_amount, dec!(44.00));
    }

    #[test]
    fn item_discounts_reduce_the_base() {
        let client = plain_client();
        let mut doc = DocumentBuilder::new(client.id, date())
            .add_item(
                LineItemBuilder::new("Sviluppo", dec!(10), dec!(100))
                    .discount_percent(dec!(10))
                    .discount_amount(dec!(50))
                    .build(),
            )
            .build()
            .unwrap();
        calculate_totals(&mut doc, &client, &FiscalPolicies::default());

        // 1000 - 10% = 900, - 50 = 850
        let totals = doc.totals.unwrap();
        assert_eq!(totals.taxable_total, dec!(850.00));
        assert_eq!(totals.tax_total, dec!(187.00));
    }

    #[test]
    fn document_discount_splits_proportionally() {
        let client = plain_client();
        let mut doc = DocumentBuilder::new(client.id, date())
            .add_item(LineItemBuilder::new("A", dec!(1), dec!(300)).build())
            .add_item(LineItemBuilder::new("B", dec!(1), dec!(100)).build())
            .discount_amount(dec!(40))
            .build()
            .unwrap();
        calculate_totals(&mut doc, &client, &FiscalPolicies::default());

        // 40 split 3:1 across the two lines.
        assert_eq!(doc.items[0].taxable_base, Some(dec!(270.00)));
        assert_eq!(doc.items[1].taxable_base, Some(dec!(90.00)));
        assert_eq!(doc.totals.unwrap().taxable_total, dec!(360.00));
    }

    #[test]
    fn rounding_happens_once_at_the_money_boundary() {
        let client = plain_client();
        // 3 × 0.333 = 0.999 -> base 1.00; tax 22% of 1.00 = 0.22.
        let mut doc = DocumentBuilder::new(client.id, date())
            .add_item(LineItemBuilder::new("Minuteria", dec!(3), dec!(0.333)).build())
            .build()
            .unwrap();
        calculate_totals(&mut doc, &client, &FiscalPolicies::default());

        assert_eq!(doc.items[0].taxable_base, Some(dec!(1.00)));
        assert_eq!(doc.items[0].tax_amount, Some(dec!(0.22)));
        assert_eq!(doc.items[0].total, Some(dec!(1.22)));
    }

    #[test]
    fn half_cent_rounds_away_from_zero() {
        let client = plain_client();
        // 0.25 × 0.10 = 0.025 -> 0.03 under half-away-from-zero.
        let mut doc = DocumentBuilder::new(client.id, date())
            .add_item(LineItemBuilder::new("Mezzo centesimo", dec!(0.25), dec!(0.10)).build())
            .build()
            .unwrap();
        calculate_totals(&mut doc, &client, &FiscalPolicies::default());

        assert_eq!(doc.items[0].taxable_base, Some(dec!(0.03)));
    }

    #[test]
    fn recomputation_is_idempotent() {
        let client = professional();
        let mut doc = DocumentBuilder::new(client.id, date())
            .add_item(
                LineItemBuilder::new("Consulenza", dec!(7), dec!(123.45))
                    .discount_percent(dec!(3))
                    .build(),
            )
            .discount_amount(dec!(11.11))
            .build()
            .unwrap();

        calculate_totals(&mut doc, &client, &FiscalPolicies::default());
        let first = doc.totals.clone().unwrap();
        calculate_totals(&mut doc, &client, &FiscalPolicies::default());
        let second = doc.totals.clone().unwrap();

        assert_eq!(first, second);
    }
}
