//! Property-based tests of the fiscal invariants.
//!
//! Run with: `cargo test --test proptest_tests`

use chrono::NaiveDate;
use fattura::core::*;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
}

fn company() -> Client {
    ClientBuilder::new("Acme Srl").build()
}

fn professional() -> Client {
    ClientBuilder::new("Studio Bianchi")
        .category(ClientCategory::Professional)
        .withholding(dec!(20))
        .build()
}

fn computed(items: Vec<LineItem>, client: &Client) -> Document {
    let mut builder = DocumentBuilder::new(client.id, date());
    for item in items {
        builder = builder.add_item(item);
    }
    let mut doc = builder.build().unwrap();
    calculate_totals(&mut doc, client, &FiscalPolicies::default());
    doc
}

// ── Proptest Strategies ─────────────────────────────────────────────────────

/// A reasonable price (0.01 to 99999.99).
fn arb_price() -> impl Strategy<Value = Decimal> {
    (1u64..10_000_000u64).prop_map(|cents| Decimal::new(cents as i64, 2))
}

/// A positive quantity with up to 3 decimal places (0.001 to 999.999).
fn arb_quantity() -> impl Strategy<Value = Decimal> {
    (1u64..1_000_000u64).prop_map(|thousandths| Decimal::new(thousandths as i64, 3))
}

fn arb_rate() -> impl Strategy<Value = VatRate> {
    proptest::sample::select(VatRate::ALL.to_vec())
}

fn arb_item() -> impl Strategy<Value = LineItem> {
    (arb_quantity(), arb_price(), arb_rate()).prop_map(|(quantity, price, rate)| {
        LineItemBuilder::new("Voce", quantity, price)
            .vat_rate(rate)
            .build()
    })
}

fn arb_items() -> impl Strategy<Value = Vec<LineItem>> {
    proptest::collection::vec(arb_item(), 1..8)
}

// ── Properties ──────────────────────────────────────────────────────────────

proptest! {
    /// itemTotal == taxableBase + taxAmount, and the tax is the rounded
    /// product of base and rate.
    #[test]
    fn line_identity_holds(items in arb_items()) {
        let client = company();
        let doc = computed(items, &client);

        for item in &doc.items {
            let base = item.taxable_base.unwrap();
            let tax = item.tax_amount.unwrap();
            let total = item.total.unwrap();
            prop_assert_eq!(total, base + tax);
            prop_assert_eq!(tax, round_money(base * item.vat_rate.percent() / dec!(100)));
            // Money values carry at most two decimals.
            prop_assert_eq!(base, round_money(base));
            prop_assert_eq!(tax, round_money(tax));
        }
    }

    /// Document totals are the sums of the per-line figures, and the
    /// breakdown is consistent with them.
    #[test]
    fn document_sums_are_consistent(items in arb_items()) {
        let client = company();
        let doc = computed(items, &client);
        let totals = doc.totals.as_ref().unwrap();

        let base_sum: Decimal = doc.items.iter().filter_map(|i| i.taxable_base).sum();
        let tax_sum: Decimal = doc.items.iter().filter_map(|i| i.tax_amount).sum();
        prop_assert_eq!(totals.taxable_total, base_sum);
        prop_assert_eq!(totals.tax_total, tax_sum);
        prop_assert_eq!(totals.document_total, base_sum + tax_sum);

        let breakdown_tax: Decimal = totals.tax_breakdown.iter().map(|e| e.tax_amount).sum();
        prop_assert_eq!(totals.tax_total, breakdown_tax);

        // Breakdown keys are unique and sorted.
        let rates: Vec<_> = totals.tax_breakdown.iter().map(|e| e.rate).collect();
        let mut sorted = rates.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(rates, sorted);
    }

    /// Withholding is always derived from the taxable total, never from
    /// the VAT-inclusive subtotal.
    #[test]
    fn withholding_base_is_the_taxable_total(items in arb_items()) {
        let client = professional();
        let doc = computed(items, &client);
        let totals = doc.totals.as_ref().unwrap();

        let expected = round_money(totals.taxable_total * dec!(20) / dec!(100));
        prop_assert_eq!(totals.withholding, expected);
        prop_assert_eq!(
            totals.amount_due,
            totals.document_total - totals.withholding + totals.stamp_duty
        );
    }

    /// Split payment suppresses withholding no matter the other flags.
    #[test]
    fn split_payment_never_withholds(items in arb_items()) {
        let client = ClientBuilder::new("Comune")
            .category(ClientCategory::PublicAdministration)
            .withholding(dec!(20))
            .split_payment()
            .build();
        let doc = computed(items, &client);
        let totals = doc.totals.as_ref().unwrap();

        prop_assert_eq!(totals.withholding, Decimal::ZERO);
    }

    /// Flat-rate documents carry zero VAT and zero withholding.
    #[test]
    fn flat_rate_is_vat_and_withholding_free(items in arb_items()) {
        let client = ClientBuilder::new("Forfettario")
            .withholding(dec!(20))
            .flat_rate()
            .build();
        let doc = computed(items, &client);
        let totals = doc.totals.as_ref().unwrap();

        prop_assert_eq!(totals.tax_total, Decimal::ZERO);
        prop_assert_eq!(totals.withholding, Decimal::ZERO);
        for item in &doc.items {
            prop_assert_eq!(item.tax_amount.unwrap(), Decimal::ZERO);
        }
    }

    /// Recomputation on unchanged input is bit-identical.
    #[test]
    fn recomputation_is_idempotent(items in arb_items()) {
        let client = professional();
        let mut doc = computed(items, &client);
        let first = doc.clone();

        calculate_totals(&mut doc, &client, &FiscalPolicies::default());
        prop_assert_eq!(first.totals, doc.totals);
        prop_assert_eq!(first.items, doc.items);
    }

    /// Document numbers render to the external `YYYY/NNN` contract and
    /// parse back to the same value.
    #[test]
    fn number_format_round_trips(year in 1000i32..10_000, ordinal in 1u64..10_000_000) {
        let number = DocumentNumber::new(year, ordinal);
        let rendered = number.to_string();

        let (y, o) = rendered.split_once('/').unwrap();
        prop_assert_eq!(y.len(), 4);
        prop_assert!(o.len() >= 3);
        prop_assert!(y.chars().all(|c| c.is_ascii_digit()));
        prop_assert!(o.chars().all(|c| c.is_ascii_digit()));

        let parsed: DocumentNumber = rendered.parse().unwrap();
        prop_assert_eq!(parsed, number);
    }

    /// The successor ordinal always increments by one, whatever the year.
    #[test]
    fn successor_is_gapless(year in 2000i32..2100, ordinal in 1u64..1_000_000, next_year in 2000i32..2100) {
        let last = DocumentNumber::new(year, ordinal);
        let next = DocumentNumber::successor(Some(&last), next_year);
        prop_assert_eq!(next.ordinal, ordinal + 1);
        prop_assert_eq!(next.year, next_year);
        prop_assert!(last < next);
    }
}
