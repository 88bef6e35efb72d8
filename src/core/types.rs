use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::numbering::DocumentNumber;

/// Italian output-VAT rate set (aliquote IVA).
///
/// The rate set is closed: Italian law defines exactly these output rates,
/// so arbitrary percentages are not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VatRate {
    /// 0% — exempt or non-taxable supplies.
    Zero,
    /// 4% — super-reduced rate (basic necessities).
    SuperReduced4,
    /// 5% — reduced rate.
    Reduced5,
    /// 10% — reduced rate.
    Reduced10,
    /// 22% — ordinary rate.
    Ordinary22,
}

impl VatRate {
    /// The rate as a percentage value.
    pub fn percent(&self) -> Decimal {
        match self {
            Self::Zero => Decimal::ZERO,
            Self::SuperReduced4 => dec!(4),
            Self::Reduced5 => dec!(5),
            Self::Reduced10 => dec!(10),
            Self::Ordinary22 => dec!(22),
        }
    }

    /// Parse from a percentage value.
    pub fn from_percent(percent: Decimal) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.percent() == percent)
    }

    /// All rates, ascending.
    pub const ALL: [VatRate; 5] = [
        Self::Zero,
        Self::SuperReduced4,
        Self::Reduced5,
        Self::Reduced10,
        Self::Ordinary22,
    ];
}

impl fmt::Display for VatRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

/// Document kind, tagged with the SDI TipoDocumento code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    /// TD01 — ordinary invoice (fattura).
    Invoice,
    /// TD04 — credit note (nota di credito).
    CreditNote,
    /// TD05 — debit note (nota di debito).
    DebitNote,
}

impl DocumentType {
    /// SDI TipoDocumento code.
    pub fn sdi_code(&self) -> &'static str {
        match self {
            Self::Invoice => "TD01",
            Self::CreditNote => "TD04",
            Self::DebitNote => "TD05",
        }
    }

    /// Parse from an SDI TipoDocumento code.
    pub fn from_sdi_code(code: &str) -> Option<Self> {
        match code {
            "TD01" => Some(Self::Invoice),
            "TD04" => Some(Self::CreditNote),
            "TD05" => Some(Self::DebitNote),
            _ => None,
        }
    }

    /// True for credit and debit notes, which must reference an original
    /// document.
    pub fn is_note(&self) -> bool {
        matches!(self, Self::CreditNote | Self::DebitNote)
    }
}

/// Document lifecycle status. Legal transitions are defined by the
/// closed table behind [`super::can_transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Draft,
    Issued,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Issued => "issued",
            Self::Sent => "sent",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }

    /// Substantive fields (items, client, dates, discounts) may only be
    /// rewritten while the document is a draft.
    pub fn allows_edit(&self) -> bool {
        matches!(self, Self::Draft)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client category, driving the fiscal treatment of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientCategory {
    /// Libero professionista — typically subject to withholding.
    Professional,
    /// Società / ditta.
    Company,
    /// Pubblica amministrazione — typically under split payment.
    PublicAdministration,
}

/// Fiscal attributes of the invoiced party.
///
/// Read-only input to the engine: clients are owned by an external
/// collaborator and resolved by id before any computation. Totals never
/// traverse a live object link to reach them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    /// Partita IVA, when the client has one.
    pub vat_number: Option<String>,
    /// Codice fiscale.
    pub tax_code: Option<String>,
    pub category: ClientCategory,
    /// Whether invoices to this client carry ritenuta d'acconto.
    pub subject_to_withholding: bool,
    /// Withholding percentage (e.g. 20).
    pub withholding_rate: Decimal,
    /// Portion of the taxable base subject to withholding, as a
    /// percentage (100 = full base; e.g. 50 for commercial agents).
    pub withholding_base_portion: Decimal,
    /// Scissione dei pagamenti — VAT remitted directly by the client.
    pub split_payment: bool,
    /// Regime forfettario — no output VAT, no withholding, stamp duty
    /// above the statutory threshold.
    pub flat_rate_regime: bool,
}

/// One invoice line.
///
/// `taxable_base`, `tax_amount` and `total` are derived money values set
/// by [`super::calculate_totals`]; they are never entered by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub description: String,
    /// Quantity. Positive on invoices and debit notes, negative on credit
    /// notes (derived notes carry the original's items negated).
    pub quantity: Decimal,
    /// Unit price, net of VAT. Never negative.
    pub unit_price: Decimal,
    pub vat_rate: VatRate,
    /// Item discount percentage (0–100), applied before the fixed amount.
    pub discount_percent: Option<Decimal>,
    /// Fixed item discount amount.
    pub discount_amount: Option<Decimal>,
    /// Derived: imponibile after all discounts, rounded to cents.
    pub taxable_base: Option<Decimal>,
    /// Derived: IVA on the taxable base, rounded to cents.
    pub tax_amount: Option<Decimal>,
    /// Derived: taxable base + tax amount.
    pub total: Option<Decimal>,
}

/// Reference to the original document a credit or debit note amends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginalRef {
    pub id: Uuid,
    pub number: DocumentNumber,
}

/// Document-level totals, a pure function of items + client fiscal
/// attributes + discounts. Set by [`super::calculate_totals`], never
/// mutated independently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Imponibile — sum of the item taxable bases.
    pub taxable_total: Decimal,
    /// Imposta — sum of the item tax amounts.
    pub tax_total: Decimal,
    /// Totale documento = taxable_total + tax_total, before withholding.
    pub document_total: Decimal,
    /// Ritenuta d'acconto, computed on `taxable_total`.
    pub withholding: Decimal,
    /// Imposta di bollo, when applicable.
    pub stamp_duty: Decimal,
    /// Netto a pagare = document_total − withholding + stamp_duty.
    pub amount_due: Decimal,
    /// Per-rate breakdown, sorted ascending by rate, keys unique.
    pub tax_breakdown: Vec<TaxBreakdownEntry>,
}

/// One row of the per-rate tax breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBreakdownEntry {
    pub rate: VatRate,
    pub taxable_amount: Decimal,
    pub tax_amount: Decimal,
}

/// An invoice, credit note or debit note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    /// Progressive number, assigned exactly once at issuance.
    pub number: Option<DocumentNumber>,
    pub doc_type: DocumentType,
    pub status: DocumentStatus,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    /// The invoiced client, resolved through the client store.
    pub client_id: Uuid,
    pub items: Vec<LineItem>,
    /// Document-level discount percentage (0–100), applied to every item
    /// after its own discounts.
    pub discount_percent: Option<Decimal>,
    /// Document-level fixed discount, split across items in proportion to
    /// their taxable bases.
    pub discount_amount: Option<Decimal>,
    /// Set on credit/debit notes: the amended document.
    pub original: Option<OriginalRef>,
    /// Reason text on credit/debit notes.
    pub reason: Option<String>,
    /// Computed totals; `None` until the aggregator runs.
    pub totals: Option<Totals>,
}

/// Opaque caller identity, used only in logs and audit trails — never in
/// any computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor(String);

impl Actor {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Actor {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vat_rate_round_trip() {
        for rate in VatRate::ALL {
            assert_eq!(VatRate::from_percent(rate.percent()), Some(rate));
        }
        assert_eq!(VatRate::from_percent(dec!(19)), None);
    }

    #[test]
    fn vat_rates_sort_ascending() {
        let mut rates = vec![VatRate::Ordinary22, VatRate::Zero, VatRate::Reduced10];
        rates.sort();
        assert_eq!(
            rates,
            vec![VatRate::Zero, VatRate::Reduced10, VatRate::Ordinary22]
        );
    }

    #[test]
    fn sdi_codes_round_trip() {
        for ty in [
            DocumentType::Invoice,
            DocumentType::CreditNote,
            DocumentType::DebitNote,
        ] {
            assert_eq!(DocumentType::from_sdi_code(ty.sdi_code()), Some(ty));
        }
        assert_eq!(DocumentType::from_sdi_code("TD99"), None);
    }

    #[test]
    fn terminal_states() {
        assert!(DocumentStatus::Paid.is_terminal());
        assert!(DocumentStatus::Cancelled.is_terminal());
        assert!(!DocumentStatus::Issued.is_terminal());
        assert!(DocumentStatus::Draft.allows_edit());
        assert!(!DocumentStatus::Issued.allows_edit());
    }
}
