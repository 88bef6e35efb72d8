use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::error::FatturaError;
use super::types::*;
use super::validation;

/// Builder for draft documents.
///
/// ```
/// use chrono::NaiveDate;
/// use fattura::core::*;
/// use rust_decimal_macros::dec;
///
/// let client_id = uuid::Uuid::new_v4();
/// let draft = DocumentBuilder::new(client_id, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap())
///     .due_date(NaiveDate::from_ymd_opt(2026, 4, 10).unwrap())
///     .add_item(LineItemBuilder::new("Consulenza fiscale", dec!(10), dec!(100)).build())
///     .build()
///     .unwrap();
/// assert_eq!(draft.status, DocumentStatus::Draft);
/// assert!(draft.number.is_none());
/// ```
pub struct DocumentBuilder {
    doc_type: DocumentType,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    client_id: Uuid,
    items: Vec<LineItem>,
    discount_percent: Option<Decimal>,
    discount_amount: Option<Decimal>,
    original: Option<OriginalRef>,
    reason: Option<String>,
}

impl DocumentBuilder {
    pub fn new(client_id: Uuid, issue_date: NaiveDate) -> Self {
        Self {
            doc_type: DocumentType::Invoice,
            issue_date,
            due_date: None,
            client_id,
            items: Vec::new(),
            discount_percent: None,
            discount_amount: None,
            original: None,
            reason: None,
        }
    }

    pub fn doc_type(mut self, doc_type: DocumentType) -> Self {
        self.doc_type = doc_type;
        self
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn add_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn discount_percent(mut self, percent: Decimal) -> Self {
        self.discount_percent = Some(percent);
        self
    }

    pub fn discount_amount(mut self, amount: Decimal) -> Self {
        self.discount_amount = Some(amount);
        self
    }

    pub fn original(mut self, original: OriginalRef) -> Self {
        self.original = Some(original);
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Build the draft, reporting every violated rule at once.
    ///
    /// Totals are left unset: they require the resolved [`Client`] and are
    /// computed by the engine (or [`super::calculate_totals`] directly).
    pub fn build(self) -> Result<Document, FatturaError> {
        // Input limits to prevent abuse
        if self.items.len() > 10_000 {
            return Err(FatturaError::Forbidden(
                "a document cannot have more than 10,000 line items".into(),
            ));
        }

        let document = self.assemble();
        FatturaError::from_violations(validation::validate_document(&document))?;
        Ok(document)
    }

    /// Build without validation — for tests and for importing external
    /// data that is validated elsewhere.
    pub fn build_unchecked(self) -> Document {
        self.assemble()
    }

    fn assemble(self) -> Document {
        Document {
            id: Uuid::new_v4(),
            number: None,
            doc_type: self.doc_type,
            status: DocumentStatus::Draft,
            issue_date: self.issue_date,
            due_date: self.due_date,
            client_id: self.client_id,
            items: self.items,
            discount_percent: self.discount_percent,
            discount_amount: self.discount_amount,
            original: self.original,
            reason: self.reason,
            totals: None,
        }
    }
}

/// Builder for line items.
pub struct LineItemBuilder {
    description: String,
    quantity: Decimal,
    unit_price: Decimal,
    vat_rate: VatRate,
    discount_percent: Option<Decimal>,
    discount_amount: Option<Decimal>,
}

impl LineItemBuilder {
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            vat_rate: VatRate::Ordinary22,
            discount_percent: None,
            discount_amount: None,
        }
    }

    pub fn vat_rate(mut self, rate: VatRate) -> Self {
        self.vat_rate = rate;
        self
    }

    pub fn discount_percent(mut self, percent: Decimal) -> Self {
        self.discount_percent = Some(percent);
        self
    }

    pub fn discount_amount(mut self, amount: Decimal) -> Self {
        self.discount_amount = Some(amount);
        self
    }

    pub fn build(self) -> LineItem {
        LineItem {
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
            vat_rate: self.vat_rate,
            discount_percent: self.discount_percent,
            discount_amount: self.discount_amount,
            taxable_base: None,
            tax_amount: None,
            total: None,
        }
    }
}

/// Builder for client fiscal profiles.
pub struct ClientBuilder {
    name: String,
    vat_number: Option<String>,
    tax_code: Option<String>,
    category: ClientCategory,
    subject_to_withholding: bool,
    withholding_rate: Decimal,
    withholding_base_portion: Decimal,
    split_payment: bool,
    flat_rate_regime: bool,
}

impl ClientBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vat_number: None,
            tax_code: None,
            category: ClientCategory::Company,
            subject_to_withholding: false,
            withholding_rate: Decimal::ZERO,
            withholding_base_portion: dec!(100),
            split_payment: false,
            flat_rate_regime: false,
        }
    }

    pub fn vat_number(mut self, vat: impl Into<String>) -> Self {
        self.vat_number = Some(vat.into());
        self
    }

    pub fn tax_code(mut self, code: impl Into<String>) -> Self {
        self.tax_code = Some(code.into());
        self
    }

    pub fn category(mut self, category: ClientCategory) -> Self {
        self.category = category;
        self
    }

    /// Mark the client as subject to withholding at the given rate, on the
    /// full taxable base unless [`Self::withholding_base_portion`] says
    /// otherwise.
    pub fn withholding(mut self, rate: Decimal) -> Self {
        self.subject_to_withholding = true;
        self.withholding_rate = rate;
        self
    }

    pub fn withholding_base_portion(mut self, portion: Decimal) -> Self {
        self.withholding_base_portion = portion;
        self
    }

    pub fn split_payment(mut self) -> Self {
        self.split_payment = true;
        self
    }

    pub fn flat_rate(mut self) -> Self {
        self.flat_rate_regime = true;
        self
    }

    pub fn build(self) -> Client {
        Client {
            id: Uuid::new_v4(),
            name: self.name,
            vat_number: self.vat_number,
            tax_code: self.tax_code,
            category: self.category,
            subject_to_withholding: self.subject_to_withholding,
            withholding_rate: self.withholding_rate,
            withholding_base_portion: self.withholding_base_portion,
            split_payment: self.split_payment,
            flat_rate_regime: self.flat_rate_regime,
        }
    }
}
