//! # fattura
//!
//! Italian invoicing fiscal engine: document totals (imponibile, IVA,
//! ritenuta d'acconto, bollo), lifecycle state machine, progressive
//! numbering and credit/debit note derivation.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating
//! point. Computation is pure: totals are a function of the line items
//! and the client's fiscal attributes, resolved by id and injected by the
//! caller. The one piece of shared mutable state is the progressive
//! number sequence, guarded by the allocator.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use fattura::core::*;
//! use rust_decimal_macros::dec;
//!
//! let client = ClientBuilder::new("Studio Rossi")
//!     .category(ClientCategory::Professional)
//!     .vat_number("12345678903")
//!     .withholding(dec!(20))
//!     .build();
//!
//! let mut draft = DocumentBuilder::new(client.id, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap())
//!     .add_item(LineItemBuilder::new("Consulenza fiscale", dec!(10), dec!(100)).build())
//!     .build()
//!     .unwrap();
//!
//! calculate_totals(&mut draft, &client, &FiscalPolicies::default());
//! let totals = draft.totals.unwrap();
//! assert_eq!(totals.taxable_total, dec!(1000.00));
//! assert_eq!(totals.tax_total, dec!(220.00));
//! // Withholding on the taxable base, not on the VAT-inclusive total.
//! assert_eq!(totals.withholding, dec!(200.00));
//! assert_eq!(totals.amount_due, dec!(1020.00));
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`core`] | Document model, totals, lifecycle, numbering, notes |
//! | [`fiscal`] | Partita IVA and codice fiscale checksum validators |
//! | [`store`] | Persistence contracts + in-memory backends |
//! | [`engine`] | Workflow orchestration over the stores |

pub mod core;
pub mod engine;
pub mod fiscal;
pub mod store;

// Re-export core types at crate root for convenience
pub use crate::core::*;
pub use crate::engine::InvoiceEngine;
