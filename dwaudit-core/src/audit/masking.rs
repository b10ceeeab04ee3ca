//! PII masking.
//!
//! Columns whose names look like personal data are replaced wholesale by a
//! sentinel value before auditing. The dispatcher recognizes the sentinel
//! and never reports issues for masked columns.

use crate::Result;
use crate::dataset::{Column, ColumnValues, Dataset};

/// Value substituted for every cell of a masked column.
pub const PII_MASK_SENTINEL: &str = "***PII_MASKED***";

/// Column-name fragments treated as PII.
pub const DEFAULT_PII_KEYWORDS: &[&str] = &[
    // Government identifiers
    "ssn",
    "social",
    "tax_id",
    "national_id",
    // Payment cards
    "credit_card",
    "card_number",
    "cvv",
    "card_holder",
    // Secrets
    "password",
    "passwd",
    "secret",
    "token",
    "api_key",
    // Contact details
    "email",
    "e_mail",
    "mail",
    "phone",
    "mobile",
    "cell",
    "telephone",
    "address",
    "street",
    "zip",
    "postal",
    "zipcode",
    // Documents
    "passport",
    "license",
    "drivers",
    // Banking
    "account_number",
    "routing",
    // Birth dates
    "dob",
    "date_of_birth",
    "birthdate",
    // Compensation
    "salary",
    "wage",
    "income",
    "compensation",
];

/// Returns true when the column's first non-null value is the sentinel.
pub fn is_masked(column: &Column) -> bool {
    column.values().first_non_null_text() == Some(PII_MASK_SENTINEL)
}

/// Returns true when a column name contains a PII keyword.
///
/// Matching is a case-insensitive substring test.
pub fn is_pii_column_name(name: &str, extra_keywords: &[String]) -> bool {
    let lower = name.to_lowercase();
    DEFAULT_PII_KEYWORDS.iter().any(|k| lower.contains(k))
        || extra_keywords
            .iter()
            .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
}

/// Outcome of [`mask_pii_columns`].
#[derive(Debug, Clone)]
pub struct MaskOutcome {
    /// Dataset with PII columns replaced
    pub dataset: Dataset,
    /// Names of the masked columns, in dataset order
    pub masked_columns: Vec<String>,
}

/// Replaces every PII-looking column with the sentinel.
///
/// Returns a new dataset; the input is not modified.
pub fn mask_pii_columns(dataset: &Dataset, extra_keywords: &[String]) -> Result<MaskOutcome> {
    let mut masked_columns = Vec::new();
    let sentinel = vec![Some(PII_MASK_SENTINEL.to_string()); dataset.row_count()];

    let columns = dataset
        .columns()
        .iter()
        .map(|column| {
            if is_pii_column_name(column.name(), extra_keywords) {
                masked_columns.push(column.name().to_string());
                Column::new(column.name(), ColumnValues::Text(sentinel.clone()))
            } else {
                column.clone()
            }
        })
        .collect();

    if !masked_columns.is_empty() {
        tracing::info!(
            "Masked {} PII column(s): {}",
            masked_columns.len(),
            masked_columns.join(", ")
        );
    }

    Ok(MaskOutcome {
        dataset: Dataset::new(columns)?,
        masked_columns,
    })
}
