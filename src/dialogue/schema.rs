//! Field schema registry: the closed catalog of fields the dialogue fills.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Normalization rule applied to an accepted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Normalizer {
    #[default]
    None,
    /// Monetary amount rendered with exactly two decimals.
    Currency2dp,
    /// Nine-digit identifier, separators dropped.
    SsnDigitsOnly,
    /// Canonical `Yes` / `No`.
    BoolYesNo,
}

/// One target field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub normalizer: Normalizer,
}

impl FieldSpec {
    pub fn new(name: &str, description: &str, example: Option<&str>, normalizer: Normalizer) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            example: example.map(String::from),
            normalizer,
        }
    }
}

/// Read-only, ordered set of valid fields.
///
/// Shared between the validator and the controller; never mutated after
/// construction.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<FieldSpec>,
    index: HashMap<String, usize>,
}

impl FieldRegistry {
    /// Build a registry, rejecting empty schemas, blank names and duplicates.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }

        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(SchemaError::BlankName { index: i });
            }
            if index.insert(field.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateName(field.name.clone()));
            }
        }

        Ok(Self { fields, index })
    }

    /// Parse a JSON array of `FieldSpec`.
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        let fields: Vec<FieldSpec> = serde_json::from_str(json)?;
        Self::new(fields)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, SchemaError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn is_valid(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn example_for(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|f| f.example.as_deref())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The built-in US Form 1040 catalog.
    pub fn form_1040() -> Self {
        use Normalizer as N;

        let fields = vec![
            FieldSpec::new(
                "filingStatus",
                "Filing status of the taxpayer: Single, Married Filing Jointly, Married Filing Separately, Head of Household, or Qualifying Widow(er)",
                Some("Single"),
                N::None,
            ),
            FieldSpec::new("spouseSsn", "Social Security Number of the spouse", Some("123-45-6789"), N::SsnDigitsOnly),
            FieldSpec::new("spouseFirstName", "First name of the spouse, if filing jointly or separately", Some("Jane"), N::None),
            FieldSpec::new("spouseLastName", "Last name of the spouse", Some("Doe"), N::None),
            FieldSpec::new("didReceiveOrDispose", "Whether the taxpayer received or disposed of digital assets (Yes/No)", Some("No"), N::BoolYesNo),
            FieldSpec::new("adjustedGrossIncome", "Adjusted Gross Income: total income minus adjustments", Some("72500.00"), N::Currency2dp),
            FieldSpec::new("standardDeduction", "Standard deduction amount based on filing status", Some("13850.00"), N::Currency2dp),
            FieldSpec::new("taxableIncome", "Taxable income: AGI minus deductions", Some("57350.00"), N::Currency2dp),
            FieldSpec::new("childTaxCredit", "Child Tax Credit claimed for qualifying children under 17", Some("2000.00"), N::Currency2dp),
            FieldSpec::new("otherCredits", "Other nonrefundable credits, such as the Lifetime Learning Credit", Some("500.00"), N::Currency2dp),
            FieldSpec::new("totalTax", "Total tax liability after nonrefundable credits", Some("3235.00"), N::Currency2dp),
            FieldSpec::new("earnedIncomeCredit", "Refundable credits such as the Earned Income Credit", Some("500.00"), N::Currency2dp),
            FieldSpec::new("foreign_country_name", "Name of the foreign country, if the address is abroad", Some("Canada"), N::None),
            FieldSpec::new("foreign_province_state_county", "Province, state, or county of the foreign address", Some("Ontario"), N::None),
            FieldSpec::new("foreign_postal_code", "Postal code of the foreign address", Some("M5V 2T6"), N::None),
            FieldSpec::new("dependent_ssn", "Social Security Number of the dependent", Some("987-65-4321"), N::SsnDigitsOnly),
            FieldSpec::new("dependent_relationship", "Relationship of the dependent to the taxpayer (Son, Daughter, Parent, ...)", Some("Daughter"), N::None),
            FieldSpec::new("household_employee_wages", "Wages paid to household employees", Some("0.00"), N::Currency2dp),
            FieldSpec::new("tip_income_not_reported", "Tip income not reported to the employer", Some("150.00"), N::Currency2dp),
            FieldSpec::new("medicaid_waiver_payments", "Medicaid waiver payments received", Some("0.00"), N::Currency2dp),
            FieldSpec::new("taxable_dependent_care_benefits", "Taxable portion of dependent care benefits", Some("0.00"), N::Currency2dp),
            FieldSpec::new("employer_provided_adoption_benefits", "Employer-provided adoption benefits", Some("0.00"), N::Currency2dp),
            FieldSpec::new("wages_from_form_8919", "Wages reported on Form 8919", Some("0.00"), N::Currency2dp),
            FieldSpec::new("other_earned_income", "Other earned income not included elsewhere", Some("250.00"), N::Currency2dp),
            FieldSpec::new("nontaxable_combat_pay", "Nontaxable combat pay received", Some("0.00"), N::Currency2dp),
            FieldSpec::new("total_income_line_1z", "Total income on line 1z", Some("74500.00"), N::Currency2dp),
            FieldSpec::new("tax_exempt_interest", "Tax-exempt interest received, e.g. from municipal bonds", Some("200.00"), N::Currency2dp),
            FieldSpec::new("taxable_interest", "Taxable interest received, as reported on Form 1099-INT", Some("500.00"), N::Currency2dp),
            FieldSpec::new("qualified_dividends", "Dividends that qualify for lower capital gains rates (Form 1099-DIV)", Some("600.00"), N::Currency2dp),
            FieldSpec::new("ordinary_dividends", "Total ordinary dividends received (Form 1099-DIV)", Some("1000.00"), N::Currency2dp),
            FieldSpec::new("ira_distributions", "Total distributions from IRAs (Form 1099-R)", Some("5000.00"), N::Currency2dp),
            FieldSpec::new("taxable_ira_distributions", "Taxable portion of IRA distributions", Some("5000.00"), N::Currency2dp),
            FieldSpec::new("pensions_and_annuities", "Total pensions and annuities received", Some("12000.00"), N::Currency2dp),
            FieldSpec::new("taxable_pensions_and_annuities", "Taxable portion of pensions and annuities", Some("12000.00"), N::Currency2dp),
        ];

        // The literal list above is checked by `form_1040_is_well_formed`.
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        Self { fields, index }
    }
}
