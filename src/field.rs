//! Field registry: the fixed set of deal-ticket fields and their metadata.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Every data slot collected by the ticket form. Ordered by the page the
/// field is entered on; page 4 is the review page and owns no fields.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    #[n(0)]
    BuyingParty,
    #[n(1)]
    SellingParty,
    #[n(2)]
    ProductName,
    #[n(3)]
    UnderlyingCurrency,
    #[n(4)]
    UnderlyingPrice,
    #[n(5)]
    MaturityDate,
    #[n(6)]
    StrikePrice,
    #[n(7)]
    Quantity,
    #[n(8)]
    NotionalCurrency,
}

/// Which check the validation orchestrator runs for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Name lookup against an external collaborator (parties, product).
    Lookup,
    /// Non-negative integer with at least one non-zero digit.
    Integer,
    /// Non-negative decimal with at least one non-zero digit.
    Decimal,
    /// DD/MM/YYYY textual layout.
    Date,
    /// No rule defined yet; a queued validation completes with no verdict.
    Undefined,
}

/// Static per-field metadata. Adding a field to the form means adding a row
/// here, not adding branches elsewhere.
pub struct FieldSpec {
    pub label: &'static str,
    pub helper: &'static str,
    pub page: u8,
    pub rule: Rule,
}

impl Field {
    pub const COUNT: usize = 9;

    pub const ALL: [Field; Self::COUNT] = [
        Field::BuyingParty,
        Field::SellingParty,
        Field::ProductName,
        Field::UnderlyingCurrency,
        Field::UnderlyingPrice,
        Field::MaturityDate,
        Field::StrikePrice,
        Field::Quantity,
        Field::NotionalCurrency,
    ];

    pub fn spec(self) -> &'static FieldSpec {
        match self {
            Field::BuyingParty => &FieldSpec {
                label: "Buying Party",
                helper: "Please enter the buying party.",
                page: 1,
                rule: Rule::Lookup,
            },
            Field::SellingParty => &FieldSpec {
                label: "Selling Party",
                helper: "Please enter the selling party.",
                page: 1,
                rule: Rule::Lookup,
            },
            Field::ProductName => &FieldSpec {
                label: "Product Name",
                helper: "Please enter the product name.",
                page: 1,
                rule: Rule::Lookup,
            },
            Field::UnderlyingCurrency => &FieldSpec {
                label: "Underlying Currency",
                helper: "Please select the underlying currency.",
                page: 2,
                rule: Rule::Undefined,
            },
            Field::UnderlyingPrice => &FieldSpec {
                label: "Underlying Price",
                helper: "Please enter the underlying price.",
                page: 2,
                rule: Rule::Decimal,
            },
            Field::MaturityDate => &FieldSpec {
                label: "Maturity Date",
                helper: "Please enter the maturity date as DD/MM/YYYY.",
                page: 2,
                rule: Rule::Date,
            },
            Field::StrikePrice => &FieldSpec {
                label: "Strike Price",
                helper: "Please enter the strike price.",
                page: 3,
                rule: Rule::Decimal,
            },
            Field::Quantity => &FieldSpec {
                label: "Product Quantity",
                helper: "Please enter the product quantity.",
                page: 3,
                rule: Rule::Integer,
            },
            Field::NotionalCurrency => &FieldSpec {
                label: "Notional Currency",
                helper: "Please select the notional currency.",
                page: 3,
                rule: Rule::Undefined,
            },
        }
    }

    /// Stable wire/key identifier for the field.
    pub fn key(self) -> &'static str {
        match self {
            Field::BuyingParty => "buyingParty",
            Field::SellingParty => "sellingParty",
            Field::ProductName => "productName",
            Field::UnderlyingCurrency => "underlyingCurrency",
            Field::UnderlyingPrice => "underlyingPrice",
            Field::MaturityDate => "maturityDate",
            Field::StrikePrice => "strikePrice",
            Field::Quantity => "quantity",
            Field::NotionalCurrency => "notionalCurrency",
        }
    }

    /// Fields entered on the given page, in registry order.
    pub fn on_page(page: u8) -> impl Iterator<Item = Field> {
        Field::ALL.into_iter().filter(move |f| f.spec().page == page)
    }

    fn index(self) -> usize {
        match self {
            Field::BuyingParty => 0,
            Field::SellingParty => 1,
            Field::ProductName => 2,
            Field::UnderlyingCurrency => 3,
            Field::UnderlyingPrice => 4,
            Field::MaturityDate => 5,
            Field::StrikePrice => 6,
            Field::Quantity => 7,
            Field::NotionalCurrency => 8,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Dense map keyed by [`Field`]. One entry per field, always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap<T>([T; Field::COUNT]);

impl<T> FieldMap<T> {
    pub fn iter(&self) -> impl Iterator<Item = (Field, &T)> {
        Field::ALL.into_iter().map(move |f| (f, &self.0[f.index()]))
    }
}

impl<T: Default> Default for FieldMap<T> {
    fn default() -> Self {
        Self(std::array::from_fn(|_| T::default()))
    }
}

impl<T> Index<Field> for FieldMap<T> {
    type Output = T;

    fn index(&self, field: Field) -> &T {
        &self.0[field.index()]
    }
}

impl<T> IndexMut<Field> for FieldMap<T> {
    fn index_mut(&mut self, field: Field) -> &mut T {
        &mut self.0[field.index()]
    }
}
