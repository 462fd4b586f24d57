use crate::dataset::Record;

/// A searchable field of a [`Record`]. Every field except the id is searchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    FirstName,
    MaidenName,
    LastName,
    Age,
    Gender,
    Email,
}

/// Ordered catalog of search fields.
///
/// The order drives the input placeholder, the selector options (valued by
/// position) and the table columns left to right.
pub const FILTERS: [FilterField; 6] = [
    FilterField::FirstName,
    FilterField::MaidenName,
    FilterField::LastName,
    FilterField::Age,
    FilterField::Gender,
    FilterField::Email,
];

pub const ID_HEADER: &str = "ID";

impl FilterField {
    pub fn from_index(idx: usize) -> Option<FilterField> {
        FILTERS.get(idx).copied()
    }

    pub fn index(self) -> usize {
        FILTERS.iter().position(|&f| f == self).unwrap_or(0)
    }

    pub fn code(self) -> &'static str {
        match self {
            FilterField::FirstName => "firstName",
            FilterField::MaidenName => "maidenName",
            FilterField::LastName => "lastName",
            FilterField::Age => "age",
            FilterField::Gender => "gender",
            FilterField::Email => "email",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterField::FirstName => "First Name",
            FilterField::MaidenName => "Maiden Name",
            FilterField::LastName => "Last Name",
            FilterField::Age => "Age",
            FilterField::Gender => "Gender",
            FilterField::Email => "E-mail Address",
        }
    }

    pub fn placeholder(self) -> String {
        format!("Enter {}", self.label())
    }

    /// Raw value of this field as text, numbers in their decimal form.
    pub fn value_of(self, record: &Record) -> String {
        match self {
            FilterField::FirstName => record.first_name.clone(),
            FilterField::MaidenName => record.maiden_name.clone(),
            FilterField::LastName => record.last_name.clone(),
            FilterField::Age => record.age.to_string(),
            FilterField::Gender => record.gender.clone(),
            FilterField::Email => record.email.clone(),
        }
    }

    pub fn next(self) -> FilterField {
        FILTERS[(self.index() + 1) % FILTERS.len()]
    }

    pub fn previous(self) -> FilterField {
        FILTERS[(self.index() + FILTERS.len() - 1) % FILTERS.len()]
    }
}
