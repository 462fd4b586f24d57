use crate::catalog::FilterField;
use crate::dataset::Record;

/// Match predicate of the search input.
///
/// A non-empty gender query must equal the stored gender ignoring case. Every
/// other case is a case-insensitive substring test on the field's text, so an
/// empty query matches everything. The query is used as typed, not trimmed.
pub fn matches(record: &Record, field: FilterField, query: &str) -> bool {
    if field == FilterField::Gender && !query.is_empty() {
        return record.gender.to_lowercase() == query.to_lowercase();
    }
    field
        .value_of(record)
        .to_lowercase()
        .contains(&query.to_lowercase())
}

/// Indices of the records matching `query` in `field`, in their original order.
pub fn filter_records(records: &[Record], field: FilterField, query: &str) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| matches(record, field, query))
        .map(|(idx, _)| idx)
        .collect()
}

/// Splits on single spaces and capitalizes each word.
pub fn title_case(s: &str) -> Vec<String> {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let mut out: String = first.to_uppercase().collect();
                    out.push_str(&chars.as_str().to_lowercase());
                    out
                }
                None => String::new(),
            }
        })
        .collect()
}

/// Cell text for a column. Gender is shown title-cased, words placed back to back.
pub fn display_value(record: &Record, field: FilterField) -> String {
    match field {
        FilterField::Gender => title_case(&record.gender).concat(),
        _ => field.value_of(record),
    }
}

/// Result count line, only shown while a query is entered.
pub fn summary(query: &str, matches: usize) -> Option<String> {
    if query.is_empty() {
        return None;
    }
    let noun = if matches == 1 { "user" } else { "users" };
    Some(format!("{matches} {noun} found"))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::FILTERS;

    pub(crate) fn sample() -> Vec<Record> {
        vec![
            Record {
                id: 1,
                first_name: "John".into(),
                maiden_name: "Doe".into(),
                last_name: "Smith".into(),
                age: 30,
                gender: "M".into(),
                email: "john.smith@example.com".into(),
            },
            Record {
                id: 2,
                first_name: "Jane".into(),
                maiden_name: "Air".into(),
                last_name: "Doe".into(),
                age: 25,
                gender: "F".into(),
                email: "jane.doe@example.com".into(),
            },
        ]
    }

    fn with_ages(ages: &[u32]) -> Vec<Record> {
        ages.iter()
            .enumerate()
            .map(|(idx, &age)| Record {
                id: idx as i64,
                first_name: format!("User{idx}"),
                maiden_name: String::new(),
                last_name: String::new(),
                age,
                gender: "female".into(),
                email: format!("user{idx}@example.com"),
            })
            .collect()
    }

    #[test]
    fn empty_query_keeps_everything_in_order() {
        let records = sample();
        for field in FILTERS {
            assert_eq!(filter_records(&records, field, ""), vec![0, 1]);
        }
    }

    #[test]
    fn first_name_is_case_insensitive_substring() {
        let records = sample();
        assert_eq!(filter_records(&records, FilterField::FirstName, "Jane"), vec![1]);
        assert_eq!(filter_records(&records, FilterField::FirstName, "jA"), vec![1]);
        assert_eq!(filter_records(&records, FilterField::FirstName, "J"), vec![0, 1]);
        assert!(filter_records(&records, FilterField::FirstName, "Bob").is_empty());
    }

    #[test]
    fn maiden_name_filter() {
        let records = sample();
        assert_eq!(filter_records(&records, FilterField::MaidenName, "Doe"), vec![0]);
        assert_eq!(filter_records(&records, FilterField::LastName, "Doe"), vec![1]);
    }

    #[test]
    fn gender_requires_exact_match() {
        let records = sample();
        assert_eq!(filter_records(&records, FilterField::Gender, "F"), vec![1]);
        assert_eq!(filter_records(&records, FilterField::Gender, "m"), vec![0]);

        let long = with_ages(&[20]);
        assert!(filter_records(&long, FilterField::Gender, "fem").is_empty());
        assert_eq!(filter_records(&long, FilterField::Gender, "FEMALE"), vec![0]);
        // Substring matching would let "male" hit "female"
        assert!(filter_records(&long, FilterField::Gender, "male").is_empty());
    }

    #[test]
    fn age_matches_on_decimal_text() {
        let records = with_ages(&[30, 3, 42, 13]);
        assert_eq!(filter_records(&records, FilterField::Age, "3"), vec![0, 1, 3]);
        assert_eq!(filter_records(&records, FilterField::Age, "42"), vec![2]);
    }

    #[test]
    fn whitespace_is_significant() {
        let records = sample();
        assert!(filter_records(&records, FilterField::FirstName, " Jane").is_empty());
        assert!(filter_records(&records, FilterField::Gender, "F ").is_empty());
    }

    #[test]
    fn email_filter() {
        let records = sample();
        assert_eq!(filter_records(&records, FilterField::Email, "SMITH@"), vec![0]);
        assert_eq!(filter_records(&records, FilterField::Email, "example.com"), vec![0, 1]);
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("m"), vec!["M"]);
        assert_eq!(title_case("female"), vec!["Female"]);
        assert_eq!(title_case("MALE"), vec!["Male"]);
        assert_eq!(title_case("non BINARY"), vec!["Non", "Binary"]);
        assert_eq!(title_case("a  b"), vec!["A", "", "B"]);
        assert_eq!(title_case(""), vec![""]);
    }

    #[test]
    fn gender_display_only() {
        let mut record = sample().remove(0);
        record.gender = "non binary".into();
        assert_eq!(display_value(&record, FilterField::Gender), "NonBinary");
        assert_eq!(display_value(&record, FilterField::Age), "30");
        // Display does not change what is stored or matched
        assert!(matches(&record, FilterField::Gender, "NON BINARY"));
        assert!(!matches(&record, FilterField::Gender, "NonBinary"));
    }

    #[test]
    fn summary_text() {
        assert_eq!(summary("", 0), None);
        assert_eq!(summary("", 2), None);
        assert_eq!(summary("a", 0).as_deref(), Some("0 users found"));
        assert_eq!(summary("a", 1).as_deref(), Some("1 user found"));
        assert_eq!(summary("a", 2).as_deref(), Some("2 users found"));
    }
}
