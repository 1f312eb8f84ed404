use indexmap::IndexMap;

use crate::record::{FieldValue, Record, UNKNOWN_LABEL};

// Labels keep the order in which they were first observed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    counts: IndexMap<String, usize>,
}

impl CategoryCounts {
    pub fn increment(&mut self, label: &str) {
        match self.counts.get_mut(label) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(label.to_string(), 1);
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.counts.get(label).copied()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(label, count)| (label.as_str(), *count))
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for CategoryCounts {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        let mut out = Self::default();
        for (label, count) in iter {
            *out.counts.entry(label.into()).or_insert(0) += count;
        }
        out
    }
}

pub fn aggregate(records: &[Record], category_field: &str) -> CategoryCounts {
    let mut counts = CategoryCounts::default();
    for record in records {
        counts.increment(&category_label(record, category_field));
    }
    tracing::debug!(
        records = records.len(),
        categories = counts.len(),
        field = category_field,
        "aggregated status categories"
    );
    counts
}

// Zero, false and empty values count as missing, so the alias is tried next.
fn is_blank(value: &FieldValue) -> bool {
    match value {
        FieldValue::Bool(b) => !b,
        FieldValue::Number(n) => *n == 0.0 || n.is_nan(),
        other => other.is_absent(),
    }
}

pub fn category_label(record: &Record, category_field: &str) -> String {
    let label = match record.resolve_by(category_field, is_blank) {
        Some(FieldValue::Reference(r)) => r.display_name().unwrap_or_else(|| r.to_json().to_string()),
        Some(value) => value.to_string(),
        None => String::new(),
    };
    if label.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(value: &str) -> Record {
        Record::new().with("status", value)
    }

    #[test]
    fn counts_in_first_occurrence_order() {
        let records = vec![status("Open"), status("Open"), status("Closed")];
        let counts = aggregate(&records, "status");
        let pairs: Vec<(&str, usize)> = counts.iter().collect();
        assert_eq!(pairs, vec![("Open", 2), ("Closed", 1)]);
    }

    #[test]
    fn missing_categories_collapse_to_unknown() {
        let records = vec![
            status("Open"),
            Record::new().with("other", "x"),
            Record::new().with("status", FieldValue::Null),
            Record::new().with("OData_status", "Closed"),
        ];
        let counts = aggregate(&records, "status");
        assert_eq!(counts.get("Unknown"), Some(2));
        assert_eq!(counts.get("Closed"), Some(1));
        assert_eq!(counts.total(), records.len());
    }

    #[test]
    fn labels_are_matched_exactly() {
        let records = vec![status("open"), status("Open"), status("Open ")];
        let counts = aggregate(&records, "status");
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn non_text_categories_are_stringified() {
        let records = vec![
            Record::new().with("status", 3i64),
            Record::new().with("status", FieldValue::Bool(true)),
        ];
        let counts = aggregate(&records, "status");
        assert_eq!(counts.get("3"), Some(1));
        assert_eq!(counts.get("true"), Some(1));
    }

    #[test]
    fn zero_and_false_fall_through_to_alias_then_unknown() {
        let records = vec![
            Record::new().with("status", 0i64),
            Record::new().with("status", FieldValue::Bool(false)),
            Record::new()
                .with("status", 0i64)
                .with("OData_status", "Closed"),
            Record::new()
                .with("status", FieldValue::Bool(false))
                .with("OData_status", 0i64),
        ];
        let counts = aggregate(&records, "status");
        assert_eq!(counts.get("Unknown"), Some(3));
        assert_eq!(counts.get("Closed"), Some(1));
        assert_eq!(counts.get("0"), None);
        assert_eq!(counts.get("false"), None);
    }

    #[test]
    fn empty_input_yields_empty_counts() {
        let counts = aggregate(&[], "status");
        assert!(counts.is_empty());
        assert_eq!(counts.total(), 0);
    }
}
