//! Row data and the page response envelope.

use serde::{Deserialize, Serialize};

/// A single row of stream data.
///
/// Stream schemas are server-defined and only known at runtime, so rows are
/// kept as ordered JSON object maps rather than typed structs.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// The envelope returned by data endpoints: `{"data": [...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataPage {
    /// The rows of this page.
    #[serde(default)]
    pub data: Vec<Record>,
}

impl DataPage {
    /// Returns the number of rows in the page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the page holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_deserializes() {
        let page: DataPage =
            serde_json::from_str(r#"{"data":[{"st_id":"a1","value":3}],"meta":null}"#).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page.data[0]["value"], 3);
    }

    #[test]
    fn test_missing_data_field_is_empty() {
        let page: DataPage = serde_json::from_str("{}").unwrap();
        assert!(page.is_empty());
    }
}
