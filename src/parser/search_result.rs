use serde::{Deserialize, Serialize};

/// One entry extracted from a results page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultRecord {
    title: String,
    link: String,
    description: String,
}

impl ResultRecord {
    /// Field names in serialization order.
    pub const FIELD_NAMES: [&'static str; 3] = ["title", "link", "description"];

    pub fn new(title: impl Into<String>, link: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            description: description.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn field_names(&self) -> [&'static str; 3] {
        Self::FIELD_NAMES
    }

    // value for a named column, empty for anything unknown
    pub fn field(&self, name: &str) -> &str {
        match name {
            "title" => &self.title,
            "link" => &self.link,
            "description" => &self.description,
            _ => "",
        }
    }
}

/// Records in page-then-position order. Duplicates across pages are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultCollection {
    records: Vec<ResultRecord>,
}

impl ResultCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend_page(&mut self, page: Vec<ResultRecord>) {
        self.records.extend(page);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn as_slice(&self) -> &[ResultRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_key_order_matches_field_names() {
        let record = ResultRecord::new("Title", "https://example.com", "Snippet");
        let json = serde_json::to_string(&record).unwrap();
        let title = json.find("\"title\"").unwrap();
        let link = json.find("\"link\"").unwrap();
        let description = json.find("\"description\"").unwrap();
        assert!(title < link && link < description);
    }

    #[test]
    fn test_collection_keeps_duplicates_in_order() {
        let mut collection = ResultCollection::new();
        let a = ResultRecord::new("a", "https://a.example", "first");
        let b = ResultRecord::new("b", "https://b.example", "second");

        collection.extend_page(vec![a.clone(), b.clone()]);
        collection.extend_page(vec![a.clone()]);

        assert_eq!(collection.len(), 3);
        assert_eq!(collection.as_slice(), &[a.clone(), b, a]);
    }

    #[test]
    fn test_field_lookup() {
        let record = ResultRecord::new("t", "l", "d");
        for name in record.field_names() {
            assert!(!record.field(name).is_empty());
        }
        assert_eq!(record.field("missing"), "");
    }
}
