use crate::domain::model::{DocumentContext, ManualEntry};

/// Queries are accepted once a document is loaded or at least one manual entry exists.
pub fn is_ready(document: Option<&DocumentContext>, manual_entries: &[ManualEntry]) -> bool {
    document.is_some() || !manual_entries.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::MetalType;

    #[test]
    fn test_empty_reference_is_not_ready() {
        assert!(!is_ready(None, &[]));
    }

    #[test]
    fn test_single_manual_entry_makes_ready() {
        let entries = vec![
            ManualEntry::draft("7604", "Bars", "Aluminum bars", MetalType::Aluminum).with_id("a")
        ];
        assert!(is_ready(None, &entries));
    }

    #[test]
    fn test_document_alone_makes_ready() {
        let doc = DocumentContext::from_text("Heading 7308");
        assert!(is_ready(Some(&doc), &[]));
    }
}
