//! Record to option mapping.

use picklist_types::{OptionEntry, Record};

use crate::error::ConfigurationError;
use crate::templates::FieldTemplate;

/// Pair of compiled templates that turn records into option entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionMapper {
    key: FieldTemplate,
    text: FieldTemplate,
}

impl OptionMapper {
    /// Build a mapper; both templates are required.
    pub fn new(key: Option<FieldTemplate>, text: Option<FieldTemplate>) -> Result<Self, ConfigurationError> {
        match (key, text) {
            (Some(key), Some(text)) => Ok(Self { key, text }),
            _ => Err(ConfigurationError::MissingFieldTemplate),
        }
    }

    pub fn key_template(&self) -> &FieldTemplate {
        &self.key
    }

    pub fn text_template(&self) -> &FieldTemplate {
        &self.text
    }

    pub fn entry(&self, record: &Record) -> OptionEntry {
        OptionEntry::new(self.key.resolve(record), self.text.resolve(record))
    }

    /// One entry per record, in fetch order. No sorting or deduplication.
    pub fn map(&self, records: &[Record]) -> Vec<OptionEntry> {
        records.iter().map(|record| self.entry(record)).collect()
    }
}

/// Map `records` with optional templates, failing when either one is unset.
pub fn map_records(
    records: &[Record],
    key: Option<&FieldTemplate>,
    text: Option<&FieldTemplate>,
) -> Result<Vec<OptionEntry>, ConfigurationError> {
    let mapper = OptionMapper::new(key.cloned(), text.cloned())?;
    Ok(mapper.map(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records() -> Vec<Record> {
        vec![
            Record::from_json(json!({"id": "2", "name": "B", "city": "Oslo"})).expect("record"),
            Record::from_json(json!({"id": "1", "name": "A", "city": "Lima"})).expect("record"),
            Record::from_json(json!({"id": "2", "name": "B again"})).expect("record"),
        ]
    }

    #[test]
    fn preserves_order_and_count() {
        let key = FieldTemplate::parse("id");
        let text = FieldTemplate::parse("${name} (${city})");
        let options = map_records(&records(), Some(&key), Some(&text)).expect("options");
        assert_eq!(options.len(), 3);
        assert_eq!(
            options,
            vec![
                OptionEntry::new("2", "B (Oslo)"),
                OptionEntry::new("1", "A (Lima)"),
                OptionEntry::new("2", "B again ()"),
            ]
        );
    }

    #[test]
    fn missing_template_is_configuration_error() {
        let key = FieldTemplate::parse("id");
        assert_eq!(
            map_records(&records(), Some(&key), None),
            Err(ConfigurationError::MissingFieldTemplate)
        );
        assert_eq!(
            map_records(&records(), None, Some(&key)),
            Err(ConfigurationError::MissingFieldTemplate)
        );
    }

    #[test]
    fn empty_record_list_maps_to_empty_options() {
        let key = FieldTemplate::parse("id");
        let text = FieldTemplate::parse("name");
        assert!(map_records(&[], Some(&key), Some(&text)).expect("options").is_empty());
    }
}
