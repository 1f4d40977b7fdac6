use crate::models::{ErrorCategory, ErrorGroups};
use crate::services::import::conflicts::{CONFLICT_IN_IMPORT, LOCATION_OCCUPIED};
use crate::services::import::gaps::missing_apartments;

pub fn summary_message(success_count: usize, failure_count: usize) -> String {
    format!(
        "Successfully imported {} residents. Failed to import {} resident(s).",
        success_count, failure_count
    )
}

impl ErrorGroups {
    /// Раскладывает сообщения об ошибках по категориям по их тексту
    pub fn from_errors(errors: &[String]) -> Self {
        let mut groups = ErrorGroups::default();
        for error in errors {
            groups.push(classify(error), error.clone());
        }
        groups.group_missing_by_block();
        groups
    }

    pub fn push(&mut self, category: ErrorCategory, message: String) {
        let bucket = match category {
            ErrorCategory::MissingApartment => &mut self.missing_apartments,
            ErrorCategory::MissingBlock => &mut self.missing_blocks,
            ErrorCategory::LocationConflict => &mut self.location_conflicts,
            ErrorCategory::BatchConflict => &mut self.batch_conflicts,
            ErrorCategory::Other => &mut self.other,
        };
        bucket.push(message);
    }

    pub fn group_missing_by_block(&mut self) {
        self.missing_by_block = missing_apartments(&self.missing_apartments);
    }
}

/// Категория по тексту сообщения. Для ошибок строк импорта категорию
/// даёт `RowFailure::category`, разбор текста нужен только для остальных сообщений.
pub fn classify(error: &str) -> ErrorCategory {
    if error.starts_with(CONFLICT_IN_IMPORT) {
        ErrorCategory::BatchConflict
    } else if error.starts_with(LOCATION_OCCUPIED) {
        ErrorCategory::LocationConflict
    } else if error.starts_with("Row ") && error.contains("does not exist in Block") {
        ErrorCategory::MissingApartment
    } else if error.starts_with("Row ") && error.contains("): Block \"") && error.ends_with("\" does not exist") {
        ErrorCategory::MissingBlock
    } else if error.starts_with("Row ") && error.contains("is already occupied") {
        ErrorCategory::LocationConflict
    } else {
        ErrorCategory::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MissingApartments;

    #[test]
    fn test_summary_message() {
        assert_eq!(
            summary_message(3, 1),
            "Successfully imported 3 residents. Failed to import 1 resident(s)."
        );
    }

    #[test]
    fn test_errors_are_grouped_by_category() {
        let errors: Vec<String> = [
            "Invalid data format: Alice,555",
            "Row 3: Missing full name",
            "Conflict in import: Both \"Alice\" and \"Bob\" are being assigned to Block A, Apartment 101",
            "Location already occupied: Block B, Apartment 5 occupied by Carol",
            "Row 4 (Dave): Block B, Apartment 5 is already occupied by Carol",
            "Row 7 (Finn): Block B, Apartment 6 is already occupied",
            "Row 5 (Zed): Block \"Z\" does not exist",
            "Row 6 (Eve): Apartment 999 does not exist in Block A",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let groups = ErrorGroups::from_errors(&errors);

        assert_eq!(groups.other.len(), 2);
        assert_eq!(groups.batch_conflicts.len(), 1);
        assert_eq!(groups.location_conflicts.len(), 3);
        assert_eq!(groups.missing_blocks, vec!["Row 5 (Zed): Block \"Z\" does not exist"]);
        assert_eq!(groups.missing_apartments.len(), 1);
        assert_eq!(
            groups.missing_by_block,
            vec![MissingApartments {
                block: "A".to_string(),
                numbers: vec!["999".to_string()],
            }]
        );
    }

    #[test]
    fn test_names_do_not_steer_classification() {
        // имя жильца содержит текст другой категории
        let name_trap = "Row 2 (Conflict in import): Apartment 7 does not exist in Block A";
        assert_eq!(classify(name_trap), ErrorCategory::MissingApartment);
        assert_eq!(
            classify("Invalid data format: Location already occupied,555"),
            ErrorCategory::Other
        );
    }

    #[test]
    fn test_push_uses_given_category() {
        let mut groups = ErrorGroups::default();
        groups.push(ErrorCategory::MissingApartment, "Row 2 (Eve): Apartment 9 does not exist in Block C".to_string());
        groups.push(ErrorCategory::LocationConflict, "Row 3 (Bob): Block A, Apartment 1 is already occupied".to_string());
        groups.group_missing_by_block();

        assert_eq!(groups.location_conflicts.len(), 1);
        assert_eq!(groups.missing_by_block[0].block, "C");
    }
}
