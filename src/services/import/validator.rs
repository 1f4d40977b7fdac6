use crate::models::NewResident;
use crate::services::import::months::{parse_month, parse_year, MONTHS};
use crate::services::import::parser::{CsvRow, MIN_FIELDS};
use crate::services::occupancy::OccupancyKey;
use crate::utils::validators::non_blank;

/// Ограничения длины совпадают с размерами колонок таблицы residents
const MAX_NAME_LEN: usize = 200;
const MAX_PHONE_LEN: usize = 32;
const MAX_BLOCK_LEN: usize = 32;
const MAX_APARTMENT_LEN: usize = 16;

/// Строка импорта, прошедшая проверку обязательных полей
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub line: usize,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub block_number: String,
    pub apartment_number: String,
    pub move_in_month: Option<String>,
    pub move_in_year: Option<String>,
}

impl ImportRow {
    pub fn key(&self) -> OccupancyKey {
        OccupancyKey::new(&self.block_number, &self.apartment_number)
    }

    /// Данные для создания: имя в верхнем регистре, период въезда нормализован
    pub fn to_new_resident(&self) -> NewResident {
        NewResident {
            full_name: self.full_name.to_uppercase(),
            phone_number: self.phone_number.clone(),
            block_number: self.block_number.clone(),
            apartment_number: self.apartment_number.clone(),
            move_in_month: parse_month(self.move_in_month.as_deref().unwrap_or(""), &MONTHS),
            move_in_year: parse_year(self.move_in_year.as_deref().unwrap_or("")),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidatedRows {
    pub valid_rows: Vec<ImportRow>,
    pub validation_errors: Vec<String>,
}

/// Проверяет каждую строку независимо; порядок строк сохраняется в обоих списках
pub fn validate_rows(rows: &[CsvRow]) -> ValidatedRows {
    let mut validated = ValidatedRows::default();
    for row in rows {
        match validate_row(row) {
            Ok(valid) => validated.valid_rows.push(valid),
            Err(message) => validated.validation_errors.push(message),
        }
    }
    validated
}

fn validate_row(row: &CsvRow) -> Result<ImportRow, String> {
    let field = |index: usize| non_blank(row.fields.get(index).map(String::as_str));

    if row.fields.len() < MIN_FIELDS {
        return Err(format!(
            "Row {}: Invalid data format, expected at least {} columns but found {}",
            row.line,
            MIN_FIELDS,
            row.fields.len()
        ));
    }

    let full_name = field(0).ok_or_else(|| format!("Row {}: Missing full name", row.line))?;
    let block_number = field(2)
        .ok_or_else(|| format!("Row {} ({}): Missing block number", row.line, full_name))?;
    let apartment_number = field(3)
        .ok_or_else(|| format!("Row {} ({}): Missing apartment number", row.line, full_name))?;

    if full_name.chars().count() > MAX_NAME_LEN {
        return Err(format!(
            "Row {}: Full name is longer than {} characters",
            row.line, MAX_NAME_LEN
        ));
    }
    let phone_number = field(1);
    let too_long = [
        ("Phone number", phone_number.as_deref().unwrap_or(""), MAX_PHONE_LEN),
        ("Block number", block_number.as_str(), MAX_BLOCK_LEN),
        ("Apartment number", apartment_number.as_str(), MAX_APARTMENT_LEN),
    ]
    .into_iter()
    .find(|(_, value, max)| value.chars().count() > *max);
    if let Some((label, _, max)) = too_long {
        return Err(format!(
            "Row {} ({}): {} is longer than {} characters",
            row.line, full_name, label, max
        ));
    }

    Ok(ImportRow {
        line: row.line,
        full_name,
        phone_number,
        block_number,
        apartment_number,
        move_in_month: field(4),
        move_in_year: field(5),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(line: usize, fields: &[&str]) -> CsvRow {
        CsvRow {
            line,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_partition_preserves_order() {
        let rows = vec![
            row(2, &["Alice", "555", "A", "101", "Jan", "2024"]),
            row(3, &["", "555", "A", "102"]),
            row(4, &["Bob", "", "A", "103"]),
            row(5, &["Carol", "555", " ", "104"]),
            row(6, &["Dave", "555", "B", ""]),
            row(7, &["Eve", "555", "B", "1"]),
        ];
        let validated = validate_rows(&rows);

        let names: Vec<&str> = validated.valid_rows.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob", "Eve"]);
        assert_eq!(
            validated.validation_errors,
            vec![
                "Row 3: Missing full name",
                "Row 5 (Carol): Missing block number",
                "Row 6 (Dave): Missing apartment number",
            ]
        );
    }

    #[test]
    fn test_rows_missing_required_fields_are_never_valid() {
        let cases: [&[&str]; 4] = [
            &["  ", "1", "A", "1"],
            &["X", "1", "", "1"],
            &["X", "1", "A", "   "],
            &["X", "1", "A"],
        ];
        for fields in cases {
            let validated = validate_rows(&[row(2, fields)]);
            assert!(validated.valid_rows.is_empty(), "{:?}", fields);
            assert_eq!(validated.validation_errors.len(), 1);
        }
    }

    #[test]
    fn test_optional_columns() {
        let validated = validate_rows(&[row(2, &["Alice", " ", "A", "101"])]);
        let alice = &validated.valid_rows[0];
        assert_eq!(alice.phone_number, None);
        assert_eq!(alice.move_in_month, None);
        assert_eq!(alice.move_in_year, None);
    }

    #[test]
    fn test_new_resident_payload() {
        let validated = validate_rows(&[row(2, &["alice smith", "555", "A", "101", "feb", "2024"])]);
        let payload = validated.valid_rows[0].to_new_resident();
        assert_eq!(payload.full_name, "ALICE SMITH");
        assert_eq!(payload.move_in_month, "02");
        assert_eq!(payload.move_in_year, "2024");
        assert_eq!(payload.phone_number.as_deref(), Some("555"));
    }

    #[test]
    fn test_values_longer_than_columns_are_rejected() {
        let long_name = "N".repeat(201);
        let long_phone = "5".repeat(33);
        let rows = vec![
            row(2, &[long_name.as_str(), "555", "A", "101"]),
            row(3, &["Bob", long_phone.as_str(), "A", "101"]),
            row(4, &["Carol", "555", "A", "12345678901234567"]),
            row(5, &["Dave", "555", "A", "1234567890123456"]),
        ];
        let validated = validate_rows(&rows);

        assert_eq!(
            validated.validation_errors,
            vec![
                "Row 2: Full name is longer than 200 characters",
                "Row 3 (Bob): Phone number is longer than 32 characters",
                "Row 4 (Carol): Apartment number is longer than 16 characters",
            ]
        );
        assert_eq!(validated.valid_rows.len(), 1);
    }
}
