use chrono::NaiveDate;

use crate::error::{AppError, AppResult};
use crate::models::Resident;
use crate::services::import::months::month_label;

pub const MAX_IMPORT_SIZE: usize = 5 * 1024 * 1024; // 5MB

pub const EXPORT_HEADER: [&str; 6] = [
    "Name",
    "Phone",
    "Block",
    "Apartment",
    "Move-in Month",
    "Move-in Year",
];

pub fn validate_import_extension(file_name: &str) -> bool {
    let extension = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    matches!(extension.as_deref(), Some("csv") | Some("tsv"))
}

/// Проверяет загруженный файл до разбора: расширение, размер, кодировка
pub fn read_import_file(file_name: &str, data: &[u8]) -> AppResult<String> {
    if !validate_import_extension(file_name) {
        return Err(AppError::File(
            "Only .csv and .tsv files can be imported".to_string(),
        ));
    }
    if data.len() > MAX_IMPORT_SIZE {
        return Err(AppError::File("File is too large, the limit is 5MB".to_string()));
    }

    let text = std::str::from_utf8(data)
        .map_err(|_| AppError::File("File could not be read as UTF-8 text".to_string()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    if text.trim().is_empty() {
        return Err(AppError::File("File is empty".to_string()));
    }

    Ok(text.to_string())
}

/// CSV со всеми полями в кавычках, коды месяцев заменены названиями
pub fn export_residents(residents: &[Resident]) -> AppResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer
        .write_record(EXPORT_HEADER)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    for resident in residents {
        let month = resident
            .move_in_month
            .as_deref()
            .map(|m| month_label(m).unwrap_or(m))
            .unwrap_or("");
        writer
            .write_record([
                resident.full_name.as_str(),
                resident.phone_number.as_deref().unwrap_or(""),
                resident.block_number.as_str(),
                resident.apartment_number.as_str(),
                month,
                resident.move_in_year.as_deref().unwrap_or(""),
            ])
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("residents_{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_extension_check() {
        assert!(validate_import_extension("residents.csv"));
        assert!(validate_import_extension("RESIDENTS.TSV"));
        assert!(!validate_import_extension("residents.xlsx"));
        assert!(!validate_import_extension("csv"));
    }

    #[test]
    fn test_rejected_files_never_reach_parser() {
        assert!(matches!(read_import_file("a.txt", b"x"), Err(AppError::File(_))));
        assert!(matches!(
            read_import_file("a.csv", &vec![b'a'; MAX_IMPORT_SIZE + 1]),
            Err(AppError::File(_))
        ));
        assert!(matches!(read_import_file("a.csv", &[0xff, 0xfe, 0x00]), Err(AppError::File(_))));
        assert!(matches!(read_import_file("a.csv", b"  \n "), Err(AppError::File(_))));
    }

    #[test]
    fn test_bom_is_stripped() {
        let text = read_import_file("a.csv", "\u{feff}Name,Phone\n".as_bytes()).unwrap();
        assert!(text.starts_with("Name"));
    }

    #[test]
    fn test_export_quotes_every_field() {
        let resident = Resident {
            id: Uuid::new_v4(),
            full_name: "SMITH, JOHN".to_string(),
            phone_number: None,
            block_number: "A".to_string(),
            apartment_number: "101".to_string(),
            move_in_month: Some("03".to_string()),
            move_in_year: Some("2024".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let text = export_residents(&[resident]).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "\"Name\",\"Phone\",\"Block\",\"Apartment\",\"Move-in Month\",\"Move-in Year\""
        );
        assert_eq!(lines[1], "\"SMITH, JOHN\",\"\",\"A\",\"101\",\"March\",\"2024\"");
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 7).unwrap();
        assert_eq!(export_file_name(date), "residents_2024-05-07.csv");
    }
}
