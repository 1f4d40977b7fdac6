/// Минимальное число колонок: имя, телефон, блок, квартира
pub const MIN_FIELDS: usize = 4;

/// Строка данных CSV вместе с номером строки в файле (заголовок считается строкой 1)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRow {
    pub line: usize,
    pub fields: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedCsv {
    pub rows: Vec<CsvRow>,
    pub errors: Vec<String>,
}

/// Разбирает текст файла построчно. Первая строка является заголовком, пустые строки пропускаются,
/// строки с недостаточным числом колонок попадают в `errors`, разбор продолжается.
pub fn parse_csv(text: &str) -> ParsedCsv {
    let mut parsed = ParsedCsv::default();

    for (index, line) in text.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        match split_fields(line) {
            Some(fields) if fields.len() >= MIN_FIELDS => parsed.rows.push(CsvRow {
                line: index + 1,
                fields,
            }),
            _ => parsed.errors.push(format!("Invalid data format: {}", line)),
        }
    }

    parsed
}

fn split_fields(line: &str) -> Option<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    let record = reader.records().next()?.ok()?;
    Some(record.iter().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "full_name,phone_number,block_number,apartment_number,move_in_month,move_in_year";

    #[test]
    fn test_header_is_skipped_and_rows_counted() {
        let text = format!(
            "{}\nAlice,555,A,101,Jan,2024\n\nBob,556,A,102\n   \nCarol,557,B,5,March,2023\n",
            HEADER
        );
        let parsed = parse_csv(&text);

        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows.len(), 3);
        assert_eq!(parsed.rows[0].line, 2);
        assert_eq!(parsed.rows[1].fields, vec!["Bob", "556", "A", "102"]);
        assert_eq!(parsed.rows[2].line, 6);
    }

    #[test]
    fn test_quoted_field_keeps_embedded_comma() {
        let text = format!("{}\n\"Smith, John\",\"555, ext 2\",A,101,Feb,2024", HEADER);
        let parsed = parse_csv(&text);

        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows[0].fields[0], "Smith, John");
        assert_eq!(parsed.rows[0].fields[1], "555, ext 2");
        assert_eq!(parsed.rows[0].fields.len(), 6);
    }

    #[test]
    fn test_short_row_is_reported_and_parsing_continues() {
        let text = format!("{}\nAlice,555,A\nBob,556,A,102,Jan,2024\r\n", HEADER);
        let parsed = parse_csv(&text);

        assert_eq!(parsed.errors, vec!["Invalid data format: Alice,555,A"]);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].fields[0], "Bob");
    }

    #[test]
    fn test_empty_quoted_fields_count_as_columns() {
        let parsed = parse_csv(&format!("{}\n\"\",\"\",\"\",\"\"", HEADER));
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows[0].fields, vec!["", "", "", ""]);
    }

    #[test]
    fn test_header_only_file() {
        let parsed = parse_csv(HEADER);
        assert!(parsed.rows.is_empty());
        assert!(parsed.errors.is_empty());
    }

    #[test]
    fn test_every_well_formed_line_becomes_a_row() {
        let mut text = String::from(HEADER);
        let mut expected = 0;
        for i in 0..50 {
            if i % 7 == 0 {
                text.push_str("\n");
                continue;
            }
            text.push_str(&format!("\n\"Resident, {}\",{},B{},{},Jan,2020", i, i, i % 3, i));
            expected += 1;
        }
        let parsed = parse_csv(&text);
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.rows.len(), expected);
    }
}
