use chrono::Datelike;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthOption {
    pub value: &'static str,
    pub label: &'static str,
}

pub const MONTHS: [MonthOption; 12] = [
    MonthOption { value: "01", label: "January" },
    MonthOption { value: "02", label: "February" },
    MonthOption { value: "03", label: "March" },
    MonthOption { value: "04", label: "April" },
    MonthOption { value: "05", label: "May" },
    MonthOption { value: "06", label: "June" },
    MonthOption { value: "07", label: "July" },
    MonthOption { value: "08", label: "August" },
    MonthOption { value: "09", label: "September" },
    MonthOption { value: "10", label: "October" },
    MonthOption { value: "11", label: "November" },
    MonthOption { value: "12", label: "December" },
];

const ABBREVIATIONS: [(&str, &str); 12] = [
    ("jan", "01"),
    ("feb", "02"),
    ("mar", "03"),
    ("apr", "04"),
    ("may", "05"),
    ("jun", "06"),
    ("jul", "07"),
    ("aug", "08"),
    ("sep", "09"),
    ("oct", "10"),
    ("nov", "11"),
    ("dec", "12"),
];

/// Месяц въезда в виде "MM". Порядок: название, значение "01".."12",
/// трёхбуквенное сокращение, число 1..12, иначе текущий месяц.
pub fn parse_month(input: &str, known: &[MonthOption]) -> String {
    let trimmed = input.trim();

    if let Some(month) = known.iter().find(|m| m.label.eq_ignore_ascii_case(trimmed)) {
        return month.value.to_string();
    }
    if let Some(month) = known.iter().find(|m| m.value == trimmed) {
        return month.value.to_string();
    }

    let lower = trimmed.to_ascii_lowercase();
    if let Some((_, value)) = ABBREVIATIONS.iter().find(|(abbr, _)| *abbr == lower) {
        return value.to_string();
    }

    match trimmed.parse::<u32>() {
        Ok(n) if (1..=12).contains(&n) => format!("{:02}", n),
        _ => current_month(),
    }
}

/// Год въезда: четыре цифры в разумных пределах, иначе текущий год
pub fn parse_year(input: &str) -> String {
    let trimmed = input.trim();
    match trimmed.parse::<i32>() {
        Ok(year) if trimmed.len() == 4 && (1900..=2100).contains(&year) => trimmed.to_string(),
        _ => chrono::Local::now().year().to_string(),
    }
}

pub fn month_label(value: &str) -> Option<&'static str> {
    MONTHS
        .iter()
        .find(|m| m.value == value.trim())
        .map(|m| m.label)
}

fn current_month() -> String {
    format!("{:02}", chrono::Local::now().month())
}
