use serde::Serialize;
use utoipa::ToSchema;

/// Итог импорта жильцов из CSV
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ImportReport {
    /// Строки данных в файле (без заголовка и пустых строк)
    pub total_rows: usize,
    pub success_count: usize,
    /// Отклонённые при разборе и проверке строки плюс неудачные создания
    pub failure_count: usize,
    pub summary: String,
    pub errors: Vec<String>,
    pub groups: ErrorGroups,
    /// Занятые помещения после импорта
    pub occupied_units: usize,
    /// Были ли перечитаны жильцы и данные по блокам после импорта
    pub refreshed: bool,
}

/// Ошибки импорта по категориям, чтобы оператор мог действовать по каждой
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ErrorGroups {
    pub missing_apartments: Vec<String>,
    pub missing_blocks: Vec<String>,
    pub location_conflicts: Vec<String>,
    pub batch_conflicts: Vec<String>,
    pub other: Vec<String>,
    /// Недостающие квартиры, сгруппированные по блоку, для массового создания
    pub missing_by_block: Vec<MissingApartments>,
}

/// Категория ошибки импорта
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    MissingApartment,
    MissingBlock,
    LocationConflict,
    BatchConflict,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MissingApartments {
    pub block: String,
    pub numbers: Vec<String>,
}
