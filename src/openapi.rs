use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Syndic API",
        version = "1.0.0",
        description = "Backend API для управления кондоминиумом: блоки, квартиры, жильцы, начисления и платежи"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    tags(
        (name = "blocks", description = "Блоки (корпуса)"),
        (name = "apartments", description = "Квартиры и создание недостающих квартир после импорта"),
        (name = "residents", description = "Жильцы, импорт и экспорт CSV"),
        (name = "charges", description = "Статьи начислений"),
        (name = "payments", description = "Платежи жильцов")
    ),
    paths(
        // Blocks
        crate::api::blocks::list_blocks,
        crate::api::blocks::create_block,
        crate::api::blocks::delete_block,
        // Apartments
        crate::api::apartments::list_apartments,
        crate::api::apartments::create_apartment,
        crate::api::apartments::bulk_create_apartments,
        crate::api::apartments::delete_apartment,
        // Residents
        crate::api::residents::list_residents,
        crate::api::residents::create_resident,
        crate::api::residents::get_resident,
        crate::api::residents::update_resident,
        crate::api::residents::delete_resident,
        crate::api::residents::delete_all_residents,
        crate::api::residents::import_residents,
        crate::api::residents::export_residents_csv,
        // Charges
        crate::api::charges::list_charges,
        crate::api::charges::get_charge,
        crate::api::charges::create_charge,
        crate::api::charges::update_charge,
        crate::api::charges::delete_charge,
        // Payments
        crate::api::payments::list_payments,
        crate::api::payments::get_payment,
        crate::api::payments::create_payment,
        crate::api::payments::update_payment,
        crate::api::payments::delete_payment,
    ),
    components(
        schemas(
            crate::api::SuccessResponse,
            // Blocks
            crate::models::Block,
            crate::models::BlockResponse,
            crate::models::CreateBlockRequest,
            // Apartments
            crate::models::Apartment,
            crate::models::ApartmentResponse,
            crate::models::CreateApartmentRequest,
            crate::models::BulkCreateApartmentsRequest,
            crate::models::BulkCreateApartmentsResponse,
            // Residents
            crate::models::Resident,
            crate::models::CreateResidentRequest,
            crate::models::UpdateResidentRequest,
            crate::models::DeleteResidentsResponse,
            crate::models::ImportReport,
            crate::models::ErrorGroups,
            crate::models::MissingApartments,
            // Charges
            crate::models::Charge,
            crate::models::ChargeRequest,
            crate::models::ChargeCategory,
            crate::models::ChargeType,
            crate::models::ChargePeriod,
            // Payments
            crate::models::Payment,
            crate::models::PaymentResponse,
            crate::models::PaymentRequest,
            crate::models::PaymentStatus,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
