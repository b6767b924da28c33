//! OpenAPI document served at `/openapi.json`.

use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use grievance_core::{Attachment, BatchItemResult, Categorization, Confidence, Grievance};

use crate::handlers;
use crate::handlers::attachments::UploadedAttachment;
use crate::handlers::categorization::CategorizationRequest;
use crate::services::updates::{
    BatchUpdateItem, BatchUpdateRequest, BatchUpdateResponse, StatusUpdateRequest,
    SyncStatusRequest, SyncStatusResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Grievance Service API",
        description = "Grievance intake, status tracking and external case-management sync"
    ),
    paths(
        handlers::health::health_check,
        handlers::grievances::create_grievance,
        handlers::grievances::get_grievance,
        handlers::grievances::export_grievances,
        handlers::grievances::update_status,
        handlers::grievances::receipt_pdf,
        handlers::batch::update_status_batch,
        handlers::sync::push_status,
        handlers::categorization::categorize,
        handlers::attachments::upload_attachment,
    ),
    components(schemas(
        Grievance,
        Attachment,
        BatchItemResult,
        Categorization,
        Confidence,
        StatusUpdateRequest,
        BatchUpdateItem,
        BatchUpdateRequest,
        BatchUpdateResponse,
        SyncStatusRequest,
        SyncStatusResponse,
        CategorizationRequest,
        UploadedAttachment,
    )),
    modifiers(&SyncSecurity),
    tags(
        (name = "Grievances", description = "Grievance records"),
        (name = "Sync", description = "External case-management status push"),
        (name = "Categorization", description = "Category suggestions"),
        (name = "Attachments", description = "File uploads"),
        (name = "System", description = "Health")
    )
)]
pub struct ApiDoc;

struct SyncSecurity;

impl Modify for SyncSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
