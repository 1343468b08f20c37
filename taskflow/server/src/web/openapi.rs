use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::analytics::api::v1 as analytics_v1;
use crate::task::api::v1 as task_v1;
use crate::user::api::v1 as user_v1;

/// OpenAPI document for the JSON API.
#[derive(OpenApi)]
#[openapi(
    paths(
        user_v1::register_handler,
        user_v1::login_handler,
        user_v1::profile_handler,
        task_v1::create_task_handler,
        task_v1::get_tasks_handler,
        task_v1::get_task_handler,
        task_v1::update_task_handler,
        task_v1::delete_task_handler,
        analytics_v1::get_user_analytics_handler,
        analytics_v1::get_aggregated_analytics_handler,
    ),
    components(schemas(crate::error::ErrorResponse)),
    modifiers(&BearerAuth),
    tags(
        (name = "Users", description = "Registration, login and profile"),
        (name = "Tasks", description = "Task management"),
        (name = "Analytics", description = "Productivity analytics")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
