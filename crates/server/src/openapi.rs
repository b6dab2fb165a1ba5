use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct UserRecordDoc {
    pub username: String,
    pub email: String,
    pub age: i64,
    pub password: String,
    pub is_active: bool,
}

#[derive(ToSchema)]
pub struct PartialRecordDoc {
    pub username: Option<String>,
    pub email: Option<String>,
    pub age: Option<i64>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::users::create_user,
        crate::routes::users::list_users,
        crate::routes::users::get_user,
        crate::routes::users::update_user,
        crate::routes::users::delete_user,
    ),
    components(
        schemas(
            HealthResponse,
            UserRecordDoc,
            PartialRecordDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "users")
    )
)]
pub struct ApiDoc;
