use std::collections::BTreeMap;

use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use service::users::{Listing, PartialRecord, UserId, UserRecord};
use tracing::info;

use crate::errors::JsonApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub message: String,
    pub user_id: UserId,
    pub user: UserRecord,
}

/// `users` is `[]` when the store is empty and an id-keyed object otherwise.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum UsersPayload {
    None(Vec<UserRecord>),
    All(BTreeMap<UserId, UserRecord>),
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub message: String,
    pub users: UsersPayload,
}

#[derive(Debug, Serialize)]
pub struct FoundUser {
    pub user_id: UserId,
    pub user: UserRecord,
}

#[derive(Debug, Serialize)]
pub struct UpdatedUser {
    pub message: String,
    pub updated_user: UserRecord,
}

#[derive(Debug, Serialize)]
pub struct DeletedUser {
    pub message: String,
    pub deleted_user: UserRecord,
}

impl From<Listing> for UserList {
    fn from(listing: Listing) -> Self {
        match listing {
            Listing::Empty => Self {
                message: "No users found!".into(),
                users: UsersPayload::None(Vec::new()),
            },
            Listing::Users(users) => Self {
                message: format!("total users: {}", users.len()),
                users: UsersPayload::All(users),
            },
        }
    }
}

/// 创建用户
#[utoipa::path(post, path = "/users/", tag = "users", request_body = crate::openapi::UserRecordDoc, responses((status = 200, description = "Created"), (status = 422, description = "Invalid body")))]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(record): JsonBody<UserRecord>,
) -> Result<Json<CreatedUser>, JsonApiError> {
    let (user_id, user) = state.users.create(record).await;
    info!(user_id, "user created");
    Ok(Json(CreatedUser { message: "User created successfully!".into(), user_id, user }))
}

/// 列出全部用户
#[utoipa::path(get, path = "/users/all", tag = "users", responses((status = 200, description = "All users, or an empty list")))]
pub async fn list_users(State(state): State<AppState>) -> Json<UserList> {
    Json(state.users.list().await.into())
}

/// 按 id 获取用户
#[utoipa::path(get, path = "/users/{user_id}", tag = "users", params(("user_id" = i64, Path, description = "User id")), responses((status = 200, description = "OK"), (status = 404, description = "User not found")))]
pub async fn get_user(
    State(state): State<AppState>,
    user_id: Result<Path<UserId>, PathRejection>,
) -> Result<Json<FoundUser>, JsonApiError> {
    let Path(user_id) = user_id?;
    let user = state.users.get(user_id).await?;
    Ok(Json(FoundUser { user_id, user }))
}

/// 部分更新：仅覆盖请求中出现的字段
#[utoipa::path(patch, path = "/users/{user_id}", tag = "users", params(("user_id" = i64, Path, description = "User id")), request_body = crate::openapi::PartialRecordDoc, responses((status = 200, description = "Updated"), (status = 404, description = "User not found"), (status = 422, description = "Invalid body")))]
pub async fn update_user(
    State(state): State<AppState>,
    user_id: Result<Path<UserId>, PathRejection>,
    JsonBody(partial): JsonBody<PartialRecord>,
) -> Result<Json<UpdatedUser>, JsonApiError> {
    let Path(user_id) = user_id?;
    let updated_user = state.users.update(user_id, partial).await?;
    info!(user_id, "user updated");
    Ok(Json(UpdatedUser { message: format!("User {user_id} updated!"), updated_user }))
}

/// 删除用户；更大的 id 依次前移一位
#[utoipa::path(delete, path = "/users/{user_id}", tag = "users", params(("user_id" = i64, Path, description = "User id")), responses((status = 200, description = "Deleted"), (status = 404, description = "User not found")))]
pub async fn delete_user(
    State(state): State<AppState>,
    user_id: Result<Path<UserId>, PathRejection>,
) -> Result<Json<DeletedUser>, JsonApiError> {
    let Path(user_id) = user_id?;
    let deleted_user = state.users.delete(user_id).await?;
    info!(user_id, "user deleted");
    Ok(Json(DeletedUser { message: format!("User {user_id} deleted!"), deleted_user }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(name: &str) -> UserRecord {
        UserRecord {
            username: name.into(),
            email: format!("{name}@example.com"),
            age: 40,
            password: "pw".into(),
            is_active: false,
        }
    }

    #[test]
    fn empty_listing_serializes_users_as_array() -> Result<(), serde_json::Error> {
        let body = serde_json::to_value(UserList::from(Listing::Empty))?;
        assert_eq!(body, json!({"message": "No users found!", "users": []}));
        Ok(())
    }

    #[test]
    fn populated_listing_is_keyed_by_id() -> Result<(), serde_json::Error> {
        let users = BTreeMap::from([(1, rec("a")), (2, rec("b"))]);
        let body = serde_json::to_value(UserList::from(Listing::Users(users)))?;
        assert_eq!(body["message"], "total users: 2");
        assert_eq!(body["users"]["1"]["username"], "a");
        assert_eq!(body["users"]["2"]["email"], "b@example.com");
        Ok(())
    }
}
