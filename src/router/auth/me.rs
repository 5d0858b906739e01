//! Get authenticated user.

use axum::Json;

use crate::middleware::AuthUser;
use crate::router::Data;
use crate::user::UserResource;

pub async fn handler(AuthUser(user): AuthUser) -> Json<Data<UserResource>> {
    Json(Data::new(user.into()))
}
