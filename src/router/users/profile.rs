//! Update name and avatar of a user.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::middleware::Owner;
use crate::router::{Data, Valid};
use crate::user::UserResource;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(
        required(message = "The name field is required."),
        length(
            min = 1,
            max = 255,
            message = "The name must be 1 to 255 characters long."
        )
    )]
    name: Option<String>,
    #[validate(
        url(message = "The avatar format is invalid."),
        length(max = 2048, message = "The avatar may not be greater than 2048 characters.")
    )]
    avatar: Option<String>,
}

pub async fn handler(
    State(state): State<AppState>,
    Owner(user): Owner,
    Valid(body): Valid<Body>,
) -> Result<Json<Data<UserResource>>> {
    let user = state
        .accounts
        .update_profile(
            &user,
            body.name.as_deref().unwrap_or_default(),
            body.avatar.as_deref(),
        )
        .await?;

    Ok(Json(Data::new(user.into())))
}
