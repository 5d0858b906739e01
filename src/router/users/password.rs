//! Update password of a user.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::middleware::Owner;
use crate::router::{Data, Valid, lenient_string};
use crate::user::UserResource;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(required(message = "The password field is required."))]
    password: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(
        required(message = "The new password field is required."),
        length(
            min = 6,
            max = 255,
            message = "The new password must be 6 to 255 characters long."
        )
    )]
    new_password: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[validate(required(
        message = "The new password confirmation field is required."
    ))]
    new_password_confirmation: Option<String>,
}

pub async fn handler(
    State(state): State<AppState>,
    Owner(user): Owner,
    Valid(body): Valid<Body>,
) -> Result<Json<Data<UserResource>>> {
    let user = state
        .accounts
        .update_password(
            &user,
            body.password.as_deref().unwrap_or_default(),
            body.new_password.as_deref().unwrap_or_default(),
            body.new_password_confirmation.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(Data::new(user.into())))
}
