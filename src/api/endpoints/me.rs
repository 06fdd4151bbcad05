use axum::{Extension, Json};

use crate::auth::CurrentUser;
use crate::models::UserOut;

/// `GET /me`: the user behind the access token.
pub async fn me(Extension(current): Extension<CurrentUser>) -> Json<UserOut> {
    Json(UserOut::from(current.user()))
}
