pub mod avatar;
pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod me;
pub mod set_password;
pub mod subscribe;
pub mod subscriptions;
pub mod update;

use crate::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/users endpoints (mounted at /api/users)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_users).post(create::create_user))
        .route(
            "/me",
            get(me::get_me).put(me::put_me).patch(me::patch_me),
        )
        .route(
            "/me/avatar",
            put(avatar::put_avatar).delete(avatar::delete_avatar),
        )
        .route("/set_password", post(set_password::set_password))
        .route("/subscriptions", get(subscriptions::list_subscriptions))
        .route(
            "/{id}",
            get(get::get_user)
                .put(update::put_user)
                .patch(update::patch_user)
                .delete(delete::delete_user),
        )
        .route(
            "/{id}/subscribe",
            post(subscribe::subscribe).delete(subscribe::unsubscribe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_users,
        create::create_user,
        get::get_user,
        update::put_user,
        update::patch_user,
        delete::delete_user,
        me::get_me,
        me::put_me,
        me::patch_me,
        avatar::put_avatar,
        avatar::delete_avatar,
        set_password::set_password,
        subscribe::subscribe,
        subscribe::unsubscribe,
        subscriptions::list_subscriptions,
    ),
    components(schemas(
        list::ListUsersResponse,
        create::CreateUserRequest,
        update::UpdateProfileRequest,
        avatar::AvatarRequest,
        avatar::AvatarResponse,
        set_password::SetPasswordRequest,
        subscriptions::SubscriptionsResponse,
    ))
)]
pub struct ApiDoc;
