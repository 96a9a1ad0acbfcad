use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{auth, backoffice, pastille, quiz, user, zone};
use crate::state::AppState;

/// Everything served under `/api`.
pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(pastille_routes())
        .merge(quiz_routes())
        .merge(zone_routes())
        .merge(backoffice_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::refresh))
        .routes(routes!(auth::forgot_password))
        .routes(routes!(auth::reset_password))
}

fn user_routes() -> OpenApiRouter<AppState> {
    let avatar = OpenApiRouter::new()
        .routes(routes!(user::upload_profile_picture))
        .layer(user::avatar_body_limit());

    OpenApiRouter::new()
        .routes(routes!(user::me, user::update_me))
        .routes(routes!(user::my_stats))
        .merge(avatar)
}

fn pastille_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(pastille::list_pastilles, pastille::create_pastille))
        .routes(routes!(pastille::generate_upload_url))
        .routes(routes!(pastille::list_my_pastilles))
        .routes(routes!(
            pastille::get_pastille,
            pastille::update_pastille,
            pastille::delete_pastille
        ))
        .routes(routes!(pastille::replace_photo))
        .routes(routes!(pastille::rate_pastille))
}

fn quiz_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(quiz::list_quizzes, quiz::create_quiz))
        .routes(routes!(quiz::get_quiz, quiz::update_quiz, quiz::delete_quiz))
        .routes(routes!(quiz::attempt_quiz))
}

fn zone_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(zone::list_zones, zone::create_zone))
        .routes(routes!(zone::get_zone, zone::update_zone, zone::delete_zone))
}

fn backoffice_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(backoffice::dashboard_stats))
        .routes(routes!(backoffice::recent_activities))
        .routes(routes!(backoffice::list_users))
        .routes(routes!(backoffice::get_user, backoffice::delete_user))
        .routes(routes!(backoffice::list_pastilles))
        .routes(routes!(
            backoffice::get_pastille,
            backoffice::update_pastille,
            backoffice::delete_pastille
        ))
        .routes(routes!(backoffice::list_quizzes, backoffice::create_quiz))
        .routes(routes!(
            backoffice::get_quiz,
            backoffice::update_quiz,
            backoffice::delete_quiz
        ))
        .routes(routes!(backoffice::list_zones, backoffice::create_zone))
        .routes(routes!(
            backoffice::get_zone,
            backoffice::update_zone,
            backoffice::delete_zone
        ))
        .routes(routes!(backoffice::fix_photo_keys))
}
