pub mod auth;
pub mod categories;
pub mod comments;
pub mod genres;
pub mod health;
pub mod reviews;
pub mod titles;
pub mod users;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api").service(health::health_check).service(
            web::scope("/v1")
                .configure(auth::auth_routes)
                .configure(categories::category_routes)
                .configure(genres::genre_routes)
                .configure(users::user_routes)
                // Les scopes les plus imbriqués d'abord: un scope actix qui
                // matche un préfixe ne redonne pas la main à ses voisins
                .configure(comments::comment_routes)
                .configure(reviews::review_routes)
                .configure(titles::title_routes),
        ),
    );
}
