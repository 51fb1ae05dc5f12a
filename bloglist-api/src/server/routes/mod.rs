use crate::server::ServerRouter;
use axum::Router;

mod login;
mod posts;
mod users;

pub fn routes() -> ServerRouter {
    Router::new()
        .merge(posts::routes())
        .merge(users::routes())
        .merge(login::routes())
}
