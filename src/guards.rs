use std::sync::{Arc, Mutex};

use log::{debug, warn};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome, Request}
};

use crate::access::Page;
use crate::database::{
    database_utils::StoreExtension,
    models::User,
    session::SessionStore,
    store::UserStore
};

/// A logged-in user resolved from the `Authorization: Bearer <token>` header.
pub struct Session {
    pub token: String,
    pub user: User,
}

fn bearer_token<'r>(request: &'r Request<'_>) -> Option<&'r str> {
    request
        .headers()
        .get_one("Authorization")
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Session {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = match bearer_token(request) {
            Some(token) => token,
            None => return Outcome::Error((Status::Unauthorized, ()))
        };

        let (sessions, users) = match (
            request.rocket().state::<Arc<Mutex<SessionStore>>>(),
            request.rocket().state::<Arc<Mutex<UserStore>>>()
        ) {
            (Some(sessions), Some(users)) => (sessions, users),
            _ => return Outcome::Error((Status::InternalServerError, ()))
        };

        let profile = match sessions.acquire().map(|sessions| sessions.load(token)) {
            Ok(Ok(Some(profile))) => profile,
            Ok(Ok(None)) => {
                debug!("Unknown session token presented");
                return Outcome::Error((Status::Unauthorized, ()));
            },
            Ok(Err(err)) => {
                warn!("Failed to read session slot, {}", err);
                return Outcome::Error((Status::InternalServerError, ()));
            },
            Err(_) => return Outcome::Error((Status::InternalServerError, ()))
        };

        // The stored profile may be stale, the directory is authoritative.
        let user = match users.acquire() {
            Ok(users) => users.get(&profile.id).cloned(),
            Err(_) => return Outcome::Error((Status::InternalServerError, ()))
        };

        match user {
            Some(user) => Outcome::Success(Session { token: token.to_string(), user }),
            None => Outcome::Error((Status::Unauthorized, ()))
        }
    }
}

async fn session_for_page<'r>(request: &'r Request<'_>, page: Page) -> Outcome<Session, ()> {
    match request.guard::<Session>().await {
        Outcome::Success(session) if page.permits(session.user.role) => Outcome::Success(session),
        Outcome::Success(session) => {
            debug!("{} may not open {:?}", session.user.username, page);
            Outcome::Error((Status::Forbidden, ()))
        },
        Outcome::Error(error) => Outcome::Error(error),
        Outcome::Forward(status) => Outcome::Forward(status)
    }
}

/// Session of a user allowed on the administrator pages.
pub struct Admin(pub Session);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Admin {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        session_for_page(request, Page::Files).await.map(Admin)
    }
}

/// Session of a user allowed on the upload page.
pub struct Uploader(pub Session);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for Uploader {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        session_for_page(request, Page::Upload).await.map(Uploader)
    }
}
