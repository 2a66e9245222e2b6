use std::sync::{Arc, Mutex};

use log::{error, info};
use rocket::{
    catch, catchers, get, routes,
    Build, Rocket,
    serde::{json::Json, Serialize},
    Responder
};

use utoipa::{
    openapi::{
        self,
        security::{Http, HttpAuthScheme, SecurityScheme}
    },
    Modify, OpenApi, ToSchema
};

pub mod apis {
    pub mod user;
    pub mod file;
    pub mod stats;
    pub mod report;
    pub mod notification;
    pub mod service;
}

pub mod database {
    pub mod models;
    pub mod store;
    pub mod session;
    pub mod seed;
    pub mod database_utils;
}

pub mod access;
pub mod aggregate;
pub mod config;
pub mod guards;
pub mod upload;
pub mod utils;

use crate::apis::user::User;
use crate::apis::file::File;
use crate::apis::stats::Stats;
use crate::apis::report::Report;
use crate::apis::notification::Notification;
use crate::apis::service::Service;
use crate::config::Config;
use crate::database::{
    models,
    seed,
    session::SessionStore,
    store::{FileStore, StoreError, UserStore}
};
use crate::upload::UploadTracker;

#[derive(OpenApi)]
#[openapi(
    paths(
        User::login,
        User::logout,
        User::me,
        User::all,
        User::create,
        User::update,
        User::delete,
        File::all,
        File::recent,
        File::info,
        File::review,
        File::delete,
        File::policy,
        File::upload,
        File::upload_status,
        File::upload_cancel,
        Stats::monthly,
        Stats::totals,
        Stats::dashboard,
        Report::summary,
        Report::export,
        Notification::all,
        Notification::read,
        Service::navigation,
        Service::resolve,
        Service::config,
        Service::info
    ),
    components(
        schemas(models::User, models::Role, models::UploadedFile, models::FileType, models::ReviewStatus),
        schemas(models::Notification, models::Severity),
        schemas(User::UserCredentials, User::LoginResponse, User::UserCreation, User::UserUpdate),
        schemas(File::FileEntry, File::StatusUpdate, File::UploadRequest),
        schemas(upload::UploadItem, upload::UploadJobInfo, upload::UploadState),
        schemas(aggregate::MonthlyStats, aggregate::TypeTotals, aggregate::Contributor, aggregate::Report),
        schemas(aggregate::ReportDocument),
        schemas(aggregate::StatCard, aggregate::Dashboard, access::Page),
        schemas(Notification::NotificationList),
        schemas(Service::ApiConfig, Service::Information),
        schemas(Error)
    ),
    tags(
        (name = "User", description = "All account and session related api endpoints."),
        (name = "File", description = "All file registry and upload related api endpoints."),
        (name = "Stats", description = "All statistical api endpoints."),
        (name = "Report", description = "All report related api endpoints."),
        (name = "Notification", description = "All notification related api endpoints."),
        (name = "Service", description = "All navigation and service related api endpoints.")
    )
)]
pub struct ApiDoc;

impl Modify for ApiDoc {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        openapi.info.title = String::from("TeamFocuz Backend");
        openapi.info.description = Some(String::from("TeamFocuz team file management api"));
        openapi.info.license = None;
        openapi.info.version = String::from("V1");

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme("bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
        }
    }
}

#[derive(Serialize, ToSchema, Responder, Debug, PartialEq)]
pub enum Error {
    #[response(status = 400)]
    BadRequest(String),

    #[response(status = 401)]
    Unauthorized(String),

    #[response(status = 403)]
    Forbidden(String),

    #[response(status = 404)]
    NotFound(String),

    #[response(status = 405)]
    NotAllowed(String),

    #[response(status = 500)]
    InternalError(String)
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound(_)
            | StoreError::FileNotFound(_)
            | StoreError::NotificationNotFound(_) => Error::NotFound(err.to_string()),
            StoreError::UsernameTaken(_) => Error::Forbidden(err.to_string()),
            StoreError::InvalidTransition { .. } => Error::BadRequest(err.to_string()),
            StoreError::PasswordHash | StoreError::Session(_) => {
                error!("{}", err);
                Error::InternalError(String::from("An internal error on the server's end has occurred"))
            }
        }
    }
}

#[get("/api-doc/openapi.json")]
fn openapi_json() -> Json<openapi::OpenApi> {
    let mut doc = ApiDoc::openapi();
    ApiDoc.modify(&mut doc);
    Json(doc)
}

#[catch(401)]
fn unauthorized() -> Error {
    Error::Unauthorized(String::from("No valid session was provided"))
}

#[catch(403)]
fn forbidden() -> Error {
    Error::Forbidden(String::from("Your role cannot access this resource"))
}

#[catch(404)]
fn not_found() -> Error {
    Error::NotFound(String::from("The requested resource could not be found"))
}

/// Creates every store, seeds the demo team when configured and mounts the api.
pub fn build(config: Config) -> Result<Rocket<Build>, Error> {
    let mut users = UserStore::new(config.account_id_length);
    let mut files = FileStore::new(config.account_id_length);
    if config.account_seed_demo_data {
        seed::seed_users(&mut users, &config.account_default_password)?;
        seed::seed_files(&mut files);
    }

    let sessions = SessionStore::open(config.session_store_path.as_deref(), config.session_token_length)?;
    let restored = sessions.restore()?;
    if !restored.is_empty() {
        info!("{} user(s) are still logged in", restored.len());
    }

    let tracker = UploadTracker::with_retention(config.upload_job_retention_secs);

    Ok(rocket::build()
        .manage(Arc::new(Mutex::new(config)))
        .manage(Arc::new(Mutex::new(users)))
        .manage(Arc::new(Mutex::new(files)))
        .manage(Arc::new(Mutex::new(sessions)))
        .manage(Arc::new(Mutex::new(tracker)))
        .register("/", catchers![unauthorized, forbidden, not_found])
        .mount("/", routes![openapi_json])
        .mount(
            "/user",
            routes![
                User::login,
                User::logout,
                User::me,
                User::all,
                User::create,
                User::update,
                User::delete
            ]
        )
        .mount(
            "/files",
            routes![
                File::all,
                File::recent,
                File::info,
                File::review,
                File::delete,
                File::policy,
                File::upload,
                File::upload_status,
                File::upload_cancel
            ]
        )
        .mount(
            "/stats",
            routes![
                Stats::monthly,
                Stats::totals,
                Stats::dashboard
            ]
        )
        .mount(
            "/report",
            routes![
                Report::summary,
                Report::export
            ]
        )
        .mount(
            "/notifications",
            routes![
                Notification::all,
                Notification::read
            ]
        )
        .mount(
            "/services",
            routes![
                Service::navigation,
                Service::resolve,
                Service::config,
                Service::info
            ]
        ))
}
