#[allow(non_snake_case)]
pub mod Notification {
    use std::sync::{Arc, Mutex};

    use crate::{
        database::{
            database_utils::StoreExtension,
            models,
            store::{FileAction, FileEvent, FileStore}
        },
        guards::Session,
        Error
    };
    use rocket::{
        get, put,
        State,
        serde::json::Json
    };
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Serialize, Deserialize, ToSchema, Clone)]
    pub struct NotificationList {
        pub unread: usize,
        /// Newest first
        pub notifications: Vec<models::Notification>
    }

    #[utoipa::path(
        get,
        context_path = "/notifications",
        responses(
            (status = 200, description = "Successfully grabbed notifications", body = NotificationList),
            (status = 401, description = "No valid session was provided", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/all")]
    pub async fn all(
        file_store: &State<Arc<Mutex<FileStore>>>,
        _session: Session
    ) -> Result<Json<NotificationList>, Error> {
        let files = file_store.acquire()?;
        Ok(Json(NotificationList {
            unread: files.unread_count(),
            notifications: files.notifications().to_vec()
        }))
    }

    #[utoipa::path(
        put,
        context_path = "/notifications",
        params(
            ("id" = String, Path, description = "Notification id")
        ),
        responses(
            (status = 200, description = "Notification marked read", body = models::Notification),
            (status = 404, description = "No notification has the given id", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[put("/<id>/read")]
    pub async fn read(
        file_store: &State<Arc<Mutex<FileStore>>>,
        _session: Session,
        id: String
    ) -> Result<Json<models::Notification>, Error> {
        match file_store.acquire()?.dispatch(FileAction::MarkRead { id })? {
            FileEvent::NotificationRead(notification) => Ok(Json(notification)),
            _ => Err(Error::InternalError(String::from("An internal error on the server's end has occurred")))
        }
    }
}
