#[allow(non_snake_case)]
pub mod File {
    use std::{sync::{Arc, Mutex}, time::Duration};

    use crate::{
        aggregate,
        config::Config,
        database::{
            database_utils::StoreExtension,
            models::{FileType, ReviewStatus, UploadedFile},
            store::{FileAction, FileEvent, FileFilter, FileStore}
        },
        guards::{Admin, Session, Uploader},
        upload::{prepare_files, schedule_upload, UploadItem, UploadJobInfo, UploadPolicy, UploadRejection, UploadTracker},
        utils::{format_file_size, generate_id},
        Error
    };

    use log::info;
    use rocket::{
        http::Status,
        State,
        get, delete, post, put,
        serde::json::Json
    };

    use serde::{Serialize, Deserialize};
    use utoipa::ToSchema;

    #[derive(Serialize, Deserialize, ToSchema, Clone)]
    pub struct FileEntry {
        #[serde(flatten)]
        pub file: UploadedFile,
        /// Human readable size
        #[schema(example = "150 MB")]
        pub size_label: String
    }

    impl From<UploadedFile> for FileEntry {
        fn from(file: UploadedFile) -> Self {
            FileEntry {
                size_label: format_file_size(file.size),
                file
            }
        }
    }

    #[derive(Serialize, Deserialize, ToSchema, Clone)]
    pub struct StatusUpdate {
        /// Either approved or rejected
        pub status: ReviewStatus
    }

    #[derive(Serialize, Deserialize, ToSchema, Clone)]
    pub struct UploadRequest {
        pub files: Vec<UploadItem>
    }

    fn parse_filter(search: Option<String>, status: Option<String>, file_type: Option<String>) -> Result<FileFilter, Error> {
        let status = match status.as_deref() {
            None | Some("all") => None,
            Some(name) => Some(ReviewStatus::parse(name)
                .ok_or_else(|| Error::BadRequest(format!("Unknown status filter: {}", name)))?)
        };
        let file_type = match file_type.as_deref() {
            None | Some("all") => None,
            Some(name) => Some(FileType::parse(name)
                .ok_or_else(|| Error::BadRequest(format!("Unknown type filter: {}", name)))?)
        };

        Ok(FileFilter {
            search: search.filter(|term| !term.trim().is_empty()),
            status,
            file_type
        })
    }

    /// Lists every uploaded file, optionally filtered
    #[utoipa::path(
        get,
        context_path = "/files",
        params(
            ("search" = Option<String>, Query, description = "Matches original name or uploader name"),
            ("status" = Option<String>, Query, description = "pending, approved, rejected or all"),
            ("file_type" = Option<String>, Query, description = "video, script, voice or all")
        ),
        responses(
            (status = 200, description = "Successfully grabbed files", body = [FileEntry]),
            (status = 400, description = "An unknown filter value was sent", body = Error),
            (status = 403, description = "Only administrators can browse all files", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/all?<search>&<status>&<file_type>")]
    pub async fn all(
        file_store: &State<Arc<Mutex<FileStore>>>,
        _admin: Admin,
        search: Option<String>,
        status: Option<String>,
        file_type: Option<String>
    ) -> Result<Json<Vec<FileEntry>>, Error> {
        let filter = parse_filter(search, status, file_type)?;
        let files = file_store.acquire()?.query(&filter);
        Ok(Json(files.into_iter().map(FileEntry::from).collect()))
    }

    /// Lists the most recently uploaded files
    #[utoipa::path(
        get,
        context_path = "/files",
        responses(
            (status = 200, description = "Successfully grabbed recent files", body = [FileEntry]),
            (status = 401, description = "No valid session was provided", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/recent")]
    pub async fn recent(
        config_store: &State<Arc<Mutex<Config>>>,
        file_store: &State<Arc<Mutex<FileStore>>>,
        _session: Session
    ) -> Result<Json<Vec<FileEntry>>, Error> {
        let limit = config_store.acquire()?.report_recent_files;
        let recent = aggregate::recent_files(file_store.acquire()?.files(), limit);
        Ok(Json(recent.into_iter().map(FileEntry::from).collect()))
    }

    /// Grabs a single file record
    #[utoipa::path(
        get,
        context_path = "/files",
        params(
            ("id" = String, Path, description = "File id")
        ),
        responses(
            (status = 200, description = "Successfully found file", body = FileEntry),
            (status = 404, description = "No file has the given id", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/<id>", rank = 2)]
    pub async fn info(
        file_store: &State<Arc<Mutex<FileStore>>>,
        _admin: Admin,
        id: String
    ) -> Result<Json<FileEntry>, Error> {
        match file_store.acquire()?.get(&id) {
            Some(file) => Ok(Json(FileEntry::from(file.clone()))),
            None => Err(Error::NotFound(format!("No file exists with id {}", id)))
        }
    }

    /// Approves or rejects a pending file
    #[utoipa::path(
        put,
        context_path = "/files",
        request_body = StatusUpdate,
        params(
            ("id" = String, Path, description = "File id")
        ),
        responses(
            (status = 200, description = "Successfully reviewed file", body = FileEntry),
            (status = 400, description = "The file is not pending or the status is pending", body = Error),
            (status = 403, description = "Only administrators can review files", body = Error),
            (status = 404, description = "No file has the given id", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[put("/<id>/status", data = "<update>")]
    pub async fn review(
        file_store: &State<Arc<Mutex<FileStore>>>,
        admin: Admin,
        id: String,
        update: Json<StatusUpdate>
    ) -> Result<Json<FileEntry>, Error> {
        let event = file_store.acquire()?.dispatch(FileAction::SetStatus { id, status: update.status })?;

        match event {
            FileEvent::StatusChanged(file) => {
                info!("{} reviewed {} as {}", admin.0.user.username, file.filename, file.status.as_str());
                Ok(Json(FileEntry::from(file)))
            },
            _ => Err(Error::InternalError(String::from("An internal error on the server's end has occurred")))
        }
    }

    /// Removes a file record
    #[utoipa::path(
        delete,
        context_path = "/files",
        params(
            ("id" = String, Path, description = "File id")
        ),
        responses(
            (status = 200, description = "Successfully deleted file"),
            (status = 403, description = "Only administrators can delete files", body = Error),
            (status = 404, description = "No file has the given id", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[delete("/<id>")]
    pub async fn delete(
        file_store: &State<Arc<Mutex<FileStore>>>,
        _admin: Admin,
        id: String
    ) -> Result<Status, Error> {
        file_store.acquire()?.dispatch(FileAction::Delete { id })?;
        Ok(Status::Ok)
    }

    /// Grabs what the caller may upload
    #[utoipa::path(
        get,
        context_path = "/files",
        responses(
            (status = 200, description = "Successfully grabbed upload policy"),
            (status = 403, description = "The caller's role cannot upload", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/upload/policy")]
    pub async fn policy(uploader: Uploader) -> Json<UploadPolicy> {
        Json(UploadPolicy::for_role(uploader.0.user.role))
    }

    /// Starts a simulated upload of file descriptors
    #[utoipa::path(
        post,
        context_path = "/files",
        request_body = UploadRequest,
        responses(
            (status = 202, description = "Upload started", body = UploadJobInfo),
            (status = 400, description = "No acceptable files or a file is too large", body = Error),
            (status = 403, description = "The caller's role cannot upload", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[post("/upload", data = "<request>")]
    pub async fn upload(
        config_store: &State<Arc<Mutex<Config>>>,
        file_store: &State<Arc<Mutex<FileStore>>>,
        tracker: &State<Arc<Mutex<UploadTracker>>>,
        uploader: Uploader,
        request: Json<UploadRequest>
    ) -> Result<(Status, Json<UploadJobInfo>), Error> {
        let (delay, max_size_mb, id_length) = {
            let config = config_store.acquire()?;
            (Duration::from_millis(config.upload_delay_ms), config.upload_max_size_mb, config.account_id_length)
        };

        let user = &uploader.0.user;
        let new_files = match prepare_files(user, request.into_inner().files, max_size_mb) {
            Ok(result) => result,
            Err(UploadRejection::NothingAccepted) => return Err(Error::BadRequest(format!(
                "No acceptable files provided, expected {}", UploadPolicy::for_role(user.role).label
            ))),
            Err(UploadRejection::TooLarge { name, limit_mb }) => return Err(Error::BadRequest(format!(
                "{} exceeds the {} mb upload limit", name, limit_mb
            )))
        };

        let job = schedule_upload(
            tracker.inner(),
            file_store.inner(),
            generate_id(id_length),
            user.id.clone(),
            new_files,
            delay
        )?;
        info!("{} started upload {} with {} file(s)", user.username, job.id, job.file_count);

        Ok((Status::Accepted, Json(job)))
    }

    fn owned_job(tracker: &Arc<Mutex<UploadTracker>>, session: &Session, id: &str) -> Result<UploadJobInfo, Error> {
        match tracker.acquire()?.get(id) {
            Some(job) if job.owner_id == session.user.id => Ok(job),
            _ => Err(Error::NotFound(format!("No upload exists with id {}", id)))
        }
    }

    /// Grabs the state of an upload
    #[utoipa::path(
        get,
        context_path = "/files",
        params(
            ("id" = String, Path, description = "Upload id")
        ),
        responses(
            (status = 200, description = "Successfully grabbed upload", body = UploadJobInfo),
            (status = 404, description = "No upload of the caller has the given id", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/upload/<id>")]
    pub async fn upload_status(
        tracker: &State<Arc<Mutex<UploadTracker>>>,
        uploader: Uploader,
        id: String
    ) -> Result<Json<UploadJobInfo>, Error> {
        owned_job(tracker.inner(), &uploader.0, &id).map(Json)
    }

    /// Cancels an upload that has not completed yet
    #[utoipa::path(
        delete,
        context_path = "/files",
        params(
            ("id" = String, Path, description = "Upload id")
        ),
        responses(
            (status = 200, description = "Upload state after cancelling", body = UploadJobInfo),
            (status = 404, description = "No upload of the caller has the given id", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[delete("/upload/<id>")]
    pub async fn upload_cancel(
        tracker: &State<Arc<Mutex<UploadTracker>>>,
        uploader: Uploader,
        id: String
    ) -> Result<Json<UploadJobInfo>, Error> {
        owned_job(tracker.inner(), &uploader.0, &id)?;
        match tracker.acquire()?.cancel(&id) {
            Some(job) => Ok(Json(job)),
            None => Err(Error::NotFound(format!("No upload exists with id {}", id)))
        }
    }
}
