#[allow(non_snake_case)]
pub mod Report {
    use std::sync::{Arc, Mutex};

    use crate::{
        aggregate::{self, Report, ReportDocument},
        config::Config,
        database::{
            database_utils::StoreExtension,
            store::{FileStore, UserStore}
        },
        guards::Admin,
        Error
    };
    use log::{error, info};
    use rocket::{
        get,
        http::Header,
        State,
        serde::json::Json,
        Responder
    };

    /// Report document served as a file download
    #[derive(Responder)]
    #[response(content_type = "json")]
    pub struct ReportDownload {
        body: String,
        disposition: Header<'static>
    }

    fn build(
        config_store: &State<Arc<Mutex<Config>>>,
        user_store: &State<Arc<Mutex<UserStore>>>,
        file_store: &State<Arc<Mutex<FileStore>>>
    ) -> Result<Report, Error> {
        let limit = config_store.acquire()?.report_top_contributors;
        let total_users = user_store.acquire()?.len();
        let files = file_store.acquire()?;

        Ok(aggregate::build_report(files.files(), total_users, chrono::offset::Utc::now(), limit))
    }

    /// Team report: monthly stats, totals, top contributors
    #[utoipa::path(
        get,
        context_path = "/report",
        responses(
            (status = 200, description = "Successfully built report", body = Report),
            (status = 403, description = "Only administrators can read reports", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/")]
    pub async fn summary(
        config_store: &State<Arc<Mutex<Config>>>,
        user_store: &State<Arc<Mutex<UserStore>>>,
        file_store: &State<Arc<Mutex<FileStore>>>,
        _admin: Admin
    ) -> Result<Json<Report>, Error> {
        build(config_store, user_store, file_store).map(Json)
    }

    /// Downloads the team report as a dated JSON document
    #[utoipa::path(
        get,
        context_path = "/report",
        responses(
            (status = 200, description = "Report document attachment", body = ReportDocument),
            (status = 403, description = "Only administrators can read reports", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/export")]
    pub async fn export(
        config_store: &State<Arc<Mutex<Config>>>,
        user_store: &State<Arc<Mutex<UserStore>>>,
        file_store: &State<Arc<Mutex<FileStore>>>,
        admin: Admin
    ) -> Result<ReportDownload, Error> {
        let report = ReportDocument::from(build(config_store, user_store, file_store)?);
        let body = match serde_json::to_string_pretty(&report) {
            Ok(result) => result,
            Err(err) => {
                error!("Failed to serialize report, {}", err);
                return Err(Error::InternalError(String::from("An internal error on the server's end has occurred")))
            }
        };

        let filename = aggregate::report_filename(&report.generated);
        info!("{} exported {}", admin.0.user.username, filename);

        Ok(ReportDownload {
            body,
            disposition: Header::new("Content-Disposition", format!("attachment; filename=\"{}\"", filename))
        })
    }
}
