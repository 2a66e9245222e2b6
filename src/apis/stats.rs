#[allow(non_snake_case)]
pub mod Stats {
    use std::sync::{Arc, Mutex};

    use crate::{
        aggregate::{self, Dashboard, MonthlyStats, TypeTotals},
        config::Config,
        database::{
            database_utils::StoreExtension,
            store::{FileStore, UserStore}
        },
        guards::{Admin, Session},
        Error
    };
    use rocket::{
        get,
        State,
        serde::json::Json
    };

    /// Upload counts per calendar month, oldest first
    #[utoipa::path(
        get,
        context_path = "/stats",
        responses(
            (status = 200, description = "Successfully grabbed monthly stats", body = [MonthlyStats]),
            (status = 403, description = "Only administrators can read reports", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/monthly")]
    pub async fn monthly(
        file_store: &State<Arc<Mutex<FileStore>>>,
        _admin: Admin
    ) -> Result<Json<Vec<MonthlyStats>>, Error> {
        Ok(Json(aggregate::monthly_stats(file_store.acquire()?.files())))
    }

    /// All-time upload counts per type
    #[utoipa::path(
        get,
        context_path = "/stats",
        responses(
            (status = 200, description = "Successfully grabbed totals", body = TypeTotals),
            (status = 403, description = "Only administrators can read reports", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/totals")]
    pub async fn totals(
        file_store: &State<Arc<Mutex<FileStore>>>,
        _admin: Admin
    ) -> Result<Json<TypeTotals>, Error> {
        Ok(Json(aggregate::totals_by_type(file_store.acquire()?.files())))
    }

    /// Role specific dashboard for the caller
    #[utoipa::path(
        get,
        context_path = "/stats",
        params(
            ("utc_offset" = Option<i32>, Query, description = "Viewer's offset from UTC in minutes, used for the greeting")
        ),
        responses(
            (status = 200, description = "Successfully grabbed dashboard", body = Dashboard),
            (status = 401, description = "No valid session was provided", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/dashboard?<utc_offset>")]
    pub async fn dashboard(
        config_store: &State<Arc<Mutex<Config>>>,
        user_store: &State<Arc<Mutex<UserStore>>>,
        file_store: &State<Arc<Mutex<FileStore>>>,
        session: Session,
        utc_offset: Option<i32>
    ) -> Result<Json<Dashboard>, Error> {
        let recent_limit = config_store.acquire()?.report_recent_files;
        let user_count = user_store.acquire()?.len();
        let files = file_store.acquire()?;

        Ok(Json(aggregate::dashboard(
            &session.user,
            user_count,
            files.files(),
            files.unread_count(),
            aggregate::local_hour(&chrono::offset::Utc::now(), utc_offset),
            recent_limit
        )))
    }
}
