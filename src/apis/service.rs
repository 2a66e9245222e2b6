#[allow(non_snake_case)]
pub mod Service {
    use std::sync::{Arc, Mutex};

    use crate::{
        access::{self, Access, NavigationItem},
        config::Config,
        database::database_utils::StoreExtension,
        guards::{Admin, Session},
        Error
    };
    use rocket::{
        get,
        State,
        serde::json::Json,
        serde::{Serialize, Deserialize}
    };
    use utoipa::ToSchema;

    use git_version::git_version;
    const GIT_VERSION: &str = git_version!(fallback = "unknown");

    #[derive(Serialize, Deserialize, ToSchema, Clone)]
    pub struct ApiConfig {
        // Upload related
        pub upload_delay_ms: u64,
        // In the form of mb's 1 = 1mb (Ignore if value = 0)
        pub upload_max_size_mb: u64,

        // Report related
        pub report_top_contributors: usize,
        pub report_recent_files: usize
    }

    #[derive(Serialize, Deserialize, ToSchema, Clone)]
    pub struct Information {
        pub git_version: String
    }

    impl From<&Config> for ApiConfig {
        fn from(config: &Config) -> Self {
            ApiConfig {
                upload_delay_ms: config.upload_delay_ms,
                upload_max_size_mb: config.upload_max_size_mb,
                report_top_contributors: config.report_top_contributors,
                report_recent_files: config.report_recent_files
            }
        }
    }

    /// Sidebar entries the caller's role may open
    #[utoipa::path(
        get,
        context_path = "/services",
        responses(
            (status = 200, description = "Successfully grabbed navigation"),
            (status = 401, description = "No valid session was provided", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/navigation")]
    pub async fn navigation(session: Session) -> Json<Vec<&'static NavigationItem>> {
        Json(access::navigation(Some(session.user.role)))
    }

    /// Decides whether direct navigation to a page is allowed or redirected
    #[utoipa::path(
        get,
        context_path = "/services",
        params(
            ("path" = String, Query, description = "Page path, eg. /reports")
        ),
        responses(
            (status = 200, description = "Allow or redirect decision")
        )
    )]
    #[get("/resolve?<path>")]
    pub async fn resolve(session: Option<Session>, path: String) -> Json<Access> {
        Json(access::gate(session.as_ref().map(|session| &session.user), &path))
    }

    /// Grabs config on the TeamFocuz instance
    #[utoipa::path(
        get,
        context_path = "/services",
        responses(
            (status = 200, description = "Successfully grabbed teamfocuz instance's config", body = ApiConfig),
            (status = 403, description = "Only administrators can read the config", body = Error),
            (status = 500, description = "An internal error on the server's end has occurred", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/config")]
    pub async fn config(
        config_store: &State<Arc<Mutex<Config>>>,
        _admin: Admin
    ) -> Result<Json<ApiConfig>, Error> {
        Ok(Json(ApiConfig::from(&*config_store.acquire()?)))
    }

    /// Grabs information about the TeamFocuz instance
    #[utoipa::path(
        get,
        context_path = "/services",
        responses(
            (status = 200, description = "Successfully grabbed teamfocuz instance's information", body = Information)
        )
    )]
    #[get("/information")]
    pub async fn info() -> Json<Information> {
        Json(Information {
            git_version: GIT_VERSION.to_string()
        })
    }
}
