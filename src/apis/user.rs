#[allow(non_snake_case)]
pub mod User {
    use std::sync::{Arc, Mutex};

    use crate::{
        config::Config,
        database::{
            database_utils::StoreExtension,
            models::{self, Role},
            session::SessionStore,
            store::{NewUser, UserAction, UserChanges, UserEvent, UserStore}
        },
        guards::{Admin, Session},
        Error
    };

    use log::{info, warn};
    use rocket::{
        http::Status,
        State,
        get, delete, post, put,
        serde::json::Json
    };

    use serde::{Serialize, Deserialize};
    use utoipa::ToSchema;

    #[derive(Serialize, Deserialize, ToSchema, Clone)]
    pub struct UserCredentials {
        /// User's account name
        #[schema(example = "veditor")]
        pub username: String,
        /// User's account password
        #[schema(example = "password123")]
        pub password: String
    }

    #[derive(Serialize, Deserialize, ToSchema, Clone)]
    pub struct LoginResponse {
        /// Bearer token for the session slot
        pub token: String,
        /// Logged-in profile with its refreshed last login
        pub user: models::User
    }

    #[derive(Serialize, Deserialize, ToSchema, Clone)]
    pub struct UserCreation {
        pub username: String,
        pub email: String,
        pub role: Role,
        /// Display name
        pub name: String,
        /// Falls back to the instance's default password
        pub password: Option<String>
    }

    #[derive(Serialize, Deserialize, ToSchema, Clone, Default)]
    pub struct UserUpdate {
        pub username: Option<String>,
        pub email: Option<String>,
        pub role: Option<Role>,
        pub name: Option<String>,
        pub password: Option<String>
    }

    impl From<UserUpdate> for UserChanges {
        fn from(update: UserUpdate) -> Self {
            UserChanges {
                username: update.username,
                email: update.email,
                role: update.role,
                name: update.name,
                password: update.password
            }
        }
    }

    /// Logs a user in and stores their profile in the session slot
    #[utoipa::path(
        post,
        context_path = "/user",
        request_body = UserCredentials,
        responses(
            (status = 200, description = "Successfully logged in account", body = LoginResponse),
            (status = 403, description = "Password or username is not correct", body = Error),
            (status = 500, description = "An internal error on the server's end has occurred", body = Error)
        )
    )]
    #[post("/login", data = "<credentials>")]
    pub async fn login(
        user_store: &State<Arc<Mutex<UserStore>>>,
        session_store: &State<Arc<Mutex<SessionStore>>>,
        credentials: Json<UserCredentials>
    ) -> Result<Json<LoginResponse>, Error> {
        let user = user_store
            .acquire()?
            .authenticate(&credentials.username, &credentials.password, chrono::offset::Utc::now());

        let user = match user {
            Some(user) => user,
            None => {
                warn!("Failed login attempt for {}", credentials.username);
                return Err(Error::Forbidden(String::from("Password or username is not correct")))
            }
        };

        let token = session_store.acquire()?.save(&user)?;
        info!("{} logged in as {}", user.username, user.role);

        Ok(Json(LoginResponse { token, user }))
    }

    /// Clears the caller's session slot
    #[utoipa::path(
        post,
        context_path = "/user",
        responses(
            (status = 200, description = "Successfully logged out"),
            (status = 401, description = "No valid session was provided", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[post("/logout")]
    pub async fn logout(
        session_store: &State<Arc<Mutex<SessionStore>>>,
        session: Session
    ) -> Result<Status, Error> {
        session_store.acquire()?.clear(&session.token)?;
        info!("{} logged out", session.user.username);
        Ok(Status::Ok)
    }

    /// Grabs the logged-in profile
    #[utoipa::path(
        get,
        context_path = "/user",
        responses(
            (status = 200, description = "Successfully grabbed session profile", body = models::User),
            (status = 401, description = "No valid session was provided", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/me")]
    pub async fn me(session: Session) -> Json<models::User> {
        Json(session.user)
    }

    /// Lists every account
    #[utoipa::path(
        get,
        context_path = "/user",
        responses(
            (status = 200, description = "Successfully grabbed all accounts", body = [models::User]),
            (status = 401, description = "No valid session was provided", body = Error),
            (status = 403, description = "Only administrators can manage users", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[get("/all")]
    pub async fn all(
        user_store: &State<Arc<Mutex<UserStore>>>,
        _admin: Admin
    ) -> Result<Json<Vec<models::User>>, Error> {
        Ok(Json(user_store.acquire()?.all()))
    }

    /// Creates an account
    #[utoipa::path(
        post,
        context_path = "/user",
        request_body = UserCreation,
        responses(
            (status = 200, description = "Successfully created account", body = models::User),
            (status = 400, description = "The Client has sent a badly formed request", body = Error),
            (status = 403, description = "Username is already in use or caller is not an administrator", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[post("/create", data = "<creation>")]
    pub async fn create(
        config_store: &State<Arc<Mutex<Config>>>,
        user_store: &State<Arc<Mutex<UserStore>>>,
        _admin: Admin,
        creation: Json<UserCreation>
    ) -> Result<Json<models::User>, Error> {
        let creation = creation.into_inner();
        if creation.username.trim().is_empty() {
            return Err(Error::BadRequest(String::from("Username cannot be empty")))
        }

        let password = match creation.password {
            Some(password) => password,
            None => config_store.acquire()?.account_default_password.clone()
        };

        let event = user_store.acquire()?.dispatch(UserAction::Add(NewUser {
            username: creation.username,
            email: creation.email,
            role: creation.role,
            name: creation.name,
            password
        }))?;

        match event {
            UserEvent::Added(user) => Ok(Json(user)),
            _ => Err(Error::InternalError(String::from("An internal error on the server's end has occurred")))
        }
    }

    /// Updates the given fields of an account
    #[utoipa::path(
        put,
        context_path = "/user",
        request_body = UserUpdate,
        params(
            ("id" = String, Path, description = "Account id")
        ),
        responses(
            (status = 200, description = "Successfully updated account", body = models::User),
            (status = 400, description = "Username cannot be empty", body = Error),
            (status = 403, description = "Username is already in use or caller is not an administrator", body = Error),
            (status = 404, description = "No account has the given id", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[put("/<id>", data = "<update>")]
    pub async fn update(
        user_store: &State<Arc<Mutex<UserStore>>>,
        _admin: Admin,
        id: String,
        update: Json<UserUpdate>
    ) -> Result<Json<models::User>, Error> {
        let update = update.into_inner();
        if update.username.as_deref().map_or(false, |username| username.trim().is_empty()) {
            return Err(Error::BadRequest(String::from("Username cannot be empty")))
        }

        let event = user_store.acquire()?.dispatch(UserAction::Update {
            id,
            changes: update.into()
        })?;

        match event {
            UserEvent::Updated(user) => Ok(Json(user)),
            _ => Err(Error::InternalError(String::from("An internal error on the server's end has occurred")))
        }
    }

    /// Permanently deletes an account and every session it holds
    #[utoipa::path(
        delete,
        context_path = "/user",
        params(
            ("id" = String, Path, description = "Account id")
        ),
        responses(
            (status = 200, description = "Successfully deleted account"),
            (status = 403, description = "Only administrators can manage users", body = Error),
            (status = 404, description = "No account has the given id", body = Error)
        ),
        security(("bearer" = []))
    )]
    #[delete("/<id>")]
    pub async fn delete(
        user_store: &State<Arc<Mutex<UserStore>>>,
        session_store: &State<Arc<Mutex<SessionStore>>>,
        _admin: Admin,
        id: String
    ) -> Result<Status, Error> {
        user_store.acquire()?.dispatch(UserAction::Delete { id: id.clone() })?;
        let dropped = session_store.acquire()?.clear_user(&id)?;
        info!("Deleted account {} and {} session(s)", id, dropped);
        Ok(Status::Ok)
    }
}
