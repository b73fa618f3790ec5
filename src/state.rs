use crate::auth::{AccessTokenSigner, AuthService, RefreshTokenManager};
use crate::config::Config;
use crate::services::{FolderService, TaskService, UserService};
use crate::store::Stores;

/// Options that shape request handling, independent of the storage backend.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub jwt_secret: String,
    pub environment: String,
    pub bcrypt_cost: u32,
    pub guest_login_enabled: bool,
    pub cookie_secure: bool,
}

impl From<&Config> for AppSettings {
    fn from(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            environment: config.environment.clone(),
            bcrypt_cost: config.bcrypt_cost,
            guest_login_enabled: config.guest_login_enabled,
            cookie_secure: config.cookie_secure,
        }
    }
}

/// Everything handlers and middleware need, shared through `web::Data`.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub users: UserService,
    pub folders: FolderService,
    pub tasks: TaskService,
    pub environment: String,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(stores: Stores, settings: AppSettings) -> Self {
        let signer = AccessTokenSigner::new(&settings.jwt_secret);
        let auth = AuthService::new(
            stores.users.clone(),
            RefreshTokenManager::new(stores.tokens.clone()),
            signer,
            settings.guest_login_enabled,
        );
        let folders = FolderService::new(stores.folders.clone());

        Self {
            auth,
            users: UserService::new(stores.users, settings.bcrypt_cost),
            tasks: TaskService::new(stores.tasks, folders.clone()),
            folders,
            environment: settings.environment,
            cookie_secure: settings.cookie_secure,
        }
    }

    pub fn postgres(pool: sqlx::PgPool, config: &Config) -> Self {
        Self::new(Stores::postgres(pool, config.db_timeout), config.into())
    }

    pub fn in_memory(settings: AppSettings) -> Self {
        Self::new(Stores::in_memory(), settings)
    }
}

impl AppSettings {
    /// Cheap hashing, guest login on and cookies over plain HTTP.
    pub fn for_testing(jwt_secret: &str) -> Self {
        Self {
            jwt_secret: jwt_secret.to_string(),
            environment: "testing".to_string(),
            bcrypt_cost: 4,
            guest_login_enabled: true,
            cookie_secure: false,
        }
    }
}
