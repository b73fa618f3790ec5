use std::sync::Arc;

use validator::Validate;

use crate::auth::password::hash_password_blocking;
use crate::error::AppError;
use crate::models::user::normalize_email;
use crate::models::{CreateUserDto, User};
use crate::store::UserStore;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, bcrypt_cost: u32) -> Self {
        Self { users, bcrypt_cost }
    }

    pub async fn register(&self, input: CreateUserDto) -> Result<User, AppError> {
        input.validate()?;

        let email = normalize_email(&input.email);
        let password_hash = hash_password_blocking(input.password, self.bcrypt_cost).await?;
        let user = self.users.insert(&email, &password_hash).await?;

        log::info!("registered user {}", user.id);
        Ok(user)
    }

    pub async fn get(&self, user_id: i64) -> Result<User, AppError> {
        Ok(self.users.get(user_id).await?)
    }
}
