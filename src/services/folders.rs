use std::sync::Arc;

use validator::Validate;

use crate::error::AppError;
use crate::filters::{Page, ValidatedFilters};
use crate::models::{CreateFolderDto, Folder, UpdateFolderDto};
use crate::store::FolderStore;

#[derive(Clone)]
pub struct FolderService {
    folders: Arc<dyn FolderStore>,
}

impl FolderService {
    pub fn new(folders: Arc<dyn FolderStore>) -> Self {
        Self { folders }
    }

    /// Loads a folder the caller owns.
    pub async fn owned(&self, user_id: i64, folder_id: i64) -> Result<Folder, AppError> {
        let folder = self.folders.get(folder_id).await?;
        if folder.user_id != user_id {
            return Err(AppError::Forbidden(format!(
                "folder {} belongs to another user",
                folder_id
            )));
        }
        Ok(folder)
    }

    pub async fn create(&self, user_id: i64, input: CreateFolderDto) -> Result<Folder, AppError> {
        input.validate()?;
        Ok(self.folders.insert(user_id, &input.name).await?)
    }

    pub async fn get(&self, user_id: i64, folder_id: i64) -> Result<Folder, AppError> {
        self.owned(user_id, folder_id).await
    }

    pub async fn list(&self, user_id: i64, filters: &ValidatedFilters) -> Result<Page<Folder>, AppError> {
        Ok(self.folders.list_by_user(user_id, filters).await?)
    }

    pub async fn update(
        &self,
        user_id: i64,
        folder_id: i64,
        input: UpdateFolderDto,
    ) -> Result<Folder, AppError> {
        self.owned(user_id, folder_id).await?;
        input.validate()?;
        Ok(self
            .folders
            .update(folder_id, input.name.as_deref())
            .await?)
    }

    /// Removes the folder and, through the store, every task in it.
    pub async fn delete(&self, user_id: i64, folder_id: i64) -> Result<(), AppError> {
        self.owned(user_id, folder_id).await?;
        self.folders.delete(folder_id).await?;
        log::info!("user {} deleted folder {}", user_id, folder_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{PageParams, FOLDER_RULES};
    use crate::store::memory::MemoryStore;

    fn create(name: &str) -> CreateFolderDto {
        CreateFolderDto { name: name.into() }
    }

    #[actix_rt::test]
    async fn test_ownership_is_checked_after_existence() {
        let service = FolderService::new(Arc::new(MemoryStore::default()));
        let folder = service.create(1, create("Work")).await.unwrap();

        assert!(matches!(
            service.get(2, folder.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.get(2, folder.id + 100).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(service.get(1, folder.id).await.unwrap().name, "Work");

        let rename = UpdateFolderDto {
            name: Some("Home".into()),
        };
        assert!(matches!(
            service.update(2, folder.id, rename).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            service.delete(2, folder.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert_eq!(service.get(1, folder.id).await.unwrap().name, "Work");
    }

    #[actix_rt::test]
    async fn test_update_and_delete_by_owner() {
        let service = FolderService::new(Arc::new(MemoryStore::default()));
        let folder = service.create(1, create("Work")).await.unwrap();

        let updated = service
            .update(
                1,
                folder.id,
                UpdateFolderDto {
                    name: Some("Home".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Home");

        let unchanged = service
            .update(1, folder.id, UpdateFolderDto::default())
            .await
            .unwrap();
        assert_eq!(unchanged.name, "Home");

        service.delete(1, folder.id).await.unwrap();
        assert!(matches!(
            service.get(1, folder.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[actix_rt::test]
    async fn test_list_only_returns_own_folders() {
        let service = FolderService::new(Arc::new(MemoryStore::default()));
        service.create(1, create("a")).await.unwrap();
        service.create(1, create("b")).await.unwrap();
        service.create(2, create("c")).await.unwrap();

        let filters = PageParams::default().validate(&FOLDER_RULES).unwrap();
        let page = service.list(1, &filters).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|f| f.user_id == 1));
        assert_eq!(page.metadata(&filters).total_records, 2);
    }
}
