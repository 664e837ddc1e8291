use async_trait::async_trait;
use super::error::StorageError;
use super::todo::{NewTodo, Todo, TodoId};

pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence boundary for todos. Adapters hold no business rules.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> StorageResult<()>;
    /// Assigns a fresh id and persists the record.
    async fn insert(&self, todo: NewTodo) -> StorageResult<Todo>;
    async fn find_by_id(&self, id: &TodoId) -> StorageResult<Option<Todo>>;
    async fn find_all(&self) -> StorageResult<Vec<Todo>>;
    /// Upserts by id.
    async fn save(&self, todo: Todo) -> StorageResult<Todo>;
    async fn exists_by_id(&self, id: &TodoId) -> StorageResult<bool>;
    /// Removing an absent id is not an error.
    async fn delete_by_id(&self, id: &TodoId) -> StorageResult<()>;
    async fn delete_all(&self) -> StorageResult<()>;
    async fn count(&self) -> StorageResult<u64>;
    async fn find_by_completed(&self, completed: bool) -> StorageResult<Vec<Todo>>;
    /// Exact, case-sensitive match.
    async fn find_by_priority(&self, priority: &str) -> StorageResult<Vec<Todo>>;
    /// Case-insensitive substring match; an empty needle matches everything.
    async fn find_by_title_containing(&self, needle: &str) -> StorageResult<Vec<Todo>>;
}
