use crate::domain::error::StorageError;
use crate::domain::repository::TodoRepository;
use crate::domain::todo::{self, NewTodo, Todo, TodoId, TodoInput, TodoPatch};
use async_trait::async_trait;

pub type ServiceResult<T> = Result<T, StorageError>;

/// Business operations on todos. `Ok(None)` / `Ok(false)` mean "not found".
///
/// Read-modify-write operations (`update`, `mark_*`) are not serialized per id:
/// concurrent writers to the same record race and the last save wins.
#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    /// Persists a new todo. `completed` from the input is ignored.
    async fn create(&self, input: TodoInput) -> ServiceResult<Todo>;
    async fn list(&self) -> ServiceResult<Vec<Todo>>;
    async fn get(&self, id: &TodoId) -> ServiceResult<Option<Todo>>;
    async fn update(&self, id: &TodoId, patch: TodoPatch) -> ServiceResult<Option<Todo>>;
    /// Returns `false` when the id does not exist.
    async fn delete(&self, id: &TodoId) -> ServiceResult<bool>;
    async fn list_by_status(&self, completed: bool) -> ServiceResult<Vec<Todo>>;
    async fn list_by_priority(&self, priority: &str) -> ServiceResult<Vec<Todo>>;
    async fn search_by_title(&self, text: &str) -> ServiceResult<Vec<Todo>>;
    async fn mark_completed(&self, id: &TodoId) -> ServiceResult<Option<Todo>>;
    async fn mark_incomplete(&self, id: &TodoId) -> ServiceResult<Option<Todo>>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }

    pub fn repository(&self) -> &R { &self.repo }

    async fn modify(&self, id: &TodoId, change: impl FnOnce(&mut Todo) + Send) -> ServiceResult<Option<Todo>> {
        let Some(mut record) = self.repo.find_by_id(id).await? else { return Ok(None) };
        change(&mut record);
        record.touch(todo::now());
        let saved = self.repo.save(record).await?;
        tracing::debug!(id = %saved.id, completed = saved.completed, "todo updated");
        Ok(Some(saved))
    }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn create(&self, input: TodoInput) -> ServiceResult<Todo> {
        let now = todo::now();
        let draft = NewTodo {
            title: input.title,
            description: input.description,
            completed: false,
            priority: input.priority,
            created_at: now,
            updated_at: now,
        };
        let created = self.repo.insert(draft).await?;
        tracing::debug!(id = %created.id, "todo created");
        Ok(created)
    }

    async fn list(&self) -> ServiceResult<Vec<Todo>> { self.repo.find_all().await }

    async fn get(&self, id: &TodoId) -> ServiceResult<Option<Todo>> { self.repo.find_by_id(id).await }

    async fn update(&self, id: &TodoId, patch: TodoPatch) -> ServiceResult<Option<Todo>> {
        self.modify(id, move |todo| patch.apply(todo)).await
    }

    async fn delete(&self, id: &TodoId) -> ServiceResult<bool> {
        // Check-then-delete is not atomic; two concurrent callers may both see `true`.
        if !self.repo.exists_by_id(id).await? {
            return Ok(false);
        }
        self.repo.delete_by_id(id).await?;
        tracing::debug!(%id, "todo deleted");
        Ok(true)
    }

    async fn list_by_status(&self, completed: bool) -> ServiceResult<Vec<Todo>> {
        self.repo.find_by_completed(completed).await
    }

    async fn list_by_priority(&self, priority: &str) -> ServiceResult<Vec<Todo>> {
        self.repo.find_by_priority(priority).await
    }

    async fn search_by_title(&self, text: &str) -> ServiceResult<Vec<Todo>> {
        self.repo.find_by_title_containing(text).await
    }

    async fn mark_completed(&self, id: &TodoId) -> ServiceResult<Option<Todo>> {
        self.modify(id, |todo| todo.completed = true).await
    }

    async fn mark_incomplete(&self, id: &TodoId) -> ServiceResult<Option<Todo>> {
        self.modify(id, |todo| todo.completed = false).await
    }
}
