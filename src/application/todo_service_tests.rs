#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::super::todo_service::{TodoService, TodoServiceImpl};
    use crate::domain::{error::StorageError, repository::{StorageResult, TodoRepository}, todo::{NewTodo, Todo, TodoId, TodoInput, TodoPatch}};
    use crate::infrastructure::memory_repo::InMemoryTodoRepository;

    fn service() -> TodoServiceImpl<InMemoryTodoRepository> {
        TodoServiceImpl::new(InMemoryTodoRepository::new())
    }

    fn input(title: &str, priority: &str) -> TodoInput {
        TodoInput { title: Some(title.into()), priority: Some(priority.into()), ..Default::default() }
    }

    fn tick() { std::thread::sleep(Duration::from_millis(5)); }

    #[tokio::test]
    async fn unit_create_and_get() {
        let service = service();
        let created = service.create(input("X", "LOW")).await.unwrap();
        assert_eq!(created.title.as_deref(), Some("X"));
        let got = service.get(&created.id).await.unwrap().unwrap();
        assert_eq!(got, created);
    }

    #[tokio::test]
    async fn create_forces_incomplete_and_equal_timestamps() {
        let service = service();
        let created = service.create(TodoInput { completed: true, ..input("done already?", "HIGH") }).await.unwrap();
        assert!(!created.completed);
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn create_accepts_missing_title() {
        let service = service();
        let created = service.create(TodoInput::default()).await.unwrap();
        assert_eq!(created.title, None);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_merges_text_fields_and_overwrites_completed() {
        let service = service();
        let created = service.create(TodoInput { description: Some("desc".into()), ..input("Title", "LOW") }).await.unwrap();
        service.mark_completed(&created.id).await.unwrap().unwrap();

        tick();
        let updated = service.update(&created.id, TodoPatch::default()).await.unwrap().unwrap();
        assert_eq!(updated.title.as_deref(), Some("Title"));
        assert_eq!(updated.description.as_deref(), Some("desc"));
        assert_eq!(updated.priority.as_deref(), Some("LOW"));
        assert!(!updated.completed);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);

        let patch = TodoPatch { title: Some("New".into()), priority: Some("HIGH".into()), completed: true, ..Default::default() };
        let updated = service.update(&created.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.title.as_deref(), Some("New"));
        assert_eq!(updated.description.as_deref(), Some("desc"));
        assert_eq!(updated.priority.as_deref(), Some("HIGH"));
        assert!(updated.completed);
        assert_eq!(service.get(&created.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn toggles_refresh_updated_at_only() {
        let service = service();
        let created = service.create(input("Toggle", "MEDIUM")).await.unwrap();
        tick();
        let done = service.mark_completed(&created.id).await.unwrap().unwrap();
        assert!(done.completed);
        assert!(done.updated_at > created.updated_at);
        assert_eq!(done.created_at, created.created_at);
        tick();
        let open = service.mark_incomplete(&created.id).await.unwrap().unwrap();
        assert!(!open.completed);
        assert!(open.updated_at > done.updated_at);
    }

    #[tokio::test]
    async fn delete_reports_true_exactly_once() {
        let service = service();
        let created = service.create(input("Gone", "LOW")).await.unwrap();
        assert!(service.delete(&created.id).await.unwrap());
        assert!(!service.delete(&created.id).await.unwrap());
        assert!(!service.delete(&TodoId::from("never-existed")).await.unwrap());
        assert_eq!(service.get(&created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found_without_side_effects() {
        let service = service();
        service.create(input("Existing", "LOW")).await.unwrap();
        let missing = TodoId::from("missing");
        assert_eq!(service.get(&missing).await.unwrap(), None);
        assert_eq!(service.update(&missing, TodoPatch { completed: true, ..Default::default() }).await.unwrap(), None);
        assert_eq!(service.mark_completed(&missing).await.unwrap(), None);
        assert_eq!(service.mark_incomplete(&missing).await.unwrap(), None);
        assert_eq!(service.repository().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn queries_pass_through() {
        let service = service();
        service.create(input("Buy Groceries", "HIGH")).await.unwrap();
        let books = service.create(input("Buy Books", "MEDIUM")).await.unwrap();
        service.create(input("Write Documentation", "LOW")).await.unwrap();
        service.mark_completed(&books.id).await.unwrap();

        for label in ["HIGH", "MEDIUM", "LOW"] {
            let found = service.list_by_priority(label).await.unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].priority.as_deref(), Some(label));
        }
        assert_eq!(service.search_by_title("buy").await.unwrap().len(), 2);
        assert!(service.search_by_title("NonExistent").await.unwrap().is_empty());
        let done = service.list_by_status(true).await.unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, books.id);
        assert_eq!(service.list_by_status(false).await.unwrap().len(), 2);
    }

    #[derive(Clone)]
    struct DownRepo;

    fn down<T>() -> StorageResult<T> { Err(StorageError::Unavailable("connection refused".into())) }

    #[async_trait]
    impl TodoRepository for DownRepo {
        async fn init(&self) -> StorageResult<()> { down() }
        async fn insert(&self, _: NewTodo) -> StorageResult<Todo> { down() }
        async fn find_by_id(&self, _: &TodoId) -> StorageResult<Option<Todo>> { down() }
        async fn find_all(&self) -> StorageResult<Vec<Todo>> { down() }
        async fn save(&self, _: Todo) -> StorageResult<Todo> { down() }
        async fn exists_by_id(&self, _: &TodoId) -> StorageResult<bool> { down() }
        async fn delete_by_id(&self, _: &TodoId) -> StorageResult<()> { down() }
        async fn delete_all(&self) -> StorageResult<()> { down() }
        async fn count(&self) -> StorageResult<u64> { down() }
        async fn find_by_completed(&self, _: bool) -> StorageResult<Vec<Todo>> { down() }
        async fn find_by_priority(&self, _: &str) -> StorageResult<Vec<Todo>> { down() }
        async fn find_by_title_containing(&self, _: &str) -> StorageResult<Vec<Todo>> { down() }
    }

    #[tokio::test]
    async fn storage_failures_propagate_instead_of_not_found() {
        let service = TodoServiceImpl::new(DownRepo);
        let id = TodoId::from("any");
        assert!(service.create(TodoInput::default()).await.unwrap_err().is_unavailable());
        assert!(service.get(&id).await.unwrap_err().is_unavailable());
        assert!(service.update(&id, TodoPatch::default()).await.unwrap_err().is_unavailable());
        assert!(service.delete(&id).await.unwrap_err().is_unavailable());
        assert!(service.mark_completed(&id).await.unwrap_err().is_unavailable());
        assert!(service.mark_incomplete(&id).await.unwrap_err().is_unavailable());
        assert!(service.list().await.is_err());
        assert!(service.list_by_status(true).await.is_err());
        assert!(service.list_by_priority("HIGH").await.is_err());
        assert!(service.search_by_title("x").await.is_err());
    }
}
