use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    repository::{StorageResult, TodoRepository},
    todo::{NewTodo, Todo, TodoId},
};

/// Process-local store. Records are kept in insertion order.
#[derive(Clone, Default)]
pub struct InMemoryTodoRepository {
    items: Arc<RwLock<Vec<Todo>>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self { Self::default() }

    async fn filter(&self, pred: impl Fn(&Todo) -> bool) -> Vec<Todo> {
        self.items.read().await.iter().filter(|&t| pred(t)).cloned().collect()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn init(&self) -> StorageResult<()> { Ok(()) }

    async fn insert(&self, todo: NewTodo) -> StorageResult<Todo> {
        let todo = todo.with_id(TodoId::generate());
        self.items.write().await.push(todo.clone());
        Ok(todo)
    }

    async fn find_by_id(&self, id: &TodoId) -> StorageResult<Option<Todo>> {
        Ok(self.items.read().await.iter().find(|t| &t.id == id).cloned())
    }

    async fn find_all(&self) -> StorageResult<Vec<Todo>> { Ok(self.items.read().await.clone()) }

    async fn save(&self, todo: Todo) -> StorageResult<Todo> {
        let mut items = self.items.write().await;
        match items.iter().position(|t| t.id == todo.id) {
            Some(idx) => items[idx] = todo.clone(),
            None => items.push(todo.clone()),
        }
        Ok(todo)
    }

    async fn exists_by_id(&self, id: &TodoId) -> StorageResult<bool> {
        Ok(self.items.read().await.iter().any(|t| &t.id == id))
    }

    async fn delete_by_id(&self, id: &TodoId) -> StorageResult<()> {
        self.items.write().await.retain(|t| &t.id != id);
        Ok(())
    }

    async fn delete_all(&self) -> StorageResult<()> {
        self.items.write().await.clear();
        Ok(())
    }

    async fn count(&self) -> StorageResult<u64> { Ok(self.items.read().await.len() as u64) }

    async fn find_by_completed(&self, completed: bool) -> StorageResult<Vec<Todo>> {
        Ok(self.filter(|t| t.completed == completed).await)
    }

    async fn find_by_priority(&self, priority: &str) -> StorageResult<Vec<Todo>> {
        Ok(self.filter(|t| t.priority.as_deref() == Some(priority)).await)
    }

    async fn find_by_title_containing(&self, needle: &str) -> StorageResult<Vec<Todo>> {
        let needle = needle.to_lowercase();
        Ok(self.filter(|t| t.title.as_deref().unwrap_or_default().to_lowercase().contains(&needle)).await)
    }
}
