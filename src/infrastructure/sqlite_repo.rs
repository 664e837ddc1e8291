use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{sqlite::{SqlitePoolOptions, SqliteRow}, Pool, Row, Sqlite};

use crate::domain::{
    error::StorageError,
    repository::{StorageResult, TodoRepository},
    todo::{NewTodo, Todo, TodoId},
};

const SELECT_TODOS: &str = "SELECT id, title, description, completed, priority, created_at, updated_at FROM todos";

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoRepository {
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        // Every connection to `:memory:` is its own database, so keep exactly one alive.
        let options = if is_in_memory(database_url) {
            SqlitePoolOptions::new().max_connections(1).min_connections(1).idle_timeout(None).max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = options
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Creates the database file if needed, connects and ensures the schema.
    pub async fn open(database_url: &str) -> StorageResult<Self> {
        prepare_sqlite_file(database_url).map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let repo = Self::connect(database_url).await?;
        repo.init().await?;
        Ok(repo)
    }

    /// Closes the pool; later calls fail as unavailable.
    pub async fn close(&self) { self.pool.close().await; }

    async fn fetch_where(&self, clause: &str, bind: impl FnOnce(SqlQuery<'_>) -> SqlQuery<'_>) -> StorageResult<Vec<Todo>> {
        let sql = format!("{SELECT_TODOS} WHERE {clause} ORDER BY rowid");
        let rows = bind(sqlx::query(&sql)).fetch_all(&*self.pool).await?;
        rows.into_iter().map(row_to_todo).collect()
    }
}

type SqlQuery<'q> = sqlx::query::Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> StorageResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                id TEXT PRIMARY KEY,
                title TEXT,
                description TEXT,
                completed INTEGER NOT NULL DEFAULT 0,
                priority TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn insert(&self, todo: NewTodo) -> StorageResult<Todo> {
        let todo = todo.with_id(TodoId::generate());
        sqlx::query(
            "INSERT INTO todos (id, title, description, completed, priority, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(todo.id.as_str())
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.completed)
        .bind(&todo.priority)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .execute(&*self.pool)
        .await?;
        Ok(todo)
    }

    async fn find_by_id(&self, id: &TodoId) -> StorageResult<Option<Todo>> {
        let row = sqlx::query(&format!("{SELECT_TODOS} WHERE id = ?1"))
            .bind(id.as_str())
            .fetch_optional(&*self.pool)
            .await?;
        row.map(row_to_todo).transpose()
    }

    async fn find_all(&self) -> StorageResult<Vec<Todo>> {
        let rows = sqlx::query(&format!("{SELECT_TODOS} ORDER BY rowid"))
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter().map(row_to_todo).collect()
    }

    async fn save(&self, todo: Todo) -> StorageResult<Todo> {
        sqlx::query(
            "INSERT INTO todos (id, title, description, completed, priority, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                completed = excluded.completed,
                priority = excluded.priority,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at",
        )
        .bind(todo.id.as_str())
        .bind(&todo.title)
        .bind(&todo.description)
        .bind(todo.completed)
        .bind(&todo.priority)
        .bind(todo.created_at)
        .bind(todo.updated_at)
        .execute(&*self.pool)
        .await?;
        Ok(todo)
    }

    async fn exists_by_id(&self, id: &TodoId) -> StorageResult<bool> {
        let found: i64 = sqlx::query_scalar::<_, i64>("SELECT EXISTS(SELECT 1 FROM todos WHERE id = ?1)")
            .bind(id.as_str())
            .fetch_one(&*self.pool)
            .await?;
        Ok(found != 0)
    }

    async fn delete_by_id(&self, id: &TodoId) -> StorageResult<()> {
        sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id.as_str())
            .execute(&*self.pool)
            .await?;
        Ok(())
    }

    async fn delete_all(&self) -> StorageResult<()> {
        sqlx::query("DELETE FROM todos").execute(&*self.pool).await?;
        Ok(())
    }

    async fn count(&self) -> StorageResult<u64> {
        let n: i64 = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM todos").fetch_one(&*self.pool).await?;
        Ok(u64::try_from(n).unwrap_or_default())
    }

    async fn find_by_completed(&self, completed: bool) -> StorageResult<Vec<Todo>> {
        self.fetch_where("completed = ?1", |q| q.bind(completed)).await
    }

    async fn find_by_priority(&self, priority: &str) -> StorageResult<Vec<Todo>> {
        let priority = priority.to_owned();
        self.fetch_where("priority = ?1", |q| q.bind(priority)).await
    }

    async fn find_by_title_containing(&self, needle: &str) -> StorageResult<Vec<Todo>> {
        let needle = needle.to_owned();
        self.fetch_where("instr(lower(coalesce(title, '')), lower(?1)) > 0", |q| q.bind(needle)).await
    }
}

fn row_to_todo(row: SqliteRow) -> StorageResult<Todo> {
    let corrupt = |e: sqlx::Error| StorageError::Corrupt(e.to_string());
    let id: String = row.try_get("id").map_err(corrupt)?;
    let created_at: NaiveDateTime = row.try_get("created_at").map_err(corrupt)?;
    let updated_at: NaiveDateTime = row.try_get("updated_at").map_err(corrupt)?;

    Ok(Todo {
        id: TodoId(id),
        title: row.try_get("title").map_err(corrupt)?,
        description: row.try_get("description").map_err(corrupt)?,
        completed: row.try_get("completed").map_err(corrupt)?,
        created_at,
        updated_at,
        priority: row.try_get("priority").map_err(corrupt)?,
    })
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

fn prepare_sqlite_file(database_url: &str) -> std::io::Result<()> {
    if is_in_memory(database_url) { return Ok(()); }
    if let Some(path) = database_url.strip_prefix("sqlite://") {
        let path = path.split('?').next().unwrap_or(path);
        // On Windows, absolute paths may look like /C:/path; strip the leading slash
        let path = if cfg!(windows) && path.len() >= 3 && path.as_bytes()[0] == b'/' && path.as_bytes()[2] == b':' {
            &path[1..]
        } else {
            path
        };
        use std::{fs, fs::OpenOptions, path::Path};
        let p = Path::new(path);
        if let Some(parent) = p.parent() { if !parent.as_os_str().is_empty() { fs::create_dir_all(parent)?; } }
        if !p.exists() {
            OpenOptions::new().create(true).append(true).open(p)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::todo::now;

    async fn repo() -> SqliteTodoRepository {
        SqliteTodoRepository::open("sqlite::memory:").await.unwrap()
    }

    fn draft(title: &str, priority: &str, completed: bool) -> NewTodo {
        let at = now();
        NewTodo { title: Some(title.into()), description: None, completed, priority: Some(priority.into()), created_at: at, updated_at: at }
    }

    #[tokio::test]
    async fn insert_assigns_distinct_ids_and_round_trips() {
        let repo = repo().await;
        let a = repo.insert(draft("Alpha", "HIGH", false)).await.unwrap();
        let b = repo.insert(draft("Beta", "LOW", true)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(repo.find_by_id(&a.id).await.unwrap(), Some(a.clone()));
        assert_eq!(repo.count().await.unwrap(), 2);
        let all = repo.find_all().await.unwrap();
        assert_eq!(all.iter().map(|t| t.id.clone()).collect::<Vec<_>>(), vec![a.id, b.id]);
    }

    #[tokio::test]
    async fn save_upserts_and_delete_is_idempotent() {
        let repo = repo().await;
        let mut todo = repo.insert(draft("Alpha", "HIGH", false)).await.unwrap();
        todo.title = None;
        todo.completed = true;
        repo.save(todo.clone()).await.unwrap();
        assert_eq!(repo.find_by_id(&todo.id).await.unwrap(), Some(todo.clone()));
        assert_eq!(repo.count().await.unwrap(), 1);

        assert!(repo.exists_by_id(&todo.id).await.unwrap());
        repo.delete_by_id(&todo.id).await.unwrap();
        repo.delete_by_id(&todo.id).await.unwrap();
        assert!(!repo.exists_by_id(&todo.id).await.unwrap());
        assert_eq!(repo.find_by_id(&todo.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn filtered_scans() {
        let repo = repo().await;
        repo.insert(draft("Buy Groceries", "HIGH", false)).await.unwrap();
        repo.insert(draft("buy books", "high", true)).await.unwrap();
        repo.insert(draft("Write Documentation", "LOW", false)).await.unwrap();

        assert_eq!(repo.find_by_completed(true).await.unwrap().len(), 1);
        assert_eq!(repo.find_by_completed(false).await.unwrap().len(), 2);
        assert_eq!(repo.find_by_priority("HIGH").await.unwrap().len(), 1);
        assert_eq!(repo.find_by_priority("MEDIUM").await.unwrap().len(), 0);
        assert_eq!(repo.find_by_title_containing("BUY").await.unwrap().len(), 2);
        assert_eq!(repo.find_by_title_containing("").await.unwrap().len(), 3);
        assert!(repo.find_by_title_containing("NonExistent").await.unwrap().is_empty());

        repo.delete_all().await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
