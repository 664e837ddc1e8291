use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, widgets::{Block, Borders, List, ListItem, Paragraph, ListState}, layout::{Layout, Constraint, Direction}, style::{Style, Modifier, Color}};

use todo_api::{
    application::todo_service::{TodoService, TodoServiceImpl},
    config::{AppConfig, StorageBackend},
    domain::todo::{Todo, TodoId, TodoInput, TodoPatch},
    infrastructure::{memory_repo::InMemoryTodoRepository, sqlite_repo::SqliteTodoRepository},
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env()?;
    match config.storage {
        StorageBackend::Memory => run(TodoServiceImpl::new(InMemoryTodoRepository::new()), "memory").await,
        StorageBackend::Sqlite(url) => {
            let service = TodoServiceImpl::new(SqliteTodoRepository::open(&url).await?);
            run(service, &url).await
        }
    }
}

async fn run<S: TodoService>(service: S, source: &str) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, service, source).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    res
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode { View, Create, Edit, Search }

#[derive(Clone, Copy, PartialEq, Eq)]
enum Filter { All, Open, Done }

impl Filter {
    fn next(self) -> Self { match self { Filter::All => Filter::Open, Filter::Open => Filter::Done, Filter::Done => Filter::All } }
    fn label(self) -> &'static str { match self { Filter::All => "All", Filter::Open => "Open", Filter::Done => "Done" } }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ActiveField { Title, Description, Priority }

impl ActiveField {
    fn next(self) -> Self { match self { ActiveField::Title => ActiveField::Description, ActiveField::Description => ActiveField::Priority, ActiveField::Priority => ActiveField::Title } }
    fn label(self) -> &'static str { match self { ActiveField::Title => "Title", ActiveField::Description => "Desc", ActiveField::Priority => "Priority" } }
}

#[derive(Default)]
struct Draft { title: String, description: String, priority: String }

impl Draft {
    fn field_mut(&mut self, field: ActiveField) -> &mut String {
        match field { ActiveField::Title => &mut self.title, ActiveField::Description => &mut self.description, ActiveField::Priority => &mut self.priority }
    }

    fn field(&self, field: ActiveField) -> &str {
        match field { ActiveField::Title => &self.title, ActiveField::Description => &self.description, ActiveField::Priority => &self.priority }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// Updates always overwrite `completed`, so the current value is carried.
/// A blank description clears an existing one but never creates an empty one.
fn edit_patch(draft: &Draft, original: &Todo) -> TodoPatch {
    let description = match (non_empty(&draft.description), &original.description) {
        (None, None) => None,
        (text, _) => Some(text.unwrap_or_default()),
    };
    TodoPatch {
        title: non_empty(&draft.title),
        description,
        priority: non_empty(&draft.priority),
        completed: original.completed,
    }
}

struct App<S: TodoService> {
    service: S,
    items: Vec<Todo>,
    selected: usize,
    mode: Mode,
    list_state: ListState,
    filter: Filter,
    query: String,
    field: ActiveField,
    draft: Draft,
    status: String,
}

impl<S: TodoService> App<S> {
    async fn load(&mut self) -> Result<()> {
        let mut items = match self.filter {
            Filter::All => self.service.list().await?,
            Filter::Open => self.service.list_by_status(false).await?,
            Filter::Done => self.service.list_by_status(true).await?,
        };
        if !self.query.is_empty() {
            let hits: HashSet<TodoId> = self.service.search_by_title(&self.query).await?.into_iter().map(|t| t.id).collect();
            items.retain(|t| hits.contains(&t.id));
        }
        self.items = items;
        let len = self.items.len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
        Ok(())
    }

    fn current(&self) -> Option<&Todo> { self.items.get(self.selected) }

    fn reset_draft(&mut self) {
        self.mode = Mode::View;
        self.field = ActiveField::Title;
        self.draft = Draft::default();
    }

    async fn toggle_selected(&mut self) -> Result<()> {
        let Some(todo) = self.current() else { return Ok(()) };
        let id = todo.id.clone();
        let updated = if todo.completed { self.service.mark_incomplete(&id).await? } else { self.service.mark_completed(&id).await? };
        if updated.is_none() { self.status = format!("{id} no longer exists"); }
        Ok(())
    }

    async fn delete_selected(&mut self) -> Result<()> {
        let Some(id) = self.current().map(|t| t.id.clone()) else { return Ok(()) };
        if !self.service.delete(&id).await? { self.status = format!("{id} was already gone"); }
        if self.selected > 0 { self.selected -= 1; }
        Ok(())
    }

    async fn submit_draft(&mut self) -> Result<()> {
        match self.mode {
            Mode::Create => {
                if let Some(title) = non_empty(&self.draft.title) {
                    let input = TodoInput { title: Some(title), description: non_empty(&self.draft.description), priority: non_empty(&self.draft.priority), ..Default::default() };
                    let created = self.service.create(input).await?;
                    self.status = format!("created {}", created.id);
                }
            }
            Mode::Edit => {
                if let Some(todo) = self.current() {
                    let id = todo.id.clone();
                    let patch = edit_patch(&self.draft, todo);
                    if self.service.update(&id, patch).await?.is_none() { self.status = format!("{id} no longer exists"); }
                }
            }
            Mode::View | Mode::Search => {}
        }
        Ok(())
    }
}

async fn run_app<S: TodoService>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, service: S, source: &str) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut app = App { service, items: vec![], selected: 0, mode: Mode::View, list_state: ListState::default(), filter: Filter::All, query: String::new(), field: ActiveField::Title, draft: Draft::default(), status: String::new() };
    app.load().await?;

    loop {
        terminal.draw(|f| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(3),
                ])
                .split(f.size());

            let header = Paragraph::new("Enter: toggle done, n: new, e: edit, d: delete, f: filter, /: search, q: quit")
                .block(Block::default().borders(Borders::ALL).title("todo-tui"));
            f.render_widget(header, chunks[0]);

            let middle = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            let list_items: Vec<ListItem> = app.items.iter().map(|t| {
                let mark = if t.completed { "[x]" } else { "[ ]" };
                let priority = t.priority.as_deref().map(|p| format!(" ({p})")).unwrap_or_default();
                ListItem::new(format!("{} {}{}", mark, t.title.as_deref().unwrap_or("(untitled)"), priority))
            }).collect();
            let title = if app.query.is_empty() { format!("items [{}]", app.filter.label()) } else { format!("items [{}] matching {:?}", app.filter.label(), app.query) };
            let list = List::new(list_items)
                .block(Block::default().borders(Borders::ALL).title(title))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, middle[0], &mut app.list_state);

            let detail = match app.current() {
                Some(t) => format!(
                    "Title:\n{}\n\nPriority: {}\nCompleted: {}\nCreated: {}\nUpdated: {}\n\nDescription:\n{}",
                    t.title.as_deref().unwrap_or("(untitled)"),
                    t.priority.as_deref().unwrap_or("-"),
                    t.completed,
                    t.created_at.format("%Y-%m-%d %H:%M:%S"),
                    t.updated_at.format("%Y-%m-%d %H:%M:%S"),
                    t.description.as_deref().unwrap_or("(no description)"),
                ),
                None => String::new(),
            };
            let details = Paragraph::new(detail)
                .block(Block::default().borders(Borders::ALL).title("details"));
            f.render_widget(details, middle[1]);

            let footer_text = match app.mode {
                Mode::View => format!("store={}  |  {}", source, app.status),
                Mode::Search => format!("Search title: {}_  |  (Enter to apply, Esc to clear)", app.query),
                Mode::Create | Mode::Edit => format!("{}: {}_  |  (Tab to switch, Enter to save, Esc to cancel)", app.field.label(), app.draft.field(app.field)),
            };
            let footer = Paragraph::new(footer_text)
                .block(Block::default().borders(Borders::ALL).title(match app.mode { Mode::View => "info", Mode::Create => "create", Mode::Edit => "edit", Mode::Search => "search" }));
            f.render_widget(footer, chunks[2]);
        })?;

        if !event::poll(tick_rate)? { continue; }
        let Event::Key(key) = event::read()? else { continue };
        // Only act on key presses; ignore repeats and releases to prevent duplicate input
        if key.kind != KeyEventKind::Press { continue; }
        match app.mode {
            Mode::View => match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Up => { if app.selected > 0 { app.selected -= 1; app.list_state.select(Some(app.selected)); } }
                KeyCode::Down => { if app.selected + 1 < app.items.len() { app.selected += 1; app.list_state.select(Some(app.selected)); } }
                KeyCode::Enter => { app.toggle_selected().await?; app.load().await?; }
                KeyCode::Char('d') => { app.delete_selected().await?; app.load().await?; }
                KeyCode::Char('f') => { app.filter = app.filter.next(); app.load().await?; }
                KeyCode::Char('/') => { app.mode = Mode::Search; }
                KeyCode::Char('n') => { app.reset_draft(); app.mode = Mode::Create; }
                KeyCode::Char('e') => {
                    if let Some(t) = app.current() {
                        let draft = Draft {
                            title: t.title.clone().unwrap_or_default(),
                            description: t.description.clone().unwrap_or_default(),
                            priority: t.priority.clone().unwrap_or_default(),
                        };
                        app.reset_draft();
                        app.draft = draft;
                        app.mode = Mode::Edit;
                    }
                }
                _ => {}
            },
            Mode::Search => match key.code {
                KeyCode::Esc => { app.query.clear(); app.mode = Mode::View; app.load().await?; }
                KeyCode::Enter => { app.mode = Mode::View; app.load().await?; }
                KeyCode::Backspace => { app.query.pop(); }
                KeyCode::Char(c) => app.query.push(c),
                _ => {}
            },
            Mode::Create | Mode::Edit => match key.code {
                KeyCode::Esc => app.reset_draft(),
                KeyCode::Enter => { app.submit_draft().await?; app.reset_draft(); app.load().await?; }
                KeyCode::Tab => { app.field = app.field.next(); }
                KeyCode::Backspace => { app.draft.field_mut(app.field).pop(); }
                KeyCode::Char(c) => { let field = app.field; app.draft.field_mut(field).push(c); }
                _ => {}
            },
        }
    }
    Ok(())
}
