//! Task manager tools.
//!
//! Four tools share one [`TaskBook`]: `add_task`, `list_tasks`,
//! `complete_task` and `delete_task`. Listings use the `- [ID: n] text`
//! line format, which is what the bulk shortcut scans for ids.
//!
//! The book is in-memory, or backed by a JSON file that is rewritten after
//! every change.

use async_trait::async_trait;
use parley_domain::{
    ArgumentType, ProviderError, ToolDefinition, ToolError, ToolParameter, ToolProvider, ToolSpec,
    ValidatedArguments,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

pub const ADD_TASK: &str = "add_task";
pub const LIST_TASKS: &str = "list_tasks";
pub const COMPLETE_TASK: &str = "complete_task";
pub const DELETE_TASK: &str = "delete_task";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "todo" => Some(TaskStatus::Todo),
            "done" => Some(TaskStatus::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub description: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TaskState {
    next_id: i64,
    tasks: Vec<Task>,
}

impl TaskState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id = self.next_id.max(self.tasks.iter().map(|t| t.id).max().unwrap_or(0));
        self.next_id += 1;
        self.next_id
    }
}

/// Shared task storage
#[derive(Debug)]
pub struct TaskBook {
    state: Mutex<TaskState>,
    path: Option<PathBuf>,
}

impl TaskBook {
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(TaskState::default()),
            path: None,
        }
    }

    /// Open a file-backed book; a missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => TaskState::default(),
            Err(e) => return Err(e),
        };
        debug!("Opened task book at {}", path.display());
        Ok(Self {
            state: Mutex::new(state),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn add(&self, description: &str) -> Result<Task, ToolError> {
        self.mutate(|state| {
            let task = Task {
                id: state.allocate_id(),
                description: description.trim().to_string(),
                status: TaskStatus::Todo,
            };
            state.tasks.push(task.clone());
            task
        })
    }

    pub fn list(&self, status: TaskStatus) -> Result<Vec<Task>, ToolError> {
        let state = self.lock()?;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.status == status)
            .cloned()
            .collect())
    }

    /// Mark tasks done; returns how many ids matched.
    pub fn complete(&self, ids: &[i64]) -> Result<usize, ToolError> {
        self.mutate(|state| {
            let mut count = 0;
            for task in state.tasks.iter_mut().filter(|t| ids.contains(&t.id)) {
                task.status = TaskStatus::Done;
                count += 1;
            }
            count
        })
    }

    /// Remove tasks; returns how many ids matched.
    pub fn delete(&self, ids: &[i64]) -> Result<usize, ToolError> {
        self.mutate(|state| {
            let before = state.tasks.len();
            state.tasks.retain(|t| !ids.contains(&t.id));
            before - state.tasks.len()
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, TaskState>, ToolError> {
        self.state
            .lock()
            .map_err(|_| ToolError::execution_failed("task book lock poisoned"))
    }

    /// Apply `f` to a copy and commit it only once the copy is saved, so a
    /// failed write leaves memory matching the file.
    fn mutate<T>(&self, f: impl FnOnce(&mut TaskState) -> T) -> Result<T, ToolError> {
        let mut state = self.lock()?;
        let mut draft = state.clone();
        let result = f(&mut draft);
        if let Some(path) = &self.path {
            persist(path, &draft).map_err(|e| {
                warn!("Failed to save task book to {}: {}", path.display(), e);
                ToolError::execution_failed(format!("could not save tasks: {}", e))
            })?;
        }
        *state = draft;
        Ok(result)
    }
}

fn persist(path: &Path, state: &TaskState) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, json)
}

/// Render a listing in the `- [ID: n] text` format
pub fn format_listing(status: TaskStatus, tasks: &[Task]) -> String {
    if tasks.is_empty() {
        return match status {
            TaskStatus::Todo => "Nie masz żadnych zadań do zrobienia.".to_string(),
            TaskStatus::Done => "Nie masz żadnych wykonanych zadań.".to_string(),
        };
    }
    let mut out = format!("Twoje zadania (status: {}):\n", status.as_str());
    for task in tasks {
        out.push_str(&format!("- [ID: {}] {}\n", task.id, task.description));
    }
    out
}

fn task_ids_parameter(description: &str) -> ToolParameter {
    ToolParameter::new("task_ids", description, true)
        .with_type(ArgumentType::list_of(ArgumentType::Integer))
}

/// Provides the four task tools over one shared [`TaskBook`]
pub struct TaskProvider {
    book: Arc<TaskBook>,
}

impl TaskProvider {
    pub fn new(book: Arc<TaskBook>) -> Self {
        Self { book }
    }

    pub fn book(&self) -> &Arc<TaskBook> {
        &self.book
    }

    pub fn tools(&self) -> Vec<ToolSpec> {
        let book = Arc::clone(&self.book);
        let add = ToolSpec::from_sync_fn(
            ToolDefinition::new(
                ADD_TASK,
                "Adds a new task to the to-do list. Use when the user wants to add a task or note something to do.",
            )
            .with_parameter(ToolParameter::new(
                "description",
                "Description of the task to add",
                true,
            )),
            move |args: &ValidatedArguments| {
                let description = args.require_str("description")?;
                if description.trim().is_empty() {
                    return Err(ToolError::invalid_argument("Task description is empty"));
                }
                let task = book.add(description)?;
                Ok(format!("Pomyślnie dodano zadanie: '{}'.", task.description))
            },
        );

        let book = Arc::clone(&self.book);
        let list = ToolSpec::from_sync_fn(
            ToolDefinition::new(
                LIST_TASKS,
                "Lists tasks with the given status ('todo' by default). Use when the user asks what they have to do.",
            )
            .with_parameter(ToolParameter::new(
                "status",
                "Status of tasks to show: 'todo' or 'done'",
                false,
            )),
            move |args: &ValidatedArguments| {
                let status = match args.get_str("status") {
                    None => TaskStatus::Todo,
                    Some(s) => TaskStatus::parse(s).ok_or_else(|| {
                        ToolError::invalid_argument(format!("Unknown task status: {}", s))
                    })?,
                };
                Ok(format_listing(status, &book.list(status)?))
            },
        );

        let book = Arc::clone(&self.book);
        let complete = ToolSpec::from_sync_fn(
            ToolDefinition::new(
                COMPLETE_TASK,
                "Marks tasks as done. Use when the user wants to mark tasks as finished.",
            )
            .with_parameter(task_ids_parameter("List of task ids to mark as done")),
            move |args: &ValidatedArguments| {
                let ids = args.require_i64_list("task_ids")?;
                match book.complete(&ids)? {
                    0 => Ok("Nie znaleziono zadań o podanych ID.".to_string()),
                    n => Ok(format!("Pomyślnie oznaczono {} zadań jako wykonane.", n)),
                }
            },
        );

        let book = Arc::clone(&self.book);
        let delete = ToolSpec::from_sync_fn(
            ToolDefinition::new(
                DELETE_TASK,
                "Deletes tasks with the given ids. Use when the user wants to remove tasks from the list.",
            )
            .with_parameter(task_ids_parameter("List of task ids to delete")),
            move |args: &ValidatedArguments| {
                let ids = args.require_i64_list("task_ids")?;
                match book.delete(&ids)? {
                    0 => Ok("Nie znaleziono zadań o podanych ID.".to_string()),
                    n => Ok(format!("Pomyślnie usunięto {} zadań.", n)),
                }
            },
        );

        vec![add, list, complete, delete]
    }
}

#[async_trait]
impl ToolProvider for TaskProvider {
    fn id(&self) -> &str {
        "tasks"
    }

    fn display_name(&self) -> &str {
        "Task Manager"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn discover_tools(&self) -> Result<Vec<ToolSpec>, ProviderError> {
        Ok(self.tools())
    }
}
