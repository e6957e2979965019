use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::collection::{Collection, Confirmation, Notice, Outcome};
use crate::error::StoreError;
use crate::model::{Record, Todo, TodoDraft, TodoStatus};
use crate::repo::{Repository, changes};
use crate::session::Session;
use crate::store::{Query, TableStore};

pub struct TodosView {
    todos: Repository<Todo>,
}

impl TodosView {
    pub fn new(store: Arc<dyn TableStore>, session: Session) -> Self {
        Self {
            todos: Repository::new(store, session),
        }
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Collection<Todo>, StoreError> {
        let todos = self.todos.list(Query::new().desc("created_at")).await?;
        Ok(Collection::new(todos))
    }

    pub async fn create(&self, todos: &mut Collection<Todo>, draft: TodoDraft) -> Outcome<Todo> {
        todos.create(&self.todos, draft, "Todo added!").await
    }

    pub async fn update(
        &self,
        todos: &mut Collection<Todo>,
        id: Uuid,
        draft: TodoDraft,
    ) -> Outcome<Todo> {
        todos.edit(&self.todos, id, draft, "Todo updated!").await
    }

    /// Flip whether the todo is on the dashboard focus list.
    pub async fn toggle_focus(&self, todos: &mut Collection<Todo>, id: Uuid) -> Outcome<Todo> {
        let Some(active) = todos.get(id).map(|t| t.is_active) else {
            return Outcome::rejected(Notice::failed("update", Todo::NOUN));
        };
        let success = if active {
            "Removed from focus."
        } else {
            "Added to focus!"
        };
        todos
            .patch(&self.todos, id, changes([("is_active", !active)]), "update", success)
            .await
    }

    /// Finishing a todo also drops it from focus.
    pub async fn mark_done(&self, todos: &mut Collection<Todo>, id: Uuid) -> Outcome<Todo> {
        let done = changes([
            ("status", Value::from(TodoStatus::Done.as_str())),
            ("is_active", Value::Bool(false)),
        ]);
        todos
            .patch(&self.todos, id, done, "update", "Todo completed!")
            .await
    }

    pub async fn reopen(&self, todos: &mut Collection<Todo>, id: Uuid) -> Outcome<Todo> {
        let open = changes([
            ("status", Value::from(TodoStatus::Todo.as_str())),
            ("is_active", Value::Bool(false)),
        ]);
        todos
            .patch(&self.todos, id, open, "update", "Todo reopened!")
            .await
    }

    pub async fn delete(
        &self,
        todos: &mut Collection<Todo>,
        id: Uuid,
        confirmation: Confirmation,
    ) -> Outcome<Todo> {
        todos
            .delete(&self.todos, id, confirmation, "Todo deleted!")
            .await
    }
}
