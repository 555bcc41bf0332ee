//! Command dispatch and task creation
//!
//! [`Console`] ties the three ports together: the task service ([`TaskApi`]),
//! the output surface (through a [`ResultStore`]) and the creation form
//! ([`TaskForm`]).

use crate::client::{NewTask, TaskApi};
use crate::command::Command;
use crate::error::{Result, ShellError};
use crate::render::{RenderTarget, Rendering, ResultStore, Ticket};
use std::sync::Mutex;

pub const MSG_TASK_ID_REQUIRED: &str = "Task ID is required";
pub const MSG_TASK_NAME_REQUIRED: &str = "Task name is required";

/// The task creation fields (`forkFields`)
pub trait TaskForm {
    fn set_visible(&self, visible: bool);
    fn is_visible(&self) -> bool;
    fn name(&self) -> String;
    fn description(&self) -> String;
    fn clear(&self);
}

impl<T: TaskForm + ?Sized> TaskForm for &T {
    fn set_visible(&self, visible: bool) {
        (**self).set_visible(visible)
    }
    fn is_visible(&self) -> bool {
        (**self).is_visible()
    }
    fn name(&self) -> String {
        (**self).name()
    }
    fn description(&self) -> String {
        (**self).description()
    }
    fn clear(&self) {
        (**self).clear()
    }
}

#[derive(Debug, Default)]
struct FormState {
    visible: bool,
    name: String,
    description: String,
}

/// In-memory form; the terminal shell fills it from prompts
#[derive(Debug, Default)]
pub struct StagedForm {
    state: Mutex<FormState>,
}

impl StagedForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self, name: impl Into<String>, description: impl Into<String>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.name = name.into();
        state.description = description.into();
    }
}

impl TaskForm for StagedForm {
    fn set_visible(&self, visible: bool) {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).visible
    }

    fn name(&self) -> String {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .name
            .clone()
    }

    fn description(&self) -> String {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .description
            .clone()
    }

    fn clear(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.name.clear();
        state.description.clear();
    }
}

pub struct Console<A, R, F> {
    api: A,
    store: ResultStore<R>,
    form: F,
}

impl<A, R, F> Console<A, R, F>
where
    A: TaskApi,
    R: RenderTarget,
    F: TaskForm,
{
    pub fn new(api: A, target: R, form: F) -> Self {
        Self {
            api,
            store: ResultStore::new(target),
            form,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &ResultStore<R> {
        &self.store
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    /// Run one command line.
    ///
    /// Both slots show `Loading...` before anything else happens. `fork` only
    /// reveals the form and leaves the placeholder in place.
    pub async fn handle_command(&self, raw: &str) -> Ticket {
        let ticket = self.store.begin();
        let command = Command::parse(raw);
        tracing::debug!(ticket = ticket.number(), verb = command.verb(), "Dispatching command");

        let outcome = match command {
            Command::Fork => {
                self.form.set_visible(true);
                return ticket;
            },
            Command::List { id: None } => self
                .api
                .list_tasks()
                .await
                .and_then(Rendering::task_list),
            Command::List { id: Some(id) } => {
                self.api.get_task(&id).await.map(Rendering::task_detail)
            },
            Command::Delete { id: None } => {
                Err(ShellError::Validation(MSG_TASK_ID_REQUIRED.to_string()))
            },
            Command::Delete { id: Some(id) } => self.api.delete_task(&id).await.map(|()| {
                tracing::info!(task_id = %id, "Task deleted");
                Rendering::deleted()
            }),
            Command::Unknown { .. } => Ok(Rendering::unknown_command()),
        };

        self.store.publish(ticket, render_outcome(outcome));
        ticket
    }

    /// Submit the creation form.
    ///
    /// On success the form is hidden and both fields are cleared; on failure
    /// the form is left as it was.
    pub async fn create_task(&self) -> Ticket {
        let ticket = self.store.ticket();
        let name = self.form.name();

        if name.is_empty() {
            self.store
                .publish(ticket, Rendering::error(MSG_TASK_NAME_REQUIRED));
            return ticket;
        }

        let task = NewTask {
            name,
            description: self.form.description(),
        };

        match self.submit(&task).await {
            Ok(rendering) => {
                self.store.publish(ticket, rendering);
                self.form.set_visible(false);
                self.form.clear();
            },
            Err(e) => {
                self.store.publish(ticket, render_outcome(Err(e)));
            },
        }
        ticket
    }

    async fn submit(&self, task: &NewTask) -> Result<Rendering> {
        let created = self.api.create_task(task).await?;
        tracing::info!(name = %task.name, "Task created");
        Ok(Rendering::task_created(created))
    }
}

fn render_outcome(outcome: Result<Rendering>) -> Rendering {
    match outcome {
        Ok(rendering) => rendering,
        Err(e) => {
            if !e.is_validation() {
                tracing::warn!(error = %e, code = e.to_error_code(), "Interaction failed");
            }
            Rendering::error(e.to_string())
        },
    }
}
