//! Resource pages: form state plus create/fetch/update/delete against one
//! REST collection.
//!
//! A page owns the record being edited, the "fetch by id" field and a
//! [`Status`] that is reset to `Loading` at the start of every operation and
//! set to exactly one of `Failed` or `Succeeded` when it ends.
//!
//! Operations take `&self` and never hold the state lock across a request,
//! so a page can be shared and operations may overlap. Each operation kind
//! carries a generation number; a response whose generation is no longer the
//! latest for its kind is dropped instead of overwriting newer state.

use parking_lot::Mutex;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::client::ServiceClient;
use crate::config::Service;
use crate::error::{Error, Result};
use crate::session::SessionProvider;
use crate::types::Credential;

/// Outcome flags of the last operation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Failed(String),
    Succeeded(String),
}

impl Status {
    pub fn is_loading(&self) -> bool {
        matches!(self, Status::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Status::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Status::Succeeded(m) => Some(m),
            _ => None,
        }
    }
}

/// A record type managed through a REST collection
pub trait Resource:
    Serialize + DeserializeOwned + Default + Clone + PartialEq + Send + Sync + 'static
{
    /// Lower-case singular noun ("store")
    const SINGULAR: &'static str;
    /// Capitalized singular noun ("Store")
    const TITLE: &'static str;
    /// Collection path ("/api/stores")
    const COLLECTION: &'static str;
    /// Field carrying the generated id in a create response
    const CREATED_ID_FIELD: &'static str;
    const SERVICE: Service;

    fn id(&self) -> Option<&str>;

    /// Required-field check run before create
    fn validate(&self) -> std::result::Result<(), String>;

    fn create_body(&self) -> serde_json::Value;

    fn update_body(&self) -> serde_json::Value;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Fetch,
    Update,
    Delete,
}

impl OperationKind {
    fn index(self) -> usize {
        self as usize
    }
}

/// Identifies one started operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub kind: OperationKind,
    pub generation: u64,
}

/// Latest generation per operation kind
#[derive(Debug, Default, Clone)]
pub struct Generations([u64; 4]);

impl Generations {
    pub fn start(&mut self, kind: OperationKind) -> Ticket {
        let slot = &mut self.0[kind.index()];
        *slot += 1;
        Ticket {
            kind,
            generation: *slot,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.0[ticket.kind.index()] == ticket.generation
    }
}

#[derive(Debug)]
struct PageState<R> {
    form: R,
    fetch_id: String,
    status: Status,
    generations: Generations,
}

/// Create/fetch/update/delete page for one resource type
pub struct ResourcePage<R: Resource> {
    client: ServiceClient,
    session: SessionProvider,
    state: Arc<Mutex<PageState<R>>>,
}

impl<R: Resource> Clone for ResourcePage<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            session: self.session.clone(),
            state: self.state.clone(),
        }
    }
}

impl<R: Resource> ResourcePage<R> {
    pub fn new(client: ServiceClient, session: SessionProvider) -> Self {
        Self {
            client,
            session,
            state: Arc::new(Mutex::new(PageState {
                form: R::default(),
                fetch_id: String::new(),
                status: Status::Idle,
                generations: Generations::default(),
            })),
        }
    }

    pub fn form(&self) -> R {
        self.state.lock().form.clone()
    }

    pub fn fetch_id(&self) -> String {
        self.state.lock().fetch_id.clone()
    }

    pub fn status(&self) -> Status {
        self.state.lock().status.clone()
    }

    /// Edit the form in place
    pub fn edit<F: FnOnce(&mut R)>(&self, f: F) {
        f(&mut self.state.lock().form);
    }

    pub fn set_fetch_id(&self, id: impl Into<String>) {
        self.state.lock().fetch_id = id.into();
    }

    /// POST the form. Requires a credential; resets the form on success.
    pub async fn create(&self) -> Status {
        let credential = match self.session.snapshot().require_credential() {
            Ok(c) => c.clone(),
            Err(e) => return self.fail_now(OperationKind::Create, e),
        };
        let form = self.form();
        if let Err(msg) = form.validate() {
            return self.fail_now(OperationKind::Create, Error::Validation(msg));
        }

        let ticket = self.begin(OperationKind::Create);
        let result: Result<serde_json::Value> = self
            .client
            .send_json(Method::POST, R::COLLECTION, &form.create_body(), Some(&credential))
            .await;

        self.finish(ticket, move |state| match result {
            Ok(body) => {
                let id = created_id(&body, R::CREATED_ID_FIELD);
                state.status = Status::Succeeded(format!(
                    "{} created successfully! ID: {}",
                    R::TITLE,
                    id
                ));
                state.form = R::default();
            }
            Err(e) => state.status = Status::Failed(e.to_string()),
        })
    }

    /// GET `<collection>/<fetch_id>` into the form. No credential needed.
    pub async fn fetch(&self) -> Status {
        let id = self.fetch_id();
        if id.trim().is_empty() {
            return self.fail_now(
                OperationKind::Fetch,
                Error::Validation(format!("Enter a {} ID.", R::SINGULAR)),
            );
        }

        let ticket = self.begin(OperationKind::Fetch);
        let path = format!("{}/{}", R::COLLECTION, id.trim());
        let result: Result<R> = self.client.get_json(&path, &[], None).await;

        self.finish(ticket, move |state| match result {
            Ok(record) => {
                state.form = record;
                state.status = Status::Succeeded(format!("{} found.", R::TITLE));
            }
            Err(e) => {
                state.form = R::default();
                state.status = Status::Failed(e.to_string());
            }
        })
    }

    /// PUT the loaded record
    pub async fn update(&self) -> Status {
        let (credential, form, id) = match self.loaded_with_credential() {
            Ok(v) => v,
            Err(e) => return self.fail_now(OperationKind::Update, e),
        };

        let ticket = self.begin(OperationKind::Update);
        let path = format!("{}/{}", R::COLLECTION, id);
        let result: Result<serde_json::Value> = self
            .client
            .send_json(Method::PUT, &path, &form.update_body(), Some(&credential))
            .await;

        self.finish(ticket, move |state| match result {
            Ok(_) => {
                state.status = Status::Succeeded(format!("{} updated successfully.", R::TITLE));
            }
            Err(e) => state.status = Status::Failed(e.to_string()),
        })
    }

    /// DELETE the loaded record; resets the form and the fetch id on success
    pub async fn delete(&self) -> Status {
        let (credential, _form, id) = match self.loaded_with_credential() {
            Ok(v) => v,
            Err(e) => return self.fail_now(OperationKind::Delete, e),
        };

        let ticket = self.begin(OperationKind::Delete);
        let path = format!("{}/{}", R::COLLECTION, id);
        let result = self.client.delete(&path, Some(&credential)).await;

        self.finish(ticket, move |state| match result {
            Ok(()) => {
                state.status = Status::Succeeded(format!("{} deleted successfully.", R::TITLE));
                state.form = R::default();
                state.fetch_id.clear();
            }
            Err(e) => state.status = Status::Failed(e.to_string()),
        })
    }

    fn loaded_with_credential(&self) -> Result<(Credential, R, String)> {
        let snapshot = self.session.snapshot();
        let form = self.form();
        let id = form.id().filter(|id| !id.is_empty()).map(str::to_string);
        match (snapshot.credential(), id) {
            (Some(c), Some(id)) => Ok((c.clone(), form, id)),
            _ => Err(Error::Validation(format!(
                "Login and loaded {} required.",
                R::SINGULAR
            ))),
        }
    }

    /// Fail an operation before any request is sent. Still counts as the
    /// latest of its kind, so an older in-flight response is dropped.
    fn fail_now(&self, kind: OperationKind, error: Error) -> Status {
        let status = Status::Failed(error.to_string());
        let mut state = self.state.lock();
        state.generations.start(kind);
        state.status = status.clone();
        status
    }

    fn begin(&self, kind: OperationKind) -> Ticket {
        let mut state = self.state.lock();
        state.status = Status::Loading;
        state.generations.start(kind)
    }

    fn finish<F>(&self, ticket: Ticket, apply: F) -> Status
    where
        F: FnOnce(&mut PageState<R>),
    {
        let mut state = self.state.lock();
        if !state.generations.is_current(ticket) {
            debug!(
                resource = R::SINGULAR,
                kind = ?ticket.kind,
                generation = ticket.generation,
                "Discarding stale response"
            );
            return state.status.clone();
        }
        apply(&mut *state);
        state.status.clone()
    }
}

/// Generated id from a create response, as text
fn created_id(body: &serde_json::Value, field: &str) -> String {
    match body.get(field) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}
