//! Async table and view handles.
//!
//! Every `Table` is served by one tokio task that exclusively owns its
//! [`TableEngine`]. Handles send commands over an unbounded channel and await
//! the reply on a oneshot channel, so commands against one table run strictly
//! in the order they were issued and never observe a half-applied batch.
//!
//! Deleting a table or view only flips a flag. Commands still queued for a
//! deleted target are answered with a `Disposed` error without touching the
//! engine.

use crate::config::TableOptions;
use crate::convert;
use crate::engine::{view_disposed, TableEngine, UpdateSummary};
use log::{debug, trace, warn};
use pivotal_computed::{ComputedColumnDef, ComputedColumnInfo};
use pivotal_core::schema::TableSchema;
use pivotal_core::{DataType, Error, Payload, Result};
use pivotal_reactive::{
    Record, SerializeOptions, SubscriptionId, UpdateCallback, ViewConfig, ViewId, ViewUpdate,
};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

type Reply<T> = oneshot::Sender<Result<T>>;

enum Command {
    Update {
        payloads: Vec<Payload>,
        reply: Reply<UpdateSummary>,
    },
    AddComputed {
        defs: Vec<ComputedColumnDef>,
        reply: Reply<()>,
    },
    ComputedSchema {
        reply: Reply<BTreeMap<String, ComputedColumnInfo>>,
    },
    Size {
        reply: Reply<usize>,
    },
    Schema {
        reply: Reply<Vec<(String, DataType)>>,
    },
    CreateView {
        config: ViewConfig,
        reply: Reply<ViewId>,
    },
    ViewCount {
        reply: Reply<usize>,
    },
    View {
        target: ViewTarget,
        request: ViewRequest,
    },
    DeleteView {
        id: ViewId,
    },
    Dispose,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Update { .. } => "update",
            Command::AddComputed { .. } => "add_computed",
            Command::ComputedSchema { .. } => "computed_schema",
            Command::Size { .. } => "size",
            Command::Schema { .. } => "schema",
            Command::CreateView { .. } => "view",
            Command::ViewCount { .. } => "view_count",
            Command::View { request, .. } => request.name(),
            Command::DeleteView { .. } => "delete_view",
            Command::Dispose => "dispose",
        }
    }

    fn reject(self, err: Error) {
        match self {
            Command::Update { reply, .. } => respond(reply, Err(err)),
            Command::AddComputed { reply, .. } => respond(reply, Err(err)),
            Command::ComputedSchema { reply } => respond(reply, Err(err)),
            Command::Size { reply } => respond(reply, Err(err)),
            Command::Schema { reply } => respond(reply, Err(err)),
            Command::CreateView { reply, .. } => respond(reply, Err(err)),
            Command::ViewCount { reply } => respond(reply, Err(err)),
            Command::View { request, .. } => request.reject(err),
            Command::DeleteView { .. } | Command::Dispose => {}
        }
    }
}

struct ViewTarget {
    id: ViewId,
    disposed: Arc<AtomicBool>,
}

enum ViewRequest {
    ToRecords {
        options: SerializeOptions,
        reply: Reply<Vec<Record>>,
    },
    ToJson {
        options: SerializeOptions,
        reply: Reply<serde_json::Value>,
    },
    NumRows {
        reply: Reply<usize>,
    },
    Schema {
        reply: Reply<Vec<(String, DataType)>>,
    },
    OnUpdate {
        callback: UpdateCallback,
        reply: Reply<SubscriptionId>,
    },
}

impl ViewRequest {
    fn name(&self) -> &'static str {
        match self {
            ViewRequest::ToRecords { .. } => "to_records",
            ViewRequest::ToJson { .. } => "to_json",
            ViewRequest::NumRows { .. } => "num_rows",
            ViewRequest::Schema { .. } => "view_schema",
            ViewRequest::OnUpdate { .. } => "on_update",
        }
    }

    fn reject(self, err: Error) {
        match self {
            ViewRequest::ToRecords { reply, .. } => respond(reply, Err(err)),
            ViewRequest::ToJson { reply, .. } => respond(reply, Err(err)),
            ViewRequest::NumRows { reply } => respond(reply, Err(err)),
            ViewRequest::Schema { reply } => respond(reply, Err(err)),
            ViewRequest::OnUpdate { reply, .. } => respond(reply, Err(err)),
        }
    }
}

/// The task owning one table engine.
struct Worker {
    engine: TableEngine,
    commands: mpsc::UnboundedReceiver<Command>,
    disposed: Arc<AtomicBool>,
}

impl Worker {
    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            if self.disposed.load(Ordering::Acquire) {
                if !matches!(command, Command::Dispose | Command::DeleteView { .. }) {
                    warn!(
                        "table {} deleted, discarding {}",
                        self.engine.name(),
                        command.name()
                    );
                }
                command.reject(table_disposed(self.engine.name()));
                self.commands.close();
                continue;
            }
            trace!("table {}: {}", self.engine.name(), command.name());
            self.execute(command);
        }
        debug!("worker for table {} stopped", self.engine.name());
    }

    fn execute(&mut self, command: Command) {
        let engine = &mut self.engine;
        match command {
            Command::Update { payloads, reply } => respond(reply, engine.update(&payloads)),
            Command::AddComputed { defs, reply } => respond(reply, engine.add_computed(defs)),
            Command::ComputedSchema { reply } => respond(reply, Ok(engine.computed_schema())),
            Command::Size { reply } => respond(reply, Ok(engine.size())),
            Command::Schema { reply } => respond(reply, Ok(engine.schema())),
            Command::CreateView { config, reply } => {
                if let Err(Ok(id)) = reply.send(engine.create_view(config)) {
                    debug!("view {} was never received, deleting it", id);
                    engine.delete_view(id);
                }
            }
            Command::ViewCount { reply } => respond(reply, Ok(engine.view_count())),
            Command::View { target, request } => {
                if target.disposed.load(Ordering::Acquire) {
                    warn!("view {} deleted, discarding {}", target.id, request.name());
                    request.reject(view_disposed(target.id));
                    return;
                }
                execute_view(engine, target.id, request);
            }
            Command::DeleteView { id } => {
                engine.delete_view(id);
            }
            Command::Dispose => {}
        }
    }
}

fn execute_view(engine: &mut TableEngine, id: ViewId, request: ViewRequest) {
    match request {
        ViewRequest::ToRecords { options, reply } => respond(reply, engine.to_records(id, &options)),
        ViewRequest::ToJson { options, reply } => respond(reply, engine.to_json(id, &options)),
        ViewRequest::NumRows { reply } => respond(reply, engine.num_rows(id)),
        ViewRequest::Schema { reply } => respond(reply, engine.view_schema(id)),
        ViewRequest::OnUpdate { callback, reply } => respond(reply, engine.on_update(id, callback)),
    }
}

fn respond<T>(reply: Reply<T>, result: Result<T>) {
    // The caller may have stopped waiting.
    let _ = reply.send(result);
}

fn table_disposed(name: &str) -> Error {
    Error::disposed(format!("Table {}", name))
}

/// Sending half shared by a table and its views.
#[derive(Clone)]
struct Client {
    table: Arc<str>,
    sender: mpsc::UnboundedSender<Command>,
    disposed: Arc<AtomicBool>,
}

impl Client {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Queues a command now; the returned future resolves with its reply.
    fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> impl Future<Output = Result<T>> {
        let table = Arc::clone(&self.table);
        let queued = if self.is_disposed() {
            Err(table_disposed(&table))
        } else {
            let (reply, response) = oneshot::channel();
            self.sender
                .send(make(reply))
                .map(|_| response)
                .map_err(|_| table_disposed(&table))
        };
        async move { queued?.await.map_err(|_| table_disposed(&table))? }
    }
}

/// Handle to a table served by its own worker task.
///
/// Every method queues its command immediately, so calls made one after
/// another apply in that order even if their futures are awaited later.
/// Clones share the same table. The worker stops once the table is deleted
/// or every handle, view handles included, is dropped.
#[derive(Clone)]
pub struct Table {
    client: Client,
}

impl Table {
    /// Creates an empty table. Must be called within a tokio runtime.
    pub fn new(schema: TableSchema) -> Self {
        Self::from_engine(TableEngine::new(schema))
    }

    /// Moves an existing engine onto a worker task.
    pub fn from_engine(engine: TableEngine) -> Self {
        let (sender, commands) = mpsc::unbounded_channel();
        let disposed = Arc::new(AtomicBool::new(false));
        let table: Arc<str> = Arc::from(engine.name());
        debug!("spawning worker for table {}", table);
        tokio::spawn(
            Worker {
                engine,
                commands,
                disposed: Arc::clone(&disposed),
            }
            .run(),
        );
        Self {
            client: Client {
                table,
                sender,
                disposed,
            },
        }
    }

    /// Creates an empty table from an explicit `{"column": "type"}` schema.
    pub fn from_schema(name: &str, schema: &serde_json::Value, options: &TableOptions) -> Result<Self> {
        Ok(Self::new(convert::json_to_schema(name, schema, options)?))
    }

    /// Creates a table whose schema is inferred from `data`, then loads it.
    pub async fn from_json(name: &str, data: &serde_json::Value, options: &TableOptions) -> Result<Self> {
        let mut rows = convert::json_to_payloads(data)?;
        let schema = convert::infer_schema(name, &rows, options)?;
        convert::stringify_mixed(&mut rows, &schema);
        let table = Self::new(schema);
        table.update(rows).await?;
        Ok(table)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.client.table
    }

    /// Applies one batch atomically.
    pub fn update(&self, payloads: Vec<Payload>) -> impl Future<Output = Result<UpdateSummary>> {
        self.client
            .request(|reply| Command::Update { payloads, reply })
    }

    /// Applies a row- or column-oriented JSON batch.
    pub fn update_json(&self, data: &serde_json::Value) -> impl Future<Output = Result<UpdateSummary>> {
        let queued = convert::json_to_payloads(data).map(|payloads| self.update(payloads));
        async move { queued?.await }
    }

    /// Registers computed columns. All or none are added.
    pub fn add_computed(&self, defs: Vec<ComputedColumnDef>) -> impl Future<Output = Result<()>> {
        self.client
            .request(|reply| Command::AddComputed { defs, reply })
    }

    pub fn computed_schema(
        &self,
    ) -> impl Future<Output = Result<BTreeMap<String, ComputedColumnInfo>>> {
        self.client
            .request(|reply| Command::ComputedSchema { reply })
    }

    /// Number of rows.
    pub fn size(&self) -> impl Future<Output = Result<usize>> {
        self.client.request(|reply| Command::Size { reply })
    }

    /// Column names and types, computed columns included.
    pub fn schema(&self) -> impl Future<Output = Result<Vec<(String, DataType)>>> {
        self.client.request(|reply| Command::Schema { reply })
    }

    /// Creates a view over the table.
    ///
    /// Dropping the returned future before it resolves deletes the view.
    pub fn view(&self, config: ViewConfig) -> impl Future<Output = Result<View>> {
        let client = &self.client;
        let pending = if client.is_disposed() {
            Err(table_disposed(&client.table))
        } else {
            let (reply, response) = oneshot::channel();
            client
                .sender
                .send(Command::CreateView { config, reply })
                .map(|_| PendingView {
                    client: client.clone(),
                    response,
                    settled: false,
                })
                .map_err(|_| table_disposed(&client.table))
        };
        async move { pending?.receive().await }
    }

    /// Number of live views.
    pub fn view_count(&self) -> impl Future<Output = Result<usize>> {
        self.client.request(|reply| Command::ViewCount { reply })
    }

    /// Deletes the table. Queued work is discarded; repeated calls are no-ops.
    pub fn delete(&self) {
        if !self.client.disposed.swap(true, Ordering::AcqRel) {
            debug!("deleting table {}", self.client.table);
            // The worker may already be gone.
            let _ = self.client.sender.send(Command::Dispose);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.client.is_disposed()
    }
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.client.table)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A queued `CreateView` whose id has not reached a `View` handle yet.
struct PendingView {
    client: Client,
    response: oneshot::Receiver<Result<ViewId>>,
    settled: bool,
}

impl PendingView {
    async fn receive(mut self) -> Result<View> {
        let received = (&mut self.response).await;
        self.settled = true;
        let id = received.map_err(|_| table_disposed(&self.client.table))??;
        Ok(View {
            id,
            client: self.client.clone(),
            disposed: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl Drop for PendingView {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // After close the worker either fails to reply and deletes the view
        // itself, or its reply is already here.
        self.response.close();
        if let Ok(Ok(id)) = self.response.try_recv() {
            let _ = self.client.sender.send(Command::DeleteView { id });
        }
    }
}

/// Handle to one view of a table. Dropping the handle deletes the view.
pub struct View {
    id: ViewId,
    client: Client,
    disposed: Arc<AtomicBool>,
}

impl View {
    #[inline]
    pub fn id(&self) -> ViewId {
        self.id
    }

    fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> ViewRequest,
    ) -> impl Future<Output = Result<T>> {
        let queued = if self.disposed.load(Ordering::Acquire) {
            Err(view_disposed(self.id))
        } else {
            let target = ViewTarget {
                id: self.id,
                disposed: Arc::clone(&self.disposed),
            };
            Ok(self.client.request(|reply| Command::View {
                target,
                request: make(reply),
            }))
        };
        async move { queued?.await }
    }

    /// Flattens the view into records.
    pub fn to_records(&self, options: SerializeOptions) -> impl Future<Output = Result<Vec<Record>>> {
        self.request(|reply| ViewRequest::ToRecords { options, reply })
    }

    /// Flattens the view into a JSON array of objects.
    pub fn to_json(&self, options: SerializeOptions) -> impl Future<Output = Result<serde_json::Value>> {
        self.request(|reply| ViewRequest::ToJson { options, reply })
    }

    pub fn num_rows(&self) -> impl Future<Output = Result<usize>> {
        self.request(|reply| ViewRequest::NumRows { reply })
    }

    /// Output column names and aggregate result types.
    pub fn schema(&self) -> impl Future<Output = Result<Vec<(String, DataType)>>> {
        self.request(|reply| ViewRequest::Schema { reply })
    }

    /// Registers a callback run on the table worker after every batch that
    /// refreshes this view.
    pub fn on_update<F>(&self, callback: F) -> impl Future<Output = Result<SubscriptionId>>
    where
        F: Fn(&ViewUpdate) + Send + 'static,
    {
        let callback: UpdateCallback = Box::new(callback);
        self.request(|reply| ViewRequest::OnUpdate { callback, reply })
    }

    /// Deletes the view. Repeated calls are no-ops.
    pub fn delete(&self) {
        if !self.disposed.swap(true, Ordering::AcqRel) {
            let _ = self.client.sender.send(Command::DeleteView { id: self.id });
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire) || self.client.is_disposed()
    }
}

impl Drop for View {
    fn drop(&mut self) {
        self.delete();
    }
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id)
            .field("table", &self.client.table)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
