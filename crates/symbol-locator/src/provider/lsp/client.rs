use std::{
    path::Path,
    process::Stdio,
    sync::{
        Arc,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use lsp_types::{
    DocumentSymbolResponse, Hover, HoverContents, MarkedString, Position, Url, WorkspaceEdit,
    notification::{Cancel, DidChangeTextDocument, DidOpenTextDocument, Exit, Initialized, Notification as _},
    request::{DocumentSymbolRequest, HoverRequest, Initialize, Rename, Request as _, Shutdown},
};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader},
    process::{Child, Command},
    sync::{Mutex, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use super::transport::{read_message, write_message};
use crate::{
    config::ProviderSettings,
    provider::{DeclarationProvider, HoverProvider, ProviderError, RenameProvider},
};

const CONFIGURATION_REQUEST: &str = "workspace/configuration";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

type Writer = Box<dyn AsyncWrite + Send + Unpin>;
type Outcome = Result<Value, RpcFailure>;

#[derive(Debug)]
struct RpcFailure {
    code: i64,
    message: String,
}

/// State shared between request callers and the background reader.
struct Shared {
    writer: Mutex<Writer>,
    pending: DashMap<i64, oneshot::Sender<Outcome>>,
    next_id: AtomicI64,
}

impl Shared {
    async fn send(
        &self,
        message: &Value,
    ) -> Result<(), ProviderError> {
        let mut writer = self.writer.lock().await;
        write_message(&mut *writer, message).await.map_err(|error| ProviderError::Unavailable(error.to_string()))
    }

    /// Route one incoming message. Never waits on the writer, so the reader
    /// keeps draining the server's output while a caller is mid-write.
    fn dispatch(
        self: &Arc<Self>,
        message: Value,
    ) {
        let id = message.get("id").cloned();
        let method = message.get("method").and_then(Value::as_str);

        match (id, method) {
            (Some(id), Some(method)) => {
                // Server-to-client request. We advertise no client features, so
                // answering with empty results keeps the server moving.
                let result = if method == CONFIGURATION_REQUEST {
                    let items = message.pointer("/params/items").and_then(Value::as_array).map_or(0, Vec::len);
                    Value::Array(vec![Value::Null; items])
                } else {
                    Value::Null
                };
                debug!("[lsp] answering server request {method}");
                let reply = json!({"jsonrpc": "2.0", "id": id, "result": result});
                let shared = Arc::clone(self);
                let method = method.to_string();
                tokio::spawn(async move {
                    if let Err(error) = shared.send(&reply).await {
                        warn!("[lsp] failed to answer {method}: {error}");
                    }
                });
            },
            (None, Some(method)) => {
                if let Some(text) = message.pointer("/params/message").and_then(Value::as_str) {
                    debug!("[lsp] {method}: {text}");
                } else {
                    debug!("[lsp] notification {method}");
                }
            },
            (Some(id), None) => {
                let Some(id) = id.as_i64() else {
                    debug!("[lsp] ignoring response with non-numeric id {id}");
                    return;
                };
                let Some((_, sender)) = self.pending.remove(&id) else {
                    debug!("[lsp] ignoring response to unknown or abandoned request {id}");
                    return;
                };
                let outcome = match message.get("error") {
                    Some(error) => Err(RpcFailure {
                        code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                        message: error.get("message").and_then(Value::as_str).unwrap_or_default().to_string(),
                    }),
                    None => Ok(message.get("result").cloned().unwrap_or(Value::Null)),
                };
                let _ = sender.send(outcome);
            },
            (None, None) => debug!("[lsp] ignoring message without id or method"),
        }
    }
}

async fn read_loop<R>(
    reader: R,
    shared: Arc<Shared>,
) where
    R: AsyncRead + Send + Unpin,
{
    let mut reader = BufReader::new(reader);
    loop {
        match read_message(&mut reader).await {
            Ok(Some(message)) => shared.dispatch(message),
            Ok(None) => {
                debug!("[lsp] server closed its output");
                break;
            },
            Err(error) => {
                warn!("[lsp] transport error, dropping connection: {error}");
                break;
            },
        }
    }
    // Dropping the senders wakes every waiter with a closed-channel error.
    shared.pending.clear();
}

/// Declaration, hover and rename provider backed by an external language server.
///
/// Every query re-reads the document from disk and pushes it to the server
/// (`didOpen` the first time, full-text `didChange` afterwards), so answers
/// reflect the file as it is now. Request timeouts are enforced here.
pub struct LanguageServerClient {
    shared: Arc<Shared>,
    /// Last version sent per document; 0 until `didOpen` went through.
    documents: DashMap<Url, Arc<Mutex<i32>>>,
    language_id: Option<String>,
    request_timeout: Duration,
    child: Mutex<Option<Child>>,
    reader_task: JoinHandle<()>,
}

impl LanguageServerClient {
    /// Launch the configured server and run the `initialize` handshake.
    pub async fn spawn(
        settings: &ProviderSettings,
        root: &Path,
    ) -> Result<Self, ProviderError> {
        if !settings.is_configured() {
            return Err(ProviderError::Unavailable("no language server command configured".to_string()));
        }
        let command = settings.command.as_str();

        let mut child = Command::new(command)
            .args(&settings.args)
            .current_dir(root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|error| match error.kind() {
                std::io::ErrorKind::NotFound => ProviderError::Unavailable(format!("{command} is not available")),
                _ => ProviderError::Unavailable(format!("failed to launch {command}: {error}")),
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProviderError::Unavailable(format!("{command} did not expose stdin")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProviderError::Unavailable(format!("{command} did not expose stdout")))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("[lsp:stderr] {line}");
                }
            });
        }

        info!("Started language server {command} {}", settings.args.join(" "));
        let client = Self::connect(stdout, stdin, settings, root).await?;
        *client.child.lock().await = Some(child);
        Ok(client)
    }

    /// Run the handshake over an already-established byte stream.
    pub async fn connect<R, W>(
        reader: R,
        writer: W,
        settings: &ProviderSettings,
        root: &Path,
    ) -> Result<Self, ProviderError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let shared = Arc::new(Shared {
            writer: Mutex::new(Box::new(writer)),
            pending: DashMap::new(),
            next_id: AtomicI64::new(1),
        });
        let reader_task = tokio::spawn(read_loop(reader, shared.clone()));

        let client = Self {
            shared,
            documents: DashMap::new(),
            language_id: settings.language_id.clone(),
            request_timeout: Duration::from_millis(settings.request_timeout_ms),
            child: Mutex::new(None),
            reader_task,
        };
        client.initialize(root, settings.initialization_options.clone()).await?;
        Ok(client)
    }

    /// Politely stop the server: `shutdown`, then `exit`.
    pub async fn shutdown(&self) -> Result<(), ProviderError> {
        self.request(Shutdown::METHOD, Value::Null).await?;
        self.notify(Exit::METHOD, Value::Null).await?;

        if let Some(mut child) = self.child.lock().await.take()
            && tokio::time::timeout(SHUTDOWN_GRACE, child.wait()).await.is_err()
        {
            warn!("[lsp] server did not exit within {} ms, killing it", SHUTDOWN_GRACE.as_millis());
            let _ = child.kill().await;
        }
        Ok(())
    }

    async fn initialize(
        &self,
        root: &Path,
        initialization_options: Option<Value>,
    ) -> Result<(), ProviderError> {
        let root_uri = Url::from_file_path(root).ok();
        let workspace_folders = root_uri.as_ref().map(|uri| json!([{"uri": uri, "name": "root"}]));
        let params = json!({
            "processId": std::process::id(),
            "rootUri": root_uri,
            "workspaceFolders": workspace_folders,
            "initializationOptions": initialization_options,
            "capabilities": {
                "textDocument": {
                    "documentSymbol": {"hierarchicalDocumentSymbolSupport": true},
                    "hover": {"contentFormat": ["markdown", "plaintext"]},
                    "rename": {"prepareSupport": false}
                },
                "workspace": {"workspaceFolders": true, "configuration": true}
            }
        });

        let result = self.request(Initialize::METHOD, params).await?;
        let server_name = result.pointer("/serverInfo/name").and_then(Value::as_str).unwrap_or("language server");
        info!("Initialized {server_name}");
        self.notify(Initialized::METHOD, json!({})).await
    }

    async fn request(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Value, ProviderError> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        self.shared.pending.insert(id, sender);

        let mut message = json!({"jsonrpc": "2.0", "id": id, "method": method});
        if !params.is_null() {
            message["params"] = params;
        }
        if let Err(error) = self.shared.send(&message).await {
            self.shared.pending.remove(&id);
            return Err(error);
        }

        match tokio::time::timeout(self.request_timeout, receiver).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(failure))) => Err(ProviderError::Rejected {
                method: method.to_string(),
                code: failure.code,
                message: failure.message,
            }),
            Ok(Err(_closed)) => {
                Err(ProviderError::Unavailable(format!("language server went away before answering {method}")))
            },
            Err(_elapsed) => {
                self.shared.pending.remove(&id);
                if let Err(error) = self.notify(Cancel::METHOD, json!({"id": id})).await {
                    debug!("[lsp] could not cancel {method} ({id}): {error}");
                }
                Err(ProviderError::Timeout {
                    method: method.to_string(),
                    after_ms: self.request_timeout.as_millis() as u64,
                })
            },
        }
    }

    async fn notify(
        &self,
        method: &str,
        params: Value,
    ) -> Result<(), ProviderError> {
        let mut message = json!({"jsonrpc": "2.0", "method": method});
        if !params.is_null() {
            message["params"] = params;
        }
        self.shared.send(&message).await
    }

    async fn request_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, ProviderError> {
        let value = self.request(method, params).await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value).map(Some).map_err(|error| ProviderError::InvalidResponse {
            method: method.to_string(),
            reason: error.to_string(),
        })
    }

    /// Push the current on-disk content of `uri` to the server. With `refresh`
    /// unset, an already open document is left alone.
    ///
    /// The per-document lock is held from the version bump until the
    /// notification is written, so versions reach the server in order.
    async fn sync_document(
        &self,
        uri: &Url,
        refresh: bool,
    ) -> Result<(), ProviderError> {
        let path = uri.to_file_path().map_err(|()| ProviderError::Document {
            uri: uri.to_string(),
            reason: "not a file URI".to_string(),
        })?;
        let document = Arc::clone(&self.documents.entry(uri.clone()).or_default());
        let mut version = document.lock().await;
        if !refresh && *version > 0 {
            return Ok(());
        }

        let text = tokio::fs::read_to_string(&path).await.map_err(|error| ProviderError::Document {
            uri: uri.to_string(),
            reason: error.to_string(),
        })?;
        *version += 1;

        let sent = if *version == 1 {
            let language_id = self.language_id.clone().unwrap_or_else(|| language_id_for(&path).to_string());
            self.notify(
                DidOpenTextDocument::METHOD,
                json!({
                    "textDocument": {"uri": uri, "languageId": language_id, "version": *version, "text": text}
                }),
            )
            .await
        } else {
            self.notify(
                DidChangeTextDocument::METHOD,
                json!({
                    "textDocument": {"uri": uri, "version": *version},
                    "contentChanges": [{"text": text}]
                }),
            )
            .await
        };

        if sent.is_err() {
            *version = 0;
        }
        sent
    }
}

impl Drop for LanguageServerClient {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

impl DeclarationProvider for LanguageServerClient {
    async fn document_symbols(
        &self,
        uri: &Url,
    ) -> Result<DocumentSymbolResponse, ProviderError> {
        self.sync_document(uri, true).await?;
        let params = json!({"textDocument": {"uri": uri}});
        let response = self.request_typed::<DocumentSymbolResponse>(DocumentSymbolRequest::METHOD, params).await?;
        Ok(response.unwrap_or_else(|| DocumentSymbolResponse::Nested(Vec::new())))
    }
}

impl HoverProvider for LanguageServerClient {
    async fn hover(
        &self,
        uri: &Url,
        position: Position,
    ) -> Result<Option<String>, ProviderError> {
        self.sync_document(uri, false).await?;
        let hover = self
            .request_typed::<Hover>(
                HoverRequest::METHOD,
                json!({"textDocument": {"uri": uri}, "position": position}),
            )
            .await?;
        Ok(hover.map(|hover| hover_text(&hover.contents)).filter(|text| !text.trim().is_empty()))
    }
}

impl RenameProvider for LanguageServerClient {
    async fn rename(
        &self,
        uri: &Url,
        position: Position,
        new_name: &str,
    ) -> Result<Option<WorkspaceEdit>, ProviderError> {
        self.sync_document(uri, true).await?;
        self.request_typed::<WorkspaceEdit>(
            Rename::METHOD,
            json!({"textDocument": {"uri": uri}, "position": position, "newName": new_name}),
        )
        .await
    }
}

fn marked_string_text(marked: &MarkedString) -> String {
    match marked {
        MarkedString::String(s) => s.clone(),
        MarkedString::LanguageString(s) => s.value.clone(),
    }
}

fn hover_text(contents: &HoverContents) -> String {
    match contents {
        HoverContents::Markup(markup) => markup.value.clone(),
        HoverContents::Scalar(s) => marked_string_text(s),
        HoverContents::Array(items) => items.iter().map(marked_string_text).collect::<Vec<_>>().join("\n"),
    }
}

/// Language id for `didOpen`, from the file extension.
fn language_id_for(path: &Path) -> &'static str {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default().to_ascii_lowercase();
    match extension.as_str() {
        "rs" => "rust",
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "typescriptreact",
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "javascriptreact",
        "py" | "pyi" => "python",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "metal" => "metal",
        _ => "plaintext",
    }
}

#[cfg(test)]
#[path = "../../../tests/src/provider/client_tests.rs"]
mod tests;
