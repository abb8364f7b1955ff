use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

use crate::assist::CompletionCandidate;

const INITIALIZE_TIMEOUT: Duration = Duration::from_secs(3);
pub(crate) const MAX_COMPLETION_ITEMS: usize = 40;

#[derive(Debug)]
pub(crate) enum LspInbound {
    Notification { method: String, params: Value },
    Response { id: i64, result: Value },
}

/// A language server child process spoken to over stdio JSON-RPC.
pub(crate) struct LspClient {
    child: Child,
    pub(crate) writer: Arc<Mutex<ChildStdin>>,
    pub(crate) rx: Receiver<LspInbound>,
    pub(crate) next_id: i64,
}

impl LspClient {
    /// Spawns `argv` and completes the initialize handshake.
    pub(crate) fn start(argv: &[String], root: &Path) -> io::Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::other("empty completion server command"))?;
        let mut child = Command::new(program)
            .args(args)
            .current_dir(root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("failed to open language server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("failed to open language server stdout"))?;

        let writer = Arc::new(Mutex::new(stdin));
        let (tx, rx) = mpsc::channel::<LspInbound>();
        thread::spawn(move || lsp_reader_loop(stdout, tx));
        let mut client = Self {
            child,
            writer,
            rx,
            next_id: 1,
        };
        let root_uri = Url::from_directory_path(root)
            .map_err(|_| io::Error::other("invalid root path for URI"))?
            .to_string();
        let init_id = client.send_request(
            "initialize",
            json!({
                "processId": std::process::id(),
                "rootUri": root_uri,
                "capabilities": {
                    "textDocument": {
                        "completion": {
                            "completionItem": { "snippetSupport": false }
                        }
                    }
                },
                "clientInfo": { "name": "lightide", "version": env!("CARGO_PKG_VERSION") },
            }),
        )?;
        client.wait_for_initialize(init_id)?;
        client.send_notification("initialized", json!({}))?;
        info!(server = %program, "language server initialized");
        Ok(client)
    }

    fn wait_for_initialize(&self, init_id: i64) -> io::Result<()> {
        let deadline = Instant::now() + INITIALIZE_TIMEOUT;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return Err(io::Error::other("language server initialize timeout"));
            }
            match self.rx.recv_timeout(deadline.saturating_duration_since(now)) {
                Ok(LspInbound::Response { id, result }) if id == init_id => {
                    if is_error_payload(&result) {
                        return Err(io::Error::other(format!(
                            "language server initialize error: {result}"
                        )));
                    }
                    return Ok(());
                }
                Ok(_) => continue,
                Err(_) => return Err(io::Error::other("language server exited during startup")),
            }
        }
    }

    pub(crate) fn send_notification(&self, method: &str, params: Value) -> io::Result<()> {
        self.send_raw(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        }))
    }

    pub(crate) fn send_request(&mut self, method: &str, params: Value) -> io::Result<i64> {
        let id = self.next_id;
        self.next_id += 1;
        self.send_raw(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))?;
        debug!(%method, id, "lsp request");
        Ok(id)
    }

    fn send_raw(&self, value: &Value) -> io::Result<()> {
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("lsp writer lock poisoned"))?;
        write_message(&mut *guard, value)
    }

    pub(crate) fn did_open(&self, uri: &str, text: &str, version: i64) -> io::Result<()> {
        self.send_notification(
            "textDocument/didOpen",
            json!({
                "textDocument": {
                    "uri": uri,
                    "languageId": "python",
                    "version": version,
                    "text": text
                }
            }),
        )
    }

    pub(crate) fn did_change(&self, uri: &str, text: &str, version: i64) -> io::Result<()> {
        self.send_notification(
            "textDocument/didChange",
            json!({
                "textDocument": { "uri": uri, "version": version },
                "contentChanges": [ { "text": text } ]
            }),
        )
    }

    /// Position is 0-indexed line and character.
    pub(crate) fn request_completion(
        &mut self,
        uri: &str,
        line: usize,
        character: usize,
    ) -> io::Result<i64> {
        self.send_request(
            "textDocument/completion",
            json!({
                "textDocument": { "uri": uri },
                "position": { "line": line, "character": character },
                "context": { "triggerKind": 1 }
            }),
        )
    }
}

impl Drop for LspClient {
    fn drop(&mut self) {
        let _ = self.send_notification("exit", Value::Null);
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Frames one JSON-RPC message with its `Content-Length` header.
pub(crate) fn write_message(out: &mut impl Write, value: &Value) -> io::Result<()> {
    let payload = serde_json::to_vec(value)
        .map_err(|e| io::Error::other(format!("lsp serialize error: {e}")))?;
    let header = format!("Content-Length: {}\r\n\r\n", payload.len());
    out.write_all(header.as_bytes())?;
    out.write_all(&payload)?;
    out.flush()
}

fn is_error_payload(result: &Value) -> bool {
    result.get("code").is_some() && result.get("message").is_some()
}

/// Candidates from a `textDocument/completion` result, which may be a bare
/// array or a `CompletionList`. `Err` carries the server's error message.
pub(crate) fn parse_completion_items(result: &Value) -> Result<Vec<CompletionCandidate>, String> {
    if is_error_payload(result) {
        return Err(result
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("completion error")
            .to_string());
    }
    let items = result
        .as_array()
        .or_else(|| result.get("items").and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or_default();
    Ok(items
        .iter()
        .filter_map(|it| {
            let name = it
                .get("insertText")
                .and_then(Value::as_str)
                .or_else(|| it.get("label").and_then(Value::as_str))
                .filter(|s| !s.is_empty())?;
            Some(CompletionCandidate {
                name: name.to_string(),
                detail: it
                    .get("detail")
                    .and_then(Value::as_str)
                    .map(ToString::to_string),
            })
        })
        .take(MAX_COMPLETION_ITEMS)
        .collect())
}

pub(crate) fn lsp_reader_loop(stdout: impl Read, tx: Sender<LspInbound>) {
    let mut reader = BufReader::new(stdout);
    loop {
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            let Ok(n) = reader.read_line(&mut line) else {
                return;
            };
            if n == 0 {
                return;
            }
            let trimmed = line.trim_end();
            if trimmed.is_empty() {
                break;
            }
            if let Some(rest) = trimmed.strip_prefix("Content-Length:") {
                content_length = rest.trim().parse::<usize>().unwrap_or(0);
            }
        }
        if content_length == 0 {
            continue;
        }
        let mut buf = vec![0u8; content_length];
        if reader.read_exact(&mut buf).is_err() {
            return;
        }
        let Ok(msg) = serde_json::from_slice::<Value>(&buf) else {
            continue;
        };
        // Server-initiated requests carry both fields; they are surfaced as
        // notifications and never answered.
        if let Some(method) = msg.get("method").and_then(Value::as_str) {
            let params = msg.get("params").cloned().unwrap_or(Value::Null);
            let _ = tx.send(LspInbound::Notification {
                method: method.to_string(),
                params,
            });
            continue;
        }
        if let Some(id) = msg.get("id").and_then(Value::as_i64) {
            let result = msg
                .get("result")
                .cloned()
                .or_else(|| msg.get("error").cloned())
                .unwrap_or(Value::Null);
            let _ = tx.send(LspInbound::Response { id, result });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn frame(value: &Value) -> String {
        let payload = serde_json::to_string(value).expect("serialize");
        format!("Content-Length: {}\r\n\r\n{}", payload.len(), payload)
    }

    fn read_all(input: String) -> Vec<LspInbound> {
        let (tx, rx) = mpsc::channel();
        // The loop returns at end of input, dropping the sender.
        lsp_reader_loop(Cursor::new(input.into_bytes()), tx);
        rx.iter().collect()
    }

    #[test]
    fn reader_decodes_notification_and_response() {
        let input = frame(&json!({"jsonrpc":"2.0","method":"window/logMessage","params":{"message":"hi"}}))
            + &frame(&json!({"jsonrpc":"2.0","id":7,"result":{"items":[]}}));
        let msgs = read_all(input);
        assert_eq!(msgs.len(), 2);
        match &msgs[0] {
            LspInbound::Notification { method, params } => {
                assert_eq!(method, "window/logMessage");
                assert_eq!(params["message"], "hi");
            }
            other => panic!("expected notification, got {other:?}"),
        }
        match &msgs[1] {
            LspInbound::Response { id, result } => {
                assert_eq!(*id, 7);
                assert!(result.get("items").is_some());
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn reader_skips_invalid_json_and_keeps_going() {
        let bad = "not valid json!";
        let input = format!("Content-Length: {}\r\n\r\n{}", bad.len(), bad)
            + &frame(&json!({"jsonrpc":"2.0","method":"test","params":{}}));
        let msgs = read_all(input);
        assert_eq!(msgs.len(), 1);
        assert!(matches!(&msgs[0], LspInbound::Notification { method, .. } if method == "test"));
    }

    #[test]
    fn reader_stops_on_truncated_body() {
        let msgs = read_all("Content-Length: 100\r\n\r\nincomplete".to_string());
        assert!(msgs.is_empty());
    }

    #[test]
    fn error_response_is_forwarded_as_result() {
        let input = frame(
            &json!({"jsonrpc":"2.0","id":5,"error":{"code":-32601,"message":"Method not found"}}),
        );
        let msgs = read_all(input);
        match &msgs[0] {
            LspInbound::Response { id, result } => {
                assert_eq!(*id, 5);
                assert_eq!(
                    parse_completion_items(result).expect_err("error payload"),
                    "Method not found"
                );
            }
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn write_message_frames_payload() {
        let mut out = Vec::new();
        let value = json!({"jsonrpc":"2.0","method":"initialized","params":{}});
        write_message(&mut out, &value).expect("write");
        let text = String::from_utf8(out).expect("utf8");
        let (header, body) = text.split_once("\r\n\r\n").expect("header");
        let len: usize = header
            .strip_prefix("Content-Length: ")
            .expect("prefix")
            .parse()
            .expect("number");
        assert_eq!(len, body.len());
        assert_eq!(serde_json::from_str::<Value>(body).expect("json"), value);
    }

    #[test]
    fn completion_items_from_list_or_array() {
        let list = json!({"isIncomplete": false, "items": [
            {"label": "append", "detail": "def append(x)"},
            {"label": "add", "insertText": "add"},
            {"label": ""}
        ]});
        let items = parse_completion_items(&list).expect("items");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "append");
        assert_eq!(items[0].detail.as_deref(), Some("def append(x)"));
        assert_eq!(items[1].detail, None);

        let bare = json!([{"label": "print"}]);
        assert_eq!(parse_completion_items(&bare).expect("items")[0].name, "print");
        assert!(parse_completion_items(&Value::Null).expect("empty").is_empty());
    }

    #[test]
    fn completion_items_are_capped() {
        let many: Vec<Value> = (0..100).map(|i| json!({"label": format!("n{i}")})).collect();
        let items = parse_completion_items(&Value::Array(many)).expect("items");
        assert_eq!(items.len(), MAX_COMPLETION_ITEMS);
    }

    #[test]
    fn start_with_empty_command_fails() {
        let err = LspClient::start(&[], Path::new(".")).err().expect("error");
        assert!(err.to_string().contains("empty"));
    }
}
