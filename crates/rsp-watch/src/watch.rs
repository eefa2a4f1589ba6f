//! Drive a reconciler from newline-delimited JSON notifications.

use crate::config::WatchConfig;
use rsp_client::{DeployableEvent, Reconciler, spawn};
use rsp_core::{DeployableState, Notification};
use serde::Serialize;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

/// What to print.
#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    /// Only print events of this server.
    pub server: Option<String>,
    /// Print the final store contents once input ends.
    pub summary: bool,
}

/// Counters reported when input ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    pub lines: usize,
    pub skipped: usize,
}

#[derive(Serialize)]
struct ServerSummary<'a> {
    server: &'a str,
    deployables: &'a [DeployableState],
}

/// Read notifications from `input` until EOF, writing every dispatched event
/// to `output` as one JSON line.
pub async fn watch<R, W>(
    mut input: R,
    output: W,
    config: &WatchConfig,
    options: &WatchOptions,
) -> anyhow::Result<WatchStats>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send + 'static,
{
    let output = Arc::new(Mutex::new(output));
    let reconciler = Reconciler::new();
    let view = reconciler.view();

    let sink = output.clone();
    let only = options.server.clone();
    reconciler.on_transition(move |event: &DeployableEvent| {
        if only.as_deref().is_some_and(|server| server != event.server_id()) {
            return;
        }
        let mut out = sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = write_json_line(&mut *out, event) {
            warn!("failed to write event: {}", e);
        }
    });

    let (sender, handle) = spawn(reconciler, &config.intake);
    let mut stats = WatchStats::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        stats.lines += 1;
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                stats.skipped += 1;
                warn!(line = stats.lines, "skipping line that is not UTF-8: {}", e);
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Notification>(line) {
            Ok(notification) => sender.send(notification).await?,
            Err(e) => {
                stats.skipped += 1;
                warn!(line = stats.lines, "skipping malformed notification: {}", e);
            }
        }
    }
    drop(sender);
    handle.await?;

    if options.summary {
        let mut out = output.lock().unwrap_or_else(PoisonError::into_inner);
        for server in view.servers() {
            if options.server.as_deref().is_some_and(|only| only != server) {
                continue;
            }
            let deployables = view.list_by_server(&server);
            write_json_line(
                &mut *out,
                &ServerSummary {
                    server: &server,
                    deployables: &deployables,
                },
            )?;
        }
        out.flush()?;
    }

    info!(lines = stats.lines, skipped = stats.skipped, tracked = view.len(), "input finished");
    Ok(stats)
}

fn write_json_line<T: Serialize>(out: &mut dyn Write, value: &T) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|l| serde_json::from_str(l).unwrap())
                .collect()
        }
    }

    const SERVER: &str = r#"{"id":"srv1","type":{"id":"wildfly","visibleName":"WildFly","description":"..."}}"#;
    const OTHER: &str = r#"{"id":"srv2","type":{"id":"tomcat","visibleName":"Tomcat","description":"..."}}"#;

    fn changed(server: &str, path: &str, state: i64, publish: i64) -> String {
        format!(
            r#"{{"type":"deployable_state_changed","server":{server},"reference":{{"label":"app","path":"{path}"}},"state":{state},"publishState":{publish}}}"#
        )
    }

    #[tokio::test]
    async fn prints_events_and_skips_garbage() {
        let input = [
            changed(SERVER, "/app1", 1, 3),
            "not json".to_string(),
            String::new(),
            changed(SERVER, "/app1", 2, 3),
            changed(SERVER, "/app1", 2, 3),
            r#"{"type":"deployable_removed","serverId":"srv1","path":"/app1"}"#.to_string(),
        ]
        .join("\n");
        let out = SharedBuf::default();

        let stats = watch(
            input.as_bytes(),
            out.clone(),
            &WatchConfig::default(),
            &WatchOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(stats, WatchStats { lines: 6, skipped: 1 });
        let lines = out.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["event"], "added");
        assert_eq!(lines[1]["event"], "changed");
        assert_eq!(lines[1]["kind"], "state_changed");
        assert_eq!(lines[2]["event"], "removed");
        assert_eq!(lines[2]["lastKnown"]["state"], 2);
    }

    #[tokio::test]
    async fn non_utf8_line_is_skipped() {
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(changed(SERVER, "/app1", 2, 1).as_bytes());
        input.push(b'\n');
        let out = SharedBuf::default();

        let stats = watch(
            input.as_slice(),
            out.clone(),
            &WatchConfig::default(),
            &WatchOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(stats, WatchStats { lines: 2, skipped: 1 });
        let lines = out.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["event"], "added");
        assert_eq!(lines[0]["current"]["reference"]["path"], "/app1");
    }

    #[tokio::test]
    async fn server_filter_and_summary() {
        let input = [
            changed(SERVER, "/a", 2, 1),
            changed(OTHER, "/b", 2, 1),
            changed(SERVER, "/c", 4, 2),
        ]
        .join("\n");
        let out = SharedBuf::default();
        let options = WatchOptions {
            server: Some("srv1".into()),
            summary: true,
        };

        watch(input.as_bytes(), out.clone(), &WatchConfig::default(), &options)
            .await
            .unwrap();

        let lines = out.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[..2].iter().all(|l| l["current"]["server"]["id"] == "srv1"));
        assert_eq!(lines[2]["server"], "srv1");
        let paths: Vec<&str> = lines[2]["deployables"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["reference"]["path"].as_str().unwrap())
            .collect();
        assert_eq!(paths, ["/a", "/c"]);
    }
}
