use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use bytes::{BufMut, Bytes, BytesMut};
use image::RgbImage;
use std::{convert::Infallible, net::SocketAddr};
use tokio::{net::TcpListener, sync::watch, task::JoinHandle};
use tokio_stream::{wrappers::WatchStream, StreamExt};
use tracing::{debug, info, warn};

use crate::{encode_jpeg, ExitFlag, FrameSink};

const BOUNDARY: &str = "notecamframe";
const VIDEO_CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=notecamframe";

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>notecam</title>
<style>
body { font-family: monospace; display: flex; gap: 1em; background: #222; color: #eee; }
#side { min-width: 18em; }
pre { white-space: pre-wrap; }
</style>
</head>
<body>
<img src="/video" alt="stream">
<div id="side">
<pre id="text"></pre>
<button onclick="fetch('/exit')">Stop</button>
</div>
<script>
setInterval(() => fetch('/text').then(r => r.text()).then(t => {
  document.getElementById('text').textContent = t;
}).catch(() => {}), 500);
</script>
</body>
</html>
"#;

#[derive(Clone)]
struct Shared {
    frames: watch::Receiver<Bytes>,
    text: watch::Receiver<String>,
    exit: ExitFlag,
}

/// HTTP viewer: `/` page, `/video` MJPEG, `/text` sidebar lines, `/exit` stop request.
pub struct MjpegStreamer {
    frames: watch::Sender<Bytes>,
    text: watch::Sender<String>,
    exit: ExitFlag,
    quality: u8,
    local_addr: SocketAddr,
    server: JoinHandle<()>,
}

impl MjpegStreamer {
    pub async fn bind(addr: &str, quality: u8, exit: ExitFlag) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.with_context(|| format!("bind stream server on {}", addr))?;
        let local_addr = listener.local_addr().context("stream server local addr")?;
        let (frames, frames_rx) = watch::channel(Bytes::new());
        let (text, text_rx) = watch::channel(String::new());
        let app = router(Shared { frames: frames_rx, text: text_rx, exit: exit.clone() });
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                warn!("stream: server failed: {}", e);
            }
        });
        info!("stream: viewer at http://{}/", local_addr);
        Ok(Self { frames, text, exit, quality, local_addr, server })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl FrameSink for MjpegStreamer {
    fn send_data(&mut self, frame: &RgbImage, text: &[String]) -> Result<()> {
        anyhow::ensure!(!self.server.is_finished(), "stream server stopped");
        let jpg = encode_jpeg(frame, self.quality)?;
        self.frames.send_replace(jpg);
        self.text.send_replace(text.join("\n"));
        Ok(())
    }

    fn check_exit(&self) -> bool {
        self.exit.is_requested()
    }
}

impl Drop for MjpegStreamer {
    // Open /video responses end once `frames` is dropped.
    fn drop(&mut self) {
        self.server.abort();
        debug!("stream: server stopped");
    }
}

fn router(shared: Shared) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/index.html", get(index))
        .route("/text", get(text))
        .route("/exit", get(exit))
        .route("/video", get(video))
        .with_state(shared)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn text(State(shared): State<Shared>) -> impl IntoResponse {
    let body = shared.text.borrow().clone();
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8"), (header::CACHE_CONTROL, "no-cache")],
        body,
    )
}

async fn exit(State(shared): State<Shared>) -> &'static str {
    info!("stream: exit requested by viewer");
    shared.exit.request();
    "stopping\n"
}

async fn video(State(shared): State<Shared>) -> Response {
    let parts = WatchStream::new(shared.frames)
        .filter(|jpg| !jpg.is_empty())
        .map(|jpg| Ok::<_, Infallible>(multipart_frame(&jpg)));
    (
        [(header::CONTENT_TYPE, VIDEO_CONTENT_TYPE), (header::CACHE_CONTROL, "no-cache")],
        Body::from_stream(parts),
    )
        .into_response()
}

/// One `multipart/x-mixed-replace` part carrying a JPEG.
fn multipart_frame(jpg: &[u8]) -> Bytes {
    let head = format!("--{}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n", BOUNDARY, jpg.len());
    let mut part = BytesMut::with_capacity(head.len() + jpg.len() + 2);
    part.put_slice(head.as_bytes());
    part.put_slice(jpg);
    part.put_slice(b"\r\n");
    part.freeze()
}
