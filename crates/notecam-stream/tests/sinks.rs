use image::{Rgb, RgbImage};
use notecam_stream::{ExitFlag, FrameSink, MjpegStreamer, SnapshotSink};
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};

fn frame() -> RgbImage {
    RgbImage::from_pixel(16, 12, Rgb([200, 10, 10]))
}

fn lines() -> Vec<String> {
    vec!["Model: test".into(), "Objects:".into(), "person: 97.00%".into()]
}

async fn get(addr: std::net::SocketAddr, path: &str) -> String {
    raw(addr, &format!("GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n", path)).await
}

async fn raw(addr: std::net::SocketAddr, request: &str) -> String {
    let mut conn = TcpStream::connect(addr).await.unwrap();
    conn.write_all(request.as_bytes()).await.unwrap();
    let mut body = Vec::new();
    timeout(Duration::from_secs(5), conn.read_to_end(&mut body)).await.unwrap().unwrap();
    String::from_utf8_lossy(&body).into_owned()
}

#[test]
fn snapshot_sink_writes_latest_frame_and_text() {
    let dir = tempfile::tempdir().unwrap();
    let exit = ExitFlag::new();
    let mut sink = SnapshotSink::new(dir.path().join("out"), 85, exit.clone()).unwrap();

    sink.send_data(&frame(), &lines()).unwrap();
    sink.send_data(&frame(), &lines()[..1]).unwrap();
    assert_eq!(sink.frames_written(), 2);

    let img = image::open(sink.frame_path()).unwrap();
    assert_eq!((img.width(), img.height()), (16, 12));
    assert_eq!(std::fs::read_to_string(sink.text_path()).unwrap(), "Model: test\n");

    assert!(!sink.check_exit());
    exit.request();
    assert!(sink.check_exit());
}

#[tokio::test]
async fn mjpeg_serves_text_page_and_exit() {
    let exit = ExitFlag::new();
    let mut s = MjpegStreamer::bind("127.0.0.1:0", 80, exit).await.unwrap();
    let addr = s.local_addr();
    s.send_data(&frame(), &lines()).unwrap();

    let text = get(addr, "/text").await;
    assert!(text.starts_with("HTTP/1.1 200 OK"));
    assert!(text.ends_with("Model: test\nObjects:\nperson: 97.00%"));

    let page = get(addr, "/").await;
    assert!(page.contains("<img src=\"/video\""));

    assert!(get(addr, "/nope").await.starts_with("HTTP/1.1 404"));

    assert!(!s.check_exit());
    get(addr, "/exit").await;
    assert!(s.check_exit());
}

#[tokio::test]
async fn mjpeg_answers_head_and_bare_lf_requests() {
    let exit = ExitFlag::new();
    let s = MjpegStreamer::bind("127.0.0.1:0", 80, exit).await.unwrap();
    let addr = s.local_addr();

    let head = raw(addr, "HEAD / HTTP/1.1\r\nHost: x\r\nConnection: close\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 200"), "got {:?}", head);
    assert!(!head.contains("<img"));

    let stop = raw(addr, "GET /exit HTTP/1.1\nHost: x\nConnection: close\n\n").await;
    assert!(stop.starts_with("HTTP/1.1 200"), "got {:?}", stop);
    assert!(s.check_exit());
}

#[tokio::test]
async fn mjpeg_video_delivers_jpeg_parts() {
    let mut s = MjpegStreamer::bind("127.0.0.1:0", 80, ExitFlag::new()).await.unwrap();
    s.send_data(&frame(), &lines()).unwrap();

    let mut conn = TcpStream::connect(s.local_addr()).await.unwrap();
    conn.write_all(b"GET /video HTTP/1.1\r\nHost: localhost\r\n\r\n").await.unwrap();

    let mut got = Vec::new();
    let mut buf = [0u8; 4096];
    let found = timeout(Duration::from_secs(5), async {
        loop {
            let n = conn.read(&mut buf).await.unwrap();
            assert!(n > 0, "stream closed early");
            got.extend_from_slice(&buf[..n]);
            if got.windows(2).any(|w| w == [0xFF, 0xD8]) {
                return true;
            }
        }
    })
    .await
    .unwrap();
    assert!(found);
    let head = String::from_utf8_lossy(&got);
    assert!(head.contains("multipart/x-mixed-replace"));
    assert!(head.contains("Content-Type: image/jpeg"));
}
