use actfind_local::fixtures::pdf_with_pages;
use axum::{http::header, http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn act_server(hits: Arc<AtomicUsize>) -> Router {
    let body = pdf_with_pages(&["Chapter IV", "Section 80C deduction for investments"]);
    Router::new().route(
        "/act.pdf",
        get(move || {
            let hits = hits.clone();
            let body = body.clone();
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                ([(header::CONTENT_TYPE, "application/pdf")], body)
            }
        }),
    )
}

// The server runs on runtime worker threads while the binary blocks this one.
async fn run_actfind(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || {
        let bin = assert_cmd::cargo::cargo_bin!("actfind");
        let mut cmd = std::process::Command::new(bin);
        cmd.args(&args)
            .env_remove("ACTFIND_ENV_FILE")
            .env_remove("ACTFIND_PDF_URL")
            .env_remove("ACTFIND_PDF_PATH")
            .env_remove("RUST_LOG")
            .stdin(std::process::Stdio::null());
        cmd.output().unwrap()
    })
    .await
    .unwrap()
}

fn args(url: &str, path: &Path, rest: &[&str]) -> Vec<String> {
    let mut v: Vec<String> = rest.iter().map(|s| s.to_string()).collect();
    v.extend([
        "--pdf-url".to_string(),
        url.to_string(),
        "--pdf-path".to_string(),
        path.display().to_string(),
        "--timeout-ms".to_string(),
        "5000".to_string(),
    ]);
    v
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fetch_downloads_once_and_search_reuses_the_cache() {
    let hits = Arc::new(AtomicUsize::new(0));
    let addr = serve(act_server(hits.clone())).await;
    let url = format!("http://{addr}/act.pdf");
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested").join("act.pdf");

    let out = run_actfind(args(&url, &path, &["fetch"])).await;
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(stdout.trim(), path.display().to_string());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Download complete"));
    assert!(path.is_file());
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    let out = run_actfind(args(&url, &path, &["search", "--query", "80c"])).await;
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert!(String::from_utf8_lossy(&out.stderr).contains("PDF already exists"));
    assert!(String::from_utf8_lossy(&out.stdout).contains("[MATCH]"));
    assert_eq!(hits.load(Ordering::SeqCst), 1, "cached copy must be reused");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_downloads_when_cache_is_missing() {
    let hits = Arc::new(AtomicUsize::new(0));
    let addr = serve(act_server(hits.clone())).await;
    let url = format!("http://{addr}/act.pdf");
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("act.pdf");

    let out = run_actfind(args(&url, &path, &["--query", "chapter iv"])).await;
    assert!(
        out.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&out.stderr)
    );
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Downloading PDF"), "{stderr}");
    assert!(stderr.contains("Text extraction complete."), "{stderr}");
    assert!(String::from_utf8_lossy(&out.stdout).contains("Chapter IV"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn http_error_is_reported_and_nothing_is_cached() {
    let app = Router::new().route("/act.pdf", get(|| async { StatusCode::NOT_FOUND }));
    let addr = serve(app).await;
    let url = format!("http://{addr}/act.pdf");
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("act.pdf");

    let out = run_actfind(args(&url, &path, &["fetch"])).await;
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("network/download error"), "{stderr}");
    assert!(stderr.contains("404"), "{stderr}");
    assert!(!path.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn html_error_page_is_not_cached_as_the_act() {
    let app = Router::new().route(
        "/act.pdf",
        get(|| async { ([(header::CONTENT_TYPE, "text/html")], "<html>maintenance</html>") }),
    );
    let addr = serve(app).await;
    let url = format!("http://{addr}/act.pdf");
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("act.pdf");

    let out = run_actfind(args(&url, &path, &["fetch"])).await;
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("not a PDF"));
    assert!(!path.exists());
}
