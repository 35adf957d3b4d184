use rattendance::core::{AttendanceApi, Delivery, Provenance};
use rattendance::errors::{AppError, ErrorKind};
use rattendance::models::AttendanceStatus::CheckIn;
use rattendance::models::{AttendanceInput, EventFilter, EventSource};
use rattendance::remote::{AttendanceService, Connectivity, HttpGateway};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

mod common;
use common::{day, kst, new_event, remote_event, sid, store_with, test_config, ts};

/// Minimal HTTP/1.1 server answering every request with the same response.
struct StubServer {
    url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl StubServer {
    async fn start(status: u16, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let raw = read_request(&mut socket).await;
                seen.lock().unwrap().push(raw);

                let reason = match status {
                    200 => "OK",
                    _ => "Internal Server Error",
                };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\n\
                     Content-Type: application/json\r\n\
                     Content-Length: {}\r\n\
                     Connection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        Self {
            url: format!("http://{addr}/exec"),
            requests,
        }
    }

    fn gateway(&self) -> HttpGateway {
        HttpGateway::new(Some(self.url.clone()), kst(), Duration::from_secs(5))
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Read headers plus `Content-Length` bytes of body.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

const ROWS: &str = r#"{"success": true, "data": [
    {"id": "r1", "studentId": "10101", "studentName": "Kim", "date": "2026-10-19",
     "checkInTime": "07:05", "checkOutTime": "bad"},
    {"id": "r2", "studentId": "10102", "studentName": "Lee", "date": "nope",
     "checkInTime": "07:01"}
]}"#;

#[tokio::test]
async fn test_server_error_is_transport_failure() {
    let server = StubServer::start(500, "oops").await;

    let err = server.gateway().fetch_all(&EventFilter::all()).await.unwrap_err();
    assert!(matches!(err, AppError::Transport(_)));
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
}

#[tokio::test]
async fn test_non_json_body_is_parse_failure() {
    let server = StubServer::start(200, "<html>Sign in</html>").await;

    let err = server.gateway().fetch_all(&EventFilter::all()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ParseFailure);
}

#[tokio::test]
async fn test_rejected_envelope_is_reported() {
    let body = r#"{"success": false, "error": "Sheet not found"}"#;
    let server = StubServer::start(200, body).await;

    let err = server.gateway().fetch_students().await.unwrap_err();
    assert!(matches!(err, AppError::RemoteRejected(ref m) if m == "Sheet not found"));
}

#[tokio::test]
async fn test_rows_are_expanded_from_the_response() {
    let server = StubServer::start(200, ROWS).await;
    let gateway = server.gateway();

    let events = gateway.fetch_all(&EventFilter::all()).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "r1-checkin");
    assert_eq!(events[0].timestamp, ts("2026-10-19", "07:05"));
    assert_eq!(events[0].source, EventSource::RemoteOnly);

    let other_day = gateway
        .fetch_all(&EventFilter::for_date(day("2026-10-18")))
        .await
        .unwrap();
    assert!(other_day.is_empty());

    let requests = server.requests();
    assert!(requests[0].starts_with("GET /exec?action=getAllAttendance"));
}

#[tokio::test]
async fn test_students_from_the_response() {
    let body = r#"{"success": true, "data": [
        {"studentId": "10101", "studentName": "Kim"},
        {"studentId": "oops", "studentName": "Nobody"}
    ]}"#;
    let server = StubServer::start(200, body).await;

    let students = server.gateway().fetch_students().await.unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].student_id, sid("10101"));
    assert!(server.requests()[0].contains("action=getStudentList"));
}

#[tokio::test]
async fn test_submit_does_not_read_the_response() {
    let server = StubServer::start(500, "<html>error</html>").await;
    let event = remote_event("r1", "10101", "Kim", CheckIn, ts("2026-10-19", "07:02"));

    server.gateway().submit(&event).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.starts_with("POST /exec"));
    assert!(request.contains("action=submit"));
    assert!(request.contains("student_id=10101"));
    // 입실, form-encoded
    assert!(request.contains("status=%EC%9E%85%EC%8B%A4"));
    assert!(request.contains("source=web_interface"));
}

#[tokio::test]
async fn test_api_submit_over_http_is_dispatched() {
    let server = StubServer::start(500, "<html>error</html>").await;
    let mut api = AttendanceApi::with_parts(
        test_config(),
        store_with(Vec::new()),
        Arc::new(server.gateway()),
    );

    let receipt = api
        .submit_input(AttendanceInput {
            student_id: "10101".into(),
            student_name: "Kim".into(),
            status: "입실".into(),
            timestamp: Some("2026-10-19T07:02:00+09:00".into()),
        })
        .await
        .unwrap();

    assert!(matches!(receipt.delivery, Delivery::Dispatched { .. }));
    assert_eq!(receipt.event.source, EventSource::OnlineBackup);
    assert!(api.store().pending_sync().unwrap().is_empty());
}

#[tokio::test]
async fn test_api_falls_back_to_local_on_server_error() {
    let server = StubServer::start(500, "oops").await;
    let store = store_with(vec![new_event(
        "10101",
        "Kim",
        CheckIn,
        ts("2026-10-19", "07:00"),
    )]);
    let api = AttendanceApi::with_parts(test_config(), store, Arc::new(server.gateway()));

    let view = api
        .get_attendance_data(&EventFilter::for_date(day("2026-10-19")))
        .await
        .unwrap();

    assert_eq!(view.total(), 1);
    match view.provenance {
        Provenance::LocalFallback { reason } => assert!(reason.contains("500"), "{reason}"),
        other => panic!("expected fallback, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_check_and_trigger() {
    let server = StubServer::start(200, r#"{"success": true}"#).await;
    let gateway = server.gateway();

    let status = gateway.probe(Duration::from_secs(3)).await;
    assert_eq!(status.state, Connectivity::Reachable);

    gateway.trigger("processMissing").await.unwrap();

    let requests = server.requests();
    assert!(requests[0].contains("action=test"));
    assert!(requests[1].contains("action=processMissing"));
}

#[tokio::test]
async fn test_closed_port_is_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{addr}/exec");
    let gateway = HttpGateway::new(Some(url), kst(), Duration::from_secs(5));
    let status = gateway.probe(Duration::from_secs(3)).await;
    assert_eq!(status.state, Connectivity::Unreachable);
}
