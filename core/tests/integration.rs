//! Full session lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives every `ApiService`
//! operation over real HTTP with `UreqTransport`. Validates that request
//! building, the bearer header, error normalization and response parsing
//! agree with the server end-to-end.

use std::io::{Read, Write};
use std::sync::Arc;

use tutor_core::{
    ApiError, ApiService, Config, ContentHistory, ContentStatus, ContentType, DifficultyLevel,
    FileTokenStore, GenerateContentRequest, LoginRequest, MemoryTokenStore, RegistrationForm,
    Session, UpdateContent, UreqTransport,
};

/// Start the mock server on its own runtime thread and return its address.
fn start_server() -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

/// Answer every connection with the same raw status line and body bytes.
fn start_raw_responder(status_line: &'static str, body: &'static [u8]) -> std::net::SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = stream.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            stream.write_all(head.as_bytes()).unwrap();
            stream.write_all(body).unwrap();
        }
    });
    addr
}

fn service_for(addr: std::net::SocketAddr, session: Session) -> ApiService<UreqTransport> {
    let config = Config::with_base_url(&format!("http://{addr}/api/v1")).unwrap();
    ApiService::from_config(&config, session)
}

#[test]
fn session_lifecycle() {
    let addr = start_server();
    let api = service_for(addr, Session::new(Arc::new(MemoryTokenStore::new())));
    let mut history = ContentHistory::new();

    // Step 1: the server is up.
    assert!(api.health_check());

    // Step 2: unauthenticated calls fail with the server's detail.
    let err = api.get_current_user().unwrap_err();
    assert_eq!(err.to_string(), "Could not validate credentials");
    assert_eq!(err.status(), Some(401));

    // Step 3: register through the signup form.
    let form = RegistrationForm {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        password: "Abcdef12".to_string(),
        confirm_password: "Abcdef12".to_string(),
    };
    let auth = api.register(&form.validate().unwrap()).unwrap();
    assert!(api.session().is_authenticated());

    // Step 4: current user matches the registered one.
    let me = api.get_current_user().unwrap();
    assert_eq!(me.id, auth.user.id);
    assert_eq!(me.email, "ada@example.com");

    // Step 5: generate content.
    let created = api
        .generate_content(&GenerateContentRequest {
            topic: "Calculus".to_string(),
            difficulty_level: DifficultyLevel::Beginner,
            content_type: ContentType::StudyNotes,
        })
        .unwrap();
    assert_eq!(created.topic, "Calculus");
    assert_eq!(created.difficulty_level, DifficultyLevel::Beginner);
    assert_eq!(created.content_type, ContentType::StudyNotes);
    assert_eq!(created.status, ContentStatus::Pending);
    history.record(&created);

    // Step 6: history and get-by-id reflect the record verbatim.
    let listed = api.get_content_history(None).unwrap();
    assert_eq!(listed, vec![created.clone()]);
    let fetched = api.get_content_by_id(&created.id).unwrap();
    assert_eq!(fetched, created);

    // Step 7: update to completed.
    let updated = api
        .update_content(
            &created.id,
            &UpdateContent {
                status: Some(ContentStatus::Completed),
                generated_content: Some("Derivatives measure change.".to_string()),
                ..UpdateContent::default()
            },
        )
        .unwrap();
    assert_eq!(updated.status, ContentStatus::Completed);
    assert!(history.update(&updated));
    assert_eq!(
        history.get(&created.id).unwrap().display_body(),
        "Derivatives measure change."
    );

    // Step 8: regenerate resets to pending.
    let regenerated = api.regenerate_content(&created.id).unwrap();
    assert_eq!(regenerated.status, ContentStatus::Pending);
    assert!(regenerated.generated_content.is_none());

    // Step 9: delete, then the id is unknown.
    api.delete_content(&created.id).unwrap();
    history.remove(&created.id);
    let err = api.get_content_by_id(&created.id).unwrap_err();
    assert_eq!(err.to_string(), "Content not found");
    assert_eq!(err.status(), Some(404));
    assert!(history.is_empty());

    // Step 10: logout clears the token; the old session is revoked.
    api.logout().unwrap();
    assert!(!api.session().is_authenticated());
    assert!(api.get_current_user().is_err());

    // Step 11: login again with the same credentials.
    let auth = api
        .login(&LoginRequest {
            email: "ada@example.com".to_string(),
            password: "Abcdef12".to_string(),
        })
        .unwrap();
    assert_eq!(auth.user.id, me.id);
    assert!(api.get_content_history(Some(5)).unwrap().is_empty());
}

#[test]
fn token_file_survives_a_new_service() {
    let addr = start_server();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token");

    let first = service_for(addr, Session::new(Arc::new(FileTokenStore::new(&path))));
    first
        .register(&RegistrationForm {
            first_name: "Alan".to_string(),
            last_name: "Turing".to_string(),
            email: "alan@example.com".to_string(),
            password: "Enigma123".to_string(),
            confirm_password: "Enigma123".to_string(),
        }
        .validate()
        .unwrap())
        .unwrap();

    let second = service_for(addr, Session::new(Arc::new(FileTokenStore::new(&path))));
    assert_eq!(second.get_current_user().unwrap().email, "alan@example.com");

    second.logout().unwrap();
    assert!(!path.exists());
}

#[test]
fn unreachable_backend() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let api = service_for(addr, Session::new(Arc::new(MemoryTokenStore::with_token("t"))));

    assert!(!api.health_check());
    let err = api.get_content_history(None).unwrap_err();
    assert!(matches!(err, ApiError::Request { status: None, .. }));

    // Logout still clears the local token.
    assert!(api.logout().is_err());
    assert!(!api.session().is_authenticated());
}

#[test]
fn undecodable_error_body_keeps_the_status() {
    let addr = start_raw_responder("500 Internal Server Error", &[0xff, 0xfe, 0xfd]);
    let api = service_for(addr, Session::new(Arc::new(MemoryTokenStore::with_token("t"))));

    let err = api.get_current_user().unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("500"), "{err}");
}

#[test]
fn health_depends_only_on_the_status() {
    let healthy = start_raw_responder("200 OK", &[0xff, 0xfe]);
    let api = service_for(healthy, Session::new(Arc::new(MemoryTokenStore::new())));
    assert!(api.health_check());

    let failing = start_raw_responder("503 Service Unavailable", &[0xff]);
    let api = service_for(failing, Session::new(Arc::new(MemoryTokenStore::new())));
    assert!(!api.health_check());
}
