use crate::http::{Request, Response};
use crate::{Config, Environment, Interpreter};

// ── Shared fixture runner ───────────────────────────────────────────

/// Embed fixture files at compile time.
const SCRIPT_FIXTURES: &str = include_str!("../test-data/fixtures/scripts.json");

const DEFAULT_URL: &str = "http://localhost/";

#[test]
fn test_fixture_scripts() {
    let fixtures: Vec<serde_json::Value> = serde_json::from_str(SCRIPT_FIXTURES).unwrap();
    assert!(!fixtures.is_empty());

    for fixture in &fixtures {
        let name = fixture["name"].as_str().unwrap();
        let script = fixture["script"].as_str().unwrap();
        let url = fixture
            .get("url")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_URL);

        let mut request = Request::new("GET", url);
        let mut response = Response::new(200);
        let mut env = Environment::new();
        env.insert("request", &mut request);
        env.insert("response", &mut response);

        let mut logs: Vec<String> = Vec::new();
        let result = Interpreter::new(
            Config::new().with_sink(|_line: usize, message: &str| logs.push(message.to_string())),
        )
        .run(&mut env, script.as_bytes());

        match (fixture.get("expectError"), &result) {
            (Some(expected), Err(err)) => {
                let kind = expected["kind"].as_str().unwrap();
                assert_eq!(
                    err.kind.code(),
                    kind,
                    "Fixture '{}': wrong error kind for {}",
                    name,
                    err
                );
                if let Some(line) = expected.get("line").and_then(|v| v.as_u64()) {
                    assert_eq!(
                        err.line as u64, line,
                        "Fixture '{}': wrong error line for {}",
                        name, err
                    );
                }
            }
            (Some(expected), Ok(())) => {
                panic!("Fixture '{}': expected error {} but script succeeded", name, expected)
            }
            (None, Err(err)) => panic!("Fixture '{}': unexpected error: {}", name, err),
            (None, Ok(())) => {}
        }

        if let Some(expect) = fixture.get("expect").and_then(|v| v.as_object()) {
            for (path, expected) in expect {
                let actual = env
                    .read(path)
                    .unwrap_or_else(|e| panic!("Fixture '{}': reading '{}': {}", name, path, e));
                assert_eq!(
                    actual.to_string(),
                    expected.as_str().unwrap(),
                    "Fixture '{}': value at '{}'",
                    name,
                    path
                );
            }
        }

        if let Some(missing) = fixture.get("expectMissing").and_then(|v| v.as_array()) {
            for path in missing {
                let path = path.as_str().unwrap();
                assert!(
                    env.read(path).is_err(),
                    "Fixture '{}': expected '{}' to be unreadable",
                    name,
                    path
                );
            }
        }

        if let Some(expected_logs) = fixture.get("expectLogs").and_then(|v| v.as_array()) {
            let expected_logs: Vec<&str> =
                expected_logs.iter().map(|v| v.as_str().unwrap()).collect();
            assert_eq!(logs, expected_logs, "Fixture '{}': logged entries", name);
        }
    }
}

// ── Host mutations seen after the run ──────────────────────────────

#[test]
fn test_request_rewrite_is_visible_to_host() {
    let mut request = Request::new("GET", "http://localhost/");
    let mut response = Response::new(200);
    {
        let mut env = Environment::new();
        env.insert("request", &mut request);
        env.insert("response", &mut response);
        crate::parse(
            &mut env,
            b"request.proto = HTTP/1.0\n\
              request.close = TRUE\n\
              request.contentlength = 1024\n\
              request.tls.peercertificates.0.signature = sig\n\
              response.statuscode = 302\n\
              response.header.location = /login\n",
        )
        .unwrap();
    }

    assert_eq!(request.proto, "HTTP/1.0");
    assert!(request.close);
    assert_eq!(request.content_length, 1024);
    let tls = request.tls.as_ref().unwrap();
    assert_eq!(tls.peer_certificates.as_ref().unwrap()[0].signature, b"sig");
    assert_eq!(response.status_code, 302);
    assert_eq!(response.header["location"], vec!["/login".to_string()]);
}

#[test]
fn test_error_display_names_line_and_kind() {
    let mut env = Environment::new();
    let err = crate::parse(&mut env, b"var a 1\nvar a 2").unwrap_err();
    assert_eq!(
        err.to_string(),
        "variable resource with the name 'a' already exists at line:2 (rule-syntax-error)"
    );
}

#[test]
fn test_tracing_sink_accepts_entries() {
    let mut env = Environment::new();
    Interpreter::new(Config::new().with_sink(crate::TracingSink))
        .run(&mut env, b"log hello")
        .unwrap();
}
