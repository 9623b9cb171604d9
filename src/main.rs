use rulekit::comments::strip_comments;
use rulekit::http::{Request, Response};
use rulekit::{Config, Environment, Interpreter};

use std::io::{self, Read};

const DEFAULT_URL: &str = "http://localhost/";

/// Only initialize if RUST_LOG is set.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_level(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn main() {
    init_tracing();

    let mut script = Vec::new();
    if let Err(err) = io::stdin().read_to_end(&mut script) {
        eprintln!("failed to read script from stdin: {err}");
        std::process::exit(1);
    }

    let url = std::env::args().nth(1);
    let mut request = Request::new("GET", url.as_deref().unwrap_or(DEFAULT_URL));
    let mut response = Response::default();

    let result = {
        let mut env = Environment::new();
        env.insert("request", &mut request);
        env.insert("response", &mut response);

        let config = Config::new().with_sink(|line: usize, message: &str| {
            eprintln!("log (line {line}): {message}");
        });
        Interpreter::new(config).run(&mut env, &script)
    };

    let err = match result {
        Ok(()) => {
            println!("{request:#?}");
            println!("{response:#?}");
            return;
        }
        Err(err) => err,
    };

    // Line numbers count lines of the script after comments are removed.
    let stripped = String::from_utf8_lossy(&strip_comments(&script)).into_owned();
    let line_text = stripped.lines().nth(err.line.saturating_sub(1)).unwrap_or("");

    eprintln!("ERROR AT LINE {}:", err.line);
    eprintln!("{}", line_text);
    eprintln!("{} [{}]", err.message, err.kind.code());

    std::process::exit(1);
}
