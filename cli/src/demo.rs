//! The handler tree the `wrap` binary serves.
//!
//! ```text
//! api/health   READ                   environment and liveness
//! api/echo     READ                   the request flags
//! api/echo     CREATE, UPDATE         the decoded request body
//! ```

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use wrap_core::{App, Ctx, Environment, HandlerResult};

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    environment: String,
}

pub fn app(env: Environment) -> Arc<App> {
    App::builder().env(env).default_handler(root).build()
}

pub fn root(c: &mut Ctx) -> HandlerResult {
    match c.next() {
        "api" => {
            c.advance_and_dispatch(api);
            Ok(())
        }
        _ => Err(c.not_found()),
    }
}

fn api(c: &mut Ctx) -> HandlerResult {
    match c.next() {
        "health" => {
            c.advance_and_dispatch(health);
            Ok(())
        }
        "echo" => {
            c.advance_and_dispatch(echo);
            Ok(())
        }
        _ => Err(c.not_found()),
    }
}

fn health(c: &mut Ctx) -> HandlerResult {
    if !c.next().is_empty() {
        return Err(c.not_found());
    }
    c.read(|c| {
        let environment = c.app().env().to_string();
        c.json(&Health {
            status: "ok",
            environment,
        })
    });
    c.otherwise(|c| Err(c.not_allowed()));
    c.resolve();
    Ok(())
}

fn echo(c: &mut Ctx) -> HandlerResult {
    if !c.next().is_empty() {
        return Err(c.not_found());
    }
    c.read(|c| {
        let flags = c.flags().clone();
        c.json(&flags)
    });
    c.create(echo_body);
    c.update(echo_body);
    c.otherwise(|c| Err(c.not_allowed()));
    c.resolve();
    Ok(())
}

fn echo_body(c: &mut Ctx) -> HandlerResult {
    let body: Value = c.bind()?;
    c.json(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn health_reports_the_environment() {
        let health: Value = app(Environment::Testing)
            .call()
            .read("api/health")
            .bind()
            .unwrap();
        assert_eq!(health, json!({"status": "ok", "environment": "testing"}));
    }

    #[test]
    fn echo_returns_the_body() {
        let echoed: Value = app(Environment::Development)
            .call()
            .create("api/echo")
            .input(&json!({"a": [1, 2]}))
            .bind()
            .unwrap();
        assert_eq!(echoed, json!({"a": [1, 2]}));
    }

    #[test]
    fn echo_read_returns_flags() {
        let echoed: Value = app(Environment::Development)
            .call()
            .read("api/echo?x=1&x=2")
            .bind()
            .unwrap();
        assert_eq!(echoed, json!({"x": ["1", "2"]}));
    }

    #[test]
    fn delete_is_not_allowed() {
        let err = app(Environment::Development)
            .call()
            .delete("api/echo")
            .bind::<Value>()
            .unwrap_err();
        assert_eq!(err.status(), 405);
    }

    #[test]
    fn unknown_routes_are_not_found() {
        let app = app(Environment::Development);
        for path in ["", "api", "api/nope", "api/health/extra"] {
            let err = app.call().read(path).bind::<Value>().unwrap_err();
            assert_eq!(err.status(), 404, "path {path:?}");
        }
    }
}
