//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use config_plane::admin::{setup_admin_router, AdminOptions};
use config_plane::{ConfigService, ConfigStore, RawDocument};

/// A complete config touching every entity kind.
pub const FULL_TOML: &str = r#"
version = "v1"

[logging]
format = "json"
level = "info"

[[listeners]]
id = "public"
address = ":8080"
type = "http"

[listeners.http]
read_timeout = "5s"

[[listeners]]
id = "internal"
address = ":9090"
type = "grpc"

[[endpoints]]
id = "main"
listener_ids = ["public"]

[[endpoints.routes]]
app_id = "echo"
http = { path_prefix = "/echo" }
static_data = { greeting = "hello" }

[[endpoints.routes]]
app_id = "script"
http = { path_prefix = "/script" }

[[endpoints.middlewares]]
id = "log"
type = "console_logger"

[endpoints.middlewares.console_logger]
preset = "standard"

[[apps]]
id = "echo"
type = "echo"

[apps.echo]
response = "hi"

[[apps]]
id = "script"
type = "script"

[apps.script.risor]
code = "return 1"
timeout = "2s"
"#;

/// A second valid config, distinguishable from [`FULL_TOML`].
pub const MINIMAL_TOML: &str = r#"
[[listeners]]
id = "only"
address = ":7070"
type = "http"

[[endpoints]]
id = "solo"
listener_ids = ["only"]

[[endpoints.routes]]
app_id = "echo"
http = { path_prefix = "/" }

[[apps]]
id = "echo"
type = "echo"
"#;

pub fn store_with(toml: &str) -> Arc<ConfigStore> {
    let store = Arc::new(ConfigStore::empty());
    store
        .update(&RawDocument::toml(toml))
        .expect("fixture config must be valid");
    store
}

pub fn router(store: Arc<ConfigStore>, api_key: Option<&str>) -> axum::Router {
    setup_admin_router(
        ConfigService::new(store),
        AdminOptions {
            api_key: api_key.map(str::to_string),
            ..AdminOptions::default()
        },
    )
}
