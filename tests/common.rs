use assert_cmd::{cargo::cargo_bin_cmd, Command};
use std::fs;
use std::path::Path;
use std::process::Output;

pub fn lister() -> Command {
    cargo_bin_cmd!("lister")
}

/// Write a `lister.toml` with a `users` preset pointed at `base_url`
pub fn write_config(dir: &Path, base_url: &str) {
    let config = format!(
        r#"
[runtime]
debounce_ms = 0

[runtime.http]
base_url = "{base_url}"
timeout_seconds = 5

[presets.users.source]
endpoint = "/users"

[presets.users.mapping]
value = "id"
label = "name"
disabled = "locked"

[presets.teams]
source = {{ endpoint = "/teams", method = "POST" }}
selector = "items"
mapping = {{ value = "slug" }}
"#
    );
    fs::write(dir.join("lister.toml"), config).unwrap();
}

/// Run a command off the async test thread so the mock server keeps serving
pub async fn run(mut cmd: Command) -> Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}
