#![allow(dead_code)]

use std::path::{Path, PathBuf};

/// Fake renderer: writes `<out>/<stem>.<fmt>` and fails for sketches named `fail*`.
///
/// Invoked as `sh <script> -s <sketch> -f <fmt> -r <fps> -t <frames> -o <out> -d <dsf>`.
pub const FAKE_RENDERER: &str = r#"
sketch="$2"
fmt="$4"
out="${10}"
name=$(basename "$sketch" .js)
case "$name" in
  fail*) echo "cannot render $name" >&2; exit 1 ;;
esac
sleep 0.05
: > "$out/$name.$fmt"
"#;

/// Fresh scratch directory under `target/`.
pub fn scratch(group: &str, name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join(group).join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Write empty sketch files named `names` into `dir`.
pub fn write_sketches(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), "function setup() {}\nfunction draw() {}\n").unwrap();
    }
}

/// Write the fake renderer script into `dir` and return its path.
pub fn write_fake_renderer(dir: &Path) -> PathBuf {
    let script = dir.join("fake_render.sh");
    std::fs::write(&script, FAKE_RENDERER).unwrap();
    script
}
