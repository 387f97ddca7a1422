use chrono::Utc;
use std::env;
use std::error::Error;
use std::fs::{metadata, File};
use std::io::Write;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let out_dir = env::var_os("OUT_DIR").ok_or("OUT_DIR is not set")?;
    let dest_path = Path::new(&out_dir).join("version.rs");
    let manifest_dir = env::var("CARGO_MANIFEST_DIR")?;
    let cargo_toml_path = Path::new(&manifest_dir).join("Cargo.toml");

    // Only regenerate when Cargo.toml is newer than the generated file
    let should_regenerate = if dest_path.exists() {
        let version_rs_modified = metadata(&dest_path)?.modified()?;
        let cargo_toml_modified = metadata(&cargo_toml_path)?.modified()?;
        cargo_toml_modified > version_rs_modified
    } else {
        true
    };

    if !should_regenerate {
        return Ok(());
    }

    let mut f = File::create(&dest_path)?;

    // Config schema version lives in [package.metadata]
    let cargo_toml_content = std::fs::read_to_string(&cargo_toml_path)?;

    let config_schema_version = match cargo_toml_content.parse::<toml::Table>() {
        Ok(cargo_toml) => cargo_toml
            .get("package")
            .and_then(|p| p.as_table())
            .and_then(|p| p.get("metadata"))
            .and_then(|m| m.as_table())
            .and_then(|m| m.get("config_schema_version"))
            .and_then(|v| v.as_integer())
            .map(|v| v.to_string())
            .unwrap_or_else(|| "1".to_string()),
        Err(_) => "1".to_string(),
    };
    let build_time = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let git_hash = std::process::Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout).ok()
            } else {
                None
            }
        })
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    #[allow(clippy::uninlined_format_args)]
    writeln!(
        &mut f,
        r###"pub const CONFIG_SCHEMA_VERSION: &str = "{}";
pub const BUILD_TIME: &str = "{}";
pub const GIT_HASH: &str = "{}";"###,
        config_schema_version, build_time, git_hash
    )?;

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=.git/HEAD");
    Ok(())
}
