//! Build automation tasks for Stardrift
//!
//! Usage:
//!   cargo xtask build-web       # Build WASM for web deployment
//!   cargo xtask package-itch    # Create zip for itch.io upload

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::Command;

const WASM_NAME: &str = "stardrift.wasm";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation for Stardrift")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build WASM plus the page and assets into dist/web
    BuildWeb {
        /// Mark as dev build (adds DEV to the page title)
        #[arg(long)]
        dev: bool,
    },
    /// Create zip file ready for itch.io upload
    PackageItch,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::BuildWeb { dev } => build_web(dev),
        Commands::PackageItch => package_itch(),
    }
}

/// Get the project root directory
fn project_root() -> Result<PathBuf> {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .context("xtask has no parent directory")
}

/// Run a command and check for success
fn run_cmd(cmd: &mut Command) -> Result<()> {
    let status = cmd.status().context("Failed to execute command")?;
    if !status.success() {
        anyhow::bail!("Command failed with status: {}", status);
    }
    Ok(())
}

/// Download a file from URL to destination
fn download_file(url: &str, dest: &Path) -> Result<()> {
    println!("Downloading {}...", url);
    run_cmd(Command::new("curl").args(["-L", "-o"]).arg(dest).arg(url))
}

/// Copy directory recursively
fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Build WASM for web deployment
fn build_web(dev: bool) -> Result<()> {
    let root = project_root()?;
    let dist = root.join("dist/web");

    println!("Building WASM...");
    run_cmd(
        Command::new("cargo")
            .current_dir(&root)
            .args(["build", "--release", "--target", "wasm32-unknown-unknown"]),
    )?;

    if dist.exists() {
        std::fs::remove_dir_all(&dist)?;
    }
    std::fs::create_dir_all(&dist)?;

    println!("Copying files to dist/web...");
    std::fs::copy(
        root.join("target/wasm32-unknown-unknown/release").join(WASM_NAME),
        dist.join(WASM_NAME),
    )
    .with_context(|| format!("missing {}", WASM_NAME))?;
    std::fs::copy(root.join("web/index.html"), dist.join("index.html")).context("missing web/index.html")?;

    let mq_js = dist.join("mq_js_bundle.js");
    if !mq_js.exists() {
        download_file(
            "https://raw.githubusercontent.com/not-fl3/macroquad/v0.4.14/js/mq_js_bundle.js",
            &mq_js,
        )?;
    }

    let assets = root.join("assets");
    if assets.exists() {
        copy_dir_recursive(&assets, &dist.join("assets"))?;
    } else {
        println!("No assets/ directory; textures will draw as placeholders");
    }

    if dev {
        println!("Applying DEV build modifications...");
        let index_path = dist.join("index.html");
        let index = std::fs::read_to_string(&index_path)?;
        std::fs::write(&index_path, index.replace("<title>Stardrift", "<title>[DEV] Stardrift"))?;
    }

    println!("Web build complete: dist/web/");
    Ok(())
}

/// Create zip for itch.io
fn package_itch() -> Result<()> {
    build_web(false)?;

    let dist = project_root()?.join("dist");
    let zip_path = dist.join("stardrift-itch.zip");
    if zip_path.exists() {
        std::fs::remove_file(&zip_path)?;
    }

    println!("Creating itch.io zip...");
    run_cmd(
        Command::new("zip")
            .current_dir(dist.join("web"))
            .args(["-r", "../stardrift-itch.zip", "."]),
    )?;

    println!("itch.io package ready: dist/stardrift-itch.zip");
    Ok(())
}
