use anyhow::{bail, Context, Result};
use std::fmt::Write as FmtWrite;
use std::io::Write;
use std::path::Path;

use crate::config::RedactedConfig;
use crate::oci::{ListObjectsResponse, ObjectStorageClient, ObjectSummary, LISTING_FIELDS};
use crate::transport::RequestOutcome;

/// Characters of a failed response body shown in error messages
const ERROR_SNIPPET_CHARS: usize = 200;

// ============================================================================
// Commands
// ============================================================================

/// Upload command
pub async fn cmd_put(client: &ObjectStorageClient, file: &str, name: Option<&str>) -> Result<()> {
    let outcome = client
        .put_file(file, name)
        .await
        .with_context(|| format!("Failed to upload {}", file))?;
    ensure_success(&outcome, "Upload")?;

    let object_name = match name {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => base_name(file).to_string(),
    };
    let size = tokio::fs::metadata(file).await.map(|m| m.len()).unwrap_or(0);

    println!("{} -> {} ({})", file, object_name, format_bytes_compact(size));
    if let Some(etag) = &outcome.metadata().etag {
        println!("ETag: {}", etag);
    }

    Ok(())
}

/// Download command; `-` writes to stdout
pub async fn cmd_get(client: &ObjectStorageClient, object: &str, output: Option<&str>) -> Result<()> {
    let outcome = client
        .get(object)
        .await
        .with_context(|| format!("Failed to download {}", object))?;
    ensure_success(&outcome, "Download")?;

    let body: &[u8] = outcome.body().map(|b| &b[..]).unwrap_or_default();
    let target = output.unwrap_or_else(|| base_name(object));

    if target == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(body)?;
        stdout.flush()?;
        return Ok(());
    }

    tokio::fs::write(target, body)
        .await
        .with_context(|| format!("Failed to write {}", target))?;
    println!("{} -> {} ({})", object, target, format_bytes_compact(body.len() as u64));

    Ok(())
}

/// Remove command
pub async fn cmd_rm(client: &ObjectStorageClient, object: &str, force: bool) -> Result<()> {
    if !force {
        print!("Delete {}? [y/N]: ", object);
        std::io::stdout().flush()?;
        use std::io::BufRead;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        if !line.trim().eq_ignore_ascii_case("y") {
            println!("Delete cancelled");
            return Ok(());
        }
    }

    let outcome = client
        .delete(object)
        .await
        .with_context(|| format!("Failed to delete {}", object))?;
    ensure_success(&outcome, "Delete")?;
    println!("Deleted: {}", object);

    Ok(())
}

/// List command
pub async fn cmd_ls(client: &ObjectStorageClient, prefix: &str, limit: u32, all: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    let mut line_buf = String::with_capacity(256);
    let mut total_entries = 0usize;
    let mut start: Option<String> = None;

    loop {
        let outcome = client
            .list_page(prefix, limit, start.as_deref(), &LISTING_FIELDS)
            .await
            .context("Failed to list objects")?;
        ensure_success(&outcome, "List")?;

        let page = ListObjectsResponse::from_outcome(&outcome)
            .context("List response is not valid JSON")?;

        for object in &page.objects {
            line_buf.clear();
            write_listing_line(&mut line_buf, object);
            writeln!(out, "{}", line_buf)?;
            total_entries += 1;
        }
        for common in &page.prefixes {
            writeln!(out, "{:>8}  {}", "PRE", common)?;
        }

        match page.next_start_with {
            Some(next) if all => start = Some(next),
            _ => break,
        }
    }

    out.flush()?;
    drop(out);

    if total_entries == 0 {
        println!("No objects found");
    }

    Ok(())
}

/// Connection probe; fails the process when the bucket is unreachable
pub async fn cmd_test(client: &ObjectStorageClient) -> Result<()> {
    let status = client.test_connection().await;
    println!("{}", status.message());

    if let Some(details) = status.details() {
        println!("HTTP status: {}", details.status());
        if let Some(request_id) = &details.metadata().request_id {
            println!("Request ID: {}", request_id);
        }
        if !details.success() {
            println!("{}", details.body_snippet(ERROR_SNIPPET_CHARS));
        }
    }

    if !status.success() {
        bail!("{}", status.message());
    }
    Ok(())
}

/// Print the configuration as JSON, without key file or key material
pub fn cmd_config(config: &RedactedConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config)
        .context("Failed to serialize configuration")?;
    println!("{}", json);
    Ok(())
}

// ============================================================================
// Utility functions
// ============================================================================

fn ensure_success(outcome: &RequestOutcome, action: &str) -> Result<()> {
    if outcome.success() {
        return Ok(());
    }
    bail!(
        "{} failed: HTTP {}: {}",
        action,
        outcome.status(),
        outcome.body_snippet(ERROR_SNIPPET_CHARS)
    )
}

/// Last path segment of a local path or object name
pub fn base_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

/// Format bytes in compact form (0B, 1.0KiB, 10MiB, etc.)
pub fn format_bytes_compact(bytes: u64) -> String {
    let mut buf = String::with_capacity(8);
    write_bytes_compact(&mut buf, bytes);
    buf
}

fn write_bytes_compact(w: &mut dyn std::fmt::Write, bytes: u64) {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

    if bytes == 0 {
        let _ = w.write_str("0B");
        return;
    }

    let bytes_f64 = bytes as f64;
    let exponent = (bytes_f64.ln() / 1024_f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);

    let value = bytes_f64 / 1024_f64.powi(exponent as i32);

    if exponent == 0 {
        let _ = write!(w, "{}B", bytes);
    } else if value >= 10.0 {
        let _ = write!(w, "{:.0}{}", value, UNITS[exponent]);
    } else {
        let _ = write!(w, "{:.1}{}", value, UNITS[exponent]);
    }
}

/// `[2024-01-05 10:00:00 UTC]    12KiB  logs/a.txt`; size and time are
/// blank when the service did not return them
fn write_listing_line(w: &mut String, object: &ObjectSummary) {
    match object.time_created.as_deref().and_then(|t| t.split_once('T')) {
        Some((date, rest)) => {
            let time = rest.get(..8).unwrap_or_else(|| rest.trim_end_matches('Z'));
            let _ = write!(w, "[{} {} UTC] ", date, time);
        }
        None => {
            let _ = write!(w, "{:26}", "");
        }
    }

    let mut size = String::with_capacity(8);
    if let Some(bytes) = object.size {
        write_bytes_compact(&mut size, bytes);
    }
    let _ = write!(w, "{:>8}  {}", size, object.name);
}
