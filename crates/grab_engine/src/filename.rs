use sha2::{Digest, Sha256};

/// Windows-safe, deterministic filename for one downloaded video:
/// `video_{index}--{short_hash(url)}.{ext}`.
pub fn video_filename(index: Option<usize>, url: &str, extension: &str) -> String {
    let hash = short_hash(url);
    match index {
        Some(index) => format!("video_{index:04}--{hash}.{extension}"),
        None => format!("video--{hash}.{extension}"),
    }
}

/// Deterministic name for a ZIP bundle, keyed by the bundled URLs so the
/// same selection always lands on the same file.
pub fn zip_filename(label: Option<&str>, urls: &[String]) -> String {
    let base = sanitize(label.unwrap_or("bundle"));
    let hash = short_hash(&urls.join("\n"));
    format!("{base}--{hash}.zip")
}

/// Last path segment of a profile URL, typically the `@handle`.
pub fn profile_handle(profile_url: &str) -> Option<String> {
    let parsed = url::Url::parse(profile_url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .next_back()?;
    let cleaned = sanitize(segment);
    if cleaned == "untitled" {
        None
    } else {
        Some(cleaned)
    }
}

/// File extension for a media payload, from its content type when the
/// backend sent one.
pub fn media_extension(content_type: Option<&str>, fallback: &'static str) -> &'static str {
    let ct = match content_type {
        Some(value) => value.split(';').next().unwrap_or(value).trim(),
        None => return fallback,
    };
    match ct {
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        "application/zip" => "zip",
        _ => fallback,
    }
}

/// Cleans a backend-suggested filename for use on the local filesystem.
pub(crate) fn sanitize_media_name(name: &str) -> String {
    sanitize(name)
}

fn sanitize(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "untitled".to_string();
    }
    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    let mut final_name = compacted;
    if final_name.len() > 120 {
        final_name.truncate(120);
    }
    if is_reserved_windows_name(&final_name) {
        final_name.push('_');
    }
    final_name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(stem))
}

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
