// src/digest/language.rs
// Labels attached to fetched files: a syntax-highlighting language derived
// from the extension, and a human readable size.

pub fn language_for_path(path: &str) -> &'static str {
    // Whatever follows the last '.', like "Makefile" -> "makefile"
    let extension = path.rsplit('.').next().unwrap_or_default().to_lowercase();

    match extension.as_str() {
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "py" => "python",
        "html" => "html",
        "css" => "css",
        "scss" => "scss",
        "json" => "json",
        "md" => "markdown",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" => "cpp",
        "cs" => "csharp",
        "go" => "go",
        "rb" => "ruby",
        "php" => "php",
        "sh" => "bash",
        "yaml" | "yml" => "yaml",
        "xml" => "xml",
        "sql" => "sql",
        "swift" => "swift",
        "kt" => "kotlin",
        "rs" => "rust",
        "toml" => "toml",
        _ => "plaintext",
    }
}

pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}
