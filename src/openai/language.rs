//! Maps a source file to the language key used to pick prompts.

/// Extension keys that have a dedicated prompt.
const KNOWN: &[&str] = &[
    "py", "js", "ts", "java", "cpp", "c", "go", "rs", "php", "rb", "html", "css", "sql", "sh", "md", "json", "yaml",
    "yml", "mod", "sum",
];

/// Lower-cased text after the last dot, if the name has one.
pub fn extension(file_name: &str) -> Option<String> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let (_, ext) = base.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Language key for `file_name`: the extension when it is one we know,
/// otherwise a guess from the content, otherwise `"unknown"`.
pub fn detect(file_name: &str, content: &str) -> String {
    match extension(file_name) {
        Some(ext) if KNOWN.contains(&ext.as_str()) => ext,
        ext => sniff(content)
            .map(str::to_string)
            .or(ext)
            .unwrap_or_else(|| "unknown".to_string()),
    }
}

fn sniff(content: &str) -> Option<&'static str> {
    let trimmed = content.trim_start();
    let first_line = trimmed.lines().next().unwrap_or_default();

    if let Some(shebang) = first_line.strip_prefix("#!") {
        return if shebang.contains("python") {
            Some("py")
        } else if shebang.contains("node") {
            Some("js")
        } else if shebang.contains("ruby") {
            Some("rb")
        } else if shebang.contains("sh") {
            Some("sh")
        } else {
            None
        };
    }
    if trimmed.starts_with("<?php") {
        return Some("php");
    }
    let head = first_line.to_ascii_lowercase();
    if head.starts_with("<!doctype html") || head.starts_with("<html") {
        return Some("html");
    }
    if (trimmed.starts_with('{') || trimmed.starts_with('['))
        && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
    {
        return Some("json");
    }
    let is_go = trimmed
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("//"))
        .is_some_and(|l| l.starts_with("package ") && !l.ends_with(';'));
    if is_go {
        return Some("go");
    }
    None
}

/// Human-readable name for a language key.
pub fn display_name(key: &str) -> &'static str {
    match key {
        "py" => "Python",
        "js" => "JavaScript",
        "ts" => "TypeScript",
        "java" => "Java",
        "cpp" => "C++",
        "c" => "C",
        "go" => "Go",
        "rs" => "Rust",
        "php" => "PHP",
        "rb" => "Ruby",
        "html" => "HTML",
        "css" => "CSS",
        "sql" => "SQL",
        "sh" => "Shell",
        "md" => "Markdown",
        "json" => "JSON",
        "yaml" | "yml" => "YAML",
        "mod" => "Go module",
        "sum" => "Go checksums",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_parsing() {
        assert_eq!(extension("main.PY").as_deref(), Some("py"));
        assert_eq!(extension("src/lib/app.test.ts").as_deref(), Some("ts"));
        assert_eq!(extension("go.mod").as_deref(), Some("mod"));
        assert_eq!(extension("Makefile"), None);
        assert_eq!(extension("trailing."), None);
        assert_eq!(extension("dir.d/README"), None);
    }

    #[test]
    fn known_extension_wins() {
        assert_eq!(detect("script.py", "#!/bin/bash\necho hi"), "py");
        assert_eq!(detect("config.yml", "a: 1"), "yml");
    }

    #[test]
    fn content_sniffing_fallbacks() {
        assert_eq!(detect("run", "#!/usr/bin/env python3\nprint('x')"), "py");
        assert_eq!(detect("deploy", "#!/bin/bash\nset -e"), "sh");
        assert_eq!(detect("index", "<?php echo 1;"), "php");
        assert_eq!(detect("page", "<!DOCTYPE html>\n<html></html>"), "html");
        assert_eq!(detect("data", "{\"a\": [1, 2]}"), "json");
        assert_eq!(detect("server", "// Package main\npackage main\n\nfunc main() {}"), "go");
        assert_eq!(detect("Main.scala", "object Main"), "scala");
        assert_eq!(detect("NOTES", "just some words"), "unknown");
    }

    #[test]
    fn display_names() {
        assert_eq!(display_name("rs"), "Rust");
        assert_eq!(display_name("yml"), "YAML");
        assert_eq!(display_name("scala"), "Unknown");
    }
}
