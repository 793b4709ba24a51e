//! File operation tools: directory listing, bounded reads, and writes.

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use walkdir::WalkDir;

use super::error::{ToolError, ToolResult};
use super::schema::{ParamKind, ParamSpec, ToolArgs};
use super::{Tool, ToolContext, ToolName};

/// Maximum number of characters returned by a single read.
pub const MAX_READ_CHARS: usize = 10_000;

/// List the immediate entries of a directory.
pub struct ListDirectory;

const LIST_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "directory",
    kind: ParamKind::String,
    description: "The directory to list files from, relative to the working directory. If not provided, lists files in the working directory itself.",
    required: false,
}];

#[async_trait]
impl Tool for ListDirectory {
    fn name(&self) -> ToolName {
        ToolName::ListDirectory
    }

    fn description(&self) -> &str {
        "Lists files in the specified directory along with their sizes, constrained to the working directory."
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        LIST_PARAMS
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> ToolResult {
        let directory = args.opt_str("directory").unwrap_or(".");
        let target = ctx.root().resolve(directory, "list")?;

        if !target.is_dir() {
            return Err(ToolError::NotFound(format!(
                "\"{}\" is not a directory",
                directory
            )));
        }

        let mut lines = Vec::new();
        for entry in WalkDir::new(&target)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| ToolError::IoFailure(e.to_string()))?;
            let name = entry.file_name().to_string_lossy();
            // symlinks are not followed; they report their own size
            match entry.metadata().ok() {
                Some(meta) if meta.is_dir() => lines.push(format!("- {}: is_dir=true", name)),
                Some(meta) => lines.push(format!(
                    "- {}: file_size={} bytes, is_dir=false",
                    name,
                    meta.len()
                )),
                None => lines.push(format!("- {}: unreadable", name)),
            }
        }

        if lines.is_empty() {
            return Ok(format!("Directory \"{}\" is empty.", directory));
        }
        Ok(lines.join("\n"))
    }
}

/// Read a file, truncated to [`MAX_READ_CHARS`] characters.
pub struct ReadFile;

const READ_PARAMS: &[ParamSpec] = &[ParamSpec {
    name: "file_path",
    kind: ParamKind::String,
    description: "The path to the file to read, relative to the working directory.",
    required: true,
}];

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> ToolName {
        ToolName::ReadFile
    }

    fn description(&self) -> &str {
        "Reads and returns the content of a file, constrained to the working directory."
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        READ_PARAMS
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> ToolResult {
        let file_path = args.str("file_path")?;
        let target = ctx.root().resolve(file_path, "read")?;

        if !target.is_file() {
            return Err(ToolError::NotFound(format!(
                "File not found or is not a regular file: \"{}\"",
                file_path
            )));
        }

        // A char is at most 4 bytes; one extra char is enough to detect truncation.
        let byte_budget = ((MAX_READ_CHARS + 1) * 4) as u64;
        let mut bytes = Vec::new();
        tokio::fs::File::open(&target)
            .await
            .map_err(|e| ToolError::IoFailure(format!("reading \"{}\": {}", file_path, e)))?
            .take(byte_budget)
            .read_to_end(&mut bytes)
            .await
            .map_err(|e| ToolError::IoFailure(format!("reading \"{}\": {}", file_path, e)))?;

        let text = String::from_utf8_lossy(&bytes);
        let (mut content, truncated) = truncate_chars(&text, MAX_READ_CHARS);
        if truncated {
            content.push_str(&format!(
                "[...File \"{}\" truncated at {} characters]",
                file_path, MAX_READ_CHARS
            ));
        }
        Ok(content)
    }
}

/// Write (or overwrite) a file, creating parent directories as needed.
pub struct WriteFile;

const WRITE_PARAMS: &[ParamSpec] = &[
    ParamSpec {
        name: "file_path",
        kind: ParamKind::String,
        description: "The path to the file to write, relative to the working directory.",
        required: true,
    },
    ParamSpec {
        name: "content",
        kind: ParamKind::String,
        description: "The content to write to the file.",
        required: true,
    },
];

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> ToolName {
        ToolName::WriteFile
    }

    fn description(&self) -> &str {
        "Writes or overwrites content to a file, constrained to the working directory. Creates parent directories if needed."
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        WRITE_PARAMS
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> ToolResult {
        let file_path = args.str("file_path")?;
        let content = args.str("content")?;
        let target = ctx.root().resolve(file_path, "write to")?;

        if target.is_dir() {
            return Err(ToolError::IoFailure(format!(
                "\"{}\" is a directory",
                file_path
            )));
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ToolError::IoFailure(format!("creating parent of \"{}\": {}", file_path, e))
            })?;
        }

        tokio::fs::write(&target, content)
            .await
            .map_err(|e| ToolError::IoFailure(format!("writing \"{}\": {}", file_path, e)))?;

        Ok(format!(
            "Successfully wrote to \"{}\" ({} characters written)",
            file_path,
            content.chars().count()
        ))
    }
}

/// First `max` characters of `s`, and whether anything was cut.
fn truncate_chars(s: &str, max: usize) -> (String, bool) {
    match s.char_indices().nth(max) {
        Some((idx, _)) => (s[..idx].to_string(), true),
        None => (s.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    use crate::tools::SandboxRoot;

    fn context() -> (TempDir, ToolContext) {
        let tmp = TempDir::new().unwrap();
        let ctx = ToolContext::new(SandboxRoot::new(tmp.path()).unwrap());
        (tmp, ctx)
    }

    async fn call(tool: &dyn Tool, ctx: &ToolContext, args: Value) -> ToolResult {
        let args = ToolArgs::validate(tool.parameters(), args.as_object().unwrap()).unwrap();
        tool.execute(&args, ctx).await
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo", 2), ("hé".to_string(), true));
        assert_eq!(truncate_chars("héllo", 5), ("héllo".to_string(), false));
    }

    #[tokio::test]
    async fn lists_entries_sorted_with_sizes() {
        let (tmp, ctx) = context();
        std::fs::write(tmp.path().join("b.py"), "print(1)").unwrap();
        std::fs::write(tmp.path().join("a.txt"), "").unwrap();
        std::fs::create_dir(tmp.path().join("pkg")).unwrap();

        let out = call(&ListDirectory, &ctx, json!({})).await.unwrap();
        assert_eq!(
            out,
            "- a.txt: file_size=0 bytes, is_dir=false\n\
             - b.py: file_size=8 bytes, is_dir=false\n\
             - pkg: is_dir=true"
        );
    }

    #[tokio::test]
    async fn listing_missing_or_file_target_is_not_found() {
        let (tmp, ctx) = context();
        std::fs::write(tmp.path().join("a.txt"), "x").unwrap();

        let err = call(&ListDirectory, &ctx, json!({ "directory": "nope" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
        let err = call(&ListDirectory, &ctx, json!({ "directory": "a.txt" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[tokio::test]
    async fn listing_outside_root_is_a_violation() {
        let (_tmp, ctx) = context();
        let err = call(&ListDirectory, &ctx, json!({ "directory": "../" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));
    }

    #[tokio::test]
    async fn read_at_cap_is_not_truncated() {
        let (tmp, ctx) = context();
        let body = "x".repeat(MAX_READ_CHARS);
        std::fs::write(tmp.path().join("exact.txt"), &body).unwrap();

        let out = call(&ReadFile, &ctx, json!({ "file_path": "exact.txt" }))
            .await
            .unwrap();
        assert_eq!(out, body);
    }

    #[tokio::test]
    async fn read_past_cap_is_truncated_with_marker() {
        let (tmp, ctx) = context();
        std::fs::write(tmp.path().join("long.txt"), "y".repeat(MAX_READ_CHARS + 1)).unwrap();

        let out = call(&ReadFile, &ctx, json!({ "file_path": "long.txt" }))
            .await
            .unwrap();
        let marker = "[...File \"long.txt\" truncated at 10000 characters]";
        assert!(out.ends_with(marker));
        assert_eq!(&out[..out.len() - marker.len()], "y".repeat(MAX_READ_CHARS));
    }

    #[tokio::test]
    async fn read_multibyte_content_counts_characters() {
        let (tmp, ctx) = context();
        std::fs::write(tmp.path().join("wide.txt"), "é".repeat(MAX_READ_CHARS)).unwrap();

        let out = call(&ReadFile, &ctx, json!({ "file_path": "wide.txt" }))
            .await
            .unwrap();
        assert_eq!(out.chars().count(), MAX_READ_CHARS);
    }

    #[tokio::test]
    async fn read_missing_or_directory_is_not_found() {
        let (tmp, ctx) = context();
        std::fs::create_dir(tmp.path().join("pkg")).unwrap();

        for path in ["missing.txt", "pkg"] {
            let err = call(&ReadFile, &ctx, json!({ "file_path": path }))
                .await
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("File not found or is not a regular file: \"{}\"", path)
            );
        }
    }

    #[tokio::test]
    async fn read_outside_root_does_not_reveal_existence() {
        let (_tmp, ctx) = context();
        let existing = call(&ReadFile, &ctx, json!({ "file_path": "/etc/hostname" }))
            .await
            .unwrap_err();
        let missing = call(&ReadFile, &ctx, json!({ "file_path": "../does/not/exist" }))
            .await
            .unwrap_err();
        assert!(matches!(existing, ToolError::SandboxViolation { .. }));
        assert!(matches!(missing, ToolError::SandboxViolation { .. }));
    }

    #[tokio::test]
    async fn write_creates_parents_and_round_trips() {
        let (tmp, ctx) = context();
        let content = "line one\nlíne two\n";

        let out = call(
            &WriteFile,
            &ctx,
            json!({ "file_path": "deep/nested/notes.txt", "content": content }),
        )
        .await
        .unwrap();
        assert_eq!(
            out,
            format!(
                "Successfully wrote to \"deep/nested/notes.txt\" ({} characters written)",
                content.chars().count()
            )
        );

        let back = call(&ReadFile, &ctx, json!({ "file_path": "deep/nested/notes.txt" }))
            .await
            .unwrap();
        assert_eq!(back, content);
        assert!(tmp.path().join("deep/nested").is_dir());
    }

    #[tokio::test]
    async fn write_overwrites_in_full() {
        let (tmp, ctx) = context();
        std::fs::write(tmp.path().join("f.txt"), "a much longer original body").unwrap();

        call(&WriteFile, &ctx, json!({ "file_path": "f.txt", "content": "short" }))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(tmp.path().join("f.txt")).unwrap(), "short");
    }

    #[tokio::test]
    async fn write_outside_root_has_no_side_effect() {
        let outside = TempDir::new().unwrap();
        let (tmp, ctx) = context();
        let escape = format!(
            "../{}/pwned.txt",
            outside.path().file_name().unwrap().to_string_lossy()
        );
        // Only meaningful when both temp dirs share a parent.
        assert_eq!(outside.path().parent(), tmp.path().parent());

        let err = call(&WriteFile, &ctx, json!({ "file_path": escape, "content": "x" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));
        assert!(!outside.path().join("pwned.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn write_through_dangling_symlink_is_rejected() {
        let outside = TempDir::new().unwrap();
        let (tmp, ctx) = context();
        std::os::unix::fs::symlink(outside.path().join("pwned.txt"), tmp.path().join("link.txt"))
            .unwrap();
        std::os::unix::fs::symlink(outside.path().join("gone"), tmp.path().join("out")).unwrap();

        let err = call(&WriteFile, &ctx, json!({ "file_path": "link.txt", "content": "owned" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));
        assert!(!outside.path().join("pwned.txt").exists());

        let nested = json!({ "file_path": "out/nested/a.txt", "content": "owned" });
        let err = call(&WriteFile, &ctx, nested).await.unwrap_err();
        assert!(matches!(err, ToolError::SandboxViolation { .. }));
        assert!(!outside.path().join("gone").exists());
    }

    #[tokio::test]
    async fn write_onto_directory_is_io_failure() {
        let (tmp, ctx) = context();
        std::fs::create_dir(tmp.path().join("pkg")).unwrap();

        let err = call(&WriteFile, &ctx, json!({ "file_path": "pkg", "content": "x" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::IoFailure(_)));
    }
}
