//! Tool registry integration tests
//!
//! Drive the registry the way the agent session does: by tool name with a
//! JSON argument blob, against a canned package backend.

mod support;

use license_assistant::tools::{Severity, ToolContext, ToolKind, ToolRegistry};
use serde_json::json;
use std::sync::Arc;
use support::{FakeRpm, PackageFiles};

fn registry_with(fake: Arc<FakeRpm>, kinds: &[ToolKind]) -> ToolRegistry {
    let context = Arc::new(ToolContext::new(fake));
    ToolRegistry::with_tools(context, kinds).unwrap()
}

#[tokio::test]
async fn test_list_contents_tags_entries() {
    let files = PackageFiles::new();
    let registry = registry_with(Arc::new(FakeRpm::tool()), &ToolKind::PACKAGE_REVIEW);

    let output = registry
        .invoke(
            "rpm_file_list",
            &json!({"rpm_file": files.rpm_str(), "search_dir": "/usr", "max_depth": 0}).to_string(),
        )
        .await
        .unwrap();

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(
        lines,
        vec![
            "file:/usr/bin/tool",
            "doc:/usr/share/doc/tool/README",
            "license:/usr/share/licenses/tool/LICENSE",
        ]
    );
}

#[tokio::test]
async fn test_list_contents_is_cached() {
    let files = PackageFiles::new();
    let fake = Arc::new(FakeRpm::tool());
    let registry = registry_with(Arc::clone(&fake), &ToolKind::PACKAGE_REVIEW);
    let args = json!({"rpm_file": files.rpm_str(), "search_dir": "/usr", "max_depth": 2}).to_string();

    let first = registry.invoke("rpm_file_list", &args).await.unwrap();
    let queries_after_first = fake.query_count();
    let second = registry.invoke("rpm_file_list", &args).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fake.query_count(), queries_after_first);
    assert_eq!(registry.context().rpm().cache().len(), 1);
    assert!(first.contains("doc:/usr/share/doc/..."));
    assert!(first.contains("license:/usr/share/licenses/..."));
}

#[tokio::test]
async fn test_list_contents_empty_directory() {
    let files = PackageFiles::new();
    let registry = registry_with(Arc::new(FakeRpm::tool()), &ToolKind::PACKAGE_REVIEW);

    let output = registry
        .invoke(
            "rpm_file_list",
            &json!({"rpm_file": files.rpm_str(), "search_dir": "/opt"}).to_string(),
        )
        .await
        .unwrap();

    assert_eq!(output, "No files found under /opt");
}

#[tokio::test]
async fn test_name_and_dependencies() {
    let files = PackageFiles::new();
    let registry = registry_with(Arc::new(FakeRpm::tool()), &ToolKind::PACKAGE_REVIEW);
    let args = json!({"rpm_file": files.rpm_str()}).to_string();

    assert_eq!(registry.invoke("rpm_name", &args).await.unwrap(), "tool");

    let deps = registry.invoke("rpm_dependency_info", &args).await.unwrap();
    let lines: Vec<&str> = deps.lines().collect();
    assert_eq!(
        lines,
        vec![
            "provides:tool = 1.0-1",
            "provides:tool(x86-64) = 1.0-1",
            "requires:/bin/sh",
            "requires:libc.so.6()(64bit)",
        ]
    );
}

#[tokio::test]
async fn test_read_file_truncates() {
    let files = PackageFiles::new();
    let registry = registry_with(Arc::new(FakeRpm::tool()), &ToolKind::PACKAGE_REVIEW);

    let output = registry
        .invoke(
            "rpm_read_file",
            &json!({
                "rpm_file": files.rpm_str(),
                "file_path": "/usr/share/licenses/tool/LICENSE",
                "max_lines": 3
            })
            .to_string(),
        )
        .await
        .unwrap();

    assert_eq!(output, "MIT License\n\nCopyright (c) 2024 Tool Authors\n");
}

#[tokio::test]
async fn test_read_binary_file_reports_error() {
    let files = PackageFiles::new();
    let registry = registry_with(Arc::new(FakeRpm::tool()), &ToolKind::PACKAGE_REVIEW);

    let output = registry
        .invoke(
            "rpm_read_file",
            &json!({"rpm_file": files.rpm_str(), "file_path": "/usr/bin/tool"}).to_string(),
        )
        .await
        .unwrap();

    assert!(output.contains("/usr/bin/tool"), "got: {}", output);
    assert!(!output.contains("ELF"));
}

#[tokio::test]
async fn test_read_file_rejects_parent_segments() {
    let files = PackageFiles::new();
    let registry = registry_with(Arc::new(FakeRpm::tool()), &ToolKind::PACKAGE_REVIEW);

    let output = registry
        .invoke(
            "rpm_read_file",
            &json!({"rpm_file": files.rpm_str(), "file_path": "../../../../../../etc/hostname"})
                .to_string(),
        )
        .await
        .unwrap();

    assert!(output.contains("cannot go outside"), "got: {}", output);
}

#[tokio::test]
async fn test_missing_archive_is_reported_as_output() {
    let registry = registry_with(Arc::new(FakeRpm::tool()), &ToolKind::PACKAGE_REVIEW);

    let output = registry
        .invoke(
            "rpm_name",
            &json!({"rpm_file": "/nonexistent/tool-9.9-1.x86_64.rpm"}).to_string(),
        )
        .await
        .unwrap();

    assert!(output.starts_with("File not found:"), "got: {}", output);
}

#[tokio::test]
async fn test_malformed_arguments_are_reported_as_output() {
    let registry = registry_with(Arc::new(FakeRpm::tool()), &ToolKind::PACKAGE_REVIEW);

    let output = registry.invoke("rpm_name", "{not json").await.unwrap();
    assert!(output.contains("Invalid arguments for tool 'rpm_name'"));

    let output = registry
        .invoke("rpm_name", &json!({"rpm_file": "a.rpm", "bogus": 1}).to_string())
        .await
        .unwrap();
    assert!(output.contains("Invalid arguments for tool 'rpm_name'"));
}

#[tokio::test]
async fn test_unregistered_tool_is_an_error() {
    let registry = registry_with(Arc::new(FakeRpm::tool()), &ToolKind::PACKAGE_REVIEW);

    let result = registry.invoke("srpm_explore_files", "{}").await;
    assert!(result.is_err());
    assert_eq!(
        result.unwrap_err().to_string(),
        "Function not found: srpm_explore_files"
    );
}

#[tokio::test]
async fn test_declare_issue_records_finding() {
    let files = PackageFiles::new();
    let registry = registry_with(Arc::new(FakeRpm::tool()), &ToolKind::PACKAGE_REVIEW);

    let output = registry
        .invoke(
            "declare_license_issue",
            &json!({
                "file": files.rpm_str(),
                "has_issue": true,
                "severity": "medium",
                "description": "vendored json library license not shipped"
            })
            .to_string(),
        )
        .await
        .unwrap();
    assert!(output.starts_with("Assessment recorded for"));

    let findings = registry.context().findings().snapshot();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Medium);
    assert_eq!(
        findings[0].summary_line(),
        "tool-1.0-1.x86_64.rpm: [medium] vendored json library license not shipped"
    );
}

#[tokio::test]
async fn test_inconsistent_assessment_is_rejected() {
    let files = PackageFiles::new();
    let registry = registry_with(Arc::new(FakeRpm::tool()), &ToolKind::PACKAGE_REVIEW);

    let output = registry
        .invoke(
            "declare_license_issue",
            &json!({"file": files.rpm_str(), "has_issue": true, "severity": "none"}).to_string(),
        )
        .await
        .unwrap();

    assert!(output.starts_with("Invalid assessment:"), "got: {}", output);
    assert!(registry.context().findings().is_empty());
}

#[tokio::test]
async fn test_source_tree_tools() {
    let files = PackageFiles::new();
    let build = files.build_tree();
    let context = Arc::new(ToolContext::new(Arc::new(FakeRpm::tool())).with_build_root(build));
    let registry = ToolRegistry::with_tools(
        context,
        &[ToolKind::SrpmExploreFiles, ToolKind::SrpmReadFile],
    )
    .unwrap();

    let listing = registry
        .invoke(
            "srpm_explore_files",
            &json!({"srpm_file": files.srpm_str(), "search_dir": "tool-1.0", "max_depth": 1})
                .to_string(),
        )
        .await
        .unwrap();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines, vec!["file:COPYING", "file:main.c", "dir:vendor/"]);

    let license = registry
        .invoke(
            "srpm_read_file",
            &json!({"srpm_file": files.srpm_str(), "file_path": "tool-1.0/vendor/json/LICENSE"})
                .to_string(),
        )
        .await
        .unwrap();
    assert_eq!(license, "BSD-3-Clause\n");
}

#[tokio::test]
async fn test_traversal_is_rejected() {
    let files = PackageFiles::new();
    let build = files.build_tree();
    let context = Arc::new(ToolContext::new(Arc::new(FakeRpm::tool())).with_build_root(build));
    let registry = ToolRegistry::with_tools(
        context,
        &[ToolKind::SrpmExploreFiles, ToolKind::SrpmReadFile],
    )
    .unwrap();

    for (tool, args) in [
        (
            "srpm_explore_files",
            json!({"srpm_file": files.srpm_str(), "search_dir": "../.."}),
        ),
        (
            "srpm_read_file",
            json!({"srpm_file": files.srpm_str(), "file_path": "tool-1.0/../../tool.spec"}),
        ),
    ] {
        let output = registry.invoke(tool, &args.to_string()).await.unwrap();
        assert!(
            output.contains("cannot go outside the build directory"),
            "{} returned: {}",
            tool,
            output
        );
    }
}

#[tokio::test]
async fn test_spec_is_read_once_unless_forced() {
    let files = PackageFiles::new();
    let registry = registry_with(Arc::new(FakeRpm::tool()), &ToolKind::PACKAGE_REVIEW);
    let spec = files.spec.to_string_lossy().into_owned();

    let first = registry
        .invoke("spec_contents", &json!({"spec_file": spec}).to_string())
        .await
        .unwrap();
    assert_eq!(first, "Name: tool\nLicense: MIT\n");

    let second = registry
        .invoke("spec_contents", &json!({"spec_file": spec}).to_string())
        .await
        .unwrap();
    assert!(second.contains("has already been read"));

    let forced = registry
        .invoke("spec_contents", &json!({"spec_file": spec, "force": true}).to_string())
        .await
        .unwrap();
    assert_eq!(forced, first);
}
