use std::path::Path;
use tabd::engine::CompletionEngine;
use tabd_types::{CompleteRequest, Shell, Suggestion, SuggestionKind};
use tempfile::TempDir;

fn request(line: &str, cwd: &Path) -> CompleteRequest {
    CompleteRequest::complete(
        line,
        line.chars().count(),
        cwd.to_string_lossy(),
        Shell::Zsh,
    )
}

fn names(suggestions: &[Suggestion]) -> Vec<&str> {
    suggestions.iter().map(|s| s.name.as_str()).collect()
}

fn engine_in(temp_dir: &TempDir, history_lines: &str, spec_files: &[(&str, &str)]) -> CompletionEngine {
    let history_file = temp_dir.path().join("history");
    std::fs::write(&history_file, history_lines).unwrap();

    let spec_dir = temp_dir.path().join("specs");
    std::fs::create_dir_all(&spec_dir).unwrap();
    for (file_name, contents) in spec_files {
        std::fs::write(spec_dir.join(file_name), contents).unwrap();
    }

    let mut engine = CompletionEngine::new(&history_file);
    engine.initialize(vec![spec_dir]).unwrap();
    engine
}

#[tokio::test]
async fn test_git_subcommand_then_flags() {
    let temp_dir = TempDir::new().unwrap();
    let engine = engine_in(&temp_dir, "", &[]);

    // Subcommand position: names, never flags.
    let result = engine
        .get_completions(&request("git com", temp_dir.path()))
        .await;
    let listed = names(&result);
    assert!(listed.contains(&"commit"));
    assert!(!listed.iter().any(|n| n.starts_with('-')));

    // Flag position: spellings of commit's options plus persistent ones.
    let result = engine
        .get_completions(&request("git commit -", temp_dir.path()))
        .await;
    let listed = names(&result);
    assert!(listed.contains(&"-m"));
    assert!(listed.contains(&"--amend"));
    assert!(listed.contains(&"--no-pager"));
    assert!(result.iter().all(|s| s.kind == SuggestionKind::Option));

    // A free-text option argument offers nothing.
    let result = engine
        .get_completions(&request("git commit -m ", temp_dir.path()))
        .await;
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_user_spec_file_extends_builtins() {
    let deploy = r#"{
        "name": "deploy",
        "description": "Deploy the service",
        "subcommands": [
            {
                "name": "run",
                "args": [
                    {
                        "name": "target",
                        "suggestions": ["alpha", "beta"],
                        "generators": [{"command": "echo gamma; echo delta"}]
                    }
                ]
            },
            {"name": "status"}
        ],
        "options": [
            {
                "names": ["--env"],
                "args": [{"name": "environment", "suggestions": ["prod", "staging"]}]
            }
        ]
    }"#;

    let temp_dir = TempDir::new().unwrap();
    let engine = engine_in(&temp_dir, "", &[("deploy.json", deploy)]);

    // The new command competes in the command-name position.
    let result = engine
        .get_completions(&request("dep", temp_dir.path()))
        .await;
    assert!(names(&result).contains(&"deploy"));

    let result = engine
        .get_completions(&request("deploy ", temp_dir.path()))
        .await;
    assert_eq!(names(&result), vec!["run", "status"]);

    // Static values and generator output blend in the argument position.
    let result = engine
        .get_completions(&request("deploy run ", temp_dir.path()))
        .await;
    let listed = names(&result);
    for expected in ["alpha", "beta", "gamma", "delta"] {
        assert!(listed.contains(&expected), "missing {expected}");
    }

    // The flag's own argument after the flag.
    let result = engine
        .get_completions(&request("deploy --env ", temp_dir.path()))
        .await;
    assert_eq!(names(&result), vec!["prod", "staging"]);
}

#[tokio::test]
async fn test_malformed_spec_file_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let engine = engine_in(
        &temp_dir,
        "",
        &[
            ("broken.json", "{this is not json"),
            ("ok.json", r#"{"name": "frob", "subcommands": [{"name": "nicate"}]}"#),
        ],
    );

    let result = engine
        .get_completions(&request("frob ", temp_dir.path()))
        .await;
    assert_eq!(names(&result), vec!["nicate"]);
}

#[tokio::test]
async fn test_cd_lists_directories_only() {
    let temp_dir = TempDir::new().unwrap();
    let cwd = temp_dir.path().join("project");
    std::fs::create_dir_all(cwd.join("src")).unwrap();
    std::fs::create_dir_all(cwd.join("docs")).unwrap();
    std::fs::write(cwd.join("README.md"), "hi").unwrap();

    let engine = engine_in(&temp_dir, "", &[]);

    let result = engine.get_completions(&request("cd ", &cwd)).await;
    let listed = names(&result);
    assert!(listed.contains(&"docs/"));
    assert!(listed.contains(&"src/"));
    assert!(!listed.contains(&"README.md"));

    // Directories sort ahead of the cd flags.
    assert_eq!(result[0].kind, SuggestionKind::Folder);

    let result = engine.get_completions(&request("cd s", &cwd)).await;
    assert!(names(&result).contains(&"src/"));
    assert!(!names(&result).contains(&"docs/"));
}

#[tokio::test]
async fn test_quoted_partial_path() {
    let temp_dir = TempDir::new().unwrap();
    let cwd = temp_dir.path().join("project");
    std::fs::create_dir_all(cwd.join("my docs")).unwrap();

    let engine = engine_in(&temp_dir, "", &[]);
    let result = engine.get_completions(&request("cd \"my", &cwd)).await;

    assert!(names(&result).contains(&"my docs/"));
}

#[tokio::test]
async fn test_history_completes_unknown_commands() {
    let temp_dir = TempDir::new().unwrap();
    let engine = engine_in(
        &temp_dir,
        "cargo build\ncargo build\ncargo test\n",
        &[],
    );

    let result = engine
        .get_completions(&request("car", temp_dir.path()))
        .await;

    assert!(!result.is_empty());
    assert!(result.iter().all(|s| s.kind == SuggestionKind::History));
    assert!(result[0].name.starts_with("cargo"));
}

#[tokio::test]
async fn test_suggestions_capped_at_fifty() {
    let values: Vec<String> = (0..80).map(|i| format!("\"node{i:02}\"")).collect();
    let many = format!(
        r#"{{"name": "pick", "args": [{{"name": "node", "suggestions": [{}]}}]}}"#,
        values.join(", ")
    );

    let temp_dir = TempDir::new().unwrap();
    let engine = engine_in(&temp_dir, "", &[("pick.json", &many)]);

    let result = engine
        .get_completions(&request("pick ", temp_dir.path()))
        .await;
    assert_eq!(result.len(), 50);
}

#[tokio::test]
async fn test_cursor_position_limits_the_line() {
    let temp_dir = TempDir::new().unwrap();
    let engine = engine_in(&temp_dir, "", &[]);

    let mut req = request("git checkout --force", temp_dir.path());
    req.cursor_position = 6; // right after "git ch"
    let result = engine.get_completions(&req).await;

    assert!(names(&result).contains(&"checkout"));
    assert!(!names(&result).contains(&"--force"));
}
