//! Integration tests for depdoc

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const TOKEN_ENV: &str = "DEPDOC_IT_TOKEN";

    fn depdoc() -> Command {
        let mut cmd = cargo_bin_cmd!("depdoc");
        cmd.env_remove("DEPDOC_CONFIG");
        cmd
    }

    /// Write a config pointing every remote at `base_url` and the cache into `dir`
    fn write_config(dir: &Path, base_url: &str) -> PathBuf {
        let path = dir.join("config.toml");
        let content = format!(
            r#"
[github]
api_url = "{base}/graphql"
token_env = "{token}"
use_gh_cli = false

[cache]
path = "{cache}"

[registries.npm]
url = "{base}/npm/{{name}}"
source_fields = ["/repository/url"]
"#,
            base = base_url,
            token = TOKEN_ENV,
            cache = dir.join("source-urls.json").display(),
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    fn with_config(dir: &TempDir, base_url: &str) -> Command {
        let config = write_config(dir.path(), base_url);
        let mut cmd = depdoc();
        cmd.arg("--no-local").arg("-c").arg(config);
        cmd
    }

    #[test]
    fn help_displays() {
        depdoc()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("find unmaintained dependencies"));
    }

    #[test]
    fn version_displays() {
        depdoc()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("depdoc"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "http://127.0.0.1:1")
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "http://127.0.0.1:1")
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[diagnose]"))
            .stdout(predicate::str::contains("DEPDOC_IT_TOKEN"));
    }

    #[test]
    fn package_managers_lists_builtins() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "http://127.0.0.1:1")
            .arg("package-managers")
            .assert()
            .success()
            .stdout(predicate::str::contains("bundler"))
            .stdout(predicate::str::contains("npm"))
            .stdout(predicate::str::contains("127.0.0.1"));
    }

    #[test]
    fn cache_show_empty() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "http://127.0.0.1:1")
            .args(["cache", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached source URLs"));
    }

    #[test]
    fn diagnose_without_token_fails() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "http://127.0.0.1:1")
            .env_remove(TOKEN_ENV)
            .args(["diagnose", "-p", "npm", "-f", "deps.txt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("GitHub access token not found"));
    }

    #[test]
    fn diagnose_unknown_package_manager_fails() {
        let dir = TempDir::new().unwrap();
        with_config(&dir, "http://127.0.0.1:1")
            .env(TOKEN_ENV, "test-token")
            .args(["diagnose", "-p", "maven", "-f", "deps.txt"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown package manager: maven"))
            .stderr(predicate::str::contains("bundler, cargo"));
    }

    #[test]
    fn diagnose_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");
        with_config(&dir, "http://127.0.0.1:1")
            .env(TOKEN_ENV, "test-token")
            .args(["diagnose", "-p", "npm", "-f"])
            .arg(&missing)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Can't open:"));
    }

    mod diagnose {
        use super::*;
        use httpmock::prelude::*;
        use serde_json::json;

        fn search_response() -> serde_json::Value {
            json!({
                "data": {
                    "search": {
                        "repositoryCount": 2,
                        "nodes": [
                            {
                                "isArchived": true,
                                "url": "https://github.com/stevemao/left-pad",
                                "name": "left-pad",
                                "owner": { "login": "stevemao" },
                                "defaultBranchRef": { "target": { "history": {
                                    "edges": [{ "node": { "committedDate": "2018-04-09T00:00:00Z" } }]
                                } } }
                            },
                            {
                                "isArchived": false,
                                "url": "https://github.com/then/promise",
                                "name": "promise",
                                "owner": { "login": "then" },
                                "defaultBranchRef": { "target": { "history": {
                                    "edges": [{ "node": { "committedDate": "2099-01-01T00:00:00Z" } }]
                                } } }
                            }
                        ]
                    }
                }
            })
        }

        fn mock_remotes(server: &MockServer) {
            server.mock(|when, then| {
                when.method(GET).path("/npm/left-pad");
                then.status(200).json_body(json!({
                    "repository": { "url": "git+https://github.com/stevemao/left-pad.git" }
                }));
            });
            server.mock(|when, then| {
                when.method(GET).path("/npm/promise");
                then.status(200).json_body(json!({
                    "repository": { "url": "https://github.com/then/promise" }
                }));
            });
            server.mock(|when, then| {
                when.method(GET).path("/npm/gone");
                then.status(404);
            });
            server.mock(|when, then| {
                when.method(POST)
                    .path("/graphql")
                    .header("Authorization", "bearer test-token");
                then.status(200).json_body(search_response());
            });
        }

        fn deps_file(dir: &TempDir) -> PathBuf {
            let path = dir.path().join("deps.txt");
            std::fs::write(&path, "# npm deps\nleft-pad 1.3.0\npromise@8.3.0\ngone\n").unwrap();
            path
        }

        #[test]
        fn reports_each_state_and_fails_on_errors() {
            let server = MockServer::start();
            mock_remotes(&server);
            let dir = TempDir::new().unwrap();
            let deps = deps_file(&dir);

            with_config(&dir, &server.base_url())
                .env(TOKEN_ENV, "test-token")
                .args(["diagnose", "-p", "npm", "-f"])
                .arg(&deps)
                .assert()
                .failure()
                .stdout(predicate::str::contains(
                    "[error] left-pad (archived): https://github.com/stevemao/left-pad",
                ))
                .stdout(predicate::str::contains(
                    "[warn] left-pad (not-maintained): https://github.com/stevemao/left-pad",
                ))
                .stdout(predicate::str::contains("[error] gone:"))
                .stdout(predicate::str::contains("Diagnosis completed! 3 libraries."))
                .stdout(predicate::str::contains("2 error, 1 warn (0 unknown), 0 info (0 ignored)"));

            let cache = std::fs::read_to_string(dir.path().join("source-urls.json")).unwrap();
            assert!(cache.contains("https://github.com/then/promise"));
            assert!(cache.contains("https://github.com/stevemao/left-pad"));
            assert!(!cache.contains("gone"));
        }

        #[test]
        fn ignored_libraries_pass() {
            let server = MockServer::start();
            mock_remotes(&server);
            let dir = TempDir::new().unwrap();
            let deps = deps_file(&dir);

            with_config(&dir, &server.base_url())
                .env(TOKEN_ENV, "test-token")
                .args(["diagnose", "-p", "npm", "-i", "left-pad gone", "-f"])
                .arg(&deps)
                .assert()
                .success()
                .stdout(predicate::str::contains("[info] gone (ignored):"))
                .stdout(predicate::str::contains("[info] left-pad (ignored):"))
                .stdout(predicate::str::contains("0 error, 0 warn (0 unknown), 2 info (2 ignored)"));
        }

        #[test]
        fn json_format() {
            let server = MockServer::start();
            mock_remotes(&server);
            let dir = TempDir::new().unwrap();
            let deps = deps_file(&dir);

            let output = with_config(&dir, &server.base_url())
                .env(TOKEN_ENV, "test-token")
                .args(["diagnose", "-p", "npm", "--format", "json", "-f"])
                .arg(&deps)
                .output()
                .unwrap();

            assert!(!output.status.success());
            let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
            let items = report.as_array().unwrap();
            assert_eq!(items.len(), 3);
            assert_eq!(items[0]["name"], "gone");
            assert!(items[0]["error"].as_str().unwrap().contains("404"));
            assert_eq!(items[2]["name"], "promise");
            assert_eq!(items[2]["is_active"], true);
        }
    }
}
