//! CLI workflow tests driving the `ft` binary.
//!
//! Scenario-driven: each test builds a tree through the binary in its own
//! sandbox, with config isolated through `FT_CONFIG`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temporary sandbox"),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, contents).expect("failed to write sandbox file");
        path
    }

    fn ft(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_ft"))
            .args(args)
            .current_dir(self.dir.path())
            .env("FT_CONFIG", self.path("config.toml"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to run ft")
    }

    fn ft_ok(&self, args: &[&str]) -> String {
        let output = self.ft(args);
        assert!(
            output.status.success(),
            "ft failed\nargs: {:?}\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
            args,
            output.status,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    fn ft_json(&self, args: &[&str]) -> Value {
        let stdout = self.ft_ok(args);
        serde_json::from_str(&stdout).unwrap_or_else(|err| {
            panic!("ft did not emit JSON\nargs: {args:?}\nerror: {err}\nstdout:\n{stdout}")
        })
    }
}

fn stderr_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stderr).expect("error output is not JSON")
}

fn read_tree(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn build_edit_and_evaluate() {
    let sb = Sandbox::new();
    let tree = sb.path("adults.json");
    let tree_arg = tree.to_str().unwrap();

    let created = sb.ft_json(&["new", tree_arg, "-n", "Adults", "--created-by", "alice", "--json"]);
    assert_eq!(created["name"], "Adults");
    let root_id = created["root_id"].as_str().unwrap().to_string();

    let group = sb.ft_json(&["add-group", tree_arg, "-o", "OR", "--json"]);
    assert_eq!(group["version"], 2);
    let group_id = group["item_id"].as_str().unwrap().to_string();

    sb.ft_ok(&["add-leaf", tree_arg, "-p", &group_id, "-f", "age", "-o", "greater_than_or_equal", "--value", "18"]);
    sb.ft_ok(&["add-leaf", tree_arg, "-p", &group_id, "-f", "user.role", "-o", "equals", "--value", "admin"]);
    let leaf = sb.ft_json(&["add-leaf", tree_arg, "-f", "active", "-o", "equals", "--value", "true", "--json"]);
    assert_eq!(leaf["version"], 5);
    let active_id = leaf["item_id"].as_str().unwrap().to_string();

    let doc = read_tree(&tree);
    assert_eq!(doc["root"]["id"], root_id.as_str());
    assert_eq!(doc["root"]["children"][0]["children"][0]["value"], 18);
    assert_eq!(doc["root"]["children"][0]["children"][1]["value"], "admin");
    assert_eq!(doc["root"]["children"][1]["fieldType"], "boolean");

    let pass = sb.write("pass.json", r#"{"age": 12, "user": {"role": "admin"}, "active": true}"#);
    let fail = sb.write("fail.json", r#"{"age": 12, "user": {"role": "guest"}, "active": true}"#);

    let output = sb.ft(&["eval", tree_arg, "-d", pass.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("PASS  Adults"));

    let output = sb.ft(&["eval", tree_arg, "-d", fail.to_str().unwrap(), "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let verdict: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(verdict["passed"], false);

    // A disabled OR group passes vacuously.
    sb.ft_ok(&["toggle", tree_arg, &group_id[..8]]);
    let output = sb.ft(&["eval", tree_arg, "-d", fail.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(0));

    sb.ft_ok(&["set", tree_arg, &active_id, "--value", "false"]);
    let output = sb.ft(&["eval", tree_arg, "-d", pass.to_str().unwrap(), "--trace"]);
    assert_eq!(output.status.code(), Some(1));
    let trace = String::from_utf8_lossy(&output.stdout);
    assert!(trace.contains("(disabled)"));
    assert!(trace.contains("✗ active equals false"));

    let summary = sb.ft_json(&["show", tree_arg, "-f", "summary", "--json"]);
    assert_eq!(summary["version"], 7);
    assert_eq!(summary["leaves"], 3);
    assert_eq!(summary["disabled"], 1);
    assert_eq!(summary["created_by"], "alice");
}

#[test]
fn rejected_edits_leave_the_file_alone() {
    let sb = Sandbox::new();
    let tree = sb.path("tree.json");
    let tree_arg = tree.to_str().unwrap();
    sb.ft_ok(&["new", tree_arg, "-n", "Empty"]);
    let before = fs::read_to_string(&tree).unwrap();

    let output = sb.ft(&["remove", tree_arg, "root", "--json"]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr_json(&output)["error"]["code"], "INVALID_ARGUMENT");

    let output = sb.ft(&["toggle", tree_arg, "missing-id"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("no item matches 'missing-id'"));

    let output = sb.ft(&["add-group", tree_arg, "-o", "XOR"]);
    assert_eq!(output.status.code(), Some(2));

    assert_eq!(fs::read_to_string(&tree).unwrap(), before);
}

#[test]
fn script_with_undo_and_dry_run() {
    let sb = Sandbox::new();
    let tree = sb.path("tree.json");
    let tree_arg = tree.to_str().unwrap();
    sb.ft_ok(&["new", tree_arg, "-n", "Scripted"]);

    let script = sb.write(
        "edits.ft",
        "# build a small tree\n\
         staff: add-group root OR\n\
         add-leaf staff user.role in [\"admin\", \"owner\"]\n\
         add-leaf staff user.email contains @example.com\n\
         add-leaf root plan equals free\n\
         undo\n",
    );
    let script_arg = script.to_str().unwrap();

    let dry = sb.ft_json(&["script", tree_arg, script_arg, "--dry-run", "--json"]);
    assert_eq!(dry["applied"], 4);
    assert_eq!(dry["written"], false);
    assert_eq!(read_tree(&tree)["version"], 1);

    let run = sb.ft_json(&["script", tree_arg, script_arg, "--json"]);
    assert_eq!(run["version"], 4);
    assert_eq!(run["written"], true);

    let doc = read_tree(&tree);
    assert_eq!(doc["root"]["children"].as_array().unwrap().len(), 1);
    assert_eq!(
        doc["root"]["children"][0]["children"][0]["value"],
        serde_json::json!(["admin", "owner"])
    );

    let bad = sb.write("bad.ft", "add-group root\nfrobnicate\n");
    let output = sb.ft(&["script", tree_arg, bad.to_str().unwrap(), "--json"]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr_json(&output)["error"]["code"], "SCRIPT_ERROR");
    assert_eq!(read_tree(&tree)["version"], 4);
}

#[test]
fn validation_errors_name_the_offending_path() {
    let sb = Sandbox::new();
    let broken = sb.write(
        "broken.json",
        r#"{
            "id": "t1", "name": "Broken", "createdBy": "me",
            "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z",
            "version": 1,
            "root": {"id": "r", "type": "node", "operator": "AND", "enabled": true,
                     "children": [{"id": "l", "type": "leaf", "field": "age",
                                   "operator": "like", "value": 1,
                                   "fieldType": "number", "enabled": true}]}
        }"#,
    );
    let broken_arg = broken.to_str().unwrap();

    let output = sb.ft(&["validate", broken_arg, "--json"]);
    assert_eq!(output.status.code(), Some(2));
    let error = stderr_json(&output);
    assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
    assert!(error["error"]["message"]
        .as_str()
        .unwrap()
        .contains("root.children[0].operator"));

    let output = sb.ft(&["show", broken_arg]);
    assert_eq!(output.status.code(), Some(2));

    let fixed = fs::read_to_string(&broken).unwrap().replace("like", "equals");
    fs::write(&broken, fixed).unwrap();
    let valid = sb.ft_json(&["validate", broken_arg, "--json"]);
    assert_eq!(valid["valid"], true);
}

#[test]
fn new_refuses_to_overwrite() {
    let sb = Sandbox::new();
    let tree = sb.path("tree.json");
    let tree_arg = tree.to_str().unwrap();
    sb.ft_ok(&["new", tree_arg, "-n", "First"]);

    let output = sb.ft(&["new", tree_arg, "-n", "Second", "--json"]);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr_json(&output)["error"]["code"], "INVALID_ARGUMENT");

    sb.ft_ok(&["new", tree_arg, "-n", "Second", "--force"]);
    assert_eq!(read_tree(&tree)["name"], "Second");
}

#[test]
fn fields_check_suggests_known_paths() {
    let sb = Sandbox::new();
    let tree = sb.path("tree.json");
    let tree_arg = tree.to_str().unwrap();
    sb.ft_ok(&["new", tree_arg, "-n", "Typos"]);
    sb.ft_ok(&["add-leaf", tree_arg, "-f", "user.agee", "-o", "greater_than", "--value", "18"]);
    sb.ft_ok(&["add-leaf", tree_arg, "-f", "user.email", "-o", "is_not_null"]);

    let catalog = sb.write(
        "fields.json",
        r#"[
            {"name": "Age", "path": "user.age", "type": "number"},
            {"name": "Email", "path": "user.email", "type": "string"}
        ]"#,
    );
    let catalog_arg = catalog.to_str().unwrap();

    let listing = sb.ft_ok(&["fields", catalog_arg]);
    assert!(listing.contains("user.email"));

    let output = sb.ft(&["fields", catalog_arg, "--check", tree_arg, "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let check: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(check["unknown"][0]["field"], "user.agee");
    assert_eq!(check["unknown"][0]["suggestion"], "user.age");
    assert_eq!(check["unknown"].as_array().unwrap().len(), 1);
}

#[test]
fn config_sets_default_author() {
    let sb = Sandbox::new();
    sb.ft_ok(&["config", "set", "created_by", "carol"]);

    let tree = sb.path("tree.json");
    sb.ft_ok(&["new", tree.to_str().unwrap(), "-n", "Owned"]);
    assert_eq!(read_tree(&tree)["createdBy"], "carol");

    let output = sb.ft(&["config", "set", "history.capacity", "0"]);
    assert_eq!(output.status.code(), Some(5));
}
