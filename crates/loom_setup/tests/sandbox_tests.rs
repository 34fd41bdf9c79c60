//! End-to-end tests running setup modules against temporary projects.

use std::fs;
use std::path::{Path, PathBuf};

use loom_manifest::InputValues;
use loom_options::{normalize, Dimension, DimensionSet};
use loom_setup::{
    Environment, PlaceholderSyntax, SandboxConfig, SandboxError, SandboxResult, SetupContext,
    SetupSandbox,
};
use serde_json::{json, Value};
use tempfile::TempDir;

struct Fixture {
    base: TempDir,
    tokens: Vec<&'static str>,
    config: SandboxConfig,
}

impl Fixture {
    fn new() -> Self {
        let base = TempDir::new().unwrap();
        fs::create_dir_all(base.path().join("project")).unwrap();
        fs::create_dir_all(base.path().join("template")).unwrap();
        Self {
            base,
            tokens: vec!["auth", "database=postgres"],
            config: SandboxConfig::default(),
        }
    }

    fn project(&self) -> PathBuf {
        self.base.path().join("project")
    }

    fn file(&self, relative: &str) -> PathBuf {
        self.project().join(relative)
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.file(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.file(relative)).unwrap()
    }

    fn read_json(&self, relative: &str) -> Value {
        serde_json::from_str(&self.read(relative)).unwrap()
    }

    fn environment(&self) -> Environment {
        let dimensions = DimensionSet::new(vec![
            Dimension::single("database", ["postgres", "sqlite"]).with_default("sqlite"),
            Dimension::multi("features", ["auth", "blog", "docker"]),
        ])
        .unwrap();
        let selection = normalize(&self.tokens, &dimensions).unwrap();
        let inputs: InputValues = [("TAGLINE".to_string(), "Ship it".to_string())]
            .into_iter()
            .collect();
        let ctx = SetupContext::new(self.project(), "demo-app", inputs, selection);
        Environment::new(ctx, &self.config).unwrap()
    }

    fn module(&self, source: &str) -> PathBuf {
        let path = self.base.path().join("template").join("_setup.mjs");
        fs::write(&path, source).unwrap();
        path
    }

    fn run(&self, source: &str) -> SandboxResult<()> {
        let sandbox = SetupSandbox::new(self.config.clone());
        sandbox.run(&self.module(source), &self.environment())
    }
}

fn no_entries(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

#[test]
fn test_async_routine_customizes_project() {
    let fixture = Fixture::new();
    fixture
        .run(
            r##"
export default async function setup({ ctx, tools }) {
  const { files, json, text, options, placeholders } = tools;
  files.write("README.md", ["# {{PROJECT_NAME}}", "", "{{TAGLINE}}"]);
  json.set("package.json", "name", ctx.projectName);
  json.addToArray("package.json", "keywords", "starter", { unique: true });
  json.addToArray("package.json", "keywords", "starter", { unique: true });
  if (options.has("auth")) {
    json.set("package.json", "dependencies.lucia", "^3.0.0");
  }
  options.when("docker", () => files.write("Dockerfile", "FROM node:20"));
  text.ensureBlock(".gitignore", "node_modules");
  await Promise.resolve();
  placeholders.applyInputs(["README.md"]);
  console.log("configured", ctx.projectName);
}
"##,
        )
        .unwrap();

    assert_eq!(fixture.read("README.md"), "# demo-app\n\nShip it");
    assert_eq!(
        fixture.read_json("package.json"),
        json!({
            "name": "demo-app",
            "keywords": ["starter"],
            "dependencies": { "lucia": "^3.0.0" }
        })
    );
    assert!(!fixture.file("Dockerfile").exists());
    assert!(fixture.read(".gitignore").contains("node_modules"));
}

#[test]
fn test_context_exposes_selection_and_inputs() {
    let fixture = Fixture::new();
    fixture
        .run(
            r#"
export default function setup(env) {
  const summary = {
    database: env.tools.options.list("database"),
    features: env.tools.options.list("features"),
    inDatabase: env.tools.options.in("database", "postgres"),
    tagline: env.tools.inputs.get("TAGLINE"),
    missing: env.tools.inputs.get("MISSING", "fallback"),
    directory: env.ctx.projectDirectory.length > 0,
  };
  env.tools.json.merge("summary.json", summary);
}
"#,
        )
        .unwrap();

    assert_eq!(
        fixture.read_json("summary.json"),
        json!({
            "database": ["postgres"],
            "features": ["auth"],
            "inDatabase": true,
            "tagline": "Ship it",
            "missing": "fallback",
            "directory": true
        })
    );
}

#[test]
fn test_json_update_in_place_and_by_return() {
    let fixture = Fixture::new();
    fixture.write("package.json", r#"{ "name": "demo-app" }"#);
    fixture
        .run(
            r#"
export default function setup({ tools }) {
  tools.json.update("package.json", (pkg) => {
    pkg.scripts = { dev: "vite" };
  });
  tools.json.update("tsconfig.json", () => ({ strict: true }));
}
"#,
        )
        .unwrap();

    assert_eq!(
        fixture.read_json("package.json"),
        json!({ "name": "demo-app", "scripts": { "dev": "vite" } })
    );
    assert_eq!(fixture.read_json("tsconfig.json"), json!({ "strict": true }));
}

#[test]
fn test_text_replace_with_regexp() {
    let fixture = Fixture::new();
    fixture.write("README.md", "demo and Demo");
    fixture
        .run(
            r#"
export default function setup({ tools }) {
  const count = tools.text.replace("README.md", /DEMO/gi, "Loom");
  tools.files.write("count.txt", String(count));
  tools.text.replace("README.md", "absent", "x", { ensureMatch: false });
}
"#,
        )
        .unwrap();

    assert_eq!(fixture.read("README.md"), "Loom and Loom");
    assert_eq!(fixture.read("count.txt"), "2");
}

#[test]
fn test_regexp_replacement_expands_groups() {
    let fixture = Fixture::new();
    fixture.write("VERSION", "v1");
    fixture
        .run(
            r#"
export default function setup({ tools }) {
  tools.text.replace("VERSION", /v(\d)/, "$1x");
}
"#,
        )
        .unwrap();

    assert_eq!(fixture.read("VERSION"), "1x");
}

#[test]
fn test_json_set_far_index_is_rejected() {
    for index in ["18446744073709551615", "4000000000"] {
        let fixture = Fixture::new();
        let source = format!(
            r#"
export default function setup({{ tools }}) {{
  tools.json.set("package.json", "files[{}]", 1);
}}
"#,
            index
        );
        let err = fixture.run(&source).unwrap_err();

        assert!(
            matches!(err, SandboxError::InvalidArgument { ref operation, .. } if operation == "json"),
            "unexpected error for index {}: {}",
            index,
            err
        );
        assert!(!fixture.file("package.json").exists());
    }
}

#[test]
fn test_replace_ensure_match_fails_without_writing() {
    let fixture = Fixture::new();
    fixture.write("README.md", "hello");
    let err = fixture
        .run(
            r#"
export default function setup({ tools }) {
  tools.text.replace("README.md", "absent", "x", { ensureMatch: true });
}
"#,
        )
        .unwrap_err();

    assert!(matches!(err, SandboxError::NoMatch { ref search, .. } if search.contains("absent")));
    assert_eq!(fixture.read("README.md"), "hello");
}

#[test]
fn test_ensure_block_is_idempotent_across_runs() {
    let fixture = Fixture::new();
    fixture.write(".env.example", "# database\nPORT=3000\n");
    let source = r##"
export default function setup({ tools }) {
  tools.text.ensureBlock(".env.example", "DATABASE_URL=", { marker: "# database" });
}
"##;
    fixture.run(source).unwrap();
    fixture.run(source).unwrap();

    let content = fixture.read(".env.example");
    assert_eq!(content.matches("DATABASE_URL=").count(), 1);
    assert!(content.find("# database").unwrap() < content.find("DATABASE_URL=").unwrap());
}

#[test]
fn test_templates_copy_and_assets_cleanup() {
    let fixture = Fixture::new();
    fixture.write("__scaffold__/docker/Dockerfile", "FROM node:20\nLABEL app={{PROJECT_NAME}}\n");
    fixture
        .run(
            r#"
export default function setup({ tools }) {
  tools.templates.copy("docker", "docker");
  tools.placeholders.applyInputs(["docker/*"]);
}
"#,
        )
        .unwrap();

    assert!(fixture.read("docker/Dockerfile").contains("LABEL app=demo-app"));
    assert!(!fixture.file("__scaffold__").exists());
}

#[test]
fn test_custom_placeholder_syntax() {
    let mut fixture = Fixture::new();
    fixture.config = SandboxConfig::default().with_placeholder_syntax(PlaceholderSyntax::Dollar);
    fixture.write("docs/intro.txt", "${PROJECT_NAME_PASCAL}: ${TAGLINE} {{TAGLINE}}");
    fixture
        .run(
            r#"
export default function setup({ tools }) {
  tools.placeholders.applyInputs(["docs/*.txt"]);
}
"#,
        )
        .unwrap();

    assert_eq!(fixture.read("docs/intro.txt"), "DemoApp: Ship it {{TAGLINE}}");
}

#[test]
fn test_wrong_arity_rejected_before_running() {
    let fixture = Fixture::new();
    fixture.write("__scaffold__/keep.txt", "asset");

    for (source, expected) in [
        (r#"export default function setup() {}"#, 0),
        (r#"export default function setup(env, extra) { env.tools.files.write("x.txt", "x"); }"#, 2),
    ] {
        let err = fixture.run(source).unwrap_err();
        assert!(matches!(err, SandboxError::BadArity { found } if found == expected));
    }
    assert!(!fixture.file("x.txt").exists());
    assert!(fixture.file("__scaffold__/keep.txt").exists());
}

#[test]
fn test_disallowed_construct_rejected_without_side_effects() {
    let fixture = Fixture::new();
    let err = fixture
        .run(
            r#"export default function setup({ tools }) {
  const fs = require("fs");
  tools.files.write("x.txt", "x");
}
"#,
        )
        .unwrap_err();

    match err {
        SandboxError::DisallowedConstruct { construct, line, .. } => {
            assert_eq!(construct, "require");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(no_entries(&fixture.project()));
}

#[test]
fn test_import_and_eval_rejected() {
    let fixture = Fixture::new();
    for source in [
        "import fs from \"node:fs\";\nexport default function setup(env) {}\n",
        "export default function setup(env) {\n  eval(\"1 + 1\");\n}\n",
        "export default function setup(env) {\n  return new Function(\"return 1\")();\n}\n",
    ] {
        let err = fixture.run(source).unwrap_err();
        assert!(err.is_authoring_error());
        assert!(matches!(err, SandboxError::DisallowedConstruct { .. }));
    }
}

#[test]
fn test_invalid_modules() {
    let fixture = Fixture::new();

    let err = fixture.run("export default 42;\n").unwrap_err();
    assert!(matches!(err, SandboxError::InvalidExport(ref m) if m.contains("a number")));

    let err = fixture.run("export const setup = (env) => {};\n").unwrap_err();
    assert!(matches!(err, SandboxError::InvalidExport(_)));

    let err = fixture
        .run("export default function setup(env) {\n  let = ;\n}\n")
        .unwrap_err();
    assert!(matches!(err, SandboxError::Syntax(_)));
}

#[test]
fn test_tool_error_surfaces_as_itself() {
    let fixture = Fixture::new();
    let err = fixture
        .run(
            r#"
export default async function setup({ tools }) {
  await null;
  tools.options.require("billing");
}
"#,
        )
        .unwrap_err();
    assert!(matches!(err, SandboxError::MissingOption(ref v) if v == "billing"));
}

#[test]
fn test_script_error_is_execution_failure() {
    let fixture = Fixture::new();
    let err = fixture
        .run(
            r#"
export default function setup({ tools }) {
  throw new Error("boom");
}
"#,
        )
        .unwrap_err();
    assert!(matches!(err, SandboxError::Execution(ref m) if m.contains("boom")));
}

#[test]
fn test_caught_tool_error_does_not_fail_run() {
    let fixture = Fixture::new();
    fixture
        .run(
            r#"
export default function setup({ tools }) {
  try {
    tools.files.read("missing.txt");
  } catch (e) {
    tools.files.write("caught.txt", e.message);
  }
}
"#,
        )
        .unwrap();
    assert!(fixture.read("caught.txt").contains("File not found"));
}

#[test]
fn test_path_escape_rejected_in_every_namespace() {
    let fixture = Fixture::new();
    fixture.write("README.md", "hello");

    for call in [
        r#"tools.files.write("../escape.txt", "x")"#,
        r#"tools.files.copy("README.md", "../escape.txt")"#,
        r#"tools.json.set("../escape.txt", "a", 1)"#,
        r#"tools.text.appendLines("../escape.txt", ["x"])"#,
        r#"tools.templates.renderFile("README.md", "../escape.txt", {})"#,
        r#"tools.placeholders.replaceInFile("../escape.txt", {})"#,
        r#"tools.placeholders.applyInputs(["../*.txt"])"#,
    ] {
        let source = format!("export default function setup({{ tools }}) {{\n  {call};\n}}\n");
        let err = fixture.run(&source).unwrap_err();
        assert!(matches!(err, SandboxError::PathEscape(_)), "{call}: {err}");
    }
    assert!(!fixture.base.path().join("escape.txt").exists());
}

#[test]
fn test_native_routine_uses_same_contract() {
    let fixture = Fixture::new();
    fixture.write("__scaffold__/ci.yml", "name: {{PROJECT_NAME_KEBAB}}\n");
    let sandbox = SetupSandbox::default();
    let env = fixture.environment();

    let routine = |env: &Environment| -> SandboxResult<()> {
        env.tools.options.require("auth")?;
        env.tools.templates.copy("ci.yml", ".github/workflows/ci.yml", false)?;
        env.tools.placeholders.apply_inputs(&[".github/workflows/*.yml"])?;
        env.tools.json.set("package.json", "name", json!(env.ctx.project_name))?;
        Ok(())
    };
    sandbox.run_routine(&routine, &env).unwrap();

    assert_eq!(fixture.read(".github/workflows/ci.yml"), "name: demo-app\n");
    assert_eq!(fixture.read_json("package.json"), json!({ "name": "demo-app" }));
    assert!(!fixture.file("__scaffold__").exists());
}
