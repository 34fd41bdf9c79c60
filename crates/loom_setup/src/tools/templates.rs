//! Token substitution and author asset copying.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::{debug, info};

use crate::config::PlaceholderSyntax;
use crate::error::SandboxResult;
use crate::paths::ProjectRoot;
use crate::tools::files::{copy_tree, read_existing, write_creating_parents};

/// Substitutes `TOKEN`s wrapped in the configured syntax. Unknown tokens are
/// left as they are.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    syntax: PlaceholderSyntax,
    pattern: Regex,
}

impl TemplateRenderer {
    pub fn new(syntax: PlaceholderSyntax) -> SandboxResult<Self> {
        let pattern = syntax.pattern()?;
        Ok(Self { syntax, pattern })
    }

    pub fn syntax(&self) -> &PlaceholderSyntax {
        &self.syntax
    }

    /// Render content by replacing known tokens.
    pub fn render(&self, content: &str, values: &BTreeMap<String, String>) -> String {
        self.pattern
            .replace_all(content, |caps: &regex::Captures| {
                values
                    .get(&caps[1])
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Tokens present in `content`, in order of first appearance.
    pub fn tokens(&self, content: &str) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        for caps in self.pattern.captures_iter(content) {
            if !tokens.iter().any(|t| t == &caps[1]) {
                tokens.push(caps[1].to_string());
            }
        }
        tokens
    }
}

/// Tokens derived from the project name, available to every substitution.
pub fn builtin_tokens(project_name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("PROJECT_NAME".to_string(), project_name.to_string()),
        ("PROJECT_NAME_SNAKE".to_string(), to_snake_case(project_name)),
        ("PROJECT_NAME_PASCAL".to_string(), to_pascal_case(project_name)),
        ("PROJECT_NAME_KEBAB".to_string(), to_kebab_case(project_name)),
    ])
}

/// Convert to snake_case.
pub fn to_snake_case(s: &str) -> String {
    separate(s, '_')
}

/// Convert to kebab-case.
pub fn to_kebab_case(s: &str) -> String {
    separate(s, '-')
}

/// Convert to PascalCase.
pub fn to_pascal_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect()
}

fn separate(s: &str, separator: char) -> String {
    split_words(s).join(&separator.to_string())
}

/// Lower-case words split on `-`, `_`, spaces and lower-to-upper boundaries.
fn split_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut previous_lower = false;
    for c in s.chars() {
        if c == '-' || c == '_' || c.is_whitespace() {
            if !word.is_empty() {
                words.push(std::mem::take(&mut word));
            }
            previous_lower = false;
            continue;
        }
        if c.is_uppercase() && previous_lower && !word.is_empty() {
            words.push(std::mem::take(&mut word));
        }
        previous_lower = c.is_lowercase() || c.is_ascii_digit();
        word.extend(c.to_lowercase());
    }
    if !word.is_empty() {
        words.push(word);
    }
    words
}

/// `tools.templates`
#[derive(Debug, Clone)]
pub struct TemplateTools {
    root: ProjectRoot,
    assets: ProjectRoot,
    renderer: TemplateRenderer,
}

impl TemplateTools {
    pub fn new(root: ProjectRoot, assets: ProjectRoot, renderer: TemplateRenderer) -> Self {
        Self {
            root,
            assets,
            renderer,
        }
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    pub fn render_string(&self, template: &str, data: &BTreeMap<String, String>) -> String {
        self.renderer.render(template, data)
    }

    /// Render `src` into `dest`, both relative to the project.
    pub fn render_file(&self, src: &str, dest: &str, data: &BTreeMap<String, String>) -> SandboxResult<()> {
        let source = self.root.resolve(src)?;
        let target = self.root.resolve_entry(dest, "templates.renderFile")?;
        let rendered = self.renderer.render(&read_existing(&source)?, data);
        write_creating_parents(&target, rendered)?;
        debug!("Rendered {} -> {}", self.root.display(&source), self.root.display(&target));
        Ok(())
    }

    /// Copy an author asset (file or directory, relative to the assets
    /// directory) into the project. Returns the number of files copied.
    pub fn copy(&self, src: &str, dest: &str, overwrite: bool) -> SandboxResult<usize> {
        let source = self.assets.resolve(src)?;
        let target = self.root.resolve_entry(dest, "templates.copy")?;
        let copied = copy_tree(&source, &target, overwrite)?;
        info!("Copied asset {} -> {}", src, self.root.display(&target));
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SandboxError;
    use std::fs;
    use tempfile::tempdir;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_content() {
        let renderer = TemplateRenderer::new(PlaceholderSyntax::Mustache).unwrap();
        let vars = values(&[("name", "my-app"), ("version", "1.0.0")]);

        let rendered = renderer.render("App: {{name}}, Version: {{version}}, {{other}}", &vars);
        assert_eq!(rendered, "App: my-app, Version: 1.0.0, {{other}}");
    }

    #[test]
    fn test_dollar_syntax() {
        let renderer = TemplateRenderer::new(PlaceholderSyntax::Dollar).unwrap();
        let vars = values(&[("PORT", "8080")]);
        assert_eq!(renderer.render("port=${PORT} {{PORT}}", &vars), "port=8080 {{PORT}}");
        assert_eq!(renderer.tokens("${A} ${B} ${A}"), vec!["A", "B"]);
    }

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_snake_case("MyApp"), "my_app");
        assert_eq!(to_snake_case("my-app"), "my_app");
        assert_eq!(to_pascal_case("my-app"), "MyApp");
        assert_eq!(to_pascal_case("my_app"), "MyApp");
        assert_eq!(to_kebab_case("My App"), "my-app");
        assert_eq!(builtin_tokens("acme-web")["PROJECT_NAME_PASCAL"], "AcmeWeb");
    }

    #[test]
    fn test_copy_reads_from_assets_only() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("__scaffold__/docker")).unwrap();
        fs::write(temp.path().join("__scaffold__/docker/Dockerfile"), "FROM node").unwrap();
        fs::write(temp.path().join("secret.txt"), "x").unwrap();

        let root = ProjectRoot::new(temp.path()).unwrap();
        let assets = root.child("__scaffold__").unwrap();
        let templates = TemplateTools::new(root, assets, TemplateRenderer::new(PlaceholderSyntax::Mustache).unwrap());

        assert!(matches!(
            templates.copy("docker", ".", true),
            Err(SandboxError::InvalidArgument { .. })
        ));
        assert_eq!(templates.copy("docker/Dockerfile", "Dockerfile", false).unwrap(), 1);
        assert!(temp.path().join("Dockerfile").exists());
        assert!(matches!(
            templates.copy("../secret.txt", "copy.txt", false),
            Err(SandboxError::PathEscape(_))
        ));
    }
}
