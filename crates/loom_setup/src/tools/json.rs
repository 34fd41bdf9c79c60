//! JSON document editing.
//!
//! Paths address nested values with dots and brackets: `scripts.build`,
//! `workspaces[0]`, `a.b[2].c`. Writes are pretty-printed with a trailing
//! newline. Editing a file that does not exist starts from `{}`.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{SandboxError, SandboxResult};
use crate::paths::ProjectRoot;
use crate::tools::files::{read_existing, write_creating_parents};

/// One segment of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonKey {
    Field(String),
    Index(usize),
}

/// Parse `a.b[0].c` into keys.
pub fn parse_path(path: &str) -> SandboxResult<Vec<JsonKey>> {
    let invalid = |message: &str| SandboxError::invalid_argument("json path", format!("'{}': {}", path, message));

    let mut keys = Vec::new();
    let mut field = String::new();
    let mut after_index = false;
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if field.is_empty() && !after_index {
                    return Err(invalid("empty segment"));
                }
                if !field.is_empty() {
                    keys.push(JsonKey::Field(std::mem::take(&mut field)));
                }
                if chars.peek().is_none() {
                    return Err(invalid("trailing '.'"));
                }
                after_index = false;
            }
            '[' => {
                if !field.is_empty() {
                    keys.push(JsonKey::Field(std::mem::take(&mut field)));
                }
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(d) if d.is_ascii_digit() => digits.push(d),
                        Some(_) => return Err(invalid("array index must be a number")),
                        None => return Err(invalid("unclosed '['")),
                    }
                }
                let index = digits.parse().map_err(|_| invalid("empty array index"))?;
                keys.push(JsonKey::Index(index));
                after_index = true;
            }
            ']' => return Err(invalid("unexpected ']'")),
            other => {
                if after_index {
                    return Err(invalid("expected '.' or '[' after ']'"));
                }
                field.push(other);
            }
        }
    }

    if !field.is_empty() {
        keys.push(JsonKey::Field(field));
    }
    if keys.is_empty() {
        return Err(invalid("empty path"));
    }
    Ok(keys)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Furthest an index may reach past the end of an existing array.
const MAX_ARRAY_PADDING: usize = 1024;

/// Mutable slot at `keys`, creating objects, arrays and `null` padding on
/// the way.
fn slot_mut<'a>(value: &'a mut Value, keys: &[JsonKey]) -> SandboxResult<&'a mut Value> {
    let mut current = value;
    for key in keys {
        current = match key {
            JsonKey::Field(name) => {
                if current.is_null() {
                    *current = Value::Object(Map::new());
                }
                match current {
                    Value::Object(map) => map.entry(name.clone()).or_insert(Value::Null),
                    other => {
                        return Err(SandboxError::invalid_argument(
                            "json",
                            format!("cannot read field '{}' of {}", name, kind(other)),
                        ))
                    }
                }
            }
            JsonKey::Index(index) => {
                if current.is_null() {
                    *current = Value::Array(Vec::new());
                }
                match current {
                    Value::Array(items) => {
                        if items.len() <= *index {
                            let len = index
                                .checked_add(1)
                                .filter(|len| len - items.len() <= MAX_ARRAY_PADDING)
                                .ok_or_else(|| {
                                    SandboxError::invalid_argument(
                                        "json",
                                        format!(
                                            "index [{}] is too far past the end of an array of {}",
                                            index,
                                            items.len()
                                        ),
                                    )
                                })?;
                            items.resize(len, Value::Null);
                        }
                        &mut items[*index]
                    }
                    other => {
                        return Err(SandboxError::invalid_argument(
                            "json",
                            format!("cannot index [{}] into {}", index, kind(other)),
                        ))
                    }
                }
            }
        };
    }
    Ok(current)
}

/// Value at `keys`, if present.
pub fn get_path<'a>(value: &'a Value, keys: &[JsonKey]) -> Option<&'a Value> {
    keys.iter().try_fold(value, |current, key| match (key, current) {
        (JsonKey::Field(name), Value::Object(map)) => map.get(name),
        (JsonKey::Index(index), Value::Array(items)) => items.get(*index),
        _ => None,
    })
}

fn remove_path(value: &mut Value, keys: &[JsonKey]) -> bool {
    let Some((last, parents)) = keys.split_last() else {
        return false;
    };
    let mut current = value;
    for key in parents {
        let next = match (key, current) {
            (JsonKey::Field(name), Value::Object(map)) => map.get_mut(name),
            (JsonKey::Index(index), Value::Array(items)) => items.get_mut(*index),
            _ => None,
        };
        match next {
            Some(next) => current = next,
            None => return false,
        }
    }
    match (last, current) {
        (JsonKey::Field(name), Value::Object(map)) => map.shift_remove(name).is_some(),
        (JsonKey::Index(index), Value::Array(items)) if *index < items.len() => {
            items.remove(*index);
            true
        }
        _ => false,
    }
}

/// Recursively merge `patch` into `target`. Objects merge key by key;
/// anything else is replaced.
pub fn deep_merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

fn array_at<'a>(document: &'a mut Value, keys: &[JsonKey]) -> SandboxResult<&'a mut Vec<Value>> {
    let slot = slot_mut(document, keys)?;
    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }
    match slot {
        Value::Array(items) => Ok(items),
        other => Err(SandboxError::invalid_argument(
            "json",
            format!("expected an array, found {}", kind(other)),
        )),
    }
}

/// `tools.json`
#[derive(Debug, Clone)]
pub struct JsonTools {
    root: ProjectRoot,
}

impl JsonTools {
    pub fn new(root: ProjectRoot) -> Self {
        Self { root }
    }

    pub fn read(&self, file: &str) -> SandboxResult<Value> {
        let path = self.root.resolve(file)?;
        Ok(serde_json::from_str(&read_existing(&path)?)?)
    }

    /// Value at `path`, if the file and the path exist.
    pub fn get(&self, file: &str, path: &str) -> SandboxResult<Option<Value>> {
        let keys = parse_path(path)?;
        let resolved = self.root.resolve(file)?;
        if !resolved.is_file() {
            return Ok(None);
        }
        let document: Value = serde_json::from_str(&read_existing(&resolved)?)?;
        Ok(get_path(&document, &keys).cloned())
    }

    pub fn set(&self, file: &str, path: &str, value: Value) -> SandboxResult<()> {
        let keys = parse_path(path)?;
        self.edit(file, |document| {
            *slot_mut(document, &keys)? = value;
            Ok(())
        })
    }

    /// Remove the value at `path`. Returns `false` when it did not exist.
    pub fn remove(&self, file: &str, path: &str) -> SandboxResult<bool> {
        let keys = parse_path(path)?;
        let resolved = self.root.resolve(file)?;
        if !resolved.is_file() {
            return Ok(false);
        }
        let mut document: Value = serde_json::from_str(&read_existing(&resolved)?)?;
        let removed = remove_path(&mut document, &keys);
        if removed {
            self.write(&resolved, &document)?;
        }
        Ok(removed)
    }

    /// Append `value` to the array at `path`. With `unique`, an equal element
    /// already present makes this a no-op. Returns whether it was added.
    pub fn add_to_array(&self, file: &str, path: &str, value: Value, unique: bool) -> SandboxResult<bool> {
        let keys = parse_path(path)?;
        let mut added = false;
        self.edit(file, |document| {
            let items = array_at(document, &keys)?;
            if !(unique && items.contains(&value)) {
                items.push(value);
                added = true;
            }
            Ok(())
        })?;
        Ok(added)
    }

    /// Append several values. Returns how many were added.
    pub fn merge_array(&self, file: &str, path: &str, values: Vec<Value>, unique: bool) -> SandboxResult<usize> {
        let keys = parse_path(path)?;
        let mut added = 0;
        self.edit(file, |document| {
            let items = array_at(document, &keys)?;
            for value in values {
                if unique && items.contains(&value) {
                    continue;
                }
                items.push(value);
                added += 1;
            }
            Ok(())
        })?;
        Ok(added)
    }

    /// Deep-merge `partial` into the document root.
    pub fn merge(&self, file: &str, partial: Value) -> SandboxResult<()> {
        self.edit(file, |document| {
            deep_merge(document, partial);
            Ok(())
        })
    }

    /// Read-modify-write with a transform over the whole document.
    pub fn update<F>(&self, file: &str, transform: F) -> SandboxResult<()>
    where
        F: FnOnce(Value) -> SandboxResult<Value>,
    {
        let path = self.root.resolve_entry(file, "json.update")?;
        let document = self.load_or_empty(&path)?;
        let updated = transform(document)?;
        self.write(&path, &updated)
    }

    fn edit<F>(&self, file: &str, f: F) -> SandboxResult<()>
    where
        F: FnOnce(&mut Value) -> SandboxResult<()>,
    {
        let path = self.root.resolve_entry(file, "json")?;
        let mut document = self.load_or_empty(&path)?;
        f(&mut document)?;
        self.write(&path, &document)
    }

    fn load_or_empty(&self, path: &Path) -> SandboxResult<Value> {
        if path.is_file() {
            Ok(serde_json::from_str(&read_existing(path)?)?)
        } else {
            Ok(Value::Object(Map::new()))
        }
    }

    fn write(&self, path: &Path, document: &Value) -> SandboxResult<()> {
        let mut content = serde_json::to_string_pretty(document)?;
        content.push('\n');
        write_creating_parents(path, content)?;
        debug!("Updated {}", self.root.display(path));
        Ok(())
    }
}
