//! JavaScript setup modules on an embedded engine.
//!
//! A setup module is an ECMAScript module whose default export takes one
//! argument, the `{ ctx, tools }` Environment. The engine has no module
//! loader, file system or network access; the tool bindings below are the
//! only way out. Tool failures are thrown into the script as `Error`s and,
//! when they end the run, surface as the original [`SandboxError`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use boa_engine::builtins::promise::PromiseState;
use boa_engine::object::builtins::{JsPromise, JsRegExp};
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{
    js_string, Context, JsArgs, JsError, JsNativeError, JsObject, JsString, JsValue, Module,
    NativeFunction, Source,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::context::Environment;
use crate::error::{SandboxError, SandboxResult};
use crate::tools::Search;

struct Bridge {
    env: Environment,
    error: RefCell<Option<SandboxError>>,
}

impl Bridge {
    /// Stash `err` and turn it into a JS exception.
    fn raise(&self, err: SandboxError) -> JsError {
        let message = err.to_string();
        *self.error.borrow_mut() = Some(err);
        JsNativeError::error().with_message(message).into()
    }

    /// The tool error behind a JS exception, if there was one.
    fn recover(&self, err: &JsError) -> SandboxError {
        self.error
            .borrow_mut()
            .take()
            .unwrap_or_else(|| SandboxError::Execution(err.to_string()))
    }
}

type Binding = fn(&Bridge, &[JsValue], &mut Context) -> SandboxResult<JsValue>;

fn bind(bridge: &Rc<Bridge>, binding: Binding) -> NativeFunction {
    let bridge = Rc::clone(bridge);
    // SAFETY: the closure captures only an `Rc<Bridge>`, which owns no
    // garbage-collected values, so there is nothing to trace.
    unsafe {
        NativeFunction::from_closure(move |_this, args, context| {
            bridge.error.borrow_mut().take();
            binding(&bridge, args, context).map_err(|e| bridge.raise(e))
        })
    }
}

struct Namespace<'ctx> {
    init: ObjectInitializer<'ctx>,
    bridge: Rc<Bridge>,
}

impl<'ctx> Namespace<'ctx> {
    fn new(context: &'ctx mut Context, bridge: &Rc<Bridge>) -> Self {
        Self {
            init: ObjectInitializer::new(context),
            bridge: Rc::clone(bridge),
        }
    }

    fn add(&mut self, name: &str, length: usize, binding: Binding) -> &mut Self {
        self.init
            .function(bind(&self.bridge, binding), JsString::from(name), length);
        self
    }

    fn build(&mut self) -> JsObject {
        self.init.build()
    }
}

/// Parse, evaluate and invoke a setup module. The source must already have
/// passed the capability policy.
pub(crate) fn run_module(source: &str, env: &Environment) -> SandboxResult<()> {
    let mut context = Context::default();
    let bridge = Rc::new(Bridge {
        env: env.clone(),
        error: RefCell::new(None),
    });

    let module = Module::parse(Source::from_bytes(source.as_bytes()), None, &mut context)
        .map_err(|e| SandboxError::Syntax(e.to_string()))?;

    let console = console_object(&mut context, &bridge);
    context
        .register_global_property(js_string!("console"), console, Attribute::all())
        .map_err(|e| SandboxError::Execution(e.to_string()))?;

    let evaluated = module.load_link_evaluate(&mut context);
    context.run_jobs();
    match evaluated.state() {
        PromiseState::Fulfilled(_) => {}
        PromiseState::Rejected(reason) => {
            return Err(SandboxError::Execution(reason.display().to_string()));
        }
        PromiseState::Pending => {
            return Err(SandboxError::Execution("module evaluation did not complete".to_string()));
        }
    }

    let entry = module
        .namespace(&mut context)
        .get(js_string!("default"), &mut context)
        .map_err(|e| SandboxError::InvalidExport(e.to_string()))?;
    let routine = match entry.as_callable() {
        Some(routine) => routine.clone(),
        None => {
            return Err(SandboxError::InvalidExport(format!(
                "default export is {}",
                describe(&entry)
            )))
        }
    };

    let length = routine
        .get(js_string!("length"), &mut context)
        .map_err(|e| SandboxError::InvalidExport(e.to_string()))?;
    let arity = length
        .to_u32(&mut context)
        .map_err(|e| SandboxError::InvalidExport(e.to_string()))?;
    if arity != 1 {
        return Err(SandboxError::BadArity { found: arity });
    }

    let environment = environment_object(&mut context, &bridge)?;
    debug!("Invoking setup routine");
    let outcome = match routine.call(&JsValue::undefined(), &[environment], &mut context) {
        Ok(value) => settle(value, &mut context),
        Err(err) => Err(err.to_string()),
    };

    outcome.map_err(|message| match bridge.error.borrow_mut().take() {
        Some(tool_error) if message.contains(&tool_error.to_string()) => tool_error,
        _ => SandboxError::Execution(message),
    })
}

/// Wait for a returned promise; plain values settle immediately.
fn settle(value: JsValue, context: &mut Context) -> Result<(), String> {
    let Some(object) = value.as_object() else {
        return Ok(());
    };
    let Ok(promise) = JsPromise::from_object(object.clone()) else {
        return Ok(());
    };
    context.run_jobs();
    match promise.state() {
        PromiseState::Fulfilled(_) => Ok(()),
        PromiseState::Rejected(reason) => Err(reason.display().to_string()),
        PromiseState::Pending => Err("setup routine never settled".to_string()),
    }
}

fn describe(value: &JsValue) -> &'static str {
    if value.is_undefined() {
        "undefined"
    } else if value.is_null() {
        "null"
    } else if value.is_string() {
        "a string"
    } else if value.is_number() {
        "a number"
    } else if value.is_boolean() {
        "a boolean"
    } else {
        "a non-callable object"
    }
}

// ---------------------------------------------------------------------------
// Environment object
// ---------------------------------------------------------------------------

fn environment_object(context: &mut Context, bridge: &Rc<Bridge>) -> SandboxResult<JsValue> {
    let ctx = to_js(&bridge.env.ctx.to_json()?, context)?;

    let files = Namespace::new(context, bridge)
        .add("read", 1, files_read)
        .add("write", 2, files_write)
        .add("copy", 3, files_copy)
        .add("move", 3, files_move)
        .add("remove", 1, files_remove)
        .add("ensureDirs", 1, files_ensure_dirs)
        .add("exists", 1, files_exists)
        .build();
    let json = Namespace::new(context, bridge)
        .add("read", 1, json_read)
        .add("get", 2, json_get)
        .add("set", 3, json_set)
        .add("remove", 2, json_remove)
        .add("addToArray", 4, json_add_to_array)
        .add("mergeArray", 4, json_merge_array)
        .add("merge", 2, json_merge)
        .add("update", 2, json_update)
        .build();
    let text = Namespace::new(context, bridge)
        .add("insertAfter", 3, text_insert_after)
        .add("replaceBetween", 4, text_replace_between)
        .add("ensureBlock", 3, text_ensure_block)
        .add("appendLines", 2, text_append_lines)
        .add("replace", 4, text_replace)
        .build();
    let templates = Namespace::new(context, bridge)
        .add("renderString", 2, templates_render_string)
        .add("renderFile", 3, templates_render_file)
        .add("copy", 3, templates_copy)
        .build();
    let placeholders = Namespace::new(context, bridge)
        .add("applyInputs", 1, placeholders_apply_inputs)
        .add("replaceAll", 2, placeholders_replace_all)
        .add("replaceInFile", 2, placeholders_replace_in_file)
        .build();
    let options = Namespace::new(context, bridge)
        .add("has", 1, options_has)
        .add("in", 2, options_in)
        .add("require", 1, options_require)
        .add("list", 1, options_list)
        .add("dimensions", 0, options_dimensions)
        .add("when", 2, options_when)
        .build();
    let inputs = Namespace::new(context, bridge)
        .add("get", 2, inputs_get)
        .add("all", 0, inputs_all)
        .build();

    let attribute = Attribute::ENUMERABLE;
    let tools = ObjectInitializer::new(context)
        .property(js_string!("files"), files, attribute)
        .property(js_string!("json"), json, attribute)
        .property(js_string!("text"), text, attribute)
        .property(js_string!("templates"), templates, attribute)
        .property(js_string!("placeholders"), placeholders, attribute)
        .property(js_string!("options"), options, attribute)
        .property(js_string!("inputs"), inputs, attribute)
        .build();

    let environment = ObjectInitializer::new(context)
        .property(js_string!("ctx"), ctx, attribute)
        .property(js_string!("tools"), tools, attribute)
        .build();
    Ok(environment.into())
}

fn console_object(context: &mut Context, bridge: &Rc<Bridge>) -> JsObject {
    Namespace::new(context, bridge)
        .add("log", 0, console_info)
        .add("info", 0, console_info)
        .add("debug", 0, console_debug)
        .add("warn", 0, console_warn)
        .add("error", 0, console_error)
        .build()
}

// ---------------------------------------------------------------------------
// Argument conversion
// ---------------------------------------------------------------------------

fn to_js(value: &Value, context: &mut Context) -> SandboxResult<JsValue> {
    JsValue::from_json(value, context).map_err(|e| SandboxError::Execution(e.to_string()))
}

fn js_text(text: &str) -> JsValue {
    JsValue::from(JsString::from(text))
}

fn js_count(count: usize) -> JsValue {
    JsValue::from(count as f64)
}

fn string_arg(args: &[JsValue], index: usize, operation: &str, name: &str) -> SandboxResult<String> {
    args.get_or_undefined(index)
        .as_string()
        .map(|s| s.to_std_string_escaped())
        .ok_or_else(|| SandboxError::invalid_argument(operation, format!("'{}' must be a string", name)))
}

fn optional_string_arg(args: &[JsValue], index: usize, operation: &str, name: &str) -> SandboxResult<Option<String>> {
    let value = args.get_or_undefined(index);
    if value.is_null_or_undefined() {
        Ok(None)
    } else {
        string_arg(args, index, operation, name).map(Some)
    }
}

fn json_arg(args: &[JsValue], index: usize, operation: &str, context: &mut Context) -> SandboxResult<Value> {
    from_js(args.get_or_undefined(index), operation, context)
}

fn from_js(value: &JsValue, operation: &str, context: &mut Context) -> SandboxResult<Value> {
    if value.is_undefined() {
        return Ok(Value::Null);
    }
    value
        .to_json(context)
        .map_err(|e| SandboxError::invalid_argument(operation, e.to_string()))
}

/// `true`, or an options object with `key: true`.
fn flag_arg(args: &[JsValue], index: usize, key: &str, context: &mut Context) -> SandboxResult<bool> {
    let value = args.get_or_undefined(index);
    if let Some(flag) = value.as_boolean() {
        return Ok(flag);
    }
    match value.as_object() {
        Some(object) => object
            .get(JsString::from(key), context)
            .map(|v| v.to_boolean())
            .map_err(|e| SandboxError::invalid_argument(key, e.to_string())),
        None => Ok(false),
    }
}

fn string_list(value: Value, operation: &str) -> SandboxResult<Vec<String>> {
    match value {
        Value::String(text) => Ok(vec![text]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(text) => Ok(text),
                other => Err(SandboxError::invalid_argument(
                    operation,
                    format!("expected a string, found {}", other),
                )),
            })
            .collect(),
        other => Err(SandboxError::invalid_argument(
            operation,
            format!("expected a string or list of strings, found {}", other),
        )),
    }
}

fn string_map(value: Value, operation: &str) -> SandboxResult<BTreeMap<String, String>> {
    match value {
        Value::Null => Ok(BTreeMap::new()),
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(text) => (key, text),
                other => (key, other.to_string()),
            })
            .collect()),
        other => Err(SandboxError::invalid_argument(
            operation,
            format!("expected an object of values, found {}", other),
        )),
    }
}

fn callback_arg(args: &[JsValue], index: usize, operation: &str) -> SandboxResult<JsObject> {
    args.get_or_undefined(index)
        .as_callable()
        .cloned()
        .ok_or_else(|| SandboxError::invalid_argument(operation, "callback must be a function"))
}

fn message(args: &[JsValue]) -> String {
    args.iter()
        .map(|arg| match arg.as_string() {
            Some(text) => text.to_std_string_escaped(),
            None => arg.display().to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// files
// ---------------------------------------------------------------------------

fn files_read(bridge: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    let path = string_arg(args, 0, "files.read", "path")?;
    Ok(js_text(&bridge.env.tools.files.read(&path)?))
}

fn files_write(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let path = string_arg(args, 0, "files.write", "path")?;
    match json_arg(args, 1, "files.write", context)? {
        Value::String(text) => bridge.env.tools.files.write(&path, text)?,
        lines @ Value::Array(_) => bridge.env.tools.files.write(&path, string_list(lines, "files.write")?)?,
        other => {
            return Err(SandboxError::invalid_argument(
                "files.write",
                format!("content must be a string or list of lines, found {}", other),
            ))
        }
    }
    Ok(JsValue::undefined())
}

fn files_copy(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let from = string_arg(args, 0, "files.copy", "from")?;
    let to = string_arg(args, 1, "files.copy", "to")?;
    let overwrite = flag_arg(args, 2, "overwrite", context)?;
    Ok(js_count(bridge.env.tools.files.copy(&from, &to, overwrite)?))
}

fn files_move(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let from = string_arg(args, 0, "files.move", "from")?;
    let to = string_arg(args, 1, "files.move", "to")?;
    let overwrite = flag_arg(args, 2, "overwrite", context)?;
    bridge.env.tools.files.move_path(&from, &to, overwrite)?;
    Ok(JsValue::undefined())
}

fn files_remove(bridge: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    let path = string_arg(args, 0, "files.remove", "path")?;
    Ok(JsValue::from(bridge.env.tools.files.remove(&path)?))
}

fn files_ensure_dirs(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let mut paths = Vec::new();
    for arg in args {
        paths.extend(string_list(from_js(arg, "files.ensureDirs", context)?, "files.ensureDirs")?);
    }
    bridge.env.tools.files.ensure_dirs(&paths)?;
    Ok(JsValue::undefined())
}

fn files_exists(bridge: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    let path = string_arg(args, 0, "files.exists", "path")?;
    Ok(JsValue::from(bridge.env.tools.files.exists(&path)?))
}

// ---------------------------------------------------------------------------
// json
// ---------------------------------------------------------------------------

fn json_read(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "json.read", "file")?;
    to_js(&bridge.env.tools.json.read(&file)?, context)
}

fn json_get(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "json.get", "file")?;
    let path = string_arg(args, 1, "json.get", "path")?;
    match bridge.env.tools.json.get(&file, &path)? {
        Some(value) => to_js(&value, context),
        None => Ok(JsValue::undefined()),
    }
}

fn json_set(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "json.set", "file")?;
    let path = string_arg(args, 1, "json.set", "path")?;
    let value = json_arg(args, 2, "json.set", context)?;
    bridge.env.tools.json.set(&file, &path, value)?;
    Ok(JsValue::undefined())
}

fn json_remove(bridge: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "json.remove", "file")?;
    let path = string_arg(args, 1, "json.remove", "path")?;
    Ok(JsValue::from(bridge.env.tools.json.remove(&file, &path)?))
}

fn json_add_to_array(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "json.addToArray", "file")?;
    let path = string_arg(args, 1, "json.addToArray", "path")?;
    let value = json_arg(args, 2, "json.addToArray", context)?;
    let unique = flag_arg(args, 3, "unique", context)?;
    Ok(JsValue::from(bridge.env.tools.json.add_to_array(&file, &path, value, unique)?))
}

fn json_merge_array(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "json.mergeArray", "file")?;
    let path = string_arg(args, 1, "json.mergeArray", "path")?;
    let values = match json_arg(args, 2, "json.mergeArray", context)? {
        Value::Array(values) => values,
        other => {
            return Err(SandboxError::invalid_argument(
                "json.mergeArray",
                format!("values must be a list, found {}", other),
            ))
        }
    };
    let unique = flag_arg(args, 3, "unique", context)?;
    Ok(js_count(bridge.env.tools.json.merge_array(&file, &path, values, unique)?))
}

fn json_merge(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "json.merge", "file")?;
    let partial = json_arg(args, 1, "json.merge", context)?;
    bridge.env.tools.json.merge(&file, partial)?;
    Ok(JsValue::undefined())
}

/// The callback receives the document and either returns a replacement or
/// edits its argument in place.
fn json_update(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "json.update", "file")?;
    let transform = callback_arg(args, 1, "json.update")?;
    bridge.env.tools.json.update(&file, |document| {
        let draft = to_js(&document, context)?;
        let returned = transform
            .call(&JsValue::undefined(), &[draft.clone()], context)
            .map_err(|e| bridge.recover(&e))?;
        if returned
            .as_object()
            .is_some_and(|o| JsPromise::from_object(o.clone()).is_ok())
        {
            return Err(SandboxError::invalid_argument(
                "json.update",
                "the update callback must be synchronous",
            ));
        }
        let updated = if returned.is_undefined() { draft } else { returned };
        from_js(&updated, "json.update", context)
    })?;
    Ok(JsValue::undefined())
}

// ---------------------------------------------------------------------------
// text
// ---------------------------------------------------------------------------

fn text_insert_after(bridge: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "text.insertAfter", "file")?;
    let marker = string_arg(args, 1, "text.insertAfter", "marker")?;
    let content = string_arg(args, 2, "text.insertAfter", "content")?;
    bridge.env.tools.text.insert_after(&file, &marker, &content)?;
    Ok(JsValue::undefined())
}

fn text_replace_between(bridge: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "text.replaceBetween", "file")?;
    let start = string_arg(args, 1, "text.replaceBetween", "start")?;
    let end = string_arg(args, 2, "text.replaceBetween", "end")?;
    let content = string_arg(args, 3, "text.replaceBetween", "content")?;
    bridge.env.tools.text.replace_between(&file, &start, &end, &content)?;
    Ok(JsValue::undefined())
}

/// The marker may be passed directly or as `{ marker }`.
fn text_ensure_block(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "text.ensureBlock", "file")?;
    let block = string_arg(args, 1, "text.ensureBlock", "block")?;
    let marker = match args.get_or_undefined(2).as_object() {
        Some(options) => {
            let marker = options
                .get(js_string!("marker"), context)
                .map_err(|e| SandboxError::invalid_argument("text.ensureBlock", e.to_string()))?;
            optional_string_arg(&[marker], 0, "text.ensureBlock", "marker")?
        }
        None => optional_string_arg(args, 2, "text.ensureBlock", "marker")?,
    };
    let changed = bridge.env.tools.text.ensure_block(&file, &block, marker.as_deref())?;
    Ok(JsValue::from(changed))
}

fn text_append_lines(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "text.appendLines", "file")?;
    let lines = string_list(json_arg(args, 1, "text.appendLines", context)?, "text.appendLines")?;
    bridge.env.tools.text.append_lines(&file, &lines)?;
    Ok(JsValue::undefined())
}

/// `search` is a string or a `RegExp`; only the `i`, `m` and `s` flags carry over.
fn text_replace(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "text.replace", "file")?;
    let search = match args.get_or_undefined(1).as_object() {
        Some(object) => {
            let regexp = JsRegExp::from_object(object.clone())
                .map_err(|_| SandboxError::invalid_argument("text.replace", "search must be a string or RegExp"))?;
            let source = regexp
                .source(context)
                .map_err(|e| SandboxError::invalid_argument("text.replace", e.to_string()))?;
            let flags = regexp
                .flags(context)
                .map_err(|e| SandboxError::invalid_argument("text.replace", e.to_string()))?;
            let inline: String = flags.chars().filter(|f| matches!(f, 'i' | 'm' | 's')).collect();
            if inline.is_empty() {
                Search::pattern(&source)?
            } else {
                Search::pattern(&format!("(?{}){}", inline, source))?
            }
        }
        None => Search::literal(string_arg(args, 1, "text.replace", "search")?),
    };
    let replacement = string_arg(args, 2, "text.replace", "replacement")?;
    let ensure_match = flag_arg(args, 3, "ensureMatch", context)?;
    Ok(js_count(bridge.env.tools.text.replace(&file, &search, &replacement, ensure_match)?))
}

// ---------------------------------------------------------------------------
// templates
// ---------------------------------------------------------------------------

fn templates_render_string(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let template = string_arg(args, 0, "templates.renderString", "template")?;
    let data = string_map(json_arg(args, 1, "templates.renderString", context)?, "templates.renderString")?;
    Ok(js_text(&bridge.env.tools.templates.render_string(&template, &data)))
}

fn templates_render_file(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let src = string_arg(args, 0, "templates.renderFile", "src")?;
    let dest = string_arg(args, 1, "templates.renderFile", "dest")?;
    let data = string_map(json_arg(args, 2, "templates.renderFile", context)?, "templates.renderFile")?;
    bridge.env.tools.templates.render_file(&src, &dest, &data)?;
    Ok(JsValue::undefined())
}

fn templates_copy(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let src = string_arg(args, 0, "templates.copy", "src")?;
    let dest = string_arg(args, 1, "templates.copy", "dest")?;
    let overwrite = flag_arg(args, 2, "overwrite", context)?;
    Ok(js_count(bridge.env.tools.templates.copy(&src, &dest, overwrite)?))
}

// ---------------------------------------------------------------------------
// placeholders
// ---------------------------------------------------------------------------

fn placeholders_apply_inputs(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let files = string_list(json_arg(args, 0, "placeholders.applyInputs", context)?, "placeholders.applyInputs")?;
    Ok(js_count(bridge.env.tools.placeholders.apply_inputs(&files)?))
}

fn placeholders_replace_all(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let values = string_map(json_arg(args, 0, "placeholders.replaceAll", context)?, "placeholders.replaceAll")?;
    let files = string_list(json_arg(args, 1, "placeholders.replaceAll", context)?, "placeholders.replaceAll")?;
    Ok(js_count(bridge.env.tools.placeholders.replace_all(&values, &files)?))
}

fn placeholders_replace_in_file(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let file = string_arg(args, 0, "placeholders.replaceInFile", "file")?;
    let values = string_map(json_arg(args, 1, "placeholders.replaceInFile", context)?, "placeholders.replaceInFile")?;
    Ok(JsValue::from(bridge.env.tools.placeholders.replace_in_file(&file, &values)?))
}

// ---------------------------------------------------------------------------
// options
// ---------------------------------------------------------------------------

fn options_has(bridge: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    let value = string_arg(args, 0, "options.has", "value")?;
    Ok(JsValue::from(bridge.env.tools.options.has(&value)))
}

fn options_in(bridge: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    let dimension = string_arg(args, 0, "options.in", "dimension")?;
    let value = string_arg(args, 1, "options.in", "value")?;
    Ok(JsValue::from(bridge.env.tools.options.in_dimension(&dimension, &value)))
}

fn options_require(bridge: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    let value = string_arg(args, 0, "options.require", "value")?;
    bridge.env.tools.options.require(&value)?;
    Ok(JsValue::undefined())
}

fn options_list(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let dimension = optional_string_arg(args, 0, "options.list", "dimension")?;
    let values = bridge.env.tools.options.list(dimension.as_deref());
    to_js(&Value::from(values), context)
}

fn options_dimensions(bridge: &Bridge, _: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let dimensions = serde_json::to_value(bridge.env.tools.options.dimensions())?;
    to_js(&dimensions, context)
}

fn options_when(bridge: &Bridge, args: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let value = string_arg(args, 0, "options.when", "value")?;
    let callback = callback_arg(args, 1, "options.when")?;
    let result = bridge
        .env
        .tools
        .options
        .when(&value, || callback.call(&JsValue::undefined(), &[], context));
    match result {
        Some(Ok(returned)) => Ok(returned),
        Some(Err(e)) => Err(bridge.recover(&e)),
        None => Ok(JsValue::undefined()),
    }
}

// ---------------------------------------------------------------------------
// inputs
// ---------------------------------------------------------------------------

fn inputs_get(bridge: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    let name = string_arg(args, 0, "inputs.get", "name")?;
    Ok(match bridge.env.tools.inputs.get(&name) {
        Some(value) => js_text(value),
        None => args.get_or_undefined(1).clone(),
    })
}

fn inputs_all(bridge: &Bridge, _: &[JsValue], context: &mut Context) -> SandboxResult<JsValue> {
    let all = serde_json::to_value(bridge.env.tools.inputs.all())?;
    to_js(&all, context)
}

// ---------------------------------------------------------------------------
// console
// ---------------------------------------------------------------------------

fn console_info(_: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    info!(target: "loom::setup", "{}", message(args));
    Ok(JsValue::undefined())
}

fn console_debug(_: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    debug!(target: "loom::setup", "{}", message(args));
    Ok(JsValue::undefined())
}

fn console_warn(_: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    warn!(target: "loom::setup", "{}", message(args));
    Ok(JsValue::undefined())
}

fn console_error(_: &Bridge, args: &[JsValue], _: &mut Context) -> SandboxResult<JsValue> {
    error!(target: "loom::setup", "{}", message(args));
    Ok(JsValue::undefined())
}
