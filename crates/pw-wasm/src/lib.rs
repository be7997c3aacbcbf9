//! WebAssembly bindings for PageWarden

use std::sync::{Mutex, OnceLock};

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use pw_core::host::{AnchorInfo, DomError, DomHost, GlobalsHost};
use pw_core::stats::{Clock, Presenter, PresenterError, StatsSnapshot};
use pw_core::types::{NavDisposition, NavSurface, PatchOutcome, ScriptVerdict, Severity};
use pw_core::Engine;
use pw_rules::{builtin_registry, load_rules};

struct RulesState {
    registry: pw_core::Registry,
    sets: usize,
    rejected: usize,
}

static RULES: OnceLock<RulesState> = OnceLock::new();
static ENGINE: OnceLock<Mutex<Engine>> = OnceLock::new();

#[wasm_bindgen]
pub fn init(rules_json: Option<String>) -> Result<(), JsValue> {
    if RULES.get().is_some() {
        return Err(JsValue::from_str("Already initialized. Reload the page to reinitialize."));
    }

    let (registry, report) = match rules_json.as_deref() {
        Some(text) => load_rules(text),
        None => builtin_registry(),
    }
    .map_err(|e| JsValue::from_str(&format!("Failed to load rules: {}", e)))?;

    RULES
        .set(RulesState {
            registry,
            sets: report.sets,
            rejected: report.rejected.len(),
        })
        .map_err(|_| JsValue::from_str("Failed to set rules state"))?;

    Ok(())
}

#[wasm_bindgen]
pub fn bind(origin: &str) -> Result<(), JsValue> {
    let rules = RULES
        .get()
        .ok_or_else(|| JsValue::from_str("Not initialized. Call init first."))?;

    if ENGINE.get().is_some() {
        return Err(JsValue::from_str("Already bound. Reload the page to rebind."));
    }

    let mut engine = Engine::new(&rules.registry, origin);
    engine.set_clock(Box::new(DateClock));
    engine.set_presenter(Some(Box::new(ConsolePresenter)));

    ENGINE
        .set(Mutex::new(engine))
        .map_err(|_| JsValue::from_str("Failed to set engine state"))?;

    Ok(())
}

#[wasm_bindgen]
pub fn is_initialized() -> bool {
    RULES.get().is_some()
}

#[wasm_bindgen]
pub fn is_bound() -> bool {
    ENGINE.get().is_some()
}

#[wasm_bindgen]
pub fn get_rules_info() -> JsValue {
    let result = js_sys::Object::new();
    if let Some(state) = RULES.get() {
        let _ = js_sys::Reflect::set(&result, &"initialized".into(), &JsValue::from(true));
        let _ = js_sys::Reflect::set(&result, &"sets".into(), &JsValue::from(state.sets as u32));
        let _ = js_sys::Reflect::set(&result, &"rejected".into(), &JsValue::from(state.rejected as u32));
    } else {
        let _ = js_sys::Reflect::set(&result, &"initialized".into(), &JsValue::from(false));
    }
    result.into()
}

#[wasm_bindgen]
pub fn hide_css() -> String {
    with_engine(String::new(), |engine| engine.hide_css())
}

#[wasm_bindgen]
pub fn selectors() -> JsValue {
    let result = js_sys::Array::new();
    with_engine((), |engine| {
        for selector in &engine.binding().selectors {
            result.push(&JsValue::from_str(selector));
        }
    });
    result.into()
}

#[wasm_bindgen]
pub fn apply_cosmetics(dom: &JsValue) -> u32 {
    with_engine(0, |engine| {
        let mut host = JsDomHost { obj: dom };
        engine.apply_cosmetics(&mut host) as u32
    })
}

#[wasm_bindgen]
pub fn on_mutation_batch(dom: &JsValue, added: &JsValue) -> u32 {
    let nodes: Vec<JsValue> = js_sys::Array::from(added).iter().collect();
    with_engine(0, |engine| {
        let mut host = JsDomHost { obj: dom };
        engine.on_mutation_batch(&mut host, &nodes) as u32
    })
}

#[wasm_bindgen]
pub fn screen_navigation(surface: &str, url: Option<String>, text: Option<String>) -> bool {
    let surface = match NavSurface::from_str(surface) {
        Some(surface) => surface,
        None => return false,
    };
    with_engine(false, |engine| {
        let url = url.as_deref().unwrap_or("");
        engine.screen_navigation(surface, url, text.as_deref()) == NavDisposition::Suppress
    })
}

#[wasm_bindgen]
pub fn install_patches(globals: &JsValue) -> u32 {
    with_engine(0, |engine| {
        let mut host = JsGlobalsHost { obj: globals };
        engine.install_patches(&mut host) as u32
    })
}

#[wasm_bindgen]
pub fn restore_patches(globals: &JsValue) {
    with_engine((), |engine| {
        let mut host = JsGlobalsHost { obj: globals };
        engine.restore_patches(&mut host);
    });
}

#[wasm_bindgen]
pub fn on_blocked_call(name: &str) {
    with_engine((), |engine| engine.on_blocked_call(name));
}

#[wasm_bindgen]
pub fn screen_script_source(source: &str) -> bool {
    with_engine(false, |engine| {
        engine.screen_script_source(source) == ScriptVerdict::Discard
    })
}

#[wasm_bindgen]
pub fn screen_script_url(url: &str) -> bool {
    with_engine(false, |engine| {
        engine.screen_script_url(url) == ScriptVerdict::Discard
    })
}

#[wasm_bindgen]
pub fn stats() -> JsValue {
    let snapshot = with_engine(StatsSnapshot::default(), |engine| engine.stats());
    let result = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&result, &"schemes".into(), &JsValue::from(snapshot.schemes as u32));
    let _ = js_sys::Reflect::set(&result, &"elements".into(), &JsValue::from(snapshot.elements as u32));
    let _ = js_sys::Reflect::set(&result, &"scripts".into(), &JsValue::from(snapshot.scripts as u32));
    let _ = js_sys::Reflect::set(&result, &"total".into(), &JsValue::from(snapshot.total as u32));
    result.into()
}

#[wasm_bindgen]
pub fn events() -> JsValue {
    let events = with_engine(Vec::new(), |engine| engine.events().to_vec());
    let result = js_sys::Array::new_with_length(events.len() as u32);
    for (i, event) in events.iter().enumerate() {
        let entry = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&entry, &"category".into(), &JsValue::from_str(event.category.as_str()));
        let _ = js_sys::Reflect::set(&entry, &"detail".into(), &JsValue::from_str(&event.detail));
        let _ = js_sys::Reflect::set(&entry, &"atMs".into(), &JsValue::from(event.at_ms as f64));
        result.set(i as u32, entry.into());
    }
    result.into()
}

#[wasm_bindgen]
pub fn set_notifications(enabled: bool) {
    with_engine((), |engine| engine.set_notify_blocks(enabled));
}

#[wasm_bindgen]
pub fn notify(message: &str, severity: &str) {
    let severity = parse_severity(severity);
    with_engine((), |engine| engine.notify(message, severity));
}

fn with_engine<T>(default: T, f: impl FnOnce(&mut Engine) -> T) -> T {
    match ENGINE.get() {
        Some(mutex) => match mutex.lock() {
            Ok(mut engine) => f(&mut engine),
            Err(_) => default,
        },
        None => default,
    }
}

// SystemTime is unavailable on wasm32-unknown-unknown
struct DateClock;

impl Clock for DateClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

struct ConsolePresenter;

impl Presenter for ConsolePresenter {
    fn notify(&mut self, message: &str, severity: Severity) -> Result<(), PresenterError> {
        let line = format!("[PageWarden] {message}");
        match severity {
            Severity::Error => web_sys::console::error_1(&line.into()),
            Severity::Warning => web_sys::console::warn_1(&line.into()),
            Severity::Info | Severity::Success => web_sys::console::log_1(&line.into()),
        }
        Ok(())
    }
}

struct JsDomHost<'a> {
    obj: &'a JsValue,
}

impl JsDomHost<'_> {
    fn method(&self, name: &str) -> Result<js_sys::Function, DomError> {
        let value = js_sys::Reflect::get(self.obj, &name.into())
            .map_err(|e| DomError::Node(js_reason(&e)))?;
        value
            .dyn_into::<js_sys::Function>()
            .map_err(|_| DomError::Node(format!("Host method missing: {name}")))
    }

    fn call1(&self, name: &str, arg: &JsValue) -> Result<JsValue, DomError> {
        self.method(name)?
            .call1(self.obj, arg)
            .map_err(|e| DomError::Node(js_reason(&e)))
    }

    fn call2(&self, name: &str, a: &JsValue, b: &JsValue) -> Result<JsValue, DomError> {
        self.method(name)?
            .call2(self.obj, a, b)
            .map_err(|e| DomError::Node(js_reason(&e)))
    }

    fn anchor_info(value: JsValue) -> Option<AnchorInfo> {
        if value.is_null() || value.is_undefined() {
            return None;
        }
        let href = js_sys::Reflect::get(&value, &"href".into())
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default();
        let text = js_sys::Reflect::get(&value, &"text".into())
            .ok()
            .and_then(|v| v.as_string())
            .unwrap_or_default();
        Some(AnchorInfo { href, text })
    }
}

impl DomHost for JsDomHost<'_> {
    type Node = JsValue;

    fn document_root(&self) -> JsValue {
        self.method("documentRoot")
            .and_then(|f| f.call0(self.obj).map_err(|e| DomError::Node(js_reason(&e))))
            .unwrap_or(JsValue::NULL)
    }

    fn query(&self, root: &JsValue, selector: &str) -> Result<Vec<JsValue>, DomError> {
        let result = self
            .call2("query", root, &JsValue::from_str(selector))
            .map_err(|e| DomError::Selector {
                selector: selector.to_string(),
                reason: e.to_string(),
            })?;
        Ok(js_sys::Array::from(&result).iter().collect())
    }

    fn detach(&mut self, node: &JsValue) -> Result<bool, DomError> {
        Ok(self.call1("detach", node)?.is_truthy())
    }

    fn closest_anchor(&self, node: &JsValue) -> Option<AnchorInfo> {
        self.call1("closestAnchor", node).ok().and_then(Self::anchor_info)
    }

    fn anchor_target(&self, node: &JsValue) -> Option<AnchorInfo> {
        self.call1("anchorTarget", node).ok().and_then(Self::anchor_info)
    }

    fn disarm_link(&mut self, node: &JsValue) -> Result<bool, DomError> {
        Ok(self.call1("disarmLink", node)?.is_truthy())
    }

    fn inject_style(&mut self, id: &str, css: &str) -> Result<(), DomError> {
        self.call2("injectStyle", &JsValue::from_str(id), &JsValue::from_str(css))
            .map_err(|e| DomError::Style(e.to_string()))?;
        Ok(())
    }
}

struct JsGlobalsHost<'a> {
    obj: &'a JsValue,
}

impl JsGlobalsHost<'_> {
    fn call(&self, name: &str, args: &[&JsValue]) -> Result<JsValue, DomError> {
        let value = js_sys::Reflect::get(self.obj, &name.into())
            .map_err(|e| DomError::Patch(js_reason(&e)))?;
        let function = value
            .dyn_into::<js_sys::Function>()
            .map_err(|_| DomError::Patch(format!("Host method missing: {name}")))?;
        let result = match args {
            [] => function.call0(self.obj),
            [a] => function.call1(self.obj, a),
            _ => function.call2(self.obj, args[0], args[1]),
        };
        result.map_err(|e| DomError::Patch(js_reason(&e)))
    }

    fn outcome(value: JsValue) -> PatchOutcome {
        match value.as_string().as_deref() {
            Some("installed") => PatchOutcome::Installed,
            Some("already") => PatchOutcome::AlreadyWrapped,
            _ => PatchOutcome::Missing,
        }
    }
}

impl GlobalsHost for JsGlobalsHost<'_> {
    fn wrap_callable(&mut self, name: &str) -> Result<PatchOutcome, DomError> {
        self.call("wrapCallable", &[&JsValue::from_str(name)])
            .map(Self::outcome)
    }

    fn unwrap_callable(&mut self, name: &str) -> Result<(), DomError> {
        self.call("unwrapCallable", &[&JsValue::from_str(name)])
            .map(|_| ())
    }

    fn hook_script_creation(&mut self) -> Result<PatchOutcome, DomError> {
        self.call("hookScriptCreation", &[]).map(Self::outcome)
    }

    fn unhook_script_creation(&mut self) -> Result<(), DomError> {
        self.call("unhookScriptCreation", &[]).map(|_| ())
    }
}

fn js_reason(value: &JsValue) -> String {
    value.as_string().unwrap_or_else(|| format!("{value:?}"))
}

fn parse_severity(severity: &str) -> Severity {
    match severity {
        "success" => Severity::Success,
        "warning" | "warn" => Severity::Warning,
        "error" => Severity::Error,
        _ => Severity::Info,
    }
}
