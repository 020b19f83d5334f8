#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;
pub mod merge;
pub mod transfer;

use std::fmt;

use merge::{AssetGraph, MergeError, MergeOptions, MergeReport, Merger, TaskLayerRegistry, TransferMapping, parse_config};
use serde::Serialize;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Merge `source` into `target` with an explicit registry and options.
pub fn merge_graphs(
    source: &AssetGraph,
    target: &mut AssetGraph,
    mapping: &TransferMapping,
    registry: &TaskLayerRegistry,
    options: MergeOptions,
) -> Result<MergeReport, MergeError> {
    Merger::new(registry, options).merge(source, target, mapping)
}

#[derive(Debug, Serialize)]
struct MergeOutput<'a> {
    target: &'a AssetGraph,
    report: &'a MergeReport,
}

/// Public entry point for JS consumers.
#[wasm_bindgen]
pub struct MergeEngine {
    registry: TaskLayerRegistry,
    options: MergeOptions,
    last_report: Option<MergeReport>,
}

#[wasm_bindgen]
impl MergeEngine {
    /// Engine with the built-in task layers.
    #[wasm_bindgen(constructor)]
    pub fn new() -> MergeEngine {
        MergeEngine {
            registry: TaskLayerRegistry::builtin(),
            options: MergeOptions::default(),
            last_report: None,
        }
    }

    /// Engine with the task layers and options of a `<taskLayers>` document.
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(xml: &str) -> Result<MergeEngine, JsValue> {
        let config = parse_config(xml).map_err(to_js_error)?;
        debug_log!("task layers: {:?}", config.registry.names());
        Ok(MergeEngine {
            registry: config.registry,
            options: config.options,
            last_report: None,
        })
    }

    /// Layer names in the order they run.
    #[wasm_bindgen(js_name = layerNames)]
    pub fn layer_names(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.registry.names()).map_err(to_js_error)
    }

    /// Merges `source` into `target` and returns `{ target, report }`.
    ///
    /// Without a mapping, entities and collections are paired by name.
    #[wasm_bindgen]
    pub fn merge(&mut self, source: JsValue, target: JsValue, mapping: JsValue) -> Result<JsValue, JsValue> {
        let source: AssetGraph = serde_wasm_bindgen::from_value(source).map_err(to_js_error)?;
        let mut target: AssetGraph = serde_wasm_bindgen::from_value(target).map_err(to_js_error)?;
        let mapping = if mapping.is_undefined() || mapping.is_null() {
            TransferMapping::match_by_name(&source, &target)
        } else {
            serde_wasm_bindgen::from_value(mapping).map_err(to_js_error)?
        };

        let report = merge_graphs(&source, &mut target, &mapping, &self.registry, self.options).map_err(to_js_error)?;
        debug_log!("{report}");
        let output = serde_wasm_bindgen::to_value(&MergeOutput {
            target: &target,
            report: &report,
        })
        .map_err(to_js_error)?;
        self.last_report = Some(report);
        Ok(output)
    }

    /// Report of the most recent merge, or `null`.
    #[wasm_bindgen(js_name = lastReport)]
    pub fn last_report(&self) -> Result<JsValue, JsValue> {
        match &self.last_report {
            Some(report) => serde_wasm_bindgen::to_value(report).map_err(to_js_error),
            None => Ok(JsValue::NULL),
        }
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
