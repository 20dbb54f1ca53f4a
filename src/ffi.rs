//! FFI bindings for Screenlens
//!
//! This module provides C-compatible functions for calling Screenlens from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `screenlens_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::pipeline::UsageAnalyzer;
use crate::sections::Section;
use crate::types::Metric;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Serialize a result to a C string, recording the error on failure
fn json_result<T: Serialize>(result: Result<T, AnalysisError>) -> *mut c_char {
    let json = result.and_then(|value| serde_json::to_string(&value).map_err(AnalysisError::from));
    match json {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Read an optional configuration; NULL means defaults
unsafe fn config_from_ptr(config_json: *const c_char) -> Result<AnalysisConfig, AnalysisError> {
    if config_json.is_null() {
        return Ok(AnalysisConfig::default());
    }
    match cstr_to_string(config_json) {
        Some(json) => AnalysisConfig::from_json(&json),
        None => Err(AnalysisError::InvalidConfig(
            "configuration is not valid UTF-8".to_string(),
        )),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze a CSV table and return the report JSON.
///
/// # Safety
/// - `csv` must be a valid null-terminated C string.
/// - `config_json` must be a valid null-terminated C string or NULL for defaults.
/// - Returns a newly allocated string that must be freed with `screenlens_free_string`.
/// - Returns NULL on error; call `screenlens_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn screenlens_analyze_csv(
    csv: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let csv_str = match cstr_to_string(csv) {
        Some(s) => s,
        None => {
            set_last_error("Invalid CSV string pointer");
            return ptr::null_mut();
        }
    };

    let result = config_from_ptr(config_json)
        .and_then(|config| UsageAnalyzer::from_csv_str(&csv_str, config))
        .and_then(|analyzer| analyzer.report());
    json_result(result)
}

// ============================================================================
// Stateful Analyzer API
// ============================================================================

/// Opaque handle to a UsageAnalyzer
pub struct ScreenlensAnalyzerHandle {
    analyzer: UsageAnalyzer,
}

/// Load a CSV snapshot into a new analyzer.
///
/// # Safety
/// - `csv` must be a valid null-terminated C string.
/// - `config_json` must be a valid null-terminated C string or NULL for defaults.
/// - Must be freed with `screenlens_analyzer_free`.
/// - Returns NULL on error; call `screenlens_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn screenlens_analyzer_new(
    csv: *const c_char,
    config_json: *const c_char,
) -> *mut ScreenlensAnalyzerHandle {
    clear_last_error();

    let csv_str = match cstr_to_string(csv) {
        Some(s) => s,
        None => {
            set_last_error("Invalid CSV string pointer");
            return ptr::null_mut();
        }
    };

    match config_from_ptr(config_json).and_then(|config| UsageAnalyzer::from_csv_str(&csv_str, config)) {
        Ok(analyzer) => Box::into_raw(Box::new(ScreenlensAnalyzerHandle { analyzer })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an analyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `screenlens_analyzer_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn screenlens_analyzer_free(analyzer: *mut ScreenlensAnalyzerHandle) {
    if !analyzer.is_null() {
        drop(Box::from_raw(analyzer));
    }
}

/// Build the full report JSON from an analyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `screenlens_analyzer_new`.
/// - Returns a newly allocated string that must be freed with `screenlens_free_string`.
/// - Returns NULL on error; call `screenlens_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn screenlens_analyzer_report(
    analyzer: *const ScreenlensAnalyzerHandle,
) -> *mut c_char {
    clear_last_error();

    if analyzer.is_null() {
        set_last_error("Null analyzer pointer");
        return ptr::null_mut();
    }

    json_result((*analyzer).analyzer.report())
}

/// Render one section (by name, e.g. "regression") as JSON.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `screenlens_analyzer_new`.
/// - `section` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `screenlens_free_string`.
/// - Returns NULL on error; call `screenlens_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn screenlens_analyzer_section(
    analyzer: *const ScreenlensAnalyzerHandle,
    section: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if analyzer.is_null() {
        set_last_error("Null analyzer pointer");
        return ptr::null_mut();
    }

    let section_str = match cstr_to_string(section) {
        Some(s) => s,
        None => {
            set_last_error("Invalid section string pointer");
            return ptr::null_mut();
        }
    };

    let handle = &*analyzer;
    json_result(
        section_str
            .parse::<Section>()
            .and_then(|section| handle.analyzer.section(section)),
    )
}

/// Per-class summary of a metric (by name, e.g. "engagement_ratio_clipped") as JSON.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `screenlens_analyzer_new`.
/// - `metric` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `screenlens_free_string`.
/// - Returns NULL on error; call `screenlens_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn screenlens_analyzer_class_means(
    analyzer: *const ScreenlensAnalyzerHandle,
    metric: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if analyzer.is_null() {
        set_last_error("Null analyzer pointer");
        return ptr::null_mut();
    }

    let metric_str = match cstr_to_string(metric) {
        Some(s) => s,
        None => {
            set_last_error("Invalid metric string pointer");
            return ptr::null_mut();
        }
    };

    let handle = &*analyzer;
    json_result(
        metric_str
            .parse::<Metric>()
            .and_then(|metric| handle.analyzer.class_means(metric)),
    )
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Screenlens functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Screenlens function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn screenlens_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Screenlens function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn screenlens_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Screenlens library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn screenlens_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
