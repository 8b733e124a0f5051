//! # RecycLens Core
//!
//! Offline-first core for a camera-driven recycling assistant, designed
//! for FFI integration with mobile shells (Expo, Flutter and friends).
//! Built on LMDB for stability across hot restarts, with a blocking HTTP
//! layer for the hosted ranking and detection services.
//!
//! ## What lives here
//!
//! - **Pseudonymous identity**: a persisted device identifier and the
//!   deterministic adjective-noun display name derived from it
//! - **Score**: local-first point tracking with best-effort forwarding
//!   to the ranking service
//! - **History**: the classification log, stored as JSON in LMDB
//! - **Leaderboard**: remote top-N reconciliation with an offline
//!   fallback board
//! - **Classification**: keyword recyclability rules, per-material
//!   guidance and the detection upload client
//!
//! ## Quick Start
//!
//! ```no_run
//! use recyclens_core::{create_app, get_display_name, free_string};
//! use std::ffi::CString;
//!
//! let name = CString::new("recyclens").unwrap();
//! let app = create_app(name.as_ptr());
//!
//! let result = get_display_name(app);
//! // result is a JSON AppResponse envelope, e.g. {"Ok":"Swift Panda"}
//! free_string(result as *mut _);
//! ```
//!
//! ## FFI conventions
//!
//! Every function takes and returns null-terminated C strings. Returned
//! strings carry a JSON-serialized [`AppResponse`] envelope and are
//! owned by the caller; release them with [`free_string`]. Null
//! pointers, invalid UTF-8 and malformed JSON never crash — they come
//! back as `BadRequest`/`SerializationError` envelopes.

pub mod app_response;
pub mod app_state;
pub mod classify;
pub mod history;
pub mod identity;
pub mod leaderboard;
pub mod local_store;
pub mod models;
pub mod score;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use log::{info, warn};

use crate::app_response::AppResponse;
use crate::app_state::AppState;
use crate::models::{AppConfig, Classification, HistoryItemInput};

/// Creates an app instance with the production service endpoints.
///
/// Opens (or creates) the `<name>.lmdb` store directory next to the
/// app's working directory and resolves the installation identity.
///
/// # Returns
///
/// A pointer to the [`AppState`] on success, or null on failure. The
/// caller owns the pointer for the lifetime of the app.
///
/// # Safety
///
/// `name` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_app(name: *const c_char) -> *mut AppState {
    create_app_with_config(name, std::ptr::null())
}

/// Creates an app instance with a JSON configuration.
///
/// The configuration selects the service endpoints and detector
/// credentials; absent fields keep their production defaults:
///
/// ```json
/// {
///   "rankingBaseUrl": "https://staging.example.com",
///   "detector": { "apiKey": "...", "model": "...", "version": "1" }
/// }
/// ```
///
/// Passing a null or empty `config_json` is equivalent to
/// [`create_app`].
///
/// # Returns
///
/// A pointer to the [`AppState`], or null when the name is missing, the
/// configuration does not parse, or the store cannot be opened.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_app_with_config(
    name: *const c_char,
    config_json: *const c_char,
) -> *mut AppState {
    if name.is_null() {
        warn!("Null name pointer passed to create_app");
        return std::ptr::null_mut();
    }

    let name_str = match unsafe { CStr::from_ptr(name).to_str() } {
        Ok(s) => s,
        Err(e) => {
            warn!("Invalid UTF-8 in name parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    let config = if config_json.is_null() {
        AppConfig::default()
    } else {
        let raw = match unsafe { CStr::from_ptr(config_json).to_str() } {
            Ok(s) => s,
            Err(e) => {
                warn!("Invalid UTF-8 in config parameter: {e}");
                return std::ptr::null_mut();
            }
        };
        if raw.trim().is_empty() {
            AppConfig::default()
        } else {
            match serde_json::from_str::<AppConfig>(raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Invalid app configuration: {e}");
                    return std::ptr::null_mut();
                }
            }
        }
    };

    info!("Initializing app core at: {name_str}.lmdb");
    match AppState::init(name_str, config) {
        Ok(state) => {
            info!("✅ App core initialized successfully");
            Box::into_raw(Box::new(state))
        }
        Err(e) => {
            warn!("❌ Failed to initialize app core: {e}");
            std::ptr::null_mut()
        }
    }
}

/// The installation's derived display name, e.g. `"Swift Panda"`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_display_name(state: *mut AppState) -> *const c_char {
    let state = match state_ref(state, "get_display_name") {
        Ok(s) => s,
        Err(err) => return err,
    };
    response_to_c_string(&AppResponse::success(state.identity().display_name()))
}

/// The raw persisted device identifier. Seed material only — never show
/// this to the user.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_device_identifier(state: *mut AppState) -> *const c_char {
    let state = match state_ref(state, "get_device_identifier") {
        Ok(s) => s,
        Err(err) => return err,
    };
    response_to_c_string(&AppResponse::success(state.identity().device_id()))
}

/// Current local score as a decimal string. Missing or unreadable
/// storage reads as `"0"`.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_user_score(state: *mut AppState) -> *const c_char {
    let state = match state_ref(state, "get_user_score") {
        Ok(s) => s,
        Err(err) => return err,
    };
    response_to_c_string(&AppResponse::success(state.scores().get().to_string()))
}

/// Adds `points` to the local score and forwards the new total to the
/// ranking service. The local write decides the outcome; a failed
/// forward is logged and swallowed.
///
/// # Returns
///
/// `Ok` envelope carrying the new local total as a decimal string.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_points(state: *mut AppState, points: i64) -> *const c_char {
    let state = match state_ref(state, "add_points") {
        Ok(s) => s,
        Err(err) => return err,
    };
    match state.scores().add_points(points) {
        Ok(total) => response_to_c_string(&AppResponse::success(total.to_string())),
        Err(e) => response_to_c_string(&e),
    }
}

/// Awards the fixed bounty for a completed classification.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn award_classification_points(state: *mut AppState) -> *const c_char {
    let state = match state_ref(state, "award_classification_points") {
        Ok(s) => s,
        Err(err) => return err,
    };
    match state.scores().award_classification() {
        Ok(total) => response_to_c_string(&AppResponse::success(total.to_string())),
        Err(e) => response_to_c_string(&e),
    }
}

/// Awards the fixed bonus for submitted prediction feedback.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn award_feedback_points(state: *mut AppState) -> *const c_char {
    let state = match state_ref(state, "award_feedback_points") {
        Ok(s) => s,
        Err(err) => return err,
    };
    match state.scores().award_feedback() {
        Ok(total) => response_to_c_string(&AppResponse::success(total.to_string())),
        Err(e) => response_to_c_string(&e),
    }
}

/// Clears the persisted score back to zero.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reset_user_score(state: *mut AppState) -> *const c_char {
    let state = match state_ref(state, "reset_user_score") {
        Ok(s) => s,
        Err(err) => return err,
    };
    match state.scores().reset() {
        Ok(()) => response_to_c_string(&AppResponse::success("Score reset")),
        Err(e) => response_to_c_string(&e),
    }
}

/// Stores a classification event in the history.
///
/// Expects the caller-supplied portion of the item; id and timestamp
/// are assigned here:
///
/// ```json
/// {
///   "thumbnailUri": "file:///...thumb.jpg",
///   "originalUri": "file:///...full.jpg",
///   "classification": "recyclable",
///   "confidence": 0.93,
///   "className": "plastic_bottle"
/// }
/// ```
///
/// # Returns
///
/// `Ok` envelope carrying the stored item (with its assigned id) as
/// JSON. A `DatabaseError` here is best-effort-failed: the caller
/// should log it and continue the classification flow.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn save_history_item(
    state: *mut AppState,
    json_ptr: *const c_char,
) -> *const c_char {
    let state = match state_ref(state, "save_history_item") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let json_str = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(s) => s,
        Err(err) => return err,
    };

    let input: HistoryItemInput = match serde_json::from_str(&json_str) {
        Ok(input) => input,
        Err(e) => {
            let error = AppResponse::SerializationError(format!("Invalid history item: {e}"));
            return response_to_c_string(&error);
        }
    };

    match state.history().save(input) {
        Ok(item) => match serde_json::to_string(&item) {
            Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
            Err(e) => response_to_c_string(&AppResponse::from(e)),
        },
        Err(e) => response_to_c_string(&e),
    }
}

/// The stored history, newest first, as a JSON array. Corrupt or absent
/// data reads as an empty array, never an error.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_history(state: *mut AppState) -> *const c_char {
    let state = match state_ref(state, "get_history") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let items = state.history().list();
    match serde_json::to_string(&items) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Removes one history item by id. A missing id is a no-op, not an
/// error.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_history_item(state: *mut AppState, id: *const c_char) -> *const c_char {
    let state = match state_ref(state, "delete_history_item") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let id_str = match c_ptr_to_string(id, "id") {
        Ok(s) => s,
        Err(err) => return err,
    };
    match state.history().delete_by_id(&id_str) {
        Ok(()) => response_to_c_string(&AppResponse::success("History item removed")),
        Err(e) => response_to_c_string(&e),
    }
}

/// Irreversibly clears the whole history.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn clear_history(state: *mut AppState) -> *const c_char {
    let state = match state_ref(state, "clear_history") {
        Ok(s) => s,
        Err(err) => return err,
    };
    match state.history().clear() {
        Ok(()) => response_to_c_string(&AppResponse::success("History cleared")),
        Err(e) => response_to_c_string(&e),
    }
}

/// The reconciled leaderboard as a JSON array, ordered by score
/// descending with contiguous ranks.
///
/// When the ranking service is reachable this is the remote top-20 with
/// the current user highlighted (and appended when they have points but
/// no remote record yet). When it is not, the board is reconstructed
/// from the cached fallback ranking — or synthesized placeholders on a
/// cold start — plus the local score. This call never fails over the
/// network: unreachable simply means fallback.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_leaderboard(state: *mut AppState) -> *const c_char {
    let state = match state_ref(state, "get_leaderboard") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let entries = state.leaderboard().get_leaderboard();
    match serde_json::to_string(&entries) {
        Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// One user's remote ranking record by display name.
///
/// # Returns
///
/// `Ok` with the entry as JSON, or `NotFound` when the service has no
/// record or cannot be reached — "not yet ranked" is a valid outcome.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_user_entry(state: *mut AppState, name: *const c_char) -> *const c_char {
    let state = match state_ref(state, "get_user_entry") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let name_str = match c_ptr_to_string(name, "name") {
        Ok(s) => s,
        Err(err) => return err,
    };
    match state.leaderboard().get_user_entry(&name_str) {
        Some(entry) => match serde_json::to_string(&entry) {
            Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
            Err(e) => response_to_c_string(&AppResponse::from(e)),
        },
        None => {
            let not_found = AppResponse::NotFound(format!("No ranking record for: {name_str}"));
            response_to_c_string(&not_found)
        }
    }
}

/// Uploads a captured image to the hosted detection model.
///
/// `data`/`len` describe an encoded image buffer (the shell's JPEG).
///
/// # Returns
///
/// `Ok` envelope carrying the prediction list as JSON, or
/// `ValidationError` when no API key is configured, `NetworkError` on
/// timeout/transport/status failures.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn classify_image(
    state: *mut AppState,
    data: *const u8,
    len: usize,
) -> *const c_char {
    let state = match state_ref(state, "classify_image") {
        Ok(s) => s,
        Err(err) => return err,
    };
    if data.is_null() {
        let error =
            AppResponse::BadRequest("Null image pointer passed to classify_image".to_string());
        return response_to_c_string(&error);
    }

    let image = unsafe { std::slice::from_raw_parts(data, len) };
    match state.detector().detect(image) {
        Ok(outcome) => match serde_json::to_string(&outcome) {
            Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
            Err(e) => response_to_c_string(&AppResponse::from(e)),
        },
        Err(e) => response_to_c_string(&e),
    }
}

/// Maps a predicted label to its recyclability class. Pure; no state
/// required.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn classify_label(label: *const c_char) -> *const c_char {
    let label_str = match c_ptr_to_string(label, "label") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let classification = classify::classify_recyclability(&label_str);
    response_to_c_string(&AppResponse::success(classification.as_str()))
}

/// Disposal guidance text for a predicted label. Pure.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn recycling_advice_for(label: *const c_char) -> *const c_char {
    let label_str = match c_ptr_to_string(label, "label") {
        Ok(s) => s,
        Err(err) => return err,
    };
    response_to_c_string(&AppResponse::success(classify::recycling_advice(&label_str)))
}

/// Display color (hex) for a classification string. Unrecognized input
/// gets the `unknown` color.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn classification_color_for(classification: *const c_char) -> *const c_char {
    let raw = match c_ptr_to_string(classification, "classification") {
        Ok(s) => s,
        Err(err) => return err,
    };
    let parsed = match raw.trim().to_lowercase().as_str() {
        "recyclable" => Classification::Recyclable,
        "compostable" => Classification::Compostable,
        "landfill" => Classification::Landfill,
        _ => Classification::Unknown,
    };
    response_to_c_string(&AppResponse::success(history::classification_color(parsed)))
}

/// Formats an epoch-millis timestamp relative to now ("just now",
/// "5 minutes ago", …). Pure aside from reading the clock.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn format_relative_time(timestamp_millis: i64) -> *const c_char {
    let now = chrono::Utc::now().timestamp_millis();
    response_to_c_string(&AppResponse::success(history::relative_timestamp(
        timestamp_millis,
        now,
    )))
}

/// Clears the persisted device identifier; the next launch mints a new
/// identity. Maintenance call — the running instance keeps its loaded
/// identity.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reset_device_identity(state: *mut AppState) -> *const c_char {
    let state = match state_ref(state, "reset_device_identity") {
        Ok(s) => s,
        Err(err) => return err,
    };
    match state.reset_identity() {
        Ok(()) => response_to_c_string(&AppResponse::success("Device identity cleared")),
        Err(e) => response_to_c_string(&e),
    }
}

/// Irreversibly wipes all persisted data: identity, score, history and
/// the cached fallback leaderboard.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn wipe_app_data(state: *mut AppState) -> *const c_char {
    let state = match state_ref(state, "wipe_app_data") {
        Ok(s) => s,
        Err(err) => return err,
    };
    match state.wipe_all_data() {
        Ok(()) => response_to_c_string(&AppResponse::success("All app data wiped")),
        Err(e) => response_to_c_string(&e),
    }
}

/// Flushes the store to disk so the shell can tear down (or hot-restart)
/// at a durable point. The environment itself is released when the
/// process unloads the library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_app(state: *mut AppState) -> *const c_char {
    let state = match state_ref(state, "close_app") {
        Ok(s) => s,
        Err(err) => return err,
    };
    match state.close() {
        Ok(()) => response_to_c_string(&AppResponse::success("App core flushed and closed")),
        Err(e) => response_to_c_string(&e),
    }
}

/// Releases a string previously returned by this library. Passing null
/// is a no-op.
///
/// # Safety
///
/// The pointer must have been produced by this library and not already
/// freed.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr));
    }
}

/// Serializes an [`AppResponse`] into a caller-owned C string.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Null-safe, UTF-8-checked conversion of an incoming C string.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}

/// Null-checked access to the app state behind an FFI pointer.
fn state_ref<'a>(state: *mut AppState, caller: &str) -> Result<&'a AppState, *const c_char> {
    match unsafe { state.as_ref() } {
        Some(s) => Ok(s),
        None => {
            let error = AppResponse::BadRequest(format!("Null state pointer passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}
