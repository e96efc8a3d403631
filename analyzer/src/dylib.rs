//! Loads the native analyzer via `libloading`.
//!
//! The library exports `swift_analyzer_init`, returning a C vtable. The
//! wire encoding of the native library's own messages is opaque; values
//! cross this seam as NUL-terminated JSON (see [`Value::to_json`]).
//! A response object carrying an `"error"` string member is a failed
//! request.

use std::ffi::{CStr, CString, c_char, c_void};
use std::path::Path;
use std::sync::Mutex;

use libloading::{Library, Symbol};

use crate::service::{
    AnalyzerError, AnalyzerService, Completion, NotificationHandler, RequestHandle,
};
use crate::value::Value;

/// Bumped whenever the vtable layout changes.
pub const ANALYZER_ABI_VERSION: u32 = 1;

const ENTRY_SYMBOL: &[u8] = b"swift_analyzer_init";

/// Completion callback: `response` is borrowed for the duration of the
/// call and owned by the analyzer.
pub type RawDoneFn = unsafe extern "C" fn(ctx: *mut c_void, response: *const c_char);

/// Notification callback, same borrowing rule as [`RawDoneFn`].
pub type RawNotifyFn = unsafe extern "C" fn(ctx: *mut c_void, notification: *const c_char);

/// The vtable returned by `swift_analyzer_init`.
///
/// All functions must be callable from any thread. Strings returned by
/// `send_sync` are owned by the caller and released via `free_string`.
#[repr(C)]
pub struct RawAnalyzer {
    pub abi_version: u32,
    pub initialize: unsafe extern "C" fn() -> i32,
    pub shutdown: unsafe extern "C" fn(),
    pub send_sync: unsafe extern "C" fn(request: *const c_char) -> *mut c_char,
    pub send: unsafe extern "C" fn(request: *const c_char, ctx: *mut c_void, done: RawDoneFn) -> u64,
    pub cancel: unsafe extern "C" fn(handle: u64),
    pub set_notification: unsafe extern "C" fn(ctx: *mut c_void, callback: Option<RawNotifyFn>),
    pub free_string: unsafe extern "C" fn(s: *mut c_char),
}

/// A loaded native analyzer.
#[derive(Debug)]
pub struct DylibAnalyzer {
    /// Valid for the lifetime of `_lib`.
    vtable: *const RawAnalyzer,
    /// Leaked notification context, reclaimed when the slot is cleared.
    notification_ctx: Mutex<Option<*mut NotificationHandler>>,
    _lib: Library,
}

// SAFETY: the ABI requires every vtable function to be thread-safe, the
// vtable pointer stays valid while `_lib` is alive, and the notification
// context pointer is only touched under the mutex.
unsafe impl Send for DylibAnalyzer {}
unsafe impl Sync for DylibAnalyzer {}

impl DylibAnalyzer {
    /// Load and initialize the analyzer library at `path`.
    pub fn load(path: &Path) -> Result<Self, AnalyzerError> {
        // SAFETY: loading runs arbitrary library constructors; the path
        // comes from trusted configuration.
        let lib = unsafe { Library::new(path) }
            .map_err(|e| AnalyzerError::Load(format!("{}: {e}", path.display())))?;

        // SAFETY: the symbol signature is fixed by the ABI contract.
        let entry: Symbol<unsafe extern "C" fn() -> *const RawAnalyzer> = unsafe {
            lib.get(ENTRY_SYMBOL)
                .map_err(|e| AnalyzerError::Load(format!("missing swift_analyzer_init: {e}")))?
        };

        // SAFETY: entry resolved above; a null vtable is a load failure.
        let vtable = unsafe { entry() };
        if vtable.is_null() {
            return Err(AnalyzerError::Load(
                "swift_analyzer_init returned null".to_string(),
            ));
        }

        // SAFETY: non-null vtable from a successful init call.
        let raw = unsafe { &*vtable };
        if raw.abi_version != ANALYZER_ABI_VERSION {
            return Err(AnalyzerError::Load(format!(
                "analyzer ABI mismatch: expected {ANALYZER_ABI_VERSION}, got {}",
                raw.abi_version
            )));
        }

        // SAFETY: vtable verified above.
        if unsafe { (raw.initialize)() } != 0 {
            return Err(AnalyzerError::Load("analyzer initialize failed".to_string()));
        }

        Ok(Self {
            vtable,
            notification_ctx: Mutex::new(None),
            _lib: lib,
        })
    }

    fn raw(&self) -> &RawAnalyzer {
        // SAFETY: validated non-null in `load`; `_lib` keeps it alive.
        unsafe { &*self.vtable }
    }

    fn clear_notification_locked(&self, slot: &mut Option<*mut NotificationHandler>) {
        if let Some(ctx) = slot.take() {
            // SAFETY: detach the callback before reclaiming its context so
            // the analyzer cannot race a notification into freed memory.
            unsafe {
                (self.raw().set_notification)(std::ptr::null_mut(), None);
                drop(Box::from_raw(ctx));
            }
        }
    }
}

fn encode_request(request: &Value) -> Result<CString, AnalyzerError> {
    // serde_json escapes interior NULs, so this only fails on a broken
    // encoder; surface it rather than unwrap.
    CString::new(request.to_json().to_string())
        .map_err(|e| AnalyzerError::RequestFailed(format!("unencodable request: {e}")))
}

/// Decode a response string. Null means the analyzer connection died.
///
/// # Safety
/// `response`, when non-null, must point at a NUL-terminated buffer valid
/// for the duration of the call.
unsafe fn decode_response(response: *const c_char) -> Result<Value, AnalyzerError> {
    if response.is_null() {
        return Err(AnalyzerError::ConnectionInterrupted);
    }
    // SAFETY: non-null and NUL-terminated per the caller contract.
    let text = unsafe { CStr::from_ptr(response) }.to_string_lossy();
    let json: serde_json::Value = serde_json::from_str(&text)
        .map_err(|e| AnalyzerError::RequestFailed(format!("undecodable response: {e}")))?;
    classify_response(&json)
}

fn classify_response(json: &serde_json::Value) -> Result<Value, AnalyzerError> {
    if let Some(message) = json.get("error").and_then(serde_json::Value::as_str) {
        return Err(AnalyzerError::RequestFailed(message.to_string()));
    }
    Ok(Value::from_json(json))
}

unsafe extern "C" fn done_trampoline(ctx: *mut c_void, response: *const c_char) {
    if ctx.is_null() {
        return;
    }
    // SAFETY: ctx is the Box<Completion> leaked in `send`; the analyzer
    // invokes the callback exactly once.
    let on_done = unsafe { Box::from_raw(ctx.cast::<Completion>()) };
    // SAFETY: response validity is the analyzer's side of the contract.
    let outcome = unsafe { decode_response(response) };
    on_done(outcome);
}

unsafe extern "C" fn notify_trampoline(ctx: *mut c_void, notification: *const c_char) {
    if ctx.is_null() || notification.is_null() {
        return;
    }
    // SAFETY: ctx is the leaked NotificationHandler installed in
    // `set_notification_handler`, detached before it is reclaimed.
    let handler = unsafe { &*ctx.cast::<NotificationHandler>() };
    // SAFETY: NUL-terminated per the callback contract.
    let text = unsafe { CStr::from_ptr(notification) }.to_string_lossy();
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => handler(Value::from_json(&json)),
        Err(e) => tracing::debug!("dropping undecodable analyzer notification: {e}"),
    }
}

impl AnalyzerService for DylibAnalyzer {
    fn send_sync(&self, request: Value) -> Result<Value, AnalyzerError> {
        let payload = encode_request(&request)?;
        // SAFETY: payload outlives the call; the returned string is ours
        // to free.
        let raw = unsafe { (self.raw().send_sync)(payload.as_ptr()) };
        // SAFETY: decode borrows before free; free accepts the pointer we
        // were handed (null is rejected by decode first).
        let outcome = unsafe { decode_response(raw) };
        if !raw.is_null() {
            // SAFETY: non-null string returned by this vtable.
            unsafe { (self.raw().free_string)(raw) };
        }
        outcome
    }

    fn send(&self, request: Value, on_done: Completion) -> RequestHandle {
        let payload = match encode_request(&request) {
            Ok(payload) => payload,
            Err(e) => {
                on_done(Err(e));
                return RequestHandle(0);
            }
        };
        let ctx = Box::into_raw(Box::new(on_done)).cast::<c_void>();
        // SAFETY: ctx ownership transfers to the analyzer until the done
        // callback fires.
        let handle = unsafe { (self.raw().send)(payload.as_ptr(), ctx, done_trampoline) };
        RequestHandle(handle)
    }

    fn cancel(&self, handle: RequestHandle) {
        // SAFETY: cancel tolerates unknown/completed handles per the ABI.
        unsafe { (self.raw().cancel)(handle.0) };
    }

    fn set_notification_handler(&self, handler: Option<NotificationHandler>) {
        let mut slot = self
            .notification_ctx
            .lock()
            .expect("notification slot poisoned");
        self.clear_notification_locked(&mut slot);
        if let Some(handler) = handler {
            let ctx = Box::into_raw(Box::new(handler));
            // SAFETY: ctx stays alive until the slot is cleared.
            unsafe { (self.raw().set_notification)(ctx.cast::<c_void>(), Some(notify_trampoline)) };
            *slot = Some(ctx);
        }
    }
}

impl Drop for DylibAnalyzer {
    fn drop(&mut self) {
        let mut slot = self
            .notification_ctx
            .lock()
            .expect("notification slot poisoned");
        self.clear_notification_locked(&mut slot);
        // SAFETY: final use of the vtable; `_lib` unloads afterwards.
        unsafe { (self.raw().shutdown)() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_library_fails() {
        let err = DylibAnalyzer::load(Path::new("/nonexistent/libswiftanalyzer.so")).unwrap_err();
        assert!(matches!(err, AnalyzerError::Load(_)));
    }

    #[test]
    fn test_load_non_library_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"definitely not a shared object").unwrap();
        let err = DylibAnalyzer::load(file.path()).unwrap_err();
        assert!(matches!(err, AnalyzerError::Load(_)));
    }

    #[test]
    fn test_classify_response_error_member() {
        let json = serde_json::json!({ "error": "unknown request" });
        let err = classify_response(&json).unwrap_err();
        assert!(matches!(err, AnalyzerError::RequestFailed(m) if m == "unknown request"));
    }

    #[test]
    fn test_classify_response_success() {
        let json = serde_json::json!({ "key.name": "foo" });
        let value = classify_response(&json).unwrap();
        assert_eq!(value.string(&crate::uid::Uid::intern("key.name")), Some("foo"));
    }

    #[test]
    fn test_decode_null_is_interrupted() {
        // SAFETY: null is the documented "connection died" signal.
        let err = unsafe { decode_response(std::ptr::null()) }.unwrap_err();
        assert!(matches!(err, AnalyzerError::ConnectionInterrupted));
    }
}
