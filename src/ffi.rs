//! C interface over the [global](crate::registry::global) registry.
//!
//! Construction calls return a positive handle or a negative [Status] code, every other call
//! returns a status. Buffers are only read or written for the duration of the call. Panics are
//! caught and reported as [Status::Panic] instead of unwinding into the caller.

use std::convert::TryFrom;
use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::slice;

use log::{error, warn};

use crate::config::NetConfig;
use crate::error::{NetError, Result, Status};
use crate::registry::{self, NetworkHandle};

/// Runs `f`, turning errors and panics into status codes.
fn guard<F>(call: &str, f: F) -> i32
where
    F: FnOnce() -> Result<i32>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(code)) => code,
        Ok(Err(e)) => {
            warn!("{} rejected: {}", call, e);
            e.status().code()
        }
        Err(_) => {
            error!("{} panicked", call);
            Status::Panic.code()
        }
    }
}

fn to_len(len: i32) -> Result<usize> {
    usize::try_from(len)
        .map_err(|_| NetError::InvalidArgument(format!("negative length {}", len)))
}

/// # Safety
/// `ptr` must be null or valid for reads of `len` elements.
unsafe fn as_slice<'a, T>(ptr: *const T, len: i32) -> Result<&'a [T]> {
    let len = to_len(len)?;
    if ptr.is_null() {
        if len == 0 {
            return Ok(&[]);
        }
        return Err(NetError::InvalidArgument("null buffer".into()));
    }
    Ok(slice::from_raw_parts(ptr, len))
}

/// # Safety
/// `ptr` must be null or valid for writes of `len` elements.
unsafe fn as_slice_mut<'a, T>(ptr: *mut T, len: i32) -> Result<&'a mut [T]> {
    let len = to_len(len)?;
    if ptr.is_null() {
        if len == 0 {
            return Ok(&mut []);
        }
        return Err(NetError::InvalidArgument("null buffer".into()));
    }
    Ok(slice::from_raw_parts_mut(ptr, len))
}

/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn as_str<'a>(ptr: *const c_char) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(NetError::InvalidArgument("null string".into()));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|e| NetError::InvalidArgument(e.to_string()))
}

/// Creates a network with default parameters and returns its handle.
///
/// `topology_len` is the length of the `topology` array and `count` the number of layers it
/// is meant to describe. They must agree, there must be at least two layers and every size
/// must be positive.
///
/// # Safety
/// `topology` must be valid for reads of `topology_len` integers.
#[no_mangle]
pub unsafe extern "C" fn nn_new(topology: *const i32, topology_len: i32, count: i32) -> i32 {
    guard("nn_new", || {
        let topology = as_slice(topology, topology_len)?;
        Ok(registry::global().create(topology, count)?.id())
    })
}

/// As [nn_new], with engine parameters read from a JSON object such as
/// `{"activation": "sigmoid", "learning_rate": 0.2}`.
///
/// # Safety
/// `topology` must be valid for reads of `topology_len` integers and `config_json` must point
/// to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn nn_new_with_config(
    topology: *const i32,
    topology_len: i32,
    count: i32,
    config_json: *const c_char,
) -> i32 {
    guard("nn_new_with_config", || {
        let topology = as_slice(topology, topology_len)?;
        let config = NetConfig::from_json(as_str(config_json)?)?;
        Ok(registry::global()
            .create_with_config(topology, count, config)?
            .id())
    })
}

/// Loads a network written by [nn_save].
///
/// # Safety
/// `path` must point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn nn_new_from_file(path: *const c_char) -> i32 {
    guard("nn_new_from_file", || {
        let path = PathBuf::from(as_str(path)?);
        Ok(registry::global().create_from_file(path)?.id())
    })
}

/// Destroys the network. Destroying it again reports [Status::InvalidHandle].
#[no_mangle]
pub extern "C" fn nn_delete(handle: i32) -> i32 {
    guard("nn_delete", || {
        registry::global().destroy(NetworkHandle::from(handle))?;
        Ok(Status::Ok.code())
    })
}

/// # Safety
/// `input` must be valid for reads of `len` doubles.
#[no_mangle]
pub unsafe extern "C" fn nn_feed_forward(handle: i32, input: *const f64, len: i32) -> i32 {
    guard("nn_feed_forward", || {
        let input = as_slice(input, len)?;
        registry::global().feed_forward(NetworkHandle::from(handle), input)?;
        Ok(Status::Ok.code())
    })
}

/// # Safety
/// `target` must be valid for reads of `len` doubles.
#[no_mangle]
pub unsafe extern "C" fn nn_back_prop(handle: i32, target: *const f64, len: i32) -> i32 {
    guard("nn_back_prop", || {
        let target = as_slice(target, len)?;
        registry::global().back_prop(NetworkHandle::from(handle), target)?;
        Ok(Status::Ok.code())
    })
}

/// Copies the output of the last feed forward into `output`.
///
/// # Safety
/// `output` must be valid for writes of `len` doubles.
#[no_mangle]
pub unsafe extern "C" fn nn_get_results(handle: i32, output: *mut f64, len: i32) -> i32 {
    guard("nn_get_results", || {
        let output = as_slice_mut(output, len)?;
        registry::global().get_results(NetworkHandle::from(handle), output)?;
        Ok(Status::Ok.code())
    })
}

/// Recent average error of the network, or NaN if the handle is not live.
#[no_mangle]
pub extern "C" fn nn_get_recent_average_error(handle: i32) -> f64 {
    let mut error = f64::NAN;
    // the status is conveyed by the NaN
    let _ = unsafe { nn_get_recent_average_error_checked(handle, &mut error) };
    error
}

/// Writes the recent average error of the network to `out`.
///
/// # Safety
/// `out` must be valid for a write of one double.
#[no_mangle]
pub unsafe extern "C" fn nn_get_recent_average_error_checked(handle: i32, out: *mut f64) -> i32 {
    guard("nn_get_recent_average_error_checked", || {
        if out.is_null() {
            return Err(NetError::InvalidArgument("null output".into()));
        }
        *out = registry::global().recent_average_error(NetworkHandle::from(handle))?;
        Ok(Status::Ok.code())
    })
}

/// Saves the network to `path`, replacing any existing file. Returns 0 on success.
///
/// # Safety
/// `path` must point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn nn_save(handle: i32, path: *const c_char) -> i32 {
    guard("nn_save", || {
        let path = PathBuf::from(as_str(path)?);
        registry::global().save(NetworkHandle::from(handle), path)?;
        Ok(Status::Ok.code())
    })
}

/// Static description of a status code. Unknown codes get a generic message.
#[no_mangle]
pub extern "C" fn nn_status_message(status: i32) -> *const c_char {
    let msg = match Status::from_code(status) {
        Some(status) => status.message_nul(),
        None => "unknown status\0",
    };
    msg.as_ptr() as *const c_char
}
