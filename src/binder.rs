use crate::backend::CompiledStatement;
use crate::error::{Result, StorageError};
use crate::types::ParamValue;

/// Reject text values longer than `max_len` characters.
///
/// Length is counted in Unicode scalar values (`str::chars`), not bytes or UTF-16 code
/// units, so a character outside the Basic Multilingual Plane such as an emoji counts once.
///
/// # Errors
/// Returns `StorageError::InvalidParameter` naming the configured limit.
pub fn check_param(value: &ParamValue, max_len: usize) -> Result<()> {
    match value {
        ParamValue::Text(text) if text.chars().count() > max_len => {
            Err(StorageError::invalid_parameter(
                format!("Query parameter must be at most {max_len} characters"),
                "stringParam",
            ))
        }
        _ => Ok(()),
    }
}

/// Bind `params` positionally (1-based) onto `stmt`.
///
/// Validation happens per value just before it is bound, so a rejected value leaves the
/// earlier positions bound; callers clear parameters before every execution anyway.
///
/// # Errors
/// Returns `StorageError::InvalidParameter` for an oversized text value and
/// `StorageError::QueryExecution` if the driver rejects a binding.
pub fn bind_params<S: CompiledStatement + ?Sized>(
    stmt: &mut S,
    query_name: &str,
    params: &[ParamValue],
    max_len: usize,
) -> Result<()> {
    for (i, param) in params.iter().enumerate() {
        check_param(param, max_len)?;
        stmt.bind(i + 1, param)
            .map_err(|e| StorageError::execution(query_name, e))?;
    }
    Ok(())
}
