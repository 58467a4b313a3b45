//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains the execution logic for one command plus
//! pure helpers that the tests exercise directly.

pub mod key;
pub mod resolve;
pub mod validate;

pub use key::{execute_key, key_for};
pub use resolve::{execute_resolve, resolve_field, ResolveReport};
pub use validate::{execute_validate, validate_config, CodeCoverage, ValidationReport};

use crate::commands::FieldArgs;
use crate::error::{CliError, CliResult};
use locus::{FieldRequest, FieldType};

/// Build a library request from command-line field arguments
pub fn field_request(args: &FieldArgs) -> CliResult<FieldRequest> {
    if args.page.trim().is_empty() {
        return Err(CliError::invalid_argument("page must not be empty"));
    }
    if args.name.trim().is_empty() {
        return Err(CliError::invalid_argument("field name must not be empty"));
    }
    let field_type: FieldType = args.field_type.parse()?;
    let mut request = FieldRequest::new(args.page.as_str(), field_type, args.name.as_str());
    if let Some(value) = &args.value {
        request = request.with_value(value.as_str());
    }
    Ok(request)
}
