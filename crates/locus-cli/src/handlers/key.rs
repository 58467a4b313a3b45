//! Key command handler

use locus::CacheKey;

use super::field_request;
use crate::commands::KeyArgs;
use crate::error::CliResult;
use crate::output::Reporter;

/// Cache key for the field named by `args`
pub fn key_for(args: &KeyArgs) -> CliResult<CacheKey> {
    let request = field_request(&args.field)?;
    Ok(CacheKey::for_request(&args.code, &request))
}

/// Execute the key command
pub fn execute_key(reporter: &Reporter, args: &KeyArgs) -> CliResult<()> {
    let key = key_for(args)?;
    tracing::debug!(key = %key, "built key");
    reporter.line(key.as_str());
    Ok(())
}
