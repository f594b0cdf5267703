//! Call command: run any operation through the dispatch table

use anyhow::{Context as _, Result};
use keyward_lifecycle::{Operation, Request};

use super::Context;
use crate::cli::CallArgs;
use crate::output;

pub async fn run(args: CallArgs, ctx: &Context) -> Result<()> {
    let operation: Operation = match args.operation.parse() {
        Ok(op) => op,
        Err(e) => {
            output::error(&format!("Unknown operation '{}'", args.operation));
            output::info("Available operations:");
            for op in Operation::ALL {
                println!("  {}", op);
            }
            return Err(e.into());
        }
    };

    let data = match args.data.as_deref() {
        Some(raw) => serde_json::from_str(raw).context("--data is not valid JSON")?,
        None => serde_json::Value::Null,
    };

    let response = ctx.execute(Request::parse(operation, data)?).await?;
    ctx.print(&response)
}
