//! Config command

use anyhow::Result;
use keyward_core::config::CONFIG_FILE_NAME;
use keyward_core::SecureString;
use keyward_lifecycle::ops::ConfigWriteRequest;
use keyward_lifecycle::Request;

use super::Context;
use crate::cli::{ConfigCommands, ConfigSetArgs};
use crate::output;

pub async fn run(cmd: ConfigCommands, ctx: &Context) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(ctx).await,
        ConfigCommands::Set(args) => set(args, ctx).await,
        ConfigCommands::RotateRoot => rotate_root(ctx).await,
    }
}

async fn show(ctx: &Context) -> Result<()> {
    let response = ctx.execute(Request::ConfigRead).await?;
    ctx.print(&response)?;
    if !ctx.json {
        output::info(&format!(
            "Config file: {}",
            ctx.state_dir.join(CONFIG_FILE_NAME).display()
        ));
    }
    Ok(())
}

async fn set(args: ConfigSetArgs, ctx: &Context) -> Result<()> {
    if args.skip_ssl {
        output::warning("TLS certificate verification will be disabled");
    }

    let request = Request::ConfigWrite(ConfigWriteRequest {
        url: args.url,
        username: args.username,
        password: SecureString::new(args.password),
        skip_ssl: args.skip_ssl,
    });
    let response = ctx.execute(request).await?;

    if ctx.json {
        output::json(&response)
    } else {
        output::success("Configuration saved");
        Ok(())
    }
}

async fn rotate_root(ctx: &Context) -> Result<()> {
    let response = ctx.execute(Request::ConfigRotateRoot).await?;
    ctx.print(&response)?;
    if !ctx.json {
        output::info("The new password was saved; the previous one no longer works");
    }
    Ok(())
}
