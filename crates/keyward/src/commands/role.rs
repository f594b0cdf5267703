//! Role command

use anyhow::Result;
use keyward_lifecycle::ops::{RoleNameRequest, RoleWriteRequest};
use keyward_lifecycle::{Request, Response};

use super::Context;
use crate::cli::{RoleCommands, RoleCreateArgs};
use crate::output;

pub async fn run(cmd: RoleCommands, ctx: &Context) -> Result<()> {
    match cmd {
        RoleCommands::Show(args) => {
            let response = ctx.execute(Request::RoleRead(named(args.name))).await?;
            ctx.print(&response)
        }
        RoleCommands::List => list(ctx).await,
        RoleCommands::Create(args) => create(args, ctx).await,
        RoleCommands::Delete(args) => {
            let response = ctx.execute(Request::RoleDelete(named(args.name))).await?;
            ctx.print(&response)
        }
        RoleCommands::Rotate(args) => {
            let name = args.name.clone();
            let response = ctx.execute(Request::RoleRotate(named(args.name))).await?;
            if !ctx.json {
                output::success(&format!("Rotated role {}", name));
            }
            ctx.print(&response)
        }
    }
}

fn named(name: String) -> RoleNameRequest {
    RoleNameRequest { name }
}

async fn list(ctx: &Context) -> Result<()> {
    let response = ctx.execute(Request::RoleList).await?;
    match &response {
        Response::Names(names) if !ctx.json => {
            output::names(names, "No roles");
            Ok(())
        }
        _ => ctx.print(&response),
    }
}

async fn create(args: RoleCreateArgs, ctx: &Context) -> Result<()> {
    let request = Request::RoleWrite(RoleWriteRequest {
        name: args.name,
        namespace: args.namespace,
        ttl: args.ttl,
        max_ttl: args.max_ttl,
    });
    let response = ctx.execute(request).await?;
    if let (Response::Role(view), false) = (&response, ctx.json) {
        output::success(&format!("Created role {}", view.name));
    }
    ctx.print(&response)
}
