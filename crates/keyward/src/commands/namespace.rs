//! Namespace command

use anyhow::Result;
use keyward_lifecycle::ops::{NamespaceOnboardRequest, NamespaceRequest};
use keyward_lifecycle::{Request, Response};

use super::Context;
use crate::cli::{NamespaceCommands, NamespaceOnboardArgs};
use crate::output;

pub async fn run(cmd: NamespaceCommands, ctx: &Context) -> Result<()> {
    match cmd {
        NamespaceCommands::Onboard(args) => onboard(args, ctx).await,
        NamespaceCommands::Migrate(args) => {
            let response = ctx
                .execute(Request::NamespaceMigrate(NamespaceRequest {
                    namespace: args.namespace,
                }))
                .await?;
            ctx.print(&response)
        }
        NamespaceCommands::List => {
            let response = ctx.execute(Request::NamespaceList).await?;
            match &response {
                Response::Names(names) if !ctx.json => {
                    output::names(names, "No managed namespaces");
                    Ok(())
                }
                _ => ctx.print(&response),
            }
        }
        NamespaceCommands::Delete(args) => {
            let namespace = args.namespace.clone();
            let response = ctx
                .execute(Request::NamespaceDelete(NamespaceRequest {
                    namespace: args.namespace,
                }))
                .await?;
            match &response {
                Response::Names(removed) if !ctx.json => {
                    output::success(&format!(
                        "Deactivated namespace {} and removed {} roles",
                        namespace,
                        removed.len()
                    ));
                    Ok(())
                }
                _ => ctx.print(&response),
            }
        }
    }
}

async fn onboard(args: NamespaceOnboardArgs, ctx: &Context) -> Result<()> {
    let request = Request::NamespaceOnboard(NamespaceOnboardRequest {
        namespace: args.namespace,
        username: args.username,
        name: args.name,
    });
    let response = ctx.execute(request).await?;
    if let (Response::Role(view), false) = (&response, ctx.json) {
        output::success(&format!(
            "Onboarded {} into namespace {}",
            view.username, view.namespace
        ));
    }
    ctx.print(&response)
}
